//! Spline-regularized Poisson GLMs of neural responses.
//!
//! A [`LinearPredictor`] holds the design, the response and the spline basis.
//! [`SplineLnln`] and [`SplineLnp`] put a cost strategy on top of it and fit
//! the basis coefficients with a first order optimizer.

mod config;
pub mod cost;
mod models;
mod nonlinearity;
mod predictor;

pub use config::GlmFitConfig;
pub use models::{FitReport, GlmFit, SplineLnln, SplineLnp};
pub use nonlinearity::{Nonlinearity, RELU_FLOOR, SOFTPLUS_OFFSET, softplus};
pub use predictor::{LinearPredictor, PredictorOptions};
