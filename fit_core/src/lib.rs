//! Numerical building blocks shared by the spline GLM and semiNMF engines:
//! errors, dense linear algebra, the basis and gradient seams, first order
//! optimizers with early stopping, and seeded parameter generation.

pub mod basis;
mod error;
pub mod gradient;
pub mod initialization;
pub mod linalg;
pub mod optimization;

pub use basis::{BasisProvider, BasisSpec, IdentityBasis, PrecomputedBasis, Smooth};
pub use error::{FitErr, Result};
pub use gradient::{CentralDifference, CostFn, GradientProvider};
pub use optimization::{GradientOptimizer, Optimized, OptimizerConfig, StopReason};
