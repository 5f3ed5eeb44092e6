//! Semi-nonnegative matrix factorization, `V ≈ W Hᵀ` with `H ≥ 0`.
//!
//! Either factor can be constrained to a spline basis, `W = L B` and
//! `H = R D`. The factors are refined with alternating updates: a closed form
//! least squares step for `W` and a multiplicative step for `H` that keeps it
//! nonnegative.

mod builder;
mod config;
mod engine;
mod init;

pub use builder::SemiNmfBuilder;
pub use config::{InitMethod, NmfFitConfig};
pub use engine::{NmfReport, SemiNmf};
pub use init::{DefaultFactorInit, FactorInit};
