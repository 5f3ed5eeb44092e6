//! Penalized negative log-likelihoods of the spline GLMs.

mod lnln;
mod lnp;
mod penalty;

pub use lnln::{LNLN_OFFSET, LnlnCost};
pub use lnp::LnpCost;
pub use penalty::Penalty;

use ndarray::ArrayView1;

/// Poisson negative log-likelihood up to a constant, `-log(r) . y + dt * sum(r)`.
fn poisson_neglogli(r: ArrayView1<f64>, y: ArrayView1<f64>, dt: f64) -> f64 {
    let term0 = -r.mapv(f64::ln).dot(&y);
    let term1 = r.sum() * dt;

    term0 + term1
}
