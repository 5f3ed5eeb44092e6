mod adam;
mod early_stopping;
mod gradient_descent;
mod gradient_descent_with_momentum;
mod gradient_optimizer;
mod optimizer;

pub use adam::Adam;
pub use early_stopping::{EarlyStopping, PLATEAU_TOL, StopReason};
pub use gradient_descent::GradientDescent;
pub use gradient_descent_with_momentum::GradientDescentWithMomentum;
pub use gradient_optimizer::{GradientOptimizer, Optimized, OptimizerConfig};
pub use optimizer::Optimizer;

use crate::{FitErr, Result};

fn check_sizes(got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(FitErr::SizeMismatch {
            what: "gradient",
            got,
            expected,
        });
    }

    Ok(())
}
