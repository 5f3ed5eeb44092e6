use ndarray::{ArrayView1, ArrayViewMut1};

use super::{Optimizer, check_sizes};
use crate::Result;

#[derive(Debug)]
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    /// Creates a new `GradientDescent` optimizer.
    ///
    /// # Arguments
    /// * `learning_rate` - The step size.
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    fn update_params(
        &mut self,
        grad: ArrayView1<f64>,
        mut params: ArrayViewMut1<f64>,
    ) -> Result<()> {
        check_sizes(grad.len(), params.len())?;

        params.scaled_add(-self.learning_rate, &grad);
        Ok(())
    }
}
