use ndarray::{ArrayView1, ArrayViewMut1};

use crate::Result;

/// Defines the strategy for updating parameters based on a computed gradient.
pub trait Optimizer {
    /// Takes one step over `params` using `grad`.
    ///
    /// # Arguments
    /// * `grad` - The gradient of the cost at `params`.
    /// * `params` - The parameters to update in place.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad` and `params`.
    fn update_params(&mut self, grad: ArrayView1<f64>, params: ArrayViewMut1<f64>) -> Result<()>;
}
