use ndarray::{Array1, ArrayView1};

use crate::Result;

/// A scalar cost over a flat parameter vector.
pub trait CostFn {
    /// Evaluates the cost at `params`.
    fn cost(&self, params: ArrayView1<f64>) -> Result<f64>;
}

impl<F> CostFn for F
where
    F: Fn(ArrayView1<f64>) -> Result<f64>,
{
    fn cost(&self, params: ArrayView1<f64>) -> Result<f64> {
        self(params)
    }
}

/// Computes the gradient of a scalar cost with respect to its parameters.
pub trait GradientProvider {
    /// Returns the gradient of `cost` evaluated at `params`.
    fn gradient<C: CostFn + ?Sized>(&self, cost: &C, params: ArrayView1<f64>)
    -> Result<Array1<f64>>;
}

/// Central finite differences with a step relative to the magnitude of each
/// parameter, `h_i = rel_step * max(|p_i|, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct CentralDifference {
    rel_step: f64,
}

impl CentralDifference {
    /// Creates a new `CentralDifference`.
    ///
    /// # Arguments
    /// * `rel_step` - The relative step taken on each side of a parameter.
    pub fn new(rel_step: f64) -> Self {
        Self { rel_step }
    }
}

impl Default for CentralDifference {
    fn default() -> Self {
        // cbrt(f64::EPSILON), balances truncation and rounding error.
        Self::new(6e-6)
    }
}

impl GradientProvider for CentralDifference {
    fn gradient<C: CostFn + ?Sized>(
        &self,
        cost: &C,
        params: ArrayView1<f64>,
    ) -> Result<Array1<f64>> {
        let mut probe = params.to_owned();
        let mut grad = Array1::zeros(params.len());

        for i in 0..params.len() {
            let p = params[i];
            let h = self.rel_step * p.abs().max(1.);

            probe[i] = p + h;
            let f_plus = cost.cost(probe.view())?;

            probe[i] = p - h;
            let f_minus = cost.cost(probe.view())?;

            probe[i] = p;
            grad[i] = (f_plus - f_minus) / (2. * h);
        }

        Ok(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn gradient_of_quadratic() {
        let cost = |p: ArrayView1<f64>| -> Result<f64> { Ok(p[0].powi(2) + 3. * p[0] * p[1]) };
        let params = array![1.5, -2.];

        let grad = CentralDifference::default()
            .gradient(&cost, params.view())
            .unwrap();

        assert_abs_diff_eq!(grad, array![2. * 1.5 + 3. * -2., 3. * 1.5], epsilon = 1e-6);
    }

    #[test]
    fn gradient_of_log() {
        let cost = |p: ArrayView1<f64>| -> Result<f64> { Ok(p.mapv(f64::ln).sum()) };
        let params = array![0.5, 4.];

        let grad = CentralDifference::default()
            .gradient(&cost, params.view())
            .unwrap();

        assert_abs_diff_eq!(grad, array![2., 0.25], epsilon = 1e-6);
    }
}
