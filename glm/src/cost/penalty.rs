use fit_core::linalg;
use ndarray::{ArrayView1, ArrayView2};

/// The regularization added to the negative log-likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Penalty {
    /// Global weight of the elastic net.
    pub lambd: f64,
    /// Elastic net mixing, `0` is pure L2 and `1` pure L1.
    pub alpha: f64,
    /// Weight of the nuclear norm of the coefficient matrix.
    pub gamma: f64,
}

impl Penalty {
    pub fn new(lambd: f64, alpha: f64, gamma: f64) -> Self {
        Self {
            lambd,
            alpha,
            gamma,
        }
    }

    /// `lambd * ((1 - alpha) * l2(b) + alpha * l1(b))`, zero unless `lambd > 0`.
    pub fn elastic_net(&self, b: ArrayView1<f64>) -> f64 {
        if self.lambd <= 0. {
            return 0.;
        }

        let l1 = b.mapv(f64::abs).sum();
        let l2 = b.dot(&b).sqrt();
        self.lambd * ((1. - self.alpha) * l2 + self.alpha * l1)
    }

    /// `gamma` times the sum of the singular values of `b`, zero unless
    /// `gamma > 0`.
    pub fn nuclear_norm(&self, b: ArrayView2<f64>) -> f64 {
        if self.gamma <= 0. {
            return 0.;
        }

        self.gamma * linalg::singular_values(b).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn alpha_zero_is_pure_l2() {
        let b = array![3., -4.];
        assert_abs_diff_eq!(Penalty::new(0.5, 0., 0.).elastic_net(b.view()), 0.5 * 5.);
    }

    #[test]
    fn alpha_one_is_pure_l1() {
        let b = array![3., -4.];
        assert_abs_diff_eq!(Penalty::new(0.5, 1., 0.).elastic_net(b.view()), 0.5 * 7.);
    }

    #[test]
    fn mixing() {
        let b = array![3., -4.];
        assert_abs_diff_eq!(
            Penalty::new(2., 0.25, 0.).elastic_net(b.view()),
            2. * (0.75 * 5. + 0.25 * 7.),
            epsilon = 1e-12
        );
    }

    #[test]
    fn no_lambda_no_penalty() {
        let b = array![3., -4.];
        assert_eq!(Penalty::new(0., 0.5, 0.).elastic_net(b.view()), 0.);
    }

    #[test]
    fn nuclear_norm_sums_singular_values() {
        let b = array![[2., 0.], [0., -3.], [0., 0.]];
        assert_abs_diff_eq!(Penalty::new(0., 0., 0.1).nuclear_norm(b.view()), 0.5, epsilon = 1e-12);
        assert_eq!(Penalty::default().nuclear_norm(b.view()), 0.);
    }
}
