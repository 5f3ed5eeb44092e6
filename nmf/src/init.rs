use fit_core::{FitErr, Result, linalg};
use ndarray::{Array2, ArrayView2, s};
use ndarray_rand::{RandomExt, rand::rngs::StdRng, rand_distr::StandardNormal};

use crate::InitMethod;

/// Seeds the `(W, H)` factors of `V ≈ W Hᵀ`.
pub trait FactorInit {
    /// Initializes the factors of `v`.
    ///
    /// # Arguments
    /// * `v` - The `(m, n)` matrix to factorize.
    /// * `k` - The amount of components.
    /// * `method` - How to seed the factors.
    /// * `rng` - The random source of the whole factorization.
    ///
    /// # Returns
    /// `W` with shape `(m, k)` and a nonnegative `H` with shape `(n, k)`.
    fn initialize(
        &self,
        v: ArrayView2<f64>,
        k: usize,
        method: InitMethod,
        rng: &mut StdRng,
    ) -> Result<(Array2<f64>, Array2<f64>)>;
}

/// The default factor initializer.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFactorInit;

impl FactorInit for DefaultFactorInit {
    fn initialize(
        &self,
        v: ArrayView2<f64>,
        k: usize,
        method: InitMethod,
        rng: &mut StdRng,
    ) -> Result<(Array2<f64>, Array2<f64>)> {
        let (m, n) = v.dim();

        match method {
            InitMethod::Random => {
                let w = Array2::random_using((m, k), StandardNormal, rng);
                let h = Array2::random_using((n, k), StandardNormal, rng).mapv(f64::abs);
                Ok((w, h))
            }
            InitMethod::Svd => {
                if k > m.min(n) {
                    return Err(FitErr::InvalidConfig(
                        "svd initialization needs k <= min(rows, cols)",
                    ));
                }

                let (u, sigma, v_t) = linalg::svd(v)?;
                let w = &u.slice(s![.., ..k]) * &sigma.slice(s![..k]);
                let h = v_t.slice(s![..k, ..]).reversed_axes().mapv(f64::abs);
                Ok((w, h))
            }
        }
    }
}

/// Initial coefficients of a basis constrained factor.
///
/// Random initialization draws fresh gaussian coefficients, svd initialization
/// projects the seeded factor onto the basis.
pub(crate) fn basis_coef(
    basis: ArrayView2<f64>,
    factor: ArrayView2<f64>,
    method: InitMethod,
    rcond: Option<f64>,
    rng: &mut StdRng,
) -> Result<Array2<f64>> {
    match method {
        InitMethod::Random => Ok(Array2::random_using(
            (basis.ncols(), factor.ncols()),
            StandardNormal,
            rng,
        )),
        InitMethod::Svd => linalg::lstsq(basis, factor, rcond),
    }
}
