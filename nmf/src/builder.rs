use fit_core::{BasisProvider, BasisSpec, FitErr, Result, Smooth};
use log::debug;
use ndarray::Array2;
use ndarray_rand::rand::{SeedableRng, rngs::StdRng};

use crate::{
    FactorInit, InitMethod, SemiNmf,
    engine::Constrained,
    init::basis_coef,
};

/// Builds a [`SemiNmf`] from the matrix to factorize.
///
/// Every random draw of the construction comes from one `StdRng` seeded with
/// `seed`, so two builds with the same settings give the same factors.
#[derive(Debug, Clone)]
pub struct SemiNmfBuilder {
    v: Array2<f64>,
    k: usize,
    init_method: InitMethod,
    seed: u64,
    rcond: Option<f64>,
    left: Option<BasisSpec>,
    right: Option<BasisSpec>,
}

impl SemiNmfBuilder {
    /// Starts building the factorization of `v`.
    pub fn new(v: Array2<f64>) -> Self {
        Self {
            v,
            k: 2,
            init_method: InitMethod::default(),
            seed: 2046,
            rcond: None,
            left: None,
            right: None,
        }
    }

    /// The amount of components `k`.
    pub fn components(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn init_method(mut self, init_method: InitMethod) -> Self {
        self.init_method = init_method;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The relative cutoff of small singular values in the basis projections.
    pub fn rcond(mut self, rcond: f64) -> Self {
        self.rcond = Some(rcond);
        self
    }

    /// Constrains `W` to the basis described by `spec`.
    pub fn left_basis(mut self, spec: BasisSpec) -> Self {
        self.left = Some(spec);
        self
    }

    /// Constrains `H` to the basis described by `spec`.
    pub fn right_basis(mut self, spec: BasisSpec) -> Self {
        self.right = Some(spec);
        self
    }

    /// Constrains `W` to cubic regression splines.
    pub fn left_spline(self, dims: Vec<usize>, df: Vec<usize>) -> Self {
        self.left_basis(BasisSpec::new(dims, df, Smooth::Cr))
    }

    /// Constrains `H` to B-splines.
    pub fn right_spline(self, dims: Vec<usize>, df: Vec<usize>) -> Self {
        self.right_basis(BasisSpec::new(dims, df, Smooth::Bs))
    }

    /// Builds the bases and seeds the factors.
    ///
    /// # Arguments
    /// * `provider` - Builds the left and right bases.
    /// * `initializer` - Seeds `W` and `H`.
    pub fn build<P, I>(self, provider: &P, initializer: &I) -> Result<SemiNmf>
    where
        P: BasisProvider + ?Sized,
        I: FactorInit + ?Sized,
    {
        let Self {
            v,
            k,
            init_method,
            seed,
            rcond,
            left,
            right,
        } = self;

        if k == 0 {
            return Err(FitErr::InvalidConfig("at least one component is required"));
        }

        if v.is_empty() {
            return Err(FitErr::InvalidConfig("can't factorize an empty matrix"));
        }

        let (m, n) = v.dim();
        let l = left
            .as_ref()
            .map(|spec| build_basis(provider, spec, m, "left basis rows"))
            .transpose()?;
        let r = right
            .as_ref()
            .map(|spec| build_basis(provider, spec, n, "right basis rows"))
            .transpose()?;

        let mut rng = StdRng::seed_from_u64(seed);
        let (mut w, mut h) = initializer.initialize(v.view(), k, init_method, &mut rng)?;
        check_factor(&w, (m, k), "W rows", "W columns")?;
        check_factor(&h, (n, k), "H rows", "H columns")?;

        let left = match l {
            Some(basis) => {
                let coef = basis_coef(basis.view(), w.view(), init_method, rcond, &mut rng)?;
                if init_method == InitMethod::Random {
                    w = basis.dot(&coef);
                }

                Some(Constrained { basis, coef })
            }
            None => None,
        };

        let right = match r {
            Some(basis) => {
                let mut coef = basis_coef(basis.view(), h.view(), init_method, rcond, &mut rng)?;
                match init_method {
                    InitMethod::Random => {
                        coef.mapv_inplace(f64::abs);
                        h = basis.dot(&coef);
                    }
                    InitMethod::Svd => coef.mapv_inplace(|x| x.max(0.)),
                }

                Some(Constrained { basis, coef })
            }
            None => None,
        };

        debug!(
            rows = m,
            cols = n,
            components = k,
            left_basis = left.is_some(),
            right_basis = right.is_some();
            "built semiNMF"
        );

        let (norm_w, norm_h) = (left.is_some(), right.is_some());
        Ok(SemiNmf::new(v, w, h, left, right, norm_w, norm_h, rcond))
    }
}

fn build_basis<P: BasisProvider + ?Sized>(
    provider: &P,
    spec: &BasisSpec,
    rows: usize,
    what: &'static str,
) -> Result<Array2<f64>> {
    let basis = provider.build(spec)?;
    if basis.nrows() != rows {
        return Err(FitErr::SizeMismatch {
            what,
            got: basis.nrows(),
            expected: rows,
        });
    }

    Ok(basis)
}

fn check_factor(
    factor: &Array2<f64>,
    (rows, cols): (usize, usize),
    what_rows: &'static str,
    what_cols: &'static str,
) -> Result<()> {
    if factor.nrows() != rows {
        return Err(FitErr::SizeMismatch {
            what: what_rows,
            got: factor.nrows(),
            expected: rows,
        });
    }

    if factor.ncols() != cols {
        return Err(FitErr::SizeMismatch {
            what: what_cols,
            got: factor.ncols(),
            expected: cols,
        });
    }

    Ok(())
}
