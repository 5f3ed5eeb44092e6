mod lnln;
mod lnp;

pub use lnln::SplineLnln;
pub use lnp::SplineLnp;

use std::{cell::RefCell, rc::Rc};

use fit_core::{
    FitErr, Optimized, Result, StopReason,
    initialization::{ParamGen, RandParamGen},
};
use ndarray::{Array1, Array2, ArrayView2};
use rand::{SeedableRng, rngs::StdRng};

/// Standard deviation of the default initial coefficients.
const INIT_SCALE: f64 = 0.01;

/// How a fit ended.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// The cost after every iteration that ran.
    pub costs: Vec<f64>,
    pub stop: StopReason,
}

impl FitReport {
    pub fn iterations(&self) -> usize {
        self.costs.len()
    }

    /// The cost of the last iteration that ran.
    pub fn final_cost(&self) -> Option<f64> {
        self.costs.last().copied()
    }
}

/// The result of fitting a spline GLM.
#[derive(Debug, Clone)]
pub struct GlmFit {
    /// The optimized flat basis coefficients.
    pub b_opt: Array1<f64>,
    /// The filters in feature space, `S b_opt`, one column per subunit.
    pub w_opt: Array2<f64>,
    pub report: FitReport,
}

impl GlmFit {
    fn new(optimized: Optimized, s: ArrayView2<f64>, n_subunits: usize) -> Result<Self> {
        let Optimized {
            params,
            costs,
            stop,
        } = optimized;

        let w_opt = s.dot(&params.to_shape((s.ncols(), n_subunits))?);

        Ok(Self {
            b_opt: params,
            w_opt,
            report: FitReport { costs, stop },
        })
    }
}

/// Draws `INIT_SCALE * N(0, 1)` coefficients from a generator seeded with `seed`.
fn initial_params(len: usize, seed: u64) -> Result<Array1<f64>> {
    let rng = Rc::new(RefCell::new(StdRng::seed_from_u64(seed)));
    let mut param_gen = RandParamGen::normal(rng, len, 0., INIT_SCALE)?;

    Ok(param_gen.sample(len).map(Array1::from).unwrap_or_default())
}

/// Uses `p0` when given, checking its length, or the seeded default otherwise.
fn resolve_p0(p0: Option<Array1<f64>>, len: usize, seed: u64) -> Result<Array1<f64>> {
    match p0 {
        Some(p0) if p0.len() != len => Err(FitErr::SizeMismatch {
            what: "initial parameters",
            got: p0.len(),
            expected: len,
        }),
        Some(p0) => Ok(p0),
        None => initial_params(len, seed),
    }
}
