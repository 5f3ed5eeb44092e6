use fit_core::{CostFn, FitErr, Result};
use ndarray::{Array1, ArrayView1, Axis};

use super::{Penalty, poisson_neglogli};
use crate::{LinearPredictor, nonlinearity::softplus};

/// Offset added to both softplus stages, keeps `log(r)` finite.
pub const LNLN_OFFSET: f64 = 1e-17;

fn nonlin(x: f64) -> f64 {
    softplus(x) + LNLN_OFFSET
}

/// Penalized Poisson negative log-likelihood of a cascaded
/// linear-nonlinear-linear-nonlinear model.
///
/// The flat coefficients are read row-major as an `(n_b, n_subunits)` matrix.
/// Every subunit goes through a softplus; with more than one subunit their sum
/// goes through a second softplus.
#[derive(Debug, Clone, Copy)]
pub struct LnlnCost<'p> {
    predictor: &'p LinearPredictor,
    n_subunits: usize,
    penalty: Penalty,
}

impl<'p> LnlnCost<'p> {
    /// Creates a new `LnlnCost`.
    ///
    /// # Arguments
    /// * `predictor` - The data and basis.
    /// * `n_subunits` - The amount of subunits, at least one.
    /// * `penalty` - The elastic net and nuclear norm weights.
    pub fn new(predictor: &'p LinearPredictor, n_subunits: usize, penalty: Penalty) -> Result<Self> {
        if n_subunits == 0 {
            return Err(FitErr::InvalidConfig("at least one subunit is required"));
        }

        Ok(Self {
            predictor,
            n_subunits,
            penalty,
        })
    }

    /// The amount of coefficients this cost expects.
    pub fn n_params(&self) -> usize {
        self.predictor.n_b() * self.n_subunits
    }

    /// The conditional intensity per bin for the coefficients `b`.
    pub fn intensity(&self, b: ArrayView1<f64>) -> Result<Array1<f64>> {
        let p = self.predictor;
        let b = b.to_shape((p.n_b(), self.n_subunits))?;
        let u = p.xs().dot(&b);

        let drive = if self.n_subunits == 1 {
            u.column(0).mapv(nonlin)
        } else {
            u.mapv(nonlin).sum_axis(Axis(1)).mapv(nonlin)
        };

        Ok(drive * p.dt())
    }
}

impl CostFn for LnlnCost<'_> {
    fn cost(&self, b: ArrayView1<f64>) -> Result<f64> {
        if b.len() != self.n_params() {
            return Err(FitErr::SizeMismatch {
                what: "coefficients",
                got: b.len(),
                expected: self.n_params(),
            });
        }

        let r = self.intensity(b)?;
        let mut neglogli = poisson_neglogli(r.view(), self.predictor.y(), 1.);

        neglogli += self.penalty.elastic_net(b);
        if self.penalty.gamma > 0. {
            let b = b.to_shape((self.predictor.n_b(), self.n_subunits))?;
            neglogli += self.penalty.nuclear_norm(b.view());
        }

        Ok(neglogli)
    }
}
