use fit_core::{CostFn, FitErr, Result};
use ndarray::{Array1, ArrayView1};

use super::{Penalty, poisson_neglogli};
use crate::{LinearPredictor, Nonlinearity};

/// Penalized Poisson negative log-likelihood of a single stage
/// linear-nonlinear-Poisson model.
///
/// The intensity is `R * f(XS b)` and the non-spike term is scaled by `dt`.
/// Only the elastic net applies, the nuclear norm weight is ignored.
#[derive(Debug, Clone, Copy)]
pub struct LnpCost<'p> {
    predictor: &'p LinearPredictor,
    nonlinearity: Nonlinearity,
    penalty: Penalty,
}

impl<'p> LnpCost<'p> {
    pub fn new(predictor: &'p LinearPredictor, nonlinearity: Nonlinearity, penalty: Penalty) -> Self {
        Self {
            predictor,
            nonlinearity,
            penalty,
        }
    }

    /// The conditional intensity per sample for the coefficients `b`.
    pub fn intensity(&self, b: ArrayView1<f64>) -> Array1<f64> {
        let p = self.predictor;
        let nl = self.nonlinearity;

        p.xs().dot(&b).mapv(|x| nl.apply(x)) * p.scale()
    }
}

impl CostFn for LnpCost<'_> {
    fn cost(&self, b: ArrayView1<f64>) -> Result<f64> {
        let n_b = self.predictor.n_b();
        if b.len() != n_b {
            return Err(FitErr::SizeMismatch {
                what: "coefficients",
                got: b.len(),
                expected: n_b,
            });
        }

        let r = self.intensity(b);
        let neglogli = poisson_neglogli(r.view(), self.predictor.y(), self.predictor.dt());

        Ok(neglogli + self.penalty.elastic_net(b))
    }
}
