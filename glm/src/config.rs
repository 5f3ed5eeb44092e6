use fit_core::{FitErr, OptimizerConfig, Result};
use serde::{Deserialize, Serialize};

use crate::cost::Penalty;

/// Hyperparameters of a spline GLM fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlmFitConfig {
    pub num_subunits: usize,
    pub num_iters: usize,
    /// Elastic net mixing, `1` is L1 and `0` is L2.
    pub alpha: f64,
    /// Elastic net global weight.
    pub lambd: f64,
    /// Nuclear norm weight.
    pub gamma: f64,
    pub step_size: f64,
    /// The length of the early stopping window.
    pub tolerance: usize,
    /// Log the cost every `verbal` iterations, `0` is silent.
    pub verbal: usize,
    /// Seeds the default initial parameters.
    pub random_seed: u64,
    pub optimizer: OptimizerConfig,
}

impl Default for GlmFitConfig {
    fn default() -> Self {
        Self {
            num_subunits: 1,
            num_iters: 5,
            alpha: 0.5,
            lambd: 0.05,
            gamma: 0.,
            step_size: 1e-2,
            tolerance: 10,
            verbal: 1,
            random_seed: 2046,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl GlmFitConfig {
    /// Checks every hyperparameter is inside its domain.
    pub fn validate(&self) -> Result<()> {
        if self.num_subunits == 0 {
            return Err(FitErr::InvalidConfig("at least one subunit is required"));
        }

        if !(0. ..=1.).contains(&self.alpha) {
            return Err(FitErr::InvalidConfig("alpha must be within [0, 1]"));
        }

        if self.lambd < 0. || self.gamma < 0. {
            return Err(FitErr::InvalidConfig("penalty weights can't be negative"));
        }

        if !(self.step_size > 0.) {
            return Err(FitErr::InvalidConfig("step size must be positive"));
        }

        Ok(())
    }

    /// The regularization this configuration describes.
    pub fn penalty(&self) -> Penalty {
        Penalty::new(self.lambd, self.alpha, self.gamma)
    }
}
