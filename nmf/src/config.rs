use serde::{Deserialize, Serialize};

/// How the factors are seeded before the first update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitMethod {
    /// Gaussian `W`, folded gaussian `H`.
    #[default]
    Random,
    /// Truncated singular value decomposition of `V`.
    Svd,
}

/// Parameters of a semiNMF fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NmfFitConfig {
    pub num_iters: usize,
    /// Kept for parity with the GLM configuration, the updates don't use it.
    pub lambd: f64,
    /// Record and log the cost every `verbal` iterations.
    ///
    /// Convergence is only checked on recorded costs, so `0` always runs the
    /// whole `num_iters` budget.
    pub verbal: usize,
    /// Reported in the convergence message.
    pub tolerance: usize,
}

impl Default for NmfFitConfig {
    fn default() -> Self {
        Self {
            num_iters: 300,
            lambd: 0.05,
            verbal: 0,
            tolerance: 10,
        }
    }
}
