use fit_core::{
    BasisProvider, BasisSpec, CentralDifference, CostFn, GradientOptimizer, GradientProvider,
    Result,
};
use log::info;
use ndarray::{Array1, Array2, ArrayView1};

use super::{GlmFit, resolve_p0};
use crate::{GlmFitConfig, LinearPredictor, PredictorOptions, cost::LnlnCost};

/// Spline-based multi-filter linear-nonlinear-Poisson model with a fixed
/// softplus nonlinearity, cascaded when there is more than one subunit.
#[derive(Debug, Clone)]
pub struct SplineLnln {
    predictor: LinearPredictor,
    fit: Option<GlmFit>,
}

impl SplineLnln {
    /// Creates a new, unfitted `SplineLnln`.
    pub fn new(predictor: LinearPredictor) -> Self {
        Self {
            predictor,
            fit: None,
        }
    }

    /// Creates a new `SplineLnln`, asking `provider` for the basis.
    ///
    /// Uses `PredictorOptions::lnln`, so `w_mle` is computed.
    pub fn from_provider<P: BasisProvider + ?Sized>(
        x: Array2<f64>,
        y: Array1<f64>,
        spec: &BasisSpec,
        provider: &P,
    ) -> Result<Self> {
        let predictor =
            LinearPredictor::from_provider(x, y, spec, provider, PredictorOptions::lnln())?;
        Ok(Self::new(predictor))
    }

    pub fn predictor(&self) -> &LinearPredictor {
        &self.predictor
    }

    /// The result of the last successful `fit`.
    pub fn fitted(&self) -> Option<&GlmFit> {
        self.fit.as_ref()
    }

    /// Evaluates the penalized cost of `config` at the flat coefficients `b`.
    pub fn cost(&self, b: ArrayView1<f64>, config: &GlmFitConfig) -> Result<f64> {
        LnlnCost::new(&self.predictor, config.num_subunits, config.penalty())?.cost(b)
    }

    /// Fits the model, differentiating the cost with central differences.
    ///
    /// # Arguments
    /// * `p0` - The initial flat coefficients, seeded gaussian noise if missing.
    /// * `config` - The hyperparameters of the fit.
    pub fn fit(&mut self, p0: Option<Array1<f64>>, config: &GlmFitConfig) -> Result<&GlmFit> {
        self.fit_with(p0, config, CentralDifference::default())
    }

    /// Fits the model using `gradient` to differentiate the cost.
    ///
    /// # Arguments
    /// * `p0` - The initial flat coefficients, `n_b * num_subunits` of them read
    ///   row-major. Seeded gaussian noise if missing.
    /// * `config` - The hyperparameters of the fit.
    /// * `gradient` - Computes the gradient of the cost.
    ///
    /// # Returns
    /// The fitted coefficients, filters and run report.
    pub fn fit_with<G: GradientProvider>(
        &mut self,
        p0: Option<Array1<f64>>,
        config: &GlmFitConfig,
        gradient: G,
    ) -> Result<&GlmFit> {
        config.validate()?;

        let cost = LnlnCost::new(&self.predictor, config.num_subunits, config.penalty())?;
        let p0 = resolve_p0(p0, cost.n_params(), config.random_seed)?;

        let optimized = GradientOptimizer::new(
            gradient,
            config.num_iters,
            config.step_size,
            config.tolerance,
        )
        .with_optimizer(config.optimizer)
        .with_verbal(config.verbal)
        .minimize(&cost, p0)?;

        info!(
            subunits = config.num_subunits,
            iterations = optimized.iterations();
            "fitted spline LNLN"
        );

        let fit = GlmFit::new(optimized, self.predictor.s(), config.num_subunits)?;
        Ok(&*self.fit.insert(fit))
    }
}
