use fit_core::{
    BasisProvider, BasisSpec, CentralDifference, CostFn, FitErr, GradientOptimizer,
    GradientProvider, Result,
};
use log::info;
use ndarray::{Array1, Array2, ArrayView1};

use super::{GlmFit, resolve_p0};
use crate::{GlmFitConfig, LinearPredictor, Nonlinearity, PredictorOptions, cost::LnpCost};

/// Spline-based linear-nonlinear-Poisson model with a selectable nonlinearity.
#[derive(Debug, Clone)]
pub struct SplineLnp {
    predictor: LinearPredictor,
    nonlinearity: Nonlinearity,
    fit: Option<GlmFit>,
}

impl SplineLnp {
    /// Creates a new, unfitted `SplineLnp`.
    pub fn new(predictor: LinearPredictor, nonlinearity: Nonlinearity) -> Self {
        Self {
            predictor,
            nonlinearity,
            fit: None,
        }
    }

    /// Creates a new `SplineLnp` from a nonlinearity tag.
    ///
    /// # Returns
    /// `FitErr::UnsupportedNonlinearity` if `tag` is not one of `softplus`,
    /// `exponential`, `relu` or `none`.
    pub fn with_tag(predictor: LinearPredictor, tag: &str) -> Result<Self> {
        Ok(Self::new(predictor, tag.parse()?))
    }

    /// Creates a new `SplineLnp`, asking `provider` for the basis.
    ///
    /// Uses the default `PredictorOptions`, so `w_mle` is not computed.
    pub fn from_provider<P: BasisProvider + ?Sized>(
        x: Array2<f64>,
        y: Array1<f64>,
        spec: &BasisSpec,
        provider: &P,
        nonlinearity: Nonlinearity,
    ) -> Result<Self> {
        let predictor =
            LinearPredictor::from_provider(x, y, spec, provider, PredictorOptions::default())?;
        Ok(Self::new(predictor, nonlinearity))
    }

    pub fn predictor(&self) -> &LinearPredictor {
        &self.predictor
    }

    pub fn nonlinearity(&self) -> Nonlinearity {
        self.nonlinearity
    }

    pub fn fitted(&self) -> Option<&GlmFit> {
        self.fit.as_ref()
    }

    /// Evaluates the penalized cost of `config` at the coefficients `b`.
    pub fn cost(&self, b: ArrayView1<f64>, config: &GlmFitConfig) -> Result<f64> {
        LnpCost::new(&self.predictor, self.nonlinearity, config.penalty()).cost(b)
    }

    /// Fits the model, differentiating the cost with central differences.
    pub fn fit(&mut self, p0: Option<Array1<f64>>, config: &GlmFitConfig) -> Result<&GlmFit> {
        self.fit_with(p0, config, CentralDifference::default())
    }

    /// Fits the model using `gradient` to differentiate the cost.
    ///
    /// # Arguments
    /// * `p0` - The initial `n_b` coefficients, seeded gaussian noise if missing.
    /// * `config` - The hyperparameters of the fit, `num_subunits` must be one.
    /// * `gradient` - Computes the gradient of the cost.
    pub fn fit_with<G: GradientProvider>(
        &mut self,
        p0: Option<Array1<f64>>,
        config: &GlmFitConfig,
        gradient: G,
    ) -> Result<&GlmFit> {
        config.validate()?;
        if config.num_subunits != 1 {
            return Err(FitErr::InvalidConfig("LNP models have a single subunit"));
        }

        let cost = LnpCost::new(&self.predictor, self.nonlinearity, config.penalty());
        let p0 = resolve_p0(p0, self.predictor.n_b(), config.random_seed)?;

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
            nonlinearity = self.nonlinearity.tag(),
            iterations = optimized.iterations();
            "fitted spline LNP"
        );

        let fit = GlmFit::new(optimized, self.predictor.s(), 1)?;
        Ok(&*self.fit.insert(fit))
    }
}
