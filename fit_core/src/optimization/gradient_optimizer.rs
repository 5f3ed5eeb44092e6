use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use super::{
    Adam, EarlyStopping, GradientDescent, GradientDescentWithMomentum, Optimizer, StopReason,
};
use crate::{
    Result,
    gradient::{CostFn, GradientProvider},
};

/// The step rule used by a `GradientOptimizer`. The learning rate is always
/// the optimizer's `step_size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptimizerConfig {
    Adam { b1: f64, b2: f64, eps: f64 },
    GradientDescent,
    GradientDescentWithMomentum { mu: f64 },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::Adam {
            b1: 0.9,
            b2: 0.999,
            eps: 1e-8,
        }
    }
}

impl OptimizerConfig {
    /// Builds the optimizer for `len` parameters.
    pub fn build(&self, len: usize, step_size: f64) -> Box<dyn Optimizer> {
        match *self {
            OptimizerConfig::Adam { b1, b2, eps } => Box::new(Adam::new(len, step_size, b1, b2, eps)),
            OptimizerConfig::GradientDescent => Box::new(GradientDescent::new(step_size)),
            OptimizerConfig::GradientDescentWithMomentum { mu } => {
                Box::new(GradientDescentWithMomentum::new(len, step_size, mu))
            }
        }
    }
}

/// The outcome of a `GradientOptimizer::minimize` run.
#[derive(Debug, Clone)]
pub struct Optimized {
    /// The parameters selected by the stopping rule.
    pub params: Array1<f64>,
    /// The cost after every iteration that ran.
    pub costs: Vec<f64>,
    pub stop: StopReason,
}

impl Optimized {
    /// The amount of iterations that ran.
    pub fn iterations(&self) -> usize {
        self.costs.len()
    }
}

/// Minimizes a scalar cost with a first order method, stopping early when the
/// cost keeps increasing or plateaus for `tolerance` steps.
#[derive(Debug, Clone)]
pub struct GradientOptimizer<G: GradientProvider> {
    gradient: G,
    optimizer: OptimizerConfig,
    num_iters: usize,
    step_size: f64,
    tolerance: usize,
    verbal: usize,
}

impl<G: GradientProvider> GradientOptimizer<G> {
    /// Creates a new `GradientOptimizer` running Adam.
    ///
    /// # Arguments
    /// * `gradient` - Computes the gradient of the cost on every step.
    /// * `num_iters` - The iteration budget.
    /// * `step_size` - The learning rate of the step rule.
    /// * `tolerance` - The length of the early stopping window.
    pub fn new(gradient: G, num_iters: usize, step_size: f64, tolerance: usize) -> Self {
        Self {
            gradient,
            optimizer: OptimizerConfig::default(),
            num_iters,
            step_size,
            tolerance,
            verbal: 0,
        }
    }

    /// Replaces the step rule.
    pub fn with_optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Logs the cost every `verbal` iterations, `0` disables progress logs.
    pub fn with_verbal(mut self, verbal: usize) -> Self {
        self.verbal = verbal;
        self
    }

    /// Runs the optimization starting from `p0`.
    ///
    /// # Arguments
    /// * `cost` - The function to minimize.
    /// * `p0` - The initial parameters.
    ///
    /// # Returns
    /// The selected parameters together with the cost trace, or the first error
    /// raised by the cost or the gradient.
    pub fn minimize<C: CostFn + ?Sized>(&self, cost: &C, p0: Array1<f64>) -> Result<Optimized> {
        let Self {
            num_iters,
            tolerance,
            verbal,
            ..
        } = *self;

        let mut optimizer = self.optimizer.build(p0.len(), self.step_size);
        let mut stopping = EarlyStopping::new(tolerance);
        let mut costs = Vec::with_capacity(num_iters);
        let mut params = p0;

        if verbal > 0 {
            info!("Iter\tCost");
        }

        for i in 0..num_iters {
            let grad = self.gradient.gradient(cost, params.view())?;
            optimizer.update_params(grad.view(), params.view_mut())?;

            let c = cost.cost(params.view())?;
            costs.push(c);
            debug!(iter = i, cost = c; "optimizer step");

            if verbal > 0 && i % verbal == 0 {
                info!("{i}\t{c:.3}");
            }

            let Some((stop, params)) = stopping.push(params.clone(), c) else {
                continue;
            };

            if verbal > 0 {
                match stop {
                    StopReason::Increasing => info!(
                        "Stop at {i} steps: cost has been monotonically increasing for {tolerance} steps."
                    ),
                    _ => info!(
                        "Stop at {i} steps: cost has been changing less than 1e-5 for {tolerance} steps."
                    ),
                }
            }

            return Ok(Optimized {
                params,
                costs,
                stop,
            });
        }

        if verbal > 0 {
            if let Some(last) = costs.last() {
                info!("Stop: reached {num_iters} steps, final cost={last}.");
            }
        }

        Ok(Optimized {
            params,
            costs,
            stop: StopReason::MaxIters,
        })
    }
}
