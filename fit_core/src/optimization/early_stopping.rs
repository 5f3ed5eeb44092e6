use std::collections::VecDeque;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Cost changes below this magnitude count as a plateau.
pub const PLATEAU_TOL: f64 = 1e-5;

/// Why an optimization run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The cost increased on every step of the window.
    Increasing,
    /// The cost changed less than `PLATEAU_TOL` on every step of the window.
    Plateau,
    /// The iteration budget was exhausted.
    MaxIters,
}

/// A sliding window over the last `tolerance + 1` (params, cost) pairs of a
/// run, deciding when to stop early.
#[derive(Debug)]
pub struct EarlyStopping {
    tolerance: usize,
    params: VecDeque<Array1<f64>>,
    costs: VecDeque<f64>,
}

impl EarlyStopping {
    /// Creates a new `EarlyStopping`.
    ///
    /// # Arguments
    /// * `tolerance` - The amount of consecutive steps the stopping rules look at.
    pub fn new(tolerance: usize) -> Self {
        Self {
            tolerance,
            params: VecDeque::with_capacity(tolerance + 1),
            costs: VecDeque::with_capacity(tolerance + 1),
        }
    }

    /// Records a step and evaluates the stopping rules.
    ///
    /// # Arguments
    /// * `params` - The parameters after the step.
    /// * `cost` - The cost at `params`.
    ///
    /// # Returns
    /// `None` to keep going, otherwise the reason to stop and the parameters to
    /// keep: the oldest of the window when the cost kept increasing, the newest
    /// on a plateau.
    pub fn push(&mut self, params: Array1<f64>, cost: f64) -> Option<(StopReason, Array1<f64>)> {
        self.params.push_back(params);
        self.costs.push_back(cost);

        if self.costs.len() <= self.tolerance {
            return None;
        }

        let mut deltas = self
            .costs
            .iter()
            .zip(self.costs.iter().skip(1))
            .map(|(prev, next)| next - prev);

        if deltas.clone().all(|d| d > 0.) {
            return self
                .params
                .pop_front()
                .map(|oldest| (StopReason::Increasing, oldest));
        }

        if deltas.all(|d| d.abs() < PLATEAU_TOL) {
            return self
                .params
                .pop_back()
                .map(|newest| (StopReason::Plateau, newest));
        }

        self.params.pop_front();
        self.costs.pop_front();
        None
    }

    /// The amount of entries currently in the window.
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn feed(stopping: &mut EarlyStopping, costs: &[f64]) -> Option<(usize, StopReason, Array1<f64>)> {
        costs.iter().enumerate().find_map(|(i, &c)| {
            stopping
                .push(array![i as f64], c)
                .map(|(reason, params)| (i, reason, params))
        })
    }

    #[test]
    fn increasing_window_returns_oldest() {
        let mut stopping = EarlyStopping::new(3);
        let costs = [10., 9., 8., 8.5, 9., 9.5, 10.];

        let (i, reason, params) = feed(&mut stopping, &costs).unwrap();

        assert_eq!(reason, StopReason::Increasing);
        assert_eq!(i, 5);
        assert_eq!(params, array![2.]);
    }

    #[test]
    fn plateau_returns_newest() {
        let mut stopping = EarlyStopping::new(3);
        let costs = [5., 4., 3., 3. - 1e-6, 3. - 2e-6, 3. - 2.5e-6, 3.];

        let (i, reason, params) = feed(&mut stopping, &costs).unwrap();

        assert_eq!(reason, StopReason::Plateau);
        assert_eq!(i, 5);
        assert_eq!(params, array![5.]);
    }

    #[test]
    fn steady_descent_never_stops() {
        let mut stopping = EarlyStopping::new(2);
        let costs: Vec<f64> = (0..20).map(|i| 100. - i as f64).collect();

        assert!(feed(&mut stopping, &costs).is_none());
        assert_eq!(stopping.len(), 2);
    }

    #[test]
    fn needs_more_than_tolerance_entries() {
        let mut stopping = EarlyStopping::new(4);
        let costs = [1., 2., 3., 4.];

        assert!(feed(&mut stopping, &costs).is_none());
        assert!(stopping.push(array![9.], 5.).is_some());
    }
}
