use std::{cell::RefCell, rc::Rc};

use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::ParamGen;
use crate::Result;

/// Draws initial parameters from `distribution`, up to a fixed budget.
///
/// The rng is shared so several generators can consume a single seeded stream.
pub struct RandParamGen<R: Rng, D: Distribution<f64>> {
    rng: Rc<RefCell<R>>,
    distribution: D,
    remaining: usize,
}

impl<R: Rng, D: Distribution<f64>> RandParamGen<R, D> {
    /// Creates a new `RandParamGen`.
    ///
    /// # Arguments
    /// * `rng` - The shared random stream.
    /// * `distribution` - Where the parameters are drawn from.
    /// * `limit` - The total amount of parameters this generator hands out.
    pub fn new(rng: Rc<RefCell<R>>, distribution: D, limit: usize) -> Self {
        Self {
            rng,
            distribution,
            remaining: limit,
        }
    }
}

impl<R: Rng> RandParamGen<R, Normal<f64>> {
    /// A generator of gaussian parameters.
    ///
    /// # Returns
    /// `FitErr::Random` if `std_dev` is NaN or infinite.
    pub fn normal(rng: Rc<RefCell<R>>, limit: usize, mean: f64, std_dev: f64) -> Result<Self> {
        let distribution = Normal::new(mean, std_dev)?;
        Ok(Self::new(rng, distribution, limit))
    }
}

impl<R: Rng, D: Distribution<f64>> ParamGen for RandParamGen<R, D> {
    fn sample(&mut self, n: usize) -> Option<Vec<f64>> {
        if self.remaining == 0 {
            return None;
        }

        let take = n.min(self.remaining);
        self.remaining -= take;

        let mut rng = self.rng.borrow_mut();
        Some(
            (0..take)
                .map(|_| self.distribution.sample(&mut *rng))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn seeded_rng(seed: u64) -> Rc<RefCell<StdRng>> {
        Rc::new(RefCell::new(StdRng::seed_from_u64(seed)))
    }

    #[test]
    fn empty() {
        let mut param_gen = RandParamGen::normal(seeded_rng(42), 0, 0., 1.).unwrap();
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn partial() {
        let mut param_gen = RandParamGen::normal(seeded_rng(42), 10, 0., 1.).unwrap();

        assert_eq!(param_gen.sample(7).unwrap().len(), 7);
        assert_eq!(param_gen.sample(7).unwrap().len(), 3);
        assert!(param_gen.sample(1).is_none());
    }

    #[test]
    fn same_seed_same_sample() {
        let mut a = RandParamGen::normal(seeded_rng(2046), 5, 0., 0.01).unwrap();
        let mut b = RandParamGen::normal(seeded_rng(2046), 5, 0., 0.01).unwrap();

        let sample = a.sample(5).unwrap();
        assert_eq!(sample, b.sample(5).unwrap());
        assert!(sample.iter().all(|x| x.abs() < 0.1));
    }

    #[test]
    fn invalid_std_dev_fails() {
        assert!(RandParamGen::normal(seeded_rng(0), 1, 0., f64::NAN).is_err());
    }
}
