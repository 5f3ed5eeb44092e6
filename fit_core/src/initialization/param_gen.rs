/// A source of initial parameter values.
pub trait ParamGen {
    /// Draws up to `n` values.
    ///
    /// # Returns
    /// `None` once the generator has nothing left to hand out.
    fn sample(&mut self, n: usize) -> Option<Vec<f64>>;
}
