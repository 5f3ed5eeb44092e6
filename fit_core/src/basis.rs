use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::{FitErr, Result};

/// The kind of smoothing spline used to build a basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smooth {
    /// Natural cubic regression splines.
    Cr,
    /// B-splines.
    Bs,
}

/// What a basis provider needs to build a basis matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasisSpec {
    /// The shape of the filter, ordered as `[t, y, x]`.
    pub dims: Vec<usize>,
    /// Degrees of freedom along every dimension.
    pub df: Vec<usize>,
    pub smooth: Smooth,
}

impl BasisSpec {
    /// Creates a new `BasisSpec`.
    pub fn new(dims: Vec<usize>, df: Vec<usize>, smooth: Smooth) -> Self {
        Self { dims, df, smooth }
    }

    /// The amount of features the basis spans, the product of `dims`.
    pub fn n_features(&self) -> usize {
        self.dims.iter().product()
    }
}

/// Builds the `(features, coefficients)` basis matrix `S` of a spline
/// parameterization, so that full weights are `w = S b`.
pub trait BasisProvider {
    /// Builds the basis described by `spec`.
    ///
    /// # Returns
    /// The basis matrix, or a `FitErr::Basis` if it can't be built.
    fn build(&self, spec: &BasisSpec) -> Result<Array2<f64>>;
}

impl<F> BasisProvider for F
where
    F: Fn(&BasisSpec) -> Result<Array2<f64>>,
{
    fn build(&self, spec: &BasisSpec) -> Result<Array2<f64>> {
        self(spec)
    }
}

/// A provider that hands out an already built basis.
#[derive(Debug, Clone)]
pub struct PrecomputedBasis(Array2<f64>);

impl PrecomputedBasis {
    pub fn new(basis: Array2<f64>) -> Self {
        Self(basis)
    }
}

impl BasisProvider for PrecomputedBasis {
    fn build(&self, spec: &BasisSpec) -> Result<Array2<f64>> {
        let expected = spec.n_features();

        if self.0.nrows() != expected {
            return Err(FitErr::Basis(format!(
                "precomputed basis has {} rows but dims {:?} span {expected} features",
                self.0.nrows(),
                spec.dims
            )));
        }

        Ok(self.0.clone())
    }
}

/// The degenerate basis, `S = I`, which leaves the parameterization unreduced.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityBasis;

impl BasisProvider for IdentityBasis {
    fn build(&self, spec: &BasisSpec) -> Result<Array2<f64>> {
        Ok(Array2::eye(spec.n_features()))
    }
}
