use std::{
    error::Error,
    fmt::{self, Display},
};

use ndarray::ShapeError;
use rand_distr::NormalError;

/// The result type used across the fitting crates.
pub type Result<T> = std::result::Result<T, FitErr>;

/// The fitting error type.
#[derive(Debug)]
pub enum FitErr {
    /// The nonlinearity tag is not one of the supported ones.
    UnsupportedNonlinearity(String),

    /// A configuration value is out of its domain.
    InvalidConfig(&'static str),

    /// A shape invariant was violated.
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },

    /// An array could not be reshaped.
    Shape(ShapeError),

    /// A matrix that has to be inverted is singular.
    Singular { what: &'static str },

    /// The least-squares solver failed.
    LeastSquares(&'static str),

    /// A singular value decomposition did not produce what was asked for.
    Svd(&'static str),

    /// The basis provider failed to build a basis.
    Basis(String),

    /// A random distribution could not be built.
    Random(String),
}

impl Display for FitErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitErr::UnsupportedNonlinearity(tag) => {
                write!(f, "nonlinearity `{tag}` is not supported")
            }
            FitErr::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            FitErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(f, "size mismatch for {what}: got {got}, expected {expected}"),
            FitErr::Shape(e) => write!(f, "shape error: {e}"),
            FitErr::Singular { what } => write!(f, "{what} is singular"),
            FitErr::LeastSquares(msg) => write!(f, "least squares failed: {msg}"),
            FitErr::Svd(msg) => write!(f, "svd failed: {msg}"),
            FitErr::Basis(msg) => write!(f, "failed to build basis: {msg}"),
            FitErr::Random(msg) => write!(f, "invalid distribution: {msg}"),
        }
    }
}

impl Error for FitErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FitErr::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for FitErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<NormalError> for FitErr {
    fn from(value: NormalError) -> Self {
        Self::Random(value.to_string())
    }
}
