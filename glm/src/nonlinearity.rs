use std::{fmt, str::FromStr};

use fit_core::FitErr;
use serde::{Deserialize, Serialize};

/// Offset added to the softplus of single stage models, keeps `log(r)` finite.
pub const SOFTPLUS_OFFSET: f64 = 1e-7;

/// Lower bound of the rectified linear nonlinearity.
pub const RELU_FLOOR: f64 = 1e-7;

/// `log(1 + exp(x))`, evaluated without overflowing for large `x`.
pub fn softplus(x: f64) -> f64 {
    x.max(0.) + (-x.abs()).exp().ln_1p()
}

/// The pointwise nonlinearity of a single stage (LNP) model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nonlinearity {
    #[default]
    Softplus,
    Exponential,
    Relu,
    /// The identity, tagged `none`.
    #[serde(rename = "none")]
    Identity,
}

impl Nonlinearity {
    /// Applies the nonlinearity to `x`.
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Nonlinearity::Softplus => softplus(x) + SOFTPLUS_OFFSET,
            Nonlinearity::Exponential => x.exp(),
            Nonlinearity::Relu => x.max(RELU_FLOOR),
            Nonlinearity::Identity => x,
        }
    }

    /// The tag this nonlinearity is parsed from.
    pub fn tag(&self) -> &'static str {
        match self {
            Nonlinearity::Softplus => "softplus",
            Nonlinearity::Exponential => "exponential",
            Nonlinearity::Relu => "relu",
            Nonlinearity::Identity => "none",
        }
    }
}

impl FromStr for Nonlinearity {
    type Err = FitErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "softplus" => Ok(Nonlinearity::Softplus),
            "exponential" => Ok(Nonlinearity::Exponential),
            "relu" => Ok(Nonlinearity::Relu),
            "none" => Ok(Nonlinearity::Identity),
            other => Err(FitErr::UnsupportedNonlinearity(other.to_string())),
        }
    }
}

impl fmt::Display for Nonlinearity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn softplus_matches_the_naive_form() {
        for x in [-30., -2., -0.5, 0., 0.5, 2., 30.] {
            assert_abs_diff_eq!(softplus(x), (1. + f64::exp(x)).ln(), epsilon = 1e-12);
        }
    }

    #[test]
    fn softplus_does_not_overflow() {
        assert_eq!(softplus(1000.), 1000.);
        assert!(softplus(-1000.) >= 0.);
    }

    #[test]
    fn apply() {
        assert_abs_diff_eq!(
            Nonlinearity::Softplus.apply(0.),
            2f64.ln() + 1e-7,
            epsilon = 1e-15
        );
        assert_eq!(Nonlinearity::Exponential.apply(1.), 1f64.exp());
        assert_eq!(Nonlinearity::Relu.apply(-3.), 1e-7);
        assert_eq!(Nonlinearity::Relu.apply(3.), 3.);
        assert_eq!(Nonlinearity::Identity.apply(-3.), -3.);
    }

    #[test]
    fn parse_tags() {
        for nl in [
            Nonlinearity::Softplus,
            Nonlinearity::Exponential,
            Nonlinearity::Relu,
            Nonlinearity::Identity,
        ] {
            assert_eq!(nl.tag().parse::<Nonlinearity>().unwrap(), nl);
            assert_eq!(serde_json::to_string(&nl).unwrap(), format!("\"{nl}\""));
        }
    }

    #[test]
    fn unknown_tag_fails() {
        let err = "sigmoid".parse::<Nonlinearity>().unwrap_err();
        assert!(matches!(err, FitErr::UnsupportedNonlinearity(tag) if tag == "sigmoid"));
        assert!(serde_json::from_str::<Nonlinearity>(r#""sigmoid""#).is_err());
    }
}
