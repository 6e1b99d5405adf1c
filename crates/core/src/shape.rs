//! Distribution shapes for the base weight sequence.

use crate::error::{Error, Result};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Shape of the raw distribution a weight sequence is drawn from.
///
/// Every shape is centered on half the capacity; see
/// [`generate_base`](crate::generator::generate_base) for the exact sampling rules.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum WeightShape {
    /// Normal distribution. Standard deviation defaults to a quarter of the capacity.
    Normal {
        #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
        std_dev: Option<f64>,
    },
    /// Uniform over the weight bounds.
    Uniform,
    /// Exponential with rate `1 / mean`.
    Exponential,
    /// Normal distribution with `std_dev = cv * mean`.
    VariationCoefficient { cv: f64 },
}

impl WeightShape {
    /// Normal shape with the default spread.
    pub fn normal() -> Self {
        WeightShape::Normal { std_dev: None }
    }

    /// Normal shape driven by a coefficient of variation.
    pub fn with_cv(cv: f64) -> Self {
        WeightShape::VariationCoefficient { cv }
    }

    /// Resolves a numeric distribution code: 1 = normal, 2 = uniform, 3 = exponential.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            1 => Ok(WeightShape::normal()),
            2 => Ok(WeightShape::Uniform),
            3 => Ok(WeightShape::Exponential),
            other => Err(Error::invalid(format!(
                "unknown distribution code {} (expected 1, 2 or 3)",
                other
            ))),
        }
    }

    /// Numeric code of the shape, if it has one.
    pub fn code(&self) -> Option<u8> {
        match self {
            WeightShape::Normal { .. } => Some(1),
            WeightShape::Uniform => Some(2),
            WeightShape::Exponential => Some(3),
            WeightShape::VariationCoefficient { .. } => None,
        }
    }

    /// Rejects negative or non-finite spread parameters.
    pub fn validate(&self) -> Result<()> {
        match *self {
            WeightShape::Normal { std_dev: Some(sd) } if !(sd.is_finite() && sd >= 0.0) => Err(
                Error::invalid(format!("standard deviation must be finite and >= 0, got {}", sd)),
            ),
            WeightShape::VariationCoefficient { cv } if !(cv.is_finite() && cv >= 0.0) => Err(
                Error::invalid(format!(
                    "coefficient of variation must be finite and >= 0, got {}",
                    cv
                )),
            ),
            _ => Ok(()),
        }
    }

    /// Short label used in report columns.
    pub fn label(&self) -> String {
        match self {
            WeightShape::Normal { std_dev: None } => "normal".to_string(),
            WeightShape::Normal { std_dev: Some(sd) } => format!("normal(sd={})", sd),
            WeightShape::Uniform => "uniform".to_string(),
            WeightShape::Exponential => "exponential".to_string(),
            WeightShape::VariationCoefficient { cv } => format!("cv:{}", cv),
        }
    }
}

impl std::fmt::Display for WeightShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for WeightShape {
    type Err = Error;

    /// Accepts `normal`, `uniform`, `exponential`, `cv:<value>` or a numeric code.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        let shape = match s.as_str() {
            "normal" => WeightShape::normal(),
            "uniform" => WeightShape::Uniform,
            "exponential" => WeightShape::Exponential,
            _ => {
                if let Some(cv) = s.strip_prefix("cv:") {
                    let cv: f64 = cv.parse().map_err(|_| {
                        Error::invalid(format!("invalid coefficient of variation '{}'", cv))
                    })?;
                    WeightShape::with_cv(cv)
                } else if let Ok(code) = s.parse::<u8>() {
                    WeightShape::from_code(code)?
                } else {
                    return Err(Error::invalid(format!("unknown distribution '{}'", s)));
                }
            }
        };
        shape.validate()?;
        Ok(shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(WeightShape::from_code(1).unwrap(), WeightShape::normal());
        assert_eq!(WeightShape::from_code(2).unwrap(), WeightShape::Uniform);
        assert_eq!(WeightShape::from_code(3).unwrap(), WeightShape::Exponential);
        assert!(matches!(
            WeightShape::from_code(4),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Uniform".parse::<WeightShape>().unwrap(), WeightShape::Uniform);
        assert_eq!("3".parse::<WeightShape>().unwrap(), WeightShape::Exponential);
        assert_eq!(
            "cv:0.2".parse::<WeightShape>().unwrap(),
            WeightShape::with_cv(0.2)
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("triangular".parse::<WeightShape>().is_err());
        assert!("cv:abc".parse::<WeightShape>().is_err());
        assert!("cv:-0.1".parse::<WeightShape>().is_err());
        assert!("0".parse::<WeightShape>().is_err());
    }

    #[test]
    fn test_label_round_trip() {
        for shape in [
            WeightShape::normal(),
            WeightShape::Uniform,
            WeightShape::Exponential,
            WeightShape::with_cv(0.15),
        ] {
            assert_eq!(shape.label().parse::<WeightShape>().unwrap(), shape);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&WeightShape::with_cv(0.1)).unwrap();
        assert_eq!(json, r#"{"kind":"variation_coefficient","cv":0.1}"#);
        let parsed: WeightShape = serde_json::from_str(r#"{"kind":"normal"}"#).unwrap();
        assert_eq!(parsed, WeightShape::normal());
    }
}
