//! Container capacity and the weight bounds derived from it.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fraction of the capacity at or above which an item counts as "large".
pub const LARGE_ITEM_THRESHOLD: f64 = 0.6;

/// Weight step of a normalized capacity.
pub const NORMALIZED_QUANTUM: f64 = 0.01;

/// Container capacity.
///
/// Integral capacities produce whole-number weights in `[1, capacity]`.
/// Normalized capacities have a value of `1.0` and produce continuous weights
/// in `[min_fraction, max_fraction]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Capacity {
    /// Integral capacity in weight units.
    Units(u32),
    /// Capacity normalized to 1.0 with explicit weight bounds.
    Normalized { min_fraction: f64, max_fraction: f64 },
}

impl Capacity {
    /// Creates a normalized capacity with weights bounded by `[min_fraction, max_fraction]`.
    pub fn normalized(min_fraction: f64, max_fraction: f64) -> Self {
        Capacity::Normalized {
            min_fraction,
            max_fraction,
        }
    }

    /// Checks that the capacity describes a non-empty weight range.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Capacity::Units(0) => Err(Error::invalid("capacity must be positive")),
            Capacity::Units(_) => Ok(()),
            Capacity::Normalized {
                min_fraction,
                max_fraction,
            } => {
                if !min_fraction.is_finite() || !max_fraction.is_finite() {
                    return Err(Error::invalid("normalized bounds must be finite"));
                }
                if min_fraction <= 0.0 || max_fraction > 1.0 || min_fraction > max_fraction {
                    return Err(Error::invalid(format!(
                        "normalized bounds must satisfy 0 < min <= max <= 1, got [{}, {}]",
                        min_fraction, max_fraction
                    )));
                }
                Ok(())
            }
        }
    }

    /// Capacity of one container.
    pub fn value(&self) -> f64 {
        match *self {
            Capacity::Units(units) => units as f64,
            Capacity::Normalized { .. } => 1.0,
        }
    }

    /// Inclusive weight bounds.
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            Capacity::Units(units) => (1.0, units as f64),
            Capacity::Normalized {
                min_fraction,
                max_fraction,
            } => (min_fraction, max_fraction),
        }
    }

    /// Returns true if weights are whole numbers.
    pub fn is_integral(&self) -> bool {
        matches!(self, Capacity::Units(_))
    }

    /// Smallest weight step used by the correction passes.
    pub fn quantum(&self) -> f64 {
        match self {
            Capacity::Units(_) => 1.0,
            Capacity::Normalized { .. } => NORMALIZED_QUANTUM,
        }
    }

    /// Weight at or above which an item is large.
    pub fn large_threshold(&self) -> f64 {
        LARGE_ITEM_THRESHOLD * self.value()
    }

    /// Clamps a raw value into the weight bounds, rounding integral weights.
    ///
    /// Rounding happens after clamping; both bounds of an integral capacity are
    /// whole numbers, so the result stays in range.
    pub fn clamp(&self, raw: f64) -> f64 {
        let (min, max) = self.bounds();
        let clamped = if raw.is_nan() { min } else { raw.clamp(min, max) };
        if self.is_integral() {
            clamped.round()
        } else {
            clamped
        }
    }

    /// Returns true if `weight` lies within the bounds.
    pub fn contains(&self, weight: f64) -> bool {
        let (min, max) = self.bounds();
        weight >= min && weight <= max
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Units(200)
    }
}

impl std::fmt::Display for Capacity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capacity::Units(units) => write!(f, "{}", units),
            Capacity::Normalized {
                min_fraction,
                max_fraction,
            } => write!(f, "1.0 [{}, {}]", min_fraction, max_fraction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_bounds() {
        let cap = Capacity::Units(200);
        assert_eq!(cap.bounds(), (1.0, 200.0));
        assert_eq!(cap.value(), 200.0);
        assert_eq!(cap.large_threshold(), 120.0);
        assert!(cap.is_integral());
    }

    #[test]
    fn test_clamp_rounds_integral_weights() {
        let cap = Capacity::Units(10);
        assert_eq!(cap.clamp(-3.0), 1.0);
        assert_eq!(cap.clamp(4.4), 4.0);
        assert_eq!(cap.clamp(4.6), 5.0);
        assert_eq!(cap.clamp(42.0), 10.0);
        assert_eq!(cap.clamp(f64::NAN), 1.0);
    }

    #[test]
    fn test_normalized_clamp() {
        let cap = Capacity::normalized(0.1, 0.5);
        assert_eq!(cap.value(), 1.0);
        assert_eq!(cap.clamp(0.05), 0.1);
        assert_eq!(cap.clamp(0.33), 0.33);
        assert_eq!(cap.clamp(0.9), 0.5);
    }

    #[test]
    fn test_validate() {
        assert!(Capacity::Units(0).validate().is_err());
        assert!(Capacity::normalized(0.6, 0.5).validate().is_err());
        assert!(Capacity::normalized(0.0, 0.5).validate().is_err());
        assert!(Capacity::normalized(0.1, 1.5).validate().is_err());
        assert!(Capacity::normalized(0.1, 0.1).validate().is_ok());
    }
}
