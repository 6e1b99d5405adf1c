//! Controlled weight-sequence generation.
//!
//! A sequence is produced by a three-stage pipeline, each stage returning a new
//! sequence:
//!
//! 1. [`generate_base`] draws raw values from a [`WeightShape`] and clamps them
//!    into the capacity bounds.
//! 2. [`correct_large_ratio`] shifts the whole sequence so that the share of
//!    large items (`>= 0.6 * capacity`) approaches the target. A uniform shift
//!    keeps the spread of the distribution.
//! 3. [`correct_standard_ratio`] snaps or nudges randomly chosen items so that
//!    the share of standard items (whole multiples of 5 quanta) approaches the
//!    target. Each touched item moves by a few quanta at most.
//!
//! Targets are goals, not guarantees: [`AchievedMetrics`] reports what the final
//! sequence actually looks like.

use crate::capacity::Capacity;
use crate::error::{Error, Result};
use crate::shape::WeightShape;
use crate::stats;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Exp, Normal};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Standard weights are whole multiples of this many quanta.
pub const STANDARD_MULTIPLE: i64 = 5;

/// Tolerance when testing whether a weight sits on the quantum grid.
const GRID_EPSILON: f64 = 1e-6;

/// Generation targets for one weight sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlParameters {
    /// Number of items to generate.
    pub item_count: usize,
    /// Shape of the base distribution.
    pub shape: WeightShape,
    /// Target share of large items. `None` skips the correction.
    pub large_items_ratio: Option<f64>,
    /// Target share of standard items. `None` skips the correction.
    pub standard_ratio: Option<f64>,
    /// Container capacity bounding every weight.
    pub capacity: Capacity,
}

impl ControlParameters {
    /// Creates parameters without ratio targets.
    pub fn new(item_count: usize, shape: WeightShape, capacity: Capacity) -> Self {
        Self {
            item_count,
            shape,
            large_items_ratio: None,
            standard_ratio: None,
            capacity,
        }
    }

    /// Sets the large-item ratio target.
    pub fn with_large_items_ratio(mut self, ratio: f64) -> Self {
        self.large_items_ratio = Some(ratio);
        self
    }

    /// Sets the standard-item ratio target.
    pub fn with_standard_ratio(mut self, ratio: f64) -> Self {
        self.standard_ratio = Some(ratio);
        self
    }

    /// Validates shape, capacity and ratio targets.
    pub fn validate(&self) -> Result<()> {
        self.shape.validate()?;
        self.capacity.validate()?;
        for (name, ratio) in [
            ("large items ratio", self.large_items_ratio),
            ("standard ratio", self.standard_ratio),
        ] {
            if let Some(r) = ratio {
                if !(0.0..=1.0).contains(&r) {
                    return Err(Error::invalid(format!(
                        "{} must lie in [0, 1], got {}",
                        name, r
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Properties measured on a generated sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AchievedMetrics {
    pub item_count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub coefficient_of_variation: f64,
    pub large_items_ratio: f64,
    pub standard_ratio: f64,
}

impl AchievedMetrics {
    /// Measures a sequence against a capacity. All ratios are zero for an empty sequence.
    pub fn measure(weights: &[f64], capacity: &Capacity) -> Self {
        let threshold = capacity.large_threshold();
        Self {
            item_count: weights.len(),
            mean: stats::mean(weights),
            std_dev: stats::std_dev(weights),
            coefficient_of_variation: stats::coefficient_of_variation(weights),
            large_items_ratio: stats::ratio_of(weights, |w| w >= threshold),
            standard_ratio: stats::ratio_of(weights, |w| is_standard(w, capacity)),
        }
    }
}

/// Generator producing weight sequences for fixed control parameters.
#[derive(Debug, Clone)]
pub struct WeightGenerator {
    params: ControlParameters,
}

impl WeightGenerator {
    /// Creates a generator, rejecting invalid parameters up front.
    pub fn new(params: ControlParameters) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Returns the control parameters.
    pub fn params(&self) -> &ControlParameters {
        &self.params
    }

    /// Generates one sequence and measures it.
    ///
    /// A zero item count yields an empty sequence and all-zero metrics.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<(Vec<f64>, AchievedMetrics)> {
        let p = &self.params;
        if p.item_count == 0 {
            return Ok((Vec::new(), AchievedMetrics::default()));
        }

        let mut weights = generate_base(p.shape, p.item_count, &p.capacity, rng)?;
        if let Some(target) = p.large_items_ratio {
            weights = correct_large_ratio(&weights, target, &p.capacity);
        }
        if let Some(target) = p.standard_ratio {
            weights = correct_standard_ratio(&weights, target, &p.capacity, rng);
        }

        let metrics = AchievedMetrics::measure(&weights, &p.capacity);
        log::trace!(
            "generated {} weights ({}): large {:.3} (target {:?}), standard {:.3} (target {:?}), cv {:.3}",
            metrics.item_count,
            p.shape,
            metrics.large_items_ratio,
            p.large_items_ratio,
            metrics.standard_ratio,
            p.standard_ratio,
            metrics.coefficient_of_variation
        );
        Ok((weights, metrics))
    }
}

/// Draws `item_count` raw values from `shape`, clamped into the capacity bounds.
///
/// The distribution mean is half the capacity. Integral capacities produce whole
/// numbers; uniform sampling is then integer-valued over `[1, capacity]`.
pub fn generate_base<R: Rng>(
    shape: WeightShape,
    item_count: usize,
    capacity: &Capacity,
    rng: &mut R,
) -> Result<Vec<f64>> {
    shape.validate()?;
    capacity.validate()?;

    let mean = capacity.value() / 2.0;
    let raw: Vec<f64> = match shape {
        WeightShape::Normal { std_dev } => {
            let sd = std_dev.unwrap_or(capacity.value() / 4.0);
            sample_normal(mean, sd, item_count, rng)?
        }
        WeightShape::VariationCoefficient { cv } => sample_normal(mean, cv * mean, item_count, rng)?,
        WeightShape::Uniform => match *capacity {
            Capacity::Units(units) => (0..item_count)
                .map(|_| rng.gen_range(1..=units) as f64)
                .collect(),
            Capacity::Normalized {
                min_fraction,
                max_fraction,
            } => (0..item_count)
                .map(|_| rng.gen_range(min_fraction..=max_fraction))
                .collect(),
        },
        WeightShape::Exponential => {
            let exp = Exp::new(1.0 / mean)
                .map_err(|e| Error::invalid(format!("exponential rate: {}", e)))?;
            (0..item_count).map(|_| exp.sample(rng)).collect()
        }
    };

    Ok(raw.into_iter().map(|v| capacity.clamp(v)).collect())
}

fn sample_normal<R: Rng>(mean: f64, std_dev: f64, n: usize, rng: &mut R) -> Result<Vec<f64>> {
    let normal = Normal::new(mean, std_dev)
        .map_err(|e| Error::invalid(format!("normal distribution: {}", e)))?;
    Ok((0..n).map(|_| normal.sample(rng)).collect())
}

/// Shifts every weight by a common number of quanta so that the share of large
/// items gets as close as possible to `target`.
///
/// The first candidate examined is the classic step `round((target - current) * n)`;
/// the shift is then refined over the monotone count of large items, so ties
/// between equal weights and clamping at the bounds are the only reasons the
/// target is missed. Among equally close shifts the smaller one wins.
pub fn correct_large_ratio(weights: &[f64], target: f64, capacity: &Capacity) -> Vec<f64> {
    let n = weights.len();
    if n == 0 {
        return Vec::new();
    }

    let desired = (target * n as f64).round() as usize;
    let current = large_count_after_shift(weights, 0, capacity);
    if current == desired {
        return weights.to_vec();
    }

    let quantum = capacity.quantum();
    let (min, max) = capacity.bounds();
    let span = ((max - min) / quantum).ceil().max(1.0) as i64;
    let count = |shift: i64| large_count_after_shift(weights, shift, capacity);
    let distance = |shift: i64| count(shift).abs_diff(desired);

    let initial = ((desired as f64 - current as f64).round() as i64).clamp(-span, span);
    let shift = if current < desired {
        // Counts grow with the shift: find the first shift reaching the target.
        let reach = if count(initial) >= desired {
            first_satisfying(1, initial, |s| count(s) >= desired)
        } else {
            first_satisfying(initial.max(1), span, |s| count(s) >= desired)
        };
        match reach {
            Some(s) => closer(s - 1, s, &distance),
            None => {
                let best = count(span);
                first_satisfying(0, span, |s| count(s) >= best).unwrap_or(0)
            }
        }
    } else {
        // Counts shrink as the shift goes negative.
        let initial = -initial;
        let reach = if count(-initial) <= desired {
            first_satisfying(1, initial, |m| count(-m) <= desired)
        } else {
            first_satisfying(initial.max(1), span, |m| count(-m) <= desired)
        };
        match reach {
            Some(m) => closer(-(m - 1), -m, &distance),
            None => {
                let best = count(-span);
                -first_satisfying(0, span, |m| count(-m) <= best).unwrap_or(0)
            }
        }
    };

    if count(shift) != desired {
        log::debug!(
            "large-item target {} unreachable by shifting: best count {} of {} (shift {})",
            target,
            count(shift),
            n,
            shift
        );
    }
    if shift == 0 {
        return weights.to_vec();
    }

    let delta = shift as f64 * quantum;
    weights.iter().map(|&w| capacity.clamp(w + delta)).collect()
}

fn large_count_after_shift(weights: &[f64], shift: i64, capacity: &Capacity) -> usize {
    let threshold = capacity.large_threshold();
    let delta = shift as f64 * capacity.quantum();
    weights
        .iter()
        .filter(|&&w| capacity.clamp(w + delta) >= threshold)
        .count()
}

/// Smallest `x` in `[lo, hi]` satisfying a monotone (false then true) predicate.
fn first_satisfying<F>(mut lo: i64, mut hi: i64, pred: F) -> Option<i64>
where
    F: Fn(i64) -> bool,
{
    if lo > hi || !pred(hi) {
        return None;
    }
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Some(lo)
}

/// Picks the shift with the smaller miss; `inner` (closer to zero) wins ties.
fn closer<F>(inner: i64, outer: i64, distance: &F) -> i64
where
    F: Fn(i64) -> usize,
{
    if distance(outer) < distance(inner) {
        outer
    } else {
        inner
    }
}

/// Returns true if `weight` is a whole multiple of [`STANDARD_MULTIPLE`] quanta.
pub fn is_standard(weight: f64, capacity: &Capacity) -> bool {
    let steps = weight / capacity.quantum();
    let rounded = steps.round();
    (steps - rounded).abs() < GRID_EPSILON && (rounded as i64) % STANDARD_MULTIPLE == 0
}

/// Nearest standard weight within the bounds; ties go to the lower multiple.
///
/// Returns `None` when no multiple of the standard step fits the bounds.
pub fn snap_to_standard(weight: f64, capacity: &Capacity) -> Option<f64> {
    let quantum = capacity.quantum();
    let step = STANDARD_MULTIPLE as f64;
    let units = weight / quantum;
    let lower = (units / step).floor() * step;
    let upper = lower + step;

    let candidates = if units - lower <= upper - units {
        [lower, upper]
    } else {
        [upper, lower]
    };
    let (min, max) = capacity.bounds();
    candidates
        .into_iter()
        .map(|units| units * quantum)
        .find(|&w| w >= min - GRID_EPSILON * quantum && w <= max + GRID_EPSILON * quantum)
        .map(|w| w.clamp(min, max))
}

/// Moves a standard weight one quantum up or down, staying within the bounds.
fn destandardize<R: Rng>(weight: f64, capacity: &Capacity, rng: &mut R) -> f64 {
    let quantum = capacity.quantum();
    let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
    [weight + direction * quantum, weight - direction * quantum]
        .into_iter()
        .find(|&w| capacity.contains(w))
        .unwrap_or(weight)
}

/// Converts randomly chosen items so that the share of standard items
/// approaches `target`.
///
/// Below target, `round((target - current) * n)` non-standard items (or all of
/// them, if fewer) are snapped to their nearest standard weight. Above target,
/// the same number of standard items are nudged by one quantum. The sequence
/// length never changes.
pub fn correct_standard_ratio<R: Rng>(
    weights: &[f64],
    target: f64,
    capacity: &Capacity,
    rng: &mut R,
) -> Vec<f64> {
    let n = weights.len();
    let mut corrected = weights.to_vec();
    if n == 0 {
        return corrected;
    }

    let standard: Vec<usize> = (0..n)
        .filter(|&i| is_standard(weights[i], capacity))
        .collect();
    let current = standard.len();
    let desired = (target * n as f64).round() as usize;

    if current < desired {
        let non_standard: Vec<usize> = (0..n)
            .filter(|&i| !is_standard(weights[i], capacity))
            .collect();
        for &i in non_standard.choose_multiple(rng, desired - current) {
            if let Some(snapped) = snap_to_standard(corrected[i], capacity) {
                corrected[i] = snapped;
            }
        }
    } else if current > desired {
        for &i in standard.choose_multiple(rng, current - desired) {
            corrected[i] = destandardize(corrected[i], capacity, rng);
        }
    }

    corrected
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_is_standard() {
        let cap = Capacity::Units(200);
        assert!(is_standard(5.0, &cap));
        assert!(is_standard(200.0, &cap));
        assert!(!is_standard(7.0, &cap));

        let norm = Capacity::normalized(0.1, 1.0);
        assert!(is_standard(0.35, &norm));
        assert!(!is_standard(0.34, &norm));
        assert!(!is_standard(0.3512, &norm));
    }

    #[test]
    fn test_snap_to_standard() {
        let cap = Capacity::Units(200);
        assert_eq!(snap_to_standard(12.0, &cap), Some(10.0));
        assert_eq!(snap_to_standard(13.0, &cap), Some(15.0));
        // 12.5 is not integral but shows the tie rule.
        assert_eq!(snap_to_standard(12.5, &cap), Some(10.0));
        // Lower multiple 0 is out of bounds.
        assert_eq!(snap_to_standard(2.0, &cap), Some(5.0));
        assert_eq!(snap_to_standard(3.0, &Capacity::Units(4)), None);
    }

    #[test]
    fn test_snap_respects_upper_bound() {
        let cap = Capacity::Units(198);
        assert_eq!(snap_to_standard(198.0, &cap), Some(195.0));
    }

    #[test]
    fn test_base_within_bounds() {
        let mut rng = rng();
        let cap = Capacity::Units(200);
        for shape in [
            WeightShape::normal(),
            WeightShape::Uniform,
            WeightShape::Exponential,
            WeightShape::with_cv(0.9),
        ] {
            let weights = generate_base(shape, 500, &cap, &mut rng).unwrap();
            assert_eq!(weights.len(), 500);
            for w in weights {
                assert!((1.0..=200.0).contains(&w), "{} out of bounds for {}", w, shape);
                assert_eq!(w.fract(), 0.0);
            }
        }
    }

    #[test]
    fn test_zero_cv_is_constant() {
        let mut rng = rng();
        let weights =
            generate_base(WeightShape::with_cv(0.0), 20, &Capacity::Units(200), &mut rng).unwrap();
        assert!(weights.iter().all(|&w| w == 100.0));
    }

    #[test]
    fn test_normalized_uniform_within_bounds() {
        let mut rng = rng();
        let cap = Capacity::normalized(0.1, 0.5);
        let weights = generate_base(WeightShape::Uniform, 300, &cap, &mut rng).unwrap();
        assert!(weights.iter().all(|&w| (0.1..=0.5).contains(&w)));
    }

    #[test]
    fn test_large_ratio_shift_up() {
        let cap = Capacity::Units(100);
        // Threshold is 60; weights 10..=100 step 10.
        let weights: Vec<f64> = (1..=10).map(|i| i as f64 * 10.0).collect();
        let corrected = correct_large_ratio(&weights, 0.7, &cap);
        let ratio = stats::ratio_of(&corrected, |w| w >= 60.0);
        assert_relative_eq!(ratio, 0.7);
        // Smallest shift reaching 7 large items moves 40 up to 60.
        assert_eq!(corrected[0], 30.0);
    }

    #[test]
    fn test_large_ratio_shift_down() {
        let cap = Capacity::Units(100);
        let weights: Vec<f64> = (1..=10).map(|i| i as f64 * 10.0).collect();
        let corrected = correct_large_ratio(&weights, 0.2, &cap);
        let ratio = stats::ratio_of(&corrected, |w| w >= 60.0);
        assert_relative_eq!(ratio, 0.2);
        assert_eq!(corrected[0], 1.0);
    }

    #[test]
    fn test_large_ratio_unchanged_when_on_target() {
        let cap = Capacity::Units(100);
        let weights = vec![10.0, 70.0];
        assert_eq!(correct_large_ratio(&weights, 0.5, &cap), weights);
    }

    #[test]
    fn test_large_ratio_unreachable_when_bounds_below_threshold() {
        let cap = Capacity::normalized(0.1, 0.5);
        let weights = vec![0.1, 0.2, 0.3, 0.4, 0.5];
        let corrected = correct_large_ratio(&weights, 0.8, &cap);
        assert_eq!(corrected, weights);
    }

    #[test]
    fn test_standard_ratio_increase() {
        let mut rng = rng();
        let cap = Capacity::Units(200);
        let weights: Vec<f64> = (0..100).map(|i| ((i % 39) * 5 + 6) as f64).collect();
        let corrected = correct_standard_ratio(&weights, 0.4, &cap, &mut rng);
        assert_eq!(corrected.len(), weights.len());
        let ratio = stats::ratio_of(&corrected, |w| is_standard(w, &cap));
        assert_relative_eq!(ratio, 0.4);
        for (a, b) in weights.iter().zip(&corrected) {
            assert!((a - b).abs() <= 2.0);
        }
    }

    #[test]
    fn test_standard_ratio_decrease() {
        let mut rng = rng();
        let cap = Capacity::Units(200);
        let weights: Vec<f64> = (1..=40).map(|i| (i * 5) as f64).collect();
        let corrected = correct_standard_ratio(&weights, 0.25, &cap, &mut rng);
        let ratio = stats::ratio_of(&corrected, |w| is_standard(w, &cap));
        assert_relative_eq!(ratio, 0.25);
        assert!(corrected.iter().all(|&w| cap.contains(w)));
        for (a, b) in weights.iter().zip(&corrected) {
            assert!((a - b).abs() <= 1.0);
        }
    }

    #[test]
    fn test_generate_empty() {
        let mut rng = rng();
        let params = ControlParameters::new(0, WeightShape::Uniform, Capacity::Units(10))
            .with_large_items_ratio(0.5)
            .with_standard_ratio(0.5);
        let (weights, metrics) = WeightGenerator::new(params).unwrap().generate(&mut rng).unwrap();
        assert!(weights.is_empty());
        assert_eq!(metrics, AchievedMetrics::default());
    }

    #[test]
    fn test_rejects_bad_ratio() {
        let params = ControlParameters::new(10, WeightShape::Uniform, Capacity::Units(10))
            .with_large_items_ratio(1.5);
        assert!(matches!(
            WeightGenerator::new(params),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_generate_reports_achieved_metrics() {
        let mut rng = rng();
        let params = ControlParameters::new(200, WeightShape::normal(), Capacity::Units(200))
            .with_large_items_ratio(0.3)
            .with_standard_ratio(0.5);
        let (weights, metrics) = WeightGenerator::new(params).unwrap().generate(&mut rng).unwrap();
        assert_eq!(metrics, AchievedMetrics::measure(&weights, &params.capacity));
        assert_eq!(metrics.item_count, 200);
        assert!((metrics.standard_ratio - 0.5).abs() <= 0.05);
    }
}
