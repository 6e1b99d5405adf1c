//! Experiment plans: the parameter grids of each study and their presets.
//!
//! A plan expands into an ordered list of [`GridPoint`]s, the Cartesian
//! product of its axes in outer-to-inner order.

use crate::error::ReportError;
use crate::result::{Aggregation, ReportVariant, RowKey};
use serde::{Deserialize, Serialize};
use std::path::Path;
use u_firstfit_core::{Capacity, ControlParameters, Error, Result, WeightShape};

/// Default number of trials per grid point.
pub const DEFAULT_REPETITIONS: usize = 100;

/// Lower weight bound of the raw-dump study (fraction of capacity).
pub const DEFAULT_MIN_FRACTION: f64 = 0.1;

/// Parameter grid of one study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ExperimentPlan {
    /// Distribution shape vs. large/standard ratios, mean container counts.
    ShapeStudy {
        item_counts: Vec<usize>,
        shapes: Vec<WeightShape>,
        large_items_ratios: Vec<f64>,
        standard_ratios: Vec<f64>,
        capacity: u32,
    },
    /// Coefficient of variation vs. large/standard ratios, mean container counts.
    VariationStudy {
        item_counts: Vec<usize>,
        coefficients_of_variation: Vec<f64>,
        large_items_ratios: Vec<f64>,
        standard_ratios: Vec<f64>,
        capacity: u32,
    },
    /// Uniform weights on a normalized capacity, raw per-repetition counts.
    ///
    /// Weights are drawn from `[min_fraction, max_weight_ratio]`; the
    /// fragmentation level only labels the rows.
    RawDump {
        fragmentation_levels: Vec<f64>,
        max_weight_ratio_levels: Vec<f64>,
        item_counts: Vec<usize>,
        #[serde(default = "default_min_fraction")]
        min_fraction: f64,
    },
}

fn default_min_fraction() -> f64 {
    DEFAULT_MIN_FRACTION
}

/// One point of an expanded grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPoint {
    pub key: RowKey,
    pub params: ControlParameters,
}

impl ExperimentPlan {
    /// Report layout produced by this plan.
    pub fn variant(&self) -> ReportVariant {
        match self {
            ExperimentPlan::ShapeStudy { .. } => ReportVariant::ShapeStudy,
            ExperimentPlan::VariationStudy { .. } => ReportVariant::VariationStudy,
            ExperimentPlan::RawDump { .. } => ReportVariant::RawDump,
        }
    }

    /// How trial counts are folded into a row.
    pub fn aggregation(&self) -> Aggregation {
        self.variant().aggregation()
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        match self {
            ExperimentPlan::ShapeStudy {
                item_counts,
                shapes,
                large_items_ratios,
                standard_ratios,
                ..
            } => item_counts.len() * shapes.len() * large_items_ratios.len() * standard_ratios.len(),
            ExperimentPlan::VariationStudy {
                item_counts,
                coefficients_of_variation,
                large_items_ratios,
                standard_ratios,
                ..
            } => {
                item_counts.len()
                    * coefficients_of_variation.len()
                    * large_items_ratios.len()
                    * standard_ratios.len()
            }
            ExperimentPlan::RawDump {
                fragmentation_levels,
                max_weight_ratio_levels,
                item_counts,
                ..
            } => fragmentation_levels.len() * max_weight_ratio_levels.len() * item_counts.len(),
        }
    }

    /// Returns true if the grid has no points.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expands the grid into its points, outer-to-inner.
    ///
    /// Empty axes, zero item counts and invalid control parameters are rejected
    /// before any point is returned.
    pub fn expand(&self) -> Result<Vec<GridPoint>> {
        let mut points = Vec::with_capacity(self.len());

        match self {
            ExperimentPlan::ShapeStudy {
                item_counts,
                shapes,
                large_items_ratios,
                standard_ratios,
                capacity,
            } => {
                check_axis("item_counts", item_counts)?;
                check_axis("shapes", shapes)?;
                check_axis("large_items_ratios", large_items_ratios)?;
                check_axis("standard_ratios", standard_ratios)?;

                for &item_count in item_counts {
                    for &shape in shapes {
                        for &large in large_items_ratios {
                            for &standard in standard_ratios {
                                points.push(GridPoint {
                                    key: RowKey::ShapeStudy {
                                        item_count,
                                        distribution: shape,
                                        large_items_ratio: large,
                                        standard_ratio: standard,
                                    },
                                    params: ControlParameters::new(
                                        item_count,
                                        shape,
                                        Capacity::Units(*capacity),
                                    )
                                    .with_large_items_ratio(large)
                                    .with_standard_ratio(standard),
                                });
                            }
                        }
                    }
                }
            }
            ExperimentPlan::VariationStudy {
                item_counts,
                coefficients_of_variation,
                large_items_ratios,
                standard_ratios,
                capacity,
            } => {
                check_axis("item_counts", item_counts)?;
                check_axis("coefficients_of_variation", coefficients_of_variation)?;
                check_axis("large_items_ratios", large_items_ratios)?;
                check_axis("standard_ratios", standard_ratios)?;

                for &item_count in item_counts {
                    for &cv in coefficients_of_variation {
                        for &large in large_items_ratios {
                            for &standard in standard_ratios {
                                points.push(GridPoint {
                                    key: RowKey::VariationStudy {
                                        item_count,
                                        coefficient_of_variation: cv,
                                        large_items_ratio: large,
                                        standard_ratio: standard,
                                    },
                                    params: ControlParameters::new(
                                        item_count,
                                        WeightShape::with_cv(cv),
                                        Capacity::Units(*capacity),
                                    )
                                    .with_large_items_ratio(large)
                                    .with_standard_ratio(standard),
                                });
                            }
                        }
                    }
                }
            }
            ExperimentPlan::RawDump {
                fragmentation_levels,
                max_weight_ratio_levels,
                item_counts,
                min_fraction,
            } => {
                check_axis("fragmentation_levels", fragmentation_levels)?;
                check_axis("max_weight_ratio_levels", max_weight_ratio_levels)?;
                check_axis("item_counts", item_counts)?;

                for &fragmentation in fragmentation_levels {
                    if !(0.0..=1.0).contains(&fragmentation) {
                        return Err(Error::invalid(format!(
                            "fragmentation level must lie in [0, 1], got {}",
                            fragmentation
                        )));
                    }
                    for &max_ratio in max_weight_ratio_levels {
                        for &item_count in item_counts {
                            points.push(GridPoint {
                                key: RowKey::RawDump {
                                    fragmentation_target: fragmentation,
                                    max_weight_ratio_target: max_ratio,
                                    item_count,
                                },
                                params: ControlParameters::new(
                                    item_count,
                                    WeightShape::Uniform,
                                    Capacity::normalized(*min_fraction, max_ratio),
                                ),
                            });
                        }
                    }
                }
            }
        }

        for point in &points {
            if point.params.item_count == 0 {
                return Err(Error::invalid("item count must be positive"));
            }
            point.params.validate()?;
        }

        Ok(points)
    }
}

fn check_axis<T>(name: &str, values: &[T]) -> Result<()> {
    if values.is_empty() {
        Err(Error::invalid(format!("grid axis '{}' is empty", name)))
    } else {
        Ok(())
    }
}

/// A named experiment: plan plus sweep settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Experiment name, used in reports and output file names.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Trials per grid point.
    #[serde(default = "default_repetitions")]
    pub repetitions: usize,
    /// Seed of the master random stream. Unseeded runs draw from entropy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Run grid points on the rayon thread pool.
    #[serde(default)]
    pub parallel: bool,
    /// Parameter grid.
    pub plan: ExperimentPlan,
}

fn default_repetitions() -> usize {
    DEFAULT_REPETITIONS
}

impl ExperimentConfig {
    /// Creates a configuration with default sweep settings.
    pub fn new(name: impl Into<String>, plan: ExperimentPlan) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            repetitions: DEFAULT_REPETITIONS,
            seed: None,
            parallel: false,
            plan,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the number of trials per grid point.
    pub fn with_repetitions(mut self, n: usize) -> Self {
        self.repetitions = n;
        self
    }

    /// Sets the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables parallel grid evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Distribution-shape study: normal, uniform and exponential weights on capacity 200.
    pub fn shape_study() -> Self {
        Self::new(
            "shape_study",
            ExperimentPlan::ShapeStudy {
                item_counts: vec![50, 100],
                shapes: vec![
                    WeightShape::normal(),
                    WeightShape::Uniform,
                    WeightShape::Exponential,
                ],
                large_items_ratios: vec![0.2, 0.4],
                standard_ratios: vec![0.3, 0.5],
                capacity: 200,
            },
        )
        .with_description("Mean First Fit containers by distribution shape and item ratios")
    }

    /// Coefficient-of-variation study on capacity 200.
    pub fn variation_study() -> Self {
        Self::new(
            "variation_study",
            ExperimentPlan::VariationStudy {
                item_counts: vec![50, 100],
                coefficients_of_variation: vec![0.1, 0.2],
                large_items_ratios: vec![0.2, 0.4],
                standard_ratios: vec![0.3, 0.5],
                capacity: 200,
            },
        )
        .with_description("Mean First Fit containers by coefficient of variation and item ratios")
    }

    /// Raw per-repetition counts for uniform weights on a normalized capacity.
    pub fn raw_dump() -> Self {
        Self::new(
            "raw_dump",
            ExperimentPlan::RawDump {
                fragmentation_levels: vec![0.2, 0.5, 0.8],
                max_weight_ratio_levels: vec![0.1, 0.5, 0.9],
                item_counts: vec![50, 100, 150],
                min_fraction: DEFAULT_MIN_FRACTION,
            },
        )
        .with_description("Per-repetition First Fit containers for uniform weights up to a maximum ratio")
        .with_repetitions(5)
    }

    /// All built-in presets.
    pub fn presets() -> Vec<Self> {
        vec![Self::shape_study(), Self::variation_study(), Self::raw_dump()]
    }

    /// Looks up a preset by name (`shape`, `variation`, `raw` or the full preset name).
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "shape" | "shape_study" => Some(Self::shape_study()),
            "variation" | "variation_study" => Some(Self::variation_study()),
            "raw" | "raw_dump" => Some(Self::raw_dump()),
            _ => None,
        }
    }

    /// Loads a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Loads a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> std::result::Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Loads a configuration, choosing the format from the file extension.
    pub fn from_file(path: &Path) -> std::result::Result<Self, ReportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ReportError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Serializes the configuration as TOML.
    pub fn to_toml_string(&self) -> std::result::Result<String, ReportError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for ExperimentPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentPlan::ShapeStudy {
                item_counts,
                shapes,
                large_items_ratios,
                standard_ratios,
                capacity,
            } => {
                let shapes: Vec<String> = shapes.iter().map(WeightShape::label).collect();
                write!(
                    f,
                    "items={:?} shapes={:?} large={:?} standard={:?} capacity={}",
                    item_counts, shapes, large_items_ratios, standard_ratios, capacity
                )
            }
            ExperimentPlan::VariationStudy {
                item_counts,
                coefficients_of_variation,
                large_items_ratios,
                standard_ratios,
                capacity,
            } => write!(
                f,
                "items={:?} cv={:?} large={:?} standard={:?} capacity={}",
                item_counts, coefficients_of_variation, large_items_ratios, standard_ratios, capacity
            ),
            ExperimentPlan::RawDump {
                fragmentation_levels,
                max_weight_ratio_levels,
                item_counts,
                min_fraction,
            } => write!(
                f,
                "fragmentation={:?} max_weight_ratio={:?} items={:?} min_fraction={}",
                fragmentation_levels, max_weight_ratio_levels, item_counts, min_fraction
            ),
        }
    }
}
