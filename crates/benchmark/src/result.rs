//! Result rows and tables produced by an experiment sweep.

use crate::error::ReportError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use u_firstfit_core::WeightShape;

/// Report layout of a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportVariant {
    ShapeStudy,
    VariationStudy,
    RawDump,
}

/// How the trial counts of one grid point are folded into a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Arithmetic mean of the container counts.
    Mean,
    /// Every container count, in repetition order.
    Raw,
}

impl ReportVariant {
    /// Columns identifying a grid point, in output order.
    pub fn key_columns(&self) -> &'static [&'static str] {
        match self {
            ReportVariant::ShapeStudy => &[
                "item_count",
                "distribution",
                "large_items_ratio",
                "standard_ratio",
            ],
            ReportVariant::VariationStudy => &[
                "item_count",
                "coefficient_of_variation",
                "large_items_ratio",
                "standard_ratio",
            ],
            ReportVariant::RawDump => &[
                "fragmentation_target",
                "max_weight_ratio_target",
                "item_count",
            ],
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            ReportVariant::RawDump => Aggregation::Raw,
            _ => Aggregation::Mean,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportVariant::ShapeStudy => "shape_study",
            ReportVariant::VariationStudy => "variation_study",
            ReportVariant::RawDump => "raw_dump",
        }
    }
}

/// Control values identifying one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum RowKey {
    ShapeStudy {
        item_count: usize,
        distribution: WeightShape,
        large_items_ratio: f64,
        standard_ratio: f64,
    },
    VariationStudy {
        item_count: usize,
        coefficient_of_variation: f64,
        large_items_ratio: f64,
        standard_ratio: f64,
    },
    RawDump {
        fragmentation_target: f64,
        max_weight_ratio_target: f64,
        item_count: usize,
    },
}

impl RowKey {
    pub fn variant(&self) -> ReportVariant {
        match self {
            RowKey::ShapeStudy { .. } => ReportVariant::ShapeStudy,
            RowKey::VariationStudy { .. } => ReportVariant::VariationStudy,
            RowKey::RawDump { .. } => ReportVariant::RawDump,
        }
    }

    pub fn item_count(&self) -> usize {
        match *self {
            RowKey::ShapeStudy { item_count, .. }
            | RowKey::VariationStudy { item_count, .. }
            | RowKey::RawDump { item_count, .. } => item_count,
        }
    }

    /// Cell values in the order of [`ReportVariant::key_columns`].
    pub fn cells(&self) -> Vec<String> {
        match self {
            RowKey::ShapeStudy {
                item_count,
                distribution,
                large_items_ratio,
                standard_ratio,
            } => vec![
                item_count.to_string(),
                distribution.label(),
                large_items_ratio.to_string(),
                standard_ratio.to_string(),
            ],
            RowKey::VariationStudy {
                item_count,
                coefficient_of_variation,
                large_items_ratio,
                standard_ratio,
            } => vec![
                item_count.to_string(),
                coefficient_of_variation.to_string(),
                large_items_ratio.to_string(),
                standard_ratio.to_string(),
            ],
            RowKey::RawDump {
                fragmentation_target,
                max_weight_ratio_target,
                item_count,
            } => vec![
                fragmentation_target.to_string(),
                max_weight_ratio_target.to_string(),
                item_count.to_string(),
            ],
        }
    }
}

/// Container counts of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    /// Mean container count over all repetitions.
    Mean(f64),
    /// Container count of every repetition.
    Raw(Vec<usize>),
}

impl RowOutcome {
    /// Mean container count, whichever form the outcome has.
    pub fn mean(&self) -> f64 {
        match self {
            RowOutcome::Mean(m) => *m,
            RowOutcome::Raw(counts) if counts.is_empty() => 0.0,
            RowOutcome::Raw(counts) => {
                counts.iter().sum::<usize>() as f64 / counts.len() as f64
            }
        }
    }

    pub fn cells(&self) -> Vec<String> {
        match self {
            RowOutcome::Mean(m) => vec![m.to_string()],
            RowOutcome::Raw(counts) => counts.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Means of the achieved sequence and packing properties over all repetitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RowDiagnostics {
    pub large_items_ratio: f64,
    pub standard_ratio: f64,
    pub coefficient_of_variation: f64,
    pub max_weight_ratio: f64,
    pub fill_rate: f64,
    pub fragmentation: f64,
    /// Mean of the `ceil(sum / capacity)` lower bound.
    pub lower_bound: f64,
}

/// One row of a result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentRow {
    pub key: RowKey,
    pub outcome: RowOutcome,
    #[serde(default)]
    pub diagnostics: RowDiagnostics,
}

impl ExperimentRow {
    /// All cells of the row, key columns first.
    pub fn cells(&self) -> Vec<String> {
        let mut cells = self.key.cells();
        cells.extend(self.outcome.cells());
        cells
    }
}

/// Rows of one sweep, in grid order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub name: String,
    pub variant: ReportVariant,
    pub repetitions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub rows: Vec<ExperimentRow>,
}

impl ResultTable {
    pub fn new(name: impl Into<String>, variant: ReportVariant, repetitions: usize) -> Self {
        Self {
            name: name.into(),
            variant,
            repetitions,
            seed: None,
            rows: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Column names: key columns followed by `mean_containers` or `rep_1..rep_K`.
    pub fn columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .variant
            .key_columns()
            .iter()
            .map(|c| c.to_string())
            .collect();
        match self.variant.aggregation() {
            Aggregation::Mean => columns.push("mean_containers".to_string()),
            Aggregation::Raw => {
                columns.extend((1..=self.repetitions).map(|i| format!("rep_{}", i)))
            }
        }
        columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Loads a table previously written as JSON.
    pub fn from_json_file(path: &Path) -> Result<Self, ReportError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
