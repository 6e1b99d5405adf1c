//! Result analysis and report generation.
//!
//! Summarizes one or more result tables along each control axis: for every
//! level of an axis, the container counts of all rows at that level are
//! aggregated. Reports render as Markdown or JSON.

use crate::error::ReportError;
use crate::result::{ExperimentRow, ResultTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use u_firstfit_core::stats;

/// Analysis report for a set of result tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Report title
    pub title: String,
    /// Overall statistics
    pub overall: OverallStats,
    /// Per-axis breakdown
    pub by_axis: Vec<AxisAnalysis>,
}

/// Statistics across every row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverallStats {
    /// Number of tables analyzed
    pub table_count: usize,
    /// Number of rows (grid points)
    pub row_count: usize,
    /// Number of packed sequences
    pub total_trials: usize,
    /// Average mean container count
    pub avg_containers: f64,
    /// Smallest mean container count
    pub min_containers: f64,
    /// Largest mean container count
    pub max_containers: f64,
    /// Average fill rate
    pub avg_fill_rate: f64,
    /// Average excess over the volume lower bound (%)
    pub avg_excess_percent: f64,
}

/// Breakdown along one control axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AxisAnalysis {
    /// Column name of the axis
    pub axis: String,
    /// One entry per level, in first-seen order
    pub levels: Vec<LevelStats>,
}

/// Aggregates of all rows sharing one axis level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelStats {
    /// Axis value
    pub level: String,
    /// Number of rows at this level
    pub row_count: usize,
    /// Average mean container count
    pub avg_containers: f64,
    /// Standard deviation of the mean container counts
    pub std_containers: f64,
    /// Minimum mean container count
    pub min_containers: f64,
    /// Maximum mean container count
    pub max_containers: f64,
    /// Average containers per item
    pub containers_per_item: f64,
    /// Average fill rate
    pub avg_fill_rate: f64,
}

/// Result table analyzer.
#[derive(Debug, Default)]
pub struct Analyzer {
    tables: Vec<ResultTable>,
}

impl Analyzer {
    /// Creates a new analyzer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table to analyze.
    pub fn add_table(&mut self, table: ResultTable) {
        self.tables.push(table);
    }

    /// Loads a table from a JSON file.
    pub fn load_json(&mut self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let table = ResultTable::from_json_file(path.as_ref())?;
        self.tables.push(table);
        Ok(())
    }

    /// Generates an analysis report.
    pub fn analyze(&self) -> AnalysisReport {
        let title = match self.tables.as_slice() {
            [single] => format!("First Fit Analysis: {}", single.name),
            _ => "First Fit Analysis".to_string(),
        };

        AnalysisReport {
            title,
            overall: self.compute_overall_stats(),
            by_axis: self.analyze_by_axis(),
        }
    }

    fn compute_overall_stats(&self) -> OverallStats {
        let rows: Vec<&ExperimentRow> = self.tables.iter().flat_map(|t| t.rows.iter()).collect();
        if rows.is_empty() {
            return OverallStats {
                table_count: self.tables.len(),
                ..OverallStats::default()
            };
        }

        let means: Vec<f64> = rows.iter().map(|r| r.outcome.mean()).collect();
        let fill_rates: Vec<f64> = rows.iter().map(|r| r.diagnostics.fill_rate).collect();
        let excess: Vec<f64> = rows
            .iter()
            .filter(|r| r.diagnostics.lower_bound > 0.0)
            .map(|r| (r.outcome.mean() / r.diagnostics.lower_bound - 1.0) * 100.0)
            .collect();

        OverallStats {
            table_count: self.tables.len(),
            row_count: rows.len(),
            total_trials: self
                .tables
                .iter()
                .map(|t| t.rows.len() * t.repetitions)
                .sum(),
            avg_containers: stats::mean(&means),
            min_containers: means.iter().cloned().fold(f64::INFINITY, f64::min),
            max_containers: means.iter().cloned().fold(0.0, f64::max),
            avg_fill_rate: stats::mean(&fill_rates),
            avg_excess_percent: stats::mean(&excess),
        }
    }

    fn analyze_by_axis(&self) -> Vec<AxisAnalysis> {
        let mut groups: Vec<(String, Vec<(String, Vec<&ExperimentRow>)>)> = Vec::new();

        for table in &self.tables {
            for row in &table.rows {
                let cells = row.key.cells();
                for (axis, level) in table.variant.key_columns().iter().zip(cells) {
                    let axis_idx = match groups.iter().position(|(a, _)| a == axis) {
                        Some(i) => i,
                        None => {
                            groups.push((axis.to_string(), Vec::new()));
                            groups.len() - 1
                        }
                    };
                    let levels = &mut groups[axis_idx].1;
                    match levels.iter_mut().find(|(l, _)| *l == level) {
                        Some((_, rows)) => rows.push(row),
                        None => levels.push((level, vec![row])),
                    }
                }
            }
        }

        groups
            .into_iter()
            .map(|(axis, levels)| AxisAnalysis {
                axis,
                levels: levels
                    .into_iter()
                    .map(|(level, rows)| level_stats(level, &rows))
                    .collect(),
            })
            .collect()
    }
}

fn level_stats(level: String, rows: &[&ExperimentRow]) -> LevelStats {
    let means: Vec<f64> = rows.iter().map(|r| r.outcome.mean()).collect();
    let per_item: Vec<f64> = rows
        .iter()
        .filter(|r| r.key.item_count() > 0)
        .map(|r| r.outcome.mean() / r.key.item_count() as f64)
        .collect();
    let fill_rates: Vec<f64> = rows.iter().map(|r| r.diagnostics.fill_rate).collect();

    LevelStats {
        level,
        row_count: rows.len(),
        avg_containers: stats::mean(&means),
        std_containers: stats::std_dev(&means),
        min_containers: means.iter().cloned().fold(f64::INFINITY, f64::min),
        max_containers: means.iter().cloned().fold(0.0, f64::max),
        containers_per_item: stats::mean(&per_item),
        avg_fill_rate: stats::mean(&fill_rates),
    }
}

/// Report generator for analysis results.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Generates a Markdown report.
    pub fn to_markdown(report: &AnalysisReport) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", report.title));

        md.push_str("## Overall Statistics\n\n");
        md.push_str("| Metric | Value |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Tables | {} |\n", report.overall.table_count));
        md.push_str(&format!("| Grid Points | {} |\n", report.overall.row_count));
        md.push_str(&format!("| Trials | {} |\n", report.overall.total_trials));
        md.push_str(&format!(
            "| Avg Containers | {:.2} |\n",
            report.overall.avg_containers
        ));
        md.push_str(&format!(
            "| Min / Max Containers | {:.2} / {:.2} |\n",
            report.overall.min_containers, report.overall.max_containers
        ));
        md.push_str(&format!(
            "| Avg Fill Rate | {:.1}% |\n",
            report.overall.avg_fill_rate * 100.0
        ));
        md.push_str(&format!(
            "| Avg Excess over Lower Bound | {:.2}% |\n",
            report.overall.avg_excess_percent
        ));
        md.push('\n');

        for axis in &report.by_axis {
            md.push_str(&format!("## By {}\n\n", axis.axis));
            md.push_str("| Level | Rows | Avg | Std | Min | Max | Per Item | Fill |\n");
            md.push_str("|-------|------|-----|-----|-----|-----|----------|------|\n");
            for l in &axis.levels {
                md.push_str(&format!(
                    "| {} | {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.3} | {:.1}% |\n",
                    l.level,
                    l.row_count,
                    l.avg_containers,
                    l.std_containers,
                    l.min_containers,
                    l.max_containers,
                    l.containers_per_item,
                    l.avg_fill_rate * 100.0
                ));
            }
            md.push('\n');
        }

        md
    }

    /// Saves the report as JSON.
    pub fn save_json(report: &AnalysisReport, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Saves the report as Markdown.
    pub fn save_markdown(report: &AnalysisReport, path: impl AsRef<Path>) -> Result<(), ReportError> {
        fs::write(path, Self::to_markdown(report))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{ReportVariant, RowDiagnostics, RowKey, RowOutcome};
    use approx::assert_relative_eq;
    use u_firstfit_core::WeightShape;

    fn row(item_count: usize, shape: WeightShape, mean: f64) -> ExperimentRow {
        ExperimentRow {
            key: RowKey::ShapeStudy {
                item_count,
                distribution: shape,
                large_items_ratio: 0.2,
                standard_ratio: 0.3,
            },
            outcome: RowOutcome::Mean(mean),
            diagnostics: RowDiagnostics {
                fill_rate: 0.8,
                lower_bound: mean / 2.0,
                ..RowDiagnostics::default()
            },
        }
    }

    fn create_test_table() -> ResultTable {
        let mut table = ResultTable::new("shape_study", ReportVariant::ShapeStudy, 10);
        table.rows.push(row(50, WeightShape::normal(), 30.0));
        table.rows.push(row(50, WeightShape::Uniform, 32.0));
        table.rows.push(row(100, WeightShape::normal(), 60.0));
        table.rows.push(row(100, WeightShape::Uniform, 66.0));
        table
    }

    #[test]
    fn test_overall_stats() {
        let mut analyzer = Analyzer::new();
        analyzer.add_table(create_test_table());
        let report = analyzer.analyze();

        assert_eq!(report.overall.table_count, 1);
        assert_eq!(report.overall.row_count, 4);
        assert_eq!(report.overall.total_trials, 40);
        assert_relative_eq!(report.overall.avg_containers, 47.0);
        assert_relative_eq!(report.overall.min_containers, 30.0);
        assert_relative_eq!(report.overall.max_containers, 66.0);
        assert_relative_eq!(report.overall.avg_excess_percent, 100.0);
    }

    #[test]
    fn test_axis_breakdown() {
        let mut analyzer = Analyzer::new();
        analyzer.add_table(create_test_table());
        let report = analyzer.analyze();

        assert_eq!(report.by_axis.len(), 4);
        let items = &report.by_axis[0];
        assert_eq!(items.axis, "item_count");
        assert_eq!(items.levels.len(), 2);
        assert_eq!(items.levels[0].level, "50");
        assert_relative_eq!(items.levels[0].avg_containers, 31.0);
        assert_relative_eq!(items.levels[0].std_containers, 1.0);
        assert_relative_eq!(items.levels[1].containers_per_item, 0.63, epsilon = 1e-12);

        let shapes = &report.by_axis[1];
        assert_eq!(shapes.levels[1].level, "uniform");
        assert_relative_eq!(shapes.levels[1].avg_containers, 49.0);

        // Single-level axes collapse to one entry.
        assert_eq!(report.by_axis[2].levels.len(), 1);
    }

    #[test]
    fn test_markdown_generation() {
        let mut analyzer = Analyzer::new();
        analyzer.add_table(create_test_table());
        let md = ReportGenerator::to_markdown(&analyzer.analyze());

        assert!(md.contains("# First Fit Analysis: shape_study"));
        assert!(md.contains("## By distribution"));
        assert!(md.contains("| uniform | 2 |"));
    }

    #[test]
    fn test_empty_analysis() {
        let report = Analyzer::new().analyze();
        assert_eq!(report.overall.row_count, 0);
        assert!(report.by_axis.is_empty());
    }
}
