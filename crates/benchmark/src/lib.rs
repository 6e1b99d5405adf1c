//! Experiment Suite for U-FirstFit
//!
//! This crate provides:
//! - Experiment plans for the shape, variation and raw-dump studies, with presets
//! - TOML/JSON loading and saving of experiment configurations
//! - A sweeper running every grid point, sequentially or on the rayon pool
//! - Result tables and report sinks (CSV, JSON, console)
//! - Result analysis and report generation

mod analyzer;
mod error;
mod plan;
mod result;
mod sink;
mod sweep;

// Analysis exports
pub use analyzer::{
    AnalysisReport, Analyzer, AxisAnalysis, LevelStats, OverallStats, ReportGenerator,
};

pub use error::ReportError;
pub use plan::{
    ExperimentConfig, ExperimentPlan, GridPoint, DEFAULT_MIN_FRACTION, DEFAULT_REPETITIONS,
};
pub use result::{
    Aggregation, ExperimentRow, ReportVariant, ResultTable, RowDiagnostics, RowKey, RowOutcome,
};
pub use sink::{write_csv, ConsoleSink, CsvSink, JsonSink, ReportSink};
pub use sweep::{ExperimentSweeper, SweepConfig};
