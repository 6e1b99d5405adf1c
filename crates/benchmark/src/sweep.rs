//! Experiment sweeper: runs every grid point of a plan for a number of
//! repetitions and aggregates the First Fit container counts.
//!
//! Each grid point receives its own seed, drawn from the caller's random source
//! in grid order before any trial runs. Points therefore produce the same rows
//! whether they are evaluated sequentially or on the rayon thread pool.

use crate::plan::{ExperimentConfig, ExperimentPlan, DEFAULT_REPETITIONS};
use crate::result::{Aggregation, ExperimentRow, ResultTable, RowDiagnostics, RowKey, RowOutcome};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;
use u_firstfit_core::{
    lower_bound, max_weight_ratio, stats, Error, FirstFitPacker, Result, WeightGenerator,
};

/// Sweep settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Trials per grid point.
    pub repetitions: usize,
    /// Evaluate grid points in parallel.
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            repetitions: DEFAULT_REPETITIONS,
            parallel: false,
        }
    }
}

impl SweepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repetitions(mut self, n: usize) -> Self {
        self.repetitions = n;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

impl From<&ExperimentConfig> for SweepConfig {
    fn from(config: &ExperimentConfig) -> Self {
        Self {
            repetitions: config.repetitions,
            parallel: config.parallel,
        }
    }
}

/// A validated grid point ready to run.
struct PointJob {
    key: RowKey,
    generator: WeightGenerator,
    packer: FirstFitPacker,
    seed: u64,
}

/// Runs experiment plans.
#[derive(Debug, Clone, Default)]
pub struct ExperimentSweeper {
    config: SweepConfig,
}

impl ExperimentSweeper {
    pub fn new(config: SweepConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Runs a named experiment, seeding the master stream from its configuration.
    pub fn run_experiment(config: &ExperimentConfig) -> Result<ResultTable> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let sweeper = Self::new(SweepConfig::from(config));
        let mut table = sweeper.run(&config.plan, &mut rng)?;
        table.name = config.name.clone();
        table.seed = config.seed;
        Ok(table)
    }

    /// Runs every grid point of `plan` and returns one row per point, in grid order.
    ///
    /// The whole grid is validated before the first trial; any invalid point
    /// aborts the sweep with [`Error::InvalidParameter`].
    pub fn run<R: Rng>(&self, plan: &ExperimentPlan, rng: &mut R) -> Result<ResultTable> {
        let repetitions = self.config.repetitions;
        if repetitions == 0 {
            return Err(Error::invalid("repetitions must be positive"));
        }

        let points = plan.expand()?;
        let jobs = points
            .into_iter()
            .map(|point| {
                let generator = WeightGenerator::new(point.params)?;
                let packer = FirstFitPacker::new(point.params.capacity.value())?;
                Ok(PointJob {
                    key: point.key,
                    generator,
                    packer,
                    seed: 0,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Seeds are drawn only after every point has been validated.
        let jobs: Vec<PointJob> = jobs
            .into_iter()
            .map(|job| PointJob {
                seed: rng.gen(),
                ..job
            })
            .collect();

        let variant = plan.variant();
        let aggregation = plan.aggregation();
        log::info!(
            "Sweeping {} grid points x {} repetitions ({}, {})",
            jobs.len(),
            repetitions,
            variant.name(),
            if self.config.parallel { "parallel" } else { "sequential" }
        );

        let start = Instant::now();
        let rows = if self.config.parallel {
            jobs.par_iter()
                .map(|job| run_point(job, repetitions, aggregation))
                .collect::<Result<Vec<_>>>()?
        } else {
            jobs.iter()
                .map(|job| run_point(job, repetitions, aggregation))
                .collect::<Result<Vec<_>>>()?
        };
        log::info!(
            "Sweep finished in {:.1}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        let mut table = ResultTable::new(variant.name(), variant, repetitions);
        table.rows = rows;
        Ok(table)
    }
}

fn run_point(job: &PointJob, repetitions: usize, aggregation: Aggregation) -> Result<ExperimentRow> {
    let mut rng = StdRng::seed_from_u64(job.seed);
    let capacity = job.packer.capacity();

    let mut counts = Vec::with_capacity(repetitions);
    let mut diagnostics = RowDiagnostics::default();

    for _ in 0..repetitions {
        let (weights, metrics) = job.generator.generate(&mut rng)?;
        let packing = job.packer.pack(&weights)?;
        counts.push(packing.container_count());

        diagnostics.large_items_ratio += metrics.large_items_ratio;
        diagnostics.standard_ratio += metrics.standard_ratio;
        diagnostics.coefficient_of_variation += metrics.coefficient_of_variation;
        diagnostics.max_weight_ratio += max_weight_ratio(&weights, capacity);
        diagnostics.fill_rate += packing.fill_rate();
        diagnostics.fragmentation += packing.fragmentation();
        diagnostics.lower_bound += lower_bound(&weights, capacity) as f64;
    }

    let n = repetitions as f64;
    diagnostics.large_items_ratio /= n;
    diagnostics.standard_ratio /= n;
    diagnostics.coefficient_of_variation /= n;
    diagnostics.max_weight_ratio /= n;
    diagnostics.fill_rate /= n;
    diagnostics.fragmentation /= n;
    diagnostics.lower_bound /= n;

    let outcome = match aggregation {
        Aggregation::Mean => {
            let values: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
            RowOutcome::Mean(stats::mean(&values))
        }
        Aggregation::Raw => RowOutcome::Raw(counts),
    };

    log::debug!("{:?}: {:?}", job.key, outcome);

    Ok(ExperimentRow {
        key: job.key.clone(),
        outcome,
        diagnostics,
    })
}
