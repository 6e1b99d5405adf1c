//! First Fit Experiment Runner CLI

use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use u_firstfit_benchmark::{
    Analyzer, ConsoleSink, CsvSink, ExperimentConfig, ExperimentSweeper, JsonSink,
    ReportGenerator, ReportSink,
};
use u_firstfit_core::{Capacity, ControlParameters, FirstFitPacker, WeightGenerator, WeightShape};

#[derive(Parser)]
#[command(name = "ff-bench")]
#[command(about = "First Fit bin-packing experiment runner")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in experiment presets
    List,

    /// Run a built-in experiment preset
    Run {
        /// Preset to run
        #[arg(short, long, value_enum, default_value = "shape")]
        preset: PresetArg,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Run an experiment described in a TOML or JSON file
    RunFile {
        /// Path to the experiment configuration
        file: PathBuf,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Write a preset configuration to a TOML or JSON file
    SavePreset {
        /// Preset to save
        #[arg(value_enum)]
        preset: PresetArg,

        /// Output path (.toml or .json)
        path: PathBuf,
    },

    /// Generate a single weight sequence and pack it
    Generate {
        /// Number of items
        #[arg(short = 'n', long, default_value = "100")]
        items: usize,

        /// Distribution: normal, uniform, exponential, cv:<value> or code 1-3
        #[arg(short, long, default_value = "uniform")]
        shape: String,

        /// Target share of large items
        #[arg(short, long)]
        large: Option<f64>,

        /// Target share of standard items
        #[arg(long)]
        standard: Option<f64>,

        /// Container capacity
        #[arg(short, long, default_value = "200")]
        capacity: u32,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Analyze result tables saved as JSON
    Analyze {
        /// Result files produced by `run --output`
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write the Markdown report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RunOverrides {
    /// Trials per grid point
    #[arg(short, long)]
    repetitions: Option<usize>,

    /// Master random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Evaluate grid points in parallel
    #[arg(long)]
    parallel: bool,

    /// Output file for results (JSON)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output file for CSV results
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Skip the console summary
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PresetArg {
    /// Distribution shape vs. item ratios
    Shape,
    /// Coefficient of variation vs. item ratios
    Variation,
    /// Raw per-repetition counts on a normalized capacity
    Raw,
}

impl From<PresetArg> for ExperimentConfig {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Shape => ExperimentConfig::shape_study(),
            PresetArg::Variation => ExperimentConfig::variation_study(),
            PresetArg::Raw => ExperimentConfig::raw_dump(),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_experiment(mut config: ExperimentConfig, overrides: RunOverrides) -> anyhow::Result<()> {
    if let Some(n) = overrides.repetitions {
        config = config.with_repetitions(n);
    }
    if let Some(seed) = overrides.seed {
        config = config.with_seed(seed);
    }
    if overrides.parallel {
        config = config.with_parallel(true);
    }

    println!(
        "Running {}: {} grid points x {} repetitions",
        config.name,
        config.plan.len(),
        config.repetitions
    );

    let table = ExperimentSweeper::run_experiment(&config)?;

    let mut sinks: Vec<Box<dyn ReportSink>> = Vec::new();
    if !overrides.quiet {
        sinks.push(Box::new(ConsoleSink::stdout()));
    }
    if let Some(path) = overrides.output {
        sinks.push(Box::new(JsonSink::new(path)));
    }
    if let Some(path) = overrides.csv {
        sinks.push(Box::new(CsvSink::new(path)));
    }

    for sink in sinks.iter_mut() {
        sink.write(&table)?;
        if sink.destination() != "console" {
            println!("Results saved to: {}", sink.destination());
        }
    }

    Ok(())
}

fn save_preset(config: &ExperimentConfig, path: &Path) -> anyhow::Result<()> {
    let content = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => config.to_toml_string()?,
        Some("json") => serde_json::to_string_pretty(config)?,
        _ => anyhow::bail!("Unsupported file format: {}", path.display()),
    };
    std::fs::write(path, content)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::List => {
            println!("Available Experiment Presets:");
            println!("=============================");
            for config in ExperimentConfig::presets() {
                println!(
                    "  - {:<16} {:>3} points x {:>3} reps  {}",
                    config.name,
                    config.plan.len(),
                    config.repetitions,
                    config.description
                );
                println!("      {}", config.plan);
            }
            println!("\nUse 'ff-bench run -p <PRESET>' to run an experiment");
        }

        Commands::Run { preset, overrides } => {
            run_experiment(preset.into(), overrides)?;
        }

        Commands::RunFile { file, overrides } => {
            let config = ExperimentConfig::from_file(&file)?;
            run_experiment(config, overrides)?;
        }

        Commands::SavePreset { preset, path } => {
            let config: ExperimentConfig = preset.into();
            save_preset(&config, &path)?;
            println!("Preset saved to: {}", path.display());
        }

        Commands::Generate {
            items,
            shape,
            large,
            standard,
            capacity,
            seed,
        } => {
            let shape: WeightShape = shape.parse()?;
            let mut params = ControlParameters::new(items, shape, Capacity::Units(capacity));
            if let Some(ratio) = large {
                params = params.with_large_items_ratio(ratio);
            }
            if let Some(ratio) = standard {
                params = params.with_standard_ratio(ratio);
            }

            let generator = WeightGenerator::new(params)?;
            let mut rng = match seed {
                Some(s) => StdRng::seed_from_u64(s),
                None => StdRng::from_entropy(),
            };
            let (weights, metrics) = generator.generate(&mut rng)?;
            let packing = FirstFitPacker::new(params.capacity.value())?.pack(&weights)?;

            let rendered: Vec<String> = weights.iter().map(|w| w.to_string()).collect();
            println!("Weights: {}", rendered.join(" "));
            println!();
            println!("  Items:            {}", metrics.item_count);
            println!("  Mean / Std:       {:.2} / {:.2}", metrics.mean, metrics.std_dev);
            println!("  CV:               {:.3}", metrics.coefficient_of_variation);
            println!(
                "  Large ratio:      {:.3} (target {})",
                metrics.large_items_ratio,
                large.map_or("-".to_string(), |r| r.to_string())
            );
            println!(
                "  Standard ratio:   {:.3} (target {})",
                metrics.standard_ratio,
                standard.map_or("-".to_string(), |r| r.to_string())
            );
            println!("  Containers:       {}", packing.container_count());
            println!("  Fill rate:        {:.1}%", packing.fill_rate() * 100.0);
            println!("  Fragmentation:    {:.3}", packing.fragmentation());
        }

        Commands::Analyze { files, output, json } => {
            let mut analyzer = Analyzer::new();
            for file in &files {
                analyzer.load_json(file)?;
            }
            let report = analyzer.analyze();

            match output {
                Some(path) => {
                    ReportGenerator::save_markdown(&report, &path)?;
                    println!("Report saved to: {}", path.display());
                }
                None => println!("{}", ReportGenerator::to_markdown(&report)),
            }

            if let Some(path) = json {
                ReportGenerator::save_json(&report, &path)?;
                println!("JSON report saved to: {}", path.display());
            }
        }
    }

    Ok(())
}
