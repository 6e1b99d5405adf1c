//! Integration tests for the experiment suite.

use rand::rngs::StdRng;
use rand::SeedableRng;
use u_firstfit_benchmark::*;
use u_firstfit_core::WeightShape;

fn tiny_shape_study() -> ExperimentConfig {
    ExperimentConfig::new(
        "tiny",
        ExperimentPlan::ShapeStudy {
            item_counts: vec![20, 40],
            shapes: vec![WeightShape::normal(), WeightShape::Uniform],
            large_items_ratios: vec![0.2, 0.4],
            standard_ratios: vec![0.3],
            capacity: 200,
        },
    )
    .with_repetitions(4)
    .with_seed(2024)
}

mod sweep_tests {
    use super::*;

    #[test]
    fn test_one_row_per_grid_point() {
        let config = tiny_shape_study();
        let table = ExperimentSweeper::run_experiment(&config).unwrap();

        assert_eq!(table.len(), config.plan.len());
        assert_eq!(table.variant, ReportVariant::ShapeStudy);
        assert_eq!(table.columns().last().map(String::as_str), Some("mean_containers"));
        for row in &table.rows {
            assert!(matches!(row.outcome, RowOutcome::Mean(_)));
        }
    }

    #[test]
    fn test_more_items_need_more_containers() {
        let table = ExperimentSweeper::run_experiment(&tiny_shape_study()).unwrap();
        let (small, large): (Vec<&ExperimentRow>, Vec<&ExperimentRow>) =
            table.rows.iter().partition(|r| r.key.item_count() == 20);

        for (s, l) in small.iter().zip(large.iter()) {
            assert!(l.outcome.mean() > s.outcome.mean());
        }
    }

    #[test]
    fn test_seed_controls_results() {
        let plan = tiny_shape_study().plan;
        let sweeper = ExperimentSweeper::new(SweepConfig::new().with_repetitions(3));

        let a = sweeper.run(&plan, &mut StdRng::seed_from_u64(5)).unwrap();
        let b = sweeper.run(&plan, &mut StdRng::seed_from_u64(5)).unwrap();
        assert_eq!(a, b);

        let parallel = ExperimentSweeper::new(
            SweepConfig::new().with_repetitions(3).with_parallel(true),
        )
        .run(&plan, &mut StdRng::seed_from_u64(5))
        .unwrap();
        assert_eq!(a, parallel);
    }

    #[test]
    fn test_raw_dump_preset_layout() {
        let config = ExperimentConfig::raw_dump().with_repetitions(2).with_seed(1);
        let table = ExperimentSweeper::run_experiment(&config).unwrap();

        assert_eq!(table.len(), 27);
        let columns = table.columns();
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[3], "rep_1");
        for row in &table.rows {
            assert_eq!(row.cells().len(), columns.len());
        }
    }

    #[test]
    fn test_variation_rows_track_cv() {
        let config = ExperimentConfig::variation_study()
            .with_repetitions(3)
            .with_seed(8);
        let table = ExperimentSweeper::run_experiment(&config).unwrap();

        for row in &table.rows {
            if let RowKey::VariationStudy {
                coefficient_of_variation,
                ..
            } = row.key
            {
                // The ratio corrections reshape the sequence, so only a loose bound holds.
                assert!(row.diagnostics.coefficient_of_variation < coefficient_of_variation + 0.5);
            } else {
                panic!("unexpected key {:?}", row.key);
            }
        }
    }
}

mod config_tests {
    use super::*;

    #[test]
    fn test_toml_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.toml");

        let config = tiny_shape_study();
        std::fs::write(&path, config.to_toml_string().unwrap()).unwrap();

        let loaded = ExperimentConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.json");

        let config = ExperimentConfig::raw_dump();
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = ExperimentConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();

        let yaml = dir.path().join("experiment.yaml");
        std::fs::write(&yaml, "name: x").unwrap();
        assert!(matches!(
            ExperimentConfig::from_file(&yaml),
            Err(ReportError::UnsupportedFormat(_))
        ));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            ExperimentConfig::from_file(&missing),
            Err(ReportError::Io(_))
        ));
    }
}

mod sink_tests {
    use super::*;

    #[test]
    fn test_csv_sink_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.csv");

        let table = ExperimentSweeper::run_experiment(&tiny_shape_study()).unwrap();
        let mut sink = CsvSink::new(&path);
        sink.write(&table).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "item_count,distribution,large_items_ratio,standard_ratio,mean_containers"
        );
        assert_eq!(lines.len(), table.len() + 1);
        assert!(lines[1].starts_with("20,normal,0.2,0.3,"));
        assert_eq!(sink.destination(), path.display().to_string());
    }

    #[test]
    fn test_json_sink_feeds_analyzer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        let table = ExperimentSweeper::run_experiment(&tiny_shape_study()).unwrap();
        JsonSink::new(&path).write(&table).unwrap();

        let loaded = ResultTable::from_json_file(&path).unwrap();
        assert_eq!(loaded.len(), table.len());
        for (a, b) in loaded.rows.iter().zip(&table.rows) {
            assert_eq!(a.key, b.key);
            assert_eq!(a.outcome, b.outcome);
        }

        let mut analyzer = Analyzer::new();
        analyzer.load_json(&path).unwrap();
        let report = analyzer.analyze();
        assert_eq!(report.overall.row_count, table.len());
        assert_eq!(report.overall.total_trials, table.len() * 4);

        let md = ReportGenerator::to_markdown(&report);
        assert!(md.contains("## By large_items_ratio"));
    }
}
