//! CLI integration tests.
//!
//! Tests cover:
//! - Config parsing (build_rotation_config) with defaults and overrides
//! - Validation failures mapped to config exit codes
//! - Sweep grid construction from command-line lists
//! - End-to-end `backtest`, `sweep`, `validate` and `signal` runs against
//!   INI and CSV files on disk

mod common;

use chrono::Weekday;
use clap::Parser;
use common::*;
use rotatrader::adapters::csv_report_adapter::{
    EQUITY_CURVE_FILE, SUMMARY_FILE, SWEEP_FILE, TRADES_FILE,
};
use rotatrader::adapters::file_config_adapter::FileConfigAdapter;
use rotatrader::cli::{self, Cli, Command, Overrides};
use rotatrader::domain::aligned::AlignmentPolicy;
use rotatrader::domain::backtest::RotationConfig;
use rotatrader::domain::error::RotatraderError;
use rotatrader::domain::momentum::TieBreak;
use rotatrader::domain::schedule::RebalanceFrequency;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[rotation]
window_length_days = 40
rebalance_frequency = weekly
rebalance_anchor = thursday
transaction_cost_bps = 7.5
start_date = 2016-01-01
end_date = 2023-12-31
gold_asset = XAU
equity_asset = SPX
alignment = forward_fill
tie_break = prefer_gold
risk_free_rate = 0.02

[data]
path = ./data

[report]
output_dir = ./reports
"#;

mod config_loading {
    use super::*;

    #[test]
    fn build_rotation_config_reads_every_key() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let config = cli::build_rotation_config(&adapter).unwrap();

        assert_eq!(config.window, 40);
        assert_eq!(config.frequency, RebalanceFrequency::Weekly(Weekday::Thu));
        assert_eq!(config.cost_bps, 7.5);
        assert_eq!(config.start_date, date(2016, 1, 1));
        assert_eq!(config.end_date, Some(date(2023, 12, 31)));
        assert_eq!(config.gold_asset, "XAU");
        assert_eq!(config.equity_asset, "SPX");
        assert_eq!(config.alignment, AlignmentPolicy::ForwardFill);
        assert_eq!(config.tie_break, TieBreak::PreferGold);
        assert_eq!(config.risk_free_rate, 0.02);
    }

    #[test]
    fn empty_section_falls_back_to_defaults() {
        let adapter = FileConfigAdapter::from_string("[rotation]\n").unwrap();
        let config = cli::build_rotation_config(&adapter).unwrap();
        assert_eq!(config, RotationConfig::default());
    }

    #[test]
    fn monthly_frequency() {
        let adapter =
            FileConfigAdapter::from_string("[rotation]\nrebalance_frequency = Monthly\n").unwrap();
        let config = cli::build_rotation_config(&adapter).unwrap();
        assert_eq!(config.frequency, RebalanceFrequency::Monthly);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        for body in [
            "window_length_days = 0",
            "window_length_days = sixty",
            "transaction_cost_bps = -5",
            "transaction_cost_bps = 5bps",
            "risk_free_rate = abc",
            "rebalance_frequency = yearly",
            "rebalance_anchor = someday",
            "start_date = 01/01/2015",
            "alignment = nearest",
            "tie_break = coin_flip",
        ] {
            let adapter = FileConfigAdapter::from_string(&format!("[rotation]\n{body}\n")).unwrap();
            let err = cli::build_rotation_config(&adapter).unwrap_err();
            assert!(
                matches!(err, RotatraderError::ConfigInvalid { .. }),
                "{body}: {err:?}"
            );
            assert_eq!(ExitCode::from(&err), ExitCode::from(2));
        }
    }

    #[test]
    fn overrides_take_precedence() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let base = cli::build_rotation_config(&adapter).unwrap();
        let overrides = Overrides {
            window: Some(90),
            cost_bps: Some(0.0),
            frequency: Some("monthly".to_string()),
        };

        let config = cli::apply_overrides(base.clone(), &overrides).unwrap();
        assert_eq!(config.window, 90);
        assert_eq!(config.cost_bps, 0.0);
        assert_eq!(config.frequency, RebalanceFrequency::Monthly);
        assert_eq!(config.gold_asset, base.gold_asset);

        let unchanged = cli::apply_overrides(base.clone(), &Overrides::default()).unwrap();
        assert_eq!(unchanged, base);
    }

    #[test]
    fn bad_overrides_rejected() {
        let base = RotationConfig::default();
        for overrides in [
            Overrides { window: Some(0), ..Overrides::default() },
            Overrides { cost_bps: Some(-1.0), ..Overrides::default() },
            Overrides { frequency: Some("hourly".into()), ..Overrides::default() },
        ] {
            let err = cli::apply_overrides(base.clone(), &overrides).unwrap_err();
            assert!(matches!(err, RotatraderError::ConfigInvalid { ref section, .. } if section == "cli"));
        }
    }

    #[test]
    fn output_dir_resolution() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        assert_eq!(
            cli::resolve_output_dir(Some(Path::new("/tmp/out")), &adapter),
            Path::new("/tmp/out")
        );
        assert_eq!(cli::resolve_output_dir(None, &adapter), Path::new("./reports"));

        let bare = FileConfigAdapter::from_string("[rotation]\n").unwrap();
        assert_eq!(
            cli::resolve_output_dir(None, &bare),
            Path::new(cli::DEFAULT_OUTPUT_DIR)
        );
    }

    #[test]
    fn data_adapter_requires_path() {
        let bare = FileConfigAdapter::from_string("[rotation]\n").unwrap();
        assert!(matches!(
            cli::data_adapter(&bare),
            Err(RotatraderError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn missing_config_file_is_parse_error() {
        let err = cli::load_config(Path::new("/nonexistent/rotation.ini")).unwrap_err();
        assert!(matches!(err, RotatraderError::ConfigParse { .. }));
    }
}

mod sweep_grid {
    use super::*;

    #[test]
    fn lists_replace_base_values() {
        let base = RotationConfig::default();
        let grid = cli::build_sweep_grid(
            &base,
            &[20, 60, 120],
            &[0.0, 10.0],
            &["daily".to_string(), "weekly:mon".to_string()],
        )
        .unwrap();

        assert_eq!(grid.windows, vec![20, 60, 120]);
        assert_eq!(grid.cost_bps, vec![0.0, 10.0]);
        assert_eq!(
            grid.frequencies,
            vec![RebalanceFrequency::Daily, RebalanceFrequency::Weekly(Weekday::Mon)]
        );
        assert_eq!(grid.size(), 12);
    }

    #[test]
    fn empty_lists_use_base_config() {
        let base = RotationConfig::default();
        let grid = cli::build_sweep_grid(&base, &[], &[], &[]).unwrap();

        assert_eq!(grid.windows, vec![base.window]);
        assert_eq!(grid.cost_bps, vec![base.cost_bps]);
        assert_eq!(grid.frequencies, vec![base.frequency]);
    }

    #[test]
    fn invalid_entries_rejected() {
        let base = RotationConfig::default();
        assert!(cli::build_sweep_grid(&base, &[], &[], &["fortnightly".to_string()]).is_err());
        assert!(cli::build_sweep_grid(&base, &[], &[-3.0], &[]).is_err());
    }
}

mod end_to_end {
    use super::*;

    struct Workspace {
        dir: TempDir,
        ini: std::path::PathBuf,
    }

    impl Workspace {
        fn output(&self) -> std::path::PathBuf {
            self.dir.path().join("reports")
        }
    }

    fn write_series(path: &Path, header: &str, dates: &[chrono::NaiveDate], closes: &[f64]) {
        let mut body = format!("{header}\n");
        for (d, c) in dates.iter().zip(closes) {
            body.push_str(&format!("{d},{c}\n"));
        }
        fs::write(path, body).unwrap();
    }

    fn workspace(extra: &str) -> Workspace {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();

        let (dates, gold, equity) = crossing_market(160);
        write_series(&data.join("GLD.csv"), "Date,Close", &dates, &gold);
        write_series(&data.join("SPY.csv"), "date,close", &dates, &equity);

        let ini = dir.path().join("rotation.ini");
        fs::write(
            &ini,
            format!(
                "[rotation]\nwindow_length_days = 20\nstart_date = 2024-01-01\n\
                 gold_asset = GLD\nequity_asset = SPY\n{extra}\n\
                 [data]\npath = {}\n\n[report]\noutput_dir = {}\n",
                data.display(),
                dir.path().join("reports").display()
            ),
        )
        .unwrap();

        Workspace { dir, ini }
    }

    fn run(args: &[&str]) -> ExitCode {
        let cli = Cli::try_parse_from(args.iter().copied()).unwrap();
        cli::run(cli)
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from([
            "rotatrader",
            "--verbose",
            "sweep",
            "-c",
            "r.ini",
            "--windows",
            "20,40",
            "--costs",
            "0,5",
            "--sequential",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Sweep {
                windows,
                costs,
                sequential,
                frequencies,
                ..
            } => {
                assert_eq!(windows, vec![20, 40]);
                assert_eq!(costs, vec![0.0, 5.0]);
                assert!(frequencies.is_empty());
                assert!(sequential);
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["rotatrader", "backtest"]).is_err());
    }

    #[test]
    fn backtest_writes_artifacts() {
        let ws = workspace("");
        let ini = ws.ini.to_str().unwrap();

        assert_eq!(run(&["rotatrader", "backtest", "-c", ini]), ExitCode::SUCCESS);

        let curve = fs::read_to_string(ws.output().join(EQUITY_CURVE_FILE)).unwrap();
        assert_eq!(curve.lines().count(), 161);
        assert!(curve.starts_with("date,nav,holding\n2024-01-01,1.00000000,CASH\n"));
        assert!(ws.output().join(TRADES_FILE).exists());
        assert!(ws.output().join(SUMMARY_FILE).exists());
    }

    #[test]
    fn backtest_output_flag_overrides_config() {
        let ws = workspace("");
        let ini = ws.ini.to_str().unwrap();
        let custom = ws.dir.path().join("custom");

        let code = run(&[
            "rotatrader",
            "backtest",
            "-c",
            ini,
            "-o",
            custom.to_str().unwrap(),
            "--frequency",
            "daily",
            "--cost-bps",
            "0",
        ]);

        assert_eq!(code, ExitCode::SUCCESS);
        let summary = fs::read_to_string(custom.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("total_costs,0.000000"));
        assert!(!ws.output().exists());
    }

    #[test]
    fn sweep_writes_grid() {
        let ws = workspace("");
        let ini = ws.ini.to_str().unwrap();

        let code = run(&[
            "rotatrader",
            "sweep",
            "-c",
            ini,
            "--windows",
            "10,20,30",
            "--frequencies",
            "daily,monthly",
        ]);

        assert_eq!(code, ExitCode::SUCCESS);
        let sweep = fs::read_to_string(ws.output().join(SWEEP_FILE)).unwrap();
        assert_eq!(sweep.lines().count(), 7);
    }

    #[test]
    fn validate_accepts_good_config_and_rejects_bad() {
        let ws = workspace("");
        assert_eq!(
            run(&["rotatrader", "validate", "-c", ws.ini.to_str().unwrap()]),
            ExitCode::SUCCESS
        );

        let bad = write_temp_ini("[rotation]\nwindow_length_days = -4\n[data]\npath = x\n");
        assert_eq!(
            run(&["rotatrader", "validate", "-c", bad.path().to_str().unwrap()]),
            ExitCode::from(2)
        );

        let no_data = write_temp_ini("[rotation]\n");
        assert_eq!(
            run(&["rotatrader", "validate", "-c", no_data.path().to_str().unwrap()]),
            ExitCode::from(2)
        );
    }

    #[test]
    fn signal_runs_against_csv_data() {
        let ws = workspace("rebalance_frequency = daily");
        assert_eq!(
            run(&["rotatrader", "signal", "-c", ws.ini.to_str().unwrap()]),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn missing_asset_file_is_data_error() {
        let ws = workspace("");
        fs::remove_file(ws.dir.path().join("data").join("SPY.csv")).unwrap();
        assert_eq!(
            run(&["rotatrader", "backtest", "-c", ws.ini.to_str().unwrap()]),
            ExitCode::from(3)
        );
    }

    #[test]
    fn range_without_rows_is_no_data() {
        let ws = workspace("end_date = 2030-12-31\n");
        let ini = fs::read_to_string(&ws.ini)
            .unwrap()
            .replace("start_date = 2024-01-01", "start_date = 2030-01-01");
        fs::write(&ws.ini, ini).unwrap();

        assert_eq!(
            run(&["rotatrader", "backtest", "-c", ws.ini.to_str().unwrap()]),
            ExitCode::from(5)
        );
    }
}
