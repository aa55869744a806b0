//! CLI integration tests for settings handling and command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_screen_config, build_risk_config, min_apgar)
//! - Symbol resolution (resolve_symbols)
//! - Screen pipeline with MockDataPort (loading, ranking, candidate sizing)
//! - Commands end-to-end with real INI and CSV files on disk

mod common;

use approx::assert_relative_eq;
use common::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use triplescreen::adapters::file_config_adapter::FileConfigAdapter;
use triplescreen::cli::{self, Cli, Command};
use triplescreen::domain::error::ScreenError;
use triplescreen::domain::sizing::{AccountState, RejectReason};

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn assert_exit(actual: ExitCode, expected: u8) {
    assert_eq!(
        format!("{actual:?}"),
        format!("{:?}", ExitCode::from(expected))
    );
}

const FULL_INI: &str = r#"
[screen]
symbols = aaa, bbb
min_apgar = 4

[screen1]
ema_period = 26
macd_fast = 10
macd_slow = 30
macd_signal = 7
divergence_lookback = 4
flat_slope_pct = 0.05
strong_slope_pct = 0.25

[screen2]
ema_period = 13
force_period = 3
stochastic_period = 10
stochastic_oversold = 20
stochastic_midline = 45
near_ema_pct = 1.5
impulse_ema_period = 11
atr_period = 10
atr_stop_multiple = 2.5
rsi_period = 9
long_force_period = 10
divergence_lookback = 15

[apgar]
trend = 0,0,1,1,2
force = 0,1,1,2

[risk]
account_equity = 50000
risk_per_trade_pct = 1
monthly_drawdown_cap_pct = 5
target_reward_risk = 3
max_concurrent_positions = 4
"#;

fn adapter(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

mod config_loading {
    use super::*;

    #[test]
    fn build_screen_config_defaults() {
        let config = cli::build_screen_config(&adapter("[screen]\n")).unwrap();
        assert_eq!(config, triplescreen::domain::screen_config::ScreenConfig::default());
    }

    #[test]
    fn build_screen_config_custom_values() {
        let config = cli::build_screen_config(&adapter(FULL_INI)).unwrap();

        assert_eq!(config.trend.ema_period, 26);
        assert_eq!(config.trend.macd.fast, 10);
        assert_eq!(config.trend.macd.slow, 30);
        assert_eq!(config.trend.macd.signal, 7);
        assert_eq!(config.trend.divergence_lookback, 4);
        assert_relative_eq!(config.trend.flat_slope_pct, 0.05);
        assert_relative_eq!(config.trend.strong_slope_pct, 0.25);

        assert_eq!(config.entry.ema_period, 13);
        assert_eq!(config.entry.force_period, 3);
        assert_eq!(config.entry.stochastic_period, 10);
        assert_relative_eq!(config.entry.stochastic_oversold, 20.0);
        assert_relative_eq!(config.entry.stochastic_midline, 45.0);
        assert_relative_eq!(config.entry.near_ema_pct, 1.5);
        assert_eq!(config.entry.impulse_ema_period, 11);
        assert_eq!(config.entry.rsi_period, 9);
        assert_eq!(config.entry.long_force_period, 10);
        assert_eq!(config.entry.divergence_lookback, 15);
        assert_eq!(config.entry.atr_period, 10);
        assert_relative_eq!(config.entry.atr_stop_multiple, 2.5);

        assert_eq!(config.apgar.trend, [0, 0, 1, 1, 2]);
        assert_eq!(config.apgar.force, [0, 1, 1, 2]);
        assert_eq!(config.apgar.momentum, [0, 1, 2]);
        assert_relative_eq!(config.target_reward_risk, 3.0);
    }

    #[test]
    fn build_screen_config_rejects_bad_apgar_row() {
        let err = cli::build_screen_config(&adapter("[apgar]\nstochastic = 0,2,1\n")).unwrap_err();
        assert!(matches!(err, ScreenError::ConfigInvalid { key, .. } if key == "stochastic"));
    }

    #[test]
    fn build_screen_config_rejects_zero_period() {
        let err = cli::build_screen_config(&adapter("[screen1]\nema_period = 0\n")).unwrap_err();
        assert!(matches!(err, ScreenError::ConfigInvalid { key, .. } if key == "ema_period"));
    }

    #[test]
    fn build_risk_config_custom_values() {
        let risk = cli::build_risk_config(&adapter(FULL_INI)).unwrap();
        assert_relative_eq!(risk.account_equity, 50_000.0);
        assert_relative_eq!(risk.risk_per_trade_pct, 1.0);
        assert_relative_eq!(risk.monthly_drawdown_cap_pct, 5.0);
        assert_relative_eq!(risk.target_reward_risk_ratio, 3.0);
        assert_eq!(risk.max_concurrent_positions, 4);
    }

    #[test]
    fn build_risk_config_defaults() {
        let risk = cli::build_risk_config(&adapter("[risk]\naccount_equity = 100000\n")).unwrap();
        assert_relative_eq!(risk.risk_per_trade_pct, 2.0);
        assert_relative_eq!(risk.monthly_drawdown_cap_pct, 6.0);
        assert_relative_eq!(risk.target_reward_risk_ratio, 2.0);
        assert_eq!(risk.max_concurrent_positions, 5);
    }

    #[test]
    fn build_risk_config_requires_equity() {
        let err = cli::build_risk_config(&adapter("[risk]\nrisk_per_trade_pct = 2\n")).unwrap_err();
        assert!(matches!(err, ScreenError::ConfigMissing { key, .. } if key == "account_equity"));
    }

    #[test]
    fn min_apgar_default_and_override() {
        assert_eq!(cli::min_apgar(&adapter("[screen]\n")), 6);
        assert_eq!(cli::min_apgar(&adapter(FULL_INI)), 4);
    }
}

mod symbol_resolution {
    use super::*;

    fn port() -> MockDataPort {
        MockDataPort::new()
            .with_bars("ZZZ", weekday_bars(&[1.0]))
            .with_bars("YYY", weekday_bars(&[1.0]))
    }

    #[test]
    fn override_takes_precedence() {
        let symbols = cli::resolve_symbols(Some(" msft ,aapl,"), &adapter(FULL_INI), &port()).unwrap();
        assert_eq!(symbols, vec!["MSFT", "AAPL"]);
    }

    #[test]
    fn config_symbols_are_uppercased() {
        let symbols = cli::resolve_symbols(None, &adapter(FULL_INI), &port()).unwrap();
        assert_eq!(symbols, vec!["AAA", "BBB"]);
    }

    #[test]
    fn falls_back_to_data_source() {
        let symbols = cli::resolve_symbols(None, &adapter("[screen]\n"), &port()).unwrap();
        assert_eq!(symbols, vec!["YYY", "ZZZ"]);
    }
}

mod pipeline_mock {
    use super::*;

    const PIPELINE_INI: &str = "[screen]\nmin_apgar = 0\n\n[risk]\naccount_equity = 100000\n";

    fn port() -> MockDataPort {
        MockDataPort::new()
            .with_bars("AAA", weekday_bars(&breakout_closes()))
            .with_bars("DDD", weekday_bars(&breakdown_closes()))
            .with_bars("NEW", weekday_bars(&[100.0; 30]))
            .with_error("ERR", "connection reset")
    }

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn screens_ranks_and_collects_failures() {
        let report = cli::run_screen_pipeline(
            &adapter(PIPELINE_INI),
            &port(),
            &symbols(&["AAA", "DDD", "NEW", "ERR", "MISSING"]),
            None,
            &AccountState::default(),
        )
        .unwrap();

        let ranked: Vec<&str> = report
            .outcome
            .ranked
            .iter()
            .map(|s| s.symbol.as_str())
            .collect();
        assert_eq!(ranked.len(), 2);
        assert!(ranked.contains(&"AAA") && ranked.contains(&"DDD"));

        let failed: Vec<&str> = report
            .outcome
            .failures
            .iter()
            .map(|f| f.symbol.as_str())
            .collect();
        assert_eq!(failed, vec!["ERR", "MISSING", "NEW"]);
        assert!(matches!(
            report.outcome.failures[0].error,
            ScreenError::DataSource { .. }
        ));
        assert!(matches!(
            report.outcome.failures[1].error,
            ScreenError::NoData { .. }
        ));
        assert!(matches!(
            report.outcome.failures[2].error,
            ScreenError::InsufficientData { .. }
        ));
    }

    #[test]
    fn only_long_candidates_are_sized() {
        let report = cli::run_screen_pipeline(
            &adapter(PIPELINE_INI),
            &port(),
            &symbols(&["AAA", "DDD"]),
            None,
            &AccountState::default(),
        )
        .unwrap();

        assert_eq!(report.sizing.len(), report.outcome.ranked.len());
        assert_eq!(report.candidate_count(), 1);
        for (screen, sizing) in report.outcome.ranked.iter().zip(&report.sizing) {
            match screen.symbol.as_str() {
                "AAA" => {
                    let sizing = sizing.as_ref().expect("breakout should be sized");
                    assert!(!sizing.rejected);
                    assert!(sizing.shares > 0);
                    assert_relative_eq!(sizing.risk_amount, 2000.0);
                }
                _ => assert!(sizing.is_none()),
            }
        }
        assert_eq!(report.rows().len(), 2);
    }

    #[test]
    fn full_book_rejects_candidates() {
        let account = AccountState {
            open_positions: 5,
            month_to_date_drawdown: 0.0,
        };
        let report = cli::run_screen_pipeline(
            &adapter(PIPELINE_INI),
            &port(),
            &symbols(&["AAA"]),
            None,
            &account,
        )
        .unwrap();
        let sizing = report.sizing[0].as_ref().unwrap();
        assert!(sizing.rejected);
        assert_eq!(sizing.shares, 0);
        assert_eq!(sizing.reject_reason, Some(RejectReason::MaxPositionsReached));
    }

    #[test]
    fn without_risk_section_nothing_is_sized() {
        let report = cli::run_screen_pipeline(
            &adapter("[screen]\nmin_apgar = 0\n"),
            &port(),
            &symbols(&["AAA"]),
            None,
            &AccountState::default(),
        )
        .unwrap();
        assert_eq!(report.outcome.ranked.len(), 1);
        assert!(report.sizing[0].is_none());
    }

    #[test]
    fn as_of_truncates_history() {
        // the breakout starts on the 201st session, Monday 2020-10-12
        let report = cli::run_screen_pipeline(
            &adapter(PIPELINE_INI),
            &port(),
            &symbols(&["AAA"]),
            Some(date(2020, 10, 9)),
            &AccountState::default(),
        )
        .unwrap();
        let screen = &report.outcome.ranked[0];
        assert_eq!(screen.entry.date, date(2020, 10, 9));
        assert!(!screen.long_permitted);
    }

    #[test]
    fn invalid_risk_section_aborts() {
        let err = cli::run_screen_pipeline(
            &adapter("[risk]\naccount_equity = 1000\nmax_concurrent_positions = 0\n"),
            &port(),
            &symbols(&["AAA"]),
            None,
            &AccountState::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ScreenError::InvalidParameter { .. }));
    }
}

mod commands {
    use super::*;

    fn write_csv(dir: &Path, symbol: &str, closes: &[f64]) {
        let mut content = String::from("date,open,high,low,close,volume\n");
        for bar in weekday_bars(closes) {
            content.push_str(&format!(
                "{},{},{},{},{},{}\n",
                bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
            ));
        }
        std::fs::write(dir.join(format!("{}.csv", symbol)), content).unwrap();
    }

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(dir.path(), "AAA", &breakout_closes());
        write_csv(dir.path(), "CCC", &breakout_pullback_closes());
        write_csv(dir.path(), "DDD", &breakdown_closes());
        dir
    }

    fn ini_for(dir: &Path, extra: &str) -> tempfile::NamedTempFile {
        write_temp_ini(&format!(
            "[data]\npath = {}\n\n[risk]\naccount_equity = 100000\n\n{}",
            dir.display(),
            extra
        ))
    }

    fn screen_command(config: PathBuf, output: Option<PathBuf>) -> Cli {
        Cli {
            command: Command::Screen {
                config,
                symbols: None,
                as_of: None,
                output,
                open_positions: 0,
                mtd_drawdown: 0.0,
            },
        }
    }

    #[test]
    fn screen_writes_csv_report() {
        let dir = data_dir();
        let ini = ini_for(dir.path(), "[screen]\nmin_apgar = 0\n");
        let output = dir.path().join("report.csv");

        let code = cli::run(screen_command(ini.path().to_path_buf(), Some(output.clone())));
        assert_exit(code, 0);

        let report = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("rank,symbol,"));
        assert!(report.contains(",AAA,"));
        assert!(report.contains(",CCC,"));
        assert!(report.contains(",DDD,"));
    }

    #[test]
    fn screen_with_only_failures_reports_data_error() {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(dir.path(), "NEW", &[100.0; 30]);
        let ini = ini_for(dir.path(), "");
        let code = cli::run(screen_command(ini.path().to_path_buf(), None));
        assert_exit(code, 5);
    }

    #[test]
    fn screen_without_data_path_is_config_error() {
        let ini = write_temp_ini("[risk]\naccount_equity = 100000\n");
        let code = cli::run(screen_command(ini.path().to_path_buf(), None));
        assert_exit(code, 2);
    }

    #[test]
    fn missing_settings_file_is_config_error() {
        let code = cli::run(screen_command(
            PathBuf::from("/nonexistent/path/screen.ini"),
            None,
        ));
        assert_exit(code, 2);
    }

    #[test]
    fn size_command() {
        let dir = data_dir();
        let ini = ini_for(dir.path(), "");
        let code = cli::run(Cli {
            command: Command::Size {
                config: ini.path().to_path_buf(),
                entry: 50.0,
                stop: 48.0,
                open_positions: 0,
                mtd_drawdown: 0.0,
            },
        });
        assert_exit(code, 0);
    }

    #[test]
    fn size_command_invalid_stop() {
        let dir = data_dir();
        let ini = ini_for(dir.path(), "");
        let code = cli::run(Cli {
            command: Command::Size {
                config: ini.path().to_path_buf(),
                entry: 50.0,
                stop: 50.0,
                open_positions: 0,
                mtd_drawdown: 0.0,
            },
        });
        assert_exit(code, 4);
    }

    #[test]
    fn validate_command() {
        let dir = data_dir();
        let ok = ini_for(dir.path(), "[screen]\nmin_apgar = 7\n");
        assert_exit(
            cli::run(Cli {
                command: Command::Validate {
                    config: ok.path().to_path_buf(),
                },
            }),
            0,
        );

        let bad = ini_for(dir.path(), "[screen2]\nstochastic_midline = 120\n");
        assert_exit(
            cli::run(Cli {
                command: Command::Validate {
                    config: bad.path().to_path_buf(),
                },
            }),
            2,
        );
    }

    #[test]
    fn list_symbols_and_info() {
        let dir = data_dir();
        let ini = ini_for(dir.path(), "");
        assert_exit(
            cli::run(Cli {
                command: Command::ListSymbols {
                    config: ini.path().to_path_buf(),
                },
            }),
            0,
        );
        assert_exit(
            cli::run(Cli {
                command: Command::Info {
                    config: ini.path().to_path_buf(),
                    symbol: Some("AAA".to_string()),
                },
            }),
            0,
        );
    }
}
