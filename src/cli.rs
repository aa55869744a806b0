//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::apgar::ApgarTable;
use crate::domain::config_validation::{
    apgar_row, validate_data_config, validate_risk_config, validate_screen_config,
};
use crate::domain::error::ScreenError;
use crate::domain::indicator::MacdParams;
use crate::domain::ohlcv::{BarSeries, Frequency};
use crate::domain::screen_config::{
    DEFAULT_MIN_APGAR, EntryScreenConfig, ScreenConfig, TrendScreenConfig,
};
use crate::domain::screener::{BatchOutcome, SymbolFailure, screen_batch};
use crate::domain::sizing::{
    AccountState, DEFAULT_MAX_CONCURRENT_POSITIONS, DEFAULT_MONTHLY_DRAWDOWN_CAP_PCT,
    DEFAULT_RISK_PER_TRADE_PCT, DEFAULT_TARGET_REWARD_RISK, PositionSizeResult, RiskConfig,
    calculate_position_size,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::{ReportPort, ReportRow};

#[derive(Parser, Debug)]
#[command(
    name = "triplescreen",
    about = "Triple Screen stock screener with APGAR scoring and position sizing"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen symbols, rank them by APGAR and size the candidates
    Screen {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding [screen] symbols
        #[arg(long)]
        symbols: Option<String>,
        /// Ignore bars after this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Write the ranked results to a CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        open_positions: usize,
        /// Month-to-date realised loss, in account currency
        #[arg(long, default_value_t = 0.0)]
        mtd_drawdown: f64,
    },
    /// Position size for a single trade
    Size {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        entry: f64,
        #[arg(long)]
        stop: f64,
        #[arg(long, default_value_t = 0)]
        open_positions: usize,
        #[arg(long, default_value_t = 0.0)]
        mtd_drawdown: f64,
    },
    /// Validate a settings file and print the effective thresholds
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show bar count and date range for symbol(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Screen {
            config,
            symbols,
            as_of,
            output,
            open_positions,
            mtd_drawdown,
        } => run_screen(
            &config,
            symbols.as_deref(),
            as_of,
            output.as_deref(),
            AccountState {
                open_positions,
                month_to_date_drawdown: mtd_drawdown,
            },
        ),
        Command::Size {
            config,
            entry,
            stop,
            open_positions,
            mtd_drawdown,
        } => run_size(
            &config,
            entry,
            stop,
            AccountState {
                open_positions,
                month_to_date_drawdown: mtd_drawdown,
            },
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { config, symbol } => run_info(&config, symbol.as_deref()),
    }
}

fn fail(err: &ScreenError) -> ExitCode {
    error!("{err}");
    ExitCode::from(err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    info!("loading settings from {}", path.display());
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

pub fn build_screen_config(adapter: &dyn ConfigPort) -> Result<ScreenConfig, ScreenError> {
    let trend_defaults = TrendScreenConfig::default();
    let entry_defaults = EntryScreenConfig::default();

    let macd = MacdParams {
        fast: get_period(adapter, "screen1", "macd_fast", trend_defaults.macd.fast)?,
        slow: get_period(adapter, "screen1", "macd_slow", trend_defaults.macd.slow)?,
        signal: get_period(adapter, "screen1", "macd_signal", trend_defaults.macd.signal)?,
    };

    let trend = TrendScreenConfig {
        ema_period: get_period(adapter, "screen1", "ema_period", trend_defaults.ema_period)?,
        macd,
        divergence_lookback: get_period(
            adapter,
            "screen1",
            "divergence_lookback",
            trend_defaults.divergence_lookback,
        )?,
        flat_slope_pct: adapter.get_double(
            "screen1",
            "flat_slope_pct",
            trend_defaults.flat_slope_pct,
        ),
        strong_slope_pct: adapter.get_double(
            "screen1",
            "strong_slope_pct",
            trend_defaults.strong_slope_pct,
        ),
    };

    let entry = EntryScreenConfig {
        ema_period: get_period(adapter, "screen2", "ema_period", entry_defaults.ema_period)?,
        force_period: get_period(
            adapter,
            "screen2",
            "force_period",
            entry_defaults.force_period,
        )?,
        stochastic_period: get_period(
            adapter,
            "screen2",
            "stochastic_period",
            entry_defaults.stochastic_period,
        )?,
        stochastic_oversold: adapter.get_double(
            "screen2",
            "stochastic_oversold",
            entry_defaults.stochastic_oversold,
        ),
        stochastic_midline: adapter.get_double(
            "screen2",
            "stochastic_midline",
            entry_defaults.stochastic_midline,
        ),
        near_ema_pct: adapter.get_double("screen2", "near_ema_pct", entry_defaults.near_ema_pct),
        impulse_ema_period: get_period(
            adapter,
            "screen2",
            "impulse_ema_period",
            entry_defaults.impulse_ema_period,
        )?,
        impulse_macd: macd,
        atr_period: get_period(adapter, "screen2", "atr_period", entry_defaults.atr_period)?,
        atr_stop_multiple: adapter.get_double(
            "screen2",
            "atr_stop_multiple",
            entry_defaults.atr_stop_multiple,
        ),
        rsi_period: get_period(adapter, "screen2", "rsi_period", entry_defaults.rsi_period)?,
        long_force_period: get_period(
            adapter,
            "screen2",
            "long_force_period",
            entry_defaults.long_force_period,
        )?,
        divergence_lookback: get_period(
            adapter,
            "screen2",
            "divergence_lookback",
            entry_defaults.divergence_lookback,
        )?,
    };

    let table_defaults = ApgarTable::default();
    let apgar = ApgarTable {
        trend: apgar_row(adapter, "trend", table_defaults.trend)?,
        momentum: apgar_row(adapter, "momentum", table_defaults.momentum)?,
        force: apgar_row(adapter, "force", table_defaults.force)?,
        stochastic: apgar_row(adapter, "stochastic", table_defaults.stochastic)?,
        price_ema: apgar_row(adapter, "price_ema", table_defaults.price_ema)?,
    };

    let config = ScreenConfig {
        trend,
        entry,
        apgar,
        target_reward_risk: adapter.get_double(
            "risk",
            "target_reward_risk",
            DEFAULT_TARGET_REWARD_RISK,
        ),
    };
    config.validate()?;
    Ok(config)
}

pub fn build_risk_config(adapter: &dyn ConfigPort) -> Result<RiskConfig, ScreenError> {
    if adapter.get_string("risk", "account_equity").is_none() {
        return Err(ScreenError::config_missing("risk", "account_equity"));
    }
    let max_positions = adapter.get_int(
        "risk",
        "max_concurrent_positions",
        DEFAULT_MAX_CONCURRENT_POSITIONS as i64,
    );
    let config = RiskConfig {
        account_equity: adapter.get_double("risk", "account_equity", 0.0),
        risk_per_trade_pct: adapter.get_double(
            "risk",
            "risk_per_trade_pct",
            DEFAULT_RISK_PER_TRADE_PCT,
        ),
        monthly_drawdown_cap_pct: adapter.get_double(
            "risk",
            "monthly_drawdown_cap_pct",
            DEFAULT_MONTHLY_DRAWDOWN_CAP_PCT,
        ),
        target_reward_risk_ratio: adapter.get_double(
            "risk",
            "target_reward_risk",
            DEFAULT_TARGET_REWARD_RISK,
        ),
        max_concurrent_positions: usize::try_from(max_positions).map_err(|_| {
            ScreenError::config_invalid(
                "risk",
                "max_concurrent_positions",
                "max_concurrent_positions must be at least 1",
            )
        })?,
    };
    config.validate()?;
    Ok(config)
}

pub fn min_apgar(adapter: &dyn ConfigPort) -> u8 {
    let value = adapter.get_int("screen", "min_apgar", i64::from(DEFAULT_MIN_APGAR));
    value.clamp(0, 10) as u8
}

fn get_period(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, ScreenError> {
    let value = adapter.get_int(section, key, default as i64);
    match usize::try_from(value) {
        Ok(period) if period > 0 => Ok(period),
        _ => Err(ScreenError::config_invalid(
            section,
            key,
            &format!("{} must be at least 1", key),
        )),
    }
}

fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Command-line symbols, then `[screen] symbols`, then everything the data
/// source has.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, ScreenError> {
    if let Some(raw) = symbol_override {
        return Ok(parse_symbol_list(raw));
    }
    if let Some(raw) = config.get_string("screen", "symbols") {
        let symbols = parse_symbol_list(&raw);
        if !symbols.is_empty() {
            return Ok(symbols);
        }
    }
    data_port.list_symbols()
}

/// Fetch daily series for every symbol, up to and including `as_of`.
pub fn load_series(
    data_port: &dyn DataPort,
    symbols: &[String],
    as_of: Option<NaiveDate>,
) -> (Vec<BarSeries>, Vec<SymbolFailure>) {
    let end = as_of.unwrap_or(NaiveDate::MAX);
    let mut series = Vec::with_capacity(symbols.len());
    let mut failures = Vec::new();

    for symbol in symbols {
        let loaded = data_port
            .fetch_ohlcv(symbol, NaiveDate::MIN, end)
            .and_then(|bars| {
                if bars.is_empty() {
                    Err(ScreenError::NoData {
                        symbol: symbol.clone(),
                    })
                } else {
                    BarSeries::new(symbol.as_str(), Frequency::Daily, bars)
                }
            });
        match loaded {
            Ok(s) => series.push(s),
            Err(error) => {
                warn!("skipping {} ({})", symbol, error);
                failures.push(SymbolFailure {
                    symbol: symbol.clone(),
                    error,
                });
            }
        }
    }
    (series, failures)
}

/// Ranked screen results with the sizing of each candidate, aligned by index.
#[derive(Debug)]
pub struct ScreenReport {
    pub outcome: BatchOutcome,
    pub sizing: Vec<Option<PositionSizeResult>>,
    pub min_apgar: u8,
}

impl ScreenReport {
    pub fn rows(&self) -> Vec<ReportRow<'_>> {
        self.outcome
            .ranked
            .iter()
            .zip(&self.sizing)
            .map(|(screen, sizing)| ReportRow {
                screen,
                sizing: sizing.as_ref(),
            })
            .collect()
    }

    pub fn candidate_count(&self) -> usize {
        self.outcome
            .ranked
            .iter()
            .filter(|s| s.is_candidate(self.min_apgar))
            .count()
    }
}

/// Load, screen and size. Per-symbol problems end up in
/// `outcome.failures`; only configuration errors abort.
pub fn run_screen_pipeline(
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
    symbols: &[String],
    as_of: Option<NaiveDate>,
    account: &AccountState,
) -> Result<ScreenReport, ScreenError> {
    let screen_config = build_screen_config(config)?;
    let min_apgar = min_apgar(config);
    let risk = match build_risk_config(config) {
        Ok(risk) => Some(risk),
        Err(ScreenError::ConfigMissing { .. }) => {
            warn!("no [risk] account_equity configured; candidates will not be sized");
            None
        }
        Err(e) => return Err(e),
    };

    let (series, load_failures) = load_series(data_port, symbols, as_of);
    info!("screening {} symbols", series.len());

    let mut outcome = screen_batch(&series, &screen_config);
    for failure in &outcome.failures {
        warn!("skipping {} ({})", failure.symbol, failure.error);
    }
    outcome.failures.extend(load_failures);
    outcome.failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let sizing = outcome
        .ranked
        .iter()
        .map(|screen| {
            let risk = risk.as_ref()?;
            if !screen.is_candidate(min_apgar) {
                return None;
            }
            let levels = screen.levels?;
            match calculate_position_size(risk, levels.entry, levels.stop_loss, account) {
                Ok(result) => Some(result),
                Err(e) => {
                    warn!("cannot size {} ({})", screen.symbol, e);
                    None
                }
            }
        })
        .collect();

    Ok(ScreenReport {
        outcome,
        sizing,
        min_apgar,
    })
}

fn data_adapter(config: &dyn ConfigPort) -> Result<CsvAdapter, ScreenError> {
    validate_data_config(config)?;
    let path = config
        .get_string("data", "path")
        .ok_or_else(|| ScreenError::config_missing("data", "path"))?;
    Ok(CsvAdapter::new(PathBuf::from(path.trim())))
}

fn run_screen(
    config_path: &Path,
    symbol_override: Option<&str>,
    as_of: Option<NaiveDate>,
    output_path: Option<&Path>,
    account: AccountState,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_screen_config(&config) {
        return fail(&e);
    }
    let data = match data_adapter(&config) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let symbols = match resolve_symbols(symbol_override, &config, &data) {
        Ok(s) if !s.is_empty() => s,
        Ok(_) => return fail(&ScreenError::config_missing("screen", "symbols")),
        Err(e) => return fail(&e),
    };

    let report = match run_screen_pipeline(&config, &data, &symbols, as_of, &account) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    print_report(&report);

    if let Some(path) = output_path {
        let rows = report.rows();
        let written = path
            .to_str()
            .ok_or_else(|| ScreenError::invalid_parameter("output", "path is not valid UTF-8"))
            .and_then(|p| CsvReportAdapter::new().write(&rows, p));
        if let Err(e) = written {
            return fail(&e);
        }
    }

    if report.outcome.ranked.is_empty() {
        if let Some(first) = report.outcome.failures.first() {
            error!("no symbol could be screened");
            return ExitCode::from(&first.error);
        }
    }
    ExitCode::SUCCESS
}

fn print_report(report: &ScreenReport) {
    println!(
        "{:<4} {:<8} {:<11} {:<16} {:<20} {:<20} {:<9} {:<16} {:>5}  {:<9} {:<6} {:<8}",
        "#", "SYMBOL", "DATE", "WEEKLY EMA", "WEEKLY MACD-H", "FORCE", "STOCH", "PRICE", "APGAR",
        "VERDICT", "GRADE", "ACTION"
    );
    for (i, screen) in report.outcome.ranked.iter().enumerate() {
        let trend = &screen.trend.category;
        let entry = &screen.entry.category;
        println!(
            "{:<4} {:<8} {:<11} {:<16} {:<20} {:<20} {:<9} {:<16} {:>5}  {:<9} {:<6} {:<8}",
            i + 1,
            screen.symbol,
            screen.entry.date.to_string(),
            trend.trend.to_string(),
            trend.momentum.to_string(),
            entry.force.to_string(),
            entry.stochastic.to_string(),
            entry.price_zone.to_string(),
            screen.apgar.total,
            screen.apgar.verdict.to_string(),
            screen.signal.grade.to_string(),
            screen.signal.action().to_string(),
        );
    }

    let candidates: Vec<_> = report
        .outcome
        .ranked
        .iter()
        .zip(&report.sizing)
        .filter(|(screen, _)| screen.is_candidate(report.min_apgar))
        .collect();
    if candidates.is_empty() {
        println!("\nNo candidates at APGAR >= {}", report.min_apgar);
        return;
    }

    println!("\n=== Candidates (APGAR >= {}) ===", report.min_apgar);
    for (screen, sizing) in candidates {
        println!("\n{} ({}/10, {})", screen.symbol, screen.apgar.total, screen.apgar.verdict);
        for line in screen.apgar.breakdown() {
            println!("  {}", line);
        }
        let snapshot = &screen.entry.snapshot;
        println!(
            "  Signal: {}/10, grade {} ({})",
            screen.signal.strength,
            screen.signal.grade,
            screen.signal.action()
        );
        if let Some(impulse) = snapshot.impulse {
            println!("  Impulse: {}", impulse);
        }
        if let Some(rsi) = snapshot.rsi {
            println!("  RSI: {:.1}", rsi);
        }
        if let Some(divergence) = snapshot.divergence {
            println!("  Daily divergence: {}", divergence);
        }
        if !screen.patterns.is_empty() {
            let names: Vec<String> = screen.patterns.iter().map(|p| p.to_string()).collect();
            println!("  Candlesticks: {}", names.join(", "));
        }
        if let Some(levels) = &screen.levels {
            println!(
                "  Entry {:.2}  Stop {:.2} ({:.1}%)  Targets {:.2} / {:.2} / {:.2}",
                levels.entry,
                levels.stop_loss,
                levels.risk_pct,
                levels.target_1,
                levels.target_2,
                levels.target_3
            );
        }
        match sizing {
            Some(s) if s.rejected => {
                if let Some(reason) = s.reject_reason {
                    println!("  Size: rejected ({})", reason);
                }
            }
            Some(s) => println!(
                "  Size: {} shares, risk {:.2}, target {:.2}",
                s.shares, s.risk_amount, s.reward_target
            ),
            None => {}
        }
    }
}

fn run_size(config_path: &Path, entry: f64, stop: f64, account: AccountState) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_risk_config(&config) {
        return fail(&e);
    }
    let risk = match build_risk_config(&config) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    let result = match calculate_position_size(&risk, entry, stop, &account) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    println!("Direction:       {}", result.direction);
    println!("Per-share risk:  {:.4}", result.per_share_risk);
    println!("Risk amount:     {:.2}", result.risk_amount);
    println!("Reward target:   {:.4}", result.reward_target);
    match result.reject_reason {
        Some(reason) => println!("Rejected:        {}", reason),
        None => {
            println!("Shares:          {}", result.shares);
            println!("Position value:  {:.2}", result.position_value(entry));
        }
    }
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_screen_config(&config) {
        return fail(&e);
    }
    let screen = match build_screen_config(&config) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    let t = &screen.trend;
    let e = &screen.entry;
    println!("Screen 1 (weekly):");
    println!("  EMA period:          {}", t.ema_period);
    println!(
        "  MACD:                {},{},{}",
        t.macd.fast, t.macd.slow, t.macd.signal
    );
    println!("  Divergence lookback: {}", t.divergence_lookback);
    println!(
        "  Slope thresholds:    flat {}%, strong {}%",
        t.flat_slope_pct, t.strong_slope_pct
    );
    println!("  Bars required:       {}", t.required_bars());
    println!("Screen 2 (daily):");
    println!("  EMA period:          {}", e.ema_period);
    println!("  Force Index period:  {}", e.force_period);
    println!(
        "  Stochastic:          {} (bands {} / {})",
        e.stochastic_period, e.stochastic_oversold, e.stochastic_midline
    );
    println!("  Near EMA:            {}%", e.near_ema_pct);
    println!(
        "  SafeZone stop:       {} x ATR({})",
        e.atr_stop_multiple, e.atr_period
    );
    println!("  Bars required:       {}", e.required_bars());
    println!("APGAR:");
    println!("  Minimum for sizing:  {}", min_apgar(&config));
    println!("  Weekly EMA:          {:?}", screen.apgar.trend);
    println!("  Weekly MACD-H:       {:?}", screen.apgar.momentum);
    println!("  Force Index:         {:?}", screen.apgar.force);
    println!("  Stochastic:          {:?}", screen.apgar.stochastic);
    println!("  Price vs EMA:        {:?}", screen.apgar.price_ema);

    if config.get_string("risk", "account_equity").is_some() {
        if let Err(e) = validate_risk_config(&config) {
            return fail(&e);
        }
        match build_risk_config(&config) {
            Ok(r) => {
                println!("Risk:");
                println!("  Account equity:      {:.2}", r.account_equity);
                println!(
                    "  Per trade:           {}% ({:.2})",
                    r.risk_per_trade_pct,
                    r.risk_amount()
                );
                println!(
                    "  Monthly cap:         {}% ({:.2})",
                    r.monthly_drawdown_cap_pct,
                    r.drawdown_cap()
                );
                println!("  Reward/risk target:  {}", r.target_reward_risk_ratio);
                println!("  Max positions:       {}", r.max_concurrent_positions);
            }
            Err(e) => return fail(&e),
        }
    } else {
        println!("Risk: not configured (sizing disabled)");
    }

    info!("configuration is valid");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data = match data_adapter(&config) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };

    match data.list_symbols() {
        Ok(symbols) if symbols.is_empty() => {
            warn!("no symbols found");
            ExitCode::SUCCESS
        }
        Ok(symbols) => {
            for symbol in &symbols {
                println!("{}", symbol);
            }
            info!("{} symbols found", symbols.len());
            ExitCode::SUCCESS
        }
        Err(e) => fail(&e),
    }
}

fn run_info(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let data = match data_adapter(&config) {
        Ok(d) => d,
        Err(e) => return fail(&e),
    };
    let symbols = match resolve_symbols(symbol, &config, &data) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    for s in &symbols {
        match data.get_data_range(s) {
            Ok(Some((first, last, count))) => {
                println!("{}: {} bars, {} to {}", s, count, first, last);
            }
            Ok(None) => println!("{}: no data", s),
            Err(e) => warn!("error reading {}: {}", s, e),
        }
    }
    ExitCode::SUCCESS
}
