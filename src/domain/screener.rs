//! Per-symbol pipeline (bars → screens → APGAR → grade) and the parallel batch.
//!
//! Each symbol is independent, so a batch fans out over rayon. Failures are
//! collected per symbol instead of aborting the batch.

use crate::domain::apgar::{self, ApgarInputs, ApgarScore};
use crate::domain::entry_screen::{EntryScreen, screen_entry};
use crate::domain::error::ScreenError;
use crate::domain::grade::{self, TradeSignal};
use crate::domain::indicator::Divergence;
use crate::domain::ohlcv::BarSeries;
use crate::domain::pattern::{CandlePattern, scan_patterns};
use crate::domain::screen_config::ScreenConfig;
use crate::domain::sizing::{TradeLevels, safezone_levels};
use crate::domain::trend_screen::{TrendScreen, screen_trend};
use rayon::prelude::*;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolScreen {
    pub symbol: String,
    pub trend: TrendScreen,
    pub entry: EntryScreen,
    pub apgar: ApgarScore,
    /// Screen 1 allows long entries (Rising or StronglyRising).
    pub long_permitted: bool,
    /// SafeZone levels off the last daily close, when ATR is available.
    pub levels: Option<TradeLevels>,
    /// Candlestick patterns completed by the last daily bar.
    pub patterns: Vec<CandlePattern>,
    pub signal: TradeSignal,
}

impl SymbolScreen {
    /// Longs permitted, APGAR at or above `min_apgar`, and no Red Impulse veto.
    pub fn is_candidate(&self, min_apgar: u8) -> bool {
        self.long_permitted && self.apgar.total >= min_apgar && !self.signal.is_vetoed()
    }
}

/// Screen one symbol from its weekly and daily series.
pub fn screen_symbol(
    weekly: &BarSeries,
    daily: &BarSeries,
    config: &ScreenConfig,
) -> Result<SymbolScreen, ScreenError> {
    if weekly.symbol() != daily.symbol() {
        return Err(ScreenError::invalid_parameter(
            "series",
            &format!(
                "weekly '{}' and daily '{}' belong to different symbols",
                weekly.symbol(),
                daily.symbol()
            ),
        ));
    }
    config.validate()?;

    let trend = screen_trend(weekly, &config.trend)?;
    let entry = screen_entry(daily, &config.entry)?;
    let inputs = ApgarInputs::from_states(&trend.category, &entry.category);
    let apgar = apgar::score(inputs, &config.apgar)?;
    let patterns = scan_patterns(daily.bars());
    let signal = grade::assess(
        apgar.total,
        entry.snapshot.impulse,
        entry.snapshot.divergence == Some(Divergence::Bullish),
        &patterns,
    );

    let levels = entry.snapshot.atr.and_then(|atr| {
        safezone_levels(
            entry.snapshot.close,
            atr,
            config.entry.atr_stop_multiple,
            config.target_reward_risk,
        )
        .ok()
    });

    Ok(SymbolScreen {
        symbol: daily.symbol().to_string(),
        long_permitted: trend.category.trend.permits_long(),
        trend,
        entry,
        apgar,
        levels,
        patterns,
        signal,
    })
}

/// Screen a daily series, deriving the weekly series from it.
pub fn screen_daily(daily: &BarSeries, config: &ScreenConfig) -> Result<SymbolScreen, ScreenError> {
    let weekly = daily.to_weekly();
    screen_symbol(&weekly, daily, config)
}

#[derive(Debug)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: ScreenError,
}

#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Best setups first.
    pub ranked: Vec<SymbolScreen>,
    pub failures: Vec<SymbolFailure>,
}

/// Screen many daily series in parallel and rank the successes.
pub fn screen_batch(series: &[BarSeries], config: &ScreenConfig) -> BatchOutcome {
    let results: Vec<Result<SymbolScreen, SymbolFailure>> = series
        .par_iter()
        .map(|daily| {
            screen_daily(daily, config).map_err(|error| SymbolFailure {
                symbol: daily.symbol().to_string(),
                error,
            })
        })
        .collect();

    let mut outcome = BatchOutcome::default();
    for result in results {
        match result {
            Ok(screen) => outcome.ranked.push(screen),
            Err(failure) => outcome.failures.push(failure),
        }
    }
    rank(&mut outcome.ranked);
    outcome.failures.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    outcome
}

/// APGAR total descending, then symbol ascending.
pub fn rank(screens: &mut [SymbolScreen]) {
    screens.sort_by(|a, b| match b.apgar.total.cmp(&a.apgar.total) {
        Ordering::Equal => a.symbol.cmp(&b.symbol),
        other => other,
    });
}
