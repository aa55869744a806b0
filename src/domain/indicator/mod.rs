//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values:
//! - `IndicatorType`: indicator identity + parameters, with its history requirement
//! - `IndicatorSet`: which indicators to compute for one series
//! - `IndicatorPoint`: per-bar values aligned 1:1 with the source bars
//!
//! Every value is an `Option<f64>`: `None` means "not yet computable"
//! (warmup, or a zero stochastic range), never a sentinel number.

pub mod atr;
pub mod ema;
pub mod force_index;
pub mod impulse;
pub mod macd;
pub mod rsi;
pub mod stochastic;

pub use ema::{calculate_ema, ema, ema_slope};
pub use macd::{Divergence, MacdParams, MacdSeries, calculate_macd, detect_divergence};

use crate::domain::error::ScreenError;
use crate::domain::ohlcv::BarSeries;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    ForceIndex(usize),
    Stochastic(usize),
    Atr(usize),
}

impl IndicatorType {
    /// Bars a series must hold before the indicator can be requested.
    pub fn min_bars(&self) -> usize {
        match *self {
            IndicatorType::Ema(period)
            | IndicatorType::Stochastic(period)
            | IndicatorType::Atr(period) => period,
            IndicatorType::Macd { slow, .. } => slow,
            IndicatorType::ForceIndex(period) => period + 1,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::ForceIndex(period) => write!(f, "FORCE({})", period),
            IndicatorType::Stochastic(period) => write!(f, "STOCHASTIC({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub ema: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub force_index: Option<f64>,
    pub stochastic_k: Option<f64>,
}

/// Indicators requested for one series. Unrequested fields stay absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorSet {
    pub ema_period: Option<usize>,
    pub macd: Option<MacdParams>,
    pub force_period: Option<usize>,
    pub stochastic_period: Option<usize>,
}

impl IndicatorSet {
    pub fn indicator_types(&self) -> Vec<IndicatorType> {
        let mut types = Vec::new();
        if let Some(period) = self.ema_period {
            types.push(IndicatorType::Ema(period));
        }
        if let Some(m) = self.macd {
            types.push(IndicatorType::Macd {
                fast: m.fast,
                slow: m.slow,
                signal: m.signal,
            });
        }
        if let Some(period) = self.force_period {
            types.push(IndicatorType::ForceIndex(period));
        }
        if let Some(period) = self.stochastic_period {
            types.push(IndicatorType::Stochastic(period));
        }
        types
    }

    /// Longest history requirement across the requested indicators.
    pub fn min_bars(&self) -> usize {
        self.indicator_types()
            .iter()
            .map(IndicatorType::min_bars)
            .max()
            .unwrap_or(0)
    }
}

/// Compute the requested indicators, aligned with the series' bars.
///
/// Fails with `InsufficientData` if the series is shorter than the longest
/// requested window; no partial result is returned.
pub fn compute_indicators(
    series: &BarSeries,
    set: &IndicatorSet,
) -> Result<Vec<IndicatorPoint>, ScreenError> {
    series.require(set.min_bars())?;

    let bars = series.bars();
    let closes = series.closes();
    let absent = || vec![None; bars.len()];

    let ema_values = match set.ema_period {
        Some(period) => calculate_ema(&closes, period)?,
        None => absent(),
    };
    let histogram = match set.macd {
        Some(params) => calculate_macd(&closes, params)?.histogram,
        None => absent(),
    };
    let force = match set.force_period {
        Some(period) => force_index::calculate_force_index(bars, period)?,
        None => absent(),
    };
    let stoch_k = match set.stochastic_period {
        Some(period) => stochastic::calculate_stochastic_k(bars, period)?,
        None => absent(),
    };

    Ok(bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorPoint {
            date: bar.date,
            close: bar.close,
            ema: ema_values[i],
            macd_histogram: histogram[i],
            force_index: force[i],
            stochastic_k: stoch_k[i],
        })
        .collect())
}
