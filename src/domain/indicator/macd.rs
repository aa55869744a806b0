//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! The line is defined from bar slow-1, the signal and histogram from
//! bar slow-1 + signal-1.

use crate::domain::error::ScreenError;
use crate::domain::indicator::ema::{calculate_ema, smooth};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;
/// A divergence window needs a first and a last bar.
pub const MIN_DIVERGENCE_LOOKBACK: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

impl MacdParams {
    /// Bars needed before the MACD line exists.
    pub fn min_bars(&self) -> usize {
        self.slow
    }

    /// Bars needed before the histogram exists.
    pub fn histogram_bars(&self) -> usize {
        self.slow + self.signal - 1
    }

    pub fn validate(&self) -> Result<(), ScreenError> {
        if self.fast == 0 || self.slow == 0 || self.signal == 0 {
            return Err(ScreenError::invalid_parameter(
                "macd periods",
                "all periods must be at least 1",
            ));
        }
        if self.fast >= self.slow {
            return Err(ScreenError::invalid_parameter(
                "macd periods",
                "fast period must be shorter than slow period",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacdSeries {
    pub line: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
}

pub fn calculate_macd(closes: &[f64], params: MacdParams) -> Result<MacdSeries, ScreenError> {
    params.validate()?;
    if closes.len() < params.min_bars() {
        return Err(ScreenError::insufficient(params.min_bars(), closes.len()));
    }

    let ema_fast = calculate_ema(closes, params.fast)?;
    let ema_slow = calculate_ema(closes, params.slow)?;

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(fast, slow)| Some((*fast)? - (*slow)?))
        .collect();

    let signal = smooth(&line, params.signal);

    let histogram = line
        .iter()
        .zip(&signal)
        .map(|(l, s)| Some((*l)? - (*s)?))
        .collect();

    Ok(MacdSeries {
        line,
        signal,
        histogram,
    })
}

/// Direction of a price/histogram disagreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// Price fell over the lookback while the histogram rose.
    Bullish,
    /// Price rose over the lookback while the histogram fell.
    Bearish,
}

impl std::fmt::Display for Divergence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Divergence::Bullish => write!(f, "Bullish"),
            Divergence::Bearish => write!(f, "Bearish"),
        }
    }
}

/// Compare price and histogram direction across the trailing `lookback`
/// bars: the first bar of the window against the last bar of the series.
/// Returns `None` when they agree, when either is unchanged, when the window
/// is shorter than two bars, or when the histogram is not yet defined at
/// both ends.
pub fn detect_divergence(
    closes: &[f64],
    histogram: &[Option<f64>],
    lookback: usize,
) -> Option<Divergence> {
    if lookback < MIN_DIVERGENCE_LOOKBACK || closes.len() != histogram.len() {
        return None;
    }
    let last = closes.len().checked_sub(1)?;
    let start = (last + 1).checked_sub(lookback)?;

    let price_delta = closes[last] - closes[start];
    let hist_delta = histogram[last]? - histogram[start]?;

    if price_delta < 0.0 && hist_delta > 0.0 {
        Some(Divergence::Bullish)
    } else if price_delta > 0.0 && hist_delta < 0.0 {
        Some(Divergence::Bearish)
    } else {
        None
    }
}
