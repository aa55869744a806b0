//! Screen 1: weekly trend filter.
//!
//! The trend category comes from the EMA slope (thresholded as a percentage
//! of the previous EMA) and the direction of the MACD histogram. A divergence
//! that runs against the slope moves the category one step toward `Flat`.

use crate::domain::error::ScreenError;
use crate::domain::indicator::{Divergence, IndicatorSet, compute_indicators, detect_divergence};
use crate::domain::ohlcv::BarSeries;
use crate::domain::screen_config::TrendScreenConfig;
use crate::domain::screen_result::ScreenResult;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrendCategory {
    StronglyFalling,
    Falling,
    Flat,
    Rising,
    StronglyRising,
}

impl TrendCategory {
    pub const ALL: [TrendCategory; 5] = [
        TrendCategory::StronglyFalling,
        TrendCategory::Falling,
        TrendCategory::Flat,
        TrendCategory::Rising,
        TrendCategory::StronglyRising,
    ];

    /// Position in the ordering, poorest first.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Long entries are only taken with a rising weekly trend.
    pub fn permits_long(self) -> bool {
        self >= TrendCategory::Rising
    }

    fn toward_flat(self) -> Self {
        match self {
            TrendCategory::StronglyRising => TrendCategory::Rising,
            TrendCategory::Rising => TrendCategory::Flat,
            TrendCategory::Flat => TrendCategory::Flat,
            TrendCategory::Falling => TrendCategory::Flat,
            TrendCategory::StronglyFalling => TrendCategory::Falling,
        }
    }
}

impl fmt::Display for TrendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrendCategory::StronglyFalling => "Strongly Falling",
            TrendCategory::Falling => "Falling",
            TrendCategory::Flat => "Flat",
            TrendCategory::Rising => "Rising",
            TrendCategory::StronglyRising => "Strongly Rising",
        };
        f.write_str(label)
    }
}

/// Weekly MACD-histogram direction, scored as its own APGAR component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MomentumCategory {
    Falling,
    Rising,
    RisingWithDivergence,
}

impl MomentumCategory {
    pub const ALL: [MomentumCategory; 3] = [
        MomentumCategory::Falling,
        MomentumCategory::Rising,
        MomentumCategory::RisingWithDivergence,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for MomentumCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MomentumCategory::Falling => "Falling",
            MomentumCategory::Rising => "Rising",
            MomentumCategory::RisingWithDivergence => "Rising + Divergence",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendState {
    pub trend: TrendCategory,
    pub momentum: MomentumCategory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSnapshot {
    pub ema: f64,
    pub ema_prev: f64,
    pub ema_slope: f64,
    pub ema_slope_pct: f64,
    pub macd_histogram: f64,
    pub macd_histogram_prev: f64,
    pub divergence: Option<Divergence>,
}

pub type TrendScreen = ScreenResult<TrendState, TrendSnapshot>;

/// Classify from already-computed values.
pub fn classify_trend(snapshot: &TrendSnapshot, config: &TrendScreenConfig) -> TrendState {
    let slope_pct = snapshot.ema_slope_pct;
    let hist_delta = snapshot.macd_histogram - snapshot.macd_histogram_prev;
    let strong = slope_pct.abs() >= config.strong_slope_pct;

    let base = if slope_pct > config.flat_slope_pct {
        if strong && hist_delta > 0.0 {
            TrendCategory::StronglyRising
        } else {
            TrendCategory::Rising
        }
    } else if slope_pct < -config.flat_slope_pct {
        if strong && hist_delta < 0.0 {
            TrendCategory::StronglyFalling
        } else {
            TrendCategory::Falling
        }
    } else {
        TrendCategory::Flat
    };

    let trend = match (base, snapshot.divergence) {
        (TrendCategory::Rising | TrendCategory::StronglyRising, Some(Divergence::Bearish))
        | (TrendCategory::Falling | TrendCategory::StronglyFalling, Some(Divergence::Bullish)) => {
            base.toward_flat()
        }
        _ => base,
    };

    let momentum = if hist_delta > 0.0 {
        if snapshot.divergence == Some(Divergence::Bullish) {
            MomentumCategory::RisingWithDivergence
        } else {
            MomentumCategory::Rising
        }
    } else {
        MomentumCategory::Falling
    };

    TrendState { trend, momentum }
}

/// Run Screen 1 on the last bar of a (weekly) series.
pub fn screen_trend(
    series: &BarSeries,
    config: &TrendScreenConfig,
) -> Result<TrendScreen, ScreenError> {
    config.validate()?;
    series.require(config.required_bars())?;

    let set = IndicatorSet {
        ema_period: Some(config.ema_period),
        macd: Some(config.macd),
        force_period: None,
        stochastic_period: None,
    };
    let points = compute_indicators(series, &set)?;
    let last = points.len() - 1;
    let (cur, prev) = (&points[last], &points[last - 1]);

    let missing = || ScreenError::insufficient(config.required_bars(), points.len());
    let ema = cur.ema.ok_or_else(missing)?;
    let ema_prev = prev.ema.ok_or_else(missing)?;
    let macd_histogram = cur.macd_histogram.ok_or_else(missing)?;
    let macd_histogram_prev = prev.macd_histogram.ok_or_else(missing)?;

    let closes: Vec<f64> = points.iter().map(|p| p.close).collect();
    let histogram: Vec<Option<f64>> = points.iter().map(|p| p.macd_histogram).collect();

    let ema_slope = ema - ema_prev;
    let ema_slope_pct = if ema_prev != 0.0 {
        ema_slope / ema_prev * 100.0
    } else {
        0.0
    };

    let snapshot = TrendSnapshot {
        ema,
        ema_prev,
        ema_slope,
        ema_slope_pct,
        macd_histogram,
        macd_histogram_prev,
        divergence: detect_divergence(&closes, &histogram, config.divergence_lookback),
    };

    Ok(ScreenResult {
        date: cur.date,
        category: classify_trend(&snapshot, config),
        snapshot,
    })
}
