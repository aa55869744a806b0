//! Screen 2: daily entry timing.
//!
//! Classifies the last daily bar on three axes: Force Index sign and trend,
//! stochastic band, and distance of the close above the EMA. Screen 2 is
//! computed regardless of Screen 1; combining the two (longs only with a
//! rising weekly trend) is the caller's job.

use crate::domain::error::ScreenError;
use crate::domain::indicator::impulse::{Impulse, calculate_impulse};
use crate::domain::indicator::stochastic::{DEFAULT_SMOOTH, calculate_stochastic_d};
use crate::domain::indicator::{
    Divergence, IndicatorSet, atr, calculate_macd, compute_indicators, detect_divergence,
    force_index, rsi,
};
use crate::domain::ohlcv::BarSeries;
use crate::domain::screen_config::EntryScreenConfig;
use crate::domain::screen_result::ScreenResult;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ForceCategory {
    AboveZero,
    Flat,
    BelowZeroFalling,
    BelowZeroRisingUptick,
}

impl ForceCategory {
    pub const ALL: [ForceCategory; 4] = [
        ForceCategory::AboveZero,
        ForceCategory::Flat,
        ForceCategory::BelowZeroFalling,
        ForceCategory::BelowZeroRisingUptick,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ForceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ForceCategory::AboveZero => "Above Zero",
            ForceCategory::Flat => "Flat",
            ForceCategory::BelowZeroFalling => "Below Zero",
            ForceCategory::BelowZeroRisingUptick => "Below Zero + Uptick",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StochasticBand {
    Above50,
    Between30And50,
    Below30,
}

impl StochasticBand {
    pub const ALL: [StochasticBand; 3] = [
        StochasticBand::Above50,
        StochasticBand::Between30And50,
        StochasticBand::Below30,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StochasticBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StochasticBand::Above50 => "Above 50",
            StochasticBand::Between30And50 => "30-50",
            StochasticBand::Below30 => "Below 30",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriceEmaZone {
    FarAbove,
    NearAbove,
    AtOrBelow,
}

impl PriceEmaZone {
    pub const ALL: [PriceEmaZone; 3] = [
        PriceEmaZone::FarAbove,
        PriceEmaZone::NearAbove,
        PriceEmaZone::AtOrBelow,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PriceEmaZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PriceEmaZone::FarAbove => "Far Above EMA",
            PriceEmaZone::NearAbove => "Near Above EMA",
            PriceEmaZone::AtOrBelow => "At or Below EMA",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryState {
    pub force: ForceCategory,
    pub stochastic: StochasticBand,
    pub price_zone: PriceEmaZone,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntrySnapshot {
    pub close: f64,
    pub ema: f64,
    pub price_vs_ema_pct: f64,
    pub force_index: f64,
    pub force_index_prev: f64,
    pub stochastic_k: Option<f64>,
    pub stochastic_d: Option<f64>,
    pub impulse: Option<Impulse>,
    pub atr: Option<f64>,
    pub rsi: Option<f64>,
    /// Force Index over the longer (13-bar) smoothing.
    pub force_index_long: Option<f64>,
    /// Daily divergence of price against the MACD histogram or RSI.
    pub divergence: Option<Divergence>,
}

pub type EntryScreen = ScreenResult<EntryState, EntrySnapshot>;

pub fn classify_force(force_index: f64, force_index_prev: f64) -> ForceCategory {
    if force_index > 0.0 {
        ForceCategory::AboveZero
    } else if force_index == 0.0 {
        ForceCategory::Flat
    } else if force_index > force_index_prev {
        ForceCategory::BelowZeroRisingUptick
    } else {
        ForceCategory::BelowZeroFalling
    }
}

/// An absent %K (flat high/low window) falls in the poorest band.
pub fn classify_stochastic(k: Option<f64>, config: &EntryScreenConfig) -> StochasticBand {
    match k {
        Some(k) if k < config.stochastic_oversold => StochasticBand::Below30,
        Some(k) if k < config.stochastic_midline => StochasticBand::Between30And50,
        _ => StochasticBand::Above50,
    }
}

pub fn classify_price_zone(price_vs_ema_pct: f64, config: &EntryScreenConfig) -> PriceEmaZone {
    if price_vs_ema_pct <= 0.0 {
        PriceEmaZone::AtOrBelow
    } else if price_vs_ema_pct < config.near_ema_pct {
        PriceEmaZone::NearAbove
    } else {
        PriceEmaZone::FarAbove
    }
}

/// Either oscillator diverging bullishly counts as bullish; a bearish
/// reading only stands when neither is bullish.
pub fn combine_divergence(
    macd: Option<Divergence>,
    rsi: Option<Divergence>,
) -> Option<Divergence> {
    match (macd, rsi) {
        (Some(Divergence::Bullish), _) | (_, Some(Divergence::Bullish)) => {
            Some(Divergence::Bullish)
        }
        (Some(Divergence::Bearish), _) | (_, Some(Divergence::Bearish)) => {
            Some(Divergence::Bearish)
        }
        _ => None,
    }
}

/// Run Screen 2 on the last bar of a (daily) series.
pub fn screen_entry(
    series: &BarSeries,
    config: &EntryScreenConfig,
) -> Result<EntryScreen, ScreenError> {
    config.validate()?;
    series.require(config.required_bars())?;

    let set = IndicatorSet {
        ema_period: Some(config.ema_period),
        macd: None,
        force_period: Some(config.force_period),
        stochastic_period: Some(config.stochastic_period),
    };
    let points = compute_indicators(series, &set)?;
    let last = points.len() - 1;
    let (cur, prev) = (&points[last], &points[last - 1]);

    let missing = || ScreenError::insufficient(config.required_bars(), points.len());
    let ema = cur.ema.ok_or_else(missing)?;
    let force_index = cur.force_index.ok_or_else(missing)?;
    let force_index_prev = prev.force_index.ok_or_else(missing)?;

    let price_vs_ema_pct = if ema != 0.0 {
        (cur.close / ema - 1.0) * 100.0
    } else {
        0.0
    };

    let k_values: Vec<Option<f64>> = points.iter().map(|p| p.stochastic_k).collect();
    let stochastic_d = calculate_stochastic_d(&k_values, DEFAULT_SMOOTH)[last];

    let closes = series.closes();
    let impulse = optional(calculate_impulse(
        &closes,
        config.impulse_ema_period,
        config.impulse_macd,
    ))?
    .and_then(|values| values[last]);
    let atr = optional(atr::calculate_atr(series.bars(), config.atr_period))?
        .and_then(|values| values[last]);
    let force_index_long = optional(force_index::calculate_force_index(
        series.bars(),
        config.long_force_period,
    ))?
    .and_then(|values| values[last]);

    let rsi_values = optional(rsi::calculate_rsi(&closes, config.rsi_period))?;
    let histogram = optional(calculate_macd(&closes, config.impulse_macd))?.map(|m| m.histogram);
    let divergence = combine_divergence(
        histogram
            .as_deref()
            .and_then(|h| detect_divergence(&closes, h, config.divergence_lookback)),
        rsi_values
            .as_deref()
            .and_then(|r| detect_divergence(&closes, r, config.divergence_lookback)),
    );

    let snapshot = EntrySnapshot {
        close: cur.close,
        ema,
        price_vs_ema_pct,
        force_index,
        force_index_prev,
        stochastic_k: cur.stochastic_k,
        stochastic_d,
        impulse,
        atr,
        rsi: rsi_values.and_then(|values| values[last]),
        force_index_long,
        divergence,
    };

    let category = EntryState {
        force: classify_force(force_index, force_index_prev),
        stochastic: classify_stochastic(snapshot.stochastic_k, config),
        price_zone: classify_price_zone(price_vs_ema_pct, config),
    };

    Ok(ScreenResult {
        date: cur.date,
        category,
        snapshot,
    })
}

/// Supplementary indicators are dropped rather than failing the screen
/// when the series is too short for them.
fn optional<T>(result: Result<T, ScreenError>) -> Result<Option<T>, ScreenError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ScreenError::InsufficientData { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ohlcv::{Frequency, OhlcvBar};
    use chrono::NaiveDate;

    fn daily(closes: &[f64]) -> BarSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| OhlcvBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
                volume: 1_000,
            })
            .collect();
        BarSeries::new("TEST", Frequency::Daily, bars).unwrap()
    }

    #[test]
    fn categories_are_ordered_poorest_first() {
        assert!(ForceCategory::AboveZero < ForceCategory::Flat);
        assert!(ForceCategory::Flat < ForceCategory::BelowZeroFalling);
        assert!(ForceCategory::BelowZeroFalling < ForceCategory::BelowZeroRisingUptick);
        assert!(StochasticBand::Above50 < StochasticBand::Below30);
        assert!(PriceEmaZone::FarAbove < PriceEmaZone::AtOrBelow);
    }

    #[test]
    fn force_classification() {
        assert_eq!(classify_force(500.0, -100.0), ForceCategory::AboveZero);
        assert_eq!(classify_force(0.0, -100.0), ForceCategory::Flat);
        assert_eq!(classify_force(-200.0, -100.0), ForceCategory::BelowZeroFalling);
        assert_eq!(classify_force(-100.0, 300.0), ForceCategory::BelowZeroFalling);
        assert_eq!(
            classify_force(-50.0, -100.0),
            ForceCategory::BelowZeroRisingUptick
        );
    }

    #[test]
    fn stochastic_bands_use_configured_boundaries() {
        let config = EntryScreenConfig::default();
        assert_eq!(classify_stochastic(Some(10.0), &config), StochasticBand::Below30);
        assert_eq!(
            classify_stochastic(Some(30.0), &config),
            StochasticBand::Between30And50
        );
        assert_eq!(
            classify_stochastic(Some(49.9), &config),
            StochasticBand::Between30And50
        );
        assert_eq!(classify_stochastic(Some(50.0), &config), StochasticBand::Above50);
        assert_eq!(classify_stochastic(None, &config), StochasticBand::Above50);
    }

    #[test]
    fn price_zone_classification() {
        let config = EntryScreenConfig::default();
        assert_eq!(classify_price_zone(-1.0, &config), PriceEmaZone::AtOrBelow);
        assert_eq!(classify_price_zone(0.0, &config), PriceEmaZone::AtOrBelow);
        assert_eq!(classify_price_zone(1.5, &config), PriceEmaZone::NearAbove);
        assert_eq!(classify_price_zone(2.0, &config), PriceEmaZone::FarAbove);
        assert_eq!(classify_price_zone(8.0, &config), PriceEmaZone::FarAbove);
    }

    #[test]
    fn pullback_in_flat_base() {
        // flat at 100, then two down days: force negative and falling,
        // close below the EMA, stochastic at the bottom of its range
        let mut closes = vec![100.0; 30];
        closes.extend_from_slice(&[98.0, 96.0]);
        let screen = screen_entry(&daily(&closes), &EntryScreenConfig::default()).unwrap();

        assert_eq!(screen.category.force, ForceCategory::BelowZeroFalling);
        assert_eq!(screen.category.price_zone, PriceEmaZone::AtOrBelow);
        assert_eq!(screen.category.stochastic, StochasticBand::Below30);
        assert!(screen.snapshot.force_index < 0.0);
        assert!(screen.snapshot.price_vs_ema_pct < 0.0);
        assert!(screen.snapshot.atr.is_some());
        assert!(screen.snapshot.impulse.is_none());
        assert_eq!(screen.snapshot.rsi, Some(0.0));
        assert!(screen.snapshot.force_index_long.unwrap() < 0.0);
    }

    #[test]
    fn uptick_after_selloff() {
        let mut closes = vec![100.0; 40];
        closes.extend_from_slice(&[96.0, 95.5]);
        let screen = screen_entry(&daily(&closes), &EntryScreenConfig::default()).unwrap();
        assert_eq!(screen.category.force, ForceCategory::BelowZeroRisingUptick);
        assert!(screen.snapshot.impulse.is_some());
    }

    #[test]
    fn extended_rally_is_far_above_ema() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + 2.0 * i as f64).collect();
        let screen = screen_entry(&daily(&closes), &EntryScreenConfig::default()).unwrap();
        assert_eq!(screen.category.force, ForceCategory::AboveZero);
        assert_eq!(screen.category.price_zone, PriceEmaZone::FarAbove);
        assert_eq!(screen.category.stochastic, StochasticBand::Above50);
        assert_eq!(screen.snapshot.rsi, Some(100.0));
        assert!(screen.snapshot.force_index_long.unwrap() > 0.0);
        assert_eq!(screen.snapshot.divergence, None);
    }

    #[test]
    fn divergence_combination_prefers_bullish() {
        use Divergence::{Bearish, Bullish};
        assert_eq!(combine_divergence(Some(Bullish), Some(Bearish)), Some(Bullish));
        assert_eq!(combine_divergence(None, Some(Bullish)), Some(Bullish));
        assert_eq!(combine_divergence(Some(Bearish), None), Some(Bearish));
        assert_eq!(combine_divergence(None, None), None);
    }

    #[test]
    fn fading_selloff_shows_rsi_divergence() {
        // a hard drop, then a slow grind lower on smaller losses and the
        // odd up day: price makes a lower low while RSI recovers
        let mut closes = vec![100.0; 30];
        closes.extend((1..=10).map(|i| 100.0 - 3.0 * i as f64));
        for i in 0..20 {
            let last = closes[closes.len() - 1];
            closes.push(if i % 2 == 0 { last + 0.4 } else { last - 0.5 });
        }
        let screen = screen_entry(&daily(&closes), &EntryScreenConfig::default()).unwrap();
        assert!(screen.snapshot.rsi.unwrap() > 40.0);
        assert_eq!(screen.snapshot.divergence, Some(Divergence::Bullish));
    }

    #[test]
    fn insufficient_data() {
        let err = screen_entry(&daily(&[100.0; 10]), &EntryScreenConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ScreenError::InsufficientData {
                required: 22,
                available: 10
            }
        ));
    }
}
