//! Threshold configuration for the screens and the APGAR scorer.
//!
//! Defaults are methodology conventions, not derived constants; every value
//! can be overridden from the settings file.

use crate::domain::apgar::ApgarTable;
use crate::domain::error::ScreenError;
use crate::domain::indicator::macd::MIN_DIVERGENCE_LOOKBACK;
use crate::domain::indicator::{MacdParams, atr, force_index, impulse, rsi, stochastic};

pub const DEFAULT_EMA_PERIOD: usize = 22;
pub const DEFAULT_DIVERGENCE_LOOKBACK: usize = 5;
pub const DEFAULT_DAILY_DIVERGENCE_LOOKBACK: usize = 20;
pub const DEFAULT_LONG_FORCE_PERIOD: usize = 13;
pub const DEFAULT_STOCHASTIC_OVERSOLD: f64 = 30.0;
pub const DEFAULT_STOCHASTIC_MIDLINE: f64 = 50.0;
pub const DEFAULT_NEAR_EMA_PCT: f64 = 2.0;
pub const DEFAULT_ATR_STOP_MULTIPLE: f64 = 2.0;
pub const DEFAULT_MIN_APGAR: u8 = 6;

/// Screen 1 (weekly trend) settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendScreenConfig {
    pub ema_period: usize,
    pub macd: MacdParams,
    pub divergence_lookback: usize,
    /// EMA slopes within +/- this percentage count as flat.
    pub flat_slope_pct: f64,
    /// Minimum absolute slope percentage for a "strongly" category.
    pub strong_slope_pct: f64,
}

impl Default for TrendScreenConfig {
    fn default() -> Self {
        Self {
            ema_period: DEFAULT_EMA_PERIOD,
            macd: MacdParams::default(),
            divergence_lookback: DEFAULT_DIVERGENCE_LOOKBACK,
            flat_slope_pct: 0.0,
            strong_slope_pct: 0.0,
        }
    }
}

impl TrendScreenConfig {
    /// Weekly bars needed to classify: EMA and histogram at the last two bars.
    pub fn required_bars(&self) -> usize {
        (self.ema_period + 1).max(self.macd.histogram_bars() + 1)
    }

    pub fn validate(&self) -> Result<(), ScreenError> {
        if self.ema_period == 0 {
            return Err(ScreenError::invalid_parameter(
                "screen1 ema_period",
                "must be at least 1",
            ));
        }
        self.macd.validate()?;
        if self.divergence_lookback < MIN_DIVERGENCE_LOOKBACK {
            return Err(ScreenError::invalid_parameter(
                "screen1 divergence_lookback",
                "must be at least 2",
            ));
        }
        if self.flat_slope_pct < 0.0 || self.strong_slope_pct < self.flat_slope_pct {
            return Err(ScreenError::invalid_parameter(
                "screen1 slope thresholds",
                "need 0 <= flat_slope_pct <= strong_slope_pct",
            ));
        }
        Ok(())
    }
}

/// Screen 2 (daily entry) settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryScreenConfig {
    pub ema_period: usize,
    pub force_period: usize,
    pub stochastic_period: usize,
    pub stochastic_oversold: f64,
    pub stochastic_midline: f64,
    /// Closes less than this percentage above the EMA count as near.
    pub near_ema_pct: f64,
    pub impulse_ema_period: usize,
    pub impulse_macd: MacdParams,
    pub atr_period: usize,
    pub atr_stop_multiple: f64,
    pub rsi_period: usize,
    pub long_force_period: usize,
    /// Daily bars compared for MACD-histogram and RSI divergence.
    pub divergence_lookback: usize,
}

impl Default for EntryScreenConfig {
    fn default() -> Self {
        Self {
            ema_period: DEFAULT_EMA_PERIOD,
            force_period: force_index::DEFAULT_PERIOD,
            stochastic_period: stochastic::DEFAULT_PERIOD,
            stochastic_oversold: DEFAULT_STOCHASTIC_OVERSOLD,
            stochastic_midline: DEFAULT_STOCHASTIC_MIDLINE,
            near_ema_pct: DEFAULT_NEAR_EMA_PCT,
            impulse_ema_period: impulse::DEFAULT_EMA_PERIOD,
            impulse_macd: MacdParams::default(),
            atr_period: atr::DEFAULT_PERIOD,
            atr_stop_multiple: DEFAULT_ATR_STOP_MULTIPLE,
            rsi_period: rsi::DEFAULT_PERIOD,
            long_force_period: DEFAULT_LONG_FORCE_PERIOD,
            divergence_lookback: DEFAULT_DAILY_DIVERGENCE_LOOKBACK,
        }
    }
}

impl EntryScreenConfig {
    /// Daily bars needed to classify. The supplementary readings (Impulse,
    /// ATR, RSI, long Force Index, divergence) are reported when available
    /// but do not raise the requirement.
    pub fn required_bars(&self) -> usize {
        // force index must exist at the last two bars
        self.ema_period
            .max(self.force_period + 2)
            .max(self.stochastic_period)
    }

    pub fn validate(&self) -> Result<(), ScreenError> {
        for (name, period) in [
            ("screen2 ema_period", self.ema_period),
            ("screen2 force_period", self.force_period),
            ("screen2 stochastic_period", self.stochastic_period),
            ("screen2 impulse_ema_period", self.impulse_ema_period),
            ("screen2 atr_period", self.atr_period),
            ("screen2 rsi_period", self.rsi_period),
            ("screen2 long_force_period", self.long_force_period),
        ] {
            if period == 0 {
                return Err(ScreenError::invalid_parameter(name, "must be at least 1"));
            }
        }
        self.impulse_macd.validate()?;
        if self.divergence_lookback < MIN_DIVERGENCE_LOOKBACK {
            return Err(ScreenError::invalid_parameter(
                "screen2 divergence_lookback",
                "must be at least 2",
            ));
        }
        if !(0.0 < self.stochastic_oversold
            && self.stochastic_oversold < self.stochastic_midline
            && self.stochastic_midline < 100.0)
        {
            return Err(ScreenError::invalid_parameter(
                "screen2 stochastic bands",
                "need 0 < oversold < midline < 100",
            ));
        }
        if self.near_ema_pct <= 0.0 {
            return Err(ScreenError::invalid_parameter(
                "screen2 near_ema_pct",
                "must be positive",
            ));
        }
        if self.atr_stop_multiple <= 0.0 {
            return Err(ScreenError::invalid_parameter(
                "screen2 atr_stop_multiple",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Everything the per-symbol pipeline needs besides the bars.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub trend: TrendScreenConfig,
    pub entry: EntryScreenConfig,
    pub apgar: ApgarTable,
    /// Reward/risk multiple for the main SafeZone target.
    pub target_reward_risk: f64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            trend: TrendScreenConfig::default(),
            entry: EntryScreenConfig::default(),
            apgar: ApgarTable::default(),
            target_reward_risk: 2.0,
        }
    }
}

impl ScreenConfig {
    pub fn validate(&self) -> Result<(), ScreenError> {
        self.trend.validate()?;
        self.entry.validate()?;
        self.apgar.validate()?;
        if self.target_reward_risk <= 0.0 {
            return Err(ScreenError::invalid_parameter(
                "target_reward_risk",
                "must be positive",
            ));
        }
        Ok(())
    }
}
