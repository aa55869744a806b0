//! Exponential Moving Average.
//!
//! k = 2/(n+1), seed with the SMA of the first n values, then
//! EMA[i] = EMA[i-1] + k * (V[i] - EMA[i-1]).
//! The seed is a running mean so that a constant input reproduces itself
//! exactly.
//! Warmup: the first (n-1) values are absent.

use crate::domain::error::ScreenError;
use crate::domain::ohlcv::BarSeries;

/// EMA of a bar series' closes.
pub fn ema(series: &BarSeries, period: usize) -> Result<Vec<Option<f64>>, ScreenError> {
    calculate_ema(&series.closes(), period)
}

/// EMA of a dense value sequence. Fails if fewer than `period` values are given.
pub fn calculate_ema(values: &[f64], period: usize) -> Result<Vec<Option<f64>>, ScreenError> {
    if period == 0 {
        return Err(ScreenError::invalid_parameter(
            "ema period",
            "must be at least 1",
        ));
    }
    if values.len() < period {
        return Err(ScreenError::insufficient(period, values.len()));
    }
    let dense: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    Ok(smooth(&dense, period))
}

/// EMA over a sequence that may start with absent values.
///
/// Smoothing starts at the first present value; absent values after that
/// point yield absent output and leave the running average untouched. Never
/// fails: too few present values gives an all-absent result.
pub(crate) fn smooth(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let mut seed_mean = 0.0;
    let mut seed_count = 0;
    let mut current: Option<f64> = None;

    for (i, value) in values.iter().enumerate() {
        let Some(v) = *value else { continue };
        match current {
            None => {
                seed_count += 1;
                seed_mean += (v - seed_mean) / seed_count as f64;
                if seed_count == period {
                    current = Some(seed_mean);
                    out[i] = Some(seed_mean);
                }
            }
            Some(prev) => {
                let next = prev + k * (v - prev);
                current = Some(next);
                out[i] = Some(next);
            }
        }
    }

    out
}

/// Bar-to-bar change of an EMA line; absent wherever either end is absent.
pub fn ema_slope(ema: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(ema.len());
    for i in 0..ema.len() {
        let slope = match (i.checked_sub(1).and_then(|p| ema[p]), ema[i]) {
            (Some(prev), Some(cur)) => Some(cur - prev),
            _ => None,
        };
        out.push(slope);
    }
    out
}
