//! Stochastic Oscillator.
//!
//! %K = 100 * (C - LL(n)) / (HH(n) - LL(n)); absent when HH == LL.
//! %D = SMA(smooth) of %K; absent if any %K in its window is absent.

use crate::domain::error::ScreenError;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;
pub const DEFAULT_SMOOTH: usize = 3;

pub fn calculate_stochastic_k(
    bars: &[OhlcvBar],
    period: usize,
) -> Result<Vec<Option<f64>>, ScreenError> {
    if period == 0 {
        return Err(ScreenError::invalid_parameter(
            "stochastic period",
            "must be at least 1",
        ));
    }
    if bars.len() < period {
        return Err(ScreenError::insufficient(period, bars.len()));
    }

    let mut values = Vec::with_capacity(bars.len());
    for i in 0..bars.len() {
        if i + 1 < period {
            values.push(None);
            continue;
        }
        let window = &bars[i + 1 - period..=i];
        let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let highest = window
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let range = highest - lowest;

        if range > 0.0 {
            values.push(Some(100.0 * (bars[i].close - lowest) / range));
        } else {
            values.push(None);
        }
    }

    Ok(values)
}

pub fn calculate_stochastic_d(k: &[Option<f64>], smooth: usize) -> Vec<Option<f64>> {
    let mut values = Vec::with_capacity(k.len());
    for i in 0..k.len() {
        if smooth == 0 || i + 1 < smooth {
            values.push(None);
            continue;
        }
        let window = &k[i + 1 - smooth..=i];
        let sum: Option<f64> = window.iter().copied().sum();
        values.push(sum.map(|s| s / smooth as f64));
    }
    values
}
