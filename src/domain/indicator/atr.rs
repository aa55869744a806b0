//! Average True Range: simple mean of true range over the window.
//!
//! True range of the first bar is high - low.

use crate::domain::error::ScreenError;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> Result<Vec<Option<f64>>, ScreenError> {
    if period == 0 {
        return Err(ScreenError::invalid_parameter(
            "atr period",
            "must be at least 1",
        ));
    }
    if bars.len() < period {
        return Err(ScreenError::insufficient(period, bars.len()));
    }

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut values = Vec::with_capacity(bars.len());
    let mut window_sum = 0.0;
    for i in 0..bars.len() {
        window_sum += tr_values[i];
        if i >= period {
            window_sum -= tr_values[i - period];
        }
        if i + 1 < period {
            values.push(None);
        } else {
            values.push(Some(window_sum / period as f64));
        }
    }

    Ok(values)
}
