//! Force Index.
//!
//! Raw force = (C[i] - C[i-1]) * V[i], smoothed with an EMA (2 bars by default).
//! The first bar has no raw force, so the smoothed line starts at bar `period`.

use crate::domain::error::ScreenError;
use crate::domain::indicator::ema::smooth;
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_PERIOD: usize = 2;

pub fn raw_force(bars: &[OhlcvBar]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(bars.len());
    for i in 0..bars.len() {
        if i == 0 {
            out.push(None);
        } else {
            let change = bars[i].close - bars[i - 1].close;
            out.push(Some(change * bars[i].volume as f64));
        }
    }
    out
}

pub fn calculate_force_index(
    bars: &[OhlcvBar],
    period: usize,
) -> Result<Vec<Option<f64>>, ScreenError> {
    if period == 0 {
        return Err(ScreenError::invalid_parameter(
            "force index period",
            "must be at least 1",
        ));
    }
    let required = period + 1;
    if bars.len() < required {
        return Err(ScreenError::insufficient(required, bars.len()));
    }
    Ok(smooth(&raw_force(bars), period))
}
