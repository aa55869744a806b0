//! Impulse system: EMA slope combined with MACD histogram slope.

use crate::domain::error::ScreenError;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::macd::{MacdParams, calculate_macd};
use std::fmt;

pub const DEFAULT_EMA_PERIOD: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impulse {
    /// EMA and histogram both rising.
    Green,
    /// EMA and histogram both falling.
    Red,
    /// Anything else.
    Blue,
}

impl fmt::Display for Impulse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Impulse::Green => write!(f, "GREEN"),
            Impulse::Red => write!(f, "RED"),
            Impulse::Blue => write!(f, "BLUE"),
        }
    }
}

pub fn classify_impulse(ema_slope: f64, histogram_slope: f64) -> Impulse {
    if ema_slope > 0.0 && histogram_slope > 0.0 {
        Impulse::Green
    } else if ema_slope < 0.0 && histogram_slope < 0.0 {
        Impulse::Red
    } else {
        Impulse::Blue
    }
}

pub fn calculate_impulse(
    closes: &[f64],
    ema_period: usize,
    macd: MacdParams,
) -> Result<Vec<Option<Impulse>>, ScreenError> {
    let ema = calculate_ema(closes, ema_period)?;
    let histogram = calculate_macd(closes, macd)?.histogram;

    let mut values = Vec::with_capacity(closes.len());
    for i in 0..closes.len() {
        if i == 0 {
            values.push(None);
            continue;
        }
        let impulse = match (ema[i - 1], ema[i], histogram[i - 1], histogram[i]) {
            (Some(e0), Some(e1), Some(h0), Some(h1)) => Some(classify_impulse(e1 - e0, h1 - h0)),
            _ => None,
        };
        values.push(impulse);
    }
    Ok(values)
}
