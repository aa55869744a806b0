//! Relative Strength Index.
//!
//! Average gain and average loss are plain rolling means over the last
//! `period` close-to-close changes:
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), and 100 when there is no loss.
//! The first `period` bars are absent (they hold fewer than `period` changes).

use crate::domain::error::ScreenError;

pub const DEFAULT_PERIOD: usize = 14;

pub fn calculate_rsi(closes: &[f64], period: usize) -> Result<Vec<Option<f64>>, ScreenError> {
    if period == 0 {
        return Err(ScreenError::invalid_parameter(
            "rsi period",
            "must be at least 1",
        ));
    }
    if closes.len() < period + 1 {
        return Err(ScreenError::insufficient(period + 1, closes.len()));
    }

    let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let mut out = vec![None; closes.len()];
    for end in period..=changes.len() {
        let window = &changes[end - period..end];
        let gain = window.iter().filter(|c| **c > 0.0).sum::<f64>() / period as f64;
        let loss = -window.iter().filter(|c| **c < 0.0).sum::<f64>() / period as f64;
        out[end] = Some(if loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + gain / loss)
        });
    }
    Ok(out)
}
