//! OHLCV bars and validated bar series.

use crate::domain::error::ScreenError;
use chrono::{Datelike, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    Daily,
    Weekly,
}

/// Bars for one symbol at one frequency, strictly ascending by date.
///
/// The ordering invariant is checked on construction; the series is never
/// repaired, so a caller that hands over unsorted or duplicated bars gets
/// [`ScreenError::UnorderedSeries`] back.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    symbol: String,
    frequency: Frequency,
    bars: Vec<OhlcvBar>,
}

impl BarSeries {
    pub fn new(
        symbol: impl Into<String>,
        frequency: Frequency,
        bars: Vec<OhlcvBar>,
    ) -> Result<Self, ScreenError> {
        if let Some(index) = bars
            .windows(2)
            .position(|pair| pair[1].date <= pair[0].date)
        {
            return Err(ScreenError::UnorderedSeries { index: index + 1 });
        }
        Ok(Self {
            symbol: symbol.into(),
            frequency,
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn bars(&self) -> &[OhlcvBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Fails with `InsufficientData` unless the series holds at least `required` bars.
    pub fn require(&self, required: usize) -> Result<(), ScreenError> {
        if self.bars.len() < required {
            return Err(ScreenError::insufficient(required, self.bars.len()));
        }
        Ok(())
    }

    /// Aggregate a daily series into ISO weeks.
    ///
    /// Each week takes the first open, highest high, lowest low, last close
    /// and summed volume, dated by its last trading day.
    pub fn to_weekly(&self) -> BarSeries {
        if self.frequency == Frequency::Weekly {
            return self.clone();
        }

        let mut weeks: Vec<OhlcvBar> = Vec::new();
        let mut current_week = None;

        for bar in &self.bars {
            let week = bar.date.iso_week();
            let key = (week.year(), week.week());
            match weeks.last_mut() {
                Some(agg) if current_week == Some(key) => {
                    agg.date = bar.date;
                    agg.high = agg.high.max(bar.high);
                    agg.low = agg.low.min(bar.low);
                    agg.close = bar.close;
                    agg.volume = agg.volume.saturating_add(bar.volume);
                }
                _ => {
                    weeks.push(bar.clone());
                    current_week = Some(key);
                }
            }
        }

        BarSeries {
            symbol: self.symbol.clone(),
            frequency: Frequency::Weekly,
            bars: weeks,
        }
    }
}
