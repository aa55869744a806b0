#![allow(dead_code)]

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;
use triplescreen::domain::error::ScreenError;
pub use triplescreen::domain::ohlcv::{BarSeries, Frequency, OhlcvBar};
use triplescreen::ports::data_port::DataPort;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ScreenError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScreenError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScreenError> {
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Weekday bars starting Monday 2020-01-06, one per close.
pub fn weekday_bars(closes: &[f64]) -> Vec<OhlcvBar> {
    let mut day = date(2020, 1, 6);
    let mut bars = Vec::with_capacity(closes.len());
    for &close in closes {
        bars.push(OhlcvBar {
            date: day,
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 10_000,
        });
        day = day.succ_opt().unwrap();
        if day.weekday() == Weekday::Sat {
            day += chrono::Duration::days(2);
        }
    }
    bars
}

pub fn daily_series(symbol: &str, closes: &[f64]) -> BarSeries {
    BarSeries::new(symbol, Frequency::Daily, weekday_bars(closes)).unwrap()
}

/// 40 flat weeks at 100, then `days` sessions moving `step` per day.
pub fn base_then_closes(days: usize, step: f64) -> Vec<f64> {
    let mut closes = vec![100.0; 200];
    closes.extend((1..=days).map(|i| 100.0 + step * i as f64));
    closes
}

/// Breakout from a flat base: weekly closes 102, 104, 106.
pub fn breakout_closes() -> Vec<f64> {
    base_then_closes(15, 0.4)
}

/// Breakout, then a two-day pullback inside the final week.
pub fn breakout_pullback_closes() -> Vec<f64> {
    let mut closes = base_then_closes(13, 0.5);
    let last = *closes.last().unwrap();
    closes.extend([last - 1.5, last - 3.0]);
    closes
}

pub fn breakdown_closes() -> Vec<f64> {
    base_then_closes(15, -0.4)
}

pub fn closes_of(bars: &[OhlcvBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
