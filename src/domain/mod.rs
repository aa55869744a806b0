//! Core domain types and logic: bars, indicators, the two screens, APGAR
//! scoring, candlestick patterns, trade grading and position sizing.

pub mod ohlcv;
pub mod indicator;
pub mod screen_result;
pub mod screen_config;
pub mod trend_screen;
pub mod entry_screen;
pub mod apgar;
pub mod pattern;
pub mod grade;
pub mod sizing;
pub mod screener;
pub mod config_validation;
pub mod error;
