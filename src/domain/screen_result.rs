//! Classification output shared by both screens.

use chrono::NaiveDate;

/// A screen's verdict for the last bar of a series, plus the indicator
/// values it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenResult<C, S> {
    pub date: NaiveDate,
    pub category: C,
    pub snapshot: S,
}
