//! Screening report port trait.

use crate::domain::error::ScreenError;
use crate::domain::screener::SymbolScreen;
use crate::domain::sizing::PositionSizeResult;

/// One ranked row of a report: the screen plus its sizing, when attempted.
pub struct ReportRow<'a> {
    pub screen: &'a SymbolScreen,
    pub sizing: Option<&'a PositionSizeResult>,
}

/// Port for writing screening reports.
pub trait ReportPort {
    fn write(&self, rows: &[ReportRow<'_>], output_path: &str) -> Result<(), ScreenError>;
}
