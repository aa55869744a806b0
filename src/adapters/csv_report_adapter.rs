//! CSV screening report: one row per symbol, in ranked order.

use crate::domain::error::ScreenError;
use crate::ports::report_port::{ReportPort, ReportRow};
use serde::Serialize;
use std::io::Write;
use tracing::info;

#[derive(Debug, Serialize)]
struct CsvReportRecord {
    rank: usize,
    symbol: String,
    weekly_date: String,
    daily_date: String,
    trend: String,
    momentum: String,
    force: String,
    stochastic: String,
    price_zone: String,
    apgar: u8,
    verdict: String,
    signal_strength: u8,
    grade: String,
    action: String,
    long_permitted: bool,
    close: f64,
    stochastic_k: Option<f64>,
    rsi: Option<f64>,
    impulse: Option<String>,
    divergence: Option<String>,
    patterns: String,
    atr: Option<f64>,
    stop_loss: Option<f64>,
    target: Option<f64>,
    shares: Option<u64>,
    risk_amount: Option<f64>,
    reject_reason: Option<String>,
}

impl CsvReportRecord {
    fn from_row(rank: usize, row: &ReportRow<'_>) -> Self {
        let screen = row.screen;
        let trend = &screen.trend.category;
        let entry = &screen.entry.category;
        let snapshot = &screen.entry.snapshot;
        Self {
            rank,
            symbol: screen.symbol.clone(),
            weekly_date: screen.trend.date.to_string(),
            daily_date: screen.entry.date.to_string(),
            trend: trend.trend.to_string(),
            momentum: trend.momentum.to_string(),
            force: entry.force.to_string(),
            stochastic: entry.stochastic.to_string(),
            price_zone: entry.price_zone.to_string(),
            apgar: screen.apgar.total,
            verdict: screen.apgar.verdict.to_string(),
            signal_strength: screen.signal.strength,
            grade: screen.signal.grade.to_string(),
            action: screen.signal.action().to_string(),
            long_permitted: screen.long_permitted,
            close: snapshot.close,
            stochastic_k: snapshot.stochastic_k.map(round2),
            rsi: snapshot.rsi.map(round2),
            impulse: snapshot.impulse.map(|i| i.to_string()),
            divergence: snapshot.divergence.map(|d| d.to_string()),
            patterns: screen
                .patterns
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            atr: snapshot.atr.map(round2),
            stop_loss: screen.levels.map(|l| round2(l.stop_loss)),
            target: screen.levels.map(|l| round2(l.target_2)),
            shares: row.sizing.map(|s| s.shares),
            risk_amount: row.sizing.map(|s| round2(s.risk_amount)),
            reject_reason: row
                .sizing
                .and_then(|s| s.reject_reason)
                .map(|r| r.to_string()),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Write the report to any writer.
    pub fn write_to<W: Write>(&self, rows: &[ReportRow<'_>], writer: W) -> Result<(), ScreenError> {
        let mut wtr = csv::Writer::from_writer(writer);
        for (i, row) in rows.iter().enumerate() {
            wtr.serialize(CsvReportRecord::from_row(i + 1, row))
                .map_err(|e| ScreenError::DataSource {
                    reason: format!("failed to write report row: {}", e),
                })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, rows: &[ReportRow<'_>], output_path: &str) -> Result<(), ScreenError> {
        let file = std::fs::File::create(output_path)?;
        self.write_to(rows, file)?;
        info!(path = output_path, rows = rows.len(), "report written");
        Ok(())
    }
}
