//! APGAR setup score: five components, each worth 0 to 2 points.
//!
//! Components are looked up in an `ApgarTable` indexed by category ordinal,
//! so the score is a pure function of the categories and the table.

use crate::domain::entry_screen::{EntryState, ForceCategory, PriceEmaZone, StochasticBand};
use crate::domain::error::ScreenError;
use crate::domain::trend_screen::{MomentumCategory, TrendCategory, TrendState};
use std::fmt;

pub const MAX_COMPONENT: u8 = 2;
pub const MAX_TOTAL: u8 = 10;

/// Points per category, indexed by the category's ordinal (poorest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApgarTable {
    pub trend: [u8; 5],
    pub momentum: [u8; 3],
    pub force: [u8; 4],
    pub stochastic: [u8; 3],
    pub price_ema: [u8; 3],
}

impl Default for ApgarTable {
    fn default() -> Self {
        Self {
            // StronglyFalling, Falling, Flat, Rising, StronglyRising
            trend: [0, 0, 0, 1, 2],
            // Falling, Rising, RisingWithDivergence
            momentum: [0, 1, 2],
            // AboveZero, Flat, BelowZeroFalling, BelowZeroRisingUptick
            force: [0, 0, 1, 2],
            // Above50, 30-50, Below30
            stochastic: [0, 1, 2],
            // FarAbove, NearAbove, AtOrBelow
            price_ema: [0, 1, 2],
        }
    }
}

impl ApgarTable {
    /// Every row must run from 0 up to 2 without decreasing.
    pub fn validate(&self) -> Result<(), ScreenError> {
        let rows: [(&str, &[u8]); 5] = [
            ("apgar trend", &self.trend),
            ("apgar momentum", &self.momentum),
            ("apgar force", &self.force),
            ("apgar stochastic", &self.stochastic),
            ("apgar price_ema", &self.price_ema),
        ];
        for (name, row) in rows {
            validate_row(name, row)?;
        }
        Ok(())
    }
}

fn validate_row(name: &str, row: &[u8]) -> Result<(), ScreenError> {
    if row.iter().any(|&points| points > MAX_COMPONENT) {
        return Err(ScreenError::invalid_parameter(name, "points must be 0, 1 or 2"));
    }
    if row.windows(2).any(|pair| pair[1] < pair[0]) {
        return Err(ScreenError::invalid_parameter(
            name,
            "points must not decrease toward the better category",
        ));
    }
    if row.first() != Some(&0) || row.last() != Some(&MAX_COMPONENT) {
        return Err(ScreenError::invalid_parameter(
            name,
            "poorest category must score 0 and best must score 2",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApgarInputs {
    pub trend: TrendCategory,
    pub momentum: MomentumCategory,
    pub force: ForceCategory,
    pub stochastic: StochasticBand,
    pub price_zone: PriceEmaZone,
}

impl ApgarInputs {
    pub fn from_states(trend: &TrendState, entry: &EntryState) -> Self {
        Self {
            trend: trend.trend,
            momentum: trend.momentum,
            force: entry.force,
            stochastic: entry.stochastic,
            price_zone: entry.price_zone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApgarComponents {
    pub trend: u8,
    pub momentum: u8,
    pub force: u8,
    pub stochastic: u8,
    pub price_ema: u8,
}

impl ApgarComponents {
    pub fn scores(&self) -> [u8; 5] {
        [
            self.trend,
            self.momentum,
            self.force,
            self.stochastic,
            self.price_ema,
        ]
    }

    /// Summed wide so that out-of-range points cannot overflow.
    pub fn total(&self) -> u8 {
        let sum: u16 = self.scores().iter().map(|&points| u16::from(points)).sum();
        u8::try_from(sum).unwrap_or(u8::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verdict {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl Verdict {
    pub fn from_total(total: u8) -> Self {
        match total {
            8.. => Verdict::Excellent,
            6..=7 => Verdict::Good,
            4..=5 => Verdict::Fair,
            _ => Verdict::Poor,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Verdict::Poor => "POOR",
            Verdict::Fair => "FAIR",
            Verdict::Good => "GOOD",
            Verdict::Excellent => "EXCELLENT",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApgarScore {
    pub inputs: ApgarInputs,
    pub components: ApgarComponents,
    pub total: u8,
    pub verdict: Verdict,
}

impl ApgarScore {
    /// One line per component, e.g. `Weekly EMA: Rising (1/2)`.
    pub fn breakdown(&self) -> Vec<String> {
        let c = &self.components;
        let i = &self.inputs;
        vec![
            format!("Weekly EMA: {} ({}/{})", i.trend, c.trend, MAX_COMPONENT),
            format!(
                "Weekly MACD-H: {} ({}/{})",
                i.momentum, c.momentum, MAX_COMPONENT
            ),
            format!("Force Index: {} ({}/{})", i.force, c.force, MAX_COMPONENT),
            format!(
                "Stochastic: {} ({}/{})",
                i.stochastic, c.stochastic, MAX_COMPONENT
            ),
            format!(
                "Price vs EMA: {} ({}/{})",
                i.price_zone, c.price_ema, MAX_COMPONENT
            ),
        ]
    }
}

/// Score a setup. Fails if the table would allow a total outside 0..=10.
pub fn score(inputs: ApgarInputs, table: &ApgarTable) -> Result<ApgarScore, ScreenError> {
    table.validate()?;
    let components = ApgarComponents {
        trend: table.trend[inputs.trend.index()],
        momentum: table.momentum[inputs.momentum.index()],
        force: table.force[inputs.force.index()],
        stochastic: table.stochastic[inputs.stochastic.index()],
        price_ema: table.price_ema[inputs.price_zone.index()],
    };
    let total = components.total();
    Ok(ApgarScore {
        inputs,
        components,
        total,
        verdict: Verdict::from_total(total),
    })
}
