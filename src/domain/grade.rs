//! Trade grade: the APGAR total adjusted by the daily Impulse, a bullish
//! daily divergence and candlestick confirmation, clamped to 0..=10.
//!
//! A Red Impulse vetoes the trade whatever the score: bears are in control
//! of the daily chart and no long is taken.

use crate::domain::indicator::impulse::Impulse;
use crate::domain::pattern::{CandlePattern, best_bullish};
use std::fmt;

pub const MAX_STRENGTH: u8 = 10;
/// Lowest signal strength graded A.
pub const GRADE_A_MIN: u8 = 5;
/// Lowest signal strength graded B.
pub const GRADE_B_MIN: u8 = 3;

const DIVERGENCE_POINTS: i32 = 2;
const STRONG_PATTERN_RELIABILITY: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TradeGrade {
    A,
    B,
    C,
    Avoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TradeAction {
    Buy,
    Watch,
    StayOut,
}

impl TradeGrade {
    pub fn action(self) -> TradeAction {
        match self {
            TradeGrade::A => TradeAction::Buy,
            TradeGrade::B | TradeGrade::C => TradeAction::Watch,
            TradeGrade::Avoid => TradeAction::StayOut,
        }
    }
}

impl fmt::Display for TradeGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TradeGrade::A => "A",
            TradeGrade::B => "B",
            TradeGrade::C => "C",
            TradeGrade::Avoid => "AVOID",
        };
        f.write_str(label)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TradeAction::Buy => "BUY",
            TradeAction::Watch => "WATCH",
            TradeAction::StayOut => "STAY OUT",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeSignal {
    pub strength: u8,
    pub grade: TradeGrade,
}

impl TradeSignal {
    pub fn action(&self) -> TradeAction {
        self.grade.action()
    }

    pub fn is_vetoed(&self) -> bool {
        self.grade == TradeGrade::Avoid
    }
}

/// Points for the strongest bullish candlestick: 2 for reliability 4 or
/// better, 1 for anything weaker, 0 without one.
pub fn pattern_bonus(patterns: &[CandlePattern]) -> u8 {
    match best_bullish(patterns) {
        Some(p) if p.reliability() >= STRONG_PATTERN_RELIABILITY => 2,
        Some(_) => 1,
        None => 0,
    }
}

/// Green adds a point, Red takes two away. Blue or unknown is neutral.
pub fn impulse_adjustment(impulse: Option<Impulse>) -> i32 {
    match impulse {
        Some(Impulse::Green) => 1,
        Some(Impulse::Red) => -2,
        Some(Impulse::Blue) | None => 0,
    }
}

pub fn signal_strength(
    apgar_total: u8,
    impulse: Option<Impulse>,
    bullish_divergence: bool,
    patterns: &[CandlePattern],
) -> u8 {
    let mut score = i32::from(apgar_total) + impulse_adjustment(impulse);
    if bullish_divergence {
        score += DIVERGENCE_POINTS;
    }
    score += i32::from(pattern_bonus(patterns));
    u8::try_from(score.clamp(0, i32::from(MAX_STRENGTH))).unwrap_or(0)
}

/// Red Impulse is always `Avoid`; otherwise A/B/C by strength.
pub fn grade(strength: u8, impulse: Option<Impulse>) -> TradeGrade {
    if impulse == Some(Impulse::Red) {
        TradeGrade::Avoid
    } else if strength >= GRADE_A_MIN {
        TradeGrade::A
    } else if strength >= GRADE_B_MIN {
        TradeGrade::B
    } else {
        TradeGrade::C
    }
}

pub fn assess(
    apgar_total: u8,
    impulse: Option<Impulse>,
    bullish_divergence: bool,
    patterns: &[CandlePattern],
) -> TradeSignal {
    let strength = signal_strength(apgar_total, impulse, bullish_divergence, patterns);
    TradeSignal {
        strength,
        grade: grade(strength, impulse),
    }
}
