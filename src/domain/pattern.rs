//! Candlestick pattern recognition on the last bars of a daily series.
//!
//! Only the most recent one, two or three candles are examined. Reversal
//! patterns count only against the short-term trend they reverse: a
//! hammer needs a falling market, a shooting star a rising one.

use crate::domain::ohlcv::OhlcvBar;
use std::fmt;

/// Bars needed before any pattern is reported.
pub const MIN_BARS: usize = 5;
/// Closes averaged to decide the short-term trend.
pub const TREND_LOOKBACK: usize = 10;
const TREND_BAND: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternBias {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandlePattern {
    Hammer,
    ShootingStar,
    Doji,
    BullishMarubozu,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl CandlePattern {
    pub fn bias(self) -> PatternBias {
        match self {
            CandlePattern::Hammer
            | CandlePattern::BullishMarubozu
            | CandlePattern::BullishEngulfing
            | CandlePattern::MorningStar
            | CandlePattern::ThreeWhiteSoldiers => PatternBias::Bullish,
            CandlePattern::ShootingStar
            | CandlePattern::BearishEngulfing
            | CandlePattern::EveningStar
            | CandlePattern::ThreeBlackCrows => PatternBias::Bearish,
            CandlePattern::Doji => PatternBias::Neutral,
        }
    }

    /// Continuation patterns confirm the move in progress; the rest signal
    /// a turn.
    pub fn is_continuation(self) -> bool {
        matches!(
            self,
            CandlePattern::BullishMarubozu
                | CandlePattern::ThreeWhiteSoldiers
                | CandlePattern::ThreeBlackCrows
        )
    }

    /// 1 (weak) to 5 (strong).
    pub fn reliability(self) -> u8 {
        match self {
            CandlePattern::Doji => 2,
            CandlePattern::Hammer | CandlePattern::ShootingStar => 3,
            CandlePattern::BullishMarubozu
            | CandlePattern::BullishEngulfing
            | CandlePattern::BearishEngulfing => 4,
            CandlePattern::MorningStar
            | CandlePattern::EveningStar
            | CandlePattern::ThreeWhiteSoldiers
            | CandlePattern::ThreeBlackCrows => 5,
        }
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CandlePattern::Hammer => "Hammer",
            CandlePattern::ShootingStar => "Shooting Star",
            CandlePattern::Doji => "Doji",
            CandlePattern::BullishMarubozu => "Bullish Marubozu",
            CandlePattern::BullishEngulfing => "Bullish Engulfing",
            CandlePattern::BearishEngulfing => "Bearish Engulfing",
            CandlePattern::MorningStar => "Morning Star",
            CandlePattern::EveningStar => "Evening Star",
            CandlePattern::ThreeWhiteSoldiers => "Three White Soldiers",
            CandlePattern::ThreeBlackCrows => "Three Black Crows",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortTrend {
    Up,
    Down,
    Neutral,
}

/// Last close against the mean of the last `lookback` closes, with a 2%
/// band either side. Too few closes is `Neutral`.
pub fn short_term_trend(closes: &[f64], lookback: usize) -> ShortTrend {
    if lookback == 0 || closes.len() < lookback {
        return ShortTrend::Neutral;
    }
    let window = &closes[closes.len() - lookback..];
    let mean = window.iter().sum::<f64>() / lookback as f64;
    let current = window[lookback - 1];
    if current > mean * (1.0 + TREND_BAND) {
        ShortTrend::Up
    } else if current < mean * (1.0 - TREND_BAND) {
        ShortTrend::Down
    } else {
        ShortTrend::Neutral
    }
}

fn body(bar: &OhlcvBar) -> f64 {
    (bar.close - bar.open).abs()
}

fn range(bar: &OhlcvBar) -> f64 {
    bar.high - bar.low
}

fn upper_shadow(bar: &OhlcvBar) -> f64 {
    bar.high - bar.open.max(bar.close)
}

fn lower_shadow(bar: &OhlcvBar) -> f64 {
    bar.open.min(bar.close) - bar.low
}

fn is_bullish(bar: &OhlcvBar) -> bool {
    bar.close > bar.open
}

fn is_bearish(bar: &OhlcvBar) -> bool {
    bar.close < bar.open
}

fn is_doji(bar: &OhlcvBar) -> bool {
    let r = range(bar);
    r == 0.0 || body(bar) / r < 0.1
}

fn is_hammer(bar: &OhlcvBar, trend: ShortTrend) -> bool {
    let r = range(bar);
    r > 0.0
        && body(bar) / r < 0.3
        && lower_shadow(bar) / r > 0.6
        && upper_shadow(bar) < body(bar)
        && trend == ShortTrend::Down
}

fn is_shooting_star(bar: &OhlcvBar, trend: ShortTrend) -> bool {
    let r = range(bar);
    r > 0.0
        && body(bar) / r < 0.3
        && upper_shadow(bar) / r > 0.6
        && lower_shadow(bar) < body(bar)
        && trend == ShortTrend::Up
}

fn is_bullish_marubozu(bar: &OhlcvBar) -> bool {
    let r = range(bar);
    let b = body(bar);
    r > 0.0
        && is_bullish(bar)
        && b / r > 0.9
        && upper_shadow(bar) < b * 0.05
        && lower_shadow(bar) < b * 0.05
}

fn is_bullish_engulfing(prev: &OhlcvBar, cur: &OhlcvBar, trend: ShortTrend) -> bool {
    is_bearish(prev)
        && is_bullish(cur)
        && cur.open < prev.close
        && cur.close > prev.open
        && trend == ShortTrend::Down
}

fn is_bearish_engulfing(prev: &OhlcvBar, cur: &OhlcvBar, trend: ShortTrend) -> bool {
    is_bullish(prev)
        && is_bearish(cur)
        && cur.open > prev.close
        && cur.close < prev.open
        && trend == ShortTrend::Up
}

fn midpoint(bar: &OhlcvBar) -> f64 {
    (bar.open + bar.close) / 2.0
}

fn is_star(first: &OhlcvBar, second: &OhlcvBar) -> bool {
    body(first) > range(first) * 0.5 && body(second) < range(second) * 0.3
}

fn is_morning_star(three: &[OhlcvBar; 3], trend: ShortTrend) -> bool {
    let [first, second, third] = three;
    is_bearish(first)
        && is_star(first, second)
        && is_bullish(third)
        && third.close > midpoint(first)
        && trend == ShortTrend::Down
}

fn is_evening_star(three: &[OhlcvBar; 3], trend: ShortTrend) -> bool {
    let [first, second, third] = three;
    is_bullish(first)
        && is_star(first, second)
        && is_bearish(third)
        && third.close < midpoint(first)
        && trend == ShortTrend::Up
}

/// Three candles of one colour, each mostly body, closing progressively
/// further in that direction.
fn is_three_in_a_row(three: &[OhlcvBar; 3], bullish: bool) -> bool {
    let strong = three.iter().all(|bar| {
        let coloured = if bullish { is_bullish(bar) } else { is_bearish(bar) };
        let r = range(bar);
        coloured && (r == 0.0 || body(bar) / r >= 0.6)
    });
    let [first, second, third] = three;
    let advancing = if bullish {
        second.close > first.close && third.close > second.close
    } else {
        second.close < first.close && third.close < second.close
    };
    strong && advancing
}

/// Patterns completed by the last bar, in a fixed order: single-candle,
/// then two-candle, then three-candle. Fewer than [`MIN_BARS`] bars yields
/// nothing.
pub fn scan_patterns(bars: &[OhlcvBar]) -> Vec<CandlePattern> {
    let mut found = Vec::new();
    let n = bars.len();
    if n < MIN_BARS {
        return found;
    }
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let trend = short_term_trend(&closes, TREND_LOOKBACK);
    let (prev, cur) = (&bars[n - 2], &bars[n - 1]);
    let three: &[OhlcvBar; 3] = match (&bars[n - 3..]).try_into() {
        Ok(three) => three,
        Err(_) => return found,
    };

    let checks = [
        (CandlePattern::Hammer, is_hammer(cur, trend)),
        (CandlePattern::ShootingStar, is_shooting_star(cur, trend)),
        (CandlePattern::Doji, is_doji(cur)),
        (CandlePattern::BullishMarubozu, is_bullish_marubozu(cur)),
        (
            CandlePattern::BullishEngulfing,
            is_bullish_engulfing(prev, cur, trend),
        ),
        (
            CandlePattern::BearishEngulfing,
            is_bearish_engulfing(prev, cur, trend),
        ),
        (CandlePattern::MorningStar, is_morning_star(three, trend)),
        (CandlePattern::EveningStar, is_evening_star(three, trend)),
        (
            CandlePattern::ThreeWhiteSoldiers,
            is_three_in_a_row(three, true),
        ),
        (
            CandlePattern::ThreeBlackCrows,
            is_three_in_a_row(three, false),
        ),
    ];
    found.extend(
        checks
            .into_iter()
            .filter(|(_, hit)| *hit)
            .map(|(pattern, _)| pattern),
    );
    found
}

/// Bullish reliability minus bearish reliability.
pub fn pattern_score(patterns: &[CandlePattern]) -> i32 {
    patterns
        .iter()
        .map(|p| match p.bias() {
            PatternBias::Bullish => i32::from(p.reliability()),
            PatternBias::Bearish => -i32::from(p.reliability()),
            PatternBias::Neutral => 0,
        })
        .sum()
}

/// Strongest bullish pattern found, if any.
pub fn best_bullish(patterns: &[CandlePattern]) -> Option<CandlePattern> {
    patterns
        .iter()
        .copied()
        .filter(|p| p.bias() == PatternBias::Bullish)
        .max_by_key(|p| p.reliability())
}
