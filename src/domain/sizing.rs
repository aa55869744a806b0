//! Position sizing from account risk limits, plus SafeZone trade levels.
//!
//! Limit breaches are returned as rejected results, not errors: callers
//! branch on them for every candidate.

use crate::domain::error::ScreenError;
use std::fmt;

pub const DEFAULT_RISK_PER_TRADE_PCT: f64 = 2.0;
pub const DEFAULT_MONTHLY_DRAWDOWN_CAP_PCT: f64 = 6.0;
pub const DEFAULT_TARGET_REWARD_RISK: f64 = 2.0;
pub const DEFAULT_MAX_CONCURRENT_POSITIONS: usize = 5;

/// Account-level risk parameters, supplied with every sizing call.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    pub account_equity: f64,
    pub risk_per_trade_pct: f64,
    pub monthly_drawdown_cap_pct: f64,
    pub target_reward_risk_ratio: f64,
    pub max_concurrent_positions: usize,
}

impl RiskConfig {
    /// Standard limits (2% per trade, 6% per month) for the given equity.
    pub fn with_equity(account_equity: f64) -> Self {
        Self {
            account_equity,
            risk_per_trade_pct: DEFAULT_RISK_PER_TRADE_PCT,
            monthly_drawdown_cap_pct: DEFAULT_MONTHLY_DRAWDOWN_CAP_PCT,
            target_reward_risk_ratio: DEFAULT_TARGET_REWARD_RISK,
            max_concurrent_positions: DEFAULT_MAX_CONCURRENT_POSITIONS,
        }
    }

    pub fn validate(&self) -> Result<(), ScreenError> {
        if !(self.account_equity > 0.0) {
            return Err(ScreenError::invalid_parameter(
                "account_equity",
                "must be positive",
            ));
        }
        if !(self.risk_per_trade_pct > 0.0 && self.risk_per_trade_pct <= 100.0) {
            return Err(ScreenError::invalid_parameter(
                "risk_per_trade_pct",
                "must be in (0, 100]",
            ));
        }
        if !(self.monthly_drawdown_cap_pct > 0.0 && self.monthly_drawdown_cap_pct <= 100.0) {
            return Err(ScreenError::invalid_parameter(
                "monthly_drawdown_cap_pct",
                "must be in (0, 100]",
            ));
        }
        if !(self.target_reward_risk_ratio > 0.0) {
            return Err(ScreenError::invalid_parameter(
                "target_reward_risk",
                "must be positive",
            ));
        }
        if self.max_concurrent_positions == 0 {
            return Err(ScreenError::invalid_parameter(
                "max_concurrent_positions",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn risk_amount(&self) -> f64 {
        self.account_equity * self.risk_per_trade_pct / 100.0
    }

    pub fn drawdown_cap(&self) -> f64 {
        self.account_equity * self.monthly_drawdown_cap_pct / 100.0
    }
}

/// What the account already carries when a new trade is sized.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AccountState {
    pub open_positions: usize,
    pub month_to_date_drawdown: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    MaxPositionsReached,
    DrawdownCapExceeded,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::MaxPositionsReached => write!(f, "max positions reached"),
            RejectReason::DrawdownCapExceeded => write!(f, "monthly drawdown cap exceeded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionSizeResult {
    pub direction: Direction,
    pub shares: u64,
    pub per_share_risk: f64,
    pub risk_amount: f64,
    pub reward_target: f64,
    pub rejected: bool,
    pub reject_reason: Option<RejectReason>,
}

impl PositionSizeResult {
    pub fn position_value(&self, entry_price: f64) -> f64 {
        self.shares as f64 * entry_price
    }
}

/// Size a trade so that hitting the stop loses at most the per-trade risk.
///
/// The direction follows from the stop: below entry is long, above is short.
pub fn calculate_position_size(
    config: &RiskConfig,
    entry_price: f64,
    stop_price: f64,
    account: &AccountState,
) -> Result<PositionSizeResult, ScreenError> {
    config.validate()?;
    let per_share_risk = (entry_price - stop_price).abs();
    if !(per_share_risk > 0.0) || !entry_price.is_finite() || !stop_price.is_finite() {
        return Err(ScreenError::InvalidStop {
            entry: entry_price,
            stop: stop_price,
        });
    }

    let direction = if stop_price < entry_price {
        Direction::Long
    } else {
        Direction::Short
    };
    let risk_amount = config.risk_amount();
    let reward_target =
        entry_price + direction.sign() * per_share_risk * config.target_reward_risk_ratio;

    let reject_reason = if account.open_positions >= config.max_concurrent_positions {
        Some(RejectReason::MaxPositionsReached)
    } else if account.month_to_date_drawdown + risk_amount > config.drawdown_cap() {
        Some(RejectReason::DrawdownCapExceeded)
    } else {
        None
    };

    let shares = match reject_reason {
        Some(_) => 0,
        None => (risk_amount / per_share_risk).floor() as u64,
    };

    Ok(PositionSizeResult {
        direction,
        shares,
        per_share_risk,
        risk_amount,
        reward_target,
        rejected: reject_reason.is_some(),
        reject_reason,
    })
}

/// Suggested long levels from a volatility stop below entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TradeLevels {
    pub entry: f64,
    pub stop_loss: f64,
    /// 1.5R
    pub target_1: f64,
    /// Configured reward/risk multiple.
    pub target_2: f64,
    /// 3R
    pub target_3: f64,
    pub risk_per_share: f64,
    pub risk_pct: f64,
}

pub fn safezone_levels(
    entry: f64,
    atr: f64,
    atr_multiple: f64,
    reward_risk: f64,
) -> Result<TradeLevels, ScreenError> {
    let risk_per_share = atr * atr_multiple;
    let stop_loss = entry - risk_per_share;
    if !(risk_per_share > 0.0) || !(entry > 0.0) {
        return Err(ScreenError::InvalidStop {
            entry,
            stop: stop_loss,
        });
    }
    Ok(TradeLevels {
        entry,
        stop_loss,
        target_1: entry + 1.5 * risk_per_share,
        target_2: entry + reward_risk * risk_per_share,
        target_3: entry + 3.0 * risk_per_share,
        risk_per_share,
        risk_pct: risk_per_share / entry * 100.0,
    })
}
