//! Configuration validation.
//!
//! Checks raw settings-file values before a run and reports the first
//! violation against its section and key.

use crate::domain::apgar::MAX_COMPONENT;
use crate::domain::error::ScreenError;
use crate::domain::indicator::macd::MIN_DIVERGENCE_LOOKBACK;
use crate::ports::config_port::ConfigPort;

pub fn validate_screen_config(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    validate_min_apgar(config)?;
    validate_screen1(config)?;
    validate_screen2(config)?;
    validate_apgar(config)?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    validate_account_equity(config)?;
    validate_percentage(config, "risk", "risk_per_trade_pct", 2.0)?;
    validate_percentage(config, "risk", "monthly_drawdown_cap_pct", 6.0)?;
    validate_positive_double(config, "risk", "target_reward_risk", 2.0)?;
    validate_period(config, "risk", "max_concurrent_positions", 5)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ScreenError::config_missing("data", "path")),
    }
}

/// Read one APGAR lookup row, falling back to `default` when absent.
pub fn apgar_row<const N: usize>(
    config: &dyn ConfigPort,
    key: &str,
    default: [u8; N],
) -> Result<[u8; N], ScreenError> {
    let Some(raw) = config.get_string("apgar", key) else {
        return Ok(default);
    };

    let mut row = [0u8; N];
    let mut count = 0;
    for part in raw.split(',') {
        let points: u8 = part.trim().parse().map_err(|_| {
            ScreenError::config_invalid("apgar", key, &format!("'{}' is not a number", part.trim()))
        })?;
        if count < N {
            row[count] = points;
        }
        count += 1;
    }
    if count != N {
        return Err(ScreenError::config_invalid(
            "apgar",
            key,
            &format!("expected {} values, got {}", N, count),
        ));
    }
    if row.iter().any(|&p| p > MAX_COMPONENT) {
        return Err(ScreenError::config_invalid(
            "apgar",
            key,
            "values must be 0, 1 or 2",
        ));
    }
    if row.windows(2).any(|pair| pair[1] < pair[0]) {
        return Err(ScreenError::config_invalid(
            "apgar",
            key,
            "values must not decrease",
        ));
    }
    if row[0] != 0 || row[N - 1] != MAX_COMPONENT {
        return Err(ScreenError::config_invalid(
            "apgar",
            key,
            "first value must be 0 and last must be 2",
        ));
    }
    Ok(row)
}

fn validate_min_apgar(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    let value = config.get_int("screen", "min_apgar", 6);
    if !(0..=10).contains(&value) {
        return Err(ScreenError::config_invalid(
            "screen",
            "min_apgar",
            "min_apgar must be between 0 and 10",
        ));
    }
    Ok(())
}

fn validate_screen1(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    validate_period(config, "screen1", "ema_period", 22)?;
    validate_period(config, "screen1", "macd_fast", 12)?;
    validate_period(config, "screen1", "macd_signal", 9)?;
    if config.get_int("screen1", "divergence_lookback", 5) < MIN_DIVERGENCE_LOOKBACK as i64 {
        return Err(ScreenError::config_invalid(
            "screen1",
            "divergence_lookback",
            "divergence_lookback must be at least 2",
        ));
    }

    let fast = config.get_int("screen1", "macd_fast", 12);
    let slow = config.get_int("screen1", "macd_slow", 26);
    if slow <= fast {
        return Err(ScreenError::config_invalid(
            "screen1",
            "macd_slow",
            "macd_slow must be greater than macd_fast",
        ));
    }

    let flat = config.get_double("screen1", "flat_slope_pct", 0.0);
    if flat < 0.0 {
        return Err(ScreenError::config_invalid(
            "screen1",
            "flat_slope_pct",
            "flat_slope_pct must be non-negative",
        ));
    }
    let strong = config.get_double("screen1", "strong_slope_pct", 0.0);
    if strong < flat {
        return Err(ScreenError::config_invalid(
            "screen1",
            "strong_slope_pct",
            "strong_slope_pct must be at least flat_slope_pct",
        ));
    }
    Ok(())
}

fn validate_screen2(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    for (key, default) in [
        ("ema_period", 22),
        ("force_period", 2),
        ("stochastic_period", 14),
        ("impulse_ema_period", 13),
        ("atr_period", 14),
        ("rsi_period", 14),
        ("long_force_period", 13),
    ] {
        validate_period(config, "screen2", key, default)?;
    }
    if config.get_int("screen2", "divergence_lookback", 20) < MIN_DIVERGENCE_LOOKBACK as i64 {
        return Err(ScreenError::config_invalid(
            "screen2",
            "divergence_lookback",
            "divergence_lookback must be at least 2",
        ));
    }

    let oversold = config.get_double("screen2", "stochastic_oversold", 30.0);
    let midline = config.get_double("screen2", "stochastic_midline", 50.0);
    if oversold <= 0.0 || oversold >= midline {
        return Err(ScreenError::config_invalid(
            "screen2",
            "stochastic_oversold",
            "stochastic_oversold must be above 0 and below stochastic_midline",
        ));
    }
    if midline >= 100.0 {
        return Err(ScreenError::config_invalid(
            "screen2",
            "stochastic_midline",
            "stochastic_midline must be below 100",
        ));
    }

    validate_positive_double(config, "screen2", "near_ema_pct", 2.0)?;
    validate_positive_double(config, "screen2", "atr_stop_multiple", 2.0)?;
    Ok(())
}

fn validate_apgar(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    apgar_row(config, "trend", [0, 0, 0, 1, 2])?;
    apgar_row(config, "momentum", [0, 1, 2])?;
    apgar_row(config, "force", [0, 0, 1, 2])?;
    apgar_row(config, "stochastic", [0, 1, 2])?;
    apgar_row(config, "price_ema", [0, 1, 2])?;
    Ok(())
}

fn validate_account_equity(config: &dyn ConfigPort) -> Result<(), ScreenError> {
    if config.get_string("risk", "account_equity").is_none() {
        return Err(ScreenError::config_missing("risk", "account_equity"));
    }
    let value = config.get_double("risk", "account_equity", 0.0);
    if value <= 0.0 {
        return Err(ScreenError::config_invalid(
            "risk",
            "account_equity",
            "account_equity must be positive",
        ));
    }
    Ok(())
}

fn validate_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<(), ScreenError> {
    if config.get_int(section, key, default) < 1 {
        return Err(ScreenError::config_invalid(
            section,
            key,
            &format!("{} must be at least 1", key),
        ));
    }
    Ok(())
}

fn validate_positive_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), ScreenError> {
    if config.get_double(section, key, default) <= 0.0 {
        return Err(ScreenError::config_invalid(
            section,
            key,
            &format!("{} must be positive", key),
        ));
    }
    Ok(())
}

fn validate_percentage(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), ScreenError> {
    let value = config.get_double(section, key, default);
    if value <= 0.0 || value > 100.0 {
        return Err(ScreenError::config_invalid(
            section,
            key,
            &format!("{} must be between 0 and 100", key),
        ));
    }
    Ok(())
}
