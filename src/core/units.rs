//! Ether display units <-> wei.

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::U256;

use crate::error::{ClientError, Result};

/// Decimal places between whole ether and wei.
pub const DECIMALS: usize = 18;

pub const INVALID_AMOUNT: &str = "Please enter a valid donation amount.";

/// Convert a decimal ether string (as typed into the donation field) to wei.
///
/// Rejects empty, signed, non-numeric, zero, and over-precise amounts.
pub fn parse_amount(raw: &str) -> Result<U256> {
    let invalid = || ClientError::InvalidInput(INVALID_AMOUNT.into());
    let raw = raw.trim();
    let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !digits(whole) || !digits(frac) || frac.len() > DECIMALS {
        return Err(invalid());
    }
    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if frac.is_empty() { whole.to_string() } else { format!("{whole}.{frac}") };
    let wei = parse_ether(&normalized).map_err(|_| invalid())?;
    if wei.is_zero() {
        return Err(invalid());
    }
    Ok(wei)
}

/// Format wei as a decimal ether string: `1.5`, `0.0`, `12.0`.
pub fn format_amount(wei: U256) -> String {
    let mut text = format_ether(wei);
    if let Some(dot) = text.find('.') {
        let keep = text.trim_end_matches('0').len().max(dot + 2);
        text.truncate(keep);
    } else {
        text.push_str(".0");
    }
    text
}
