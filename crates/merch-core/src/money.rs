//! ============================================================================
//! Money - SUI / MIST Conversion
//! ============================================================================
//! Prices live on-chain as MIST (u64). Display values are SUI with two
//! decimals, or four when the amount is below 0.01 SUI.
//! ============================================================================

use crate::error::{Result, StoreError};

/// 1 SUI = 1_000_000_000 MIST
pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// Amounts below this many MIST (0.01 SUI) are shown with four decimals
const SMALL_AMOUNT_MIST: u64 = MIST_PER_SUI / 100;

/// Format a MIST amount as a SUI display string.
///
/// Rounds half-up at the last displayed digit, using integer arithmetic so the
/// output never depends on float representation.
pub fn format_sui(mist: u64) -> String {
    let decimals: u32 = if mist < SMALL_AMOUNT_MIST { 4 } else { 2 };
    let step = u128::from(MIST_PER_SUI / 10u64.pow(decimals));
    let scaled = (u128::from(mist) + step / 2) / step;
    let unit = 10u128.pow(decimals);

    format!(
        "{}.{:0width$}",
        scaled / unit,
        scaled % unit,
        width = decimals as usize
    )
}

/// Convert a SUI display value to MIST, flooring any sub-MIST remainder.
///
/// Negative and non-finite values are rejected; prices are never negative.
pub fn sui_to_mist(sui: f64) -> Result<u64> {
    if !sui.is_finite() {
        return Err(StoreError::validation("price", "must be a finite number"));
    }
    if sui < 0.0 {
        return Err(StoreError::validation("price", "must not be negative"));
    }

    let mist = (sui * MIST_PER_SUI as f64).floor();
    if mist >= u64::MAX as f64 {
        return Err(StoreError::validation("price", "amount is too large"));
    }

    Ok(mist as u64)
}

/// Parse user-entered SUI text (e.g. "0.5") into MIST
pub fn parse_sui(text: &str) -> Result<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StoreError::required("price"));
    }

    let sui: f64 = text
        .parse()
        .map_err(|_| StoreError::validation("price", format!("'{}' is not a number", text)))?;

    sui_to_mist(sui)
}
