//! Grid construction.
//!
//! Slices a price band `[lower, upper]` into equal bands. Each band
//! becomes one `LocalOrder` row: buy at the band's lower edge, sell at
//! its upper edge, carrying an equal share of the total amount.

use crate::decimal::{Amount, Price};
use crate::error::{CoreError, CoreResult};
use crate::order::LocalOrder;
use rust_decimal::Decimal;

/// Build the grid rows for a price band.
///
/// Band `i` (1-based) buys at `lower + step * (i - 1)` and sells at
/// `lower + step * i`, where `step = (upper - lower) / band_count`.
/// Every band carries `total_amount / band_count`.
///
/// Fails fast on a degenerate configuration; callers treat these errors
/// as fatal at startup.
pub fn build_grid(
    lower: Price,
    upper: Price,
    band_count: u32,
    total_amount: Amount,
) -> CoreResult<Vec<LocalOrder>> {
    if band_count == 0 {
        return Err(CoreError::EmptyGrid);
    }
    if upper <= lower {
        return Err(CoreError::InvertedBand { lower, upper });
    }
    if !total_amount.is_positive() {
        return Err(CoreError::NonPositiveAmount(total_amount));
    }

    let bands = Decimal::from(band_count);
    let step = (upper - lower) / bands;
    let amount = total_amount / bands;

    let mut rows = Vec::with_capacity(band_count as usize);
    for i in 1..=band_count {
        let buy_price = lower + step * Decimal::from(i - 1);
        let sell_price = lower + step * Decimal::from(i);
        rows.push(LocalOrder::new(buy_price, sell_price, amount));
    }

    Ok(rows)
}
