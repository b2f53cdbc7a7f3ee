//! Platform fee calculation.
//!
//! The marketplace keeps a fixed percentage of every sale. All arithmetic is done on integer minor units, so the fee
//! and the seller payout always add up to the sale price exactly.
use mkt_common::Money;
use serde::{Deserialize, Serialize};

/// The platform's cut, in basis points (1/100th of a percent).
pub const PLATFORM_FEE_BASIS_POINTS: i64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fees {
    pub platform_fee: Money,
    pub seller_amount: Money,
}

/// Splits `price` into the platform fee and the seller's payout.
///
/// The fee is rounded half-up to the nearest cent. `price` must be non-negative; callers validate amounts before they
/// get here.
pub fn calculate_fees(price: Money) -> Fees {
    let cents = i128::from(price.cents());
    let fee = (cents * i128::from(PLATFORM_FEE_BASIS_POINTS) + 5_000) / 10_000;
    // The fee is never larger than the price, so it fits back into an i64
    #[allow(clippy::cast_possible_truncation)]
    let platform_fee = Money::from_cents(fee as i64);
    let seller_amount = price - platform_fee;
    Fees { platform_fee, seller_amount }
}
