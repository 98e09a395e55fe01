//! Decimal helpers that never divide by zero and never overflow.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Largest expense amount or budget limit accepted: `99999999.99`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Decimal places an amount may carry.
pub const AMOUNT_SCALE: u32 = 2;

/// True when `amount` is positive, at most [`MAX_AMOUNT`], and has no more
/// than [`AMOUNT_SCALE`] decimal places.
pub fn is_storable_amount(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount <= MAX_AMOUNT && amount.normalize().scale() <= AMOUNT_SCALE
}

/// Sum of `amounts`, or `None` once it leaves the decimal range.
pub fn checked_sum<I>(amounts: I) -> Option<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
}

/// `part / whole * 100` as a float, or `0.0` when `whole` is not positive.
pub fn percentage(part: Decimal, whole: Decimal) -> f64 {
    if whole <= Decimal::ZERO {
        return 0.0;
    }
    match part
        .checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
    {
        Some(ratio) => to_f64(ratio),
        None => to_f64(part) / to_f64(whole) * 100.0,
    }
}

/// `total / count`, or zero for an empty set.
pub fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(count)).round_dp(2)
}

pub fn to_f64(amount: Decimal) -> f64 {
    amount.to_f64().unwrap_or(0.0)
}

/// Renders `amount` with two decimals behind `symbol`, e.g. `₹1234.50`.
pub fn format_amount(symbol: &str, amount: Decimal) -> String {
    format!("{}{:.2}", symbol, amount.round_dp(2))
}
