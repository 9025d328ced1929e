//! Fixed-point currency helpers.
//!
//! The domain carries amounts as [`Decimal`] with two fractional digits;
//! storage keeps them in minor units (cents).

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::errors::{DomainError, DomainResult};

/// Number of fractional digits in every external-facing amount.
pub const MONEY_SCALE: u32 = 2;

/// Round to two decimal places, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn to_minor_units(amount: Decimal) -> DomainResult<i64> {
    (round_money(amount) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| DomainError::Validation(format!("amount {} is out of range", amount)))
}

pub fn from_minor_units(cents: i64) -> Decimal {
    Decimal::new(cents, MONEY_SCALE)
}

/// Render an amount as `"40.00 INR"`.
pub fn format_money(amount: Decimal, currency: &str) -> String {
    format!("{:.2} {}", round_money(amount), currency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn minor_units_conversion() {
        let amount = Decimal::from_str("12.34").unwrap();
        assert_eq!(to_minor_units(amount).unwrap(), 1234);
        assert_eq!(from_minor_units(1234), amount);
        assert_eq!(from_minor_units(0), Decimal::ZERO);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_money(Decimal::from_str("2.345").unwrap()).to_string(), "2.35");
        assert_eq!(round_money(Decimal::from_str("2.344").unwrap()).to_string(), "2.34");
    }

    #[test]
    fn format_always_shows_two_digits() {
        assert_eq!(format_money(Decimal::from(40), "INR"), "40.00 INR");
        assert_eq!(format_money(Decimal::from_str("7.5").unwrap(), "EUR"), "7.50 EUR");
    }
}
