//! Decimal helpers for currency amounts and percentages.
//!
//! Amounts are carried as exact `Decimal`s through every computation and only
//! rounded when they leave the domain (display, persistence records, rounded
//! totals). Rounding is half-up: a midpoint rounds away from zero, which for the
//! non-negative amounts an order carries is the familiar "0.005 -> 0.01".

use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Number of decimal places for currency output.
pub const CURRENCY_SCALE: u32 = 2;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Round an amount half-up to `CURRENCY_SCALE` decimal places.
pub fn round_currency(amount: Decimal) -> Decimal {
    round_to(amount, CURRENCY_SCALE)
}

/// Round an amount half-up to `scale` decimal places.
pub fn round_to(amount: Decimal, scale: u32) -> Decimal {
    amount.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Parse a non-negative currency amount (e.g. a rate) and normalize it to
/// currency scale.
pub fn parse_amount(raw: &str) -> DomainResult<Decimal> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|_| DomainError::validation(format!("not a number: {raw:?}")))?;
    non_negative_amount(value)
}

/// Validate a non-negative amount and normalize it to currency scale.
pub fn non_negative_amount(value: Decimal) -> DomainResult<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::validation(format!(
            "amount must not be negative (got {value})"
        )));
    }
    Ok(round_currency(value))
}

/// A percentage in the range `0..=100` (e.g. a GST rate of 18, a discount of 2.5).
#[derive(
    Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percent(Decimal);

impl ValueObject for Percent {}

impl Percent {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(value: Decimal) -> DomainResult<Self> {
        if value < Decimal::ZERO || value > HUNDRED {
            return Err(DomainError::validation(format!(
                "percentage must be within 0..=100 (got {value})"
            )));
        }
        Ok(Self(value.normalize()))
    }

    /// Parse `"18"`, `"18.0"`, `" 18 % "` style inputs.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        let digits = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let value = Decimal::from_str(digits)
            .map_err(|_| DomainError::validation(format!("not a percentage: {raw:?}")))?;
        Self::new(value)
    }

    pub fn value(self) -> Decimal {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// `amount * self / 100`, exact (unrounded). `None` if the product
    /// overflows `Decimal`.
    pub fn of(self, amount: Decimal) -> Option<Decimal> {
        amount.checked_mul(self.0)?.checked_div(HUNDRED)
    }
}

impl TryFrom<Decimal> for Percent {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for Decimal {
    fn from(value: Percent) -> Self {
        value.0
    }
}

impl core::fmt::Display for Percent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rounding_is_half_up_at_two_places() {
        assert_eq!(round_currency(dec("0.005")), dec("0.01"));
        assert_eq!(round_currency(dec("0.004")), dec("0.00"));
        assert_eq!(round_currency(dec("12.345")), dec("12.35"));
        assert_eq!(round_currency(dec("12.3449")), dec("12.34"));
        assert_eq!(round_currency(dec("90")), dec("90"));
    }

    #[test]
    fn percent_parses_suffixes_and_whitespace() {
        assert_eq!(Percent::parse("18%").unwrap().value(), dec("18"));
        assert_eq!(Percent::parse(" 12 % ").unwrap().value(), dec("12"));
        assert_eq!(Percent::parse("2.50").unwrap().value(), dec("2.5"));
    }

    #[test]
    fn percent_rejects_out_of_range_and_garbage() {
        assert!(matches!(Percent::parse("-1"), Err(DomainError::Validation(_))));
        assert!(matches!(Percent::parse("100.01"), Err(DomainError::Validation(_))));
        assert!(matches!(Percent::parse("GST"), Err(DomainError::Validation(_))));
        assert!(Percent::parse("100").is_ok());
    }

    #[test]
    fn percent_of_amount_is_exact() {
        let gst = Percent::parse("18").unwrap();
        assert_eq!(gst.of(dec("1000")), Some(dec("180")));
        assert_eq!(gst.of(dec("0.05")), Some(dec("0.009")));
    }

    #[test]
    fn percent_of_overflowing_amount_is_none() {
        let gst = Percent::parse("28").unwrap();
        assert_eq!(gst.of(Decimal::MAX), None);
        assert_eq!(Percent::ZERO.of(Decimal::MAX), Some(Decimal::ZERO));
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(matches!(parse_amount("-0.01"), Err(DomainError::Validation(_))));
        assert_eq!(parse_amount("10.005").unwrap(), dec("10.01"));
        assert_eq!(parse_amount("-0").unwrap(), Decimal::ZERO);
    }

    proptest! {
        /// Property: rounding never moves a value by more than half a paisa.
        #[test]
        fn rounding_error_is_bounded(units in 0i64..10_000_000i64, scale in 0u32..6u32) {
            let value = Decimal::new(units, scale);
            let rounded = round_currency(value);
            prop_assert!((rounded - value).abs() <= dec("0.005"));
            prop_assert!(rounded.scale() <= CURRENCY_SCALE);
        }
    }
}
