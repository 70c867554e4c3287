//! Order numbers: `SQ-DD-MM-YY-NNNN`, sequential within a calendar day.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use orderline_core::{DomainError, DomainResult, ValueObject};

/// Prefix used for sales-order numbers.
pub const DEFAULT_PREFIX: &str = "SQ";

/// Digits the sequence suffix is zero-padded to by default.
pub const DEFAULT_SEQUENCE_WIDTH: usize = 4;

/// A parsed order number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderNumber {
    prefix: String,
    date: NaiveDate,
    sequence: u32,
    width: usize,
}

impl ValueObject for OrderNumber {}

impl OrderNumber {
    pub fn new(prefix: impl Into<String>, date: NaiveDate, sequence: u32, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            date,
            sequence,
            width,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Calendar day encoded in the number.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Parse `PREFIX-DD-MM-YY-N...` with any non-empty prefix and any
    /// number of sequence digits.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let malformed = || DomainError::format(format!("malformed order number: {raw:?}"));

        let parts: Vec<&str> = raw.trim().split('-').collect();
        let [prefix, dd, mm, yy, seq] = parts.as_slice() else {
            return Err(malformed());
        };

        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(malformed());
        }
        let day = two_digits(dd).ok_or_else(malformed)?;
        let month = two_digits(mm).ok_or_else(malformed)?;
        let year = two_digits(yy).ok_or_else(malformed)?;
        let date =
            NaiveDate::from_ymd_opt(2000 + year as i32, month, day).ok_or_else(malformed)?;

        if seq.is_empty() || !seq.chars().all(|c| c.is_ascii_digit()) {
            return Err(malformed());
        }
        let sequence: u32 = seq.parse().map_err(|_| malformed())?;

        Ok(Self {
            prefix: (*prefix).to_string(),
            date,
            sequence,
            width: seq.len(),
        })
    }
}

fn two_digits(part: &str) -> Option<u32> {
    if part.len() == 2 && part.chars().all(|c| c.is_ascii_digit()) {
        part.parse().ok()
    } else {
        None
    }
}

impl core::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}-{:02}-{:02}-{:02}-{:0width$}",
            self.prefix,
            self.date.day(),
            self.date.month(),
            self.date.year().rem_euclid(100),
            self.sequence,
            width = self.width,
        )
    }
}

impl TryFrom<String> for OrderNumber {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OrderNumber> for String {
    fn from(value: OrderNumber) -> Self {
        value.to_string()
    }
}

/// Prefix + width used to compose order numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderNumberFormat {
    prefix: String,
    width: usize,
}

impl Default for OrderNumberFormat {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX, DEFAULT_SEQUENCE_WIDTH)
    }
}

impl OrderNumberFormat {
    pub fn new(prefix: impl Into<String>, width: usize) -> Self {
        Self {
            prefix: prefix.into(),
            width: width.max(1),
        }
    }

    /// `PREFIX-DD-MM-YY-0001` for `day`.
    pub fn first_of_day(&self, day: NaiveDate) -> OrderNumber {
        OrderNumber::new(self.prefix.clone(), day, 1, self.width)
    }

    /// Parse and require this format's prefix.
    pub fn parse(&self, raw: &str) -> DomainResult<OrderNumber> {
        let number = OrderNumber::parse(raw)?;
        if number.prefix != self.prefix {
            return Err(DomainError::format(format!(
                "order number {raw:?} does not use prefix {:?}",
                self.prefix
            )));
        }
        Ok(number)
    }

    /// Number following `last_order_number`, persisted on `last_order_date`.
    ///
    /// On the same calendar day the sequence is incremented; otherwise the day
    /// starts again at 1. The last number is only parsed for a same-day
    /// increment, so a malformed value from a previous day is harmless.
    pub fn next(
        &self,
        last_order_number: &str,
        last_order_date: NaiveDate,
        today: NaiveDate,
    ) -> DomainResult<OrderNumber> {
        if last_order_date != today {
            return Ok(self.first_of_day(today));
        }

        let last = self.parse(last_order_number)?;
        let sequence = last.sequence.checked_add(1).ok_or_else(|| {
            DomainError::format(format!("order sequence exhausted: {last_order_number:?}"))
        })?;
        Ok(OrderNumber::new(self.prefix.clone(), today, sequence, self.width))
    }
}

/// [`OrderNumberFormat::next`] with the default `SQ`/4-digit format.
pub fn next_order_number(
    last_order_number: &str,
    last_order_date: NaiveDate,
    today: NaiveDate,
) -> DomainResult<OrderNumber> {
    OrderNumberFormat::default().next(last_order_number, last_order_date, today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_day_increments_the_sequence() {
        let next = next_order_number("SQ-05-11-25-0004", day(2025, 11, 5), day(2025, 11, 5)).unwrap();
        assert_eq!(next.to_string(), "SQ-05-11-25-0005");
    }

    #[test]
    fn new_day_restarts_at_one() {
        let next = next_order_number("SQ-05-11-25-0004", day(2025, 11, 5), day(2025, 11, 6)).unwrap();
        assert_eq!(next.to_string(), "SQ-06-11-25-0001");
    }

    #[test]
    fn increment_repads_across_a_digit_boundary() {
        let next = next_order_number("SQ-01-02-26-0009", day(2026, 2, 1), day(2026, 2, 1)).unwrap();
        assert_eq!(next.to_string(), "SQ-01-02-26-0010");

        let next = next_order_number("SQ-01-02-26-9999", day(2026, 2, 1), day(2026, 2, 1)).unwrap();
        assert_eq!(next.to_string(), "SQ-01-02-26-10000");
    }

    #[test]
    fn malformed_last_number_is_a_format_error_on_same_day() {
        let today = day(2025, 11, 5);
        for raw in ["", "SQ-05-11-25", "SQ-05-11-25-00x4", "SQ-5-11-25-0004", "PO-05-11-25-0004"] {
            let err = next_order_number(raw, today, today).unwrap_err();
            assert!(matches!(err, DomainError::Format(_)), "{raw:?}");
        }
    }

    #[test]
    fn narrow_format_reads_back_its_own_numbers() {
        let today = day(2025, 11, 5);
        let format = OrderNumberFormat::new(DEFAULT_PREFIX, 3);

        let next = format.next("SQ-05-11-25-004", today, today).unwrap();
        assert_eq!(next.to_string(), "SQ-05-11-25-005");
        assert_eq!(format.next(&next.to_string(), today, today).unwrap().sequence(), 6);

        let short = OrderNumber::parse("SQ-05-11-25-7").unwrap();
        assert_eq!(short.sequence(), 7);
        assert!(OrderNumber::parse("SQ-05-11-25-").is_err());
    }

    #[test]
    fn malformed_last_number_is_ignored_on_a_new_day() {
        let next = next_order_number("garbage", day(2025, 11, 5), day(2025, 11, 6)).unwrap();
        assert_eq!(next.to_string(), "SQ-06-11-25-0001");
    }

    #[test]
    fn parse_reads_every_component() {
        let n = OrderNumber::parse("SQ-29-02-24-0042").unwrap();
        assert_eq!(n.prefix(), "SQ");
        assert_eq!(n.date(), day(2024, 2, 29));
        assert_eq!(n.sequence(), 42);
        assert!(OrderNumber::parse("SQ-30-02-24-0042").is_err());
    }

    #[test]
    fn serde_uses_the_display_form() {
        let n = OrderNumber::parse("SQ-05-11-25-0004").unwrap();
        let json = serde_json::to_string(&n).unwrap();
        assert_eq!(json, "\"SQ-05-11-25-0004\"");
        let back: OrderNumber = serde_json::from_str(&json).unwrap();
        assert_eq!(back, n);
    }

    proptest! {
        /// Property: within a day, each next number is strictly greater and
        /// formats back to something that parses to the same value.
        #[test]
        fn same_day_sequence_is_monotonic(start in 1u32..50_000u32, steps in 1usize..20usize) {
            let today = day(2025, 11, 5);
            let format = OrderNumberFormat::default();
            let mut current = OrderNumber::new(DEFAULT_PREFIX, today, start, DEFAULT_SEQUENCE_WIDTH);

            for _ in 0..steps {
                let next = format.next(&current.to_string(), today, today).unwrap();
                prop_assert_eq!(next.sequence(), current.sequence() + 1);
                prop_assert_eq!(OrderNumber::parse(&next.to_string()).unwrap().sequence(), next.sequence());
                current = next;
            }
        }
    }
}
