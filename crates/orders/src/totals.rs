//! Running totals over a draft's lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderline_core::{DomainError, DomainResult, ValueObject, round_currency};

use crate::line::LineItem;

/// Totals derived from the current lines. Never mutated on its own; always
/// recomputed from lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub total_quantity: u64,
    /// Σ gross amount (quantity × rate).
    pub total_amount: Decimal,
    /// Σ trade + special discounts.
    pub total_discount: Decimal,
    pub total_sgst: Decimal,
    pub total_cgst: Decimal,
    pub total_igst: Decimal,
    pub total_payable: Decimal,
}

impl ValueObject for OrderTotals {}

impl OrderTotals {
    /// Sum exact line values. Pure; the result depends only on `lines`.
    ///
    /// Sums saturate at `Decimal::MAX`; drafts reject lines that would push
    /// them there (see [`OrderTotals::try_from_lines`]).
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a LineItem>,
    {
        let mut totals = Self::default();
        for line in lines {
            totals.total_quantity = totals.total_quantity.saturating_add(u64::from(line.quantity()));
            totals.total_amount = totals.total_amount.saturating_add(line.gross_amount());
            totals.total_discount = totals
                .total_discount
                .saturating_add(line.discount_amount())
                .saturating_add(line.special_discount_amount());
            totals.total_sgst = totals.total_sgst.saturating_add(line.sgst());
            totals.total_cgst = totals.total_cgst.saturating_add(line.cgst());
            totals.total_igst = totals.total_igst.saturating_add(line.igst());
        }
        totals.total_payable = (totals.total_amount - totals.total_discount)
            .saturating_add(totals.total_tax());
        totals
    }

    /// Like [`OrderTotals::from_lines`], but fails instead of saturating.
    pub fn try_from_lines<'a, I>(lines: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = &'a LineItem>,
    {
        let too_large = || DomainError::validation("order total too large");
        let add = |a: Decimal, b: Decimal| a.checked_add(b).ok_or_else(too_large);

        let mut totals = Self::default();
        for line in lines {
            totals.total_quantity = totals
                .total_quantity
                .checked_add(u64::from(line.quantity()))
                .ok_or_else(too_large)?;
            totals.total_amount = add(totals.total_amount, line.gross_amount())?;
            totals.total_discount = add(
                add(totals.total_discount, line.discount_amount())?,
                line.special_discount_amount(),
            )?;
            totals.total_sgst = add(totals.total_sgst, line.sgst())?;
            totals.total_cgst = add(totals.total_cgst, line.cgst())?;
            totals.total_igst = add(totals.total_igst, line.igst())?;
        }
        let tax = add(add(totals.total_sgst, totals.total_cgst)?, totals.total_igst)?;
        totals.total_payable = add(totals.total_amount - totals.total_discount, tax)?;
        Ok(totals)
    }

    pub fn total_tax(&self) -> Decimal {
        self.total_sgst
            .saturating_add(self.total_cgst)
            .saturating_add(self.total_igst)
    }

    /// Every amount rounded half-up to currency scale.
    ///
    /// Rounding is applied to the exact sums, not summed from rounded lines,
    /// so rounding error never compounds across lines.
    pub fn rounded(&self) -> Self {
        Self {
            total_quantity: self.total_quantity,
            total_amount: round_currency(self.total_amount),
            total_discount: round_currency(self.total_discount),
            total_sgst: round_currency(self.total_sgst),
            total_cgst: round_currency(self.total_cgst),
            total_igst: round_currency(self.total_igst),
            total_payable: round_currency(self.total_payable),
        }
    }
}
