//! Order line: item, quantity, rate and everything derived from them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderline_core::{DomainError, DomainResult, Entity, Percent, ValueObject};

use crate::master::{ItemCode, ItemMaster};
use crate::tax::{TaxRegion, TaxSplit};

/// Free-text delivery details captured with a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDetails {
    pub delivery_date: Option<NaiveDate>,
    pub delivery_mode: Option<String>,
    pub transporter_name: Option<String>,
}

impl LineDetails {
    /// A delivery date may not precede the order date.
    pub fn validate(&self, order_date: NaiveDate) -> DomainResult<()> {
        match self.delivery_date {
            Some(date) if date < order_date => Err(DomainError::validation(format!(
                "delivery date {date} is before order date {order_date}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Trade discount followed by a special discount on the remainder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineDiscount {
    pub percent: Percent,
    pub special_percent: Percent,
}

impl ValueObject for LineDiscount {}

impl LineDiscount {
    pub const NONE: Self = Self {
        percent: Percent::ZERO,
        special_percent: Percent::ZERO,
    };

    pub fn new(percent: Percent, special_percent: Percent) -> Self {
        Self {
            percent,
            special_percent,
        }
    }

    pub fn is_none(&self) -> bool {
        self.percent.is_zero() && self.special_percent.is_zero()
    }
}

/// A single order line.
///
/// Amounts are exact: `gross_amount == quantity * rate` with no rounding, and
/// the tax split is computed from the exact net amount. Rounding happens when a
/// line is turned into an output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    item_code: ItemCode,
    item_name: String,
    hsn_code: String,
    unit_of_measure: String,
    quantity: u32,
    rate: Decimal,
    tax_rate_percent: Percent,
    discount: LineDiscount,
    details: LineDetails,

    gross_amount: Decimal,
    discount_amount: Decimal,
    special_discount_amount: Decimal,
    net_amount: Decimal,
    tax: TaxSplit,
}

impl Entity for LineItem {
    type Id = ItemCode;

    fn id(&self) -> &Self::Id {
        &self.item_code
    }
}

impl LineItem {
    /// Build a line from an item master record.
    ///
    /// Fails if the item is unselected (blank code), the rate is negative,
    /// the quantity is zero or an amount overflows.
    pub fn from_item(
        item: &ItemMaster,
        quantity: u32,
        details: LineDetails,
        region: TaxRegion,
        default_unit: &str,
    ) -> DomainResult<Self> {
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Self::staged(item, quantity, details, region, default_unit)
    }

    /// Build a line that is still being edited; a zero quantity is allowed.
    pub fn staged(
        item: &ItemMaster,
        quantity: u32,
        details: LineDetails,
        region: TaxRegion,
        default_unit: &str,
    ) -> DomainResult<Self> {
        let item_code = item.code()?;
        let rate = item.normalized_rate()?;

        let unit_of_measure = item
            .unit_of_measure
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(default_unit)
            .to_string();

        let pricing =
            Pricing::compute(quantity, rate, LineDiscount::NONE, item.tax_rate_percent, region)?;
        Ok(Self {
            item_code,
            item_name: item.name.clone(),
            hsn_code: item.hsn_code.clone(),
            unit_of_measure,
            quantity,
            rate,
            tax_rate_percent: item.tax_rate_percent,
            discount: LineDiscount::NONE,
            details,
            gross_amount: pricing.gross_amount,
            discount_amount: pricing.discount_amount,
            special_discount_amount: pricing.special_discount_amount,
            net_amount: pricing.net_amount,
            tax: pricing.tax,
        })
    }

    /// Re-derive every amount from quantity, rate, discount and tax rate.
    ///
    /// Fails (leaving the line unchanged) if an amount overflows.
    pub fn recompute(&mut self, region: TaxRegion) -> DomainResult<()> {
        self.reprice(self.quantity, self.discount, region)
    }

    pub fn set_quantity(&mut self, quantity: u32, region: TaxRegion) -> DomainResult<()> {
        self.reprice(quantity, self.discount, region)
    }

    pub fn set_discount(&mut self, discount: LineDiscount, region: TaxRegion) -> DomainResult<()> {
        self.reprice(self.quantity, discount, region)
    }

    /// Set quantity and discount together and re-derive the amounts.
    pub fn reprice(
        &mut self,
        quantity: u32,
        discount: LineDiscount,
        region: TaxRegion,
    ) -> DomainResult<()> {
        let pricing =
            Pricing::compute(quantity, self.rate, discount, self.tax_rate_percent, region)?;
        self.quantity = quantity;
        self.discount = discount;
        self.store(pricing);
        Ok(())
    }

    fn store(&mut self, pricing: Pricing) {
        self.gross_amount = pricing.gross_amount;
        self.discount_amount = pricing.discount_amount;
        self.special_discount_amount = pricing.special_discount_amount;
        self.net_amount = pricing.net_amount;
        self.tax = pricing.tax;
    }

    pub fn item_code(&self) -> &ItemCode {
        &self.item_code
    }

    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    pub fn hsn_code(&self) -> &str {
        &self.hsn_code
    }

    pub fn unit_of_measure(&self) -> &str {
        &self.unit_of_measure
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn rate(&self) -> Decimal {
        self.rate
    }

    pub fn tax_rate_percent(&self) -> Percent {
        self.tax_rate_percent
    }

    pub fn discount(&self) -> LineDiscount {
        self.discount
    }

    pub fn details(&self) -> &LineDetails {
        &self.details
    }

    /// `quantity * rate`, exact.
    pub fn gross_amount(&self) -> Decimal {
        self.gross_amount
    }

    pub fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    pub fn special_discount_amount(&self) -> Decimal {
        self.special_discount_amount
    }

    /// Taxable amount after both discounts.
    pub fn net_amount(&self) -> Decimal {
        self.net_amount
    }

    /// Effective per-unit rate after discounts (zero for a zero quantity).
    pub fn net_rate(&self) -> Decimal {
        if self.quantity == 0 {
            Decimal::ZERO
        } else {
            self.net_amount / Decimal::from(self.quantity)
        }
    }

    /// Full GST on the line, before splitting.
    pub fn gst_amount(&self) -> Decimal {
        self.tax.total()
    }

    pub fn tax(&self) -> &TaxSplit {
        &self.tax
    }

    pub fn sgst(&self) -> Decimal {
        self.tax.sgst()
    }

    pub fn cgst(&self) -> Decimal {
        self.tax.cgst()
    }

    pub fn igst(&self) -> Decimal {
        self.tax.igst()
    }
}

/// Amounts derived for one quantity/discount/region combination.
struct Pricing {
    gross_amount: Decimal,
    discount_amount: Decimal,
    special_discount_amount: Decimal,
    net_amount: Decimal,
    tax: TaxSplit,
}

impl Pricing {
    fn compute(
        quantity: u32,
        rate: Decimal,
        discount: LineDiscount,
        tax_rate: Percent,
        region: TaxRegion,
    ) -> DomainResult<Self> {
        let too_large = || DomainError::validation("amount too large");

        let gross_amount = Decimal::from(quantity)
            .checked_mul(rate)
            .ok_or_else(too_large)?;
        let discount_amount = discount.percent.of(gross_amount).ok_or_else(too_large)?;
        let special_discount_amount = discount
            .special_percent
            .of(gross_amount - discount_amount)
            .ok_or_else(too_large)?;
        let net_amount = gross_amount - discount_amount - special_discount_amount;
        let tax = TaxSplit::compute(net_amount, tax_rate, region)?;

        Ok(Self {
            gross_amount,
            discount_amount,
            special_discount_amount,
            net_amount,
            tax,
        })
    }
}
