//! Flattened per-line records handed to the order persistence API.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderline_core::{DomainResult, Percent, round_currency};

use crate::draft::OrderDraft;
use crate::line::{LineDetails, LineDiscount, LineItem};
use crate::master::{CustomerMaster, ItemMaster};
use crate::tax::TaxRegion;
use crate::totals::OrderTotals;

/// Which screen an order was placed from; decides the voucher type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderChannel {
    /// Back-office sales order entry.
    Admin,
    /// A distributor ordering for its own account.
    Distributor,
    /// Direct/corporate customer order management.
    Corporate,
}

impl OrderChannel {
    pub fn voucher_type(self) -> &'static str {
        match self {
            OrderChannel::Admin => "Sales Order",
            OrderChannel::Distributor => "Distributor Order-Web Based",
            OrderChannel::Corporate => "Direct Order Management",
        }
    }

    /// Distributors always order for themselves; the other channels pick a customer.
    pub fn requires_customer_selection(self) -> bool {
        !matches!(self, OrderChannel::Distributor)
    }
}

/// Approval status of a submitted order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signed-in user placing the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub channel: OrderChannel,
    pub user_code: String,
    pub user_name: String,
    pub role: String,
    /// State of the signed-in account; taxes distributor orders.
    #[serde(default)]
    pub state: String,
}

impl SessionContext {
    pub fn new(channel: OrderChannel, user_code: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            channel,
            user_code: user_code.into(),
            user_name: user_name.into(),
            role: String::new(),
            state: String::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    /// The signed-in account as a customer, for channels that order for themselves.
    pub fn own_account(&self) -> CustomerMaster {
        let code = if self.user_code.trim().is_empty() {
            "DISTRIBUTOR"
        } else {
            self.user_code.trim()
        };
        let name = if self.user_name.trim().is_empty() {
            "Distributor User"
        } else {
            self.user_name.trim()
        };
        CustomerMaster::new(code, name, self.state.clone())
    }
}

/// One persisted row per order line. Money is rounded half-up to 2 places
/// and serialized as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub voucher_type: String,
    pub order_no: String,
    pub date: NaiveDate,
    pub status: OrderStatus,
    #[serde(rename = "executiveCode", default)]
    pub executive_code: String,
    #[serde(default)]
    pub executive: String,
    #[serde(default)]
    pub role: String,
    pub customer_code: String,
    pub customer_name: String,
    pub item_code: String,
    pub item_name: String,
    pub hsn: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub gst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cgst: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub igst: Decimal,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub delivery_mode: Option<String>,
    #[serde(default)]
    pub transporter_name: Option<String>,
    pub quantity: u32,
    pub uom: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    /// quantity × rate
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_rate: Decimal,
    /// Amount after discounts.
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub disc_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub disc_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spl_disc_percentage: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub spl_disc_amount: Decimal,
    pub total_quantity: u64,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub remarks: String,
}

impl OrderRecord {
    fn from_line(
        line: &LineItem,
        header: &RecordHeader<'_>,
        totals: &OrderTotals,
    ) -> Self {
        let tax = line.tax().rounded();
        let details = line.details();
        Self {
            voucher_type: header.session.channel.voucher_type().to_string(),
            order_no: header.order_no.clone(),
            date: header.date,
            status: OrderStatus::Pending,
            executive_code: header.session.user_code.clone(),
            executive: header.session.user_name.clone(),
            role: header.session.role.clone(),
            customer_code: header.customer.customer_code.clone(),
            customer_name: header.customer.customer_name.clone(),
            item_code: line.item_code().to_string(),
            item_name: line.item_name().to_string(),
            hsn: line.hsn_code().to_string(),
            gst: line.tax_rate_percent().value(),
            sgst: tax.sgst(),
            cgst: tax.cgst(),
            igst: tax.igst(),
            delivery_date: details.delivery_date,
            delivery_mode: details.delivery_mode.clone(),
            transporter_name: details.transporter_name.clone(),
            quantity: line.quantity(),
            uom: line.unit_of_measure().to_string(),
            rate: round_currency(line.rate()),
            amount: round_currency(line.gross_amount()),
            net_rate: round_currency(line.net_rate()),
            gross_amount: round_currency(line.net_amount()),
            disc_percentage: line.discount().percent.value(),
            disc_amount: round_currency(line.discount_amount()),
            spl_disc_percentage: line.discount().special_percent.value(),
            spl_disc_amount: round_currency(line.special_discount_amount()),
            total_quantity: totals.total_quantity,
            total_amount: totals.total_amount,
            remarks: header.remarks.to_string(),
        }
    }

    /// Rebuild the priced line this record was flattened from.
    pub(crate) fn to_line(&self, region: TaxRegion) -> DomainResult<LineItem> {
        let item = ItemMaster {
            item_code: self.item_code.clone(),
            name: self.item_name.clone(),
            rate: self.rate,
            tax_rate_percent: Percent::new(self.gst)?,
            hsn_code: self.hsn.clone(),
            unit_of_measure: Some(self.uom.clone()),
        };
        let details = LineDetails {
            delivery_date: self.delivery_date,
            delivery_mode: self.delivery_mode.clone(),
            transporter_name: self.transporter_name.clone(),
        };
        let discount = LineDiscount::new(
            Percent::new(self.disc_percentage)?,
            Percent::new(self.spl_disc_percentage)?,
        );

        let mut line = LineItem::staged(&item, self.quantity, details, region, &self.uom)?;
        line.set_discount(discount, region)?;
        Ok(line)
    }

    /// Overwrite quantity, discounts and every amount derived from them.
    pub(crate) fn reprice_from(&mut self, line: &LineItem) {
        let tax = line.tax().rounded();
        self.quantity = line.quantity();
        self.sgst = tax.sgst();
        self.cgst = tax.cgst();
        self.igst = tax.igst();
        self.amount = round_currency(line.gross_amount());
        self.net_rate = round_currency(line.net_rate());
        self.gross_amount = round_currency(line.net_amount());
        self.disc_percentage = line.discount().percent.value();
        self.disc_amount = round_currency(line.discount_amount());
        self.spl_disc_percentage = line.discount().special_percent.value();
        self.spl_disc_amount = round_currency(line.special_discount_amount());
    }

    pub(crate) fn set_totals(&mut self, totals: &OrderTotals) {
        self.total_quantity = totals.total_quantity;
        self.total_amount = totals.total_amount;
    }
}

struct RecordHeader<'a> {
    session: &'a SessionContext,
    customer: &'a CustomerMaster,
    order_no: String,
    date: NaiveDate,
    remarks: &'a str,
}

/// Flatten a draft into one record per line, in entry order.
pub fn build_records(
    draft: &OrderDraft,
    session: &SessionContext,
    customer: &CustomerMaster,
) -> Vec<OrderRecord> {
    let totals = draft.totals().rounded();
    let header = RecordHeader {
        session,
        customer,
        order_no: draft.order_number().to_string(),
        date: draft.order_date(),
        remarks: draft.remarks(),
    };
    draft
        .lines()
        .iter()
        .map(|line| OrderRecord::from_line(line, &header, &totals))
        .collect()
}
