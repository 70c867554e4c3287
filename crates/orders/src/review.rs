//! Approval of a submitted order.
//!
//! A submitted order is the set of records sharing one order number. Review
//! moves it out of `pending` exactly once. While pending, a line's quantity
//! and discounts may still be corrected; the line is re-priced and the
//! order totals on every record follow.

use orderline_core::{DomainError, DomainResult, Percent};

use crate::engine::parse_quantity;
use crate::line::{LineDiscount, LineItem};
use crate::record::{OrderRecord, OrderStatus};
use crate::tax::TaxRegion;
use crate::totals::OrderTotals;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReview {
    order_no: String,
    status: OrderStatus,
    region: TaxRegion,
    records: Vec<OrderRecord>,
}

impl OrderReview {
    /// Group records for review. All records must carry the same order
    /// number and status.
    pub fn from_records(records: Vec<OrderRecord>) -> DomainResult<Self> {
        let first = records
            .first()
            .ok_or_else(|| DomainError::validation("no records to review"))?;
        let order_no = first.order_no.clone();
        let status = first.status;

        if let Some(stray) = records.iter().find(|r| r.order_no != order_no) {
            return Err(DomainError::invariant(format!(
                "record for {} does not belong to order {order_no}",
                stray.order_no
            )));
        }
        if records.iter().any(|r| r.status != status) {
            return Err(DomainError::invariant(format!(
                "records of order {order_no} disagree on status"
            )));
        }

        // Records keep the split, not the customer state.
        let region = if records
            .iter()
            .any(|r| !r.sgst.is_zero() || !r.cgst.is_zero())
        {
            TaxRegion::IntraState
        } else {
            TaxRegion::InterState
        };

        Ok(Self {
            order_no,
            status,
            region,
            records,
        })
    }

    /// Override the tax region edited lines are re-taxed under.
    pub fn with_region(mut self, region: TaxRegion) -> Self {
        self.region = region;
        self
    }

    pub fn region(&self) -> TaxRegion {
        self.region
    }

    pub fn order_no(&self) -> &str {
        &self.order_no
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<OrderRecord> {
        self.records
    }

    pub fn approve(&mut self) -> DomainResult<()> {
        self.transition(OrderStatus::Approved)
    }

    pub fn reject(&mut self) -> DomainResult<()> {
        self.transition(OrderStatus::Rejected)
    }

    /// Replace the remarks on every record. Allowed in any status.
    pub fn set_remarks(&mut self, remarks: &str) {
        for record in &mut self.records {
            record.remarks = remarks.to_string();
        }
    }

    /// Correct a line's quantity from raw input; blank input means 0.
    pub fn update_quantity(&mut self, index: usize, raw: &str) -> DomainResult<&OrderRecord> {
        let quantity = parse_quantity(raw)?.unwrap_or(0);
        self.edit_line(index, |line, region| {
            let discount = line.discount();
            line.reprice(quantity, discount, region)
        })
    }

    /// Replace a line's trade and special discount percentages.
    pub fn set_line_discount(
        &mut self,
        index: usize,
        percent: Percent,
        special_percent: Percent,
    ) -> DomainResult<&OrderRecord> {
        let discount = LineDiscount::new(percent, special_percent);
        self.edit_line(index, |line, region| line.set_discount(discount, region))
    }

    /// Rebuild every line, edit the one at `index` and write the result back.
    /// Nothing changes if any step fails.
    fn edit_line<F>(&mut self, index: usize, edit: F) -> DomainResult<&OrderRecord>
    where
        F: FnOnce(&mut LineItem, TaxRegion) -> DomainResult<()>,
    {
        self.ensure_pending()?;

        let mut lines = self
            .records
            .iter()
            .map(|record| record.to_line(self.region))
            .collect::<DomainResult<Vec<_>>>()?;
        let line = lines.get_mut(index).ok_or_else(DomainError::not_found)?;
        edit(line, self.region)?;
        let totals = OrderTotals::try_from_lines(&lines)?.rounded();

        for record in &mut self.records {
            record.set_totals(&totals);
        }
        let record = &mut self.records[index];
        record.reprice_from(&lines[index]);

        tracing::info!(
            order_no = %self.order_no,
            index,
            quantity = record.quantity,
            "order line edited"
        );
        Ok(record)
    }

    fn ensure_pending(&self) -> DomainResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::invariant(format!(
                "order {} is already {}",
                self.order_no, self.status
            )));
        }
        Ok(())
    }

    fn transition(&mut self, to: OrderStatus) -> DomainResult<()> {
        self.ensure_pending()?;

        for record in &mut self.records {
            record.status = to;
        }
        self.status = to;
        tracing::info!(order_no = %self.order_no, status = %to, "order reviewed");
        Ok(())
    }
}
