use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderline_core::{Aggregate, AggregateRoot, DomainError, DomainResult, DraftId, Entity, Event};

use crate::config::{DuplicatePolicy, EngineConfig};
use crate::line::{LineDetails, LineDiscount, LineItem};
use crate::master::{CustomerMaster, ItemMaster};
use crate::numbering::OrderNumber;
use crate::tax::{StateClassifier, TaxRegion};
use crate::totals::OrderTotals;

/// Rules a draft is opened with; fixed for the draft's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftRules {
    pub duplicate_policy: DuplicatePolicy,
    pub classifier: StateClassifier,
    pub default_unit_of_measure: String,
    /// Discount given to every line that is added or merged.
    pub default_discount: LineDiscount,
}

impl From<&EngineConfig> for DraftRules {
    fn from(config: &EngineConfig) -> Self {
        Self {
            duplicate_policy: config.duplicate_policy,
            classifier: config.state_classifier(),
            default_unit_of_measure: config.default_unit_of_measure.clone(),
            default_discount: config.default_discount,
        }
    }
}

impl Default for DraftRules {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

/// Aggregate root: the order being entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    id: DraftId,
    rules: DraftRules,
    order_number: OrderNumber,
    order_date: NaiveDate,
    customer: Option<CustomerMaster>,
    customer_state: String,
    region: TaxRegion,
    lines: Vec<LineItem>,
    pending: Option<LineItem>,
    remarks: String,
    version: u64,
}

impl OrderDraft {
    /// Open an empty draft. With no customer state yet, lines are taxed
    /// inter-state until one is set.
    pub fn open(
        id: DraftId,
        rules: DraftRules,
        order_number: OrderNumber,
        order_date: NaiveDate,
    ) -> Self {
        Self {
            id,
            rules,
            order_number,
            order_date,
            customer: None,
            customer_state: String::new(),
            region: TaxRegion::InterState,
            lines: Vec::new(),
            pending: None,
            remarks: String::new(),
            version: 0,
        }
    }

    pub fn rules(&self) -> &DraftRules {
        &self.rules
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn order_date(&self) -> NaiveDate {
        self.order_date
    }

    pub fn customer(&self) -> Option<&CustomerMaster> {
        self.customer.as_ref()
    }

    pub fn customer_state(&self) -> &str {
        &self.customer_state
    }

    pub fn region(&self) -> TaxRegion {
        self.region
    }

    /// Lines in entry order.
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&LineItem> {
        self.lines.get(index)
    }

    /// The line being edited but not yet added.
    pub fn pending(&self) -> Option<&LineItem> {
        self.pending.as_ref()
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn totals(&self) -> OrderTotals {
        OrderTotals::from_lines(&self.lines)
    }

    fn position_of(&self, item: &ItemMaster) -> Option<usize> {
        let code = item.item_code.trim();
        self.lines
            .iter()
            .position(|line| line.id().as_str() == code)
    }

    fn existing_line(&self, index: usize) -> DomainResult<&LineItem> {
        self.lines.get(index).ok_or_else(DomainError::not_found)
    }

    /// The line at `index` repriced, provided the order totals still fit.
    fn repriced(
        &self,
        index: usize,
        quantity: u32,
        discount: LineDiscount,
    ) -> DomainResult<LineItem> {
        let mut line = self.existing_line(index)?.clone();
        line.reprice(quantity, discount, self.region)?;
        self.ensure_totals_with(Some(index), &line)?;
        Ok(line)
    }

    /// Check the totals with `line` in place of `replacing` (or appended).
    fn ensure_totals_with(&self, replacing: Option<usize>, line: &LineItem) -> DomainResult<()> {
        let others = self
            .lines
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != replacing)
            .map(|(_, other)| other);
        OrderTotals::try_from_lines(others.chain(std::iter::once(line)))?;
        Ok(())
    }

    fn recompute_all(&mut self) {
        let region = self.region;
        // Switching region keeps the GST amount, so a line that priced once
        // reprices; on failure it keeps its previous split.
        for line in self.lines.iter_mut().chain(self.pending.as_mut()) {
            let _ = line.recompute(region);
        }
    }
}

impl AggregateRoot for OrderDraft {
    type Id = DraftId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftCommand {
    AddLine {
        item: ItemMaster,
        quantity: u32,
        details: LineDetails,
    },
    RemoveLine {
        index: usize,
    },
    UpdateQuantity {
        index: usize,
        quantity: u32,
    },
    SetLineDiscount {
        index: usize,
        discount: LineDiscount,
    },
    SelectCustomer {
        customer: CustomerMaster,
    },
    SetCustomerState {
        state: String,
    },
    /// Stage the line currently being edited; the quantity may still be zero.
    StagePendingLine {
        item: ItemMaster,
        quantity: u32,
        details: LineDetails,
    },
    ClearPendingLine,
    SetRemarks {
        remarks: String,
    },
    /// Move the draft to another order date and number, keeping its lines.
    Renumber {
        order_number: OrderNumber,
        order_date: NaiveDate,
    },
    Reset {
        order_number: OrderNumber,
        order_date: NaiveDate,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftEvent {
    LineAdded {
        line: LineItem,
    },
    /// A duplicate item was merged; `quantity` is the line's new total.
    LineMerged {
        index: usize,
        quantity: u32,
    },
    LineRemoved {
        index: usize,
    },
    QuantityUpdated {
        index: usize,
        quantity: u32,
    },
    LineDiscountSet {
        index: usize,
        discount: LineDiscount,
    },
    CustomerSelected {
        customer: CustomerMaster,
        region: TaxRegion,
        state_missing: bool,
    },
    CustomerStateChanged {
        state: String,
        region: TaxRegion,
        state_missing: bool,
    },
    PendingLineStaged {
        line: LineItem,
    },
    PendingLineCleared,
    RemarksSet {
        remarks: String,
    },
    DraftRenumbered {
        order_number: OrderNumber,
        order_date: NaiveDate,
    },
    DraftReset {
        order_number: OrderNumber,
        order_date: NaiveDate,
    },
}

impl Event for DraftEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DraftEvent::LineAdded { .. } => "orders.draft.line_added",
            DraftEvent::LineMerged { .. } => "orders.draft.line_merged",
            DraftEvent::LineRemoved { .. } => "orders.draft.line_removed",
            DraftEvent::QuantityUpdated { .. } => "orders.draft.quantity_updated",
            DraftEvent::LineDiscountSet { .. } => "orders.draft.line_discount_set",
            DraftEvent::CustomerSelected { .. } => "orders.draft.customer_selected",
            DraftEvent::CustomerStateChanged { .. } => "orders.draft.customer_state_changed",
            DraftEvent::PendingLineStaged { .. } => "orders.draft.pending_line_staged",
            DraftEvent::PendingLineCleared => "orders.draft.pending_line_cleared",
            DraftEvent::RemarksSet { .. } => "orders.draft.remarks_set",
            DraftEvent::DraftRenumbered { .. } => "orders.draft.renumbered",
            DraftEvent::DraftReset { .. } => "orders.draft.reset",
        }
    }

    fn version(&self) -> u32 {
        1
    }
}

impl Aggregate for OrderDraft {
    type Command = DraftCommand;
    type Event = DraftEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            DraftEvent::LineAdded { line } => {
                self.lines.push(line.clone());
            }
            DraftEvent::LineMerged { index, quantity }
            | DraftEvent::QuantityUpdated { index, quantity } => {
                let region = self.region;
                if let Some(line) = self.lines.get_mut(*index) {
                    // Checked in `handle`; a failed reprice leaves the line as it was.
                    let _ = line.set_quantity(*quantity, region);
                }
            }
            DraftEvent::LineRemoved { index } => {
                if *index < self.lines.len() {
                    self.lines.remove(*index);
                }
            }
            DraftEvent::LineDiscountSet { index, discount } => {
                let region = self.region;
                if let Some(line) = self.lines.get_mut(*index) {
                    let _ = line.set_discount(*discount, region);
                }
            }
            DraftEvent::CustomerSelected {
                customer, region, ..
            } => {
                self.customer_state = customer.state.clone();
                self.customer = Some(customer.clone());
                self.region = *region;
                self.recompute_all();
            }
            DraftEvent::CustomerStateChanged { state, region, .. } => {
                self.customer_state = state.clone();
                self.region = *region;
                self.recompute_all();
            }
            DraftEvent::PendingLineStaged { line } => {
                self.pending = Some(line.clone());
            }
            DraftEvent::PendingLineCleared => {
                self.pending = None;
            }
            DraftEvent::RemarksSet { remarks } => {
                self.remarks = remarks.clone();
            }
            DraftEvent::DraftRenumbered {
                order_number,
                order_date,
            } => {
                self.order_number = order_number.clone();
                self.order_date = *order_date;
            }
            DraftEvent::DraftReset {
                order_number,
                order_date,
            } => {
                self.order_number = order_number.clone();
                self.order_date = *order_date;
                self.customer = None;
                self.customer_state.clear();
                self.region = TaxRegion::InterState;
                self.lines.clear();
                self.pending = None;
                self.remarks.clear();
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DraftCommand::AddLine {
                item,
                quantity,
                details,
            } => self.handle_add_line(item, *quantity, details),
            DraftCommand::RemoveLine { index } => {
                // Out-of-range removal is a silent no-op.
                if *index < self.lines.len() {
                    Ok(vec![DraftEvent::LineRemoved { index: *index }])
                } else {
                    Ok(Vec::new())
                }
            }
            DraftCommand::UpdateQuantity { index, quantity } => {
                let discount = self.existing_line(*index)?.discount();
                self.repriced(*index, *quantity, discount)?;
                Ok(vec![DraftEvent::QuantityUpdated {
                    index: *index,
                    quantity: *quantity,
                }])
            }
            DraftCommand::SetLineDiscount { index, discount } => {
                let quantity = self.existing_line(*index)?.quantity();
                self.repriced(*index, quantity, *discount)?;
                Ok(vec![DraftEvent::LineDiscountSet {
                    index: *index,
                    discount: *discount,
                }])
            }
            DraftCommand::SelectCustomer { customer } => {
                let classification = self.rules.classifier.classify(&customer.state);
                Ok(vec![DraftEvent::CustomerSelected {
                    customer: customer.clone(),
                    region: classification.region,
                    state_missing: classification.state_missing,
                }])
            }
            DraftCommand::SetCustomerState { state } => {
                let classification = self.rules.classifier.classify(state);
                Ok(vec![DraftEvent::CustomerStateChanged {
                    state: state.trim().to_string(),
                    region: classification.region,
                    state_missing: classification.state_missing,
                }])
            }
            DraftCommand::StagePendingLine {
                item,
                quantity,
                details,
            } => {
                let line = LineItem::staged(
                    item,
                    *quantity,
                    details.clone(),
                    self.region,
                    &self.rules.default_unit_of_measure,
                )?;
                Ok(vec![DraftEvent::PendingLineStaged { line }])
            }
            DraftCommand::ClearPendingLine => {
                if self.pending.is_some() {
                    Ok(vec![DraftEvent::PendingLineCleared])
                } else {
                    Ok(Vec::new())
                }
            }
            DraftCommand::SetRemarks { remarks } => Ok(vec![DraftEvent::RemarksSet {
                remarks: remarks.clone(),
            }]),
            DraftCommand::Renumber {
                order_number,
                order_date,
            } => {
                if *order_date == self.order_date && order_number == &self.order_number {
                    return Ok(Vec::new());
                }
                Ok(vec![DraftEvent::DraftRenumbered {
                    order_number: order_number.clone(),
                    order_date: *order_date,
                }])
            }
            DraftCommand::Reset {
                order_number,
                order_date,
            } => Ok(vec![DraftEvent::DraftReset {
                order_number: order_number.clone(),
                order_date: *order_date,
            }]),
        }
    }
}

impl OrderDraft {
    fn handle_add_line(
        &self,
        item: &ItemMaster,
        quantity: u32,
        details: &LineDetails,
    ) -> DomainResult<Vec<DraftEvent>> {
        item.code()?;
        if quantity == 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        details.validate(self.order_date)?;

        let mut events = Vec::with_capacity(3);
        let default_discount = self.rules.default_discount;

        let existing = match self.rules.duplicate_policy {
            DuplicatePolicy::Merge => self.position_of(item),
            DuplicatePolicy::Append => None,
        };

        match existing {
            Some(index) => {
                let line = &self.lines[index];
                let merged = line
                    .quantity()
                    .checked_add(quantity)
                    .ok_or_else(|| DomainError::validation("merged quantity too large"))?;
                let discount = if default_discount.is_none() {
                    line.discount()
                } else {
                    default_discount
                };
                self.repriced(index, merged, discount)?;

                // Discount first: the line never holds more than the merged amounts.
                if discount != line.discount() {
                    events.push(DraftEvent::LineDiscountSet { index, discount });
                }
                events.push(DraftEvent::LineMerged {
                    index,
                    quantity: merged,
                });
            }
            None => {
                let mut line = LineItem::from_item(
                    item,
                    quantity,
                    details.clone(),
                    self.region,
                    &self.rules.default_unit_of_measure,
                )?;
                if !default_discount.is_none() {
                    line.set_discount(default_discount, self.region)?;
                }
                self.ensure_totals_with(None, &line)?;
                events.push(DraftEvent::LineAdded { line });
            }
        }

        if self.pending.is_some() {
            events.push(DraftEvent::PendingLineCleared);
        }

        Ok(events)
    }
}
