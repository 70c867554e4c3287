//! `OrderLineEngine`: the order-entry session driving an [`OrderDraft`].
//!
//! Every mutating call goes through the draft's `handle`/`apply`. A rejected
//! call leaves the draft untouched, returns the error and queues an error
//! notice for the UI; the engine itself never performs I/O beyond the injected
//! counter store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderline_core::{Aggregate, AggregateRoot, DomainError, DomainResult, DraftId, Event, Percent};

use crate::config::EngineConfig;
use crate::counter::{OrderCounterStore, OrderSequencer};
use crate::draft::{DraftCommand, DraftEvent, DraftRules, OrderDraft};
use crate::line::{LineDetails, LineDiscount, LineItem};
use crate::master::{CustomerMaster, ItemMaster};
use crate::numbering::OrderNumber;
use crate::record::{OrderRecord, SessionContext, build_records};
use crate::tax::missing_state_warning;
use crate::totals::OrderTotals;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// User-facing message produced by an engine call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// A submitted order, ready to be posted by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub order_number: OrderNumber,
    pub order_date: NaiveDate,
    pub totals: OrderTotals,
    pub records: Vec<OrderRecord>,
}

/// Parse a quantity typed into the grid.
///
/// `Ok(None)` for blank input. Anything but ASCII digits (signs, separators,
/// decimal points) is a validation error, as is a value beyond `u32`.
pub fn parse_quantity(raw: &str) -> DomainResult<Option<u32>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let invalid = || DomainError::validation(format!("invalid quantity: {raw:?}"));

    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    trimmed.parse::<u32>().map(Some).map_err(|_| invalid())
}

pub struct OrderLineEngine<S> {
    draft: OrderDraft,
    sequencer: OrderSequencer<S>,
    session: SessionContext,
    notices: Vec<Notice>,
}

impl<S: OrderCounterStore> OrderLineEngine<S> {
    /// Open an order-entry session for `today`.
    ///
    /// The order number comes from the counter store; distributor sessions
    /// start with their own account selected as the customer.
    pub fn open(config: &EngineConfig, store: S, session: SessionContext, today: NaiveDate) -> Self {
        let sequencer = OrderSequencer::new(store, config.order_number_format());
        let order_number = sequencer.peek(today);
        let draft = OrderDraft::open(DraftId::new(), DraftRules::from(config), order_number, today);

        tracing::debug!(
            draft_id = %draft.id(),
            order_no = %draft.order_number(),
            channel = ?session.channel,
            "order draft opened"
        );

        let mut engine = Self {
            draft,
            sequencer,
            session,
            notices: Vec::new(),
        };
        engine.select_own_account();
        engine
    }

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn order_number(&self) -> &OrderNumber {
        self.draft.order_number()
    }

    pub fn lines(&self) -> &[LineItem] {
        self.draft.lines()
    }

    pub fn pending_line(&self) -> Option<&LineItem> {
        self.draft.pending()
    }

    pub fn counter_store(&self) -> &S {
        self.sequencer.store()
    }

    /// Take the notices queued since the last call.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Add `quantity` of `item`, merging with an existing line for the same
    /// item unless the configured policy is `Append`. Returns the resulting line.
    pub fn add_line(&mut self, item: &ItemMaster, quantity: u32) -> DomainResult<LineItem> {
        self.add_line_with(item, quantity, LineDetails::default())
    }

    pub fn add_line_with(
        &mut self,
        item: &ItemMaster,
        quantity: u32,
        details: LineDetails,
    ) -> DomainResult<LineItem> {
        let events = self.run(DraftCommand::AddLine {
            item: item.clone(),
            quantity,
            details,
        })?;

        let index = events
            .iter()
            .find_map(|event| match event {
                DraftEvent::LineMerged { index, .. } => Some(*index),
                DraftEvent::LineAdded { .. } => Some(self.draft.lines().len() - 1),
                _ => None,
            })
            .ok_or_else(|| DomainError::invariant("add_line produced no line"))?;

        let merged = events
            .iter()
            .any(|event| matches!(event, DraftEvent::LineMerged { .. }));
        if merged {
            self.notices.push(Notice::warning(
                "Entered product already there; added with previous quantity",
            ));
        } else {
            self.notices.push(Notice::info("Item added successfully"));
        }

        self.draft
            .line(index)
            .cloned()
            .ok_or_else(|| DomainError::invariant("added line missing"))
    }

    /// Add the staged pending line (see [`OrderLineEngine::edit_pending_line`]).
    pub fn commit_pending_line(&mut self) -> DomainResult<LineItem> {
        let Some(pending) = self.draft.pending().cloned() else {
            let err = DomainError::validation("item not selected");
            self.notices.push(Notice::error(err.to_string()));
            return Err(err);
        };

        let item = ItemMaster {
            item_code: pending.item_code().to_string(),
            name: pending.item_name().to_string(),
            rate: pending.rate(),
            tax_rate_percent: pending.tax_rate_percent(),
            hsn_code: pending.hsn_code().to_string(),
            unit_of_measure: Some(pending.unit_of_measure().to_string()),
        };
        self.add_line_with(&item, pending.quantity(), pending.details().clone())
    }

    /// Stage the line being edited so its amounts are previewed (and follow
    /// customer state changes) before it is added.
    pub fn edit_pending_line(
        &mut self,
        item: &ItemMaster,
        quantity: u32,
        details: LineDetails,
    ) -> DomainResult<&LineItem> {
        self.run(DraftCommand::StagePendingLine {
            item: item.clone(),
            quantity,
            details,
        })?;
        self.draft
            .pending()
            .ok_or_else(|| DomainError::invariant("pending line missing"))
    }

    pub fn clear_pending_line(&mut self) {
        // ClearPendingLine never fails.
        let _ = self.run(DraftCommand::ClearPendingLine);
    }

    /// Remove the line at `index`; out-of-range indices are ignored.
    pub fn remove_line(&mut self, index: usize) {
        if let Ok(events) = self.run(DraftCommand::RemoveLine { index }) {
            if !events.is_empty() {
                self.notices.push(Notice::info("Item removed from order"));
            }
        }
    }

    /// Update a line's quantity from raw grid input.
    ///
    /// Blank input zeroes the line. Non-numeric, fractional or negative input
    /// is rejected and the line keeps its previous values.
    pub fn update_quantity(&mut self, index: usize, raw: &str) -> DomainResult<LineItem> {
        let quantity = match parse_quantity(raw) {
            Ok(quantity) => quantity.unwrap_or(0),
            Err(err) => {
                tracing::debug!(index, input = raw, "quantity update rejected");
                self.notices.push(Notice::error(err.to_string()));
                return Err(err);
            }
        };

        self.run(DraftCommand::UpdateQuantity { index, quantity })?;
        self.draft
            .line(index)
            .cloned()
            .ok_or_else(|| DomainError::invariant("updated line missing"))
    }

    /// Apply trade and special discount percentages to a line.
    pub fn set_line_discount(
        &mut self,
        index: usize,
        percent: Percent,
        special_percent: Percent,
    ) -> DomainResult<LineItem> {
        self.run(DraftCommand::SetLineDiscount {
            index,
            discount: LineDiscount::new(percent, special_percent),
        })?;
        self.draft
            .line(index)
            .cloned()
            .ok_or_else(|| DomainError::invariant("discounted line missing"))
    }

    /// Set the customer's state and re-tax every line, including the pending one.
    pub fn set_customer_state(&mut self, state: &str) {
        // SetCustomerState never fails; an unknown state only warns.
        let _ = self.run(DraftCommand::SetCustomerState {
            state: state.to_string(),
        });
    }

    /// Select a customer; its state decides the tax treatment.
    pub fn select_customer(&mut self, customer: &CustomerMaster) {
        let _ = self.run(DraftCommand::SelectCustomer {
            customer: customer.clone(),
        });
    }

    pub fn set_remarks(&mut self, remarks: &str) {
        let _ = self.run(DraftCommand::SetRemarks {
            remarks: remarks.to_string(),
        });
    }

    /// Totals over the current lines. Pure; safe to call at any time.
    pub fn compute_totals(&self) -> OrderTotals {
        self.draft.totals()
    }

    /// Move a draft opened on an earlier day to `today`: it takes today's
    /// next order number and keeps its lines.
    pub fn roll_date(&mut self, today: NaiveDate) {
        let order_number = self.sequencer.peek(today);
        if let Ok(events) = self.run(DraftCommand::Renumber {
            order_number,
            order_date: today,
        }) {
            if !events.is_empty() {
                tracing::info!(order_no = %self.draft.order_number(), %today, "order draft moved to a new day");
            }
        }
    }

    /// [`OrderLineEngine::submit`] as of `today`; a session left open past
    /// midnight submits under the new day's date and number.
    pub fn submit_on(&mut self, today: NaiveDate) -> DomainResult<Submission> {
        self.roll_date(today);
        self.submit()
    }

    /// Turn the draft into persistence records, consume its order number and
    /// start a fresh draft on the draft's order date.
    ///
    /// The draft is left untouched when it has no lines, when no customer is
    /// selected on a channel that needs one, or when the counter store
    /// rejects the write.
    pub fn submit(&mut self) -> DomainResult<Submission> {
        match self.prepare_submission() {
            Ok(submission) => {
                tracing::info!(
                    order_no = %submission.order_number,
                    lines = submission.records.len(),
                    total_payable = %submission.totals.total_payable,
                    "order submitted"
                );
                self.notices
                    .push(Notice::info("Order placed and waiting for approval"));
                self.reset(submission.order_date);
                Ok(submission)
            }
            Err(err) => {
                tracing::warn!(error = %err, order_no = %self.draft.order_number(), "order submission rejected");
                self.notices.push(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Discard the draft without consuming its order number.
    pub fn cancel(&mut self) {
        self.cancel_on(self.draft.order_date());
    }

    /// Discard the draft and start the next one dated `today`.
    pub fn cancel_on(&mut self, today: NaiveDate) {
        tracing::debug!(order_no = %self.draft.order_number(), "order draft cancelled");
        self.reset(today);
    }

    fn prepare_submission(&self) -> DomainResult<Submission> {
        if self.draft.is_empty() {
            return Err(DomainError::validation(
                "no items in the order; add items before submitting",
            ));
        }

        let customer = match self.draft.customer() {
            Some(customer) => customer.clone(),
            None if !self.session.channel.requires_customer_selection() => {
                self.session.own_account()
            }
            None => return Err(DomainError::validation("please select a customer")),
        };

        let submission = Submission {
            order_number: self.draft.order_number().clone(),
            order_date: self.draft.order_date(),
            totals: self.draft.totals().rounded(),
            records: build_records(&self.draft, &self.session, &customer),
        };

        self.sequencer
            .commit(&submission.order_number, submission.order_date)?;
        Ok(submission)
    }

    fn reset(&mut self, order_date: NaiveDate) {
        let order_number = self.sequencer.peek(order_date);
        let _ = self.run(DraftCommand::Reset {
            order_number,
            order_date,
        });
        self.select_own_account();
    }

    fn select_own_account(&mut self) {
        if !self.session.channel.requires_customer_selection() {
            let account = self.session.own_account();
            let _ = self.run(DraftCommand::SelectCustomer { customer: account });
        }
    }

    fn run(&mut self, command: DraftCommand) -> DomainResult<Vec<DraftEvent>> {
        match self.draft.execute(&command) {
            Ok(events) => {
                for event in &events {
                    tracing::debug!(
                        event = event.event_type(),
                        version = self.draft.version(),
                        "draft event applied"
                    );
                    self.note_state_warning(event);
                }
                Ok(events)
            }
            Err(err) => {
                tracing::debug!(error = %err, "draft command rejected");
                self.notices.push(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    fn note_state_warning(&mut self, event: &DraftEvent) {
        let missing = matches!(
            event,
            DraftEvent::CustomerSelected {
                state_missing: true,
                ..
            } | DraftEvent::CustomerStateChanged {
                state_missing: true,
                ..
            }
        );
        if missing {
            let warning = missing_state_warning();
            tracing::warn!(order_no = %self.draft.order_number(), "{warning}");
            self.notices.push(Notice::warning(warning.to_string()));
        }
    }
}
