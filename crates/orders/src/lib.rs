//! Order line-item entry (deterministic domain logic).
//!
//! This crate turns item and customer master data into priced, taxed order
//! lines, keeps running totals, numbers orders per day and flattens a
//! submitted draft into persistence records. It performs no IO beyond the
//! injected [`OrderCounterStore`].

pub mod config;
pub mod counter;
pub mod draft;
pub mod engine;
pub mod focus;
pub mod line;
pub mod master;
pub mod numbering;
pub mod record;
pub mod review;
pub mod tax;
pub mod totals;

pub use config::{DEFAULT_UNIT_OF_MEASURE, DuplicatePolicy, EngineConfig};
pub use counter::{CounterRecord, InMemoryCounterStore, OrderCounterStore, OrderSequencer};
pub use draft::{DraftCommand, DraftEvent, DraftRules, OrderDraft};
pub use engine::{Notice, NoticeLevel, OrderLineEngine, Submission, parse_quantity};
pub use focus::{Cell, GridFocus, GridKey};
pub use line::{LineDetails, LineDiscount, LineItem};
pub use master::{CustomerMaster, ItemCode, ItemMaster};
pub use numbering::{OrderNumber, OrderNumberFormat, next_order_number};
pub use record::{OrderChannel, OrderRecord, OrderStatus, SessionContext, build_records};
pub use review::OrderReview;
pub use tax::{StateClassification, StateClassifier, TaxRegion, TaxSplit};
pub use totals::OrderTotals;
