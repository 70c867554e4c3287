//! Last-used order number persistence and the sequencer built on top of it.
//!
//! The counter lives in a key-value slot holding a small JSON document:
//! `{"date":"2025-11-05","orderNumber":"SQ-05-11-25-0004"}`. The store is
//! injected so the engine itself never touches storage.
//!
//! Read-then-write with no concurrency guard: two sessions committing on the
//! same day can hand out the same number.

use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use orderline_core::{DomainError, DomainResult};

use crate::numbering::{OrderNumber, OrderNumberFormat};

/// Persisted `{date, orderNumber}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterRecord {
    pub date: NaiveDate,
    pub order_number: String,
}

impl CounterRecord {
    pub fn new(date: NaiveDate, order_number: &OrderNumber) -> Self {
        Self {
            date,
            order_number: order_number.to_string(),
        }
    }

    pub fn from_json(raw: &str) -> DomainResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::format(format!("counter record: {e}")))
    }

    pub fn to_json(&self) -> DomainResult<String> {
        serde_json::to_string(self)
            .map_err(|e| DomainError::format(format!("counter record: {e}")))
    }
}

/// Durable slot for the last committed order number.
pub trait OrderCounterStore {
    /// `Ok(None)` when nothing was ever committed; `Err(Format)` when the slot
    /// holds something unreadable.
    fn get(&self) -> DomainResult<Option<CounterRecord>>;

    fn set(&self, record: CounterRecord) -> DomainResult<()>;
}

impl<S: OrderCounterStore + ?Sized> OrderCounterStore for &S {
    fn get(&self) -> DomainResult<Option<CounterRecord>> {
        (**self).get()
    }

    fn set(&self, record: CounterRecord) -> DomainResult<()> {
        (**self).set(record)
    }
}

/// In-memory counter slot for tests/dev.
///
/// Holds the raw JSON text, exactly like a browser storage key would, so a
/// corrupted slot can be simulated with [`InMemoryCounterStore::with_raw`].
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    slot: Mutex<Option<String>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn with_record(record: &CounterRecord) -> DomainResult<Self> {
        Ok(Self::with_raw(record.to_json()?))
    }

    /// Raw slot contents.
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl OrderCounterStore for InMemoryCounterStore {
    fn get(&self) -> DomainResult<Option<CounterRecord>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| DomainError::invariant("counter store lock poisoned"))?;
        slot.as_deref().map(CounterRecord::from_json).transpose()
    }

    fn set(&self, record: CounterRecord) -> DomainResult<()> {
        let json = record.to_json()?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| DomainError::invariant("counter store lock poisoned"))?;
        *slot = Some(json);
        Ok(())
    }
}

/// Hands out order numbers from a counter store.
#[derive(Debug)]
pub struct OrderSequencer<S> {
    store: S,
    format: OrderNumberFormat,
}

impl<S: OrderCounterStore> OrderSequencer<S> {
    pub fn new(store: S, format: OrderNumberFormat) -> Self {
        Self { store, format }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn format(&self) -> &OrderNumberFormat {
        &self.format
    }

    /// Number the next order placed on `today` will carry.
    ///
    /// Never fails: an unreadable slot or malformed last number falls back to
    /// the first number of the day, with a warning.
    pub fn peek(&self, today: NaiveDate) -> OrderNumber {
        let record = match self.store.get() {
            Ok(record) => record,
            Err(err) => {
                tracing::warn!(error = %err, "order counter unreadable; restarting sequence");
                None
            }
        };

        let Some(record) = record else {
            return self.format.first_of_day(today);
        };

        self.format
            .next(&record.order_number, record.date, today)
            .unwrap_or_else(|err| {
                tracing::warn!(
                    error = %err,
                    last_order_number = %record.order_number,
                    "malformed last order number; restarting sequence"
                );
                self.format.first_of_day(today)
            })
    }

    /// Persist `number` as the last order placed on `today`.
    pub fn commit(&self, number: &OrderNumber, today: NaiveDate) -> DomainResult<()> {
        self.store.set(CounterRecord::new(today, number))
    }
}
