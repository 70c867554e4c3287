//! `orderline-core` - domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the error model, aggregate/event traits, typed identifiers and the decimal
//! helpers every amount in an order flows through.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod event;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use event::Event;
pub use id::DraftId;
pub use money::{Percent, round_currency};
pub use value_object::ValueObject;
