//! Value object trait: equality by value, not identity.
//!
//! Amounts, percentages, order numbers and tax splits are value objects: two
//! with the same attributes are interchangeable, and "changing" one means
//! computing a new one.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. They must be
/// cheap to clone and debuggable, since they show up in events and logs.
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct OrderNumber { /* ... */ }
///
/// impl ValueObject for OrderNumber {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
