//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// An order line is an entity: its amounts change as quantities and tax
/// treatment change, but it stays "the line for item X".
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
