//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Catalog items are entities: an item keeps its identity while it moves from
/// the pending list to the matched list.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
