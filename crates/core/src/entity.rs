//! Entity trait: identity + ownership.

use crate::id::OwnerId;

/// An entity that belongs to exactly one owner.
///
/// Stores use this to scope every read and write to the requesting owner.
pub trait OwnedEntity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Returns the owner the entity belongs to.
    fn owner_id(&self) -> OwnerId;

    /// Whether `owner` may see or mutate this entity.
    fn is_owned_by(&self, owner: OwnerId) -> bool {
        self.owner_id() == owner
    }
}
