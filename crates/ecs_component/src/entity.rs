//! Entity identifiers and the per-world id allocator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one entity inside a single world.
///
/// An entity has no data of its own; it is the key its components hang off.
/// Ids from different worlds are unrelated even when the numbers coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// Never returned by an allocator.
    pub const INVALID: Entity = Entity(0);

    /// Wraps a raw id, e.g. one read back from a log or save file.
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// The raw `u64` behind this entity.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// `false` only for [`Entity::INVALID`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Hands out entity ids for one world, starting at 1.
///
/// Ids are never reused. A despawned id stays retired, which is what lets a
/// snapshot bring an entity back under its old id without colliding with a
/// newer one.
#[derive(Debug)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    /// A fresh allocator whose first id is 1.
    #[must_use]
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Hands out the next unused id.
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next += 1;
        entity
    }

    /// Whether `entity` has ever come out of this allocator.
    #[must_use]
    pub fn was_allocated(&self, entity: Entity) -> bool {
        entity.is_valid() && entity.0 < self.next
    }

    /// Number of ids handed out so far, live or not.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.next - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
