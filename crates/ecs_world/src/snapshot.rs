//! Deep-copied, point-in-time captures of entity state.
//!
//! A [`Snapshot`] owns value-independent copies of the captured components;
//! later writes to the world never show up in it, and restoring copies the
//! values back out again, so one snapshot can be restored any number of
//! times.
//!
//! ## Capture
//!
//! Capture is all-or-nothing: if any requested entity is dead or holds no
//! components at all, [`World::capture`] returns `None`. With a filter, only
//! the listed components are copied, and entities holding none of them are
//! left out of the snapshot entirely.
//!
//! ## Restore
//!
//! - **Unfiltered snapshot (full replace):** each recorded entity ends up
//!   with exactly the captured components. Components added since capture
//!   are removed.
//! - **Filtered snapshot (overlay merge):** the captured components are
//!   written back and every other component is left alone.
//!
//! Entities despawned since capture are revived under their original id,
//! unless [`WorldConfig::revive_on_restore`](crate::WorldConfig) is off.
//! An entity whose captured values do not match the types registered in
//! the restoring world (a snapshot taken from another world) is skipped
//! untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use ecs_component::{Component, ComponentId, ComponentKey, ComponentMap, Entity};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::world::World;

/// A random, globally unique snapshot identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotId(pub Uuid);

impl SnapshotId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// An immutable capture of selected entities' components.
#[derive(Debug, Clone)]
pub struct Snapshot {
    id: SnapshotId,
    taken_at: SystemTime,
    entities: BTreeMap<Entity, ComponentMap>,
    filter: Option<Vec<ComponentKey>>,
}

impl Snapshot {
    /// Captures `entities` from `world`. See the [module docs](crate::snapshot).
    #[must_use]
    pub fn capture(
        world: &World,
        entities: impl IntoIterator<Item = Entity>,
        filter: Option<&[ComponentKey]>,
    ) -> Option<Self> {
        let mut captured = BTreeMap::new();
        for entity in entities {
            let components = match world.components(entity) {
                Some(components) if !components.is_empty() => components,
                _ => {
                    warn!(
                        world = %world.name(),
                        %entity,
                        "snapshot aborted: entity has no component state"
                    );
                    return None;
                }
            };

            let copy = match filter {
                Some(keys) => components.deep_clone_filtered(keys),
                None => components.deep_clone(),
            };
            if !copy.is_empty() {
                captured.insert(entity, copy);
            }
        }

        let snapshot = Self {
            id: SnapshotId::new(),
            taken_at: SystemTime::now(),
            entities: captured,
            filter: filter.map(<[ComponentKey]>::to_vec),
        };
        debug!(
            world = %world.name(),
            snapshot = %snapshot.id,
            entities = snapshot.entities.len(),
            filtered = snapshot.filter.is_some(),
            "captured snapshot"
        );
        Some(snapshot)
    }

    #[must_use]
    pub fn id(&self) -> SnapshotId {
        self.id
    }

    #[must_use]
    pub fn taken_at(&self) -> SystemTime {
        self.taken_at
    }

    /// The component filter used at capture, if any.
    #[must_use]
    pub fn filter(&self) -> Option<&[ComponentKey]> {
        self.filter.as_deref()
    }

    /// `true` for an unfiltered capture, which restores by full replace.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.filter.is_none()
    }

    /// Recorded entities, in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().copied()
    }

    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// The captured components of one entity.
    #[must_use]
    pub fn components(&self, entity: Entity) -> Option<&ComponentMap> {
        self.entities.get(&entity)
    }

    /// A captured value, read without restoring.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity, id: ComponentId<T>) -> Option<&T> {
        self.entities.get(&entity)?.get(id)
    }

    /// Number of recorded entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// What a [`World::restore`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreSummary {
    /// Entities whose components were written.
    pub restored: usize,
    /// Of those, entities brought back from despawned.
    pub revived: usize,
    /// Entities skipped because they were dead and could not be revived.
    pub skipped: usize,
}

impl World {
    /// Captures a snapshot of `entities`. Returns `None` if any of them has
    /// no component state.
    #[must_use]
    pub fn capture(
        &self,
        entities: impl IntoIterator<Item = Entity>,
        filter: Option<&[ComponentKey]>,
    ) -> Option<Snapshot> {
        Snapshot::capture(self, entities, filter)
    }

    /// Writes a snapshot back into the world. See the [snapshot module
    /// docs](crate::snapshot) for the full-replace / overlay-merge policy.
    pub fn restore(&mut self, snapshot: &Snapshot) -> RestoreSummary {
        let mut summary = RestoreSummary::default();
        let revive = self.config().revive_on_restore;

        for (entity, captured) in &snapshot.entities {
            let entity = *entity;
            if !self.accepts_all(captured) {
                warn!(
                    world = %self.name(),
                    snapshot = %snapshot.id,
                    %entity,
                    "restore skipped entity: captured values do not match registered types"
                );
                summary.skipped += 1;
                continue;
            }
            if !self.is_alive(entity) {
                if revive && self.revive(entity) {
                    summary.revived += 1;
                } else {
                    summary.skipped += 1;
                    continue;
                }
            }
            let Some(live) = self.components_mut(entity) else {
                summary.skipped += 1;
                continue;
            };

            if snapshot.is_full() {
                *live = captured.deep_clone();
            } else {
                for (key, value) in captured.iter() {
                    live.insert_boxed(key, value.clone_value());
                }
            }
            summary.restored += 1;
        }

        debug!(
            world = %self.name(),
            snapshot = %snapshot.id,
            restored = summary.restored,
            revived = summary.revived,
            skipped = summary.skipped,
            "restored snapshot"
        );
        summary
    }

    /// Whether every captured value has the type this world registered
    /// under its key.
    fn accepts_all(&self, captured: &ComponentMap) -> bool {
        captured
            .iter()
            .all(|(key, value)| self.registry().accepts(key, value.value_type_id()))
    }
}
