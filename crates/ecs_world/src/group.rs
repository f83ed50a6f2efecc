//! Named entity collections with a shared overlay map.
//!
//! A [`Group`] keeps its own member set and its own [`ComponentMap`] of
//! values shared by the whole group. Overlay values are never written into
//! member entities; callers that want that must copy them explicitly.
//!
//! Membership changes fire [`Group::on_added`] / [`Group::on_removed`]
//! exactly once per actual change. Redundant adds and removes fire nothing.

use std::collections::BTreeSet;
use std::fmt;

use ecs_component::{Component, ComponentId, ComponentKey, ComponentMap, Entity};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::event::Event;
use crate::world::World;

/// A world-unique group identifier, issued by
/// [`World::create_group`](crate::World::create_group).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Group({})", self.0)
    }
}

/// A named set of entities plus group-level component values.
///
/// Groups are created by [`World::create_group`](crate::World::create_group)
/// and owned by the caller; membership is not updated on despawn until
/// [`Group::retain_alive`] is called.
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    name: String,
    members: BTreeSet<Entity>,
    overlay: ComponentMap,
    added: Event<Entity>,
    removed: Event<Entity>,
}

impl Group {
    pub(crate) fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            members: BTreeSet::new(),
            overlay: ComponentMap::new(),
            added: Event::new(),
            removed: Event::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // -- Membership --

    /// Adds `entity`, firing "added" if it was not already a member.
    pub fn add_entity(&mut self, entity: Entity) -> bool {
        if !self.members.insert(entity) {
            return false;
        }
        trace!(group = %self.name, %entity, "entity added to group");
        self.added.fire(&entity);
        true
    }

    /// Removes `entity`, firing "removed" if it was a member.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        if !self.members.remove(&entity) {
            return false;
        }
        trace!(group = %self.name, %entity, "entity removed from group");
        self.removed.fire(&entity);
        true
    }

    #[must_use]
    pub fn has_entity(&self, entity: Entity) -> bool {
        self.members.contains(&entity)
    }

    /// A copy of the current members, in ascending order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.members.iter().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Removes every member that is no longer alive in `world`, firing
    /// "removed" for each. Returns how many were removed.
    pub fn retain_alive(&mut self, world: &World) -> usize {
        let dead: Vec<Entity> = self
            .members
            .iter()
            .copied()
            .filter(|entity| !world.is_alive(*entity))
            .collect();
        for entity in &dead {
            self.remove_entity(*entity);
        }
        dead.len()
    }

    /// Membership "added" notifications. Callbacks receive the entity.
    pub fn on_added(&mut self) -> &mut Event<Entity> {
        &mut self.added
    }

    /// Membership "removed" notifications. Callbacks receive the entity.
    pub fn on_removed(&mut self) -> &mut Event<Entity> {
        &mut self.removed
    }

    // -- Overlay --

    /// Sets a group-level value, returning the previous one.
    pub fn set<T: Component>(&mut self, id: ComponentId<T>, value: T) -> Option<T> {
        self.overlay.insert(id, value)
    }

    #[must_use]
    pub fn get<T: Component>(&self, id: ComponentId<T>) -> Option<&T> {
        self.overlay.get(id)
    }

    #[must_use]
    pub fn get_mut<T: Component>(&mut self, id: ComponentId<T>) -> Option<&mut T> {
        self.overlay.get_mut(id)
    }

    #[must_use]
    pub fn has(&self, component: impl Into<ComponentKey>) -> bool {
        self.overlay.contains(component.into())
    }

    /// Removes a group-level value, returning whether it was present.
    pub fn remove(&mut self, component: impl Into<ComponentKey>) -> bool {
        self.overlay.remove(component.into())
    }

    #[must_use]
    pub fn overlay(&self) -> &ComponentMap {
        &self.overlay
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn log_events(group: &mut Group) -> (Arc<Mutex<Vec<Entity>>>, Arc<Mutex<Vec<Entity>>>) {
        let added = Arc::new(Mutex::new(Vec::new()));
        let removed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&added);
        group
            .on_added()
            .connect(move |e: &Entity| sink.lock().unwrap().push(*e));
        let sink = Arc::clone(&removed);
        group
            .on_removed()
            .connect(move |e: &Entity| sink.lock().unwrap().push(*e));
        (added, removed)
    }

    #[test]
    fn test_double_add_fires_once() {
        let mut world = World::new();
        let mut group = world.create_group("squad");
        let (added, _) = log_events(&mut group);
        let e = world.spawn();
        assert!(group.add_entity(e));
        assert!(!group.add_entity(e));
        assert_eq!(*added.lock().unwrap(), vec![e]);
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn test_remove_non_member_fires_nothing() {
        let mut world = World::new();
        let mut group = world.create_group("squad");
        let (_, removed) = log_events(&mut group);
        let e = world.spawn();
        assert!(!group.remove_entity(e));
        assert!(removed.lock().unwrap().is_empty());

        group.add_entity(e);
        assert!(group.remove_entity(e));
        assert!(!group.remove_entity(e));
        assert_eq!(*removed.lock().unwrap(), vec![e]);
    }

    #[test]
    fn test_entities_is_a_copy() {
        let mut world = World::new();
        let mut group = world.create_group("squad");
        let a = world.spawn();
        let b = world.spawn();
        group.add_entity(b);
        group.add_entity(a);
        let snapshot = group.entities();
        group.remove_entity(a);
        assert_eq!(snapshot, vec![a, b]);
        assert_eq!(group.entities(), vec![b]);
        assert!(group.has_entity(b));
        assert!(!group.has_entity(a));
    }

    #[test]
    fn test_overlay_is_separate_from_entities() {
        let mut world = World::new();
        let team = world.register::<String>("Team").unwrap();
        let mut group = world.create_group("red");
        let e = world.spawn();
        group.add_entity(e);

        assert!(group.set(team, "red".to_string()).is_none());
        assert_eq!(group.get(team).map(String::as_str), Some("red"));
        assert!(group.has(team));
        assert!(!world.has(e, team));
        assert!(world.get(e, team).is_none());

        group.get_mut(team).unwrap().push_str("-alpha");
        assert_eq!(group.overlay().get(team).unwrap(), "red-alpha");
        assert!(group.remove(team));
        assert!(!group.has(team));
        assert!(!group.remove(team));
    }

    #[test]
    fn test_retain_alive_drops_despawned_members() {
        let mut world = World::new();
        let mut group = world.create_group("squad");
        let (_, removed) = log_events(&mut group);
        let a = world.spawn();
        let b = world.spawn();
        group.add_entity(a);
        group.add_entity(b);
        world.despawn(a);
        assert_eq!(group.retain_alive(&world), 1);
        assert_eq!(group.entities(), vec![b]);
        assert_eq!(*removed.lock().unwrap(), vec![a]);
    }

    #[test]
    fn test_group_identity() {
        let mut world = World::new();
        let group = world.create_group("blue");
        assert_eq!(group.name(), "blue");
        assert_eq!(group.id().to_string(), "Group(1)");
    }
}
