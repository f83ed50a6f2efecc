//! Reusable component templates.
//!
//! A [`Prefab`] is an ordered list of (component, value) pairs. Spawning
//! applies the pairs in order, then any overrides in order, so a later pair
//! for the same component wins.

use std::fmt;

use ecs_component::{Component, ComponentId, ComponentKey, ComponentValue, Entity};
use tracing::debug;

use crate::error::WorldError;
use crate::world::World;

/// An ordered list of (component, value) pairs to stamp onto new entities.
///
/// Values are deep-copied on every spawn, so entities spawned from the same
/// prefab never share state with it or with each other.
#[derive(Default)]
pub struct Prefab {
    parts: Vec<(ComponentKey, Box<dyn ComponentValue>)>,
}

impl Prefab {
    /// An empty prefab.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair, builder style.
    #[must_use]
    pub fn with<T: Component>(mut self, id: ComponentId<T>, value: T) -> Self {
        self.push(id, value);
        self
    }

    /// Appends a pair.
    pub fn push<T: Component>(&mut self, id: ComponentId<T>, value: T) {
        self.parts.push((id.key(), Box::new(value)));
    }

    /// A new prefab holding this prefab's pairs followed by `additional`'s.
    /// Duplicates are kept; the later pair wins at spawn.
    #[must_use]
    pub fn extend(&self, additional: &Prefab) -> Prefab {
        Prefab {
            parts: self
                .parts
                .iter()
                .chain(additional.parts.iter())
                .map(|(key, value)| (*key, value.clone_value()))
                .collect(),
        }
    }

    /// Spawns a new entity from this template.
    pub fn spawn(&self, world: &mut World) -> Result<Entity, WorldError> {
        self.spawn_with(world, &Prefab::new())
    }

    /// Spawns a new entity from this template, then applies `overrides`.
    ///
    /// If any value is rejected the new entity is despawned again and the
    /// error returned.
    pub fn spawn_with(&self, world: &mut World, overrides: &Prefab) -> Result<Entity, WorldError> {
        let entity = world.spawn();
        for (key, value) in self.parts.iter().chain(overrides.parts.iter()) {
            if let Err(err) = world.set_boxed(entity, *key, value.clone_value()) {
                world.despawn(entity);
                return Err(err);
            }
        }
        debug!(
            world = %world.name(),
            %entity,
            parts = self.parts.len(),
            overrides = overrides.parts.len(),
            "spawned prefab"
        );
        Ok(entity)
    }

    /// Component keys in application order, duplicates included.
    pub fn keys(&self) -> impl Iterator<Item = ComponentKey> + '_ {
        self.parts.iter().map(|(key, _)| *key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl Clone for Prefab {
    fn clone(&self) -> Self {
        self.extend(&Prefab::new())
    }
}

impl fmt::Debug for Prefab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.parts.iter().map(|(key, value)| (key.0, value.value_type_name())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Name(String);

    impl Component for Name {}

    fn setup() -> (World, ComponentId<u32>, ComponentId<Name>) {
        let mut world = World::new();
        let health = world.register::<u32>("Health").unwrap();
        let name = world.register::<Name>("Name").unwrap();
        (world, health, name)
    }

    #[test]
    fn test_spawn_applies_pairs() {
        let (mut world, health, name) = setup();
        let goblin = Prefab::new()
            .with(health, 30)
            .with(name, Name("goblin".into()));
        let e = goblin.spawn(&mut world).unwrap();
        assert_eq!(world.get(e, health), Some(&30));
        assert_eq!(world.get(e, name), Some(&Name("goblin".into())));
    }

    #[test]
    fn test_overrides_win() {
        let (mut world, health, name) = setup();
        let goblin = Prefab::new()
            .with(health, 30)
            .with(name, Name("goblin".into()));
        let boss = goblin
            .spawn_with(&mut world, &Prefab::new().with(health, 300))
            .unwrap();
        assert_eq!(world.get(boss, health), Some(&300));
        assert_eq!(world.get(boss, name), Some(&Name("goblin".into())));
    }

    #[test]
    fn test_extend_concatenates_and_later_wins() {
        let (mut world, health, name) = setup();
        let base = Prefab::new().with(health, 10);
        let tougher = base.extend(&Prefab::new().with(health, 20).with(name, Name("orc".into())));
        assert_eq!(base.len(), 1);
        assert_eq!(tougher.len(), 3);
        assert_eq!(
            tougher.keys().collect::<Vec<_>>(),
            vec![health.key(), health.key(), name.key()]
        );
        let e = tougher.spawn(&mut world).unwrap();
        assert_eq!(world.get(e, health), Some(&20));
    }

    #[test]
    fn test_spawned_values_are_independent_copies() {
        let (mut world, _, name) = setup();
        let prefab = Prefab::new().with(name, Name("a".into()));
        let first = prefab.spawn(&mut world).unwrap();
        world.get_mut(first, name).unwrap().0.push('!');
        let second = prefab.spawn(&mut world).unwrap();
        assert_eq!(world.get(second, name), Some(&Name("a".into())));
    }

    #[test]
    fn test_rejected_value_rolls_back_spawn() {
        let (mut world, _, _) = setup();
        let mut other = World::new();
        other.register::<u32>("A").unwrap();
        other.register::<u32>("B").unwrap();
        let foreign = other.register::<u32>("C").unwrap();

        let err = Prefab::new().with(foreign, 1).spawn(&mut world).unwrap_err();
        assert_eq!(err, WorldError::UnknownComponent(foreign.key()));
        assert_eq!(world.entity_count(), 0);
    }
}
