//! World state storage.
//!
//! The [`World`] is the entity store: it owns the live entity set, each
//! entity's [`ComponentMap`], the component registry and every id counter.
//! Nothing here is process-global, so independent worlds never interfere.
//!
//! ## Invalid entity policy
//!
//! Reads (`get`, `has`, `components`) on a dead entity return `None` /
//! `false`. Writes (`set`, `remove`, `clear`) on a dead entity return
//! [`WorldError::EntityNotFound`] and change nothing.

use std::any::TypeId;
use std::collections::BTreeMap;

use ecs_component::{
    Component, ComponentId, ComponentKey, ComponentMap, ComponentRegistry, ComponentValue, Entity,
    EntityAllocator,
};
use tracing::{debug, trace, warn};

use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::group::{Group, GroupId};

/// The canonical entity and component state.
///
/// Entities are kept ordered by id, so every iteration over the world (and
/// therefore every query) visits entities in spawn order.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    /// Component names and value types.
    registry: ComponentRegistry,
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// Live entities and their components.
    entities: BTreeMap<Entity, ComponentMap>,
    /// Next id handed to [`World::create_group`].
    next_group: u64,
}

impl World {
    /// Create a new empty world with the default config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(WorldConfig::default())
    }

    /// Create a new empty world.
    #[must_use]
    pub fn with_config(config: WorldConfig) -> Self {
        Self {
            config,
            registry: ComponentRegistry::new(),
            allocator: EntityAllocator::new(),
            entities: BTreeMap::new(),
            next_group: 1,
        }
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    // -- Registration --

    /// Register a component under a unique name.
    ///
    /// Registering the same name twice fails with
    /// [`RegistryError::DuplicateName`](ecs_component::RegistryError).
    pub fn register<T: Component>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<ComponentId<T>, WorldError> {
        Ok(self.registry.register::<T>(name)?)
    }

    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Returns the key registered under `name`.
    #[must_use]
    pub fn component_key(&self, name: &str) -> Option<ComponentKey> {
        self.registry.key_of(name)
    }

    /// Returns the name a component key was registered under.
    #[must_use]
    pub fn component_name(&self, key: ComponentKey) -> Option<&str> {
        self.registry.name(key)
    }

    // -- Entity lifecycle --

    /// Allocate a new, empty entity.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.entities.insert(entity, ComponentMap::new());
        debug!(world = %self.config.name, %entity, "spawned entity");
        entity
    }

    /// Destroy an entity and all of its components.
    ///
    /// Returns `true` if the entity was alive.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        match self.entities.remove(&entity) {
            Some(components) => {
                debug!(
                    world = %self.config.name,
                    %entity,
                    components = components.len(),
                    "despawned entity"
                );
                true
            }
            None => false,
        }
    }

    /// Bring a despawned entity back under its original id, with no
    /// components. Ids this world never allocated are refused.
    pub(crate) fn revive(&mut self, entity: Entity) -> bool {
        if self.entities.contains_key(&entity) || !self.allocator.was_allocated(entity) {
            return false;
        }
        self.entities.insert(entity, ComponentMap::new());
        debug!(world = %self.config.name, %entity, "revived entity");
        true
    }

    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns all live entity ids in ascending order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.keys().copied()
    }

    /// Returns every live entity together with its components.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &ComponentMap)> + '_ {
        self.entities.iter().map(|(e, c)| (*e, c))
    }

    // -- Component operations --

    /// Insert or overwrite a component value, returning the previous one.
    pub fn set<T: Component>(
        &mut self,
        entity: Entity,
        id: ComponentId<T>,
        value: T,
    ) -> Result<Option<T>, WorldError> {
        self.check_type(id.key(), TypeId::of::<T>(), std::any::type_name::<T>())?;
        let Some(components) = self.entities.get_mut(&entity) else {
            warn!(world = %self.config.name, %entity, component = %id.key(), "set on dead entity");
            return Err(WorldError::EntityNotFound(entity));
        };
        trace!(world = %self.config.name, %entity, component = %id.key(), "set component");
        Ok(components.insert(id, value))
    }

    /// Insert or overwrite an already-boxed component value.
    ///
    /// The value's Rust type must match the type registered for `key`.
    pub fn set_boxed(
        &mut self,
        entity: Entity,
        key: ComponentKey,
        value: Box<dyn ComponentValue>,
    ) -> Result<(), WorldError> {
        self.check_type(key, value.value_type_id(), value.value_type_name())?;
        let Some(components) = self.entities.get_mut(&entity) else {
            warn!(world = %self.config.name, %entity, component = %key, "set on dead entity");
            return Err(WorldError::EntityNotFound(entity));
        };
        trace!(world = %self.config.name, %entity, component = %key, "set component");
        components.insert_boxed(key, value);
        Ok(())
    }

    /// Get a component value from an entity.
    #[must_use]
    pub fn get<T: Component>(&self, entity: Entity, id: ComponentId<T>) -> Option<&T> {
        self.entities.get(&entity)?.get(id)
    }

    /// Get a mutable reference to a component value.
    #[must_use]
    pub fn get_mut<T: Component>(&mut self, entity: Entity, id: ComponentId<T>) -> Option<&mut T> {
        self.entities.get_mut(&entity)?.get_mut(id)
    }

    /// Remove a component from an entity.
    ///
    /// Returns whether the component was present.
    pub fn remove(
        &mut self,
        entity: Entity,
        component: impl Into<ComponentKey>,
    ) -> Result<bool, WorldError> {
        let key = component.into();
        let Some(components) = self.entities.get_mut(&entity) else {
            warn!(world = %self.config.name, %entity, component = %key, "remove on dead entity");
            return Err(WorldError::EntityNotFound(entity));
        };
        let removed = components.remove(key);
        if removed {
            trace!(world = %self.config.name, %entity, component = %key, "removed component");
        }
        Ok(removed)
    }

    /// Remove every component from an entity, keeping it alive.
    ///
    /// Returns the number of components removed.
    pub fn clear(&mut self, entity: Entity) -> Result<usize, WorldError> {
        let Some(components) = self.entities.get_mut(&entity) else {
            warn!(world = %self.config.name, %entity, "clear on dead entity");
            return Err(WorldError::EntityNotFound(entity));
        };
        let count = components.len();
        components.clear();
        Ok(count)
    }

    /// Check if an entity has a specific component.
    #[must_use]
    pub fn has(&self, entity: Entity, component: impl Into<ComponentKey>) -> bool {
        let key = component.into();
        self.entities
            .get(&entity)
            .is_some_and(|components| components.contains(key))
    }

    /// Get all components on an entity.
    #[must_use]
    pub fn components(&self, entity: Entity) -> Option<&ComponentMap> {
        self.entities.get(&entity)
    }

    pub(crate) fn components_mut(&mut self, entity: Entity) -> Option<&mut ComponentMap> {
        self.entities.get_mut(&entity)
    }

    /// Get all component keys on an entity, in ascending order.
    #[must_use]
    pub fn component_keys(&self, entity: Entity) -> Vec<ComponentKey> {
        self.entities
            .get(&entity)
            .map(|components| components.keys().collect())
            .unwrap_or_default()
    }

    // -- Groups --

    /// Create a new, empty group with a world-unique id.
    pub fn create_group(&mut self, name: impl Into<String>) -> Group {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        let group = Group::new(id, name);
        debug!(world = %self.config.name, group = %group.name(), id = id.0, "created group");
        group
    }

    // -- Validation --

    fn check_type(
        &self,
        key: ComponentKey,
        type_id: TypeId,
        type_name: &'static str,
    ) -> Result<(), WorldError> {
        let info = self
            .registry
            .get(key)
            .ok_or(WorldError::UnknownComponent(key))?;
        if info.type_id != type_id {
            return Err(WorldError::TypeMismatch {
                name: info.name.clone(),
                expected: info.type_name,
                actual: type_name,
            });
        }
        Ok(())
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use ecs_component::RegistryError;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    impl Component for Health {}

    fn make_world() -> (World, ComponentId<Health>, ComponentId<f32>) {
        let mut world = World::new();
        let health = world.register::<Health>("Health").unwrap();
        let speed = world.register::<f32>("Speed").unwrap();
        (world, health, speed)
    }

    #[test]
    fn test_spawn_is_alive_and_empty() {
        let (mut world, _, _) = make_world();
        let e = world.spawn();
        assert!(e.is_valid());
        assert!(world.is_alive(e));
        assert_eq!(world.entity_count(), 1);
        assert!(world.components(e).unwrap().is_empty());
    }

    #[test]
    fn test_spawn_never_reuses_ids() {
        let (mut world, _, _) = make_world();
        let a = world.spawn();
        assert!(world.despawn(a));
        let b = world.spawn();
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_get_overwrite() {
        let (mut world, health, _) = make_world();
        let e = world.spawn();
        assert_eq!(world.set(e, health, Health(10)).unwrap(), None);
        assert_eq!(world.set(e, health, Health(7)).unwrap(), Some(Health(10)));
        assert_eq!(world.get(e, health), Some(&Health(7)));
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let (mut world, health, _) = make_world();
        let e = world.spawn();
        world.set(e, health, Health(1)).unwrap();
        world.get_mut(e, health).unwrap().0 += 4;
        assert_eq!(world.get(e, health), Some(&Health(5)));
    }

    #[test]
    fn test_absent_component_is_none() {
        let (mut world, health, speed) = make_world();
        let e = world.spawn();
        world.set(e, speed, 0.0).unwrap();
        assert!(world.get(e, health).is_none());
        assert!(!world.has(e, health));
        assert_eq!(world.get(e, speed), Some(&0.0));
    }

    #[test]
    fn test_has_tracks_set_and_remove() {
        let (mut world, health, _) = make_world();
        let e = world.spawn();
        world.set(e, health, Health(3)).unwrap();
        assert!(world.has(e, health));
        assert!(world.remove(e, health).unwrap());
        assert!(!world.has(e, health));
        assert!(!world.remove(e, health).unwrap());
        world.set(e, health, Health(4)).unwrap();
        assert!(world.has(e, health));
    }

    #[test]
    fn test_writes_on_dead_entity_are_errors() {
        let (mut world, health, _) = make_world();
        let e = world.spawn();
        world.despawn(e);
        assert_eq!(
            world.set(e, health, Health(1)),
            Err(WorldError::EntityNotFound(e))
        );
        assert_eq!(world.remove(e, health), Err(WorldError::EntityNotFound(e)));
        assert_eq!(world.clear(e), Err(WorldError::EntityNotFound(e)));
        assert!(!world.is_alive(e));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_on_dead_entity_warn() {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        let (mut world, health, _) = make_world();
        let e = world.spawn();
        world.despawn(e);
        tracing::subscriber::with_default(subscriber, || {
            assert!(world.set(e, health, Health(1)).is_err());
            assert!(world.set_boxed(e, health.key(), Box::new(Health(1))).is_err());
            assert!(world.remove(e, health).is_err());
            assert!(world.clear(e).is_err());
        });

        let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(logs.matches("set on dead entity").count(), 2);
        assert!(logs.contains("remove on dead entity"));
        assert!(logs.contains("clear on dead entity"));
    }

    #[test]
    fn test_reads_on_dead_entity_are_none() {
        let (mut world, health, _) = make_world();
        let e = world.spawn();
        world.set(e, health, Health(1)).unwrap();
        world.despawn(e);
        assert!(world.get(e, health).is_none());
        assert!(!world.has(e, health));
        assert!(world.components(e).is_none());
        assert!(world.component_keys(e).is_empty());
        assert!(!world.despawn(e));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let (mut world, _, _) = make_world();
        let err = world.register::<u8>("Health").unwrap_err();
        assert_eq!(
            err,
            WorldError::Registry(RegistryError::DuplicateName("Health".into()))
        );
    }

    #[test]
    fn test_foreign_handle_is_rejected() {
        let (mut world, _, _) = make_world();
        let mut other = World::new();
        other.register::<u8>("Padding").unwrap();
        other.register::<u8>("More").unwrap();
        let foreign = other.register::<String>("Name").unwrap();

        let e = world.spawn();
        assert_eq!(
            world.set(e, foreign, "x".to_string()),
            Err(WorldError::UnknownComponent(foreign.key()))
        );

        let first_in_other = other.component_key("Padding").unwrap();
        let err = world
            .set_boxed(e, first_in_other, Box::new(9u8))
            .unwrap_err();
        assert!(matches!(err, WorldError::TypeMismatch { ref name, .. } if name == "Health"));
    }

    #[test]
    fn test_set_boxed_accepts_matching_type() {
        let (mut world, health, _) = make_world();
        let e = world.spawn();
        world.set_boxed(e, health.key(), Box::new(Health(8))).unwrap();
        assert_eq!(world.get(e, health), Some(&Health(8)));
    }

    #[test]
    fn test_clear_keeps_entity_alive() {
        let (mut world, health, speed) = make_world();
        let e = world.spawn();
        world.set(e, health, Health(1)).unwrap();
        world.set(e, speed, 2.0).unwrap();
        assert_eq!(world.clear(e).unwrap(), 2);
        assert!(world.is_alive(e));
        assert!(world.component_keys(e).is_empty());
    }

    #[test]
    fn test_entities_iterate_in_spawn_order() {
        let (mut world, _, _) = make_world();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn();
        world.despawn(b);
        assert_eq!(world.entities().collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn test_component_names() {
        let (world, health, speed) = make_world();
        assert_eq!(world.component_name(health.key()), Some("Health"));
        assert_eq!(world.component_key("Speed"), Some(speed.key()));
        assert!(world.component_key("Mana").is_none());
    }

    #[test]
    fn test_group_ids_are_per_world() {
        let mut first = World::new();
        let mut second = World::new();
        let a = first.create_group("a");
        let b = first.create_group("b");
        let c = second.create_group("c");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), c.id());
    }

    #[test]
    fn test_revive_only_known_dead_entities() {
        let (mut world, _, _) = make_world();
        let e = world.spawn();
        assert!(!world.revive(e));
        world.despawn(e);
        assert!(world.revive(e));
        assert!(world.is_alive(e));
        assert!(!world.revive(Entity::from_raw(500)));
    }
}
