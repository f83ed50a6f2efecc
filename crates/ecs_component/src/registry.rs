//! The component registry, which issues typed component ids from unique names.
//!
//! Each world owns one registry. Keys are handed out from a counter owned by
//! the registry itself, so two registries never interfere with each other.
//! Registering a name twice is an error; the existing id is never returned.

use std::any::TypeId;
use std::collections::HashMap;

use tracing::debug;

use crate::component::{Component, ComponentId, ComponentKey};
use crate::error::RegistryError;

/// Information about a registered component.
#[derive(Debug, Clone)]
pub struct ComponentInfo {
    /// The key issued at registration.
    pub key: ComponentKey,
    /// The unique, human-readable name (e.g. `"Health"`).
    pub name: String,
    /// Rust type of the values stored under this key.
    pub type_id: TypeId,
    /// Rust type name of the values, for diagnostics.
    pub type_name: &'static str,
}

/// Registry of all components known to a world.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    /// Registered components, indexed by `key.0`.
    components: Vec<ComponentInfo>,
    /// Name lookup.
    by_name: HashMap<String, ComponentKey>,
}

impl ComponentRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type under a unique name.
    ///
    /// Returns [`RegistryError::DuplicateName`] if the name is taken.
    pub fn register<T: Component>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<ComponentId<T>, RegistryError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        let key = ComponentKey(self.components.len() as u32);
        let type_name = std::any::type_name::<T>();
        debug!(component = %name, key = key.0, type_name, "registered component");

        self.by_name.insert(name.clone(), key);
        self.components.push(ComponentInfo {
            key,
            name,
            type_id: TypeId::of::<T>(),
            type_name,
        });
        Ok(ComponentId::from_key(key))
    }

    /// Returns the key registered under `name`.
    #[must_use]
    pub fn key_of(&self, name: &str) -> Option<ComponentKey> {
        self.by_name.get(name).copied()
    }

    /// Returns information about a registered key.
    #[must_use]
    pub fn get(&self, key: ComponentKey) -> Option<&ComponentInfo> {
        self.components.get(key.0 as usize)
    }

    /// Returns the name a key was registered under.
    #[must_use]
    pub fn name(&self, key: ComponentKey) -> Option<&str> {
        self.get(key).map(|info| info.name.as_str())
    }

    /// Returns `true` if values of `type_id` may be stored under `key`.
    #[must_use]
    pub fn accepts(&self, key: ComponentKey, type_id: TypeId) -> bool {
        self.get(key).is_some_and(|info| info.type_id == type_id)
    }

    /// Returns an iterator over all registered components, in key order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentInfo> {
        self.components.iter()
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}
