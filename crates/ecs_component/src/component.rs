//! Core [`Component`] trait, typed component handles and type-erased storage.
//!
//! Component values live behind `Box<dyn ComponentValue>` in a
//! [`ComponentMap`]. Static typing is recovered at the access boundary: a
//! [`ComponentId<T>`] carries the value type as a phantom parameter, and every
//! typed accessor downcasts to exactly that `T`.
//!
//! ## Deep copies
//!
//! [`Component::deep_clone`] produces a value that shares no mutable state
//! with its source. Owned Rust data cannot form reference cycles, so the copy
//! always terminates. `Arc<T>` is copied by cloning the pointee, which means
//! shared substructure is duplicated rather than preserved.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A unique identifier for a registered component, issued by a
/// [`ComponentRegistry`](crate::ComponentRegistry).
///
/// This is the untyped half of a [`ComponentId<T>`]; storage and query
/// descriptors work with keys only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey(pub u32);

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.0)
    }
}

/// The core component trait.
///
/// Any `Clone + Send + Sync + 'static` type can be a component once it opts
/// in. The default [`deep_clone`](Component::deep_clone) is `Clone`, which is
/// already a deep copy for owned data; override it when the type holds shared
/// handles that must be detached.
///
/// # Examples
///
/// ```rust
/// use ecs_component::Component;
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {}
/// ```
pub trait Component: Any + Clone + Send + Sync {
    /// Returns a value-independent copy of `self`.
    fn deep_clone(&self) -> Self {
        self.clone()
    }
}

macro_rules! impl_plain_component {
    ($($ty:ty),* $(,)?) => {
        $(impl Component for $ty {})*
    };
}

impl_plain_component!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: Component> Component for Vec<T> {
    fn deep_clone(&self) -> Self {
        self.iter().map(Component::deep_clone).collect()
    }
}

impl<T: Component> Component for VecDeque<T> {
    fn deep_clone(&self) -> Self {
        self.iter().map(Component::deep_clone).collect()
    }
}

impl<T: Component> Component for Option<T> {
    fn deep_clone(&self) -> Self {
        self.as_ref().map(Component::deep_clone)
    }
}

impl<T: Component> Component for Box<T> {
    fn deep_clone(&self) -> Self {
        Box::new((**self).deep_clone())
    }
}

impl<T: Component> Component for Arc<T> {
    fn deep_clone(&self) -> Self {
        Arc::new((**self).deep_clone())
    }
}

impl<K, V> Component for BTreeMap<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Component,
{
    fn deep_clone(&self) -> Self {
        self.iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect()
    }
}

impl<K, V> Component for HashMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Component,
{
    fn deep_clone(&self) -> Self {
        self.iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect()
    }
}

impl<A: Component, B: Component> Component for (A, B) {
    fn deep_clone(&self) -> Self {
        (self.0.deep_clone(), self.1.deep_clone())
    }
}

impl<A: Component, B: Component, C: Component> Component for (A, B, C) {
    fn deep_clone(&self) -> Self {
        (self.0.deep_clone(), self.1.deep_clone(), self.2.deep_clone())
    }
}

/// A typed handle to a registered component.
///
/// Cheap to copy. The phantom `T` fixes the value type for every typed
/// read and write made through this handle.
pub struct ComponentId<T> {
    key: ComponentKey,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ComponentId<T> {
    /// Wraps a raw key. Only the registry hands these out to callers.
    pub(crate) const fn from_key(key: ComponentKey) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped key.
    #[must_use]
    pub const fn key(self) -> ComponentKey {
        self.key
    }
}

impl<T> Clone for ComponentId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ComponentId<T> {}

impl<T> PartialEq for ComponentId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for ComponentId<T> {}

impl<T> Hash for ComponentId<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl<T> fmt::Debug for ComponentId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentId")
            .field("key", &self.key.0)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> From<ComponentId<T>> for ComponentKey {
    fn from(id: ComponentId<T>) -> Self {
        id.key
    }
}

/// Object-safe view of a [`Component`] used for type-erased storage.
///
/// Implemented for every component type; never implement it by hand.
pub trait ComponentValue: Any + Send + Sync + 'static {
    /// Deep-copies the value into a new box.
    fn clone_value(&self) -> Box<dyn ComponentValue>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// The Rust type name of the stored value, for diagnostics.
    fn value_type_name(&self) -> &'static str;
}

impl<T: Component> ComponentValue for T {
    fn clone_value(&self) -> Box<dyn ComponentValue> {
        Box::new(self.deep_clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn value_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl dyn ComponentValue {
    /// Returns the [`TypeId`] of the concrete stored value.
    #[must_use]
    pub fn value_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }

    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for dyn ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.value_type_name())
    }
}

/// A map from [`ComponentKey`] to a type-erased component value.
///
/// Used for an entity's own components, for group overlays and inside
/// snapshots. A key is present iff a value was inserted and not removed;
/// there is no notion of a default value.
#[derive(Default)]
pub struct ComponentMap {
    values: BTreeMap<ComponentKey, Box<dyn ComponentValue>>,
}

impl ComponentMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a typed value, returning the previous one.
    ///
    /// A previous value of a different type (only possible when a handle
    /// from another registry is used) is dropped and `None` is returned.
    pub fn insert<T: Component>(&mut self, id: ComponentId<T>, value: T) -> Option<T> {
        self.values
            .insert(id.key(), Box::new(value))
            .and_then(|old| old.into_any().downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Inserts or overwrites an already-boxed value.
    pub fn insert_boxed(
        &mut self,
        key: ComponentKey,
        value: Box<dyn ComponentValue>,
    ) -> Option<Box<dyn ComponentValue>> {
        self.values.insert(key, value)
    }

    #[must_use]
    pub fn get<T: Component>(&self, id: ComponentId<T>) -> Option<&T> {
        self.values.get(&id.key())?.downcast_ref::<T>()
    }

    #[must_use]
    pub fn get_mut<T: Component>(&mut self, id: ComponentId<T>) -> Option<&mut T> {
        self.values.get_mut(&id.key())?.downcast_mut::<T>()
    }

    #[must_use]
    pub fn get_boxed(&self, key: ComponentKey) -> Option<&dyn ComponentValue> {
        self.values.get(&key).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn contains(&self, key: ComponentKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Removes a value, returning whether one was present.
    pub fn remove(&mut self, key: ComponentKey) -> bool {
        self.values.remove(&key).is_some()
    }

    /// Removes and returns a typed value.
    pub fn take<T: Component>(&mut self, id: ComponentId<T>) -> Option<T> {
        let boxed = self.values.remove(&id.key())?;
        boxed.into_any().downcast::<T>().ok().map(|v| *v)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = ComponentKey> + '_ {
        self.values.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentKey, &dyn ComponentValue)> + '_ {
        self.values.iter().map(|(k, v)| (*k, v.as_ref()))
    }

    /// Returns a value-independent copy of the whole map.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        Self {
            values: self
                .values
                .iter()
                .map(|(k, v)| (*k, v.clone_value()))
                .collect(),
        }
    }

    /// Returns a value-independent copy holding only the listed keys that
    /// are present in this map.
    #[must_use]
    pub fn deep_clone_filtered(&self, keys: &[ComponentKey]) -> Self {
        let mut out = Self::new();
        for key in keys {
            if let Some(value) = self.values.get(key) {
                out.values.insert(*key, value.clone_value());
            }
        }
        out
    }
}

impl Clone for ComponentMap {
    fn clone(&self) -> Self {
        self.deep_clone()
    }
}

impl fmt::Debug for ComponentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.values.iter().map(|(k, v)| (k.0, v.value_type_name())))
            .finish()
    }
}
