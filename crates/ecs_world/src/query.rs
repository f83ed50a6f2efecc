//! Select entities by a required/excluded component signature.
//!
//! A [`Query`] pairs a typed tuple of required [`ComponentId`]s with an
//! untyped [`QueryDescriptor`]. Queries are immutable: [`Query::with`] and
//! [`Query::without`] return new queries and leave the receiver untouched.
//!
//! Matching always reads the world's current state; nothing is cached.
//!
//! ## Matching rules
//!
//! An entity matches when it holds every required component and none of the
//! excluded ones. A component that is both required and excluded can never
//! match: exclusion wins. A query with no required components matches every
//! live entity that is not excluded.

use std::collections::BTreeSet;

use ecs_component::{Component, ComponentId, ComponentKey, ComponentMap, Entity};
use serde::{Deserialize, Serialize};

use crate::world::World;

/// The untyped part of a query: which keys must be present and which must
/// be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    /// Required components, in declaration order.
    pub required: Vec<ComponentKey>,
    /// Excluded components.
    pub excluded: BTreeSet<ComponentKey>,
}

impl QueryDescriptor {
    /// Create a new empty query descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required component.
    #[must_use]
    pub fn require(mut self, key: ComponentKey) -> Self {
        self.required.push(key);
        self
    }

    /// Add an excluded component.
    #[must_use]
    pub fn exclude(mut self, key: ComponentKey) -> Self {
        self.excluded.insert(key);
        self
    }

    /// Returns `true` if the requirements contradict each other, i.e. some
    /// component is both required and excluded. Such a query matches nothing.
    #[must_use]
    pub fn is_contradictory(&self) -> bool {
        self.required.iter().any(|key| self.excluded.contains(key))
    }

    /// Checks a component map against this descriptor.
    #[must_use]
    pub fn matches(&self, components: &ComponentMap) -> bool {
        // Exclusion is checked first so an id in both sets never matches.
        if self.excluded.iter().any(|key| components.contains(*key)) {
            return false;
        }
        self.required.iter().all(|key| components.contains(*key))
    }
}

/// A tuple of [`ComponentId`]s whose values can be fetched together.
///
/// Implemented for tuples of up to eight component ids, including `()`.
pub trait ComponentTuple: Copy {
    /// Borrowed values, in tuple order.
    type Refs<'w>;
    /// Owned copies of the values, in tuple order.
    type Owned;

    /// The component keys, in tuple order.
    fn keys(&self) -> Vec<ComponentKey>;

    /// Borrows every value, or `None` if any is missing.
    fn fetch<'w>(&self, components: &'w ComponentMap) -> Option<Self::Refs<'w>>;

    /// Deep-copies every value, or `None` if any is missing.
    fn fetch_owned(&self, components: &ComponentMap) -> Option<Self::Owned>;
}

/// Appends one more component id to a [`ComponentTuple`].
pub trait Append<T>: ComponentTuple {
    type Output: ComponentTuple;

    fn append(self, id: ComponentId<T>) -> Self::Output;
}

macro_rules! impl_component_tuple {
    ($($name:ident : $idx:tt),*) => {
        impl<$($name: Component),*> ComponentTuple for ($(ComponentId<$name>,)*) {
            type Refs<'w> = ($(&'w $name,)*);
            type Owned = ($($name,)*);

            fn keys(&self) -> Vec<ComponentKey> {
                vec![$(self.$idx.key()),*]
            }

            #[allow(unused_variables)]
            fn fetch<'w>(&self, components: &'w ComponentMap) -> Option<Self::Refs<'w>> {
                Some(($(components.get(self.$idx)?,)*))
            }

            #[allow(unused_variables)]
            fn fetch_owned(&self, components: &ComponentMap) -> Option<Self::Owned> {
                Some(($(Component::deep_clone(components.get(self.$idx)?),)*))
            }
        }
    };
}

macro_rules! impl_append {
    ($($name:ident : $idx:tt),*) => {
        impl<$($name: Component,)* Z: Component> Append<Z> for ($(ComponentId<$name>,)*) {
            type Output = ($(ComponentId<$name>,)* ComponentId<Z>,);

            fn append(self, id: ComponentId<Z>) -> Self::Output {
                ($(self.$idx,)* id,)
            }
        }
    };
}

impl_component_tuple!();
impl_component_tuple!(A: 0);
impl_component_tuple!(A: 0, B: 1);
impl_component_tuple!(A: 0, B: 1, C: 2);
impl_component_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_component_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_component_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_component_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_component_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

impl_append!();
impl_append!(A: 0);
impl_append!(A: 0, B: 1);
impl_append!(A: 0, B: 1, C: 2);
impl_append!(A: 0, B: 1, C: 2, D: 3);
impl_append!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_append!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_append!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);

/// An immutable, typed query.
///
/// `R` is a tuple of [`ComponentId`]s; callbacks receive the matching values
/// positionally in the same order.
///
/// ```rust
/// use ecs_world::{Query, World};
///
/// let mut world = World::new();
/// let health = world.register::<u32>("Health").unwrap();
/// let mana = world.register::<u32>("Mana").unwrap();
/// let frozen = world.register::<()>("Frozen").unwrap();
///
/// let e = world.spawn();
/// world.set(e, health, 100).unwrap();
/// world.set(e, mana, 50).unwrap();
///
/// let casters = Query::all().with(health).with(mana).without(frozen);
/// casters.each(&world, |entity, (hp, mp)| {
///     assert_eq!((entity, *hp, *mp), (e, 100, 50));
/// });
/// ```
#[derive(Debug, Clone)]
pub struct Query<R> {
    required: R,
    descriptor: QueryDescriptor,
}

impl Query<()> {
    /// A query with no required components: matches every live entity.
    #[must_use]
    pub fn all() -> Self {
        Self::new(())
    }
}

impl<R: ComponentTuple> Query<R> {
    /// Create a query requiring every component in `required`.
    #[must_use]
    pub fn new(required: R) -> Self {
        let descriptor = QueryDescriptor {
            required: required.keys(),
            excluded: BTreeSet::new(),
        };
        Self {
            required,
            descriptor,
        }
    }

    /// Returns a new query that additionally requires `id`.
    #[must_use]
    pub fn with<T: Component>(&self, id: ComponentId<T>) -> Query<<R as Append<T>>::Output>
    where
        R: Append<T>,
    {
        Query {
            required: self.required.append(id),
            descriptor: self.descriptor.clone().require(id.key()),
        }
    }

    /// Returns a new query that additionally excludes `component`.
    #[must_use]
    pub fn without(&self, component: impl Into<ComponentKey>) -> Self {
        Self {
            required: self.required,
            descriptor: self.descriptor.clone().exclude(component.into()),
        }
    }

    /// Returns a new query that additionally excludes every key given.
    #[must_use]
    pub fn without_all(&self, components: impl IntoIterator<Item = ComponentKey>) -> Self {
        let mut descriptor = self.descriptor.clone();
        descriptor.excluded.extend(components);
        Self {
            required: self.required,
            descriptor,
        }
    }

    /// The typed tuple of required ids.
    #[must_use]
    pub fn required(&self) -> R {
        self.required
    }

    #[must_use]
    pub fn descriptor(&self) -> &QueryDescriptor {
        &self.descriptor
    }

    fn fetch<'w>(&self, components: &'w ComponentMap) -> Option<R::Refs<'w>> {
        if !self.descriptor.matches(components) {
            return None;
        }
        self.required.fetch(components)
    }

    /// Returns `true` if `entity` is alive and currently matches.
    #[must_use]
    pub fn contains(&self, world: &World, entity: Entity) -> bool {
        world
            .components(entity)
            .is_some_and(|components| self.fetch(components).is_some())
    }

    /// Ids of every matching entity, in ascending order.
    #[must_use]
    pub fn entities(&self, world: &World) -> Vec<Entity> {
        world
            .iter()
            .filter(|(_, components)| self.fetch(components).is_some())
            .map(|(entity, _)| entity)
            .collect()
    }

    /// Calls `f` once per matching entity with the entity and its required
    /// values.
    pub fn each<'w, F>(&self, world: &'w World, mut f: F)
    where
        F: FnMut(Entity, R::Refs<'w>),
    {
        for (entity, components) in world.iter() {
            if let Some(values) = self.fetch(components) {
                f(entity, values);
            }
        }
    }

    /// Like [`each`](Query::each), but the callback may mutate the world.
    ///
    /// The set of entities to visit is fixed before the first call. Values
    /// are re-read just before each call, so the callback sees earlier
    /// writes. Entities spawned during iteration are not visited; entities
    /// that were despawned, or stopped matching, before their turn are
    /// skipped.
    pub fn each_mut<F>(&self, world: &mut World, mut f: F)
    where
        F: FnMut(&mut World, Entity, R::Owned),
    {
        for entity in self.entities(world) {
            let values = world.components(entity).and_then(|components| {
                if self.descriptor.matches(components) {
                    self.required.fetch_owned(components)
                } else {
                    None
                }
            });
            if let Some(values) = values {
                f(world, entity, values);
            }
        }
    }

    /// Returns every match eagerly.
    #[must_use]
    pub fn collect<'w>(&self, world: &'w World) -> Vec<(Entity, R::Refs<'w>)> {
        let mut out = Vec::new();
        self.each(world, |entity, values| out.push((entity, values)));
        out
    }

    /// Applies `f` to every match.
    pub fn map<'w, U, F>(&self, world: &'w World, mut f: F) -> Vec<U>
    where
        F: FnMut(Entity, R::Refs<'w>) -> U,
    {
        self.collect(world)
            .into_iter()
            .map(|(entity, values)| f(entity, values))
            .collect()
    }

    /// Keeps the matches for which `f` returns `true`.
    pub fn filter<'w, F>(&self, world: &'w World, mut f: F) -> Vec<(Entity, R::Refs<'w>)>
    where
        F: FnMut(Entity, &R::Refs<'w>) -> bool,
    {
        self.collect(world)
            .into_iter()
            .filter(|(entity, values)| f(*entity, values))
            .collect()
    }

    /// Number of matching entities.
    #[must_use]
    pub fn count(&self, world: &World) -> usize {
        world
            .iter()
            .filter(|(_, components)| self.fetch(components).is_some())
            .count()
    }

    /// The lowest-id matching entity, with its values.
    #[must_use]
    pub fn first<'w>(&self, world: &'w World) -> Option<(Entity, R::Refs<'w>)> {
        world
            .iter()
            .find_map(|(entity, components)| Some((entity, self.fetch(components)?)))
    }
}
