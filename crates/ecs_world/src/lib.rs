//! # ecs_world
//!
//! Entity storage, queries, groups and snapshots on top of
//! [`ecs_component`].
//!
//! This crate provides:
//!
//! - [`World`] — the entity store: spawn/despawn, typed component access.
//! - [`Query`] — immutable required/excluded component signatures.
//! - [`Group`] — named entity sets with a shared overlay map and
//!   membership notifications.
//! - [`Snapshot`] — deep-copied captures that can be restored later.
//! - [`Event`] — the synchronous publish/subscribe primitive groups use.
//! - [`Prefab`] and [`Systems`] — thin conveniences over the world.
//! - [`SharedWorld`] — a single-lock handle for multi-threaded hosts.
//!
//! ## Usage
//!
//! ```rust
//! use ecs_world::{Query, World};
//!
//! let mut world = World::new();
//! let health = world.register::<u32>("Health").unwrap();
//! let mana = world.register::<u32>("Mana").unwrap();
//!
//! let hero = world.spawn();
//! world.set(hero, health, 100).unwrap();
//! world.set(hero, mana, 50).unwrap();
//!
//! let saved = world.capture([hero], Some(&[health.key()])).unwrap();
//! world.set(hero, health, 1).unwrap();
//! world.restore(&saved);
//!
//! let alive = Query::new((health,)).collect(&world);
//! assert_eq!(alive, vec![(hero, (&100,))]);
//! assert_eq!(world.get(hero, mana), Some(&50));
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod group;
pub mod prefab;
pub mod query;
pub mod shared;
pub mod snapshot;
pub mod systems;
pub mod world;

pub use config::WorldConfig;
pub use ecs_component::{Component, ComponentId, ComponentKey, ComponentMap, Entity, RegistryError};
pub use error::WorldError;
pub use event::{Connection, Event};
pub use group::{Group, GroupId};
pub use prefab::Prefab;
pub use query::{Append, ComponentTuple, Query, QueryDescriptor};
pub use shared::SharedWorld;
pub use snapshot::{RestoreSummary, Snapshot, SnapshotId};
pub use systems::Systems;
pub use world::World;
