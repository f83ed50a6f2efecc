//! # ecs_component
//!
//! The "E" and "C" in ECS: entity identifiers, typed component handles and
//! the type-erased maps that hold component values.
//!
//! This crate provides:
//!
//! - [`Entity`] — lightweight `u64` entity identifiers.
//! - [`EntityAllocator`] — monotonically increasing ID allocator.
//! - [`Component`] trait — the contract all component data must satisfy.
//! - [`ComponentId`] — a typed handle that recovers static typing at access.
//! - [`ComponentMap`] — type-erased component storage with deep copies.
//! - [`ComponentRegistry`] — unique-name registration of components.

pub mod component;
pub mod entity;
pub mod error;
pub mod registry;

pub use component::{Component, ComponentId, ComponentKey, ComponentMap, ComponentValue};
pub use entity::{Entity, EntityAllocator};
pub use error::RegistryError;
pub use registry::{ComponentInfo, ComponentRegistry};
