//! World-level error types.

use ecs_component::{ComponentKey, Entity, RegistryError};

/// Errors returned by write operations on a [`World`](crate::World).
///
/// Reads never fail: a missing entity or component is reported as `None`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The entity was never spawned or has been despawned.
    #[error("{0} is not alive")]
    EntityNotFound(Entity),

    /// Component registration failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The key was not issued by this world's registry.
    #[error("{0} is not registered in this world")]
    UnknownComponent(ComponentKey),

    /// A value of the wrong Rust type was written under a component key.
    #[error("component '{name}' stores {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        actual: &'static str,
    },
}
