//! A thread-safe handle to a single [`World`].
//!
//! Every operation on the shared world runs under one lock, so a capture
//! never observes a restore or write from another thread half-done.

use std::sync::{Arc, Mutex, PoisonError};

use crate::world::World;

/// A cloneable, lock-protected world.
#[derive(Debug, Clone, Default)]
pub struct SharedWorld {
    inner: Arc<Mutex<World>>,
}

impl SharedWorld {
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            inner: Arc::new(Mutex::new(world)),
        }
    }

    /// Runs `f` with exclusive access to the world.
    ///
    /// A lock poisoned by a panicking caller is recovered, and later callers
    /// see whatever state that closure left behind. A closure that made
    /// several writes, or a `restore` interrupted by a panicking
    /// `deep_clone`, may have left the world partly updated.
    pub fn with<R>(&self, f: impl FnOnce(&mut World) -> R) -> R {
        let mut world = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut world)
    }
}
