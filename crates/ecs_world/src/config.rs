//! World configuration.

/// Configuration for a [`World`](crate::World).
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// Human-readable world name (e.g. `"client"`), attached to log events.
    pub name: String,
    /// Whether [`World::restore`](crate::World::restore) brings back entities
    /// that were despawned after the snapshot was taken. When `false` those
    /// entities are skipped.
    pub revive_on_restore: bool,
}

impl WorldConfig {
    /// Create a config with the given name and default settings.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revive_on_restore: true,
        }
    }

    /// Override whether restore revives despawned entities.
    #[must_use]
    pub fn with_revive_on_restore(mut self, revive: bool) -> Self {
        self.revive_on_restore = revive;
        self
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new("world")
    }
}
