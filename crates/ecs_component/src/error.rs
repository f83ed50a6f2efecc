//! Registry error types.

/// Errors raised while registering components.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A component with this name is already registered.
    #[error("component '{0}' is already registered")]
    DuplicateName(String),
}
