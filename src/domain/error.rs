use thiserror::Error;

/// Error kinds surfaced by the account core.
///
/// The policy layer raises `Validation`/`Authorization` before touching
/// persistence; the store is the sole raiser of persistence-level
/// `NotFound`/`Conflict`. Anything unexpected at the store boundary is
/// wrapped as `Internal`.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Authorization(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Account-not-found shorthand used throughout the store.
    pub fn account_not_found(id: &str) -> Self {
        Self::NotFound {
            entity: "Account",
            field: "id",
            value: id.to_string(),
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
