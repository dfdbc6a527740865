//! Outbound ports — interfaces to the external identity/auth provider.
//!
//! [`IdentityProvider`] is the architectural contract that decouples the
//! account store from the concrete identity backend. The store calls it
//! after its own transactional writes: role changes propagate to the
//! provider's custom claims, bans disable the login, a permanent delete
//! removes the identity.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::Role;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Identity provider error: {0}")]
    Provider(String),

    #[error("Identity not found: {0}")]
    NotFound(String),
}

/// Port to the external identity/auth provider.
///
/// Implementations must be idempotent: the store retries nothing, and
/// ban/unban/delete paths treat provider failures as best-effort (the
/// persisted state is already committed when these are called).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Propagate the account role into the provider's auth claims.
    async fn set_role_claims(&self, account_id: &str, role: Role) -> Result<(), IdentityError>;

    /// Disable (`true`) or re-enable (`false`) the login.
    async fn set_disabled(&self, account_id: &str, disabled: bool) -> Result<(), IdentityError>;

    /// Remove the identity entirely.
    async fn delete_identity(&self, account_id: &str) -> Result<(), IdentityError>;
}
