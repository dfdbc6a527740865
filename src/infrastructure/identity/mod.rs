//! Identity provider implementations.
//!
//! Production deployments plug a real provider (auth claims, account
//! disable, identity deletion) into the [`IdentityProvider`] port. The
//! default implementation only logs the calls, which is what local
//! development and the test suite need.

use async_trait::async_trait;
use tracing::debug;

use crate::application::ports::{IdentityError, IdentityProvider};
use crate::domain::Role;

/// No-op provider that records every call at debug level.
#[derive(Debug, Default, Clone)]
pub struct LoggingIdentityProvider;

#[async_trait]
impl IdentityProvider for LoggingIdentityProvider {
    async fn set_role_claims(&self, account_id: &str, role: Role) -> Result<(), IdentityError> {
        debug!(account_id, role = role.as_str(), "identity: set role claims");
        Ok(())
    }

    async fn set_disabled(&self, account_id: &str, disabled: bool) -> Result<(), IdentityError> {
        debug!(account_id, disabled, "identity: set disabled");
        Ok(())
    }

    async fn delete_identity(&self, account_id: &str) -> Result<(), IdentityError> {
        debug!(account_id, "identity: delete");
        Ok(())
    }
}
