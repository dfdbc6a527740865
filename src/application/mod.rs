pub mod accounts;
pub mod ports;

// Re-export key types for convenience
pub use accounts::{AccountService, AccountSettings, SettingsUpdate};
pub use ports::{IdentityError, IdentityProvider};
