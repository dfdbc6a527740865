pub mod account;
pub mod context;
pub mod error;

// Re-export commonly used types
pub use account::{
    Account, AccountFilter, AccountMetadata, AccountStatus, AccountStore, BanAudit,
    BulkAccountUpdate, CreateAccountDto, Currency, LoginMetadata, Preferences, PreferencesUpdate,
    Role, SuspensionAudit, UpdateAccountDto,
};
pub use context::RequestingUser;
pub use error::{DomainError, DomainResult};
