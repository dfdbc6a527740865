//! Infrastructure layer - external concerns

pub mod database;
pub mod identity;
pub mod storage;

pub use database::{init_database, DatabaseConfig, SeaOrmAccountStore};
pub use identity::LoggingIdentityProvider;
pub use storage::MemoryAccountStore;
