//! # Marketplace Account Service
//!
//! Account management core for an e-commerce/auction marketplace:
//! role-based authorization, transactional email uniqueness,
//! optimistic-concurrency updates and account lifecycle transitions.
//!
//! ## Architecture
//!
//! - **domain**: Account aggregate, store trait, error taxonomy
//! - **application**: Policy service (authorization + business rules)
//!   and the outbound identity-provider port
//! - **infrastructure**: SeaORM store, in-memory store, identity
//!   provider implementations
//! - **auth**: Bearer-token verification deriving the request context
//! - **interfaces**: REST API with Swagger documentation

pub mod application;
pub mod auth;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmAccountStore};

// Re-export API router
pub use interfaces::{create_api_router, AppState};
