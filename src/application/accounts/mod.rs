//! Account policy layer
//!
//! Authorization, business rules and profile validation on top of the
//! account store.

pub mod service;
pub mod validation;

pub use service::{AccountService, AccountSettings, SettingsUpdate};
pub use validation::validate_profile_data;
