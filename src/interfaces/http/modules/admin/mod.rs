//! Admin account-management endpoints

pub mod dto;
pub mod handlers;

pub use handlers::AdminState;
