pub mod outbound;

pub use outbound::{IdentityError, IdentityProvider};
