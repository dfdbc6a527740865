use super::{PreferencesUpdate, Role};

/// Payload for creating an account.
///
/// `id` carries a pre-assigned identifier from the external identity
/// system; when absent the store generates one.
#[derive(Debug, Clone, Default)]
pub struct CreateAccountDto {
    pub id: Option<String>,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
    pub preferences: Option<PreferencesUpdate>,
}
