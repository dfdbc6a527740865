use super::{AccountStatus, Currency, PreferencesUpdate, Role};

/// Partial update payload; `None` fields are left untouched.
///
/// Merged onto the current record inside the store's transactional
/// read-check-write (see [`Account::merge_update`](super::Account::merge_update)).
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountDto {
    pub email: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
    pub email_verified: Option<bool>,
    pub phone_verified: Option<bool>,
    pub preferred_currency: Option<Currency>,
    pub preferences: Option<PreferencesUpdate>,
}

/// One item of a bulk update batch.
#[derive(Debug, Clone)]
pub struct BulkAccountUpdate {
    pub id: String,
    pub data: UpdateAccountDto,
}
