use chrono::{DateTime, Utc};

use super::{AccountStatus, Role};

/// Listing filters shared by `find_all` and `count`.
///
/// `search` is applied in memory AFTER pagination (it narrows the
/// already-paginated page); see the store contract for the rationale.
#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub role: Option<Role>,
    pub status: Option<AccountStatus>,
    pub email_verified: Option<bool>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub search: Option<String>,
}
