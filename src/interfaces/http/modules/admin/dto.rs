//! Admin account-management DTOs

use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::{
    AccountFilter, BulkAccountUpdate, CreateAccountDto, DomainResult, UpdateAccountDto,
};
use crate::interfaces::http::modules::accounts::dto::{
    parse_currency, parse_role, parse_status, PreferencesUpdateRequest,
};
use crate::shared::PageParams;

/// List query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAccountsParams {
    /// Filter by role (admin, seller, user)
    pub role: Option<String>,
    /// Filter by status (active, inactive, suspended, banned)
    pub status: Option<String>,
    pub email_verified: Option<bool>,
    /// Creation-time range start (RFC 3339)
    pub start_date: Option<DateTime<Utc>>,
    /// Creation-time range end (RFC 3339)
    pub end_date: Option<DateTime<Utc>>,
    /// Free-text search over name/email/phone. Applied after
    /// pagination: it narrows the returned page.
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_limit() -> u64 {
    50
}

impl ListAccountsParams {
    pub fn into_parts(self) -> DomainResult<(AccountFilter, PageParams)> {
        let filter = AccountFilter {
            role: self.role.as_deref().map(parse_role).transpose()?,
            status: self.status.as_deref().map(parse_status).transpose()?,
            email_verified: self.email_verified,
            created_after: self.start_date,
            created_before: self.end_date,
            search: self.search,
        };
        let page = PageParams {
            limit: self.limit,
            offset: self.offset,
        };
        Ok((filter, page))
    }
}

/// Search query parameters
#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchAccountsParams {
    /// Search query (required, non-empty)
    pub q: String,
    pub role: Option<String>,
    pub status: Option<String>,
}

impl SearchAccountsParams {
    pub fn filter(&self) -> DomainResult<AccountFilter> {
        Ok(AccountFilter {
            role: self.role.as_deref().map(parse_role).transpose()?,
            status: self.status.as_deref().map(parse_status).transpose()?,
            ..Default::default()
        })
    }
}

/// Count query parameters (list filters minus search/pagination)
#[derive(Debug, Deserialize, IntoParams)]
pub struct CountAccountsParams {
    pub role: Option<String>,
    pub status: Option<String>,
    pub email_verified: Option<bool>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl CountAccountsParams {
    pub fn filter(self) -> DomainResult<AccountFilter> {
        Ok(AccountFilter {
            role: self.role.as_deref().map(parse_role).transpose()?,
            status: self.status.as_deref().map(parse_status).transpose()?,
            email_verified: self.email_verified,
            created_after: self.start_date,
            created_before: self.end_date,
            search: None,
        })
    }
}

/// Create account request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    /// Pre-assigned identifier from the external identity system
    pub id: Option<String>,
    #[validate(email)]
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub preferences: Option<PreferencesUpdateRequest>,
}

impl CreateAccountRequest {
    pub fn into_create(self) -> DomainResult<CreateAccountDto> {
        Ok(CreateAccountDto {
            id: self.id,
            email: self.email,
            name: self.name,
            phone: self.phone,
            avatar: self.avatar,
            role: self.role.as_deref().map(parse_role).transpose()?,
            preferences: self.preferences.map(Into::into),
        })
    }
}

/// Backfill request: create the profile record for an identity that
/// already exists in the external auth system (the id comes from the
/// request path).
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BackfillAccountRequest {
    #[validate(email)]
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
}

impl BackfillAccountRequest {
    pub fn into_create(self) -> DomainResult<CreateAccountDto> {
        Ok(CreateAccountDto {
            id: None,
            email: self.email,
            name: self.name,
            phone: self.phone,
            avatar: self.avatar,
            role: self.role.as_deref().map(parse_role).transpose()?,
            preferences: None,
        })
    }
}

/// Role change request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    /// New role (admin, seller, user)
    pub role: String,
}

/// Ban toggle request
#[derive(Debug, Deserialize, ToSchema)]
pub struct BanRequest {
    pub banned: bool,
    pub reason: Option<String>,
}

/// Suspension request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SuspendRequest {
    pub reason: String,
    pub suspended_until: Option<DateTime<Utc>>,
}

/// Partial account data used by admin update and bulk items. Unlike the
/// profile request it carries no optimistic-lock token; bulk updates
/// deliberately run without version checks.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AccountDataRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    pub email_verified: Option<bool>,
    pub phone_verified: Option<bool>,
    pub preferred_currency: Option<String>,
    pub preferences: Option<PreferencesUpdateRequest>,
}

impl AccountDataRequest {
    pub fn into_update(self) -> DomainResult<UpdateAccountDto> {
        Ok(UpdateAccountDto {
            email: self.email,
            name: self.name,
            phone: self.phone,
            avatar: self.avatar,
            role: self.role.as_deref().map(parse_role).transpose()?,
            status: self.status.as_deref().map(parse_status).transpose()?,
            email_verified: self.email_verified,
            phone_verified: self.phone_verified,
            preferred_currency: self
                .preferred_currency
                .as_deref()
                .map(parse_currency)
                .transpose()?,
            preferences: self.preferences.map(Into::into),
        })
    }
}

/// One bulk item
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkUpdateItem {
    pub id: String,
    pub data: AccountDataRequest,
}

/// Bulk update request
#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkUpdateRequest {
    pub updates: Vec<BulkUpdateItem>,
}

impl BulkUpdateRequest {
    pub fn into_updates(self) -> DomainResult<Vec<BulkAccountUpdate>> {
        self.updates
            .into_iter()
            .map(|item| {
                Ok(BulkAccountUpdate {
                    id: item.id,
                    data: item.data.into_update()?,
                })
            })
            .collect()
    }
}
