//! Account DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::SettingsUpdate;
use crate::domain::{
    Account, AccountStatus, Currency, DomainError, DomainResult, Preferences, PreferencesUpdate,
    Role, UpdateAccountDto,
};

// ── Parse helpers for closed string unions ──────────────────────

pub(crate) fn parse_role(s: &str) -> DomainResult<Role> {
    Role::parse(s).ok_or_else(|| DomainError::Validation(format!("Invalid role: {}", s)))
}

pub(crate) fn parse_status(s: &str) -> DomainResult<AccountStatus> {
    AccountStatus::parse(s)
        .ok_or_else(|| DomainError::Validation(format!("Invalid status: {}", s)))
}

pub(crate) fn parse_currency(s: &str) -> DomainResult<Currency> {
    Currency::parse(s)
        .ok_or_else(|| DomainError::Validation(format!("Invalid preferred currency: {}", s)))
}

// ── Responses ───────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PreferencesDto {
    pub newsletter: bool,
    pub sms_notifications: bool,
    pub order_updates: bool,
    pub language: String,
    pub timezone: String,
}

impl From<Preferences> for PreferencesDto {
    fn from(p: Preferences) -> Self {
        Self {
            newsletter: p.newsletter,
            sms_notifications: p.sms_notifications,
            order_updates: p.order_updates,
            language: p.language,
            timezone: p.timezone,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BanAuditDto {
    pub banned_at: DateTime<Utc>,
    pub banned_by: String,
    pub ban_reason: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuspensionAuditDto {
    pub suspended_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended_until: Option<DateTime<Utc>>,
    pub suspension_reason: String,
}

/// Account API representation
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountDto {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub role: String,
    pub status: String,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub preferred_currency: String,
    pub preferences: PreferencesDto,
    /// Optimistic-concurrency token: pass back as `expected_version`
    /// on updates to detect concurrent modification.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ban: Option<BanAuditDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspension: Option<SuspensionAuditDto>,
}

impl From<Account> for AccountDto {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            name: a.name,
            phone: a.phone,
            avatar: a.avatar,
            role: a.role.as_str().to_string(),
            status: a.status.as_str().to_string(),
            email_verified: a.email_verified,
            phone_verified: a.phone_verified,
            preferred_currency: a.preferred_currency.as_str().to_string(),
            preferences: a.preferences.into(),
            version: a.version,
            created_at: a.created_at,
            updated_at: a.updated_at,
            last_login_at: a.metadata.login.last_login_at,
            ban: a.metadata.ban.map(|b| BanAuditDto {
                banned_at: b.banned_at,
                banned_by: b.banned_by,
                ban_reason: b.ban_reason,
            }),
            suspension: a.metadata.suspension.map(|s| SuspensionAuditDto {
                suspended_at: s.suspended_at,
                suspended_until: s.suspended_until,
                suspension_reason: s.suspension_reason,
            }),
        }
    }
}

/// Settings view
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountSettingsDto {
    pub preferred_currency: String,
    pub preferences: PreferencesDto,
}

impl From<crate::application::AccountSettings> for AccountSettingsDto {
    fn from(s: crate::application::AccountSettings) -> Self {
        Self {
            preferred_currency: s.preferred_currency.as_str().to_string(),
            preferences: s.preferences.into(),
        }
    }
}

// ── Requests ────────────────────────────────────────────────────

/// Partial preferences payload
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PreferencesUpdateRequest {
    pub newsletter: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub order_updates: Option<bool>,
    pub language: Option<String>,
    pub timezone: Option<String>,
}

impl From<PreferencesUpdateRequest> for PreferencesUpdate {
    fn from(r: PreferencesUpdateRequest) -> Self {
        Self {
            newsletter: r.newsletter,
            sms_notifications: r.sms_notifications,
            order_updates: r.order_updates,
            language: r.language,
            timezone: r.timezone,
        }
    }
}

/// Update profile request. `role`/`status` are accepted here only for
/// admin callers; the policy layer rejects them otherwise.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
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
    /// Optimistic-lock check against the stored version.
    pub expected_version: Option<i64>,
}

impl UpdateProfileRequest {
    pub fn into_update(self) -> DomainResult<(UpdateAccountDto, Option<i64>)> {
        let role = self.role.as_deref().map(parse_role).transpose()?;
        let status = self.status.as_deref().map(parse_status).transpose()?;
        let preferred_currency = self
            .preferred_currency
            .as_deref()
            .map(parse_currency)
            .transpose()?;

        Ok((
            UpdateAccountDto {
                email: self.email,
                name: self.name,
                phone: self.phone,
                avatar: self.avatar,
                role,
                status,
                email_verified: self.email_verified,
                phone_verified: self.phone_verified,
                preferred_currency,
                preferences: self.preferences.map(Into::into),
            },
            self.expected_version,
        ))
    }
}

/// Update settings request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub preferred_currency: Option<String>,
    pub preferences: Option<PreferencesUpdateRequest>,
}

impl UpdateSettingsRequest {
    pub fn into_settings(self) -> DomainResult<SettingsUpdate> {
        Ok(SettingsUpdate {
            preferred_currency: self
                .preferred_currency
                .as_deref()
                .map(parse_currency)
                .transpose()?,
            preferences: self.preferences.map(Into::into),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_string_is_a_validation_error() {
        let req = UpdateProfileRequest {
            role: Some("superuser".into()),
            ..Default::default()
        };
        let err = req.into_update().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn currency_codes_parse_case_insensitively() {
        assert!(parse_currency("usd").is_ok());
        assert!(parse_currency("EUR").is_ok());
        assert!(parse_currency("BTC").is_err());
    }
}
