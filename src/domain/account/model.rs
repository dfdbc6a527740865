//! Account aggregate model.
//!
//! Status transitions (ban / unban / suspend) are expressed as decision
//! methods on [`Account`] that either mutate the record or fail with a
//! typed error. Both store implementations funnel their transactional
//! read-check-write through these methods, so the transition rules live
//! in exactly one place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};

use super::dto_create::CreateAccountDto;
use super::dto_update::UpdateAccountDto;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Seller,
    User,
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Seller => "seller",
            Self::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Self::Admin),
            "seller" => Some(Self::Seller),
            "user" => Some(Self::User),
            _ => None,
        }
    }
}

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Suspended,
    Banned,
}

impl Default for AccountStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
            Self::Banned => "banned",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "suspended" => Some(Self::Suspended),
            "banned" => Some(Self::Banned),
            _ => None,
        }
    }
}

/// Supported settlement currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "EUR")]
    Eur,
    #[serde(rename = "GBP")]
    Gbp,
    #[serde(rename = "AUD")]
    Aud,
    #[serde(rename = "CAD")]
    Cad,
}

impl Default for Currency {
    fn default() -> Self {
        Self::Inr
    }
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inr => "INR",
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Aud => "AUD",
            Self::Cad => "CAD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "INR" => Some(Self::Inr),
            "USD" => Some(Self::Usd),
            "EUR" => Some(Self::Eur),
            "GBP" => Some(Self::Gbp),
            "AUD" => Some(Self::Aud),
            "CAD" => Some(Self::Cad),
            _ => None,
        }
    }
}

/// Notification and locale preferences.
///
/// Updates always merge field-by-field; a partial update never wipes
/// fields the caller did not mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub newsletter: bool,
    pub sms_notifications: bool,
    pub order_updates: bool,
    pub language: String,
    pub timezone: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            newsletter: true,
            sms_notifications: false,
            order_updates: true,
            language: "en".to_string(),
            timezone: "Asia/Kolkata".to_string(),
        }
    }
}

/// Partial preferences payload; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesUpdate {
    pub newsletter: Option<bool>,
    pub sms_notifications: Option<bool>,
    pub order_updates: Option<bool>,
    pub language: Option<String>,
    pub timezone: Option<String>,
}

impl Preferences {
    pub fn merge(&mut self, update: &PreferencesUpdate) {
        if let Some(newsletter) = update.newsletter {
            self.newsletter = newsletter;
        }
        if let Some(sms) = update.sms_notifications {
            self.sms_notifications = sms;
        }
        if let Some(orders) = update.order_updates {
            self.order_updates = orders;
        }
        if let Some(ref language) = update.language {
            self.language = language.clone();
        }
        if let Some(ref timezone) = update.timezone {
            self.timezone = timezone.clone();
        }
    }
}

/// Login tracking counters, maintained best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginMetadata {
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_login_ip: Option<String>,
    pub login_count: u64,
}

/// Audit trail for a ban; present only while the account is banned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanAudit {
    pub banned_at: DateTime<Utc>,
    pub banned_by: String,
    pub ban_reason: String,
}

/// Audit trail for a suspension; present only while suspended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspensionAudit {
    pub suspended_at: DateTime<Utc>,
    pub suspended_until: Option<DateTime<Utc>>,
    pub suspension_reason: String,
}

/// Structured account metadata: login counters plus the audit sub-record
/// for whichever lifecycle state currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountMetadata {
    pub login: LoginMetadata,
    pub ban: Option<BanAudit>,
    pub suspension: Option<SuspensionAudit>,
}

/// Account record
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    /// Stored lower-cased; unique case-insensitively.
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
    pub status: AccountStatus,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub preferred_currency: Currency,
    pub preferences: Preferences,
    pub metadata: AccountMetadata,
    /// Starts at 1; +1 on every successful versioned update.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Build a fresh record from a create payload: role defaults to
    /// `User`, status to `Active`, preferences to the defaults merged
    /// with whatever the payload supplies, and `version` starts at 1.
    /// Email is stored lower-cased.
    pub fn from_create(dto: CreateAccountDto, id: String, now: DateTime<Utc>) -> Self {
        let mut preferences = Preferences::default();
        if let Some(ref update) = dto.preferences {
            preferences.merge(update);
        }
        Self {
            id,
            email: dto.email.to_lowercase(),
            name: dto.name,
            phone: dto.phone,
            avatar: dto.avatar,
            role: dto.role.unwrap_or_default(),
            status: AccountStatus::Active,
            email_verified: false,
            phone_verified: false,
            preferred_currency: Currency::default(),
            preferences,
            metadata: AccountMetadata::default(),
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update onto this record. Email is lower-cased;
    /// uniqueness is the store's responsibility. Does not touch
    /// `version`/`updated_at` (the store stamps those).
    pub fn merge_update(&mut self, data: &UpdateAccountDto) {
        if let Some(ref email) = data.email {
            self.email = email.to_lowercase();
        }
        if let Some(ref name) = data.name {
            self.name = Some(name.clone());
        }
        if let Some(ref phone) = data.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(ref avatar) = data.avatar {
            self.avatar = Some(avatar.clone());
        }
        if let Some(role) = data.role {
            self.role = role;
        }
        if let Some(status) = data.status {
            self.status = status;
        }
        if let Some(verified) = data.email_verified {
            self.email_verified = verified;
        }
        if let Some(verified) = data.phone_verified {
            self.phone_verified = verified;
        }
        if let Some(currency) = data.preferred_currency {
            self.preferred_currency = currency;
        }
        if let Some(ref prefs) = data.preferences {
            self.preferences.merge(prefs);
        }
    }

    /// Transition to `Banned`. Fails if already banned.
    pub fn begin_ban(
        &mut self,
        reason: &str,
        banned_by: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if self.status == AccountStatus::Banned {
            return Err(DomainError::Conflict(format!(
                "Account {} is already banned",
                self.id
            )));
        }
        self.status = AccountStatus::Banned;
        self.metadata.ban = Some(BanAudit {
            banned_at: now,
            banned_by: banned_by.to_string(),
            ban_reason: reason.to_string(),
        });
        self.metadata.suspension = None;
        Ok(())
    }

    /// Lift a ban. Fails if the account is not currently banned.
    pub fn lift_ban(&mut self) -> DomainResult<()> {
        if self.status != AccountStatus::Banned {
            return Err(DomainError::Conflict(format!(
                "Account {} is not banned",
                self.id
            )));
        }
        self.status = AccountStatus::Active;
        self.metadata.ban = None;
        Ok(())
    }

    /// Transition to `Suspended`. Allowed from any status.
    pub fn begin_suspension(
        &mut self,
        reason: &str,
        suspended_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        self.status = AccountStatus::Suspended;
        self.metadata.suspension = Some(SuspensionAudit {
            suspended_at: now,
            suspended_until,
            suspension_reason: reason.to_string(),
        });
        self.metadata.ban = None;
    }

    /// Record a successful login. Metadata-only; never fails.
    pub fn record_login(&mut self, ip: Option<&str>, now: DateTime<Utc>) {
        self.metadata.login.login_count += 1;
        self.metadata.login.last_login_at = Some(now);
        self.metadata.login.last_login_ip = ip.map(str::to_string);
    }

    /// Free-text search predicate: case-insensitive on name/email,
    /// plain substring on phone.
    pub fn matches_search(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        if self.email.to_lowercase().contains(&needle) {
            return true;
        }
        if let Some(ref name) = self.name {
            if name.to_lowercase().contains(&needle) {
                return true;
            }
        }
        if let Some(ref phone) = self.phone {
            if phone.contains(query) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        Account {
            id: "acc-1".into(),
            email: "alice@example.com".into(),
            name: Some("Alice".into()),
            phone: Some("9876543210".into()),
            avatar: None,
            role: Role::User,
            status: AccountStatus::Active,
            email_verified: false,
            phone_verified: false,
            preferred_currency: Currency::Inr,
            preferences: Preferences::default(),
            metadata: AccountMetadata::default(),
            version: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn preferences_merge_keeps_unmentioned_fields() {
        let mut prefs = Preferences {
            newsletter: true,
            sms_notifications: true,
            order_updates: true,
            language: "de".into(),
            timezone: "Europe/Berlin".into(),
        };

        prefs.merge(&PreferencesUpdate {
            newsletter: Some(false),
            ..Default::default()
        });

        assert!(!prefs.newsletter);
        assert!(prefs.sms_notifications);
        assert!(prefs.order_updates);
        assert_eq!(prefs.language, "de");
        assert_eq!(prefs.timezone, "Europe/Berlin");
    }

    #[test]
    fn ban_then_unban_round_trip() {
        let mut account = sample_account();
        let now = Utc::now();

        account.begin_ban("spam", "admin-1", now).unwrap();
        assert_eq!(account.status, AccountStatus::Banned);
        let audit = account.metadata.ban.as_ref().unwrap();
        assert_eq!(audit.banned_by, "admin-1");
        assert_eq!(audit.ban_reason, "spam");

        // Second ban is rejected
        assert!(matches!(
            account.begin_ban("again", "admin-1", now),
            Err(DomainError::Conflict(_))
        ));

        account.lift_ban().unwrap();
        assert_eq!(account.status, AccountStatus::Active);
        assert!(account.metadata.ban.is_none());

        // Unban on a non-banned account is rejected
        assert!(matches!(account.lift_ban(), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn suspension_overwrites_ban_audit() {
        let mut account = sample_account();
        let now = Utc::now();
        account.begin_ban("spam", "admin-1", now).unwrap();

        account.begin_suspension("cooldown", None, now);
        assert_eq!(account.status, AccountStatus::Suspended);
        assert!(account.metadata.ban.is_none());
        assert_eq!(
            account
                .metadata
                .suspension
                .as_ref()
                .unwrap()
                .suspension_reason,
            "cooldown"
        );
    }

    #[test]
    fn merge_update_lowercases_email() {
        let mut account = sample_account();
        account.merge_update(&UpdateAccountDto {
            email: Some("Alice.New@Example.COM".into()),
            ..Default::default()
        });
        assert_eq!(account.email, "alice.new@example.com");
    }

    #[test]
    fn search_matches_name_email_and_phone() {
        let account = sample_account();
        assert!(account.matches_search("ALICE"));
        assert!(account.matches_search("example.com"));
        assert!(account.matches_search("98765"));
        assert!(!account.matches_search("bob"));
    }

    #[test]
    fn record_login_increments_count() {
        let mut account = sample_account();
        let now = Utc::now();
        account.record_login(Some("10.0.0.1"), now);
        account.record_login(None, now);

        assert_eq!(account.metadata.login.login_count, 2);
        assert_eq!(account.metadata.login.last_login_at, Some(now));
        assert_eq!(account.metadata.login.last_login_ip, None);
    }
}
