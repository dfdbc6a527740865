//! Account policy service — application-layer orchestration
//!
//! All authorization and business-rule enforcement lives here. HTTP
//! handlers are thin wrappers that delegate to this service; persistence
//! is reached only through the [`AccountStore`] trait.

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    Account, AccountFilter, AccountStore, BulkAccountUpdate, CreateAccountDto, Currency,
    DomainError, DomainResult, Preferences, PreferencesUpdate, RequestingUser, Role,
    UpdateAccountDto,
};
use crate::shared::{PageParams, PaginatedResult};

use super::validation::validate_profile_data;

/// Settings view: the slice of an account the settings endpoints expose.
#[derive(Debug, Clone)]
pub struct AccountSettings {
    pub preferred_currency: Currency,
    pub preferences: Preferences,
}

/// Settings update payload: preferences merge field-by-field, and the
/// preferred currency can change independently.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub preferred_currency: Option<Currency>,
    pub preferences: Option<PreferencesUpdate>,
}

/// Account policy service.
///
/// Holds the store behind `Arc<dyn AccountStore>`; constructed once at
/// startup and shared by the request handlers.
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    // ── Authorization helpers ───────────────────────────────────

    fn authorize_self_or_admin(
        requesting: &RequestingUser,
        target_account_id: &str,
    ) -> DomainResult<()> {
        if requesting.may_act_on(target_account_id) {
            return Ok(());
        }
        Err(DomainError::Authorization(
            "You do not have permission to access this account".to_string(),
        ))
    }

    fn authorize_admin(requesting: &RequestingUser) -> DomainResult<()> {
        if requesting.is_admin() {
            return Ok(());
        }
        Err(DomainError::Authorization("Admin access required".to_string()))
    }

    async fn load_account(&self, account_id: &str) -> DomainResult<Account> {
        self.store
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| DomainError::account_not_found(account_id))
    }

    // ── Profile ─────────────────────────────────────────────────

    /// Fetch a profile. Self-or-admin.
    pub async fn get_profile(
        &self,
        account_id: &str,
        requesting: &RequestingUser,
    ) -> DomainResult<Account> {
        Self::authorize_self_or_admin(requesting, account_id)?;
        self.load_account(account_id).await
    }

    /// Update profile fields. Self-or-admin, but only admins may touch
    /// `role`/`status` — including on their own record via this path.
    pub async fn update_profile(
        &self,
        account_id: &str,
        data: UpdateAccountDto,
        requesting: &RequestingUser,
        expected_version: Option<i64>,
    ) -> DomainResult<Account> {
        Self::authorize_self_or_admin(requesting, account_id)?;

        if !requesting.is_admin() && (data.role.is_some() || data.status.is_some()) {
            return Err(DomainError::Authorization(
                "You cannot change role or status fields".to_string(),
            ));
        }

        validate_profile_data(&data)?;

        self.store.update(account_id, data, expected_version).await
    }

    // ── Settings & preferences ──────────────────────────────────

    pub async fn get_account_settings(
        &self,
        account_id: &str,
        requesting: &RequestingUser,
    ) -> DomainResult<AccountSettings> {
        Self::authorize_self_or_admin(requesting, account_id)?;
        let account = self.load_account(account_id).await?;
        Ok(AccountSettings {
            preferred_currency: account.preferred_currency,
            preferences: account.preferences,
        })
    }

    pub async fn update_account_settings(
        &self,
        account_id: &str,
        settings: SettingsUpdate,
        requesting: &RequestingUser,
    ) -> DomainResult<AccountSettings> {
        Self::authorize_self_or_admin(requesting, account_id)?;

        let data = UpdateAccountDto {
            preferred_currency: settings.preferred_currency,
            preferences: settings.preferences,
            ..Default::default()
        };
        let account = self.store.update(account_id, data, None).await?;
        Ok(AccountSettings {
            preferred_currency: account.preferred_currency,
            preferences: account.preferences,
        })
    }

    pub async fn get_preferences(
        &self,
        account_id: &str,
        requesting: &RequestingUser,
    ) -> DomainResult<Preferences> {
        Self::authorize_self_or_admin(requesting, account_id)?;
        Ok(self.load_account(account_id).await?.preferences)
    }

    /// Merge preference fields onto the stored record; unmentioned
    /// fields keep their values.
    pub async fn update_preferences(
        &self,
        account_id: &str,
        preferences: PreferencesUpdate,
        requesting: &RequestingUser,
    ) -> DomainResult<Preferences> {
        Self::authorize_self_or_admin(requesting, account_id)?;

        let data = UpdateAccountDto {
            preferences: Some(preferences),
            ..Default::default()
        };
        Ok(self.store.update(account_id, data, None).await?.preferences)
    }

    // ── Account lifecycle ───────────────────────────────────────

    /// Soft-delete an account. Self-or-admin, except that an admin may
    /// not delete their own account.
    pub async fn delete_account(
        &self,
        account_id: &str,
        requesting: &RequestingUser,
    ) -> DomainResult<Account> {
        Self::authorize_self_or_admin(requesting, account_id)?;

        if requesting.is_admin() && requesting.uid == account_id {
            return Err(DomainError::Conflict(
                "Admins cannot delete their own account".to_string(),
            ));
        }

        let account = self.store.delete(account_id).await?;
        info!(account_id, "Account soft-deleted");
        Ok(account)
    }

    // ── Admin operations ────────────────────────────────────────

    /// List accounts with filters and pagination. Admin-only.
    pub async fn list_accounts(
        &self,
        filter: AccountFilter,
        page: PageParams,
        requesting: &RequestingUser,
    ) -> DomainResult<PaginatedResult<Account>> {
        Self::authorize_admin(requesting)?;

        let total = self.store.count(filter.clone()).await?;
        let items = self.store.find_all(filter, page).await?;
        Ok(PaginatedResult::new(items, total, page))
    }

    /// Free-text search. Admin-only; the query must be non-empty.
    pub async fn search_accounts(
        &self,
        query: &str,
        filter: AccountFilter,
        requesting: &RequestingUser,
    ) -> DomainResult<Vec<Account>> {
        Self::authorize_admin(requesting)?;

        if query.trim().is_empty() {
            return Err(DomainError::Validation(
                "Search query is required".to_string(),
            ));
        }
        self.store.search(query, filter).await
    }

    pub async fn get_account_by_id(
        &self,
        account_id: &str,
        requesting: &RequestingUser,
    ) -> DomainResult<Account> {
        Self::authorize_admin(requesting)?;
        self.load_account(account_id).await
    }

    pub async fn get_account_by_email(
        &self,
        email: &str,
        requesting: &RequestingUser,
    ) -> DomainResult<Account> {
        Self::authorize_admin(requesting)?;
        self.store
            .find_by_email(email)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: "Account",
                field: "email",
                value: email.to_string(),
            })
    }

    /// Create an account. Admin-only; the store enforces email
    /// uniqueness transactionally.
    pub async fn create_account(
        &self,
        dto: CreateAccountDto,
        requesting: &RequestingUser,
    ) -> DomainResult<Account> {
        Self::authorize_admin(requesting)?;

        let probe = UpdateAccountDto {
            email: Some(dto.email.clone()),
            name: dto.name.clone(),
            phone: dto.phone.clone(),
            avatar: dto.avatar.clone(),
            ..Default::default()
        };
        validate_profile_data(&probe)?;

        let account = self.store.create(dto).await?;
        info!(account_id = %account.id, "Account created");
        Ok(account)
    }

    /// Backfill a profile record for an identity that exists only in the
    /// external auth system. Admin-only. Fails `Conflict` if a record
    /// already exists under `account_id` — this is a create, never an
    /// overwrite.
    pub async fn create_profile_admin(
        &self,
        account_id: &str,
        mut dto: CreateAccountDto,
        requesting: &RequestingUser,
    ) -> DomainResult<Account> {
        Self::authorize_admin(requesting)?;

        dto.id = Some(account_id.to_string());
        let probe = UpdateAccountDto {
            email: Some(dto.email.clone()),
            name: dto.name.clone(),
            phone: dto.phone.clone(),
            avatar: dto.avatar.clone(),
            ..Default::default()
        };
        validate_profile_data(&probe)?;

        let account = self.store.create(dto).await?;
        info!(account_id, "Profile backfilled for existing identity");
        Ok(account)
    }

    /// Change an account's role. Admin-only; admins may not change
    /// their own role.
    pub async fn update_role(
        &self,
        account_id: &str,
        role: Role,
        requesting: &RequestingUser,
    ) -> DomainResult<Account> {
        Self::authorize_admin(requesting)?;

        if requesting.uid == account_id {
            return Err(DomainError::Authorization(
                "Admins cannot change their own role".to_string(),
            ));
        }

        let account = self.store.update_role(account_id, role).await?;
        info!(account_id, role = role.as_str(), "Account role updated");
        Ok(account)
    }

    /// Ban or unban an account. Admin-only; self-ban is blocked.
    pub async fn set_banned(
        &self,
        account_id: &str,
        banned: bool,
        reason: Option<String>,
        requesting: &RequestingUser,
    ) -> DomainResult<Account> {
        Self::authorize_admin(requesting)?;

        if banned && requesting.uid == account_id {
            return Err(DomainError::Authorization(
                "Admins cannot ban themselves".to_string(),
            ));
        }

        if banned {
            let reason = reason.unwrap_or_else(|| "No reason provided".to_string());
            let account = self.store.ban(account_id, &reason, &requesting.uid).await?;
            info!(account_id, banned_by = %requesting.uid, "Account banned");
            Ok(account)
        } else {
            let account = self.store.unban(account_id).await?;
            info!(account_id, "Account unbanned");
            Ok(account)
        }
    }

    /// Suspend an account. Admin-only; unconditional transition.
    pub async fn suspend_account(
        &self,
        account_id: &str,
        reason: &str,
        suspended_until: Option<chrono::DateTime<chrono::Utc>>,
        requesting: &RequestingUser,
    ) -> DomainResult<Account> {
        Self::authorize_admin(requesting)?;
        let account = self
            .store
            .suspend(account_id, reason, suspended_until)
            .await?;
        info!(account_id, "Account suspended");
        Ok(account)
    }

    /// Generic admin update. Admins may edit any field on other
    /// accounts, but not their own `role`/`status`.
    pub async fn admin_update(
        &self,
        account_id: &str,
        data: UpdateAccountDto,
        requesting: &RequestingUser,
        expected_version: Option<i64>,
    ) -> DomainResult<Account> {
        Self::authorize_admin(requesting)?;

        if requesting.uid == account_id && (data.role.is_some() || data.status.is_some()) {
            return Err(DomainError::Authorization(
                "Admins cannot change their own role or status".to_string(),
            ));
        }

        validate_profile_data(&data)?;

        self.store.update(account_id, data, expected_version).await
    }

    pub async fn count_accounts(
        &self,
        filter: AccountFilter,
        requesting: &RequestingUser,
    ) -> DomainResult<u64> {
        Self::authorize_admin(requesting)?;
        self.store.count(filter).await
    }

    /// Bulk partial updates. Admin-only. The whole batch is rejected on
    /// the first item that would grant the admin role; accepted batches
    /// go to the store's single atomic batch write.
    pub async fn bulk_update(
        &self,
        updates: Vec<BulkAccountUpdate>,
        requesting: &RequestingUser,
    ) -> DomainResult<()> {
        Self::authorize_admin(requesting)?;

        for item in &updates {
            if item.data.role == Some(Role::Admin) {
                return Err(DomainError::Validation(format!(
                    "Cannot assign admin role via bulk update (account {})",
                    item.id
                )));
            }
        }

        let count = updates.len();
        self.store.bulk_update(updates).await?;
        info!(count, "Bulk account update applied");
        Ok(())
    }

    /// Permanently delete an account and its external identity.
    /// Admin-only; admins may not delete themselves.
    pub async fn permanent_delete(
        &self,
        account_id: &str,
        requesting: &RequestingUser,
    ) -> DomainResult<()> {
        Self::authorize_admin(requesting)?;

        if requesting.uid == account_id {
            return Err(DomainError::Conflict(
                "Admins cannot delete their own account".to_string(),
            ));
        }

        self.store.permanent_delete(account_id).await?;
        info!(account_id, "Account permanently deleted");
        Ok(())
    }

    // ── System use ──────────────────────────────────────────────

    /// Record a login event. No authorization: called only by trusted
    /// internal code after the credential has already been verified.
    /// Never fails.
    pub async fn update_last_login(&self, account_id: &str, ip: Option<&str>) {
        self.store.update_last_login(account_id, ip).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::IdentityProvider;
    use crate::infrastructure::identity::LoggingIdentityProvider;
    use crate::infrastructure::storage::MemoryAccountStore;
    use crate::domain::AccountStatus;

    fn service() -> AccountService {
        let identity: Arc<dyn IdentityProvider> = Arc::new(LoggingIdentityProvider::default());
        AccountService::new(Arc::new(MemoryAccountStore::new(identity)))
    }

    fn admin(uid: &str) -> RequestingUser {
        RequestingUser {
            uid: uid.into(),
            role: Role::Admin,
            seller_id: None,
            email: None,
        }
    }

    fn user(uid: &str) -> RequestingUser {
        RequestingUser {
            uid: uid.into(),
            role: Role::User,
            seller_id: None,
            email: None,
        }
    }

    async fn seed(service: &AccountService, id: &str, email: &str) -> Account {
        service
            .store
            .create(CreateAccountDto {
                id: Some(id.into()),
                email: email.into(),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn non_admin_cannot_read_another_profile() {
        let svc = service();
        seed(&svc, "a", "a@x.com").await;
        seed(&svc, "b", "b@x.com").await;

        svc.get_profile("a", &user("a")).await.unwrap();
        let err = svc.get_profile("b", &user("a")).await.unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
    }

    #[tokio::test]
    async fn self_role_change_is_blocked_and_role_unchanged() {
        let svc = service();
        seed(&svc, "a", "a@x.com").await;

        let data = UpdateAccountDto {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let err = svc
            .update_profile("a", data, &user("a"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));

        let account = svc.get_profile("a", &user("a")).await.unwrap();
        assert_eq!(account.role, Role::User);
        assert_eq!(account.version, 1);
    }

    #[tokio::test]
    async fn admin_self_protection() {
        let svc = service();
        seed(&svc, "root", "root@x.com").await;
        let root = admin("root");

        let err = svc
            .set_banned("root", true, Some("oops".into()), &root)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));

        let err = svc.update_role("root", Role::User, &root).await.unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));

        let err = svc.delete_account("root", &root).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let data = UpdateAccountDto {
            status: Some(AccountStatus::Inactive),
            ..Default::default()
        };
        let err = svc.admin_update("root", data, &root, None).await.unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));

        // Non-lifecycle fields on self are still fine
        let data = UpdateAccountDto {
            name: Some("Root Admin".into()),
            ..Default::default()
        };
        let updated = svc.admin_update("root", data, &root, None).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Root Admin"));
    }

    #[tokio::test]
    async fn settings_visible_to_self_only() {
        let svc = service();
        seed(&svc, "a", "a@x.com").await;
        seed(&svc, "b", "b@x.com").await;

        svc.get_account_settings("a", &user("a")).await.unwrap();
        let err = svc
            .get_account_settings("b", &user("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Authorization(_)));
    }

    #[tokio::test]
    async fn preferences_update_merges() {
        let svc = service();
        seed(&svc, "a", "a@x.com").await;

        let prefs = svc
            .update_preferences(
                "a",
                PreferencesUpdate {
                    newsletter: Some(false),
                    ..Default::default()
                },
                &user("a"),
            )
            .await
            .unwrap();

        // Defaults other than the merged field survive
        assert!(!prefs.newsletter);
        assert!(prefs.order_updates);
        assert_eq!(prefs.language, "en");
    }

    #[tokio::test]
    async fn settings_update_changes_currency_independently() {
        let svc = service();
        seed(&svc, "a", "a@x.com").await;

        let settings = svc
            .update_account_settings(
                "a",
                SettingsUpdate {
                    preferred_currency: Some(Currency::Eur),
                    preferences: None,
                },
                &user("a"),
            )
            .await
            .unwrap();

        assert_eq!(settings.preferred_currency, Currency::Eur);
        assert!(settings.preferences.newsletter);
    }

    #[tokio::test]
    async fn bulk_update_rejects_admin_role_with_zero_writes() {
        let svc = service();
        seed(&svc, "a", "a@x.com").await;
        seed(&svc, "b", "b@x.com").await;

        let updates = vec![
            BulkAccountUpdate {
                id: "a".into(),
                data: UpdateAccountDto {
                    name: Some("Renamed".into()),
                    ..Default::default()
                },
            },
            BulkAccountUpdate {
                id: "b".into(),
                data: UpdateAccountDto {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            },
        ];

        let err = svc.bulk_update(updates, &admin("root")).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(err.to_string().contains("b"));

        // First item was not applied either
        let a = svc.get_account_by_id("a", &admin("root")).await.unwrap();
        assert_eq!(a.name, None);
    }

    #[tokio::test]
    async fn search_requires_query() {
        let svc = service();
        let err = svc
            .search_accounts("   ", AccountFilter::default(), &admin("root"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn admin_endpoints_reject_non_admins() {
        let svc = service();
        seed(&svc, "a", "a@x.com").await;
        let caller = user("a");

        assert!(matches!(
            svc.list_accounts(AccountFilter::default(), PageParams::default(), &caller)
                .await
                .unwrap_err(),
            DomainError::Authorization(_)
        ));
        assert!(matches!(
            svc.count_accounts(AccountFilter::default(), &caller)
                .await
                .unwrap_err(),
            DomainError::Authorization(_)
        ));
        assert!(matches!(
            svc.get_account_by_email("a@x.com", &caller).await.unwrap_err(),
            DomainError::Authorization(_)
        ));
        assert!(matches!(
            svc.bulk_update(Vec::new(), &caller).await.unwrap_err(),
            DomainError::Authorization(_)
        ));
    }

    #[tokio::test]
    async fn backfill_refuses_to_overwrite_existing_profile() {
        let svc = service();
        seed(&svc, "uid-1", "a@x.com").await;

        let err = svc
            .create_profile_admin(
                "uid-1",
                CreateAccountDto {
                    email: "other@x.com".into(),
                    ..Default::default()
                },
                &admin("root"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // Fresh id works and uses the pre-assigned identifier
        let account = svc
            .create_profile_admin(
                "uid-2",
                CreateAccountDto {
                    email: "new@x.com".into(),
                    ..Default::default()
                },
                &admin("root"),
            )
            .await
            .unwrap();
        assert_eq!(account.id, "uid-2");
        assert_eq!(account.version, 1);
    }

    #[tokio::test]
    async fn ban_then_unban_flow() {
        let svc = service();
        seed(&svc, "a", "a@x.com").await;
        let root = admin("root");

        let banned = svc
            .set_banned("a", true, Some("spam".into()), &root)
            .await
            .unwrap();
        assert_eq!(banned.status, AccountStatus::Banned);
        assert_eq!(banned.version, 2);
        assert_eq!(banned.metadata.ban.as_ref().unwrap().banned_by, "root");

        let unbanned = svc.set_banned("a", false, None, &root).await.unwrap();
        assert_eq!(unbanned.status, AccountStatus::Active);
        assert_eq!(unbanned.version, 3);
        assert!(unbanned.metadata.ban.is_none());
    }

    #[tokio::test]
    async fn update_last_login_never_fails() {
        let svc = service();
        // Unknown id: silent no-op
        svc.update_last_login("ghost", Some("10.0.0.1")).await;

        seed(&svc, "a", "a@x.com").await;
        svc.update_last_login("a", Some("10.0.0.1")).await;
        let account = svc.get_profile("a", &user("a")).await.unwrap();
        assert_eq!(account.metadata.login.login_count, 1);
        assert_eq!(
            account.metadata.login.last_login_ip.as_deref(),
            Some("10.0.0.1")
        );
    }
}
