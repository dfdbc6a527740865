//! In-memory account store for development and testing.
//!
//! Implements the full [`AccountStore`] contract, including the
//! transactional invariants: a single write lock around every
//! read-check-write makes each mutation atomic, which is exactly the
//! guarantee the database-backed store gets from its transactions.
//! External-identity calls happen after the lock is released, mirroring
//! the "after the transaction commits" ordering of the production store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::application::ports::IdentityProvider;
use crate::domain::{
    Account, AccountFilter, AccountStore, BulkAccountUpdate, CreateAccountDto, DomainError,
    DomainResult, Role, UpdateAccountDto,
};
use crate::shared::PageParams;

pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
    identity: Arc<dyn IdentityProvider>,
}

impl MemoryAccountStore {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            identity,
        }
    }

    fn matches_filter(account: &Account, filter: &AccountFilter) -> bool {
        if let Some(role) = filter.role {
            if account.role != role {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if account.status != status {
                return false;
            }
        }
        if let Some(verified) = filter.email_verified {
            if account.email_verified != verified {
                return false;
            }
        }
        if let Some(after) = filter.created_after {
            if account.created_at < after {
                return false;
            }
        }
        if let Some(before) = filter.created_before {
            if account.created_at > before {
                return false;
            }
        }
        true
    }

    /// Snapshot of matching records, newest first (id as tie-breaker so
    /// ordering is stable when timestamps collide).
    fn filtered_sorted(&self, filter: &AccountFilter) -> Vec<Account> {
        let accounts = self.accounts.read().unwrap();
        let mut items: Vec<Account> = accounts
            .values()
            .filter(|a| Self::matches_filter(a, filter))
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        items
    }

    /// Atomic read-check-write on a single record: load, apply the
    /// decision function, stamp `updated_at`/`version`, store.
    fn mutate<F>(&self, id: &str, decide: F) -> DomainResult<Account>
    where
        F: FnOnce(&mut Account, DateTime<Utc>) -> DomainResult<()>,
    {
        let mut accounts = self.accounts.write().unwrap();
        let current = accounts
            .get(id)
            .ok_or_else(|| DomainError::account_not_found(id))?;

        let now = Utc::now();
        let mut next = current.clone();
        decide(&mut next, now)?;
        next.updated_at = now;
        next.version = current.version + 1;

        accounts.insert(id.to_string(), next.clone());
        Ok(next)
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn create(&self, dto: CreateAccountDto) -> DomainResult<Account> {
        let mut accounts = self.accounts.write().unwrap();

        if let Some(ref id) = dto.id {
            if accounts.contains_key(id) {
                return Err(DomainError::Conflict(format!(
                    "Account {} already exists",
                    id
                )));
            }
        }

        let email = dto.email.to_lowercase();
        if accounts.values().any(|a| a.email == email) {
            return Err(DomainError::Conflict(
                "Account with this email already exists".to_string(),
            ));
        }

        let id = dto
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let account = Account::from_create(dto, id.clone(), Utc::now());
        accounts.insert(id, account.clone());
        Ok(account)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        let needle = email.to_lowercase();
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .find(|a| a.email == needle)
            .cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> DomainResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .find(|a| a.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn find_all(
        &self,
        filter: AccountFilter,
        page: PageParams,
    ) -> DomainResult<Vec<Account>> {
        let items = self.filtered_sorted(&filter);

        // Page first, then narrow by the text search. Searching can
        // therefore return fewer than `limit` items; callers rely on
        // this ordering.
        let mut page_items: Vec<Account> = items
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect();

        if let Some(ref query) = filter.search {
            page_items.retain(|a| a.matches_search(query));
        }

        Ok(page_items)
    }

    async fn search(&self, query: &str, filter: AccountFilter) -> DomainResult<Vec<Account>> {
        let candidates = self.filtered_sorted(&filter);
        Ok(candidates
            .into_iter()
            .take(100)
            .filter(|a| a.matches_search(query))
            .collect())
    }

    async fn update(
        &self,
        id: &str,
        data: UpdateAccountDto,
        expected_version: Option<i64>,
    ) -> DomainResult<Account> {
        let mut accounts = self.accounts.write().unwrap();
        let current = accounts
            .get(id)
            .ok_or_else(|| DomainError::account_not_found(id))?;

        if let Some(expected) = expected_version {
            if current.version != expected {
                return Err(DomainError::Conflict(format!(
                    "Expected version {}, got {}",
                    expected, current.version
                )));
            }
        }

        if let Some(ref new_email) = data.email {
            let new_email = new_email.to_lowercase();
            if new_email != current.email
                && accounts
                    .values()
                    .any(|a| a.id != id && a.email == new_email)
            {
                return Err(DomainError::Conflict(
                    "Account with this email already exists".to_string(),
                ));
            }
        }

        let mut next = current.clone();
        next.merge_update(&data);
        next.updated_at = Utc::now();
        next.version = current.version + 1;

        accounts.insert(id.to_string(), next.clone());
        Ok(next)
    }

    async fn update_role(&self, id: &str, role: Role) -> DomainResult<Account> {
        let data = UpdateAccountDto {
            role: Some(role),
            ..Default::default()
        };
        let account = self.update(id, data, None).await?;

        self.identity
            .set_role_claims(id, role)
            .await
            .map_err(|e| {
                DomainError::Internal(format!(
                    "Role persisted but identity propagation failed: {}",
                    e
                ))
            })?;

        Ok(account)
    }

    async fn ban(&self, id: &str, reason: &str, banned_by: &str) -> DomainResult<Account> {
        let account = self.mutate(id, |a, now| a.begin_ban(reason, banned_by, now))?;

        if let Err(e) = self.identity.set_disabled(id, true).await {
            warn!(account_id = id, error = %e, "Failed to disable external identity after ban");
        }
        Ok(account)
    }

    async fn unban(&self, id: &str) -> DomainResult<Account> {
        let account = self.mutate(id, |a, _| a.lift_ban())?;

        if let Err(e) = self.identity.set_disabled(id, false).await {
            warn!(account_id = id, error = %e, "Failed to re-enable external identity after unban");
        }
        Ok(account)
    }

    async fn suspend(
        &self,
        id: &str,
        reason: &str,
        suspended_until: Option<DateTime<Utc>>,
    ) -> DomainResult<Account> {
        self.mutate(id, |a, now| {
            a.begin_suspension(reason, suspended_until, now);
            Ok(())
        })
    }

    async fn delete(&self, id: &str) -> DomainResult<Account> {
        let data = UpdateAccountDto {
            status: Some(crate::domain::AccountStatus::Inactive),
            ..Default::default()
        };
        self.update(id, data, None).await
    }

    async fn permanent_delete(&self, id: &str) -> DomainResult<()> {
        {
            let mut accounts = self.accounts.write().unwrap();
            if accounts.remove(id).is_none() {
                return Err(DomainError::account_not_found(id));
            }
        }

        if let Err(e) = self.identity.delete_identity(id).await {
            warn!(account_id = id, error = %e, "Failed to delete external identity");
        }
        Ok(())
    }

    async fn update_last_login(&self, id: &str, ip: Option<&str>) {
        let result = self.mutate(id, |a, now| {
            a.record_login(ip, now);
            Ok(())
        });
        // Missing record or any other failure: login tracking never
        // propagates an error.
        if let Err(DomainError::NotFound { .. }) = result {
            return;
        }
        if let Err(e) = result {
            warn!(account_id = id, error = %e, "Failed to record login");
        }
    }

    async fn count(&self, filter: AccountFilter) -> DomainResult<u64> {
        let accounts = self.accounts.read().unwrap();
        Ok(accounts
            .values()
            .filter(|a| Self::matches_filter(a, &filter))
            .count() as u64)
    }

    async fn bulk_update(&self, updates: Vec<BulkAccountUpdate>) -> DomainResult<()> {
        let mut accounts = self.accounts.write().unwrap();

        // All-or-nothing: verify every target exists before touching any.
        for item in &updates {
            if !accounts.contains_key(&item.id) {
                return Err(DomainError::account_not_found(&item.id));
            }
        }

        let now = Utc::now();
        for item in updates {
            if let Some(current) = accounts.get(&item.id) {
                let mut next = current.clone();
                next.merge_update(&item.data);
                next.updated_at = now;
                accounts.insert(item.id, next);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::IdentityError;
    use crate::domain::AccountStatus;
    use crate::infrastructure::identity::LoggingIdentityProvider;
    use std::sync::Mutex;

    fn store() -> MemoryAccountStore {
        MemoryAccountStore::new(Arc::new(LoggingIdentityProvider::default()))
    }

    fn create_dto(id: &str, email: &str) -> CreateAccountDto {
        CreateAccountDto {
            id: Some(id.into()),
            email: email.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = store();
        let first = store.create(create_dto("u1", "a@x.com")).await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(first.email, "a@x.com");

        let err = store.create(create_dto("u2", "A@X.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(store.count(AccountFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn version_increments_once_per_update() {
        let store = store();
        store.create(create_dto("u1", "a@x.com")).await.unwrap();

        for n in 0..4 {
            let updated = store
                .update(
                    "u1",
                    UpdateAccountDto {
                        name: Some(format!("name-{}", n)),
                        ..Default::default()
                    },
                    None,
                )
                .await
                .unwrap();
            assert_eq!(updated.version, 2 + n);
        }
    }

    #[tokio::test]
    async fn stale_expected_version_conflicts_and_leaves_record_unchanged() {
        let store = store();
        store.create(create_dto("u1", "a@x.com")).await.unwrap();

        let updated = store
            .update(
                "u1",
                UpdateAccountDto {
                    name: Some("B".into()),
                    ..Default::default()
                },
                Some(1),
            )
            .await
            .unwrap();
        assert_eq!(updated.version, 2);

        let err = store
            .update(
                "u1",
                UpdateAccountDto {
                    name: Some("C".into()),
                    ..Default::default()
                },
                Some(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert_eq!(err.to_string(), "Conflict: Expected version 1, got 2");

        let current = store.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(current.name.as_deref(), Some("B"));
        assert_eq!(current.version, 2);
    }

    #[tokio::test]
    async fn email_change_checks_uniqueness_excluding_self() {
        let store = store();
        store.create(create_dto("u1", "a@x.com")).await.unwrap();
        store.create(create_dto("u2", "b@x.com")).await.unwrap();

        let err = store
            .update(
                "u1",
                UpdateAccountDto {
                    email: Some("B@X.com".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // Re-casing your own email is not a conflict
        let updated = store
            .update(
                "u1",
                UpdateAccountDto {
                    email: Some("A@X.com".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "a@x.com");
    }

    #[tokio::test]
    async fn ban_unban_cycle_with_audit_and_versions() {
        let store = store();
        store.create(create_dto("u1", "a@x.com")).await.unwrap();

        let banned = store.ban("u1", "spam", "admin-1").await.unwrap();
        assert_eq!(banned.status, AccountStatus::Banned);
        assert_eq!(banned.version, 2);
        let audit = banned.metadata.ban.as_ref().unwrap();
        assert_eq!(audit.banned_by, "admin-1");
        assert_eq!(audit.ban_reason, "spam");

        let err = store.ban("u1", "again", "admin-1").await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let unbanned = store.unban("u1").await.unwrap();
        assert_eq!(unbanned.status, AccountStatus::Active);
        assert_eq!(unbanned.version, 3);
        assert!(unbanned.metadata.ban.is_none());

        let err = store.unban("u1").await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn suspend_is_allowed_from_any_status() {
        let store = store();
        store.create(create_dto("u1", "a@x.com")).await.unwrap();
        store.ban("u1", "spam", "admin-1").await.unwrap();

        let suspended = store.suspend("u1", "cooling off", None).await.unwrap();
        assert_eq!(suspended.status, AccountStatus::Suspended);
        assert!(suspended.metadata.ban.is_none());
        assert_eq!(
            suspended
                .metadata
                .suspension
                .as_ref()
                .unwrap()
                .suspension_reason,
            "cooling off"
        );
    }

    #[tokio::test]
    async fn soft_delete_goes_through_versioned_path() {
        let store = store();
        store.create(create_dto("u1", "a@x.com")).await.unwrap();

        let deleted = store.delete("u1").await.unwrap();
        assert_eq!(deleted.status, AccountStatus::Inactive);
        assert_eq!(deleted.version, 2);
        assert!(store.find_by_id("u1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn permanent_delete_removes_record() {
        let store = store();
        store.create(create_dto("u1", "a@x.com")).await.unwrap();

        store.permanent_delete("u1").await.unwrap();
        assert!(store.find_by_id("u1").await.unwrap().is_none());

        let err = store.permanent_delete("u1").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn lookups_by_email_and_phone() {
        let store = store();
        let dto = CreateAccountDto {
            id: Some("u1".into()),
            email: "Mixed.Case@X.com".into(),
            phone: Some("9876543210".into()),
            ..Default::default()
        };
        store.create(dto).await.unwrap();

        assert!(store
            .find_by_email("MIXED.case@x.COM")
            .await
            .unwrap()
            .is_some());
        assert!(store.find_by_email("other@x.com").await.unwrap().is_none());
        assert!(store.find_by_phone("9876543210").await.unwrap().is_some());
        assert!(store.find_by_phone("987654321").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn search_is_limited_and_filtered() {
        let store = store();
        for n in 0..3 {
            store
                .create(CreateAccountDto {
                    id: Some(format!("u{}", n)),
                    email: format!("user{}@x.com", n),
                    name: Some("Searchable".into()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }

        let hits = store
            .search("searchable", AccountFilter::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 3);

        let none = store
            .search(
                "searchable",
                AccountFilter {
                    role: Some(Role::Seller),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn text_search_narrows_the_already_paginated_page() {
        let store = store();
        // Newest-first ordering (id is the tie-breaker): u3, u2, u1.
        for n in 1..=3 {
            store
                .create(create_dto(&format!("u{}", n), &format!("user{}@x.com", n)))
                .await
                .unwrap();
        }

        // u1 matches the search but sits outside the first page, so the
        // page comes back empty. Deliberate fidelity to the upstream
        // pagination-before-search ordering.
        let page = store
            .find_all(
                AccountFilter {
                    search: Some("user1".into()),
                    ..Default::default()
                },
                PageParams {
                    limit: 2,
                    offset: 0,
                },
            )
            .await
            .unwrap();
        assert!(page.is_empty());

        // The same search on the second page finds it.
        let page = store
            .find_all(
                AccountFilter {
                    search: Some("user1".into()),
                    ..Default::default()
                },
                PageParams {
                    limit: 2,
                    offset: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].id, "u1");
    }

    #[tokio::test]
    async fn count_honors_filters() {
        let store = store();
        store.create(create_dto("u1", "a@x.com")).await.unwrap();
        store
            .create(CreateAccountDto {
                id: Some("u2".into()),
                email: "b@x.com".into(),
                role: Some(Role::Seller),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(store.count(AccountFilter::default()).await.unwrap(), 2);
        assert_eq!(
            store
                .count(AccountFilter {
                    role: Some(Role::Seller),
                    ..Default::default()
                })
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn bulk_update_is_all_or_nothing_and_skips_versioning() {
        let store = store();
        store.create(create_dto("u1", "a@x.com")).await.unwrap();
        store.create(create_dto("u2", "b@x.com")).await.unwrap();

        // Missing target: nothing is applied
        let err = store
            .bulk_update(vec![
                BulkAccountUpdate {
                    id: "u1".into(),
                    data: UpdateAccountDto {
                        name: Some("Renamed".into()),
                        ..Default::default()
                    },
                },
                BulkAccountUpdate {
                    id: "ghost".into(),
                    data: UpdateAccountDto::default(),
                },
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(
            store.find_by_id("u1").await.unwrap().unwrap().name,
            None
        );

        // Valid batch: both applied with one shared timestamp, no
        // version bump (the weaker consistency tier).
        store
            .bulk_update(vec![
                BulkAccountUpdate {
                    id: "u1".into(),
                    data: UpdateAccountDto {
                        name: Some("One".into()),
                        ..Default::default()
                    },
                },
                BulkAccountUpdate {
                    id: "u2".into(),
                    data: UpdateAccountDto {
                        name: Some("Two".into()),
                        ..Default::default()
                    },
                },
            ])
            .await
            .unwrap();

        let u1 = store.find_by_id("u1").await.unwrap().unwrap();
        let u2 = store.find_by_id("u2").await.unwrap().unwrap();
        assert_eq!(u1.name.as_deref(), Some("One"));
        assert_eq!(u1.version, 1);
        assert_eq!(u1.updated_at, u2.updated_at);
    }

    // ── Identity propagation ────────────────────────────────────

    struct RecordingIdentity {
        calls: Mutex<Vec<String>>,
        fail_role_claims: bool,
    }

    #[async_trait]
    impl IdentityProvider for RecordingIdentity {
        async fn set_role_claims(
            &self,
            account_id: &str,
            role: Role,
        ) -> Result<(), IdentityError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("claims:{}:{}", account_id, role.as_str()));
            if self.fail_role_claims {
                return Err(IdentityError::Provider("claims backend down".into()));
            }
            Ok(())
        }

        async fn set_disabled(
            &self,
            account_id: &str,
            disabled: bool,
        ) -> Result<(), IdentityError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("disabled:{}:{}", account_id, disabled));
            Ok(())
        }

        async fn delete_identity(&self, account_id: &str) -> Result<(), IdentityError> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("delete:{}", account_id));
            Ok(())
        }
    }

    #[tokio::test]
    async fn role_update_propagates_to_identity_provider() {
        let identity = Arc::new(RecordingIdentity {
            calls: Mutex::new(Vec::new()),
            fail_role_claims: false,
        });
        let store = MemoryAccountStore::new(identity.clone());
        store.create(create_dto("u1", "a@x.com")).await.unwrap();

        store.update_role("u1", Role::Seller).await.unwrap();
        assert_eq!(
            identity.calls.lock().unwrap().as_slice(),
            ["claims:u1:seller"]
        );
    }

    #[tokio::test]
    async fn identity_failure_after_role_persist_surfaces_internal() {
        let identity = Arc::new(RecordingIdentity {
            calls: Mutex::new(Vec::new()),
            fail_role_claims: true,
        });
        let store = MemoryAccountStore::new(identity);
        store.create(create_dto("u1", "a@x.com")).await.unwrap();

        let err = store.update_role("u1", Role::Seller).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));

        // The persisted change is not rolled back
        let account = store.find_by_id("u1").await.unwrap().unwrap();
        assert_eq!(account.role, Role::Seller);
    }

    #[tokio::test]
    async fn ban_and_permanent_delete_touch_identity() {
        let identity = Arc::new(RecordingIdentity {
            calls: Mutex::new(Vec::new()),
            fail_role_claims: false,
        });
        let store = MemoryAccountStore::new(identity.clone());
        store.create(create_dto("u1", "a@x.com")).await.unwrap();

        store.ban("u1", "spam", "admin-1").await.unwrap();
        store.unban("u1").await.unwrap();
        store.permanent_delete("u1").await.unwrap();

        assert_eq!(
            identity.calls.lock().unwrap().as_slice(),
            ["disabled:u1:true", "disabled:u1:false", "delete:u1"]
        );
    }
}
