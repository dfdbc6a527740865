//! SeaORM implementation of the account store.
//!
//! Every mutating operation runs its read-check-write inside a database
//! transaction; the status transitions share one `mutate_in_txn` helper
//! so the concurrency contract lives in a single place. External
//! identity calls are made only after the transaction has committed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionError, TransactionTrait,
};
use tracing::warn;
use uuid::Uuid;

use crate::application::ports::IdentityProvider;
use crate::domain::{
    Account, AccountFilter, AccountMetadata, AccountStatus, AccountStore, BulkAccountUpdate,
    CreateAccountDto, Currency, DomainError, DomainResult, Preferences, Role, UpdateAccountDto,
};
use crate::infrastructure::database::entities::account;
use crate::shared::PageParams;

pub struct SeaOrmAccountStore {
    db: DatabaseConnection,
    identity: Arc<dyn IdentityProvider>,
}

impl SeaOrmAccountStore {
    pub fn new(db: DatabaseConnection, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { db, identity }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: account::Role) -> Role {
    match role {
        account::Role::Admin => Role::Admin,
        account::Role::Seller => Role::Seller,
        account::Role::User => Role::User,
    }
}

fn domain_role_to_entity(role: Role) -> account::Role {
    match role {
        Role::Admin => account::Role::Admin,
        Role::Seller => account::Role::Seller,
        Role::User => account::Role::User,
    }
}

fn entity_status_to_domain(status: account::AccountStatus) -> AccountStatus {
    match status {
        account::AccountStatus::Active => AccountStatus::Active,
        account::AccountStatus::Inactive => AccountStatus::Inactive,
        account::AccountStatus::Suspended => AccountStatus::Suspended,
        account::AccountStatus::Banned => AccountStatus::Banned,
    }
}

fn domain_status_to_entity(status: AccountStatus) -> account::AccountStatus {
    match status {
        AccountStatus::Active => account::AccountStatus::Active,
        AccountStatus::Inactive => account::AccountStatus::Inactive,
        AccountStatus::Suspended => account::AccountStatus::Suspended,
        AccountStatus::Banned => account::AccountStatus::Banned,
    }
}

fn entity_currency_to_domain(currency: account::Currency) -> Currency {
    match currency {
        account::Currency::Inr => Currency::Inr,
        account::Currency::Usd => Currency::Usd,
        account::Currency::Eur => Currency::Eur,
        account::Currency::Gbp => Currency::Gbp,
        account::Currency::Aud => Currency::Aud,
        account::Currency::Cad => Currency::Cad,
    }
}

fn domain_currency_to_entity(currency: Currency) -> account::Currency {
    match currency {
        Currency::Inr => account::Currency::Inr,
        Currency::Usd => account::Currency::Usd,
        Currency::Eur => account::Currency::Eur,
        Currency::Gbp => account::Currency::Gbp,
        Currency::Aud => account::Currency::Aud,
        Currency::Cad => account::Currency::Cad,
    }
}

fn model_to_account(model: account::Model) -> DomainResult<Account> {
    let preferences: Preferences = serde_json::from_value(model.preferences)
        .map_err(|e| DomainError::Internal(format!("Corrupt preferences column: {}", e)))?;
    let metadata: AccountMetadata = serde_json::from_value(model.metadata)
        .map_err(|e| DomainError::Internal(format!("Corrupt metadata column: {}", e)))?;

    Ok(Account {
        id: model.id,
        email: model.email,
        name: model.name,
        phone: model.phone,
        avatar: model.avatar,
        role: entity_role_to_domain(model.role),
        status: entity_status_to_domain(model.status),
        email_verified: model.email_verified,
        phone_verified: model.phone_verified,
        preferred_currency: entity_currency_to_domain(model.preferred_currency),
        preferences,
        metadata,
        version: model.version,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn account_to_active(account: &Account) -> DomainResult<account::ActiveModel> {
    let preferences = serde_json::to_value(&account.preferences)
        .map_err(|e| DomainError::Internal(format!("Failed to serialize preferences: {}", e)))?;
    let metadata = serde_json::to_value(&account.metadata)
        .map_err(|e| DomainError::Internal(format!("Failed to serialize metadata: {}", e)))?;

    Ok(account::ActiveModel {
        id: Set(account.id.clone()),
        email: Set(account.email.clone()),
        name: Set(account.name.clone()),
        phone: Set(account.phone.clone()),
        avatar: Set(account.avatar.clone()),
        role: Set(domain_role_to_entity(account.role)),
        status: Set(domain_status_to_entity(account.status)),
        email_verified: Set(account.email_verified),
        phone_verified: Set(account.phone_verified),
        preferred_currency: Set(domain_currency_to_entity(account.preferred_currency)),
        preferences: Set(preferences),
        metadata: Set(metadata),
        version: Set(account.version),
        created_at: Set(account.created_at),
        updated_at: Set(account.updated_at),
    })
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Internal(format!("Database error: {}", e))
}

fn unwrap_txn_err(e: TransactionError<DomainError>) -> DomainError {
    match e {
        TransactionError::Connection(e) => db_err(e),
        TransactionError::Transaction(e) => e,
    }
}

fn apply_filters(
    mut query: Select<account::Entity>,
    filter: &AccountFilter,
) -> Select<account::Entity> {
    if let Some(role) = filter.role {
        query = query.filter(account::Column::Role.eq(domain_role_to_entity(role)));
    }
    if let Some(status) = filter.status {
        query = query.filter(account::Column::Status.eq(domain_status_to_entity(status)));
    }
    if let Some(verified) = filter.email_verified {
        query = query.filter(account::Column::EmailVerified.eq(verified));
    }
    if let Some(after) = filter.created_after {
        query = query.filter(account::Column::CreatedAt.gte(after));
    }
    if let Some(before) = filter.created_before {
        query = query.filter(account::Column::CreatedAt.lte(before));
    }
    query
}

// ── Store implementation ────────────────────────────────────────

impl SeaOrmAccountStore {
    /// Transactionally load the record, apply `decide`, stamp
    /// `updated_at`/`version`, write. The call sites (ban, unban,
    /// suspend, login tracking) differ only in their decision function.
    async fn mutate_in_txn<F>(&self, id: &str, decide: F) -> DomainResult<Account>
    where
        F: FnOnce(&mut Account, DateTime<Utc>) -> DomainResult<()> + Send + 'static,
    {
        let id = id.to_string();
        self.db
            .transaction::<_, Account, DomainError>(move |txn| {
                Box::pin(async move {
                    let model = account::Entity::find_by_id(id.clone())
                        .one(txn)
                        .await
                        .map_err(db_err)?
                        .ok_or_else(|| DomainError::account_not_found(&id))?;
                    let current = model_to_account(model)?;

                    let now = Utc::now();
                    let mut next = current.clone();
                    decide(&mut next, now)?;
                    next.updated_at = now;
                    next.version = current.version + 1;

                    account_to_active(&next)?.update(txn).await.map_err(db_err)?;
                    Ok(next)
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }
}

#[async_trait]
impl AccountStore for SeaOrmAccountStore {
    async fn create(&self, dto: CreateAccountDto) -> DomainResult<Account> {
        self.db
            .transaction::<_, Account, DomainError>(move |txn| {
                Box::pin(async move {
                    if let Some(ref id) = dto.id {
                        let existing = account::Entity::find_by_id(id.clone())
                            .one(txn)
                            .await
                            .map_err(db_err)?;
                        if existing.is_some() {
                            return Err(DomainError::Conflict(format!(
                                "Account {} already exists",
                                id
                            )));
                        }
                    }

                    let email = dto.email.to_lowercase();
                    let taken = account::Entity::find()
                        .filter(account::Column::Email.eq(email))
                        .one(txn)
                        .await
                        .map_err(db_err)?;
                    if taken.is_some() {
                        return Err(DomainError::Conflict(
                            "Account with this email already exists".to_string(),
                        ));
                    }

                    let id = dto
                        .id
                        .clone()
                        .unwrap_or_else(|| Uuid::new_v4().to_string());
                    let created = Account::from_create(dto, id, Utc::now());
                    account_to_active(&created)?
                        .insert(txn)
                        .await
                        .map_err(db_err)?;
                    Ok(created)
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Account>> {
        let model = account::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_account).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>> {
        // Emails are stored lower-cased, so an exact match on the
        // lower-cased needle is a case-insensitive lookup.
        let model = account::Entity::find()
            .filter(account::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_account).transpose()
    }

    async fn find_by_phone(&self, phone: &str) -> DomainResult<Option<Account>> {
        let model = account::Entity::find()
            .filter(account::Column::Phone.eq(phone))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        model.map(model_to_account).transpose()
    }

    async fn find_all(
        &self,
        filter: AccountFilter,
        page: PageParams,
    ) -> DomainResult<Vec<Account>> {
        let models = apply_filters(account::Entity::find(), &filter)
            .order_by_desc(account::Column::CreatedAt)
            .order_by_desc(account::Column::Id)
            .offset(page.offset)
            .limit(page.limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let mut items = models
            .into_iter()
            .map(model_to_account)
            .collect::<DomainResult<Vec<_>>>()?;

        // Pagination happens in the query above; the text search only
        // narrows the fetched page. Callers rely on this ordering even
        // though it can shrink the page below `limit`.
        if let Some(ref query) = filter.search {
            items.retain(|a| a.matches_search(query));
        }

        Ok(items)
    }

    async fn search(&self, query: &str, filter: AccountFilter) -> DomainResult<Vec<Account>> {
        let models = apply_filters(account::Entity::find(), &filter)
            .order_by_desc(account::Column::CreatedAt)
            .order_by_desc(account::Column::Id)
            .limit(100)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items = models
            .into_iter()
            .map(model_to_account)
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(items.into_iter().filter(|a| a.matches_search(query)).collect())
    }

    async fn update(
        &self,
        id: &str,
        data: UpdateAccountDto,
        expected_version: Option<i64>,
    ) -> DomainResult<Account> {
        let id = id.to_string();
        self.db
            .transaction::<_, Account, DomainError>(move |txn| {
                Box::pin(async move {
                    let model = account::Entity::find_by_id(id.clone())
                        .one(txn)
                        .await
                        .map_err(db_err)?
                        .ok_or_else(|| DomainError::account_not_found(&id))?;
                    let current = model_to_account(model)?;

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
                        if new_email != current.email {
                            let taken = account::Entity::find()
                                .filter(account::Column::Email.eq(new_email))
                                .filter(account::Column::Id.ne(id.clone()))
                                .one(txn)
                                .await
                                .map_err(db_err)?;
                            if taken.is_some() {
                                return Err(DomainError::Conflict(
                                    "Account with this email already exists".to_string(),
                                ));
                            }
                        }
                    }

                    let mut next = current.clone();
                    next.merge_update(&data);
                    next.updated_at = Utc::now();
                    next.version = current.version + 1;

                    account_to_active(&next)?.update(txn).await.map_err(db_err)?;
                    Ok(next)
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }

    async fn update_role(&self, id: &str, role: Role) -> DomainResult<Account> {
        let data = UpdateAccountDto {
            role: Some(role),
            ..Default::default()
        };
        let account = self.update(id, data, None).await?;

        // No rollback of the persisted change if claim propagation
        // fails; the caller sees `Internal` and retries.
        self.identity.set_role_claims(id, role).await.map_err(|e| {
            DomainError::Internal(format!(
                "Role persisted but identity propagation failed: {}",
                e
            ))
        })?;

        Ok(account)
    }

    async fn ban(&self, id: &str, reason: &str, banned_by: &str) -> DomainResult<Account> {
        let reason = reason.to_string();
        let banned_by = banned_by.to_string();
        let account = self
            .mutate_in_txn(id, move |a, now| a.begin_ban(&reason, &banned_by, now))
            .await?;

        if let Err(e) = self.identity.set_disabled(id, true).await {
            warn!(account_id = id, error = %e, "Failed to disable external identity after ban");
        }
        Ok(account)
    }

    async fn unban(&self, id: &str) -> DomainResult<Account> {
        let account = self.mutate_in_txn(id, |a, _| a.lift_ban()).await?;

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
        let reason = reason.to_string();
        self.mutate_in_txn(id, move |a, now| {
            a.begin_suspension(&reason, suspended_until, now);
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: &str) -> DomainResult<Account> {
        let data = UpdateAccountDto {
            status: Some(AccountStatus::Inactive),
            ..Default::default()
        };
        self.update(id, data, None).await
    }

    async fn permanent_delete(&self, id: &str) -> DomainResult<()> {
        let result = account::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::account_not_found(id));
        }

        if let Err(e) = self.identity.delete_identity(id).await {
            warn!(account_id = id, error = %e, "Failed to delete external identity");
        }
        Ok(())
    }

    async fn update_last_login(&self, id: &str, ip: Option<&str>) {
        // Deliberately non-transactional and fully best-effort: login
        // tracking must never fail or slow down a login flow.
        let model = match account::Entity::find_by_id(id.to_string()).one(&self.db).await {
            Ok(Some(model)) => model,
            Ok(None) => return,
            Err(e) => {
                warn!(account_id = id, error = %e, "Failed to load account for login tracking");
                return;
            }
        };

        let current = match model_to_account(model) {
            Ok(account) => account,
            Err(e) => {
                warn!(account_id = id, error = %e, "Failed to decode account for login tracking");
                return;
            }
        };

        let now = Utc::now();
        let mut next = current.clone();
        next.record_login(ip, now);
        next.updated_at = now;
        next.version = current.version + 1;

        let active = match account_to_active(&next) {
            Ok(active) => active,
            Err(e) => {
                warn!(account_id = id, error = %e, "Failed to encode login metadata");
                return;
            }
        };
        if let Err(e) = active.update(&self.db).await {
            warn!(account_id = id, error = %e, "Failed to record login");
        }
    }

    async fn count(&self, filter: AccountFilter) -> DomainResult<u64> {
        apply_filters(account::Entity::find(), &filter)
            .count(&self.db)
            .await
            .map_err(db_err)
    }

    async fn bulk_update(&self, updates: Vec<BulkAccountUpdate>) -> DomainResult<()> {
        self.db
            .transaction::<_, (), DomainError>(move |txn| {
                Box::pin(async move {
                    // One shared stamp for the whole batch. No version
                    // or email-uniqueness checks on this path.
                    let now = Utc::now();
                    for item in updates {
                        let model = account::Entity::find_by_id(item.id.clone())
                            .one(txn)
                            .await
                            .map_err(db_err)?
                            .ok_or_else(|| DomainError::account_not_found(&item.id))?;
                        let mut next = model_to_account(model)?;
                        next.merge_update(&item.data);
                        next.updated_at = now;

                        account_to_active(&next)?.update(txn).await.map_err(db_err)?;
                    }
                    Ok(())
                })
            })
            .await
            .map_err(unwrap_txn_err)
    }
}
