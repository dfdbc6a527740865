use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    Account, AccountFilter, BulkAccountUpdate, CreateAccountDto, Role, UpdateAccountDto,
};
use crate::domain::DomainResult;
use crate::shared::PageParams;

/// Persistence contract for account records (the account store).
///
/// Every mutating operation is atomic with respect to concurrent callers:
/// two concurrent `update` calls carrying the same `expected_version` see
/// exactly one success and one `Conflict`. The two deliberate exceptions
/// to the versioned path are `suspend` (unconditional transition) and
/// `bulk_update`, which skips per-item version and email-uniqueness
/// checks entirely — a weaker consistency tier reserved for trusted,
/// serialized admin workflows whose inputs the policy layer pre-validates.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account, enforcing case-insensitive email uniqueness
    /// inside a transaction. Fails `Conflict` if the email is taken, or
    /// if a pre-assigned `dto.id` already names an existing record.
    async fn create(&self, dto: CreateAccountDto) -> DomainResult<Account>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Account>>;

    /// Case-insensitive lookup, limited to one match.
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Account>>;

    /// Exact-match lookup.
    async fn find_by_phone(&self, phone: &str) -> DomainResult<Option<Account>>;

    /// List accounts sorted by creation time descending. `limit`/`offset`
    /// are applied at the persistence layer BEFORE `filter.search` narrows
    /// the page in memory, so a text search can return fewer than `limit`
    /// items. This mirrors the upstream behavior and is relied upon.
    async fn find_all(
        &self,
        filter: AccountFilter,
        page: PageParams,
    ) -> DomainResult<Vec<Account>>;

    /// Retrieve up to 100 candidates matching the role/status filters,
    /// then match `query` in memory against name/email (case-insensitive)
    /// and phone (substring).
    async fn search(&self, query: &str, filter: AccountFilter) -> DomainResult<Vec<Account>>;

    /// Transactional read-check-write. With `expected_version` set, a
    /// stale version fails `Conflict` naming both versions. An email
    /// change re-checks uniqueness excluding this record.
    async fn update(
        &self,
        id: &str,
        data: UpdateAccountDto,
        expected_version: Option<i64>,
    ) -> DomainResult<Account>;

    /// Update the role, then propagate it to the external identity
    /// provider. An identity failure after the persisted update surfaces
    /// as `Internal`; the persisted change is not rolled back.
    async fn update_role(&self, id: &str, role: Role) -> DomainResult<Account>;

    /// Ban the account. Fails `Conflict` if already banned. After the
    /// transaction commits, best-effort disables the external identity.
    async fn ban(&self, id: &str, reason: &str, banned_by: &str) -> DomainResult<Account>;

    /// Lift a ban. Fails `Conflict` if not currently banned. Best-effort
    /// re-enables the external identity.
    async fn unban(&self, id: &str) -> DomainResult<Account>;

    /// Suspend regardless of current status.
    async fn suspend(
        &self,
        id: &str,
        reason: &str,
        suspended_until: Option<DateTime<Utc>>,
    ) -> DomainResult<Account>;

    /// Soft delete: set status to `Inactive` through the versioned
    /// update path.
    async fn delete(&self, id: &str) -> DomainResult<Account>;

    /// Hard delete the record and best-effort remove the linked external
    /// identity (identity failure is logged, not propagated).
    async fn permanent_delete(&self, id: &str) -> DomainResult<()>;

    /// Best-effort login tracking. A missing record is a silent no-op and
    /// ALL failures are swallowed (logged only) — login tracking must
    /// never fail a login flow.
    async fn update_last_login(&self, id: &str, ip: Option<&str>);

    /// Count records matching the filters (search is ignored).
    async fn count(&self, filter: AccountFilter) -> DomainResult<u64>;

    /// Apply a batch of partial updates as one atomic write, each stamped
    /// with the same `updated_at`. No version or email-uniqueness checks.
    async fn bulk_update(&self, updates: Vec<BulkAccountUpdate>) -> DomainResult<()>;
}
