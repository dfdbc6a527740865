//! Admin account-management handlers
//!
//! Every operation here is admin-only; the policy service enforces it
//! (and the admin self-protection rules) before touching the store.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};

use super::dto::{
    BackfillAccountRequest, BanRequest, BulkUpdateRequest, CountAccountsParams,
    CreateAccountRequest, ListAccountsParams, SearchAccountsParams, SuspendRequest,
    UpdateRoleRequest,
};
use crate::application::AccountService;
use crate::domain::RequestingUser;
use crate::interfaces::http::common::{
    ApiResponse, AppError, PaginatedResponse, ValidatedJson,
};
use crate::interfaces::http::modules::accounts::dto::{
    parse_role, AccountDto, UpdateProfileRequest,
};

/// Admin handler state
#[derive(Clone)]
pub struct AdminState {
    pub service: Arc<AccountService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/accounts",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(ListAccountsParams),
    responses(
        (status = 200, description = "Account list", body = PaginatedResponse<AccountDto>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn list_accounts(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Query(params): Query<ListAccountsParams>,
) -> Result<Json<PaginatedResponse<AccountDto>>, AppError> {
    let (filter, page) = params.into_parts()?;
    let result = state
        .service
        .list_accounts(filter, page, &requesting)
        .await?;

    Ok(Json(PaginatedResponse {
        items: result.items.into_iter().map(AccountDto::from).collect(),
        total: result.total,
        limit: result.limit,
        offset: result.offset,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/accounts/search",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(SearchAccountsParams),
    responses(
        (status = 200, description = "Matching accounts", body = ApiResponse<Vec<AccountDto>>),
        (status = 400, description = "Empty query"),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn search_accounts(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Query(params): Query<SearchAccountsParams>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, AppError> {
    let filter = params.filter()?;
    let accounts = state
        .service
        .search_accounts(&params.q, filter, &requesting)
        .await?;
    Ok(Json(ApiResponse::success(
        accounts.into_iter().map(AccountDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/accounts/count",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(CountAccountsParams),
    responses(
        (status = 200, description = "Account count", body = ApiResponse<u64>),
        (status = 403, description = "Admin access required")
    )
)]
pub async fn count_accounts(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Query(params): Query<CountAccountsParams>,
) -> Result<Json<ApiResponse<u64>>, AppError> {
    let filter = params.filter()?;
    let count = state.service.count_accounts(filter, &requesting).await?;
    Ok(Json(ApiResponse::success(count)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/accounts/by-email/{email}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("email" = String, Path, description = "Account email (case-insensitive)")),
    responses(
        (status = 200, description = "Account details", body = ApiResponse<AccountDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_account_by_email(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<AccountDto>>, AppError> {
    let account = state
        .service
        .get_account_by_email(&email, &requesting)
        .await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/accounts/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account details", body = ApiResponse<AccountDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_account(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AccountDto>>, AppError> {
    let account = state.service.get_account_by_id(&id, &requesting).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/accounts",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<AccountDto>),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already in use")
    )
)]
pub async fn create_account(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    ValidatedJson(request): ValidatedJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountDto>>), AppError> {
    let dto = request.into_create()?;
    let account = state.service.create_account(dto, &requesting).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(account.into())),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/accounts/{id}/backfill",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Identity provider UID")),
    request_body = BackfillAccountRequest,
    responses(
        (status = 201, description = "Profile backfilled", body = ApiResponse<AccountDto>),
        (status = 409, description = "Profile already exists")
    )
)]
pub async fn backfill_account(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<BackfillAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountDto>>), AppError> {
    let dto = request.into_create()?;
    let account = state
        .service
        .create_profile_admin(&id, dto, &requesting)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(account.into())),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/accounts/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Account updated", body = ApiResponse<AccountDto>),
        (status = 403, description = "Self role/status change blocked"),
        (status = 409, description = "Version or email conflict")
    )
)]
pub async fn update_account(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, AppError> {
    let (data, expected_version) = request.into_update()?;
    let account = state
        .service
        .admin_update(&id, data, &requesting, expected_version)
        .await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/accounts/{id}/role",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = ApiResponse<AccountDto>),
        (status = 403, description = "Self role change blocked")
    )
)]
pub async fn update_role(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, AppError> {
    let role = parse_role(&request.role)?;
    let account = state.service.update_role(&id, role, &requesting).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/accounts/{id}/ban",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    request_body = BanRequest,
    responses(
        (status = 200, description = "Ban state changed", body = ApiResponse<AccountDto>),
        (status = 403, description = "Self ban blocked"),
        (status = 409, description = "Already in the requested state")
    )
)]
pub async fn set_banned(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Path(id): Path<String>,
    Json(request): Json<BanRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, AppError> {
    let account = state
        .service
        .set_banned(&id, request.banned, request.reason, &requesting)
        .await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/accounts/{id}/suspend",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    request_body = SuspendRequest,
    responses(
        (status = 200, description = "Account suspended", body = ApiResponse<AccountDto>)
    )
)]
pub async fn suspend_account(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Path(id): Path<String>,
    Json(request): Json<SuspendRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, AppError> {
    let account = state
        .service
        .suspend_account(&id, &request.reason, request.suspended_until, &requesting)
        .await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/accounts/bulk",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = BulkUpdateRequest,
    responses(
        (status = 200, description = "Batch applied"),
        (status = 400, description = "Batch rejected (admin role grant or unknown field value)")
    )
)]
pub async fn bulk_update(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Json(request): Json<BulkUpdateRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let updates = request.into_updates()?;
    state.service.bulk_update(updates, &requesting).await?;
    Ok(Json(ApiResponse::success(())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/accounts/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account permanently deleted"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Self delete blocked")
    )
)]
pub async fn permanent_delete(
    State(state): State<AdminState>,
    Extension(requesting): Extension<RequestingUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.service.permanent_delete(&id, &requesting).await?;
    Ok(Json(ApiResponse::success(())))
}
