//! Self-service account handlers
//!
//! Profile, settings and preferences endpoints. Authorization is
//! self-or-admin and is enforced by the policy service; handlers only
//! translate between HTTP and the service types.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};

use super::dto::{
    AccountDto, AccountSettingsDto, PreferencesDto, PreferencesUpdateRequest,
    UpdateProfileRequest, UpdateSettingsRequest,
};
use crate::application::AccountService;
use crate::domain::RequestingUser;
use crate::interfaces::http::common::{ApiResponse, AppError};

/// Account handler state
#[derive(Clone)]
pub struct AccountsState {
    pub service: Arc<AccountService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/profile",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account profile", body = ApiResponse<AccountDto>),
        (status = 403, description = "Not your account"),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_profile(
    State(state): State<AccountsState>,
    Path(id): Path<String>,
    Extension(requesting): Extension<RequestingUser>,
) -> Result<Json<ApiResponse<AccountDto>>, AppError> {
    let account = state.service.get_profile(&id, &requesting).await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/accounts/{id}/profile",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<AccountDto>),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Not your account"),
        (status = 409, description = "Version or email conflict")
    )
)]
pub async fn update_profile(
    State(state): State<AccountsState>,
    Path(id): Path<String>,
    Extension(requesting): Extension<RequestingUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, AppError> {
    let (data, expected_version) = request.into_update()?;
    let account = state
        .service
        .update_profile(&id, data, &requesting, expected_version)
        .await?;
    Ok(Json(ApiResponse::success(account.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/settings",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account settings", body = ApiResponse<AccountSettingsDto>),
        (status = 403, description = "Not your account")
    )
)]
pub async fn get_settings(
    State(state): State<AccountsState>,
    Path(id): Path<String>,
    Extension(requesting): Extension<RequestingUser>,
) -> Result<Json<ApiResponse<AccountSettingsDto>>, AppError> {
    let settings = state.service.get_account_settings(&id, &requesting).await?;
    Ok(Json(ApiResponse::success(settings.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/accounts/{id}/settings",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Updated settings", body = ApiResponse<AccountSettingsDto>),
        (status = 400, description = "Unknown currency"),
        (status = 403, description = "Not your account")
    )
)]
pub async fn update_settings(
    State(state): State<AccountsState>,
    Path(id): Path<String>,
    Extension(requesting): Extension<RequestingUser>,
    Json(request): Json<UpdateSettingsRequest>,
) -> Result<Json<ApiResponse<AccountSettingsDto>>, AppError> {
    let settings = request.into_settings()?;
    let settings = state
        .service
        .update_account_settings(&id, settings, &requesting)
        .await?;
    Ok(Json(ApiResponse::success(settings.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}/preferences",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account preferences", body = ApiResponse<PreferencesDto>),
        (status = 403, description = "Not your account")
    )
)]
pub async fn get_preferences(
    State(state): State<AccountsState>,
    Path(id): Path<String>,
    Extension(requesting): Extension<RequestingUser>,
) -> Result<Json<ApiResponse<PreferencesDto>>, AppError> {
    let preferences = state.service.get_preferences(&id, &requesting).await?;
    Ok(Json(ApiResponse::success(preferences.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/accounts/{id}/preferences",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    request_body = PreferencesUpdateRequest,
    responses(
        (status = 200, description = "Merged preferences", body = ApiResponse<PreferencesDto>),
        (status = 403, description = "Not your account")
    )
)]
pub async fn update_preferences(
    State(state): State<AccountsState>,
    Path(id): Path<String>,
    Extension(requesting): Extension<RequestingUser>,
    Json(request): Json<PreferencesUpdateRequest>,
) -> Result<Json<ApiResponse<PreferencesDto>>, AppError> {
    let preferences = state
        .service
        .update_preferences(&id, request.into(), &requesting)
        .await?;
    Ok(Json(ApiResponse::success(preferences.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/accounts/{id}",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account deactivated", body = ApiResponse<AccountDto>),
        (status = 403, description = "Not your account"),
        (status = 409, description = "Admins cannot delete their own account")
    )
)]
pub async fn delete_account(
    State(state): State<AccountsState>,
    Path(id): Path<String>,
    Extension(requesting): Extension<RequestingUser>,
) -> Result<Json<ApiResponse<AccountDto>>, AppError> {
    let account = state.service.delete_account(&id, &requesting).await?;
    Ok(Json(ApiResponse::success(account.into())))
}
