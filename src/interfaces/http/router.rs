//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::AccountService;
use crate::auth::{auth_middleware, AuthState};
use crate::interfaces::http::modules::accounts::{self, AccountsState};
use crate::interfaces::http::modules::admin::{self, AdminState};
use crate::interfaces::http::modules::health::{self, HealthState};
use crate::interfaces::http::modules::metrics::{
    http_metrics_middleware, prometheus_metrics, MetricsState,
};

/// Unified state for the whole API. Axum hands each handler its own
/// sub-state via `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AccountService>,
    pub auth: AuthState,
    pub db: DatabaseConnection,
    pub started_at: Arc<Instant>,
    pub metrics: MetricsState,
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<AppState> for AccountsState {
    fn from_ref(s: &AppState) -> Self {
        AccountsState {
            service: Arc::clone(&s.service),
        }
    }
}

impl FromRef<AppState> for AdminState {
    fn from_ref(s: &AppState) -> Self {
        AdminState {
            service: Arc::clone(&s.service),
        }
    }
}

impl FromRef<AppState> for HealthState {
    fn from_ref(s: &AppState) -> Self {
        HealthState {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<AppState> for MetricsState {
    fn from_ref(s: &AppState) -> Self {
        s.metrics.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        s.auth.clone()
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::handlers::health_check,
        // Self-service accounts
        accounts::handlers::get_profile,
        accounts::handlers::update_profile,
        accounts::handlers::get_settings,
        accounts::handlers::update_settings,
        accounts::handlers::get_preferences,
        accounts::handlers::update_preferences,
        accounts::handlers::delete_account,
        // Admin
        admin::handlers::list_accounts,
        admin::handlers::search_accounts,
        admin::handlers::count_accounts,
        admin::handlers::get_account,
        admin::handlers::get_account_by_email,
        admin::handlers::create_account,
        admin::handlers::backfill_account,
        admin::handlers::update_account,
        admin::handlers::update_role,
        admin::handlers::set_banned,
        admin::handlers::suspend_account,
        admin::handlers::bulk_update,
        admin::handlers::permanent_delete,
    ),
    components(schemas(
        accounts::dto::AccountDto,
        accounts::dto::AccountSettingsDto,
        accounts::dto::PreferencesDto,
        accounts::dto::BanAuditDto,
        accounts::dto::SuspensionAuditDto,
        accounts::dto::PreferencesUpdateRequest,
        accounts::dto::UpdateProfileRequest,
        accounts::dto::UpdateSettingsRequest,
        admin::dto::CreateAccountRequest,
        admin::dto::BackfillAccountRequest,
        admin::dto::UpdateRoleRequest,
        admin::dto::BanRequest,
        admin::dto::SuspendRequest,
        admin::dto::AccountDataRequest,
        admin::dto::BulkUpdateItem,
        admin::dto::BulkUpdateRequest,
        health::handlers::HealthResponse,
        health::handlers::ComponentHealth,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Accounts", description = "Self-service profile, settings and preferences"),
        (name = "Admin", description = "Admin account management"),
        (name = "Health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Build the API router.
pub fn create_api_router(state: AppState) -> Router {
    // Self-service + admin routes sit behind bearer auth
    let protected = Router::new()
        .route(
            "/api/v1/accounts/{id}/profile",
            get(accounts::handlers::get_profile).put(accounts::handlers::update_profile),
        )
        .route(
            "/api/v1/accounts/{id}/settings",
            get(accounts::handlers::get_settings).put(accounts::handlers::update_settings),
        )
        .route(
            "/api/v1/accounts/{id}/preferences",
            get(accounts::handlers::get_preferences).put(accounts::handlers::update_preferences),
        )
        .route(
            "/api/v1/accounts/{id}",
            axum::routing::delete(accounts::handlers::delete_account),
        )
        .route(
            "/api/v1/admin/accounts",
            get(admin::handlers::list_accounts).post(admin::handlers::create_account),
        )
        .route(
            "/api/v1/admin/accounts/search",
            get(admin::handlers::search_accounts),
        )
        .route(
            "/api/v1/admin/accounts/count",
            get(admin::handlers::count_accounts),
        )
        .route(
            "/api/v1/admin/accounts/by-email/{email}",
            get(admin::handlers::get_account_by_email),
        )
        .route(
            "/api/v1/admin/accounts/bulk",
            post(admin::handlers::bulk_update),
        )
        .route(
            "/api/v1/admin/accounts/{id}",
            get(admin::handlers::get_account)
                .put(admin::handlers::update_account)
                .delete(admin::handlers::permanent_delete),
        )
        .route(
            "/api/v1/admin/accounts/{id}/backfill",
            post(admin::handlers::backfill_account),
        )
        .route(
            "/api/v1/admin/accounts/{id}/role",
            put(admin::handlers::update_role),
        )
        .route(
            "/api/v1/admin/accounts/{id}/ban",
            put(admin::handlers::set_banned),
        )
        .route(
            "/api/v1/admin/accounts/{id}/suspend",
            put(admin::handlers::suspend_account),
        )
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let public = Router::new()
        .route("/health", get(health::handlers::health_check))
        .route("/metrics", get(prometheus_metrics));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(protected)
        .merge(public)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
