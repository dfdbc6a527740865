//! Marketplace account service entry point.
//!
//! Reads configuration from a TOML file
//! (~/.config/marketplace-accounts/config.toml), runs migrations and
//! serves the REST API.

use std::sync::Arc;
use std::time::Instant;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info};

use marketplace_accounts::application::{AccountService, IdentityProvider};
use marketplace_accounts::auth::{AuthState, JwtConfig};
use marketplace_accounts::domain::AccountStore;
use marketplace_accounts::infrastructure::database::migrator::Migrator;
use marketplace_accounts::infrastructure::LoggingIdentityProvider;
use marketplace_accounts::interfaces::http::modules::metrics::MetricsState;
use marketplace_accounts::{
    create_api_router, default_config_path, AppConfig, AppState, DatabaseConfig,
    SeaOrmAccountStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("ACCOUNTS_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting marketplace account service...");

    // ── Prometheus metrics recorder (must be installed before any metrics calls) ──
    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");

    let jwt_config = JwtConfig {
        secret: app_cfg.security.jwt_secret.clone(),
        expiration_hours: app_cfg.security.jwt_expiration_hours,
        issuer: "marketplace-accounts".to_string(),
    };

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig {
        url: app_cfg.database.connection_url(),
    };
    let db = match marketplace_accounts::init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    // ── Wire up the service ────────────────────────────────────
    let identity: Arc<dyn IdentityProvider> = Arc::new(LoggingIdentityProvider::default());
    let store: Arc<dyn AccountStore> = Arc::new(SeaOrmAccountStore::new(db.clone(), identity));
    let service = Arc::new(AccountService::new(store));

    let state = AppState {
        service,
        auth: AuthState { jwt_config },
        db,
        started_at: Arc::new(Instant::now()),
        metrics: MetricsState {
            handle: prometheus_handle,
        },
    };

    let router = create_api_router(state);

    // ── Serve ──────────────────────────────────────────────────
    let address = app_cfg.server.address();
    info!("Listening on http://{}", address);
    info!("Swagger UI available at http://{}/docs", address);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
