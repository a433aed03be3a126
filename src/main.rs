//! Token Gate Server
//!
//! Issues HS256 bearer tokens on login, checks them on every request, and
//! tracks logged-out tokens until they expire.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tokengate::accounts::{
    AccountStore, BcryptHasher, InMemoryAccountStore, PasswordHasher, PgAccountStore,
};
use tokengate::app_state::AppState;
use tokengate::auth::{schedule_sweep, AuthService, RevocationStore, TokenCodec};
use tokengate::config::AppConfig;
use tokengate::routes;
use tokengate::services::UserService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    info!(?config, "Configuration loaded");

    let accounts: Arc<dyn AccountStore> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("Failed to connect to database")?;
            let store = PgAccountStore::new(pool);
            store.migrate().await.context("Failed to prepare accounts table")?;
            info!("Using PostgreSQL account store");
            Arc::new(store)
        }
        None => {
            info!("DATABASE_URL not set; using in-memory account store");
            Arc::new(InMemoryAccountStore::new())
        }
    };
    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(config.bcrypt_cost));

    let codec = Arc::new(TokenCodec::new(&config.signing_context()));
    let revocations = Arc::new(RevocationStore::new());

    let auth_service =
        AuthService::new(codec, revocations.clone(), accounts.clone(), hasher.clone())
            .context("Failed to initialise credential verifier")?;
    let user_service = UserService::new(accounts, hasher);

    if let Some(seed) = &config.admin_seed {
        user_service
            .seed_admin(seed)
            .await
            .context("Failed to seed admin account")?;
    }

    // Kept alive for the lifetime of the server
    let _sweeper = schedule_sweep(revocations, config.revocation_sweep_interval)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start revocation sweeper: {:?}", e))?;

    let state = AppState::new(Arc::new(auth_service), Arc::new(user_service));
    let app = routes::app_router(state).layer(build_cors_layer(&config.cors_allowed_origins));

    info!("Server starting on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins = origins
        .iter()
        .filter_map(|origin| origin.parse::<HeaderValue>().ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(false)
}
