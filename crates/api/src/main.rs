// Workhub API Server
// Workspaces, invitations and client intake over HTTP

mod config;
mod error;
mod handlers;
mod middleware;
mod routes;
mod state;

use anyhow::Context;
use config::{Config, StoreBackend};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use workhub_auth::{DeliveryNotifier, DynNotifier, EmailService, JwtService, WebhookClient};
use workhub_cache::Cache;
use workhub_database::{Database, DynIdentityStore, DynTenantStore, MemoryStore};

pub use state::AppState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,workhub_api=debug,tower_http=debug"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_stores(config: &Config) -> anyhow::Result<(DynIdentityStore, DynTenantStore)> {
    match config.store {
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let database = Database::new(config.database.clone())
                .await
                .context("Failed to connect to database")?;
            database.ping().await.context("Database ping failed")?;

            if config.database.run_migrations {
                database.migrate().await.context("Failed to run migrations")?;
                tracing::info!("Migrations applied");
            }
            tracing::info!("Database connected");

            let database = Arc::new(database);
            let identities: DynIdentityStore = database.clone();
            let tenants: DynTenantStore = database;
            Ok((identities, tenants))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let identities: DynIdentityStore = store.clone();
            let tenants: DynTenantStore = store;
            Ok((identities, tenants))
        }
    }
}

async fn open_cache(config: &Config) -> Option<Cache> {
    let Some(cache_config) = config.cache.clone() else {
        tracing::info!("REDIS_URL not set; rate limiting disabled");
        return None;
    };

    let cache = match Cache::new(cache_config).await {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable; rate limiting disabled");
            return None;
        }
    };

    match cache.ping().await {
        Ok(()) => {
            tracing::info!("Redis connected");
            Some(cache)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis ping failed; rate limiting disabled");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    tracing::info!("Starting Workhub API Server");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    tracing::info!(
        host = %config.server_host,
        port = config.server_port,
        store = config.store.as_str(),
        "configuration loaded"
    );

    let (identities, tenants) = open_stores(&config).await?;
    let cache = open_cache(&config).await;

    let jwt = JwtService::new(&config.jwt_secret, config.jwt_expiration_hours);

    let email = EmailService::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to initialize email service")?;
    let webhook = WebhookClient::from_config(&config.webhook)?;
    match &webhook {
        Some(client) => tracing::info!(host = %client.host(), "sales funnel webhook enabled"),
        None => tracing::info!("SALES_FUNNEL_WEBHOOK_URL not set; webhook disabled"),
    }
    let notifier: DynNotifier = Arc::new(DeliveryNotifier::new(email, webhook));

    if config.trust_proxy_headers {
        tracing::info!("trusting proxy headers for client IPs");
    }
    let state = Arc::new(
        AppState::new(
            identities,
            tenants,
            notifier,
            jwt,
            config.onboarding.clone(),
            cache,
            config.store,
        )
        .with_trusted_proxy(config.trust_proxy_headers),
    );

    let app = routes::create_router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
