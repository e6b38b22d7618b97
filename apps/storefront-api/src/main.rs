use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storefront_api::{AppState, Stores, config::Config, create_app};
use storefront_core::{
    Cache,
    adapters::{InMemoryCache, InMemoryStore, PostgresStore, RedisCache},
    domain::identity::Identity,
};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const SESSION_KEY_PREFIX: &str = "storefront:auth:";

async fn connect_stores(config: &Config) -> Result<Stores, BoxError> {
    match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            info!("Connected to Postgres");
            let store = PostgresStore::new(pool);
            info!("Applying database migrations...");
            store.migrate().await?;
            info!("Migrations applied successfully.");
            Ok(Stores::shared(Arc::new(store)))
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory storage (data is lost on restart)");
            Ok(Stores::shared(Arc::new(InMemoryStore::default())))
        }
    }
}

/// Returns the tenant cache and the session cache, in that order.
async fn connect_caches(config: &Config) -> Result<(Arc<dyn Cache>, Arc<dyn Cache>), BoxError> {
    let tenant_ttl_seconds = config.tenant_cache_ttl.as_secs().max(1);
    let session_ttl_seconds = config.session_ttl.as_secs().max(1);
    match &config.redis_url {
        Some(url) => {
            let tenants = RedisCache::new(url, tenant_ttl_seconds).await?;
            let sessions = RedisCache::new(url, session_ttl_seconds)
                .await?
                .with_prefix(SESSION_KEY_PREFIX);
            Ok((Arc::new(tenants), Arc::new(sessions)))
        }
        None => {
            info!(
                "REDIS_URL not set; using in-process caches (tenants {}, sessions {})",
                config.tenant_cache_capacity, config.session_cache_capacity
            );
            Ok((
                Arc::new(InMemoryCache::new(
                    config.tenant_cache_capacity,
                    tenant_ttl_seconds,
                )),
                Arc::new(InMemoryCache::new(
                    config.session_cache_capacity,
                    session_ttl_seconds,
                )),
            ))
        }
    }
}

async fn run(config: Config) -> Result<(), BoxError> {
    let stores = connect_stores(&config).await?;
    let (tenant_cache, session_cache) = connect_caches(&config).await?;

    let app_state = AppState::new(stores, tenant_cache, session_cache)
        .with_tenant_cache_ttl(config.tenant_cache_ttl)
        .with_store_timeout(config.store_timeout)
        .with_session_ttl(config.session_ttl);

    if let Some(token) = &config.bootstrap_superadmin_token {
        let identity = Identity::super_admin("bootstrap-superadmin")?;
        app_state.sessions.insert(token, &identity).await?;
        info!("Bootstrap SUPERADMIN session registered");
    }

    let app = create_app(app_state);

    info!("Storefront API listening on {}", config.bind_addr);
    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment (.env) if present
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting Storefront API v{}...", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(config).await {
        error!("Storefront API stopped: {}", e);
        std::process::exit(1);
    }
}
