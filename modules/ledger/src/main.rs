use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use ledger_rs::{
    config::{Config, StoreType},
    db,
    metrics::Metrics,
    router,
    services::retry::RetryConfig,
    AppState, InMemoryLedgerStore, LedgerStore, PostgresLedgerStore, PostingEngine,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting ledger service...");

    let config = Config::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        "Configuration loaded: host={}, port={}, store_type={:?}",
        config.host,
        config.port,
        config.store_type
    );

    let store: Arc<dyn LedgerStore> = match config.store_type {
        StoreType::InMemory => {
            tracing::info!("Using InMemory ledger store");
            Arc::new(InMemoryLedgerStore::new())
        }
        StoreType::Postgres => {
            tracing::info!("Connecting to database...");
            let database_url = config
                .database_url
                .as_deref()
                .expect("DATABASE_URL must be set for the postgres store");
            let pool = db::init_pool(database_url, &config.pool)
                .await
                .expect("Failed to connect to database");

            tracing::info!("Running migrations...");
            db::run_migrations(&pool)
                .await
                .expect("Failed to run migrations");

            Arc::new(PostgresLedgerStore::new(pool))
        }
    };

    let metrics = Metrics::new();
    let engine = PostingEngine::new(store, config.well_known_accounts.clone())
        .with_retry(RetryConfig::with_max_attempts(config.posting_max_attempts))
        .with_metrics(metrics.clone());

    let state = Arc::new(AppState {
        engine: Arc::new(engine),
        metrics,
    });

    let app = router(state).layer(
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
    );

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("HOST and PORT must form a valid socket address");
    tracing::info!("Ledger service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
