use edu_portal::{
    AppState,
    api::{HttpPlatformApi, LocalPlatformApi, PlatformApiState},
    config::{AppConfig, Env},
    create_router,
    session::{MemorySessionStore, PostgresSessionStore, SessionStoreState},
    storage::{S3StorageClient, StorageService, StorageState},
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, wires the session store, platform API
/// and object storage into `AppState`, then serves the router.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Configuration (fail-fast on missing production secrets)
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging: RUST_LOG wins, otherwise sensible local defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "edu_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    tracing::info!(
        exempt_super_admin = config.onboarding_guard_exempts_super_admin,
        "onboarding guard policy"
    );

    // 3. Session store: Postgres when configured, otherwise process memory.
    let sessions: SessionStoreState = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let store = PostgresSessionStore::new(pool);
            store.ensure_schema().await?;
            tracing::info!("sessions stored in Postgres");
            Arc::new(store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, sessions are kept in memory");
            Arc::new(MemorySessionStore::new())
        }
    };

    // 4. Platform API
    let api: PlatformApiState = match &config.platform_api_url {
        Some(url) => Arc::new(HttpPlatformApi::new(url)),
        None => {
            tracing::warn!("PLATFORM_API_URL not set, serving the in-memory local platform");
            Arc::new(LocalPlatformApi::new())
        }
    };

    // 5. Storage (S3/MinIO)
    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // Local MinIO starts empty.
    if config.env == Env::Local {
        s3_client.ensure_bucket_exists().await;
    }
    let storage = Arc::new(s3_client) as StorageState;

    // 6. Router and server
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        sessions,
        api,
        storage,
        config,
    });

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
