use blog_portal::{
    AppState,
    config::{AppConfig, Env, StorageBackend},
    create_router, db,
    repository::{InMemoryRepository, PostgresRepository, RepositoryState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects to Postgres (running migrations) or
/// starts the in-memory demo store, and serves the router.
#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    // Panics on missing production secrets.
    let config = AppConfig::load();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "blog_portal=debug,tower_http=info,axum=trace".into());

    // Pretty output for local debugging, JSON lines for log aggregation in production.
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

    let repo: RepositoryState = match config.storage {
        StorageBackend::Postgres => {
            let pool = db::connect(&config).await.expect(
                "FATAL: Failed to connect to Postgres or apply migrations. Check DATABASE_URL.",
            );
            Arc::new(PostgresRepository::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("STORAGE_BACKEND=memory: data is kept in memory and lost on restart");
            Arc::new(InMemoryRepository::new())
        }
    };

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { repo, config });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
    }
}
