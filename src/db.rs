use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::config::AppConfig;

/// connect
///
/// Opens the single connection pool shared by every request through `AppState`,
/// then brings the schema up to date with the embedded migrations.
pub async fn connect(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database connected and migrations applied");

    Ok(pool)
}
