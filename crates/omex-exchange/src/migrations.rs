//! Database migration management.

use sqlx::PgPool;

use omex_core::{OmexError, OmexResult};

/// Run all pending database migrations.
///
/// Migrations are embedded at compile time from the `migrations/` directory
/// and applied in filename order.
pub async fn run_migrations(pool: &PgPool) -> OmexResult<()> {
    tracing::info!("Running correlation store migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(OmexError::property_server)?;

    tracing::info!("Migrations completed");
    Ok(())
}
