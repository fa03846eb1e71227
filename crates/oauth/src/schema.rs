//! Migration runner for the oauth state table.

/// Run database migrations for the oauth state store.
///
/// Shares the main database with the channel tables; each owning crate runs
/// its own migration set with `ignore_missing` so the sets compose.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await
}
