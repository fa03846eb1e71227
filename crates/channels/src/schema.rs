//! Migration runner for the channel tables.

/// Run database migrations for team-channel connections and memberships.
///
/// Shares the main database with the oauth state table; each owning crate
/// runs its own migration set with `ignore_missing` so the sets compose.
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[tokio::test]
    async fn migrations_create_channel_tables() {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        let channels: (i64,) = sqlx::query_as("SELECT count(*) FROM team_channels")
            .fetch_one(&pool)
            .await
            .unwrap();
        let members: (i64,) = sqlx::query_as("SELECT count(*) FROM team_users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!((channels.0, members.0), (0, 0));
    }
}
