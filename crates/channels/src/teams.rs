//! Team membership lookups.

use {sqlx::SqlitePool, tracing::warn};

use crate::error::{Error, Result};

/// Resolves the acting user to the team that owns the connection.
#[derive(Clone)]
pub struct TeamDirectory {
    pool: SqlitePool,
    default_team: Option<String>,
}

impl TeamDirectory {
    pub fn new(pool: SqlitePool, default_team: Option<String>) -> Self {
        Self { pool, default_team }
    }

    /// The team a user belongs to. A user with no membership is a hard error
    /// unless a default team is configured, in which case the fallback is
    /// taken and logged.
    pub async fn team_for_user(&self, user_id: &str) -> Result<String> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT team_id FROM team_users WHERE user_id = ? LIMIT 1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|source| Error::storage("resolving team membership", source))?;

        match row {
            Some((team_id,)) => Ok(team_id),
            None => match &self.default_team {
                Some(team_id) => {
                    warn!(user_id, team_id, "user has no team membership, using default team");
                    Ok(team_id.clone())
                },
                None => Err(Error::no_team(user_id)),
            },
        }
    }

    /// Record a membership. Provisioning convenience; repeated inserts for
    /// the same pair are no-ops.
    pub async fn add_membership(&self, team_id: &str, user_id: &str, role: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO team_users (team_id, user_id, role, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(team_id, user_id) DO NOTHING",
        )
        .bind(team_id)
        .bind(user_id)
        .bind(role)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|source| Error::storage("recording team membership", source))?;
        Ok(())
    }
}
