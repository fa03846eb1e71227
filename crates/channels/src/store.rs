//! Team-channel connection persistence.

use {
    chrono::{DateTime, Utc},
    sqlx::SqlitePool,
};

use crate::{
    connector::ChannelCredentials,
    error::{Error, Result},
};

/// A persisted (team, channel) connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamChannelConnection {
    pub team_id: String,
    /// Catalog name of the channel, e.g. "shopee".
    pub channel_id: String,
    pub credentials: ChannelCredentials,
    pub connected: bool,
    pub last_sync: Option<DateTime<Utc>>,
}

type ConnectionRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    bool,
    Option<String>,
);

/// SQLite-backed store of team-channel connections. Sole writer of the
/// `team_channels` table.
#[derive(Clone)]
pub struct ConnectionStore {
    pool: SqlitePool,
}

impl ConnectionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Idempotent connect: one row per (team, channel), latest credentials
    /// win, `connected` set, `last_sync` refreshed. A single upsert statement
    /// keeps concurrent connects race-free.
    pub async fn connect(
        &self,
        team_id: &str,
        channel_id: &str,
        credentials: ChannelCredentials,
    ) -> Result<TeamChannelConnection> {
        let now = Utc::now();
        let now_text = now.to_rfc3339();

        sqlx::query(
            "INSERT INTO team_channels
               (team_id, channel_id, shop_id, api_key, api_secret, access_token, refresh_token,
                connected, last_sync, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
             ON CONFLICT(team_id, channel_id) DO UPDATE SET
               shop_id       = excluded.shop_id,
               api_key       = excluded.api_key,
               api_secret    = excluded.api_secret,
               access_token  = excluded.access_token,
               refresh_token = excluded.refresh_token,
               connected     = 1,
               last_sync     = excluded.last_sync,
               updated_at    = excluded.updated_at",
        )
        .bind(team_id)
        .bind(channel_id)
        .bind(&credentials.shop_id)
        .bind(&credentials.api_key)
        .bind(&credentials.api_secret)
        .bind(&credentials.access_token)
        .bind(&credentials.refresh_token)
        .bind(&now_text)
        .bind(&now_text)
        .bind(&now_text)
        .execute(&self.pool)
        .await
        .map_err(|source| Error::storage("connecting team channel", source))?;

        Ok(TeamChannelConnection {
            team_id: team_id.to_string(),
            channel_id: channel_id.to_string(),
            credentials,
            connected: true,
            last_sync: Some(now),
        })
    }

    /// Flip the connection off. Credentials are retained so a reconnect does
    /// not force re-entry; use [`ConnectionStore::remove`] to drop them.
    /// Returns whether a connected row was actually flipped.
    pub async fn disconnect(&self, team_id: &str, channel_id: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE team_channels SET connected = 0, updated_at = ?
             WHERE team_id = ? AND channel_id = ? AND connected = 1",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(team_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await
        .map_err(|source| Error::storage("disconnecting team channel", source))?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the connection row, credentials included.
    pub async fn remove(&self, team_id: &str, channel_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM team_channels WHERE team_id = ? AND channel_id = ?")
            .bind(team_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await
            .map_err(|source| Error::storage("removing team channel", source))?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn get(
        &self,
        team_id: &str,
        channel_id: &str,
    ) -> Result<Option<TeamChannelConnection>> {
        let row: Option<ConnectionRow> = sqlx::query_as(
            "SELECT team_id, channel_id, shop_id, api_key, api_secret, access_token,
                    refresh_token, connected, last_sync
             FROM team_channels WHERE team_id = ? AND channel_id = ?",
        )
        .bind(team_id)
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| Error::storage("loading team channel", source))?;
        Ok(row.map(from_row))
    }

    pub async fn list_for_team(&self, team_id: &str) -> Result<Vec<TeamChannelConnection>> {
        let rows: Vec<ConnectionRow> = sqlx::query_as(
            "SELECT team_id, channel_id, shop_id, api_key, api_secret, access_token,
                    refresh_token, connected, last_sync
             FROM team_channels WHERE team_id = ? ORDER BY channel_id",
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|source| Error::storage("listing team channels", source))?;
        Ok(rows.into_iter().map(from_row).collect())
    }
}

fn from_row(row: ConnectionRow) -> TeamChannelConnection {
    let (
        team_id,
        channel_id,
        shop_id,
        api_key,
        api_secret,
        access_token,
        refresh_token,
        connected,
        last_sync,
    ) = row;
    TeamChannelConnection {
        team_id,
        channel_id,
        credentials: ChannelCredentials {
            shop_id,
            api_key,
            api_secret,
            access_token,
            refresh_token,
        },
        connected,
        last_sync: last_sync
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc)),
    }
}
