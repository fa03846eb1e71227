//! Persistent one-time OAuth state tokens.
//!
//! The store backs every instance of the platform: the request that issues an
//! auth link and the request that handles the provider callback may be served
//! by different processes, so state never lives in process memory.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use {sqlx::SqlitePool, tracing::warn};

use crate::error::{Error, Result};

/// Default lifetime of a state token.
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

/// Outcome of presenting a state token at callback time.
///
/// Any outcome other than [`StateVerification::Valid`] means the token is
/// gone; presenting it again yields `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateVerification {
    /// Token matched and has been consumed.
    Valid {
        user_id: String,
        /// PKCE verifier persisted at link-generation time, if the channel
        /// uses PKCE. Returned here so callers need no second fetch.
        code_verifier: Option<String>,
    },
    /// Unknown or already-consumed token.
    NotFound,
    /// The token existed but its lifetime had elapsed.
    Expired,
    /// The token was issued for a different channel than the callback claims.
    ChannelMismatch { issued_for: String },
}

/// SQLite-backed store of pending OAuth states.
#[derive(Clone)]
pub struct StateStore {
    pool: SqlitePool,
    ttl: Duration,
}

impl StateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_ttl(pool, DEFAULT_STATE_TTL)
    }

    pub fn with_ttl(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }

    /// Persist a state token for a pending authorization.
    ///
    /// Must complete before the auth link leaves the process; a failed write
    /// means the callback could never be verified, so the error propagates.
    pub async fn put(
        &self,
        state: &str,
        channel_name: &str,
        user_id: &str,
        code_verifier: Option<&str>,
    ) -> Result<()> {
        let now = unix_now();
        let expires_at = now + self.ttl.as_secs() as i64;

        sqlx::query(
            "INSERT INTO oauth_states (state, user_id, channel_name, code_verifier, created_at, expires_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(state)
        .bind(user_id)
        .bind(channel_name)
        .bind(code_verifier)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|source| Error::storage("persisting oauth state", source))?;

        // Abandoned flows leave expired rows behind; sweep opportunistically.
        // Correctness never depends on this; expiry is checked at verify time.
        if let Err(error) = self.purge_expired().await {
            warn!(%error, "expired-state sweep failed");
        }

        Ok(())
    }

    /// Verify a state token and consume it in the same operation.
    ///
    /// A single `DELETE ... RETURNING` makes the check-and-consume atomic:
    /// two concurrent deliveries of the same callback cannot both succeed,
    /// the loser observes [`StateVerification::NotFound`]. Expired and
    /// channel-mismatched tokens are consumed by the same statement.
    pub async fn verify_and_consume(
        &self,
        state: &str,
        expected_channel: &str,
    ) -> Result<StateVerification> {
        let row: Option<(String, String, Option<String>, i64)> = sqlx::query_as(
            "DELETE FROM oauth_states WHERE state = ?
             RETURNING user_id, channel_name, code_verifier, expires_at",
        )
        .bind(state)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| Error::storage("consuming oauth state", source))?;

        let Some((user_id, channel_name, code_verifier, expires_at)) = row else {
            return Ok(StateVerification::NotFound);
        };

        if unix_now() >= expires_at {
            return Ok(StateVerification::Expired);
        }

        if channel_name != expected_channel {
            return Ok(StateVerification::ChannelMismatch {
                issued_for: channel_name,
            });
        }

        Ok(StateVerification::Valid {
            user_id,
            code_verifier,
        })
    }

    /// Delete all expired rows. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM oauth_states WHERE expires_at <= ?")
            .bind(unix_now())
            .execute(&self.pool)
            .await
            .map_err(|source| Error::storage("purging expired oauth states", source))?;
        Ok(result.rows_affected())
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
