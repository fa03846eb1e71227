//! JSON API for the channel catalog, connects, and disconnects.
//!
//! The acting user is upstream middleware's concern; handlers take
//! `user_id` in the request body.

use {
    axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::json,
    tracing::warn,
};

use {
    crate::state::AppState,
    lapak_channels::{
        AuthType, ChannelCredentials, ConnectParams, Error, TeamChannelConnection,
    },
};

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub user_id: String,
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Marketplace credentials, required for api-key channels only.
    #[serde(default)]
    pub credentials: Option<ChannelCredentials>,
}

#[derive(Debug, Deserialize)]
pub struct DisconnectRequest {
    pub user_id: String,
}

/// Connection view without credential material.
#[derive(Debug, Serialize)]
pub struct ConnectionSummary {
    pub channel_id: String,
    pub team_id: String,
    pub connected: bool,
    pub last_sync: Option<DateTime<Utc>>,
    pub has_credentials: bool,
}

impl From<TeamChannelConnection> for ConnectionSummary {
    fn from(connection: TeamChannelConnection) -> Self {
        let has_credentials = connection.credentials.api_key.is_some()
            || connection.credentials.access_token.is_some();
        Self {
            channel_id: connection.channel_id,
            team_id: connection.team_id,
            connected: connection.connected,
            last_sync: connection.last_sync,
            has_credentials,
        }
    }
}

/// `GET /api/channels`: the catalog.
pub async fn list_channels_handler(State(state): State<AppState>) -> Response {
    Json(state.service.catalog().all().to_vec()).into_response()
}

/// `POST /api/channels/{channel}/connect`.
///
/// OAuth channels answer with `{auth_link, state}` for the browser to follow;
/// api-key channels validate the submitted credentials and connect directly.
pub async fn connect_channel_handler(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Json(request): Json<ConnectRequest>,
) -> Response {
    let Some(definition) = state.service.catalog().get(&channel) else {
        return api_error(&Error::unsupported(channel.as_str()));
    };

    match definition.auth_type {
        AuthType::OAuth => {
            let params = ConnectParams {
                user_id: request.user_id,
                redirect_uri: request.redirect_uri,
                scopes: request.scopes,
            };
            match state.service.connect_link(&channel, params).await {
                Ok(link) => Json(link).into_response(),
                Err(error) => api_error(&error),
            }
        },
        AuthType::ApiKey => {
            let Some(credentials) = request.credentials else {
                return (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "error": "credentials are required for this channel" })),
                )
                    .into_response();
            };
            match state
                .service
                .connect_with_credentials(&channel, &request.user_id, credentials)
                .await
            {
                Ok(connection) => Json(ConnectionSummary::from(connection)).into_response(),
                Err(error) => api_error(&error),
            }
        },
    }
}

/// `POST /api/channels/{channel}/disconnect`.
pub async fn disconnect_channel_handler(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Json(request): Json<DisconnectRequest>,
) -> Response {
    match state.service.disconnect(&channel, &request.user_id).await {
        Ok(disconnected) => Json(json!({ "disconnected": disconnected })).into_response(),
        Err(error) => api_error(&error),
    }
}

/// `GET /api/teams/{team_id}/channels`.
pub async fn team_channels_handler(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> Response {
    match state.service.connections().list_for_team(&team_id).await {
        Ok(connections) => {
            let summaries: Vec<ConnectionSummary> =
                connections.into_iter().map(Into::into).collect();
            Json(summaries).into_response()
        },
        Err(error) => api_error(&error),
    }
}

fn api_error(error: &Error) -> Response {
    let status = match error {
        Error::UnsupportedChannel { .. } => StatusCode::NOT_FOUND,
        Error::Storage { .. } | Error::State(_) => {
            warn!(%error, "storage failure surfaced to the API");
            StatusCode::INTERNAL_SERVER_ERROR
        },
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": error.user_message() }))).into_response()
}
