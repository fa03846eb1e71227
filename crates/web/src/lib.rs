//! HTTP surface: the OAuth callback endpoint and the channel JSON API.
//!
//! This crate is the single place typed channel errors become user-facing
//! output: settings-page redirects for browser flows, JSON and status codes
//! for the API.

pub mod api;
pub mod callback;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};

pub use state::AppState;

/// Build the channel router: the provider callback endpoint plus the
/// connect/disconnect API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/callback/auth/{channel}",
            get(callback::channel_callback_handler),
        )
        .route("/api/channels", get(api::list_channels_handler))
        .route(
            "/api/channels/{channel}/connect",
            post(api::connect_channel_handler),
        )
        .route(
            "/api/channels/{channel}/disconnect",
            post(api::disconnect_channel_handler),
        )
        .route(
            "/api/teams/{team_id}/channels",
            get(api::team_channels_handler),
        )
}
