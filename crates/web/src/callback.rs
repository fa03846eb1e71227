//! OAuth callback handler: converts pipeline outcomes into settings-page
//! redirects.

use std::collections::HashMap;

use {
    axum::{
        extract::{Path, Query, State},
        http::{StatusCode, header},
        response::{IntoResponse, Response},
    },
    axum_extra::extract::cookie::{Cookie, CookieJar},
    tracing::warn,
};

use {
    crate::state::AppState,
    lapak_channels::{CallbackParams, Error},
};

/// Settings page both redirect flavors land on.
pub const SETTINGS_PATH: &str = "/app/settings";

/// `GET /callback/auth/{channel}`, the provider redirect target.
///
/// Always answers with a redirect to the settings page; failures become an
/// error banner, never a bare 4xx/5xx the end user would see mid-flow.
pub async fn channel_callback_handler(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    jar: CookieJar,
) -> Response {
    let params = CallbackParams::from(query);

    let redirect = match state.service.handle_callback(&channel, &params).await {
        Ok(success) => settings_redirect(&[
            ("success", format!("{}_connected", success.channel).as_str()),
            ("success_message", &success.message),
        ]),
        Err(error) => {
            warn!(channel = %channel, %error, "channel callback failed");
            error_redirect(&channel, &error)
        },
    };

    // Drop the transport-level state cookie if the connect flow set one as a
    // secondary CSRF defense.
    let mut state_cookie = Cookie::new(format!("{channel}_auth_state"), "");
    state_cookie.set_path("/");
    let jar = jar.remove(state_cookie);

    (jar, redirect).into_response()
}

fn error_redirect(channel: &str, error: &Error) -> Response {
    settings_redirect(&[
        ("error", format!("{channel}_error").as_str()),
        ("error_message", &error.user_message()),
    ])
}

/// 302 to the settings page with the given query parameters.
fn settings_redirect(pairs: &[(&str, &str)]) -> Response {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    (
        StatusCode::FOUND,
        [(header::LOCATION, format!("{SETTINGS_PATH}?{query}"))],
    )
        .into_response()
}
