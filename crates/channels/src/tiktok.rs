//! TikTok connector.
//!
//! TikTok uses a PKCE authorization-code flow: a random verifier is stored
//! alongside the state token in one write, and its S256 challenge rides on
//! the authorization URL.

use {async_trait::async_trait, tracing::warn, url::Url};

use {
    crate::{
        connector::{AuthLink, CallbackParams, ChannelConnector, ChannelCredentials, ConnectParams},
        error::{Error, Result},
    },
    lapak_config::TikTokConfig,
    lapak_oauth::{StateStore, generate_pkce, generate_state},
};

/// Last-resort scope when neither the caller nor the config provides any.
const FALLBACK_SCOPE: &str = "user.info.basic";

pub struct TikTokConnector {
    config: TikTokConfig,
    states: StateStore,
    public_base_url: String,
}

impl TikTokConnector {
    pub fn new(config: TikTokConfig, states: StateStore, public_base_url: String) -> Self {
        Self {
            config,
            states,
            public_base_url,
        }
    }

    fn redirect_uri(&self, override_uri: Option<&str>) -> String {
        override_uri
            .map(str::to_string)
            .or_else(|| self.config.redirect_uri.clone())
            .unwrap_or_else(|| format!("{}/callback/auth/tiktok", self.public_base_url))
    }

    /// Caller scopes win, then configured scopes; never empty.
    fn scope_string(&self, requested: &[String]) -> String {
        let scopes: Vec<&str> = if !requested.is_empty() {
            requested.iter().map(String::as_str).collect()
        } else if !self.config.scopes.is_empty() {
            self.config.scopes.iter().map(String::as_str).collect()
        } else {
            vec![FALLBACK_SCOPE]
        };
        // TikTok expects a comma-separated scope list.
        scopes.join(",")
    }
}

#[async_trait]
impl ChannelConnector for TikTokConnector {
    fn name(&self) -> &str {
        "tiktok"
    }

    async fn auth_link(&self, params: &ConnectParams) -> Result<AuthLink> {
        if self.config.client_key.is_empty() {
            return Err(Error::configuration("tiktok client_key is not set"));
        }

        let state = generate_state();
        let pkce = generate_pkce();
        let redirect_uri = self.redirect_uri(params.redirect_uri.as_deref());

        // State and verifier are persisted together; the verifier comes back
        // out of the store at verification time for the token exchange.
        self.states
            .put(&state, self.name(), &params.user_id, Some(&pkce.verifier))
            .await?;

        let mut url = Url::parse(&self.config.auth_url)
            .map_err(|e| Error::configuration(format!("invalid tiktok auth_url: {e}")))?;
        url.query_pairs_mut()
            .append_pair("client_key", &self.config.client_key)
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scope_string(&params.scopes))
            .append_pair("redirect_uri", &redirect_uri)
            .append_pair("state", &state)
            .append_pair("code_challenge", &pkce.challenge)
            .append_pair("code_challenge_method", "S256");

        Ok(AuthLink {
            auth_link: url.to_string(),
            state,
        })
    }

    fn validate_callback(&self, params: &CallbackParams) -> Result<()> {
        if params.get("scopes").is_none() {
            // Not fatal, but a sign the app was granted less than requested.
            warn!(channel = self.name(), "callback carried no granted scopes");
        }
        Ok(())
    }

    fn extract_credentials(&self, params: &CallbackParams) -> ChannelCredentials {
        ChannelCredentials {
            // The authorization code is the exchange input; stored as the
            // connection's api_key until the exchange runs.
            api_key: params.code().map(str::to_string),
            // Granted scopes are retained for reference.
            api_secret: params.get("scopes").map(str::to_string),
            ..ChannelCredentials::default()
        }
    }

    fn success_message(&self) -> String {
        "TikTok account successfully connected!".to_string()
    }
}
