//! The per-channel connection contract.

use std::collections::HashMap;

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
};

use crate::{catalog::CredentialField, error::Result};

/// Input for initiating a connection from the settings UI.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub user_id: String,
    /// Overrides the channel's configured/derived redirect URI.
    pub redirect_uri: Option<String>,
    /// Overrides the channel default scope list. Never sent empty; an
    /// empty override falls back to the channel default.
    pub scopes: Vec<String>,
}

impl ConnectParams {
    #[must_use]
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            redirect_uri: None,
            scopes: Vec::new(),
        }
    }
}

/// A generated provider authorization URL and its bound state token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthLink {
    pub auth_link: String,
    pub state: String,
}

/// Query parameters delivered by the provider to the callback endpoint.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    params: HashMap<String, String>,
}

impl CallbackParams {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn code(&self) -> Option<&str> {
        self.get("code")
    }

    pub fn state(&self) -> Option<&str> {
        self.get("state")
    }

    pub fn provider_error(&self) -> Option<&str> {
        // Prefer the human-readable description when the provider sent one.
        self.get("error_description").or_else(|| self.get("error"))
    }
}

impl From<HashMap<String, String>> for CallbackParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self { params }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for CallbackParams {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self {
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Normalized credentials extracted from a callback or submitted directly.
///
/// Which fields are populated depends on the channel definition's required
/// and optional credential lists.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelCredentials {
    pub shop_id: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl ChannelCredentials {
    #[must_use]
    pub fn field(&self, field: CredentialField) -> Option<&str> {
        let value = match field {
            CredentialField::ShopId => &self.shop_id,
            CredentialField::ApiKey => &self.api_key,
            CredentialField::ApiSecret => &self.api_secret,
            CredentialField::AccessToken => &self.access_token,
            CredentialField::RefreshToken => &self.refresh_token,
        };
        value.as_deref()
    }
}

impl std::fmt::Debug for ChannelCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            match value {
                Some(_) => "[REDACTED]",
                None => "-",
            }
        }
        f.debug_struct("ChannelCredentials")
            .field("shop_id", &self.shop_id)
            .field("api_key", &redact(&self.api_key))
            .field("api_secret", &redact(&self.api_secret))
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Capability contract each marketplace channel implements.
///
/// Connectors build provider-specific authorization URLs and map callback
/// parameters onto normalized credentials; the surrounding pipeline handles
/// everything channel-agnostic.
#[async_trait]
pub trait ChannelConnector: Send + Sync {
    /// Catalog key this connector serves (lowercase).
    fn name(&self) -> &str;

    /// Build the provider authorization URL. The state token (and PKCE
    /// verifier where applicable) must be durably stored before the link is
    /// returned; a link whose state was never persisted is a dead end.
    async fn auth_link(&self, params: &ConnectParams) -> Result<AuthLink>;

    /// Channel-specific callback checks beyond the shared `code`/`state`
    /// validation, e.g. Shopee's `shop_id`.
    fn validate_callback(&self, params: &CallbackParams) -> Result<()>;

    /// Map provider callback parameters onto normalized credentials.
    fn extract_credentials(&self, params: &CallbackParams) -> ChannelCredentials;

    /// Banner text for the success redirect.
    fn success_message(&self) -> String;
}
