/// Config schema types (server, database, oauth state, teams, channels).
use {secrecy::Secret, serde::Deserialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LapakConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub oauth: OAuthStateConfig,
    pub teams: TeamsConfig,
    pub channels: ChannelsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
    /// Public base URL used to build provider redirect URIs. When unset,
    /// falls back to `http://{bind}:{port}`, which is only suitable for
    /// local development, since providers must be able to reach the callback.
    pub base_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// The externally visible base URL, without a trailing slash.
    pub fn public_base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.bind, self.port),
        }
    }
}

/// SQLite database location.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database file path, or ":memory:" for an in-process database.
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "lapak.db".into(),
        }
    }
}

/// OAuth state token settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OAuthStateConfig {
    /// Lifetime of a state token in seconds. A callback presenting an older
    /// token is rejected regardless of any cleanup sweeps.
    pub state_ttl_secs: u64,
}

impl Default for OAuthStateConfig {
    fn default() -> Self {
        Self { state_ttl_secs: 600 }
    }
}

/// Team resolution settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeamsConfig {
    /// Team to fall back to when the acting user has no membership.
    /// When unset, a connect attempt by an orphan user is a hard error.
    pub default_team: Option<String>,
}

/// Per-channel provider settings plus catalog extensions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelsConfig {
    pub shopee: ShopeeConfig,
    pub tiktok: TikTokConfig,
    /// Additional catalog entries beyond the built-in marketplaces.
    pub extra: Vec<ExtraChannelConfig>,
}

/// Shopee open-platform settings (signed-request OAuth).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopeeConfig {
    /// Open platform host, e.g. the sandbox or the live gateway.
    pub host: String,
    pub partner_id: u64,
    /// Partner key used to sign authorization requests. Load via
    /// `${SHOPEE_PARTNER_KEY}` substitution rather than a literal.
    pub partner_key: Option<Secret<String>>,
    /// Overrides the derived `{base_url}/callback/auth/shopee` redirect.
    pub redirect_uri: Option<String>,
}

impl Default for ShopeeConfig {
    fn default() -> Self {
        Self {
            host: "https://openplatform.sandbox.test-stable.shopee.sg".into(),
            partner_id: 0,
            partner_key: None,
            redirect_uri: None,
        }
    }
}

/// TikTok settings (PKCE OAuth).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TikTokConfig {
    pub auth_url: String,
    pub client_key: String,
    /// App secret; unused during the handshake itself but kept alongside the
    /// client key so both live in one place. Load via env substitution.
    pub client_secret: Option<Secret<String>>,
    /// Scopes requested when the caller supplies none.
    pub scopes: Vec<String>,
    /// Overrides the derived `{base_url}/callback/auth/tiktok` redirect.
    pub redirect_uri: Option<String>,
}

impl Default for TikTokConfig {
    fn default() -> Self {
        Self {
            auth_url: "https://www.tiktok.com/v2/auth/authorize/".into(),
            client_key: String::new(),
            client_secret: None,
            scopes: vec![
                "user.info.basic".into(),
                "user.info.profile".into(),
                "user.info.stats".into(),
                "video.list".into(),
                "video.upload".into(),
            ],
            redirect_uri: None,
        }
    }
}

/// A catalog entry declared in config rather than built in.
///
/// Credential fields are named as strings here; the channel catalog parses
/// them against its known field set when it is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExtraChannelConfig {
    pub id: u32,
    pub name: String,
    pub icon: String,
    pub description: String,
    /// "oauth" or "api_key".
    pub auth_type: String,
    pub required_credentials: Vec<String>,
    pub optional_credentials: Vec<String>,
}
