//! Shopee marketplace connector.
//!
//! Shopee's open platform uses a signed-request authorization flow: the
//! partner id, API path, and a unix timestamp are HMAC-SHA256-signed with
//! the partner key. The state token rides on the redirect URI itself so the
//! provider echoes it back to the callback.

use std::time::{SystemTime, UNIX_EPOCH};

use {
    async_trait::async_trait,
    hmac::{Hmac, Mac},
    secrecy::ExposeSecret,
    sha2::Sha256,
    url::Url,
};

use {
    crate::{
        connector::{AuthLink, CallbackParams, ChannelConnector, ChannelCredentials, ConnectParams},
        error::{Error, Result},
    },
    lapak_config::ShopeeConfig,
    lapak_oauth::{StateStore, generate_state},
};

/// Authorization path on the open platform host; also the signed API path.
const AUTH_PATH: &str = "/api/v2/shop/auth_partner";

pub struct ShopeeConnector {
    config: ShopeeConfig,
    states: StateStore,
    public_base_url: String,
}

impl ShopeeConnector {
    pub fn new(config: ShopeeConfig, states: StateStore, public_base_url: String) -> Self {
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
            .unwrap_or_else(|| format!("{}/callback/auth/shopee", self.public_base_url))
    }

    /// `HMAC_SHA256(partner_key, "{partner_id}{path}{timestamp}")`, hex.
    fn sign(&self, timestamp: i64) -> Result<String> {
        let key = self
            .config
            .partner_key
            .as_ref()
            .ok_or_else(|| Error::configuration("shopee partner_key is not set"))?;
        let base_string = format!("{}{}{}", self.config.partner_id, AUTH_PATH, timestamp);
        let mut mac = Hmac::<Sha256>::new_from_slice(key.expose_secret().as_bytes())
            .map_err(|_| Error::configuration("shopee partner_key is empty"))?;
        mac.update(base_string.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl ChannelConnector for ShopeeConnector {
    fn name(&self) -> &str {
        "shopee"
    }

    async fn auth_link(&self, params: &ConnectParams) -> Result<AuthLink> {
        if self.config.partner_id == 0 {
            return Err(Error::configuration("shopee partner_id is not set"));
        }

        let state = generate_state();
        let redirect_uri = self.redirect_uri(params.redirect_uri.as_deref());
        let redirect_with_state = format!("{redirect_uri}?state={state}");

        // The state must be durable before the browser leaves for Shopee.
        self.states
            .put(&state, self.name(), &params.user_id, None)
            .await?;

        let timestamp = unix_now();
        let sign = self.sign(timestamp)?;

        let mut url = Url::parse(&format!("{}{}", self.config.host, AUTH_PATH))
            .map_err(|e| Error::configuration(format!("invalid shopee host: {e}")))?;
        url.query_pairs_mut()
            .append_pair("partner_id", &self.config.partner_id.to_string())
            .append_pair("redirect", &redirect_with_state)
            .append_pair("timestamp", &timestamp.to_string())
            .append_pair("sign", &sign);

        Ok(AuthLink {
            auth_link: url.to_string(),
            state,
        })
    }

    fn validate_callback(&self, params: &CallbackParams) -> Result<()> {
        if params.get("shop_id").is_none() {
            return Err(Error::missing("shop_id"));
        }
        Ok(())
    }

    fn extract_credentials(&self, params: &CallbackParams) -> ChannelCredentials {
        ChannelCredentials {
            shop_id: params.get("shop_id").map(str::to_string),
            // Shopee hands the shop-scoped authorization code back as `code`;
            // it is stored as the connection's api_key.
            api_key: params.code().map(str::to_string),
            ..ChannelCredentials::default()
        }
    }

    fn success_message(&self) -> String {
        "Shopee account successfully connected!".to_string()
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
