#![allow(clippy::unwrap_used, clippy::expect_used)]
use std::{collections::HashMap, sync::Arc};

use {
    lapak_channels::{
        AuthType, CallbackParams, ChannelCatalog, ChannelCredentials, ChannelService,
        ConnectParams, ConnectorRegistry, ConnectionStore, CredentialField, Error,
        ShopeeConnector, StateRejection, TeamDirectory, TikTokConnector,
    },
    lapak_config::{ShopeeConfig, TikTokConfig},
    lapak_oauth::{StateStore, challenge_for},
    secrecy::Secret,
    sqlx::{SqlitePool, sqlite::SqlitePoolOptions},
    url::Url,
};

const BASE_URL: &str = "http://localhost:3000";
const PARTNER_ID: u64 = 1181853;
const PARTNER_KEY: &str = "test-partner-key";

struct TestEnv {
    pool: SqlitePool,
    service: ChannelService,
    teams: TeamDirectory,
}

async fn setup() -> TestEnv {
    setup_with_default_team(None).await
}

async fn setup_with_default_team(default_team: Option<&str>) -> TestEnv {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    lapak_oauth::schema::run_migrations(&pool).await.unwrap();
    lapak_channels::schema::run_migrations(&pool).await.unwrap();

    let states = StateStore::new(pool.clone());
    let teams = TeamDirectory::new(pool.clone(), default_team.map(str::to_string));

    let shopee = ShopeeConfig {
        partner_id: PARTNER_ID,
        partner_key: Some(Secret::new(PARTNER_KEY.to_string())),
        ..ShopeeConfig::default()
    };
    let tiktok = TikTokConfig {
        client_key: "sbawtestclientkey".into(),
        ..TikTokConfig::default()
    };

    let mut connectors = ConnectorRegistry::new();
    connectors.register(Arc::new(ShopeeConnector::new(
        shopee,
        states.clone(),
        BASE_URL.to_string(),
    )));
    connectors.register(Arc::new(TikTokConnector::new(
        tiktok,
        states.clone(),
        BASE_URL.to_string(),
    )));

    let service = ChannelService::new(
        ChannelCatalog::builtin(),
        connectors,
        states,
        ConnectionStore::new(pool.clone()),
        teams.clone(),
    );

    TestEnv {
        pool,
        service,
        teams,
    }
}

fn query_map(url: &str) -> HashMap<String, String> {
    Url::parse(url)
        .unwrap()
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn shopee_callback(state: &str) -> CallbackParams {
    CallbackParams::from([
        ("code", "auth-code-123"),
        ("shop_id", "shop-789"),
        ("state", state),
    ])
}

#[tokio::test]
async fn shopee_auth_link_is_signed_and_carries_state() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    let link = env
        .service
        .connect_link("shopee", ConnectParams::for_user("u1"))
        .await
        .unwrap();

    assert!(!link.state.is_empty());
    let params = query_map(&link.auth_link);
    assert_eq!(params.get("partner_id").unwrap(), &PARTNER_ID.to_string());

    // The state rides on the redirect URI so the provider echoes it back.
    let redirect = params.get("redirect").unwrap();
    assert!(redirect.starts_with("http://localhost:3000/callback/auth/shopee"));
    assert!(redirect.contains(&format!("state={}", link.state)));

    // Signature is HMAC-SHA256 over partner_id + path + timestamp.
    use {
        hmac::{Hmac, Mac},
        sha2::Sha256,
    };
    let timestamp = params.get("timestamp").unwrap();
    let base_string = format!("{PARTNER_ID}/api/v2/shop/auth_partner{timestamp}");
    let mut mac = Hmac::<Sha256>::new_from_slice(PARTNER_KEY.as_bytes()).unwrap();
    mac.update(base_string.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());
    assert_eq!(params.get("sign").unwrap(), &expected);
}

#[tokio::test]
async fn shopee_callback_connects_the_team() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    let link = env
        .service
        .connect_link("shopee", ConnectParams::for_user("u1"))
        .await
        .unwrap();

    let success = env
        .service
        .handle_callback("shopee", &shopee_callback(&link.state))
        .await
        .unwrap();
    assert_eq!(success.channel, "shopee");
    assert_eq!(success.team_id, "t1");

    let connection = env
        .service
        .connections()
        .get("t1", "shopee")
        .await
        .unwrap()
        .unwrap();
    assert!(connection.connected);
    assert_eq!(connection.credentials.shop_id.as_deref(), Some("shop-789"));
    assert_eq!(
        connection.credentials.api_key.as_deref(),
        Some("auth-code-123")
    );
    assert!(connection.last_sync.is_some());
}

#[tokio::test]
async fn replayed_callback_is_rejected() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    let link = env
        .service
        .connect_link("shopee", ConnectParams::for_user("u1"))
        .await
        .unwrap();
    let params = shopee_callback(&link.state);

    env.service.handle_callback("shopee", &params).await.unwrap();

    // The state was consumed by the first delivery.
    let error = env.service.handle_callback("shopee", &params).await.unwrap_err();
    assert!(matches!(
        error,
        Error::InvalidState {
            rejection: StateRejection::NotFound
        }
    ));
}

#[tokio::test]
async fn expired_state_is_rejected() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    let link = env
        .service
        .connect_link("shopee", ConnectParams::for_user("u1"))
        .await
        .unwrap();
    sqlx::query("UPDATE oauth_states SET expires_at = 1 WHERE state = ?")
        .bind(&link.state)
        .execute(&env.pool)
        .await
        .unwrap();

    let error = env
        .service
        .handle_callback("shopee", &shopee_callback(&link.state))
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        Error::InvalidState {
            rejection: StateRejection::Expired
        }
    ));
}

#[tokio::test]
async fn state_issued_for_another_channel_is_rejected() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    // State issued for shopee, presented to the tiktok callback.
    let link = env
        .service
        .connect_link("shopee", ConnectParams::for_user("u1"))
        .await
        .unwrap();
    let params = CallbackParams::from([
        ("code", "tiktok-code"),
        ("scopes", "user.info.basic"),
        ("state", link.state.as_str()),
    ]);

    let error = env.service.handle_callback("tiktok", &params).await.unwrap_err();
    assert!(matches!(
        error,
        Error::InvalidState {
            rejection: StateRejection::ChannelMismatch
        }
    ));
}

#[tokio::test]
async fn tiktok_link_carries_a_matching_pkce_challenge() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    let link = env
        .service
        .connect_link("tiktok", ConnectParams::for_user("u1"))
        .await
        .unwrap();
    let params = query_map(&link.auth_link);

    assert_eq!(params.get("client_key").unwrap(), "sbawtestclientkey");
    assert_eq!(params.get("code_challenge_method").unwrap(), "S256");
    assert_eq!(params.get("response_type").unwrap(), "code");
    assert!(!params.get("scope").unwrap().is_empty());
    assert_eq!(params.get("state").unwrap(), &link.state);

    // Challenge on the URL must match the verifier persisted with the state.
    let (verifier,): (String,) =
        sqlx::query_as("SELECT code_verifier FROM oauth_states WHERE state = ?")
            .bind(&link.state)
            .fetch_one(&env.pool)
            .await
            .unwrap();
    assert_eq!(params.get("code_challenge").unwrap(), &challenge_for(&verifier));
}

#[tokio::test]
async fn tiktok_callback_stores_code_and_scopes() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    let link = env
        .service
        .connect_link("tiktok", ConnectParams::for_user("u1"))
        .await
        .unwrap();
    let params = CallbackParams::from([
        ("code", "tt-code-1"),
        ("scopes", "user.info.basic,video.list"),
        ("state", link.state.as_str()),
    ]);

    let success = env.service.handle_callback("tiktok", &params).await.unwrap();
    assert_eq!(success.channel, "tiktok");

    let connection = env
        .service
        .connections()
        .get("t1", "tiktok")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(connection.credentials.api_key.as_deref(), Some("tt-code-1"));
    assert_eq!(
        connection.credentials.api_secret.as_deref(),
        Some("user.info.basic,video.list")
    );
}

#[tokio::test]
async fn provider_errors_short_circuit_the_pipeline() {
    let env = setup().await;
    let params = CallbackParams::from([
        ("error", "access_denied"),
        ("error_description", "user cancelled the authorization"),
    ]);
    let error = env.service.handle_callback("shopee", &params).await.unwrap_err();
    assert!(matches!(
        error,
        Error::Provider { message } if message == "user cancelled the authorization"
    ));
}

#[tokio::test]
async fn missing_required_params_are_reported() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    let no_code = CallbackParams::from([("state", "whatever")]);
    let error = env.service.handle_callback("shopee", &no_code).await.unwrap_err();
    assert!(matches!(error, Error::MissingParameter { name } if name == "code"));

    let no_state = CallbackParams::from([("code", "abc")]);
    let error = env.service.handle_callback("shopee", &no_state).await.unwrap_err();
    assert!(matches!(error, Error::MissingParameter { name } if name == "state"));

    // shop_id is checked after state verification, so issue a fresh state.
    let link = env
        .service
        .connect_link("shopee", ConnectParams::for_user("u1"))
        .await
        .unwrap();
    let no_shop = CallbackParams::from([("code", "abc"), ("state", link.state.as_str())]);
    let error = env.service.handle_callback("shopee", &no_shop).await.unwrap_err();
    assert!(matches!(error, Error::MissingParameter { name } if name == "shop_id"));
}

#[tokio::test]
async fn unsupported_channel_is_a_typed_error() {
    let env = setup().await;
    let error = env
        .service
        .connect_link("carousell", ConnectParams::for_user("u1"))
        .await
        .unwrap_err();
    assert!(matches!(error, Error::UnsupportedChannel { .. }));

    let error = env
        .service
        .handle_callback("carousell", &CallbackParams::default())
        .await
        .unwrap_err();
    assert!(matches!(error, Error::UnsupportedChannel { .. }));
}

#[tokio::test]
async fn connect_is_idempotent_per_team_channel() {
    let env = setup().await;
    let store = env.service.connections();

    let first = ChannelCredentials {
        shop_id: Some("shop-1".into()),
        api_key: Some("key-1".into()),
        ..ChannelCredentials::default()
    };
    let second = ChannelCredentials {
        shop_id: Some("shop-1".into()),
        api_key: Some("key-2".into()),
        ..ChannelCredentials::default()
    };

    store.connect("t1", "shopee", first).await.unwrap();
    store.connect("t1", "shopee", second.clone()).await.unwrap();

    let (count,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM team_channels WHERE team_id = 't1' AND channel_id = 'shopee'",
    )
    .fetch_one(&env.pool)
    .await
    .unwrap();
    assert_eq!(count, 1);

    let connection = store.get("t1", "shopee").await.unwrap().unwrap();
    assert!(connection.connected);
    assert_eq!(connection.credentials, second);
}

#[tokio::test]
async fn disconnect_retains_credentials_and_remove_drops_them() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();
    let store = env.service.connections();

    let credentials = ChannelCredentials {
        api_key: Some("k".into()),
        api_secret: Some("s".into()),
        ..ChannelCredentials::default()
    };
    store.connect("t1", "lazada", credentials).await.unwrap();

    assert!(env.service.disconnect("lazada", "u1").await.unwrap());
    let connection = store.get("t1", "lazada").await.unwrap().unwrap();
    assert!(!connection.connected);
    assert_eq!(connection.credentials.api_key.as_deref(), Some("k"));

    assert!(store.remove("t1", "lazada").await.unwrap());
    assert!(store.get("t1", "lazada").await.unwrap().is_none());
    assert!(!store.remove("t1", "lazada").await.unwrap());
}

#[tokio::test]
async fn api_key_channels_connect_with_direct_credentials() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    let credentials = ChannelCredentials {
        api_key: Some("tk-key".into()),
        api_secret: Some("tk-secret".into()),
        ..ChannelCredentials::default()
    };
    let connection = env
        .service
        .connect_with_credentials("tokopedia", "u1", credentials)
        .await
        .unwrap();
    assert_eq!(connection.channel_id, "tokopedia");
    assert!(connection.connected);

    // Incomplete credentials list every missing field.
    let error = env
        .service
        .connect_with_credentials("tokopedia", "u1", ChannelCredentials::default())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        Error::CredentialValidation { missing }
            if missing == vec![CredentialField::ApiKey, CredentialField::ApiSecret]
    ));
}

#[tokio::test]
async fn auth_type_misdispatch_is_rejected() {
    let env = setup().await;
    env.teams.add_membership("t1", "u1", "owner").await.unwrap();

    let error = env
        .service
        .connect_link("tokopedia", ConnectParams::for_user("u1"))
        .await
        .unwrap_err();
    assert!(matches!(error, Error::NotOAuthChannel { .. }));

    let credentials = ChannelCredentials {
        shop_id: Some("s".into()),
        api_key: Some("k".into()),
        ..ChannelCredentials::default()
    };
    let error = env
        .service
        .connect_with_credentials("shopee", "u1", credentials)
        .await
        .unwrap_err();
    assert!(matches!(error, Error::NotApiKeyChannel { .. }));
}

#[tokio::test]
async fn orphan_user_is_a_hard_error_without_default_team() {
    let env = setup().await;

    let link = env
        .service
        .connect_link("shopee", ConnectParams::for_user("nobody"))
        .await
        .unwrap();
    let error = env
        .service
        .handle_callback("shopee", &shopee_callback(&link.state))
        .await
        .unwrap_err();
    assert!(matches!(error, Error::NoTeam { user_id } if user_id == "nobody"));
}

#[tokio::test]
async fn orphan_user_falls_back_to_configured_default_team() {
    let env = setup_with_default_team(Some("fallback-team")).await;

    let link = env
        .service
        .connect_link("shopee", ConnectParams::for_user("nobody"))
        .await
        .unwrap();
    let success = env
        .service
        .handle_callback("shopee", &shopee_callback(&link.state))
        .await
        .unwrap();
    assert_eq!(success.team_id, "fallback-team");

    let connection = env
        .service
        .connections()
        .get("fallback-team", "shopee")
        .await
        .unwrap();
    assert!(connection.is_some());
}

#[tokio::test]
async fn scope_override_reaches_the_auth_url() {
    let env = setup().await;
    let params = ConnectParams {
        user_id: "u1".into(),
        redirect_uri: Some("https://ops.example.com/callback/auth/tiktok".into()),
        scopes: vec!["video.list".into()],
    };
    let link = env.service.connect_link("tiktok", params).await.unwrap();
    let query = query_map(&link.auth_link);
    assert_eq!(query.get("scope").unwrap(), "video.list");
    assert_eq!(
        query.get("redirect_uri").unwrap(),
        "https://ops.example.com/callback/auth/tiktok"
    );
}

#[tokio::test]
async fn catalog_exposes_auth_types() {
    let env = setup().await;
    let catalog = env.service.catalog();
    assert_eq!(catalog.get("shopee").unwrap().auth_type, AuthType::OAuth);
    assert_eq!(catalog.get("tokopedia").unwrap().auth_type, AuthType::ApiKey);
}
