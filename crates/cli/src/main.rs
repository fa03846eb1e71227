use std::{path::PathBuf, sync::Arc, time::Duration};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::info,
    tracing_subscriber::EnvFilter,
};

use {
    lapak_channels::{
        ChannelCatalog, ChannelService, ConnectorRegistry, ConnectionStore, ShopeeConnector,
        TeamDirectory, TikTokConnector,
    },
    lapak_config::LapakConfig,
    lapak_oauth::StateStore,
    lapak_web::AppState,
};

#[derive(Parser)]
#[command(name = "lapak", about = "lapak marketplace channel gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides discovery).
    #[arg(long, global = true, env = "LAPAK_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,

    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default when no subcommand is provided).
    Serve,
    /// Print the channel catalog.
    Channels,
    /// Run database migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    let mut config =
        lapak_config::discover_and_load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Channels => print_channels(&config),
        Commands::Migrate => {
            let pool = open_database(&config).await?;
            pool.close().await;
            info!("migrations applied");
            Ok(())
        },
    }
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone()));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_database(config: &LapakConfig) -> anyhow::Result<SqlitePool> {
    let options = if config.database.path == ":memory:" {
        SqliteConnectOptions::new().in_memory(true)
    } else {
        SqliteConnectOptions::new()
            .filename(&config.database.path)
            .create_if_missing(true)
    };
    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .context("opening database")?;
    lapak_oauth::schema::run_migrations(&pool)
        .await
        .context("running oauth migrations")?;
    lapak_channels::schema::run_migrations(&pool)
        .await
        .context("running channel migrations")?;
    Ok(pool)
}

async fn serve(config: LapakConfig) -> anyhow::Result<()> {
    let pool = open_database(&config).await?;

    let catalog =
        ChannelCatalog::from_config(&config.channels).context("building channel catalog")?;
    let states = StateStore::with_ttl(
        pool.clone(),
        Duration::from_secs(config.oauth.state_ttl_secs),
    );
    let base_url = config.server.public_base_url();

    let mut connectors = ConnectorRegistry::new();
    connectors.register(Arc::new(ShopeeConnector::new(
        config.channels.shopee.clone(),
        states.clone(),
        base_url.clone(),
    )));
    connectors.register(Arc::new(TikTokConnector::new(
        config.channels.tiktok.clone(),
        states.clone(),
        base_url.clone(),
    )));

    let service = ChannelService::new(
        catalog,
        connectors,
        states,
        ConnectionStore::new(pool.clone()),
        TeamDirectory::new(pool.clone(), config.teams.default_team.clone()),
    );

    let app = lapak_web::routes().with_state(AppState::new(service));
    let address = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, %base_url, "lapak listening");
    axum::serve(listener, app).await.context("serving")?;
    Ok(())
}

fn print_channels(config: &LapakConfig) -> anyhow::Result<()> {
    let catalog = ChannelCatalog::from_config(&config.channels)?;
    for definition in catalog.all() {
        let auth = match definition.auth_type {
            lapak_channels::AuthType::OAuth => "oauth",
            lapak_channels::AuthType::ApiKey => "api_key",
        };
        let required: Vec<&str> = definition
            .required_credentials
            .iter()
            .map(|f| f.as_str())
            .collect();
        println!(
            "{:<12} {:<8} requires: {}",
            definition.name,
            auth,
            required.join(", ")
        );
    }
    Ok(())
}
