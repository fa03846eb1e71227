//! Configuration loading, validation, and env substitution.
//!
//! Config files: `lapak.toml`, `lapak.yaml`, or `lapak.json`
//! Searched in `./` then `~/.config/lapak/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;

pub use {
    env_subst::substitute_env,
    error::{Error, Result},
    loader::{config_dir, discover_and_load, load_file},
    schema::{
        ChannelsConfig, DatabaseConfig, ExtraChannelConfig, LapakConfig, OAuthStateConfig,
        ServerConfig, ShopeeConfig, TeamsConfig, TikTokConfig,
    },
};
