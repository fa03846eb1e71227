//! Marketplace channel integrations: the channel catalog, per-channel OAuth
//! connectors, the shared callback pipeline, and team-channel persistence.
//!
//! Adding a channel means implementing [`ChannelConnector`] and registering
//! it in the [`ConnectorRegistry`]; everything else (state verification,
//! credential validation, team resolution, persistence) is shared.

pub mod catalog;
pub mod connector;
pub mod error;
pub mod registry;
pub mod schema;
pub mod service;
pub mod shopee;
pub mod store;
pub mod teams;
pub mod tiktok;

pub use {
    catalog::{AuthType, ChannelCatalog, ChannelDefinition, CredentialCheck, CredentialField},
    connector::{AuthLink, CallbackParams, ChannelConnector, ChannelCredentials, ConnectParams},
    error::{Error, Result, StateRejection},
    registry::ConnectorRegistry,
    service::{CallbackSuccess, ChannelService},
    shopee::ShopeeConnector,
    store::{ConnectionStore, TeamChannelConnection},
    teams::TeamDirectory,
    tiktok::TikTokConnector,
};
