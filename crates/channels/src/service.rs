//! Connect/callback orchestration.
//!
//! [`ChannelService`] is the single dispatch point: it routes connect
//! requests to the right connector, runs the shared callback pipeline, and
//! is the only component that touches both the state store and the
//! connection store in one flow.

use tracing::{debug, info, warn};

use {
    crate::{
        catalog::{AuthType, ChannelCatalog, ChannelDefinition},
        connector::{AuthLink, CallbackParams, ChannelCredentials, ConnectParams},
        error::{Error, Result, StateRejection},
        registry::ConnectorRegistry,
        store::{ConnectionStore, TeamChannelConnection},
        teams::TeamDirectory,
    },
    lapak_oauth::{StateStore, StateVerification},
};

/// Outcome of a successfully processed callback.
#[derive(Debug, Clone)]
pub struct CallbackSuccess {
    pub channel: String,
    pub team_id: String,
    pub message: String,
}

pub struct ChannelService {
    catalog: ChannelCatalog,
    connectors: ConnectorRegistry,
    states: StateStore,
    connections: ConnectionStore,
    teams: TeamDirectory,
}

impl ChannelService {
    pub fn new(
        catalog: ChannelCatalog,
        connectors: ConnectorRegistry,
        states: StateStore,
        connections: ConnectionStore,
        teams: TeamDirectory,
    ) -> Self {
        Self {
            catalog,
            connectors,
            states,
            connections,
            teams,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &ChannelCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn connections(&self) -> &ConnectionStore {
        &self.connections
    }

    /// Build an auth link for an OAuth channel. The connector persists the
    /// state token before the link is returned.
    pub async fn connect_link(&self, channel: &str, params: ConnectParams) -> Result<AuthLink> {
        let definition = self.definition(channel)?;
        if definition.auth_type != AuthType::OAuth {
            return Err(Error::NotOAuthChannel {
                channel: definition.name.clone(),
            });
        }
        let connector = self
            .connectors
            .get(&definition.name)
            .ok_or_else(|| Error::unsupported(definition.name.as_str()))?;

        let link = connector.auth_link(&params).await?;
        info!(
            channel = %definition.name,
            user_id = %params.user_id,
            "issued auth link"
        );
        Ok(link)
    }

    /// Run the callback pipeline for a provider redirect.
    ///
    /// Strictly ordered: provider error → required params → state
    /// verification (consuming the token) → channel-specific validation →
    /// credential extraction → catalog validation → team resolution →
    /// connection upsert. Each failure short-circuits; there are no retries
    /// because the state token is already consumed or rejected.
    pub async fn handle_callback(
        &self,
        channel: &str,
        params: &CallbackParams,
    ) -> Result<CallbackSuccess> {
        let definition = self.definition(channel)?;
        let connector = self
            .connectors
            .get(&definition.name)
            .ok_or_else(|| Error::unsupported(definition.name.as_str()))?;

        if let Some(message) = params.provider_error() {
            return Err(Error::provider(message));
        }

        params.code().ok_or_else(|| Error::missing("code"))?;
        let state = params.state().ok_or_else(|| Error::missing("state"))?;

        let verification = self.states.verify_and_consume(state, &definition.name).await?;
        let (user_id, code_verifier) = match verification {
            StateVerification::Valid {
                user_id,
                code_verifier,
            } => (user_id, code_verifier),
            StateVerification::NotFound => {
                return Err(self.reject_state(&definition.name, StateRejection::NotFound));
            },
            StateVerification::Expired => {
                return Err(self.reject_state(&definition.name, StateRejection::Expired));
            },
            StateVerification::ChannelMismatch { issued_for } => {
                warn!(
                    channel = %definition.name,
                    issued_for = %issued_for,
                    "state token presented to the wrong channel"
                );
                return Err(Error::invalid_state(StateRejection::ChannelMismatch));
            },
        };

        connector.validate_callback(params)?;

        let credentials = connector.extract_credentials(params);
        let check = self
            .catalog
            .validate_credentials(&definition.name, &credentials)?;
        if !check.valid {
            warn!(
                channel = %definition.name,
                missing = ?check.missing,
                "extracted credentials failed validation"
            );
            return Err(Error::credential_validation(check.missing));
        }

        // PKCE channels get their verifier back here for the token exchange.
        debug!(
            channel = %definition.name,
            has_verifier = code_verifier.is_some(),
            "state verified"
        );

        let team_id = self.teams.team_for_user(&user_id).await?;
        self.connections
            .connect(&team_id, &definition.name, credentials)
            .await?;

        info!(
            channel = %definition.name,
            team_id = %team_id,
            user_id = %user_id,
            "channel connected"
        );
        Ok(CallbackSuccess {
            channel: definition.name.clone(),
            team_id,
            message: connector.success_message(),
        })
    }

    /// Direct connect for channels that authenticate with marketplace
    /// credentials instead of an OAuth handshake.
    pub async fn connect_with_credentials(
        &self,
        channel: &str,
        user_id: &str,
        credentials: ChannelCredentials,
    ) -> Result<TeamChannelConnection> {
        let definition = self.definition(channel)?;
        if definition.auth_type != AuthType::ApiKey {
            return Err(Error::NotApiKeyChannel {
                channel: definition.name.clone(),
            });
        }

        let check = self
            .catalog
            .validate_credentials(&definition.name, &credentials)?;
        if !check.valid {
            return Err(Error::credential_validation(check.missing));
        }

        let team_id = self.teams.team_for_user(user_id).await?;
        let connection = self
            .connections
            .connect(&team_id, &definition.name, credentials)
            .await?;
        info!(channel = %definition.name, team_id = %team_id, user_id, "channel connected");
        Ok(connection)
    }

    /// Disconnect the acting user's team from a channel. Returns whether a
    /// connection row was affected.
    pub async fn disconnect(&self, channel: &str, user_id: &str) -> Result<bool> {
        let definition = self.definition(channel)?;
        let team_id = self.teams.team_for_user(user_id).await?;
        let changed = self.connections.disconnect(&team_id, &definition.name).await?;
        info!(channel = %definition.name, team_id = %team_id, changed, "channel disconnected");
        Ok(changed)
    }

    fn definition(&self, channel: &str) -> Result<&ChannelDefinition> {
        self.catalog
            .get(channel)
            .ok_or_else(|| Error::unsupported(channel))
    }

    fn reject_state(&self, channel: &str, rejection: StateRejection) -> Error {
        // Logged distinctly from ordinary user errors: a bad state token is
        // a potential CSRF or replay, not a typo.
        warn!(
            channel,
            rejection = %rejection,
            "state verification failed; possible replay or forged callback"
        );
        Error::invalid_state(rejection)
    }
}
