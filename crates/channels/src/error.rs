use std::error::Error as StdError;

use crate::catalog::CredentialField;

/// Crate-wide result type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a state token was rejected at callback time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateRejection {
    NotFound,
    Expired,
    ChannelMismatch,
}

impl std::fmt::Display for StateRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NotFound => "not found",
            Self::Expired => "expired",
            Self::ChannelMismatch => "channel mismatch",
        };
        f.write_str(text)
    }
}

/// Typed channel errors. Nothing below the web layer renders user-facing
/// text; handlers call [`Error::user_message`] when building redirects.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The OAuth provider itself reported an error on the callback.
    #[error("provider reported an error: {message}")]
    Provider { message: String },

    /// A required callback parameter was absent.
    #[error("missing required parameter: {name}")]
    MissingParameter { name: String },

    /// The state token failed verification, a potential CSRF or replay.
    #[error("oauth state rejected: {rejection}")]
    InvalidState { rejection: StateRejection },

    /// Extracted credentials failed the catalog's required-field check.
    #[error("credentials missing required fields: {missing:?}")]
    CredentialValidation { missing: Vec<CredentialField> },

    /// The shared store is unreachable or rejected a write. Fatal to the
    /// operation in progress; never degrade to an in-memory fallback.
    #[error("channel storage failed: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// No connector or catalog entry for the requested channel.
    #[error("unsupported channel: {channel}")]
    UnsupportedChannel { channel: String },

    /// The acting user belongs to no team and no default team is configured.
    #[error("user {user_id} does not belong to any team")]
    NoTeam { user_id: String },

    /// Connect-link requested for a channel that does not use OAuth.
    #[error("channel {channel} does not connect via oauth")]
    NotOAuthChannel { channel: String },

    /// Credential submission for a channel that connects via OAuth.
    #[error("channel {channel} connects via oauth, not direct credentials")]
    NotApiKeyChannel { channel: String },

    /// Channel settings are absent or unusable (e.g. missing partner key).
    #[error("invalid channel configuration: {message}")]
    Configuration { message: String },

    /// State-store failure, carried through unchanged.
    #[error(transparent)]
    State(#[from] lapak_oauth::Error),
}

impl Error {
    #[must_use]
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    #[must_use]
    pub fn invalid_state(rejection: StateRejection) -> Self {
        Self::InvalidState { rejection }
    }

    #[must_use]
    pub fn credential_validation(missing: Vec<CredentialField>) -> Self {
        Self::CredentialValidation { missing }
    }

    #[must_use]
    pub fn storage(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn unsupported(channel: impl Into<String>) -> Self {
        Self::UnsupportedChannel {
            channel: channel.into(),
        }
    }

    #[must_use]
    pub fn no_team(user_id: impl Into<String>) -> Self {
        Self::NoTeam {
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Copy shown to the user on the settings-page banner.
    ///
    /// State rejections stay generic on purpose: the distinction between
    /// replay and forgery lives in the logs, not in the browser.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider { message } => format!("OAuth error: {message}"),
            Self::MissingParameter { name } => format!("Missing {name} parameter"),
            Self::InvalidState { rejection } => match rejection {
                StateRejection::Expired => {
                    "Connection attempt expired - please try again".to_string()
                },
                StateRejection::NotFound | StateRejection::ChannelMismatch => {
                    "Connection could not be verified - please try again".to_string()
                },
            },
            Self::CredentialValidation { missing } => {
                let fields: Vec<&str> = missing.iter().map(CredentialField::as_str).collect();
                format!("Missing required fields: {}", fields.join(", "))
            },
            Self::Storage { .. } | Self::State(_) => {
                "A temporary storage problem occurred - please try again".to_string()
            },
            Self::UnsupportedChannel { channel } => format!("Unknown channel: {channel}"),
            Self::NoTeam { .. } => "Your account does not belong to a team".to_string(),
            Self::NotOAuthChannel { channel } => {
                format!("{channel} is connected with marketplace credentials, not OAuth")
            },
            Self::NotApiKeyChannel { channel } => {
                format!("{channel} is connected through its OAuth flow")
            },
            Self::Configuration { .. } => {
                "This channel is not configured on the server".to_string()
            },
        }
    }
}
