pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the state store. Storage failures are fatal to the operation
/// in progress: an unverifiable state token is a dead end for the user, so
/// callers must abort rather than degrade to an in-memory fallback.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("state storage failed: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("{0}")]
    Message(String),
}

impl Error {
    #[must_use]
    pub fn storage(context: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
