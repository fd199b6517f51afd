use aws_sdk_dynamodb::error::BuildError;
use std::error;
use thiserror::Error;

/// Errors raised while defining models, planning filters or talking to the store.
#[derive(Debug, Error)]
pub enum Error {
    /// The model definition violates a key-schema rule.
    ///
    /// Raised once, when the model is defined, never at query time.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A record or primary key is missing a required key attribute.
    #[error("validation error: {0}")]
    Validation(String),
    /// A `where` condition does not have one of the accepted shapes.
    #[error("malformed condition on `{attribute}`: {reason}")]
    MalformedCondition {
        /// The filtered attribute.
        attribute: String,
        /// What is wrong with the condition.
        reason: String,
    },
    /// No model with this name was defined on the adapter.
    #[error("model `{0}` is not defined")]
    UnknownModel(String),
    /// Converting between records and caller types failed.
    #[error(transparent)]
    Serialization(#[from] serde_dynamo::Error),
    /// A DynamoDB request value could not be built.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// The store rejected or failed a request; the source is passed through untouched.
    #[error(transparent)]
    Transport(Box<dyn error::Error + Send + Sync>),
}

impl Error {
    /// Wrap a store error.
    pub fn transport<E>(error: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(error))
    }

    pub(crate) fn malformed(attribute: &str, reason: impl Into<String>) -> Self {
        Self::MalformedCondition {
            attribute: attribute.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from the store rather than from the connector.
    pub fn is_transport_error(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
