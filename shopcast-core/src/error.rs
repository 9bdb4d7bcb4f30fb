use crate::model::MessageKind;
use thiserror::Error;

/// Reasons an incoming signaling envelope is rejected.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("message type `{0}` is not accepted here")]
    UnexpectedType(MessageKind),
}
