//! Envelope error types.

use crate::envelope::EnvelopeState;
use digienv_crypto::CryptoError;
use thiserror::Error;

/// Result type for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Errors that can occur while writing, sealing or opening an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("cannot {operation} while envelope is {state}")]
    InvalidState {
        operation: &'static str,
        state: EnvelopeState,
    },

    #[error("envelope is closed: read and write require an open scope")]
    Closed,

    #[error("envelope is sealed: unseal it before reading")]
    Sealed,

    #[error("envelope has been sealed already")]
    AlreadySealed,

    #[error("cannot unwrap envelope key: {0}")]
    Unwrap(String),

    #[error("entropy source unavailable: {0}")]
    EntropyUnavailable(String),

    #[error("crypto error: {0}")]
    Crypto(CryptoError),

    #[error("invalid artifact: {0}")]
    Artifact(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CryptoError> for EnvelopeError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Unwrap(msg) => Self::Unwrap(msg),
            CryptoError::EntropyUnavailable(msg) => Self::EntropyUnavailable(msg),
            other => Self::Crypto(other),
        }
    }
}
