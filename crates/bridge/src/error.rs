//! Bridge error types

use bridge_core::{OptionError, ParseError};
use lichess::ClientError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Could not parse command: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Config(String),

    #[error("Lichess unavailable: {0}")]
    Transient(ClientError),

    #[error("Rejected by Lichess: {0}")]
    Rejected(String),

    #[error("Board out of sync with Lichess: {0}")]
    Inconsistency(String),
}

impl From<ClientError> for BridgeError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Unauthorized => {
                BridgeError::Config("Login failed - check token".to_string())
            }
            ClientError::Rejected(msg) => BridgeError::Rejected(msg),
            e if e.is_transient() => BridgeError::Transient(e),
            e => BridgeError::Rejected(e.to_string()),
        }
    }
}

impl From<OptionError> for BridgeError {
    fn from(e: OptionError) -> Self {
        BridgeError::Config(e.to_string())
    }
}
