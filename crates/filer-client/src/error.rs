//! Client error types.

use std::time::Duration;

use filer_types::Status;
use filer_types::status_code::{MasterCode, RPCCode, StatusCode};

/// Errors that can occur during client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A service returned a non-OK status.
    #[error("status error: {0}")]
    Status(#[from] Status),

    /// A transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The call did not finish before its deadline.
    #[error("{op} timed out after {after:?}")]
    Timeout { op: &'static str, after: Duration },

    /// The remote answered with something we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience result type.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

impl From<ClientError> for Status {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status(status) => status,
            ClientError::Http(e) => {
                let code = if e.is_timeout() {
                    RPCCode::TIMEOUT
                } else if e.is_connect() {
                    RPCCode::CONNECT_FAILED
                } else if e.is_decode() {
                    MasterCode::BAD_RESPONSE
                } else {
                    RPCCode::SEND_FAILED
                };
                Status::with_message(code, e.to_string())
            }
            e @ ClientError::Timeout { .. } => Status::with_message(RPCCode::TIMEOUT, e.to_string()),
            ClientError::InvalidResponse(msg) => Status::with_message(MasterCode::BAD_RESPONSE, msg),
            ClientError::Config(msg) => Status::with_message(StatusCode::INVALID_CONFIG, msg),
        }
    }
}
