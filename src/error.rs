use thiserror::Error;

/// Errors that abort a login handshake or a session call.
///
/// A device rejecting the credentials is not one of these: that comes back
/// as a `LoginOutcome` with `success == false`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoginError {
    /// DNS, connect, timeout or body read failure below the RPC layer.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response was not JSON, or a required challenge field was missing.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The device advertised an encryption scheme we cannot derive.
    #[error("unsupported encryption scheme: {0}")]
    Protocol(String),

    /// Session call issued after logout.
    #[error("not logged in")]
    NotLoggedIn,
}

impl From<reqwest::Error> for LoginError {
    fn from(err: reqwest::Error) -> Self {
        LoginError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for LoginError {
    fn from(err: serde_json::Error) -> Self {
        LoginError::MalformedResponse(err.to_string())
    }
}

pub type LoginResult<T> = Result<T, LoginError>;
