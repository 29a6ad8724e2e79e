//! Error kinds shared by the core and the application crate.

use thiserror::Error;

/// Errors produced by the remote source, the session, and the token codec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Non-success HTTP status, transport failure, or an unparsable body.
    #[error("{message}")]
    Network { message: String },

    /// The session token is past its validity window.
    #[error("session token expired")]
    AuthExpired,

    /// Username or password was empty.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The stored token could not be decoded.
    #[error("invalid session token")]
    InvalidToken,
}

impl Error {
    pub fn network(message: impl Into<String>) -> Self {
        Error::Network {
            message: message.into(),
        }
    }

    /// A body that failed to parse is reported as a network failure.
    pub fn parse(err: impl std::fmt::Display) -> Self {
        Error::Network {
            message: format!("Failed to fetch: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
