//! Mock session tokens and the session context object.
//!
//! This is not a security mechanism. Any non-empty username/password pair
//! is accepted, and the token is an unsigned base64-encoded JSON payload
//! `{username, iat, exp}` (milliseconds since the Unix epoch) with a fixed
//! one-hour validity window. An expired token is silently reissued for the
//! same user rather than reported as a failure.
//!
//! Persistence and the background refresh task live in the application
//! crate; this module only handles the token and the in-memory context.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Fixed token validity window.
pub const TOKEN_VALIDITY_MS: i64 = 3_600_000;

/// Lower bound on the background liveness-check interval, in seconds.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 300;

/// Decoded token body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub username: String,
    /// Issued-at, ms since epoch.
    pub iat: i64,
    /// Expires-at, ms since epoch.
    pub exp: i64,
}

impl TokenPayload {
    pub fn issue(username: &str, now: DateTime<Utc>) -> Self {
        let iat = now.timestamp_millis();
        Self {
            username: username.to_string(),
            iat,
            exp: iat + TOKEN_VALIDITY_MS,
        }
    }

    pub fn encode(&self) -> String {
        // Serializing a struct of strings and integers cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        STANDARD.encode(json)
    }

    pub fn decode(token: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|_| Error::InvalidToken)?;
        serde_json::from_slice(&bytes).map_err(|_| Error::InvalidToken)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp_millis() >= self.exp
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.exp).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: String,
}

/// Explicit session context: created on login, dropped on logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: User,
    payload: TokenPayload,
    token: String,
}

impl Session {
    /// Accept any non-empty credentials and issue a fresh token.
    pub fn login(username: &str, password: &str, now: DateTime<Utc>) -> Result<Self> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(Error::InvalidCredentials);
        }
        Ok(Self::issue(username.trim(), now))
    }

    fn issue(username: &str, now: DateTime<Utc>) -> Self {
        let payload = TokenPayload::issue(username, now);
        Self {
            user: User {
                username: username.to_string(),
            },
            token: payload.encode(),
            payload,
        }
    }

    /// Rebuild a session from a stored token.
    ///
    /// Returns [`Error::AuthExpired`] when the token decodes but is past
    /// its window; see [`restore`](Self::restore) for the reissuing path.
    pub fn from_token(token: &str, now: DateTime<Utc>) -> Result<Self> {
        let payload = TokenPayload::decode(token)?;
        if payload.username.is_empty() {
            return Err(Error::InvalidToken);
        }
        if payload.is_expired(now) {
            return Err(Error::AuthExpired);
        }
        Ok(Self {
            user: User {
                username: payload.username.clone(),
            },
            token: token.trim().to_string(),
            payload,
        })
    }

    /// Rebuild a session, reissuing an expired token for the same user.
    ///
    /// The second value is `true` when a new token was issued.
    pub fn restore(token: &str, now: DateTime<Utc>) -> Result<(Self, bool)> {
        match Self::from_token(token, now) {
            Ok(session) => Ok((session, false)),
            Err(Error::AuthExpired) => {
                let payload = TokenPayload::decode(token)?;
                Ok((Self::issue(&payload.username, now), true))
            }
            Err(e) => Err(e),
        }
    }

    /// Liveness check.
    pub fn check(&self, now: DateTime<Utc>) -> Result<()> {
        if self.payload.is_expired(now) {
            return Err(Error::AuthExpired);
        }
        Ok(())
    }

    /// Issue a new token for the current user.
    pub fn reissue(&mut self, now: DateTime<Utc>) {
        *self = Self::issue(&self.user.username, now);
    }

    /// Reissue only if expired. Returns `true` when a new token was issued.
    pub fn refresh_if_expired(&mut self, now: DateTime<Utc>) -> bool {
        match self.check(now) {
            Ok(()) => false,
            Err(_) => {
                self.reissue(now);
                true
            }
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn payload(&self) -> &TokenPayload {
        &self.payload
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.payload.expires_at()
    }

    /// Time left before expiry (zero once expired).
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let left = self.payload.exp - now.timestamp_millis();
        Duration::milliseconds(left.max(0))
    }
}
