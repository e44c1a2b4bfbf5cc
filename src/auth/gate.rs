//! The authentication gate run in front of every protected route.
//!
//! A request is accepted only when its bearer token has a valid signature, is inside its
//! validity window, *and* still has a live session row. The checks run in that order and
//! stop at the first failure. Nothing is remembered between calls; the only state read
//! is the session table.

use actix_web::http::header::HeaderValue;
use chrono::{DateTime, Utc};
use std::fmt;

use crate::auth::session::SessionStore;
use crate::auth::token::TokenIssuer;
use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

/// Why the gate turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No `Authorization` header.
    MissingCredential,
    /// The header is not `Bearer <token>`.
    MalformedCredential,
    /// Signature, algorithm, issuer or validity window check failed.
    InvalidToken,
    /// The token has no live session (logged out, expired, or the lookup failed).
    InvalidSession,
}

impl fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let message = match self {
            AuthRejection::MissingCredential => "Authorization header missing",
            AuthRejection::MalformedCredential => "Invalid authorization format",
            AuthRejection::InvalidToken => "Invalid or expired token",
            AuthRejection::InvalidSession => "Invalid or expired session",
        };
        f.write_str(message)
    }
}

impl std::error::Error for AuthRejection {}

impl From<AuthRejection> for AppError {
    fn from(rejection: AuthRejection) -> Self {
        AppError::Unauthorized(rejection.to_string())
    }
}

/// A request that passed the gate.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user_id: i64,
    pub token: String,
}

/// Extracts the token from an `Authorization` header value.
///
/// The prefix match is case-sensitive. Header values that are not visible ASCII count as
/// malformed.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthRejection> {
    let header = header.ok_or(AuthRejection::MissingCredential)?;
    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .ok_or(AuthRejection::MalformedCredential)
}

#[derive(Clone)]
pub struct AuthGate {
    tokens: TokenIssuer,
    sessions: SessionStore,
}

impl AuthGate {
    pub fn new(tokens: TokenIssuer, sessions: SessionStore) -> Self {
        Self { tokens, sessions }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub async fn authenticate(
        &self,
        header: Option<&HeaderValue>,
    ) -> Result<Authenticated, AuthRejection> {
        self.authenticate_at(header, Utc::now()).await
    }

    pub async fn authenticate_at(
        &self,
        header: Option<&HeaderValue>,
        now: DateTime<Utc>,
    ) -> Result<Authenticated, AuthRejection> {
        let token = bearer_token(header)?;

        let claims = self
            .tokens
            .verify_at(token, now)
            .map_err(|_| AuthRejection::InvalidToken)?;

        // A failed lookup must never let the request through.
        match self.sessions.is_valid_at(token, claims.user_id, now).await {
            Ok(true) => {}
            Ok(false) => return Err(AuthRejection::InvalidSession),
            Err(e) => {
                log::error!("Session lookup failed for user {}: {}", claims.user_id, e);
                return Err(AuthRejection::InvalidSession);
            }
        }

        Ok(Authenticated {
            user_id: claims.user_id,
            token: token.to_string(),
        })
    }
}
