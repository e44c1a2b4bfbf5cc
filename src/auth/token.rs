//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs carrying the user id, issuer, issue/not-before/expiry instants
//! and a random token id. A token proves *who* the bearer is; whether it is still
//! honoured is decided by the session store (see [`crate::auth::gate`]).

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::AppError;

/// Issuer tag embedded in, and required of, every token.
pub const TOKEN_ISSUER: &str = "todo-gate";

/// Token lifetime in seconds (24 hours). Sessions use the same lifetime.
pub const TOKEN_TTL_SECONDS: i64 = 60 * 60 * 24;

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Identifier of the user the token was issued to.
    pub user_id: i64,
    /// Issuer, always [`TOKEN_ISSUER`].
    pub iss: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Not valid before (seconds since epoch).
    pub nbf: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
    /// Unique token id; keeps two tokens issued in the same second distinct.
    pub jti: String,
}

/// The single failure outcome of [`TokenIssuer::verify`].
///
/// Bad signatures, wrong algorithms, expired or malformed tokens are deliberately
/// indistinguishable to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidToken;

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Invalid or expired token")
    }
}

impl std::error::Error for InvalidToken {}

/// Issues and verifies tokens with a process-wide symmetric key.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);
        // Time windows are checked in `verify_at` against a single clock with no leeway.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Issues a token for `user_id`, valid for 24 hours from now.
    pub fn issue(&self, user_id: i64) -> Result<String, AppError> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<String, AppError> {
        let issued_at = now.timestamp();
        let claims = Claims {
            user_id,
            iss: TOKEN_ISSUER.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at + TOKEN_TTL_SECONDS,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalServerError(format!("Failed to generate token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies signature, algorithm and issuer, then requires `nbf <= now < exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, InvalidToken> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("Token rejected: {}", e);
                InvalidToken
            })?;

        let now = now.timestamp();
        if now < claims.nbf || now >= claims.exp {
            log::debug!("Token for user {} is outside its validity window", claims.user_id);
            return Err(InvalidToken);
        }

        Ok(claims)
    }
}
