//! Signed token issuance and verification (HS256 JWTs).
//!
//! Two kinds of token exist:
//! - **session tokens** `{id, role}` valid for 7 days, presented as
//!   `Authorization: Bearer <token>` on protected routes;
//! - **reset tokens** `{uid, email, purpose: "pwdreset"}` valid for 1 hour,
//!   accepted only by the password-reset endpoint.
//!
//! The claim sets do not overlap, so a reset token never decodes as a
//! session token and vice versa, even when both share a secret.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{role::Role, user::User},
};

pub const RESET_PURPOSE: &str = "pwdreset";

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: i32,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Claims carried by a password-reset token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetClaims {
    pub uid: i32,
    pub email: String,
    pub purpose: String,
    /// Unique per issuance.
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    session: KeyPair,
    reset: KeyPair,
    session_ttl: Duration,
    reset_ttl: Duration,
    validation: Validation,
}

impl TokenService {
    pub fn new(session_secret: &str, reset_secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            session: KeyPair::from_secret(session_secret),
            reset: KeyPair::from_secret(reset_secret),
            session_ttl: Duration::days(7),
            reset_ttl: Duration::hours(1),
            validation,
        }
    }

    pub fn issue_session(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = SessionClaims {
            id: user.id,
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.session_ttl).timestamp(),
        };
        sign(&self.session, &claims)
    }

    /// Any failure (bad signature, expired, wrong shape) is `InvalidToken`.
    pub fn verify_session(&self, token: &str) -> Result<SessionClaims, AppError> {
        self.decode_with(&self.session, token)
            .ok_or(AppError::InvalidToken)
    }

    pub fn issue_reset(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = ResetClaims {
            uid: user.id,
            email: user.email.clone(),
            purpose: RESET_PURPOSE.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.reset_ttl).timestamp(),
        };
        sign(&self.reset, &claims)
    }

    /// Verify signature, expiry and the `pwdreset` purpose.
    pub fn verify_reset(&self, token: &str) -> Result<ResetClaims, AppError> {
        self.decode_with::<ResetClaims>(&self.reset, token)
            .filter(|claims| claims.purpose == RESET_PURPOSE)
            .ok_or(AppError::InvalidOrExpiredToken)
    }

    fn decode_with<T: DeserializeOwned>(&self, keys: &KeyPair, token: &str) -> Option<T> {
        decode::<T>(token, &keys.decoding, &self.validation)
            .map(|data| data.claims)
            .ok()
    }
}

fn sign<T: Serialize>(keys: &KeyPair, claims: &T) -> Result<String, AppError> {
    encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
        .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("session_secret", &"<redacted>")
            .field("reset_secret", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("reset_ttl", &self.reset_ttl)
            .finish()
    }
}
