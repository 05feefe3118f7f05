//! Signs and verifies compact credentials (HS256 JWTs) with a server-held secret.
//!
//! The codec is generic over the payload so session credentials and reset
//! credentials share one implementation. Expiry is checked here rather than by
//! `jsonwebtoken` so that "expired" means exactly `now >= iat + ttl`, with no leeway.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::db_types::Role;
use super::utils;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token codec failure: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("signing secret must not be empty")]
pub struct MissingSecret;

/// Asserts who a logged-in caller is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPayload {
    pub user_id: i64,
    pub role: Role,
}

/// Embedded in a reset record; authorizes one password overwrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPayload {
    pub user_id: i64,
    pub role: Role,
}

/// A payload the codec can carry. Its purpose is written into the claims and
/// checked on verify, so a reset credential never passes as a session.
pub trait TokenPayload: Serialize + DeserializeOwned {
    const PURPOSE: &'static str;
}

impl TokenPayload for SessionPayload {
    const PURPOSE: &'static str = "session";
}

impl TokenPayload for ResetPayload {
    const PURPOSE: &'static str = "reset";
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims<P> {
    #[serde(flatten)]
    payload: P,
    typ: String,
    iat: i64,
    exp: i64,
}

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Result<TokenCodec, MissingSecret> {
        if secret.is_empty() {
            return Err(MissingSecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Ok(TokenCodec {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    pub fn sign<P: TokenPayload>(&self, payload: P, ttl_secs: i64) -> Result<String, TokenError> {
        self.sign_at(payload, ttl_secs, utils::current_time_secs())
    }

    pub fn sign_at<P: TokenPayload>(
        &self,
        payload: P,
        ttl_secs: i64,
        now_secs: i64,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            payload,
            typ: P::PURPOSE.to_owned(),
            iat: now_secs,
            exp: now_secs + ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Other(e.to_string()))
    }

    pub fn verify<P: TokenPayload>(&self, token: &str) -> Result<P, TokenError> {
        self.verify_at(token, utils::current_time_secs())
    }

    pub fn verify_at<P: TokenPayload>(&self, token: &str, now_secs: i64) -> Result<P, TokenError> {
        let data = decode::<Claims<P>>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidToken
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Other(e.to_string()),
            }
        })?;

        if data.claims.typ != P::PURPOSE {
            return Err(TokenError::InvalidSignature);
        }

        if now_secs >= data.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.payload)
    }
}
