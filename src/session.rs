//! Gate for protected routes: resolves the bearer credential on a request.

use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::web;
use actix_web::FromRequest;
use actix_web::HttpRequest;

use super::auth::AuthConfig;
use super::handlers::AppError;
use super::response::AuthError;
use super::token::{SessionPayload, TokenError};

/// The verified caller of a protected route.
#[derive(Debug, Clone, Copy)]
pub struct Session(pub SessionPayload);

fn authenticate(req: &HttpRequest) -> Result<Session, AppError> {
    let config = req.app_data::<web::Data<AuthConfig>>().ok_or_else(|| {
        log::error!("auth config not registered as app data");
        AppError::from(AuthError::Internal)
    })?;

    let token = match req.headers().get(AUTHORIZATION) {
        Some(header) => header
            .to_str()
            .map_err(|_| AuthError::unauthorized("invalid or expired token"))?,
        None => Err(AuthError::unauthorized("no token"))?,
    };
    let token = token.strip_prefix("Bearer ").unwrap_or(token);

    match config.codec.verify::<SessionPayload>(token) {
        Ok(payload) => Ok(Session(payload)),
        Err(TokenError::Expired) | Err(TokenError::InvalidSignature) => {
            Err(AuthError::unauthorized("invalid or expired token").into())
        }
        Err(e) => {
            log::error!("session verification: {}", e);
            Err(AuthError::Internal.into())
        }
    }
}

impl FromRequest for Session {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
