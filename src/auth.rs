//! Login, password change and the forgot/reset password lifecycle.
//!
//! Everything here is written once against the [`CredentialStore`] and
//! [`ResetTokenStore`] capabilities; the [`Role`] argument picks the collection.

use super::db_types::{Role, UserCredential};
use super::mail_service::{MailError, Mailer};
use super::request;
use super::response::AuthError;
use super::store::{CredentialStore, ResetTokenStore};
use super::token::{MissingSecret, ResetPayload, SessionPayload, TokenCodec, TokenError};
use super::utils;
use super::utils::HashConfig;

pub const SESSION_TTL_SECS: i64 = 60 * 60;
pub const RESET_TTL_SECS: i64 = 10 * 60;

/// Process-wide auth settings, built once at startup.
pub struct AuthConfig {
    pub codec: TokenCodec,
    pub hash_config: HashConfig,
    pub session_ttl_secs: i64,
    pub reset_ttl_secs: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: &str, hash_config: HashConfig) -> Result<AuthConfig, MissingSecret> {
        Ok(AuthConfig {
            codec: TokenCodec::new(jwt_secret)?,
            hash_config,
            session_ttl_secs: SESSION_TTL_SECS,
            reset_ttl_secs: RESET_TTL_SECS,
        })
    }
}

fn report_store_err<E: std::error::Error>(e: E) -> AuthError {
    log::error!("store: {}", e);
    AuthError::Internal
}

fn report_internal_err<E: std::error::Error>(e: E) -> AuthError {
    log::error!("{}", e);
    AuthError::Internal
}

fn report_mail_err(e: MailError) -> AuthError {
    log::warn!("{}", e);
    AuthError::Internal
}

pub async fn login(
    store: &mut impl CredentialStore,
    config: &AuthConfig,
    role: Role,
    props: &request::LoginProps,
) -> Result<String, AuthError> {
    let user = store
        .get_user_by_email(role, &props.email)
        .await
        .map_err(report_store_err)?
        .ok_or_else(|| AuthError::not_found(format!("No {} found", role)))?;

    // validate password with argon2 (password hashing algorithm)
    if !utils::verify_password(&props.password, &user.password_hash).map_err(report_internal_err)? {
        Err(AuthError::unauthorized("Invalid password"))?;
    }

    log::info!("{} {} logged in", role, user.user_id);

    config
        .codec
        .sign(
            SessionPayload {
                user_id: user.user_id,
                role,
            },
            config.session_ttl_secs,
        )
        .map_err(report_internal_err)
}

/// A reset record that has been written but not yet mailed.
#[derive(Clone, Debug)]
pub struct IssuedReset {
    pub destination: String,
    pub role: Role,
    pub user_id: i64,
    /// What the emailed link carries; only its hash is stored.
    pub reset_key: String,
}

/// Replaces any earlier reset record of the user with a fresh one. Mailing is a
/// separate step so callers can release the store first.
pub async fn issue_password_reset<S>(
    store: &mut S,
    config: &AuthConfig,
    role: Role,
    props: &request::ForgotPasswordProps,
) -> Result<IssuedReset, AuthError>
where
    S: CredentialStore + ResetTokenStore,
{
    if props.email.is_empty() {
        Err(AuthError::validation("Email is required"))?;
    }

    // NOTE: a 404 here tells the caller whether the account exists
    let user = store
        .get_user_by_email(role, &props.email)
        .await
        .map_err(report_store_err)?
        .ok_or_else(|| AuthError::not_found(format!("No {} found", role)))?;

    let signed_token = config
        .codec
        .sign(
            ResetPayload {
                user_id: user.user_id,
                role,
            },
            config.reset_ttl_secs,
        )
        .map_err(report_internal_err)?;

    // not atomic: two concurrent requests may both leave a live record
    store
        .delete_reset_tokens(role, user.user_id)
        .await
        .map_err(report_store_err)?;

    let reset_key = utils::gen_random_string();
    store
        .add_reset_token(utils::hash_str(&reset_key), role, user.user_id, signed_token)
        .await
        .map_err(report_store_err)?;

    Ok(IssuedReset {
        destination: user.email,
        role,
        user_id: user.user_id,
        reset_key,
    })
}

pub async fn mail_password_reset(mailer: &impl Mailer, issued: &IssuedReset) -> Result<(), AuthError> {
    mailer
        .send_password_reset(&issued.destination, issued.role, &issued.reset_key)
        .await
        .map_err(report_mail_err)?;

    log::info!("password reset issued for {} {}", issued.role, issued.user_id);

    Ok(())
}

pub async fn reset_password<S>(
    store: &mut S,
    config: &AuthConfig,
    role: Role,
    reset_key: &str,
    props: &request::ResetPasswordProps,
) -> Result<(), AuthError>
where
    S: CredentialStore + ResetTokenStore,
{
    if reset_key.is_empty() || props.password.is_empty() {
        Err(AuthError::validation("Password and reset id are required"))?;
    }

    let reset_token = store
        .get_reset_token(role, &utils::hash_str(reset_key))
        .await
        .map_err(report_store_err)?
        .ok_or_else(|| AuthError::not_found("No reset request found"))?;

    // expired and forged tokens look the same to the caller
    let payload: ResetPayload = match config.codec.verify(&reset_token.signed_token) {
        Ok(payload) => payload,
        Err(TokenError::Expired) | Err(TokenError::InvalidSignature) => {
            return Err(AuthError::not_found("Reset request expired"));
        }
        Err(e) => return Err(report_internal_err(e)),
    };

    if payload.role != role || payload.user_id != reset_token.creator_user_id {
        Err(AuthError::not_found("No reset request found"))?;
    }

    let password_hash = utils::hash_password(&props.password, &config.hash_config)
        .map_err(report_internal_err)?;

    if !store
        .update_password_hash(role, payload.user_id, &password_hash)
        .await
        .map_err(report_store_err)?
    {
        Err(AuthError::not_found(format!("No {} found", role)))?;
    }

    store
        .delete_reset_tokens(role, payload.user_id)
        .await
        .map_err(report_store_err)?;

    log::info!("password reset for {} {}", role, payload.user_id);

    Ok(())
}

pub async fn change_password(
    store: &mut impl CredentialStore,
    config: &AuthConfig,
    role: Role,
    user_id: i64,
    props: &request::UpdatePasswordProps,
) -> Result<(), AuthError> {
    if props.current_password.is_empty() || props.new_password.is_empty() {
        Err(AuthError::validation(
            "Current password and new password are required",
        ))?;
    }

    // checked before anything else so a bad current password can't mask it
    if !utils::is_secure_password(&props.new_password) {
        Err(AuthError::validation(
            "New password must be at least 8 characters long",
        ))?;
    }

    let user = store
        .get_user_by_id(role, user_id)
        .await
        .map_err(report_store_err)?
        .ok_or_else(|| AuthError::not_found("User not found"))?;

    if !utils::verify_password(&props.current_password, &user.password_hash)
        .map_err(report_internal_err)?
    {
        Err(AuthError::unauthorized("Current password is incorrect"))?;
    }

    let password_hash = utils::hash_password(&props.new_password, &config.hash_config)
        .map_err(report_internal_err)?;

    if !store
        .update_password_hash(role, user_id, &password_hash)
        .await
        .map_err(report_store_err)?
    {
        Err(AuthError::not_found("User not found"))?;
    }

    Ok(())
}

/// Creates a credential holding the role's default password.
pub async fn register(
    store: &mut impl CredentialStore,
    config: &AuthConfig,
    role: Role,
    props: &request::RegisterProps,
) -> Result<UserCredential, AuthError> {
    register_with_password(
        store,
        config,
        role,
        &props.email,
        props.secondary_id,
        role.default_password(),
    )
    .await
}

pub async fn register_with_password(
    store: &mut impl CredentialStore,
    config: &AuthConfig,
    role: Role,
    email: &str,
    secondary_id: Option<i64>,
    password: &str,
) -> Result<UserCredential, AuthError> {
    if !utils::is_email_valid(email) {
        Err(AuthError::validation("Invalid email format"))?;
    }

    if store
        .get_user_by_email(role, email)
        .await
        .map_err(report_store_err)?
        .is_some()
    {
        Err(AuthError::conflict("Email already in use"))?;
    }

    let secondary_id = secondary_id.unwrap_or_else(utils::gen_secondary_id);
    if store
        .get_user_by_secondary_id(role, secondary_id)
        .await
        .map_err(report_store_err)?
        .is_some()
    {
        Err(AuthError::conflict(format!(
            "{} already in use",
            role.secondary_id_name()
        )))?;
    }

    let password_hash =
        utils::hash_password(password, &config.hash_config).map_err(report_internal_err)?;

    let user = store
        .add_user(role, email.to_owned(), secondary_id, password_hash)
        .await
        .map_err(report_store_err)?;

    log::info!("registered {} {}", role, user.user_id);

    Ok(user)
}

pub async fn get_user(
    store: &mut impl CredentialStore,
    role: Role,
    user_id: i64,
) -> Result<UserCredential, AuthError> {
    store
        .get_user_by_id(role, user_id)
        .await
        .map_err(report_store_err)?
        .ok_or_else(|| AuthError::not_found("User not found"))
}

#[cfg(test)]
pub fn test_config() -> AuthConfig {
    AuthConfig::new("test-secret", utils::cheap_hash_config()).unwrap()
}
