use std::fmt::Display;

use super::Data;
use actix_web::error::{JsonPayloadError, PathError};
use actix_web::http::StatusCode;
use actix_web::web;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::ResponseError;

use super::auth;
use super::db_types::*;
use super::request;
use super::response;
use super::response::{ApiResponse, AuthError};
use super::mail_service::Mailer;
use super::session::Session;
use super::store::{CredentialStore, ResetTokenStore};

#[derive(Debug, Clone)]
pub struct AppError(pub AuthError);

impl Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AuthError> for AppError {
    fn from(value: AuthError) -> Self {
        Self(value)
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::failure(self.0.to_string()))
    }
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// malformed bodies get the envelope too
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("rejected body: {}", err);
    AppError(AuthError::validation("Invalid request body")).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("rejected path: {}", err);
    AppError(AuthError::not_found("Not found")).into()
}

pub async fn not_found() -> Result<HttpResponse, AppError> {
    Err(AuthError::not_found("Not found").into())
}

fn fill_user(user: UserCredential) -> response::User {
    response::User {
        user_id: user.user_id,
        creation_time: user.creation_time,
        role: user.role,
        email: user.email,
        secondary_id: user.secondary_id,
    }
}

// user ids are only unique within one role, so a session is bound to its role's routes
fn session_user_id(session: &Session, role: Role) -> Result<i64, AppError> {
    if session.0.role != role {
        Err(AuthError::unauthorized("token not valid for this role"))?;
    }
    Ok(session.0.user_id)
}

// respond with info about stuff
pub async fn info<S: 'static, M: 'static>(
    data: web::Data<Data<S, M>>,
) -> Result<impl Responder, AppError> {
    Ok(web::Json(ApiResponse::ok(
        response::Info {
            service: String::from(crate::SERVICE_NAME),
            version_major: crate::VERSION_MAJOR,
            version_minor: crate::VERSION_MINOR,
            version_rev: crate::VERSION_REV,
            permitted_origins: data.permitted_origins.clone(),
        },
        "Service is running",
    )))
}

pub async fn login<S: CredentialStore + 'static, M: 'static>(
    data: web::Data<Data<S, M>>,
    role: web::Path<Role>,
    props: web::Json<request::LoginProps>,
) -> Result<impl Responder, AppError> {
    let store = &mut *data.db.lock().await;

    let token = auth::login(store, &data.auth, role.into_inner(), &props).await?;

    Ok(web::Json(ApiResponse::ok(
        response::Token { token },
        "Login successful",
    )))
}

pub async fn forget_password<S, M>(
    data: web::Data<Data<S, M>>,
    role: web::Path<Role>,
    props: web::Json<request::ForgotPasswordProps>,
) -> Result<impl Responder, AppError>
where
    S: CredentialStore + ResetTokenStore + 'static,
    M: Mailer + 'static,
{
    let issued = {
        let store = &mut *data.db.lock().await;
        auth::issue_password_reset(store, &data.auth, role.into_inner(), &props).await?
    };

    // the store is free again before we wait on the mail relay;
    // the key only travels by mail
    auth::mail_password_reset(&data.mail_service, &issued).await?;

    Ok(web::Json(ApiResponse::<()>::empty("Reset Mail Send Successful")))
}

pub async fn reset_password<S, M>(
    data: web::Data<Data<S, M>>,
    path: web::Path<(Role, String)>,
    props: web::Json<request::ResetPasswordProps>,
) -> Result<impl Responder, AppError>
where
    S: CredentialStore + ResetTokenStore + 'static,
    M: 'static,
{
    let (role, reset_id) = path.into_inner();

    let store = &mut *data.db.lock().await;

    auth::reset_password(store, &data.auth, role, &reset_id, &props).await?;

    Ok(web::Json(ApiResponse::<()>::empty("Password Updated!")))
}

pub async fn update_password<S: CredentialStore + 'static, M: 'static>(
    data: web::Data<Data<S, M>>,
    session: Session,
    role: web::Path<Role>,
    props: web::Json<request::UpdatePasswordProps>,
) -> Result<impl Responder, AppError> {
    let role = role.into_inner();
    let user_id = session_user_id(&session, role)?;

    let store = &mut *data.db.lock().await;

    auth::change_password(store, &data.auth, role, user_id, &props).await?;

    Ok(web::Json(ApiResponse::<()>::empty("Password updated successfully")))
}

pub async fn register<S: CredentialStore + 'static, M: 'static>(
    data: web::Data<Data<S, M>>,
    session: Session,
    role: web::Path<Role>,
    props: web::Json<request::RegisterProps>,
) -> Result<impl Responder, AppError> {
    // only admins create accounts
    session_user_id(&session, Role::Admin)?;

    let store = &mut *data.db.lock().await;

    let user = auth::register(store, &data.auth, role.into_inner(), &props).await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(fill_user(user), "Created successfully")))
}

pub async fn my_details<S: CredentialStore + 'static, M: 'static>(
    data: web::Data<Data<S, M>>,
    session: Session,
    role: web::Path<Role>,
) -> Result<impl Responder, AppError> {
    let role = role.into_inner();
    let user_id = session_user_id(&session, role)?;

    let store = &mut *data.db.lock().await;

    let user = auth::get_user(store, role, user_id).await?;

    Ok(web::Json(ApiResponse::ok(fill_user(user), "My Details Found!")))
}

/// Routes and extractor settings. Expects `web::Data<Data<S, M>>` and
/// `web::Data<AuthConfig>` on the app, and `not_found` as its default service.
pub fn config<S, M>(cfg: &mut web::ServiceConfig)
where
    S: CredentialStore + ResetTokenStore + 'static,
    M: Mailer + 'static,
{
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(web::resource("/").route(web::get().to(info::<S, M>)))
        .service(web::resource("/api/{role}/login").route(web::post().to(login::<S, M>)))
        .service(
            web::resource("/api/{role}/forget-password")
                .route(web::post().to(forget_password::<S, M>)),
        )
        .service(
            web::resource("/api/{role}/reset-password/{reset_id}")
                .route(web::post().to(reset_password::<S, M>)),
        )
        .service(
            web::resource("/api/{role}/update-password")
                .route(web::patch().to(update_password::<S, M>)),
        )
        .service(web::resource("/api/{role}/register").route(web::post().to(register::<S, M>)))
        .service(
            web::resource("/api/{role}/my-details").route(web::get().to(my_details::<S, M>)),
        );
}
