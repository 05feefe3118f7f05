//! Storage capabilities the auth flows are written against.
//!
//! Every operation is scoped by [`Role`], so one implementation serves all three
//! credential collections. [`PgStore`] backs them with the `*_service` query modules.
#![allow(async_fn_in_trait)]

use tokio_postgres::GenericClient;

use super::db_types::{ResetToken, Role, UserCredential};
use super::password_reset_service;
use super::user_service;

pub trait Store {
    type Error: std::error::Error + 'static;
}

pub trait CredentialStore: Store {
    async fn get_user_by_email(
        &mut self,
        role: Role,
        email: &str,
    ) -> Result<Option<UserCredential>, Self::Error>;

    async fn get_user_by_id(
        &mut self,
        role: Role,
        user_id: i64,
    ) -> Result<Option<UserCredential>, Self::Error>;

    async fn get_user_by_secondary_id(
        &mut self,
        role: Role,
        secondary_id: i64,
    ) -> Result<Option<UserCredential>, Self::Error>;

    async fn add_user(
        &mut self,
        role: Role,
        email: String,
        secondary_id: i64,
        password_hash: String,
    ) -> Result<UserCredential, Self::Error>;

    /// Returns `false` when the user does not exist.
    async fn update_password_hash(
        &mut self,
        role: Role,
        user_id: i64,
        password_hash: &str,
    ) -> Result<bool, Self::Error>;
}

pub trait ResetTokenStore: Store {
    async fn add_reset_token(
        &mut self,
        reset_token_key_hash: String,
        role: Role,
        creator_user_id: i64,
        signed_token: String,
    ) -> Result<ResetToken, Self::Error>;

    async fn get_reset_token(
        &mut self,
        role: Role,
        reset_token_key_hash: &str,
    ) -> Result<Option<ResetToken>, Self::Error>;

    /// Deletes every reset record of the given user, returning how many went.
    async fn delete_reset_tokens(
        &mut self,
        role: Role,
        creator_user_id: i64,
    ) -> Result<u64, Self::Error>;
}

pub struct PgStore<C>(pub C);

impl<C: GenericClient> Store for PgStore<C> {
    type Error = tokio_postgres::Error;
}

impl<C: GenericClient> CredentialStore for PgStore<C> {
    async fn get_user_by_email(
        &mut self,
        role: Role,
        email: &str,
    ) -> Result<Option<UserCredential>, Self::Error> {
        user_service::get_by_email(&mut self.0, role, email).await
    }

    async fn get_user_by_id(
        &mut self,
        role: Role,
        user_id: i64,
    ) -> Result<Option<UserCredential>, Self::Error> {
        user_service::get_by_user_id(&mut self.0, role, user_id).await
    }

    async fn get_user_by_secondary_id(
        &mut self,
        role: Role,
        secondary_id: i64,
    ) -> Result<Option<UserCredential>, Self::Error> {
        user_service::get_by_secondary_id(&mut self.0, role, secondary_id).await
    }

    async fn add_user(
        &mut self,
        role: Role,
        email: String,
        secondary_id: i64,
        password_hash: String,
    ) -> Result<UserCredential, Self::Error> {
        user_service::add(&mut self.0, role, email, secondary_id, password_hash).await
    }

    async fn update_password_hash(
        &mut self,
        role: Role,
        user_id: i64,
        password_hash: &str,
    ) -> Result<bool, Self::Error> {
        user_service::update_password_hash(&mut self.0, role, user_id, password_hash).await
    }
}

impl<C: GenericClient> ResetTokenStore for PgStore<C> {
    async fn add_reset_token(
        &mut self,
        reset_token_key_hash: String,
        role: Role,
        creator_user_id: i64,
        signed_token: String,
    ) -> Result<ResetToken, Self::Error> {
        password_reset_service::add(
            &mut self.0,
            reset_token_key_hash,
            role,
            creator_user_id,
            signed_token,
        )
        .await
    }

    async fn get_reset_token(
        &mut self,
        role: Role,
        reset_token_key_hash: &str,
    ) -> Result<Option<ResetToken>, Self::Error> {
        password_reset_service::get_by_reset_token_key_hash(&mut self.0, role, reset_token_key_hash)
            .await
    }

    async fn delete_reset_tokens(
        &mut self,
        role: Role,
        creator_user_id: i64,
    ) -> Result<u64, Self::Error> {
        password_reset_service::delete_by_creator(&mut self.0, role, creator_user_id).await
    }
}
