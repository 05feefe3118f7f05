// In-memory stand-in for PgStore, used by the test suites.

use std::collections::HashMap;
use std::convert::Infallible;

use super::db_types::{ResetToken, Role, UserCredential};
use super::store::{CredentialStore, ResetTokenStore, Store};
use super::utils::current_time_millis;

#[derive(Default)]
pub struct MemoryStore {
    pub users: HashMap<Role, Vec<UserCredential>>,
    pub reset_tokens: Vec<ResetToken>,
    next_user_id: i64,
}

impl MemoryStore {
    pub fn reset_tokens_of(&self, role: Role, user_id: i64) -> Vec<&ResetToken> {
        self.reset_tokens
            .iter()
            .filter(|t| t.role == role && t.creator_user_id == user_id)
            .collect()
    }

    fn find_user(&self, role: Role, pred: impl Fn(&UserCredential) -> bool) -> Option<UserCredential> {
        self.users
            .get(&role)
            .and_then(|users| users.iter().find(|u| pred(u)))
            .cloned()
    }
}

impl Store for MemoryStore {
    type Error = Infallible;
}

impl CredentialStore for MemoryStore {
    async fn get_user_by_email(
        &mut self,
        role: Role,
        email: &str,
    ) -> Result<Option<UserCredential>, Self::Error> {
        Ok(self.find_user(role, |u| u.email == email))
    }

    async fn get_user_by_id(
        &mut self,
        role: Role,
        user_id: i64,
    ) -> Result<Option<UserCredential>, Self::Error> {
        Ok(self.find_user(role, |u| u.user_id == user_id))
    }

    async fn get_user_by_secondary_id(
        &mut self,
        role: Role,
        secondary_id: i64,
    ) -> Result<Option<UserCredential>, Self::Error> {
        Ok(self.find_user(role, |u| u.secondary_id == secondary_id))
    }

    async fn add_user(
        &mut self,
        role: Role,
        email: String,
        secondary_id: i64,
        password_hash: String,
    ) -> Result<UserCredential, Self::Error> {
        self.next_user_id += 1;
        let user = UserCredential {
            user_id: self.next_user_id,
            creation_time: current_time_millis(),
            role,
            email,
            secondary_id,
            password_hash,
        };
        self.users.entry(role).or_default().push(user.clone());
        Ok(user)
    }

    async fn update_password_hash(
        &mut self,
        role: Role,
        user_id: i64,
        password_hash: &str,
    ) -> Result<bool, Self::Error> {
        let user = self
            .users
            .get_mut(&role)
            .and_then(|users| users.iter_mut().find(|u| u.user_id == user_id));

        Ok(match user {
            Some(user) => {
                user.password_hash = password_hash.to_owned();
                true
            }
            None => false,
        })
    }
}

impl ResetTokenStore for MemoryStore {
    async fn add_reset_token(
        &mut self,
        reset_token_key_hash: String,
        role: Role,
        creator_user_id: i64,
        signed_token: String,
    ) -> Result<ResetToken, Self::Error> {
        let reset_token = ResetToken {
            reset_token_key_hash,
            creation_time: current_time_millis(),
            role,
            creator_user_id,
            signed_token,
        };
        self.reset_tokens.push(reset_token.clone());
        Ok(reset_token)
    }

    async fn get_reset_token(
        &mut self,
        role: Role,
        reset_token_key_hash: &str,
    ) -> Result<Option<ResetToken>, Self::Error> {
        Ok(self
            .reset_tokens
            .iter()
            .find(|t| t.role == role && t.reset_token_key_hash == reset_token_key_hash)
            .cloned())
    }

    async fn delete_reset_tokens(
        &mut self,
        role: Role,
        creator_user_id: i64,
    ) -> Result<u64, Self::Error> {
        let before = self.reset_tokens.len();
        self.reset_tokens
            .retain(|t| !(t.role == role && t.creator_user_id == creator_user_id));
        Ok((before - self.reset_tokens.len()) as u64)
    }
}
