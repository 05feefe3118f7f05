use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// The three credential collections. A role is fixed when the record is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Faculty,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Faculty => "faculty",
            Role::Student => "student",
        }
    }

    // one table per collection, see sql/schema.sql
    pub fn table(&self) -> &'static str {
        match self {
            Role::Admin => "admin_t",
            Role::Faculty => "faculty_t",
            Role::Student => "student_t",
        }
    }

    pub fn secondary_id_name(&self) -> &'static str {
        match self {
            Role::Admin | Role::Faculty => "employee id",
            Role::Student => "enrollment number",
        }
    }

    pub fn default_password(&self) -> &'static str {
        match self {
            Role::Admin => "admin123",
            Role::Faculty => "faculty123",
            Role::Student => "student123",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct UserCredential {
    pub user_id: i64,
    pub creation_time: i64,
    pub role: Role,
    pub email: String,
    // employee id or enrollment number depending on role
    pub secondary_id: i64,
    pub password_hash: String,
}

#[derive(Clone, Debug)]
pub struct ResetToken {
    pub reset_token_key_hash: String,
    pub creation_time: i64,
    pub role: Role,
    pub creator_user_id: i64,
    pub signed_token: String,
}
