// User Domain Model

use serde::{Deserialize, Serialize};

/// User ID (UUID v4)
pub type UserId = String;

/// Registered account. `password_hash` never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: i64, // epoch ms
}

/// Public view returned by `getUserData`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: i64,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        created_at: i64,
        email: &str,
        name: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: normalize_email(email),
            name: name.into(),
            password_hash: password_hash.into(),
            created_at,
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            created_at: self.created_at,
        }
    }
}

/// Emails are matched trimmed and case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
