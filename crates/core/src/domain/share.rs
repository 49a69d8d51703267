// Share Domain Model
//
// Anonymous-readable code snippets addressed by a short random id.

use crate::domain::user::UserId;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of a share id (`[A-Za-z0-9]`)
pub const SHARE_ID_LEN: usize = 8;

/// Shares expire 30 days after creation
pub const SHARE_TTL_MS: i64 = 30 * 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Share {
    pub share_id: String,
    pub code: String,
    pub language: String,
    pub file_name: String,
    pub shared_by: Option<UserId>,
    pub created_at: i64, // epoch ms
    pub expires_at: i64,
    pub view_count: i64,
}

/// What a visitor of `/share/{id}` receives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareView {
    pub code: String,
    pub language: String,
    pub file_name: String,
    pub created_at: i64,
    pub view_count: i64,
}

impl Share {
    pub fn new(
        share_id: impl Into<String>,
        created_at: i64,
        code: impl Into<String>,
        language: impl Into<String>,
        file_name: impl Into<String>,
        shared_by: Option<UserId>,
    ) -> Self {
        Self {
            share_id: share_id.into(),
            code: code.into(),
            language: language.into(),
            file_name: file_name.into(),
            shared_by,
            created_at,
            expires_at: created_at + SHARE_TTL_MS,
            view_count: 0,
        }
    }

    pub fn is_expired(&self, now_millis: i64) -> bool {
        now_millis > self.expires_at
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.shared_by.as_deref() == Some(user_id)
    }

    pub fn view(&self) -> ShareView {
        ShareView {
            code: self.code.clone(),
            language: self.language.clone(),
            file_name: self.file_name.clone(),
            created_at: self.created_at,
            view_count: self.view_count,
        }
    }
}

/// Random 8-character alphanumeric id
pub fn random_share_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SHARE_ID_LEN)
        .map(char::from)
        .collect()
}

pub fn is_valid_share_id(id: &str) -> bool {
    id.len() == SHARE_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())
}
