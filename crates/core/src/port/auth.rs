// Credential Ports

use crate::domain::UserId;
use crate::error::Result;

/// One-way password hashing
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String>;

    /// `Ok(false)` on mismatch; `Err` only for unusable hashes
    fn verify(&self, password: &str, hash: &str) -> Result<bool>;
}

/// Bearer token issuing and verification
pub trait TokenService: Send + Sync {
    fn issue(&self, user_id: &str) -> Result<String>;

    /// Returns the user id the token was issued for.
    /// Invalid, tampered and expired tokens are `AppError::Unauthorized`.
    fn verify(&self, token: &str) -> Result<UserId>;
}

pub mod mocks {
    use super::*;
    use crate::error::AppError;

    /// Reversible "hash" for fast tests
    pub struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String> {
            Ok(format!("plain${}", password))
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool> {
            Ok(hash == format!("plain${}", password))
        }
    }

    /// Token is `tok:<user_id>`
    pub struct StaticTokens;

    impl TokenService for StaticTokens {
        fn issue(&self, user_id: &str) -> Result<String> {
            Ok(format!("tok:{}", user_id))
        }

        fn verify(&self, token: &str) -> Result<UserId> {
            token
                .strip_prefix("tok:")
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))
        }
    }
}
