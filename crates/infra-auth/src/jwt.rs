// HS256 JWT bearer tokens

use catalyx_core::domain::UserId;
use catalyx_core::error::{AppError, Result};
use catalyx_core::port::TokenService;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl JwtTokenService {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs: ttl_days * 24 * 60 * 60,
        }
    }

    fn issue_at(&self, user_id: &str, now_secs: i64) -> Result<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now_secs,
            exp: now_secs + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user_id: &str) -> Result<String> {
        self.issue_at(user_id, chrono::Utc::now().timestamp())
    }

    fn verify(&self, token: &str) -> Result<UserId> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(error = %e, "Token rejected");
            AppError::Unauthorized("Invalid or expired token".to_string())
        })?;
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let svc = JwtTokenService::new("test-secret", DEFAULT_TOKEN_TTL_DAYS);
        let token = svc.issue("user-1").unwrap();
        assert_eq!(svc.verify(&token).unwrap(), "user-1");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let a = JwtTokenService::new("secret-a", 7);
        let b = JwtTokenService::new("secret-b", 7);
        let token = a.issue("user-1").unwrap();

        let err = b.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(err.to_string(), "Invalid or expired token");
    }

    #[test]
    fn test_expired_token_rejected() {
        let svc = JwtTokenService::new("test-secret", 7);
        let long_ago = chrono::Utc::now().timestamp() - 8 * 24 * 60 * 60;
        let token = svc.issue_at("user-1", long_ago).unwrap();

        assert!(svc.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        let svc = JwtTokenService::new("test-secret", 7);
        assert!(svc.verify("not.a.jwt").is_err());
        assert!(svc.verify("").is_err());
    }
}
