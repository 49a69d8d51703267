// CatalyX Infrastructure - Credentials
// Implements: PasswordHasher (argon2), TokenService (HS256 JWT)

mod jwt;
mod password;

pub use jwt::{JwtTokenService, DEFAULT_TOKEN_TTL_DAYS};
pub use password::Argon2Hasher;
