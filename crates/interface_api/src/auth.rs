//! Bearer token verification
//!
//! Tokens are minted by an external identity service; this crate only
//! verifies them and turns their claims into a [`Principal`].

use jsonwebtoken::{decode, errors::ErrorKind, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::{Principal, Role, UserId};

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// The user's role
    pub role: Role,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl Claims {
    /// Resolves the authenticated principal
    pub fn principal(&self) -> Result<Principal, AuthError> {
        let id: UserId = self
            .sub
            .parse()
            .map_err(|_| AuthError::InvalidSubject(self.sub.clone()))?;
        Ok(Principal::new(id, self.role))
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Token subject is not a user id: {0}")]
    InvalidSubject(String),
}

/// Validates a JWT token
///
/// # Arguments
///
/// * `token` - The JWT token to validate
/// * `secret` - JWT secret key
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Verifies a token and resolves its principal in one step
pub fn authenticate(token: &str, secret: &str) -> Result<Principal, AuthError> {
    validate_token(token, secret)?.principal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, role: Role, ttl: Duration) -> String {
        let now = Utc::now();
        let claims = Claims {
            sub: sub.to_string(),
            role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
    }

    #[test]
    fn test_valid_token_yields_principal() {
        let principal = authenticate(&token("3", Role::Finance, Duration::minutes(5)), SECRET).unwrap();
        assert_eq!(principal, Principal::finance(3));
    }

    #[test]
    fn test_prefixed_subject_is_accepted() {
        let principal = authenticate(&token("USR-8", Role::Manager, Duration::minutes(5)), SECRET).unwrap();
        assert_eq!(principal, Principal::manager(8));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let result = validate_token(&token("1", Role::Employee, Duration::hours(-2)), SECRET);
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let result = validate_token(&token("1", Role::Employee, Duration::minutes(5)), "other");
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_non_numeric_subject_is_rejected() {
        let result = authenticate(&token("alice", Role::Employee, Duration::minutes(5)), SECRET);
        assert!(matches!(result, Err(AuthError::InvalidSubject(_))));
    }
}
