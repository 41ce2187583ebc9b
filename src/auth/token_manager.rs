use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use super::{Claims, TokenError};

/// Issues and validates HS256 session tokens.
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_hours: i64,
}

impl TokenManager {
    #[must_use]
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_hours,
        }
    }

    pub fn issue(&self, user_id: i32) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issues a token as if the current time were `now`.
    pub fn issue_at(&self, user_id: i32, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat,
            nbf: iat,
            exp: iat + self.ttl_hours * 3600,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Internal(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::ImmatureSignature => TokenError::NotYetValid,
                _ => TokenError::Invalid,
            })
    }

    /// Validates a token and returns the user id it was issued for.
    pub fn user_id(&self, token: &str) -> Result<i32, TokenError> {
        let claims = self.validate(token)?;
        claims.sub.parse().map_err(|_| TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-minimum-32-characters-long";

    #[test]
    fn test_issued_token_validates() {
        let manager = TokenManager::new(SECRET, 1);
        let token = manager.issue(42).unwrap();

        let claims = manager.validate(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(manager.user_id(&token).unwrap(), 42);
    }

    #[test]
    fn test_expired_token() {
        let manager = TokenManager::new(SECRET, 1);
        let token = manager
            .issue_at(1, Utc::now() - Duration::hours(3))
            .unwrap();
        assert_eq!(manager.validate(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_future_token_is_not_active() {
        let manager = TokenManager::new(SECRET, 1);
        let token = manager
            .issue_at(1, Utc::now() + Duration::minutes(10))
            .unwrap();
        assert_eq!(manager.validate(&token), Err(TokenError::NotYetValid));
    }

    #[test]
    fn test_foreign_or_garbage_tokens_are_invalid() {
        let manager = TokenManager::new(SECRET, 1);
        let other = TokenManager::new("another-secret-key-of-sufficient-len", 1);
        let token = other.issue(1).unwrap();

        assert_eq!(manager.validate(&token), Err(TokenError::Invalid));
        assert_eq!(manager.validate("not.a.jwt"), Err(TokenError::Invalid));
    }
}
