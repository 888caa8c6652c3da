use std::sync::Arc;

use jsonwebtoken::{DecodingKey, Validation, decode, errors::Error as JwtError};
use serde::{Deserialize, Serialize};

pub const ROLE_ORGANIZER: &str = "organizer";
pub const ROLE_ADMIN: &str = "admin";

/// HMAC secret shared with whatever service issues organizer tokens.
#[derive(Clone)]
pub struct JwtSecret(Arc<str>);

impl JwtSecret {
    pub fn new(secret: &str) -> Self {
        Self(Arc::from(secret))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: u32,
    pub role: String,
    pub exp: i64,
}

impl Claims {
    pub fn can_organize(&self) -> bool {
        self.role == ROLE_ORGANIZER || self.role == ROLE_ADMIN
    }
}

pub fn validate_token(token: &str, secret: &JwtSecret) -> Result<Claims, JwtError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[cfg(test)]
pub fn create_token(user_id: u32, role: &str, secret: &JwtSecret, duration: chrono::Duration) -> String {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        exp: (chrono::Utc::now() + duration).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("token encodes")
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let secret = JwtSecret::new("test-secret");
        let token = create_token(7, ROLE_ORGANIZER, &secret, Duration::hours(1));
        let claims = validate_token(&token, &secret).expect("valid token");
        assert_eq!(claims.sub, 7);
        assert!(claims.can_organize());
    }

    #[test]
    fn test_wrong_secret_and_expired_tokens_are_rejected() {
        let secret = JwtSecret::new("test-secret");
        let token = create_token(7, ROLE_ORGANIZER, &secret, Duration::hours(1));
        assert!(validate_token(&token, &JwtSecret::new("other")).is_err());
        let expired = create_token(7, ROLE_ORGANIZER, &secret, Duration::hours(-2));
        assert!(validate_token(&expired, &secret).is_err());
    }

    #[test]
    fn test_player_role_cannot_organize() {
        let claims = Claims {
            sub: 1,
            role: "player".to_string(),
            exp: 0,
        };
        assert!(!claims.can_organize());
    }
}
