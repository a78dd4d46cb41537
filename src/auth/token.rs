use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::config::{SecurityConfig, MAX_TOKEN_TTL_HOURS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens under one shared secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is exact: no grace period past iat + ttl
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        let hours = config.token_ttl_hours.min(MAX_TOKEN_TTL_HOURS) as i64;
        Self::new(&config.jwt_secret, Duration::hours(hours))
    }

    pub fn issue(&self, id: Uuid, email: &str) -> Result<String, AuthError> {
        self.issue_at(id, email, Utc::now())
    }

    pub fn issue_at(&self, id: Uuid, email: &str, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            id,
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(AuthError::InvalidToken)
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}
