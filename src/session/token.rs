use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SessionError;
use crate::config::SecurityConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub email: String,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn issued_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.iat, 0).single().unwrap_or_else(Utc::now)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0).single().unwrap_or_else(Utc::now)
    }
}

/// HS256 signer for session tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: String,
    lifetime: Duration,
}

impl TokenSigner {
    pub fn new(secret: impl Into<String>, lifetime: Duration) -> Result<Self, SessionError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SessionError::InvalidSecret);
        }
        Ok(Self { secret, lifetime })
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, SessionError> {
        Self::new(
            security.session_secret.clone(),
            Duration::hours(security.session_expiry_hours as i64),
        )
    }

    pub fn issue(&self, user_id: i64, email: &str) -> Result<(String, Claims), SessionError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            user_id,
            email: email.to_string(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok((token, claims))
    }

    /// Check signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }
}
