use crate::auth::{AuthTokenProvider, JwtConfig};
use crate::domain::{DomainError, DomainResult};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by a user access token
#[derive(Debug, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String, // user_id
    pub username: String,
    pub iat: usize, // issued at timestamp
    pub exp: usize, // expiration timestamp
}

/// Claims carried by a device credential. No `exp`: device credentials are
/// replaced wholesale on every owner login instead of expiring.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeviceClaims {
    pub sub: String, // device_id
    pub iat: usize,
}

/// JWT-based implementation of AuthTokenProvider
pub struct JwtAuthTokenProvider {
    config: JwtConfig,
}

impl JwtAuthTokenProvider {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl AuthTokenProvider for JwtAuthTokenProvider {
    fn generate_user_token(&self, user_id: &str, username: &str) -> DomainResult<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(self.config.expiration_hours as i64);

        let claims = UserClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| DomainError::RepositoryError(anyhow::anyhow!("JWT encoding error: {}", e)))
    }

    fn generate_device_token(&self, device_id: &str) -> DomainResult<String> {
        let claims = DeviceClaims {
            sub: device_id.to_string(),
            iat: chrono::Utc::now().timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .map_err(|e| DomainError::RepositoryError(anyhow::anyhow!("JWT encoding error: {}", e)))
    }

    fn validate_user_token(&self, token: &str) -> DomainResult<String> {
        let token_data = decode::<UserClaims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| DomainError::InvalidToken(e.to_string()))?;

        Ok(token_data.claims.sub)
    }
}
