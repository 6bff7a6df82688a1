use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::model::Role;
use workreq_core::AuthConfig;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Account ID
    pub user_id: String,
    pub username: String,
    /// Missing or unrecognised roles decode as `None` rather than failing the token.
    #[serde(default, deserialize_with = "lenient_role", skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Issued at (timestamp)
    pub iat: i64,
    /// Expiration time (timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create new claims expiring `expires_in_seconds` from now
    pub fn new(user_id: &str, username: &str, role: Role, expires_in_seconds: i64) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::seconds(expires_in_seconds);

        Self {
            user_id: user_id.to_string(),
            username: username.to_string(),
            role: Some(role),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

fn lenient_role<'de, D>(deserializer: D) -> std::result::Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|r| r.parse().ok()))
}

/// Issues and validates HS256-signed identity tokens with a process-wide secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in_seconds: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, expires_in_seconds: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in_seconds,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_expiry_seconds)
    }

    /// Sign a token for the given account
    pub fn issue(&self, account_id: &str, username: &str, role: Role) -> Result<String> {
        let claims = Claims::new(account_id, username, role, self.expires_in_seconds);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
    }

    /// Verify signature, algorithm and expiry.
    ///
    /// Every failure collapses into [`AuthError::InvalidToken`]; the underlying
    /// reason is only logged at debug level.
    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| {
                debug!(reason = %e, "Rejected token");
                AuthError::InvalidToken
            })?
            .claims;

        if claims.is_expired() {
            debug!(user_id = %claims.user_id, "Rejected expired token");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("secret", &"<redacted>")
            .field("expires_in_seconds", &self.expires_in_seconds)
            .finish()
    }
}
