//! JWT token validation and blocklist checking.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use tracing::warn;
use uuid::Uuid;

use devhub_cache::keys;
use devhub_cache::provider::CacheManager;
use devhub_core::config::AuthConfig;
use devhub_core::error::AppError;
use devhub_core::traits::CacheProvider;

use super::claims::{Claims, TokenType};

/// Validates JWT tokens and checks blocklist status.
#[derive(Clone)]
pub struct JwtDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
    /// Cache manager for blocklist lookups.
    cache: Arc<CacheManager>,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig, cache: Arc<CacheManager>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // clock skew

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            cache,
        }
    }

    /// Decodes and validates an access token string.
    ///
    /// Checks:
    /// 1. Signature validity
    /// 2. Expiration
    /// 3. Token type is Access
    /// 4. JTI not in blocklist
    pub async fn decode_access_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_typed(token, TokenType::Access).await
    }

    /// Decodes and validates a refresh token string.
    pub async fn decode_refresh_token(&self, token: &str) -> Result<Claims, AppError> {
        self.decode_typed(token, TokenType::Refresh).await
    }

    async fn decode_typed(&self, token: &str, expected: TokenType) -> Result<Claims, AppError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                        AppError::unauthorized("Token has expired")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidToken => {
                        AppError::unauthorized("Invalid token format")
                    }
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AppError::unauthorized("Invalid token signature")
                    }
                    _ => AppError::unauthorized(format!("Token validation failed: {e}")),
                }
            })?;
        let claims = token_data.claims;

        if claims.token_type != expected {
            return Err(AppError::unauthorized(format!(
                "Invalid token type: expected {expected:?} token"
            )));
        }

        self.check_blocklist(&claims.jti).await?;
        Ok(claims)
    }

    /// Checks whether the given JWT ID has been blocklisted.
    ///
    /// A cache outage does not lock every user out; the token is accepted.
    async fn check_blocklist(&self, jti: &Uuid) -> Result<(), AppError> {
        let key = keys::jwt_blocklist(&jti.to_string());
        match self.cache.exists(&key).await {
            Ok(true) => Err(AppError::unauthorized("Token has been revoked")),
            Ok(false) => Ok(()),
            Err(e) => {
                warn!(jti = %jti, error = %e, "Blocklist unavailable, accepting token");
                Ok(())
            }
        }
    }

    /// Adds a JWT ID to the blocklist for the token's remaining lifetime.
    pub async fn blocklist_token(
        &self,
        jti: Uuid,
        remaining_ttl_seconds: u64,
    ) -> Result<(), AppError> {
        let key = keys::jwt_blocklist(&jti.to_string());
        // At least a minute, so a token that is about to expire is still covered.
        let ttl = Duration::from_secs(remaining_ttl_seconds.max(60));
        self.cache.set(&key, "revoked", ttl).await
    }
}
