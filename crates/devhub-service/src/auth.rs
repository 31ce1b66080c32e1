//! Registration, account confirmation, login, token refresh and logout.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use devhub_auth::jwt::{Claims, JwtDecoder, JwtEncoder};
use devhub_auth::password::{PasswordHasher, PasswordValidator};
use devhub_auth::token::confirmation_token;
use devhub_core::config::AuthConfig;
use devhub_core::error::AppError;
use devhub_core::result::AppResult;
use devhub_database::store::{TokenStore, UserStore};
use devhub_entity::user::{NewUser, NewUserToken, TokenPurpose, UserRole, UserSummary};
use devhub_entity::validation::ValidateExt;

/// Sign-up form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Full display name.
    pub full_name: String,
    /// E-mail address.
    pub email: String,
    /// Public handle. Defaults to the local part of the e-mail.
    #[serde(default)]
    pub username: Option<String>,
    /// Plaintext password.
    pub password: String,
}

/// Tokens and profile returned by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Short-lived access token.
    pub access_token: String,
    /// Long-lived refresh token.
    pub refresh_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
    /// Refresh token expiry.
    pub refresh_expires_at: DateTime<Utc>,
    /// The logged-in user.
    pub user: UserSummary,
}

/// A new access token issued from a refresh token.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    /// Short-lived access token.
    pub access_token: String,
    /// Access token expiry.
    pub access_expires_at: DateTime<Utc>,
}

/// Handles account lifecycle and token issuance.
#[derive(Debug, Clone)]
pub struct AuthService {
    /// User store.
    users: Arc<dyn UserStore>,
    /// One-time token store.
    tokens: Arc<dyn TokenStore>,
    /// Password hasher.
    hasher: Arc<PasswordHasher>,
    /// Password strength checks.
    validator: Arc<PasswordValidator>,
    /// Token signing.
    encoder: Arc<JwtEncoder>,
    /// Token verification and blocklist.
    decoder: Arc<JwtDecoder>,
    /// Auth settings.
    config: AuthConfig,
}

/// Username derived from an e-mail address: its local part, lowercased,
/// with characters outside the username alphabet replaced by `_`.
fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    local
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl AuthService {
    /// Creates a new auth service.
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        hasher: Arc<PasswordHasher>,
        validator: Arc<PasswordValidator>,
        encoder: Arc<JwtEncoder>,
        decoder: Arc<JwtDecoder>,
        config: AuthConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
            validator,
            encoder,
            decoder,
            config,
        }
    }

    /// The decoder used to verify access tokens.
    pub fn decoder(&self) -> &JwtDecoder {
        &self.decoder
    }

    /// Creates an account. It stays inactive until confirmed, unless
    /// confirmation is disabled.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<UserSummary> {
        let email = req.email.trim().to_lowercase();
        let username = match req.username {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => username_from_email(&email),
        };

        let mut data = NewUser {
            full_name: req.full_name.trim().to_string(),
            username,
            email,
            password_hash: String::new(),
            active: !self.config.require_confirmation,
            role: UserRole::User,
        };
        data.validate_input()?;
        self.validator.validate(
            &req.password,
            &[&data.full_name, &data.username, &data.email],
        )?;

        if self.users.find_by_email(&data.email).await?.is_some() {
            return Err(AppError::conflict("E-mail is already registered"));
        }
        if self.users.find_by_username(&data.username).await?.is_some() {
            return Err(AppError::conflict(format!(
                "Username '{}' is already taken",
                data.username
            )));
        }

        data.password_hash = self.hasher.hash_password(&req.password)?;
        let user = self.users.create(&data).await?;

        if !user.active {
            let token = self
                .tokens
                .create(&NewUserToken {
                    user_id: user.id,
                    token: confirmation_token(),
                    purpose: TokenPurpose::ConfirmAccount,
                    expires_at: Utc::now()
                        + Duration::hours(self.config.confirm_token_ttl_hours as i64),
                })
                .await?;
            debug!(user_id = %user.id, token = %token.token, "Confirmation token issued");
        }

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user.summary())
    }

    /// Activates the account a confirmation token was issued for.
    pub async fn confirm(&self, token: &str) -> AppResult<()> {
        let record = self
            .tokens
            .find_valid(token, TokenPurpose::ConfirmAccount, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("Invalid or expired confirmation token"))?;

        self.users.activate(record.user_id).await?;
        self.tokens.delete(record.id).await?;

        info!(user_id = %record.user_id, "Account confirmed");
        Ok(())
    }

    /// Checks credentials and issues a token pair.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let user = self
            .users
            .find_by_email(&email.trim().to_lowercase())
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid e-mail or password"))?;

        if !self.hasher.verify_password(password, &user.password_hash)? {
            return Err(AppError::unauthorized("Invalid e-mail or password"));
        }
        if !user.active {
            return Err(AppError::unauthorized("Account has not been confirmed"));
        }

        let tokens = self
            .encoder
            .generate_token_pair(user.id, user.role, &user.username)?;

        info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_expires_at: tokens.access_expires_at,
            refresh_expires_at: tokens.refresh_expires_at,
            user: user.summary(),
        })
    }

    /// Issues a new access token for a valid refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<RefreshResponse> {
        let claims = self.decoder.decode_refresh_token(refresh_token).await?;

        let user = self
            .users
            .find_by_id(claims.user_id())
            .await?
            .filter(|u| u.active)
            .ok_or_else(|| AppError::unauthorized("Account is no longer available"))?;

        let (access_token, access_expires_at) =
            self.encoder
                .generate_access_token(user.id, user.role, &user.username)?;

        Ok(RefreshResponse {
            access_token,
            access_expires_at,
        })
    }

    /// Revokes an access token for the rest of its lifetime.
    pub async fn logout(&self, claims: &Claims) -> AppResult<()> {
        self.decoder
            .blocklist_token(claims.jti, claims.remaining_ttl_seconds())
            .await?;

        info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }
}
