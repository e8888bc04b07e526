use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::state::AppState;

pub const ADMIN_ROLE: &str = "admin";
pub const INVALID_CREDENTIALS: &str = "Invalid Email or Password";

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminClaims {
    pub role: String,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

pub struct JwtManager {
    secret: String,
    ttl: Duration,
}

impl JwtManager {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            secret: secret.to_string(),
            ttl: Duration::try_hours(ttl_hours).unwrap_or_else(|| Duration::hours(24)),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_hours)
    }

    pub fn generate_token(&self, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Token("token lifetime out of range".to_string()))?;
        let claims = AdminClaims {
            role: ADMIN_ROLE.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )?;
        Ok(token)
    }

    pub fn validate_token(&self, token: &str) -> Result<AdminClaims> {
        let data = decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|e| AppError::Unauthorized(format!("Invalid token: {}", e)))?;

        if data.claims.role != ADMIN_ROLE {
            return Err(AppError::Unauthorized("Invalid token role".to_string()));
        }
        Ok(data.claims)
    }
}

/// Checks the static admin credentials and issues a token.
///
/// Blank input and both mismatches produce the same message.
pub fn login(config: &Config, email: &str, password: &str) -> Result<String> {
    if email.trim().is_empty()
        || password.is_empty()
        || email != config.admin_email
        || password != config.admin_password
    {
        warn!("Rejected admin login attempt");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }
    JwtManager::from_config(config).generate_token(email)
}

/// Extractor guarding admin routes: `Authorization: Bearer <token>`.
pub struct AdminSession(pub AdminClaims);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized("Missing or invalid Authorization header".to_string())
            })?;

        let claims = JwtManager::from_config(&state.config).validate_token(token)?;
        Ok(AdminSession(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::state::test_state;
    use axum::http::Request;

    #[test]
    fn login_issues_a_token_with_configured_lifetime() {
        let config = test_config();
        let token = login(&config, "admin@example.com", "s3cret").unwrap();

        let claims = JwtManager::from_config(&config).validate_token(&token).unwrap();
        assert_eq!(claims.role, ADMIN_ROLE);
        assert_eq!(claims.email, "admin@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn wrong_email_and_wrong_password_look_identical() {
        let config = test_config();
        let bad_email = login(&config, "nobody@example.com", "s3cret").unwrap_err();
        let bad_password = login(&config, "admin@example.com", "nope").unwrap_err();

        assert_eq!(bad_email.to_string(), INVALID_CREDENTIALS);
        assert_eq!(bad_password.to_string(), INVALID_CREDENTIALS);
        assert!(matches!(bad_email, AppError::Unauthorized(_)));
    }

    #[test]
    fn blank_credentials_never_log_in() {
        let mut config = test_config();
        config.admin_email = String::new();
        config.admin_password = String::new();

        let err = login(&config, "", "").unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREDENTIALS);
        assert!(login(&test_config(), "admin@example.com", "").is_err());
    }

    #[test]
    fn out_of_range_lifetime_does_not_panic() {
        let mut config = test_config();
        config.token_ttl_hours = 3_000_000_000_000_000;
        let token = login(&config, "admin@example.com", "s3cret").unwrap();
        let claims = JwtManager::from_config(&config).validate_token(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 24 * 3600);

        let far = JwtManager::new("test-secret", i64::MAX / 3_600_000);
        assert!(matches!(far.generate_token("a@b.c"), Err(AppError::Token(_))));
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let expired = JwtManager::new("test-secret", -2).generate_token("a@b.c").unwrap();
        assert!(JwtManager::new("test-secret", 24).validate_token(&expired).is_err());

        let foreign = JwtManager::new("other-secret", 24).generate_token("a@b.c").unwrap();
        assert!(JwtManager::new("test-secret", 24).validate_token(&foreign).is_err());
    }

    async fn extract(header: Option<String>) -> std::result::Result<AdminSession, AppError> {
        let (state, _, _) = test_state();
        let mut builder = Request::builder().uri("/api/admin/stats");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        AdminSession::from_request_parts(&mut parts, &state).await
    }

    #[tokio::test]
    async fn bearer_token_is_required() {
        assert!(matches!(extract(None).await, Err(AppError::Unauthorized(_))));
        assert!(matches!(
            extract(Some("Basic abc".to_string())).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            extract(Some("Bearer not-a-jwt".to_string())).await,
            Err(AppError::Unauthorized(_))
        ));

        let token = login(&test_config(), "admin@example.com", "s3cret").unwrap();
        let session = extract(Some(format!("Bearer {}", token))).await.unwrap();
        assert_eq!(session.0.email, "admin@example.com");
    }
}
