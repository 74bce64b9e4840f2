use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::domain::UserId;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_seconds: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn user_id(&self) -> Option<UserId> {
        self.sub
            .strip_prefix("user:")
            .and_then(|raw| raw.parse::<i64>().ok())
            .map(UserId)
    }
}

#[derive(Debug, Clone)]
pub struct MintedSession {
    pub token: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

pub fn mint_session_token(
    cfg: &AuthConfig,
    user_id: UserId,
) -> Result<MintedSession, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let expires_at = now + Duration::seconds(cfg.session_ttl_seconds);
    let token_id = Uuid::new_v4().to_string();
    let claims = SessionClaims {
        sub: format!("user:{}", user_id.0),
        jti: token_id.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(cfg.jwt_secret.as_bytes()),
    )?;
    Ok(MintedSession {
        token,
        token_id,
        expires_at,
    })
}

/// Verifies signature and expiry. Revocation is checked against storage by the caller.
pub fn decode_session_token(
    cfg: &AuthConfig,
    token: &str,
) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(cfg.jwt_secret.as_bytes()),
        &validation,
    )?;
    Ok(data.claims)
}

/// Argon2id PHC string, salt included.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
