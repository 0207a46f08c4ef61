//! Credential issuing and verification, plus the admin sign-in capability.
//!
//! Credentials are HS256 JWTs. A user credential carries the user id as its
//! subject; an admin credential carries the admin marker role and is short-lived.

use std::sync::Arc;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::OsRng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
    user_ttl: Duration,
    admin_ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: Arc::new(EncodingKey::from_secret(bytes)),
            decoding: Arc::new(DecodingKey::from_secret(bytes)),
            user_ttl: Duration::days(7),
            admin_ttl: Duration::days(1),
        }
    }

    pub fn issue_user(&self, user_id: Uuid) -> AppResult<String> {
        self.issue(user_id.to_string(), Role::User, self.user_ttl)
    }

    pub fn issue_admin(&self, email: &str) -> AppResult<String> {
        self.issue(email.to_string(), Role::Admin, self.admin_ttl)
    }

    /// Sign arbitrary claims. Exposed for callers that need a custom lifetime.
    pub fn sign(&self, claims: &Claims) -> AppResult<String> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Any failure collapses into one `Unauthorized` so callers cannot tell
    /// an expired credential from a forged one.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|err| {
                tracing::debug!(error = %err, "credential rejected");
                AppError::unauthorized()
            })
    }

    fn issue(&self, sub: String, role: Role, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;
        self.sign(&Claims {
            sub,
            role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        })
    }
}

/// Decides whether a submitted email/password pair is the administrator.
pub trait AdminAuthenticator: Send + Sync {
    fn authenticate(&self, email: &str, password: &str) -> bool;
}

/// Compares against one configured pair.
pub struct StaticAdminAuthenticator {
    email: String,
    password: SecretString,
}

impl StaticAdminAuthenticator {
    pub fn new(email: impl Into<String>, password: SecretString) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

impl AdminAuthenticator for StaticAdminAuthenticator {
    fn authenticate(&self, email: &str, password: &str) -> bool {
        email == self.email && password == self.password.expose_secret()
    }
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
