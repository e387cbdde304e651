use crate::error::PortalError;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Broker,
}

impl FromStr for Role {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "broker" => Ok(Role::Broker),
            other => Err(PortalError::ValidationError(format!("Unknown role '{other}'"))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Broker => f.write_str("broker"),
        }
    }
}

/// Argon2id hash of a password in PHC string form
/// (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`). Salt and cost parameters
/// travel inside the string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn create(password: &str) -> Result<Self, PortalError> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(PortalError::ValidationError(format!(
                "Password must have at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes()).map_err(hash_error)?;
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(hash_error)?;
        Ok(Self(hash.to_string()))
    }

    /// Constant-time check. A stored value that is not a PHC string never
    /// matches.
    pub fn verify(&self, password: &str) -> bool {
        match PasswordHash::new(&self.0) {
            Ok(hash) => Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                false
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn hash_error(error: argon2::password_hash::Error) -> PortalError {
    PortalError::InternalError(error.to_string().into())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub password: PasswordDigest,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, name: &str, role: Role, password: &str) -> Result<Self, PortalError> {
        let email = Self::normalize_email(email)?;
        Ok(Self {
            id: Uuid::new_v4(),
            email,
            name: name.trim().to_string(),
            role,
            password: PasswordDigest::create(password)?,
            created_at: Utc::now(),
        })
    }

    pub fn normalize_email(email: &str) -> Result<String, PortalError> {
        let email = email.trim().to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
            _ => Err(PortalError::ValidationError(format!(
                "Invalid email address '{email}'"
            ))),
        }
    }
}

/// A single-use token allowing a user to pick a new password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PasswordReset {
    pub token: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl PasswordReset {
    pub fn issue(user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4(),
            user_id,
            expires_at: now + Duration::minutes(RESET_TOKEN_TTL_MINUTES),
            used: false,
        }
    }

    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}
