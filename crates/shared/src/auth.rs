//! Authentication types for JWT and auth payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Display name.
    pub username: String,
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated user info.
    pub user: UserInfo,
    /// Bearer token.
    pub token: String,
    /// Token expiration in seconds.
    pub expires_in: i64,
}

/// User info returned in auth and profile responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// Display name.
    pub username: String,
    /// User email.
    pub email: String,
}

/// Change password request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    /// Replacement password.
    pub new_password: String,
}

/// Profile update request.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name (optional).
    pub username: Option<String>,
    /// New email (optional).
    pub email: Option<String>,
}
