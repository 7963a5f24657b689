//! # User Management
//!
//! User model and repository for authentication. A user is also the
//! account the progress engine scores; `xp` and `level` are written only
//! through the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::crypto::{hash_password, validate_password, verify_password, PasswordPolicy};
use super::errors::{AuthError, AuthResult};
use crate::validation::{self, ValidationResult};

/// Access role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// User's email address (unique)
    pub email: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,

    #[serde(default)]
    pub role: Role,

    /// Cumulative experience points
    #[serde(default)]
    pub xp: i64,

    #[serde(default)]
    pub level: u32,

    /// Argon2id password hash (never plaintext)
    pub password_hash: String,

    /// When the user was created
    pub created_at: DateTime<Utc>,

    /// When the user was last updated
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with zero XP at level 0
    pub fn new(request: &RegisterRequest, role: Role, policy: &PasswordPolicy) -> AuthResult<Self> {
        validate_password(&request.password, policy)?;
        let password_hash = hash_password(&request.password)?;
        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email: normalize_email(&request.email),
            age: request.age,
            role,
            xp: 0,
            level: 0,
            password_hash,
            created_at: now,
            updated_at: now,
        })
    }

    /// Verify a password against this user's stored hash
    pub fn verify_password(&self, password: &str) -> AuthResult<bool> {
        verify_password(password, &self.password_hash)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    #[cfg(test)]
    pub fn for_tests(name: &str, email: &str, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            age: None,
            role,
            xp: 0,
            level: 0,
            password_hash: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Emails are matched case-insensitively
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub age: Option<u8>,
}

impl RegisterRequest {
    /// Field checks; the password is checked separately against the policy
    pub fn validate(&self) -> ValidationResult {
        validation::length_between("name", &self.name, 2, 50)?;
        validation::email(self.email.trim())?;
        if let Some(age) = self.age {
            if !(13..=120).contains(&age) {
                return Err(validation::ValidationError::new(
                    "age must be between 13 and 120",
                ));
            }
        }
        Ok(())
    }
}

/// User login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// User repository trait
///
/// Abstracts storage operations for users.
pub trait UserRepository: Send + Sync {
    /// Find a user by their ID
    fn find_by_id(&self, id: Uuid) -> AuthResult<Option<User>>;

    /// Find a user by their (normalized) email
    fn find_by_email(&self, email: &str) -> AuthResult<Option<User>>;

    /// Check if an email is already registered
    fn email_exists(&self, email: &str) -> AuthResult<bool>;

    /// Create a new user; fails with `EmailAlreadyExists` on a duplicate
    fn create(&self, user: &User) -> AuthResult<()>;
}

/// Public view of a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    pub role: Role,
    pub xp: i64,
    pub level: u32,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
            role: user.role,
            xp: user.xp,
            level: user.level,
            created_at: user.created_at,
        }
    }
}

/// Reply to `GET /api/auth/me`
#[derive(Debug, Clone, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub xp: i64,
    pub level: u32,
}

impl From<&User> for ProfileResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            xp: user.xp,
            level: user.level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Ada Lovelace".to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            age: Some(36),
        }
    }

    #[test]
    fn test_user_creation() {
        let user = User::new(&request(" Ada@Example.com "), Role::User, &PasswordPolicy::default()).unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.xp, 0);
        assert_eq!(user.level, 0);
        assert!(!user.is_admin());
        assert_ne!(user.password_hash, "password123"); // Not plaintext!
        assert!(user.verify_password("password123").unwrap());
        assert!(!user.verify_password("wrong_password").unwrap());
    }

    #[test]
    fn test_weak_password_rejected() {
        let mut req = request("ada@example.com");
        req.password = "short".to_string();
        let result = User::new(&req, Role::User, &PasswordPolicy::default());
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }

    #[test]
    fn test_register_request_validation() {
        assert!(request("ada@example.com").validate().is_ok());
        assert!(request("not-an-email").validate().is_err());

        let mut young = request("ada@example.com");
        young.age = Some(12);
        assert!(young.validate().is_err());

        let mut unnamed = request("ada@example.com");
        unnamed.name = "A".to_string();
        assert!(unnamed.validate().is_err());
    }

    #[test]
    fn test_user_response_omits_password() {
        let user = User::for_tests("Ada", "ada@example.com", Role::Admin);
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "ADMIN");
        assert_eq!(json["xp"], 0);
    }

    #[test]
    fn test_profile_response_shape() {
        let user = User::for_tests("Ada", "ada@example.com", Role::User);
        let json = serde_json::to_value(ProfileResponse::from(&user)).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 5);
        assert_eq!(json["level"], 0);
    }
}
