//! # Auth Service
//!
//! Registration, login and bearer-token resolution.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::crypto::PasswordPolicy;
use super::errors::{AuthError, AuthResult};
use super::jwt::{JwtConfig, JwtManager};
use super::user::{normalize_email, LoginRequest, RegisterRequest, Role, User, UserRepository, UserResponse};

/// Reply to register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Auth service combining all auth components
pub struct AuthService<U: UserRepository> {
    user_repo: Arc<U>,
    jwt_manager: JwtManager,
    password_policy: PasswordPolicy,
    admin_emails: HashSet<String>,
}

impl<U: UserRepository> AuthService<U> {
    pub fn new(user_repo: Arc<U>, jwt_config: JwtConfig, password_policy: PasswordPolicy) -> Self {
        Self {
            user_repo,
            jwt_manager: JwtManager::new(jwt_config),
            password_policy,
            admin_emails: HashSet::new(),
        }
    }

    /// Users registering with one of these emails get the admin role
    pub fn with_admin_emails<I, E>(mut self, emails: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: AsRef<str>,
    {
        self.admin_emails = emails
            .into_iter()
            .map(|e| normalize_email(e.as_ref()))
            .collect();
        self
    }

    /// Register a new user
    pub fn register(&self, request: RegisterRequest) -> AuthResult<(User, String)> {
        request
            .validate()
            .map_err(|e| AuthError::InvalidRegistration(e.to_string()))?;

        let email = normalize_email(&request.email);
        if self.user_repo.email_exists(&email)? {
            return Err(AuthError::EmailAlreadyExists);
        }

        let role = if self.admin_emails.contains(&email) {
            Role::Admin
        } else {
            Role::User
        };
        let user = User::new(&request, role, &self.password_policy)?;

        // create() re-checks uniqueness under the store's write lock
        self.user_repo.create(&user)?;
        let token = self.jwt_manager.generate_access_token(&user)?;

        info!(user_id = %user.id, role = ?user.role, "user registered");
        Ok((user, token))
    }

    /// Authenticate a user
    pub fn login(&self, request: LoginRequest) -> AuthResult<(User, String)> {
        let user = self
            .user_repo
            .find_by_email(&normalize_email(&request.email))?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.verify_password(&request.password)? {
            warn!(user_id = %user.id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt_manager.generate_access_token(&user)?;

        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    /// Get user by ID
    pub fn get_user(&self, user_id: Uuid) -> AuthResult<User> {
        self.user_repo
            .find_by_id(user_id)?
            .ok_or(AuthError::UserNotFound)
    }

    /// Validate an access token and return the user it names
    pub fn authenticate(&self, token: &str) -> AuthResult<User> {
        let claims = self.jwt_manager.validate_token(token)?;
        let user_id = JwtManager::get_user_id(&claims)?;
        self.get_user(user_id)
    }
}
