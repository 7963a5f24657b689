//! # FinFlex Auth Module
//!
//! User registration, password hashing and stateless JWT access tokens.

pub mod api;
pub mod crypto;
pub mod errors;
pub mod jwt;
pub mod user;

pub use api::{AuthResponse, AuthService};
pub use crypto::PasswordPolicy;
pub use errors::{AuthError, AuthResult};
pub use jwt::{JwtClaims, JwtConfig, JwtManager};
pub use user::{LoginRequest, ProfileResponse, RegisterRequest, Role, User, UserRepository, UserResponse};
