//! # FinFlex HTTP Server Module
//!
//! Axum routers for the JSON API.
//!
//! # Endpoints
//!
//! - `/` and `/health` - Banner and health check
//! - `/api/auth/*` - Registration, login and profile
//! - `/api/income/*`, `/api/expense/*`, `/api/goal/*`, `/api/budget/*` - Ledger records
//! - `/api/challenges/*` - Challenges and memberships
//! - `/api/xp/*` - Award history, progress summary and admin grants

pub mod auth_routes;
pub mod budget_routes;
pub mod challenge_routes;
pub mod config;
pub mod errors;
pub mod expense_routes;
pub mod extract;
pub mod goal_routes;
pub mod income_routes;
pub mod observability_routes;
pub mod server;
pub mod state;
pub mod xp_routes;

pub use config::HttpServerConfig;
pub use errors::{ApiError, ErrorResponse};
pub use extract::{AdminUser, CurrentUser};
pub use server::{build_router, HttpServer};
pub use state::AppState;
