//! finflex - Personal finance tracking with XP and levels
//!
//! Income, expenses, budgets, goals and challenges feed a progress engine
//! that grants XP, derives levels and records every award.

pub mod auth;
pub mod cli;
pub mod config;
pub mod finance;
pub mod http_server;
pub mod logging;
pub mod progress;
pub mod store;
pub mod validation;
