//! # Application Configuration
//!
//! JSON configuration file. Every field is optional; environment overrides
//! (`PORT`, `JWT_SECRET`, `FINFLEX_DATA_FILE`) are applied after the file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::{JwtConfig, PasswordPolicy};
use crate::finance::Rewards;
use crate::http_server::HttpServerConfig;
use crate::progress::{LevelPolicy, ThresholdSchedule};

pub const ENV_PORT: &str = "PORT";
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
pub const ENV_DATA_FILE: &str = "FINFLEX_DATA_FILE";

const DEV_JWT_SECRET: &str = "finflex-development-secret";

/// Ten years
pub const MAX_TOKEN_TTL_HOURS: i64 = 87_600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write config {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Token and password settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,

    #[serde(default = "default_token_party")]
    pub issuer: String,

    #[serde(default = "default_token_party")]
    pub audience: String,

    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// Registering with one of these emails grants the admin role
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

fn default_jwt_secret() -> String {
    DEV_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> i64 {
    168
}

fn default_token_party() -> String {
    "finflex".to_string()
}

fn default_min_password_length() -> usize {
    6
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            issuer: default_token_party(),
            audience: default_token_party(),
            min_password_length: default_min_password_length(),
            admin_emails: Vec::new(),
        }
    }
}

impl AuthConfig {
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig {
            secret: self.jwt_secret.clone(),
            access_token_ttl: Duration::hours(self.token_ttl_hours.clamp(1, MAX_TOKEN_TTL_HOURS)),
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
        }
    }

    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy {
            min_length: self.min_password_length,
            ..PasswordPolicy::default()
        }
    }

    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Level schedule and policy
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ProgressConfig {
    #[serde(flatten)]
    pub schedule: ThresholdSchedule,

    #[serde(default)]
    pub level_policy: LevelPolicy,
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: HttpServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub progress: ProgressConfig,

    #[serde(default)]
    pub rewards: Rewards,

    /// JSON snapshot backing the store; in-memory only when unset
    #[serde(default)]
    pub data_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load from file, apply environment overrides, validate
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: AppConfig = serde_json::from_str(&content)?;

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = AppConfig::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{} is not a valid port: '{}'", ENV_PORT, port)))?;
        }
        if let Some(secret) = lookup(ENV_JWT_SECRET) {
            self.auth.jwt_secret = secret;
        }
        if let Some(file) = lookup(ENV_DATA_FILE) {
            self.data_file = Some(PathBuf::from(file));
        }
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.progress
            .schedule
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Invalid("auth.jwt_secret must not be empty".to_string()));
        }
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(ConfigError::Invalid(format!(
                "auth.token_ttl_hours must be between 1 and {}",
                MAX_TOKEN_TTL_HOURS
            )));
        }
        if self.auth.min_password_length == 0 {
            return Err(ConfigError::Invalid("auth.min_password_length must be > 0".to_string()));
        }
        self.rewards
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Write this configuration as pretty JSON
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
