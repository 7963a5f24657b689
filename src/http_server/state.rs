//! Shared handler state

use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::finance::FinanceService;
use crate::progress::{ProgressEngine, ProgressError};
use crate::store::InMemoryLedgerStore;

/// Services behind every route
pub struct AppState {
    pub auth: AuthService<InMemoryLedgerStore>,
    pub finance: FinanceService<InMemoryLedgerStore>,
}

impl AppState {
    /// Wire services over an already-open store
    pub fn new(store: Arc<InMemoryLedgerStore>, config: &AppConfig) -> Result<Self, ProgressError> {
        let engine = Arc::new(ProgressEngine::new(
            store.clone(),
            config.progress.schedule,
            config.progress.level_policy,
        )?);

        let auth = AuthService::new(
            store.clone(),
            config.auth.jwt_config(),
            config.auth.password_policy(),
        )
        .with_admin_emails(&config.auth.admin_emails);

        Ok(Self {
            auth,
            finance: FinanceService::new(store, engine, config.rewards),
        })
    }

    /// Open the store named by `data_file` (or an in-memory one) and wire services
    pub fn from_config(config: &AppConfig) -> Result<Self, ProgressError> {
        let store = match &config.data_file {
            Some(path) => InMemoryLedgerStore::open(path)?,
            None => {
                info!("no data_file configured, ledger is in-memory only");
                InMemoryLedgerStore::new()
            }
        };
        if config.auth.uses_development_secret() {
            warn!("using the development JWT secret; set JWT_SECRET in production");
        }
        Self::new(Arc::new(store), config)
    }
}
