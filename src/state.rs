use std::sync::Arc;
use std::time::Duration;

use crate::auth::{hash_password, AuthGate, RevocationLedger, TokenService};
use crate::config::{Config, ConfigError};
use crate::store::{MemoryStore, PgStore, RevocationStore, TaskStore, UserStore};

/// The persistence backends the application runs over.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub revocations: Arc<dyn RevocationStore>,
    pub tasks: Arc<dyn TaskStore>,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            revocations: store.clone(),
            tasks: store,
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            revocations: store.clone(),
            tasks: store,
        }
    }
}

/// Everything a request handler needs, built once at startup and shared.
pub struct AppState {
    pub tokens: Arc<TokenService>,
    pub ledger: Arc<RevocationLedger>,
    pub gate: Arc<AuthGate>,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub bcrypt_cost: u32,
    /// Hash checked against when a login names an unknown email, so the
    /// response takes as long as a wrong password for a real account.
    pub dummy_password_hash: String,
    pub store_timeout: Duration,
}

impl AppState {
    pub fn new(config: &Config, stores: Stores) -> Result<Self, ConfigError> {
        let ttl = chrono::Duration::from_std(config.token_ttl).map_err(|e| {
            ConfigError::Invalid {
                name: "JWT_EXPIRE",
                reason: e.to_string(),
            }
        })?;

        let dummy_password_hash =
            hash_password("not-a-real-password", config.bcrypt_cost).map_err(|e| {
                ConfigError::Invalid {
                    name: "BCRYPT_COST",
                    reason: e.to_string(),
                }
            })?;

        let tokens = Arc::new(TokenService::new(&config.jwt_secret, ttl));
        let ledger = Arc::new(RevocationLedger::new(
            stores.revocations,
            config.store_timeout,
        ));
        let gate = Arc::new(AuthGate::new(
            tokens.clone(),
            ledger.clone(),
            stores.users.clone(),
            config.store_timeout,
        ));

        Ok(Self {
            tokens,
            ledger,
            gate,
            users: stores.users,
            tasks: stores.tasks,
            bcrypt_cost: config.bcrypt_cost,
            dummy_password_hash,
            store_timeout: config.store_timeout,
        })
    }
}
