//! The revocation ledger: tokens invalidated before their natural expiry.
//!
//! Entries carry the revoked token's own `exp`. Once that instant has passed the
//! token fails verification on expiry grounds alone, so the entry is dead weight
//! and the background sweeper deletes it. The sweep is time-driven and runs
//! whether or not any traffic arrives.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::AuthError;
use crate::store::{bounded, RevocationStore, StoreError};

pub struct RevocationLedger {
    store: Arc<dyn RevocationStore>,
    timeout: Duration,
}

impl RevocationLedger {
    pub fn new(store: Arc<dyn RevocationStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Records `token` as revoked until `expires_at`.
    ///
    /// Revoking an already revoked token is a no-op success.
    pub async fn revoke(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), AuthError> {
        match bounded(self.timeout, self.store.insert_revoked(token, expires_at)).await {
            Ok(()) => {
                debug!("token revoked until {}", expires_at);
                Ok(())
            }
            Err(StoreError::Conflict(_)) => {
                debug!("token was already revoked");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn is_revoked(&self, token: &str) -> Result<bool, AuthError> {
        Ok(bounded(self.timeout, self.store.contains_revoked(token)).await?)
    }

    /// Deletes every entry whose expiry has passed. Returns the number removed.
    pub async fn sweep(&self) -> Result<u64, AuthError> {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<u64, AuthError> {
        Ok(bounded(self.timeout, self.store.delete_expired(now)).await?)
    }

    /// Starts a background task calling [`sweep`](Self::sweep) every `every`.
    ///
    /// A failed sweep is logged and retried on the next tick.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> SweeperHandle {
        let (shutdown, mut stop) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("revocation sweeper started, interval {:?}", every);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.sweep().await {
                            Ok(0) => {}
                            Ok(removed) => debug!("swept {} expired revocation entries", removed),
                            Err(e) => warn!("revocation sweep failed: {}", e),
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("revocation sweeper stopped");
        });

        SweeperHandle { shutdown, handle }
    }
}

/// Owner of a running sweeper task.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SweeperHandle {
    /// Signals the sweeper to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("revocation sweeper ended abnormally: {}", e);
        }
    }
}
