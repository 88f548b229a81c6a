use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::{error, info};
use triage_core::TrustList;

/// Holds the trust list behind a lock so the HTTP handler and the stage
/// loop observe the same data, and so a reload can swap the whole
/// structure in one atomic step. Trust files are re-read on SIGHUP —
/// the reload mechanism is left to the implementer by spec; this is
/// that choice.
pub struct TrustState {
    domains_path: PathBuf,
    users_path: PathBuf,
    current: RwLock<TrustList>,
}

impl TrustState {
    pub fn load(domains_path: PathBuf, users_path: PathBuf) -> triage_core::Result<Arc<Self>> {
        let trust = TrustList::load(&domains_path, &users_path)?;
        Ok(Arc::new(Self {
            domains_path,
            users_path,
            current: RwLock::new(trust),
        }))
    }

    pub fn get(&self) -> TrustList {
        self.current.read().expect("trust list lock poisoned").clone()
    }

    pub fn reload(&self) {
        match TrustList::load(&self.domains_path, &self.users_path) {
            Ok(fresh) => {
                *self.current.write().expect("trust list lock poisoned") = fresh;
                info!("trust list reloaded");
            }
            Err(e) => error!(error = %e, "trust list reload failed, keeping previous list"),
        }
    }

    #[cfg(unix)]
    pub fn spawn_sighup_reloader(self: &Arc<Self>) {
        let state = self.clone();
        tokio::spawn(async move {
            let mut sighup = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::hangup()) {
                Ok(s) => s,
                Err(_) => return,
            };
            loop {
                sighup.recv().await;
                state.reload();
            }
        });
    }

    #[cfg(not(unix))]
    pub fn spawn_sighup_reloader(self: &Arc<Self>) {}
}
