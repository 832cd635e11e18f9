//! Session management

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::session::Session;
use crate::{Error, Result};

/// Shared handle to one session; holding the lock serialises its actions
pub type SessionHandle = Arc<Mutex<Session>>;

/// In-memory registry of live sessions
#[derive(Default)]
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session and return its id
    pub async fn create(&self) -> String {
        let session = Session::new();
        let id = session.id.clone();

        let mut sessions = self.sessions.write().await;
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        info!("Created session: {}", id);

        id
    }

    /// Look up a session
    pub async fn get(&self, id: &str) -> Result<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .cloned()
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    /// End a session; returns whether it existed
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!("Ended session: {}", id);
        }
        removed
    }

    /// Get session count
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions not updated within `ttl`; returns how many were dropped.
    ///
    /// Sessions whose lock is currently held are busy and kept.
    pub async fn prune_idle(&self, ttl: Duration) -> usize {
        let Some(cutoff) = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_sub_signed(ttl))
        else {
            return 0;
        };

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => session.updated_at >= cutoff,
            Err(_) => true,
        });
        let pruned = before - sessions.len();

        if pruned > 0 {
            info!("Pruned {} idle sessions", pruned);
        } else {
            debug!("No idle sessions to prune");
        }
        pruned
    }
}
