//! Shared server state and per-caller session slots

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::config::Config;
use crate::models::CaptchaModule;
use crate::render::DocumentRenderer;
use crate::services::{CaptchaSession, CauseListFetcher, CnrSearch, SessionManager};
use crate::workflow::AllCourtsFlow;

/// One logical caller: its upstream session and the captchas shown to it
pub struct SessionSlot {
    pub manager: SessionManager,
    pub pending: HashMap<CaptchaModule, CaptchaSession>,
}

impl SessionSlot {
    fn new(config: Config) -> Self {
        Self {
            manager: SessionManager::new(config),
            pending: HashMap::new(),
        }
    }
}

type Slots = HashMap<String, (Arc<Mutex<SessionSlot>>, Instant)>;

/// Session slots keyed by caller-chosen session id
///
/// Requests for one id are serialised by the slot's mutex; different ids
/// never share an upstream cookie or token.
pub struct SessionStore {
    config: Config,
    idle_limit: Duration,
    slots: Mutex<Slots>,
}

impl SessionStore {
    pub fn new(config: Config) -> Self {
        let idle_limit = config.session_max_age() * 2;
        Self {
            config,
            idle_limit,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Slot for `id`, created on first use; idle slots are dropped on the way
    pub async fn slot(&self, id: &str) -> Arc<Mutex<SessionSlot>> {
        let mut slots = self.slots.lock().await;
        let now = Instant::now();
        let idle_limit = self.idle_limit;
        let before = slots.len();
        slots.retain(|key, (_, last_used)| key == id || now.duration_since(*last_used) < idle_limit);
        if slots.len() != before {
            debug!("dropped {} idle session slots", before - slots.len());
        }

        let entry = slots
            .entry(id.to_string())
            .or_insert_with(|| (Arc::new(Mutex::new(SessionSlot::new(self.config.clone()))), now));
        entry.1 = now;
        entry.0.clone()
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}

/// Application state shared across request handlers
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub fetcher: CauseListFetcher,
    pub renderer: DocumentRenderer,
    pub cnr: CnrSearch,
    pub all_courts: AllCourtsFlow,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            sessions: SessionStore::new(config.clone()),
            fetcher: CauseListFetcher::new(&config),
            renderer: DocumentRenderer::from_config(&config),
            cnr: CnrSearch::new(&config),
            all_courts: AllCourtsFlow::new(&config),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slots_are_per_id() {
        let store = SessionStore::new(Config::default());
        let a1 = store.slot("a").await;
        let a2 = store.slot("a").await;
        let b = store.slot("b").await;
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
        assert_eq!(store.len().await, 2);
    }
}
