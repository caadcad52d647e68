//! Session registry
//!
//! One engine per session id, behind its own mutex so concurrent turns
//! against the same session serialize. Sessions idle for longer than the
//! time-to-live are pruned opportunistically whenever a new one is created.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info};
use parking_lot::Mutex;

use crate::content::ContentStore;
use crate::engine::Engine;
use crate::levels::Shared;
use crate::phrases::PhraseBook;
use crate::reply::AudioTagResolver;

/// Idle time after which a session is dropped.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 600;

struct SessionEntry {
    engine: Arc<Mutex<Engine>>,
    last_seen: DateTime<Utc>,
}

pub struct SessionRegistry {
    store: Arc<ContentStore>,
    phrases: Arc<PhraseBook>,
    resolver: Arc<dyn AudioTagResolver>,
    ttl: Duration,
    debug: bool,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<ContentStore>,
        phrases: Arc<PhraseBook>,
        resolver: Arc<dyn AudioTagResolver>,
    ) -> Self {
        Self {
            store,
            phrases,
            resolver,
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
            debug: false,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl_secs: i64) -> Self {
        self.ttl = Duration::seconds(ttl_secs);
        self
    }

    /// Engines created from here on carry the debug flag.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn new_engine(&self) -> Engine {
        let mut shared = Shared::new(
            Arc::clone(&self.store),
            Arc::clone(&self.phrases),
            Arc::clone(&self.resolver),
        );
        shared.debug = self.debug;
        Engine::with_shared(shared)
    }

    /// Create (or replace) the session's engine. Prunes idle sessions while
    /// the registry lock is already held.
    pub fn create(&self, id: &str) -> Arc<Mutex<Engine>> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock();

        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen < self.ttl);
        if sessions.len() < before {
            info!("pruned {} idle sessions", before - sessions.len());
        }

        let engine = Arc::new(Mutex::new(self.new_engine()));
        sessions.insert(
            id.to_string(),
            SessionEntry {
                engine: Arc::clone(&engine),
                last_seen: now,
            },
        );
        debug!("session {id} created, {} live", sessions.len());
        engine
    }

    /// Fetch a live session, refreshing its activity stamp.
    pub fn lookup(&self, id: &str) -> Option<Arc<Mutex<Engine>>> {
        let mut sessions = self.sessions.lock();
        sessions.get_mut(id).map(|entry| {
            entry.last_seen = Utc::now();
            Arc::clone(&entry.engine)
        })
    }

    /// Lookup falling back to a fresh session.
    pub fn get_or_create(&self, id: &str) -> Arc<Mutex<Engine>> {
        match self.lookup(id) {
            Some(engine) => engine,
            None => self.create(id),
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::testutil::test_store;
    use crate::reply::NullResolver;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(
            Arc::new(test_store()),
            Arc::new(PhraseBook::builtin()),
            Arc::new(NullResolver),
        )
    }

    #[test]
    fn lookup_finds_created_sessions() {
        let reg = registry();
        assert!(reg.lookup("a").is_none());

        let engine = reg.create("a");
        let found = reg.lookup("a").unwrap();
        assert!(Arc::ptr_eq(&engine, &found));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn create_prunes_idle_sessions() {
        let reg = registry().with_ttl(1);
        reg.create("old");
        reg.sessions.lock().get_mut("old").unwrap().last_seen =
            Utc::now() - Duration::seconds(5);

        reg.create("fresh");
        assert!(reg.lookup("old").is_none());
        assert!(reg.lookup("fresh").is_some());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn lookup_refreshes_the_stamp() {
        let reg = registry().with_ttl(10);
        reg.create("a");
        reg.sessions.lock().get_mut("a").unwrap().last_seen =
            Utc::now() - Duration::seconds(9);

        reg.lookup("a").unwrap();
        let stamp = reg.sessions.lock().get("a").unwrap().last_seen;
        assert!(Utc::now() - stamp < Duration::seconds(1));
    }

    #[test]
    fn get_or_create_reuses_live_sessions() {
        let reg = registry();
        let a = reg.get_or_create("a");
        let b = reg.get_or_create("a");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.len(), 1);
    }
}
