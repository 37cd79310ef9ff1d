//! In-memory session store.
//!
//! Process-local and intentionally small: the dispatch core only needs a
//! place the host can load a session map from before dispatch and save it
//! back to afterwards. Swap in a real backing store by doing those two
//! steps against your own storage.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};

/// The cookie carrying the session id.
pub const SESSION_COOKIE: &str = "decor.sid";

/// Keeps session maps keyed by id.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Map<String, Value>>>,
    counter: AtomicU64,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh session id: 32 hex chars, unique per process. Ids are not
    /// unguessable — front a real deployment with your own id source if
    /// that matters.
    pub fn generate_id(&self) -> String {
        let nonce = self.counter.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        let mut a = DefaultHasher::new();
        (nonce, now).hash(&mut a);
        let mut b = DefaultHasher::new();
        (now, nonce, a.finish()).hash(&mut b);

        format!("{:016x}{:016x}", a.finish(), b.finish())
    }

    /// The stored session for `sid`, or `None` for an unknown id.
    pub fn get(&self, sid: &str) -> Option<Map<String, Value>> {
        self.sessions.read().expect("session store poisoned").get(sid).cloned()
    }

    pub fn set(&self, sid: &str, data: Map<String, Value>) {
        self.sessions.write().expect("session store poisoned").insert(sid.to_owned(), data);
    }

    pub fn destroy(&self, sid: &str) {
        self.sessions.write().expect("session store poisoned").remove(sid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_get_round_trip() {
        let store = SessionStore::new();
        let mut data = Map::new();
        data.insert("uid".to_owned(), json!(7));
        store.set("abc", data);
        assert_eq!(store.get("abc").unwrap().get("uid"), Some(&json!(7)));
        assert!(store.get("nope").is_none());
    }

    #[test]
    fn destroy_forgets_the_session() {
        let store = SessionStore::new();
        store.set("abc", Map::new());
        store.destroy("abc");
        assert!(store.get("abc").is_none());
    }

    #[test]
    fn generated_ids_are_well_formed_and_distinct() {
        let store = SessionStore::new();
        let a = store.generate_id();
        let b = store.generate_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
