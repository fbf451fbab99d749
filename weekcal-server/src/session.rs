use std::convert::Infallible;
use std::sync::{Arc, Weak};

use log::debug;
use quick_cache::sync::Cache;
use tokio::sync::RwLock;
use tokio::task;
use tokio::time::{sleep, Duration};
use weekcal_core::EventCollection;

pub struct Config {
    pub ttl: Duration,
    pub capacity: usize,
}

/// One session's events. Writers hold the lock while swapping in the
/// updated collection.
pub type Session = Arc<RwLock<EventCollection>>;

pub struct Sessions {
    inner: Cache<String, Session>,
    ttl: Duration,
}

impl Sessions {
    pub fn new(config: Config) -> Arc<Self> {
        Arc::new(Self {
            inner: Cache::new(config.capacity),
            ttl: config.ttl,
        })
    }

    /// Returns the session for `key`, creating an empty one that expires
    /// `ttl` after creation. A session evicted and created again under the
    /// same key gets its own deadline.
    pub fn get_or_create(self: &Arc<Self>, key: &str) -> Session {
        let mut created = false;
        let session = match self.inner.get_or_insert_with(key, || {
            created = true;
            Ok::<_, Infallible>(Session::default())
        }) {
            Ok(session) => session,
            Err(never) => match never {},
        };

        if created {
            debug!("Created session {key}");
            let self_clone = Arc::clone(self);
            let key = key.to_owned();
            let created_session = Arc::downgrade(&session);
            task::spawn(async move {
                sleep(self_clone.ttl).await;
                self_clone.expire(&key, &created_session);
            });
        }

        session
    }

    pub fn get(&self, key: &str) -> Option<Session> {
        self.inner.get(key)
    }

    fn expire(&self, key: &str, created_session: &Weak<RwLock<EventCollection>>) {
        match self.inner.get(key) {
            Some(current) if Arc::as_ptr(&current) == created_session.as_ptr() => {
                self.inner.remove(key);
                debug!("Expired session {key}");
            }
            _ => debug!("Session {key} was replaced before it expired"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use weekcal_core::EventDraft;

    fn sessions(ttl: Duration) -> Arc<Sessions> {
        Sessions::new(Config { ttl, capacity: 16 })
    }

    #[tokio::test]
    async fn same_key_shares_events() {
        let sessions = sessions(Duration::from_secs(60));

        let first = sessions.get_or_create("alice");
        {
            let mut events = first.write().await;
            let start = NaiveDate::from_ymd_opt(2025, 9, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap();
            *events = std::mem::take(&mut *events).append([EventDraft::new("a", start, 30)]);
        }

        let again = sessions.get_or_create("alice");
        assert_eq!(again.read().await.len(), 1);
        assert!(sessions.get_or_create("bob").read().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_expire() {
        let sessions = sessions(Duration::from_secs(5));
        sessions.get_or_create("alice");
        assert!(sessions.get("alice").is_some());

        sleep(Duration::from_secs(6)).await;
        assert!(sessions.get("alice").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn recreated_session_keeps_its_own_deadline() {
        let sessions = sessions(Duration::from_secs(5));
        sessions.get_or_create("alice");

        // Dropped from the cache as if evicted for capacity.
        sleep(Duration::from_secs(1)).await;
        sessions.inner.remove("alice");

        sleep(Duration::from_secs(3)).await;
        let recreated = sessions.get_or_create("alice");

        // The first deadline passes without touching the new session.
        sleep(Duration::from_secs(2)).await;
        let current = sessions.get("alice").expect("recreated session survives");
        assert!(Arc::ptr_eq(&current, &recreated));

        sleep(Duration::from_secs(4)).await;
        assert!(sessions.get("alice").is_none());
    }
}
