use crate::error::{AppError, AppResult};
use crate::story::{SceneSession, StoryLibrary};
use chrono::Duration;
use dashmap::mapref::one::{Ref, RefMut};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

/// Application state shared across all HTTP handlers.
///
/// This struct is wrapped in `Arc` and shared across all request handlers
/// via Axum's State extraction.
pub struct AppState {
    /// Story content loaded at startup, immutable for the process lifetime
    pub library: StoryLibrary,

    /// Live playback sessions, keyed by session id
    pub sessions: SessionStore,
}

/// Concurrent map of playback sessions with a configurable cap.
///
/// Sessions are created by clients and abandoned freely, so the store both
/// bounds how many may exist at once and supports idle eviction (driven by
/// the background sweeper in `jobs`).
pub struct SessionStore {
    sessions: DashMap<Uuid, SceneSession>,
    max_sessions: usize,
    occupancy: AtomicUsize,
}

impl SessionStore {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            max_sessions,
            occupancy: AtomicUsize::new(0),
        }
    }

    /// Register a new session, refusing once the cap is reached.
    ///
    /// The slot is reserved atomically before touching the map, so racing
    /// registrations cannot overshoot the cap.
    pub fn insert(&self, session: SceneSession) -> AppResult<()> {
        self.occupancy
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |occupied| {
                (occupied < self.max_sessions).then_some(occupied + 1)
            })
            .map_err(|_| AppError::SessionLimitReached(self.max_sessions))?;

        if self.sessions.insert(session.id, session).is_some() {
            // a colliding id replaced in place instead of filling the slot
            self.occupancy.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }

    pub fn get(&self, id: &Uuid) -> Option<Ref<'_, Uuid, SceneSession>> {
        self.sessions.get(id)
    }

    pub fn get_mut(&self, id: &Uuid) -> Option<RefMut<'_, Uuid, SceneSession>> {
        self.sessions.get_mut(id)
    }

    pub fn remove(&self, id: &Uuid) -> Option<SceneSession> {
        let removed = self.sessions.remove(id).map(|(_, session)| session);
        if removed.is_some() {
            self.occupancy.fetch_sub(1, Ordering::SeqCst);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session idle for longer than `ttl`, returning the count.
    pub fn evict_idle(&self, ttl: Duration) -> usize {
        let cutoff = chrono::Utc::now() - ttl;
        let mut evicted = 0;
        self.sessions.retain(|_, session| {
            let keep = session.last_active() > cutoff;
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            self.occupancy.fetch_sub(evicted, Ordering::SeqCst);
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::story::models::{Scene, Speaker, StoryEvent};
    use std::sync::Barrier;

    fn scene() -> Scene {
        Scene {
            id: "rocket_intro".to_string(),
            title: "Rocket to the Stars".to_string(),
            events: vec![StoryEvent {
                id: "rocket_intro:1".to_string(),
                speaker: Speaker::Narrator,
                emotion: None,
                text: "Tonight we fly.".to_string(),
            }],
        }
    }

    #[test]
    fn test_session_cap_is_enforced() {
        let store = SessionStore::new(2);
        store.insert(SceneSession::new(&scene())).unwrap();
        store.insert(SceneSession::new(&scene())).unwrap();

        let err = store.insert(SceneSession::new(&scene())).unwrap_err();
        assert!(matches!(err, AppError::SessionLimitReached(2)));

        // removing one frees a slot
        let id = store.sessions.iter().next().map(|e| *e.key()).unwrap();
        assert!(store.remove(&id).is_some());
        assert!(store.insert(SceneSession::new(&scene())).is_ok());
    }

    #[test]
    fn test_evict_idle_only_removes_stale_sessions() {
        let store = SessionStore::new(8);
        let fresh = SceneSession::new(&scene());
        let fresh_id = fresh.id;
        store.insert(fresh).unwrap();

        // nothing is older than an hour yet
        assert_eq!(store.evict_idle(Duration::minutes(60)), 0);
        assert!(store.get(&fresh_id).is_some());

        // a zero-width window treats every session as stale
        assert_eq!(store.evict_idle(Duration::zero()), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_session_cap_holds_under_concurrent_inserts() {
        let store = SessionStore::new(4);
        let barrier = Barrier::new(8);

        let admitted = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        store.insert(SceneSession::new(&scene())).is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(admitted, 4);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_eviction_frees_capacity() {
        let store = SessionStore::new(1);
        store.insert(SceneSession::new(&scene())).unwrap();
        assert!(store.insert(SceneSession::new(&scene())).is_err());

        assert_eq!(store.evict_idle(Duration::zero()), 1);
        assert!(store.insert(SceneSession::new(&scene())).is_ok());
    }
}
