//! Scene playback sessions.
//!
//! A session steps through a scene one event at a time. Exactly one event
//! may be playing at any moment: `advance` refuses while playback is in
//! flight, `complete` marks the playing event done, and `interrupt` returns
//! it to the queue so it can be replayed.

use crate::error::{AppError, AppResult};
use crate::story::models::{event_id, Scene};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Playback status of a single story event within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Playing,
    Complete,
}

/// One client's progress through a scene.
#[derive(Debug, Clone)]
pub struct SceneSession {
    pub id: Uuid,
    pub scene_id: String,
    pub created_at: DateTime<Utc>,
    statuses: Vec<EventStatus>,
    current: Option<usize>,
    last_active: DateTime<Utc>,
}

impl SceneSession {
    /// Start a fresh session over `scene` with every event pending.
    pub fn new(scene: &Scene) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            scene_id: scene.id.clone(),
            created_at: now,
            statuses: vec![EventStatus::Pending; scene.events.len()],
            current: None,
            last_active: now,
        }
    }

    /// Per-event statuses, in scene order.
    pub fn statuses(&self) -> &[EventStatus] {
        &self.statuses
    }

    /// Index of the event currently playing, if any.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Begin playback of the next pending event.
    ///
    /// Returns the index of the event now playing, or `None` once every
    /// event has completed. Fails with `EventInProgress` if playback of an
    /// earlier event has not been completed or interrupted yet.
    pub fn advance(&mut self) -> AppResult<Option<usize>> {
        self.touch();
        if let Some(current) = self.current {
            return Err(AppError::EventInProgress(event_id(
                &self.scene_id,
                current + 1,
            )));
        }
        match self
            .statuses
            .iter()
            .position(|s| *s == EventStatus::Pending)
        {
            Some(next) => {
                self.statuses[next] = EventStatus::Playing;
                self.current = Some(next);
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }

    /// Mark the playing event complete, returning its index.
    pub fn complete(&mut self) -> AppResult<usize> {
        self.touch();
        let current = self.current.ok_or(AppError::NoEventPlaying)?;
        self.statuses[current] = EventStatus::Complete;
        self.current = None;
        Ok(current)
    }

    /// Stop playback and return the playing event to the pending queue.
    ///
    /// The interrupted event is replayed by the next `advance`. Calling this
    /// with nothing playing is a no-op, so clients can interrupt freely.
    pub fn interrupt(&mut self) -> Option<usize> {
        self.touch();
        let current = self.current.take()?;
        self.statuses[current] = EventStatus::Pending;
        Some(current)
    }

    /// True once every event in the scene has completed.
    pub fn is_finished(&self) -> bool {
        self.statuses.iter().all(|s| *s == EventStatus::Complete)
    }

    /// Record client activity for idle eviction.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }
}
