use crate::story::models::{Character, Scene, StoryEvent};
use crate::story::{EventStatus, SceneSession};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A character profile
#[derive(Debug, Serialize, ToSchema)]
pub struct CharacterResponse {
    pub name: String,
    pub voice: String,
    pub personality: Vec<String>,
    pub prompt: String,
}

impl From<&Character> for CharacterResponse {
    fn from(character: &Character) -> Self {
        Self {
            name: character.name.clone(),
            voice: character.voice.clone(),
            personality: character.personality.clone(),
            prompt: character.prompt.clone(),
        }
    }
}

/// Scene listing entry
#[derive(Debug, Serialize, ToSchema)]
pub struct SceneSummary {
    pub id: String,
    pub title: String,
    pub event_count: usize,
}

impl From<&Scene> for SceneSummary {
    fn from(scene: &Scene) -> Self {
        Self {
            id: scene.id.clone(),
            title: scene.title.clone(),
            event_count: scene.events.len(),
        }
    }
}

/// One story event, optionally annotated with its playback status
#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    pub id: String,
    pub speaker: String,
    pub emotion: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
}

impl EventResponse {
    pub fn from_event(event: &StoryEvent) -> Self {
        Self {
            id: event.id.clone(),
            speaker: event.speaker.name().to_string(),
            emotion: event.emotion.clone(),
            text: event.text.clone(),
            status: None,
        }
    }

    pub fn with_status(event: &StoryEvent, status: EventStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::from_event(event)
        }
    }
}

/// Full scene detail
#[derive(Debug, Serialize, ToSchema)]
pub struct SceneResponse {
    pub id: String,
    pub title: String,
    pub events: Vec<EventResponse>,
}

impl From<&Scene> for SceneResponse {
    fn from(scene: &Scene) -> Self {
        Self {
            id: scene.id.clone(),
            title: scene.title.clone(),
            events: scene.events.iter().map(EventResponse::from_event).collect(),
        }
    }
}

/// Request body for creating a playback session
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 64))]
    pub scene_id: String,
}

/// Playback session detail
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub scene_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub current_event_id: Option<String>,
    pub finished: bool,
    pub events: Vec<EventResponse>,
}

impl SessionResponse {
    pub fn new(session: &SceneSession, scene: &Scene) -> Self {
        let events = scene
            .events
            .iter()
            .zip(session.statuses())
            .map(|(event, status)| EventResponse::with_status(event, *status))
            .collect();

        Self {
            session_id: session.id,
            scene_id: session.scene_id.clone(),
            created_at: session.created_at,
            current_event_id: session
                .current_index()
                .map(|i| scene.events[i].id.clone()),
            finished: session.is_finished(),
            events,
        }
    }
}

/// Response to an advance request
#[derive(Debug, Serialize, ToSchema)]
pub struct AdvanceResponse {
    /// The event now playing, or `null` once the scene has run out
    pub event: Option<EventResponse>,
    pub finished: bool,
}

/// Response to a complete request
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteResponse {
    pub completed_event_id: String,
    pub finished: bool,
}

/// Response to an interrupt request
#[derive(Debug, Serialize, ToSchema)]
pub struct InterruptResponse {
    /// The event returned to the queue, or `null` if nothing was playing
    pub interrupted_event_id: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub scenes_loaded: usize,
    pub characters_loaded: usize,
    pub active_sessions: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}
