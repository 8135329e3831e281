use crate::error::{AppError, AppResult};
use crate::routes::types::{
    AdvanceResponse, CharacterResponse, CompleteResponse, CreateSessionRequest, EventResponse,
    InterruptResponse, SceneResponse, SceneSummary, SessionResponse,
};
use crate::story::{EventStatus, Scene, SceneSession};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use super::AppState;

/// List all characters
#[utoipa::path(
    get,
    path = "/api/story/characters",
    tag = "story",
    responses(
        (status = 200, description = "All defined characters", body = [CharacterResponse])
    )
)]
pub async fn list_characters(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let characters: Vec<CharacterResponse> =
        state.library.characters().iter().map(Into::into).collect();

    Ok(Json(characters))
}

/// Fetch a single character by name
#[utoipa::path(
    get,
    path = "/api/story/characters/{name}",
    tag = "story",
    params(("name" = String, Path, description = "Character name, case sensitive")),
    responses(
        (status = 200, description = "The character profile", body = CharacterResponse),
        (status = 404, description = "No such character")
    )
)]
pub async fn get_character(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let character = state
        .library
        .character(&name)
        .ok_or(AppError::CharacterNotFound(name))?;

    Ok(Json(CharacterResponse::from(character)))
}

/// List all scenes
#[utoipa::path(
    get,
    path = "/api/story/scenes",
    tag = "story",
    responses(
        (status = 200, description = "Summaries of every loaded scene", body = [SceneSummary])
    )
)]
pub async fn list_scenes(State(state): State<Arc<AppState>>) -> AppResult<impl IntoResponse> {
    let scenes: Vec<SceneSummary> = state.library.scenes().into_iter().map(Into::into).collect();

    Ok(Json(scenes))
}

/// Fetch a full scene, events included
#[utoipa::path(
    get,
    path = "/api/story/scenes/{id}",
    tag = "story",
    params(("id" = String, Path, description = "Scene id")),
    responses(
        (status = 200, description = "The scene with all its events", body = SceneResponse),
        (status = 404, description = "No such scene")
    )
)]
pub async fn get_scene(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let scene = state.library.scene(&id).ok_or(AppError::SceneNotFound(id))?;

    Ok(Json(SceneResponse::from(scene)))
}

/// Start a playback session for a scene
#[utoipa::path(
    post,
    path = "/api/story/sessions",
    tag = "story",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 404, description = "No such scene"),
        (status = 503, description = "Session limit reached")
    )
)]
#[instrument(skip(state, payload), fields(scene_id = %payload.scene_id))]
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateSessionRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::InvalidRequest(format!("Validation failed: {}", e)))?;

    let scene = state
        .library
        .scene(&payload.scene_id)
        .ok_or_else(|| AppError::SceneNotFound(payload.scene_id.clone()))?;

    let session = SceneSession::new(scene);
    let response = SessionResponse::new(&session, scene);
    state.sessions.insert(session)?;

    info!(session_id = %response.session_id, "Playback session created");

    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch the current state of a session
#[utoipa::path(
    get,
    path = "/api/story/sessions/{id}",
    tag = "story",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session state", body = SessionResponse),
        (status = 404, description = "No such session")
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let session = state
        .sessions
        .get(&id)
        .ok_or(AppError::SessionNotFound(id))?;
    let scene = lookup_scene(&state, &session.scene_id)?;

    Ok(Json(SessionResponse::new(&session, scene)))
}

/// Begin playback of the next pending event
#[utoipa::path(
    post,
    path = "/api/story/sessions/{id}/advance",
    tag = "story",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "The event now playing, or null when finished", body = AdvanceResponse),
        (status = 404, description = "No such session"),
        (status = 409, description = "An event is already playing")
    )
)]
#[instrument(skip(state), fields(session_id = %id))]
pub async fn advance_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut session = state
        .sessions
        .get_mut(&id)
        .ok_or(AppError::SessionNotFound(id))?;
    let scene = lookup_scene(&state, &session.scene_id)?;

    let next = session.advance()?;
    let response = AdvanceResponse {
        event: next.map(|idx| EventResponse::with_status(&scene.events[idx], EventStatus::Playing)),
        finished: session.is_finished(),
    };

    Ok(Json(response))
}

/// Mark the playing event as finished
#[utoipa::path(
    post,
    path = "/api/story/sessions/{id}/complete",
    tag = "story",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "The completed event id", body = CompleteResponse),
        (status = 404, description = "No such session"),
        (status = 409, description = "No event is playing")
    )
)]
#[instrument(skip(state), fields(session_id = %id))]
pub async fn complete_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut session = state
        .sessions
        .get_mut(&id)
        .ok_or(AppError::SessionNotFound(id))?;
    let scene = lookup_scene(&state, &session.scene_id)?;

    let idx = session.complete()?;
    let response = CompleteResponse {
        completed_event_id: scene.events[idx].id.clone(),
        finished: session.is_finished(),
    };

    Ok(Json(response))
}

/// Stop playback and return the playing event to the queue
#[utoipa::path(
    post,
    path = "/api/story/sessions/{id}/interrupt",
    tag = "story",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "The interrupted event id, or null if nothing was playing", body = InterruptResponse),
        (status = 404, description = "No such session")
    )
)]
#[instrument(skip(state), fields(session_id = %id))]
pub async fn interrupt_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let mut session = state
        .sessions
        .get_mut(&id)
        .ok_or(AppError::SessionNotFound(id))?;
    let scene = lookup_scene(&state, &session.scene_id)?;

    let idx = session.interrupt();
    let response = InterruptResponse {
        interrupted_event_id: idx.map(|i| scene.events[i].id.clone()),
    };

    Ok(Json(response))
}

/// Discard a session
#[utoipa::path(
    delete,
    path = "/api/story/sessions/{id}",
    tag = "story",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session deleted"),
        (status = 404, description = "No such session")
    )
)]
pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state
        .sessions
        .remove(&id)
        .ok_or(AppError::SessionNotFound(id))?;

    info!(session_id = %id, "Playback session deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Sessions are only ever created against loaded scenes, so a miss here
/// means the store and the library have diverged.
fn lookup_scene<'a>(state: &'a AppState, scene_id: &str) -> AppResult<&'a Scene> {
    state.library.scene(scene_id).ok_or_else(|| {
        AppError::Internal(format!("session references unknown scene '{}'", scene_id))
    })
}
