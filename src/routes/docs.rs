//! OpenAPI document for the HTTP API.
//!
//! The documented story paths use the default `/api/story` prefix; a
//! deployment that overrides `STORY_ROUTE_PREFIX` shifts the live routes
//! but not the document.

use axum::Json;
use utoipa::OpenApi;

use super::{health, story_handlers, types};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "taleweaver",
        description = "Interactive bedtime story playback API"
    ),
    paths(
        health::health_check,
        story_handlers::list_characters,
        story_handlers::get_character,
        story_handlers::list_scenes,
        story_handlers::get_scene,
        story_handlers::create_session,
        story_handlers::get_session,
        story_handlers::advance_session,
        story_handlers::complete_event,
        story_handlers::interrupt_session,
        story_handlers::delete_session,
    ),
    components(schemas(
        types::CharacterResponse,
        types::SceneSummary,
        types::SceneResponse,
        types::EventResponse,
        types::CreateSessionRequest,
        types::SessionResponse,
        types::AdvanceResponse,
        types::CompleteResponse,
        types::InterruptResponse,
        types::HealthCheckResponse,
    )),
    tags(
        (name = "story", description = "Story content and scene playback"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document as JSON
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
