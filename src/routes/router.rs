use crate::config::{CorsConfig, StoryConfig};
use crate::cors::cors_layer;
use crate::error::AppResult;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::docs;
use super::health;
use super::story_handlers;
use super::AppState;

/// Create application router
pub fn create_router(
    state: Arc<AppState>,
    cors_config: &CorsConfig,
    story_config: &StoryConfig,
) -> AppResult<Router> {
    let cors = cors_layer(cors_config)?;

    // The story group is nested under the configurable prefix so the
    // frontend can address everything below one base path.
    let story_routes = Router::new()
        .route("/characters", get(story_handlers::list_characters))
        .route("/characters/{name}", get(story_handlers::get_character))
        .route("/scenes", get(story_handlers::list_scenes))
        .route("/scenes/{id}", get(story_handlers::get_scene))
        .route("/sessions", post(story_handlers::create_session))
        .route(
            "/sessions/{id}",
            get(story_handlers::get_session).delete(story_handlers::delete_session),
        )
        .route(
            "/sessions/{id}/advance",
            post(story_handlers::advance_session),
        )
        .route(
            "/sessions/{id}/complete",
            post(story_handlers::complete_event),
        )
        .route(
            "/sessions/{id}/interrupt",
            post(story_handlers::interrupt_session),
        );

    let router = Router::new()
        .nest(&story_config.route_prefix, story_routes)
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}
