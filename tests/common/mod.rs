//! Shared fixtures for integration tests.

use axum::Router;
use std::fs;
use std::sync::Arc;
use taleweaver::config::{CorsConfig, StoryConfig};
use taleweaver::routes::{create_router, AppState};
use taleweaver::state::SessionStore;
use taleweaver::story::StoryLibrary;

const CHARACTERS_MD: &str = "\
# Characters

## Stella
- Voice: sage
- Personality: curious, brave, kind
- Prompt: A young astronaut who loves the night sky.

## Cosmo
- Voice: coral
- Personality: cheerful, loyal
- Prompt: A small robot co-pilot who beeps when happy.
";

const ROCKET_MD: &str = "\
# Rocket to the Stars

Narrator: Tonight we are going on a very special adventure.

Stella (excited): Look, Cosmo! The launch lights are on.

Cosmo (cheerful): Beep beep! Engines warm and blankets packed.
";

const GARDEN_MD: &str = "\
# The Moonlit Garden

Narrator: The garden glowed silver under the moon.

Stella (whisper): Even the snails have little silver trails.
";

/// The CORS policy the frontend dev server relies on.
pub fn default_cors() -> CorsConfig {
    CorsConfig {
        allowed_origins: vec!["http://localhost:3000".to_string()],
        allow_credentials: true,
        allowed_methods: vec!["*".to_string()],
        allowed_headers: vec!["*".to_string()],
    }
}

/// Build a full application router over a small fixture library.
///
/// The fixture has two scenes: `rocket_intro` with three events and
/// `moonlit_garden` with two.
pub fn story_app(cors: &CorsConfig, max_sessions: usize) -> Router {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("characters.md"), CHARACTERS_MD).unwrap();
    fs::create_dir(dir.path().join("scenes")).unwrap();
    fs::write(
        dir.path().join("scenes").join("scene_rocket_intro.md"),
        ROCKET_MD,
    )
    .unwrap();
    fs::write(dir.path().join("scenes").join("moonlit_garden.md"), GARDEN_MD).unwrap();

    let library = StoryLibrary::load(dir.path()).unwrap();
    let state = Arc::new(AppState {
        library,
        sessions: SessionStore::new(max_sessions),
    });

    let story = StoryConfig {
        content_dir: dir.path().to_path_buf(),
        route_prefix: "/api/story".to_string(),
        max_sessions,
        session_ttl_minutes: 60,
    };

    create_router(state, cors, &story).unwrap()
}
