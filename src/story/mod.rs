//! Story domain: content model, markdown parsing, and scene playback.

pub mod library;
pub mod models;
pub mod parser;
pub mod sequencer;

pub use library::StoryLibrary;
pub use models::{Character, Scene, Speaker, StoryEvent, NARRATOR};
pub use parser::SceneParser;
pub use sequencer::{EventStatus, SceneSession};
