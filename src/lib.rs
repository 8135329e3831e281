//! taleweaver - an interactive bedtime story server.
//!
//! Story content is authored as markdown (a character roster plus one file
//! per scene), loaded and validated at startup, and played back over a small
//! HTTP API: clients create a session for a scene and then step through its
//! events one at a time, completing or interrupting narration as the
//! listener drifts off.

pub mod config;
pub mod cors;
pub mod error;
pub mod jobs;
pub mod routes;
pub mod server;
pub mod state;
pub mod story;
