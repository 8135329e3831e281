/// Reserved speaker name for narration lines; never defined in `characters.md`.
pub const NARRATOR: &str = "Narrator";

/// Deterministic event identifier: `"{scene_id}:{seq}"`, seq 1-based in scene
/// order. Shared between parsing and playback so both sides agree on ids.
pub fn event_id(scene_id: &str, seq: usize) -> String {
    format!("{}:{}", scene_id, seq)
}

/// A character defined in the story content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    /// Display name, as authored (e.g. "Stella")
    pub name: String,

    /// Voice preset used by the frontend for speech synthesis (e.g. "sage")
    pub voice: String,

    /// Personality traits, in authored order
    pub personality: Vec<String>,

    /// Instruction describing who the character is and how they speak
    pub prompt: String,
}

/// Who delivers a story event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Speaker {
    /// The storyteller voice; requires no character definition
    Narrator,
    /// A character referenced by name; must exist in `characters.md`
    Character(String),
}

impl Speaker {
    /// The speaker's display name.
    pub fn name(&self) -> &str {
        match self {
            Speaker::Narrator => NARRATOR,
            Speaker::Character(name) => name,
        }
    }
}

impl From<&str> for Speaker {
    fn from(name: &str) -> Self {
        if name == NARRATOR {
            Speaker::Narrator
        } else {
            Speaker::Character(name.to_string())
        }
    }
}

/// One spoken line within a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryEvent {
    /// Deterministic identifier, `"{scene_id}:{n}"` with n 1-based in scene order
    pub id: String,

    /// Who speaks the line
    pub speaker: Speaker,

    /// Optional delivery emotion, as authored in parentheses (e.g. "excited")
    pub emotion: Option<String>,

    /// The line itself
    pub text: String,
}

/// A parsed scene: an ordered sequence of story events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    /// Identifier derived from the file stem (e.g. "rocket_intro");
    /// also names the backdrop asset on the frontend
    pub id: String,

    /// Human-readable title from the scene's heading
    pub title: String,

    /// Events in playback order
    pub events: Vec<StoryEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_from_name() {
        assert_eq!(Speaker::from(NARRATOR), Speaker::Narrator);
        assert_eq!(
            Speaker::from("Stella"),
            Speaker::Character("Stella".to_string())
        );
    }

    #[test]
    fn test_speaker_name_round_trip() {
        assert_eq!(Speaker::Narrator.name(), "Narrator");
        assert_eq!(Speaker::Character("Cosmo".to_string()).name(), "Cosmo");
    }

    #[test]
    fn test_event_id_format() {
        assert_eq!(event_id("rocket_intro", 1), "rocket_intro:1");
        assert_eq!(event_id("garden", 12), "garden:12");
    }
}
