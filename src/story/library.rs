//! Story content loading and lookup.
//!
//! The library reads a content directory once at startup:
//!
//! ```text
//! content/
//!   characters.md
//!   scenes/
//!     scene_rocket_intro.md
//!     moonlit_garden.md
//! ```
//!
//! Scene ids come from file stems, with an optional `scene_` prefix stripped
//! (so `scene_rocket_intro.md` becomes `rocket_intro`, matching the asset
//! naming the frontend uses for backdrops). Any parse failure, unknown
//! speaker, or duplicate id aborts the load, and with it server startup.

use crate::error::{AppError, AppResult};
use crate::story::models::{Character, Scene, Speaker};
use crate::story::parser::SceneParser;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// Immutable, validated story content shared by all handlers.
#[derive(Debug)]
pub struct StoryLibrary {
    characters: Vec<Character>,
    scenes: BTreeMap<String, Scene>,
}

impl StoryLibrary {
    /// Load and validate all story content under `content_dir`.
    pub fn load(content_dir: &Path) -> AppResult<Self> {
        let parser = SceneParser::new()?;

        let characters_path = content_dir.join("characters.md");
        let characters_text = std::fs::read_to_string(&characters_path).map_err(|e| {
            AppError::InvalidContent(format!(
                "failed to read {}: {}",
                characters_path.display(),
                e
            ))
        })?;
        let characters = parser.parse_characters(&characters_text)?;

        let scenes_dir = content_dir.join("scenes");
        let entries = std::fs::read_dir(&scenes_dir).map_err(|e| {
            AppError::InvalidContent(format!(
                "failed to read scene directory {}: {}",
                scenes_dir.display(),
                e
            ))
        })?;

        let mut scene_files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                scene_files.push(path);
            }
        }
        scene_files.sort();

        let mut scenes = BTreeMap::new();
        for path in &scene_files {
            let stem = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or_else(|| {
                    AppError::InvalidContent(format!("invalid scene file name: {}", path.display()))
                })?;
            let id = stem.strip_prefix("scene_").unwrap_or(stem);

            let text = std::fs::read_to_string(path).map_err(|e| {
                AppError::InvalidContent(format!("failed to read {}: {}", path.display(), e))
            })?;
            let scene = parser.parse_scene(id, &text)?;

            if scenes.insert(scene.id.clone(), scene).is_some() {
                return Err(AppError::InvalidContent(format!(
                    "duplicate scene id '{}' (from {})",
                    id,
                    path.display()
                )));
            }
        }

        if scenes.is_empty() {
            return Err(AppError::InvalidContent(format!(
                "no scene files found in {}",
                scenes_dir.display()
            )));
        }

        let library = Self { characters, scenes };
        library.validate_speakers()?;

        info!(
            "Loaded {} scene(s) and {} character(s) from {}",
            library.scenes.len(),
            library.characters.len(),
            content_dir.display()
        );

        Ok(library)
    }

    /// Every non-narrator speaker must be a defined character.
    fn validate_speakers(&self) -> AppResult<()> {
        for scene in self.scenes.values() {
            for event in &scene.events {
                if let Speaker::Character(name) = &event.speaker {
                    if self.character(name).is_none() {
                        return Err(AppError::InvalidContent(format!(
                            "scene '{}': unknown character '{}' in event {} (define it in characters.md)",
                            scene.id, name, event.id
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// All characters, in authored order.
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Look up a character by exact name.
    pub fn character(&self, name: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.name == name)
    }

    /// All scenes, ordered by id.
    pub fn scenes(&self) -> Vec<&Scene> {
        self.scenes.values().collect()
    }

    /// Look up a scene by id.
    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    /// Total number of story events across all scenes.
    pub fn event_count(&self) -> usize {
        self.scenes.values().map(|s| s.events.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CHARACTERS_MD: &str = "\
# Characters

## Stella
- Voice: sage
- Personality: curious, brave, kind
- Prompt: A young astronaut who loves the night sky.

## Cosmo
- Voice: coral
- Prompt: A cheerful robot co-pilot.
";

    const ROCKET_MD: &str = "\
# Rocket to the Stars

Narrator: Tonight we are going on a very special adventure.

Stella (excited): Is that a real rocket?
";

    const GARDEN_MD: &str = "\
# The Moonlit Garden

Narrator: The garden glowed silver under the moon.

Cosmo (curious): What makes the flowers shine?
";

    fn write_content(dir: &Path, scenes: &[(&str, &str)]) {
        fs::write(dir.join("characters.md"), CHARACTERS_MD).unwrap();
        fs::create_dir(dir.join("scenes")).unwrap();
        for (file, text) in scenes {
            fs::write(dir.join("scenes").join(file), text).unwrap();
        }
    }

    #[test]
    fn test_load_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_content(
            dir.path(),
            &[
                ("scene_rocket_intro.md", ROCKET_MD),
                ("moonlit_garden.md", GARDEN_MD),
            ],
        );

        let library = StoryLibrary::load(dir.path()).unwrap();

        assert_eq!(library.character_count(), 2);
        assert_eq!(library.scene_count(), 2);
        assert_eq!(library.event_count(), 4);

        // scene_ prefix is stripped from file stems
        let rocket = library.scene("rocket_intro").unwrap();
        assert_eq!(rocket.title, "Rocket to the Stars");

        // listing is ordered by id
        let ids: Vec<&str> = library.scenes().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["moonlit_garden", "rocket_intro"]);

        assert_eq!(library.character("Stella").unwrap().voice, "sage");
        assert!(library.character("stella").is_none());
    }

    #[test]
    fn test_load_ignores_non_markdown_files() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path(), &[("scene_rocket_intro.md", ROCKET_MD)]);
        fs::write(dir.path().join("scenes").join("notes.txt"), "scratch").unwrap();

        let library = StoryLibrary::load(dir.path()).unwrap();
        assert_eq!(library.scene_count(), 1);
    }

    #[test]
    fn test_load_missing_characters_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("scenes")).unwrap();
        fs::write(dir.path().join("scenes").join("a.md"), ROCKET_MD).unwrap();

        let err = StoryLibrary::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("characters.md"));
    }

    #[test]
    fn test_load_missing_scenes_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("characters.md"), CHARACTERS_MD).unwrap();

        let err = StoryLibrary::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("scene directory"));
    }

    #[test]
    fn test_load_empty_scenes_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path(), &[]);

        let err = StoryLibrary::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("no scene files"));
    }

    #[test]
    fn test_load_unknown_speaker() {
        let dir = tempfile::tempdir().unwrap();
        write_content(
            dir.path(),
            &[("garden.md", "# Garden\n\nLuna (sleepy): Who turned on the moon?\n")],
        );

        let err = StoryLibrary::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("unknown character 'Luna'"));
        assert!(err.to_string().contains("garden"));
    }

    #[test]
    fn test_load_duplicate_scene_id() {
        let dir = tempfile::tempdir().unwrap();
        write_content(
            dir.path(),
            &[("garden.md", GARDEN_MD), ("scene_garden.md", GARDEN_MD)],
        );

        let err = StoryLibrary::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate scene id 'garden'"));
    }

    #[test]
    fn test_load_malformed_scene_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_content(dir.path(), &[("garden.md", "# Garden\n\nNot a dialogue.\n")]);

        assert!(StoryLibrary::load(dir.path()).is_err());
    }
}
