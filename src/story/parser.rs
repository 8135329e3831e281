//! Markdown parsing for authored story content.
//!
//! Two document kinds are understood:
//!
//! `characters.md` holds one `##` section per character, with list entries
//! for the character's fields:
//!
//! ```markdown
//! # Characters
//!
//! ## Stella
//! - Voice: sage
//! - Personality: curious, brave, kind
//! - Prompt: A young astronaut who loves the night sky.
//! ```
//!
//! Scene files carry a `#` title followed by one paragraph per spoken line,
//! each of the form `Speaker: text` or `Speaker (emotion): text`. The speaker
//! `Narrator` is reserved and needs no character definition:
//!
//! ```markdown
//! # Rocket to the Stars
//!
//! Narrator: Tonight we are going on a very special adventure.
//!
//! Stella (excited): Is that a real rocket?
//! ```
//!
//! Parsing is strict: unknown fields, malformed entries, non-dialogue
//! paragraphs, and empty documents are errors, so bad content fails at
//! startup instead of serving half a story. Inline emphasis is flattened to
//! plain text; HTML (including comments) is ignored.

use crate::error::{AppError, AppResult};
use crate::story::models::{event_id, Character, Scene, Speaker, StoryEvent};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use regex::Regex;

/// Parser for story content documents.
pub struct SceneParser {
    dialogue_re: Regex,
    scene_id_re: Regex,
}

/// Accumulates one `##` section of `characters.md` until the next section
/// starts or the document ends.
struct CharacterDraft {
    name: String,
    voice: Option<String>,
    personality: Vec<String>,
    prompt: Option<String>,
}

impl CharacterDraft {
    fn new(name: String) -> Self {
        Self {
            name,
            voice: None,
            personality: Vec::new(),
            prompt: None,
        }
    }

    fn finish(self) -> AppResult<Character> {
        let voice = self.voice.ok_or_else(|| {
            AppError::InvalidContent(format!(
                "characters.md: missing 'Voice' for character '{}'",
                self.name
            ))
        })?;
        let prompt = self.prompt.ok_or_else(|| {
            AppError::InvalidContent(format!(
                "characters.md: missing 'Prompt' for character '{}'",
                self.name
            ))
        })?;

        Ok(Character {
            name: self.name,
            voice,
            personality: self.personality,
            prompt,
        })
    }
}

impl SceneParser {
    /// Create a parser with its line syntax compiled.
    pub fn new() -> AppResult<Self> {
        let dialogue_re = Regex::new(r"^([A-Za-z][A-Za-z0-9' -]*?)\s*(?:\(([^()]+)\)\s*)?:\s*(.+)$")
            .map_err(|e| AppError::Internal(format!("Invalid regex pattern: {}", e)))?;
        let scene_id_re = Regex::new(r"^[a-z0-9][a-z0-9_-]*$")
            .map_err(|e| AppError::Internal(format!("Invalid regex pattern: {}", e)))?;

        Ok(Self {
            dialogue_re,
            scene_id_re,
        })
    }

    /// Parse `characters.md` into the characters it defines.
    pub fn parse_characters(&self, input: &str) -> AppResult<Vec<Character>> {
        let mut characters: Vec<Character> = Vec::new();
        let mut current: Option<CharacterDraft> = None;
        let mut buf = String::new();
        let mut heading: Option<HeadingLevel> = None;
        let mut in_item = false;

        for event in Parser::new(input) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => match level {
                    HeadingLevel::H1 | HeadingLevel::H2 => {
                        if level == HeadingLevel::H2 {
                            if let Some(draft) = current.take() {
                                push_character(&mut characters, draft.finish()?)?;
                            }
                        }
                        heading = Some(level);
                        buf.clear();
                    }
                    _ => {
                        return Err(AppError::InvalidContent(
                            "characters.md: only '#' and '##' headings are allowed".to_string(),
                        ));
                    }
                },
                Event::End(TagEnd::Heading(_)) => {
                    let text = buf.trim().to_string();
                    if heading == Some(HeadingLevel::H2) {
                        if text.is_empty() {
                            return Err(AppError::InvalidContent(
                                "characters.md: character section has an empty name".to_string(),
                            ));
                        }
                        current = Some(CharacterDraft::new(text));
                    }
                    heading = None;
                }
                Event::Start(Tag::Item) => {
                    in_item = true;
                    buf.clear();
                }
                Event::End(TagEnd::Item) => {
                    in_item = false;
                    let line = buf.trim().to_string();
                    let draft = current.as_mut().ok_or_else(|| {
                        AppError::InvalidContent(format!(
                            "characters.md: entry '{}' appears before any '##' character section",
                            line
                        ))
                    })?;
                    apply_character_field(draft, &line)?;
                }
                Event::Start(Tag::List(_)) | Event::End(TagEnd::List(_)) => {}
                Event::Start(Tag::Paragraph) if in_item => {}
                Event::End(TagEnd::Paragraph) => {}
                Event::Start(Tag::Paragraph) => {
                    return Err(AppError::InvalidContent(
                        "characters.md: free paragraphs are not allowed; use '- Field: value' entries"
                            .to_string(),
                    ));
                }
                Event::Text(t) | Event::Code(t) => {
                    if heading.is_some() || in_item {
                        buf.push_str(&t);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if heading.is_some() || in_item {
                        buf.push(' ');
                    }
                }
                Event::Start(Tag::Emphasis)
                | Event::End(TagEnd::Emphasis)
                | Event::Start(Tag::Strong)
                | Event::End(TagEnd::Strong) => {}
                Event::Start(Tag::HtmlBlock)
                | Event::End(TagEnd::HtmlBlock)
                | Event::Html(_)
                | Event::InlineHtml(_) => {}
                Event::Rule => {
                    return Err(AppError::InvalidContent(
                        "characters.md: thematic breaks are not allowed".to_string(),
                    ));
                }
                Event::Start(tag) => {
                    return Err(AppError::InvalidContent(format!(
                        "characters.md: unsupported markdown element {:?}",
                        tag
                    )));
                }
                _ => {}
            }
        }

        if let Some(draft) = current.take() {
            push_character(&mut characters, draft.finish()?)?;
        }

        if characters.is_empty() {
            return Err(AppError::InvalidContent(
                "characters.md: no character sections found".to_string(),
            ));
        }

        Ok(characters)
    }

    /// Parse one scene document. The id comes from the file stem and doubles
    /// as the frontend's backdrop asset name, so it is kept filename-safe.
    pub fn parse_scene(&self, id: &str, input: &str) -> AppResult<Scene> {
        if !self.scene_id_re.is_match(id) {
            return Err(AppError::InvalidContent(format!(
                "invalid scene id '{}': expected lowercase letters, digits, '-' or '_'",
                id
            )));
        }

        let mut title: Option<String> = None;
        let mut events: Vec<StoryEvent> = Vec::new();
        let mut buf = String::new();
        let mut in_heading = false;
        let mut in_paragraph = false;

        for event in Parser::new(input) {
            match event {
                Event::Start(Tag::Heading {
                    level: HeadingLevel::H1,
                    ..
                }) if title.is_none() => {
                    in_heading = true;
                    buf.clear();
                }
                Event::Start(Tag::Heading { .. }) => {
                    return Err(AppError::InvalidContent(format!(
                        "scene '{}': expected a single '#' title heading",
                        id
                    )));
                }
                Event::End(TagEnd::Heading(_)) if in_heading => {
                    in_heading = false;
                    let text = buf.trim();
                    if text.is_empty() {
                        return Err(AppError::InvalidContent(format!(
                            "scene '{}': title heading is empty",
                            id
                        )));
                    }
                    title = Some(text.to_string());
                }
                Event::Start(Tag::Paragraph) => {
                    in_paragraph = true;
                    buf.clear();
                }
                Event::End(TagEnd::Paragraph) if in_paragraph => {
                    in_paragraph = false;
                    let line = buf.trim().to_string();
                    let event = self.parse_dialogue_line(id, events.len() + 1, &line)?;
                    events.push(event);
                }
                Event::Text(t) | Event::Code(t) => {
                    if in_heading || in_paragraph {
                        buf.push_str(&t);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if in_heading || in_paragraph {
                        buf.push(' ');
                    }
                }
                Event::Start(Tag::Emphasis)
                | Event::End(TagEnd::Emphasis)
                | Event::Start(Tag::Strong)
                | Event::End(TagEnd::Strong) => {}
                Event::Start(Tag::HtmlBlock)
                | Event::End(TagEnd::HtmlBlock)
                | Event::Html(_)
                | Event::InlineHtml(_) => {}
                Event::Rule => {
                    return Err(AppError::InvalidContent(format!(
                        "scene '{}': thematic breaks are not allowed",
                        id
                    )));
                }
                Event::Start(tag) => {
                    return Err(AppError::InvalidContent(format!(
                        "scene '{}': unsupported markdown element {:?}",
                        id, tag
                    )));
                }
                _ => {}
            }
        }

        let title = title.ok_or_else(|| {
            AppError::InvalidContent(format!("scene '{}': missing '#' title heading", id))
        })?;

        if events.is_empty() {
            return Err(AppError::InvalidContent(format!(
                "scene '{}': no dialogue lines",
                id
            )));
        }

        Ok(Scene {
            id: id.to_string(),
            title,
            events,
        })
    }

    /// Parse one `Speaker (emotion): text` paragraph into a story event.
    fn parse_dialogue_line(&self, scene_id: &str, seq: usize, line: &str) -> AppResult<StoryEvent> {
        let captures = self.dialogue_re.captures(line).ok_or_else(|| {
            AppError::InvalidContent(format!(
                "scene '{}': paragraph {} is not a dialogue line: \"{}\"",
                scene_id, seq, line
            ))
        })?;

        let speaker = Speaker::from(captures.get(1).map_or("", |m| m.as_str()).trim());
        let emotion = captures
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|e| !e.is_empty());
        let text = captures.get(3).map_or("", |m| m.as_str()).trim().to_string();

        Ok(StoryEvent {
            id: event_id(scene_id, seq),
            speaker,
            emotion,
            text,
        })
    }
}

/// Append a finished character, rejecting duplicate names.
fn push_character(characters: &mut Vec<Character>, character: Character) -> AppResult<()> {
    if characters.iter().any(|c| c.name == character.name) {
        return Err(AppError::InvalidContent(format!(
            "characters.md: duplicate character '{}'",
            character.name
        )));
    }
    characters.push(character);
    Ok(())
}

/// Apply one `Field: value` list entry to the current character draft.
fn apply_character_field(draft: &mut CharacterDraft, line: &str) -> AppResult<()> {
    let (key, value) = line.split_once(':').ok_or_else(|| {
        AppError::InvalidContent(format!(
            "characters.md: malformed entry '{}' for character '{}' (expected 'Field: value')",
            line, draft.name
        ))
    })?;

    let key = key.trim();
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidContent(format!(
            "characters.md: empty value for '{}' of character '{}'",
            key, draft.name
        )));
    }

    match key {
        "Voice" => {
            if draft.voice.is_some() {
                return Err(AppError::InvalidContent(format!(
                    "characters.md: duplicate 'Voice' for character '{}'",
                    draft.name
                )));
            }
            draft.voice = Some(value.to_string());
        }
        "Personality" => {
            if !draft.personality.is_empty() {
                return Err(AppError::InvalidContent(format!(
                    "characters.md: duplicate 'Personality' for character '{}'",
                    draft.name
                )));
            }
            draft.personality = value
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
        }
        "Prompt" => {
            if draft.prompt.is_some() {
                return Err(AppError::InvalidContent(format!(
                    "characters.md: duplicate 'Prompt' for character '{}'",
                    draft.name
                )));
            }
            draft.prompt = Some(value.to_string());
        }
        other => {
            return Err(AppError::InvalidContent(format!(
                "characters.md: unknown field '{}' for character '{}'",
                other, draft.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn parser() -> SceneParser {
        SceneParser::new().unwrap()
    }

    #[test]
    fn test_parse_characters() {
        let characters = parser().parse_characters(CHARACTERS_MD).unwrap();

        assert_eq!(characters.len(), 2);
        assert_eq!(characters[0].name, "Stella");
        assert_eq!(characters[0].voice, "sage");
        assert_eq!(characters[0].personality, vec!["curious", "brave", "kind"]);
        assert_eq!(
            characters[0].prompt,
            "A young astronaut who loves the night sky."
        );
        assert_eq!(characters[1].name, "Cosmo");
        assert!(characters[1].personality.is_empty());
    }

    #[test]
    fn test_parse_characters_missing_voice() {
        let input = "## Stella\n- Prompt: An astronaut.\n";
        let err = parser().parse_characters(input).unwrap_err();
        assert!(err.to_string().contains("missing 'Voice'"));
        assert!(err.to_string().contains("Stella"));
    }

    #[test]
    fn test_parse_characters_unknown_field() {
        let input = "## Stella\n- Voice: sage\n- Prompt: An astronaut.\n- Age: 9\n";
        let err = parser().parse_characters(input).unwrap_err();
        assert!(err.to_string().contains("unknown field 'Age'"));
    }

    #[test]
    fn test_parse_characters_duplicate_name() {
        let input = "\
## Stella
- Voice: sage
- Prompt: An astronaut.

## Stella
- Voice: coral
- Prompt: Another astronaut.
";
        let err = parser().parse_characters(input).unwrap_err();
        assert!(err.to_string().contains("duplicate character 'Stella'"));
    }

    #[test]
    fn test_parse_characters_entry_before_section() {
        let input = "# Characters\n- Voice: sage\n";
        let err = parser().parse_characters(input).unwrap_err();
        assert!(err.to_string().contains("before any '##' character section"));
    }

    #[test]
    fn test_parse_characters_empty_document() {
        let err = parser().parse_characters("# Characters\n").unwrap_err();
        assert!(err.to_string().contains("no character sections"));
    }

    #[test]
    fn test_parse_characters_rejects_thematic_break() {
        let input = "## Stella\n- Voice: sage\n- Prompt: An astronaut.\n\n---\n";
        let err = parser().parse_characters(input).unwrap_err();
        assert!(err.to_string().contains("thematic breaks"));
    }

    #[test]
    fn test_parse_scene() {
        let input = "\
# Rocket to the Stars

Narrator: Tonight we are going on a very special adventure.

Stella (excited): Is that a real rocket?

Narrator: It certainly is!
";
        let scene = parser().parse_scene("rocket_intro", input).unwrap();

        assert_eq!(scene.id, "rocket_intro");
        assert_eq!(scene.title, "Rocket to the Stars");
        assert_eq!(scene.events.len(), 3);

        assert_eq!(scene.events[0].id, "rocket_intro:1");
        assert_eq!(scene.events[0].speaker, Speaker::Narrator);
        assert_eq!(scene.events[0].emotion, None);

        assert_eq!(scene.events[1].id, "rocket_intro:2");
        assert_eq!(
            scene.events[1].speaker,
            Speaker::Character("Stella".to_string())
        );
        assert_eq!(scene.events[1].emotion.as_deref(), Some("excited"));
        assert_eq!(scene.events[1].text, "Is that a real rocket?");
    }

    #[test]
    fn test_parse_scene_multi_word_speaker() {
        let input = "# Launch\n\nMission Control (calm): You are go for launch.\n";
        let scene = parser().parse_scene("launch", input).unwrap();
        assert_eq!(
            scene.events[0].speaker,
            Speaker::Character("Mission Control".to_string())
        );
        assert_eq!(scene.events[0].emotion.as_deref(), Some("calm"));
    }

    #[test]
    fn test_parse_scene_joins_soft_breaks() {
        let input = "# Launch\n\nNarrator: The countdown began\nand everyone held their breath.\n";
        let scene = parser().parse_scene("launch", input).unwrap();
        assert_eq!(
            scene.events[0].text,
            "The countdown began and everyone held their breath."
        );
    }

    #[test]
    fn test_parse_scene_flattens_emphasis() {
        let input = "# Launch\n\nNarrator: It was a *very* big rocket.\n";
        let scene = parser().parse_scene("launch", input).unwrap();
        assert_eq!(scene.events[0].text, "It was a very big rocket.");
    }

    #[test]
    fn test_parse_scene_colon_inside_text() {
        let input = "# Launch\n\nNarrator: She whispered: three, two, one.\n";
        let scene = parser().parse_scene("launch", input).unwrap();
        assert_eq!(scene.events[0].speaker, Speaker::Narrator);
        assert_eq!(scene.events[0].text, "She whispered: three, two, one.");
    }

    #[test]
    fn test_parse_scene_rejects_non_dialogue_paragraph() {
        let input = "# Launch\n\nJust some prose without a speaker\n";
        let err = parser().parse_scene("launch", input).unwrap_err();
        assert!(err.to_string().contains("not a dialogue line"));
    }

    #[test]
    fn test_parse_scene_rejects_extra_heading() {
        let input = "# Launch\n\n## Part two\n\nNarrator: Hello.\n";
        let err = parser().parse_scene("launch", input).unwrap_err();
        assert!(err.to_string().contains("single '#' title"));
    }

    #[test]
    fn test_parse_scene_rejects_thematic_break() {
        let input = "# Launch\n\nNarrator: Three.\n\n---\n\nNarrator: Two.\n";
        let err = parser().parse_scene("launch", input).unwrap_err();
        assert!(err.to_string().contains("thematic breaks"));
    }

    #[test]
    fn test_parse_scene_missing_title() {
        let input = "Narrator: Hello.\n";
        let err = parser().parse_scene("launch", input).unwrap_err();
        assert!(err.to_string().contains("missing '#' title"));
    }

    #[test]
    fn test_parse_scene_empty() {
        let input = "# Launch\n";
        let err = parser().parse_scene("launch", input).unwrap_err();
        assert!(err.to_string().contains("no dialogue lines"));
    }

    #[test]
    fn test_parse_scene_invalid_id() {
        let err = parser().parse_scene("Rocket Intro", "# T\n\nNarrator: Hi.\n");
        assert!(err.unwrap_err().to_string().contains("invalid scene id"));
    }
}
