//! Narration script generation and repair.

use std::fmt::Write as _;
use std::sync::Arc;

use reel_models::{Category, LengthMode, NarrationSet, SceneDescriptor, NARRATION_FILLER};
use reel_providers::TextGenerator;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics;

/// Object keys that may carry the spoken line, in order of preference.
const SPOKEN_KEYS: &[&str] = &["script", "text", "narration", "spoken_text", "details"];
const TITLE_KEYS: &[&str] = &["title", "name"];

/// Produces a [`NarrationSet`] matching the scene count from a text service.
pub struct ScriptNormalizer {
    text: Arc<dyn TextGenerator>,
}

impl ScriptNormalizer {
    pub fn new(text: Arc<dyn TextGenerator>) -> Self {
        Self { text }
    }

    /// Ask the text service for a script and normalize it.
    ///
    /// Fails only when the service fails or its answer cannot be parsed;
    /// count mismatches are repaired.
    pub async fn generate(
        &self,
        topic: &str,
        category: Category,
        mode: LengthMode,
        scenes: &[SceneDescriptor],
    ) -> PipelineResult<NarrationSet> {
        let prompt = build_prompt(topic, category, mode, scenes);
        debug!(provider = self.text.name(), scenes = scenes.len(), "Generating script");

        let raw = self
            .text
            .complete_json(&prompt)
            .await
            .map_err(|e| PipelineError::script_generation(e.to_string(), None))?;

        let narration = parse_narration(&raw, scenes.len())?;
        if narration.padded > 0 {
            warn!(
                padded = narration.padded,
                scenes = scenes.len(),
                "Script returned too few items, padded with filler"
            );
        }
        if !narration.surplus.is_empty() {
            debug!(surplus = narration.surplus.len(), "Script returned extra items");
        }
        metrics::record_padded_items(narration.padded);

        Ok(narration)
    }
}

struct Persona {
    role: &'static str,
    tone: &'static str,
}

fn persona(category: Category) -> Persona {
    match category {
        Category::Movie => Persona {
            role: "You are an enthusiastic movie critic.",
            tone: "passionate, dramatic and opinionated",
        },
        Category::Product => Persona {
            role: "You are a persuasive sales copywriter.",
            tone: "excited, convincing and focused on value",
        },
        Category::General => Persona {
            role: "You are a professional video scriptwriter.",
            tone: "engaging and clear",
        },
    }
}

fn length_constraint(mode: LengthMode) -> &'static str {
    match mode {
        LengthMode::Short => "Write 2-3 sentences per item and keep the pace fast.",
        LengthMode::Long => "Write one detailed paragraph of 4-5 sentences per item.",
    }
}

/// Build the prompt asking for `{intro, items, outro}` with one item per
/// scene.
pub fn build_prompt(
    topic: &str,
    category: Category,
    mode: LengthMode,
    scenes: &[SceneDescriptor],
) -> String {
    let persona = persona(category);

    let mut items = String::new();
    for (i, scene) in scenes.iter().enumerate() {
        let _ = writeln!(items, "\n--- ITEM {}: {} ---", i + 1, scene.name.trim());
        if scene.has_meaningful_details() {
            let _ = writeln!(
                items,
                "The user provided: '{}'. Work these exact details into the narration.",
                scene.details.trim()
            );
        } else {
            let _ = writeln!(
                items,
                "The user provided no details. Supply concrete facts (year, cast, specs) from your own knowledge."
            );
        }
    }

    format!(
        r#"{role}
Topic: "{topic}"
Tone: {tone}
Length: {length}

Write the spoken narration for a video.

Rules:
1. Any details the user provided must be said.
2. Where the user provided nothing, add real value.
3. Sound natural, not robotic.
4. "items" must contain exactly {count} strings, one per item, in order.

Items:
{items}
Respond with a single JSON object and nothing else:
{{"intro": "A strong hook.", "items": ["Narration for item 1", "..."], "outro": "A strong closing line."}}
"#,
        role = persona.role,
        topic = topic.trim(),
        tone = persona.tone,
        length = length_constraint(mode),
        count = scenes.len(),
        items = items,
    )
}

/// One narration line as a model may return it.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLine {
    Text(String),
    Object(Map<String, Value>),
    Other(Value),
}

impl RawLine {
    /// Reduce to one plain string: spoken text, then title, then `None`.
    fn into_text(self) -> Option<String> {
        match self {
            RawLine::Text(s) => non_blank(s),
            RawLine::Object(map) => first_string(&map, SPOKEN_KEYS)
                .or_else(|| first_string(&map, TITLE_KEYS)),
            RawLine::Other(Value::Number(n)) => Some(n.to_string()),
            RawLine::Other(_) => None,
        }
    }
}

fn first_string(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .filter_map(Value::as_str)
        .find_map(|s| non_blank(s.to_string()))
}

fn non_blank(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.trim().to_string())
    }
}

#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    intro: Option<RawLine>,
    #[serde(default)]
    items: Vec<RawLine>,
    #[serde(default)]
    outro: Option<RawLine>,
}

/// Remove Markdown code-fence markers a provider may wrap JSON in.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// The outermost `{...}` span, for payloads wrapped in prose.
fn outer_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    (end > start).then(|| &s[start..=end])
}

/// Parse a raw completion into a normalized set for `scene_count` scenes.
pub fn parse_narration(raw: &str, scene_count: usize) -> PipelineResult<NarrationSet> {
    let cleaned = strip_code_fences(raw);

    let parsed = serde_json::from_str::<RawScript>(&cleaned).or_else(|first| {
        outer_object(&cleaned)
            .filter(|inner| inner.len() < cleaned.len())
            .ok_or(first)
            .and_then(serde_json::from_str::<RawScript>)
    });

    let script = parsed.map_err(|e| {
        PipelineError::script_generation(
            format!("response is not a narration object: {}", e),
            Some(raw.to_string()),
        )
    })?;

    let line = |l: Option<RawLine>| {
        l.and_then(RawLine::into_text)
            .unwrap_or_else(|| NARRATION_FILLER.to_string())
    };

    let items: Vec<Option<String>> = script.items.into_iter().map(RawLine::into_text).collect();

    Ok(NarrationSet::normalized(
        line(script.intro),
        items,
        line(script.outro),
        scene_count,
    ))
}
