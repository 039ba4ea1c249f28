//! Caller-supplied scene descriptors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

/// Maximum scenes accepted in one request.
pub const MAX_SCENES: usize = 50;

/// One content scene as described by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct SceneDescriptor {
    /// Scene title, also used as the media lookup / placeholder label.
    #[serde(default)]
    #[validate(length(max = 200))]
    pub name: String,
    /// Free-form facts the narration must mention.
    #[serde(default)]
    #[validate(length(max = 4000))]
    pub details: String,
}

impl SceneDescriptor {
    pub fn new(name: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            details: details.into(),
        }
    }

    /// Details too short to be worth weaving into the script verbatim.
    pub fn has_meaningful_details(&self) -> bool {
        self.details.trim().chars().count() >= 5
    }
}

#[derive(Debug, Error)]
pub enum SceneListError {
    #[error("scenes is not a valid JSON list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("too many scenes: {count} (max {max})")]
    TooMany { count: usize, max: usize },

    #[error("scene {index} is invalid: {message}")]
    Invalid { index: usize, message: String },
}

/// Parse and validate the JSON-encoded scene list sent by the caller.
pub fn parse_scene_list(raw: &str) -> Result<Vec<SceneDescriptor>, SceneListError> {
    let scenes: Vec<SceneDescriptor> = serde_json::from_str(raw)?;

    if scenes.len() > MAX_SCENES {
        return Err(SceneListError::TooMany {
            count: scenes.len(),
            max: MAX_SCENES,
        });
    }

    for (index, scene) in scenes.iter().enumerate() {
        scene.validate().map_err(|e| SceneListError::Invalid {
            index,
            message: e.to_string(),
        })?;
    }

    Ok(scenes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_list() {
        let scenes = parse_scene_list(
            r#"[{"name":"Inception","details":"2010, Nolan"},{"name":"Heat"}]"#,
        )
        .unwrap();
        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[1].details, "");
        assert!(scenes[0].has_meaningful_details());
        assert!(!scenes[1].has_meaningful_details());
    }

    #[test]
    fn test_parse_scene_list_rejects_garbage() {
        assert!(matches!(
            parse_scene_list("not json"),
            Err(SceneListError::Json(_))
        ));
    }

    #[test]
    fn test_parse_scene_list_limit() {
        let raw = serde_json::to_string(&vec![SceneDescriptor::new("x", ""); MAX_SCENES + 1]).unwrap();
        assert!(matches!(
            parse_scene_list(&raw),
            Err(SceneListError::TooMany { .. })
        ));
    }
}
