//! Normalized narration script.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::slot::SlotId;

/// Generic line used when the model returned fewer items than scenes.
pub const NARRATION_FILLER: &str = "And here is another pick that is well worth your time.";

/// Per-segment narration, one plain string per slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NarrationSet {
    pub intro: String,
    /// Exactly one entry per scene.
    pub items: Vec<String>,
    pub outro: String,
    /// Model output beyond the scene count. Kept for diagnostics, never rendered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub surplus: Vec<String>,
    /// How many items were filled with [`NARRATION_FILLER`], missing or
    /// undecodable alike.
    #[serde(default)]
    pub padded: usize,
}

impl NarrationSet {
    /// Build a set whose `items` length equals `scene_count`.
    ///
    /// Missing items and items given as `None` are filled with the filler and
    /// counted in `padded`; extra items move to `surplus`.
    pub fn normalized<I: Into<Option<String>>>(
        intro: impl Into<String>,
        items: Vec<I>,
        outro: impl Into<String>,
        scene_count: usize,
    ) -> Self {
        let mut items: Vec<Option<String>> = items.into_iter().map(Into::into).collect();
        let surplus = if items.len() > scene_count {
            items.split_off(scene_count).into_iter().flatten().collect()
        } else {
            Vec::new()
        };

        items.resize(scene_count, None);
        let padded = items.iter().filter(|item| item.is_none()).count();
        let items = items
            .into_iter()
            .map(|item| item.unwrap_or_else(|| NARRATION_FILLER.to_string()))
            .collect();

        Self {
            intro: intro.into(),
            items,
            outro: outro.into(),
            surplus,
            padded,
        }
    }

    /// Narration for a slot, `None` for a scene index outside the set.
    pub fn for_slot(&self, slot: SlotId) -> Option<&str> {
        match slot {
            SlotId::Intro => Some(&self.intro),
            SlotId::Outro => Some(&self.outro),
            SlotId::Scene(i) => self.items.get(i).map(String::as_str),
        }
    }

    pub fn scene_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_pads_short_item_list() {
        let set = NarrationSet::normalized("hi", strings(&["one"]), "bye", 3);
        assert_eq!(set.items.len(), 3);
        assert_eq!(set.items[0], "one");
        assert_eq!(set.items[1], NARRATION_FILLER);
        assert_eq!(set.items[2], NARRATION_FILLER);
        assert_eq!(set.padded, 2);
        assert!(set.surplus.is_empty());
    }

    #[test]
    fn test_blank_items_count_as_padded() {
        let set = NarrationSet::normalized(
            "hi",
            vec![Some("one".to_string()), None],
            "bye",
            3,
        );
        assert_eq!(set.items, vec!["one", NARRATION_FILLER, NARRATION_FILLER]);
        assert_eq!(set.padded, 2);
    }

    #[test]
    fn test_keeps_surplus_aside() {
        let set = NarrationSet::normalized("hi", strings(&["a", "b", "c"]), "bye", 2);
        assert_eq!(set.items, strings(&["a", "b"]));
        assert_eq!(set.surplus, strings(&["c"]));
        assert_eq!(set.padded, 0);
    }

    #[test]
    fn test_item_count_matches_for_all_lengths() {
        for scenes in 0..6 {
            for returned in 0..8 {
                let items: Vec<String> = (0..returned).map(|i| i.to_string()).collect();
                let set = NarrationSet::normalized("", items, "", scenes);
                assert_eq!(set.items.len(), scenes);
                assert_eq!(set.items.len() + set.surplus.len(), scenes.max(returned));
            }
        }
    }

    #[test]
    fn test_for_slot() {
        let set = NarrationSet::normalized("hi", strings(&["a"]), "bye", 1);
        assert_eq!(set.for_slot(SlotId::Intro), Some("hi"));
        assert_eq!(set.for_slot(SlotId::Scene(0)), Some("a"));
        assert_eq!(set.for_slot(SlotId::Scene(1)), None);
        assert_eq!(set.for_slot(SlotId::Outro), Some("bye"));
    }
}
