use std::collections::HashSet;

use cartogram_shared::RegionKey;
use serde::Serialize;

use crate::config::{OPACITY_HIGHLIGHT, OPACITY_HIGHLIGHT_DIM, OPACITY_SELECT};

/// Land styling for one region, as handed to the render sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionOpacity {
    pub key: RegionKey,
    pub opacity: f32,
    /// `false` when pointer events must not reach the region.
    pub interactive: bool,
}

/// Highlight/selection state and the land opacity it implies.
#[derive(Debug, Clone)]
pub struct LandOpacity {
    highlighted: HashSet<RegionKey>,
    selected: HashSet<RegionKey>,
    regular: f32,
    select_dim: f32,
}

impl LandOpacity {
    pub fn new(regular: f32, select_dim: f32) -> Self {
        Self {
            highlighted: HashSet::new(),
            selected: HashSet::new(),
            regular,
            select_dim,
        }
    }

    pub fn set_highlighted(&mut self, keys: impl IntoIterator<Item = RegionKey>) {
        self.highlighted = keys.into_iter().collect();
    }

    pub fn set_selected(&mut self, keys: impl IntoIterator<Item = RegionKey>) {
        self.selected = keys.into_iter().collect();
    }

    pub fn set_levels(&mut self, regular: f32, select_dim: f32) {
        self.regular = regular;
        self.select_dim = select_dim;
    }

    pub fn opacity_of(&self, key: &str) -> f32 {
        let some_highlighted = !self.highlighted.is_empty();
        if some_highlighted && self.highlighted.contains(key) {
            return OPACITY_HIGHLIGHT;
        }
        if !self.selected.is_empty() {
            return if self.selected.contains(key) {
                OPACITY_SELECT
            } else {
                self.select_dim
            };
        }
        if some_highlighted {
            return OPACITY_HIGHLIGHT_DIM;
        }
        self.regular
    }

    /// Whether pointer interaction should reach the region. Fully dimmed
    /// non-selected regions stop receiving it.
    pub fn interactive(&self, key: &str) -> bool {
        let hidden_unselected = !self.selected.is_empty() && self.select_dim < 0.01;
        !hidden_unselected || self.selected.contains(key)
    }

    pub fn levels<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Vec<RegionOpacity> {
        keys.into_iter()
            .map(|key| RegionOpacity {
                key: key.to_string(),
                opacity: self.opacity_of(key),
                interactive: self.interactive(key),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{LandOpacity, RegionOpacity};

    fn keys(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_interaction_uses_regular_opacity() {
        let opacity = LandOpacity::new(0.9, 0.4);
        assert_eq!(opacity.opacity_of("A"), 0.9);
        assert!(opacity.interactive("A"));
    }

    #[test]
    fn highlight_dims_everything_else() {
        let mut opacity = LandOpacity::new(1.0, 0.4);
        opacity.set_highlighted(keys(&["A"]));
        assert_eq!(opacity.opacity_of("A"), 0.8);
        assert_eq!(opacity.opacity_of("B"), 0.3);
    }

    #[test]
    fn selection_wins_over_highlight_dimming() {
        let mut opacity = LandOpacity::new(1.0, 0.4);
        opacity.set_highlighted(keys(&["A"]));
        opacity.set_selected(keys(&["B"]));
        assert_eq!(opacity.opacity_of("A"), 0.8);
        assert_eq!(opacity.opacity_of("B"), 1.0);
        assert_eq!(opacity.opacity_of("C"), 0.4);
    }

    #[test]
    fn fully_dimmed_selection_blocks_interaction() {
        let mut opacity = LandOpacity::new(1.0, 0.0);
        opacity.set_selected(keys(&["B"]));
        assert!(!opacity.interactive("A"));
        assert!(opacity.interactive("B"));

        assert_eq!(
            opacity.levels(["A", "B"]),
            vec![
                RegionOpacity {
                    key: "A".to_string(),
                    opacity: 0.0,
                    interactive: false,
                },
                RegionOpacity {
                    key: "B".to_string(),
                    opacity: 1.0,
                    interactive: true,
                },
            ]
        );

        opacity.set_levels(1.0, 0.3);
        assert!(opacity.interactive("A"));
        assert_eq!(opacity.levels(["A"])[0].opacity, 0.3);
    }
}
