use std::time::Duration;

use cartogram_shared::Viewport;

pub const DEFAULT_RELAXATION_ITERATIONS: u32 = 8;
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;
pub const DEFAULT_DELAY_ANIMATIONS_MS: u64 = 300;
/// Transition used when the time lock is toggled.
pub const LOCK_TRANSITION_MS: u64 = 900;

// Land opacity
pub const OPACITY_HIGHLIGHT: f32 = 0.8;
pub const OPACITY_HIGHLIGHT_DIM: f32 = 0.3;
pub const OPACITY_SELECT: f32 = 1.0;
pub const DEFAULT_OPACITY_REGULAR: f32 = 1.0;
pub const DEFAULT_OPACITY_SELECT_DIM: f32 = 0.5;

pub fn relaxation_iterations() -> u32 {
    std::env::var("CARTOGRAM_ITERATIONS")
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_RELAXATION_ITERATIONS)
}

pub fn mailbox_capacity() -> usize {
    std::env::var("CARTOGRAM_MAILBOX_CAPACITY")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_MAILBOX_CAPACITY)
}

pub fn stretch_durations_enabled() -> bool {
    std::env::var("CARTOGRAM_STRETCH_DURATIONS")
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            matches!(normalized.as_str(), "1" | "true" | "yes" | "on")
        })
        .unwrap_or(true)
}

pub fn delay_animations() -> Duration {
    std::env::var("CARTOGRAM_DELAY_ANIMATIONS_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(DEFAULT_DELAY_ANIMATIONS_MS))
}

/// Per-instance settings for a cartogram component.
#[derive(Debug, Clone)]
pub struct CartogramConfig {
    pub relaxation_iterations: u32,
    pub mailbox_capacity: usize,
    /// Stretch animated transitions to at least the geometry compute time.
    pub stretch_durations: bool,
    pub delay_animations: Duration,
    /// Shape property that links shapes to frame key aliases.
    pub geo_id_property: Option<String>,
    pub viewport: Viewport,
    pub opacity_regular: f32,
    pub opacity_select_dim: f32,
}

impl CartogramConfig {
    pub fn from_env() -> Self {
        Self {
            relaxation_iterations: relaxation_iterations(),
            mailbox_capacity: mailbox_capacity(),
            stretch_durations: stretch_durations_enabled(),
            delay_animations: delay_animations(),
            ..Self::default()
        }
    }
}

impl Default for CartogramConfig {
    fn default() -> Self {
        Self {
            relaxation_iterations: DEFAULT_RELAXATION_ITERATIONS,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            stretch_durations: true,
            delay_animations: Duration::from_millis(DEFAULT_DELAY_ANIMATIONS_MS),
            geo_id_property: None,
            viewport: Viewport::default(),
            opacity_regular: DEFAULT_OPACITY_REGULAR,
            opacity_select_dim: DEFAULT_OPACITY_SELECT_DIM,
        }
    }
}
