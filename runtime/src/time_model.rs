use std::time::Duration;

use cartogram_shared::Timestamp;

/// The time axis as the component sees it: the selected value, whether
/// playback is running, and how long playback steps animate.
#[derive(Debug, Clone)]
pub struct TimeModel {
    value: Timestamp,
    displayed: Option<Timestamp>,
    playing: bool,
    delay_animations: Duration,
    last_duration: Duration,
}

impl TimeModel {
    pub fn new(value: Timestamp, delay_animations: Duration) -> Self {
        Self {
            value,
            displayed: None,
            playing: false,
            delay_animations,
            last_duration: Duration::ZERO,
        }
    }

    pub fn value(&self) -> Timestamp {
        self.value
    }

    pub fn set_value(&mut self, value: Timestamp) {
        self.value = value;
    }

    pub fn is_current(&self, timestamp: &Timestamp) -> bool {
        self.value == *timestamp
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn set_delay_animations(&mut self, delay: Duration) {
        self.delay_animations = delay;
    }

    /// Record that a frame for `timestamp` is about to be shown and return how
    /// long its transition should take. Only forward playback steps animate;
    /// scrubbing and backward jumps are instant.
    pub fn advance_display(&mut self, timestamp: Timestamp) -> Duration {
        let previous = self.displayed.unwrap_or(timestamp);
        self.displayed = Some(timestamp);
        self.last_duration = if self.playing && timestamp > previous {
            self.delay_animations
        } else {
            Duration::ZERO
        };
        self.last_duration
    }

    /// Duration of the most recent displayed step; reused for recolouring.
    pub fn last_duration(&self) -> Duration {
        self.last_duration
    }

    pub fn displayed(&self) -> Option<Timestamp> {
        self.displayed
    }
}
