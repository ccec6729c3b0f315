use std::collections::HashMap;
use std::time::Duration;

use cartogram_shared::{Frame, RegionKey, RegionShape, SizeMode, SizeScale, Timestamp, Weights};
use serde::Serialize;

/// Re-render using data as of `timestamp`, animated over `duration`
/// (`Duration::ZERO` means instant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedrawRequest {
    pub timestamp: Timestamp,
    pub duration: Duration,
}

impl RedrawRequest {
    pub fn new(timestamp: Timestamp, duration: Duration) -> Self {
        Self {
            timestamp,
            duration,
        }
    }

    pub fn instant(timestamp: Timestamp) -> Self {
        Self::new(timestamp, Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Computing,
}

/// The request a drain settled on, plus how many older ones it swallowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drained {
    pub request: RedrawRequest,
    pub discarded: usize,
}

/// Serializes geometry computations.
///
/// Requests queue up while a computation runs; when it finishes the whole
/// backlog collapses to its last entry. The phase only changes through
/// [`RedrawScheduler::begin_next`] and [`RedrawScheduler::finish`].
#[derive(Debug, Default)]
pub struct RedrawScheduler {
    pending: Vec<RedrawRequest>,
    phase: Phase,
}

impl RedrawScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, request: RedrawRequest) {
        self.pending.push(request);
    }

    /// Take the effective request and enter `Computing`, or `None` when idle
    /// with nothing queued or already computing.
    pub fn begin_next(&mut self) -> Option<Drained> {
        if self.phase == Phase::Computing {
            return None;
        }
        let request = self.pending.pop()?;
        let discarded = self.pending.len();
        self.pending.clear();
        self.phase = Phase::Computing;
        Some(Drained { request, discarded })
    }

    /// The running computation ended, successfully or not.
    pub fn finish(&mut self) {
        self.phase = Phase::Idle;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Inputs for turning a frame into per-shape target weights.
pub struct WeightPlan<'a> {
    pub mode: SizeMode,
    pub scale: &'a SizeScale,
    pub shapes: &'a [RegionShape],
    /// Shape id -> region key.
    pub keys: &'a HashMap<String, RegionKey>,
    pub current: Option<&'a Frame>,
    /// Reference frame when sizes are locked to another timestamp.
    pub locked: Option<&'a Frame>,
}

impl WeightPlan<'_> {
    /// `None` means "do not distort": constant size mode, or no data yet.
    pub fn weights(&self) -> Option<Weights> {
        if self.mode == SizeMode::Constant {
            return None;
        }
        let current = self.current?;

        let weights = self
            .shapes
            .iter()
            .map(|shape| {
                let key = self.keys.get(&shape.id).unwrap_or(&shape.id);
                let now = self.scaled(current, key);
                let weight = match self.locked {
                    Some(locked) => {
                        let reference = self.scaled(locked, key);
                        let area = shape.area();
                        if reference > 0.0 && reference.is_finite() {
                            area * (now / reference).powi(2)
                        } else {
                            area
                        }
                    }
                    None => now,
                };
                (shape.id.clone(), weight)
            })
            .collect();
        Some(weights)
    }

    fn scaled(&self, frame: &Frame, key: &str) -> f64 {
        frame
            .size_of(key)
            .map(|v| self.scale.apply(v))
            .unwrap_or_else(|| self.scale.floor())
    }
}

/// Transition length after a computation that took `elapsed`.
///
/// Instant requests stay instant. Animated ones are stretched so a slow
/// computation does not leave the previous frame frozen and then jump.
pub fn effective_duration(requested: Duration, elapsed: Duration, stretch: bool) -> Duration {
    if stretch && !requested.is_zero() {
        requested.max(elapsed)
    } else {
        requested
    }
}
