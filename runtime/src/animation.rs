use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cartogram_shared::{
    COLOR_LAND_DEFAULT, ColorScale, Frame, Point, RegionGeometry, RegionKey, Rgb, Ring, Timestamp,
};
use serde::Serialize;
use tokio::time::Instant;

use crate::contracts::{RenderSink, Transition};

/// One region ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyledRegion {
    /// Shape id.
    pub id: String,
    pub key: RegionKey,
    pub rings: Vec<Ring>,
    pub fill: Rgb,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Everything the sink needs to draw one terminal state.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Scene {
    pub timestamp: Option<Timestamp>,
    pub regions: Vec<StyledRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borders: Option<Vec<Ring>>,
}

impl Scene {
    pub fn build(
        geometry: &RegionGeometry,
        frame: Option<&Frame>,
        keys: &HashMap<String, RegionKey>,
        colors: &ColorScale,
    ) -> Self {
        let regions = geometry
            .regions
            .iter()
            .map(|path| {
                let key = keys
                    .get(&path.id)
                    .cloned()
                    .unwrap_or_else(|| path.id.clone());
                StyledRegion {
                    id: path.id.clone(),
                    fill: fill_for(frame, &key, colors),
                    label: frame.and_then(|f| f.label_of(&key)).map(str::to_string),
                    key,
                    rings: path.rings.clone(),
                }
            })
            .collect();

        Self {
            timestamp: frame.map(|f| f.timestamp),
            regions,
            borders: geometry.borders.clone(),
        }
    }

    /// Same shapes, fills recomputed from `frame` and `colors`.
    pub fn recolored(&self, frame: Option<&Frame>, colors: &ColorScale) -> Self {
        let mut scene = self.clone();
        for region in &mut scene.regions {
            region.fill = fill_for(frame, &region.key, colors);
        }
        scene
    }

    pub fn region(&self, key: &str) -> Option<&StyledRegion> {
        self.regions.iter().find(|r| r.key == key)
    }
}

fn fill_for(frame: Option<&Frame>, key: &str, colors: &ColorScale) -> Rgb {
    frame
        .and_then(|f| f.color_of(key))
        .and_then(|value| colors.apply(value))
        .unwrap_or(COLOR_LAND_DEFAULT)
}

#[derive(Debug, Clone)]
struct ActiveTransition {
    from: Scene,
    to: Scene,
    started: Instant,
    duration: Duration,
}

impl ActiveTransition {
    fn progress(&self, now: Instant) -> Option<f64> {
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.duration {
            return None;
        }
        Some(elapsed.as_secs_f64() / self.duration.as_secs_f64())
    }
}

/// Drives the render target from one scene to the next.
///
/// At most one transition owns the target; starting another (or an instant
/// apply) replaces it and bumps the generation. Tweening starts from the
/// interpolated state of the interrupted transition so the picture never
/// jumps back.
pub struct AnimationDriver {
    sink: Arc<dyn RenderSink>,
    current: Option<Scene>,
    active: Option<ActiveTransition>,
    generation: u64,
}

impl AnimationDriver {
    pub fn new(sink: Arc<dyn RenderSink>) -> Self {
        Self {
            sink,
            current: None,
            active: None,
            generation: 0,
        }
    }

    /// Show `geometry` styled with `frame` over `duration`.
    pub fn animate(
        &mut self,
        geometry: &RegionGeometry,
        frame: Option<&Frame>,
        keys: &HashMap<String, RegionKey>,
        colors: &ColorScale,
        duration: Duration,
        now: Instant,
    ) -> Transition {
        self.present(Scene::build(geometry, frame, keys, colors), duration, now)
    }

    /// Restyle the current shapes without new geometry. `None` before the
    /// first scene has been drawn.
    pub fn recolor(
        &mut self,
        frame: Option<&Frame>,
        colors: &ColorScale,
        duration: Duration,
        now: Instant,
    ) -> Option<Transition> {
        let target = self.current.as_ref()?.recolored(frame, colors);
        Some(self.present(target, duration, now))
    }

    pub fn present(&mut self, target: Scene, duration: Duration, now: Instant) -> Transition {
        self.generation += 1;

        let transition = if duration.is_zero() {
            self.active = None;
            Transition::Instant
        } else {
            let from = self
                .sample(now)
                .or_else(|| self.current.clone())
                .unwrap_or_else(|| target.clone());
            self.active = Some(ActiveTransition {
                from,
                to: target.clone(),
                started: now,
                duration,
            });
            Transition::Animate {
                duration,
                generation: self.generation,
            }
        };

        self.sink.apply(&target, transition);
        self.current = Some(target);
        transition
    }

    /// Interpolated scene at `now`, or `None` when nothing is animating.
    pub fn sample(&self, now: Instant) -> Option<Scene> {
        let active = self.active.as_ref()?;
        let t = active.progress(now)?;
        Some(interpolate_scene(&active.from, &active.to, t))
    }

    pub fn is_animating(&self, now: Instant) -> bool {
        self.active
            .as_ref()
            .and_then(|active| active.progress(now))
            .is_some()
    }

    /// Terminal state of the latest transition.
    pub fn current(&self) -> Option<&Scene> {
        self.current.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

fn interpolate_scene(from: &Scene, to: &Scene, t: f64) -> Scene {
    let regions = to
        .regions
        .iter()
        .map(|target| {
            let Some(start) = from.regions.iter().find(|r| r.id == target.id) else {
                return target.clone();
            };
            StyledRegion {
                rings: interpolate_rings(&start.rings, &target.rings, t),
                fill: start.fill.mix(target.fill, t),
                ..target.clone()
            }
        })
        .collect();

    let borders = match (&from.borders, &to.borders) {
        (Some(a), Some(b)) => Some(interpolate_rings(a, b, t)),
        (_, b) => b.clone(),
    };

    Scene {
        timestamp: to.timestamp,
        regions,
        borders,
    }
}

/// Point-wise lerp when both sides have the same ring layout; otherwise the
/// start shape holds until the transition completes.
fn interpolate_rings(from: &[Ring], to: &[Ring], t: f64) -> Vec<Ring> {
    let same_layout =
        from.len() == to.len() && from.iter().zip(to).all(|(a, b)| a.len() == b.len());
    if !same_layout {
        return from.to_vec();
    }
    from.iter()
        .zip(to)
        .map(|(a, b)| {
            a.iter()
                .zip(b)
                .map(|(p, q)| lerp_point(*p, *q, t))
                .collect()
        })
        .collect()
}

fn lerp_point(a: Point, b: Point, t: f64) -> Point {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use cartogram_shared::{
        COLOR_LAND_DEFAULT, ColorScale, Frame, RegionGeometry, RegionPath, Rgb, Timestamp,
    };
    use tokio::time::Instant;

    use super::{AnimationDriver, Scene};
    use crate::contracts::Transition;
    use crate::testing::RecordingSink;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    fn geometry(side: f64) -> RegionGeometry {
        let ring = vec![[0.0, 0.0], [side, 0.0], [side, side], [0.0, side]];
        RegionGeometry {
            regions: vec![
                RegionPath {
                    id: "A".into(),
                    rings: vec![ring.clone()],
                },
                RegionPath {
                    id: "B".into(),
                    rings: vec![ring],
                },
            ],
            borders: None,
        }
    }

    fn palette() -> ColorScale {
        ColorScale::ordinal([("red", RED), ("blue", BLUE)])
    }

    fn frame(color_a: &str) -> Frame {
        Frame::new(Timestamp::year(2000).expect("year 2000")).with_color("A", color_a)
    }

    fn fill(scene: &Scene, key: &str) -> Option<Rgb> {
        scene.region(key).map(|r| r.fill)
    }

    /// Animate to squares of `side`, region A coloured `color`.
    fn show(
        driver: &mut AnimationDriver,
        side: f64,
        color: Option<&str>,
        duration: Duration,
        now: Instant,
    ) -> Transition {
        let frame = color.map(frame);
        driver.animate(
            &geometry(side),
            frame.as_ref(),
            &HashMap::new(),
            &palette(),
            duration,
            now,
        )
    }

    #[test]
    fn regions_without_color_fall_back_to_default() {
        let keys = HashMap::new();
        let scene = Scene::build(&geometry(1.0), Some(&frame("red")), &keys, &palette());
        assert_eq!(fill(&scene, "A"), Some(RED));
        assert_eq!(fill(&scene, "B"), Some(COLOR_LAND_DEFAULT));

        let unmapped = Scene::build(&geometry(1.0), Some(&frame("green")), &keys, &palette());
        assert_eq!(fill(&unmapped, "A"), Some(COLOR_LAND_DEFAULT));
    }

    #[test]
    fn zero_duration_applies_instantly() {
        let sink = Arc::new(RecordingSink::default());
        let mut driver = AnimationDriver::new(sink.clone());
        let now = Instant::now();

        let transition = driver.animate(
            &geometry(1.0),
            Some(&frame("red")),
            &HashMap::new(),
            &palette(),
            Duration::ZERO,
            now,
        );

        assert_eq!(transition, Transition::Instant);
        assert!(!driver.is_animating(now));
        let applied = sink.applied();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].1, Transition::Instant);
    }

    #[test]
    fn new_transition_replaces_running_one_from_its_midpoint() {
        let sink = Arc::new(RecordingSink::default());
        let mut driver = AnimationDriver::new(sink.clone());
        let start = Instant::now();
        let second = Duration::from_secs(1);

        show(&mut driver, 0.0, Some("red"), Duration::ZERO, start);
        let first = show(&mut driver, 2.0, Some("red"), second, start);
        assert!(matches!(first, Transition::Animate { .. }));
        let first_generation = driver.generation();
        let mid = start + Duration::from_millis(500);
        let halfway = driver.sample(mid).expect("running transition");
        assert_eq!(halfway.regions[0].rings[0][2], [1.0, 1.0]);

        let replacement = show(&mut driver, 4.0, Some("blue"), second, mid);
        assert!(matches!(replacement, Transition::Animate { .. }));
        assert!(driver.generation() > first_generation);

        let resumed = driver.sample(mid).expect("replacement running");
        assert_eq!(resumed.regions[0].rings[0][2], [1.0, 1.0]);
        let later = driver
            .sample(mid + Duration::from_millis(500))
            .expect("still running");
        assert_eq!(later.regions[0].rings[0][2], [2.5, 2.5]);
        assert!(driver.sample(mid + second).is_none());
        let current = driver.current().expect("scene");
        assert_eq!(fill(current, "A"), Some(BLUE));
    }

    #[test]
    fn instant_apply_interrupts_running_transition() {
        let sink = Arc::new(RecordingSink::default());
        let mut driver = AnimationDriver::new(sink);
        let now = Instant::now();

        show(&mut driver, 1.0, None, Duration::from_secs(5), now);
        assert!(driver.is_animating(now));
        show(&mut driver, 3.0, None, Duration::ZERO, now);
        assert!(!driver.is_animating(now));
        assert!(driver.sample(now).is_none());
    }

    #[test]
    fn animate_is_idempotent() {
        let sink = Arc::new(RecordingSink::default());
        let mut driver = AnimationDriver::new(sink.clone());
        let now = Instant::now();

        for _ in 0..2 {
            show(&mut driver, 2.0, Some("blue"), Duration::ZERO, now);
        }
        let applied = sink.applied();
        assert_eq!(applied.len(), 2);
        assert_eq!(applied[0].0, applied[1].0);
    }

    #[test]
    fn recolor_keeps_shapes_and_updates_fills() {
        let sink = Arc::new(RecordingSink::default());
        let mut driver = AnimationDriver::new(sink.clone());
        let now = Instant::now();

        let before_first_scene = driver.recolor(None, &palette(), Duration::ZERO, now);
        assert!(before_first_scene.is_none());
        show(&mut driver, 2.0, Some("red"), Duration::ZERO, now);

        let swapped = ColorScale::ordinal([("red", BLUE)]);
        driver.recolor(Some(&frame("red")), &swapped, Duration::ZERO, now);
        let current = driver.current().expect("scene");
        assert_eq!(fill(current, "A"), Some(BLUE));
        assert_eq!(current.regions[0].rings, geometry(2.0).regions[0].rings);
    }
}
