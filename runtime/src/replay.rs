//! Offline playback of a recorded fixture through a live component.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use cartogram_runtime::{
    CartogramComponent, CartogramConfig, CartogramEvent, Collaborators, ComponentStatus,
    CountersSnapshot, EngineError, FrameSource, GeometryEngine, GeometryRequest, Phase,
    RegionOpacity, RenderSink, Scene, SourceError, Transition,
};
use cartogram_shared::{
    ColorScale, Frame, RegionGeometry, RegionPath, RegionShape, SizeMode, SizeScale, Timestamp,
    Weights,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

const SETTLE_POLL: Duration = Duration::from_millis(25);
const ITERATION_COST: Duration = Duration::from_millis(15);

fn default_extent() -> (f64, f64) {
    (0.1, 1.0)
}

fn default_latency_ms() -> u64 {
    40
}

fn default_step_ms() -> u64 {
    250
}

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    pub shapes: Vec<RegionShape>,
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub color: Option<ColorScale>,
    #[serde(default = "default_extent")]
    pub extent: (f64, f64),
    #[serde(default)]
    pub size_mode: SizeMode,
    /// Base frame latency; individual frames take one to three times this.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Pause between playback steps.
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading fixture {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing fixture {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let mut fixture: Fixture = serde_json::from_str(raw)?;
        if fixture.frames.is_empty() {
            bail!("fixture has no frames");
        }
        fixture.frames.sort_by_key(|frame| frame.timestamp);
        Ok(fixture)
    }

    fn size_scale(&self) -> SizeScale {
        let domain_max = self
            .frames
            .iter()
            .filter_map(Frame::max_size)
            .fold(0.0, f64::max);
        SizeScale::new(domain_max, self.extent)
    }
}

/// Serves fixture frames after a simulated, uneven latency so responses can
/// overtake each other.
pub struct MemorySource {
    frames: HashMap<Timestamp, (Duration, Frame)>,
}

impl MemorySource {
    pub fn new(frames: &[Frame], latency: Duration) -> Self {
        let frames = frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let delay = latency * (1 + (i % 3) as u32);
                (frame.timestamp, (delay, frame.clone()))
            })
            .collect();
        Self { frames }
    }
}

impl FrameSource for MemorySource {
    fn get_frame(&self, timestamp: &Timestamp) -> BoxFuture<'static, Result<Frame, SourceError>> {
        let entry = self.frames.get(timestamp).cloned();
        let timestamp = *timestamp;
        async move {
            let (delay, frame) =
                entry.ok_or_else(|| SourceError(format!("no frame recorded for {timestamp}")))?;
            tokio::time::sleep(delay).await;
            Ok(frame)
        }
        .boxed()
    }
}

/// Scales each shape about its centroid so its area share matches its
/// weight share. Cost grows with the iteration count.
pub struct ScalingEngine;

impl GeometryEngine for ScalingEngine {
    fn compute_geometry(
        &self,
        request: GeometryRequest,
    ) -> BoxFuture<'static, Result<RegionGeometry, EngineError>> {
        async move {
            tokio::time::sleep(ITERATION_COST * request.iterations).await;
            match request.weights.as_deref() {
                Some(weights) => scale_shapes(&request.shapes, weights),
                None => Ok(RegionGeometry::undistorted(&request.shapes)),
            }
        }
        .boxed()
    }
}

fn scale_shapes(shapes: &[RegionShape], weights: &Weights) -> Result<RegionGeometry, EngineError> {
    let total_weight: f64 = shapes
        .iter()
        .map(|shape| weights.get(&shape.id).copied().unwrap_or(0.0).max(0.0))
        .sum();
    if !total_weight.is_finite() || total_weight <= 0.0 {
        return Err(EngineError("weights sum to zero".to_string()));
    }
    let total_area: f64 = shapes.iter().map(RegionShape::area).sum();

    let regions = shapes
        .iter()
        .map(|shape| {
            let weight = weights.get(&shape.id).copied().unwrap_or(0.0).max(0.0);
            let area = shape.area();
            let factor = if area > 0.0 {
                (weight / total_weight * total_area / area).sqrt()
            } else {
                1.0
            };
            let [cx, cy] = shape.centroid().unwrap_or([0.0, 0.0]);
            RegionPath {
                id: shape.id.clone(),
                rings: shape
                    .rings
                    .iter()
                    .map(|ring| {
                        ring.iter()
                            .map(|[x, y]| [cx + (x - cx) * factor, cy + (y - cy) * factor])
                            .collect()
                    })
                    .collect(),
            }
        })
        .collect();
    Ok(RegionGeometry {
        regions,
        borders: None,
    })
}

pub struct LogSink;

impl RenderSink for LogSink {
    fn apply(&self, scene: &Scene, transition: Transition) {
        let time = scene
            .timestamp
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string());
        match transition {
            Transition::Instant => {
                tracing::info!(%time, regions = scene.regions.len(), "scene applied")
            }
            Transition::Animate {
                duration,
                generation,
            } => tracing::info!(
                %time,
                regions = scene.regions.len(),
                duration_ms = duration.as_millis() as u64,
                generation,
                "scene animating"
            ),
        }
    }

    fn apply_opacity(&self, opacity: &[RegionOpacity]) {
        let blocked = opacity.iter().filter(|region| !region.interactive).count();
        tracing::debug!(regions = opacity.len(), blocked, "opacity applied");
    }
}

#[derive(Debug, Serialize)]
pub struct ReplaySummary {
    pub status: ComponentStatus,
    pub counters: CountersSnapshot,
}

/// Play every fixture frame forward once, then wait for the component to
/// settle.
pub async fn run(fixture: Fixture, config: CartogramConfig) -> Result<ReplaySummary> {
    let first = fixture.frames[0].timestamp;
    let step = Duration::from_millis(fixture.step_ms);
    let size_scale = fixture.size_scale();
    let color_scale = fixture.color.clone().unwrap_or_default();

    let handle = CartogramComponent::new(config, fixture.shapes.clone(), first)
        .with_scales(size_scale, color_scale)
        .with_size_mode(fixture.size_mode)
        .start(Collaborators {
            frames: Arc::new(MemorySource::new(
                &fixture.frames,
                Duration::from_millis(fixture.latency_ms),
            )),
            engine: Arc::new(ScalingEngine),
            sink: Arc::new(LogSink),
        })?;
    tracing::info!(
        shapes = fixture.shapes.len(),
        frames = fixture.frames.len(),
        "replay started"
    );

    handle
        .send(CartogramEvent::PlaybackChanged { playing: true })
        .await?;
    for frame in fixture.frames.iter().skip(1) {
        tokio::time::sleep(step).await;
        handle
            .send(CartogramEvent::TimeChanged {
                timestamp: frame.timestamp,
            })
            .await?;
    }
    handle
        .send(CartogramEvent::PlaybackChanged { playing: false })
        .await?;

    let status = loop {
        let status = handle.status().await?;
        if status.phase == Phase::Idle
            && status.pending_redraws == 0
            && status.outstanding_frames == 0
        {
            break status;
        }
        tokio::time::sleep(SETTLE_POLL).await;
    };

    Ok(ReplaySummary {
        status,
        counters: handle.counters(),
    })
}
