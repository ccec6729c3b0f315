use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use cartogram_shared::{
    ColorScale, Frame, KeyResolver, RegionGeometry, RegionKey, RegionShape, SizeMode, SizeScale,
    Timestamp, Viewport,
};
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::animation::AnimationDriver;
use crate::config::{CartogramConfig, LOCK_TRANSITION_MS};
use crate::contracts::{FrameSource, GeometryEngine, GeometryRequest, RenderSink};
use crate::error::{CartogramError, ConfigError, EngineError, SourceError};
use crate::events::CartogramEvent;
use crate::opacity::LandOpacity;
use crate::scheduler::{Drained, RedrawRequest, RedrawScheduler, WeightPlan, effective_duration};
use crate::sequencer::FrameSequencer;
use crate::state::{CartogramCounters, ComponentStatus, CountersSnapshot};
use crate::time_model::TimeModel;

/// The host services a component talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub frames: Arc<dyn FrameSource>,
    pub engine: Arc<dyn GeometryEngine>,
    pub sink: Arc<dyn RenderSink>,
}

/// A cartogram waiting to be started.
pub struct CartogramComponent {
    config: CartogramConfig,
    shapes: Vec<RegionShape>,
    initial_time: Timestamp,
    size_scale: SizeScale,
    color_scale: ColorScale,
    size_mode: SizeMode,
}

impl CartogramComponent {
    pub fn new(config: CartogramConfig, shapes: Vec<RegionShape>, initial_time: Timestamp) -> Self {
        Self {
            config,
            shapes,
            initial_time,
            size_scale: SizeScale::default(),
            color_scale: ColorScale::default(),
            size_mode: SizeMode::default(),
        }
    }

    pub fn with_scales(mut self, size: SizeScale, color: ColorScale) -> Self {
        self.size_scale = size;
        self.color_scale = color;
        self
    }

    pub fn with_size_mode(mut self, mode: SizeMode) -> Self {
        self.size_mode = mode;
        self
    }

    /// Validate the inputs and spawn the component task on the current tokio
    /// runtime. Nothing is spawned when the configuration is unusable.
    pub fn start(self, collaborators: Collaborators) -> Result<CartogramHandle, CartogramError> {
        if let Err(e) = validate(&self.shapes, &self.config) {
            error!(error = %e, "cartogram cannot start");
            return Err(e.into());
        }

        let (tx, rx) = mpsc::channel(self.config.mailbox_capacity.max(1));
        let counters = Arc::new(CartogramCounters::default());
        let resolver = KeyResolver::new(self.config.geo_id_property.clone());
        let keys = resolver.resolve_all(&self.shapes);

        let task = ComponentTask {
            time: TimeModel::new(self.initial_time, self.config.delay_animations),
            opacity: LandOpacity::new(self.config.opacity_regular, self.config.opacity_select_dim),
            viewport: self.config.viewport,
            shapes: self.shapes.into(),
            keys,
            resolver,
            frames: collaborators.frames,
            engine: collaborators.engine,
            sink: collaborators.sink.clone(),
            driver: AnimationDriver::new(collaborators.sink),
            sequencer: FrameSequencer::new(),
            scheduler: RedrawScheduler::new(),
            current_frame: None,
            size_scale: self.size_scale,
            color_scale: self.color_scale,
            size_mode: self.size_mode,
            lock: None,
            counters: counters.clone(),
            inflight: FuturesUnordered::new(),
            config: self.config,
        };
        tokio::spawn(task.run(rx));

        Ok(CartogramHandle { tx, counters })
    }
}

fn validate(shapes: &[RegionShape], config: &CartogramConfig) -> Result<(), ConfigError> {
    if shapes.is_empty() {
        return Err(ConfigError::NoShapes);
    }
    let mut seen = HashSet::new();
    for shape in shapes {
        if shape.rings.iter().all(|ring| ring.is_empty()) {
            return Err(ConfigError::EmptyShape(shape.id.clone()));
        }
        if !seen.insert(shape.id.as_str()) {
            return Err(ConfigError::DuplicateShape(shape.id.clone()));
        }
    }
    if !config.viewport.is_usable() {
        return Err(ConfigError::InvalidViewport {
            width: config.viewport.width,
            height: config.viewport.height,
        });
    }
    Ok(())
}

enum Command {
    Event(CartogramEvent),
    Status(oneshot::Sender<ComponentStatus>),
}

/// Cloneable front door to a running component. The task stops once every
/// handle is dropped.
#[derive(Clone)]
pub struct CartogramHandle {
    tx: mpsc::Sender<Command>,
    counters: Arc<CartogramCounters>,
}

impl CartogramHandle {
    pub async fn send(&self, event: CartogramEvent) -> Result<(), CartogramError> {
        self.tx
            .send(Command::Event(event))
            .await
            .map_err(|_| CartogramError::Closed)
    }

    pub async fn status(&self) -> Result<ComponentStatus, CartogramError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Status(reply))
            .await
            .map_err(|_| CartogramError::Closed)?;
        rx.await.map_err(|_| CartogramError::Closed)
    }

    pub fn counters(&self) -> CountersSnapshot {
        self.counters.snapshot()
    }
}

/// Continuations of asynchronous work, delivered back to the task.
enum Completion {
    Frame {
        timestamp: Timestamp,
        result: Result<Frame, SourceError>,
    },
    LockedFrame {
        job: RedrawRequest,
        lock: Timestamp,
        result: Result<Frame, SourceError>,
    },
    Geometry {
        job: RedrawRequest,
        started: Instant,
        result: Result<RegionGeometry, EngineError>,
    },
}

/// Owns all scheduling state. Only this task mutates it.
struct ComponentTask {
    config: CartogramConfig,
    shapes: Arc<[RegionShape]>,
    /// Shape id -> region key.
    keys: HashMap<String, RegionKey>,
    resolver: KeyResolver,
    frames: Arc<dyn FrameSource>,
    engine: Arc<dyn GeometryEngine>,
    sink: Arc<dyn RenderSink>,
    driver: AnimationDriver,
    sequencer: FrameSequencer,
    scheduler: RedrawScheduler,
    time: TimeModel,
    current_frame: Option<Arc<Frame>>,
    size_scale: SizeScale,
    color_scale: ColorScale,
    size_mode: SizeMode,
    lock: Option<Timestamp>,
    viewport: Viewport,
    opacity: LandOpacity,
    counters: Arc<CartogramCounters>,
    inflight: FuturesUnordered<BoxFuture<'static, Completion>>,
}

impl ComponentTask {
    async fn run(mut self, mut mailbox: mpsc::Receiver<Command>) {
        let initial = self.time.value();
        info!(
            shapes = self.shapes.len(),
            time = %initial,
            "cartogram component started"
        );

        self.request_frame(initial);
        self.schedule_redraw(RedrawRequest::instant(initial));

        loop {
            tokio::select! {
                biased;
                Some(done) = self.inflight.next(), if !self.inflight.is_empty() => {
                    self.on_completion(done);
                }
                command = mailbox.recv() => match command {
                    Some(Command::Event(event)) => self.on_event(event),
                    Some(Command::Status(reply)) => {
                        let _ = reply.send(self.status());
                    }
                    None => break,
                },
            }
        }

        info!(
            abandoned = self.inflight.len(),
            "cartogram component stopped"
        );
    }

    fn on_event(&mut self, event: CartogramEvent) {
        debug!(?event, "cartogram event");
        let current = self.time.value();
        match event {
            CartogramEvent::TimeChanged { timestamp } => {
                self.time.set_value(timestamp);
                self.request_frame(timestamp);
            }
            CartogramEvent::PlaybackChanged { playing } => self.time.set_playing(playing),
            CartogramEvent::DelayChanged { delay } => self.time.set_delay_animations(delay),
            CartogramEvent::SizeExtentChanged { extent } => {
                self.size_scale = self.size_scale.with_extent(extent);
                self.schedule_redraw(RedrawRequest::instant(current));
            }
            CartogramEvent::SizeModeChanged { mode } => {
                self.size_mode = mode;
                self.schedule_redraw(RedrawRequest::instant(current));
            }
            CartogramEvent::ScalesChanged { size, color } => {
                self.size_scale = size;
                self.color_scale = color;
                self.schedule_redraw(RedrawRequest::instant(current));
            }
            CartogramEvent::ColorScaleChanged { color } => {
                self.color_scale = color;
                let duration = self.time.last_duration();
                if self
                    .driver
                    .recolor(
                        self.current_frame.as_deref(),
                        &self.color_scale,
                        duration,
                        Instant::now(),
                    )
                    .is_some()
                {
                    self.push_opacity();
                }
            }
            CartogramEvent::LockChanged { lock } => {
                self.lock = lock;
                self.schedule_redraw(RedrawRequest::new(
                    current,
                    Duration::from_millis(LOCK_TRANSITION_MS),
                ));
            }
            CartogramEvent::Resize { viewport } => {
                if !viewport.is_usable() {
                    warn!(
                        width = viewport.width,
                        height = viewport.height,
                        "ignoring resize to an undrawable viewport"
                    );
                    return;
                }
                self.viewport = viewport;
                self.schedule_redraw(RedrawRequest::instant(current));
            }
            CartogramEvent::HighlightChanged { keys } => {
                self.opacity.set_highlighted(keys);
                self.push_opacity();
            }
            CartogramEvent::SelectChanged { keys } => {
                self.opacity.set_selected(keys);
                self.push_opacity();
            }
            CartogramEvent::OpacityChanged {
                regular,
                select_dim,
            } => {
                self.opacity.set_levels(regular, select_dim);
                self.push_opacity();
            }
        }
    }

    fn on_completion(&mut self, done: Completion) {
        match done {
            Completion::Frame { timestamp, result } => self.on_frame(timestamp, result),
            Completion::LockedFrame { job, lock, result } => match result {
                Ok(locked) => self.start_computation(job, Some(&locked)),
                Err(e) => {
                    warn!(
                        lock = %lock,
                        error = %e,
                        "locked frame unavailable, keeping last scene"
                    );
                    self.counters.record_frame_failure();
                    self.scheduler.finish();
                    self.drain();
                }
            },
            Completion::Geometry {
                job,
                started,
                result,
            } => self.on_geometry(job, started, result),
        }
    }

    fn request_frame(&mut self, timestamp: Timestamp) {
        self.sequencer.begin(&timestamp);
        self.counters.record_frame_requested();
        let pending = self.frames.get_frame(&timestamp);
        self.inflight.push(
            async move {
                Completion::Frame {
                    timestamp,
                    result: pending.await,
                }
            }
            .boxed(),
        );
    }

    fn on_frame(&mut self, timestamp: Timestamp, result: Result<Frame, SourceError>) {
        let frame = match result {
            Ok(frame) => frame,
            Err(e) => {
                self.sequencer.fail(&timestamp);
                self.counters.record_frame_failure();
                warn!(
                    time = %timestamp,
                    error = %e,
                    "frame request failed, keeping last frame"
                );
                return;
            }
        };

        // The sequencer drops superseded requests; the time check drops
        // in-order results the slider has already moved past.
        if !self.sequencer.accept(&timestamp) || !self.time.is_current(&timestamp) {
            self.counters.record_stale_frame();
            debug!(time = %timestamp, "stale frame discarded");
            return;
        }

        if !frame.key_aliases.is_empty() {
            self.resolver.learn_aliases(&frame.key_aliases);
            self.keys = self.resolver.resolve_all(&self.shapes);
        }
        self.current_frame = Some(Arc::new(frame));
        self.counters.record_frame_applied();

        let duration = self.time.advance_display(timestamp);
        self.schedule_redraw(RedrawRequest::new(timestamp, duration));
    }

    fn schedule_redraw(&mut self, request: RedrawRequest) {
        self.scheduler.schedule(request);
        self.drain();
    }

    fn drain(&mut self) {
        let Some(Drained { request, discarded }) = self.scheduler.begin_next() else {
            return;
        };
        if discarded > 0 {
            self.counters.record_coalesced_redraws(discarded as u64);
            debug!(discarded, time = %request.timestamp, "coalesced redraw backlog");
        }

        match self.lock {
            Some(lock) if self.size_mode != SizeMode::Constant && self.current_frame.is_some() => {
                let pending = self.frames.get_frame(&lock);
                self.inflight.push(
                    async move {
                        Completion::LockedFrame {
                            job: request,
                            lock,
                            result: pending.await,
                        }
                    }
                    .boxed(),
                );
            }
            _ => self.start_computation(request, None),
        }
    }

    fn start_computation(&mut self, job: RedrawRequest, locked: Option<&Frame>) {
        let weights = WeightPlan {
            mode: self.size_mode,
            scale: &self.size_scale,
            shapes: &self.shapes,
            keys: &self.keys,
            current: self.current_frame.as_deref(),
            locked,
        }
        .weights();
        let iterations = if weights.is_some() {
            self.config.relaxation_iterations
        } else {
            0
        };

        self.counters.record_computation_started();
        debug!(time = %job.timestamp, iterations, "starting geometry computation");

        let started = Instant::now();
        let pending = self.engine.compute_geometry(GeometryRequest {
            shapes: self.shapes.clone(),
            weights: weights.map(Arc::new),
            iterations,
            viewport: self.viewport,
        });
        self.inflight.push(
            async move {
                Completion::Geometry {
                    job,
                    started,
                    result: pending.await,
                }
            }
            .boxed(),
        );
    }

    fn on_geometry(
        &mut self,
        job: RedrawRequest,
        started: Instant,
        result: Result<RegionGeometry, EngineError>,
    ) {
        self.scheduler.finish();

        match result {
            Ok(geometry) => {
                let now = Instant::now();
                let duration = effective_duration(
                    job.duration,
                    now.saturating_duration_since(started),
                    self.config.stretch_durations,
                );
                self.driver.animate(
                    &geometry,
                    self.current_frame.as_deref(),
                    &self.keys,
                    &self.color_scale,
                    duration,
                    now,
                );
                self.push_opacity();
            }
            Err(e) => {
                self.counters.record_computation_failure();
                warn!(
                    time = %job.timestamp,
                    error = %e,
                    "geometry computation failed, keeping last scene"
                );
            }
        }

        self.drain();
    }

    fn push_opacity(&self) {
        let Some(scene) = self.driver.current() else {
            return;
        };
        let levels = self
            .opacity
            .levels(scene.regions.iter().map(|r| r.key.as_str()));
        self.sink.apply_opacity(&levels);
    }

    fn status(&self) -> ComponentStatus {
        ComponentStatus {
            phase: self.scheduler.phase(),
            pending_redraws: self.scheduler.pending(),
            outstanding_frames: self.sequencer.outstanding(),
            current_time: self.time.value(),
            displayed: self.time.displayed(),
            locked_to: self.lock,
            lock_available: self.size_mode != SizeMode::Constant,
            animating: self.driver.is_animating(Instant::now()),
            generation: self.driver.generation(),
        }
    }
}
