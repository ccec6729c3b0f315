//! Boundaries to the host: where frames come from, who computes geometry,
//! and where finished scenes go.

use std::sync::Arc;
use std::time::Duration;

use cartogram_shared::{Frame, RegionGeometry, RegionShape, Timestamp, Viewport, Weights};
use futures::future::BoxFuture;

use crate::animation::Scene;
use crate::error::{EngineError, SourceError};
use crate::opacity::RegionOpacity;

/// Resolves per-region data for a timestamp.
///
/// Outstanding calls may complete in any order. Implementations register the
/// request before returning the future; the future itself must be `'static`.
pub trait FrameSource: Send + Sync + 'static {
    fn get_frame(&self, timestamp: &Timestamp) -> BoxFuture<'static, Result<Frame, SourceError>>;
}

#[derive(Debug, Clone)]
pub struct GeometryRequest {
    pub shapes: Arc<[RegionShape]>,
    /// `None` selects the undistorted fast path.
    pub weights: Option<Arc<Weights>>,
    pub iterations: u32,
    pub viewport: Viewport,
}

/// Area-distorting geometry computation.
pub trait GeometryEngine: Send + Sync + 'static {
    fn compute_geometry(
        &self,
        request: GeometryRequest,
    ) -> BoxFuture<'static, Result<RegionGeometry, EngineError>>;
}

/// How a scene should reach the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Jump straight to the scene, no interpolation.
    Instant,
    /// Tween from whatever is on screen. A newer generation replaces this one.
    Animate { duration: Duration, generation: u64 },
}

pub trait RenderSink: Send + Sync + 'static {
    /// Must be idempotent: applying the same scene twice leaves the same state.
    fn apply(&self, scene: &Scene, transition: Transition);

    fn apply_opacity(&self, _opacity: &[RegionOpacity]) {}
}
