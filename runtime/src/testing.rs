//! Scripted collaborators: every request parks until the test resolves it,
//! so resolution order is chosen explicitly.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cartogram_shared::{Frame, RegionGeometry, Timestamp};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;

use crate::animation::Scene;
use crate::contracts::{FrameSource, GeometryEngine, GeometryRequest, RenderSink, Transition};
use crate::error::{EngineError, SourceError};
use crate::opacity::RegionOpacity;

type FrameReply = oneshot::Sender<Result<Frame, SourceError>>;
type GeometryReply = oneshot::Sender<Result<RegionGeometry, EngineError>>;

#[derive(Default)]
pub struct ScriptedSource {
    pending: Mutex<Vec<(Timestamp, FrameReply)>>,
    calls: Mutex<Vec<Timestamp>>,
}

impl ScriptedSource {
    fn take(&self, timestamp: &Timestamp) -> Option<FrameReply> {
        let mut pending = self.pending.lock().expect("source lock");
        let index = pending.iter().position(|(t, _)| t == timestamp)?;
        Some(pending.remove(index).1)
    }

    /// Resolve the oldest outstanding request for `timestamp`.
    pub fn resolve(&self, timestamp: &Timestamp, frame: Frame) -> bool {
        self.take(timestamp)
            .map(|reply| reply.send(Ok(frame)).is_ok())
            .unwrap_or(false)
    }

    pub fn reject(&self, timestamp: &Timestamp, reason: &str) -> bool {
        self.take(timestamp)
            .map(|reply| reply.send(Err(SourceError(reason.to_string()))).is_ok())
            .unwrap_or(false)
    }

    pub fn calls(&self) -> Vec<Timestamp> {
        self.calls.lock().expect("source lock").clone()
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().expect("source lock").len()
    }
}

impl FrameSource for ScriptedSource {
    fn get_frame(&self, timestamp: &Timestamp) -> BoxFuture<'static, Result<Frame, SourceError>> {
        let (reply, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("source lock")
            .push((*timestamp, reply));
        self.calls.lock().expect("source lock").push(*timestamp);
        async move {
            rx.await
                .unwrap_or_else(|_| Err(SourceError("request dropped".to_string())))
        }
        .boxed()
    }
}

#[derive(Default)]
pub struct ScriptedEngine {
    pending: Mutex<VecDeque<(GeometryRequest, GeometryReply)>>,
    requests: Mutex<Vec<GeometryRequest>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: AtomicUsize,
}

impl ScriptedEngine {
    /// Finish the oldest computation with the undistorted input shapes.
    pub fn complete_next(&self) -> bool {
        let Some((request, reply)) = self.pending.lock().expect("engine lock").pop_front() else {
            return false;
        };
        reply
            .send(Ok(RegionGeometry::undistorted(&request.shapes)))
            .is_ok()
    }

    pub fn complete_next_with(&self, geometry: RegionGeometry) -> bool {
        let Some((_, reply)) = self.pending.lock().expect("engine lock").pop_front() else {
            return false;
        };
        reply.send(Ok(geometry)).is_ok()
    }

    pub fn fail_next(&self, reason: &str) -> bool {
        let Some((_, reply)) = self.pending.lock().expect("engine lock").pop_front() else {
            return false;
        };
        reply.send(Err(EngineError(reason.to_string()))).is_ok()
    }

    pub fn requests(&self) -> Vec<GeometryRequest> {
        self.requests.lock().expect("engine lock").clone()
    }

    pub fn last_request(&self) -> Option<GeometryRequest> {
        self.requests.lock().expect("engine lock").last().cloned()
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().expect("engine lock").len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl GeometryEngine for ScriptedEngine {
    fn compute_geometry(
        &self,
        request: GeometryRequest,
    ) -> BoxFuture<'static, Result<RegionGeometry, EngineError>> {
        let (reply, rx) = oneshot::channel();
        self.requests
            .lock()
            .expect("engine lock")
            .push(request.clone());
        self.pending
            .lock()
            .expect("engine lock")
            .push_back((request, reply));

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let in_flight = self.in_flight.clone();
        async move {
            let result = rx
                .await
                .unwrap_or_else(|_| Err(EngineError("computation dropped".to_string())));
            in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
        .boxed()
    }
}

#[derive(Default)]
pub struct RecordingSink {
    applied: Mutex<Vec<(Scene, Transition)>>,
    opacity: Mutex<Vec<Vec<RegionOpacity>>>,
}

impl RecordingSink {
    pub fn applied(&self) -> Vec<(Scene, Transition)> {
        self.applied.lock().expect("sink lock").clone()
    }

    pub fn last(&self) -> Option<(Scene, Transition)> {
        self.applied.lock().expect("sink lock").last().cloned()
    }

    pub fn opacity(&self) -> Vec<Vec<RegionOpacity>> {
        self.opacity.lock().expect("sink lock").clone()
    }
}

impl RenderSink for RecordingSink {
    fn apply(&self, scene: &Scene, transition: Transition) {
        self.applied
            .lock()
            .expect("sink lock")
            .push((scene.clone(), transition));
    }

    fn apply_opacity(&self, opacity: &[RegionOpacity]) {
        self.opacity
            .lock()
            .expect("sink lock")
            .push(opacity.to_vec());
    }
}
