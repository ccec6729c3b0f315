use std::sync::atomic::{AtomicU64, Ordering};

use cartogram_shared::Timestamp;
use serde::Serialize;

use crate::scheduler::Phase;

/// Point-in-time view of a running component, answered by its task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentStatus {
    pub phase: Phase,
    pub pending_redraws: usize,
    pub outstanding_frames: usize,
    pub current_time: Timestamp,
    /// Timestamp of the frame currently displayed, if any.
    pub displayed: Option<Timestamp>,
    pub locked_to: Option<Timestamp>,
    /// Size mode is not constant, so a time lock would have an effect. Says
    /// nothing about whether one is set; see `locked_to`.
    pub lock_available: bool,
    /// A transition is still running on the render target.
    pub animating: bool,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct CartogramCounters {
    frames_requested_total: AtomicU64,
    frames_applied_total: AtomicU64,
    stale_frames_total: AtomicU64,
    frame_failures_total: AtomicU64,
    computations_started_total: AtomicU64,
    computation_failures_total: AtomicU64,
    coalesced_redraws_total: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CountersSnapshot {
    pub frames_requested_total: u64,
    pub frames_applied_total: u64,
    pub stale_frames_total: u64,
    pub frame_failures_total: u64,
    pub computations_started_total: u64,
    pub computation_failures_total: u64,
    pub coalesced_redraws_total: u64,
}

impl CartogramCounters {
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            frames_requested_total: self.frames_requested_total.load(Ordering::Relaxed),
            frames_applied_total: self.frames_applied_total.load(Ordering::Relaxed),
            stale_frames_total: self.stale_frames_total.load(Ordering::Relaxed),
            frame_failures_total: self.frame_failures_total.load(Ordering::Relaxed),
            computations_started_total: self.computations_started_total.load(Ordering::Relaxed),
            computation_failures_total: self.computation_failures_total.load(Ordering::Relaxed),
            coalesced_redraws_total: self.coalesced_redraws_total.load(Ordering::Relaxed),
        }
    }

    pub fn record_frame_requested(&self) {
        self.frames_requested_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_applied(&self) {
        self.frames_applied_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_frame(&self) {
        self.stale_frames_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_failure(&self) {
        self.frame_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_computation_started(&self) {
        self.computations_started_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_computation_failure(&self) {
        self.computation_failures_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_coalesced_redraws(&self, count: u64) {
        self.coalesced_redraws_total
            .fetch_add(count, Ordering::Relaxed);
    }
}
