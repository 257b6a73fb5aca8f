/// Frame driver
///
/// Hosts drive both bridges through two per-frame callbacks: begin-of-frame
/// carries the timestep, end-of-frame follows once rendering is done. They
/// fire in that order, exactly once each per frame.

use crate::signal::Signal;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    pub frame: u64,
    pub dt: f32,
}

pub struct FrameLoop {
    frame_begin: Signal<FrameTick>,
    frame_end: Signal<FrameTick>,
    frame_index: AtomicU64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self {
            frame_begin: Signal::new(),
            frame_end: Signal::new(),
            frame_index: AtomicU64::new(0),
        }
    }

    pub fn frame_begin(&self) -> &Signal<FrameTick> {
        &self.frame_begin
    }

    pub fn frame_end(&self) -> &Signal<FrameTick> {
        &self.frame_end
    }

    /// Frames run so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index.load(Ordering::Relaxed)
    }

    /// Run one frame: begin-of-frame work, then end-of-frame work.
    pub fn run_frame(&self, dt: f32) {
        let frame = self.frame_index.fetch_add(1, Ordering::Relaxed);
        let tick = FrameTick { frame, dt };
        self.frame_begin.emit(&tick);
        self.frame_end.emit(&tick);
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}
