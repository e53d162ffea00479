//! Mock infrastructure for testing
//!
//! In-memory stand-ins for the three consumer kinds (streaming backend,
//! recorder, display surface) plus small frame helpers. All of them record
//! what was pushed into shared state so tests can assert on it afterwards.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

use simcast::{
    BackendKind, DisplayEvent, DisplaySurface, Frame, FrameRecorder, Result, SimcastError,
    StreamerBackend,
};

/// Pure-green label pixel in BGR order, as drawn by the display annotator.
pub const LABEL_GREEN: [u8; 3] = [0, 255, 0];

/// Count label-colored pixels in a frame.
pub fn green_pixels(frame: &Frame) -> usize {
    frame
        .data
        .chunks_exact(3)
        .filter(|px| px == &LABEL_GREEN)
        .count()
}

/// Observable state of a [`MockBackend`].
#[derive(Default)]
pub struct BackendState {
    pub initialized: bool,
    pub init_calls: u32,
    pub stop_calls: u32,
    /// Geometry and fps passed to the last initialize call
    pub geometry: Option<(u32, u32, u32)>,
    /// Byte length of every frame accepted while initialized
    pub frame_lens: Vec<usize>,
}

/// Streaming backend that records every call instead of streaming.
pub struct MockBackend {
    pub state: Arc<Mutex<BackendState>>,
    /// When set, `initialize` fails and the backend stays uninitialized
    pub fail_init: bool,
}

impl MockBackend {
    pub fn new() -> (Self, Arc<Mutex<BackendState>>) {
        let state = Arc::new(Mutex::new(BackendState::default()));
        (
            Self {
                state: state.clone(),
                fail_init: false,
            },
            state,
        )
    }

    pub fn failing() -> (Self, Arc<Mutex<BackendState>>) {
        let (mut backend, state) = Self::new();
        backend.fail_init = true;
        (backend, state)
    }
}

impl StreamerBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::GstUdp
    }

    fn initialize(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        let mut state = self.state.lock();
        state.init_calls += 1;
        if self.fail_init {
            return Err(SimcastError::backend("mock pipeline refused to start"));
        }
        state.initialized = true;
        state.geometry = Some((width, height, fps));
        Ok(())
    }

    fn send_frame(&mut self, frame: &Frame) {
        let mut state = self.state.lock();
        if !state.initialized {
            return;
        }
        state.frame_lens.push(frame.byte_len());
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.stop_calls += 1;
        state.initialized = false;
    }

    fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }
}

/// Observable state of a [`CountingRecorder`].
#[derive(Default)]
pub struct RecorderState {
    pub cameras: Vec<(String, u32, u32)>,
    pub frames: Vec<Frame>,
}

/// Recorder that keeps everything it is handed.
pub struct CountingRecorder {
    pub state: Arc<Mutex<RecorderState>>,
}

impl CountingRecorder {
    pub fn new() -> (Self, Arc<Mutex<RecorderState>>) {
        let state = Arc::new(Mutex::new(RecorderState::default()));
        (
            Self {
                state: state.clone(),
            },
            state,
        )
    }
}

impl FrameRecorder for CountingRecorder {
    fn add_camera(&mut self, name: &str, width: u32, height: u32) {
        self.state.lock().cameras.push((name.to_string(), width, height));
    }

    fn log_frame(&mut self, _name: &str, frame: &Frame) {
        self.state.lock().frames.push(frame.clone());
    }
}

/// Observable state of a [`CountingSurface`].
#[derive(Default)]
pub struct SurfaceState {
    pub shown: Vec<Frame>,
    pub show_times: Vec<Instant>,
    pub close_calls: u32,
}

/// Display surface that records composited frames and their arrival times,
/// optionally requesting quit after a fixed number of frames.
pub struct CountingSurface {
    pub state: Arc<Mutex<SurfaceState>>,
    pub quit_after: Option<usize>,
}

impl CountingSurface {
    pub fn new(quit_after: Option<usize>) -> (Self, Arc<Mutex<SurfaceState>>) {
        let state = Arc::new(Mutex::new(SurfaceState::default()));
        (
            Self {
                state: state.clone(),
                quit_after,
            },
            state,
        )
    }
}

impl DisplaySurface for CountingSurface {
    fn show(&mut self, frame: &Frame) -> DisplayEvent {
        let mut state = self.state.lock();
        state.shown.push(frame.clone());
        state.show_times.push(Instant::now());
        match self.quit_after {
            Some(n) if state.shown.len() >= n => DisplayEvent::QuitRequested,
            _ => DisplayEvent::None,
        }
    }

    fn close(&mut self) {
        self.state.lock().close_calls += 1;
    }
}
