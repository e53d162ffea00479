//! Streamer registry
//!
//! Maps camera names to their configured streaming backends and fans one
//! frame out to all of them. This is the single interface the frame
//! distributor talks to for network streaming.

use tracing::{info, warn};

use crate::config::{StreamSpec, StreamingConfig};
use crate::stream::{BackendKind, FfmpegRtpStreamer, GstUdpStreamer, StreamerBackend};
use crate::types::Frame;

/// Per-camera registry of streaming backends.
///
/// One camera may fan out to several independent sinks; backends are kept
/// in declaration order. Backends are exclusively owned here and are not
/// reusable after [`StreamerManager::stop`].
#[derive(Default)]
pub struct StreamerManager {
    // Vec keeps camera registration order deterministic for logs.
    streamers: Vec<(String, Vec<Box<dyn StreamerBackend>>)>,
}

impl StreamerManager {
    /// Empty registry with no backends.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from the streaming config section.
    ///
    /// Entries with an unknown backend kind are skipped with a warning;
    /// with `enabled = false` the registry stays empty.
    pub fn from_config(config: &StreamingConfig) -> Self {
        let mut manager = Self::new();
        if !config.enabled {
            return manager;
        }

        for spec in &config.streams {
            let Some(backend) = build_backend(spec) else {
                warn!(
                    "unknown streaming backend '{}' for camera '{}'; available: {:?}",
                    spec.backend,
                    spec.camera,
                    BackendKind::known_names()
                );
                continue;
            };
            info!(
                "registered streamer: {} for camera '{}' -> {}:{}",
                backend.kind(),
                spec.camera,
                spec.host,
                spec.port
            );
            manager.register(&spec.camera, backend);
        }
        manager
    }

    /// Append a backend under the given camera.
    pub fn register(&mut self, camera: &str, backend: Box<dyn StreamerBackend>) {
        match self.streamers.iter_mut().find(|(name, _)| name == camera) {
            Some((_, backends)) => backends.push(backend),
            None => self.streamers.push((camera.to_string(), vec![backend])),
        }
    }

    /// Initialize every backend registered under `camera` with its frame
    /// geometry. Cameras with no registered backend are a silent no-op.
    pub fn initialize_camera(&mut self, camera: &str, width: u32, height: u32, fps: u32) {
        let Some((_, backends)) = self.streamers.iter_mut().find(|(name, _)| name == camera) else {
            return;
        };
        for backend in backends {
            if let Err(e) = backend.initialize(width, height, fps) {
                warn!(
                    "failed to initialize {} streamer for camera '{}': {}",
                    backend.kind(),
                    camera,
                    e
                );
            }
        }
    }

    /// Fan a frame out to every initialized backend for this camera.
    /// Dead backends are skipped without retrying.
    pub fn send_frame(&mut self, camera: &str, frame: &Frame) {
        let Some((_, backends)) = self.streamers.iter_mut().find(|(name, _)| name == camera) else {
            return;
        };
        for backend in backends {
            if backend.is_initialized() {
                backend.send_frame(frame);
            }
        }
    }

    /// Distinct camera names with at least one registered backend.
    pub fn get_cameras(&self) -> Vec<String> {
        self.streamers.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Number of registered backends across all cameras.
    pub fn backend_count(&self) -> usize {
        self.streamers.iter().map(|(_, b)| b.len()).sum()
    }

    /// True when no backend is registered.
    pub fn is_empty(&self) -> bool {
        self.streamers.is_empty()
    }

    /// Count of backends currently in the initialized state for a camera.
    pub fn initialized_count(&self, camera: &str) -> usize {
        self.streamers
            .iter()
            .find(|(name, _)| name == camera)
            .map(|(_, backends)| backends.iter().filter(|b| b.is_initialized()).count())
            .unwrap_or(0)
    }

    /// Stop every backend and clear the registry. Idempotent.
    pub fn stop(&mut self) {
        if self.streamers.is_empty() {
            return;
        }
        for (_, backends) in &mut self.streamers {
            for backend in backends {
                backend.stop();
            }
        }
        self.streamers.clear();
        info!("streamer manager: all streamers stopped");
    }
}

/// Closed kind -> constructor mapping. Adding a backend means adding a
/// [`BackendKind`] variant and an arm here.
fn build_backend(spec: &StreamSpec) -> Option<Box<dyn StreamerBackend>> {
    match BackendKind::from_name(&spec.backend)? {
        BackendKind::GstUdp => Some(Box::new(GstUdpStreamer::from_spec(spec))),
        BackendKind::FfmpegRtp => Some(Box::new(FfmpegRtpStreamer::from_spec(spec))),
    }
}
