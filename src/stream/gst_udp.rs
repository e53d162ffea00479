//! Out-of-process GStreamer RTP/UDP backend
//!
//! Spawns `gst-launch-1.0` with a generated pipeline description and feeds
//! it raw BGR frames over stdin. This avoids any GStreamer library binding:
//! geometry and cadence are baked into the pipeline string at spawn time, so
//! a geometry change means a fresh instance.
//!
//! Receive side example (on the consumer machine):
//!
//! ```text
//! gst-launch-1.0 udpsrc port=5000 caps="application/x-rtp,encoding-name=H264,payload=96" \
//!     ! rtph264depay ! avdec_h264 ! videoconvert ! autovideosink sync=false
//! ```

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::StreamSpec;
use crate::error::{Result, SimcastError};
use crate::stream::{BackendKind, StreamerBackend};
use crate::types::Frame;

/// Executable launched for each stream.
const GST_LAUNCH: &str = "gst-launch-1.0";

/// Grace period for the pipeline to drain and exit after stdin closes.
const STOP_TIMEOUT: Duration = Duration::from_secs(3);

/// Low-latency video streamer piping raw frames to a GStreamer subprocess.
pub struct GstUdpStreamer {
    host: String,
    port: u16,
    bitrate: u32,
    tune: String,
    speed_preset: String,
    width: u32,
    height: u32,
    process: Option<Child>,
    initialized: bool,
    frames_sent: u64,
}

impl GstUdpStreamer {
    /// Build an instance from one stream entry. Nothing is launched until
    /// [`StreamerBackend::initialize`].
    pub fn from_spec(spec: &StreamSpec) -> Self {
        Self {
            host: spec.host.clone(),
            port: spec.port,
            bitrate: spec.bitrate,
            tune: spec.tune.clone(),
            speed_preset: spec.speed_preset.clone(),
            width: 0,
            height: 0,
            process: None,
            initialized: false,
            frames_sent: 0,
        }
    }

    /// The pipeline description handed to gst-launch:
    /// rawvideo on stdin -> x264enc -> rtph264pay -> udpsink.
    fn pipeline_description(&self, width: u32, height: u32, fps: u32) -> String {
        format!(
            "fdsrc fd=0 \
             ! rawvideoparse width={width} height={height} format=bgr framerate={fps}/1 \
             ! videoconvert \
             ! x264enc tune={tune} speed-preset={preset} bitrate={bitrate} key-int-max={fps} \
             ! rtph264pay config-interval=1 pt=96 \
             ! udpsink host={host} port={port} sync=false",
            width = width,
            height = height,
            fps = fps,
            tune = self.tune,
            preset = self.speed_preset,
            bitrate = self.bitrate,
            host = self.host,
            port = self.port,
        )
    }

    /// Demote to uninitialized and reap the child if one is still around.
    fn fail(&mut self) {
        self.initialized = false;
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// Spawn the pipeline process with stdin piped. Split out so tests can
/// exercise the missing-binary path with a bogus executable name.
fn spawn_pipeline(binary: &str, description: &str) -> std::io::Result<Child> {
    Command::new(binary)
        .args(description.split_whitespace())
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
}

impl StreamerBackend for GstUdpStreamer {
    fn kind(&self) -> BackendKind {
        BackendKind::GstUdp
    }

    fn initialize(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        self.width = width;
        self.height = height;

        let description = self.pipeline_description(width, height, fps);
        debug!("gst-launch pipeline: {}", description);

        let child = spawn_pipeline(GST_LAUNCH, &description).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SimcastError::backend(format!(
                    "{} not found; install GStreamer to use UDP streaming",
                    GST_LAUNCH
                ))
            } else {
                SimcastError::backend(format!("failed to start GStreamer pipeline: {}", e))
            }
        })?;

        self.process = Some(child);
        self.initialized = true;
        info!(
            "GStreamer UDP streamer started -> {}:{} ({}x{} @ {}fps, {}kbps)",
            self.host, self.port, width, height, fps, self.bitrate
        );
        Ok(())
    }

    fn send_frame(&mut self, frame: &Frame) {
        if !self.initialized {
            return;
        }
        let Some(child) = self.process.as_mut() else {
            return;
        };

        if frame.byte_len() != Frame::expected_len(self.width, self.height) {
            warn!(
                "frame for camera '{}' is {} bytes, pipeline expects {}; dropping",
                frame.camera,
                frame.byte_len(),
                Frame::expected_len(self.width, self.height)
            );
            return;
        }

        // Non-blocking liveness poll before touching stdin.
        match child.try_wait() {
            Ok(Some(status)) => {
                warn!("GStreamer pipeline exited unexpectedly ({})", status);
                self.fail();
                return;
            }
            Err(e) => {
                warn!("failed to poll GStreamer pipeline: {}", e);
                self.fail();
                return;
            }
            Ok(None) => {}
        }

        let Some(stdin) = child.stdin.as_mut() else {
            self.fail();
            return;
        };

        // A full pipe buffer blocks here; that is the subsystem's one
        // backpressure point and is accepted as latency, not an error.
        if let Err(e) = stdin.write_all(&frame.data).and_then(|_| stdin.flush()) {
            warn!("GStreamer pipeline write failed ({}); stopping streamer", e);
            self.fail();
            return;
        }

        self.frames_sent += 1;
        if self.frames_sent % 300 == 0 {
            debug!(
                "gstreamer_udp {}:{}: {} frames piped",
                self.host, self.port, self.frames_sent
            );
        }
    }

    fn stop(&mut self) {
        let Some(mut child) = self.process.take() else {
            self.initialized = false;
            return;
        };

        // Closing stdin signals EOF; give the pipeline a bounded window to
        // drain, then force-terminate.
        drop(child.stdin.take());
        let deadline = Instant::now() + STOP_TIMEOUT;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                _ => {
                    let _ = child.kill();
                    let _ = child.wait();
                    break;
                }
            }
        }

        self.initialized = false;
        info!("GStreamer UDP streamer stopped ({} frames sent)", self.frames_sent);
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Drop for GstUdpStreamer {
    fn drop(&mut self) {
        if self.process.is_some() {
            self.stop();
        }
    }
}
