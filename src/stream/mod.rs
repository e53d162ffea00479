//! Streaming backends
//!
//! A [`StreamerBackend`] turns a sequence of frames into an outbound stream.
//! Two interchangeable strategies are provided:
//!
//! - [`GstUdpStreamer`]: pipes raw frames into an external `gst-launch-1.0`
//!   process that encodes and sends RTP over UDP
//! - [`FfmpegRtpStreamer`]: encodes in-process with libx264 via ffmpeg-next
//!   and muxes straight to an RTP output
//!
//! Callers never see which strategy backs a stream; the registry picks one
//! per configured entry from the closed [`BackendKind`] set.

mod ffmpeg_rtp;
mod gst_udp;

pub use ffmpeg_rtp::FfmpegRtpStreamer;
pub use gst_udp::GstUdpStreamer;

use crate::error::Result;
use crate::types::Frame;

/// The closed set of known streaming backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Out-of-process GStreamer pipeline, RTP over UDP
    GstUdp,
    /// In-process ffmpeg-next x264 encoder, RTP output
    FfmpegRtp,
}

impl BackendKind {
    /// Resolve a configured backend name. Unknown names return `None`;
    /// the registry treats that as a non-fatal config error.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gstreamer_udp" => Some(Self::GstUdp),
            "ffmpeg_rtp" => Some(Self::FfmpegRtp),
            _ => None,
        }
    }

    /// The config-facing name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GstUdp => "gstreamer_udp",
            Self::FfmpegRtp => "ffmpeg_rtp",
        }
    }

    /// All known backend names, for diagnostics.
    pub fn known_names() -> &'static [&'static str] {
        &["gstreamer_udp", "ffmpeg_rtp"]
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Capability contract every streaming backend satisfies.
///
/// Lifecycle: constructed from a stream entry, `initialize`d once with the
/// camera's geometry and target cadence, fed one frame per tick, `stop`ped.
/// A backend that loses its pipeline mid-stream transitions itself back to
/// the uninitialized state and silently drops subsequent frames; nothing in
/// this contract is allowed to panic or to hang the distribution loop.
pub trait StreamerBackend: Send {
    /// Which strategy backs this instance.
    fn kind(&self) -> BackendKind;

    /// Launch the underlying pipeline sized for the given geometry and fps.
    ///
    /// On failure the instance stays uninitialized and the caller proceeds
    /// degraded. Calling this a second time is not supported.
    fn initialize(&mut self, width: u32, height: u32, fps: u32) -> Result<()>;

    /// Push one frame, sized to the geometry given at `initialize`.
    ///
    /// No-op when uninitialized. A dead pipeline is detected here and
    /// demotes the backend to uninitialized with a diagnostic.
    fn send_frame(&mut self, frame: &Frame);

    /// Release the pipeline. Safe to call repeatedly and on instances that
    /// were never initialized; any wait on process exit is bounded.
    fn stop(&mut self);

    /// Cheap, side-effect-free status query.
    fn is_initialized(&self) -> bool;
}
