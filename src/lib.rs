//! Simcast Core Library
//!
//! Camera frame distribution and multi-backend streaming for robot
//! simulators.
//!
//! This library provides:
//! - A timed distribution loop that renders each simulator camera once per
//!   tick and fans the frame out to every consumer
//! - A per-camera registry of streaming backends (GStreamer subprocess,
//!   in-process ffmpeg RTP)
//! - Display compositing (name overlay, horizontal/vertical/grid layouts)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌───────────────────┐    ┌──────────────────┐
//! │  Simulator   │───▶│ Frame Distributor │───▶│ Recorder         │
//! │  (renderers) │    │ (1 render/tick)   │    │ Streamer Manager │
//! └──────────────┘    └───────────────────┘    │ Display Surface  │
//!                                              └──────────────────┘
//! ```
//!
//! The loop is fully synchronous: one tick renders all cameras under the
//! shared scene lock's briefest possible scope, then pushes the same frames
//! to the recorder, the streamer manager, and the display, in that order.

pub mod config;
pub mod display;
pub mod distributor;
pub mod error;
pub mod registry;
pub mod stream;
pub mod types;

pub use config::{
    DisplayConfig, DisplayLayout, DistributorConfig, StreamSpec, StreamingConfig,
    VideoLoggingConfig,
};
pub use display::{DisplayEvent, DisplaySurface};
pub use distributor::{DistributorHandle, FnRenderer, FrameDistributor};
pub use error::{Result, SimcastError};
pub use registry::StreamerManager;
pub use stream::{BackendKind, FfmpegRtpStreamer, GstUdpStreamer, StreamerBackend};
pub use types::{CameraRenderer, Frame, FrameRecorder, SceneHandle};
