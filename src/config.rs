//! Configuration types for simcast
//!
//! The distributor, display, video-logging, and streaming sections of the
//! scene configuration, loaded from TOML. Every field has a default so a
//! minimal config stays minimal.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, SimcastError};

/// Top-level configuration for the frame distribution subsystem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributorConfig {
    /// Target frame cadence for the distribution loop
    #[serde(default = "default_render_fps")]
    pub render_fps: u32,

    /// Display compositing settings
    #[serde(default)]
    pub display: DisplayConfig,

    /// Video-file logging settings
    #[serde(default)]
    pub video_logging: VideoLoggingConfig,

    /// Network streaming settings
    #[serde(default)]
    pub streaming: StreamingConfig,
}

impl Default for DistributorConfig {
    fn default() -> Self {
        Self {
            render_fps: default_render_fps(),
            display: DisplayConfig::default(),
            video_logging: VideoLoggingConfig::default(),
            streaming: StreamingConfig::default(),
        }
    }
}

impl DistributorConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SimcastError::config(format!("invalid config: {}", e)))
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }
}

/// How multiple camera frames are combined into the display window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayLayout {
    /// Frames concatenated side by side
    #[default]
    Horizontal,
    /// Frames stacked top to bottom
    Vertical,
    /// Frames arranged in a grid with `grid_cols` columns
    Grid,
}

/// Display compositing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Layout policy for multi-camera display
    #[serde(default)]
    pub layout: DisplayLayout,

    /// Number of columns when `layout = "grid"`
    #[serde(default = "default_grid_cols")]
    pub grid_cols: u32,

    /// Title of the composited display window
    #[serde(default = "default_window_name")]
    pub window_name: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            layout: DisplayLayout::default(),
            grid_cols: default_grid_cols(),
            window_name: default_window_name(),
        }
    }
}

/// Video-file logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoLoggingConfig {
    /// Cameras whose frames are handed to the recorder
    #[serde(default)]
    pub cameras: Vec<String>,
}

/// Network streaming settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamingConfig {
    /// Master switch; when false the streamer manager builds nothing
    #[serde(default)]
    pub enabled: bool,

    /// One entry per outbound stream
    #[serde(default)]
    pub streams: Vec<StreamSpec>,
}

/// One declarative stream entry: which camera, which backend, where to.
///
/// Immutable once loaded; each entry produces exactly one backend instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSpec {
    /// Camera to stream
    pub camera: String,

    /// Backend kind name, resolved against the closed set of known backends
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Destination host
    #[serde(default = "default_host")]
    pub host: String,

    /// Destination port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Encoder bitrate in kbit/s
    #[serde(default = "default_bitrate")]
    pub bitrate: u32,

    /// x264 tune knob
    #[serde(default = "default_tune")]
    pub tune: String,

    /// x264 speed preset
    #[serde(default = "default_speed_preset")]
    pub speed_preset: String,
}

impl StreamSpec {
    /// Entry for the given camera with every transport knob defaulted.
    pub fn for_camera(camera: impl Into<String>) -> Self {
        Self {
            camera: camera.into(),
            backend: default_backend(),
            host: default_host(),
            port: default_port(),
            bitrate: default_bitrate(),
            tune: default_tune(),
            speed_preset: default_speed_preset(),
        }
    }
}

fn default_render_fps() -> u32 {
    30
}

fn default_grid_cols() -> u32 {
    2
}

fn default_window_name() -> String {
    "Camera Views".to_string()
}

fn default_backend() -> String {
    "gstreamer_udp".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_bitrate() -> u32 {
    2000
}

fn default_tune() -> String {
    "zerolatency".to_string()
}

fn default_speed_preset() -> String {
    "ultrafast".to_string()
}
