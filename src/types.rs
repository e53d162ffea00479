//! Core types for simcast
//!
//! The frame buffer handed to every consumer, and the collaborator traits
//! that mark the boundary to the simulator and the video recorder. The
//! simulator owns the renderers and the scene state; this crate only defines
//! what it needs from them.

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, SimcastError};

/// Bytes per pixel. Frames are always 3-channel BGR, uint8.
pub const FRAME_CHANNELS: usize = 3;

/// One rendered camera image, tagged with the producing camera.
///
/// Frames are transient: rendered once per tick, fanned out to every
/// consumer on the same thread, then dropped. Nothing queues or reuses a
/// frame across ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Name of the camera that produced this frame
    pub camera: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// BGR24 pixel data, row-major, tightly packed
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap an existing BGR buffer, validating the byte-length invariant.
    pub fn new(camera: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = Self::expected_len(width, height);
        if data.len() != expected {
            return Err(SimcastError::config(format!(
                "frame buffer is {} bytes, expected {} for {}x{} BGR",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            camera: camera.into(),
            width,
            height,
            data,
        })
    }

    /// All-zero frame of the given geometry. Used as the encoder warm-up
    /// frame and as grid padding in the display compositor.
    pub fn black(camera: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            camera: camera.into(),
            width,
            height,
            data: vec![0u8; Self::expected_len(width, height)],
        }
    }

    /// Build a frame from a renderer's RGB24 output, swapping to the BGR
    /// channel order every transport expects.
    pub fn from_rgb(camera: impl Into<String>, width: u32, height: u32, rgb: &[u8]) -> Result<Self> {
        let expected = Self::expected_len(width, height);
        if rgb.len() != expected {
            return Err(SimcastError::config(format!(
                "renderer produced {} bytes, expected {} for {}x{} RGB",
                rgb.len(),
                expected,
                width,
                height
            )));
        }
        let mut data = Vec::with_capacity(expected);
        for px in rgb.chunks_exact(FRAME_CHANNELS) {
            data.extend_from_slice(&[px[2], px[1], px[0]]);
        }
        Ok(Self {
            camera: camera.into(),
            width,
            height,
            data,
        })
    }

    /// Expected buffer length for a given geometry.
    pub fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * FRAME_CHANNELS
    }

    /// Length of the pixel buffer in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

/// A named virtual viewpoint owned by the simulator.
///
/// `S` is the simulator's scene-state type; this crate never looks inside
/// it. Width and height must not change after a consumer has sized itself
/// from them.
pub trait CameraRenderer<S>: Send {
    /// Frame width in pixels
    fn width(&self) -> u32;

    /// Frame height in pixels
    fn height(&self) -> u32;

    /// Refresh this renderer's view of the simulation state.
    ///
    /// Must only be called while the [`SceneHandle`] lock is held; the
    /// simulator's stepping thread mutates `S` under the same lock.
    fn update_scene(&mut self, state: &S);

    /// Render the current view as a tightly packed RGB24 buffer.
    fn render(&mut self) -> Vec<u8>;
}

/// Boundary contract for the video-file recorder.
pub trait FrameRecorder: Send {
    /// Register a camera before any frames are logged for it.
    fn add_camera(&mut self, name: &str, width: u32, height: u32);

    /// Persist one frame for a previously registered camera.
    fn log_frame(&mut self, name: &str, frame: &Frame);
}

/// Shared handle to the simulator's scene state.
///
/// The stepping thread and the frame distributor serialize access to `S`
/// through this one lock; everything else in the distribution loop (render,
/// convert, fan out) runs unlocked.
pub struct SceneHandle<S> {
    state: Mutex<S>,
    running: AtomicBool,
}

impl<S> SceneHandle<S> {
    /// Wrap a scene state. The simulation starts in the running state.
    pub fn new(state: S) -> Self {
        Self {
            state: Mutex::new(state),
            running: AtomicBool::new(true),
        }
    }

    /// Lock the scene state. Keep the critical section minimal.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.state.lock()
    }

    /// Whether the simulation is still advancing.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Mark the simulation as stopped. The distributor exits its loop on
    /// the next iteration.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_byte_length_invariant() {
        let frame = Frame::black("cam0", 320, 240);
        assert_eq!(frame.byte_len(), 320 * 240 * 3);

        let err = Frame::new("cam0", 320, 240, vec![0u8; 100]);
        assert!(err.is_err());
    }

    #[test]
    fn test_from_rgb_swaps_channels() {
        // One red RGB pixel becomes one red BGR pixel (B=0, G=0, R=255)
        let frame = Frame::from_rgb("cam0", 1, 1, &[255, 0, 0]).unwrap();
        assert_eq!(frame.data, vec![0, 0, 255]);
    }

    #[test]
    fn test_from_rgb_rejects_wrong_length() {
        assert!(Frame::from_rgb("cam0", 2, 2, &[0u8; 3]).is_err());
    }

    #[test]
    fn test_scene_handle_shutdown() {
        let scene = SceneHandle::new(());
        assert!(scene.is_running());
        scene.shutdown();
        assert!(!scene.is_running());
    }
}
