//! Frame distributor
//!
//! The timed loop at the heart of the subsystem: renders each configured
//! camera once per tick and fans the frames out to every registered
//! consumer. Rendering happens once no matter how many consumers are
//! attached; pacing is wall-clock, degrading gracefully when a tick costs
//! more than the frame interval.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::DistributorConfig;
use crate::display::{self, DisplayEvent, DisplaySurface};
use crate::registry::StreamerManager;
use crate::types::{CameraRenderer, Frame, FrameRecorder, SceneHandle};

/// Pulls frames from simulation renderers and distributes them to all
/// consumers.
///
/// Consumers (display surface, video recorder, streamer manager) are all
/// optional and registered before [`run`](Self::run). The loop runs on the
/// calling thread (display toolkits usually require the main thread); the
/// simulator steps physics elsewhere and the two meet only at the
/// [`SceneHandle`] lock.
pub struct FrameDistributor<S> {
    scene: Arc<SceneHandle<S>>,
    renderers: BTreeMap<String, Box<dyn CameraRenderer<S>>>,
    config: DistributorConfig,
    frame_interval: Duration,
    running: Arc<AtomicBool>,
    recorder: Option<Box<dyn FrameRecorder>>,
    streamers: Option<StreamerManager>,
    surface: Option<Box<dyn DisplaySurface>>,
    ticks: u64,
    started: Option<Instant>,
}

/// Cloneable handle for stopping the distributor from another thread.
#[derive(Clone)]
pub struct DistributorHandle {
    running: Arc<AtomicBool>,
}

impl DistributorHandle {
    /// Clear the running flag; the loop exits on its next pass.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the loop is still marked as running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl<S> FrameDistributor<S> {
    /// Create a distributor over the shared scene with no renderers and no
    /// consumers attached.
    pub fn new(scene: Arc<SceneHandle<S>>, config: DistributorConfig) -> Self {
        let fps = config.render_fps.max(1);
        Self {
            scene,
            renderers: BTreeMap::new(),
            frame_interval: Duration::from_secs_f64(1.0 / fps as f64),
            config,
            running: Arc::new(AtomicBool::new(false)),
            recorder: None,
            streamers: None,
            surface: None,
            ticks: 0,
            started: None,
        }
    }

    /// Register a camera renderer under its camera name.
    pub fn add_renderer(&mut self, name: impl Into<String>, renderer: Box<dyn CameraRenderer<S>>) {
        self.renderers.insert(name.into(), renderer);
    }

    /// Number of registered renderers.
    pub fn renderer_count(&self) -> usize {
        self.renderers.len()
    }

    /// Target frame interval derived from the configured fps.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// Handle for stopping the loop from another thread.
    pub fn handle(&self) -> DistributorHandle {
        DistributorHandle {
            running: self.running.clone(),
        }
    }

    /// Attach the display surface the composited frames are shown on.
    pub fn set_display_surface(&mut self, surface: Box<dyn DisplaySurface>) {
        self.surface = Some(surface);
    }

    /// Attach the video recorder and register each configured camera's
    /// geometry with it. Cameras missing from the renderer set are skipped
    /// with a warning.
    pub fn set_video_logger(&mut self, mut recorder: Box<dyn FrameRecorder>) {
        for camera in &self.config.video_logging.cameras {
            match self.renderers.get(camera) {
                Some(renderer) => {
                    recorder.add_camera(camera, renderer.width(), renderer.height());
                }
                None => warn!("camera '{}' not found for video logging", camera),
            }
        }
        self.recorder = Some(recorder);
    }

    /// Attach the streamer manager and initialize its pipelines with each
    /// camera's frame geometry and the loop cadence.
    pub fn set_streamer_manager(&mut self, mut manager: StreamerManager) {
        let fps = self.config.render_fps;
        for camera in manager.get_cameras() {
            match self.renderers.get(&camera) {
                Some(renderer) => {
                    manager.initialize_camera(&camera, renderer.width(), renderer.height(), fps);
                }
                None => warn!("camera '{}' not found for streaming", camera),
            }
        }
        self.streamers = Some(manager);
    }

    /// Blocking frame distribution loop.
    ///
    /// Each iteration renders every camera once, fans the frames out, then
    /// sleeps whatever remains of the frame interval. With a tick that
    /// costs more than the interval the loop free-runs instead of
    /// accumulating debt. Exits when [`stop`](Self::stop) is called, a
    /// display surface requests quit, or the simulation stops.
    pub fn run(&mut self) {
        if self.renderers.is_empty() {
            warn!("no renderers configured; frame distributor exiting");
            return;
        }

        self.running.store(true, Ordering::SeqCst);
        self.started = Some(Instant::now());
        info!(
            "frame distributor running: {} cameras @ {}fps",
            self.renderers.len(),
            self.config.render_fps
        );

        while self.running.load(Ordering::SeqCst) && self.scene.is_running() {
            let tick_start = Instant::now();
            self.tick();

            if let Some(remaining) = self.frame_interval.checked_sub(tick_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        if let Some(mut surface) = self.surface.take() {
            surface.close();
        }
        info!("frame distributor stopped after {} ticks", self.ticks);
    }

    /// Clear the running flag. The loop notices within one tick (plus any
    /// pending blocking pipeline write) and releases the display on exit.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Stop every streaming pipeline. Called by the owner at shutdown; also
    /// happens implicitly when the distributor is dropped.
    pub fn stop_streamers(&mut self) {
        if let Some(manager) = self.streamers.as_mut() {
            manager.stop();
        }
    }

    /// Render all cameras once and distribute to consumers.
    fn tick(&mut self) {
        // Scene refresh is the only step needing exclusive access; render,
        // convert and fan-out all run unlocked so the simulator keeps
        // stepping.
        {
            let state = self.scene.lock();
            for renderer in self.renderers.values_mut() {
                renderer.update_scene(&state);
            }
        }

        let mut frames: Vec<Frame> = Vec::with_capacity(self.renderers.len());
        for (name, renderer) in &mut self.renderers {
            let rgb = renderer.render();
            match Frame::from_rgb(name.clone(), renderer.width(), renderer.height(), &rgb) {
                Ok(frame) => frames.push(frame),
                Err(e) => warn!("renderer '{}' produced a bad frame: {}", name, e),
            }
        }

        // Fixed consumer order: recorder, streamers, display. Display comes
        // last so the name overlay never reaches recorded or streamed bytes.
        if let Some(recorder) = self.recorder.as_mut() {
            for camera in &self.config.video_logging.cameras {
                if let Some(frame) = frames.iter().find(|f| &f.camera == camera) {
                    recorder.log_frame(camera, frame);
                }
            }
        }

        if let Some(manager) = self.streamers.as_mut() {
            for frame in &frames {
                manager.send_frame(&frame.camera, frame);
            }
        }

        if let Some(surface) = self.surface.as_mut() {
            for frame in &mut frames {
                display::annotate_camera_name(frame);
            }
            if let Some(combined) = display::compose(&frames, &self.config.display) {
                if surface.show(&combined) == DisplayEvent::QuitRequested {
                    info!("user requested stop from display surface");
                    self.running.store(false, Ordering::SeqCst);
                }
            }
        }

        self.ticks += 1;
        if self.ticks % 300 == 0 {
            let elapsed = self.started.map(|t| t.elapsed().as_secs_f64()).unwrap_or(0.0);
            debug!(
                "distributor: {} ticks ({:.1} fps measured)",
                self.ticks,
                if elapsed > 0.0 { self.ticks as f64 / elapsed } else { 0.0 }
            );
        }
    }
}

/// Convenience wrapper making a closure a [`CameraRenderer`] for simple
/// procedural cameras and tests.
pub struct FnRenderer<S, F> {
    width: u32,
    height: u32,
    render_fn: F,
    _marker: std::marker::PhantomData<fn(&S)>,
}

impl<S, F> FnRenderer<S, F>
where
    F: FnMut(u32, u32) -> Vec<u8> + Send,
{
    /// Renderer of fixed geometry that ignores scene state and delegates
    /// to `render_fn(width, height)`.
    pub fn new(width: u32, height: u32, render_fn: F) -> Self {
        Self {
            width,
            height,
            render_fn,
            _marker: std::marker::PhantomData,
        }
    }
}

impl<S, F> CameraRenderer<S> for FnRenderer<S, F>
where
    F: FnMut(u32, u32) -> Vec<u8> + Send,
{
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn update_scene(&mut self, _state: &S) {}

    fn render(&mut self) -> Vec<u8> {
        (self.render_fn)(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_with_no_renderers_exits_immediately() {
        let scene = Arc::new(SceneHandle::new(()));
        let mut distributor =
            FrameDistributor::new(scene, DistributorConfig::default());
        let start = Instant::now();
        distributor.run();
        assert!(start.elapsed() < Duration::from_millis(100));
        assert!(!distributor.handle().is_running());
    }

    #[test]
    fn test_frame_interval_from_fps() {
        let scene = Arc::new(SceneHandle::<()>::new(()));
        let config = DistributorConfig {
            render_fps: 10,
            ..Default::default()
        };
        let distributor = FrameDistributor::new(scene, config);
        assert_eq!(distributor.frame_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_fn_renderer_geometry() {
        let renderer: FnRenderer<(), _> =
            FnRenderer::new(320, 240, |w, h| vec![0u8; (w * h * 3) as usize]);
        assert_eq!(renderer.width(), 320);
        assert_eq!(renderer.height(), 240);
    }
}
