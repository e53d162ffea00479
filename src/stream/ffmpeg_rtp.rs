//! In-process RTP backend via ffmpeg-next
//!
//! Encodes frames with libx264 and muxes them straight to an RTP output
//! context, all inside the distributor's process. Presentation timestamps
//! come from a per-instance frame counter in a `1/fps` time base; a single
//! all-zero warm-up frame (frame 0) is pushed at initialization to drive
//! the encoder past its startup negotiation before real frames arrive.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec::{self, encoder};
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Pixel, output_as};
use ffmpeg_next::software::scaling::{self, Flags};
use ffmpeg_next::util::frame::video::Video;
use ffmpeg_next::{Dictionary, Rational};
use tracing::{debug, info, warn};

use crate::config::StreamSpec;
use crate::error::{Result, SimcastError};
use crate::stream::{BackendKind, StreamerBackend};
use crate::types::Frame;

/// Video streamer encoding in-process and sending RTP.
pub struct FfmpegRtpStreamer {
    host: String,
    port: u16,
    bitrate: u32,
    tune: String,
    speed_preset: String,
    pipeline: Option<RtpPipeline>,
    initialized: bool,
}

/// The live encoder + muxer state, present only while initialized.
struct RtpPipeline {
    encoder: encoder::Video,
    scaler: scaling::Context,
    bgr_frame: Video,
    yuv_frame: Video,
    packet: ffmpeg::Packet,
    output: Output,
    stream_index: usize,
    time_base: Rational,
    width: u32,
    height: u32,
    /// Next presentation index; the warm-up frame consumed index 0.
    frame_count: i64,
}

// SAFETY: `scaling::Context` wraps a raw `SwsContext` pointer that is not
// tied to the thread that created it; the pipeline is only accessed through
// `&mut self`, so moving it across threads is sound. ffmpeg-next makes the
// same assertion for its resampling context but omits it for scaling.
unsafe impl Send for RtpPipeline {}

impl FfmpegRtpStreamer {
    /// Build an instance from one stream entry. The encoder and output
    /// context are not allocated until [`StreamerBackend::initialize`].
    pub fn from_spec(spec: &StreamSpec) -> Self {
        Self {
            host: spec.host.clone(),
            port: spec.port,
            bitrate: spec.bitrate,
            tune: spec.tune.clone(),
            speed_preset: spec.speed_preset.clone(),
            pipeline: None,
            initialized: false,
        }
    }

    fn build_pipeline(&self, width: u32, height: u32, fps: u32) -> Result<RtpPipeline> {
        ffmpeg::init().map_err(|e| SimcastError::encoder(format!("FFmpeg init failed: {}", e)))?;

        let codec = encoder::find_by_name("libx264")
            .ok_or_else(|| SimcastError::encoder("libx264 encoder not found"))?;

        let mut enc = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| SimcastError::encoder(format!("failed to create encoder context: {}", e)))?;

        let time_base = Rational::new(1, fps as i32);
        enc.set_width(width);
        enc.set_height(height);
        enc.set_format(Pixel::YUV420P);
        enc.set_time_base(time_base);
        enc.set_frame_rate(Some(Rational::new(fps as i32, 1)));
        enc.set_bit_rate(self.bitrate as usize * 1000);
        enc.set_gop(fps);

        let mut opts = Dictionary::new();
        opts.set("preset", &self.speed_preset);
        opts.set("tune", &self.tune);

        let encoder = enc
            .open_with(opts)
            .map_err(|e| SimcastError::encoder(format!("failed to open libx264: {}", e)))?;

        let url = format!("rtp://{}:{}", self.host, self.port);
        let mut output = output_as(&url, "rtp")
            .map_err(|e| SimcastError::backend(format!("failed to open RTP output {}: {}", url, e)))?;

        {
            let mut stream = output
                .add_stream(codec)
                .map_err(|e| SimcastError::backend(format!("failed to add RTP stream: {}", e)))?;
            stream.set_parameters(&encoder);
            stream.set_time_base(time_base);
        }
        let stream_index = output.nb_streams() as usize - 1;

        output
            .write_header()
            .map_err(|e| SimcastError::backend(format!("failed to start RTP stream: {}", e)))?;

        let scaler = scaling::Context::get(
            Pixel::BGR24,
            width,
            height,
            Pixel::YUV420P,
            width,
            height,
            Flags::BILINEAR,
        )
        .map_err(|e| SimcastError::encoder(format!("failed to create scaler: {}", e)))?;

        Ok(RtpPipeline {
            encoder,
            scaler,
            bgr_frame: Video::new(Pixel::BGR24, width, height),
            yuv_frame: Video::new(Pixel::YUV420P, width, height),
            packet: ffmpeg::Packet::empty(),
            output,
            stream_index,
            time_base,
            width,
            height,
            frame_count: 0,
        })
    }
}

impl RtpPipeline {
    /// Encode one BGR buffer and write whatever packets come out.
    ///
    /// The encoder's flow-control return is checked on every push: an
    /// `EAGAIN` means "drain first", anything else is a pipeline failure.
    fn push(&mut self, bgr: &[u8]) -> Result<()> {
        let row = self.width as usize * 3;
        let stride = self.bgr_frame.stride(0);
        let plane = self.bgr_frame.data_mut(0);
        for y in 0..self.height as usize {
            plane[y * stride..y * stride + row].copy_from_slice(&bgr[y * row..(y + 1) * row]);
        }

        self.scaler
            .run(&self.bgr_frame, &mut self.yuv_frame)
            .map_err(|e| SimcastError::encoder(format!("scaling failed: {}", e)))?;
        self.yuv_frame.set_pts(Some(self.frame_count));

        match self.encoder.send_frame(&self.yuv_frame) {
            Ok(()) => {}
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => {
                // Encoder wants its output drained before the next input.
                self.drain()?;
                self.encoder
                    .send_frame(&self.yuv_frame)
                    .map_err(|e| SimcastError::encoder(format!("frame rejected: {}", e)))?;
            }
            Err(e) => {
                return Err(SimcastError::encoder(format!("frame rejected: {}", e)));
            }
        }

        self.frame_count += 1;
        self.drain()
    }

    /// Pull every pending packet out of the encoder and into the muxer.
    fn drain(&mut self) -> Result<()> {
        loop {
            match self.encoder.receive_packet(&mut self.packet) {
                Ok(()) => {
                    self.packet.set_stream(self.stream_index);
                    let output_time_base = self
                        .output
                        .stream(self.stream_index)
                        .map(|s| s.time_base())
                        .unwrap_or(Rational::new(1, 90000));
                    self.packet.rescale_ts(self.time_base, output_time_base);
                    self.packet
                        .write_interleaved(&mut self.output)
                        .map_err(|e| SimcastError::backend(format!("RTP write failed: {}", e)))?;
                }
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => break,
                Err(ffmpeg::Error::Eof) => break,
                Err(e) => {
                    return Err(SimcastError::encoder(format!("failed to receive packet: {}", e)));
                }
            }
        }
        Ok(())
    }

    /// Flush the encoder and close the stream.
    fn finish(mut self) -> Result<()> {
        self.encoder
            .send_eof()
            .map_err(|e| SimcastError::encoder(format!("failed to flush encoder: {}", e)))?;
        self.drain()?;
        self.output
            .write_trailer()
            .map_err(|e| SimcastError::backend(format!("failed to close RTP stream: {}", e)))?;
        Ok(())
    }
}

impl StreamerBackend for FfmpegRtpStreamer {
    fn kind(&self) -> BackendKind {
        BackendKind::FfmpegRtp
    }

    fn initialize(&mut self, width: u32, height: u32, fps: u32) -> Result<()> {
        let mut pipeline = self.build_pipeline(width, height, fps)?;

        // Warm-up: one all-zero frame forces the pipeline through its
        // asynchronous startup into the ready state. It counts as frame 0.
        let black = vec![0u8; Frame::expected_len(width, height)];
        pipeline.push(&black)?;

        self.pipeline = Some(pipeline);
        self.initialized = true;
        info!(
            "ffmpeg RTP streamer started -> {}:{} ({}x{} @ {}fps, {}kbps)",
            self.host, self.port, width, height, fps, self.bitrate
        );
        Ok(())
    }

    fn send_frame(&mut self, frame: &Frame) {
        if !self.initialized {
            return;
        }
        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };

        if frame.byte_len() != Frame::expected_len(pipeline.width, pipeline.height) {
            warn!(
                "frame for camera '{}' is {} bytes, pipeline expects {}; dropping",
                frame.camera,
                frame.byte_len(),
                Frame::expected_len(pipeline.width, pipeline.height)
            );
            return;
        }

        if let Err(e) = pipeline.push(&frame.data) {
            warn!("ffmpeg RTP pipeline failed ({}); stopping streamer", e);
            self.initialized = false;
            self.pipeline = None;
            return;
        }

        if pipeline.frame_count % 300 == 0 {
            debug!(
                "ffmpeg_rtp {}:{}: {} frames encoded",
                self.host, self.port, pipeline.frame_count
            );
        }
    }

    fn stop(&mut self) {
        let Some(pipeline) = self.pipeline.take() else {
            self.initialized = false;
            return;
        };
        let frames = pipeline.frame_count;
        if let Err(e) = pipeline.finish() {
            warn!("ffmpeg RTP streamer teardown incomplete: {}", e);
        }
        self.initialized = false;
        info!("ffmpeg RTP streamer stopped ({} frames encoded)", frames);
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Drop for FfmpegRtpStreamer {
    fn drop(&mut self) {
        if self.pipeline.is_some() {
            self.stop();
        }
    }
}
