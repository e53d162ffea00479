//! Display compositing
//!
//! Annotates each camera frame with its name and combines the set into one
//! surface according to the configured layout. The window itself is behind
//! the [`DisplaySurface`] trait: display toolkits are platform-specific and
//! usually demand the main thread, so the embedding application supplies
//! the surface and the distributor's loop runs on whatever thread owns it.

use crate::config::{DisplayConfig, DisplayLayout};
use crate::types::{FRAME_CHANNELS, Frame};

/// Event reported back from a display surface after showing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    /// Nothing happened
    None,
    /// The user asked to quit (e.g. pressed 'q' in the window)
    QuitRequested,
}

/// One named on-screen window fed composited frames at the loop cadence.
///
/// `show` is called once per tick with the combined frame; returning
/// [`DisplayEvent::QuitRequested`] stops the distribution loop on its next
/// pass. `close` must be idempotent; the loop exit path and an explicit
/// stop may both call it.
pub trait DisplaySurface: Send {
    /// Present one composited frame. Must not block past a vsync.
    fn show(&mut self, frame: &Frame) -> DisplayEvent;

    /// Release the window. Safe to call more than once.
    fn close(&mut self);
}

/// Combine annotated camera frames into a single surface per the layout
/// policy. Returns `None` for an empty frame set.
///
/// A grid is padded with black frames to complete its last row. Cells of
/// unequal geometry are aligned top-left and padded with black pixels; no
/// extra frames are added for a geometry mismatch alone.
pub fn compose(frames: &[Frame], config: &DisplayConfig) -> Option<Frame> {
    let first = frames.first()?;
    if frames.len() == 1 {
        let mut combined = first.clone();
        combined.camera = config.window_name.clone();
        return Some(combined);
    }

    let combined = match config.layout {
        DisplayLayout::Horizontal => hconcat(frames, &config.window_name),
        DisplayLayout::Vertical => vconcat(frames, &config.window_name),
        DisplayLayout::Grid => {
            let cols = config.grid_cols.max(1) as usize;
            let rows = frames.len().div_ceil(cols);

            let mut padded: Vec<Frame> = frames.to_vec();
            while padded.len() < rows * cols {
                padded.push(Frame::black(&first.camera, first.width, first.height));
            }

            let row_frames: Vec<Frame> = padded
                .chunks(cols)
                .map(|row| hconcat(row, &config.window_name))
                .collect();
            vconcat(&row_frames, &config.window_name)
        }
    };
    Some(combined)
}

/// Overlay the frame's camera name in the top-left corner.
pub fn annotate_camera_name(frame: &mut Frame) {
    let label = frame.camera.clone();
    draw_label(frame, &label, 10, 8);
}

/// Frames side by side, rows aligned at the top, short frames padded black.
fn hconcat(frames: &[Frame], camera: &str) -> Frame {
    let width: u32 = frames.iter().map(|f| f.width).sum();
    let height: u32 = frames.iter().map(|f| f.height).max().unwrap_or(0);
    let mut out = Frame::black(camera, width, height);
    let mut x = 0;
    for frame in frames {
        blit(frame, &mut out, x, 0);
        x += frame.width;
    }
    out
}

/// Frames stacked top to bottom, columns aligned left, narrow frames padded
/// black.
fn vconcat(frames: &[Frame], camera: &str) -> Frame {
    let width: u32 = frames.iter().map(|f| f.width).max().unwrap_or(0);
    let height: u32 = frames.iter().map(|f| f.height).sum();
    let mut out = Frame::black(camera, width, height);
    let mut y = 0;
    for frame in frames {
        blit(frame, &mut out, 0, y);
        y += frame.height;
    }
    out
}

/// Copy `src` into `dst` with its top-left corner at (x, y).
fn blit(src: &Frame, dst: &mut Frame, x: u32, y: u32) {
    let src_row = src.width as usize * FRAME_CHANNELS;
    let dst_row = dst.width as usize * FRAME_CHANNELS;
    let x_off = x as usize * FRAME_CHANNELS;
    for row in 0..src.height as usize {
        let dst_start = (y as usize + row) * dst_row + x_off;
        dst.data[dst_start..dst_start + src_row]
            .copy_from_slice(&src.data[row * src_row..(row + 1) * src_row]);
    }
}

/// Label color, BGR. Green, matching the usual overlay convention.
const LABEL_COLOR: [u8; 3] = [0, 255, 0];

/// Pixel-doubling factor for the 5x7 glyphs.
const LABEL_SCALE: usize = 2;

/// Render `text` into the frame at (x, y) using the built-in 5x7 font.
/// Characters without a glyph render as a space; drawing clips at the
/// frame edges.
fn draw_label(frame: &mut Frame, text: &str, x: usize, y: usize) {
    let mut pen_x = x;
    for ch in text.chars() {
        let glyph = glyph_for(ch.to_ascii_uppercase());
        for (gy, row_bits) in glyph.iter().enumerate() {
            for gx in 0..5 {
                if row_bits & (0b10000 >> gx) == 0 {
                    continue;
                }
                for sy in 0..LABEL_SCALE {
                    for sx in 0..LABEL_SCALE {
                        put_pixel(
                            frame,
                            pen_x + gx * LABEL_SCALE + sx,
                            y + gy * LABEL_SCALE + sy,
                            LABEL_COLOR,
                        );
                    }
                }
            }
        }
        // 5 columns of glyph plus 1 of spacing
        pen_x += 6 * LABEL_SCALE;
    }
}

fn put_pixel(frame: &mut Frame, x: usize, y: usize, color: [u8; 3]) {
    if x >= frame.width as usize || y >= frame.height as usize {
        return;
    }
    let idx = (y * frame.width as usize + x) * FRAME_CHANNELS;
    frame.data[idx..idx + FRAME_CHANNELS].copy_from_slice(&color);
}

/// 5x7 bitmap glyphs, one byte per row, low 5 bits used.
fn glyph_for(ch: char) -> [u8; 7] {
    match ch {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
        _ => [0; 7],
    }
}
