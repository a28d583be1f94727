// Drawing surface: the persistent stroke layer laid over the live feed.
// Visual: strokes stay opaque on top of the video; everything else shows the
// (slightly darkened) camera image.

use std::io::Cursor;

use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;

use crate::draw::draw_line_thick;
use crate::error::Error;
use crate::types::{FrameBuffer, Point};

pub const BACKGROUND: u32 = 0x00_00_00_00;
pub const PEN_COLOR: u32 = 0x00_FF_00_FF; // magenta

// Weights and threshold of the overlay composite.
const LIVE_WEIGHT: f32 = 0.7;
const CANVAS_WEIGHT: f32 = 1.0;
const INK_THRESHOLD: u32 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StrokeStyle {
    pub color: u32,
    pub thickness: u32,
}

impl StrokeStyle {
    pub const DRAW: StrokeStyle = StrokeStyle { color: PEN_COLOR, thickness: 5 };
    pub const ERASE: StrokeStyle = StrokeStyle { color: BACKGROUND, thickness: 15 };
}

/// One mutation of the canvas produced by the gesture interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanvasDelta {
    Segment { from: Point, to: Point, style: StrokeStyle },
    Clear,
}

pub struct Canvas {
    layer: FrameBuffer,
}

impl Canvas {
    /// Empty (all background) canvas of the frame size.
    pub fn new(width: usize, height: usize) -> Self {
        Self { layer: FrameBuffer::new(width, height) }
    }

    pub fn layer(&self) -> &FrameBuffer {
        &self.layer
    }

    pub fn is_empty(&self) -> bool {
        self.layer.pixels.iter().all(|&p| p == BACKGROUND)
    }

    pub fn draw_segment(&mut self, from: Point, to: Point, style: StrokeStyle) {
        draw_line_thick(&mut self.layer, from.x, from.y, to.x, to.y, style.thickness, style.color);
    }

    pub fn clear(&mut self) {
        self.layer.pixels.fill(BACKGROUND);
    }

    pub fn apply(&mut self, delta: &CanvasDelta) {
        match *delta {
            CanvasDelta::Segment { from, to, style } => self.draw_segment(from, to, style),
            CanvasDelta::Clear => self.clear(),
        }
    }

    /// Overlay the canvas on a live frame.
    ///
    /// 1. `blend = sat(0.7 * live + 1.0 * canvas)`
    /// 2. `mask  = 255 where gray(canvas) <= 50, else 0`
    /// 3. `out   = (blend & mask) | canvas`
    pub fn compose(&self, live: &FrameBuffer) -> Result<FrameBuffer, Error> {
        if live.width != self.layer.width || live.height != self.layer.height {
            return Err(Error::CameraFrame(format!(
                "compose: frame {}x{} does not match canvas {}x{}",
                live.width, live.height, self.layer.width, self.layer.height
            )));
        }
        let pixels = live
            .pixels
            .iter()
            .zip(&self.layer.pixels)
            .map(|(&l, &c)| {
                let blend = add_weighted(l, c);
                let mask = if gray(c) > INK_THRESHOLD { 0 } else { 0x00FF_FFFF };
                (blend & mask) | c
            })
            .collect();
        Ok(FrameBuffer { width: live.width, height: live.height, pixels })
    }

    /// PNG bytes of the canvas alone; the payload sent for analysis.
    pub fn encode_png(&self) -> Result<Vec<u8>, Error> {
        encode_png(&self.layer)
    }
}

#[inline]
fn channels(px: u32) -> [u32; 3] {
    [(px >> 16) & 0xFF, (px >> 8) & 0xFF, px & 0xFF]
}

#[inline]
fn add_weighted(live: u32, canvas: u32) -> u32 {
    let l = channels(live);
    let c = channels(canvas);
    let mix = |i: usize| {
        let v = (l[i] as f32 * LIVE_WEIGHT + c[i] as f32 * CANVAS_WEIGHT).round();
        v.clamp(0.0, 255.0) as u32
    };
    (mix(0) << 16) | (mix(1) << 8) | mix(2)
}

/// Fixed-point BT.601 luma, 14-bit weights.
#[inline]
fn gray(px: u32) -> u32 {
    let [r, g, b] = channels(px);
    (r * 4899 + g * 9617 + b * 1868 + (1 << 13)) >> 14
}

pub fn encode_png(frame: &FrameBuffer) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    frame.to_rgb_image().write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

pub fn encode_jpeg(frame: &FrameBuffer, quality: u8) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&frame.to_rgb_image())?;
    Ok(buf)
}
