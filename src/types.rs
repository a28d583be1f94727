// Core value types passed between the pipeline stages:
// frame -> landmarks -> finger state -> gesture -> canvas delta.

use image::{ImageBuffer, Rgb, RgbImage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    /// All-black buffer. Black is also the canvas background.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    /// Flip left/right in place so the feed behaves like a mirror.
    pub fn mirror_horizontal(&mut self) {
        for row in self.pixels.chunks_exact_mut(self.width.max(1)) {
            row.reverse();
        }
    }

    /// Unpack to an 8-bit RGB image for encoders.
    pub fn to_rgb_image(&self) -> RgbImage {
        ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, y| {
            let px = self.pixels[y as usize * self.width + x as usize];
            Rgb([((px >> 16) & 0xFF) as u8, ((px >> 8) & 0xFF) as u8, (px & 0xFF) as u8])
        })
    }

    /// Pack an RGB image into 0x00RRGGBB pixels.
    pub fn from_rgb_image(img: &RgbImage) -> Self {
        let (w, h) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect();
        Self { width: w as usize, height: h as usize, pixels }
    }
}

/// Pixel coordinate on the frame (origin top-left, y grows downward).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// One tracked point of the 21-point hand model, already in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LandmarkPoint {
    pub id: u8,
    pub x: i32,
    pub y: i32,
}

impl LandmarkPoint {
    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

pub const LANDMARK_COUNT: usize = 21;

/// Landmark ids of the hand model that the classifier and interpreter read.
pub mod landmark {
    pub const WRIST: usize = 0;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_PIP: usize = 6;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_PIP: usize = 10;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_PIP: usize = 14;
    pub const RING_TIP: usize = 16;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_TIP: usize = 20;
}

/// A detected hand: exactly 21 points, `points[i].id == i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandLandmarks {
    points: [LandmarkPoint; LANDMARK_COUNT],
}

impl HandLandmarks {
    /// Build from (x, y) pixel pairs in landmark-id order.
    /// Returns None unless exactly 21 pairs are given.
    pub fn from_pixels(coords: &[(i32, i32)]) -> Option<Self> {
        if coords.len() != LANDMARK_COUNT {
            return None;
        }
        let mut points = [LandmarkPoint { id: 0, x: 0, y: 0 }; LANDMARK_COUNT];
        for (i, &(x, y)) in coords.iter().enumerate() {
            points[i] = LandmarkPoint { id: i as u8, x, y };
        }
        Some(Self { points })
    }

    pub fn point(&self, id: usize) -> Point {
        self.points[id].pos()
    }

    pub fn points(&self) -> &[LandmarkPoint; LANDMARK_COUNT] {
        &self.points
    }
}

/// The five digits, in FingerState index order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Finger {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
}

impl Finger {
    pub const ALL: [Finger; 5] = [Finger::Thumb, Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky];

    /// Landmark id of this finger's tip.
    pub fn tip(self) -> usize {
        (self as usize + 1) * 4
    }
}

/// Which fingers are extended: [thumb, index, middle, ring, pinky].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FingerState(pub [bool; 5]);

impl FingerState {
    /// Build from 0/1 flags, e.g. `[1, 1, 0, 0, 0]`.
    pub fn from_bits(bits: [u8; 5]) -> Self {
        Self(bits.map(|b| b != 0))
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        self.0[finger as usize]
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&up| up).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_reverses_each_row() {
        let mut fb = FrameBuffer { width: 3, height: 2, pixels: vec![1, 2, 3, 4, 5, 6] };
        fb.mirror_horizontal();
        assert_eq!(fb.pixels, vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn rgb_image_packing_preserves_channels() {
        let fb = FrameBuffer { width: 2, height: 1, pixels: vec![0x00FF_00FF, 0x0012_3456] };
        let img = fb.to_rgb_image();
        assert_eq!(img.get_pixel(0, 0), &Rgb([0xFF, 0x00, 0xFF]));
        assert_eq!(img.get_pixel(1, 0), &Rgb([0x12, 0x34, 0x56]));
        assert_eq!(FrameBuffer::from_rgb_image(&img), fb);
    }

    #[test]
    fn hand_requires_exactly_21_points() {
        assert!(HandLandmarks::from_pixels(&[(0, 0); 20]).is_none());
        let hand = HandLandmarks::from_pixels(&[(3, 4); 21]).expect("hand");
        assert_eq!(hand.points()[20].id, 20);
        assert_eq!(hand.point(landmark::PINKY_TIP), Point::new(3, 4));
    }

    #[test]
    fn finger_tips_follow_hand_model() {
        let tips: Vec<usize> = Finger::ALL.iter().map(|f| f.tip()).collect();
        assert_eq!(tips, vec![4, 8, 12, 16, 20]);
    }
}
