// Opens the webcam and converts frames into mirrored buffers for the pipeline.
// Visual expectation: every `next_frame()` gives a Vec<u32> of 0x00RRGGBB
// pixels at the working resolution, flipped left/right like a mirror.

use crate::error::Error;
use crate::session::FrameSource;
use crate::types::FrameBuffer;

// Bring in nokhwa types for camera control.
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

use image::imageops::{self, FilterType};
use tracing::{debug, info};

// A small wrapper around nokhwa::Camera so the session loop stays clean.
pub struct CameraCapture {
    cam: Camera,
    width: u32,  // working size handed to the pipeline
    height: u32,
}

impl CameraCapture {
    /// Open camera `index`, asking for a format close to `width`x`height`.
    /// Frames are always delivered at exactly that size (resized if needed).
    pub fn new(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);

        let fmt = CameraFormat::new(
            Resolution::new(width, height),
            FrameFormat::YUYV, // uncompressed; cheap to convert to RGB
            30,                // target FPS
        );

        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam = Camera::new(idx, req)
            .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;

        // The stream might pick a different native resolution; we resize later.
        let actual = cam.resolution();
        info!(
            index,
            native_width = actual.width(),
            native_height = actual.height(),
            width,
            height,
            "camera stream open"
        );

        Ok(Self { cam, width, height })
    }

    /// Report the resolution frames are delivered at.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl FrameSource for CameraCapture {
    /// Grab one frame, resize to the working size and mirror it.
    /// A failure here means the device is gone; the session ends.
    fn next_frame(&mut self) -> Result<FrameBuffer, Error> {
        // Blocks until a new frame is ready.
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;

        let mut rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))?;

        if rgb_img.dimensions() != (self.width, self.height) {
            debug!(from = ?rgb_img.dimensions(), "resizing camera frame");
            rgb_img = imageops::resize(&rgb_img, self.width, self.height, FilterType::Triangle);
        }

        let mut out = FrameBuffer::from_rgb_image(&rgb_img);
        out.mirror_horizontal();
        Ok(out)
    }
}

impl Drop for CameraCapture {
    fn drop(&mut self) {
        // Release the device so other apps can use it right away.
        if let Err(e) = self.cam.stop_stream() {
            debug!(error = %e, "stopping camera stream");
        }
        info!("camera released");
    }
}
