//! # air-canvas
//!
//! Draw in the air with hand gestures seen by a webcam. Strokes live on a
//! persistent canvas composited over the mirrored feed; one gesture sends the
//! canvas to Gemini and shows what it made of it.
//!
//! ## Gestures
//!
//! | Fingers | Action |
//! |---|---|
//! | Thumb + Index | Draw at the index tip |
//! | Thumb + Index + Middle | Move (pen up) |
//! | Thumb + Middle | Erase at the middle tip |
//! | Thumb + Pinky | Clear the canvas |
//! | Index + Middle | Analyze the drawing |
//!
//! Every few seconds a snapshot of the feed is posted to the proctoring
//! service, and every analysis is logged there as an event.

pub mod analysis;
pub mod camera;
pub mod canvas;
pub mod config;
pub mod draw;
pub mod error;
pub mod fingers;
pub mod gesture;
pub mod landmarks;
pub mod session;
pub mod telemetry;
pub mod types;
