// Crate-wide error type. Every variant states *where* things went wrong.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("GOOGLE_API_KEY is not set; pass --api-key or export GOOGLE_API_KEY")]
    MissingCredential,
    #[error("Config error: {0}")]
    Config(String),
    #[error("Window init error: {0}")]
    WindowInit(String),   // Creating the window failed
    #[error("Window update error: {0}")]
    WindowUpdate(String), // Updating the window buffer failed
    #[error("Camera init error: {0}")]
    CameraInit(String),   // Opening/starting the camera failed
    #[error("Camera frame error: {0}")]
    CameraFrame(String),  // Grabbing/decoding a frame failed; the device is gone
    #[error("Hand detector error: {0}")]
    Detector(String),     // Landmark helper process failed or replied garbage
    #[error("Encode error: {0}")]
    Encode(String),       // PNG/JPEG encoding of a frame failed
    #[error("Network error: {0}")]
    Network(String),      // Proctoring log / snapshot POST failed
    #[error("Analysis error: {0}")]
    Analysis(String),     // Generative model call failed or returned nothing
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Network(e.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Encode(e.to_string())
    }
}

impl Error {
    /// Errors raised by per-cycle side effects; the frame loop keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Detector(_) | Error::Encode(_) | Error::Network(_) | Error::Analysis(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_effect_errors_are_recoverable() {
        assert!(Error::Detector("x".into()).is_recoverable());
        assert!(Error::Network("x".into()).is_recoverable());
        assert!(Error::Analysis("x".into()).is_recoverable());
        assert!(!Error::CameraFrame("x".into()).is_recoverable());
        assert!(!Error::WindowUpdate("x".into()).is_recoverable());
        assert!(!Error::MissingCredential.is_recoverable());
    }
}
