use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::Error;
use crate::gesture::HandLossPolicy;
use crate::landmarks::DetectorConfig;

/// Command line configuration for the air canvas.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Draw in the air with hand gestures; ask Gemini what you drew.")]
pub struct Args {
    /// Camera device index (0 = default webcam).
    #[arg(long, default_value_t = 0)]
    pub camera: u32,
    /// Working frame width in pixels.
    #[arg(long, default_value_t = 950)]
    pub width: u32,
    /// Working frame height in pixels.
    #[arg(long, default_value_t = 550)]
    pub height: u32,
    /// Gemini API key.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
    /// Gemini model name.
    #[arg(long, default_value = "gemini-1.5-flash")]
    pub model: String,
    /// Gemini API base URL.
    #[arg(long, default_value = "https://generativelanguage.googleapis.com")]
    pub gemini_endpoint: String,
    /// Proctoring service base URL (event log + snapshots).
    #[arg(long, env = "AIR_CANVAS_LOG_URL", default_value = "http://localhost:5000")]
    pub log_url: String,
    /// User id attached to events and snapshots.
    #[arg(long, default_value = "student123")]
    pub user_id: String,
    /// Seconds between webcam snapshots.
    #[arg(long, default_value_t = 10)]
    pub snapshot_interval: u64,
    /// Python interpreter that has mediapipe installed.
    #[arg(long, default_value = "python3")]
    pub python: PathBuf,
    /// Hand detector helper script.
    #[arg(long, default_value = "scripts/hand_detect.py")]
    pub detector_script: PathBuf,
    /// Minimum hand detection confidence (0..1).
    #[arg(long, default_value_t = 0.75)]
    pub min_confidence: f32,
    /// What happens to an unfinished stroke when the hand leaves the frame.
    #[arg(long, value_enum, default_value_t = HandLossPolicy::LiftPen)]
    pub hand_loss: HandLossPolicy,
}

/// Gemini credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Blank keys count as missing.
    pub fn new(raw: Option<&str>) -> Result<Self, Error> {
        match raw.map(str::trim) {
            Some(k) if !k.is_empty() => Ok(Self(k.to_string())),
            _ => Err(Error::MissingCredential),
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Clone, Debug)]
pub struct GeminiConfig {
    pub api_key: ApiKey,
    pub model: String,
    pub endpoint: String,
}

#[derive(Clone, Debug)]
pub struct ProctorConfig {
    pub base_url: String,
    pub user_id: String,
}

/// Validated runtime configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub camera_index: u32,
    pub width: u32,
    pub height: u32,
    pub gemini: GeminiConfig,
    pub proctor: ProctorConfig,
    pub snapshot_interval: Duration,
    pub detector: DetectorConfig,
    pub hand_loss: HandLossPolicy,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, Error> {
        let api_key = ApiKey::new(args.api_key.as_deref())?;
        if args.width == 0 || args.height == 0 {
            return Err(Error::Config(format!("frame size must be non-zero, got {}x{}", args.width, args.height)));
        }
        if args.snapshot_interval == 0 {
            return Err(Error::Config("snapshot interval must be at least 1 second".into()));
        }
        if !(0.0..=1.0).contains(&args.min_confidence) {
            return Err(Error::Config(format!("min confidence must be in 0..1, got {}", args.min_confidence)));
        }
        Ok(Self {
            camera_index: args.camera,
            width: args.width,
            height: args.height,
            gemini: GeminiConfig {
                api_key,
                model: args.model,
                endpoint: args.gemini_endpoint.trim_end_matches('/').to_string(),
            },
            proctor: ProctorConfig {
                base_url: args.log_url.trim_end_matches('/').to_string(),
                user_id: args.user_id,
            },
            snapshot_interval: Duration::from_secs(args.snapshot_interval),
            detector: DetectorConfig {
                python: args.python,
                script: args.detector_script,
                min_confidence: args.min_confidence,
            },
            hand_loss: args.hand_loss,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["air-canvas"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("args")
    }

    #[test]
    fn defaults_match_the_drawing_setup() {
        let cfg = Config::from_args(parse(&["--api-key", "k"])).expect("config");
        assert_eq!((cfg.width, cfg.height), (950, 550));
        assert_eq!(cfg.snapshot_interval, Duration::from_secs(10));
        assert_eq!(cfg.proctor.user_id, "student123");
        assert_eq!(cfg.gemini.model, "gemini-1.5-flash");
        assert_eq!(cfg.hand_loss, HandLossPolicy::LiftPen);
        assert_eq!(cfg.detector.min_confidence, 0.75);
    }

    #[test]
    fn missing_or_blank_key_is_fatal() {
        let mut args = parse(&[]);
        args.api_key = None;
        assert!(matches!(Config::from_args(args.clone()), Err(Error::MissingCredential)));
        args.api_key = Some("   ".into());
        assert!(matches!(Config::from_args(args), Err(Error::MissingCredential)));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_args(parse(&["--api-key", "k", "--width", "0"])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_args(parse(&["--api-key", "k", "--snapshot-interval", "0"])),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_args(parse(&["--api-key", "k", "--min-confidence", "1.5"])),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn trailing_slashes_are_dropped_and_key_hidden() {
        let cfg = Config::from_args(parse(&["--api-key", "secret", "--log-url", "http://h:1/"])).expect("config");
        assert_eq!(cfg.proctor.base_url, "http://h:1");
        assert!(!format!("{cfg:?}").contains("secret"));
        assert_eq!(cfg.gemini.api_key.expose(), "secret");
    }

    #[test]
    fn hand_loss_flag_parses() {
        let cfg = Config::from_args(parse(&["--api-key", "k", "--hand-loss", "keep"])).expect("config");
        assert_eq!(cfg.hand_loss, HandLossPolicy::Keep);
    }
}
