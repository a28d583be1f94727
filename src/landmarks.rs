//! Hand landmark detection.
//!
//! Detection itself is delegated to MediaPipe's hand landmarker running in a
//! helper process (`scripts/hand_detect.py`). Per frame we write a 12-byte
//! header (`width`, `height`, `channels`, all `u32` little endian) followed by
//! the raw RGB bytes, and read back one JSON line:
//!
//! ```text
//! {"hands":[{"handedness":"Right","score":0.93,"landmarks":[{"x":0.41,"y":0.62,"z":-0.01}, ...]}]}
//! ```
//!
//! Coordinates are normalised to 0..1 and scaled to pixels here.

use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::types::{FrameBuffer, HandLandmarks, LANDMARK_COUNT, landmark};

/// Anything that can find (at most) one hand in a frame.
pub trait LandmarkProvider {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<HandLandmarks>, Error>;
}

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: String,
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionReply {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Turn one reply line into the first hand with a full set of landmarks.
/// `score` is the handedness probability, not detection confidence; the
/// helper already applied `--min-confidence`.
pub fn parse_reply(line: &str, width: usize, height: usize) -> Result<Option<HandLandmarks>, Error> {
    let reply: DetectionReply = serde_json::from_str(line.trim())
        .map_err(|e| Error::Detector(format!("bad reply {:?}: {e}", line.trim())))?;

    if let Some(err) = reply.error {
        warn!(error = %err, "hand detector reported an error");
        return Ok(None);
    }

    for hand in reply.hands {
        if hand.landmarks.len() != LANDMARK_COUNT {
            warn!(count = hand.landmarks.len(), "expected 21 landmarks; skipping hand");
            continue;
        }
        let coords: Vec<(i32, i32)> = hand
            .landmarks
            .iter()
            .map(|lm| ((lm.x * width as f32) as i32, (lm.y * height as f32) as i32))
            .collect();
        let Some(landmarks) = HandLandmarks::from_pixels(&coords) else {
            continue;
        };
        debug!(
            handedness = %hand.handedness,
            score = hand.score,
            wrist = ?landmarks.point(landmark::WRIST),
            index_tip = ?landmarks.point(landmark::INDEX_TIP),
            "hand detected"
        );
        return Ok(Some(landmarks));
    }
    Ok(None)
}

/// Where to find the helper and how picky to be.
#[derive(Clone, Debug)]
pub struct DetectorConfig {
    pub python: PathBuf,
    pub script: PathBuf,
    pub min_confidence: f32,
}

/// MediaPipe hand landmarker behind a child process.
pub struct MediaPipeBridge {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    // Set once the pipe breaks; later frames see no hand.
    dead: bool,
}

impl MediaPipeBridge {
    /// Start the helper and wait for its `READY` line.
    pub fn spawn(cfg: &DetectorConfig) -> Result<Self, Error> {
        if !cfg.script.exists() {
            return Err(Error::Detector(format!("helper script not found at {}", cfg.script.display())));
        }

        info!(python = %cfg.python.display(), script = %cfg.script.display(), "starting hand detector");
        let mut process = Command::new(&cfg.python)
            .arg(&cfg.script)
            .arg("--min-confidence")
            .arg(cfg.min_confidence.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Detector(format!("spawn {}: {e}", cfg.python.display())))?;

        let stdin = process.stdin.take().ok_or_else(|| Error::Detector("no stdin pipe".into()))?;
        let stdout = process.stdout.take().ok_or_else(|| Error::Detector("no stdout pipe".into()))?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        stdout
            .read_line(&mut ready)
            .map_err(|e| Error::Detector(format!("waiting for READY: {e}")))?;
        if ready.trim() != "READY" {
            let _ = process.kill();
            return Err(Error::Detector(format!("helper did not signal ready, got {:?}", ready.trim())));
        }
        info!("hand detector ready");

        Ok(Self { process, stdin, stdout, dead: false })
    }

    fn send_frame(&mut self, frame: &FrameBuffer) -> std::io::Result<()> {
        let mut msg = Vec::with_capacity(12 + frame.pixels.len() * 3);
        msg.extend_from_slice(&(frame.width as u32).to_le_bytes());
        msg.extend_from_slice(&(frame.height as u32).to_le_bytes());
        msg.extend_from_slice(&3u32.to_le_bytes());
        for &px in &frame.pixels {
            msg.extend_from_slice(&[(px >> 16) as u8, (px >> 8) as u8, px as u8]);
        }
        self.stdin.write_all(&msg)?;
        self.stdin.flush()
    }

    // One frame out, one reply line back. Any failure here means the helper is gone.
    fn exchange(&mut self, frame: &FrameBuffer) -> Result<String, Error> {
        self.send_frame(frame)
            .map_err(|e| Error::Detector(format!("write frame: {e}")))?;

        let mut line = String::new();
        let n = self
            .stdout
            .read_line(&mut line)
            .map_err(|e| Error::Detector(format!("read reply: {e}")))?;
        if n == 0 {
            return Err(Error::Detector("helper closed its output".into()));
        }
        Ok(line)
    }
}

impl LandmarkProvider for MediaPipeBridge {
    fn detect(&mut self, frame: &FrameBuffer) -> Result<Option<HandLandmarks>, Error> {
        if self.dead || frame.pixels.is_empty() {
            return Ok(None);
        }
        match self.exchange(frame) {
            Ok(line) => parse_reply(&line, frame.width, frame.height),
            Err(e) => {
                self.dead = true;
                error!(error = %e, "hand detector stopped; no more hands will be detected");
                Err(e)
            }
        }
    }
}

impl Drop for MediaPipeBridge {
    fn drop(&mut self) {
        // Kill the helper along with us.
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn reply_with(score: f32, n: usize) -> String {
        let lms: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"x":{},"y":0.5,"z":0.0}}"#, i as f32 / 40.0))
            .collect();
        format!(
            r#"{{"hands":[{{"handedness":"Right","score":{score},"landmarks":[{}]}}]}}"#,
            lms.join(",")
        )
    }

    #[test]
    fn scales_normalised_coordinates() {
        let hand = parse_reply(&reply_with(0.9, 21), 400, 200).expect("parse").expect("hand");
        assert_eq!(hand.point(0), Point::new(0, 100));
        assert_eq!(hand.point(landmark::INDEX_TIP), Point::new(80, 100)); // 8/40 * 400
    }

    #[test]
    fn handedness_score_does_not_filter_hands() {
        let hand = parse_reply(&reply_with(0.6, 21), 400, 200).expect("parse");
        assert!(hand.is_some());
    }

    #[test]
    fn wrong_landmark_count_is_no_hand() {
        assert_eq!(parse_reply(&reply_with(0.9, 20), 400, 200).expect("parse"), None);
    }

    #[test]
    fn empty_and_error_replies_are_no_hand() {
        assert_eq!(parse_reply(r#"{"hands":[]}"#, 10, 10).expect("parse"), None);
        assert_eq!(parse_reply(r#"{"hands":[],"error":"boom"}"#, 10, 10).expect("parse"), None);
    }

    #[test]
    fn garbage_is_a_detector_error() {
        assert!(matches!(parse_reply("not json", 10, 10), Err(Error::Detector(_))));
    }

    #[test]
    fn missing_script_fails_to_spawn() {
        let cfg = DetectorConfig {
            python: PathBuf::from("python3"),
            script: PathBuf::from("/definitely/not/here/hand_detect.py"),
            min_confidence: 0.75,
        };
        assert!(matches!(MediaPipeBridge::spawn(&cfg), Err(Error::Detector(_))));
    }

    #[cfg(unix)]
    #[test]
    fn helper_exit_is_reported_once() {
        // Says READY, then exits without answering.
        let script = std::env::temp_dir().join(format!("air-canvas-ready-{}.sh", std::process::id()));
        std::fs::write(&script, "echo READY\n").expect("write script");
        let cfg = DetectorConfig { python: PathBuf::from("sh"), script: script.clone(), min_confidence: 0.75 };
        let mut bridge = MediaPipeBridge::spawn(&cfg).expect("spawn");
        let frame = FrameBuffer::new(2, 2);

        assert!(matches!(bridge.detect(&frame), Err(Error::Detector(_))));
        assert_eq!(bridge.detect(&frame).expect("dead bridge"), None);
        assert_eq!(bridge.detect(&frame).expect("dead bridge"), None);
        let _ = std::fs::remove_file(script);
    }
}
