// Session driver: one synchronous pass per camera frame.
//   frame -> landmarks -> fingers -> gesture -> canvas -> composite -> present
// then the side effects (model analysis, proctoring snapshot). Network calls
// block the loop; their failures are shown and the loop keeps going.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::analysis::{ANALYSIS_PROMPT, Analyzer};
use crate::canvas::{Canvas, encode_jpeg};
use crate::draw::{draw_fingertip_markers, draw_text_5x7, draw_text_block};
use crate::error::Error;
use crate::fingers;
use crate::gesture::{GestureAction, GestureInterpreter, GestureKind, HandLossPolicy};
use crate::landmarks::LandmarkProvider;
use crate::telemetry::{EVENT_ANALYSIS_TRIGGERED, Reporter, SnapshotTimer};
use crate::types::FrameBuffer;

pub const SNAPSHOT_JPEG_QUALITY: u8 = 95;
const HUD_COLOR: u32 = 0x00_FF_FF_FF;
const RESULT_COLOR: u32 = 0x00_00_FF_FF; // cyan
const PROBLEM_COLOR: u32 = 0x00_FF_A5_00; // orange
const RESULT_LINES: usize = 8;

/// Where frames come from. An `Err(Error::CameraFrame)` means the device is
/// gone and ends the session.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<FrameBuffer, Error>;
}

/// Where composited frames go.
pub trait Presenter {
    fn present(&mut self, frame: &FrameBuffer) -> Result<(), Error>;
    fn is_open(&self) -> bool;
}

/// Text under the HUD line: last model answer or last problem.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Empty,
    Result(String),
    Problem(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The camera stopped delivering frames.
    SourceUnavailable(String),
    /// Window closed or ESC pressed.
    WindowClosed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames: u64,
    pub analyses: u64,
    pub snapshots: u64,
    pub failures: u64,
    pub end: SessionEnd,
}

pub struct Session {
    source: Box<dyn FrameSource>,
    detector: Box<dyn LandmarkProvider>,
    analyzer: Box<dyn Analyzer>,
    reporter: Box<dyn Reporter>,
    canvas: Canvas,
    interpreter: GestureInterpreter,
    snapshots: SnapshotTimer,
    status: Status,
    last_gesture: GestureKind,
    frames: u64,
    analyses: u64,
    snapshots_sent: u64,
    failures: u64,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn LandmarkProvider>,
        analyzer: Box<dyn Analyzer>,
        reporter: Box<dyn Reporter>,
        width: usize,
        height: usize,
        snapshot_interval: Duration,
        hand_loss: HandLossPolicy,
    ) -> Self {
        Self {
            source,
            detector,
            analyzer,
            reporter,
            canvas: Canvas::new(width, height),
            interpreter: GestureInterpreter::new(hand_loss),
            snapshots: SnapshotTimer::new(snapshot_interval),
            status: Status::Empty,
            last_gesture: GestureKind::None,
            frames: 0,
            analyses: 0,
            snapshots_sent: 0,
            failures: 0,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn interpreter(&self) -> &GestureInterpreter {
        &self.interpreter
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Run until the camera goes away or the window closes.
    pub fn run(&mut self, presenter: &mut dyn Presenter) -> Result<SessionSummary, Error> {
        let mut last_fps_time = Instant::now();
        let mut frames_this_second: u32 = 0;
        let mut hud_fps_text = String::from("FPS: 0.0");

        let end = loop {
            if !presenter.is_open() {
                info!("window closed");
                break SessionEnd::WindowClosed;
            }

            let live = match self.source.next_frame() {
                Ok(frame) => frame,
                Err(Error::CameraFrame(reason)) => {
                    warn!(%reason, "video source unavailable; stopping");
                    break SessionEnd::SourceUnavailable(reason);
                }
                Err(e) => return Err(e),
            };

            let now = Instant::now();
            let (frame, action) = self.process(live)?;

            let mut screen = frame.clone();
            self.draw_hud(&mut screen, &hud_fps_text);
            presenter.present(&screen)?;

            self.side_effects(&frame, &action, now);

            // FPS counter (terminal + HUD once per second)
            frames_this_second += 1;
            if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
                let fps = frames_this_second as f32 / now.duration_since(last_fps_time).as_secs_f32();
                println!("FPS: {:.1}", fps);
                debug!(fps, "frame rate");
                hud_fps_text = format!("FPS: {:.1}", fps);
                frames_this_second = 0;
                last_fps_time = now;
            }
        };

        Ok(SessionSummary {
            frames: self.frames,
            analyses: self.analyses,
            snapshots: self.snapshots_sent,
            failures: self.failures,
            end,
        })
    }

    /// Pure per-frame pipeline: returns the composited frame and the action
    /// taken. Recoverable detector failures are logged and treated as "no
    /// hand"; anything else ends the session.
    pub fn process(&mut self, mut live: FrameBuffer) -> Result<(FrameBuffer, GestureAction), Error> {
        self.frames += 1;

        let hand = match self.detector.detect(&live) {
            Ok(hand) => hand,
            Err(e) if e.is_recoverable() => {
                warn!(error = %e, "hand detection failed for this frame");
                self.failures += 1;
                None
            }
            Err(e) => return Err(e),
        };

        let action = match &hand {
            Some(hand) => {
                let state = fingers::classify(hand);
                draw_fingertip_markers(&mut live, &fingers::extended_tips(hand, &state));
                self.interpreter.step(Some((hand, &state)))
            }
            None => self.interpreter.step(None),
        };

        if action.kind != self.last_gesture {
            debug!(from = self.last_gesture.as_str(), to = action.kind.as_str(), "gesture changed");
            self.last_gesture = action.kind;
        }
        if let Some(delta) = &action.delta {
            self.canvas.apply(delta);
        }

        let frame = self.canvas.compose(&live)?;
        Ok((frame, action))
    }

    /// Analysis (when the gesture asks for it) and the periodic snapshot.
    pub fn side_effects(&mut self, frame: &FrameBuffer, action: &GestureAction, now: Instant) {
        if action.wants_analysis() {
            self.analyze();
        }
        if self.snapshots.due(now) {
            self.snapshot(frame);
        }
    }

    fn analyze(&mut self) {
        self.analyses += 1;
        let outcome = self
            .canvas
            .encode_png()
            .and_then(|png| self.analyzer.analyze(ANALYSIS_PROMPT, &png));
        match outcome {
            Ok(text) => {
                info!(chars = text.len(), "analysis result received");
                println!("Result: {text}");
                self.status = Status::Result(text);
            }
            Err(e) => self.problem("analysis", e),
        }
        if let Err(e) = self.reporter.log_event(EVENT_ANALYSIS_TRIGGERED) {
            self.problem("sending proctoring event", e);
        }
    }

    fn snapshot(&mut self, frame: &FrameBuffer) {
        let sent = encode_jpeg(frame, SNAPSHOT_JPEG_QUALITY).and_then(|jpeg| self.reporter.send_snapshot(jpeg));
        match sent {
            Ok(_) => {
                self.snapshots_sent += 1;
                debug!("snapshot sent");
            }
            Err(e) => self.problem("sending snapshot", e),
        }
    }

    fn problem(&mut self, what: &str, e: Error) {
        if e.is_recoverable() {
            warn!(error = %e, "{what} failed");
        } else {
            error!(error = %e, "{what} failed unexpectedly");
        }
        self.failures += 1;
        self.status = Status::Problem(format!("Error {what}: {e}"));
    }

    fn draw_hud(&self, screen: &mut FrameBuffer, fps: &str) {
        let hud = format!("{} | {}", self.last_gesture.as_str(), fps);
        draw_text_5x7(screen, 8, 8, &hud, HUD_COLOR);
        match &self.status {
            Status::Empty => {}
            Status::Result(text) => {
                draw_text_block(screen, 8, 22, &format!("OUTPUT: {text}"), RESULT_LINES, RESULT_COLOR)
            }
            Status::Problem(text) => draw_text_block(screen, 8, 22, text, RESULT_LINES, PROBLEM_COLOR),
        }
    }
}
