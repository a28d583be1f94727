// What you SEE:
// • The mirrored webcam feed with your strokes drawn on top.
// • Thumb+Index draws, Thumb+Middle erases, Thumb+Index+Middle lifts the pen,
//   Thumb+Pinky clears, Index+Middle asks Gemini what you drew.
// • The HUD shows the current gesture, FPS and the last answer. ESC quits.

use std::process::ExitCode;

use air_canvas::analysis::GeminiClient;
use air_canvas::camera::CameraCapture;
use air_canvas::config::{Args, Config};
use air_canvas::draw::Drawer;
use air_canvas::error::Error;
use air_canvas::landmarks::MediaPipeBridge;
use air_canvas::session::{Session, SessionEnd};
use air_canvas::telemetry::ProctorClient;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "air-canvas stopped");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Error> {
    /* --- Configuration ---
       No API key, no window: we refuse to start before touching the camera. */
    let cfg = Config::from_args(args)?;
    let analyzer = GeminiClient::new(&cfg.gemini)?;
    let reporter = ProctorClient::new(&cfg.proctor)?;

    /* --- Hand detector, camera, window ---
       Visual: window opens with the live (mirrored) feed. */
    let detector = MediaPipeBridge::spawn(&cfg.detector)?;
    let cam = CameraCapture::new(cfg.camera_index, cfg.width, cfg.height)?;
    let (w, h) = cam.resolution();
    let mut drawer = Drawer::new("Air Canvas: draw with your hand", w as usize, h as usize)?;

    let mut session = Session::new(
        Box::new(cam),
        Box::new(detector),
        Box::new(analyzer),
        Box::new(reporter),
        w as usize,
        h as usize,
        cfg.snapshot_interval,
        cfg.hand_loss,
    );

    let summary = session.run(&mut drawer)?;
    info!(
        frames = summary.frames,
        analyses = summary.analyses,
        snapshots = summary.snapshots,
        failures = summary.failures,
        "session finished"
    );
    if let SessionEnd::SourceUnavailable(reason) = &summary.end {
        eprintln!("Error: could not read from the webcam ({reason}). Please ensure your webcam is connected and try again.");
    }
    Ok(())
}
