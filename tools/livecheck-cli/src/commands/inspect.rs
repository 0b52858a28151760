//! Show capture session statistics.

use std::path::PathBuf;

use livecheck_capture_model::session::CaptureSession;
use livecheck_common::config::AppConfig;
use livecheck_processing_core::gate::ModalityGate;

pub fn run(config: &AppConfig, session: PathBuf) -> anyhow::Result<()> {
    let capture = CaptureSession::load(&session)
        .map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let summary = capture.summary();
    let gate = ModalityGate::new(config.pipeline.gate_threshold).decide(capture.frames());

    println!("Session: {}", session.display());
    println!("  Frames: {}", summary.frames);
    println!("  With landmarks: {}", summary.landmark_frames);
    println!("  With sensors: {}", summary.sensor_frames);
    println!("  With motion analysis: {}", summary.motion_frames);
    println!("  Mean bg_variance: {:.3}", summary.mean_bg_variance);
    println!(
        "  Modality gate: {} (threshold {})",
        if gate.is_open { "open" } else { "closed" },
        config.pipeline.gate_threshold
    );
    match summary.duration_ms {
        Some(ms) => println!("  Duration: {:.2}s", ms / 1000.0),
        None => println!("  Duration: unknown"),
    }

    if summary.landmark_frames < config.pipeline.min_sequence_frames {
        println!(
            "\nOnly {} landmark frame(s); the session will be rejected.",
            summary.landmark_frames
        );
    }

    Ok(())
}
