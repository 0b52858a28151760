//! Preprocess a capture session into model tensors.

use std::path::PathBuf;

use serde::Serialize;

use livecheck_capture_model::session::CaptureSession;
use livecheck_common::config::AppConfig;
use livecheck_processing_core::pipeline::{PreprocessReport, PreprocessingPipeline};
use livecheck_processing_core::tensor::TensorDump;

#[derive(Serialize)]
struct TensorFile<'a> {
    session: String,
    tensors: &'a [TensorDump],
}

pub fn run(config: &AppConfig, session: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    println!("Preprocessing session: {}", session.display());

    let capture = CaptureSession::load(&session)
        .map_err(|e| anyhow::anyhow!("Failed to load session: {e}"))?;
    let pipeline = PreprocessingPipeline::new(config.pipeline.clone())?;

    let (inputs, report) = match pipeline.run_with_report(capture.frames()) {
        Ok(result) => result,
        Err(e) if e.is_client_rejection() => {
            anyhow::bail!("Session rejected: {e}");
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&report);

    let output = output.unwrap_or_else(|| session.with_extension("tensors.json"));
    let tensors = inputs.dump();
    let file = TensorFile {
        session: session.display().to_string(),
        tensors: &tensors,
    };
    std::fs::write(&output, serde_json::to_string(&file)?)
        .map_err(|e| anyhow::anyhow!("Failed to write {}: {e}", output.display()))?;

    for tensor in &tensors {
        println!("  {}: {:?}", tensor.name, tensor.shape);
    }
    println!("\nTensors written to: {}", output.display());

    Ok(())
}

fn print_report(report: &PreprocessReport) {
    println!("  Frames: {}", report.input_frames);
    println!("  Landmark frames: {}", report.landmark_frames);
    println!(
        "  Modality gate: {} (mean bg_variance {:.3})",
        if report.gate.is_open { "open" } else { "closed" },
        report.gate.mean_bg_variance
    );
    println!("  Alignment: {:?}", report.alignment);
    println!("  Aligned frames: {}", report.aligned_frames);
}
