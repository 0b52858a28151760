//! Preprocess every session in a directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;

use livecheck_capture_model::session::CaptureSession;
use livecheck_common::config::AppConfig;
use livecheck_processing_core::pipeline::PreprocessingPipeline;

enum Outcome {
    Accepted { aligned_frames: usize },
    Rejected(String),
    Failed(String),
}

pub async fn run(config: &AppConfig, dir: PathBuf, jobs: usize) -> anyhow::Result<()> {
    let mut sessions: Vec<PathBuf> = std::fs::read_dir(&dir)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter(|p| !p.to_string_lossy().ends_with(".tensors.json"))
        .collect();
    sessions.sort();

    println!(
        "Preprocessing {} session(s) in {} ({} at a time)",
        sessions.len(),
        dir.display(),
        jobs.max(1)
    );

    let pipeline = Arc::new(PreprocessingPipeline::new(config.pipeline.clone())?);
    let semaphore = Arc::new(Semaphore::new(jobs.max(1)));
    let mut handles = Vec::with_capacity(sessions.len());

    for path in sessions {
        let pipeline = pipeline.clone();
        let sem = semaphore.clone();
        handles.push(tokio::spawn(async move {
            let _permit = match sem.acquire_owned().await {
                Ok(p) => p,
                Err(e) => return (path, Outcome::Failed(e.to_string())),
            };
            let task_path = path.clone();
            let outcome =
                tokio::task::spawn_blocking(move || process(&pipeline, &task_path)).await;
            match outcome {
                Ok(outcome) => (path, outcome),
                Err(e) => (path, Outcome::Failed(format!("worker panicked: {e}"))),
            }
        }));
    }

    let (mut accepted, mut rejected, mut failed) = (0usize, 0usize, 0usize);
    for handle in handles {
        let (path, outcome) = handle.await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match outcome {
            Outcome::Accepted { aligned_frames } => {
                accepted += 1;
                println!("  accepted  {name} ({aligned_frames} aligned frames)");
            }
            Outcome::Rejected(reason) => {
                rejected += 1;
                println!("  rejected  {name}: {reason}");
            }
            Outcome::Failed(reason) => {
                failed += 1;
                println!("  error     {name}: {reason}");
            }
        }
    }

    println!("\n{accepted} accepted, {rejected} rejected, {failed} failed.");
    if failed > 0 {
        anyhow::bail!("{failed} session(s) could not be processed");
    }
    Ok(())
}

fn process(pipeline: &PreprocessingPipeline, path: &Path) -> Outcome {
    let session = match CaptureSession::load(path) {
        Ok(session) => session,
        Err(e) => return Outcome::Failed(e.to_string()),
    };
    match pipeline.run_with_report(session.frames()) {
        Ok((_, report)) => {
            tracing::debug!(path = %path.display(), alignment = ?report.alignment, "session accepted");
            Outcome::Accepted {
                aligned_frames: report.aligned_frames,
            }
        }
        Err(e) if e.is_client_rejection() => Outcome::Rejected(e.to_string()),
        Err(e) => Outcome::Failed(e.to_string()),
    }
}
