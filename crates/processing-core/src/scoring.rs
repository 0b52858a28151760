//! The scoring seam between preprocessing and a liveness model.
//!
//! Model runtimes differ in whether a session can run concurrently. The
//! [`LivenessScorer`] trait is the shared-reference interface the rest of
//! the crate uses; [`SerializedScorer`] adapts a runtime that needs
//! exclusive access by holding it behind a mutex.

use std::sync::Mutex;

use serde::Serialize;

use livecheck_capture_model::session::CaptureSession;
use livecheck_common::config::ScoringConfig;
use livecheck_common::error::{LivecheckError, LivecheckResult};

use crate::pipeline::PreprocessingPipeline;
use crate::tensor::ModelInputs;

/// Scores preprocessed inputs. Higher means more likely a live person.
pub trait LivenessScorer: Send + Sync {
    fn score(&self, inputs: &ModelInputs) -> LivecheckResult<f32>;
}

/// A model runtime that needs `&mut self` to run.
pub trait Interpreter: Send {
    fn run(&mut self, inputs: &ModelInputs) -> anyhow::Result<f32>;
}

/// Serializes access to an [`Interpreter`] so it can be shared.
pub struct SerializedScorer<I> {
    interpreter: Mutex<I>,
}

impl<I: Interpreter> SerializedScorer<I> {
    pub fn new(interpreter: I) -> Self {
        Self {
            interpreter: Mutex::new(interpreter),
        }
    }

    pub fn into_inner(self) -> LivecheckResult<I> {
        self.interpreter
            .into_inner()
            .map_err(|_| LivecheckError::scoring("interpreter lock poisoned"))
    }
}

impl<I: Interpreter> LivenessScorer for SerializedScorer<I> {
    fn score(&self, inputs: &ModelInputs) -> LivecheckResult<f32> {
        let mut interpreter = self
            .interpreter
            .lock()
            .map_err(|_| LivecheckError::scoring("interpreter lock poisoned"))?;
        let score = interpreter
            .run(inputs)
            .map_err(|e| LivecheckError::scoring(format!("{e:#}")))?;
        if !score.is_finite() {
            return Err(LivecheckError::scoring(format!(
                "model returned non-finite score {score}"
            )));
        }
        Ok(score)
    }
}

/// A scored liveness decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub score: f32,
    pub is_real: bool,
}

impl Verdict {
    /// Real when the score is strictly above the threshold.
    pub fn from_score(score: f32, config: &ScoringConfig) -> Self {
        Self {
            score,
            is_real: score > config.real_threshold,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.is_real {
            "real"
        } else {
            "fake"
        }
    }
}

/// Preprocess a session and score it.
pub fn evaluate(
    pipeline: &PreprocessingPipeline,
    scorer: &dyn LivenessScorer,
    config: &ScoringConfig,
    session: &CaptureSession,
) -> LivecheckResult<Verdict> {
    let inputs = pipeline.run(session)?;
    let score = scorer.score(&inputs)?;
    let verdict = Verdict::from_score(score, config);
    tracing::info!(score, verdict = verdict.label(), "session scored");
    Ok(verdict)
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecheck_capture_model::frame::Frame;

    /// Mean of the sensor tensor, squashed to (0, 1).
    struct MeanInterpreter {
        calls: usize,
    }

    impl Interpreter for MeanInterpreter {
        fn run(&mut self, inputs: &ModelInputs) -> anyhow::Result<f32> {
            self.calls += 1;
            let mean = inputs.sensors.mean().unwrap_or(0.0);
            Ok(1.0 / (1.0 + (-mean).exp()))
        }
    }

    struct FailingInterpreter;

    impl Interpreter for FailingInterpreter {
        fn run(&mut self, _inputs: &ModelInputs) -> anyhow::Result<f32> {
            anyhow::bail!("shape mismatch on input 0")
        }
    }

    struct NanInterpreter;

    impl Interpreter for NanInterpreter {
        fn run(&mut self, _inputs: &ModelInputs) -> anyhow::Result<f32> {
            Ok(f32::NAN)
        }
    }

    fn session() -> CaptureSession {
        let frames = (0..20)
            .map(|i| {
                let t = i as f64;
                let points: Vec<[f64; 3]> = (0..28)
                    .map(|p| [p as f64 * 0.01, 0.5 + 0.01 * t, 0.0])
                    .collect();
                Frame::new()
                    .with_face_mesh(&points)
                    .with_gyro(t.sin(), 0.0, 0.0)
            })
            .collect();
        CaptureSession::new(frames)
    }

    #[test]
    fn test_threshold_is_strict() {
        let config = ScoringConfig::default();
        assert!(!Verdict::from_score(0.5, &config).is_real);
        assert!(Verdict::from_score(0.5001, &config).is_real);
        assert_eq!(Verdict::from_score(0.1, &config).label(), "fake");
    }

    #[test]
    fn test_serialized_scorer_runs_interpreter() {
        let scorer = SerializedScorer::new(MeanInterpreter { calls: 0 });
        let pipeline = PreprocessingPipeline::with_defaults();
        let verdict = evaluate(&pipeline, &scorer, &ScoringConfig::default(), &session()).unwrap();

        assert!((0.0..=1.0).contains(&verdict.score));
        assert_eq!(scorer.into_inner().unwrap().calls, 1);
    }

    #[test]
    fn test_interpreter_failure_maps_to_scoring_error() {
        let scorer = SerializedScorer::new(FailingInterpreter);
        let inputs = PreprocessingPipeline::with_defaults().run(&session()).unwrap();
        let err = scorer.score(&inputs).unwrap_err();
        assert!(matches!(err, LivecheckError::Scoring { .. }));
        assert!(!err.is_client_rejection());
    }

    #[test]
    fn test_non_finite_score_is_rejected() {
        let scorer = SerializedScorer::new(NanInterpreter);
        let inputs = PreprocessingPipeline::with_defaults().run(&session()).unwrap();
        assert!(scorer.score(&inputs).is_err());
    }

    #[test]
    fn test_preprocessing_rejection_skips_scoring() {
        let scorer = SerializedScorer::new(MeanInterpreter { calls: 0 });
        let err = evaluate(
            &PreprocessingPipeline::with_defaults(),
            &scorer,
            &ScoringConfig::default(),
            &CaptureSession::default(),
        )
        .unwrap_err();
        assert!(err.is_client_rejection());
        assert_eq!(scorer.into_inner().unwrap().calls, 0);
    }
}
