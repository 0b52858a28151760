//! The preprocessing pipeline: raw frames in, model tensors out.
//!
//! # Stages
//!
//! 1. **Extracting / Gating:** one pass over the frames builds landmark
//!    deltas, sensor vectors, and gated motion vectors.
//! 2. **Aligning:** removes the vision/inertial clock offset.
//! 3. **Normalizing:** robust per-channel scaling of each sequence.
//! 4. **Canonicalizing:** crop or pad each sequence to the target length.
//!
//! A session either yields all three tensors or fails with a client-facing
//! rejection ([`LivecheckError::MalformedInput`] or
//! [`LivecheckError::InsufficientSequence`]). Numeric degeneracies inside
//! alignment and normalization are absorbed.

use std::fmt;

use livecheck_capture_model::frame::Frame;
use livecheck_capture_model::session::CaptureSession;
use livecheck_common::config::PipelineConfig;
use livecheck_common::error::{LivecheckError, LivecheckResult};

use crate::align::{AlignmentOutcome, TemporalAligner};
use crate::canonical::SequenceCanonicalizer;
use crate::gate::{GateDecision, ModalityGate};
use crate::normalize::RobustNormalizer;
use crate::samples::{SampleSet, SampleVectorBuilder};
use crate::tensor::ModelInputs;

/// Pipeline stage, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Extracting,
    Gating,
    Aligning,
    Normalizing,
    Canonicalizing,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Extracting => "extracting",
            Self::Gating => "gating",
            Self::Aligning => "aligning",
            Self::Normalizing => "normalizing",
            Self::Canonicalizing => "canonicalizing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Diagnostics for one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessReport {
    /// Frames in the session.
    pub input_frames: usize,
    /// Frames that carried usable landmarks.
    pub landmark_frames: usize,
    pub gate: GateDecision,
    pub alignment: AlignmentOutcome,
    /// Frames per sequence after alignment, before canonicalization.
    pub aligned_frames: usize,
}

/// Orchestrates gating, extraction, alignment, normalization, and
/// canonicalization. Holds only immutable configuration, so one instance
/// can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct PreprocessingPipeline {
    config: PipelineConfig,
    gate: ModalityGate,
    builder: SampleVectorBuilder,
    aligner: TemporalAligner,
    normalizer: RobustNormalizer,
    canonicalizer: SequenceCanonicalizer,
}

impl PreprocessingPipeline {
    /// Build a pipeline, rejecting invalid configuration.
    pub fn new(config: PipelineConfig) -> LivecheckResult<Self> {
        config.validate()?;
        Ok(Self {
            gate: ModalityGate::new(config.gate_threshold),
            builder: SampleVectorBuilder::from_config(&config),
            aligner: TemporalAligner::new(config.alignment.clone()),
            normalizer: RobustNormalizer::from_config(&config),
            canonicalizer: SequenceCanonicalizer::new(config.target_frames),
            config,
        })
    }

    /// A pipeline with the default configuration.
    pub fn with_defaults() -> Self {
        let config = PipelineConfig::default();
        Self {
            gate: ModalityGate::new(config.gate_threshold),
            builder: SampleVectorBuilder::from_config(&config),
            aligner: TemporalAligner::new(config.alignment.clone()),
            normalizer: RobustNormalizer::from_config(&config),
            canonicalizer: SequenceCanonicalizer::new(config.target_frames),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Preprocess a session into model tensors.
    pub fn run(&self, session: &CaptureSession) -> LivecheckResult<ModelInputs> {
        self.run_with_report(session.frames())
            .map(|(inputs, _)| inputs)
    }

    /// Preprocess frames into model tensors, with diagnostics.
    pub fn run_with_report(
        &self,
        frames: &[Frame],
    ) -> LivecheckResult<(ModelInputs, PreprocessReport)> {
        let (samples, report) = self.prepare(frames)?;

        tracing::debug!(stage = %PipelineStage::Normalizing, frames = samples.len());
        let landmarks = self.normalizer.normalize(&samples.landmarks);
        let sensors = self.normalizer.normalize(&samples.sensors);
        let motion = self.normalizer.normalize(&samples.motion);

        tracing::debug!(
            stage = %PipelineStage::Canonicalizing,
            target = self.canonicalizer.target_frames()
        );
        let inputs = ModelInputs::from_sequences(
            self.canonicalizer.canonicalize(&landmarks),
            self.canonicalizer.canonicalize(&sensors),
            self.canonicalizer.canonicalize(&motion),
        );

        tracing::debug!(stage = %PipelineStage::Done, shapes = ?inputs.shapes());
        Ok((inputs, report))
    }

    /// Run extraction, gating, and alignment only.
    ///
    /// Returns the aligned, lockstep sample set and the report, or the
    /// rejection the full pipeline would produce.
    pub fn prepare(&self, frames: &[Frame]) -> LivecheckResult<(SampleSet, PreprocessReport)> {
        if frames.is_empty() {
            tracing::info!("rejecting session: no frames");
            return Err(LivecheckError::malformed_input("session contains no frames"));
        }

        tracing::debug!(stage = %PipelineStage::Gating, frames = frames.len());
        let gate = self.gate.decide(frames);
        tracing::debug!(
            mean_bg_variance = gate.mean_bg_variance,
            open = gate.is_open,
            "modality gate decided"
        );

        tracing::debug!(stage = %PipelineStage::Extracting);
        let samples = self.builder.build(frames, gate);
        let landmark_frames = samples.len();
        if samples.is_empty() {
            tracing::info!(
                frames = frames.len(),
                "rejecting session: no frame has usable landmarks"
            );
            return Err(LivecheckError::malformed_input(
                "no frame contains usable landmark data",
            ));
        }

        tracing::debug!(stage = %PipelineStage::Aligning, frames = landmark_frames);
        let (aligned, alignment) = self.aligner.align(samples);
        debug_assert!(aligned.is_lockstep());

        let aligned_frames = aligned.len();
        if aligned_frames < self.config.min_sequence_frames {
            tracing::info!(
                frames = aligned_frames,
                minimum = self.config.min_sequence_frames,
                "rejecting session: too few frames after alignment"
            );
            return Err(LivecheckError::insufficient_sequence(
                aligned_frames,
                self.config.min_sequence_frames,
            ));
        }

        let report = PreprocessReport {
            input_frames: frames.len(),
            landmark_frames,
            gate,
            alignment,
            aligned_frames,
        };
        Ok((aligned, report))
    }
}

impl Default for PreprocessingPipeline {
    fn default() -> Self {
        Self::with_defaults()
    }
}
