//! Livecheck Processing Core: temporal preprocessing for liveness scoring
//!
//! Turns a captured session of per-frame telemetry into three fixed-shape
//! model inputs:
//! - **Gating:** decide whether background-motion features are trustworthy
//! - **Extraction:** landmark deltas, inertial vectors, and motion vectors
//! - **Alignment:** remove the camera/IMU clock offset
//! - **Normalization:** EWMA smoothing, median/IQR scaling, clipping
//! - **Canonicalization:** center-crop or pad to a fixed frame count
//!
//! This crate is pure computation: no I/O, no model runtime.
//! All inputs are data; all outputs are data.

pub mod align;
pub mod canonical;
pub mod gate;
pub mod landmarks;
pub mod normalize;
pub mod pipeline;
pub mod samples;
pub mod scoring;
pub mod stats;
pub mod tensor;

pub use align::{AlignmentOutcome, TemporalAligner};
pub use canonical::SequenceCanonicalizer;
pub use gate::{GateDecision, ModalityGate};
pub use landmarks::LandmarkSelector;
pub use normalize::RobustNormalizer;
pub use pipeline::{PipelineStage, PreprocessReport, PreprocessingPipeline};
pub use samples::{SampleSet, SampleVectorBuilder};
pub use scoring::{evaluate, Interpreter, LivenessScorer, SerializedScorer, Verdict};
pub use tensor::{ModelInputs, TensorDump, INPUT_NAMES};
