//! Session-level gating of the motion/background modality.
//!
//! Scene motion features are only informative when the background actually
//! varies. The decision is made once over the whole session so every frame
//! is treated the same way.

use livecheck_capture_model::frame::Frame;

/// Outcome of the gate for one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateDecision {
    /// Mean `bg_variance` over every frame (missing counts as zero).
    pub mean_bg_variance: f64,
    /// Whether motion/background features carry real values.
    pub is_open: bool,
}

/// Decides whether motion/background features are populated or zero-filled.
#[derive(Debug, Clone, Copy)]
pub struct ModalityGate {
    threshold: f64,
}

impl ModalityGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Evaluate the gate over all frames, including those without landmarks.
    ///
    /// An empty session is always closed.
    pub fn decide(&self, frames: &[Frame]) -> GateDecision {
        if frames.is_empty() {
            return GateDecision {
                mean_bg_variance: 0.0,
                is_open: false,
            };
        }

        let mean_bg_variance =
            frames.iter().map(Frame::bg_variance).sum::<f64>() / frames.len() as f64;

        GateDecision {
            mean_bg_variance,
            is_open: mean_bg_variance >= self.threshold,
        }
    }
}
