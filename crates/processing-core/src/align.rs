//! Vision/inertial temporal alignment.
//!
//! The camera and the inertial sensors run on independent clocks, so the
//! landmark stream can lead or trail the gyroscope by a few frames. The
//! offset is estimated by cross-correlating two 1-D proxies:
//!
//! 1. **Vertical face motion:** frame-to-frame change of the mean landmark Y
//!    coordinate, computed on absolute landmark positions.
//! 2. **Gyroscope X:** rotation about the device's horizontal axis, which
//!    is what a nodding head or tilting phone produces.
//!
//! Both are z-scored, fully cross-correlated, and the lag at the peak is
//! removed by trimming opposite ends of the vision and inertial sequences.
//! Alignment is best-effort: every failure returns the input unchanged.

use ndarray::Array2;

use livecheck_common::config::AlignmentConfig;

use crate::samples::{SampleSet, GYRO_X_CHANNEL};
use crate::stats;

/// What the aligner did to a sample set.
#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentOutcome {
    /// Too few frames for a reliable correlation.
    Skipped { frames: usize },
    /// Estimated lag exceeded the configured bound and was ignored.
    OutOfRange { lag: isize },
    /// Lag was zero, or shifting would leave too few frames.
    Unchanged { lag: isize },
    /// Sequences were trimmed to remove `lag` frames of offset.
    Shifted { lag: isize },
    /// Numeric failure; the input was returned unaligned.
    Degenerate { reason: String },
}

impl AlignmentOutcome {
    /// The estimated lag, when one was computed.
    pub fn lag(&self) -> Option<isize> {
        match self {
            Self::OutOfRange { lag } | Self::Unchanged { lag } | Self::Shifted { lag } => {
                Some(*lag)
            }
            Self::Skipped { .. } | Self::Degenerate { .. } => None,
        }
    }
}

/// Numeric failures while estimating the lag.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AlignmentError {
    #[error("{0} signal has zero variance")]
    FlatSignal(&'static str),

    #[error("{0} signal contains non-finite values")]
    NonFinite(&'static str),

    #[error("cross-correlation has no finite peak")]
    NoPeak,
}

/// Estimates and removes the frame offset between vision and inertial data.
#[derive(Debug, Clone)]
pub struct TemporalAligner {
    config: AlignmentConfig,
}

impl TemporalAligner {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AlignmentConfig::default())
    }

    /// Align a sample set, returning it with the outcome.
    ///
    /// The returned set is always lockstep.
    pub fn align(&self, samples: SampleSet) -> (SampleSet, AlignmentOutcome) {
        let frames = samples.landmarks.nrows().min(samples.sensors.nrows());
        if frames < self.config.min_frames {
            tracing::debug!(frames, "alignment skipped: sequence too short");
            return (samples, AlignmentOutcome::Skipped { frames });
        }

        let lag = match self.estimate_lag(&samples) {
            Ok(lag) => lag,
            Err(e) => {
                tracing::debug!("alignment degenerate, keeping input: {e}");
                return (
                    samples,
                    AlignmentOutcome::Degenerate {
                        reason: e.to_string(),
                    },
                );
            }
        };

        if lag.unsigned_abs() > self.config.max_lag {
            tracing::debug!(lag, "alignment lag out of range, ignoring");
            return (samples, AlignmentOutcome::OutOfRange { lag });
        }

        let n = samples.landmarks.nrows();
        let shift = lag.unsigned_abs();
        if lag == 0 || n.saturating_sub(shift) <= self.config.min_retained {
            return (samples.truncated_to_common(), AlignmentOutcome::Unchanged { lag });
        }

        let shifted = if lag < 0 {
            // Vision leads: drop its tail and the inertial head.
            samples.shifted(0..n - shift, shift..samples.sensors.nrows())
        } else {
            // Vision trails: drop its head and the inertial tail.
            samples.shifted(shift..n, 0..samples.sensors.nrows().saturating_sub(shift))
        };

        tracing::debug!(lag, frames = shifted.len(), "sequences aligned");
        (shifted.truncated_to_common(), AlignmentOutcome::Shifted { lag })
    }

    /// Estimate the lag of vision relative to the gyroscope, in frames.
    ///
    /// A positive lag means the face motion shows up `lag` frames after the
    /// matching gyroscope motion.
    pub fn estimate_lag(&self, samples: &SampleSet) -> Result<isize, AlignmentError> {
        let face_dy = vertical_face_motion(&samples.raw_landmarks);
        let gyro_x = samples.sensors.column(GYRO_X_CHANNEL).to_vec();

        let face = self.normalized(&face_dy, "face motion")?;
        let gyro = self.normalized(&gyro_x, "gyroscope")?;

        let corr = cross_correlate(&face, &gyro);
        if corr.iter().any(|c| !c.is_finite()) {
            return Err(AlignmentError::NonFinite("correlation"));
        }
        let peak = stats::argmax(&corr).ok_or(AlignmentError::NoPeak)?;
        Ok(peak as isize - (gyro.len() as isize - 1))
    }

    fn normalized(&self, signal: &[f64], name: &'static str) -> Result<Vec<f64>, AlignmentError> {
        if signal.iter().any(|v| !v.is_finite()) {
            return Err(AlignmentError::NonFinite(name));
        }
        if stats::std_dev(signal) == 0.0 {
            return Err(AlignmentError::FlatSignal(name));
        }
        Ok(stats::z_score(signal, self.config.epsilon))
    }
}

/// Per-frame change of the mean landmark Y coordinate.
///
/// Y is every third column starting at 1. The first frame has no
/// predecessor and yields `0.0`.
pub fn vertical_face_motion(raw_landmarks: &Array2<f64>) -> Vec<f64> {
    let mean_y: Vec<f64> = raw_landmarks
        .rows()
        .into_iter()
        .map(|row| {
            let ys: Vec<f64> = row.iter().skip(1).step_by(3).copied().collect();
            stats::mean(&ys)
        })
        .collect();

    let mut motion = Vec::with_capacity(mean_y.len());
    for (i, y) in mean_y.iter().enumerate() {
        let prev = if i == 0 { *y } else { mean_y[i - 1] };
        motion.push(y - prev);
    }
    motion
}

/// Full discrete cross-correlation.
///
/// Element `k` corresponds to lag `k - (b.len() - 1)` and holds
/// `sum_n a[n + lag] * b[n]`.
pub fn cross_correlate(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return vec![];
    }
    let offset = b.len() as isize - 1;
    let total = a.len() + b.len() - 1;
    (0..total)
        .map(|k| {
            let lag = k as isize - offset;
            b.iter()
                .enumerate()
                .filter_map(|(n, bv)| {
                    let i = n as isize + lag;
                    (i >= 0 && (i as usize) < a.len()).then(|| a[i as usize] * bv)
                })
                .sum::<f64>()
        })
        .collect()
}
