//! Robust per-channel normalization.
//!
//! Each channel is smoothed with a zero-bias exponential moving average,
//! centered on its median, scaled by its interquartile range, and clipped.
//! Median and IQR ignore the occasional tracking glitch that would blow up
//! a mean/std scaling.

use ndarray::{Array2, ArrayViewMut1};

use livecheck_common::config::{PipelineConfig, SmoothingConfig};

use crate::stats;

/// Smooths and rescales (frames × channels) sequences.
#[derive(Debug, Clone)]
pub struct RobustNormalizer {
    smoothing: SmoothingConfig,
    clip_bound: f64,
    empty_frames: usize,
}

impl RobustNormalizer {
    /// `empty_frames` is the row count of the zero column returned for empty input.
    pub fn new(smoothing: SmoothingConfig, clip_bound: f64, empty_frames: usize) -> Self {
        Self {
            smoothing,
            clip_bound,
            empty_frames,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.smoothing.clone(),
            config.clip_bound,
            config.target_frames,
        )
    }

    /// Normalize a sequence, returning a new array of the same shape.
    ///
    /// An empty sequence yields a zero column of `empty_frames` rows.
    pub fn normalize(&self, sequence: &Array2<f64>) -> Array2<f64> {
        if sequence.is_empty() {
            return Array2::zeros((self.empty_frames, 1));
        }

        let mut out = sequence.to_owned();
        let mut flat_channels = 0usize;

        for mut channel in out.columns_mut() {
            if self.smoothing.enabled {
                ewma_in_place(&mut channel, self.smoothing.span);
            }
            channel.mapv_inplace(|v| if v.is_finite() { v } else { 0.0 });

            let mut sorted = channel.to_vec();
            sorted.sort_by(f64::total_cmp);
            let median = stats::percentile_sorted(&sorted, 50.0);
            let iqr = stats::percentile_sorted(&sorted, 75.0) - stats::percentile_sorted(&sorted, 25.0);
            let scale = if iqr == 0.0 {
                flat_channels += 1;
                1.0
            } else {
                iqr
            };

            let bound = self.clip_bound;
            channel.mapv_inplace(|v| {
                let z = (v - median) / scale;
                if z.is_nan() {
                    0.0
                } else {
                    z.clamp(-bound, bound)
                }
            });
        }

        if flat_channels > 0 {
            tracing::debug!(
                flat_channels,
                channels = out.ncols(),
                "zero interquartile range, using unit scale"
            );
        }

        out
    }
}

/// Exponential moving average with `alpha = 2 / (span + 1)`, seeded with
/// the first sample.
fn ewma_in_place(channel: &mut ArrayViewMut1<'_, f64>, span: f64) {
    let alpha = 2.0 / (span + 1.0);
    let mut prev: Option<f64> = None;
    for value in channel.iter_mut() {
        let smoothed = match prev {
            None => *value,
            Some(p) => alpha * *value + (1.0 - alpha) * p,
        };
        *value = smoothed;
        prev = Some(smoothed);
    }
}
