//! Fixed-length canonicalization of sequences.

use ndarray::{s, Array2};

/// Forces sequences to exactly `target_frames` rows.
///
/// Longer sequences keep a centered window; shorter ones are zero-padded at
/// the tail. The channel width never changes.
#[derive(Debug, Clone, Copy)]
pub struct SequenceCanonicalizer {
    target_frames: usize,
}

impl SequenceCanonicalizer {
    pub fn new(target_frames: usize) -> Self {
        Self { target_frames }
    }

    pub fn target_frames(&self) -> usize {
        self.target_frames
    }

    pub fn canonicalize(&self, sequence: &Array2<f64>) -> Array2<f64> {
        let (len, channels) = sequence.dim();
        let target = self.target_frames;

        if len > target {
            let start = (len - target) / 2;
            sequence.slice(s![start..start + target, ..]).to_owned()
        } else if len < target {
            let mut padded = Array2::zeros((target, channels));
            padded.slice_mut(s![..len, ..]).assign(sequence);
            padded
        } else {
            sequence.to_owned()
        }
    }
}
