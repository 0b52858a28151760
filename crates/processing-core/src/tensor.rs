//! Model-ready tensors.

use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};

/// Input slot names, in the fixed modality order.
pub const INPUT_NAMES: [&str; 3] = ["landmarks", "sensors", "motion"];

/// The three batched `(1, frames, channels)` float32 inputs of the model,
/// in fixed order: landmarks, sensors, motion/background.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputs {
    pub landmarks: Array3<f32>,
    pub sensors: Array3<f32>,
    pub motion: Array3<f32>,
}

/// A tensor flattened to row-major data for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorDump {
    pub name: String,
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl ModelInputs {
    /// Batch three canonical (frames × channels) sequences.
    pub fn from_sequences(
        landmarks: Array2<f64>,
        sensors: Array2<f64>,
        motion: Array2<f64>,
    ) -> Self {
        Self {
            landmarks: batch(landmarks),
            sensors: batch(sensors),
            motion: batch(motion),
        }
    }

    /// Tensors paired with their slot names, in input order.
    pub fn named(&self) -> [(&'static str, &Array3<f32>); 3] {
        [
            (INPUT_NAMES[0], &self.landmarks),
            (INPUT_NAMES[1], &self.sensors),
            (INPUT_NAMES[2], &self.motion),
        ]
    }

    pub fn shapes(&self) -> [[usize; 3]; 3] {
        self.named().map(|(_, t)| {
            let (b, f, c) = t.dim();
            [b, f, c]
        })
    }

    /// Row-major dumps of every tensor.
    pub fn dump(&self) -> Vec<TensorDump> {
        self.named()
            .into_iter()
            .map(|(name, tensor)| TensorDump {
                name: name.to_string(),
                shape: tensor.shape().to_vec(),
                data: tensor.iter().copied().collect(),
            })
            .collect()
    }
}

fn batch(sequence: Array2<f64>) -> Array3<f32> {
    sequence.mapv(|v| v as f32).insert_axis(Axis(0))
}
