//! Application configuration.
//!
//! Every threshold the preprocessing pipeline uses lives here so it can be
//! tuned without touching the algorithms. A loaded config is treated as
//! read-only for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LivecheckError, LivecheckResult};

/// Number of face-mesh points the model consumes per frame.
pub const SELECTED_LANDMARK_COUNT: usize = 28;

/// Default face-mesh indices (468-point topology) reduced to the 28 points
/// the model was trained on: nose, forehead, chin, eyes, brows, lips,
/// cheeks, and jaw line.
pub const DEFAULT_LANDMARK_INDICES: [usize; SELECTED_LANDMARK_COUNT] = [
    1, 4, 10, 152, // nose tip, nose bridge, forehead, chin
    33, 133, 159, 145, // left eye
    263, 362, 386, 374, // right eye
    70, 105, 300, 334, // brows
    61, 291, 13, 14, 0, 17, // lips
    234, 454, 50, 280, // cheeks
    172, 397, // jaw
];

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Preprocessing pipeline parameters.
    pub pipeline: PipelineConfig,

    /// Verdict parameters for the scoring collaborator.
    pub scoring: ScoringConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Parameters of the temporal preprocessing pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Frame count every output tensor is cropped or padded to.
    pub target_frames: usize,

    /// Mean `bg_variance` at or above which motion features are kept.
    pub gate_threshold: f64,

    /// Fewest aligned frames the pipeline accepts.
    pub min_sequence_frames: usize,

    /// Exponential smoothing ahead of normalization.
    pub smoothing: SmoothingConfig,

    /// Normalized values are clipped to `[-clip_bound, clip_bound]`.
    pub clip_bound: f64,

    /// Cross-correlation alignment bounds.
    pub alignment: AlignmentConfig,

    /// Face-mesh indices kept when a client sends a full mesh.
    pub landmark_indices: Vec<usize>,
}

/// Exponential moving-average smoothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub enabled: bool,

    /// EWMA span; `alpha = 2 / (span + 1)`.
    pub span: f64,
}

/// Vision/inertial alignment bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    /// Below this many frames alignment is skipped.
    pub min_frames: usize,

    /// Lags with a larger magnitude are treated as spurious.
    pub max_lag: usize,

    /// A shift is applied only if more than this many frames remain.
    pub min_retained: usize,

    /// Added to the standard deviation when z-scoring.
    pub epsilon: f64,
}

/// Verdict parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Scores strictly above this are classified as a live subject.
    pub real_threshold: f32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "livecheck=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_frames: 80,
            gate_threshold: 3.0,
            min_sequence_frames: 5,
            smoothing: SmoothingConfig::default(),
            clip_bound: 4.0,
            alignment: AlignmentConfig::default(),
            landmark_indices: DEFAULT_LANDMARK_INDICES.to_vec(),
        }
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            span: 3.0,
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            min_frames: 15,
            max_lag: 30,
            min_retained: 5,
            epsilon: 1e-6,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            real_threshold: 0.5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl PipelineConfig {
    /// Landmark channel width (selected points × 3 coordinates).
    pub fn landmark_channels(&self) -> usize {
        self.landmark_indices.len() * 3
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> LivecheckResult<()> {
        if self.target_frames == 0 {
            return Err(LivecheckError::config("target_frames must be positive"));
        }
        if self.min_sequence_frames == 0 {
            return Err(LivecheckError::config(
                "min_sequence_frames must be positive",
            ));
        }
        if !(self.smoothing.span >= 1.0) {
            return Err(LivecheckError::config("smoothing.span must be >= 1"));
        }
        if !(self.clip_bound > 0.0) {
            return Err(LivecheckError::config("clip_bound must be positive"));
        }
        if !(self.alignment.epsilon > 0.0) {
            return Err(LivecheckError::config(
                "alignment.epsilon must be positive",
            ));
        }
        if self.landmark_indices.len() != SELECTED_LANDMARK_COUNT {
            return Err(LivecheckError::config(format!(
                "landmark_indices must list exactly {SELECTED_LANDMARK_COUNT} points, got {}",
                self.landmark_indices.len()
            )));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> LivecheckResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LivecheckError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.pipeline.validate()?;
        Ok(config)
    }

    /// Save config to the standard location, returning the path written.
    pub fn save(&self) -> LivecheckResult<PathBuf> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, json)?;
        Ok(config_path)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("livecheck").join("config.json")
}
