//! Capture sessions: the ordered frame list of one liveness check.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::frame::Frame;

/// All frames a client recorded during one liveness check.
///
/// The session is supplied whole and is never mutated by processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureSession {
    /// Frames in capture order. A missing or `null` list is an empty session.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Frame>,
}

/// Aggregate statistics over a session's raw frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub frames: usize,
    pub landmark_frames: usize,
    pub sensor_frames: usize,
    pub motion_frames: usize,
    pub mean_bg_variance: f64,
    /// Last minus first client timestamp, when both are present.
    pub duration_ms: Option<f64>,
}

impl CaptureSession {
    pub fn new(data: Vec<Frame>) -> Self {
        Self { data }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Load a session from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SessionError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| SessionError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save a session as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SessionError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|e| SessionError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| SessionError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn summary(&self) -> SessionSummary {
        let frames = self.data.len();
        let landmark_frames = self
            .data
            .iter()
            .filter(|f| f.landmark_coords().is_some())
            .count();
        let sensor_frames = self.data.iter().filter(|f| f.has_sensors()).count();
        let motion_frames = self
            .data
            .iter()
            .filter(|f| f.motion_analysis.is_some())
            .count();
        let mean_bg_variance = if frames == 0 {
            0.0
        } else {
            self.data.iter().map(Frame::bg_variance).sum::<f64>() / frames as f64
        };

        let mut stamps = self.data.iter().filter_map(Frame::timestamp_ms);
        let duration_ms = match (stamps.next(), stamps.last()) {
            (Some(first), Some(last)) => Some(last - first),
            _ => None,
        };

        SessionSummary {
            frames,
            landmark_frames,
            sensor_frames,
            motion_frames,
            mean_bg_variance,
            duration_ms,
        }
    }
}

/// Parse a session from a JSON document.
pub fn parse_session(json: &str) -> Result<CaptureSession, serde_json::Error> {
    serde_json::from_str(json)
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Frame>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Frame>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Errors that can occur when loading or saving sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_or_null_data_is_empty() {
        assert!(parse_session("{}").unwrap().is_empty());
        assert!(parse_session(r#"{"data": null}"#).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let session =
            parse_session(r#"{"user_id": "abc", "data": [{"faceMesh": null, "extra": 1}]}"#)
                .unwrap();
        assert_eq!(session.len(), 1);
        assert!(session.frames()[0].landmark_coords().is_none());
    }

    #[test]
    fn test_summary_counts() {
        let session = CaptureSession::new(vec![
            Frame::new()
                .with_face_mesh(&[[0.0, 0.0, 0.0]])
                .with_bg_variance(2.0)
                .with_timestamp(1000.0),
            Frame::new().with_gyro(0.1, 0.2, 0.3).with_bg_variance(4.0),
            Frame::new()
                .with_face_mesh(&[[0.0, 0.1, 0.0]])
                .with_timestamp(1066.0),
        ]);

        let summary = session.summary();
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.landmark_frames, 2);
        assert_eq!(summary.sensor_frames, 1);
        assert_eq!(summary.motion_frames, 0);
        assert!((summary.mean_bg_variance - 2.0).abs() < 1e-12);
        assert_eq!(summary.duration_ms, Some(66.0));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join("livecheck_test_session.json");
        let session = CaptureSession::new(vec![Frame::new()
            .with_face_mesh(&[[0.5, 0.5, 0.0]])
            .with_accel(0.0, 9.8, 0.1)]);

        session.save(&path).unwrap();
        let loaded = CaptureSession::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.frames()[0].accel(), [0.0, 9.8, 0.1]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let path = std::env::temp_dir().join("livecheck_test_bad_session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = CaptureSession::load(&path).unwrap_err();
        assert!(matches!(err, SessionError::ParseError { .. }));
        assert!(err.to_string().contains("livecheck_test_bad_session.json"));

        std::fs::remove_file(&path).ok();
    }
}
