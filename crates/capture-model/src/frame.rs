//! Per-frame capture records.
//!
//! A frame is one sampling instant on the client: the face mesh from the
//! vision tracker, accelerometer and gyroscope readings, scene motion
//! estimates, and a background-variance estimate.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::numeric::{coerce_f64, flatten_mesh, lenient};

/// One sampling instant of a capture session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Face landmarks, either `[[x, y, z], ...]` or flat `[x, y, z, ...]`.
    #[serde(rename = "faceMesh", default, skip_serializing_if = "Option::is_none")]
    pub face_mesh: Option<Value>,

    /// Inertial readings.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub sensors: Option<Sensors>,

    /// Scene motion estimates from the client's optical-flow pass.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub motion_analysis: Option<MotionAnalysis>,

    /// Background-variance estimate used for gating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_variance: Option<Value>,

    /// Capture metadata.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub meta: Option<FrameMeta>,
}

/// Accelerometer and gyroscope readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub accel: Option<Axes>,

    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub gyro: Option<Axes>,
}

/// A 3-axis reading. Each component is coerced leniently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<Value>,
}

/// Scalar motion features derived from the video stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionAnalysis {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_dx: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_dy: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_dx: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_dy: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_magnitude: Option<Value>,
}

/// Capture metadata attached to a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    /// `"environment"` for a rear camera, `"user"` for the selfie camera.
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub camera_facing: Option<String>,

    /// Client wall-clock time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
}

/// Which physical camera produced the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraFacing {
    /// Rear camera; its Z axis is mirrored relative to the selfie camera.
    Environment,
    /// Front camera, or no metadata.
    User,
}

impl CameraFacing {
    /// Sign applied to `accel.z` so both cameras share one convention.
    pub fn accel_z_sign(self) -> f64 {
        match self {
            Self::Environment => -1.0,
            Self::User => 1.0,
        }
    }
}

impl Axes {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x: Some(json!(x)),
            y: Some(json!(y)),
            z: Some(json!(z)),
        }
    }

    /// Coerced `[x, y, z]`.
    pub fn values(&self) -> [f64; 3] {
        [
            coerce_f64(self.x.as_ref()),
            coerce_f64(self.y.as_ref()),
            coerce_f64(self.z.as_ref()),
        ]
    }
}

impl MotionAnalysis {
    pub fn new(face_dx: f64, face_dy: f64, bg_dx: f64, bg_dy: f64, relative_magnitude: f64) -> Self {
        Self {
            face_dx: Some(json!(face_dx)),
            face_dy: Some(json!(face_dy)),
            bg_dx: Some(json!(bg_dx)),
            bg_dy: Some(json!(bg_dy)),
            relative_magnitude: Some(json!(relative_magnitude)),
        }
    }

    /// Coerced `[face_dx, face_dy, bg_dx, bg_dy, relative_magnitude]`.
    pub fn values(&self) -> [f64; 5] {
        [
            coerce_f64(self.face_dx.as_ref()),
            coerce_f64(self.face_dy.as_ref()),
            coerce_f64(self.bg_dx.as_ref()),
            coerce_f64(self.bg_dy.as_ref()),
            coerce_f64(self.relative_magnitude.as_ref()),
        ]
    }
}

impl Frame {
    /// An empty frame with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the face mesh from landmark tuples.
    pub fn with_face_mesh(mut self, points: &[[f64; 3]]) -> Self {
        self.face_mesh = Some(json!(points));
        self
    }

    pub fn with_accel(mut self, x: f64, y: f64, z: f64) -> Self {
        self.sensors.get_or_insert_with(Sensors::default).accel = Some(Axes::new(x, y, z));
        self
    }

    pub fn with_gyro(mut self, x: f64, y: f64, z: f64) -> Self {
        self.sensors.get_or_insert_with(Sensors::default).gyro = Some(Axes::new(x, y, z));
        self
    }

    pub fn with_motion(mut self, motion: MotionAnalysis) -> Self {
        self.motion_analysis = Some(motion);
        self
    }

    pub fn with_bg_variance(mut self, bg_variance: f64) -> Self {
        self.bg_variance = Some(json!(bg_variance));
        self
    }

    pub fn with_camera_facing(mut self, facing: impl Into<String>) -> Self {
        self.meta.get_or_insert_with(FrameMeta::default).camera_facing = Some(facing.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: f64) -> Self {
        self.meta.get_or_insert_with(FrameMeta::default).timestamp = Some(json!(timestamp_ms));
        self
    }

    /// Flattened landmark coordinates, or `None` if the mesh is absent or unusable.
    pub fn landmark_coords(&self) -> Option<Vec<f64>> {
        self.face_mesh.as_ref().and_then(flatten_mesh)
    }

    /// Coerced background variance; missing counts as `0.0`.
    pub fn bg_variance(&self) -> f64 {
        coerce_f64(self.bg_variance.as_ref())
    }

    pub fn camera_facing(&self) -> CameraFacing {
        match self
            .meta
            .as_ref()
            .and_then(|m| m.camera_facing.as_deref())
        {
            Some("environment") => CameraFacing::Environment,
            _ => CameraFacing::User,
        }
    }

    /// Coerced accelerometer reading, zeros when absent.
    pub fn accel(&self) -> [f64; 3] {
        self.sensors
            .as_ref()
            .and_then(|s| s.accel.as_ref())
            .map(Axes::values)
            .unwrap_or_default()
    }

    /// Coerced gyroscope reading, zeros when absent.
    pub fn gyro(&self) -> [f64; 3] {
        self.sensors
            .as_ref()
            .and_then(|s| s.gyro.as_ref())
            .map(Axes::values)
            .unwrap_or_default()
    }

    /// Whether any inertial reading is present.
    pub fn has_sensors(&self) -> bool {
        self.sensors
            .as_ref()
            .is_some_and(|s| s.accel.is_some() || s.gyro.is_some())
    }

    /// Coerced motion features, zeros when absent.
    pub fn motion(&self) -> [f64; 5] {
        self.motion_analysis
            .as_ref()
            .map(MotionAnalysis::values)
            .unwrap_or_default()
    }

    /// Client timestamp in milliseconds, if present and numeric.
    pub fn timestamp_ms(&self) -> Option<f64> {
        self.meta
            .as_ref()
            .and_then(|m| m.timestamp.as_ref())
            .and_then(Value::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_parses_all_fields() {
        let raw = r#"{
            "faceMesh": [[0.1, 0.2, 0.3]],
            "sensors": {"accel": {"x": 1, "y": "2", "z": 3.5}, "gyro": {"x": 0.1}},
            "motion_analysis": {"face_dx": 0.5, "bg_dy": -0.25},
            "bg_variance": 4.2,
            "meta": {"camera_facing": "environment", "timestamp": 1700000000000}
        }"#;

        let frame: Frame = serde_json::from_str(raw).unwrap();
        assert_eq!(frame.landmark_coords(), Some(vec![0.1, 0.2, 0.3]));
        assert_eq!(frame.accel(), [1.0, 2.0, 3.5]);
        assert_eq!(frame.gyro(), [0.1, 0.0, 0.0]);
        assert_eq!(frame.motion(), [0.5, 0.0, 0.0, -0.25, 0.0]);
        assert!((frame.bg_variance() - 4.2).abs() < 1e-12);
        assert_eq!(frame.camera_facing(), CameraFacing::Environment);
        assert_eq!(frame.timestamp_ms(), Some(1_700_000_000_000.0));
    }

    #[test]
    fn test_empty_object_is_a_valid_frame() {
        let frame: Frame = serde_json::from_str("{}").unwrap();
        assert_eq!(frame.landmark_coords(), None);
        assert_eq!(frame.accel(), [0.0; 3]);
        assert_eq!(frame.motion(), [0.0; 5]);
        assert_eq!(frame.bg_variance(), 0.0);
        assert_eq!(frame.camera_facing(), CameraFacing::User);
        assert!(!frame.has_sensors());
    }

    #[test]
    fn test_wrong_shapes_are_treated_as_absent() {
        let raw = r#"{
            "sensors": "unavailable",
            "motion_analysis": "n/a",
            "bg_variance": null,
            "meta": {"camera_facing": 7}
        }"#;

        let frame: Frame = serde_json::from_str(raw).unwrap();
        assert!(frame.sensors.is_none());
        assert!(frame.motion_analysis.is_none());
        assert_eq!(frame.bg_variance(), 0.0);
        assert_eq!(frame.camera_facing(), CameraFacing::User);
    }

    #[test]
    fn test_null_accel_inside_sensors() {
        let frame: Frame =
            serde_json::from_str(r#"{"sensors": {"accel": null, "gyro": {"x": 2}}}"#).unwrap();
        assert_eq!(frame.accel(), [0.0; 3]);
        assert_eq!(frame.gyro(), [2.0, 0.0, 0.0]);
        assert!(frame.has_sensors());
    }

    #[test]
    fn test_builder_produces_wire_format() {
        let frame = Frame::new()
            .with_face_mesh(&[[0.0, 1.0, 2.0]])
            .with_accel(1.0, 2.0, 3.0)
            .with_camera_facing("user");
        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("\"faceMesh\""));
        assert!(json.contains("\"camera_facing\":\"user\""));
        assert!(!json.contains("motion_analysis"));
    }

    #[test]
    fn test_camera_facing_sign() {
        assert_eq!(CameraFacing::Environment.accel_z_sign(), -1.0);
        assert_eq!(CameraFacing::User.accel_z_sign(), 1.0);
    }
}
