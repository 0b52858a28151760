//! Per-frame numeric vectors extracted from raw capture frames.
//!
//! Frames without usable landmarks are dropped entirely, so every emitted
//! row has a landmark, sensor, and motion vector and the sequences stay
//! frame-aligned by construction.

use std::ops::Range;

use ndarray::{s, Array2};

use livecheck_capture_model::frame::Frame;
use livecheck_common::config::PipelineConfig;

use crate::gate::GateDecision;
use crate::landmarks::LandmarkSelector;

/// Channels of the inertial sequence: accel xyz, gyro xyz.
pub const SENSOR_CHANNELS: usize = 6;

/// Channels of the motion/background sequence.
pub const MOTION_CHANNELS: usize = 6;

/// Column of the gyroscope X axis within a sensor row.
pub const GYRO_X_CHANNEL: usize = 3;

/// Frame-aligned sequences (frames × channels) for one session.
///
/// `landmarks` holds first differences of the selected landmark
/// coordinates; `raw_landmarks` keeps the absolute coordinates of the same
/// frames for the alignment proxy signal. All four share one row count.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    pub landmarks: Array2<f64>,
    pub raw_landmarks: Array2<f64>,
    pub sensors: Array2<f64>,
    pub motion: Array2<f64>,
}

impl SampleSet {
    /// A set with zero frames and the given landmark width.
    pub fn empty(landmark_channels: usize) -> Self {
        Self {
            landmarks: Array2::zeros((0, landmark_channels)),
            raw_landmarks: Array2::zeros((0, landmark_channels)),
            sensors: Array2::zeros((0, SENSOR_CHANNELS)),
            motion: Array2::zeros((0, MOTION_CHANNELS)),
        }
    }

    /// Frame count of the landmark sequence.
    pub fn len(&self) -> usize {
        self.landmarks.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every sequence has the same frame count.
    pub fn is_lockstep(&self) -> bool {
        let n = self.landmarks.nrows();
        self.raw_landmarks.nrows() == n && self.sensors.nrows() == n && self.motion.nrows() == n
    }

    /// Slice the vision-derived sequences (landmarks, motion) by `vision` and
    /// the inertial sequence by `inertial`.
    pub fn shifted(&self, vision: Range<usize>, inertial: Range<usize>) -> Self {
        Self {
            landmarks: self.landmarks.slice(s![vision.clone(), ..]).to_owned(),
            raw_landmarks: self.raw_landmarks.slice(s![vision.clone(), ..]).to_owned(),
            sensors: self.sensors.slice(s![inertial, ..]).to_owned(),
            motion: self.motion.slice(s![vision, ..]).to_owned(),
        }
    }

    /// Cut every sequence to the shortest one's frame count.
    pub fn truncated_to_common(self) -> Self {
        let n = self
            .landmarks
            .nrows()
            .min(self.raw_landmarks.nrows())
            .min(self.sensors.nrows())
            .min(self.motion.nrows());
        Self {
            landmarks: self.landmarks.slice(s![..n, ..]).to_owned(),
            raw_landmarks: self.raw_landmarks.slice(s![..n, ..]).to_owned(),
            sensors: self.sensors.slice(s![..n, ..]).to_owned(),
            motion: self.motion.slice(s![..n, ..]).to_owned(),
        }
    }
}

/// Extracts landmark-delta, sensor, and motion/background vectors per frame.
#[derive(Debug, Clone)]
pub struct SampleVectorBuilder {
    selector: LandmarkSelector,
}

impl SampleVectorBuilder {
    pub fn new(selector: LandmarkSelector) -> Self {
        Self { selector }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(LandmarkSelector::from_config(config))
    }

    /// Build the frame-aligned sequences for a session.
    ///
    /// The returned set is empty when no frame carries usable landmarks.
    pub fn build(&self, frames: &[Frame], gate: GateDecision) -> SampleSet {
        let width = self.selector.channels();
        let mut raw_rows: Vec<Vec<f64>> = Vec::with_capacity(frames.len());
        let mut sensor_rows = Vec::with_capacity(frames.len());
        let mut motion_rows = Vec::with_capacity(frames.len());

        for frame in frames {
            let Some(landmarks) = frame
                .landmark_coords()
                .and_then(|coords| self.selector.select(&coords))
            else {
                continue;
            };

            raw_rows.push(landmarks);
            sensor_rows.push(Self::sensor_vector(frame));
            motion_rows.push(Self::motion_vector(frame, gate.is_open));
        }

        if raw_rows.is_empty() {
            return SampleSet::empty(width);
        }

        let n = raw_rows.len();
        let raw_landmarks = Array2::from_shape_fn((n, width), |(i, j)| raw_rows[i][j]);
        let landmarks = Array2::from_shape_fn((n, width), |(i, j)| {
            if i == 0 {
                0.0
            } else {
                raw_rows[i][j] - raw_rows[i - 1][j]
            }
        });
        let sensors = Array2::from_shape_fn((n, SENSOR_CHANNELS), |(i, j)| sensor_rows[i][j]);
        let motion = Array2::from_shape_fn((n, MOTION_CHANNELS), |(i, j)| motion_rows[i][j]);

        SampleSet {
            landmarks,
            raw_landmarks,
            sensors,
            motion,
        }
    }

    /// `[accel.x, accel.y, accel.z * sign, gyro.x, gyro.y, gyro.z]`, with the
    /// Z sign flipped for rear-facing captures.
    pub fn sensor_vector(frame: &Frame) -> [f64; SENSOR_CHANNELS] {
        let [ax, ay, az] = frame.accel();
        let [gx, gy, gz] = frame.gyro();
        let sign = frame.camera_facing().accel_z_sign();
        [ax, ay, az * sign, gx, gy, gz]
    }

    /// Motion features plus the frame's own `bg_variance`, or zeros when the
    /// gate is closed.
    pub fn motion_vector(frame: &Frame, gate_open: bool) -> [f64; MOTION_CHANNELS] {
        if !gate_open {
            return [0.0; MOTION_CHANNELS];
        }
        let [face_dx, face_dy, bg_dx, bg_dy, magnitude] = frame.motion();
        [face_dx, face_dy, bg_dx, bg_dy, magnitude, frame.bg_variance()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecheck_capture_model::frame::MotionAnalysis;

    fn mesh(offset: f64) -> Vec<[f64; 3]> {
        (0..28)
            .map(|i| [i as f64 * 0.01 + offset, 0.5 + offset, 0.0])
            .collect()
    }

    fn builder() -> SampleVectorBuilder {
        SampleVectorBuilder::from_config(&PipelineConfig::default())
    }

    const OPEN: GateDecision = GateDecision {
        mean_bg_variance: 5.0,
        is_open: true,
    };
    const CLOSED: GateDecision = GateDecision {
        mean_bg_variance: 1.0,
        is_open: false,
    };

    #[test]
    fn test_first_row_is_zero_and_rest_are_differences() {
        let frames = vec![
            Frame::new().with_face_mesh(&mesh(0.0)),
            Frame::new().with_face_mesh(&mesh(0.1)),
            Frame::new().with_face_mesh(&mesh(0.3)),
        ];
        let set = builder().build(&frames, CLOSED);

        assert_eq!(set.len(), 3);
        assert!(set.landmarks.row(0).iter().all(|v| *v == 0.0));
        assert!((set.landmarks[[1, 0]] - 0.1).abs() < 1e-12);
        assert!((set.landmarks[[2, 1]] - 0.2).abs() < 1e-12);
        assert!(set.landmarks.row(1).iter().skip(2).step_by(3).all(|v| *v == 0.0));
        assert!((set.raw_landmarks[[2, 1]] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_frames_without_landmarks_are_skipped_everywhere() {
        let frames = vec![
            Frame::new().with_face_mesh(&mesh(0.0)).with_accel(1.0, 0.0, 0.0),
            Frame::new().with_accel(2.0, 0.0, 0.0),
            Frame::new().with_face_mesh(&mesh(0.5)).with_accel(3.0, 0.0, 0.0),
        ];
        let set = builder().build(&frames, CLOSED);

        assert_eq!(set.len(), 2);
        assert!(set.is_lockstep());
        assert_eq!(set.sensors[[0, 0]], 1.0);
        assert_eq!(set.sensors[[1, 0]], 3.0);
        // Difference is taken against the previous emitted frame.
        assert!((set.landmarks[[1, 1]] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_no_landmarks_gives_empty_set() {
        let frames = vec![Frame::new().with_accel(1.0, 2.0, 3.0); 4];
        let set = builder().build(&frames, OPEN);
        assert!(set.is_empty());
        assert_eq!(set.landmarks.ncols(), 84);
    }

    #[test]
    fn test_camera_facing_flips_only_accel_z() {
        let base = Frame::new()
            .with_face_mesh(&mesh(0.0))
            .with_accel(0.1, 0.2, 0.3)
            .with_gyro(0.4, 0.5, 0.6);
        let user = SampleVectorBuilder::sensor_vector(&base.clone().with_camera_facing("user"));
        let rear =
            SampleVectorBuilder::sensor_vector(&base.with_camera_facing("environment"));

        assert_eq!(user, [0.1, 0.2, 0.3, 0.4, 0.5, 0.6]);
        assert_eq!(rear, [0.1, 0.2, -0.3, 0.4, 0.5, 0.6]);
    }

    #[test]
    fn test_missing_sensor_fields_default_to_zero() {
        let frame: Frame = serde_json::from_str(
            r#"{"sensors": {"accel": {"x": "oops", "y": null}, "gyro": {"z": "2.5"}}}"#,
        )
        .unwrap();
        assert_eq!(
            SampleVectorBuilder::sensor_vector(&frame),
            [0.0, 0.0, 0.0, 0.0, 0.0, 2.5]
        );
    }

    #[test]
    fn test_motion_vector_follows_gate() {
        let frame = Frame::new()
            .with_motion(MotionAnalysis::new(0.1, 0.2, 0.3, 0.4, 0.5))
            .with_bg_variance(7.0);

        assert_eq!(
            SampleVectorBuilder::motion_vector(&frame, true),
            [0.1, 0.2, 0.3, 0.4, 0.5, 7.0]
        );
        assert_eq!(SampleVectorBuilder::motion_vector(&frame, false), [0.0; 6]);
        assert_eq!(
            SampleVectorBuilder::motion_vector(&Frame::new(), true),
            [0.0; 6]
        );
    }

    #[test]
    fn test_shift_and_truncate_keep_lockstep() {
        let frames: Vec<Frame> = (0..10)
            .map(|i| {
                Frame::new()
                    .with_face_mesh(&mesh(i as f64 * 0.01))
                    .with_gyro(i as f64, 0.0, 0.0)
            })
            .collect();
        let set = builder().build(&frames, CLOSED);

        let shifted = set.shifted(0..7, 3..10);
        assert!(shifted.is_lockstep());
        assert_eq!(shifted.len(), 7);
        assert_eq!(shifted.sensors[[0, GYRO_X_CHANNEL]], 3.0);

        let uneven = set.shifted(0..8, 3..10).truncated_to_common();
        assert!(uneven.is_lockstep());
        assert_eq!(uneven.len(), 7);
    }
}
