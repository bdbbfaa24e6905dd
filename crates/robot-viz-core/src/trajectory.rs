//! Timestamped joint trajectories and playback timing

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Playback rate used when a trajectory carries too little timing information
pub const DEFAULT_FPS: f64 = 30.0;

/// Trajectory errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum TrajectoryError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Failed to parse trajectory: {0}")]
    Parse(String),
    #[error("Sample {index} has {actual} joint values, expected {expected}")]
    Dimension {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Sample {0} has a timestamp earlier than the previous sample")]
    NonMonotonic(usize),
    #[error("Sample {0} has a negative or non-finite timestamp")]
    InvalidTime(usize),
}

/// One joint vector at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    /// Milliseconds since the start of the recording
    pub time_ms: f64,
    pub q: Vec<f64>,
}

/// A recorded joint trajectory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn new(samples: Vec<TrajectorySample>) -> Self {
        Self { samples }
    }

    /// Load a trajectory from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TrajectoryError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| TrajectoryError::Io(e.to_string()))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, TrajectoryError> {
        serde_json::from_str(json).map_err(|e| TrajectoryError::Parse(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, TrajectoryError> {
        serde_json::to_string_pretty(self).map_err(|e| TrajectoryError::Parse(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Check every sample against the robot's joint count and time ordering
    pub fn validate(&self, dof: usize) -> Result<(), TrajectoryError> {
        for (index, sample) in self.samples.iter().enumerate() {
            if !sample.time_ms.is_finite() || sample.time_ms < 0.0 {
                return Err(TrajectoryError::InvalidTime(index));
            }
            if sample.q.len() != dof {
                return Err(TrajectoryError::Dimension {
                    index,
                    expected: dof,
                    actual: sample.q.len(),
                });
            }
            if index > 0 && sample.time_ms < self.samples[index - 1].time_ms {
                return Err(TrajectoryError::NonMonotonic(index));
            }
        }
        Ok(())
    }

    /// Average sample rate over the whole recording.
    ///
    /// Falls back to [`DEFAULT_FPS`] with fewer than two samples or an end
    /// time that is not positive and finite.
    pub fn mean_fps(&self) -> f64 {
        if self.samples.len() < 2 {
            return DEFAULT_FPS;
        }

        let t_end = self.samples[self.samples.len() - 1].time_ms;
        if !t_end.is_finite() || t_end <= 0.0 {
            return DEFAULT_FPS;
        }

        self.samples.len() as f64 / (t_end / 1000.0)
    }

    /// Sample index displayed on each output frame when played at `fps`.
    ///
    /// Each sample is held for `frame_repeat_count` frames so wall-clock
    /// timing is preserved at a fixed frame rate.
    pub fn frame_schedule(&self, fps: f64) -> Vec<usize> {
        let mut schedule = Vec::new();
        for (index, sample) in self.samples.iter().enumerate() {
            let repeat = if index == 0 {
                1
            } else {
                frame_repeat_count(self.samples[index - 1].time_ms, sample.time_ms, fps)
            };
            schedule.extend(std::iter::repeat_n(index, repeat));
        }
        schedule
    }
}

/// Number of frames covering the interval between two timestamps (at least one)
pub fn frame_repeat_count(previous_ms: f64, current_ms: f64, fps: f64) -> usize {
    let dt = (current_ms - previous_ms) / 1000.0;
    let frames = (dt * fps).round();
    if frames.is_finite() && frames > 1.0 {
        frames as usize
    } else {
        1
    }
}
