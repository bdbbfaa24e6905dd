//! Error type for visualizer operations

use robot_viz_core::{KinematicsError, ModelError};

use crate::scene::{ColorParseError, SceneError};

/// Errors surfaced by the visualizers
///
/// Every failing call leaves the scene as it was before the call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum VizError {
    /// The robot description is missing or malformed
    #[error("Failed to load robot description: {0}")]
    Parse(#[from] ModelError),

    /// A joint vector does not match the robot's actuated joint count
    #[error("Joint vector has {actual} values, robot has {expected} actuated joints")]
    Dimension { expected: usize, actual: usize },

    /// No link with this name exists
    #[error("Link not found: {0}")]
    LinkNotFound(String),

    /// An option or geometric input is out of range
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error(transparent)]
    Scene(#[from] SceneError),
}

impl From<KinematicsError> for VizError {
    fn from(e: KinematicsError) -> Self {
        match e {
            KinematicsError::Dimension { expected, actual } => {
                VizError::Dimension { expected, actual }
            }
            KinematicsError::LinkNotFound(name) => VizError::LinkNotFound(name),
        }
    }
}

impl From<ColorParseError> for VizError {
    fn from(e: ColorParseError) -> Self {
        VizError::InvalidValue(e.to_string())
    }
}
