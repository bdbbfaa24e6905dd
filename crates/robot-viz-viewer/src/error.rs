//! Viewer errors

use robot_viz::VizError;
use robot_viz_core::TrajectoryError;

use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error(transparent)]
    Viz(#[from] VizError),

    #[error("Failed to load trajectory: {0}")]
    Trajectory(#[from] TrajectoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Viewer window failed: {0}")]
    Window(#[from] eframe::Error),
}
