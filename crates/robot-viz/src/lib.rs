//! robot-viz
//!
//! Visualizers that keep retained actors in a 3D scene up to date:
//!
//! - [`Robot`] - one mesh actor per visual URDF link, posed from joint vectors,
//!   plus end-effector markers and paths
//! - [`AxesVisualizer`] - a coordinate triad
//! - [`ArrowVisualizer`] - a single arrow
//!
//! All of them talk to a [`scene::Plotter`]; [`scene::Scene`] is the
//! in-memory implementation rendered by `robot-viz-viewer`.
//!
//! # Example
//!
//! ```no_run
//! use robot_viz::{Robot, RobotOptions, scene::Scene};
//!
//! let mut scene = Scene::new();
//! let mut robot = Robot::load("arm.urdf", &mut scene, RobotOptions::default())?;
//! robot.update(&mut scene, &[0.1, 0.2, 0.3, 0.4, 0.5, 0.6])?;
//! # Ok::<(), robot_viz::VizError>(())
//! ```

pub mod error;
pub mod primitives;
pub mod robot;
pub mod scene;

pub use error::VizError;
pub use primitives::{ArrowVisualizer, AxesVisualizer};
pub use robot::{MarkerKind, MarkerStyle, PathStyle, Robot, RobotOptions};
pub use scene::{ActorHandle, ActorStyle, Color, Geometry, Plotter, Scene};

pub use robot_viz_core as core;
