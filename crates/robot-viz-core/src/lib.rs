//! robot-viz core data structures
//!
//! This crate contains everything that does not touch a scene:
//! - RobotModel: link/joint tree parsed from URDF, with visual meshes
//! - Forward kinematics over that tree
//! - Pose and orientation types
//! - Geometric primitive builders (boxes, cylinders, arrows, axes triads)
//! - Timestamped joint trajectories for playback

pub mod joint;
pub mod kinematics;
pub mod mesh;
pub mod model;
pub mod pose;
pub mod primitive;
pub mod trajectory;

pub use joint::*;
pub use kinematics::*;
pub use mesh::{MeshError, MeshFormat, TriMesh, load_mesh};
pub use model::*;
pub use pose::*;
pub use trajectory::*;
