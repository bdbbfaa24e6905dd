//! Pose and orientation types

use glam::{DMat3, DMat4, DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

/// Pose (position and orientation)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: DVec3,
    pub rotation: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        rotation: DQuat::IDENTITY,
    };

    pub fn new(position: DVec3, rotation: DQuat) -> Self {
        Self { position, rotation }
    }

    /// Build a pose from URDF-style `xyz` and `rpy` (fixed-axis roll, pitch, yaw).
    pub fn from_xyz_rpy(xyz: [f64; 3], rpy: [f64; 3]) -> Self {
        Self {
            position: DVec3::from(xyz),
            rotation: DQuat::from_euler(EulerRot::ZYX, rpy[2], rpy[1], rpy[0]),
        }
    }

    /// Decompose a rigid transform. Any scale in `transform` is dropped.
    pub fn from_mat4(transform: &DMat4) -> Self {
        let (_, rotation, position) = transform.to_scale_rotation_translation();
        Self { position, rotation }
    }

    pub fn to_mat4(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Roll, pitch, yaw in radians
    pub fn rpy(&self) -> [f64; 3] {
        let (yaw, pitch, roll) = self.rotation.to_euler(EulerRot::ZYX);
        [roll, pitch, yaw]
    }

    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.position + self.rotation * point
    }
}

impl From<&urdf_rs::Pose> for Pose {
    fn from(urdf_pose: &urdf_rs::Pose) -> Self {
        Self::from_xyz_rpy(urdf_pose.xyz.0, urdf_pose.rpy.0)
    }
}

/// An orientation as accepted by the visualizers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    /// 3x3 rotation matrix
    Matrix(DMat3),
    /// Rotation vector: axis scaled by the angle in radians (Rodrigues form)
    RotationVector(DVec3),
    /// Unit quaternion
    Quaternion(DQuat),
}

impl Orientation {
    /// Unit quaternion for this orientation.
    ///
    /// Matrices are orthonormalized first (Gram-Schmidt on the columns, X
    /// kept). Returns `None` for non-finite input, a zero quaternion, or a
    /// matrix that is singular or a reflection.
    pub fn to_quat(&self) -> Option<DQuat> {
        match self {
            Orientation::Matrix(m) => orthonormal_quat(m),
            Orientation::RotationVector(v) => v.is_finite().then(|| DQuat::from_scaled_axis(*v)),
            Orientation::Quaternion(q) => {
                let length = q.length();
                (length.is_finite() && length > f64::EPSILON).then(|| *q / length)
            }
        }
    }

    /// Proper rotation matrix, see [`Orientation::to_quat`]
    pub fn to_mat3(&self) -> Option<DMat3> {
        self.to_quat().map(DMat3::from_quat)
    }
}

fn orthonormal_quat(m: &DMat3) -> Option<DQuat> {
    let det = m.determinant();
    if !m.is_finite() || det.is_nan() || det <= 0.0 {
        return None;
    }

    let x = m.x_axis.normalize();
    let y = (m.y_axis - x * x.dot(m.y_axis)).normalize();
    let z = x.cross(y);
    let q = DQuat::from_mat3(&DMat3::from_cols(x, y, z)).normalize();
    q.is_finite().then_some(q)
}

impl From<DMat3> for Orientation {
    fn from(m: DMat3) -> Self {
        Orientation::Matrix(m)
    }
}

impl From<DQuat> for Orientation {
    fn from(q: DQuat) -> Self {
        Orientation::Quaternion(q)
    }
}
