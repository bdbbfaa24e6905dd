//! Joint-related type definitions

use serde::{Deserialize, Serialize};

/// Joint type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JointType {
    #[default]
    Fixed,
    Revolute,
    Continuous,
    Prismatic,
    Floating,
    Planar,
}

impl JointType {
    /// Check if this joint type has an axis
    pub fn has_axis(&self) -> bool {
        matches!(
            self,
            JointType::Revolute | JointType::Continuous | JointType::Prismatic
        )
    }

    /// Check if this joint type has limits
    pub fn has_limits(&self) -> bool {
        matches!(self, JointType::Revolute | JointType::Prismatic)
    }

    /// Whether a joint of this type consumes one entry of the joint vector.
    ///
    /// Floating and planar joints have more than one degree of freedom and are
    /// held at their origin.
    pub fn is_actuated(&self) -> bool {
        self.has_axis()
    }

    /// Get display name
    pub fn display_name(&self) -> &'static str {
        match self {
            JointType::Fixed => "Fixed",
            JointType::Revolute => "Revolute",
            JointType::Continuous => "Continuous",
            JointType::Prismatic => "Prismatic",
            JointType::Floating => "Floating",
            JointType::Planar => "Planar",
        }
    }
}

impl From<&urdf_rs::JointType> for JointType {
    fn from(urdf_type: &urdf_rs::JointType) -> Self {
        match urdf_type {
            urdf_rs::JointType::Fixed => JointType::Fixed,
            urdf_rs::JointType::Revolute => JointType::Revolute,
            urdf_rs::JointType::Continuous => JointType::Continuous,
            urdf_rs::JointType::Prismatic => JointType::Prismatic,
            urdf_rs::JointType::Floating => JointType::Floating,
            urdf_rs::JointType::Planar => JointType::Planar,
            urdf_rs::JointType::Spherical => JointType::Floating, // Approximate as floating
        }
    }
}

/// Joint limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointLimits {
    /// Lower position limit (rad or m)
    pub lower: f64,
    /// Upper position limit (rad or m)
    pub upper: f64,
    /// Maximum effort (N or Nm)
    pub effort: f64,
    /// Maximum velocity (rad/s or m/s)
    pub velocity: f64,
}

impl Default for JointLimits {
    fn default() -> Self {
        Self {
            lower: -std::f64::consts::PI,
            upper: std::f64::consts::PI,
            effort: 100.0,
            velocity: 1.0,
        }
    }
}

impl JointLimits {
    /// Create limits with specified range
    pub fn with_range(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            ..Self::default()
        }
    }

    /// Clamp a joint value into the limit range
    pub fn clamp(&self, value: f64) -> f64 {
        if self.lower <= self.upper {
            value.clamp(self.lower, self.upper)
        } else {
            value
        }
    }
}

impl From<&urdf_rs::JointLimit> for JointLimits {
    fn from(limit: &urdf_rs::JointLimit) -> Self {
        Self {
            lower: limit.lower,
            upper: limit.upper,
            effort: limit.effort,
            velocity: limit.velocity,
        }
    }
}

/// Joint mimic configuration
/// Makes this joint follow another joint's position: value = multiplier * other_joint + offset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointMimic {
    /// Name of the joint to mimic
    pub joint: String,
    /// Multiplier applied to the mimicked joint's position (default: 1.0)
    pub multiplier: f64,
    /// Offset added after multiplication (default: 0.0)
    pub offset: f64,
}

impl JointMimic {
    /// Create a new mimic configuration
    pub fn new(joint: impl Into<String>) -> Self {
        Self {
            joint: joint.into(),
            multiplier: 1.0,
            offset: 0.0,
        }
    }

    /// Calculate the mimic value from the source joint's position
    pub fn calculate(&self, source_position: f64) -> f64 {
        self.multiplier * source_position + self.offset
    }
}

impl From<&urdf_rs::Mimic> for JointMimic {
    fn from(mimic: &urdf_rs::Mimic) -> Self {
        Self {
            joint: mimic.joint.clone(),
            multiplier: mimic.multiplier.unwrap_or(1.0),
            offset: mimic.offset.unwrap_or(0.0),
        }
    }
}
