//! Forward kinematics for RobotModel

use std::collections::HashMap;

use glam::{DMat4, DVec3};

use crate::joint::JointType;
use crate::model::RobotModel;

/// Errors from kinematics queries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KinematicsError {
    #[error("Joint vector has {actual} values, robot has {expected} actuated joints")]
    Dimension { expected: usize, actual: usize },

    #[error("Link not found: {0}")]
    LinkNotFound(String),
}

impl RobotModel {
    /// Zero joint vector
    pub fn zero_configuration(&self) -> Vec<f64> {
        vec![0.0; self.dof()]
    }

    /// Check the length of a joint vector
    pub fn check_configuration(&self, q: &[f64]) -> Result<(), KinematicsError> {
        if q.len() != self.dof() {
            return Err(KinematicsError::Dimension {
                expected: self.dof(),
                actual: q.len(),
            });
        }
        Ok(())
    }

    /// Value of every joint, including mimic joints, indexed like `joints()`
    pub fn joint_positions(&self, q: &[f64]) -> Result<Vec<f64>, KinematicsError> {
        self.check_configuration(q)?;

        let mut positions = vec![0.0; self.joints.len()];
        for (&joint_id, &value) in self.actuated.iter().zip(q) {
            positions[joint_id] = value;
        }

        for (joint_id, joint) in self.joints.iter().enumerate() {
            if joint.mimic.is_some() {
                positions[joint_id] = self.mimic_position(joint_id, &positions);
            }
        }

        Ok(positions)
    }

    /// Follow a mimic chain down to the joint that drives it, then apply each
    /// multiplier/offset back up the chain.
    fn mimic_position(&self, joint_id: usize, positions: &[f64]) -> f64 {
        let mut chain = Vec::new();
        let mut current = joint_id;
        while let Some(mimic) = &self.joints[current].mimic {
            // Unknown sources and cycles are rejected when the model is built
            match self.joint_index.get(&mimic.joint) {
                Some(&source) if chain.len() < self.joints.len() => {
                    chain.push(mimic);
                    current = source;
                }
                _ => return 0.0,
            }
        }
        chain
            .iter()
            .rev()
            .fold(positions[current], |value, mimic| mimic.calculate(value))
    }

    /// World transform of every link, indexed like `links()`
    pub fn link_transforms(&self, q: &[f64]) -> Result<Vec<DMat4>, KinematicsError> {
        let positions = self.joint_positions(q)?;

        let mut transforms = vec![DMat4::IDENTITY; self.links.len()];
        // Breadth-first order guarantees the parent is already placed
        for &joint_id in &self.traversal {
            let joint = &self.joints[joint_id];
            let motion = compute_joint_transform(&joint.joint_type, joint.axis, positions[joint_id]);
            transforms[joint.child_link] =
                transforms[joint.parent_link] * joint.origin.to_mat4() * motion;
        }

        Ok(transforms)
    }

    /// World transform of every link keyed by link name
    pub fn link_fk_all(&self, q: &[f64]) -> Result<HashMap<String, DMat4>, KinematicsError> {
        let transforms = self.link_transforms(q)?;
        Ok(self
            .links
            .iter()
            .zip(transforms)
            .map(|(link, transform)| (link.name.clone(), transform))
            .collect())
    }

    /// World transform of a single link
    pub fn link_fk(&self, q: &[f64], link: &str) -> Result<DMat4, KinematicsError> {
        let link_id = *self
            .link_index
            .get(link)
            .ok_or_else(|| KinematicsError::LinkNotFound(link.to_string()))?;
        let positions = self.joint_positions(q)?;

        // Build transform chain from root to link
        let mut chain = Vec::new();
        let mut current = link_id;
        while let Some((joint_id, parent_id)) = self.parent[current] {
            chain.push(joint_id);
            current = parent_id;
        }

        let mut transform = DMat4::IDENTITY;
        for joint_id in chain.into_iter().rev() {
            let joint = &self.joints[joint_id];
            transform *= joint.origin.to_mat4()
                * compute_joint_transform(&joint.joint_type, joint.axis, positions[joint_id]);
        }

        Ok(transform)
    }

    /// World position of a single link's origin
    pub fn link_position(&self, q: &[f64], link: &str) -> Result<DVec3, KinematicsError> {
        Ok(self.link_fk(q, link)?.w_axis.truncate())
    }
}

/// Compute the transform for a joint at a given position
pub fn compute_joint_transform(joint_type: &JointType, axis: DVec3, position: f64) -> DMat4 {
    match joint_type {
        JointType::Revolute | JointType::Continuous => DMat4::from_axis_angle(axis, position),
        JointType::Prismatic => DMat4::from_translation(axis * position),
        JointType::Fixed | JointType::Floating | JointType::Planar => DMat4::IDENTITY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LoadOptions;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    const PLANAR_2R: &str = r#"
<robot name="planar">
  <link name="base"/>
  <link name="upper"/>
  <link name="fore"/>
  <link name="hand"/>
  <joint name="shoulder" type="continuous">
    <parent link="base"/><child link="upper"/>
    <axis xyz="0 0 1"/>
  </joint>
  <joint name="elbow" type="revolute">
    <parent link="upper"/><child link="fore"/>
    <origin xyz="1 0 0"/>
    <axis xyz="0 0 1"/>
    <limit lower="-3" upper="3" effort="1" velocity="1"/>
  </joint>
  <joint name="wrist" type="fixed">
    <parent link="fore"/><child link="hand"/>
    <origin xyz="0.5 0 0"/>
  </joint>
</robot>
"#;

    fn planar() -> RobotModel {
        RobotModel::from_urdf_str(PLANAR_2R, &LoadOptions::default()).unwrap()
    }

    #[test]
    fn test_zero_configuration() {
        let model = planar();
        let p = model.link_position(&model.zero_configuration(), "hand").unwrap();
        assert!(p.abs_diff_eq(DVec3::new(1.5, 0.0, 0.0), 1e-12));
    }

    #[test]
    fn test_planar_arm() {
        let model = planar();
        let p = model.link_position(&[FRAC_PI_2, -FRAC_PI_2], "hand").unwrap();
        assert_abs_diff_eq!(p.x, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_and_all_agree() {
        let model = planar();
        let q = [0.3, -1.1];
        let all = model.link_fk_all(&q).unwrap();
        for link in model.links() {
            let single = model.link_fk(&q, &link.name).unwrap();
            assert!(single.abs_diff_eq(all[&link.name], 1e-12));
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = planar();
        assert_eq!(
            model.link_transforms(&[0.0]),
            Err(KinematicsError::Dimension {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_unknown_link() {
        let model = planar();
        assert_eq!(
            model.link_fk(&[0.0, 0.0], "gripper"),
            Err(KinematicsError::LinkNotFound("gripper".to_string()))
        );
    }

    #[test]
    fn test_prismatic_transform() {
        let t = compute_joint_transform(&JointType::Prismatic, DVec3::Z, 0.25);
        assert!(t.w_axis.truncate().abs_diff_eq(DVec3::new(0.0, 0.0, 0.25), 1e-15));
    }

    #[test]
    fn test_mimic_follows_source() {
        let urdf = r#"
<robot name="r">
  <link name="a"/><link name="b"/><link name="c"/>
  <joint name="drive" type="prismatic">
    <parent link="a"/><child link="b"/>
    <axis xyz="1 0 0"/>
    <limit lower="0" upper="1" effort="1" velocity="1"/>
  </joint>
  <joint name="follower" type="prismatic">
    <parent link="a"/><child link="c"/>
    <axis xyz="0 1 0"/>
    <limit lower="0" upper="1" effort="1" velocity="1"/>
    <mimic joint="drive" multiplier="2" offset="0.1"/>
  </joint>
</robot>"#;
        let model = RobotModel::from_urdf_str(urdf, &LoadOptions::default()).unwrap();
        assert_eq!(model.dof(), 1);
        let p = model.link_position(&[0.2], "c").unwrap();
        assert!(p.abs_diff_eq(DVec3::new(0.0, 0.5, 0.0), 1e-12));
    }
}
