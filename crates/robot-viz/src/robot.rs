//! Robot visualizer
//!
//! Keeps one mesh actor per visual URDF link and moves those actors to the
//! forward-kinematics pose of each new joint vector.

use std::path::Path;
use std::str::FromStr;

use glam::{DMat4, DVec3};
use robot_viz_core::primitive::{cross_segments, generate_box_mesh, generate_sphere_mesh};
use robot_viz_core::{JointLimits, JointType, LoadOptions, Pose, RobotModel};
use serde::{Deserialize, Serialize};

use crate::error::VizError;
use crate::scene::{ActorHandle, ActorStyle, Color, Geometry, Plotter, SceneError};

/// End-effector link used when the caller has no better name
pub const DEFAULT_EE_LINK: &str = "CS_6";

/// Line width of cross markers and end-effector paths
pub const DEFAULT_PATH_WIDTH: f32 = 4.0;

/// Options applied when a robot is loaded
#[derive(Debug, Clone)]
pub struct RobotOptions {
    /// Color of every link mesh
    pub color: Color,
    pub opacity: f32,
    /// Use URDF material colors instead of `color`
    pub use_material_colors: bool,
    /// Create the link actors while loading instead of on first update
    pub render_on_load: bool,
    /// Mesh lookup paths and defaults for URDF parsing
    pub load: LoadOptions,
}

impl Default for RobotOptions {
    fn default() -> Self {
        Self {
            color: Color::LIGHT_GRAY,
            opacity: 1.0,
            use_material_colors: false,
            render_on_load: false,
            load: LoadOptions::default(),
        }
    }
}

/// Shape of an end-effector marker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    #[default]
    Sphere,
    Cube,
    Cross,
}

impl MarkerKind {
    pub const ALL: [MarkerKind; 3] = [MarkerKind::Sphere, MarkerKind::Cube, MarkerKind::Cross];

    pub fn name(&self) -> &'static str {
        match self {
            MarkerKind::Sphere => "sphere",
            MarkerKind::Cube => "cube",
            MarkerKind::Cross => "cross",
        }
    }
}

impl FromStr for MarkerKind {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkerKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                VizError::InvalidValue(format!(
                    "unknown marker type '{s}' (expected sphere, cube or cross)"
                ))
            })
    }
}

/// Appearance of an end-effector marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub kind: MarkerKind,
    pub color: Color,
    /// Sphere diameter, cube edge or cross arm length
    pub size: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            kind: MarkerKind::Sphere,
            color: Color::RED,
            size: 0.01,
        }
    }
}

/// Appearance of an end-effector path segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathStyle {
    /// Falls back to the robot color
    pub color: Option<Color>,
    pub opacity: f32,
    pub line_width: f32,
}

impl Default for PathStyle {
    fn default() -> Self {
        Self {
            color: None,
            opacity: 1.0,
            line_width: DEFAULT_PATH_WIDTH,
        }
    }
}

/// Actor of one visual link
#[derive(Debug, Clone)]
struct LinkActor {
    name: String,
    /// Index into `RobotModel::links()`
    link: usize,
    handle: ActorHandle,
    /// Last world transform pushed to the actor
    transform: DMat4,
}

/// A URDF robot drawn into a [`Plotter`].
///
/// The robot owns the handles of its link actors. It never holds on to the
/// plotter; every call that touches the scene takes it as an argument.
#[derive(Debug)]
pub struct Robot {
    model: RobotModel,
    options: RobotOptions,
    mesh_actors: Vec<LinkActor>,
    rendered: bool,
    configuration: Vec<f64>,
}

impl Robot {
    /// Load a URDF file.
    ///
    /// Link actors are created right away when `options.render_on_load` is
    /// set, otherwise on the first [`Robot::set_robot_mesh`] or
    /// [`Robot::update`].
    pub fn load(
        urdf_path: impl AsRef<Path>,
        plotter: &mut dyn Plotter,
        options: RobotOptions,
    ) -> Result<Self, VizError> {
        let model = RobotModel::load(urdf_path, &options.load)?;
        Self::from_model(model, plotter, options)
    }

    /// Parse a URDF document held in memory
    pub fn from_urdf_str(
        urdf: &str,
        plotter: &mut dyn Plotter,
        options: RobotOptions,
    ) -> Result<Self, VizError> {
        let model = RobotModel::from_urdf_str(urdf, &options.load)?;
        Self::from_model(model, plotter, options)
    }

    pub fn from_model(
        model: RobotModel,
        plotter: &mut dyn Plotter,
        options: RobotOptions,
    ) -> Result<Self, VizError> {
        let mut robot = Self {
            configuration: model.zero_configuration(),
            model,
            options,
            mesh_actors: Vec::new(),
            rendered: false,
        };

        tracing::info!(
            "Robot '{}': {} joints, {} visual links",
            robot.model.name(),
            robot.model.dof(),
            robot.model.visual_links().count()
        );

        if robot.options.render_on_load {
            robot.set_robot_mesh(plotter)?;
        }
        Ok(robot)
    }

    /// Create one mesh actor per visual link at the current configuration.
    ///
    /// Only the first call creates actors; later calls do nothing.
    pub fn set_robot_mesh(&mut self, plotter: &mut dyn Plotter) -> Result<(), VizError> {
        if self.rendered {
            tracing::debug!("Robot meshes already in the scene");
            return Ok(());
        }
        let transforms = self.model.link_transforms(&self.configuration)?;
        self.create_actors(plotter, &transforms)
    }

    fn create_actors(
        &mut self,
        plotter: &mut dyn Plotter,
        transforms: &[DMat4],
    ) -> Result<(), VizError> {
        let mut actors = Vec::new();
        for (index, link) in self.model.links().iter().enumerate() {
            let Some(mesh) = link.visual.as_ref().filter(|m| !m.is_empty()) else {
                continue;
            };

            let style = if self.options.use_material_colors {
                ActorStyle::new(Color::from_rgba(link.color))
                    .with_opacity(link.color[3] * self.options.opacity)
            } else {
                ActorStyle::new(self.options.color).with_opacity(self.options.opacity)
            };

            let handle = plotter.add_actor(Geometry::Mesh(mesh.clone()), style);
            actors.push(LinkActor {
                name: link.name.clone(),
                link: index,
                handle,
                transform: transforms[index],
            });
            tracing::debug!("Created actor for link '{}'", link.name);
        }

        for actor in &actors {
            plotter.set_transform(actor.handle, actor.transform)?;
        }

        self.mesh_actors = actors;
        self.rendered = true;
        Ok(())
    }

    /// Move every link actor to its pose for joint vector `q`.
    ///
    /// All transforms are computed and all actors checked before anything is
    /// written, so a failing call leaves the scene untouched.
    pub fn update(&mut self, plotter: &mut dyn Plotter, q: &[f64]) -> Result<(), VizError> {
        let transforms = self.model.link_transforms(q)?;

        if !self.rendered {
            self.create_actors(plotter, &transforms)?;
            self.configuration = q.to_vec();
            return Ok(());
        }

        if let Some(missing) = self.mesh_actors.iter().find(|a| !plotter.contains(a.handle)) {
            return Err(SceneError::ActorNotFound(missing.handle).into());
        }

        for actor in &mut self.mesh_actors {
            actor.transform = transforms[actor.link];
            plotter.set_transform(actor.handle, actor.transform)?;
        }
        self.configuration = q.to_vec();
        Ok(())
    }

    /// Add a marker at the origin of `ee_link` for joint vector `q`
    pub fn plot_ee(
        &self,
        plotter: &mut dyn Plotter,
        q: &[f64],
        ee_link: &str,
        style: &MarkerStyle,
    ) -> Result<ActorHandle, VizError> {
        if !(style.size.is_finite() && style.size > 0.0) {
            return Err(VizError::InvalidValue(format!(
                "marker size must be positive, got {}",
                style.size
            )));
        }

        let position = self.ee_position(q, ee_link)?;
        let size = style.size as f32;
        let (geometry, actor_style) = match style.kind {
            MarkerKind::Sphere => (
                Geometry::Mesh(generate_sphere_mesh(size / 2.0)),
                ActorStyle::new(style.color),
            ),
            MarkerKind::Cube => (
                Geometry::Mesh(generate_box_mesh([size; 3])),
                ActorStyle::new(style.color),
            ),
            MarkerKind::Cross => (
                Geometry::Lines(cross_segments(DVec3::ZERO, style.size).to_vec()),
                ActorStyle::new(style.color).with_line_width(DEFAULT_PATH_WIDTH),
            ),
        };

        let handle = plotter.add_actor(geometry, actor_style);
        plotter.set_transform(handle, DMat4::from_translation(position))?;
        tracing::debug!("{} marker on '{}' at {:?}", style.kind.name(), ee_link, position);
        Ok(handle)
    }

    /// Add a straight line between the positions of `ee_link` under `q1`
    /// and `q2`
    pub fn plot_ee_path(
        &self,
        plotter: &mut dyn Plotter,
        q1: &[f64],
        q2: &[f64],
        ee_link: &str,
        style: &PathStyle,
    ) -> Result<ActorHandle, VizError> {
        let start = self.ee_position(q1, ee_link)?;
        let end = self.ee_position(q2, ee_link)?;

        let actor_style = ActorStyle::new(style.color.unwrap_or(self.options.color))
            .with_opacity(style.opacity)
            .with_line_width(style.line_width);
        Ok(plotter.add_actor(Geometry::line(start, end), actor_style))
    }

    fn ee_position(&self, q: &[f64], ee_link: &str) -> Result<DVec3, VizError> {
        if self.model.link(ee_link).is_none() {
            return Err(VizError::LinkNotFound(ee_link.to_string()));
        }
        Ok(self.model.link_position(q, ee_link)?)
    }

    /// Remove all link actors from the plotter.
    ///
    /// Actors that are already gone are skipped. The next
    /// [`Robot::set_robot_mesh`] or [`Robot::update`] creates fresh ones.
    pub fn remove_robot_mesh(&mut self, plotter: &mut dyn Plotter) {
        for actor in self.mesh_actors.drain(..) {
            if plotter.remove_actor(actor.handle).is_err() {
                tracing::warn!("Actor for link '{}' was already removed", actor.name);
            }
        }
        self.rendered = false;
    }

    /// World pose of `link` for joint vector `q`
    pub fn link_pose(&self, q: &[f64], link: &str) -> Result<Pose, VizError> {
        Ok(Pose::from_mat4(&self.model.link_fk(q, link)?))
    }

    /// Cached world transform of a visual link, as last sent to the plotter
    pub fn link_transform(&self, link: &str) -> Option<DMat4> {
        self.link_actor(link).map(|a| a.transform)
    }

    fn link_actor(&self, link: &str) -> Option<&LinkActor> {
        self.mesh_actors.iter().find(|a| a.name == link)
    }

    /// Number of entries in a joint vector
    pub fn dof(&self) -> usize {
        self.model.dof()
    }

    pub fn joint_names(&self) -> Vec<&str> {
        self.model.actuated_joint_names()
    }

    /// Position limits of the actuated joints, ±π where the URDF has none
    pub fn joint_limits(&self) -> Vec<JointLimits> {
        self.model
            .actuated_joints()
            .map(|joint| match (joint.joint_type, joint.limits) {
                (JointType::Continuous, _) | (_, None) => JointLimits::default(),
                (_, Some(limits)) => limits,
            })
            .collect()
    }

    pub fn link_names(&self) -> Vec<&str> {
        self.model.links().iter().map(|l| l.name.as_str()).collect()
    }

    pub fn visual_link_names(&self) -> Vec<&str> {
        self.model.visual_links().map(|l| l.name.as_str()).collect()
    }

    /// Handle of the actor drawing `link`
    pub fn actor(&self, link: &str) -> Option<ActorHandle> {
        self.link_actor(link).map(|a| a.handle)
    }

    /// Number of link actors currently owned
    pub fn actor_count(&self) -> usize {
        self.mesh_actors.len()
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Joint vector of the last successful update
    pub fn configuration(&self) -> &[f64] {
        &self.configuration
    }

    pub fn options(&self) -> &RobotOptions {
        &self.options
    }

    pub fn model(&self) -> &RobotModel {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use std::f64::consts::FRAC_PI_2;

    const TWO_LINK: &str = r#"
<robot name="two_link">
  <link name="base">
    <visual><geometry><box size="0.1 0.1 0.1"/></geometry></visual>
  </link>
  <link name="arm">
    <visual>
      <origin xyz="0.5 0 0"/>
      <geometry><box size="1 0.05 0.05"/></geometry>
      <material name="blue"><color rgba="0 0 1 0.5"/></material>
    </visual>
  </link>
  <link name="CS_6"/>
  <joint name="shoulder" type="revolute">
    <parent link="base"/><child link="arm"/>
    <axis xyz="0 0 1"/>
    <limit lower="-1" upper="1" effort="1" velocity="1"/>
  </joint>
  <joint name="flange" type="fixed">
    <parent link="arm"/><child link="CS_6"/>
    <origin xyz="1 0 0"/>
  </joint>
</robot>"#;

    fn robot(scene: &mut Scene) -> Robot {
        Robot::from_urdf_str(TWO_LINK, scene, RobotOptions::default()).unwrap()
    }

    #[test]
    fn test_lazy_actor_creation() {
        let mut scene = Scene::new();
        let mut robot = robot(&mut scene);
        assert_eq!(scene.actor_count(), 0);
        assert!(!robot.is_rendered());

        robot.update(&mut scene, &[FRAC_PI_2]).unwrap();
        assert_eq!(robot.actor_count(), 2);
        assert_eq!(scene.actor_count(), 2);

        let arm = scene.actor(robot.actor("arm").unwrap()).unwrap();
        assert!(arm.transform.abs_diff_eq(DMat4::from_rotation_z(FRAC_PI_2), 1e-12));
    }

    #[test]
    fn test_render_on_load() {
        let mut scene = Scene::new();
        let options = RobotOptions {
            render_on_load: true,
            ..Default::default()
        };
        let robot = Robot::from_urdf_str(TWO_LINK, &mut scene, options).unwrap();
        assert_eq!(robot.actor_count(), 2);
        assert_eq!(scene.actor_count(), 2);
    }

    #[test]
    fn test_set_robot_mesh_is_idempotent() {
        let mut scene = Scene::new();
        let mut robot = robot(&mut scene);
        robot.set_robot_mesh(&mut scene).unwrap();
        let handle = robot.actor("arm");
        robot.set_robot_mesh(&mut scene).unwrap();
        assert_eq!(scene.actor_count(), 2);
        assert_eq!(robot.actor("arm"), handle);
    }

    #[test]
    fn test_colors() {
        let mut scene = Scene::new();
        let mut robot = robot(&mut scene);
        robot.set_robot_mesh(&mut scene).unwrap();
        let arm = scene.actor(robot.actor("arm").unwrap()).unwrap();
        assert_eq!(arm.style.color, Color::LIGHT_GRAY);
        assert_eq!(arm.style.opacity, 1.0);

        let mut scene = Scene::new();
        let options = RobotOptions {
            use_material_colors: true,
            render_on_load: true,
            ..Default::default()
        };
        let robot = Robot::from_urdf_str(TWO_LINK, &mut scene, options).unwrap();
        let arm = scene.actor(robot.actor("arm").unwrap()).unwrap();
        assert_eq!(arm.style.color, Color::rgb(0.0, 0.0, 1.0));
        assert_eq!(arm.style.opacity, 0.5);
    }

    #[test]
    fn test_update_with_removed_actor_changes_nothing() {
        let mut scene = Scene::new();
        let mut robot = robot(&mut scene);
        robot.update(&mut scene, &[0.0]).unwrap();
        let base = robot.actor("base").unwrap();
        scene.remove_actor(robot.actor("arm").unwrap()).unwrap();

        let before = scene.actor(base).unwrap().transform;
        assert!(matches!(
            robot.update(&mut scene, &[0.5]),
            Err(VizError::Scene(SceneError::ActorNotFound(_)))
        ));
        assert_eq!(scene.actor(base).unwrap().transform, before);
        assert_eq!(robot.configuration(), &[0.0]);
    }

    #[test]
    fn test_marker_kinds() {
        let mut scene = Scene::new();
        let robot = robot(&mut scene);

        for kind in MarkerKind::ALL {
            let style = MarkerStyle {
                kind,
                ..Default::default()
            };
            let handle = robot.plot_ee(&mut scene, &[0.0], DEFAULT_EE_LINK, &style).unwrap();
            let actor = scene.actor(handle).unwrap();
            assert!(actor.position().abs_diff_eq(DVec3::new(1.0, 0.0, 0.0), 1e-12));
            assert_eq!(actor.style.color, Color::RED);

            let bounds = actor.geometry.bounds().unwrap();
            assert!((bounds.size().x - 0.01).abs() < 1e-6);
        }
        assert_eq!(scene.actor_count(), 3);
    }

    #[test]
    fn test_marker_kind_parse() {
        assert_eq!("Cube".parse::<MarkerKind>().unwrap(), MarkerKind::Cube);
        assert!(matches!(
            "pyramid".parse::<MarkerKind>(),
            Err(VizError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_invalid_marker_size() {
        let mut scene = Scene::new();
        let robot = robot(&mut scene);
        let style = MarkerStyle {
            size: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            robot.plot_ee(&mut scene, &[0.0], DEFAULT_EE_LINK, &style),
            Err(VizError::InvalidValue(_))
        ));
        assert_eq!(scene.actor_count(), 0);
    }

    #[test]
    fn test_path_defaults_to_robot_color() {
        let mut scene = Scene::new();
        let robot = robot(&mut scene);
        let handle = robot
            .plot_ee_path(&mut scene, &[0.0], &[FRAC_PI_2], "CS_6", &PathStyle::default())
            .unwrap();
        let actor = scene.actor(handle).unwrap();
        assert_eq!(actor.style.color, Color::LIGHT_GRAY);
        assert_eq!(actor.style.line_width, 4.0);

        let segments = actor.world_segments();
        let [[start, end]] = segments.as_slice() else {
            panic!("expected a single segment");
        };
        assert!(start.abs_diff_eq(DVec3::X, 1e-12));
        assert!(end.abs_diff_eq(DVec3::Y, 1e-12));
    }

    #[test]
    fn test_joint_limits() {
        let mut scene = Scene::new();
        let robot = robot(&mut scene);
        assert_eq!(robot.joint_names(), vec!["shoulder"]);
        assert_eq!(robot.joint_limits()[0].lower, -1.0);
        assert_eq!(robot.joint_limits()[0].upper, 1.0);
        assert_eq!(robot.visual_link_names(), vec!["base", "arm"]);
        assert_eq!(robot.link_names().len(), 3);
    }

    #[test]
    fn test_remove_robot_mesh() {
        let mut scene = Scene::new();
        let mut robot = robot(&mut scene);
        robot.set_robot_mesh(&mut scene).unwrap();
        robot.remove_robot_mesh(&mut scene);
        assert_eq!(scene.actor_count(), 0);
        assert_eq!(robot.actor_count(), 0);

        robot.update(&mut scene, &[0.2]).unwrap();
        assert_eq!(scene.actor_count(), 2);
    }
}
