//! Robot visualizer against the six-axis fixture arm

use std::path::PathBuf;

use approx::assert_abs_diff_eq;
use glam::{DMat4, DVec3};
use robot_viz::robot::DEFAULT_EE_LINK;
use robot_viz::{
    MarkerKind, MarkerStyle, PathStyle, Plotter, Robot, RobotOptions, Scene, VizError,
};

const Q: [f64; 6] = [0.1, -0.4, 0.8, 0.3, -0.6, 1.2];

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("robot-viz-core")
        .join("tests")
        .join("data")
        .join(name)
}

fn arm(scene: &mut Scene) -> Robot {
    Robot::load(fixture("arm6.urdf"), scene, RobotOptions::default()).unwrap()
}

fn transforms(robot: &Robot, scene: &Scene) -> Vec<DMat4> {
    robot
        .visual_link_names()
        .iter()
        .map(|name| scene.actor(robot.actor(name).unwrap()).unwrap().transform)
        .collect()
}

#[test]
fn missing_urdf_is_parse_error() {
    let mut scene = Scene::new();
    let result = Robot::load(fixture("no_such_robot.urdf"), &mut scene, RobotOptions::default());
    assert!(matches!(result, Err(VizError::Parse(_))));
    assert_eq!(scene.actor_count(), 0);
}

#[test]
fn malformed_urdf_is_parse_error() {
    let mut scene = Scene::new();
    let result = Robot::from_urdf_str("<robot name=", &mut scene, RobotOptions::default());
    assert!(matches!(result, Err(VizError::Parse(_))));
}

#[test]
fn fixed_joint_mimic_of_unknown_joint_is_parse_error() {
    let urdf = r#"
<robot name="r">
  <link name="base"/><link name="tool"/>
  <joint name="mount" type="fixed">
    <parent link="base"/><child link="tool"/>
    <mimic joint="ghost"/>
  </joint>
</robot>"#;
    let mut scene = Scene::new();
    let result = Robot::from_urdf_str(urdf, &mut scene, RobotOptions::default());
    assert!(matches!(result, Err(VizError::Parse(_))));
    assert_eq!(scene.actor_count(), 0);
}

#[test]
fn one_actor_per_visual_link() {
    let mut scene = Scene::new();
    let mut robot = arm(&mut scene);
    robot.set_robot_mesh(&mut scene).unwrap();
    assert_eq!(robot.actor_count(), 7);
    assert_eq!(scene.actor_count(), 7);
    assert!(robot.actor("tool0").is_none());

    robot.set_robot_mesh(&mut scene).unwrap();
    robot.update(&mut scene, &Q).unwrap();
    robot.update(&mut scene, &[0.0; 6]).unwrap();
    assert_eq!(scene.actor_count(), 7);
}

#[test]
fn update_is_repeatable() {
    let mut scene = Scene::new();
    let mut robot = arm(&mut scene);
    robot.update(&mut scene, &Q).unwrap();
    let first = transforms(&robot, &scene);
    robot.update(&mut scene, &Q).unwrap();
    assert_eq!(transforms(&robot, &scene), first);
}

#[test]
fn update_matches_forward_kinematics() {
    let mut scene = Scene::new();
    let mut robot = arm(&mut scene);
    robot.update(&mut scene, &Q).unwrap();

    for name in robot.visual_link_names() {
        let expected = robot.model().link_fk(&Q, name).unwrap();
        let actual = scene.actor(robot.actor(name).unwrap()).unwrap().transform;
        assert!(actual.abs_diff_eq(expected, 1e-12), "link {name}");
        assert_eq!(robot.link_transform(name), Some(actual));
    }
    assert_eq!(robot.configuration(), &Q);
}

#[test]
fn wrong_length_changes_nothing() {
    let mut scene = Scene::new();
    let mut robot = arm(&mut scene);
    robot.update(&mut scene, &Q).unwrap();
    let before = transforms(&robot, &scene);

    let result = robot.update(&mut scene, &[0.0; 5]);
    assert!(matches!(
        result,
        Err(VizError::Dimension {
            expected: 6,
            actual: 5
        })
    ));
    assert_eq!(transforms(&robot, &scene), before);
    assert_eq!(robot.configuration(), &Q);
}

#[test]
fn wrong_length_before_first_render_creates_nothing() {
    let mut scene = Scene::new();
    let mut robot = arm(&mut scene);
    assert!(robot.update(&mut scene, &[0.0; 7]).is_err());
    assert_eq!(scene.actor_count(), 0);
}

#[test]
fn tool0_pose_at_zero_and_moved() {
    let mut scene = Scene::new();
    let robot = arm(&mut scene);

    let zero = robot.link_pose(&[0.0; 6], "tool0").unwrap();
    assert_abs_diff_eq!(zero.position.x, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(zero.position.y, 0.0, epsilon = 1e-12);
    assert_abs_diff_eq!(zero.position.z, 1.25, epsilon = 1e-12);

    let moved = robot.link_pose(&Q, "tool0").unwrap();
    assert!(moved.position.distance(zero.position) > 0.1);
}

#[test]
fn plot_ee_sits_on_fk_translation() {
    let mut scene = Scene::new();
    let robot = arm(&mut scene);

    let handle = robot
        .plot_ee(&mut scene, &Q, "tool0", &MarkerStyle::default())
        .unwrap();
    let expected = robot.model().link_position(&Q, "tool0").unwrap();
    let marker = scene.actor(handle).unwrap();
    assert!(marker.position().abs_diff_eq(expected, 1e-9));
}

#[test]
fn plot_ee_always_adds() {
    let mut scene = Scene::new();
    let robot = arm(&mut scene);
    let style = MarkerStyle {
        kind: MarkerKind::Cross,
        ..Default::default()
    };
    let a = robot.plot_ee(&mut scene, &Q, "tool0", &style).unwrap();
    let b = robot.plot_ee(&mut scene, &Q, "tool0", &style).unwrap();
    assert_ne!(a, b);
    assert_eq!(scene.actor_count(), 2);
}

#[test]
fn plot_ee_unknown_link() {
    let mut scene = Scene::new();
    let robot = arm(&mut scene);
    // The fixture has no link with the default end-effector name
    let result = robot.plot_ee(&mut scene, &Q, DEFAULT_EE_LINK, &MarkerStyle::default());
    assert!(matches!(result, Err(VizError::LinkNotFound(name)) if name == "CS_6"));
    assert_eq!(scene.actor_count(), 0);
}

#[test]
fn plot_ee_wrong_length() {
    let mut scene = Scene::new();
    let robot = arm(&mut scene);
    let result = robot.plot_ee(&mut scene, &[0.0; 3], "tool0", &MarkerStyle::default());
    assert!(matches!(result, Err(VizError::Dimension { .. })));
}

#[test]
fn ee_path_connects_marker_positions() {
    let mut scene = Scene::new();
    let robot = arm(&mut scene);
    let q2 = [0.0; 6];

    let m1 = robot.plot_ee(&mut scene, &Q, "tool0", &MarkerStyle::default()).unwrap();
    let m2 = robot.plot_ee(&mut scene, &q2, "tool0", &MarkerStyle::default()).unwrap();
    let path = robot
        .plot_ee_path(&mut scene, &Q, &q2, "tool0", &PathStyle::default())
        .unwrap();

    let [start, end] = scene.actor(path).unwrap().world_segments()[0];
    assert!(start.abs_diff_eq(scene.actor(m1).unwrap().position(), 1e-12));
    assert!(end.abs_diff_eq(scene.actor(m2).unwrap().position(), 1e-12));
}

#[test]
fn ee_path_unknown_link_adds_nothing() {
    let mut scene = Scene::new();
    let robot = arm(&mut scene);
    let result = robot.plot_ee_path(&mut scene, &Q, &Q, "flange", &PathStyle::default());
    assert!(matches!(result, Err(VizError::LinkNotFound(_))));
    assert_eq!(scene.actor_count(), 0);
}
