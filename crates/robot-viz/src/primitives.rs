//! Coordinate-frame and arrow visualizers

use glam::{DMat4, DQuat, DVec3};
use robot_viz_core::primitive::{axes_segments, generate_arrow_mesh};
use robot_viz_core::{Orientation, Pose};

use crate::error::VizError;
use crate::scene::{ActorHandle, ActorStyle, Color, Geometry, Plotter, SceneError};

/// Line width of axes triads and their paths
pub const AXES_LINE_WIDTH: f32 = 2.0;

const AXIS_COLORS: [Color; 3] = [Color::RED, Color::GREEN, Color::BLUE];

fn check_scale(scale: f64) -> Result<(), VizError> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(VizError::InvalidValue(format!(
            "scale must be positive, got {scale}"
        )))
    }
}

fn check_point(name: &str, point: DVec3) -> Result<(), VizError> {
    if point.is_finite() {
        Ok(())
    } else {
        Err(VizError::InvalidValue(format!("{name} is not finite: {point}")))
    }
}

/// A coordinate triad: X red, Y green, Z blue.
///
/// Each axis is one line actor from the origin to `origin + scale * axis`.
#[derive(Debug, Clone)]
pub struct AxesVisualizer {
    actors: [ActorHandle; 3],
    origin: DVec3,
    rotation: DQuat,
    scale: f64,
}

impl AxesVisualizer {
    pub fn new(plotter: &mut dyn Plotter, origin: DVec3, scale: f64) -> Result<Self, VizError> {
        check_scale(scale)?;
        check_point("origin", origin)?;

        let segments = axes_segments(origin, DQuat::IDENTITY, scale);
        let actors = [0, 1, 2].map(|i| {
            plotter.add_actor(
                Geometry::Lines(vec![segments[i]]),
                ActorStyle::new(AXIS_COLORS[i]).with_line_width(AXES_LINE_WIDTH),
            )
        });
        tracing::debug!("Created axes at {origin} (scale {scale})");

        Ok(Self {
            actors,
            origin,
            rotation: DQuat::IDENTITY,
            scale,
        })
    }

    /// Move and/or rotate the triad.
    ///
    /// `None` keeps the current origin or orientation.
    pub fn update(
        &mut self,
        plotter: &mut dyn Plotter,
        position: Option<DVec3>,
        rotation: Option<Orientation>,
    ) -> Result<(), VizError> {
        let origin = position.unwrap_or(self.origin);
        check_point("position", origin)?;
        let rotation = match rotation {
            Some(orientation) => orientation.to_quat().ok_or_else(|| {
                VizError::InvalidValue(format!("not a proper rotation: {orientation:?}"))
            })?,
            None => self.rotation,
        };

        if let Some(&missing) = self.actors.iter().find(|&&h| !plotter.contains(h)) {
            return Err(SceneError::ActorNotFound(missing).into());
        }

        let segments = axes_segments(origin, rotation, self.scale);
        for (handle, segment) in self.actors.iter().zip(segments) {
            plotter.set_geometry(*handle, Geometry::Lines(vec![segment]))?;
        }

        self.origin = origin;
        self.rotation = rotation;
        Ok(())
    }

    pub fn set_pose(&mut self, plotter: &mut dyn Plotter, pose: &Pose) -> Result<(), VizError> {
        self.update(
            plotter,
            Some(pose.position),
            Some(Orientation::Quaternion(pose.rotation)),
        )
    }

    /// Add a static line actor from `p1` to `p2`, independent of the triad
    pub fn plot_path(
        &self,
        plotter: &mut dyn Plotter,
        p1: DVec3,
        p2: DVec3,
        color: Color,
        line_width: f32,
    ) -> ActorHandle {
        plotter.add_actor(
            Geometry::line(p1, p2),
            ActorStyle::new(color).with_line_width(line_width),
        )
    }

    /// [`AxesVisualizer::plot_path`] in yellow
    pub fn plot_path_default(&self, plotter: &mut dyn Plotter, p1: DVec3, p2: DVec3) -> ActorHandle {
        self.plot_path(plotter, p1, p2, Color::YELLOW, AXES_LINE_WIDTH)
    }

    /// The X, Y and Z actors
    pub fn actors(&self) -> [ActorHandle; 3] {
        self.actors
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn rotation(&self) -> DQuat {
        self.rotation
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn pose(&self) -> Pose {
        Pose::new(self.origin, self.rotation)
    }

    /// Remove the triad's actors
    pub fn remove(self, plotter: &mut dyn Plotter) {
        for handle in self.actors {
            let _ = plotter.remove_actor(handle);
        }
    }
}

/// A single arrow from `origin` along `direction`.
///
/// The arrow is one mesh actor: a unit +X arrow placed by the actor
/// transform. A new arrow is `scale` long whatever the magnitude of
/// `direction`; after [`ArrowVisualizer::update`] it is `scale * |direction|`.
#[derive(Debug, Clone)]
pub struct ArrowVisualizer {
    actor: ActorHandle,
    origin: DVec3,
    direction: DVec3,
    scale: f64,
    length: f64,
    color: Color,
}

impl ArrowVisualizer {
    pub fn new(
        plotter: &mut dyn Plotter,
        origin: DVec3,
        direction: DVec3,
        scale: f64,
        color: Color,
    ) -> Result<Self, VizError> {
        check_scale(scale)?;
        let transform = arrow_transform(origin, direction, scale)?;
        let length = scale;

        let actor = plotter.add_actor(Geometry::Mesh(generate_arrow_mesh()), ActorStyle::new(color));
        plotter.set_transform(actor, transform)?;
        tracing::debug!("Created arrow at {origin} along {direction}");

        Ok(Self {
            actor,
            origin,
            direction,
            scale,
            length,
            color,
        })
    }

    /// White unit arrow at the world origin along +X
    pub fn with_defaults(plotter: &mut dyn Plotter) -> Result<Self, VizError> {
        Self::new(plotter, DVec3::ZERO, DVec3::X, 1.0, Color::WHITE)
    }

    /// Move and/or re-aim the arrow. Its length becomes
    /// `scale * |direction|`.
    ///
    /// A zero-length or non-finite direction is rejected with
    /// [`VizError::InvalidValue`] and the arrow stays where it was.
    pub fn update(
        &mut self,
        plotter: &mut dyn Plotter,
        origin: Option<DVec3>,
        direction: Option<DVec3>,
    ) -> Result<(), VizError> {
        let origin = origin.unwrap_or(self.origin);
        let direction = direction.unwrap_or(self.direction);
        let length = self.scale * direction.length();
        let transform = arrow_transform(origin, direction, length)?;

        plotter.set_transform(self.actor, transform)?;
        self.origin = origin;
        self.direction = direction;
        self.length = length;
        Ok(())
    }

    pub fn set_color(&mut self, plotter: &mut dyn Plotter, color: Color) -> Result<(), VizError> {
        plotter.set_style(self.actor, ActorStyle::new(color))?;
        self.color = color;
        Ok(())
    }

    pub fn actor(&self) -> ActorHandle {
        self.actor
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// World-space tip position
    pub fn tip(&self) -> DVec3 {
        self.origin + self.direction.normalize() * self.length
    }

    pub fn remove(self, plotter: &mut dyn Plotter) {
        let _ = plotter.remove_actor(self.actor);
    }
}

/// `T(origin) * R(+X -> direction) * S(length)`
fn arrow_transform(origin: DVec3, direction: DVec3, length: f64) -> Result<DMat4, VizError> {
    check_point("origin", origin)?;
    let norm = direction.length();
    if !norm.is_finite() || norm <= f64::EPSILON {
        return Err(VizError::InvalidValue(format!(
            "arrow direction must be non-zero and finite, got {direction}"
        )));
    }
    if !length.is_finite() {
        return Err(VizError::InvalidValue(format!("arrow length overflows: {length}")));
    }

    let rotation = DQuat::from_rotation_arc(DVec3::X, direction / norm);
    Ok(DMat4::from_scale_rotation_translation(
        DVec3::splat(length),
        rotation,
        origin,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use glam::DMat3;
    use std::f64::consts::FRAC_PI_2;

    fn segment(scene: &Scene, handle: ActorHandle) -> [DVec3; 2] {
        scene.actor(handle).unwrap().world_segments()[0]
    }

    #[test]
    fn test_axes_construction() {
        let mut scene = Scene::new();
        let axes = AxesVisualizer::new(&mut scene, DVec3::new(1.0, 2.0, 3.0), 0.5).unwrap();
        assert_eq!(scene.actor_count(), 3);

        let [x, y, z] = axes.actors();
        assert_eq!(segment(&scene, x), [DVec3::new(1.0, 2.0, 3.0), DVec3::new(1.5, 2.0, 3.0)]);
        assert_eq!(segment(&scene, y)[1], DVec3::new(1.0, 2.5, 3.0));
        assert_eq!(segment(&scene, z)[1], DVec3::new(1.0, 2.0, 3.5));

        let style = scene.actor(x).unwrap().style;
        assert_eq!(style.color, Color::RED);
        assert_eq!(style.line_width, 2.0);
        assert_eq!(scene.actor(z).unwrap().style.color, Color::BLUE);
    }

    #[test]
    fn test_axes_identity_update_reproduces_construction() {
        let mut scene = Scene::new();
        let origin = DVec3::new(0.3, -0.2, 0.7);
        let mut axes = AxesVisualizer::new(&mut scene, origin, 0.25).unwrap();
        let before: Vec<_> = axes.actors().map(|h| scene.actor(h).unwrap().geometry.clone()).to_vec();

        axes.update(&mut scene, Some(origin), Some(DMat3::IDENTITY.into())).unwrap();
        let after: Vec<_> = axes.actors().map(|h| scene.actor(h).unwrap().geometry.clone()).to_vec();
        assert_eq!(before, after);
    }

    #[test]
    fn test_axes_rotation_vector() {
        let mut scene = Scene::new();
        let mut axes = AxesVisualizer::new(&mut scene, DVec3::ZERO, 1.0).unwrap();
        axes.update(
            &mut scene,
            Some(DVec3::ONE),
            Some(Orientation::RotationVector(DVec3::new(0.0, 0.0, FRAC_PI_2))),
        )
        .unwrap();

        // X now points along world Y
        let [x, _, _] = axes.actors();
        assert!(segment(&scene, x)[1].abs_diff_eq(DVec3::new(1.0, 2.0, 1.0), 1e-12));
        assert_eq!(scene.actor_count(), 3);
    }

    #[test]
    fn test_axes_partial_update_keeps_state() {
        let mut scene = Scene::new();
        let mut axes = AxesVisualizer::new(&mut scene, DVec3::ZERO, 1.0).unwrap();
        let quarter = DQuat::from_rotation_z(FRAC_PI_2);
        axes.update(&mut scene, None, Some(quarter.into())).unwrap();
        axes.update(&mut scene, Some(DVec3::Z), None).unwrap();

        assert_eq!(axes.origin(), DVec3::Z);
        assert!(axes.rotation().abs_diff_eq(quarter, 1e-12));
        let [x, _, _] = axes.actors();
        assert!(segment(&scene, x)[1].abs_diff_eq(DVec3::new(0.0, 1.0, 1.0), 1e-12));
    }

    #[test]
    fn test_axes_skewed_matrix_is_orthonormalized() {
        let mut scene = Scene::new();
        let mut axes = AxesVisualizer::new(&mut scene, DVec3::ZERO, 1.0).unwrap();
        let skewed = DMat3::from_cols(DVec3::new(2.0, 0.0, 0.0), DVec3::new(1.0, 3.0, 0.0), DVec3::Z);
        axes.update(&mut scene, None, Some(skewed.into())).unwrap();

        assert!(axes.rotation().abs_diff_eq(DQuat::IDENTITY, 1e-12));
        let [x, y, z] = axes.actors();
        for handle in [x, y, z] {
            let [start, end] = segment(&scene, handle);
            assert!(((end - start).length() - 1.0).abs() < 1e-12);
        }
        assert!(segment(&scene, y)[1].abs_diff_eq(DVec3::Y, 1e-12));
    }

    #[test]
    fn test_axes_reflection_rejected() {
        let mut scene = Scene::new();
        let mut axes = AxesVisualizer::new(&mut scene, DVec3::ZERO, 1.0).unwrap();
        let before: Vec<_> = axes.actors().map(|h| scene.actor(h).unwrap().geometry.clone()).to_vec();

        let mirror = DMat3::from_diagonal(DVec3::new(1.0, 1.0, -1.0));
        let result = axes.update(&mut scene, Some(DVec3::ONE), Some(mirror.into()));
        assert!(matches!(result, Err(VizError::InvalidValue(_))));

        let after: Vec<_> = axes.actors().map(|h| scene.actor(h).unwrap().geometry.clone()).to_vec();
        assert_eq!(before, after);
        assert_eq!(axes.origin(), DVec3::ZERO);
    }

    #[test]
    fn test_axes_plot_path_is_independent() {
        let mut scene = Scene::new();
        let axes = AxesVisualizer::new(&mut scene, DVec3::ZERO, 1.0).unwrap();
        let path = axes.plot_path_default(&mut scene, DVec3::ZERO, DVec3::ONE);
        assert_eq!(scene.actor_count(), 4);
        assert!(!axes.actors().contains(&path));
        assert_eq!(scene.actor(path).unwrap().style.color, Color::YELLOW);
    }

    #[test]
    fn test_axes_invalid_scale() {
        let mut scene = Scene::new();
        assert!(matches!(
            AxesVisualizer::new(&mut scene, DVec3::ZERO, 0.0),
            Err(VizError::InvalidValue(_))
        ));
        assert_eq!(scene.actor_count(), 0);
    }

    #[test]
    fn test_arrow_transform() {
        let mut scene = Scene::new();
        let arrow = ArrowVisualizer::new(
            &mut scene,
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
            0.5,
            Color::WHITE,
        )
        .unwrap();

        let transform = scene.actor(arrow.actor()).unwrap().transform;
        // A new arrow is `scale` long, the direction only aims it
        let tip = transform.transform_point3(DVec3::X);
        assert!(tip.abs_diff_eq(DVec3::new(1.0, 0.5, 0.0), 1e-12));
        assert!(arrow.tip().abs_diff_eq(tip, 1e-12));
        assert_eq!(arrow.length(), 0.5);
    }

    #[test]
    fn test_arrow_update_scales_with_direction() {
        let mut scene = Scene::new();
        let mut arrow = ArrowVisualizer::new(
            &mut scene,
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(0.0, 2.0, 0.0),
            0.5,
            Color::WHITE,
        )
        .unwrap();

        arrow.update(&mut scene, None, Some(DVec3::new(0.0, 0.0, 3.0))).unwrap();
        let transform = scene.actor(arrow.actor()).unwrap().transform;
        let tip = transform.transform_point3(DVec3::X);
        assert!(tip.abs_diff_eq(DVec3::new(1.0, 0.0, 1.5), 1e-12));
        assert!(arrow.tip().abs_diff_eq(tip, 1e-12));

        // Moving only the origin keeps the stored direction magnitude
        arrow.update(&mut scene, Some(DVec3::ZERO), None).unwrap();
        assert!(arrow.tip().abs_diff_eq(DVec3::new(0.0, 0.0, 1.5), 1e-12));
    }

    #[test]
    fn test_arrow_opposite_direction() {
        let mut scene = Scene::new();
        let mut arrow = ArrowVisualizer::with_defaults(&mut scene).unwrap();
        arrow.update(&mut scene, None, Some(-DVec3::X)).unwrap();
        let transform = scene.actor(arrow.actor()).unwrap().transform;
        assert!(transform.transform_point3(DVec3::X).abs_diff_eq(-DVec3::X, 1e-12));
    }

    #[test]
    fn test_arrow_zero_direction_rejected() {
        let mut scene = Scene::new();
        let mut arrow = ArrowVisualizer::with_defaults(&mut scene).unwrap();
        let before = scene.actor(arrow.actor()).unwrap().transform;

        let result = arrow.update(&mut scene, Some(DVec3::ONE), Some(DVec3::ZERO));
        assert!(matches!(result, Err(VizError::InvalidValue(_))));
        assert_eq!(scene.actor(arrow.actor()).unwrap().transform, before);
        assert_eq!(arrow.origin(), DVec3::ZERO);
        assert_eq!(arrow.direction(), DVec3::X);

        assert!(ArrowVisualizer::new(&mut scene, DVec3::ZERO, DVec3::ZERO, 1.0, Color::WHITE).is_err());
        assert_eq!(scene.actor_count(), 1);
    }

    #[test]
    fn test_arrow_non_finite_direction_rejected() {
        let mut scene = Scene::new();
        let mut arrow = ArrowVisualizer::with_defaults(&mut scene).unwrap();
        assert!(arrow
            .update(&mut scene, None, Some(DVec3::new(f64::NAN, 0.0, 0.0)))
            .is_err());
        assert_eq!(arrow.direction(), DVec3::X);
    }
}
