//! Scene painting with egui shapes
//!
//! Triangles are flat shaded with a headlight and drawn back to front;
//! line actors are interleaved by depth so nearer meshes cover them.

use egui::{Color32, Pos2, Rect, Shape, Stroke};
use glam::{DMat4, DVec3, DVec4};
use robot_viz::scene::{Actor, ActorStyle, Color, Geometry, Scene};

use crate::camera::OrbitCamera;

const AMBIENT: f32 = 0.35;

/// A screen-space primitive with its view depth
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    Triangle {
        points: [Pos2; 3],
        color: Color32,
        depth: f64,
    },
    Line {
        points: [Pos2; 2],
        stroke: Stroke,
        depth: f64,
    },
}

impl Primitive {
    pub fn depth(&self) -> f64 {
        match self {
            Primitive::Triangle { depth, .. } | Primitive::Line { depth, .. } => *depth,
        }
    }
}

/// Maps world points into a viewport rectangle
pub struct Projector {
    view: DMat4,
    clip_from_world: DMat4,
    rect: Rect,
    near: f64,
}

impl Projector {
    pub fn new(camera: &OrbitCamera, rect: Rect) -> Self {
        let aspect = rect.width() as f64 / (rect.height() as f64).max(1.0);
        Self {
            view: camera.view(),
            clip_from_world: camera.view_projection(aspect),
            rect,
            near: camera.near(),
        }
    }

    /// Screen position and view depth, `None` behind the near plane
    pub fn project(&self, point: DVec3) -> Option<(Pos2, f64)> {
        let depth = -self.view.transform_point3(point).z;
        if depth < self.near {
            return None;
        }

        let clip = self.clip_from_world * DVec4::new(point.x, point.y, point.z, 1.0);
        let ndc = clip.truncate() / clip.w;
        let center = self.rect.center();
        let screen = Pos2::new(
            center.x + (ndc.x * 0.5 * self.rect.width() as f64) as f32,
            center.y - (ndc.y * 0.5 * self.rect.height() as f64) as f32,
        );
        Some((screen, depth))
    }
}

fn color32(color: Color, opacity: f32) -> Color32 {
    let [r, g, b] = color.to_rgb8();
    Color32::from_rgba_unmultiplied(r, g, b, (opacity.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn stroke(style: &ActorStyle) -> Stroke {
    Stroke::new(style.line_width, color32(style.color, style.opacity))
}

/// Project one actor into screen-space primitives
fn actor_primitives(actor: &Actor, projector: &Projector, light: DVec3, out: &mut Vec<Primitive>) {
    match &actor.geometry {
        Geometry::Mesh(mesh) => {
            for triangle in mesh.triangles() {
                let world = triangle.map(|v| {
                    actor
                        .transform
                        .transform_point3(DVec3::new(v[0] as f64, v[1] as f64, v[2] as f64))
                });
                let normal = (world[1] - world[0]).cross(world[2] - world[0]).normalize_or_zero();
                let [Some(a), Some(b), Some(c)] = world.map(|p| projector.project(p)) else {
                    continue;
                };

                let intensity = AMBIENT + (1.0 - AMBIENT) * normal.dot(light).abs() as f32;
                out.push(Primitive::Triangle {
                    points: [a.0, b.0, c.0],
                    color: color32(actor.style.color.shaded(intensity), actor.style.opacity),
                    depth: (a.1 + b.1 + c.1) / 3.0,
                });
            }
        }
        Geometry::Lines(_) => {
            let stroke = stroke(&actor.style);
            for [start, end] in actor.world_segments() {
                let (Some(a), Some(b)) = (projector.project(start), projector.project(end)) else {
                    continue;
                };
                out.push(Primitive::Line {
                    points: [a.0, b.0],
                    stroke,
                    // Slightly in front so edges lying on a surface stay visible
                    depth: (a.1 + b.1) * 0.5 * 0.999,
                });
            }
        }
    }
}

/// All visible primitives of a scene, sorted far to near
pub fn collect_primitives(scene: &Scene, camera: &OrbitCamera, rect: Rect) -> Vec<Primitive> {
    let projector = Projector::new(camera, rect);
    let light = camera.forward();

    let mut primitives = Vec::new();
    for actor in scene.actors().filter(|a| a.visible) {
        actor_primitives(actor, &projector, light, &mut primitives);
    }
    primitives.sort_by(|a, b| b.depth().total_cmp(&a.depth()));
    primitives
}

/// Ground grid on the XY plane
pub fn grid_primitives(camera: &OrbitCamera, rect: Rect, half_extent: i32, spacing: f64) -> Vec<Primitive> {
    let projector = Projector::new(camera, rect);
    let stroke = Stroke::new(1.0, Color32::from_gray(70));
    let extent = half_extent as f64 * spacing;

    let mut lines = Vec::new();
    for i in -half_extent..=half_extent {
        let offset = i as f64 * spacing;
        for (start, end) in [
            (DVec3::new(offset, -extent, 0.0), DVec3::new(offset, extent, 0.0)),
            (DVec3::new(-extent, offset, 0.0), DVec3::new(extent, offset, 0.0)),
        ] {
            if let (Some(a), Some(b)) = (projector.project(start), projector.project(end)) {
                lines.push(Primitive::Line {
                    points: [a.0, b.0],
                    stroke,
                    depth: f64::INFINITY,
                });
            }
        }
    }
    lines
}

/// Paint primitives in order, batching consecutive triangles into one mesh
pub fn paint(painter: &egui::Painter, primitives: &[Primitive]) {
    let mut mesh = egui::Mesh::default();
    for primitive in primitives {
        match primitive {
            Primitive::Triangle { points, color, .. } => {
                let base = mesh.vertices.len() as u32;
                for point in points {
                    mesh.colored_vertex(*point, *color);
                }
                mesh.add_triangle(base, base + 1, base + 2);
            }
            Primitive::Line { points, stroke, .. } => {
                if !mesh.is_empty() {
                    painter.add(Shape::mesh(std::mem::take(&mut mesh)));
                }
                painter.line_segment(*points, *stroke);
            }
        }
    }
    if !mesh.is_empty() {
        painter.add(Shape::mesh(mesh));
    }
}

/// Draw the scene, optionally on top of a ground grid
pub fn paint_scene(painter: &egui::Painter, rect: Rect, camera: &OrbitCamera, scene: &Scene, show_grid: bool) {
    if show_grid {
        paint(painter, &grid_primitives(camera, rect, 10, 0.1));
    }
    paint(painter, &collect_primitives(scene, camera, rect));
}

#[cfg(test)]
mod tests {
    use super::*;
    use robot_viz::core::primitive::generate_box_mesh;
    use robot_viz::scene::Plotter;

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, egui::vec2(800.0, 600.0))
    }

    fn camera() -> OrbitCamera {
        OrbitCamera {
            target: DVec3::ZERO,
            distance: 3.0,
            yaw: 0.0,
            pitch: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_target_at_viewport_center() {
        let projector = Projector::new(&camera(), viewport());
        let (pos, depth) = projector.project(DVec3::ZERO).unwrap();
        assert!((pos - viewport().center()).length() < 1e-3);
        assert!((depth - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_points_behind_camera_are_dropped() {
        let projector = Projector::new(&camera(), viewport());
        assert!(projector.project(DVec3::new(5.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_primitives_sorted_far_to_near() {
        let mut scene = Scene::new();
        let near = scene.add_actor(
            Geometry::Mesh(generate_box_mesh([0.2, 0.2, 0.2])),
            ActorStyle::new(Color::RED),
        );
        scene.add_actor(
            Geometry::line(DVec3::new(-1.0, 0.0, 0.0), DVec3::new(-1.0, 0.0, 0.5)),
            ActorStyle::new(Color::BLUE),
        );
        scene
            .set_transform(near, DMat4::from_translation(DVec3::new(1.0, 0.0, 0.0)))
            .unwrap();

        let primitives = collect_primitives(&scene, &camera(), viewport());
        assert_eq!(primitives.len(), 13);
        assert!(primitives.windows(2).all(|w| w[0].depth() >= w[1].depth()));
        // The line is furthest away
        assert!(matches!(primitives[0], Primitive::Line { .. }));
    }

    #[test]
    fn test_hidden_actors_are_skipped() {
        let mut scene = Scene::new();
        let handle = scene.add_actor(Geometry::line(DVec3::ZERO, DVec3::Z), ActorStyle::default());
        scene.set_visible(handle, false).unwrap();
        assert!(collect_primitives(&scene, &camera(), viewport()).is_empty());
    }
}
