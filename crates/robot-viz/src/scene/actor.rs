//! Scene actor definition.

use std::fmt;

use glam::{DMat4, DVec3};
use robot_viz_core::TriMesh;
use robot_viz_core::primitive::Segment;
use uuid::Uuid;

use super::{ActorStyle, BoundingBox};

/// Handle to an actor stored in a [`super::Plotter`].
///
/// Handles are lightweight and can be copied freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorHandle(Uuid);

impl ActorHandle {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the raw identifier.
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ActorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor {}", self.0)
    }
}

/// Renderable geometry, expressed in the actor's local frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Filled triangles.
    Mesh(TriMesh),
    /// Independent line segments.
    Lines(Vec<Segment>),
}

impl Geometry {
    /// A single segment.
    pub fn line(start: DVec3, end: DVec3) -> Self {
        Geometry::Lines(vec![[start, end]])
    }

    /// Local bounding box, `None` for empty geometry.
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Geometry::Mesh(mesh) => mesh.bounds().map(|(min, max)| {
                BoundingBox::new(
                    DVec3::new(min[0] as f64, min[1] as f64, min[2] as f64),
                    DVec3::new(max[0] as f64, max[1] as f64, max[2] as f64),
                )
            }),
            Geometry::Lines(segments) => BoundingBox::from_points(segments.iter().flatten().copied()),
        }
    }
}

/// A retained object in the scene.
#[derive(Debug, Clone)]
pub struct Actor {
    /// Identifier handed out when the actor was added.
    pub id: ActorHandle,

    /// Geometry in the local frame.
    pub geometry: Geometry,

    /// Local-to-world transform.
    pub transform: DMat4,

    /// Color, opacity and line width.
    pub style: ActorStyle,

    /// Whether this actor is drawn.
    pub visible: bool,
}

impl Actor {
    pub(crate) fn new(geometry: Geometry, style: ActorStyle) -> Self {
        Self {
            id: ActorHandle::new(),
            geometry,
            transform: DMat4::IDENTITY,
            style,
            visible: true,
        }
    }

    /// World position of the local origin.
    pub fn position(&self) -> DVec3 {
        self.transform.w_axis.truncate()
    }

    /// Line segments in world coordinates (empty for meshes).
    pub fn world_segments(&self) -> Vec<Segment> {
        match &self.geometry {
            Geometry::Lines(segments) => segments
                .iter()
                .map(|[a, b]| {
                    [
                        self.transform.transform_point3(*a),
                        self.transform.transform_point3(*b),
                    ]
                })
                .collect(),
            Geometry::Mesh(_) => Vec::new(),
        }
    }

    /// Returns the world-space bounding box.
    pub fn world_bounds(&self) -> Option<BoundingBox> {
        self.geometry.bounds().map(|b| b.transform(&self.transform))
    }
}
