//! Axis-aligned bounding boxes.

use glam::{DMat4, DVec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all points, `None` if there are none.
    pub fn from_points(points: impl IntoIterator<Item = DVec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |b, p| {
            Self::new(b.min.min(p), b.max.max(p))
        }))
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Radius of the bounding sphere around the center.
    pub fn radius(&self) -> f64 {
        self.size().length() * 0.5
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Bounds of the eight transformed corners.
    pub fn transform(&self, transform: &DMat4) -> BoundingBox {
        let corners = (0..8).map(|i| {
            DVec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        });
        // Eight corners are always present
        Self::from_points(corners.map(|c| transform.transform_point3(c))).unwrap_or(*self)
    }
}
