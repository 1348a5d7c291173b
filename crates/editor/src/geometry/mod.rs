//! Vector and line primitives shared by poles, lashings and tools.
//!
//! All math runs on `glam::DVec3`, which is `Copy`, so every helper takes
//! and returns values instead of mutating shared vectors in place.

mod lines;

pub use lines::{
    closest_approach, distance_between_infinite_lines, point_on_ray_closest_to_line,
    point_segment_distance, segment_distance, signed_distance_between_lines, ClosestApproach,
    Segment,
};

use glam::{DQuat, DVec3};

/// World up axis. The ground plane is y = 0.
pub const UP: DVec3 = DVec3::Y;

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    /// Create a ray, normalizing the direction
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Point at parameter `t` along the ray
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + self.direction * t
    }

    /// Intersection with the horizontal plane y = `height`, if in front of the origin
    pub fn intersect_horizontal_plane(&self, height: f64) -> Option<DVec3> {
        if self.direction.y.abs() < 1e-12 {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        (t >= 0.0).then(|| self.at(t))
    }
}

/// Rotation that maps the canonical up axis onto `direction`.
/// `direction` must be normalized.
pub fn orientation_from_up(direction: DVec3) -> DQuat {
    DQuat::from_rotation_arc(UP, direction)
}

/// Horizontal unit vector perpendicular to `direction`.
/// Falls back to +X for vertical directions.
pub fn lateral_axis(direction: DVec3) -> DVec3 {
    let side = direction.cross(UP);
    if side.length_squared() < 1e-12 {
        DVec3::X
    } else {
        side.normalize()
    }
}
