//! Closest-approach and distance queries between segments, lines and rays.

use glam::DVec3;

use super::Ray;

/// Relative determinant threshold under which two directions count as parallel
const PARALLEL_EPSILON: f64 = 1e-12;

/// Segment length under which a segment is treated as a point
const DEGENERATE_LENGTH: f64 = 1e-12;

/// Finite segment from `point` running `length` along unit `direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub point: DVec3,
    pub direction: DVec3,
    pub length: f64,
}

impl Segment {
    pub fn new(point: DVec3, direction: DVec3, length: f64) -> Self {
        Self {
            point,
            direction,
            length,
        }
    }

    /// Segment spanning two points
    pub fn between(start: DVec3, end: DVec3) -> Self {
        let delta = end - start;
        Self {
            point: start,
            direction: delta.normalize_or_zero(),
            length: delta.length(),
        }
    }

    /// Point at normalized parameter `mu` (0 = start, 1 = end)
    pub fn at(&self, mu: f64) -> DVec3 {
        self.point + self.direction * (self.length * mu)
    }

    pub fn end(&self) -> DVec3 {
        self.at(1.0)
    }

    /// Clamped parameter of the point on this segment closest to `p`
    pub fn project(&self, p: DVec3) -> f64 {
        if self.length < DEGENERATE_LENGTH {
            return 0.0;
        }
        ((p - self.point).dot(self.direction) / self.length).clamp(0.0, 1.0)
    }

    /// True if the orthogonal projection of `p` falls inside the segment
    pub fn contains_projection(&self, p: DVec3, slack: f64) -> bool {
        let along = (p - self.point).dot(self.direction);
        along >= -slack && along <= self.length + slack
    }
}

/// Pair of points, one on each segment, at minimum separation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestApproach {
    pub closest_point: DVec3,
    pub closest_point_on_other: DVec3,
}

impl ClosestApproach {
    pub fn distance(&self) -> f64 {
        self.closest_point.distance(self.closest_point_on_other)
    }

    pub fn midpoint(&self) -> DVec3 {
        (self.closest_point + self.closest_point_on_other) * 0.5
    }

    /// Same pair seen from the other segment
    pub fn swapped(&self) -> Self {
        Self {
            closest_point: self.closest_point_on_other,
            closest_point_on_other: self.closest_point,
        }
    }
}

/// Closest points between two finite segments.
///
/// Parameters are clamped to [0, 1] along each segment. Returns `None`
/// when the segments are parallel, since no unique pair exists; use
/// [`segment_distance`] when only the separation matters.
pub fn closest_approach(a: &Segment, b: &Segment) -> Option<ClosestApproach> {
    let d1 = a.direction * a.length;
    let d2 = b.direction * b.length;
    let r = a.point - b.point;
    let aa = d1.dot(d1);
    let e = d2.dot(d2);
    let f = d2.dot(r);

    let (s, t) = if aa < DEGENERATE_LENGTH && e < DEGENERATE_LENGTH {
        (0.0, 0.0)
    } else if aa < DEGENERATE_LENGTH {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if e < DEGENERATE_LENGTH {
            ((-c / aa).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(d2);
            let denom = aa * e - b * b;
            if denom.abs() <= PARALLEL_EPSILON * aa * e {
                return None;
            }
            let s = ((b * f - c * e) / denom).clamp(0.0, 1.0);
            let t = (b * s + f) / e;
            if t < 0.0 {
                ((-c / aa).clamp(0.0, 1.0), 0.0)
            } else if t > 1.0 {
                (((b - c) / aa).clamp(0.0, 1.0), 1.0)
            } else {
                (s, t)
            }
        }
    };

    Some(ClosestApproach {
        closest_point: a.point + d1 * s,
        closest_point_on_other: b.point + d2 * t,
    })
}

/// Distance from a point to a finite segment
pub fn point_segment_distance(p: DVec3, segment: &Segment) -> f64 {
    p.distance(segment.at(segment.project(p)))
}

/// Minimum separation of two segments, parallel ones included.
pub fn segment_distance(a: &Segment, b: &Segment) -> f64 {
    match closest_approach(a, b) {
        Some(approach) => approach.distance(),
        // For parallel segments the minimum is reached at an endpoint of one of them.
        None => [
            point_segment_distance(a.point, b),
            point_segment_distance(a.end(), b),
            point_segment_distance(b.point, a),
            point_segment_distance(b.end(), a),
        ]
        .into_iter()
        .fold(f64::INFINITY, f64::min),
    }
}

/// Signed distance between two infinite lines, measured along `da × db`.
///
/// Returns `None` for parallel lines, where the sign is undefined.
pub fn signed_distance_between_lines(
    pa: DVec3,
    da: DVec3,
    pb: DVec3,
    db: DVec3,
) -> Option<f64> {
    let normal = da.cross(db);
    let len = normal.length();
    if len <= PARALLEL_EPSILON.sqrt() * da.length() * db.length() {
        return None;
    }
    Some((pb - pa).dot(normal) / len)
}

/// Distance between two infinite lines.
///
/// `|(pb - pa) · (da × db)| / |da × db|`, or the point-to-line distance
/// when the lines are parallel.
pub fn distance_between_infinite_lines(pa: DVec3, da: DVec3, pb: DVec3, db: DVec3) -> f64 {
    match signed_distance_between_lines(pa, da, pb, db) {
        Some(d) => d.abs(),
        None => {
            let len = da.length();
            if len < DEGENERATE_LENGTH {
                return pa.distance(pb);
            }
            (pb - pa).cross(da).length() / len
        }
    }
}

/// Point on the infinite line `line_origin + t * line_direction` closest to a ray.
///
/// Lets the user set a height by dragging along a vertical line while the
/// cursor moves in screen space. If the unconstrained optimum lies behind
/// the ray origin, the origin itself is projected onto the line. Returns
/// `None` when the ray runs parallel to the line.
pub fn point_on_ray_closest_to_line(
    ray: &Ray,
    line_origin: DVec3,
    line_direction: DVec3,
) -> Option<DVec3> {
    let w0 = ray.origin - line_origin;
    let a = ray.direction.dot(ray.direction);
    let b = ray.direction.dot(line_direction);
    let c = line_direction.dot(line_direction);
    let d = ray.direction.dot(w0);
    let e = line_direction.dot(w0);
    let denom = a * c - b * b;
    if c < DEGENERATE_LENGTH || denom.abs() <= PARALLEL_EPSILON * a * c {
        return None;
    }

    let s = (b * e - c * d) / denom;
    let t = if s < 0.0 { e / c } else { (a * e - b * d) / denom };
    Some(line_origin + line_direction * t)
}
