//! A single rigid pole.

use glam::{DQuat, DVec3};
use shared::{PoleId, PoleRecord};

use super::catalog::PoleCatalog;
use crate::geometry::{self, closest_approach, segment_distance, ClosestApproach, Segment, UP};

/// Fraction of the summed radii under which two poles count as overlapping.
/// Poles resting against each other sit at exactly the summed radii.
pub const DEFAULT_OVERLAP_FACTOR: f64 = 0.9;

/// Angle (radians) under which two directions count as parallel
pub const PARALLEL_ANGLE: f64 = 0.01;

/// Rigid cylindrical segment.
///
/// `position` is the segment midpoint, so the endpoints are
/// `position ± direction * length / 2`. `direction` stays unit length and
/// `length` stays a member of the catalog it was sized from.
#[derive(Debug, Clone, PartialEq)]
pub struct Pole {
    id: PoleId,
    position: DVec3,
    direction: DVec3,
    orientation: DQuat,
    length: f64,
    radius: f64,
}

impl Pole {
    /// Shortest catalog pole standing upright on the origin
    pub fn new(catalog: &PoleCatalog) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), catalog)
    }

    pub fn with_id(id: PoleId, catalog: &PoleCatalog) -> Self {
        let length = catalog.pick_length(0.0);
        Self {
            id,
            position: UP * (length / 2.0),
            direction: UP,
            orientation: DQuat::IDENTITY,
            length,
            radius: catalog.radius,
        }
    }

    /// Rebuild a committed pole. The stored length is snapped onto the catalog.
    pub fn from_record(record: &PoleRecord, catalog: &PoleCatalog) -> Self {
        let mut pole = Self::with_id(record.id.clone(), catalog);
        pole.set_direction(DVec3::from_array(record.direction));
        pole.set_length(record.length, catalog);
        pole.position = DVec3::from_array(record.position);
        pole
    }

    pub fn to_record(&self) -> PoleRecord {
        PoleRecord {
            id: self.id.clone(),
            position: self.position.to_array(),
            direction: self.direction.to_array(),
            length: self.length,
        }
    }

    pub fn id(&self) -> &PoleId {
        &self.id
    }

    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    /// Rotation mapping the up axis onto `direction`
    pub fn orientation(&self) -> DQuat {
        self.orientation
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// End at `position - direction * length / 2`
    pub fn bottom(&self) -> DVec3 {
        self.position - self.direction * (self.length / 2.0)
    }

    /// End at `position + direction * length / 2`
    pub fn top(&self) -> DVec3 {
        self.position + self.direction * (self.length / 2.0)
    }

    /// Centerline from bottom to top
    pub fn segment(&self) -> Segment {
        Segment::new(self.bottom(), self.direction, self.length)
    }

    /// Point on the centerline closest to `p`
    pub fn closest_point_to(&self, p: DVec3) -> DVec3 {
        let segment = self.segment();
        segment.at(segment.project(p))
    }

    /// Whether `p` projects onto the centerline within the pole's ends
    pub fn holds(&self, p: DVec3) -> bool {
        self.segment().contains_projection(p, 1e-9)
    }

    /// Normalize and store a new axis. A zero vector leaves the pole unchanged.
    pub fn set_direction(&mut self, direction: DVec3) {
        let direction = direction.normalize_or_zero();
        if direction == DVec3::ZERO {
            tracing::debug!(pole = %self.id, "ignoring zero direction");
            return;
        }
        self.direction = direction;
        self.orientation = geometry::orientation_from_up(direction);
    }

    /// Pick the smallest catalog length >= `minimum_length` (clamped to the longest)
    pub fn set_length(&mut self, minimum_length: f64, catalog: &PoleCatalog) {
        self.length = catalog.pick_length(minimum_length);
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    pub fn translate(&mut self, delta: DVec3) {
        self.position += delta;
    }

    /// Place the pole so its bottom end sits on `bottom`
    pub fn set_bottom(&mut self, bottom: DVec3) {
        self.position = bottom + self.direction * (self.length / 2.0);
    }

    /// Span the pole between two points with `catalog.pole_overlap` extra length,
    /// centered on their midpoint.
    pub fn set_position_between(&mut self, a: DVec3, b: DVec3, catalog: &PoleCatalog) {
        self.set_direction(b - a);
        self.set_length(a.distance(b) + catalog.pole_overlap, catalog);
        self.position = (a + b) * 0.5;
    }

    /// Change length keeping the opposite end fixed
    pub fn resize(&mut self, resize_at_top: bool, minimum_length: f64, catalog: &PoleCatalog) {
        let fixed = if resize_at_top { self.bottom() } else { self.top() };
        self.set_length(minimum_length, catalog);
        let half = self.direction * (self.length / 2.0);
        self.position = if resize_at_top { fixed + half } else { fixed - half };
    }

    /// Closest points between the two centerlines, `None` when parallel
    pub fn closest_approach(&self, other: &Pole) -> Option<ClosestApproach> {
        closest_approach(&self.segment(), &other.segment())
    }

    /// Centerline separation, parallel poles included
    pub fn distance_to(&self, other: &Pole) -> f64 {
        segment_distance(&self.segment(), &other.segment())
    }

    /// True when the centerlines come closer than 0.9 × the summed radii
    pub fn overlaps(&self, other: &Pole) -> bool {
        self.overlaps_within(other, DEFAULT_OVERLAP_FACTOR)
    }

    pub fn overlaps_within(&self, other: &Pole, factor: f64) -> bool {
        self.distance_to(other) < factor * (self.radius + other.radius)
    }

    /// True when the axis is within [`PARALLEL_ANGLE`] of `direction`, either way round
    pub fn is_parallel_to(&self, direction: DVec3) -> bool {
        let direction = direction.normalize_or_zero();
        if direction == DVec3::ZERO {
            return false;
        }
        let angle = self.direction.angle_between(direction);
        angle.min(std::f64::consts::PI - angle) < PARALLEL_ANGLE
    }
}
