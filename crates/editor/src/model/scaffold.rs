//! One logical leg built from up to three physical poles.

use glam::DVec3;
use std::sync::Arc;

use super::catalog::{CompoundLength, PoleCatalog, ScaffoldLength};
use super::pole::Pole;
use crate::geometry::lateral_axis;

/// Main pole plus, for compound lengths, an extension chained end-to-end
/// beyond its top and a splint lashed alongside the joint.
///
/// Every pole shares the same direction. Positions are derived from the
/// bottom anchor of the main pole and that direction.
#[derive(Debug, Clone)]
pub struct Scaffold {
    catalog: Arc<PoleCatalog>,
    main: Pole,
    extension: Option<Pole>,
    splint: Option<Pole>,
    main_radius: f64,
    length: ScaffoldLength,
}

impl Scaffold {
    pub fn new(catalog: Arc<PoleCatalog>) -> Self {
        let main = Pole::new(&catalog);
        let main_radius = main.radius();
        let length = ScaffoldLength::Single(main.length());
        Self {
            catalog,
            main,
            extension: None,
            splint: None,
            main_radius,
            length,
        }
    }

    pub fn catalog(&self) -> &PoleCatalog {
        &self.catalog
    }

    pub fn main(&self) -> &Pole {
        &self.main
    }

    pub fn extension(&self) -> Option<&Pole> {
        self.extension.as_ref()
    }

    pub fn splint(&self) -> Option<&Pole> {
        self.splint.as_ref()
    }

    pub fn main_radius(&self) -> f64 {
        self.main_radius
    }

    pub fn direction(&self) -> DVec3 {
        self.main.direction()
    }

    /// Total length along the leg
    pub fn length(&self) -> f64 {
        self.length.total()
    }

    pub fn is_compound(&self) -> bool {
        self.length.is_compound()
    }

    /// All constituent poles: main, extension, splint
    pub fn poles(&self) -> impl Iterator<Item = &Pole> {
        std::iter::once(&self.main)
            .chain(self.extension.as_ref())
            .chain(self.splint.as_ref())
    }

    pub fn into_poles(self) -> Vec<Pole> {
        std::iter::once(self.main)
            .chain(self.extension)
            .chain(self.splint)
            .collect()
    }

    /// Bottom anchor of the leg
    pub fn bottom(&self) -> DVec3 {
        self.main.bottom()
    }

    /// Logical top end of the leg, where its lashing sits. Includes the
    /// extension beyond the main pole.
    pub fn center(&self) -> DVec3 {
        self.bottom() + self.direction() * self.length()
    }

    /// Point where main pole and extension meet, for compound legs
    pub fn joint(&self) -> Option<DVec3> {
        self.extension.as_ref().map(|_| self.main.top())
    }

    /// Resolve `minimum_length` against the scaffold catalog and rebuild the
    /// sub-poles, keeping the bottom anchor.
    pub fn set_length(&mut self, minimum_length: f64) {
        let bottom = self.bottom();
        self.length = self.catalog.pick_scaffold_length(minimum_length);
        match self.length {
            ScaffoldLength::Single(length) => {
                self.main.set_length(length, &self.catalog);
                self.extension = None;
                self.splint = None;
            }
            ScaffoldLength::Compound(compound) => self.size_compound(compound),
        }
        self.layout(bottom);
    }

    fn size_compound(&mut self, compound: CompoundLength) {
        let catalog = Arc::clone(&self.catalog);
        self.main.set_length(compound.main, &catalog);
        self.extension
            .get_or_insert_with(|| Pole::new(&catalog))
            .set_length(compound.extension, &catalog);
        self.splint
            .get_or_insert_with(|| Pole::new(&catalog))
            .set_length(compound.splint, &catalog);
    }

    /// Point all poles along `direction`, keeping the bottom anchor.
    pub fn set_direction(&mut self, direction: DVec3) {
        let bottom = self.bottom();
        self.main.set_direction(direction);
        self.layout(bottom);
    }

    /// Derive every sub-pole from the bottom anchor and the main direction
    fn layout(&mut self, bottom: DVec3) {
        let direction = self.main.direction();
        self.main.set_bottom(bottom);
        let joint = self.main.top();

        if let Some(extension) = self.extension.as_mut() {
            extension.set_direction(direction);
            extension.set_bottom(joint);
        }
        if let Some(splint) = self.splint.as_mut() {
            splint.set_direction(direction);
            let offset = lateral_axis(direction) * (self.main_radius + splint.radius());
            splint.set_position(joint + offset);
        }
    }

    /// Run from `ground` through `target` with the ground overlap beyond it.
    /// The main pole's centroid lands on `ground + direction * length / 2`.
    pub fn set_position_between_ground_and_pole(&mut self, ground: DVec3, target: DVec3) {
        let delta = target - ground;
        if delta.length_squared() < 1e-18 {
            tracing::debug!("ground and target coincide, scaffold unchanged");
            return;
        }
        self.main.set_direction(delta);
        self.set_length(delta.length() + self.catalog.ground_overlap);
        self.layout(ground);
    }

    /// Span between two lashing points, centered on their midpoint, with the
    /// pole overlap added to the distance.
    pub fn set_position_between_two_poles(&mut self, a: DVec3, b: DVec3) {
        let delta = b - a;
        if delta.length_squared() < 1e-18 {
            tracing::debug!("lashing points coincide, scaffold unchanged");
            return;
        }
        self.main.set_direction(delta);
        self.set_length(delta.length() + self.catalog.pole_overlap);
        let midpoint = (a + b) * 0.5;
        let bottom = midpoint - self.direction() * (self.length() / 2.0);
        self.layout(bottom);
    }

    /// Change length keeping the opposite end anchored
    pub fn resize(&mut self, resize_at_top: bool, new_minimum_length: f64) {
        let top = self.center();
        self.set_length(new_minimum_length);
        if !resize_at_top {
            let bottom = top - self.direction() * self.length();
            self.layout(bottom);
        }
    }

    pub fn translate(&mut self, delta: DVec3) {
        let bottom = self.bottom() + delta;
        self.layout(bottom);
    }

    /// True if any constituent pole overlaps `other`
    pub fn overlaps(&self, other: &Pole) -> bool {
        self.poles().any(|pole| pole.overlaps(other))
    }

    pub fn overlaps_within(&self, other: &Pole, factor: f64) -> bool {
        self.poles().any(|pole| pole.overlaps_within(other, factor))
    }

    /// Main or extension pole whose segment holds `point`
    pub fn pole_holding(&self, point: DVec3) -> Option<&Pole> {
        if self.main.holds(point) {
            return Some(&self.main);
        }
        self.extension.as_ref().filter(|e| e.holds(point))
    }

    /// Pole of this scaffold whose id is `id`
    pub fn pole(&self, id: &str) -> Option<&Pole> {
        self.poles().find(|p| p.id() == id)
    }

    /// Whether `id` names the main pole or the extension
    pub fn is_spine(&self, id: &str) -> bool {
        self.main.id() == id || self.extension.as_ref().is_some_and(|e| e.id() == id)
    }

    /// Points where the splint is lashed to main and extension, a quarter
    /// splint length either side of the joint, on the touching surfaces.
    pub fn splice_points(&self) -> Option<(DVec3, DVec3, DVec3)> {
        let joint = self.joint()?;
        let splint = self.splint.as_ref()?;
        let direction = self.direction();
        let side = lateral_axis(direction) * self.main_radius;
        let quarter = direction * (splint.length() / 4.0);
        Some((joint - quarter + side, joint + quarter + side, splint.position()))
    }
}

impl Default for Scaffold {
    fn default() -> Self {
        Self::new(Arc::new(PoleCatalog::default()))
    }
}

/// Leg standing on `ground` reaching `target`, for previews and tests
pub fn leg(catalog: &Arc<PoleCatalog>, ground: DVec3, target: DVec3) -> Scaffold {
    let mut scaffold = Scaffold::new(Arc::clone(catalog));
    scaffold.set_position_between_ground_and_pole(ground, target);
    scaffold
}
