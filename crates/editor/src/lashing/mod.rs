//! Lashings: the joints where two or more poles are bound together.
//!
//! Each kind carries its own contact-point payload. The cross-cutting
//! operations (re-binding to a scaffold's extension, recomputing contacts
//! after an edit, visual threat state) go through [`ContactGeometry`] and
//! the [`Lashing`] wrapper.

mod bipod;
mod scaffold;
mod square;
mod tripod;

pub use bipod::BipodLashing;
pub use scaffold::ScaffoldLashing;
pub use square::SquareLashing;
pub use tripod::{PolypedestraLashing, TripodLashing};

use glam::DVec3;
use shared::{LashingId, LashingKind, LashingRecord, PoleId};

use crate::model::{Pole, Scaffold};

/// Capability set shared by every lashing kind
pub trait ContactGeometry {
    fn kind(&self) -> LashingKind;

    /// Participant poles paired with the contact point on each
    fn bindings(&self) -> Vec<(&PoleId, DVec3)>;

    fn bindings_mut(&mut self) -> Vec<(&mut PoleId, &mut DVec3)>;

    /// Recompute contact points from the current geometry of `poles`
    fn recompute(&mut self, poles: &[Pole]);

    /// Re-bind participants that belong to `scaffold` to whichever of its
    /// main/extension poles actually holds their contact point.
    /// Returns true if any participant changed.
    fn relash(&mut self, scaffold: &Scaffold) -> bool {
        let mut changed = false;
        for (pole_id, contact) in self.bindings_mut() {
            if !scaffold.is_spine(pole_id) {
                continue;
            }
            match scaffold.pole_holding(*contact) {
                Some(holder) if holder.id() != pole_id => {
                    *pole_id = holder.id().clone();
                    changed = true;
                }
                Some(_) => {}
                None => {
                    tracing::error!(pole = %pole_id, "contact point lies off every pole of its scaffold")
                }
            }
        }
        changed
    }
}

/// Find a pole by id
pub(crate) fn find_pole<'a>(poles: &'a [Pole], id: &str) -> Option<&'a Pole> {
    poles.iter().find(|p| p.id() == id)
}

/// Contact points between two poles: the closest approach of their
/// centerlines, or for parallel poles the point on `a` nearest `b`'s
/// midpoint and its projection back onto `b`.
pub fn contact_pair(a: &Pole, b: &Pole) -> (DVec3, DVec3) {
    match a.closest_approach(b) {
        Some(approach) => (approach.closest_point, approach.closest_point_on_other),
        None => {
            let on_a = a.closest_point_to(b.position());
            (on_a, b.closest_point_to(on_a))
        }
    }
}

/// Contact point on each pole, averaged over its closest approaches to
/// the poles `neighbours(i)` names.
pub(crate) fn averaged_contacts(
    poles: &[&Pole],
    neighbours: impl Fn(usize) -> Vec<usize>,
) -> Vec<DVec3> {
    (0..poles.len())
        .map(|i| {
            let others = neighbours(i);
            if others.is_empty() {
                return poles[i].top();
            }
            let sum: DVec3 = others
                .iter()
                .map(|&j| contact_pair(poles[i], poles[j]).0)
                .sum();
            sum / others.len() as f64
        })
        .collect()
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq)]
pub enum LashingGeometry {
    Square(SquareLashing),
    Bipod(BipodLashing),
    Tripod(TripodLashing),
    Polypedestra(PolypedestraLashing),
    Scaffold(ScaffoldLashing),
}

impl LashingGeometry {
    fn as_dyn(&self) -> &dyn ContactGeometry {
        match self {
            LashingGeometry::Square(l) => l,
            LashingGeometry::Bipod(l) => l,
            LashingGeometry::Tripod(l) => l,
            LashingGeometry::Polypedestra(l) => l,
            LashingGeometry::Scaffold(l) => l,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn ContactGeometry {
        match self {
            LashingGeometry::Square(l) => l,
            LashingGeometry::Bipod(l) => l,
            LashingGeometry::Tripod(l) => l,
            LashingGeometry::Polypedestra(l) => l,
            LashingGeometry::Scaffold(l) => l,
        }
    }

    /// Build a payload from participants and contact points; `None` if the
    /// participant count does not fit the kind.
    fn from_parts(kind: LashingKind, poles: Vec<PoleId>, contacts: Vec<DVec3>) -> Option<Self> {
        match (kind, poles.as_slice(), contacts.as_slice()) {
            (LashingKind::Square, [fixed, loose], [fixed_center, loose_center]) => {
                Some(LashingGeometry::Square(SquareLashing {
                    fixed: fixed.clone(),
                    loose: loose.clone(),
                    fixed_center: *fixed_center,
                    loose_center: *loose_center,
                }))
            }
            (LashingKind::Bipod, [a, b], [ca, cb]) => Some(LashingGeometry::Bipod(BipodLashing {
                poles: [a.clone(), b.clone()],
                contacts: [*ca, *cb],
            })),
            (LashingKind::Tripod, [a, b, c], [ca, cb, cc]) => {
                Some(LashingGeometry::Tripod(TripodLashing {
                    poles: [a.clone(), b.clone(), c.clone()],
                    contacts: [*ca, *cb, *cc],
                }))
            }
            (LashingKind::Polypedestra, legs, points) if legs.len() >= 3 && legs.len() == points.len() => {
                Some(LashingGeometry::Polypedestra(PolypedestraLashing {
                    poles: poles.clone(),
                    contacts: contacts.clone(),
                }))
            }
            (LashingKind::Scaffold, [main, extension, splint], [lower, upper, middle]) => {
                Some(LashingGeometry::Scaffold(ScaffoldLashing {
                    main: main.clone(),
                    extension: extension.clone(),
                    splint: splint.clone(),
                    lower: *lower,
                    upper: *upper,
                    middle: *middle,
                }))
            }
            _ => None,
        }
    }
}

/// A lashing in the scene or in a tool preview
#[derive(Debug, Clone, PartialEq)]
pub struct Lashing {
    id: LashingId,
    threatened: bool,
    geometry: LashingGeometry,
}

impl Lashing {
    pub fn new(geometry: LashingGeometry) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), geometry)
    }

    pub fn with_id(id: LashingId, geometry: LashingGeometry) -> Self {
        Self {
            id,
            threatened: false,
            geometry,
        }
    }

    pub fn id(&self) -> &LashingId {
        &self.id
    }

    pub fn kind(&self) -> LashingKind {
        self.geometry.as_dyn().kind()
    }

    pub fn geometry(&self) -> &LashingGeometry {
        &self.geometry
    }

    pub fn geometry_mut(&mut self) -> &mut LashingGeometry {
        &mut self.geometry
    }

    pub fn pole_ids(&self) -> Vec<&PoleId> {
        self.geometry.as_dyn().bindings().into_iter().map(|(id, _)| id).collect()
    }

    pub fn contact_points(&self) -> Vec<DVec3> {
        self.geometry.as_dyn().bindings().into_iter().map(|(_, p)| p).collect()
    }

    /// Mean of the contact points
    pub fn center(&self) -> DVec3 {
        let points = self.contact_points();
        if points.is_empty() {
            return DVec3::ZERO;
        }
        points.iter().copied().sum::<DVec3>() / points.len() as f64
    }

    pub fn references(&self, pole_id: &str) -> bool {
        self.pole_ids().into_iter().any(|id| id == pole_id)
    }

    /// Flag as endangered, e.g. while a pole it binds is being removed
    pub fn threaten(&mut self) {
        self.threatened = true;
    }

    pub fn stop_threaten(&mut self) {
        self.threatened = false;
    }

    pub fn is_threatened(&self) -> bool {
        self.threatened
    }

    pub fn relash(&mut self, scaffold: &Scaffold) -> bool {
        self.geometry.as_dyn_mut().relash(scaffold)
    }

    pub fn recompute(&mut self, poles: &[Pole]) {
        self.geometry.as_dyn_mut().recompute(poles);
    }

    pub fn to_record(&self) -> LashingRecord {
        let bindings = self.geometry.as_dyn().bindings();
        LashingRecord {
            id: self.id.clone(),
            kind: self.kind(),
            poles: bindings.iter().map(|(id, _)| (*id).clone()).collect(),
            contact_points: bindings.iter().map(|(_, p)| p.to_array()).collect(),
        }
    }

    /// Rebuild a committed lashing against `poles`.
    ///
    /// Returns `None` if a participant is missing or the participant count
    /// does not fit the kind. Missing contact points are recomputed.
    pub fn from_record(record: &LashingRecord, poles: &[Pole]) -> Option<Self> {
        if record.poles.iter().any(|id| find_pole(poles, id).is_none()) {
            return None;
        }
        let recompute = record.contact_points.len() != record.poles.len();
        let contacts = if recompute {
            record
                .poles
                .iter()
                .filter_map(|id| find_pole(poles, id).map(Pole::position))
                .collect()
        } else {
            record.contact_points.iter().copied().map(DVec3::from_array).collect()
        };
        let geometry = LashingGeometry::from_parts(record.kind, record.poles.clone(), contacts)?;
        let mut lashing = Self::with_id(record.id.clone(), geometry);
        if recompute {
            lashing.recompute(poles);
        }
        Some(lashing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{leg, PoleCatalog};
    use std::sync::Arc;

    fn crossing_poles() -> (Pole, Pole) {
        let catalog = PoleCatalog::default();
        let mut a = Pole::new(&catalog);
        a.set_direction(DVec3::X);
        a.set_length(2.0, &catalog);
        a.set_position(DVec3::new(0.0, 1.0, 0.0));
        let mut b = Pole::new(&catalog);
        b.set_direction(DVec3::Z);
        b.set_length(2.0, &catalog);
        b.set_position(DVec3::new(0.0, 1.12, 0.0));
        (a, b)
    }

    #[test]
    fn test_contact_pair_crossing() {
        let (a, b) = crossing_poles();
        let (pa, pb) = contact_pair(&a, &b);
        assert!(pa.abs_diff_eq(DVec3::new(0.0, 1.0, 0.0), 1e-9));
        assert!(pb.abs_diff_eq(DVec3::new(0.0, 1.12, 0.0), 1e-9));
    }

    #[test]
    fn test_contact_pair_parallel_falls_back_to_projection() {
        let catalog = PoleCatalog::default();
        let a = Pole::new(&catalog);
        let mut b = Pole::new(&catalog);
        b.set_position(DVec3::new(0.12, 0.5, 0.0));
        let (pa, pb) = contact_pair(&a, &b);
        assert!(pa.abs_diff_eq(DVec3::new(0.0, 0.5, 0.0), 1e-9));
        assert!(pb.abs_diff_eq(DVec3::new(0.12, 0.5, 0.0), 1e-9));
    }

    #[test]
    fn test_threaten_toggles() {
        let (a, b) = crossing_poles();
        let mut lashing = Lashing::new(LashingGeometry::Bipod(BipodLashing::between(&a, &b)));
        assert!(!lashing.is_threatened());
        lashing.threaten();
        assert!(lashing.is_threatened());
        lashing.stop_threaten();
        assert!(!lashing.is_threatened());
    }

    #[test]
    fn test_record_roundtrip() {
        let (a, b) = crossing_poles();
        let lashing = Lashing::new(LashingGeometry::Bipod(BipodLashing::between(&a, &b)));
        let record = lashing.to_record();
        assert_eq!(record.kind, LashingKind::Bipod);
        assert_eq!(record.poles, vec![a.id().clone(), b.id().clone()]);

        let poles = vec![a, b];
        let back = Lashing::from_record(&record, &poles).unwrap();
        assert_eq!(back, lashing);
    }

    #[test]
    fn test_record_without_contacts_is_recomputed() {
        let (a, b) = crossing_poles();
        let record = LashingRecord {
            id: "l1".into(),
            kind: LashingKind::Square,
            poles: vec![a.id().clone(), b.id().clone()],
            contact_points: vec![],
        };
        let poles = vec![a, b];
        let lashing = Lashing::from_record(&record, &poles).unwrap();
        let points = lashing.contact_points();
        assert!(points[0].abs_diff_eq(DVec3::new(0.0, 1.0, 0.0), 1e-9));
        assert!(points[1].abs_diff_eq(DVec3::new(0.0, 1.12, 0.0), 1e-9));
    }

    #[test]
    fn test_record_with_missing_pole_or_bad_arity() {
        let (a, b) = crossing_poles();
        let poles = vec![a.clone(), b.clone()];
        let missing = LashingRecord {
            id: "l1".into(),
            kind: LashingKind::Bipod,
            poles: vec![a.id().clone(), "ghost".into()],
            contact_points: vec![],
        };
        assert!(Lashing::from_record(&missing, &poles).is_none());

        let bad_arity = LashingRecord {
            id: "l2".into(),
            kind: LashingKind::Tripod,
            poles: vec![a.id().clone(), b.id().clone()],
            contact_points: vec![],
        };
        assert!(Lashing::from_record(&bad_arity, &poles).is_none());
    }

    #[test]
    fn test_relash_moves_binding_to_extension() {
        let catalog = Arc::new(PoleCatalog::default());
        let scaffold = leg(&catalog, DVec3::ZERO, DVec3::new(0.0, 7.5, 0.0));
        let (other, _) = crossing_poles();
        let mut lashing = Lashing::new(LashingGeometry::Bipod(BipodLashing {
            poles: [scaffold.main().id().clone(), other.id().clone()],
            contacts: [DVec3::new(0.0, 7.0, 0.0), DVec3::new(0.1, 7.0, 0.0)],
        }));
        assert!(lashing.relash(&scaffold));
        assert!(lashing.references(scaffold.extension().unwrap().id()));
        assert!(!lashing.references(scaffold.main().id()));
        // Already bound to the holder: nothing changes.
        assert!(!lashing.relash(&scaffold));
    }
}
