use glam::DVec3;
use shared::{LashingKind, PoleId};

use super::{averaged_contacts, find_pole, ContactGeometry};
use crate::model::Pole;

/// Three legs bound at a common point
#[derive(Debug, Clone, PartialEq)]
pub struct TripodLashing {
    pub poles: [PoleId; 3],
    pub contacts: [DVec3; 3],
}

impl TripodLashing {
    /// Each leg's contact is the mean of its closest points to the other two
    pub fn between(legs: [&Pole; 3]) -> Self {
        let contacts = tripod_contacts(&legs);
        Self {
            poles: legs.map(|leg| leg.id().clone()),
            contacts,
        }
    }
}

fn tripod_contacts(legs: &[&Pole; 3]) -> [DVec3; 3] {
    let points = averaged_contacts(legs, |i| (0..3).filter(|&j| j != i).collect());
    [points[0], points[1], points[2]]
}

impl ContactGeometry for TripodLashing {
    fn kind(&self) -> LashingKind {
        LashingKind::Tripod
    }

    fn bindings(&self) -> Vec<(&PoleId, DVec3)> {
        self.poles.iter().zip(self.contacts).collect()
    }

    fn bindings_mut(&mut self) -> Vec<(&mut PoleId, &mut DVec3)> {
        self.poles.iter_mut().zip(self.contacts.iter_mut()).collect()
    }

    fn recompute(&mut self, poles: &[Pole]) {
        let [a, b, c] = &self.poles;
        if let (Some(a), Some(b), Some(c)) = (find_pole(poles, a), find_pole(poles, b), find_pole(poles, c)) {
            self.contacts = tripod_contacts(&[a, b, c]);
        }
    }
}

/// Ring of N legs, each lashed to its two neighbours
#[derive(Debug, Clone, PartialEq)]
pub struct PolypedestraLashing {
    pub poles: Vec<PoleId>,
    pub contacts: Vec<DVec3>,
}

impl PolypedestraLashing {
    pub fn around(legs: &[&Pole]) -> Self {
        Self {
            poles: legs.iter().map(|leg| leg.id().clone()).collect(),
            contacts: ring_contacts(legs),
        }
    }
}

fn ring_contacts(legs: &[&Pole]) -> Vec<DVec3> {
    let n = legs.len();
    averaged_contacts(legs, |i| {
        if n < 2 {
            return Vec::new();
        }
        let next = (i + 1) % n;
        let previous = (i + n - 1) % n;
        if next == previous {
            vec![next]
        } else {
            vec![previous, next]
        }
    })
}

impl ContactGeometry for PolypedestraLashing {
    fn kind(&self) -> LashingKind {
        LashingKind::Polypedestra
    }

    fn bindings(&self) -> Vec<(&PoleId, DVec3)> {
        self.poles.iter().zip(self.contacts.iter().copied()).collect()
    }

    fn bindings_mut(&mut self) -> Vec<(&mut PoleId, &mut DVec3)> {
        self.poles.iter_mut().zip(self.contacts.iter_mut()).collect()
    }

    fn recompute(&mut self, poles: &[Pole]) {
        let legs: Option<Vec<&Pole>> = self.poles.iter().map(|id| find_pole(poles, id)).collect();
        match legs {
            Some(legs) => self.contacts = ring_contacts(&legs),
            None => tracing::warn!("polypedestra is missing a leg, contacts left as they were"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PoleCatalog;

    fn leg_towards(catalog: &PoleCatalog, ground: DVec3, target: DVec3) -> Pole {
        let mut pole = Pole::new(catalog);
        pole.set_direction(target - ground);
        pole.set_length(ground.distance(target), catalog);
        pole.set_bottom(ground);
        pole
    }

    #[test]
    fn test_symmetric_tripod_contacts_cluster_at_apex() {
        let catalog = PoleCatalog::default();
        let apex = DVec3::new(0.0, 2.0, 0.0);
        let legs: Vec<Pole> = (0..3)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 3.0;
                let ground = DVec3::new(angle.cos(), 0.0, angle.sin());
                leg_towards(&catalog, ground, apex)
            })
            .collect();
        let tripod = TripodLashing::between([&legs[0], &legs[1], &legs[2]]);
        for contact in tripod.contacts {
            assert!(contact.distance(apex) < 1e-9);
        }
        assert_eq!(tripod.bindings().len(), 3);
    }

    #[test]
    fn test_polypedestra_uses_neighbours_only() {
        let catalog = PoleCatalog::default();
        let apex = DVec3::new(0.0, 3.0, 0.0);
        let legs: Vec<Pole> = (0..5)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 5.0;
                leg_towards(&catalog, DVec3::new(angle.cos(), 0.0, angle.sin()), apex)
            })
            .collect();
        let refs: Vec<&Pole> = legs.iter().collect();
        let mut ring = PolypedestraLashing::around(&refs);
        assert_eq!(ring.poles.len(), 5);
        assert_eq!(ring.contacts.len(), 5);
        for contact in &ring.contacts {
            assert!(contact.distance(apex) < 1e-9);
        }

        ring.recompute(&legs[..4]);
        assert_eq!(ring.contacts.len(), 5);
    }
}
