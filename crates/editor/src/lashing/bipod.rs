use glam::DVec3;
use shared::{LashingKind, PoleId};

use super::{contact_pair, find_pole, ContactGeometry};
use crate::model::Pole;

/// Two legs crossed near their tops
#[derive(Debug, Clone, PartialEq)]
pub struct BipodLashing {
    pub poles: [PoleId; 2],
    pub contacts: [DVec3; 2],
}

impl BipodLashing {
    pub fn between(a: &Pole, b: &Pole) -> Self {
        let (on_a, on_b) = contact_pair(a, b);
        Self {
            poles: [a.id().clone(), b.id().clone()],
            contacts: [on_a, on_b],
        }
    }
}

impl ContactGeometry for BipodLashing {
    fn kind(&self) -> LashingKind {
        LashingKind::Bipod
    }

    fn bindings(&self) -> Vec<(&PoleId, DVec3)> {
        self.poles.iter().zip(self.contacts).collect()
    }

    fn bindings_mut(&mut self) -> Vec<(&mut PoleId, &mut DVec3)> {
        self.poles.iter_mut().zip(self.contacts.iter_mut()).collect()
    }

    fn recompute(&mut self, poles: &[Pole]) {
        if let (Some(a), Some(b)) = (find_pole(poles, &self.poles[0]), find_pole(poles, &self.poles[1])) {
            let (on_a, on_b) = contact_pair(a, b);
            self.contacts = [on_a, on_b];
        }
    }
}
