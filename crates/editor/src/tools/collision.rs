use shared::PoleId;

use crate::model::{Pole, Scaffold};

/// Committed poles a preview overlaps, and whether that blocks a commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionState {
    flagged: Vec<PoleId>,
    blocking: bool,
}

impl CollisionState {
    /// Test every leg against every placed pole. Overlaps are always
    /// flagged but only block when `at_confirm` is set.
    pub fn check(legs: &[Scaffold], placed: &[Pole], overlap_factor: f64, at_confirm: bool) -> Self {
        let flagged: Vec<PoleId> = placed
            .iter()
            .filter(|pole| legs.iter().any(|leg| leg.overlaps_within(pole, overlap_factor)))
            .map(|pole| pole.id().clone())
            .collect();
        let blocking = at_confirm && !flagged.is_empty();
        Self { flagged, blocking }
    }

    pub fn flagged(&self) -> &[PoleId] {
        &self.flagged
    }

    pub fn is_colliding(&self) -> bool {
        !self.flagged.is_empty()
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }
}
