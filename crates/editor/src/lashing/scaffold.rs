use glam::DVec3;
use shared::{LashingKind, PoleId};

use super::{find_pole, ContactGeometry};
use crate::model::{Pole, Scaffold};

/// Splint lashed across the joint of a compound leg, binding it to both
/// the main pole and the extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaffoldLashing {
    pub main: PoleId,
    pub extension: PoleId,
    pub splint: PoleId,
    pub lower: DVec3,
    pub upper: DVec3,
    pub middle: DVec3,
}

impl ScaffoldLashing {
    /// `None` for single-pole scaffolds
    pub fn splice(scaffold: &Scaffold) -> Option<Self> {
        let extension = scaffold.extension()?;
        let splint = scaffold.splint()?;
        let (lower, upper, middle) = scaffold.splice_points()?;
        Some(Self {
            main: scaffold.main().id().clone(),
            extension: extension.id().clone(),
            splint: splint.id().clone(),
            lower,
            upper,
            middle,
        })
    }
}

impl ContactGeometry for ScaffoldLashing {
    fn kind(&self) -> LashingKind {
        LashingKind::Scaffold
    }

    fn bindings(&self) -> Vec<(&PoleId, DVec3)> {
        vec![
            (&self.main, self.lower),
            (&self.extension, self.upper),
            (&self.splint, self.middle),
        ]
    }

    fn bindings_mut(&mut self) -> Vec<(&mut PoleId, &mut DVec3)> {
        vec![
            (&mut self.main, &mut self.lower),
            (&mut self.extension, &mut self.upper),
            (&mut self.splint, &mut self.middle),
        ]
    }

    fn recompute(&mut self, poles: &[Pole]) {
        let (Some(main), Some(extension), Some(splint)) = (
            find_pole(poles, &self.main),
            find_pole(poles, &self.extension),
            find_pole(poles, &self.splint),
        ) else {
            return;
        };
        let quarter = splint.direction() * (splint.length() / 4.0);
        let toward_splint = splint.position() - main.closest_point_to(splint.position());
        let side = toward_splint.normalize_or_zero() * main.radius();
        let joint = main.top();
        self.lower = joint - quarter + side;
        self.upper = extension.closest_point_to(joint + quarter) + side;
        self.middle = splint.position();
    }

    /// The splice is bound to specific sub-poles by construction
    fn relash(&mut self, _scaffold: &Scaffold) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{leg, PoleCatalog};
    use std::sync::Arc;

    #[test]
    fn test_splice_binds_all_three_sub_poles() {
        let catalog = Arc::new(PoleCatalog::default());
        let scaffold = leg(&catalog, DVec3::ZERO, DVec3::new(0.0, 7.5, 0.0));
        let splice = ScaffoldLashing::splice(&scaffold).unwrap();
        assert_eq!(splice.main, *scaffold.main().id());
        assert_eq!(splice.extension, *scaffold.extension().unwrap().id());
        assert_eq!(splice.splint, *scaffold.splint().unwrap().id());
        assert!((splice.lower.y - 3.5).abs() < 1e-12);
        assert!((splice.upper.y - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_recompute_matches_splice_points() {
        let catalog = Arc::new(PoleCatalog::default());
        let scaffold = leg(&catalog, DVec3::ZERO, DVec3::new(0.0, 7.5, 0.0));
        let splice = ScaffoldLashing::splice(&scaffold).unwrap();
        let mut recomputed = splice.clone();
        let poles: Vec<Pole> = scaffold.poles().cloned().collect();
        recomputed.recompute(&poles);
        assert!(recomputed.lower.abs_diff_eq(splice.lower, 1e-9));
        assert!(recomputed.upper.abs_diff_eq(splice.upper, 1e-9));
        assert!(recomputed.middle.abs_diff_eq(splice.middle, 1e-9));
    }

    #[test]
    fn test_single_pole_scaffold_has_no_splice() {
        let catalog = Arc::new(PoleCatalog::default());
        let scaffold = leg(&catalog, DVec3::ZERO, DVec3::new(0.0, 2.0, 0.0));
        assert!(ScaffoldLashing::splice(&scaffold).is_none());
    }
}
