use glam::DVec3;
use shared::{LashingKind, PoleId};

use super::{contact_pair, find_pole, ContactGeometry};
use crate::model::Pole;

/// A loose pole lashed crosswise onto a fixed one.
///
/// `fixed_center` lies on the fixed pole's axis; `loose_center` sits one
/// summed radius away along the common normal of both axes.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareLashing {
    pub fixed: PoleId,
    pub loose: PoleId,
    pub fixed_center: DVec3,
    pub loose_center: DVec3,
}

impl SquareLashing {
    /// Lash a pole running along `loose_direction` onto `fixed` at the
    /// surface point `anchor` with outward `normal`. Of the two sides of the
    /// fixed pole, the one facing the anchor wins.
    ///
    /// `None` when the two directions are parallel.
    pub fn place(
        anchor: DVec3,
        normal: DVec3,
        fixed: &Pole,
        loose: PoleId,
        loose_direction: DVec3,
        loose_radius: f64,
    ) -> Option<Self> {
        if fixed.is_parallel_to(loose_direction) {
            return None;
        }
        let side = fixed.direction().cross(loose_direction).try_normalize()?;
        let fixed_center = fixed.closest_point_to(anchor - normal.normalize_or_zero() * fixed.radius());
        let offset = side * (fixed.radius() + loose_radius);
        let (near, far) = (fixed_center + offset, fixed_center - offset);
        let loose_center = if near.distance_squared(anchor) <= far.distance_squared(anchor) {
            near
        } else {
            far
        };
        Some(Self {
            fixed: fixed.id().clone(),
            loose,
            fixed_center,
            loose_center,
        })
    }

    /// Slide both centers along the fixed axis so the loose pole sits at
    /// `height`, if it is already within `tolerance` of it. Has no effect on
    /// horizontal fixed poles. Returns whether the lashing snapped.
    pub fn snap_loose_pole(&mut self, height: f64, fixed_direction: DVec3, tolerance: f64) -> bool {
        let rise = fixed_direction.y;
        if rise.abs() < 1e-9 {
            return false;
        }
        let dy = height - self.loose_center.y;
        if dy.abs() >= tolerance {
            return false;
        }
        let shift = fixed_direction * (dy / rise);
        self.fixed_center += shift;
        self.loose_center += shift;
        true
    }
}

impl ContactGeometry for SquareLashing {
    fn kind(&self) -> LashingKind {
        LashingKind::Square
    }

    fn bindings(&self) -> Vec<(&PoleId, DVec3)> {
        vec![(&self.fixed, self.fixed_center), (&self.loose, self.loose_center)]
    }

    fn bindings_mut(&mut self) -> Vec<(&mut PoleId, &mut DVec3)> {
        vec![
            (&mut self.fixed, &mut self.fixed_center),
            (&mut self.loose, &mut self.loose_center),
        ]
    }

    fn recompute(&mut self, poles: &[Pole]) {
        if let (Some(fixed), Some(loose)) = (find_pole(poles, &self.fixed), find_pole(poles, &self.loose)) {
            let (on_fixed, on_loose) = contact_pair(fixed, loose);
            self.fixed_center = on_fixed;
            self.loose_center = on_loose;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PoleCatalog;

    fn pole_along(direction: DVec3, position: DVec3) -> Pole {
        let catalog = PoleCatalog::default();
        let mut pole = Pole::new(&catalog);
        pole.set_direction(direction);
        pole.set_length(4.0, &catalog);
        pole.set_position(position);
        pole
    }

    #[test]
    fn test_place_on_top_of_horizontal_pole() {
        let fixed = pole_along(DVec3::X, DVec3::new(0.0, 1.0, 0.0));
        let square = SquareLashing::place(
            DVec3::new(0.0, 1.06, 0.0),
            DVec3::Y,
            &fixed,
            "loose".into(),
            DVec3::Z,
            0.06,
        )
        .unwrap();
        assert!(square.fixed_center.abs_diff_eq(DVec3::new(0.0, 1.0, 0.0), 1e-12));
        assert!(square.loose_center.abs_diff_eq(DVec3::new(0.0, 1.12, 0.0), 1e-12));
        assert_eq!(square.fixed, *fixed.id());
    }

    #[test]
    fn test_place_rejects_parallel_poles() {
        let fixed = pole_along(DVec3::Y, DVec3::new(0.0, 2.0, 0.0));
        let square = SquareLashing::place(
            DVec3::new(0.06, 1.0, 0.0),
            DVec3::X,
            &fixed,
            "loose".into(),
            DVec3::new(0.0, -1.0, 0.0),
            0.06,
        );
        assert!(square.is_none());
    }

    #[test]
    fn test_snap_to_existing_height_is_idempotent() {
        let fixed = pole_along(DVec3::Y, DVec3::new(0.0, 2.0, 0.0));
        let mut square = SquareLashing::place(
            DVec3::new(0.06, 1.95, 0.0),
            DVec3::X,
            &fixed,
            "loose".into(),
            DVec3::Z,
            0.06,
        )
        .unwrap();
        assert!(square.loose_center.abs_diff_eq(DVec3::new(0.12, 1.95, 0.0), 1e-12));

        assert!(square.snap_loose_pole(2.0, fixed.direction(), 0.1));
        assert!((square.loose_center.y - 2.0).abs() < 1e-12);
        assert!((square.fixed_center.y - 2.0).abs() < 1e-12);

        let snapped = square.clone();
        assert!(square.snap_loose_pole(2.0, fixed.direction(), 0.1));
        assert!(square.loose_center.abs_diff_eq(snapped.loose_center, 1e-12));
        assert!(square.fixed_center.abs_diff_eq(snapped.fixed_center, 1e-12));
    }

    #[test]
    fn test_snap_outside_tolerance_or_on_horizontal_pole() {
        let upright = pole_along(DVec3::Y, DVec3::new(0.0, 2.0, 0.0));
        let mut square = SquareLashing::place(
            DVec3::new(0.06, 1.5, 0.0),
            DVec3::X,
            &upright,
            "loose".into(),
            DVec3::Z,
            0.06,
        )
        .unwrap();
        let before = square.clone();
        assert!(!square.snap_loose_pole(2.0, upright.direction(), 0.1));
        assert_eq!(square, before);

        assert!(!square.snap_loose_pole(1.5, DVec3::X, 0.1));
        assert_eq!(square, before);
    }
}
