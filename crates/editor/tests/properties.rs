//! Property tests for the catalog and the closest-approach query.

use glam::DVec3;
use pionier_lib::geometry::{closest_approach, segment_distance, Segment};
use pionier_lib::model::{PoleCatalog, ScaffoldLength};
use proptest::prelude::*;

fn vec3(range: f64) -> impl Strategy<Value = DVec3> {
    (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| DVec3::new(x, y, z))
}

fn segment() -> impl Strategy<Value = Segment> {
    (vec3(5.0), vec3(5.0))
        .prop_filter("non-degenerate", |(a, b)| a.distance(*b) > 0.1)
        .prop_map(|(a, b)| Segment::between(a, b))
}

proptest! {
    #[test]
    fn pick_length_is_catalog_member_and_long_enough(minimum in 0.0f64..10.0) {
        let catalog = PoleCatalog::default();
        let length = catalog.pick_length(minimum);
        prop_assert!(catalog.contains(length));
        prop_assert!(length >= minimum || length == catalog.max_length());
    }

    #[test]
    fn scaffold_length_reaches_minimum_or_clamps(minimum in 0.0f64..15.0) {
        let catalog = PoleCatalog::default();
        let picked = catalog.pick_scaffold_length(minimum);
        let longest = catalog.scaffold_lengths().last().copied().unwrap();
        prop_assert!(picked.total() >= minimum || picked.total() == longest);
        prop_assert!(catalog.scaffold_lengths().contains(&picked.total()));
        if let ScaffoldLength::Compound(compound) = picked {
            prop_assert!(minimum > catalog.max_length());
            prop_assert_eq!(compound.main + compound.extension, compound.total);
        }
    }

    #[test]
    fn closest_approach_is_symmetric(a in segment(), b in segment()) {
        prop_assume!(a.direction.cross(b.direction).length() > 0.1);
        let ab = closest_approach(&a, &b).unwrap();
        let ba = closest_approach(&b, &a).unwrap();
        prop_assert!((ab.distance() - ba.distance()).abs() < 1e-9);
        prop_assert!(ab.closest_point.abs_diff_eq(ba.closest_point_on_other, 1e-6));
        prop_assert!(ab.closest_point_on_other.abs_diff_eq(ba.closest_point, 1e-6));
    }

    #[test]
    fn closest_approach_is_minimal(a in segment(), b in segment(), u in 0.0f64..=1.0, v in 0.0f64..=1.0) {
        prop_assume!(a.direction.cross(b.direction).length() > 0.1);
        let approach = closest_approach(&a, &b).unwrap();
        prop_assert!(approach.distance() <= a.at(u).distance(b.at(v)) + 1e-9);
        prop_assert!((segment_distance(&a, &b) - approach.distance()).abs() < 1e-12);
    }
}
