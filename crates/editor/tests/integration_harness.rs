//! Integration tests for TestHarness.
//!
//! Scene loading, edits on committed poles and tools working against a
//! loaded scene.

use glam::DVec3;
use pionier_lib::fixtures::{bipod_scene, hit_on, rail_scene};
use pionier_lib::harness::TestHarness;
use pionier_lib::state::EditorSettings;
use pionier_lib::tools::{ClickOutcome, PointerInput, ToolKind};
use shared::LashingKind;

#[test]
fn test_harness_scene_round_trip() {
    let mut h = TestHarness::new();
    h.load_scene(&rail_scene());
    let json = h.export_scene_json().unwrap();

    let mut h2 = TestHarness::new();
    let report = h2.load_scene_json(&json).unwrap();
    assert_eq!(report.poles, 3);
    assert_eq!(report.lashings, 2);
    assert_eq!(h2.inventory.to_record(), h.inventory.to_record());
}

#[test]
fn test_harness_skips_dangling_lashings() {
    let mut scene = bipod_scene();
    scene.poles.retain(|p| p.id != "leg_b");

    let mut h = TestHarness::new();
    let report = h.load_scene(&scene);
    assert_eq!(report.poles, 1);
    assert_eq!(report.lashings, 0);
    assert_eq!(report.skipped_lashings, 1);
}

#[test]
fn test_harness_load_is_undoable() {
    let mut h = TestHarness::new();
    h.load_scene(&rail_scene());
    assert_eq!(h.pole_count(), 3);
    assert!(h.undo());
    assert_eq!(h.pole_count(), 0);
}

#[test]
fn test_harness_translate_recomputes_lashings() {
    let mut h = TestHarness::new();
    h.load_scene(&rail_scene());
    h.translate_pole("rail", DVec3::new(0.0, -0.5, 0.0)).unwrap();

    for lashing in h.inventory.lashings_of("rail") {
        assert!((lashing.center().y - 1.0).abs() < 1e-9);
    }
    assert!(h.undo());
    let rail = h.inventory.pole("rail").unwrap();
    assert!((rail.position().y - 1.5).abs() < 1e-12);
}

#[test]
fn test_harness_threatened_lashings_before_delete() {
    let mut h = TestHarness::new();
    h.load_scene(&rail_scene());
    let flagged = h.inventory.threaten_dependents(&["rail".to_string()]);
    assert_eq!(flagged, 2);
    assert!(h.inventory.lashings().iter().all(|l| l.is_threatened()));
    h.inventory.clear_threats();
    assert!(h.inventory.lashings().iter().all(|l| !l.is_threatened()));
}

#[test]
fn test_harness_second_rail_snaps_to_first() {
    let mut h = TestHarness::new();
    h.load_scene(&rail_scene());
    let a = h.inventory.pole("post_a").unwrap().clone();
    let b = h.inventory.pole("post_b").unwrap().clone();

    h.select_tool(ToolKind::Pole);
    let start = PointerInput::default().hovering(hit_on(&a, 1.53, DVec3::Z));
    let end = PointerInput::default().hovering(hit_on(&b, 1.46, DVec3::Z));
    h.left_click(&start);
    h.pointer_move(&end);
    assert!(h.colliding_poles().is_empty());
    h.left_click(&end);
    assert_eq!(h.left_click(&end), ClickOutcome::Committed { poles: 1, lashings: 2 });

    let squares = h
        .inventory
        .lashings()
        .iter()
        .filter(|l| l.kind() == LashingKind::Square)
        .count();
    assert_eq!(squares, 4);
    let heights = h.inventory.lashing_heights();
    assert_eq!(heights.len(), 1, "heights {heights:?}");
}

#[test]
fn test_harness_custom_catalog() {
    let json = r#"{"catalog": {"lengths": [2.0, 3.0], "radius": 0.05}}"#;
    let settings = EditorSettings::from_json(json).unwrap();
    let mut h = TestHarness::with_settings(settings);
    h.select_tool(ToolKind::Pole);
    h.click_ground(0.0, 0.0);
    h.move_ray_at_height(0.0, 2.5, 0.0);
    h.left_click(&PointerInput::default());
    h.left_click(&PointerInput::default());

    let pole = &h.inventory.poles()[0];
    assert_eq!(pole.length(), 3.0);
    assert_eq!(pole.radius(), 0.05);
}
