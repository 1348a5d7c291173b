//! Factory functions for creating test data.
//!
//! Helpers to construct poles, pointer samples and scene records for tests
//! and scripted sessions.

use glam::DVec3;
use shared::{LashingKind, LashingRecord, PoleRecord, SceneRecord};

use crate::geometry::Ray;
use crate::model::{Pole, PoleCatalog};
use crate::state::Inventory;
use crate::tools::{PointerInput, PoleHit};

// ── Pole factories ──────────────────────────────────────────────

/// Upright pole standing on the ground at (x, z)
pub fn upright_pole(id: &str, x: f64, z: f64, length: f64) -> Pole {
    let catalog = PoleCatalog::default();
    let mut pole = Pole::with_id(id.to_string(), &catalog);
    pole.set_length(length, &catalog);
    pole.set_bottom(DVec3::new(x, 0.0, z));
    pole
}

/// Pole centered on `center` along `direction`
pub fn pole_along(id: &str, center: [f64; 3], direction: [f64; 3], length: f64) -> Pole {
    let catalog = PoleCatalog::default();
    let mut pole = Pole::with_id(id.to_string(), &catalog);
    pole.set_direction(DVec3::from_array(direction));
    pole.set_length(length, &catalog);
    pole.set_position(DVec3::from_array(center));
    pole
}

/// Inventory holding `poles` as one committed step
pub fn inventory_with(poles: Vec<Pole>) -> Inventory {
    let mut inventory = Inventory::new();
    inventory.add_poles(poles);
    inventory
}

// ── Pointer factories ───────────────────────────────────────────

/// Cursor hovering the surface of `pole` at height `y`, facing `normal`
pub fn hit_on(pole: &Pole, y: f64, normal: DVec3) -> PoleHit {
    let normal = normal.normalize();
    let axis = DVec3::new(pole.position().x, y, pole.position().z);
    PoleHit {
        pole_id: pole.id().clone(),
        point: axis + normal * pole.radius(),
        normal,
    }
}

/// Pointer whose camera ray passes horizontally through (x, height, z)
pub fn ray_at_height(x: f64, height: f64, z: f64) -> PointerInput {
    PointerInput::default().with_ray(Ray::new(DVec3::new(x, height, z + 10.0), -DVec3::Z))
}

// ── Record factories ────────────────────────────────────────────

pub fn pole_record(id: &str, position: [f64; 3], direction: [f64; 3], length: f64) -> PoleRecord {
    PoleRecord {
        id: id.to_string(),
        position,
        direction,
        length,
    }
}

/// Lashing record without contact points; they are recomputed on load
pub fn lashing_record(id: &str, kind: LashingKind, poles: &[&str]) -> LashingRecord {
    LashingRecord {
        id: id.to_string(),
        kind,
        poles: poles.iter().map(|p| p.to_string()).collect(),
        contact_points: Vec::new(),
    }
}

/// Two legs from (0,0,0) and (1,0,0) crossing at about 2 m, bipod-lashed
pub fn bipod_scene() -> SceneRecord {
    let rise = 2.0_f64;
    let run = 0.5_f64;
    let slant = (rise * rise + run * run).sqrt();
    let d1 = [run / slant, rise / slant, 0.0];
    let d2 = [-run / slant, rise / slant, 0.0];
    let half = 1.25;
    SceneRecord {
        poles: vec![
            pole_record("leg_a", [d1[0] * half, d1[1] * half, 0.06], d1, 2.5),
            pole_record("leg_b", [1.0 + d2[0] * half, d2[1] * half, -0.06], d2, 2.5),
        ],
        lashings: vec![lashing_record("bipod", LashingKind::Bipod, &["leg_a", "leg_b"])],
        ..SceneRecord::default()
    }
}

/// Two upright poles 2 m apart with a horizontal rail square-lashed
/// across their fronts at 1.5 m
pub fn rail_scene() -> SceneRecord {
    SceneRecord {
        poles: vec![
            pole_record("post_a", [0.0, 2.0, 0.0], [0.0, 1.0, 0.0], 4.0),
            pole_record("post_b", [2.0, 2.0, 0.0], [0.0, 1.0, 0.0], 4.0),
            pole_record("rail", [1.0, 1.5, -0.12], [1.0, 0.0, 0.0], 2.5),
        ],
        lashings: vec![
            lashing_record("square_a", LashingKind::Square, &["post_a", "rail"]),
            lashing_record("square_b", LashingKind::Square, &["post_b", "rail"]),
        ],
        ..SceneRecord::default()
    }
}
