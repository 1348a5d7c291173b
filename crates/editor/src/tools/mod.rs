//! Interactive placement tools.
//!
//! Each tool is a small state machine driven by pointer moves, clicks and
//! keys. Between events it owns an in-progress [`Preview`] (legs, lashings,
//! helper lines, collision flags) that a renderer can draw every frame.
//! Committing hands the preview over to the [`Inventory`] in one step.

mod bipod;
mod collision;
mod pole;
mod polypedestra;
mod tripod;

pub use bipod::{bipod_targets, BipodTool};
pub use collision::CollisionState;
pub use pole::PoleTool;
pub use polypedestra::{ring_layout, PolypedestraTool, RingLayout};
pub use tripod::TripodTool;

use std::sync::Arc;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use shared::PoleId;

use crate::geometry::{point_on_ray_closest_to_line, Ray, UP};
use crate::lashing::{Lashing, LashingGeometry, ScaffoldLashing};
use crate::model::{Pole, Scaffold};
use crate::state::{EditorSettings, Inventory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Bipod,
    Tripod,
    Polypedestra,
    Pole,
}

/// Where a tool is in its placement sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementState {
    #[default]
    Idle,
    Leg1Placed,
    Leg2Placed,
    Leg3Placed,
    LashPositionPlaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Escape,
}

/// Cursor hovering the surface of a committed pole
#[derive(Debug, Clone, PartialEq)]
pub struct PoleHit {
    pub pole_id: PoleId,
    pub point: DVec3,
    /// Outward surface normal at `point`
    pub normal: DVec3,
}

/// One pointer sample from the input side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerInput {
    /// Cursor ray hit on the ground plane, if any
    pub ground: Option<DVec3>,
    /// Camera ray through the cursor
    pub ray: Option<Ray>,
    pub hover: Option<PoleHit>,
}

impl PointerInput {
    pub fn at_ground(point: DVec3) -> Self {
        Self {
            ground: Some(point),
            ..Self::default()
        }
    }

    pub fn with_ray(mut self, ray: Ray) -> Self {
        self.ray = Some(ray);
        self
    }

    pub fn hovering(mut self, hit: PoleHit) -> Self {
        self.hover = Some(hit);
        self
    }

    /// Height where the cursor ray passes closest to the vertical through
    /// `base`, no lower than `minimum`
    pub fn height_above(&self, base: DVec3, minimum: f64) -> Option<f64> {
        let ray = self.ray.as_ref()?;
        let point = point_on_ray_closest_to_line(ray, DVec3::new(base.x, 0.0, base.z), UP)?;
        Some(point.y.max(minimum))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Moved on to the given state
    Advanced(PlacementState),
    /// Committed to the inventory and returned to idle
    Committed { poles: usize, lashings: usize },
    /// Nothing happened: missing input or blocked by a collision
    Rejected,
}

/// Construction line drawn while placing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HelperLine {
    pub from: DVec3,
    pub to: DVec3,
}

impl HelperLine {
    pub fn new(from: DVec3, to: DVec3) -> Self {
        Self { from, to }
    }
}

/// In-progress geometry a tool exposes between events
#[derive(Debug, Clone, Default)]
pub struct Preview {
    legs: Vec<Scaffold>,
    lashings: Vec<Lashing>,
    helper_lines: Vec<HelperLine>,
    collision: CollisionState,
}

impl Preview {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Replace the structure. Every lashing is re-bound to the scaffold
    /// pole that holds its contact points, and every compound leg gets its
    /// splice lashing.
    pub fn set(&mut self, legs: Vec<Scaffold>, mut lashings: Vec<Lashing>) {
        for lashing in &mut lashings {
            for leg in &legs {
                lashing.relash(leg);
            }
        }
        lashings.extend(
            legs.iter()
                .filter_map(ScaffoldLashing::splice)
                .map(|splice| Lashing::new(LashingGeometry::Scaffold(splice))),
        );
        self.legs = legs;
        self.lashings = lashings;
    }

    /// Drop the structure but keep helper lines
    pub fn clear_structure(&mut self) {
        self.legs.clear();
        self.lashings.clear();
    }

    pub fn set_helper_lines(&mut self, lines: Vec<HelperLine>) {
        self.helper_lines = lines;
    }

    pub fn legs(&self) -> &[Scaffold] {
        &self.legs
    }

    pub fn poles(&self) -> Vec<&Pole> {
        self.legs.iter().flat_map(|leg| leg.poles()).collect()
    }

    pub fn lashings(&self) -> &[Lashing] {
        &self.lashings
    }

    pub fn helper_lines(&self) -> &[HelperLine] {
        &self.helper_lines
    }

    pub fn collision(&self) -> &CollisionState {
        &self.collision
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    /// Re-run collisions against every committed pole. Overlaps only block
    /// when `at_confirm` is set.
    pub fn check_collisions(&mut self, inventory: &Inventory, overlap_factor: f64, at_confirm: bool) {
        let next = CollisionState::check(&self.legs, inventory.poles(), overlap_factor, at_confirm);
        if next != self.collision {
            tracing::debug!(
                flagged = next.flagged().len(),
                blocking = next.is_blocking(),
                "collision state changed"
            );
        }
        self.collision = next;
    }

    /// Hand the structure to the inventory; `Rejected` if empty or blocked
    pub fn commit(&mut self, inventory: &mut Inventory) -> ClickOutcome {
        if self.legs.is_empty() {
            return ClickOutcome::Rejected;
        }
        if self.collision.is_blocking() {
            tracing::debug!(flagged = self.collision.flagged().len(), "commit blocked by collision");
            return ClickOutcome::Rejected;
        }
        let preview = std::mem::take(self);
        let poles: Vec<Pole> = preview.legs.into_iter().flat_map(Scaffold::into_poles).collect();
        let outcome = ClickOutcome::Committed {
            poles: poles.len(),
            lashings: preview.lashings.len(),
        };
        inventory.commit(poles, preview.lashings);
        outcome
    }
}

/// Pole of `leg` that carries `point`, the main pole if none does
pub(crate) fn holder(leg: &Scaffold, point: DVec3) -> &Pole {
    leg.pole_holding(point).unwrap_or_else(|| leg.main())
}

/// Shared behavior of every placement tool
pub trait Tool {
    fn kind(&self) -> ToolKind;

    fn state(&self) -> PlacementState;

    fn on_pointer_move(&mut self, input: &PointerInput, inventory: &Inventory);

    /// Advance one step, or commit from the final state
    fn on_left_click(&mut self, input: &PointerInput, inventory: &mut Inventory) -> ClickOutcome;

    /// Revert one step
    fn on_right_click(&mut self, inventory: &Inventory);

    fn on_key(&mut self, key: Key, inventory: &Inventory);

    /// Drop all in-progress state and return to idle
    fn deactivate(&mut self);

    fn preview(&self) -> &Preview;

    fn preview_poles(&self) -> Vec<&Pole> {
        self.preview().poles()
    }

    fn preview_lashings(&self) -> &[Lashing] {
        self.preview().lashings()
    }

    fn helper_lines(&self) -> &[HelperLine] {
        self.preview().helper_lines()
    }

    /// Committed poles the preview currently overlaps
    fn colliding_poles(&self) -> &[PoleId] {
        self.preview().collision().flagged()
    }

    fn is_blocked(&self) -> bool {
        self.preview().collision().is_blocking()
    }
}

pub fn create_tool(kind: ToolKind, settings: Arc<EditorSettings>) -> Box<dyn Tool> {
    match kind {
        ToolKind::Bipod => Box::new(BipodTool::new(settings)),
        ToolKind::Tripod => Box::new(TripodTool::new(settings)),
        ToolKind::Polypedestra => Box::new(PolypedestraTool::new(settings)),
        ToolKind::Pole => Box::new(PoleTool::new(settings)),
    }
}
