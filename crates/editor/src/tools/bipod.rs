use std::sync::Arc;

use glam::DVec3;

use super::{holder, ClickOutcome, HelperLine, Key, PlacementState, PointerInput, Preview, Tool, ToolKind};
use crate::geometry::lateral_axis;
use crate::lashing::{BipodLashing, Lashing, LashingGeometry};
use crate::model::{leg, PoleCatalog, Scaffold};
use crate::state::{EditorSettings, Inventory};

/// Where two legs from `g1` and `g2` should pass the lash point so they
/// rest against each other: `lash ± n * radius`, with `n` the normal of the
/// plane through both ground points and the lash point.
pub fn bipod_targets(g1: DVec3, g2: DVec3, lash: DVec3, radius: f64) -> [DVec3; 2] {
    let normal = (lash - g1)
        .cross(lash - g2)
        .try_normalize()
        .unwrap_or_else(|| lateral_axis(g2 - g1));
    [lash + normal * radius, lash - normal * radius]
}

/// Two legs crossed at a lash point above the middle of their feet
pub struct BipodTool {
    settings: Arc<EditorSettings>,
    catalog: Arc<PoleCatalog>,
    state: PlacementState,
    grounds: Vec<DVec3>,
    lash_height: f64,
    targets: Option<[DVec3; 2]>,
    input: PointerInput,
    preview: Preview,
}

impl BipodTool {
    pub fn new(settings: Arc<EditorSettings>) -> Self {
        let catalog = Arc::new(settings.catalog.clone());
        let lash_height = settings.placement.default_lash_height;
        Self {
            settings,
            catalog,
            state: PlacementState::Idle,
            grounds: Vec::new(),
            lash_height,
            targets: None,
            input: PointerInput::default(),
            preview: Preview::default(),
        }
    }

    /// Points the two legs are aimed through, once both feet are known
    pub fn leg_targets(&self) -> Option<[DVec3; 2]> {
        self.targets
    }

    pub fn lash_height(&self) -> f64 {
        self.lash_height
    }

    fn build(&mut self, g1: DVec3, g2: DVec3) {
        if g1.distance(g2) < 1e-6 {
            self.targets = None;
            self.preview.clear_structure();
            return;
        }
        let middle = (g1 + g2) * 0.5;
        let lash = DVec3::new(middle.x, self.lash_height, middle.z);
        let [t1, t2] = bipod_targets(g1, g2, lash, self.catalog.radius);
        let legs = vec![leg(&self.catalog, g1, t1), leg(&self.catalog, g2, t2)];
        let bipod = BipodLashing::between(holder(&legs[0], t1), holder(&legs[1], t2));
        self.targets = Some([t1, t2]);
        self.preview.set(legs, vec![Lashing::new(LashingGeometry::Bipod(bipod))]);
        self.preview
            .set_helper_lines(vec![HelperLine::new(DVec3::new(middle.x, 0.0, middle.z), lash)]);
    }

    /// Re-derive everything from the placed points and the last input
    fn refresh(&mut self, inventory: &Inventory) {
        let min_height = self.settings.placement.min_lash_height;
        match self.state {
            PlacementState::Idle => {
                self.targets = None;
                self.preview.clear();
            }
            PlacementState::Leg1Placed => {
                let g1 = self.grounds[0];
                match self.input.ground {
                    Some(cursor) => {
                        self.build(g1, cursor);
                        self.preview.set_helper_lines(vec![HelperLine::new(g1, cursor)]);
                    }
                    None => self.preview.clear_structure(),
                }
            }
            PlacementState::Leg2Placed => {
                let middle = (self.grounds[0] + self.grounds[1]) * 0.5;
                if let Some(height) = self.input.height_above(middle, min_height) {
                    self.lash_height = height;
                }
                self.build(self.grounds[0], self.grounds[1]);
            }
            PlacementState::Leg3Placed | PlacementState::LashPositionPlaced => {
                self.build(self.grounds[0], self.grounds[1]);
            }
        }
        let at_confirm = self.state == PlacementState::LashPositionPlaced;
        let factor = self.settings.placement.overlap_factor;
        self.preview.check_collisions(inventory, factor, at_confirm);
    }

    fn reset(&mut self) {
        self.state = PlacementState::Idle;
        self.grounds.clear();
        self.lash_height = self.settings.placement.default_lash_height;
        self.targets = None;
        self.preview.clear();
    }

    /// Legs as currently previewed
    pub fn legs(&self) -> &[Scaffold] {
        self.preview.legs()
    }
}

impl Tool for BipodTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Bipod
    }

    fn state(&self) -> PlacementState {
        self.state
    }

    fn on_pointer_move(&mut self, input: &PointerInput, inventory: &Inventory) {
        self.input = input.clone();
        self.refresh(inventory);
    }

    fn on_left_click(&mut self, input: &PointerInput, inventory: &mut Inventory) -> ClickOutcome {
        self.input = input.clone();
        self.refresh(inventory);
        match self.state {
            PlacementState::Idle => {
                let Some(ground) = input.ground else {
                    return ClickOutcome::Rejected;
                };
                self.grounds = vec![ground];
                self.state = PlacementState::Leg1Placed;
            }
            PlacementState::Leg1Placed => {
                match input.ground {
                    Some(ground) if ground.distance(self.grounds[0]) > 1e-6 => self.grounds.push(ground),
                    _ => return ClickOutcome::Rejected,
                }
                self.state = PlacementState::Leg2Placed;
            }
            PlacementState::Leg2Placed => {
                if self.preview.is_empty() {
                    return ClickOutcome::Rejected;
                }
                self.state = PlacementState::LashPositionPlaced;
            }
            PlacementState::Leg3Placed | PlacementState::LashPositionPlaced => {
                let outcome = self.preview.commit(inventory);
                if matches!(outcome, ClickOutcome::Committed { .. }) {
                    self.reset();
                }
                return outcome;
            }
        }
        self.refresh(inventory);
        ClickOutcome::Advanced(self.state)
    }

    fn on_right_click(&mut self, inventory: &Inventory) {
        match self.state {
            PlacementState::Idle => return,
            PlacementState::Leg1Placed => {
                self.reset();
                return;
            }
            PlacementState::Leg2Placed => {
                self.grounds.truncate(1);
                self.state = PlacementState::Leg1Placed;
            }
            PlacementState::Leg3Placed | PlacementState::LashPositionPlaced => {
                self.state = PlacementState::Leg2Placed;
            }
        }
        self.refresh(inventory);
    }

    fn on_key(&mut self, key: Key, _inventory: &Inventory) {
        if key == Key::Escape {
            self.deactivate();
        }
    }

    fn deactivate(&mut self) {
        self.reset();
        self.input = PointerInput::default();
    }

    fn preview(&self) -> &Preview {
        &self.preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Ray;

    fn tool() -> BipodTool {
        BipodTool::new(Arc::new(EditorSettings::default()))
    }

    fn height_ray(x: f64, height: f64) -> Ray {
        Ray::new(DVec3::new(x, height, 10.0), -DVec3::Z)
    }

    #[test]
    fn test_targets_offset_along_plane_normal() {
        let [t1, t2] = bipod_targets(DVec3::ZERO, DVec3::X, DVec3::new(0.5, 3.0, 0.0), 0.06);
        assert!(t1.abs_diff_eq(DVec3::new(0.5, 3.0, 0.06), 1e-12));
        assert!(t2.abs_diff_eq(DVec3::new(0.5, 3.0, -0.06), 1e-12));
    }

    #[test]
    fn test_targets_with_lash_on_ground_line_use_lateral_axis() {
        let [t1, t2] = bipod_targets(DVec3::ZERO, DVec3::X, DVec3::new(0.5, 0.0, 0.0), 0.06);
        assert!(((t1 - t2).length() - 0.12).abs() < 1e-12);
        assert!((t1 - t2).dot(DVec3::X).abs() < 1e-12);
    }

    #[test]
    fn test_full_placement_commits() {
        let mut tool = tool();
        let mut inventory = Inventory::new();

        let outcome = tool.on_left_click(&PointerInput::at_ground(DVec3::ZERO), &mut inventory);
        assert_eq!(outcome, ClickOutcome::Advanced(PlacementState::Leg1Placed));
        tool.on_pointer_move(&PointerInput::at_ground(DVec3::X), &inventory);
        assert_eq!(tool.preview_poles().len(), 2);

        tool.on_left_click(&PointerInput::at_ground(DVec3::X), &mut inventory);
        tool.on_pointer_move(&PointerInput::default().with_ray(height_ray(0.5, 3.0)), &inventory);
        assert!((tool.lash_height() - 3.0).abs() < 1e-9);
        let [t1, t2] = tool.leg_targets().unwrap();
        assert!(t1.abs_diff_eq(DVec3::new(0.5, 3.0, 0.06), 1e-9));
        assert!(t2.abs_diff_eq(DVec3::new(0.5, 3.0, -0.06), 1e-9));

        let outcome = tool.on_left_click(&PointerInput::default(), &mut inventory);
        assert_eq!(outcome, ClickOutcome::Advanced(PlacementState::LashPositionPlaced));
        let outcome = tool.on_left_click(&PointerInput::default(), &mut inventory);
        assert_eq!(outcome, ClickOutcome::Committed { poles: 2, lashings: 1 });
        assert_eq!(tool.state(), PlacementState::Idle);
        assert_eq!(inventory.poles().len(), 2);
        assert_eq!(inventory.lashings().len(), 1);
    }

    #[test]
    fn test_right_click_reverts_one_step() {
        let mut tool = tool();
        let mut inventory = Inventory::new();
        tool.on_left_click(&PointerInput::at_ground(DVec3::ZERO), &mut inventory);
        tool.on_left_click(&PointerInput::at_ground(DVec3::X), &mut inventory);
        assert_eq!(tool.state(), PlacementState::Leg2Placed);

        tool.on_right_click(&inventory);
        assert_eq!(tool.state(), PlacementState::Leg1Placed);
        tool.on_right_click(&inventory);
        assert_eq!(tool.state(), PlacementState::Idle);
        assert!(tool.preview_poles().is_empty());
    }

    #[test]
    fn test_second_foot_on_first_is_rejected() {
        let mut tool = tool();
        let mut inventory = Inventory::new();
        tool.on_left_click(&PointerInput::at_ground(DVec3::ZERO), &mut inventory);
        let outcome = tool.on_left_click(&PointerInput::at_ground(DVec3::ZERO), &mut inventory);
        assert_eq!(outcome, ClickOutcome::Rejected);
        assert_eq!(tool.state(), PlacementState::Leg1Placed);
    }

    #[test]
    fn test_low_ray_clamps_to_minimum_height() {
        let mut tool = tool();
        let mut inventory = Inventory::new();
        tool.on_left_click(&PointerInput::at_ground(DVec3::ZERO), &mut inventory);
        tool.on_left_click(&PointerInput::at_ground(DVec3::X), &mut inventory);
        tool.on_pointer_move(&PointerInput::default().with_ray(height_ray(0.5, 0.05)), &inventory);
        assert_eq!(tool.lash_height(), EditorSettings::default().placement.min_lash_height);
    }
}
