use std::sync::Arc;

use glam::DVec3;

use super::{
    bipod_targets, holder, ClickOutcome, HelperLine, Key, PlacementState, PointerInput, Preview, Tool,
    ToolKind,
};
use crate::geometry::UP;
use crate::lashing::{Lashing, LashingGeometry, TripodLashing};
use crate::model::{leg, PoleCatalog};
use crate::solver::{solve_third_leg, FixedLeg, SolveOutcome, TripodProblem};
use crate::state::{EditorSettings, Inventory};

/// Three legs bound above the centroid of their feet.
///
/// Legs 1 and 2 are placed like a bipod. Leg 3 is solved so it rests
/// against both of them.
pub struct TripodTool {
    settings: Arc<EditorSettings>,
    catalog: Arc<PoleCatalog>,
    state: PlacementState,
    grounds: Vec<DVec3>,
    lash_height: f64,
    /// Last converged leg 3 direction, used to warm-start the solver
    warm_start: Option<DVec3>,
    last_solve: Option<SolveOutcome>,
    input: PointerInput,
    preview: Preview,
}

fn distinct(points: &[DVec3]) -> bool {
    points
        .iter()
        .enumerate()
        .all(|(i, a)| points[i + 1..].iter().all(|b| a.distance(*b) > 1e-6))
}

impl TripodTool {
    pub fn new(settings: Arc<EditorSettings>) -> Self {
        let catalog = Arc::new(settings.catalog.clone());
        let lash_height = settings.placement.default_lash_height;
        Self {
            settings,
            catalog,
            state: PlacementState::Idle,
            grounds: Vec::new(),
            lash_height,
            warm_start: None,
            last_solve: None,
            input: PointerInput::default(),
            preview: Preview::default(),
        }
    }

    pub fn lash_height(&self) -> f64 {
        self.lash_height
    }

    /// Outcome of the most recent leg 3 solve
    pub fn last_solve(&self) -> Option<&SolveOutcome> {
        self.last_solve.as_ref()
    }

    fn build(&mut self, g1: DVec3, g2: DVec3, g3: DVec3) {
        if !distinct(&[g1, g2, g3]) {
            self.preview.clear_structure();
            return;
        }
        let radius = self.catalog.radius;
        let centroid = (g1 + g2 + g3) / 3.0;
        let lash = DVec3::new(centroid.x, self.lash_height, centroid.z);
        let [t1, t2] = bipod_targets(g1, g2, lash, radius);

        let fixed = |ground: DVec3, target: DVec3| FixedLeg {
            point: ground,
            direction: (target - ground).normalize(),
            radius,
        };
        let problem = TripodProblem {
            legs: [fixed(g1, t1), fixed(g2, t2)],
            ground: g3,
            radius,
        };
        let initial = self
            .warm_start
            .unwrap_or_else(|| (lash - g3).try_normalize().unwrap_or(UP));
        let outcome = solve_third_leg(&problem, initial, &self.settings.solver);
        self.warm_start = outcome.converged.then_some(outcome.direction);
        self.last_solve = Some(outcome);

        let t3 = g3 + outcome.direction * lash.distance(g3);
        let legs = vec![
            leg(&self.catalog, g1, t1),
            leg(&self.catalog, g2, t2),
            leg(&self.catalog, g3, t3),
        ];
        let tripod = TripodLashing::between([
            holder(&legs[0], t1),
            holder(&legs[1], t2),
            holder(&legs[2], t3),
        ]);
        self.preview.set(legs, vec![Lashing::new(LashingGeometry::Tripod(tripod))]);
        self.preview
            .set_helper_lines(vec![HelperLine::new(DVec3::new(centroid.x, 0.0, centroid.z), lash)]);
    }

    fn refresh(&mut self, inventory: &Inventory) {
        let min_height = self.settings.placement.min_lash_height;
        match self.state {
            PlacementState::Idle => self.preview.clear(),
            PlacementState::Leg1Placed => {
                self.preview.clear_structure();
                let lines = match self.input.ground {
                    Some(cursor) => vec![HelperLine::new(self.grounds[0], cursor)],
                    None => Vec::new(),
                };
                self.preview.set_helper_lines(lines);
            }
            PlacementState::Leg2Placed => match self.input.ground {
                Some(cursor) => self.build(self.grounds[0], self.grounds[1], cursor),
                None => self.preview.clear_structure(),
            },
            PlacementState::Leg3Placed => {
                let centroid = (self.grounds[0] + self.grounds[1] + self.grounds[2]) / 3.0;
                if let Some(height) = self.input.height_above(centroid, min_height) {
                    self.lash_height = height;
                }
                self.build(self.grounds[0], self.grounds[1], self.grounds[2]);
            }
            PlacementState::LashPositionPlaced => {
                self.build(self.grounds[0], self.grounds[1], self.grounds[2]);
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
        self.warm_start = None;
        self.last_solve = None;
        self.preview.clear();
    }

    /// Accept `ground` as the next foot if it does not coincide with another
    fn push_ground(&mut self, ground: Option<DVec3>) -> bool {
        match ground {
            Some(ground) if self.grounds.iter().all(|g| g.distance(ground) > 1e-6) => {
                self.grounds.push(ground);
                true
            }
            _ => false,
        }
    }
}

impl Tool for TripodTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Tripod
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
        let state = self.state;
        self.state = match state {
            PlacementState::Idle if self.push_ground(input.ground) => PlacementState::Leg1Placed,
            PlacementState::Leg1Placed if self.push_ground(input.ground) => PlacementState::Leg2Placed,
            PlacementState::Leg2Placed if self.push_ground(input.ground) => PlacementState::Leg3Placed,
            PlacementState::Leg3Placed if !self.preview.is_empty() => PlacementState::LashPositionPlaced,
            PlacementState::LashPositionPlaced => {
                let outcome = self.preview.commit(inventory);
                if matches!(outcome, ClickOutcome::Committed { .. }) {
                    self.reset();
                }
                return outcome;
            }
            _ => return ClickOutcome::Rejected,
        };
        self.refresh(inventory);
        ClickOutcome::Advanced(self.state)
    }

    fn on_right_click(&mut self, inventory: &Inventory) {
        self.state = match self.state {
            PlacementState::Idle => return,
            PlacementState::Leg1Placed => {
                self.reset();
                return;
            }
            PlacementState::Leg2Placed => PlacementState::Leg1Placed,
            PlacementState::Leg3Placed => PlacementState::Leg2Placed,
            PlacementState::LashPositionPlaced => PlacementState::Leg3Placed,
        };
        if self.state != PlacementState::Leg3Placed {
            self.grounds.pop();
            self.warm_start = None;
            self.last_solve = None;
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
    use crate::geometry::{distance_between_infinite_lines, Ray};

    fn place_feet(tool: &mut TripodTool, inventory: &mut Inventory) {
        for ground in [DVec3::ZERO, DVec3::X, DVec3::new(0.5, 0.0, 2.0)] {
            tool.on_left_click(&PointerInput::at_ground(ground), inventory);
        }
    }

    #[test]
    fn test_third_leg_rests_on_both_others() {
        let mut tool = TripodTool::new(Arc::new(EditorSettings::default()));
        let mut inventory = Inventory::new();
        place_feet(&mut tool, &mut inventory);
        assert_eq!(tool.state(), PlacementState::Leg3Placed);

        let centroid_x = 0.5;
        let ray = Ray::new(DVec3::new(centroid_x, 3.0, 10.0), -DVec3::Z);
        tool.on_pointer_move(&PointerInput::default().with_ray(ray), &inventory);
        assert!((tool.lash_height() - 3.0).abs() < 1e-9);

        let outcome = tool.last_solve().unwrap();
        assert!(outcome.converged);
        let legs = tool.preview().legs();
        assert_eq!(legs.len(), 3);
        let g3 = DVec3::new(0.5, 0.0, 2.0);
        for fixed in &legs[..2] {
            let distance =
                distance_between_infinite_lines(fixed.bottom(), fixed.direction(), g3, outcome.direction);
            assert!((distance - 0.12).abs() < 1e-3, "distance {distance}");
        }
        assert_eq!(tool.preview_lashings().len(), 1);
    }

    #[test]
    fn test_commit_and_undo() {
        let mut tool = TripodTool::new(Arc::new(EditorSettings::default()));
        let mut inventory = Inventory::new();
        place_feet(&mut tool, &mut inventory);
        assert_eq!(
            tool.on_left_click(&PointerInput::default(), &mut inventory),
            ClickOutcome::Advanced(PlacementState::LashPositionPlaced)
        );
        assert_eq!(
            tool.on_left_click(&PointerInput::default(), &mut inventory),
            ClickOutcome::Committed { poles: 3, lashings: 1 }
        );
        inventory.undo();
        assert!(inventory.is_empty());
    }

    #[test]
    fn test_right_click_from_confirm_keeps_feet() {
        let mut tool = TripodTool::new(Arc::new(EditorSettings::default()));
        let mut inventory = Inventory::new();
        place_feet(&mut tool, &mut inventory);
        tool.on_left_click(&PointerInput::default(), &mut inventory);
        tool.on_right_click(&inventory);
        assert_eq!(tool.state(), PlacementState::Leg3Placed);
        assert_eq!(tool.preview().legs().len(), 3);

        tool.on_right_click(&inventory);
        assert_eq!(tool.state(), PlacementState::Leg2Placed);
    }

    #[test]
    fn test_right_click_from_third_foot_pops_it() {
        let mut tool = TripodTool::new(Arc::new(EditorSettings::default()));
        let mut inventory = Inventory::new();
        place_feet(&mut tool, &mut inventory);
        assert!(tool.warm_start.is_some());

        // cursor off the ground so the revert does not immediately re-solve
        tool.on_pointer_move(&PointerInput::default(), &inventory);
        tool.on_right_click(&inventory);
        assert_eq!(tool.state(), PlacementState::Leg2Placed);
        assert_eq!(tool.grounds, vec![DVec3::ZERO, DVec3::X]);
        assert!(tool.warm_start.is_none());
        assert!(tool.last_solve().is_none());
        assert!(tool.preview().legs().is_empty());

        let moved = DVec3::new(0.5, 0.0, -2.0);
        tool.on_left_click(&PointerInput::at_ground(moved), &mut inventory);
        assert_eq!(tool.state(), PlacementState::Leg3Placed);
        assert_eq!(tool.grounds[2], moved);
        assert!(tool.last_solve().unwrap().converged);
    }

    #[test]
    fn test_legs_do_not_intersect_each_other() {
        let settings = Arc::new(EditorSettings::default());
        let limit = 0.9 * 2.0 * settings.catalog.radius;
        let mut tool = TripodTool::new(settings);
        let mut inventory = Inventory::new();
        place_feet(&mut tool, &mut inventory);

        for height in [2.0, 3.0, 4.5] {
            let ray = Ray::new(DVec3::new(0.5, height, 10.0), -DVec3::Z);
            tool.on_pointer_move(&PointerInput::default().with_ray(ray), &inventory);
            let poles = tool.preview_poles();
            assert_eq!(poles.len(), 3);
            for (i, a) in poles.iter().enumerate() {
                for b in &poles[i + 1..] {
                    let distance = a.distance_to(b);
                    assert!(distance >= limit, "height {height}: {distance}");
                }
            }
        }
    }

    #[test]
    fn test_distinct() {
        assert!(distinct(&[DVec3::ZERO, DVec3::X, DVec3::Z]));
        assert!(!distinct(&[DVec3::ZERO, DVec3::X, DVec3::ZERO]));
    }
}
