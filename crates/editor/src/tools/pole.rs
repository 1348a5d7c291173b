use std::sync::Arc;

use glam::DVec3;

use super::{ClickOutcome, HelperLine, Key, PlacementState, PointerInput, PoleHit, Preview, Tool, ToolKind};
use crate::geometry::UP;
use crate::lashing::{Lashing, LashingGeometry, SquareLashing};
use crate::model::{PoleCatalog, Scaffold};
use crate::state::{EditorSettings, Inventory};

/// Where the pole starts
#[derive(Debug, Clone, PartialEq)]
enum Start {
    Ground(DVec3),
    /// Square-lashed onto a committed pole
    Pole(PoleHit),
}

impl Start {
    fn pole_id(&self) -> Option<&str> {
        match self {
            Start::Ground(_) => None,
            Start::Pole(hit) => Some(hit.pole_id.as_str()),
        }
    }
}

/// Where the pole ends
#[derive(Debug, Clone, PartialEq)]
enum End {
    Point(DVec3),
    Pole(PoleHit),
}

impl End {
    fn point(&self) -> DVec3 {
        match self {
            End::Point(p) => *p,
            End::Pole(hit) => hit.point,
        }
    }
}

/// A single pole (or scaffold) standing on the ground or spanning between
/// committed poles with square lashings
pub struct PoleTool {
    settings: Arc<EditorSettings>,
    catalog: Arc<PoleCatalog>,
    state: PlacementState,
    start: Option<Start>,
    end: Option<End>,
    height: f64,
    /// Kept across frames so its pole ids stay stable
    scaffold: Scaffold,
    input: PointerInput,
    preview: Preview,
}

impl PoleTool {
    pub fn new(settings: Arc<EditorSettings>) -> Self {
        let catalog = Arc::new(settings.catalog.clone());
        let height = settings.placement.default_lash_height;
        Self {
            scaffold: Scaffold::new(Arc::clone(&catalog)),
            settings,
            catalog,
            state: PlacementState::Idle,
            start: None,
            end: None,
            height,
            input: PointerInput::default(),
            preview: Preview::default(),
        }
    }

    /// End the pole would take for the current input
    fn resolve_end(&mut self, start: &Start) -> Option<End> {
        if let Some(hit) = &self.input.hover {
            if start.pole_id() != Some(hit.pole_id.as_str()) {
                return Some(End::Pole(hit.clone()));
            }
        }
        match start {
            Start::Ground(ground) => {
                if let Some(height) = self.input.height_above(*ground, self.settings.placement.min_lash_height) {
                    self.height = height;
                }
                Some(End::Point(*ground + UP * self.height))
            }
            Start::Pole(hit) => self
                .input
                .ground
                .map(|p| End::Point(DVec3::new(p.x, hit.point.y, p.z))),
        }
    }

    /// Square lashing of the new pole onto `hit`, snapped to the nearest
    /// committed lashing height within tolerance
    fn square_onto(&self, hit: &PoleHit, direction: DVec3, inventory: &Inventory) -> Option<SquareLashing> {
        let fixed = inventory.pole(&hit.pole_id)?;
        let mut square = SquareLashing::place(
            hit.point,
            hit.normal,
            fixed,
            self.scaffold.main().id().clone(),
            direction,
            self.catalog.radius,
        )?;
        let y = square.loose_center.y;
        let nearest = inventory
            .lashing_heights()
            .into_iter()
            .min_by(|a, b| (a - y).abs().total_cmp(&(b - y).abs()));
        if let Some(height) = nearest {
            if square.snap_loose_pole(height, fixed.direction(), self.settings.placement.snap_tolerance) {
                tracing::debug!(height, "square lashing snapped to existing height");
            }
        }
        Some(square)
    }

    fn build(&mut self, start: &Start, end: &End, inventory: &Inventory) -> Option<(Scaffold, Vec<Lashing>)> {
        let mut scaffold = self.scaffold.clone();
        let mut squares = Vec::new();
        match start {
            Start::Ground(ground) => {
                let mut top = end.point();
                if let End::Pole(hit) = end {
                    // Re-place once along the leg aimed at the first center.
                    let mut square = self.square_onto(hit, top - *ground, inventory)?;
                    if square.loose_center.distance(*ground) > 1e-6 {
                        square = self.square_onto(hit, square.loose_center - *ground, inventory)?;
                    }
                    top = square.loose_center;
                    squares.push(square);
                }
                if top.distance(*ground) < 1e-6 {
                    return None;
                }
                scaffold.set_position_between_ground_and_pole(*ground, top);
            }
            Start::Pole(start_hit) => {
                let mut direction = end.point() - start_hit.point;
                let mut centers = None;
                // Second pass refines the direction from the first pass centers.
                for _ in 0..2 {
                    if direction.length_squared() < 1e-12 {
                        return None;
                    }
                    let first = self.square_onto(start_hit, direction, inventory)?;
                    let (second, end_center) = match end {
                        End::Point(p) => (None, DVec3::new(p.x, first.loose_center.y, p.z)),
                        End::Pole(hit) => {
                            let square = self.square_onto(hit, direction, inventory)?;
                            let center = square.loose_center;
                            (Some(square), center)
                        }
                    };
                    direction = end_center - first.loose_center;
                    centers = Some((first, second, end_center));
                }
                let (first, second, end_center) = centers?;
                if end_center.distance(first.loose_center) < 1e-6 {
                    return None;
                }
                scaffold.set_position_between_two_poles(first.loose_center, end_center);
                squares.push(first);
                squares.extend(second);
            }
        }
        self.scaffold = scaffold.clone();
        let lashings = squares
            .into_iter()
            .map(|square| Lashing::new(LashingGeometry::Square(square)))
            .collect();
        Some((scaffold, lashings))
    }

    fn refresh(&mut self, inventory: &Inventory) {
        let Some(start) = self.start.clone() else {
            self.preview.clear();
            return;
        };
        let end = match self.state {
            PlacementState::LashPositionPlaced => self.end.clone(),
            _ => self.resolve_end(&start),
        };
        let built = end.as_ref().and_then(|end| self.build(&start, end, inventory));
        match built {
            Some((scaffold, lashings)) => {
                let line = HelperLine::new(scaffold.bottom(), scaffold.center());
                self.preview.set(vec![scaffold], lashings);
                self.preview.set_helper_lines(vec![line]);
            }
            None => {
                self.preview.clear_structure();
                self.preview.set_helper_lines(Vec::new());
            }
        }
        if self.state == PlacementState::Leg1Placed {
            self.end = end;
        }
        let at_confirm = self.state == PlacementState::LashPositionPlaced;
        let factor = self.settings.placement.overlap_factor;
        self.preview.check_collisions(inventory, factor, at_confirm);
    }

    fn reset(&mut self) {
        self.state = PlacementState::Idle;
        self.start = None;
        self.end = None;
        self.height = self.settings.placement.default_lash_height;
        self.scaffold = Scaffold::new(Arc::clone(&self.catalog));
        self.preview.clear();
    }

    /// The pole being placed
    pub fn scaffold(&self) -> Option<&Scaffold> {
        self.preview.legs().first()
    }
}

impl Tool for PoleTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pole
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
                let start = match (&input.hover, input.ground) {
                    (Some(hit), _) if inventory.pole(&hit.pole_id).is_some() => Start::Pole(hit.clone()),
                    (None, Some(ground)) => Start::Ground(ground),
                    _ => return ClickOutcome::Rejected,
                };
                self.start = Some(start);
                self.state = PlacementState::Leg1Placed;
            }
            PlacementState::Leg1Placed => {
                if self.preview.is_empty() || self.end.is_none() {
                    return ClickOutcome::Rejected;
                }
                self.state = PlacementState::LashPositionPlaced;
            }
            _ => {
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
            _ => {
                self.end = None;
                self.state = PlacementState::Leg1Placed;
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
