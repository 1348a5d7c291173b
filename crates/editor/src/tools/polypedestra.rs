use std::f64::consts::{PI, TAU};
use std::sync::Arc;

use glam::DVec3;

use super::{holder, ClickOutcome, HelperLine, Key, PlacementState, PointerInput, Preview, Tool, ToolKind};
use crate::lashing::{Lashing, LashingGeometry, PolypedestraLashing};
use crate::model::{leg, Pole, PoleCatalog};
use crate::state::{EditorSettings, Inventory};

/// Feet on a circle around a centre, each leg leaning sideways past the
/// axis so that neighbours touch at the lash height without crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct RingLayout {
    pub lash: DVec3,
    pub grounds: Vec<DVec3>,
    /// Where each leg passes the lash height, on the circle of closest
    /// approach to the axis
    pub targets: Vec<DVec3>,
}

/// Lay out `legs` feet evenly on the circle through `ring_point` around
/// `centre`, starting at `ring_point`.
///
/// Every leg is the same line turned about the vertical axis through the
/// centre, so the legs are skew and never intersect. The throat radius is
/// chosen so neighbouring centerlines are exactly one pole diameter apart,
/// with the midpoint of each leg's two neighbour contacts at the lash
/// height. `None` if the circle is degenerate or too small for the legs.
pub fn ring_layout(
    centre: DVec3,
    ring_point: DVec3,
    legs: usize,
    lash_height: f64,
    radius: f64,
) -> Option<RingLayout> {
    let offset = DVec3::new(ring_point.x - centre.x, 0.0, ring_point.z - centre.z);
    let ring_radius = offset.length();
    if ring_radius < 1e-6 || legs < 2 || lash_height <= 0.0 {
        return None;
    }
    let (sin, cos) = (PI / legs as f64).sin_cos();
    let throat = radius
        * ((lash_height.powi(2) + (cos * ring_radius).powi(2))
            / ((sin * lash_height).powi(2) + (radius * cos).powi(2)))
        .sqrt();
    if throat >= ring_radius {
        return None;
    }
    let twist = (throat / ring_radius).acos();
    let phase = offset.z.atan2(offset.x);
    let lash = DVec3::new(centre.x, lash_height, centre.z);
    let outward = |angle: f64| DVec3::new(angle.cos(), 0.0, angle.sin());

    let (grounds, targets): (Vec<DVec3>, Vec<DVec3>) = (0..legs)
        .map(|i| {
            let angle = phase + TAU * i as f64 / legs as f64;
            (
                centre + outward(angle) * ring_radius,
                lash + outward(angle + twist) * throat,
            )
        })
        .unzip();
    Some(RingLayout { lash, grounds, targets })
}

/// N legs standing in a ring, lashed where neighbours touch
pub struct PolypedestraTool {
    settings: Arc<EditorSettings>,
    catalog: Arc<PoleCatalog>,
    state: PlacementState,
    legs: usize,
    centre: Option<DVec3>,
    ring_point: Option<DVec3>,
    lash_height: f64,
    layout: Option<RingLayout>,
    input: PointerInput,
    preview: Preview,
}

impl PolypedestraTool {
    pub fn new(settings: Arc<EditorSettings>) -> Self {
        let catalog = Arc::new(settings.catalog.clone());
        let placement = &settings.placement;
        let legs = placement.clamp_legs(placement.polypedestra_legs);
        let lash_height = placement.default_lash_height;
        Self {
            settings,
            catalog,
            state: PlacementState::Idle,
            legs,
            centre: None,
            ring_point: None,
            lash_height,
            layout: None,
            input: PointerInput::default(),
            preview: Preview::default(),
        }
    }

    pub fn leg_count(&self) -> usize {
        self.legs
    }

    pub fn lash_height(&self) -> f64 {
        self.lash_height
    }

    pub fn layout(&self) -> Option<&RingLayout> {
        self.layout.as_ref()
    }

    fn build(&mut self, centre: DVec3, ring_point: DVec3) {
        let Some(layout) = ring_layout(centre, ring_point, self.legs, self.lash_height, self.catalog.radius)
        else {
            self.layout = None;
            self.preview.clear_structure();
            return;
        };
        let legs: Vec<_> = layout
            .grounds
            .iter()
            .zip(&layout.targets)
            .map(|(&ground, &target)| leg(&self.catalog, ground, target))
            .collect();
        let holders: Vec<&Pole> = legs
            .iter()
            .zip(&layout.targets)
            .map(|(scaffold, &target)| holder(scaffold, target))
            .collect();
        let ring = PolypedestraLashing::around(&holders);
        let lines = vec![
            HelperLine::new(centre, ring_point),
            HelperLine::new(DVec3::new(centre.x, 0.0, centre.z), layout.lash),
        ];
        self.layout = Some(layout);
        self.preview.set(legs, vec![Lashing::new(LashingGeometry::Polypedestra(ring))]);
        self.preview.set_helper_lines(lines);
    }

    fn refresh(&mut self, inventory: &Inventory) {
        let min_height = self.settings.placement.min_lash_height;
        match (self.state, self.centre) {
            (PlacementState::Idle, _) | (_, None) => {
                self.layout = None;
                self.preview.clear();
            }
            (PlacementState::Leg1Placed, Some(centre)) => match self.input.ground {
                Some(cursor) => self.build(centre, cursor),
                None => self.preview.clear_structure(),
            },
            (PlacementState::Leg2Placed, Some(centre)) => {
                if let Some(height) = self.input.height_above(centre, min_height) {
                    self.lash_height = height;
                }
                if let Some(ring_point) = self.ring_point {
                    self.build(centre, ring_point);
                }
            }
            (PlacementState::Leg3Placed | PlacementState::LashPositionPlaced, Some(centre)) => {
                if let Some(ring_point) = self.ring_point {
                    self.build(centre, ring_point);
                }
            }
        }
        let at_confirm = self.state == PlacementState::LashPositionPlaced;
        let factor = self.settings.placement.overlap_factor;
        self.preview.check_collisions(inventory, factor, at_confirm);
    }

    fn reset(&mut self) {
        self.state = PlacementState::Idle;
        self.centre = None;
        self.ring_point = None;
        self.layout = None;
        self.lash_height = self.settings.placement.default_lash_height;
        self.preview.clear();
    }
}

impl Tool for PolypedestraTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Polypedestra
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
                self.centre = Some(ground);
                self.state = PlacementState::Leg1Placed;
            }
            PlacementState::Leg1Placed => {
                if self.preview.is_empty() {
                    return ClickOutcome::Rejected;
                }
                self.ring_point = input.ground;
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
                self.ring_point = None;
                self.state = PlacementState::Leg1Placed;
            }
            PlacementState::Leg3Placed | PlacementState::LashPositionPlaced => {
                self.state = PlacementState::Leg2Placed;
            }
        }
        self.refresh(inventory);
    }

    /// Arrow keys change the leg count within the configured range
    fn on_key(&mut self, key: Key, inventory: &Inventory) {
        let settings = Arc::clone(&self.settings);
        let placement = &settings.placement;
        let legs = match key {
            Key::ArrowUp => placement.clamp_legs(self.legs + 1),
            Key::ArrowDown => placement.clamp_legs(self.legs.saturating_sub(1)),
            Key::Escape => {
                self.deactivate();
                return;
            }
        };
        if legs != self.legs {
            tracing::debug!(legs, "polypedestra leg count changed");
            self.legs = legs;
            self.refresh(inventory);
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
