//! Transform/drag operations on committed poles

use glam::DVec3;

use super::Inventory;
use crate::error::{EditorError, Result};
use crate::model::{Pole, PoleCatalog};

impl Inventory {
    /// Save undo state once at the beginning of a drag operation
    pub fn begin_drag(&mut self) {
        self.save_undo();
        self.redo_stack.clear();
        self.version += 1;
    }

    /// Move a pole by `delta` without recording undo; pair with [`Self::begin_drag`]
    pub fn apply_translate_delta(&mut self, pole_id: &str, delta: DVec3) -> Result<()> {
        self.edit_pole(pole_id, |pole| pole.translate(delta))
    }

    /// Move a pole as one undoable step
    pub fn translate_pole(&mut self, pole_id: &str, delta: DVec3) -> Result<()> {
        self.ensure_pole(pole_id)?;
        self.begin_drag();
        self.apply_translate_delta(pole_id, delta)
    }

    /// Resize a pole keeping its opposite end anchored, as one undoable step
    pub fn resize_pole(
        &mut self,
        pole_id: &str,
        resize_at_top: bool,
        new_minimum_length: f64,
        catalog: &PoleCatalog,
    ) -> Result<()> {
        self.ensure_pole(pole_id)?;
        self.begin_drag();
        self.edit_pole(pole_id, |pole| pole.resize(resize_at_top, new_minimum_length, catalog))
    }

    fn ensure_pole(&self, pole_id: &str) -> Result<()> {
        match self.pole(pole_id) {
            Some(_) => Ok(()),
            None => Err(EditorError::UnknownPole(pole_id.to_string())),
        }
    }

    /// Apply `edit` to one pole, then recompute the lashings bound to it
    fn edit_pole(&mut self, pole_id: &str, edit: impl FnOnce(&mut Pole)) -> Result<()> {
        let pole = self
            .contents
            .poles
            .iter_mut()
            .find(|p| p.id() == pole_id)
            .ok_or_else(|| EditorError::UnknownPole(pole_id.to_string()))?;
        edit(pole);

        let poles = &self.contents.poles;
        for lashing in self.contents.lashings.iter_mut().filter(|l| l.references(pole_id)) {
            lashing.recompute(poles);
        }
        self.version += 1;
        tracing::debug!(pole = pole_id, "pole edited");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lashing::{Lashing, LashingGeometry, SquareLashing};

    fn crossing() -> (Pole, Pole) {
        let catalog = PoleCatalog::default();
        let mut a = Pole::new(&catalog);
        a.set_direction(DVec3::X);
        a.set_length(4.0, &catalog);
        a.set_position(DVec3::new(0.0, 1.0, 0.0));
        let mut b = Pole::new(&catalog);
        b.set_direction(DVec3::Z);
        b.set_length(4.0, &catalog);
        b.set_position(DVec3::new(0.0, 1.12, 0.0));
        (a, b)
    }

    #[test]
    fn test_translate_recomputes_bound_lashings() {
        let (a, b) = crossing();
        let square = SquareLashing::place(
            DVec3::new(0.0, 1.06, 0.0),
            DVec3::Y,
            &a,
            b.id().clone(),
            b.direction(),
            b.radius(),
        )
        .unwrap();
        let b_id = b.id().clone();
        let mut inventory = Inventory::new();
        inventory.commit(vec![a, b], vec![Lashing::new(LashingGeometry::Square(square))]);

        inventory.translate_pole(&b_id, DVec3::new(1.0, 0.0, 0.0)).unwrap();
        let points = inventory.lashings()[0].contact_points();
        assert!(points[0].abs_diff_eq(DVec3::new(1.0, 1.0, 0.0), 1e-9));
        assert!(points[1].abs_diff_eq(DVec3::new(1.0, 1.12, 0.0), 1e-9));

        inventory.undo();
        let points = inventory.lashings()[0].contact_points();
        assert!(points[0].abs_diff_eq(DVec3::new(0.0, 1.0, 0.0), 1e-9));
    }

    #[test]
    fn test_resize_keeps_bottom() {
        let catalog = PoleCatalog::default();
        let pole = Pole::new(&catalog);
        let id = pole.id().clone();
        let mut inventory = Inventory::new();
        inventory.add_poles(vec![pole]);

        inventory.resize_pole(&id, true, 2.2, &catalog).unwrap();
        let pole = inventory.pole(&id).unwrap();
        assert_eq!(pole.length(), 2.5);
        assert!(pole.bottom().abs_diff_eq(DVec3::ZERO, 1e-12));
    }

    #[test]
    fn test_unknown_pole_is_an_error_and_records_nothing() {
        let mut inventory = Inventory::new();
        let err = inventory.translate_pole("ghost", DVec3::X).unwrap_err();
        assert!(matches!(err, EditorError::UnknownPole(id) if id == "ghost"));
        assert!(!inventory.can_undo());
    }
}
