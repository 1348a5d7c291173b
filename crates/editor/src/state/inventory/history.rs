//! Undo/redo functionality

use super::Inventory;

impl Inventory {
    /// Undo last change
    pub fn undo(&mut self) {
        if let Some(prev) = self.undo_stack.pop() {
            self.redo_stack.push(std::mem::replace(&mut self.contents, prev));
            self.version += 1;
            tracing::info!(version = self.version, "undo");
        }
    }

    /// Redo last undone change
    pub fn redo(&mut self) {
        if let Some(next) = self.redo_stack.pop() {
            self.undo_stack.push(std::mem::replace(&mut self.contents, next));
            self.version += 1;
            tracing::info!(version = self.version, "redo");
        }
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Pole, PoleCatalog};
    use crate::state::Inventory;

    #[test]
    fn test_undo_stack_is_bounded() {
        let catalog = PoleCatalog::default();
        let mut inventory = Inventory::new();
        for _ in 0..120 {
            inventory.add_poles(vec![Pole::new(&catalog)]);
        }
        let mut undone = 0;
        while inventory.can_undo() {
            inventory.undo();
            undone += 1;
        }
        assert_eq!(undone, 100);
        assert_eq!(inventory.poles().len(), 20);
    }

    #[test]
    fn test_new_mutation_clears_redo() {
        let catalog = PoleCatalog::default();
        let mut inventory = Inventory::new();
        inventory.add_poles(vec![Pole::new(&catalog)]);
        inventory.undo();
        assert!(inventory.can_redo());
        inventory.add_poles(vec![Pole::new(&catalog)]);
        assert!(!inventory.can_redo());
    }

    #[test]
    fn test_version_is_monotonic() {
        let catalog = PoleCatalog::default();
        let mut inventory = Inventory::new();
        inventory.add_poles(vec![Pole::new(&catalog)]);
        let v1 = inventory.version();
        inventory.undo();
        let v2 = inventory.version();
        inventory.redo();
        assert!(v1 < v2 && v2 < inventory.version());
    }
}
