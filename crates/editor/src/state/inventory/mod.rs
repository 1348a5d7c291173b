//! Committed poles and lashings
//!
//! The inventory is the only place placed structures live once a tool
//! commits them. Every mutation snapshots the previous contents for
//! undo/redo.

mod history;
mod persistence;
mod transform_ops;

pub use persistence::LoadReport;

use shared::PoleId;

use crate::lashing::Lashing;
use crate::model::Pole;

/// Snapshot of everything committed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Contents {
    pub poles: Vec<Pole>,
    pub lashings: Vec<Lashing>,
}

/// What a removal took away
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Removed {
    pub poles: usize,
    pub lashings: usize,
}

/// Committed structures with undo/redo history
#[derive(Debug, Default)]
pub struct Inventory {
    pub(crate) contents: Contents,
    /// Undo stack - previous states
    pub(crate) undo_stack: Vec<Contents>,
    /// Redo stack - undone states
    pub(crate) redo_stack: Vec<Contents>,
    /// Monotonically increasing version counter
    pub(crate) version: u64,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version (increments on every mutation)
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn poles(&self) -> &[Pole] {
        &self.contents.poles
    }

    pub fn lashings(&self) -> &[Lashing] {
        &self.contents.lashings
    }

    pub fn pole(&self, id: &str) -> Option<&Pole> {
        self.contents.poles.iter().find(|p| p.id() == id)
    }

    pub fn lashing(&self, id: &str) -> Option<&Lashing> {
        self.contents.lashings.iter().find(|l| l.id() == id)
    }

    pub fn is_empty(&self) -> bool {
        self.contents.poles.is_empty() && self.contents.lashings.is_empty()
    }

    /// Lashings that bind `pole_id`
    pub fn lashings_of<'a>(&'a self, pole_id: &'a str) -> impl Iterator<Item = &'a Lashing> + 'a {
        self.contents.lashings.iter().filter(move |l| l.references(pole_id))
    }

    /// Distinct heights of every lashing center, ascending
    pub fn lashing_heights(&self) -> Vec<f64> {
        let mut heights: Vec<f64> = self.contents.lashings.iter().map(|l| l.center().y).collect();
        heights.sort_by(f64::total_cmp);
        heights.dedup_by(|a, b| (*a - *b).abs() < 1e-9);
        heights
    }

    pub fn add_poles(&mut self, poles: Vec<Pole>) {
        self.commit(poles, Vec::new());
    }

    pub fn add_lashings(&mut self, lashings: Vec<Lashing>) {
        self.commit(Vec::new(), lashings);
    }

    /// Append poles and lashings as one undoable step
    pub fn commit(&mut self, poles: Vec<Pole>, lashings: Vec<Lashing>) {
        if poles.is_empty() && lashings.is_empty() {
            return;
        }
        self.save_undo();
        self.redo_stack.clear();
        tracing::info!(poles = poles.len(), lashings = lashings.len(), "committing to inventory");
        self.contents.poles.extend(poles);
        self.contents.lashings.extend(lashings);
        self.version += 1;
    }

    /// Remove poles and every lashing that binds any of them
    pub fn remove_poles(&mut self, ids: &[PoleId]) -> Removed {
        let hit = |id: &PoleId| ids.contains(id);
        if !self.contents.poles.iter().any(|p| hit(p.id())) {
            return Removed::default();
        }
        self.save_undo();
        self.redo_stack.clear();

        let poles_before = self.contents.poles.len();
        let lashings_before = self.contents.lashings.len();
        self.contents.poles.retain(|p| !hit(p.id()));
        self.contents
            .lashings
            .retain(|l| !l.pole_ids().into_iter().any(|id| hit(id)));
        let removed = Removed {
            poles: poles_before - self.contents.poles.len(),
            lashings: lashings_before - self.contents.lashings.len(),
        };
        tracing::info!(poles = removed.poles, lashings = removed.lashings, "removed from inventory");
        self.version += 1;
        removed
    }

    /// Flag every lashing that binds one of `ids`, e.g. while those poles
    /// are about to be removed. Returns how many are flagged.
    pub fn threaten_dependents(&mut self, ids: &[PoleId]) -> usize {
        let mut count = 0;
        for lashing in &mut self.contents.lashings {
            if ids.iter().any(|id| lashing.references(id)) {
                lashing.threaten();
                count += 1;
            }
        }
        if count > 0 {
            self.version += 1;
        }
        count
    }

    pub fn clear_threats(&mut self) {
        for lashing in &mut self.contents.lashings {
            lashing.stop_threaten();
        }
        self.version += 1;
    }

    /// Remove everything
    pub fn clear(&mut self) {
        if self.is_empty() {
            return;
        }
        self.save_undo();
        self.redo_stack.clear();
        self.contents = Contents::default();
        self.version += 1;
    }

    /// Bump version without saving undo
    pub fn notify_mutated(&mut self) {
        self.version += 1;
    }

    /// Save current state to undo stack
    pub(crate) fn save_undo(&mut self) {
        self.undo_stack.push(self.contents.clone());
        if self.undo_stack.len() > 100 {
            self.undo_stack.remove(0);
        }
    }
}
