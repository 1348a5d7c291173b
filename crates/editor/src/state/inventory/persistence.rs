//! Scene records and autosave

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use shared::SceneRecord;

use super::{Contents, Inventory};
use crate::error::Result;
use crate::lashing::Lashing;
use crate::model::{Pole, PoleCatalog};

/// Outcome of a best-effort scene load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub poles: usize,
    pub lashings: usize,
    pub skipped_poles: usize,
    pub skipped_lashings: usize,
}

impl Inventory {
    pub fn to_record(&self) -> SceneRecord {
        SceneRecord {
            poles: self.contents.poles.iter().map(Pole::to_record).collect(),
            lashings: self.contents.lashings.iter().map(Lashing::to_record).collect(),
            ..SceneRecord::default()
        }
    }

    /// Replace the contents with `record` as one undoable step.
    ///
    /// Duplicate pole ids and lashings that cannot be rebuilt (unknown
    /// participants, wrong arity) are skipped; everything else loads.
    pub fn load_record(&mut self, record: &SceneRecord, catalog: &PoleCatalog) -> LoadReport {
        let mut report = LoadReport::default();
        let mut seen = HashSet::new();
        let mut poles = Vec::with_capacity(record.poles.len());
        for pole in &record.poles {
            if !seen.insert(pole.id.as_str()) {
                tracing::warn!(pole = %pole.id, "skipping duplicate pole");
                report.skipped_poles += 1;
                continue;
            }
            poles.push(Pole::from_record(pole, catalog));
        }

        let dangling = record.dangling_lashings();
        let mut lashings = Vec::with_capacity(record.lashings.len());
        for lashing in &record.lashings {
            if dangling.iter().any(|&d| std::ptr::eq(d, lashing)) {
                tracing::warn!(lashing = %lashing.id, "skipping lashing bound to a missing pole");
                report.skipped_lashings += 1;
                continue;
            }
            match Lashing::from_record(lashing, &poles) {
                Some(lashing) => lashings.push(lashing),
                None => {
                    tracing::warn!(lashing = %lashing.id, kind = ?lashing.kind, "skipping lashing with the wrong number of poles");
                    report.skipped_lashings += 1;
                }
            }
        }
        report.poles = poles.len();
        report.lashings = lashings.len();

        self.save_undo();
        self.redo_stack.clear();
        self.contents = Contents { poles, lashings };
        self.version += 1;
        tracing::info!(
            poles = report.poles,
            lashings = report.lashings,
            skipped = report.skipped_poles + report.skipped_lashings,
            "scene loaded"
        );
        report
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    pub fn load_json(&mut self, json: &str, catalog: &PoleCatalog) -> Result<LoadReport> {
        let record: SceneRecord = serde_json::from_str(json)?;
        Ok(self.load_record(&record, catalog))
    }

    /// Write the scene as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.export_json()?)?;
        Ok(())
    }

    pub fn read_record(path: &Path) -> Result<SceneRecord> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn autosave_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "pionier", "pionier")
            .map(|dirs| dirs.data_dir().join("autosave.json"))
    }

    /// Save to the per-user autosave file. No-op when the platform has no
    /// data directory.
    pub fn autosave(&self) -> Result<()> {
        match Self::autosave_path() {
            Some(path) => {
                self.save_to(&path)?;
                tracing::debug!(path = %path.display(), "scene autosaved");
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Last autosaved scene, if there is a readable one
    pub fn load_autosave() -> Option<SceneRecord> {
        let path = Self::autosave_path()?;
        if !path.exists() {
            return None;
        }
        match Self::read_record(&path) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), "ignoring unreadable autosave: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{LashingKind, LashingRecord, PoleRecord};

    fn pole_record(id: &str, x: f64) -> PoleRecord {
        PoleRecord {
            id: id.into(),
            position: [x, 1.0, 0.0],
            direction: [0.0, 1.0, 0.0],
            length: 2.0,
        }
    }

    #[test]
    fn test_load_skips_dangling_lashing() {
        let record = SceneRecord {
            poles: vec![pole_record("a", 0.0), pole_record("b", 0.12), pole_record("a", 3.0)],
            lashings: vec![
                LashingRecord {
                    id: "ok".into(),
                    kind: LashingKind::Bipod,
                    poles: vec!["a".into(), "b".into()],
                    contact_points: vec![[0.0, 1.0, 0.0], [0.12, 1.0, 0.0]],
                },
                LashingRecord {
                    id: "dangling".into(),
                    kind: LashingKind::Bipod,
                    poles: vec!["a".into(), "ghost".into()],
                    contact_points: vec![],
                },
                LashingRecord {
                    id: "short".into(),
                    kind: LashingKind::Tripod,
                    poles: vec!["a".into(), "b".into()],
                    contact_points: vec![],
                },
            ],
            ..SceneRecord::default()
        };
        let mut inventory = Inventory::new();
        let report = inventory.load_record(&record, &PoleCatalog::default());
        assert_eq!(
            report,
            LoadReport {
                poles: 2,
                lashings: 1,
                skipped_poles: 1,
                skipped_lashings: 2,
            }
        );
        assert_eq!(inventory.lashings()[0].id(), "ok");
        assert!(inventory.can_undo());
    }

    #[test]
    fn test_export_then_load_preserves_scene() {
        let record = SceneRecord {
            poles: vec![pole_record("a", 0.0)],
            ..SceneRecord::default()
        };
        let catalog = PoleCatalog::default();
        let mut inventory = Inventory::new();
        inventory.load_record(&record, &catalog);
        let json = inventory.export_json().unwrap();

        let mut other = Inventory::new();
        let report = other.load_json(&json, &catalog).unwrap();
        assert_eq!(report.poles, 1);
        assert_eq!(other.to_record(), inventory.to_record());
    }

    #[test]
    fn test_save_to_and_read_back() {
        let dir = std::env::temp_dir().join(format!("pionier-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("scene.json");
        let catalog = PoleCatalog::default();
        let mut inventory = Inventory::new();
        inventory.load_record(
            &SceneRecord {
                poles: vec![pole_record("a", 0.0), pole_record("b", 2.0)],
                ..SceneRecord::default()
            },
            &catalog,
        );

        inventory.save_to(&path).unwrap();
        let record = Inventory::read_record(&path).unwrap();
        assert_eq!(record, inventory.to_record());

        std::fs::write(&path, "{ truncated").unwrap();
        assert!(Inventory::read_record(&path).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
        assert!(Inventory::read_record(&path).is_err());
    }

    #[test]
    fn test_load_json_rejects_garbage() {
        let mut inventory = Inventory::new();
        assert!(inventory.load_json("not json", &PoleCatalog::default()).is_err());
        assert!(!inventory.can_undo());
    }
}
