use serde::{Deserialize, Serialize};

/// Unique identifier of a pole in the inventory
pub type PoleId = String;

/// Unique identifier of a lashing in the inventory
pub type LashingId = String;

fn default_version() -> u32 {
    1
}

/// A committed pole as handed to the persistence/export side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleRecord {
    pub id: PoleId,
    /// Segment midpoint in world space
    pub position: [f64; 3],
    /// Unit long axis
    pub direction: [f64; 3],
    /// Catalog length in meters
    pub length: f64,
}

/// Joint arity / kind of a lashing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LashingKind {
    /// Two crossing poles joined at a right-angle style lashing
    Square,
    /// Two legs of a bipod
    Bipod,
    /// Three legs of a tripod
    Tripod,
    /// Ring lashing of a multi-leg structure
    Polypedestra,
    /// Splice between the poles of one long scaffold leg
    Scaffold,
}

/// A committed lashing: participants plus the contact points of the rope path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LashingRecord {
    pub id: LashingId,
    pub kind: LashingKind,
    /// Participant pole ids, in the order the contact points are listed
    pub poles: Vec<PoleId>,
    #[serde(default)]
    pub contact_points: Vec<[f64; 3]>,
}

/// Whole scene as a flat list of poles and lashings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRecord {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub poles: Vec<PoleRecord>,
    #[serde(default)]
    pub lashings: Vec<LashingRecord>,
}

impl Default for SceneRecord {
    fn default() -> Self {
        Self {
            version: default_version(),
            poles: Vec::new(),
            lashings: Vec::new(),
        }
    }
}

impl SceneRecord {
    /// Find a pole record by id
    pub fn pole(&self, id: &str) -> Option<&PoleRecord> {
        self.poles.iter().find(|p| p.id == id)
    }

    /// Lashings that reference a pole missing from `poles`
    pub fn dangling_lashings(&self) -> Vec<&LashingRecord> {
        self.lashings
            .iter()
            .filter(|l| l.poles.iter().any(|id| self.pole(id).is_none()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pole(id: &str) -> PoleRecord {
        PoleRecord {
            id: id.to_string(),
            position: [0.0, 1.5, 0.0],
            direction: [0.0, 1.0, 0.0],
            length: 3.0,
        }
    }

    #[test]
    fn test_lashing_kind_serde() {
        let json = serde_json::to_string(&LashingKind::Polypedestra).unwrap();
        assert_eq!(json, r#""polypedestra""#);
        let back: LashingKind = serde_json::from_str(r#""square""#).unwrap();
        assert_eq!(back, LashingKind::Square);
    }

    #[test]
    fn test_scene_defaults_when_fields_missing() {
        let scene: SceneRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(scene.version, 1);
        assert!(scene.poles.is_empty());
        assert!(scene.lashings.is_empty());
    }

    #[test]
    fn test_lashing_without_contact_points_parses() {
        let json = r#"{"id": "l1", "kind": "bipod", "poles": ["a", "b"]}"#;
        let lashing: LashingRecord = serde_json::from_str(json).unwrap();
        assert_eq!(lashing.kind, LashingKind::Bipod);
        assert!(lashing.contact_points.is_empty());
    }

    #[test]
    fn test_dangling_lashings() {
        let scene = SceneRecord {
            version: 1,
            poles: vec![pole("a"), pole("b")],
            lashings: vec![
                LashingRecord {
                    id: "ok".into(),
                    kind: LashingKind::Bipod,
                    poles: vec!["a".into(), "b".into()],
                    contact_points: vec![],
                },
                LashingRecord {
                    id: "broken".into(),
                    kind: LashingKind::Square,
                    poles: vec!["a".into(), "missing".into()],
                    contact_points: vec![],
                },
            ],
        };
        let dangling = scene.dangling_lashings();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].id, "broken");
    }
}
