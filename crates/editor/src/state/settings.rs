//! Editor settings

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{PoleCatalog, DEFAULT_OVERLAP_FACTOR};
use crate::solver::SolverSettings;

/// Interactive placement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Fraction of the summed radii under which a preview leg collides
    pub overlap_factor: f64,
    /// Height difference within which a square lashing snaps to an
    /// existing lashing height
    pub snap_tolerance: f64,
    /// Lash height shown before the user has set one
    pub default_lash_height: f64,
    /// Lowest lash height a structure can be committed at
    pub min_lash_height: f64,
    /// Leg count the multi-leg tool starts with
    pub polypedestra_legs: usize,
    pub polypedestra_min_legs: usize,
    pub polypedestra_max_legs: usize,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            overlap_factor: DEFAULT_OVERLAP_FACTOR,
            snap_tolerance: 0.1,
            default_lash_height: 2.0,
            min_lash_height: 0.5,
            polypedestra_legs: 4,
            polypedestra_min_legs: 3,
            polypedestra_max_legs: 8,
        }
    }
}

impl PlacementSettings {
    /// Clamp a leg count into the allowed range
    pub fn clamp_legs(&self, legs: usize) -> usize {
        legs.clamp(self.polypedestra_min_legs, self.polypedestra_max_legs)
    }
}

/// All editor settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Pole material
    #[serde(default)]
    pub catalog: PoleCatalog,
    #[serde(default)]
    pub placement: PlacementSettings,
    /// Tripod solver parameters
    #[serde(default)]
    pub solver: SolverSettings,
}

impl EditorSettings {
    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        if let Some(dirs) = directories::ProjectDirs::from("org", "pionier", "pionier") {
            let config_path = dirs.config_dir().join("settings.json");
            if let Ok(json) = std::fs::read_to_string(&config_path) {
                match Self::from_json(&json) {
                    Ok(settings) => return settings,
                    Err(e) => tracing::warn!(path = %config_path.display(), "ignoring settings file: {e}"),
                }
            }
        }
        Self::default()
    }

    /// Save settings to file
    pub fn save(&self) -> Result<()> {
        if let Some(dirs) = directories::ProjectDirs::from("org", "pionier", "pionier") {
            let config_dir = dirs.config_dir();
            std::fs::create_dir_all(config_dir)?;
            std::fs::write(config_dir.join("settings.json"), self.to_json()?)?;
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
