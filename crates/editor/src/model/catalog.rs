//! Allowed pole lengths and the compound lengths scaffolds can be built to.

use serde::{Deserialize, Serialize};

/// A long leg assembled from a main pole, an extension chained end-to-end
/// beyond it, and a splint lashed alongside the joint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompoundLength {
    pub total: f64,
    pub main: f64,
    pub extension: f64,
    pub splint: f64,
}

/// Length a scaffold resolved to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaffoldLength {
    Single(f64),
    Compound(CompoundLength),
}

impl ScaffoldLength {
    pub fn total(&self) -> f64 {
        match self {
            ScaffoldLength::Single(length) => *length,
            ScaffoldLength::Compound(compound) => compound.total,
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, ScaffoldLength::Compound(_))
    }
}

fn default_ground_overlap() -> f64 {
    0.15
}

fn default_pole_overlap() -> f64 {
    0.3
}

/// Pole material available to the editor.
///
/// Passed explicitly to poles, scaffolds and tools so different sessions
/// and tests can use different catalogs. Lengths are kept ascending however
/// they were written in the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CatalogFile")]
pub struct PoleCatalog {
    /// Single-pole lengths in meters, ascending
    pub lengths: Vec<f64>,
    /// Radius shared by every pole
    pub radius: f64,
    /// Scaffold lengths beyond the longest single pole, ascending by total
    pub compound_lengths: Vec<CompoundLength>,
    /// Extra length past a joint when a leg runs from the ground to a lashing
    pub ground_overlap: f64,
    /// Extra length when a pole spans between two lashings
    pub pole_overlap: f64,
}

/// Catalog as read from disk, before sorting
#[derive(Deserialize)]
struct CatalogFile {
    lengths: Vec<f64>,
    radius: f64,
    #[serde(default)]
    compound_lengths: Vec<CompoundLength>,
    #[serde(default = "default_ground_overlap")]
    ground_overlap: f64,
    #[serde(default = "default_pole_overlap")]
    pole_overlap: f64,
}

impl From<CatalogFile> for PoleCatalog {
    fn from(file: CatalogFile) -> Self {
        let mut catalog = PoleCatalog::new(file.lengths, file.radius, file.compound_lengths);
        catalog.ground_overlap = file.ground_overlap;
        catalog.pole_overlap = file.pole_overlap;
        catalog
    }
}

impl Default for PoleCatalog {
    fn default() -> Self {
        Self {
            lengths: vec![1.0, 1.5, 2.0, 2.5, 3.0, 4.0, 5.0, 6.0],
            radius: 0.06,
            compound_lengths: vec![
                CompoundLength {
                    total: 8.0,
                    main: 4.0,
                    extension: 4.0,
                    splint: 2.0,
                },
                CompoundLength {
                    total: 10.0,
                    main: 5.0,
                    extension: 5.0,
                    splint: 2.5,
                },
                CompoundLength {
                    total: 12.0,
                    main: 6.0,
                    extension: 6.0,
                    splint: 3.0,
                },
            ],
            ground_overlap: default_ground_overlap(),
            pole_overlap: default_pole_overlap(),
        }
    }
}

impl PoleCatalog {
    /// Build a catalog, sorting lengths ascending
    pub fn new(mut lengths: Vec<f64>, radius: f64, mut compound_lengths: Vec<CompoundLength>) -> Self {
        lengths.sort_by(f64::total_cmp);
        compound_lengths.sort_by(|a, b| a.total.total_cmp(&b.total));
        Self {
            lengths,
            radius,
            compound_lengths,
            ..Self::default()
        }
    }

    /// Longest single pole
    pub fn max_length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    pub fn contains(&self, length: f64) -> bool {
        self.lengths.iter().any(|&l| l == length)
    }

    /// Smallest catalog length >= `minimum`, clamped to the longest pole.
    pub fn pick_length(&self, minimum: f64) -> f64 {
        match self.lengths.iter().copied().find(|&l| l >= minimum) {
            Some(length) => length,
            None => match self.lengths.last() {
                Some(&longest) => longest,
                None => {
                    tracing::error!("pole catalog has no lengths, keeping {minimum}");
                    minimum
                }
            },
        }
    }

    /// Scaffold length for `minimum`: a single pole while one is long enough,
    /// otherwise the smallest compound length that reaches it, clamped to the
    /// longest compound length.
    pub fn pick_scaffold_length(&self, minimum: f64) -> ScaffoldLength {
        if minimum <= self.max_length() || self.compound_lengths.is_empty() {
            return ScaffoldLength::Single(self.pick_length(minimum));
        }
        let compound = self
            .compound_lengths
            .iter()
            .find(|c| c.total >= minimum)
            .or_else(|| self.compound_lengths.last())
            .copied();
        match compound {
            Some(compound) => ScaffoldLength::Compound(compound),
            None => ScaffoldLength::Single(self.max_length()),
        }
    }

    /// Every total a scaffold can take, ascending
    pub fn scaffold_lengths(&self) -> Vec<f64> {
        self.lengths
            .iter()
            .copied()
            .chain(self.compound_lengths.iter().map(|c| c.total))
            .collect()
    }
}
