use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const WILDCARD: &str = "X";

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GlobalParams {
    #[serde(default = "default_dielectric_constant")]
    pub dielectric_constant: f64,
    #[serde(default = "default_bond_force_constant")]
    pub bond_force_constant: f64,
    #[serde(default = "default_angle_force_constant")]
    pub angle_force_constant: f64,
    #[serde(default = "default_inversion_force_constant")]
    pub inversion_force_constant: f64,
    #[serde(default = "default_bond_delta")]
    pub bond_delta: f64,
}

fn default_dielectric_constant() -> f64 {
    1.0
}
fn default_bond_force_constant() -> f64 {
    700.0
}
fn default_angle_force_constant() -> f64 {
    100.0
}
fn default_inversion_force_constant() -> f64 {
    40.0
}
fn default_bond_delta() -> f64 {
    0.01
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            dielectric_constant: default_dielectric_constant(),
            bond_force_constant: default_bond_force_constant(),
            angle_force_constant: default_angle_force_constant(),
            inversion_force_constant: default_inversion_force_constant(),
            bond_delta: default_bond_delta(),
        }
    }
}

/// Per atom type parameters. Angles are in degrees, distances in Angstroms.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AtomTypeParams {
    pub bond_radius: f64,
    pub bond_angle: f64,
    pub vdw_radius: f64,
    pub well_depth: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TorsionParams {
    pub barrier: f64,
    pub periodicity: f64,
    #[serde(default)]
    pub phase: f64,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct InversionParams {
    /// Falls back to [`GlobalParams::inversion_force_constant`] when absent.
    #[serde(default)]
    pub force_constant: Option<f64>,
    #[serde(default)]
    pub angle: f64,
}

/// A complete parameter set as read from a TOML document.
///
/// Torsion entries are keyed by the types of the two central atoms joined with `-`
/// (e.g. `C_3-C_3`), with `X` as a wildcard. Inversion entries are keyed by the type
/// of the central atom.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ParameterSet {
    #[serde(default)]
    pub globals: GlobalParams,
    #[serde(default)]
    pub atoms: HashMap<String, AtomTypeParams>,
    #[serde(default)]
    pub torsions: HashMap<String, TorsionParams>,
    #[serde(default)]
    pub inversions: HashMap<String, InversionParams>,
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

impl ParameterSet {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content, &path.to_string_lossy())
    }

    /// Parses a parameter set; `origin` only labels errors.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ParamLoadError> {
        toml::from_str(content).map_err(|e| ParamLoadError::Toml {
            path: origin.to_string(),
            source: e,
        })
    }

    pub fn atom(&self, atom_type: &str) -> Option<&AtomTypeParams> {
        self.atoms.get(atom_type)
    }

    /// Looks up torsion parameters for the central bond `b-c`, most specific first.
    pub fn torsion(&self, b: &str, c: &str) -> Option<&TorsionParams> {
        let candidates = [
            format!("{b}-{c}"),
            format!("{c}-{b}"),
            format!("{b}-{WILDCARD}"),
            format!("{WILDCARD}-{b}"),
            format!("{c}-{WILDCARD}"),
            format!("{WILDCARD}-{c}"),
            format!("{WILDCARD}-{WILDCARD}"),
        ];
        candidates.iter().find_map(|key| self.torsions.get(key))
    }

    /// Looks up inversion parameters for a central atom type, falling back to `X`.
    pub fn inversion(&self, center: &str) -> Option<&InversionParams> {
        self.inversions
            .get(center)
            .or_else(|| self.inversions.get(WILDCARD))
    }
}

/// Where a named parameter set comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterSource {
    File(PathBuf),
    Embedded {
        name: &'static str,
        content: &'static str,
    },
}

impl ParameterSource {
    pub fn load(&self) -> Result<ParameterSet, ParamLoadError> {
        match self {
            Self::File(path) => ParameterSet::load(path),
            Self::Embedded { name, content } => {
                ParameterSet::from_toml_str(content, &format!("<embedded:{name}>"))
            }
        }
    }
}

impl fmt::Display for ParameterSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Embedded { name, .. } => write!(f, "<embedded:{name}>"),
        }
    }
}
