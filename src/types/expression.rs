//! Expression Model: presentation-family energies plus cadence and scale

use serde::{Deserialize, Serialize};

use crate::types::ContractError;

/// The four presentation families carried by the Expression Model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Gridness,
    Stratification,
    Flux,
    Constellation,
}

/// Tie-break priority for the dominant family (earlier wins)
pub const FAMILY_PRIORITY: [Family; 4] = [
    Family::Gridness,
    Family::Stratification,
    Family::Flux,
    Family::Constellation,
];

/// Returned whenever a name does not map onto the canonical table
pub const FALLBACK_FAMILY: &str = "grid";

impl Family {
    /// Canonical renderer-facing name
    pub fn canonical_name(&self) -> &'static str {
        match self {
            Family::Gridness => "grid",
            Family::Stratification => "strata",
            Family::Flux => "flow",
            Family::Constellation => "constellation",
        }
    }

    /// Field name of this family's energy in the Expression Model
    pub fn energy_name(&self) -> &'static str {
        match self {
            Family::Gridness => "gridness",
            Family::Stratification => "stratification",
            Family::Flux => "flux",
            Family::Constellation => "constellation",
        }
    }

    /// Accepts either the energy name or the canonical name
    pub fn from_name(name: &str) -> Option<Family> {
        match name.trim().to_ascii_lowercase().as_str() {
            "gridness" | "grid" => Some(Family::Gridness),
            "stratification" | "strata" => Some(Family::Stratification),
            "flux" | "flow" => Some(Family::Flux),
            "constellation" => Some(Family::Constellation),
            _ => None,
        }
    }
}

/// Map any family name onto the canonical table, defaulting to the fallback
pub fn canonical_family(name: &str) -> &'static str {
    Family::from_name(name)
        .map(|f| f.canonical_name())
        .unwrap_or(FALLBACK_FAMILY)
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

/// Family energies (each 0.0-1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyEnergies {
    pub gridness: f64,
    pub stratification: f64,
    pub flux: f64,
    pub constellation: f64,
}

impl FamilyEnergies {
    pub fn energy(&self, family: Family) -> f64 {
        match family {
            Family::Gridness => self.gridness,
            Family::Stratification => self.stratification,
            Family::Flux => self.flux,
            Family::Constellation => self.constellation,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cadence {
    pub pulse: f64,
    pub anisotropy: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub density: f64,
    pub granularity: f64,
}

/// Renderer-facing parameters. Opaque normalized numbers plus a seed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionModel {
    pub families: FamilyEnergies,
    pub cadence: Cadence,
    pub scale: Scale,
    pub seed: String,
}

impl ExpressionModel {
    /// Every numeric field, labelled, in a fixed order
    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("families.gridness", self.families.gridness),
            ("families.stratification", self.families.stratification),
            ("families.flux", self.families.flux),
            ("families.constellation", self.families.constellation),
            ("cadence.pulse", self.cadence.pulse),
            ("cadence.anisotropy", self.cadence.anisotropy),
            ("scale.density", self.scale.density),
            ("scale.granularity", self.scale.granularity),
        ]
    }

    /// Check the outbound contract: finite values in [0, 1], non-empty seed
    pub fn validate(&self) -> Result<(), ContractError> {
        for (field, value) in self.fields() {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ContractError::OutOfRange {
                    field: field.to_string(),
                    value,
                });
            }
        }
        if self.seed.is_empty() {
            return Err(ContractError::EmptySeed("expression".to_string()));
        }
        Ok(())
    }
}
