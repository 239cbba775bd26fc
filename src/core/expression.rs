//! Expression Model Builder: MM → family energies, cadence, scale
//!
//! Every parameter is a pinned linear combination of MM fields, clamped to
//! [0, 1]. Nothing here is configurable at call time.

use crate::types::{
    canonical_family, Cadence, ExpressionModel, Family, FamilyEnergies, MeaningModel, Scale, FAMILY_PRIORITY,
};
use crate::{
    ExpressionTerm, EM_ANISOTROPY, EM_CONSTELLATION, EM_DENSITY, EM_FLUX, EM_GRANULARITY, EM_GRIDNESS,
    EM_PULSE, EM_STRATIFICATION,
};

/// Expression Model builder
#[derive(Debug, Default)]
pub struct ExpressionBuilder;

impl ExpressionBuilder {
    /// Create new builder
    pub fn new() -> Self {
        Self
    }

    /// Derive the EM; its seed is the MM content seed
    pub fn build(&self, mm: &MeaningModel) -> ExpressionModel {
        ExpressionModel {
            families: FamilyEnergies {
                gridness: combine(mm, EM_GRIDNESS),
                stratification: combine(mm, EM_STRATIFICATION),
                flux: combine(mm, EM_FLUX),
                constellation: combine(mm, EM_CONSTELLATION),
            },
            cadence: Cadence {
                pulse: combine(mm, EM_PULSE),
                anisotropy: combine(mm, EM_ANISOTROPY),
            },
            scale: Scale {
                density: combine(mm, EM_DENSITY),
                granularity: combine(mm, EM_GRANULARITY),
            },
            seed: mm.meta.seed.clone(),
        }
    }
}

/// Value of a labelled MM field (`intent.analytical`, ...); unknown → 0
pub fn meaning_field(mm: &MeaningModel, field: &str) -> f64 {
    mm.fields()
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, value)| *value)
        .unwrap_or(0.0)
}

/// Value of a labelled EM field (`families.gridness`, ...); unknown → 0
pub fn expression_field(em: &ExpressionModel, field: &str) -> f64 {
    em.fields()
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, value)| *value)
        .unwrap_or(0.0)
}

fn combine(mm: &MeaningModel, terms: &[ExpressionTerm]) -> f64 {
    let sum: f64 = terms
        .iter()
        .map(|(field, weight)| weight * meaning_field(mm, field))
        .sum();
    if sum.is_finite() {
        sum.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Strongest family; ties go to the earlier family in `FAMILY_PRIORITY`
pub fn dominant(em: &ExpressionModel) -> Family {
    let mut best = FAMILY_PRIORITY[0];
    for family in FAMILY_PRIORITY.iter().skip(1) {
        if em.families.energy(*family) > em.families.energy(best) {
            best = *family;
        }
    }
    best
}

/// Canonical name of the dominant family, looked up through the name table
pub fn dominant_family(em: &ExpressionModel) -> &'static str {
    canonical_family(dominant(em).energy_name())
}

// =============================================================================
// TESTS
// =============================================================================
