//! Binding: consumer-side check of the outbound contract
//!
//! A renderer receives the Expression Model plus one `(role, family, seed)`
//! per slot. Anything missing or out of range is a programming error in a
//! collaborator, so `expect_from` fails loudly instead of degrading.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Cadence, ContractError, ExpressionModel, FamilyEnergies, Rendering, Scale};

/// One slot as seen by the renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundSlot {
    pub role: String,
    pub family: String,
    pub seed: String,
}

/// Validated outbound object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub expression: ExpressionModel,
    pub slots: Vec<BoundSlot>,
}

impl Binding {
    /// Validate a loosely typed object
    pub fn from_value(value: &Value) -> Result<Binding, ContractError> {
        let root = value
            .as_object()
            .ok_or_else(|| ContractError::WrongType("binding".to_string()))?;

        let expression = object(root, "expression", "expression")?;
        let families = object(expression, "families", "expression.families")?;
        let cadence = object(expression, "cadence", "expression.cadence")?;
        let scale = object(expression, "scale", "expression.scale")?;

        let em = ExpressionModel {
            families: FamilyEnergies {
                gridness: unit(families, "gridness", "expression.families")?,
                stratification: unit(families, "stratification", "expression.families")?,
                flux: unit(families, "flux", "expression.families")?,
                constellation: unit(families, "constellation", "expression.families")?,
            },
            cadence: Cadence {
                pulse: unit(cadence, "pulse", "expression.cadence")?,
                anisotropy: unit(cadence, "anisotropy", "expression.cadence")?,
            },
            scale: Scale {
                density: unit(scale, "density", "expression.scale")?,
                granularity: unit(scale, "granularity", "expression.scale")?,
            },
            seed: string(expression, "seed", "expression")?,
        };
        em.validate()?;

        let raw_slots = root
            .get("slots")
            .ok_or_else(|| ContractError::MissingField("slots".to_string()))?
            .as_array()
            .ok_or_else(|| ContractError::WrongType("slots".to_string()))?;

        let mut slots: Vec<BoundSlot> = Vec::with_capacity(raw_slots.len());
        for (i, raw) in raw_slots.iter().enumerate() {
            let path = format!("slots[{}]", i);
            let slot = raw
                .as_object()
                .ok_or_else(|| ContractError::WrongType(path.clone()))?;
            let bound = BoundSlot {
                role: string(slot, "role", &path)?,
                family: string(slot, "family", &path)?,
                seed: string(slot, "seed", &path)?,
            };
            if bound.seed.is_empty() {
                return Err(ContractError::EmptySeed(bound.role));
            }
            if slots.iter().any(|s| s.family == bound.family) {
                return Err(ContractError::DuplicateFamily(bound.family));
            }
            slots.push(bound);
        }
        if slots.is_empty() {
            return Err(ContractError::MissingField("slots[0]".to_string()));
        }

        Ok(Binding { expression: em, slots })
    }

    /// Validate or panic.
    ///
    /// # Panics
    ///
    /// On any contract violation; the message carries the `ContractError`.
    pub fn expect_from(value: &Value) -> Binding {
        match Self::from_value(value) {
            Ok(binding) => binding,
            Err(err) => panic!("contract violation: {}", err),
        }
    }

    /// Bind a pipeline rendering; placeholders carry no expression
    pub fn from_rendering(rendering: &Rendering) -> Result<Binding, ContractError> {
        let value = serde_json::to_value(rendering).map_err(|_| ContractError::WrongType("rendering".to_string()))?;
        Self::from_value(&value)
    }

    pub fn family_for(&self, role: &str) -> Option<&str> {
        self.slots.iter().find(|s| s.role == role).map(|s| s.family.as_str())
    }
}

fn object<'a>(parent: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a Map<String, Value>, ContractError> {
    parent
        .get(key)
        .ok_or_else(|| ContractError::MissingField(path.to_string()))?
        .as_object()
        .ok_or_else(|| ContractError::WrongType(path.to_string()))
}

fn unit(parent: &Map<String, Value>, key: &str, path: &str) -> Result<f64, ContractError> {
    let field = format!("{}.{}", path, key);
    let value = parent
        .get(key)
        .ok_or_else(|| ContractError::MissingField(field.clone()))?
        .as_f64()
        .ok_or_else(|| ContractError::WrongType(field.clone()))?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(ContractError::OutOfRange { field, value });
    }
    Ok(value)
}

fn string(parent: &Map<String, Value>, key: &str, path: &str) -> Result<String, ContractError> {
    let field = format!("{}.{}", path, key);
    parent
        .get(key)
        .ok_or_else(|| ContractError::MissingField(field.clone()))?
        .as_str()
        .map(str::to_string)
        .ok_or(ContractError::WrongType(field))
}

// =============================================================================
// TESTS
// =============================================================================
