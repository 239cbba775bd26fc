//! Slot layout and selection results

use serde::{Deserialize, Serialize};

use crate::types::{LayoutError, Warning};

/// One presentation slot: a role and its candidate pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub role: String,
    pub pool: Vec<String>,
}

impl SlotSpec {
    pub fn new(role: impl Into<String>, pool: &[&str]) -> Self {
        Self {
            role: role.into(),
            pool: pool.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Validated set of slots. Every pool holds at least as many candidates as
/// there are slots, so the first-unused fallback always finds one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SlotSpec>", into = "Vec<SlotSpec>")]
pub struct SlotLayout {
    slots: Vec<SlotSpec>,
}

impl SlotLayout {
    pub fn new(slots: Vec<SlotSpec>) -> Result<Self, LayoutError> {
        if slots.is_empty() {
            return Err(LayoutError::NoSlots);
        }
        let required = slots.len();
        for (i, slot) in slots.iter().enumerate() {
            if slots[..i].iter().any(|s| s.role == slot.role) {
                return Err(LayoutError::DuplicateRole(slot.role.clone()));
            }
            if slot.pool.len() < required {
                return Err(LayoutError::PoolTooSmall {
                    role: slot.role.clone(),
                    size: slot.pool.len(),
                    required,
                });
            }
            for (j, family) in slot.pool.iter().enumerate() {
                if slot.pool[..j].contains(family) {
                    return Err(LayoutError::DuplicateCandidate {
                        role: slot.role.clone(),
                        family: family.clone(),
                    });
                }
            }
        }
        Ok(Self { slots })
    }

    /// Three roles with disjoint pools; the backdrop pool is the canonical
    /// family table of the Expression Model
    pub fn standard() -> Self {
        Self {
            slots: vec![
                SlotSpec::new("backdrop", &["grid", "strata", "flow", "constellation"]),
                SlotSpec::new("frame", &["lattice", "ribbon", "tessellation", "arc"]),
                SlotSpec::new("mark", &["sigil", "orbit", "glyph", "cipher"]),
            ],
        }
    }

    pub fn slots(&self) -> &[SlotSpec] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<SlotSpec>> for SlotLayout {
    type Error = LayoutError;

    fn try_from(slots: Vec<SlotSpec>) -> Result<Self, Self::Error> {
        SlotLayout::new(slots)
    }
}

impl From<SlotLayout> for Vec<SlotSpec> {
    fn from(layout: SlotLayout) -> Self {
        layout.slots
    }
}

/// The family chosen for one slot, with the seed the renderer should use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAssignment {
    pub role: String,
    pub family: String,
    pub seed: String,
    /// Retry offset that produced the family
    pub attempts: u64,
    /// True when retries were exhausted and the first unused candidate was taken
    pub forced: bool,
}

/// Selector output: one assignment per slot, in layout order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub assignments: Vec<SlotAssignment>,
    pub warnings: Vec<Warning>,
}

impl Selection {
    pub fn families(&self) -> Vec<&str> {
        self.assignments.iter().map(|a| a.family.as_str()).collect()
    }

    pub fn family_for(&self, role: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.role == role)
            .map(|a| a.family.as_str())
    }
}
