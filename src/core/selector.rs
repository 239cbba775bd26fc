//! Multi-slot Family Selector
//!
//! One family per slot, never repeated across slots:
//! 1. slot seed = seed(base, "role:slice") where slice is the slot's share of
//!    the text
//! 2. index = (seed + bias + attempt) mod pool size, retried on collision
//! 3. after `max_attempts` collisions, the first unused pool member

use tracing::{debug, warn};

use crate::core::expression::{expression_field, meaning_field};
use crate::core::seed::derive_seed;
use crate::types::{
    ExpressionModel, MeaningModel, ReasonCode, Selection, SlotAssignment, SlotLayout, Warning,
};
use crate::{SELECTOR_MAX_ATTEMPTS, SLOT_BIAS, SLOT_SLICE_CHARS};

/// Family selector over a validated layout
#[derive(Debug, Clone)]
pub struct FamilySelector {
    layout: SlotLayout,
    max_attempts: u64,
}

impl Default for FamilySelector {
    fn default() -> Self {
        Self::new(SlotLayout::standard())
    }
}

impl FamilySelector {
    pub fn new(layout: SlotLayout) -> Self {
        Self {
            layout,
            max_attempts: SELECTOR_MAX_ATTEMPTS,
        }
    }

    /// Retry bound before the forced fallback (at least one attempt)
    pub fn with_max_attempts(mut self, attempts: u64) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn layout(&self) -> &SlotLayout {
        &self.layout
    }

    /// Pure function of (base seed, text, MM, EM)
    pub fn select(&self, base_seed: &str, text: &str, mm: &MeaningModel, em: &ExpressionModel) -> Selection {
        let slices = slot_slices(text, self.layout.len());
        let mut used: Vec<&str> = Vec::with_capacity(self.layout.len());
        let mut assignments = Vec::with_capacity(self.layout.len());
        let mut warnings = Vec::new();

        for (slot, slice) in self.layout.slots().iter().zip(slices.iter()) {
            let seed = derive_seed(base_seed, &format!("{}:{}", slot.role, slice));
            let bias = slot_bias(&slot.role, mm, em);
            let pool_len = slot.pool.len() as u64;

            let mut picked: Option<(&str, u64)> = None;
            for attempt in 0..self.max_attempts {
                let index = (seed.value as u64 + bias + attempt) % pool_len;
                let candidate = slot.pool[index as usize].as_str();
                debug!(role = %slot.role, attempt, candidate, "selection attempt");
                if !used.contains(&candidate) {
                    picked = Some((candidate, attempt));
                    break;
                }
            }

            let (family, attempts, forced) = match picked {
                Some((family, attempt)) => (family, attempt, false),
                None => {
                    // layout validation guarantees an unused candidate exists
                    let family = slot
                        .pool
                        .iter()
                        .map(String::as_str)
                        .find(|c| !used.contains(c))
                        .unwrap_or(slot.pool[0].as_str());
                    warn!(role = %slot.role, family, "selector retries exhausted, forcing first unused");
                    warnings.push(Warning::new(
                        ReasonCode::R401_SELECTOR_FORCED,
                        format!(
                            "slot '{}' collided {} times, forced '{}'",
                            slot.role, self.max_attempts, family
                        ),
                    ));
                    (family, self.max_attempts, true)
                }
            };

            used.push(family);
            assignments.push(SlotAssignment {
                role: slot.role.clone(),
                family: family.to_string(),
                seed: seed.key,
                attempts,
                forced,
            });
        }

        Selection { assignments, warnings }
    }
}

/// Split text into `k` contiguous, equal character ranges, each capped at
/// `SLOT_SLICE_CHARS`
pub fn slot_slices(text: &str, k: usize) -> Vec<String> {
    if k == 0 {
        return Vec::new();
    }
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    (0..k)
        .map(|i| {
            let start = i * n / k;
            let end = (i + 1) * n / k;
            chars[start..end].iter().take(SLOT_SLICE_CHARS).collect()
        })
        .collect()
}

/// Integer bias for a role from the pinned MM/EM combinations; unknown roles get 0
pub fn slot_bias(role: &str, mm: &MeaningModel, em: &ExpressionModel) -> u64 {
    let Some((_, terms)) = SLOT_BIAS.iter().find(|(r, _)| *r == role) else {
        return 0;
    };
    let sum: f64 = terms
        .iter()
        .map(|(field, multiplier)| {
            let value = if is_expression_field(field) {
                expression_field(em, field)
            } else {
                meaning_field(mm, field)
            };
            value * multiplier
        })
        .sum();
    if sum.is_finite() && sum > 0.0 {
        sum.round() as u64
    } else {
        0
    }
}

fn is_expression_field(field: &str) -> bool {
    field.starts_with("families.") || field.starts_with("cadence.") || field.starts_with("scale.")
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expression::ExpressionBuilder;
    use crate::core::seed::Lcg;
    use crate::types::{Dynamics, Intent, MeaningMeta, SlotSpec, Texture};
    use chrono::Utc;

    fn models() -> (MeaningModel, ExpressionModel) {
        let mm = MeaningModel {
            intent: Intent {
                analytical: 0.6,
                ..Intent::default()
            },
            texture: Texture {
                structural_complexity: 0.4,
                ..Texture::default()
            },
            dynamics: Dynamics {
                velocity: 0.3,
                ..Dynamics::default()
            },
            meta: MeaningMeta {
                seed: "k1".to_string(),
                length_words: 4,
                timestamp: Utc::now(),
            },
        };
        let em = ExpressionBuilder::new().build(&mm);
        (mm, em)
    }

    #[test]
    fn test_slices_cover_text_in_order() {
        assert_eq!(slot_slices("abcdef", 3), vec!["ab", "cd", "ef"]);
        assert_eq!(slot_slices("ab", 3), vec!["", "a", "b"]);
        assert!(slot_slices("", 3).iter().all(String::is_empty));
        let long = "x".repeat(1000);
        assert!(slot_slices(&long, 3).iter().all(|s| s.chars().count() == SLOT_SLICE_CHARS));
    }

    #[test]
    fn test_bias_is_deterministic_integer() {
        let (mm, em) = models();
        // gridness = .5*.6 + .35*.4 = .44; density = .4*.4 + .3*.6 = .34
        // round(.44*7 + .34*3) = round(4.1) = 4
        assert_eq!(slot_bias("backdrop", &mm, &em), 4);
        assert_eq!(slot_bias("unknown", &mm, &em), 0);
    }

    #[test]
    fn test_selection_is_pure() {
        let (mm, em) = models();
        let selector = FamilySelector::default();
        let a = selector.select("seed", "some text to slice", &mm, &em);
        let b = selector.select("seed", "some text to slice", &mm, &em);
        assert_eq!(a, b);
        assert_eq!(a.assignments.len(), 3);
    }

    #[test]
    fn test_slot_seeds_differ() {
        let (mm, em) = models();
        let selection = FamilySelector::default().select("seed", "", &mm, &em);
        let seeds: Vec<&str> = selection.assignments.iter().map(|a| a.seed.as_str()).collect();
        assert_ne!(seeds[0], seeds[1]);
        assert_ne!(seeds[1], seeds[2]);
        assert_ne!(seeds[0], seeds[2]);
    }

    #[test]
    fn test_overlapping_pools_never_repeat() {
        let layout = SlotLayout::new(vec![
            SlotSpec::new("a", &["x", "y", "z"]),
            SlotSpec::new("b", &["x", "y", "z"]),
            SlotSpec::new("c", &["x", "y", "z"]),
        ])
        .unwrap();
        let selector = FamilySelector::new(layout).with_max_attempts(1);
        let (mm, em) = models();
        let mut rng = Lcg::new(7);
        let mut forced = 0;
        for _ in 0..500 {
            let base = rng.next_u32().to_string();
            let selection = selector.select(&base, "overlap", &mm, &em);
            let mut families = selection.families();
            families.sort();
            families.dedup();
            assert_eq!(families.len(), 3);
            forced += selection.warnings.len();
        }
        assert!(forced > 0);
    }

    #[test]
    fn test_standard_layout_non_collision() {
        let (mm, em) = models();
        let selector = FamilySelector::default();
        let mut rng = Lcg::new(2024);
        for _ in 0..1000 {
            let base = rng.next_u32().to_string();
            let selection = selector.select(&base, "the same text each time", &mm, &em);
            let families = selection.families();
            assert_ne!(families[0], families[1]);
            assert_ne!(families[1], families[2]);
            assert_ne!(families[0], families[2]);
        }
    }
}
