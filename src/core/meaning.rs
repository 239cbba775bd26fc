//! Meaning Model Builder: council counts → bounded MM scores
//!
//! Each score is `clamp(sum(weight * clamp(count / denominator)) + prior)`.
//! Weights and denominators are the pinned tables in `lib.rs`.

use chrono::Utc;
use tracing::{debug, warn};

use crate::core::seed::content_seed;
use crate::types::{
    Council, Dynamics, EvidenceTag, Intent, MeaningMeta, MeaningModel, MeaningPriors, MeaningResult,
    ReasonCode, Texture, Warning,
};
use crate::{
    ScoreTerm, DEGENERATE_LENGTH_THRESHOLD, DEGENERATE_TIEBREAK_BASE, DEGENERATE_TIEBREAK_SPAN,
    ENTROPY_DISTINCT_TYPES, MM_ANALYTICAL, MM_CONTEMPLATIVE, MM_CONTESTED, MM_CYCLICALITY, MM_ENTROPY,
    MM_HISTORICAL_DEPTH, MM_PERSONAL_INTIMACY, MM_POLARITY, MM_RITUAL, MM_STRUCTURAL_COMPLEXITY,
    MM_VELOCITY, POLARITY_BALANCE,
};

/// Meaning Model builder
#[derive(Debug, Clone)]
pub struct MeaningBuilder {
    priors: MeaningPriors,
    degenerate_threshold: usize,
}

impl Default for MeaningBuilder {
    fn default() -> Self {
        Self {
            priors: MeaningPriors::default(),
            degenerate_threshold: DEGENERATE_LENGTH_THRESHOLD,
        }
    }
}

impl MeaningBuilder {
    /// Create new builder with zero priors
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priors(mut self, priors: MeaningPriors) -> Self {
        self.priors = priors;
        self
    }

    pub fn with_degenerate_threshold(mut self, chars: usize) -> Self {
        self.degenerate_threshold = chars;
        self
    }

    /// Build the model for one document. `text` is the normalized input.
    pub fn build(&self, council: &Council, text: &str) -> MeaningResult {
        let trimmed = text.trim();
        let seed = content_seed(trimmed);
        let p = &self.priors;

        let mut intent = Intent {
            analytical: score(council, MM_ANALYTICAL, p.intent.analytical),
            contemplative: score(council, MM_CONTEMPLATIVE, p.intent.contemplative),
            ritual: score(council, MM_RITUAL, p.intent.ritual),
            contested: score(council, MM_CONTESTED, p.intent.contested),
        };

        let texture = Texture {
            structural_complexity: score(council, MM_STRUCTURAL_COMPLEXITY, p.texture.structural_complexity),
            historical_depth: score(council, MM_HISTORICAL_DEPTH, p.texture.historical_depth),
            personal_intimacy: score(council, MM_PERSONAL_INTIMACY, p.texture.personal_intimacy),
            cyclicality: score(council, MM_CYCLICALITY, p.texture.cyclicality),
        };

        let (distinct_denom, distinct_weight) = ENTROPY_DISTINCT_TYPES;
        let (balance_denom, balance_weight) = POLARITY_BALANCE;
        let sentiment_gap = council
            .count_of("sentiment", "positive")
            .abs_diff(council.count_of("sentiment", "negative"));

        let dynamics = Dynamics {
            velocity: score(council, MM_VELOCITY, p.dynamics.velocity),
            entropy: combine(
                weighted(council, MM_ENTROPY)
                    + distinct_weight * ratio(council.type_count() as f64, distinct_denom),
                p.dynamics.entropy,
            ),
            polarity: combine(
                weighted(council, MM_POLARITY) + balance_weight * ratio(sentiment_gap as f64, balance_denom),
                p.dynamics.polarity,
            ),
        };

        let mut model = MeaningModel {
            intent,
            texture,
            dynamics,
            meta: MeaningMeta {
                seed: seed.key.clone(),
                length_words: trimmed.split_whitespace().count(),
                timestamp: Utc::now(),
            },
        };

        let mut warnings = Vec::new();
        let chars = trimmed.chars().count();

        if council.is_empty() && chars >= self.degenerate_threshold {
            warn!(chars, "no evidence on substantial text");
            warnings.push(Warning::new(
                ReasonCode::R301_ZERO_EVIDENCE,
                format!("no detector evidence for {} characters of text", chars),
            ));
        } else if council.is_empty() && chars < self.degenerate_threshold && model.is_all_zero() {
            intent.analytical = DEGENERATE_TIEBREAK_BASE + DEGENERATE_TIEBREAK_SPAN * seed.unit();
            model.intent = intent;
            debug!(seed = %seed, analytical = intent.analytical, "degenerate tie-breaker applied");
            warnings.push(Warning::new(
                ReasonCode::R302_DEGENERATE_TIEBREAK,
                format!("input of {} characters below threshold {}", chars, self.degenerate_threshold),
            ));
        }

        MeaningResult { model, warnings }
    }
}

/// `count / denominator`, clamped into [0, 1]
fn ratio(count: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return 0.0;
    }
    (count / denominator).clamp(0.0, 1.0)
}

fn weighted(council: &Council, terms: &[ScoreTerm]) -> f64 {
    terms
        .iter()
        .map(|(tag, denominator, weight)| {
            let count = EvidenceTag::parse(tag).map(|t| council.count(&t)).unwrap_or(0);
            weight * ratio(count as f64, *denominator)
        })
        .sum()
}

/// Add the prior unclamped, then clamp the whole; non-finite priors count as 0
fn combine(weighted: f64, prior: f64) -> f64 {
    let prior = if prior.is_finite() { prior } else { 0.0 };
    (weighted + prior).clamp(0.0, 1.0)
}

fn score(council: &Council, terms: &[ScoreTerm], prior: f64) -> f64 {
    combine(weighted(council, terms), prior)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Evidence, Provenance, Span};

    fn council_with(tags: &[(&str, &str, usize)]) -> Council {
        let mut council = Council::default();
        for (ns, kind, n) in tags {
            let tag = EvidenceTag::new(*ns, *kind);
            let items = (0..*n)
                .map(|i| Evidence {
                    id: format!("t:{}:{}", tag, i),
                    tag: tag.clone(),
                    span: Some(Span::new(i, i + 1)),
                    region: None,
                    payload: serde_json::Value::Null,
                    confidence: 1.0,
                    provenance: Provenance {
                        detector: "t".to_string(),
                        version: "1".to_string(),
                        method: "test".to_string(),
                        timestamp: Utc::now(),
                    },
                })
                .collect();
            council.by_type.insert(tag, items);
        }
        council
    }

    #[test]
    fn test_weights_sum_to_at_most_one() {
        let tables: [&[ScoreTerm]; 9] = [
            MM_ANALYTICAL,
            MM_CONTEMPLATIVE,
            MM_RITUAL,
            MM_CONTESTED,
            MM_STRUCTURAL_COMPLEXITY,
            MM_HISTORICAL_DEPTH,
            MM_PERSONAL_INTIMACY,
            MM_CYCLICALITY,
            MM_VELOCITY,
        ];
        for table in tables {
            let total: f64 = table.iter().map(|(_, _, w)| w).sum();
            assert!(total <= 1.0 + 1e-12, "weights sum to {}", total);
        }
        let entropy: f64 = MM_ENTROPY.iter().map(|(_, _, w)| w).sum::<f64>() + ENTROPY_DISTINCT_TYPES.1;
        let polarity: f64 = MM_POLARITY.iter().map(|(_, _, w)| w).sum::<f64>() + POLARITY_BALANCE.1;
        assert!(entropy <= 1.0 + 1e-12);
        assert!(polarity <= 1.0 + 1e-12);
    }

    #[test]
    fn test_every_table_tag_parses() {
        for (tag, denom, _) in MM_ANALYTICAL.iter().chain(MM_VELOCITY).chain(MM_CONTESTED) {
            assert!(EvidenceTag::parse(tag).is_some());
            assert!(*denom > 0.0);
        }
    }

    #[test]
    fn test_saturating_sub_signal() {
        // 30 questions against a denominator of 4: the sub-signal caps at 1
        let council = council_with(&[("rhetoric", "question", 30)]);
        let result = MeaningBuilder::new().build(&council, "why?");
        assert!((result.model.intent.contemplative - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_adversarial_priors_clamped() {
        let mut priors = MeaningPriors::default();
        priors.intent.analytical = 50.0;
        priors.intent.ritual = -7.0;
        priors.dynamics.entropy = f64::NAN;
        priors.texture.cyclicality = f64::INFINITY;
        let council = council_with(&[("analytic", "causal", 9), ("ritual", "liturgy", 2)]);
        let model = MeaningBuilder::new()
            .with_priors(priors)
            .build(&council, "because because because")
            .model;
        for (field, value) in model.fields() {
            assert!((0.0..=1.0).contains(&value), "{} = {}", field, value);
        }
        assert_eq!(model.intent.analytical, 1.0);
        assert_eq!(model.intent.ritual, 0.0);
        // infinite prior ignored; liturgy alone gives 0.3 * (2 / 6)
        assert!((model.texture.cyclicality - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_tiebreak_below_threshold() {
        let result = MeaningBuilder::new().build(&Council::default(), "a");
        let analytical = result.model.intent.analytical;
        assert!(analytical > 0.0 && analytical <= 0.03);
        assert_eq!(result.warnings[0].code, ReasonCode::R302_DEGENERATE_TIEBREAK);
        let others = result.model.fields().iter().skip(1).all(|(_, v)| *v == 0.0);
        assert!(others);
    }

    #[test]
    fn test_no_tiebreak_at_threshold() {
        let text = "x".repeat(DEGENERATE_LENGTH_THRESHOLD);
        let result = MeaningBuilder::new().build(&Council::default(), &text);
        assert!(result.model.is_all_zero());
        assert_eq!(result.warnings[0].code, ReasonCode::R301_ZERO_EVIDENCE);
    }

    #[test]
    fn test_seed_independent_of_evidence() {
        let a = MeaningBuilder::new().build(&Council::default(), "same words here");
        let b = MeaningBuilder::new().build(&council_with(&[("stance", "hedge", 2)]), "same words here");
        assert_eq!(a.model.meta.seed, b.model.meta.seed);
        assert_eq!(a.model.meta.length_words, 3);
    }

    #[test]
    fn test_polarity_from_sentiment_gap() {
        let council = council_with(&[("sentiment", "positive", 5), ("sentiment", "negative", 1)]);
        let model = MeaningBuilder::new().build(&council, "text").model;
        assert!((model.dynamics.polarity - 0.6).abs() < 1e-12);
    }
}
