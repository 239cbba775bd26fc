//! Pipeline: the single entry point from resolved content to a rendering
//!
//! gate → normalize → parse → council → merge → MM → EM → slot selection.
//! Any panic escaping the core degrades to the neutral placeholder.

use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::core::analyzer::{AnalyzerContext, AnalyzerRegistry};
use crate::core::block_parser::{normalize_text, BlockParser};
use crate::core::detectors::default_registry;
use crate::core::expression::{dominant_family, ExpressionBuilder};
use crate::core::lang::detect_language;
use crate::core::merger::merge_council;
use crate::core::meaning::MeaningBuilder;
use crate::core::runner::CouncilRunner;
use crate::core::selector::FamilySelector;
use crate::types::{
    ContentInput, Council, Diagnostics, ExpressionModel, MeaningPriors, MeaningResult, ParsedDoc, ReasonCode,
    Rendering, Selection, SlotLayout, Warning,
};

/// Every intermediate value for one accepted document
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Normalized text
    pub text: String,
    pub lang: String,
    pub doc: ParsedDoc,
    pub council: Council,
    pub meaning: MeaningResult,
    pub expression: ExpressionModel,
    pub selection: Selection,
}

impl Analysis {
    pub fn rendering(&self) -> Rendering {
        Rendering::Expressed {
            expression: self.expression.clone(),
            slots: self.selection.assignments.clone(),
        }
    }

    /// Council, meaning and selection warnings, in pipeline order
    pub fn warnings(&self) -> Vec<Warning> {
        self.council
            .warnings
            .iter()
            .chain(self.meaning.warnings.iter())
            .chain(self.selection.warnings.iter())
            .cloned()
            .collect()
    }
}

/// Evidence-to-expression pipeline. Shareable across threads.
#[derive(Debug)]
pub struct Pipeline {
    registry: Arc<AnalyzerRegistry>,
    config: PipelineConfig,
    runner: CouncilRunner,
    parser: BlockParser,
    meaning: MeaningBuilder,
    expression: ExpressionBuilder,
    selector: FamilySelector,
    cache: Mutex<HashMap<String, Rendering>>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(default_registry(), PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(registry: AnalyzerRegistry, config: PipelineConfig) -> Self {
        Self::from_shared(Arc::new(registry), config)
    }

    /// Build around an already shared, read-only registry
    pub fn from_shared(registry: Arc<AnalyzerRegistry>, config: PipelineConfig) -> Self {
        let runner = match config.detector_timeout() {
            Some(timeout) => CouncilRunner::new()
                .with_timeout(timeout)
                .with_parallel(config.parallel_detectors),
            None => CouncilRunner::new(),
        };
        let meaning = MeaningBuilder::new().with_degenerate_threshold(config.degenerate_length_threshold);
        Self {
            registry,
            config,
            runner,
            parser: BlockParser::new(),
            meaning,
            expression: ExpressionBuilder::new(),
            selector: FamilySelector::default(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_layout(mut self, layout: SlotLayout) -> Self {
        self.selector = FamilySelector::new(layout);
        self.clear_cache();
        self
    }

    pub fn with_priors(mut self, priors: MeaningPriors) -> Self {
        self.meaning = self.meaning.clone().with_priors(priors);
        self.clear_cache();
        self
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Content → rendering. Never fails; faults degrade to a placeholder.
    pub fn process(&self, input: &ContentInput) -> Rendering {
        match catch_unwind(AssertUnwindSafe(|| self.process_inner(input))) {
            Ok(rendering) => rendering,
            Err(_) => {
                warn!(provenance = %input.provenance, "pipeline fault, rendering placeholder");
                Rendering::placeholder(ReasonCode::R102_PIPELINE_FAULT)
            }
        }
    }

    /// Shorthand for fully trusted text
    pub fn process_text(&self, text: &str) -> Rendering {
        self.process(&ContentInput::plain(text))
    }

    fn process_inner(&self, input: &ContentInput) -> Rendering {
        let text = normalize_text(&input.text);
        if let Err(warning) = self.gate(input, &text) {
            debug!(%warning, "input rejected");
            return Rendering::placeholder(warning.code);
        }

        let key = cache_key(&text, input);
        if let Some(hit) = self.cached(&key) {
            return hit;
        }

        let rendering = self.run(input, text).rendering();
        self.remember(key, &rendering);
        rendering
    }

    /// Full analysis, or the gate warning for rejected input
    pub fn analyze(&self, input: &ContentInput) -> Result<Analysis, Warning> {
        let text = normalize_text(&input.text);
        self.gate(input, &text)?;
        Ok(self.run(input, text))
    }

    /// Debug view for one document; bypasses the cache
    pub fn diagnose(&self, input: &ContentInput) -> Diagnostics {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.analyze(input)));
        let analysis = match outcome {
            Ok(Ok(analysis)) => analysis,
            Ok(Err(warning)) => return Diagnostics::rejected(warning),
            Err(_) => {
                return Diagnostics::rejected(Warning::new(
                    ReasonCode::R102_PIPELINE_FAULT,
                    "pipeline fault during diagnosis",
                ))
            }
        };

        Diagnostics {
            timestamp: analysis.meaning.model.meta.timestamp,
            accepted: true,
            language: analysis.lang.clone(),
            evidence_counts: analysis.council.counts(),
            versions: analysis.council.versions.clone(),
            warnings: analysis.warnings(),
            base_seed: Some(analysis.meaning.model.meta.seed.clone()),
            dominant_family: Some(dominant_family(&analysis.expression).to_string()),
            slots: analysis.selection.assignments.clone(),
            meaning: Some(analysis.meaning.model.clone()),
            expression: Some(analysis.expression.clone()),
        }
    }

    fn gate(&self, input: &ContentInput, text: &str) -> Result<(), Warning> {
        let chars = text.trim().chars().count();
        if !input.confidence.is_finite() || input.confidence < self.config.min_confidence {
            return Err(Warning::new(
                ReasonCode::R101_INPUT_REJECTED,
                format!(
                    "confidence {} below minimum {}",
                    input.confidence, self.config.min_confidence
                ),
            ));
        }
        if chars < self.config.min_content_chars {
            return Err(Warning::new(
                ReasonCode::R101_INPUT_REJECTED,
                format!("{} characters below minimum {}", chars, self.config.min_content_chars),
            ));
        }
        Ok(())
    }

    fn run(&self, input: &ContentInput, text: String) -> Analysis {
        let doc = self.parser.parse(&text);
        let lang = detect_language(&text).tag;
        let ctx = Arc::new(
            AnalyzerContext::new(text.clone(), doc.clone(), lang.clone())
                .with_meta("provenance", json!(input.provenance))
                .with_meta("confidence", json!(input.confidence)),
        );

        let runs = self.runner.run(&self.registry, &ctx);
        let council = merge_council(&runs);
        let meaning = self.meaning.build(&council, &text);
        let expression = self.expression.build(&meaning.model);
        let selection = self
            .selector
            .select(&meaning.model.meta.seed, text.trim(), &meaning.model, &expression);

        debug!(
            seed = %meaning.model.meta.seed,
            lang = %lang,
            evidence = council.total(),
            families = ?selection.families(),
            "document processed"
        );

        Analysis {
            text,
            lang,
            doc,
            council,
            meaning,
            expression,
            selection,
        }
    }

    fn cached(&self, key: &str) -> Option<Rendering> {
        if self.config.cache_capacity == 0 {
            return None;
        }
        self.cache.lock().ok().and_then(|cache| cache.get(key).cloned())
    }

    fn remember(&self, key: String, rendering: &Rendering) {
        if self.config.cache_capacity == 0 {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            if cache.len() >= self.config.cache_capacity {
                cache.clear();
            }
            cache.insert(key, rendering.clone());
        }
    }

    fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    /// Number of memoized renderings
    pub fn cached_len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }
}

/// SHA-256 hex of the normalized text plus the metadata detectors can read
fn cache_key(text: &str, input: &ContentInput) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0u8]);
    hasher.update(input.provenance.as_bytes());
    hasher.update([0u8]);
    hasher.update(input.confidence.to_bits().to_le_bytes());
    hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalyzerError, AnalyzerOutput, Evidence, EvidenceTag, Provenance};
    use chrono::Utc;

    fn inline_config() -> PipelineConfig {
        PipelineConfig {
            detector_timeout_ms: None,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_gate_rejects_low_confidence() {
        let pipeline = Pipeline::default();
        let rendering = pipeline.process(&ContentInput::new("Plenty of text here.", "ocr", 0.1));
        assert_eq!(rendering, Rendering::placeholder(ReasonCode::R101_INPUT_REJECTED));
    }

    #[test]
    fn test_gate_rejects_empty_text() {
        let pipeline = Pipeline::default();
        assert!(pipeline.process_text("").is_placeholder());
        assert!(pipeline.process_text(" \n\t\n").is_placeholder());
        assert!(pipeline.process(&ContentInput::new("text", "x", f64::NAN)).is_placeholder());
    }

    #[test]
    fn test_expressed_rendering_binds() {
        let pipeline = Pipeline::new(default_registry(), inline_config());
        let rendering = pipeline.process_text("# Notes\n- because 3 reasons\n- but why?");
        let binding = crate::core::binding::Binding::from_rendering(&rendering).unwrap();
        assert_eq!(binding.slots.len(), 3);
    }

    #[test]
    fn test_cache_returns_identical_rendering() {
        let pipeline = Pipeline::default();
        let first = pipeline.process_text("We return every season.");
        assert_eq!(pipeline.cached_len(), 1);
        let second = pipeline.process_text("We return every season.");
        assert_eq!(first, second);
        assert_eq!(pipeline.cached_len(), 1);
    }

    #[test]
    fn test_cache_cleared_when_full() {
        let config = PipelineConfig {
            cache_capacity: 2,
            ..inline_config()
        };
        let pipeline = Pipeline::new(default_registry(), config);
        pipeline.process_text("one");
        pipeline.process_text("two");
        pipeline.process_text("three");
        assert_eq!(pipeline.cached_len(), 1);
    }

    /// Emits liturgy evidence only for input tagged with that provenance
    fn provenance_registry() -> AnalyzerRegistry {
        let mut registry = default_registry();
        registry.register_fn("archivist", "1.0.0", |ctx| {
            if ctx.meta.get("provenance") != Some(&json!("liturgy")) {
                return Ok(AnalyzerOutput::default());
            }
            let evidence = (0..4)
                .map(|i| Evidence {
                    id: format!("archivist:ritual:liturgy:{}", i),
                    tag: EvidenceTag::new("ritual", "liturgy"),
                    span: None,
                    region: None,
                    payload: serde_json::Value::Null,
                    confidence: 1.0,
                    provenance: Provenance {
                        detector: "archivist".to_string(),
                        version: "1.0.0".to_string(),
                        method: "meta".to_string(),
                        timestamp: Utc::now(),
                    },
                })
                .collect();
            Ok(AnalyzerOutput::new(Default::default(), evidence))
        });
        registry
    }

    #[test]
    fn test_cache_keyed_by_metadata() {
        let text = "Quiet words in a quiet room.";
        let plain = ContentInput::new(text, "scan", 1.0);
        let liturgy = ContentInput::new(text, "liturgy", 1.0);

        let pipeline = Pipeline::new(provenance_registry(), inline_config());
        pipeline.process(&plain);
        let cached = pipeline.process(&liturgy);
        assert_eq!(pipeline.cached_len(), 2);

        let fresh = Pipeline::new(provenance_registry(), inline_config()).process(&liturgy);
        assert_eq!(cached, fresh);

        let ritual = |input: &ContentInput| pipeline.analyze(input).unwrap().meaning.model.intent.ritual;
        assert!(ritual(&liturgy) > ritual(&plain));

        pipeline.process(&ContentInput::new(text, "liturgy", 0.9));
        assert_eq!(pipeline.cached_len(), 3);
    }

    #[test]
    fn test_detector_fault_does_not_degrade() {
        let mut registry = default_registry();
        registry.register_fn("broken", "0.0.1", |_| Err(AnalyzerError::failed("always")));
        let pipeline = Pipeline::new(registry, inline_config());
        let input = ContentInput::plain("Why do we pray?");
        assert!(!pipeline.process(&input).is_placeholder());
        let diagnostics = pipeline.diagnose(&input);
        assert!(diagnostics.has_warning(ReasonCode::R201_DETECTOR_FAILED));
        assert_eq!(diagnostics.evidence_count("rhetoric:question"), 1);
    }

    #[test]
    fn test_diagnose_rejected() {
        let diagnostics = Pipeline::default().diagnose(&ContentInput::new("x", "p", 0.0));
        assert!(!diagnostics.accepted);
        assert!(diagnostics.has_warning(ReasonCode::R101_INPUT_REJECTED));
    }

    #[test]
    fn test_analyze_exposes_council() {
        let analysis = Pipeline::new(default_registry(), inline_config())
            .analyze(&ContentInput::plain("In 1848? Yes!"))
            .unwrap();
        assert_eq!(analysis.council.count_of("temporal", "date"), 1);
        assert_eq!(analysis.council.versions.len(), 4);
        assert_eq!(analysis.selection.assignments.len(), 3);
    }
}
