//! Built-in detectors
//!
//! Word lists are data: detectors only have to honour the evidence contract
//! (namespaced tag, span in index coordinates, block region, confidence,
//! provenance, run-unique id). Spans are computed per block: block span start
//! plus the character offset inside the block text.

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::core::analyzer::{Analyzer, AnalyzerContext, AnalyzerRegistry};
use crate::types::{
    AnalyzerError, AnalyzerOutput, Block, BlockContent, Evidence, EvidenceTag, Provenance, Region, Span,
};

lazy_static! {
    // =========================================================================
    // Lexicon families (EN + NL)
    // =========================================================================
    static ref LEXICON: Vec<(EvidenceTag, Regex)> = vec![
        lex("analytic", "causal",
            r"(?i)\b(because|therefore|thus|hence|consequently|so that|due to|implies|omdat|daarom|dus|doordat)\b"),
        lex("stance", "hedge",
            r"(?i)\b(perhaps|maybe|might|possibly|seems|wonder|uncertain|misschien|wellicht|mogelijk|lijkt)\b"),
        lex("stance", "contrast",
            r"(?i)\b(but|however|although|yet|whereas|nevertheless|instead|maar|echter|hoewel|toch)\b"),
        lex("stance", "dispute",
            r"(?i)\b(argue|argued|dispute|disputed|deny|denied|against|wrong|false|refute|oneens|tegen|onjuist|fout)\b"),
        lex("stance", "negation",
            r"(?i)\b(not|never|no|nothing|none|cannot|niet|nooit|geen|niets)\b"),
        lex("ritual", "liturgy",
            r"(?i)\b(pray|prayer|ritual|ceremony|rite|blessing|sacred|liturgy|offering|altar|hymn|gebed|bidden|ritueel|zegen|heilig)\b"),
        lex("temporal", "past",
            r"(?i)\b(was|were|had|ancient|ago|century|centuries|history|historical|once|formerly|vroeger|toen|eeuw|geschiedenis)\b"),
        lex("temporal", "cycle",
            r"(?i)\b(again|every|each year|season|seasons|annual|annually|daily|cycle|cycles|return|returns|repeat|weer|elk jaar|seizoen|dagelijks|terugkeer)\b"),
        lex("voice", "first_person",
            r"(?i)\b(i|me|my|mine|myself|we|us|our|ik|mij|mijn|wij|ons|onze)\b"),
        lex("voice", "second_person",
            r"(?i)\b(you|your|yours|yourself|jij|je|jou|jouw|u)\b"),
        lex("sentiment", "positive",
            r"(?i)\b(love|joy|beautiful|good|great|hope|peace|grateful|wonderful|happy|liefde|mooi|goed|hoop|vrede|blij)\b"),
        lex("sentiment", "negative",
            r"(?i)\b(hate|fear|ugly|bad|terrible|grief|anger|angry|sad|awful|pain|haat|angst|slecht|verdriet|boos|pijn)\b"),
    ];

    // =========================================================================
    // Numbers and dates
    // =========================================================================
    static ref RE_NUMBER: Regex = Regex::new(r"\b\d+(?:[.,]\d+)*%?").unwrap();
    static ref RE_YEAR: Regex = Regex::new(r"^(1[0-9]{3}|20[0-9]{2})$").unwrap();

    // Sentence: run of non-terminators, then terminators or end of block
    static ref RE_SENTENCE: Regex = Regex::new(r"[^.!?\n]+[.!?]*").unwrap();
}

fn lex(namespace: &str, kind: &str, pattern: &str) -> (EvidenceTag, Regex) {
    (EvidenceTag::new(namespace, kind), Regex::new(pattern).unwrap())
}

/// Sentences of at most this many words count as short
const SHORT_SENTENCE_WORDS: usize = 4;

/// Registry holding the four built-in detectors
pub fn default_registry() -> AnalyzerRegistry {
    AnalyzerRegistry::new()
        .with(RhetoricDetector)
        .with(StructureDetector)
        .with(LexiconDetector)
        .with(NumericDetector)
}

// =============================================================================
// Evidence emitter shared by the built-ins
// =============================================================================

struct Emitter {
    detector: &'static str,
    version: &'static str,
    timestamp: DateTime<Utc>,
    evidence: Vec<Evidence>,
    counts: BTreeMap<String, usize>,
}

impl Emitter {
    fn new(detector: &'static str, version: &'static str) -> Self {
        Self {
            detector,
            version,
            timestamp: Utc::now(),
            evidence: Vec::new(),
            counts: BTreeMap::new(),
        }
    }

    /// Record one hit at `[char_start, char_start + char_len)` inside `block`
    #[allow(clippy::too_many_arguments)]
    fn emit(
        &mut self,
        tag: &EvidenceTag,
        block: &Block,
        block_span: Span,
        char_start: usize,
        char_len: usize,
        method: &str,
        confidence: f64,
        payload: Value,
    ) {
        let start = block_span.start + char_start;
        let span = Span::new(start, start + char_len);
        let line_offset = block_line_offset(block, char_start);
        self.evidence.push(Evidence {
            id: format!("{}:{}:{}", self.detector, tag, start),
            tag: tag.clone(),
            span: Some(span),
            region: Some(Region {
                block_id: Some(block.id.clone()),
                line: Some(block.line + line_offset),
            }),
            payload,
            confidence: confidence.clamp(0.0, 1.0),
            provenance: Provenance {
                detector: self.detector.to_string(),
                version: self.version.to_string(),
                method: method.to_string(),
                timestamp: self.timestamp,
            },
        });
        *self.counts.entry(tag.to_string()).or_insert(0) += 1;
    }

    fn finish(self, mut summary: BTreeMap<String, Value>) -> AnalyzerOutput {
        for (tag, count) in self.counts {
            summary.insert(tag, json!(count));
        }
        AnalyzerOutput::new(summary, self.evidence)
    }
}

/// Which line of a multi-line block a character offset falls on
fn block_line_offset(block: &Block, char_start: usize) -> usize {
    if matches!(block.content, BlockContent::Heading { .. }) {
        return 0;
    }
    block.text().chars().take(char_start).filter(|c| *c == '\n').count()
}

fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

// =============================================================================
// rhetoric: questions, exclamations, short sentences
// =============================================================================

/// Punctuation-level rhetoric and pacing
#[derive(Debug, Default)]
pub struct RhetoricDetector;

impl Analyzer for RhetoricDetector {
    fn name(&self) -> &str {
        "rhetoric"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn analyze(&self, ctx: &AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> {
        let question = EvidenceTag::new("rhetoric", "question");
        let exclamation = EvidenceTag::new("rhetoric", "exclamation");
        let short = EvidenceTag::new("pacing", "short_sentence");
        let mut emitter = Emitter::new("rhetoric", "1.0.0");
        let mut sentences = 0usize;

        for (block, span) in ctx.doc.spanned_blocks() {
            let text = block.text();
            for (i, c) in text.chars().enumerate() {
                match c {
                    '?' => emitter.emit(&question, block, span, i, 1, "punctuation", 1.0, Value::Null),
                    '!' => emitter.emit(&exclamation, block, span, i, 1, "punctuation", 1.0, Value::Null),
                    _ => {}
                }
            }
            for m in RE_SENTENCE.find_iter(&text) {
                let words = m.as_str().split_whitespace().count();
                if words == 0 {
                    continue;
                }
                sentences += 1;
                if words <= SHORT_SENTENCE_WORDS {
                    let leading = m.as_str().len() - m.as_str().trim_start().len();
                    let start = char_offset(&text, m.start() + leading);
                    let len = m.as_str().trim().chars().count();
                    emitter.emit(&short, block, span, start, len, "sentence-split", 0.7, json!({ "words": words }));
                }
            }
        }

        let mut summary = BTreeMap::new();
        summary.insert("sentences".to_string(), json!(sentences));
        Ok(emitter.finish(summary))
    }
}

// =============================================================================
// structure: headings, list items, blockquotes
// =============================================================================

/// Document structure from the parsed blocks
#[derive(Debug, Default)]
pub struct StructureDetector;

impl Analyzer for StructureDetector {
    fn name(&self) -> &str {
        "structure"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn analyze(&self, ctx: &AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> {
        let heading = EvidenceTag::new("structure", "heading");
        let list_item = EvidenceTag::new("structure", "list_item");
        let quote = EvidenceTag::new("structure", "blockquote");
        let mut emitter = Emitter::new("structure", "1.0.0");
        let mut max_level = 0u8;

        for (block, span) in ctx.doc.spanned_blocks() {
            match &block.content {
                BlockContent::Heading { level, .. } => {
                    max_level = max_level.max(*level);
                    emitter.emit(&heading, block, span, 0, span.len(), "marker", 1.0, json!({ "level": level }));
                }
                BlockContent::List { items } => {
                    let mut offset = 0usize;
                    for (n, item) in items.iter().enumerate() {
                        let len = item.chars().count();
                        emitter.emit(&list_item, block, span, offset, len, "marker", 1.0, json!({ "index": n }));
                        offset += len + 1;
                    }
                }
                BlockContent::Blockquote { lines } => {
                    emitter.emit(&quote, block, span, 0, span.len(), "marker", 1.0, json!({ "lines": lines.len() }));
                }
                BlockContent::Paragraph { .. } => {}
            }
        }

        let mut summary = BTreeMap::new();
        summary.insert("blocks".to_string(), json!(ctx.doc.blocks.len()));
        summary.insert("max_heading_level".to_string(), json!(max_level));
        Ok(emitter.finish(summary))
    }
}

// =============================================================================
// lexicon: word-family matches
// =============================================================================

/// Regex word families over every block
#[derive(Debug, Default)]
pub struct LexiconDetector;

impl Analyzer for LexiconDetector {
    fn name(&self) -> &str {
        "lexicon"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn analyze(&self, ctx: &AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> {
        let mut emitter = Emitter::new("lexicon", "1.0.0");

        for (block, span) in ctx.doc.spanned_blocks() {
            let text = block.text();
            for (tag, regex) in LEXICON.iter() {
                for m in regex.find_iter(&text) {
                    let start = char_offset(&text, m.start());
                    let len = m.as_str().chars().count();
                    emitter.emit(tag, block, span, start, len, "lexicon", 0.8, json!({ "match": m.as_str() }));
                }
            }
        }

        let mut summary = BTreeMap::new();
        summary.insert("lang".to_string(), json!(ctx.lang));
        Ok(emitter.finish(summary))
    }
}

// =============================================================================
// numeric: numbers and years
// =============================================================================

/// Numbers, with four-digit years split out as dates
#[derive(Debug, Default)]
pub struct NumericDetector;

impl Analyzer for NumericDetector {
    fn name(&self) -> &str {
        "numeric"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn analyze(&self, ctx: &AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> {
        let number = EvidenceTag::new("analytic", "number");
        let date = EvidenceTag::new("temporal", "date");
        let mut emitter = Emitter::new("numeric", "1.0.0");

        for (block, span) in ctx.doc.spanned_blocks() {
            let text = block.text();
            for m in RE_NUMBER.find_iter(&text) {
                let start = char_offset(&text, m.start());
                let len = m.as_str().chars().count();
                let payload = json!({ "value": m.as_str() });
                if RE_YEAR.is_match(m.as_str()) {
                    emitter.emit(&date, block, span, start, len, "year-pattern", 0.6, payload);
                } else {
                    emitter.emit(&number, block, span, start, len, "digit-run", 0.9, payload);
                }
            }
        }

        Ok(emitter.finish(BTreeMap::new()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block_parser::BlockParser;

    fn ctx(text: &str) -> AnalyzerContext {
        AnalyzerContext::new(text, BlockParser::new().parse(text), "en")
    }

    fn count(output: &AnalyzerOutput, ns: &str, kind: &str) -> usize {
        output.evidence.iter().filter(|e| e.tag.is(ns, kind)).count()
    }

    #[test]
    fn test_questions_counted() {
        let out = RhetoricDetector.analyze(&ctx("Why? How? Where?")).unwrap();
        assert_eq!(count(&out, "rhetoric", "question"), 3);
        let starts: Vec<usize> = out
            .evidence
            .iter()
            .filter(|e| e.tag.is("rhetoric", "question"))
            .map(|e| e.start())
            .collect();
        assert_eq!(starts, vec![3, 8, 15]);
    }

    #[test]
    fn test_short_sentences() {
        let out = RhetoricDetector
            .analyze(&ctx("Stop. This sentence has rather more than four words in it."))
            .unwrap();
        assert_eq!(count(&out, "pacing", "short_sentence"), 1);
        assert_eq!(out.summary["sentences"], json!(2));
    }

    #[test]
    fn test_structure_evidence() {
        let out = StructureDetector
            .analyze(&ctx("# Title\n- a\n- b\n> said\nplain"))
            .unwrap();
        assert_eq!(count(&out, "structure", "heading"), 1);
        assert_eq!(count(&out, "structure", "list_item"), 2);
        assert_eq!(count(&out, "structure", "blockquote"), 1);
        assert_eq!(out.evidence.len(), 4);
    }

    #[test]
    fn test_list_item_regions() {
        let out = StructureDetector.analyze(&ctx("- a\n- b")).unwrap();
        let lines: Vec<Option<usize>> = out
            .evidence
            .iter()
            .map(|e| e.region.as_ref().and_then(|r| r.line))
            .collect();
        assert_eq!(lines, vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_lexicon_hits() {
        let out = LexiconDetector
            .analyze(&ctx("We pray every season, because the ritual returns."))
            .unwrap();
        assert_eq!(count(&out, "ritual", "liturgy"), 2);
        assert_eq!(count(&out, "analytic", "causal"), 1);
        assert!(count(&out, "temporal", "cycle") >= 2);
        assert_eq!(count(&out, "voice", "first_person"), 1);
    }

    #[test]
    fn test_numeric_years_split() {
        let out = NumericDetector.analyze(&ctx("In 1848 there were 42 barricades.")).unwrap();
        assert_eq!(count(&out, "temporal", "date"), 1);
        assert_eq!(count(&out, "analytic", "number"), 1);
    }

    #[test]
    fn test_ids_unique_per_run() {
        let out = LexiconDetector
            .analyze(&ctx("but but but, however, I was not there"))
            .unwrap();
        let mut ids: Vec<&str> = out.evidence.iter().map(|e| e.id.as_str()).collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn test_default_registry_order() {
        assert_eq!(
            default_registry().names(),
            vec!["rhetoric", "structure", "lexicon", "numeric"]
        );
    }
}
