//! Analyzer contract and registry
//!
//! An analyzer is a `(name, version, analyze)` triple. It receives a read-only
//! `AnalyzerContext` and returns an `AnalyzerOutput` or an `AnalyzerError`.
//! The registry is an explicit value: populate once, then share it read-only.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::types::{AnalyzerError, AnalyzerOutput, ParsedDoc};

/// Everything a detector may look at. Never mutated by detectors.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerContext {
    /// Normalized source text
    pub raw_text: String,
    /// Parsed blocks and index
    pub doc: ParsedDoc,
    /// Detected language tag (`en`, `nl`, `und`)
    pub lang: String,
    /// Optional caller metadata (provenance, confidence, ...)
    pub meta: BTreeMap<String, Value>,
}

impl AnalyzerContext {
    pub fn new(raw_text: impl Into<String>, doc: ParsedDoc, lang: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            doc,
            lang: lang.into(),
            meta: BTreeMap::new(),
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }
}

/// A named, versioned detector
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &str;
    fn version(&self) -> &str;
    fn analyze(&self, ctx: &AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError>;
}

type AnalyzeFn = dyn Fn(&AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> + Send + Sync;

/// Analyzer built from a closure
pub struct FnAnalyzer {
    name: String,
    version: String,
    func: Box<AnalyzeFn>,
}

impl FnAnalyzer {
    pub fn new<F>(name: impl Into<String>, version: impl Into<String>, func: F) -> Self
    where
        F: Fn(&AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            version: version.into(),
            func: Box::new(func),
        }
    }
}

impl std::fmt::Debug for FnAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAnalyzer")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish()
    }
}

impl Analyzer for FnAnalyzer {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn analyze(&self, ctx: &AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> {
        (self.func)(ctx)
    }
}

/// Named detectors in registration order. Re-registering a name replaces
/// the earlier entry in place.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    entries: Vec<Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// Create empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a detector; last registration for a name wins
    pub fn register<A: Analyzer + 'static>(&mut self, analyzer: A) -> &mut Self {
        self.register_arc(Arc::new(analyzer))
    }

    pub fn register_arc(&mut self, analyzer: Arc<dyn Analyzer>) -> &mut Self {
        match self.entries.iter().position(|a| a.name() == analyzer.name()) {
            Some(pos) => {
                tracing::debug!(
                    name = analyzer.name(),
                    old = self.entries[pos].version(),
                    new = analyzer.version(),
                    "replacing registered analyzer"
                );
                self.entries[pos] = analyzer;
            }
            None => self.entries.push(analyzer),
        }
        self
    }

    /// Register a closure as `(name, version, function)`
    pub fn register_fn<F>(&mut self, name: &str, version: &str, func: F) -> &mut Self
    where
        F: Fn(&AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> + Send + Sync + 'static,
    {
        self.register(FnAnalyzer::new(name, version, func))
    }

    /// Builder-style registration
    pub fn with<A: Analyzer + 'static>(mut self, analyzer: A) -> Self {
        self.register(analyzer);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Analyzer>> {
        self.entries.iter().find(|a| a.name() == name)
    }

    /// Detectors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Analyzer>> + '_ {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|a| a.name()).collect()
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<(&str, &str)> = self.entries.iter().map(|a| (a.name(), a.version())).collect();
        f.debug_struct("AnalyzerRegistry").field("entries", &entries).finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> {
        Ok(AnalyzerOutput::default())
    }

    #[test]
    fn test_registration_order() {
        let mut registry = AnalyzerRegistry::new();
        registry.register_fn("b", "1", noop).register_fn("a", "1", noop);
        assert_eq!(registry.names(), vec!["b", "a"]);
    }

    #[test]
    fn test_last_registration_wins_in_place() {
        let mut registry = AnalyzerRegistry::new();
        registry
            .register_fn("x", "1.0", noop)
            .register_fn("y", "1.0", noop)
            .register_fn("x", "2.0", noop);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["x", "y"]);
        assert_eq!(registry.get("x").map(|a| a.version()), Some("2.0"));
    }

    #[test]
    fn test_fn_analyzer_invokes_closure() {
        let analyzer = FnAnalyzer::new("fail", "0.1", |_| Err(AnalyzerError::failed("nope")));
        let ctx = AnalyzerContext::default();
        assert_eq!(analyzer.analyze(&ctx), Err(AnalyzerError::failed("nope")));
    }
}
