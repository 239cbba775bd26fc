//! Evidence: the atomic unit of analysis produced by detectors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{Span, Warning};

/// Namespaced evidence type, written `namespace:kind` on the wire
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EvidenceTag {
    pub namespace: String,
    pub kind: String,
}

impl EvidenceTag {
    pub fn new(namespace: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.into(),
        }
    }

    /// Parse `namespace:kind`; both halves must be non-empty
    pub fn parse(raw: &str) -> Option<Self> {
        let (namespace, kind) = raw.split_once(':')?;
        if namespace.is_empty() || kind.is_empty() {
            return None;
        }
        Some(Self::new(namespace, kind))
    }

    pub fn is(&self, namespace: &str, kind: &str) -> bool {
        self.namespace == namespace && self.kind == kind
    }
}

impl std::fmt::Display for EvidenceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.kind)
    }
}

impl From<EvidenceTag> for String {
    fn from(tag: EvidenceTag) -> Self {
        tag.to_string()
    }
}

impl TryFrom<String> for EvidenceTag {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        EvidenceTag::parse(&raw).ok_or_else(|| format!("evidence type '{}' is not namespace:kind", raw))
    }
}

/// Where in the document an evidence item sits
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
}

/// Which detector produced an item, and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub detector: String,
    pub version: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
}

/// One detection. Immutable after the producing detector returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Unique per detector run; final tie-break of the canonical order
    pub id: String,
    #[serde(rename = "type")]
    pub tag: EvidenceTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    #[serde(default)]
    pub payload: Value,
    /// 0.0-1.0
    pub confidence: f64,
    pub provenance: Provenance,
}

impl Evidence {
    /// Sort key start; a missing span sorts as 0
    pub fn start(&self) -> usize {
        self.span.map(|s| s.start).unwrap_or(0)
    }

    pub fn block_id(&self) -> Option<&str> {
        self.region.as_ref().and_then(|r| r.block_id.as_deref())
    }
}

/// One detector's result for one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerOutput {
    /// Detector-local aggregates (counts, labels)
    #[serde(default)]
    pub summary: BTreeMap<String, Value>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

impl AnalyzerOutput {
    pub fn new(summary: BTreeMap<String, Value>, evidence: Vec<Evidence>) -> Self {
        Self {
            summary,
            evidence,
            warnings: Vec::new(),
        }
    }

    /// Zero-evidence output carrying a single warning
    pub fn failed(warning: Warning) -> Self {
        Self {
            summary: BTreeMap::new(),
            evidence: Vec::new(),
            warnings: vec![warning],
        }
    }
}

/// Runner result entry: one per registered detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorRun {
    pub name: String,
    pub version: String,
    pub output: AnalyzerOutput,
}
