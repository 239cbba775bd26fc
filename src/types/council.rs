//! Council: merged, canonically ordered evidence for one document

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::types::{Evidence, EvidenceTag, Warning};

/// Merged evidence set. Built once per document, never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Council {
    /// Evidence per type, each bucket in canonical order
    pub by_type: BTreeMap<EvidenceTag, Vec<Evidence>>,
    /// Evidence per block id; items without a block region are absent
    pub by_block: BTreeMap<String, Vec<Evidence>>,
    /// Union of detector summaries, keys rewritten to `detector:key`
    pub summary: BTreeMap<String, Value>,
    /// Detector name → version actually used
    pub versions: BTreeMap<String, String>,
    /// Warnings from all detector runs, in registration order
    pub warnings: Vec<Warning>,
}

impl Council {
    /// Number of evidence items of one type
    pub fn count(&self, tag: &EvidenceTag) -> usize {
        self.by_type.get(tag).map(Vec::len).unwrap_or(0)
    }

    /// Count by namespace and kind without building a tag
    pub fn count_of(&self, namespace: &str, kind: &str) -> usize {
        self.by_type
            .iter()
            .find(|(tag, _)| tag.is(namespace, kind))
            .map(|(_, items)| items.len())
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.by_type.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Number of distinct evidence types present
    pub fn type_count(&self) -> usize {
        self.by_type.values().filter(|items| !items.is_empty()).count()
    }

    /// Evidence count per type, keyed by the wire form `namespace:kind`
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.by_type
            .iter()
            .map(|(tag, items)| (tag.to_string(), items.len()))
            .collect()
    }
}
