//! Evidence Merger: detector runs → Council
//!
//! Execution order of detectors never leaks past this point. Every bucket is
//! re-sorted into the canonical order: `span.start` ascending (missing span
//! is 0), then `id`, then detector name.

use std::cmp::Ordering;

use crate::types::{Council, DetectorRun, Evidence};

/// Canonical evidence order
pub fn canonical_order(a: &Evidence, b: &Evidence) -> Ordering {
    a.start()
        .cmp(&b.start())
        .then_with(|| a.id.cmp(&b.id))
        .then_with(|| a.provenance.detector.cmp(&b.provenance.detector))
}

/// Merge all detector runs into one council
pub fn merge_council(runs: &[DetectorRun]) -> Council {
    let mut council = Council::default();

    for run in runs {
        for ev in &run.output.evidence {
            council.by_type.entry(ev.tag.clone()).or_default().push(ev.clone());
            if let Some(block_id) = ev.block_id() {
                council
                    .by_block
                    .entry(block_id.to_string())
                    .or_default()
                    .push(ev.clone());
            }
        }

        for (key, value) in &run.output.summary {
            council.summary.insert(format!("{}:{}", run.name, key), value.clone());
        }

        council.versions.insert(run.name.clone(), run.version.clone());
        council.warnings.extend(run.output.warnings.iter().cloned());
    }

    for bucket in council.by_type.values_mut() {
        bucket.sort_by(canonical_order);
    }
    for bucket in council.by_block.values_mut() {
        bucket.sort_by(canonical_order);
    }

    council
}

// =============================================================================
// TESTS
// =============================================================================
