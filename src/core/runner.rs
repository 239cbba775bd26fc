//! Council Runner: invoke every registered detector with fault isolation
//!
//! A failing, panicking or timed-out detector yields a zero-evidence output
//! carrying one warning. The result always has one entry per registered
//! detector, in registration order, whatever happens during execution.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::core::analyzer::{Analyzer, AnalyzerContext, AnalyzerRegistry};
use crate::types::{AnalyzerError, AnalyzerOutput, DetectorRun, ReasonCode, Warning};

type Outcome = Result<AnalyzerOutput, AnalyzerError>;

/// Runs a registry against one document context
#[derive(Debug, Clone, Default)]
pub struct CouncilRunner {
    /// Per-detector budget; `None` runs detectors inline with no timeout
    timeout: Option<Duration>,
    /// Run detectors concurrently (only with a timeout)
    parallel: bool,
}

impl CouncilRunner {
    /// Inline, sequential, no timeout
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// One `DetectorRun` per registered detector, in registration order
    pub fn run(&self, registry: &AnalyzerRegistry, ctx: &Arc<AnalyzerContext>) -> Vec<DetectorRun> {
        let analyzers: Vec<Arc<dyn Analyzer>> = registry.iter().cloned().collect();

        let outcomes: Vec<Outcome> = match self.timeout {
            None => analyzers.iter().map(|a| invoke(a.as_ref(), ctx)).collect(),
            Some(timeout) if self.parallel => run_parallel(&analyzers, ctx, timeout),
            Some(timeout) => analyzers
                .iter()
                .map(|a| run_one_with_timeout(Arc::clone(a), Arc::clone(ctx), timeout))
                .collect(),
        };

        analyzers
            .iter()
            .zip(outcomes)
            .map(|(analyzer, outcome)| to_run(analyzer.as_ref(), outcome))
            .collect()
    }
}

/// Call a detector, converting a panic into an error
fn invoke(analyzer: &dyn Analyzer, ctx: &AnalyzerContext) -> Outcome {
    let started = Instant::now();
    let outcome = match catch_unwind(AssertUnwindSafe(|| analyzer.analyze(ctx))) {
        Ok(result) => result,
        Err(payload) => Err(AnalyzerError::Panicked(panic_message(payload.as_ref()))),
    };
    debug!(
        detector = analyzer.name(),
        elapsed_us = started.elapsed().as_micros() as u64,
        ok = outcome.is_ok(),
        "detector finished"
    );
    outcome
}

fn run_one_with_timeout(analyzer: Arc<dyn Analyzer>, ctx: Arc<AnalyzerContext>, timeout: Duration) -> Outcome {
    let (tx, rx) = mpsc::channel();
    let name = analyzer.name().to_string();
    let spawned = thread::Builder::new()
        .name(format!("detector-{}", name))
        .spawn(move || {
            let _ = tx.send(invoke(analyzer.as_ref(), &ctx));
        });
    if let Err(err) = spawned {
        return Err(AnalyzerError::failed(format!("could not spawn detector thread: {}", err)));
    }
    match rx.recv_timeout(timeout) {
        Ok(outcome) => outcome,
        Err(RecvTimeoutError::Timeout) => Err(AnalyzerError::Timeout(timeout.as_millis() as u64)),
        Err(RecvTimeoutError::Disconnected) => Err(AnalyzerError::Panicked("detector thread exited".to_string())),
    }
}

/// All detectors at once, sharing one deadline; results re-slotted by index
fn run_parallel(analyzers: &[Arc<dyn Analyzer>], ctx: &Arc<AnalyzerContext>, timeout: Duration) -> Vec<Outcome> {
    let (tx, rx) = mpsc::channel::<(usize, Outcome)>();
    let mut outcomes: Vec<Option<Outcome>> = (0..analyzers.len()).map(|_| None).collect();
    let mut pending = 0usize;

    for (idx, analyzer) in analyzers.iter().enumerate() {
        let tx = tx.clone();
        let analyzer = Arc::clone(analyzer);
        let ctx = Arc::clone(ctx);
        let spawned = thread::Builder::new()
            .name(format!("detector-{}", analyzer.name()))
            .spawn(move || {
                let outcome = invoke(analyzer.as_ref(), &ctx);
                let _ = tx.send((idx, outcome));
            });
        match spawned {
            Ok(_) => pending += 1,
            Err(err) => {
                outcomes[idx] = Some(Err(AnalyzerError::failed(format!(
                    "could not spawn detector thread: {}",
                    err
                ))))
            }
        }
    }
    drop(tx);

    let deadline = Instant::now() + timeout;
    while pending > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((idx, outcome)) => {
                outcomes[idx] = Some(outcome);
                pending -= 1;
            }
            Err(_) => break,
        }
    }

    let timeout_ms = timeout.as_millis() as u64;
    outcomes
        .into_iter()
        .map(|slot| slot.unwrap_or(Err(AnalyzerError::Timeout(timeout_ms))))
        .collect()
}

fn to_run(analyzer: &dyn Analyzer, outcome: Outcome) -> DetectorRun {
    let output = match outcome {
        Ok(output) => output,
        Err(err) => {
            let code = match err {
                AnalyzerError::Failed(_) => ReasonCode::R201_DETECTOR_FAILED,
                AnalyzerError::Timeout(_) => ReasonCode::R202_DETECTOR_TIMEOUT,
                AnalyzerError::Panicked(_) => ReasonCode::R203_DETECTOR_PANICKED,
            };
            warn!(detector = analyzer.name(), error = %err, "detector fault isolated");
            AnalyzerOutput::failed(Warning::new(
                code,
                format!("detector '{}' failed: {}", analyzer.name(), err),
            ))
        }
    };
    DetectorRun {
        name: analyzer.name().to_string(),
        version: analyzer.version().to_string(),
        output,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AnalyzerOutput, Evidence, EvidenceTag, Provenance};
    use chrono::Utc;
    use std::collections::BTreeMap;

    fn one_evidence(ctx: &AnalyzerContext) -> Result<AnalyzerOutput, AnalyzerError> {
        let ev = Evidence {
            id: "ok:0".to_string(),
            tag: EvidenceTag::new("test", "hit"),
            span: None,
            region: None,
            payload: serde_json::Value::Null,
            confidence: 1.0,
            provenance: Provenance {
                detector: "ok".to_string(),
                version: "1".to_string(),
                method: "fixed".to_string(),
                timestamp: Utc::now(),
            },
        };
        let mut summary = BTreeMap::new();
        summary.insert("len".to_string(), serde_json::json!(ctx.raw_text.len()));
        Ok(AnalyzerOutput::new(summary, vec![ev]))
    }

    fn registry_with_faults() -> AnalyzerRegistry {
        let mut registry = AnalyzerRegistry::new();
        registry
            .register_fn("err", "1", |_| Err(AnalyzerError::failed("bad input")))
            .register_fn("ok", "1", one_evidence)
            .register_fn("boom", "1", |_| panic!("kaboom"));
        registry
    }

    #[test]
    fn test_inline_isolates_faults() {
        let ctx = Arc::new(AnalyzerContext::default());
        let runs = CouncilRunner::new().run(&registry_with_faults(), &ctx);

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].output.warnings[0].code, ReasonCode::R201_DETECTOR_FAILED);
        assert!(runs[0].output.warnings[0].message.contains("bad input"));
        assert_eq!(runs[1].output.evidence.len(), 1);
        assert_eq!(runs[2].output.warnings[0].code, ReasonCode::R203_DETECTOR_PANICKED);
        assert!(runs[2].output.warnings[0].message.contains("kaboom"));
        assert!(runs[2].output.evidence.is_empty());
    }

    #[test]
    fn test_parallel_keeps_registration_order() {
        let ctx = Arc::new(AnalyzerContext::default());
        let runner = CouncilRunner::new()
            .with_timeout(Duration::from_secs(5))
            .with_parallel(true);
        let runs = runner.run(&registry_with_faults(), &ctx);
        let names: Vec<&str> = runs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["err", "ok", "boom"]);
        assert_eq!(runs[1].output.evidence.len(), 1);
    }

    #[test]
    fn test_timeout_treated_as_fault() {
        let mut registry = AnalyzerRegistry::new();
        registry
            .register_fn("slow", "1", |_| {
                thread::sleep(Duration::from_millis(400));
                Ok(AnalyzerOutput::default())
            })
            .register_fn("ok", "1", one_evidence);
        let ctx = Arc::new(AnalyzerContext::default());

        for parallel in [false, true] {
            let runner = CouncilRunner::new()
                .with_timeout(Duration::from_millis(50))
                .with_parallel(parallel);
            let runs = runner.run(&registry, &ctx);
            assert_eq!(runs.len(), 2);
            assert_eq!(runs[0].output.warnings[0].code, ReasonCode::R202_DETECTOR_TIMEOUT);
            assert_eq!(runs[1].output.evidence.len(), 1);
        }
    }

    #[test]
    fn test_empty_registry() {
        let ctx = Arc::new(AnalyzerContext::default());
        assert!(CouncilRunner::new().run(&AnalyzerRegistry::new(), &ctx).is_empty());
    }
}
