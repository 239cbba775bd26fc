//! Pipeline configuration
//!
//! Only operational knobs live here. Scoring weights are pinned in `lib.rs`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::ConfigError;
use crate::{
    DEGENERATE_LENGTH_THRESHOLD, DETECTOR_TIMEOUT_MS, MIN_CONFIDENCE, MIN_CONTENT_CHARS, RENDER_CACHE_CAPACITY,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Inputs below this confidence are rejected at the gate
    pub min_confidence: f64,
    /// Inputs with fewer normalized characters are rejected at the gate
    pub min_content_chars: usize,
    /// Character count below which the degenerate tie-breaker may fire
    pub degenerate_length_threshold: usize,
    /// Per-detector budget; `None` (the default) runs detectors inline with
    /// no timeout, so output never depends on machine speed
    pub detector_timeout_ms: Option<u64>,
    /// Run detectors on their own threads (requires a timeout)
    pub parallel_detectors: bool,
    /// Memoized renderings per pipeline; 0 disables the cache
    pub cache_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_confidence: MIN_CONFIDENCE,
            min_content_chars: MIN_CONTENT_CHARS,
            degenerate_length_threshold: DEGENERATE_LENGTH_THRESHOLD,
            detector_timeout_ms: None,
            parallel_detectors: true,
            cache_capacity: RENDER_CACHE_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Load and validate a JSON config file; missing keys take defaults
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: PipelineConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path: display, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_confidence.is_finite() || !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::Invalid {
                field: "min_confidence",
                reason: format!("must be in [0, 1], got {}", self.min_confidence),
            });
        }
        if self.detector_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid {
                field: "detector_timeout_ms",
                reason: "must be positive; use null to disable".to_string(),
            });
        }
        Ok(())
    }

    /// Opt into the pinned per-detector budget on parallel threads. Evidence
    /// from a detector that overruns it is dropped with a warning.
    pub fn bounded(mut self) -> Self {
        self.detector_timeout_ms = Some(DETECTOR_TIMEOUT_MS);
        self.parallel_detectors = true;
        self
    }

    pub fn detector_timeout(&self) -> Option<Duration> {
        self.detector_timeout_ms.map(Duration::from_millis)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.min_confidence, MIN_CONFIDENCE);
        assert_eq!(config.detector_timeout(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bounded_is_opt_in() {
        let config = PipelineConfig::default().bounded();
        assert_eq!(config.detector_timeout(), Some(Duration::from_millis(DETECTOR_TIMEOUT_MS)));
        assert!(config.parallel_detectors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"detector_timeout_ms": null}"#).unwrap();
        assert_eq!(config.detector_timeout(), None);
        assert_eq!(config.cache_capacity, RENDER_CACHE_CAPACITY);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = PipelineConfig {
            min_confidence: 1.5,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "min_confidence", .. })
        ));
    }

    #[test]
    fn test_from_path_errors() {
        assert!(matches!(
            PipelineConfig::from_path("/nonexistent/emblem.json"),
            Err(ConfigError::Read { .. })
        ));

        let path = std::env::temp_dir().join(format!("emblem-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(PipelineConfig::from_path(&path), Err(ConfigError::Parse { .. })));

        std::fs::write(&path, r#"{"min_content_chars": 5}"#).unwrap();
        let config = PipelineConfig::from_path(&path).unwrap();
        assert_eq!(config.min_content_chars, 5);
        let _ = std::fs::remove_file(&path);
    }
}
