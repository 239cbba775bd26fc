//! Reason codes for recovered faults, warnings and placeholder decisions

use serde::{Deserialize, Serialize};

/// Reason codes for everything the pipeline recovers from instead of raising
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R1xx: Content gating
    // =========================================================================
    /// Input below confidence or length gate, treated as empty
    R101_INPUT_REJECTED,
    /// Unexpected fault inside the core, degraded to placeholder
    R102_PIPELINE_FAULT,

    // =========================================================================
    // R2xx: Detector faults (isolated per detector)
    // =========================================================================
    /// Detector returned an error
    R201_DETECTOR_FAILED,
    /// Detector exceeded its time budget
    R202_DETECTOR_TIMEOUT,
    /// Detector panicked
    R203_DETECTOR_PANICKED,

    // =========================================================================
    // R3xx: Evidence quality
    // =========================================================================
    /// Zero evidence on substantial text
    R301_ZERO_EVIDENCE,
    /// Degenerate short input received the seeded tie-breaker
    R302_DEGENERATE_TIEBREAK,

    // =========================================================================
    // R4xx: Selection
    // =========================================================================
    /// Selector exhausted its retries and used the first unused candidate
    R401_SELECTOR_FORCED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R101_INPUT_REJECTED => "R101_INPUT_REJECTED",
            Self::R102_PIPELINE_FAULT => "R102_PIPELINE_FAULT",
            Self::R201_DETECTOR_FAILED => "R201_DETECTOR_FAILED",
            Self::R202_DETECTOR_TIMEOUT => "R202_DETECTOR_TIMEOUT",
            Self::R203_DETECTOR_PANICKED => "R203_DETECTOR_PANICKED",
            Self::R301_ZERO_EVIDENCE => "R301_ZERO_EVIDENCE",
            Self::R302_DEGENERATE_TIEBREAK => "R302_DEGENERATE_TIEBREAK",
            Self::R401_SELECTOR_FORCED => "R401_SELECTOR_FORCED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R101_INPUT_REJECTED => "Insufficient content",
            Self::R102_PIPELINE_FAULT => "Internal fault, placeholder rendered",
            Self::R201_DETECTOR_FAILED => "Detector failed",
            Self::R202_DETECTOR_TIMEOUT => "Detector timed out",
            Self::R203_DETECTOR_PANICKED => "Detector panicked",
            Self::R301_ZERO_EVIDENCE => "No evidence on substantial text",
            Self::R302_DEGENERATE_TIEBREAK => "Degenerate input tie-breaker applied",
            Self::R401_SELECTOR_FORCED => "Selector fell back to first unused candidate",
        }
    }

    /// Is this a fault (as opposed to a data-quality note)?
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::R102_PIPELINE_FAULT
                | Self::R201_DETECTOR_FAILED
                | Self::R202_DETECTOR_TIMEOUT
                | Self::R203_DETECTOR_PANICKED
        )
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// A recovered condition with a human-readable message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub code: ReasonCode,
    pub message: String,
}

impl Warning {
    pub fn new(code: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}
