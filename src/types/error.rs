//! Typed errors at the crate's seams

use thiserror::Error;

/// Failure reported by (or on behalf of) a single detector
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzerError {
    #[error("{0}")]
    Failed(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("panicked: {0}")]
    Panicked(String),
}

impl AnalyzerError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Outbound object is missing a required field or carries an invalid value
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("field `{field}` must be a number in [0, 1], got {value}")]
    OutOfRange { field: String, value: f64 },
    #[error("field `{0}` has the wrong type")]
    WrongType(String),
    #[error("seed for `{0}` is empty")]
    EmptySeed(String),
    #[error("family `{0}` is assigned to more than one slot")]
    DuplicateFamily(String),
}

/// Slot layout cannot guarantee distinct families
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("layout has no slots")]
    NoSlots,
    #[error("slot `{0}` appears more than once")]
    DuplicateRole(String),
    #[error("slot `{role}` has {size} candidates, needs at least {required}")]
    PoolTooSmall {
        role: String,
        size: usize,
        required: usize,
    },
    #[error("slot `{role}` lists candidate `{family}` twice")]
    DuplicateCandidate { role: String, family: String },
}

/// Configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
