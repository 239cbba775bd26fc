//! Emblem: deterministic expression parameters from free-form text
//!
//! text → BlockParser → analyzer council → Meaning Model → Expression Model
//! → seeded multi-slot family selection

pub mod config;
pub mod core;
pub mod telemetry;
pub mod types;

// =============================================================================
// CONTENT GATING
// =============================================================================

/// Inputs below this resolution confidence are treated as empty
pub const MIN_CONFIDENCE: f64 = 0.2;

/// Inputs with fewer normalized characters are treated as empty
pub const MIN_CONTENT_CHARS: usize = 1;

/// Below this many characters an all-zero, evidence-free Meaning Model
/// receives the seeded tie-breaker on `intent.analytical`
pub const DEGENERATE_LENGTH_THRESHOLD: usize = 24;

/// Tie-breaker lies in [BASE, BASE + SPAN)
pub const DEGENERATE_TIEBREAK_BASE: f64 = 0.01;
pub const DEGENERATE_TIEBREAK_SPAN: f64 = 0.02;

// =============================================================================
// MEANING MODEL WEIGHTS [pinned]
// =============================================================================

/// `(evidence type, denominator, weight)`: contributes
/// `weight * min(count / denominator, 1)`. Weights per score sum to ≤ 1.
pub type ScoreTerm = (&'static str, f64, f64);

pub const MM_ANALYTICAL: &[ScoreTerm] = &[
    ("analytic:causal", 3.0, 0.4),
    ("analytic:number", 5.0, 0.3),
    ("structure:list_item", 6.0, 0.2),
    ("structure:heading", 3.0, 0.1),
];

pub const MM_CONTEMPLATIVE: &[ScoreTerm] = &[
    ("rhetoric:question", 4.0, 0.5),
    ("voice:first_person", 6.0, 0.3),
    ("stance:hedge", 3.0, 0.2),
];

pub const MM_RITUAL: &[ScoreTerm] = &[("ritual:liturgy", 4.0, 0.6), ("temporal:cycle", 4.0, 0.4)];

pub const MM_CONTESTED: &[ScoreTerm] = &[
    ("stance:dispute", 3.0, 0.4),
    ("stance:contrast", 4.0, 0.3),
    ("rhetoric:exclamation", 3.0, 0.3),
];

pub const MM_STRUCTURAL_COMPLEXITY: &[ScoreTerm] = &[
    ("structure:heading", 4.0, 0.4),
    ("structure:list_item", 8.0, 0.3),
    ("structure:blockquote", 3.0, 0.3),
];

pub const MM_HISTORICAL_DEPTH: &[ScoreTerm] = &[("temporal:date", 3.0, 0.5), ("temporal:past", 6.0, 0.5)];

pub const MM_PERSONAL_INTIMACY: &[ScoreTerm] = &[
    ("voice:first_person", 8.0, 0.6),
    ("voice:second_person", 6.0, 0.4),
];

pub const MM_CYCLICALITY: &[ScoreTerm] = &[("temporal:cycle", 4.0, 0.7), ("ritual:liturgy", 6.0, 0.3)];

pub const MM_VELOCITY: &[ScoreTerm] = &[
    ("rhetoric:exclamation", 3.0, 0.5),
    ("pacing:short_sentence", 6.0, 0.5),
];

/// Plus `ENTROPY_DISTINCT_TYPES`
pub const MM_ENTROPY: &[ScoreTerm] = &[("stance:contrast", 4.0, 0.5)];

/// `(denominator, weight)` over the number of distinct evidence types
pub const ENTROPY_DISTINCT_TYPES: (f64, f64) = (12.0, 0.5);

/// Plus `POLARITY_BALANCE`
pub const MM_POLARITY: &[ScoreTerm] = &[("stance:negation", 6.0, 0.4)];

/// `(denominator, weight)` over |positive - negative| sentiment evidence
pub const POLARITY_BALANCE: (f64, f64) = (4.0, 0.6);

// =============================================================================
// EXPRESSION MODEL WEIGHTS [pinned]
// =============================================================================

/// `(meaning field, weight)`; weights per parameter sum to 1
pub type ExpressionTerm = (&'static str, f64);

pub const EM_GRIDNESS: &[ExpressionTerm] = &[
    ("intent.analytical", 0.5),
    ("texture.structural_complexity", 0.35),
    ("intent.contested", 0.15),
];

pub const EM_STRATIFICATION: &[ExpressionTerm] = &[
    ("texture.historical_depth", 0.45),
    ("intent.contemplative", 0.3),
    ("intent.ritual", 0.25),
];

pub const EM_FLUX: &[ExpressionTerm] = &[
    ("dynamics.velocity", 0.4),
    ("dynamics.entropy", 0.35),
    ("intent.contested", 0.25),
];

pub const EM_CONSTELLATION: &[ExpressionTerm] = &[
    ("texture.personal_intimacy", 0.4),
    ("texture.cyclicality", 0.35),
    ("intent.contemplative", 0.25),
];

pub const EM_PULSE: &[ExpressionTerm] = &[
    ("dynamics.velocity", 0.5),
    ("texture.cyclicality", 0.3),
    ("intent.ritual", 0.2),
];

pub const EM_ANISOTROPY: &[ExpressionTerm] = &[
    ("dynamics.polarity", 0.5),
    ("intent.contested", 0.3),
    ("texture.structural_complexity", 0.2),
];

pub const EM_DENSITY: &[ExpressionTerm] = &[
    ("texture.structural_complexity", 0.4),
    ("dynamics.entropy", 0.3),
    ("intent.analytical", 0.3),
];

pub const EM_GRANULARITY: &[ExpressionTerm] = &[
    ("dynamics.entropy", 0.4),
    ("texture.historical_depth", 0.35),
    ("dynamics.velocity", 0.25),
];

// =============================================================================
// COUNCIL RUNNER
// =============================================================================

/// Per-detector wall clock budget (milliseconds)
pub const DETECTOR_TIMEOUT_MS: u64 = 250;

/// Rendered documents memoized per pipeline
pub const RENDER_CACHE_CAPACITY: usize = 256;

// =============================================================================
// SEED / PRNG [pinned - never change without bumping HASH_ALGORITHM]
// =============================================================================

/// Version tag of the string hash (31-multiplier over UTF-16 units, i32 wrap)
pub const HASH_ALGORITHM: &str = "h31-utf16-v1";

/// Numerical Recipes LCG, modulus 2^32
pub const LCG_MULTIPLIER: u32 = 1_664_525;
pub const LCG_INCREMENT: u32 = 1_013_904_223;

/// Divisor mapping a hash (at most 2^31) into [0, 1)
pub const HASH_UNIT_DIVISOR: f64 = 2_147_483_649.0;

// =============================================================================
// SLOT SELECTION
// =============================================================================

/// Number of presentation slots in the standard layout
pub const SLOT_COUNT: usize = 3;

/// Retries before the first-unused fallback kicks in
pub const SELECTOR_MAX_ATTEMPTS: u64 = 4;

/// Maximum characters of source text mixed into each slot seed
pub const SLOT_SLICE_CHARS: usize = 64;

/// `(field, multiplier)` per role; bias = round(sum of field * multiplier).
/// Fields name Meaning Model or Expression Model values.
pub const SLOT_BIAS: &[(&str, &[(&str, f64)])] = &[
    ("backdrop", &[("families.gridness", 7.0), ("scale.density", 3.0)]),
    ("frame", &[("texture.structural_complexity", 5.0), ("cadence.anisotropy", 5.0)]),
    ("mark", &[("dynamics.velocity", 5.0), ("cadence.pulse", 5.0)]),
];

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.1.0";
