//! Core engines for Emblem

pub mod analyzer;
pub mod api;
pub mod binding;
pub mod block_parser;
pub mod detectors;
pub mod expression;
pub mod lang;
pub mod meaning;
pub mod merger;
pub mod pipeline;
pub mod runner;
pub mod seed;
pub mod selector;

pub use analyzer::{Analyzer, AnalyzerContext, AnalyzerRegistry, FnAnalyzer};
pub use api::{create_router, run_server};
pub use binding::{Binding, BoundSlot};
pub use block_parser::{normalize_text, BlockParser};
pub use detectors::{default_registry, LexiconDetector, NumericDetector, RhetoricDetector, StructureDetector};
pub use expression::{dominant, dominant_family, ExpressionBuilder};
pub use lang::{detect_language, LanguageHits};
pub use meaning::MeaningBuilder;
pub use merger::{canonical_order, merge_council};
pub use pipeline::{Analysis, Pipeline};
pub use runner::CouncilRunner;
pub use seed::{content_seed, derive_seed, stable_hash, Lcg};
pub use selector::{slot_bias, slot_slices, FamilySelector};
