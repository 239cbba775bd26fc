//! Core types for Emblem

mod block;
mod council;
mod error;
mod evidence;
mod expression;
mod meaning;
mod output;
mod reason;
mod seed;
mod slot;

pub use block::{Block, BlockContent, BlockEntry, BlockKind, DocIndex, ParsedDoc, Span};
pub use council::Council;
pub use error::{AnalyzerError, ConfigError, ContractError, LayoutError};
pub use evidence::{AnalyzerOutput, DetectorRun, Evidence, EvidenceTag, Provenance, Region};
pub use expression::{
    canonical_family, Cadence, ExpressionModel, Family, FamilyEnergies, Scale, FALLBACK_FAMILY,
    FAMILY_PRIORITY,
};
pub use meaning::{Dynamics, Intent, MeaningMeta, MeaningModel, MeaningPriors, MeaningResult, Texture};
pub use output::{ContentInput, Diagnostics, Rendering};
pub use reason::{ReasonCode, Warning};
pub use seed::{to_base36, SeedPackage};
pub use slot::{Selection, SlotAssignment, SlotLayout, SlotSpec};
