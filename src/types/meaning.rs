//! Meaning Model: bounded intent / texture / dynamics scores

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Warning;

/// What the text is trying to do (each 0.0-1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub analytical: f64,
    pub contemplative: f64,
    pub ritual: f64,
    pub contested: f64,
}

/// What the text is made of (each 0.0-1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub structural_complexity: f64,
    pub historical_depth: f64,
    pub personal_intimacy: f64,
    pub cyclicality: f64,
}

/// How the text moves (each 0.0-1.0)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dynamics {
    pub velocity: f64,
    pub entropy: f64,
    pub polarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeaningMeta {
    /// Stable hash of the NFC-normalized, trimmed text
    pub seed: String,
    pub length_words: usize,
    pub timestamp: DateTime<Utc>,
}

/// One per document; pure function of (council, text, priors)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeaningModel {
    pub intent: Intent,
    pub texture: Texture,
    pub dynamics: Dynamics,
    pub meta: MeaningMeta,
}

impl MeaningModel {
    /// Every score, labelled, in a fixed order
    pub fn fields(&self) -> [(&'static str, f64); 11] {
        [
            ("intent.analytical", self.intent.analytical),
            ("intent.contemplative", self.intent.contemplative),
            ("intent.ritual", self.intent.ritual),
            ("intent.contested", self.intent.contested),
            ("texture.structural_complexity", self.texture.structural_complexity),
            ("texture.historical_depth", self.texture.historical_depth),
            ("texture.personal_intimacy", self.texture.personal_intimacy),
            ("texture.cyclicality", self.texture.cyclicality),
            ("dynamics.velocity", self.dynamics.velocity),
            ("dynamics.entropy", self.dynamics.entropy),
            ("dynamics.polarity", self.dynamics.polarity),
        ]
    }

    pub fn is_all_zero(&self) -> bool {
        self.fields().iter().all(|(_, v)| *v == 0.0)
    }

    /// Same scores and seed, ignoring the build timestamp
    pub fn same_meaning(&self, other: &MeaningModel) -> bool {
        self.intent == other.intent
            && self.texture == other.texture
            && self.dynamics == other.dynamics
            && self.meta.seed == other.meta.seed
            && self.meta.length_words == other.meta.length_words
    }
}

/// Editorial nudges added after weighting. Values are not pre-clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeaningPriors {
    pub intent: Intent,
    pub texture: Texture,
    pub dynamics: Dynamics,
}

/// Builder output: the model plus evidence-quality warnings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeaningResult {
    pub model: MeaningModel,
    pub warnings: Vec<Warning>,
}
