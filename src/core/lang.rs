//! Stop-word language tagging (EN / NL)

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref RE_ENGLISH: Regex = Regex::new(
        r"(?i)\b(the|and|is|are|was|were|of|to|in|that|it|with|for|on|this|what|you|not|be|have)\b"
    ).unwrap();

    static ref RE_DUTCH: Regex = Regex::new(
        r"(?i)\b(de|het|een|en|is|zijn|was|waren|van|naar|dat|niet|met|voor|op|dit|wat|jij|je|hebben)\b"
    ).unwrap();
}

/// Minimum stop-word hits before committing to a language
const MIN_HITS: u32 = 2;

/// Language guess with per-language hit counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageHits {
    pub tag: String,
    pub english: u32,
    pub dutch: u32,
}

/// Tag text as `en`, `nl`, or `und`
pub fn detect_language(text: &str) -> LanguageHits {
    let english = RE_ENGLISH.find_iter(text).count() as u32;
    let dutch = RE_DUTCH.find_iter(text).count() as u32;

    let tag = if english.max(dutch) < MIN_HITS || english == dutch {
        "und"
    } else if english > dutch {
        "en"
    } else {
        "nl"
    };

    LanguageHits {
        tag: tag.to_string(),
        english,
        dutch,
    }
}
