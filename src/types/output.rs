//! Pipeline boundary: inbound content, outbound rendering, diagnostics

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{ExpressionModel, MeaningModel, ReasonCode, SlotAssignment, Warning};

/// Resolved content handed over by the content-resolution collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentInput {
    pub text: String,
    #[serde(default = "default_provenance")]
    pub provenance: String,
    /// 0.0-1.0
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_provenance() -> String {
    "unknown".to_string()
}

fn default_confidence() -> f64 {
    1.0
}

impl ContentInput {
    pub fn new(text: impl Into<String>, provenance: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            provenance: provenance.into(),
            confidence,
        }
    }

    /// Fully trusted plain text
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, default_provenance(), default_confidence())
    }
}

/// Everything a renderer receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rendering {
    /// Neutral placeholder for insufficient content or degraded faults
    Placeholder { reason: ReasonCode },
    Expressed {
        expression: ExpressionModel,
        slots: Vec<SlotAssignment>,
    },
}

impl Rendering {
    pub fn placeholder(reason: ReasonCode) -> Self {
        Rendering::Placeholder { reason }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Rendering::Placeholder { .. })
    }

    pub fn expression(&self) -> Option<&ExpressionModel> {
        match self {
            Rendering::Expressed { expression, .. } => Some(expression),
            Rendering::Placeholder { .. } => None,
        }
    }

    pub fn slots(&self) -> &[SlotAssignment] {
        match self {
            Rendering::Expressed { slots, .. } => slots,
            Rendering::Placeholder { .. } => &[],
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        match self {
            Rendering::Placeholder { reason } => {
                format!("{} {}", "◌ placeholder".dimmed(), reason.code().dimmed())
            }
            Rendering::Expressed { expression, slots } => {
                let mut out = format!("{} seed={}", "◆".cyan(), expression.seed.bold());
                for slot in slots {
                    out.push_str(&format!(
                        " | {}={} ({})",
                        slot.role,
                        slot.family.green(),
                        slot.seed
                    ));
                }
                out
            }
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        match self {
            Rendering::Placeholder { reason } => format!("placeholder | reason={}", reason.code()),
            Rendering::Expressed { expression, slots } => {
                let slots: Vec<String> = slots
                    .iter()
                    .map(|s| format!("{}={}@{}", s.role, s.family, s.seed))
                    .collect();
                format!("seed={} | {}", expression.seed, slots.join(" | "))
            }
        }
    }
}

/// Debug/test view of one document's run. Not for production control flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub timestamp: DateTime<Utc>,
    pub accepted: bool,
    pub language: String,
    pub evidence_counts: BTreeMap<String, usize>,
    pub versions: BTreeMap<String, String>,
    pub warnings: Vec<Warning>,
    pub base_seed: Option<String>,
    pub dominant_family: Option<String>,
    pub slots: Vec<SlotAssignment>,
    pub meaning: Option<MeaningModel>,
    pub expression: Option<ExpressionModel>,
}

impl Diagnostics {
    /// Diagnostics for input rejected at the gate
    pub fn rejected(warning: Warning) -> Self {
        Self {
            timestamp: Utc::now(),
            accepted: false,
            language: "und".to_string(),
            evidence_counts: BTreeMap::new(),
            versions: BTreeMap::new(),
            warnings: vec![warning],
            base_seed: None,
            dominant_family: None,
            slots: Vec::new(),
            meaning: None,
            expression: None,
        }
    }

    pub fn evidence_count(&self, tag: &str) -> usize {
        self.evidence_counts.get(tag).copied().unwrap_or(0)
    }

    pub fn has_warning(&self, code: ReasonCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Multi-line report for terminal display
    pub fn to_report(&self, no_color: bool) -> String {
        let paint = |s: &str| {
            if no_color {
                s.to_string()
            } else {
                s.bold().to_string()
            }
        };
        let mut lines = Vec::new();
        lines.push(format!("{} accepted={} lang={}", paint("┌ diagnostics"), self.accepted, self.language));
        lines.push(format!("│ base seed: {}", self.base_seed.as_deref().unwrap_or("-")));
        if let Some(dominant) = &self.dominant_family {
            lines.push(format!("│ dominant family: {}", dominant));
        }
        lines.push(paint("├ evidence"));
        for (tag, count) in &self.evidence_counts {
            lines.push(format!("│   {:<28} {}", tag, count));
        }
        lines.push(paint("├ detectors"));
        for (name, version) in &self.versions {
            lines.push(format!("│   {:<28} {}", name, version));
        }
        if let Some(mm) = &self.meaning {
            lines.push(paint("├ meaning"));
            for (field, value) in mm.fields() {
                lines.push(format!("│   {:<28} {:.4}", field, value));
            }
        }
        if let Some(em) = &self.expression {
            lines.push(paint("├ expression"));
            for (field, value) in em.fields() {
                lines.push(format!("│   {:<28} {:.4}", field, value));
            }
        }
        lines.push(paint("├ slots"));
        for slot in &self.slots {
            let forced = if slot.forced { " (forced)" } else { "" };
            lines.push(format!("│   {:<10} {:<14} seed={}{}", slot.role, slot.family, slot.seed, forced));
        }
        if !self.warnings.is_empty() {
            lines.push(paint("├ warnings"));
            for warning in &self.warnings {
                lines.push(format!("│   {}", warning));
            }
        }
        lines.push("└".to_string());
        lines.join("\n")
    }
}
