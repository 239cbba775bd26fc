//! Block Parser: raw text → typed blocks with stable ids and spans
//!
//! Leading markers classify each line:
//! - `#`..`######` + space → heading (always its own block)
//! - `-`, `*`, `+`, `1.`, `1)` + space → list item
//! - `>` → blockquote line
//! - anything else → paragraph line
//!
//! Consecutive lines of the same type accumulate; a blank line or a change of
//! marker closes the open block.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use unicode_normalization::UnicodeNormalization;

use crate::types::{Block, BlockContent, BlockEntry, BlockKind, DocIndex, ParsedDoc, Span};

/// NFC-normalize, unify line endings, drop trailing whitespace-only lines
pub fn normalize_text(raw: &str) -> String {
    let nfc: String = raw.replace("\r\n", "\n").replace('\r', "\n").nfc().collect();
    let mut lines: Vec<&str> = nfc.lines().collect();
    while lines.last().map(|l| l.trim().is_empty()).unwrap_or(false) {
        lines.pop();
    }
    lines.join("\n")
}

/// One classified source line
#[derive(Debug, PartialEq)]
enum LineClass<'a> {
    Blank,
    Heading(u8, &'a str),
    ListItem(&'a str),
    Quote(&'a str),
    Text(&'a str),
}

/// Block parser
#[derive(Debug, Default)]
pub struct BlockParser;

impl BlockParser {
    /// Create new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse already-normalized text. Empty input → empty document.
    pub fn parse(&self, text: &str) -> ParsedDoc {
        if text.trim().is_empty() {
            return ParsedDoc::empty();
        }

        let mut blocks: Vec<Block> = Vec::new();
        let mut open: Option<(BlockKind, usize, Vec<String>)> = None;

        for (i, line) in text.lines().enumerate() {
            let line_no = i + 1;
            match classify(line) {
                LineClass::Blank => close(&mut open, &mut blocks),
                LineClass::Heading(level, body) => {
                    close(&mut open, &mut blocks);
                    let content = BlockContent::Heading {
                        level,
                        text: body.to_string(),
                    };
                    blocks.push(make_block(line_no, content));
                }
                LineClass::ListItem(body) => push_line(&mut open, &mut blocks, BlockKind::List, line_no, body),
                LineClass::Quote(body) => push_line(&mut open, &mut blocks, BlockKind::Blockquote, line_no, body),
                LineClass::Text(body) => push_line(&mut open, &mut blocks, BlockKind::Paragraph, line_no, body),
            }
        }
        close(&mut open, &mut blocks);

        let index = build_index(&blocks);
        ParsedDoc { blocks, index }
    }

    /// Parse a loosely typed value; anything but a string → empty document
    pub fn parse_value(&self, value: &Value) -> ParsedDoc {
        match value {
            Value::String(text) => self.parse(&normalize_text(text)),
            _ => ParsedDoc::empty(),
        }
    }
}

fn classify(line: &str) -> LineClass<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return LineClass::Blank;
    }

    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) {
        let rest = &trimmed[hashes..];
        if rest.is_empty() || rest.starts_with(' ') {
            return LineClass::Heading(hashes as u8, rest.trim());
        }
    }

    if let Some(rest) = trimmed.strip_prefix('>') {
        return LineClass::Quote(rest.trim());
    }

    for marker in ["- ", "* ", "+ "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return LineClass::ListItem(rest.trim());
        }
    }

    let digits = trimmed.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 && digits <= 9 {
        let rest = &trimmed[digits..];
        if let Some(item) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return LineClass::ListItem(item.trim());
        }
    }

    LineClass::Text(trimmed)
}

fn push_line(
    open: &mut Option<(BlockKind, usize, Vec<String>)>,
    blocks: &mut Vec<Block>,
    kind: BlockKind,
    line_no: usize,
    body: &str,
) {
    match open {
        Some((open_kind, _, lines)) if *open_kind == kind => lines.push(body.to_string()),
        _ => {
            close(open, blocks);
            *open = Some((kind, line_no, vec![body.to_string()]));
        }
    }
}

fn close(open: &mut Option<(BlockKind, usize, Vec<String>)>, blocks: &mut Vec<Block>) {
    if let Some((kind, line_no, lines)) = open.take() {
        let content = match kind {
            BlockKind::List => BlockContent::List { items: lines },
            BlockKind::Blockquote => BlockContent::Blockquote { lines },
            // headings never stay open
            BlockKind::Paragraph | BlockKind::Heading => BlockContent::Paragraph { lines },
        };
        blocks.push(make_block(line_no, content));
    }
}

fn make_block(line: usize, content: BlockContent) -> Block {
    let mut block = Block {
        id: String::new(),
        line,
        content,
    };
    block.id = block_id(block.kind(), line, &block.text());
    block
}

/// Content + position hash: `b` + first 12 hex chars of SHA-256
fn block_id(kind: BlockKind, line: usize, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update([0x1f]);
    hasher.update(line.to_string().as_bytes());
    hasher.update([0x1f]);
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest[..6].iter().map(|b| format!("{:02x}", b)).collect();
    format!("b{}", hex)
}

/// Accumulate block text length plus one separator per block
fn build_index(blocks: &[Block]) -> DocIndex {
    let mut by_block = BTreeMap::new();
    let mut by_type: BTreeMap<BlockKind, Vec<String>> = BTreeMap::new();
    let mut spans = Vec::with_capacity(blocks.len());
    let mut cursor = 0usize;

    for (position, block) in blocks.iter().enumerate() {
        let len = block.text().chars().count();
        let span = Span::new(cursor, cursor + len);
        cursor = span.end + 1;

        by_block.insert(block.id.clone(), BlockEntry { position, span });
        by_type.entry(block.kind()).or_default().push(block.id.clone());
        spans.push(span);
    }

    DocIndex {
        by_block,
        by_type,
        spans,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_input() {
        let parser = BlockParser::new();
        assert!(parser.parse("").is_empty());
        assert!(parser.parse("   \n\n  ").is_empty());
        assert_eq!(parser.parse("").index, DocIndex::default());
    }

    #[test]
    fn test_non_string_value() {
        let parser = BlockParser::new();
        assert!(parser.parse_value(&Value::Null).is_empty());
        assert!(parser.parse_value(&serde_json::json!(42)).is_empty());
        assert!(!parser.parse_value(&serde_json::json!("hello")).is_empty());
    }

    #[test]
    fn test_classification() {
        let doc = BlockParser::new().parse("# Title\n- one\n- two\n> quoted\nplain line\nsecond line");
        let kinds: Vec<BlockKind> = doc.blocks.iter().map(|b| b.kind()).collect();
        assert_eq!(
            kinds,
            vec![BlockKind::Heading, BlockKind::List, BlockKind::Blockquote, BlockKind::Paragraph]
        );
        assert_eq!(
            doc.blocks[1].content,
            BlockContent::List {
                items: vec!["one".to_string(), "two".to_string()]
            }
        );
        assert_eq!(doc.blocks[3].line, 5);
        assert_eq!(doc.blocks[3].line_count(), 2);
    }

    #[test]
    fn test_heading_levels() {
        let doc = BlockParser::new().parse("### Deep\n#NoSpace");
        assert_eq!(
            doc.blocks[0].content,
            BlockContent::Heading {
                level: 3,
                text: "Deep".to_string()
            }
        );
        assert_eq!(doc.blocks[1].kind(), BlockKind::Paragraph);
    }

    #[test]
    fn test_consecutive_headings_are_separate() {
        let doc = BlockParser::new().parse("# A\n# B");
        assert_eq!(doc.blocks.len(), 2);
    }

    #[test]
    fn test_blank_line_closes_block() {
        let doc = BlockParser::new().parse("first\n\nsecond");
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[1].line, 3);
    }

    #[test]
    fn test_ordered_list_markers() {
        let doc = BlockParser::new().parse("1. first\n2) second");
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].kind(), BlockKind::List);
    }

    #[test]
    fn test_spans_accumulate_with_separator() {
        let doc = BlockParser::new().parse("# Hi\nabc\n\nde");
        assert_eq!(doc.index.spans, vec![Span::new(0, 2), Span::new(3, 6), Span::new(7, 9)]);
    }

    #[test]
    fn test_block_ids_stable_and_positional() {
        let parser = BlockParser::new();
        let a = parser.parse("hello\n\nhello");
        let b = parser.parse("hello\n\nhello");
        assert_eq!(a.blocks[0].id, b.blocks[0].id);
        assert_ne!(a.blocks[0].id, a.blocks[1].id);
    }

    #[test]
    fn test_index_lookup() {
        let doc = BlockParser::new().parse("# T\n- x\n- y");
        let list_id = &doc.blocks[1].id;
        assert_eq!(doc.block(list_id).map(|b| b.kind()), Some(BlockKind::List));
        assert_eq!(doc.blocks_of(BlockKind::List).count(), 1);
        assert_eq!(doc.block_at(2).map(|b| b.kind()), Some(BlockKind::List));
        assert_eq!(doc.block_at(0).map(|b| b.kind()), Some(BlockKind::Heading));
    }

    #[test]
    fn test_normalize_trims_trailing_blank_lines() {
        assert_eq!(normalize_text("a\r\nb\n  \n\t\n"), "a\nb");
        // e + combining acute → é
        assert_eq!(normalize_text("e\u{0301}"), "\u{00e9}");
    }
}
