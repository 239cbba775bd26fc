//! Parsed document structures: typed blocks, spans and the block index

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The four block types recognised by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Heading,
    List,
    Blockquote,
    Paragraph,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Heading => "heading",
            BlockKind::List => "list",
            BlockKind::Blockquote => "blockquote",
            BlockKind::Paragraph => "paragraph",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payload of a block, by type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockContent {
    Heading { level: u8, text: String },
    List { items: Vec<String> },
    Blockquote { lines: Vec<String> },
    Paragraph { lines: Vec<String> },
}

/// One typed unit of a parsed document. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Content + position hash; same content at the same line gives the same id
    pub id: String,
    /// 1-based line where the block starts
    pub line: usize,
    #[serde(flatten)]
    pub content: BlockContent,
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self.content {
            BlockContent::Heading { .. } => BlockKind::Heading,
            BlockContent::List { .. } => BlockKind::List,
            BlockContent::Blockquote { .. } => BlockKind::Blockquote,
            BlockContent::Paragraph { .. } => BlockKind::Paragraph,
        }
    }

    /// Marker-free text of the block; multi-line blocks are joined with '\n'
    pub fn text(&self) -> String {
        match &self.content {
            BlockContent::Heading { text, .. } => text.clone(),
            BlockContent::List { items } => items.join("\n"),
            BlockContent::Blockquote { lines } | BlockContent::Paragraph { lines } => lines.join("\n"),
        }
    }

    /// Number of source lines (or items) the block holds
    pub fn line_count(&self) -> usize {
        match &self.content {
            BlockContent::Heading { .. } => 1,
            BlockContent::List { items } => items.len(),
            BlockContent::Blockquote { lines } | BlockContent::Paragraph { lines } => lines.len(),
        }
    }
}

/// Half-open character range [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end: end.max(start) }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Index entry for a single block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Position of the block in `ParsedDoc::blocks`
    pub position: usize,
    pub span: Span,
}

/// Lookup tables over the parsed blocks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocIndex {
    pub by_block: BTreeMap<String, BlockEntry>,
    /// Block ids per type, in document order
    pub by_type: BTreeMap<BlockKind, Vec<String>>,
    /// One span per block, in document order
    pub spans: Vec<Span>,
}

/// Parser output: blocks in document order plus their index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDoc {
    pub blocks: Vec<Block>,
    pub index: DocIndex,
}

impl ParsedDoc {
    /// Empty-but-valid result used for malformed input
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.index
            .by_block
            .get(id)
            .and_then(|entry| self.blocks.get(entry.position))
    }

    pub fn span_of(&self, id: &str) -> Option<Span> {
        self.index.by_block.get(id).map(|entry| entry.span)
    }

    /// Blocks of one type, in document order
    pub fn blocks_of(&self, kind: BlockKind) -> impl Iterator<Item = &Block> + '_ {
        self.index
            .by_type
            .get(&kind)
            .into_iter()
            .flatten()
            .filter_map(move |id| self.block(id))
    }

    /// Blocks paired with their spans, in document order
    pub fn spanned_blocks(&self) -> impl Iterator<Item = (&Block, Span)> + '_ {
        self.blocks.iter().zip(self.index.spans.iter().copied())
    }

    /// Block whose span covers `offset`
    pub fn block_at(&self, offset: usize) -> Option<&Block> {
        let pos = self
            .index
            .spans
            .partition_point(|span| span.end <= offset);
        self.index
            .spans
            .get(pos)
            .filter(|span| span.contains(offset))
            .and_then(|_| self.blocks.get(pos))
    }
}
