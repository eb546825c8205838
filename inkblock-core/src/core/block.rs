//! Block model: addressable blocks and immutable, depth-annotated snapshots.
//!
//! A document is a flat [`BlockSequence`] in which position plus
//! [`Block::indent`] fully determines the tree: the structural parent of a
//! block is the nearest preceding block with a strictly smaller indent.
//! Sequences are never mutated in place; every structural operation returns a
//! new sequence and leaves the receiver untouched.

use crate::{InkblockError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// The variant of a block. Only structure-relevant behaviour is modelled.
///
/// Serialized as the editor's node type name (`"paragraph"`, `"toggleListItem"`, ...).
/// Unknown names round-trip through [`BlockKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
    Paragraph,
    Heading,
    BulletListItem,
    NumberedListItem,
    CheckListItem,
    Toggle,
    Quote,
    CodeBlock,
    Divider,
    Image,
    Other(String),
}

impl BlockKind {
    /// Returns the node type name used in stored note content.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading => "heading",
            Self::BulletListItem => "bulletListItem",
            Self::NumberedListItem => "numberedListItem",
            Self::CheckListItem => "checkListItem",
            Self::Toggle => "toggleListItem",
            Self::Quote => "quote",
            Self::CodeBlock => "codeBlock",
            Self::Divider => "divider",
            Self::Image => "image",
            Self::Other(name) => name,
        }
    }

    /// Parses a node type name. Never fails; unknown names become [`BlockKind::Other`].
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "paragraph" => Self::Paragraph,
            "heading" => Self::Heading,
            "bulletListItem" => Self::BulletListItem,
            "numberedListItem" => Self::NumberedListItem,
            "checkListItem" => Self::CheckListItem,
            "toggleListItem" | "toggle" => Self::Toggle,
            "quote" | "blockquote" => Self::Quote,
            "codeBlock" => Self::CodeBlock,
            "divider" | "horizontalRule" => Self::Divider,
            "image" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether a cursor can rest inside blocks of this kind.
    #[must_use]
    pub fn is_text_bearing(&self) -> bool {
        !matches!(self, Self::Divider | Self::Image)
    }

    /// Whether blocks of this kind are valid targets of the legacy parent-toggle reference.
    #[must_use]
    pub fn is_toggle(&self) -> bool {
        matches!(self, Self::Toggle)
    }

    /// Whether this is one of the kinds the core knows by name.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for BlockKind {
    fn from(name: String) -> Self {
        Self::from_type_name(&name)
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        kind.type_name().to_string()
    }
}

/// A single addressable unit of document structure.
///
/// Inline content is opaque to the core; only its length is tracked, for
/// document-size accounting in undo grouping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Stable identifier, unique within a document and never reused.
    pub block_id: String,
    /// Nesting depth; zero for top-level blocks.
    pub indent: usize,
    pub kind: BlockKind,
    /// Length of the block's inline text in content units.
    #[serde(default)]
    pub text_len: usize,
    /// Deprecated back-reference to an ancestor toggle block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_parent_toggle_id: Option<String>,
    /// New-style structural parent reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Block {
    /// Creates an empty top-level block of `kind` with a fresh UUID.
    #[must_use]
    pub fn new(kind: BlockKind) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), kind)
    }

    /// Creates an empty top-level block with an explicit identifier.
    #[must_use]
    pub fn with_id(block_id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            block_id: block_id.into(),
            indent: 0,
            kind,
            text_len: 0,
            legacy_parent_toggle_id: None,
            parent_id: None,
        }
    }

    /// Returns this block moved to nesting depth `indent`.
    #[must_use]
    pub fn at_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Returns this block with `text_len` content units of inline text.
    #[must_use]
    pub fn with_text_len(mut self, text_len: usize) -> Self {
        self.text_len = text_len;
        self
    }
}

/// A contiguous span `[from, to)` of sequence indices targeted for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionRange {
    pub from: usize,
    pub to: usize,
}

impl DeletionRange {
    /// Builds a range, checking `from <= to <= len`.
    ///
    /// # Errors
    ///
    /// Returns [`InkblockError::InvalidRange`] if the range does not fit.
    pub fn new(from: usize, to: usize, len: usize) -> Result<Self> {
        if from > to || to > len {
            return Err(InkblockError::InvalidRange { from, to, len });
        }
        Ok(Self { from, to })
    }

    /// Number of blocks covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        (self.from..self.to).contains(&index)
    }
}

/// An immutable, ordered snapshot of a document's blocks.
///
/// Cloning shares the underlying storage, so snapshots can be handed to
/// pure functions and retained in undo history without copying blocks.
///
/// # Examples
///
/// ```rust
/// use inkblock_core::{Block, BlockKind, BlockSequence};
///
/// let blocks = BlockSequence::from(vec![
///     Block::with_id("a", BlockKind::Toggle),
///     Block::with_id("b", BlockKind::Paragraph).at_indent(1),
///     Block::with_id("c", BlockKind::Paragraph),
/// ]);
/// assert_eq!(blocks.structural_parent(1), Some(0));
/// assert_eq!(blocks.top_level_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Block>", into = "Vec<Block>")]
pub struct BlockSequence {
    blocks: Arc<[Block]>,
}

impl Default for BlockSequence {
    fn default() -> Self {
        Self::from(Vec::new())
    }
}

impl From<Vec<Block>> for BlockSequence {
    fn from(blocks: Vec<Block>) -> Self {
        Self {
            blocks: blocks.into(),
        }
    }
}

impl From<BlockSequence> for Vec<Block> {
    fn from(sequence: BlockSequence) -> Self {
        sequence.blocks.to_vec()
    }
}

impl BlockSequence {
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Block> {
        self.blocks.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the index of the block with `block_id`, if present.
    #[must_use]
    pub fn position_of(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.block_id == block_id)
    }

    /// Returns the index of the nearest preceding block with a strictly smaller indent.
    #[must_use]
    pub fn structural_parent(&self, index: usize) -> Option<usize> {
        let indent = self.blocks.get(index)?.indent;
        self.blocks[..index].iter().rposition(|b| b.indent < indent)
    }

    /// Returns the exclusive end index of the subtree rooted at `index`.
    ///
    /// The subtree is the block itself plus every following block with a
    /// strictly greater indent, up to the first block that is not deeper.
    #[must_use]
    pub fn subtree_end(&self, index: usize) -> usize {
        let Some(root) = self.blocks.get(index) else {
            return self.blocks.len();
        };
        self.blocks[index + 1..]
            .iter()
            .position(|b| b.indent <= root.indent)
            .map_or(self.blocks.len(), |offset| index + 1 + offset)
    }

    /// Number of blocks at indent zero.
    #[must_use]
    pub fn top_level_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.indent == 0).count()
    }

    /// Document size in content units: inline text plus one boundary per block.
    #[must_use]
    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(|b| b.text_len + 1).sum()
    }

    /// Returns a new sequence with `range` removed and orphaned descendants promoted.
    ///
    /// Blocks that followed the range and were nested under a removed block
    /// are outdented, keeping their relative shape, so that they attach to the
    /// removed block's former parent. A final pass clamps every block to at
    /// most one level deeper than its predecessor.
    ///
    /// # Errors
    ///
    /// Returns [`InkblockError::InvalidRange`] if `range` does not fit this sequence.
    pub fn without_range(&self, range: DeletionRange) -> Result<Self> {
        let range = DeletionRange::new(range.from, range.to, self.len())?;
        if range.is_empty() {
            return Ok(self.clone());
        }

        let removed_floor = self.blocks[range.from..range.to]
            .iter()
            .map(|b| b.indent)
            .min()
            .unwrap_or(0);
        let orphan_end = self.blocks[range.to..]
            .iter()
            .position(|b| b.indent <= removed_floor)
            .map_or(self.len(), |offset| range.to + offset);

        let mut out: Vec<Block> = Vec::with_capacity(self.len() - range.len());
        out.extend_from_slice(&self.blocks[..range.from]);

        let orphans = &self.blocks[range.to..orphan_end];
        if let Some(orphan_floor) = orphans.iter().map(|b| b.indent).min() {
            let attach_depth = out.last().map_or(0, |prev| prev.indent + 1);
            let target = removed_floor.min(attach_depth);
            let shift = orphan_floor.saturating_sub(target);
            out.extend(
                orphans
                    .iter()
                    .map(|b| b.clone().at_indent(b.indent - shift)),
            );
        }
        out.extend_from_slice(&self.blocks[orphan_end..]);

        Ok(Self::from(normalized(out)))
    }

    /// Returns a new sequence with the block at `index` and its subtree nested one level deeper.
    ///
    /// Returns `None` when the block cannot be indented: it is the first
    /// block, or it is already one level deeper than its predecessor.
    #[must_use]
    pub fn indented(&self, index: usize) -> Option<Self> {
        let block = self.blocks.get(index)?;
        let prev = index.checked_sub(1).and_then(|i| self.blocks.get(i))?;
        if block.indent > prev.indent {
            return None;
        }
        Some(self.shift_subtree(index, |indent| indent + 1))
    }

    /// Returns a new sequence with the block at `index` and its subtree moved one level up.
    ///
    /// Returns `None` for top-level blocks.
    #[must_use]
    pub fn outdented(&self, index: usize) -> Option<Self> {
        let block = self.blocks.get(index)?;
        if block.indent == 0 {
            return None;
        }
        Some(self.shift_subtree(index, |indent| indent - 1))
    }

    /// Returns a new sequence with `block` inserted after the subtree of the block at `index`.
    ///
    /// The inserted block becomes a sibling of the block at `index`; its
    /// indent is overwritten accordingly.
    ///
    /// # Errors
    ///
    /// Returns [`InkblockError::InvariantViolation`] if `index` is out of
    /// bounds or `block` reuses an identifier already in the sequence.
    pub fn inserted_after(&self, index: usize, block: Block) -> Result<Self> {
        let anchor = self.blocks.get(index).ok_or_else(|| {
            InkblockError::InvariantViolation(format!(
                "insert anchor {index} outside a sequence of {} blocks",
                self.len()
            ))
        })?;
        if self.position_of(&block.block_id).is_some() {
            return Err(InkblockError::InvariantViolation(format!(
                "block id {} is already in use",
                block.block_id
            )));
        }
        let at = self.subtree_end(index);
        let mut out = self.blocks.to_vec();
        out.insert(at, block.at_indent(anchor.indent));
        Ok(Self::from(out))
    }

    /// Returns a new sequence with the block at `index` replaced by `f(block)`.
    ///
    /// Intended for non-structural attribute updates; the caller keeps the
    /// indent unchanged.
    #[must_use]
    pub fn with_block(&self, index: usize, f: impl FnOnce(Block) -> Block) -> Option<Self> {
        let block = self.blocks.get(index)?.clone();
        let mut out = self.blocks.to_vec();
        out[index] = f(block);
        Some(Self::from(out))
    }

    fn shift_subtree(&self, index: usize, shift: impl Fn(usize) -> usize) -> Self {
        let end = self.subtree_end(index);
        let out = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| {
                if (index..end).contains(&i) {
                    b.clone().at_indent(shift(b.indent))
                } else {
                    b.clone()
                }
            })
            .collect();
        Self::from(normalized(out))
    }
}

impl<'a> IntoIterator for &'a BlockSequence {
    type Item = &'a Block;
    type IntoIter = std::slice::Iter<'a, Block>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Clamps each block to at most one level deeper than its predecessor.
pub(crate) fn normalized(mut blocks: Vec<Block>) -> Vec<Block> {
    let mut max_indent = 0;
    for block in &mut blocks {
        block.indent = block.indent.min(max_indent);
        max_indent = block.indent + 1;
    }
    blocks
}
