//! Decoding stored note content into a [`BlockSequence`] snapshot.
//!
//! Notes persist their body as editor JSON:
//!
//! ```json
//! {"type": "doc", "content": [
//!   {"type": "toggleListItem", "attrs": {"blockId": "t"}, "content": [
//!     {"type": "text", "text": "Details"},
//!     {"type": "paragraph", "attrs": {"blockId": "p", "parentToggleId": "t"}}
//!   ]}
//! ]}
//! ```
//!
//! Block nodes nested inside another block's `content` are flattened after
//! their container, one level deeper unless they carry an explicit `indent`.
//! Indents are then clamped to at most one level below the preceding block.
//! Everything else inside a block is inline content and only contributes to
//! the block's `text_len`.

use super::block::normalized;
use crate::{Block, BlockKind, BlockSequence, InkblockError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct ContentNode {
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default)]
    attrs: Option<NodeAttrs>,
    #[serde(default)]
    content: Option<Vec<ContentNode>>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeAttrs {
    block_id: Option<String>,
    indent: Option<usize>,
    parent_toggle_id: Option<String>,
    parent_id: Option<String>,
}

impl ContentNode {
    fn children(&self) -> &[ContentNode] {
        self.content.as_deref().unwrap_or_default()
    }

    fn is_block(&self) -> bool {
        self.attrs.as_ref().is_some_and(|a| a.block_id.is_some())
            || BlockKind::from_type_name(&self.node_type).is_known()
    }

    fn inline_len(&self) -> usize {
        self.text.as_deref().map_or(0, |t| t.chars().count())
            + self
                .children()
                .iter()
                .filter(|c| !c.is_block())
                .map(ContentNode::inline_len)
                .sum::<usize>()
    }
}

/// Whether `content` is an uninitialised editor body rather than a document.
///
/// Editors emit these placeholders before the first real document loads.
#[must_use]
pub fn is_boot_state(content: &str) -> bool {
    matches!(content.trim(), "" | r#""""# | "{}")
}

/// Decodes stored note content into a snapshot.
///
/// Boot-state placeholders decode to an empty sequence. Block nodes without
/// a `blockId` are given a fresh UUID.
///
/// # Errors
///
/// Returns [`InkblockError::Json`] if `content` is not valid JSON of the
/// expected node shape, and [`InkblockError::InvalidContent`] if the root is
/// not a `doc` node or two blocks share an identifier.
pub fn decode_note_content(content: &str) -> Result<BlockSequence> {
    if is_boot_state(content) {
        return Ok(BlockSequence::default());
    }

    let root: ContentNode = serde_json::from_str(content)?;
    if root.node_type != "doc" {
        return Err(InkblockError::InvalidContent(format!(
            "expected a doc root, found {}",
            root.node_type
        )));
    }

    let mut blocks = Vec::new();
    for node in root.children().iter().filter(|n| n.is_block()) {
        flatten(node, 0, &mut blocks);
    }

    let mut seen = HashSet::new();
    if let Some(duplicate) = blocks.iter().find(|b| !seen.insert(b.block_id.as_str())) {
        return Err(InkblockError::InvalidContent(format!(
            "duplicate block id {}",
            duplicate.block_id
        )));
    }

    log::debug!("decoded note content into {} block(s)", blocks.len());
    Ok(BlockSequence::from(normalized(blocks)))
}

fn flatten(node: &ContentNode, depth: usize, out: &mut Vec<Block>) {
    let attrs = node.attrs.as_ref();
    let indent = attrs.and_then(|a| a.indent).unwrap_or(depth);
    let block_id = attrs
        .and_then(|a| a.block_id.clone())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    out.push(Block {
        block_id,
        indent,
        kind: BlockKind::from_type_name(&node.node_type),
        text_len: node.inline_len(),
        legacy_parent_toggle_id: attrs.and_then(|a| a.parent_toggle_id.clone()),
        parent_id: attrs.and_then(|a| a.parent_id.clone()),
    });

    for child in node.children().iter().filter(|c| c.is_block()) {
        flatten(child, indent + 1, out);
    }
}
