//! Cursor resolution after structural deletes.
//!
//! [`resolve_deletion_cursor`] derives where focus should land purely from the
//! pre-deletion snapshot and the deleted range, so it does not depend on how
//! the surviving blocks are later promoted or re-parented.
//! [`place_cursor`] turns that intent into a concrete position in the
//! post-deletion sequence and refuses to place a cursor inside a block that
//! cannot hold text.

use crate::{BlockSequence, DeletionRange, InkblockError, Result};
use serde::{Deserialize, Serialize};

/// Where editing focus should land after a structural mutation.
///
/// Never references a deleted block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CursorTarget {
    /// No anchor block: focus the start of the document.
    StartOfDocument,
    /// Focus the trailing edge of a surviving block.
    #[serde(rename_all = "camelCase")]
    EndOfBlock { block_id: String },
}

/// A concrete cursor position inside a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CursorPlacement {
    /// The document has no blocks left; the host inserts its own placeholder.
    EmptyDocument,
    /// Offset `offset` in the inline text of the block at `index`.
    #[serde(rename_all = "camelCase")]
    InBlock {
        block_id: String,
        index: usize,
        offset: usize,
    },
}

/// Maps a deleted range over the pre-deletion `blocks` to a cursor intent.
///
/// The cursor anchors to the end of the block immediately preceding the
/// range. Deleting from the first block, or deleting everything, yields
/// [`CursorTarget::StartOfDocument`].
///
/// # Examples
///
/// ```rust
/// use inkblock_core::{
///     resolve_deletion_cursor, Block, BlockKind, BlockSequence, CursorTarget, DeletionRange,
/// };
///
/// let blocks = BlockSequence::from(vec![
///     Block::with_id("a", BlockKind::Paragraph),
///     Block::with_id("b", BlockKind::Paragraph),
///     Block::with_id("c", BlockKind::Paragraph),
/// ]);
/// let target = resolve_deletion_cursor(&blocks, DeletionRange { from: 1, to: 2 });
/// assert_eq!(target, CursorTarget::EndOfBlock { block_id: "a".to_string() });
/// ```
#[must_use]
pub fn resolve_deletion_cursor(
    blocks: &BlockSequence,
    deleted_range: DeletionRange,
) -> CursorTarget {
    deleted_range
        .from
        .checked_sub(1)
        .and_then(|previous| blocks.get(previous))
        .map_or(CursorTarget::StartOfDocument, |block| CursorTarget::EndOfBlock {
            block_id: block.block_id.clone(),
        })
}

/// Resolves `target` against the post-deletion `surviving` sequence.
///
/// # Errors
///
/// Returns [`InkblockError::InvariantViolation`] if the anchor block is
/// missing from `surviving`, or if the block the cursor would land in is not
/// text-bearing. The violation is logged before it is returned.
pub fn place_cursor(target: &CursorTarget, surviving: &BlockSequence) -> Result<CursorPlacement> {
    let placement = match target {
        CursorTarget::StartOfDocument => match surviving.get(0) {
            None => return Ok(CursorPlacement::EmptyDocument),
            Some(first) => (0, first, 0),
        },
        CursorTarget::EndOfBlock { block_id } => {
            let index = surviving.position_of(block_id).ok_or_else(|| {
                violation(format!("cursor anchor {block_id} is not in the surviving document"))
            })?;
            let block = &surviving.as_slice()[index];
            (index, block, block.text_len)
        }
    };

    let (index, block, offset) = placement;
    if !block.kind.is_text_bearing() {
        return Err(violation(format!(
            "cursor would land in {} block {}, which holds no inline content",
            block.kind.type_name(),
            block.block_id
        )));
    }
    Ok(CursorPlacement::InBlock {
        block_id: block.block_id.clone(),
        index,
        offset,
    })
}

fn violation(message: String) -> InkblockError {
    log::error!("{message}");
    InkblockError::InvariantViolation(message)
}
