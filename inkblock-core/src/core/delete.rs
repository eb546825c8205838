//! Structural delete authority: the single decision point for removing blocks.
//!
//! This module defines [`DeleteRequest`], [`DeletionPlan`] and
//! [`perform_structural_delete`], which turns a request into a plan without
//! touching any live editor state.
//!
//! ## Snapshot contract
//!
//! The caller captures a [`BlockSequence`] at the moment the user expresses
//! intent and passes it in as `engine_snapshot`. The authority reads nothing
//! else, so a later callback in the same gesture cannot change the outcome.
//! Identical snapshot and block IDs always give an identical plan.
//!
//! ## Applying a plan
//!
//! The authority never mutates. The host applies the plan with
//! [`DeletionPlan::apply`], which removes the range and promotes orphaned
//! children, then places the cursor with [`place_cursor`](crate::place_cursor).
//!
//! ## Serialization
//!
//! - `DeleteSource` variants serialize as kebab-case strings
//!   (`"keyboard-backspace"`, `"block-handle"`, ...), matching the values sent
//!   by the TypeScript front-end.
//! - `DeletionPlan` fields serialize in camelCase (`deletedIds`, `cursor`).
//!
//! ## Examples
//!
//! ```rust
//! use inkblock_core::{
//!     perform_structural_delete, Block, BlockKind, BlockSequence, CursorTarget, DeleteRequest,
//!     DeleteSource,
//! };
//!
//! let snapshot = BlockSequence::from(vec![
//!     Block::with_id("a", BlockKind::Paragraph),
//!     Block::with_id("b", BlockKind::Paragraph),
//! ]);
//! let plan = perform_structural_delete(&DeleteRequest {
//!     engine_snapshot: snapshot.clone(),
//!     block_ids: vec!["b".to_string()],
//!     source: DeleteSource::KeyboardBackspace,
//! })
//! .unwrap();
//! assert_eq!(plan.cursor, CursorTarget::EndOfBlock { block_id: "a".to_string() });
//! assert_eq!(plan.apply(&snapshot).unwrap().len(), 1);
//! ```

use crate::{
    resolve_deletion_cursor, BlockSequence, CursorTarget, DeletionRange, InkblockError, Result,
};
use serde::{Deserialize, Serialize};

/// The user gesture that triggered a delete.
///
/// Carried for diagnostics only; the authority never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteSource {
    KeyboardBackspace,
    KeyboardDelete,
    BlockHandle,
    ContextMenu,
}

/// Inputs to [`perform_structural_delete`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    /// Snapshot captured by the caller when the delete was requested.
    pub engine_snapshot: BlockSequence,
    /// IDs of the blocks to remove, in any order.
    pub block_ids: Vec<String>,
    pub source: DeleteSource,
}

/// The validated outcome of a structural delete decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionPlan {
    /// Contiguous range over the snapshot that will be removed.
    pub range: DeletionRange,
    /// Where focus lands once the range is gone.
    pub cursor: CursorTarget,
    /// IDs of every removed block, in document order.
    pub deleted_ids: Vec<String>,
    pub source: DeleteSource,
}

impl DeletionPlan {
    /// Produces the post-deletion sequence from the snapshot the plan was computed on.
    ///
    /// # Errors
    ///
    /// Returns [`InkblockError::InvalidRange`] if `snapshot` is shorter than
    /// the plan's range, and [`InkblockError::InvariantViolation`] if the
    /// blocks in the range are not the ones the plan deletes. Either way
    /// `snapshot` is not the one the plan was made for.
    pub fn apply(&self, snapshot: &BlockSequence) -> Result<BlockSequence> {
        let removed = snapshot
            .as_slice()
            .get(self.range.from..self.range.to)
            .ok_or(InkblockError::InvalidRange {
                from: self.range.from,
                to: self.range.to,
                len: snapshot.len(),
            })?;
        let matches = removed
            .iter()
            .map(|b| b.block_id.as_str())
            .eq(self.deleted_ids.iter().map(String::as_str));
        if !matches {
            return Err(InkblockError::InvariantViolation(format!(
                "deletion plan for {:?} applied to a different snapshot",
                self.deleted_ids
            )));
        }
        snapshot.without_range(self.range)
    }
}

/// Resolves a delete request against its snapshot and returns a plan.
///
/// The requested blocks must form one contiguous run of the snapshot, in any
/// order; repeated IDs are tolerated.
///
/// # Errors
///
/// Returns [`InkblockError::BlockNotFound`] for the first requested ID that
/// is absent from the snapshot; no plan is produced. Returns
/// [`InkblockError::InvariantViolation`] if `block_ids` is empty or leaves a
/// gap between the requested blocks.
pub fn perform_structural_delete(request: &DeleteRequest) -> Result<DeletionPlan> {
    let snapshot = &request.engine_snapshot;

    let mut indices = Vec::with_capacity(request.block_ids.len());
    for block_id in &request.block_ids {
        let index = snapshot
            .position_of(block_id)
            .ok_or_else(|| InkblockError::BlockNotFound(block_id.clone()))?;
        indices.push(index);
    }

    indices.sort_unstable();
    indices.dedup();
    let (Some(&first), Some(&last)) = (indices.first(), indices.last()) else {
        return Err(InkblockError::InvariantViolation(
            "structural delete requested with no blocks".to_string(),
        ));
    };
    if last - first + 1 != indices.len() {
        return Err(InkblockError::InvariantViolation(format!(
            "structural delete of {} block(s) is not contiguous over [{first}, {last}]",
            indices.len()
        )));
    }

    let range = DeletionRange::new(first, last + 1, snapshot.len())?;
    let cursor = resolve_deletion_cursor(snapshot, range);
    let deleted_ids = snapshot.as_slice()[range.from..range.to]
        .iter()
        .map(|b| b.block_id.clone())
        .collect();

    Ok(DeletionPlan {
        range,
        cursor,
        deleted_ids,
        source: request.source,
    })
}

/// Output-only host capability notified of every plan the authority produces.
///
/// Implementations may record analytics or diagnostics keyed by
/// [`DeleteSource`], but cannot influence the plan.
pub trait DeleteObserver {
    fn on_plan(&self, plan: &DeletionPlan);

    fn on_rejected(&self, request: &DeleteRequest, error: &InkblockError) {
        let _ = (request, error);
    }
}

/// Default observer that writes plans to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDeleteObserver;

impl DeleteObserver for LogDeleteObserver {
    fn on_plan(&self, plan: &DeletionPlan) {
        log::debug!(
            "structural delete via {:?}: {} block(s) [{}, {}) -> {:?}",
            plan.source,
            plan.deleted_ids.len(),
            plan.range.from,
            plan.range.to,
            plan.cursor
        );
    }

    fn on_rejected(&self, request: &DeleteRequest, error: &InkblockError) {
        log::warn!("structural delete via {:?} rejected: {error}", request.source);
    }
}

/// [`perform_structural_delete`] bound to a host [`DeleteObserver`].
pub struct StructuralDeleteAuthority {
    observer: Box<dyn DeleteObserver + Send + Sync>,
}

impl Default for StructuralDeleteAuthority {
    fn default() -> Self {
        Self::new(LogDeleteObserver)
    }
}

impl std::fmt::Debug for StructuralDeleteAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructuralDeleteAuthority").finish_non_exhaustive()
    }
}

impl StructuralDeleteAuthority {
    pub fn new(observer: impl DeleteObserver + Send + Sync + 'static) -> Self {
        Self {
            observer: Box::new(observer),
        }
    }

    /// Computes a plan and reports it, or the rejection, to the observer.
    ///
    /// # Errors
    ///
    /// Same as [`perform_structural_delete`].
    pub fn perform(&self, request: &DeleteRequest) -> Result<DeletionPlan> {
        match perform_structural_delete(request) {
            Ok(plan) => {
                self.observer.on_plan(&plan);
                Ok(plan)
            }
            Err(e) => {
                self.observer.on_rejected(request, &e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Block, BlockKind};
    use std::sync::{Arc, Mutex};

    fn snapshot() -> BlockSequence {
        BlockSequence::from(vec![
            Block::with_id("a", BlockKind::Paragraph),
            Block::with_id("b", BlockKind::Toggle),
            Block::with_id("c", BlockKind::Paragraph).at_indent(1),
            Block::with_id("d", BlockKind::Paragraph),
        ])
    }

    fn request(ids: &[&str]) -> DeleteRequest {
        DeleteRequest {
            engine_snapshot: snapshot(),
            block_ids: ids.iter().map(|s| s.to_string()).collect(),
            source: DeleteSource::BlockHandle,
        }
    }

    #[test]
    fn test_unknown_id_is_block_not_found() {
        let result = perform_structural_delete(&request(&["a", "missing"]));
        assert!(matches!(result, Err(InkblockError::BlockNotFound(id)) if id == "missing"));
    }

    #[test]
    fn test_empty_request_is_rejected() {
        assert!(matches!(
            perform_structural_delete(&request(&[])),
            Err(InkblockError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_plan_spans_requested_ids_in_document_order() {
        let plan = perform_structural_delete(&request(&["d", "c", "b", "c"])).unwrap();
        assert_eq!(plan.range, DeletionRange { from: 1, to: 4 });
        assert_eq!(plan.deleted_ids, vec!["b", "c", "d"]);
        assert_eq!(
            plan.cursor,
            CursorTarget::EndOfBlock {
                block_id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_gap_between_requested_ids_is_rejected() {
        let result = perform_structural_delete(&request(&["a", "d"]));
        assert!(matches!(result, Err(InkblockError::InvariantViolation(_))));
    }

    #[test]
    fn test_apply_to_other_snapshot_is_rejected() {
        let plan = perform_structural_delete(&request(&["b"])).unwrap();
        let other = BlockSequence::from(vec![
            Block::with_id("w", BlockKind::Paragraph),
            Block::with_id("x", BlockKind::Paragraph),
            Block::with_id("y", BlockKind::Paragraph),
            Block::with_id("z", BlockKind::Paragraph),
        ]);
        assert!(matches!(
            plan.apply(&other),
            Err(InkblockError::InvariantViolation(_))
        ));

        let short = BlockSequence::from(vec![Block::with_id("a", BlockKind::Paragraph)]);
        assert!(matches!(
            plan.apply(&short),
            Err(InkblockError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_plan_is_deterministic() {
        let first = perform_structural_delete(&request(&["c"])).unwrap();
        let second = perform_structural_delete(&request(&["c"])).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_source_does_not_change_plan() {
        let mut req = request(&["b"]);
        let by_handle = perform_structural_delete(&req).unwrap();
        req.source = DeleteSource::KeyboardDelete;
        let by_key = perform_structural_delete(&req).unwrap();
        assert_eq!(by_handle.range, by_key.range);
        assert_eq!(by_handle.cursor, by_key.cursor);
    }

    #[test]
    fn test_apply_promotes_children_of_deleted_toggle() {
        let req = request(&["b"]);
        let plan = perform_structural_delete(&req).unwrap();
        let after = plan.apply(&req.engine_snapshot).unwrap();
        let ids: Vec<_> = after.iter().map(|b| (b.block_id.as_str(), b.indent)).collect();
        assert_eq!(ids, vec![("a", 0), ("c", 0), ("d", 0)]);
    }

    #[test]
    fn test_delete_source_serialization() {
        let json = serde_json::to_string(&DeleteSource::KeyboardBackspace).unwrap();
        assert_eq!(json, r#""keyboard-backspace""#);
    }

    #[derive(Clone, Default)]
    struct Recorder {
        plans: Arc<Mutex<Vec<DeleteSource>>>,
        rejected: Arc<Mutex<usize>>,
    }

    impl DeleteObserver for Recorder {
        fn on_plan(&self, plan: &DeletionPlan) {
            self.plans.lock().unwrap().push(plan.source);
        }

        fn on_rejected(&self, _request: &DeleteRequest, _error: &InkblockError) {
            *self.rejected.lock().unwrap() += 1;
        }
    }

    #[test]
    fn test_authority_reports_to_observer() {
        let recorder = Recorder::default();
        let authority = StructuralDeleteAuthority::new(recorder.clone());

        authority.perform(&request(&["a"])).unwrap();
        assert!(authority.perform(&request(&["nope"])).is_err());

        assert_eq!(*recorder.plans.lock().unwrap(), vec![DeleteSource::BlockHandle]);
        assert_eq!(*recorder.rejected.lock().unwrap(), 1);
    }
}
