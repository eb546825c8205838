//! Editing session over one open note.
//!
//! [`EditorSession`] is the host-side owner of the current snapshot. Every
//! structural change goes through its methods: each produces a new
//! [`BlockSequence`], reports an [`EditEvent`] to the undo grouping machine
//! and records the change in the session's [`UndoHistory`].
//! [`EditorSession::delete_blocks`] is the only code path that invokes the
//! structural delete authority.

use crate::{
    decode_note_content, place_cursor, Block, BlockGeometry, BlockKind, BlockSelection,
    BlockSelector, BlockSequence, BoundaryDecision, CursorPlacement, DeleteObserver,
    DeleteRequest, DeleteSource, EditEvent, EditorSettings, InkblockError, Result,
    StructuralDeleteAuthority, UndoGrouping, UndoGroupingState, UndoHistory,
};

/// One committed change, kept as whole snapshots for undo and redo.
#[derive(Debug, Clone)]
pub struct SessionEdit {
    pub before: BlockSequence,
    pub after: BlockSequence,
}

/// An open note being edited.
#[derive(Debug)]
pub struct EditorSession {
    blocks: BlockSequence,
    grouping: UndoGrouping,
    grouping_state: UndoGroupingState,
    history: UndoHistory<SessionEdit>,
    selector: BlockSelector,
    authority: StructuralDeleteAuthority,
}

impl EditorSession {
    /// Starts a session on `blocks` with the given tuning.
    #[must_use]
    pub fn open(blocks: BlockSequence, settings: &EditorSettings) -> Self {
        let grouping_state = primed_state(&blocks);
        Self {
            blocks,
            grouping: UndoGrouping::new(settings.large_change_threshold),
            grouping_state,
            history: UndoHistory::new(settings.max_undo_groups),
            selector: BlockSelector::default(),
            authority: StructuralDeleteAuthority::default(),
        }
    }

    /// Starts a session on stored note content.
    ///
    /// # Errors
    ///
    /// Propagates the errors of [`decode_note_content`].
    pub fn from_note_content(content: &str, settings: &EditorSettings) -> Result<Self> {
        Ok(Self::open(decode_note_content(content)?, settings))
    }

    /// Replaces the diagnostics observer handed to the delete authority.
    #[must_use]
    pub fn with_delete_observer(
        mut self,
        observer: impl DeleteObserver + Send + Sync + 'static,
    ) -> Self {
        self.authority = StructuralDeleteAuthority::new(observer);
        self
    }

    /// The current document. Cheap to clone; never changes after being returned.
    #[must_use]
    pub fn snapshot(&self) -> BlockSequence {
        self.blocks.clone()
    }

    #[must_use]
    pub fn selector(&self) -> &BlockSelector {
        &self.selector
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Removes `block_ids` through the structural delete authority.
    ///
    /// The snapshot is captured before anything else runs. The new document
    /// is committed only once the cursor has been placed successfully.
    ///
    /// # Errors
    ///
    /// Returns [`InkblockError::BlockNotFound`] if an ID is not in the
    /// document, or [`InkblockError::InvariantViolation`] if the cursor
    /// cannot be placed in the surviving blocks. The document is unchanged
    /// on error.
    pub fn delete_blocks(
        &mut self,
        block_ids: &[String],
        source: DeleteSource,
    ) -> Result<CursorPlacement> {
        let request = DeleteRequest {
            engine_snapshot: self.blocks.clone(),
            block_ids: block_ids.to_vec(),
            source,
        };
        let plan = self.authority.perform(&request)?;
        let after = plan.apply(&request.engine_snapshot)?;
        let cursor = place_cursor(&plan.cursor, &after)?;

        self.commit(after, false);
        self.selector.clear_selection();
        Ok(cursor)
    }

    /// Deletes the blocks covered by the last committed drag selection.
    ///
    /// The selection covers whole top-level blocks, so everything from the
    /// first selected block through the subtree of the last one is removed.
    /// Returns `Ok(None)` when nothing is selected.
    ///
    /// # Errors
    ///
    /// Same as [`delete_blocks`](Self::delete_blocks).
    pub fn delete_selection(&mut self, source: DeleteSource) -> Result<Option<CursorPlacement>> {
        let Some(selection) = self.selector.selection() else {
            return Ok(None);
        };
        let first = selection
            .block_ids
            .first()
            .and_then(|id| self.blocks.position_of(id));
        let last = selection
            .block_ids
            .last()
            .and_then(|id| self.blocks.position_of(id));
        let block_ids = match (first, last) {
            (Some(first), Some(last)) if first <= last => self.blocks.as_slice()
                [first..self.blocks.subtree_end(last)]
                .iter()
                .map(|b| b.block_id.clone())
                .collect(),
            _ => selection.block_ids.clone(),
        };
        self.delete_blocks(&block_ids, source).map(Some)
    }

    /// Nests `block_id` and its subtree one level deeper.
    ///
    /// Returns `Ok(false)` if the block cannot be indented further.
    ///
    /// # Errors
    ///
    /// Returns [`InkblockError::BlockNotFound`] for an unknown ID.
    pub fn indent_block(&mut self, block_id: &str) -> Result<bool> {
        let index = self.index_of(block_id)?;
        Ok(self.commit_if_changed(self.blocks.indented(index)))
    }

    /// Moves `block_id` and its subtree one level up.
    ///
    /// Returns `Ok(false)` for top-level blocks.
    ///
    /// # Errors
    ///
    /// Returns [`InkblockError::BlockNotFound`] for an unknown ID.
    pub fn outdent_block(&mut self, block_id: &str) -> Result<bool> {
        let index = self.index_of(block_id)?;
        Ok(self.commit_if_changed(self.blocks.outdented(index)))
    }

    /// Inserts an empty block of `kind` as the next sibling of `block_id`.
    ///
    /// Returns the new block's ID.
    ///
    /// # Errors
    ///
    /// Returns [`InkblockError::BlockNotFound`] for an unknown ID.
    pub fn insert_block_after(&mut self, block_id: &str, kind: BlockKind) -> Result<String> {
        let index = self.index_of(block_id)?;
        let block = Block::new(kind);
        let new_id = block.block_id.clone();
        let after = self.blocks.inserted_after(index, block)?;
        self.commit(after, false);
        Ok(new_id)
    }

    /// Records an inline edit that left `block_id` with `text_len` content units.
    ///
    /// `inserted` is the text the edit typed, used to detect word boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`InkblockError::BlockNotFound`] for an unknown ID.
    pub fn record_text_edit(
        &mut self,
        block_id: &str,
        text_len: usize,
        inserted: &str,
    ) -> Result<BoundaryDecision> {
        let index = self.index_of(block_id)?;
        let after = self
            .blocks
            .with_block(index, |b| b.with_text_len(text_len))
            .ok_or_else(|| InkblockError::BlockNotFound(block_id.to_string()))?;
        Ok(self.commit(after, is_single_whitespace(inserted)))
    }

    /// Ends the current undo group so the next edit starts a new one.
    ///
    /// Hosts call this when focus leaves the editor or the caret jumps.
    pub fn close_undo_group(&mut self) {
        self.history.close_group();
    }

    /// Reverts the newest undo group. Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(edits) = self.history.undo() else {
            return false;
        };
        // Newest first: the oldest edit's `before` is the state prior to the group.
        if let Some(oldest) = edits.last() {
            self.restore(oldest.before.clone());
        }
        true
    }

    /// Re-applies the last undone group. Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(edits) = self.history.redo() else {
            return false;
        };
        if let Some(newest) = edits.last() {
            self.restore(newest.after.clone());
        }
        true
    }

    pub fn start_drag(&mut self, x: f64, y: f64) {
        self.selector.start_drag(x, y);
    }

    pub fn update_drag<G: BlockGeometry + ?Sized>(&mut self, x: f64, y: f64, geometry: &G) {
        self.selector.update_drag(x, y, geometry);
    }

    pub fn end_drag(&mut self) -> Option<BlockSelection> {
        self.selector.end_drag()
    }

    pub fn clear_selection(&mut self) {
        self.selector.clear_selection();
    }

    fn index_of(&self, block_id: &str) -> Result<usize> {
        self.blocks
            .position_of(block_id)
            .ok_or_else(|| InkblockError::BlockNotFound(block_id.to_string()))
    }

    fn commit_if_changed(&mut self, after: Option<BlockSequence>) -> bool {
        match after {
            Some(after) => {
                self.commit(after, false);
                true
            }
            None => false,
        }
    }

    fn commit(&mut self, after: BlockSequence, is_space_insertion: bool) -> BoundaryDecision {
        let before = std::mem::replace(&mut self.blocks, after.clone());
        let edit = EditEvent {
            old_block_count: before.top_level_count(),
            new_block_count: after.top_level_count(),
            old_size: before.content_size(),
            new_size: after.content_size(),
            is_space_insertion,
        };
        let (state, decision) = self.grouping.observe(self.grouping_state, &edit);
        self.grouping_state = state;
        if decision.is_close() {
            log::trace!("undo boundary: {decision:?}");
        }
        self.history.record(SessionEdit { before, after }, decision);
        decision
    }

    fn restore(&mut self, blocks: BlockSequence) {
        self.grouping_state = primed_state(&blocks);
        self.blocks = blocks;
        self.selector.clear_selection();
    }
}

fn primed_state(blocks: &BlockSequence) -> UndoGroupingState {
    UndoGroupingState::primed(blocks.top_level_count(), blocks.content_size())
}

fn is_single_whitespace(inserted: &str) -> bool {
    let mut chars = inserted.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockRect, BoundaryReason, DeletionPlan, Rect};
    use std::sync::{Arc, Mutex};

    fn session(blocks: Vec<Block>) -> EditorSession {
        EditorSession::open(BlockSequence::from(blocks), &EditorSettings::default())
    }

    fn ids(session: &EditorSession) -> Vec<String> {
        session.snapshot().iter().map(|b| b.block_id.clone()).collect()
    }

    fn row(pos: usize, depth: usize, block_id: &str, rect: Rect) -> BlockRect {
        BlockRect {
            pos,
            depth,
            block_id: block_id.to_string(),
            rect,
        }
    }

    fn type_text(session: &mut EditorSession, block_id: &str, text: &str) {
        let start = session.snapshot().get(0).map_or(0, |b| b.text_len);
        for (i, c) in text.chars().enumerate() {
            session
                .record_text_edit(block_id, start + i + 1, &c.to_string())
                .unwrap();
        }
    }

    #[test]
    fn test_delete_places_cursor_at_end_of_predecessor() {
        let mut s = session(vec![
            Block::with_id("a", BlockKind::Paragraph).with_text_len(3),
            Block::with_id("b", BlockKind::Paragraph),
        ]);
        let cursor = s
            .delete_blocks(&["b".to_string()], DeleteSource::KeyboardBackspace)
            .unwrap();
        assert_eq!(
            cursor,
            CursorPlacement::InBlock {
                block_id: "a".to_string(),
                index: 0,
                offset: 3
            }
        );
        assert_eq!(ids(&s), vec!["a"]);
    }

    #[test]
    fn test_delete_unknown_block_leaves_document_unchanged() {
        let mut s = session(vec![Block::with_id("a", BlockKind::Paragraph)]);
        let before = s.snapshot();
        let result = s.delete_blocks(&["zzz".to_string()], DeleteSource::ContextMenu);
        assert!(matches!(result, Err(InkblockError::BlockNotFound(_))));
        assert_eq!(s.snapshot(), before);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_delete_after_divider_stops_with_invariant_violation() {
        let mut s = session(vec![
            Block::with_id("rule", BlockKind::Divider),
            Block::with_id("b", BlockKind::Paragraph),
        ]);
        let before = s.snapshot();
        let result = s.delete_blocks(&["b".to_string()], DeleteSource::KeyboardBackspace);
        assert!(matches!(result, Err(InkblockError::InvariantViolation(_))));
        assert_eq!(s.snapshot(), before);
    }

    #[test]
    fn test_typing_undoes_one_word_at_a_time() {
        let mut s = session(vec![Block::with_id("a", BlockKind::Paragraph)]);
        type_text(&mut s, "a", "hi ");
        type_text(&mut s, "a", "yo");
        assert_eq!(s.snapshot().get(0).unwrap().text_len, 5);

        assert!(s.undo());
        assert_eq!(s.snapshot().get(0).unwrap().text_len, 3);
        assert!(s.undo());
        assert_eq!(s.snapshot().get(0).unwrap().text_len, 0);
        assert!(!s.undo());

        assert!(s.redo());
        assert_eq!(s.snapshot().get(0).unwrap().text_len, 3);
    }

    #[test]
    fn test_space_edit_reports_word_boundary() {
        let mut s = session(vec![Block::with_id("a", BlockKind::Paragraph)]);
        let decision = s.record_text_edit("a", 1, " ").unwrap();
        assert_eq!(decision, BoundaryDecision::Close(BoundaryReason::WordBoundary));
        let decision = s.record_text_edit("a", 2, "x").unwrap();
        assert_eq!(decision, BoundaryDecision::Extend);
    }

    #[test]
    fn test_new_block_is_its_own_undo_step() {
        let mut s = session(vec![Block::with_id("a", BlockKind::Paragraph)]);
        type_text(&mut s, "a", "ab");
        let new_id = s.insert_block_after("a", BlockKind::Paragraph).unwrap();
        s.record_text_edit(&new_id, 1, "c").unwrap();

        assert!(s.undo());
        assert_eq!(ids(&s), vec!["a"]);
        assert_eq!(s.snapshot().get(0).unwrap().text_len, 2);
    }

    #[test]
    fn test_indent_and_outdent() {
        let mut s = session(vec![
            Block::with_id("a", BlockKind::BulletListItem),
            Block::with_id("b", BlockKind::BulletListItem),
        ]);
        assert!(!s.indent_block("a").unwrap());
        assert!(s.indent_block("b").unwrap());
        assert_eq!(s.snapshot().get(1).unwrap().indent, 1);
        assert!(s.outdent_block("b").unwrap());
        assert!(!s.outdent_block("b").unwrap());
        assert!(matches!(
            s.indent_block("missing"),
            Err(InkblockError::BlockNotFound(_))
        ));
    }

    #[test]
    fn test_drag_selection_delete_removes_subtree() {
        let mut s = session(vec![
            Block::with_id("a", BlockKind::Paragraph),
            Block::with_id("t", BlockKind::Toggle),
            Block::with_id("c", BlockKind::Paragraph).at_indent(1),
            Block::with_id("d", BlockKind::Paragraph),
        ]);
        let rects = vec![
            row(0, 0, "a", Rect::new(0.0, 0.0, 100.0, 20.0)),
            row(5, 0, "t", Rect::new(0.0, 30.0, 100.0, 40.0)),
            row(7, 1, "c", Rect::new(10.0, 50.0, 90.0, 20.0)),
            row(12, 0, "d", Rect::new(0.0, 80.0, 100.0, 20.0)),
        ];

        s.start_drag(50.0, 35.0);
        s.update_drag(60.0, 45.0, &rects);
        let selection = s.end_drag().unwrap();
        assert_eq!(selection.block_ids, vec!["t"]);

        let cursor = s.delete_selection(DeleteSource::KeyboardDelete).unwrap();
        assert!(matches!(
            cursor,
            Some(CursorPlacement::InBlock { ref block_id, .. }) if block_id == "a"
        ));
        assert_eq!(ids(&s), vec!["a", "d"]);
        assert!(s.selector().selection().is_none());
    }

    #[test]
    fn test_delete_selection_without_selection_is_noop() {
        let mut s = session(vec![Block::with_id("a", BlockKind::Paragraph)]);
        assert_eq!(s.delete_selection(DeleteSource::KeyboardDelete).unwrap(), None);
        assert_eq!(ids(&s), vec!["a"]);
    }

    #[test]
    fn test_from_note_content() {
        let content = r#"{"type":"doc","content":[{"type":"paragraph","attrs":{"blockId":"a"}}]}"#;
        let s = EditorSession::from_note_content(content, &EditorSettings::default()).unwrap();
        assert_eq!(ids(&s), vec!["a"]);
    }

    #[test]
    fn test_drag_selection_over_two_blocks_removes_everything_between() {
        let mut s = session(vec![
            Block::with_id("a", BlockKind::Paragraph),
            Block::with_id("t", BlockKind::Toggle),
            Block::with_id("c", BlockKind::Paragraph).at_indent(1),
            Block::with_id("d", BlockKind::Paragraph),
            Block::with_id("e", BlockKind::Paragraph),
        ]);
        let rects = vec![
            row(0, 0, "a", Rect::new(0.0, 0.0, 100.0, 20.0)),
            row(5, 0, "t", Rect::new(0.0, 30.0, 100.0, 40.0)),
            row(7, 1, "c", Rect::new(10.0, 50.0, 90.0, 20.0)),
            row(12, 0, "d", Rect::new(0.0, 80.0, 100.0, 20.0)),
            row(15, 0, "e", Rect::new(0.0, 110.0, 100.0, 20.0)),
        ];

        s.start_drag(50.0, 35.0);
        s.update_drag(60.0, 90.0, &rects);
        assert_eq!(s.end_drag().unwrap().block_ids, vec!["t", "d"]);

        s.delete_selection(DeleteSource::KeyboardDelete).unwrap();
        assert_eq!(ids(&s), vec!["a", "e"]);
    }

    #[test]
    fn test_paste_sized_edit_is_its_own_undo_step() {
        let mut s = session(vec![Block::with_id("a", BlockKind::Paragraph)]);
        type_text(&mut s, "a", "ab");
        let decision = s.record_text_edit("a", 2 + 80, "").unwrap();
        assert_eq!(decision, BoundaryDecision::Close(BoundaryReason::LargeChange));
        assert!(decision.is_close());

        assert!(s.undo());
        assert_eq!(s.snapshot().get(0).unwrap().text_len, 2);
        assert!(s.undo());
        assert_eq!(s.snapshot().get(0).unwrap().text_len, 0);
    }

    #[test]
    fn test_close_undo_group_splits_typing() {
        let mut s = session(vec![Block::with_id("a", BlockKind::Paragraph)]);
        type_text(&mut s, "a", "ab");
        s.close_undo_group();
        type_text(&mut s, "a", "cd");

        assert!(s.undo());
        assert_eq!(s.snapshot().get(0).unwrap().text_len, 2);
        assert!(s.undo());
        assert!(!s.can_undo());
    }

    #[derive(Clone, Default)]
    struct Sources(Arc<Mutex<Vec<DeleteSource>>>);

    impl DeleteObserver for Sources {
        fn on_plan(&self, plan: &DeletionPlan) {
            self.0.lock().unwrap().push(plan.source);
        }
    }

    #[test]
    fn test_delete_observer_sees_session_deletes() {
        let sources = Sources::default();
        let mut s = session(vec![
            Block::with_id("a", BlockKind::Paragraph),
            Block::with_id("b", BlockKind::Paragraph),
        ])
        .with_delete_observer(sources.clone());

        s.delete_blocks(&["b".to_string()], DeleteSource::ContextMenu)
            .unwrap();
        assert!(s
            .delete_blocks(&["zzz".to_string()], DeleteSource::BlockHandle)
            .is_err());
        assert_eq!(*sources.0.lock().unwrap(), vec![DeleteSource::ContextMenu]);
    }
}
