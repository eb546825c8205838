//! Undo grouping: turning a stream of low-level edits into coarse undo steps.
//!
//! [`UndoGrouping::observe`] is a pure transition from the previous
//! [`UndoGroupingState`] and one [`EditEvent`] to the next state and a
//! [`BoundaryDecision`]. Groups close on a top-level block count change, on a
//! large size jump, and after a typed space, so one undo reverts one block
//! or one word.
//!
//! [`UndoHistory`] applies those decisions to a group-tagged undo/redo stack.

use serde::{Deserialize, Serialize};

/// Size jump, in content units, above which an edit starts a new group.
pub const LARGE_CHANGE_THRESHOLD: usize = 50;

/// Description of one committed change, emitted by the host per edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEvent {
    /// Top-level block count before the edit.
    pub old_block_count: usize,
    /// Top-level block count after the edit.
    pub new_block_count: usize,
    pub old_size: usize,
    pub new_size: usize,
    /// The edit inserted exactly one whitespace character.
    pub is_space_insertion: bool,
}

/// Why a group was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundaryReason {
    BlockCountChanged,
    LargeChange,
    WordBoundary,
}

/// Whether the edit that caused a boundary belongs to the closing group or the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPlacement {
    /// Close before the edit; the edit seeds the next group.
    Before,
    /// Apply the edit to the current group, then close it.
    After,
}

impl BoundaryReason {
    #[must_use]
    pub fn placement(self) -> BoundaryPlacement {
        match self {
            Self::BlockCountChanged | Self::LargeChange => BoundaryPlacement::Before,
            Self::WordBoundary => BoundaryPlacement::After,
        }
    }
}

/// Grouping directive returned for each edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "camelCase")]
pub enum BoundaryDecision {
    Close(BoundaryReason),
    Extend,
}

impl BoundaryDecision {
    #[must_use]
    pub fn is_close(self) -> bool {
        matches!(self, Self::Close(_))
    }
}

/// Memory of the previously observed edit.
///
/// `None` fields mean nothing has been observed yet; the edit's own `old_*`
/// values stand in for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UndoGroupingState {
    pub last_block_count: Option<usize>,
    pub last_size: Option<usize>,
    /// Size recorded when the last large-change boundary was emitted.
    pub last_boundary_size: Option<usize>,
}

impl UndoGroupingState {
    /// State primed with an already-known document, e.g. after load or undo.
    #[must_use]
    pub fn primed(block_count: usize, size: usize) -> Self {
        Self {
            last_block_count: Some(block_count),
            last_size: Some(size),
            last_boundary_size: None,
        }
    }
}

/// The undo grouping transition function and its one tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoGrouping {
    large_change_threshold: usize,
}

impl Default for UndoGrouping {
    fn default() -> Self {
        Self::new(LARGE_CHANGE_THRESHOLD)
    }
}

impl UndoGrouping {
    #[must_use]
    pub fn new(large_change_threshold: usize) -> Self {
        Self {
            large_change_threshold,
        }
    }

    /// Classifies `edit` given the previous `state`. First matching rule wins.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use inkblock_core::{
    ///     BoundaryDecision, BoundaryReason, EditEvent, UndoGrouping, UndoGroupingState,
    /// };
    ///
    /// let grouping = UndoGrouping::default();
    /// let edit = EditEvent {
    ///     old_block_count: 1,
    ///     new_block_count: 1,
    ///     old_size: 5,
    ///     new_size: 6,
    ///     is_space_insertion: true,
    /// };
    /// let (_, decision) = grouping.observe(UndoGroupingState::default(), &edit);
    /// assert_eq!(decision, BoundaryDecision::Close(BoundaryReason::WordBoundary));
    /// ```
    #[must_use]
    pub fn observe(
        &self,
        state: UndoGroupingState,
        edit: &EditEvent,
    ) -> (UndoGroupingState, BoundaryDecision) {
        let last_count = state.last_block_count.unwrap_or(edit.old_block_count);
        let last_size = state.last_size.unwrap_or(edit.old_size);

        let mut next = UndoGroupingState {
            last_block_count: Some(edit.new_block_count),
            last_size: Some(edit.new_size),
            last_boundary_size: state.last_boundary_size,
        };

        if edit.new_block_count != edit.old_block_count || edit.new_block_count != last_count {
            return (next, BoundaryDecision::Close(BoundaryReason::BlockCountChanged));
        }

        if edit.new_size.abs_diff(last_size) > self.large_change_threshold
            && state.last_boundary_size != Some(edit.new_size)
        {
            next.last_boundary_size = Some(edit.new_size);
            return (next, BoundaryDecision::Close(BoundaryReason::LargeChange));
        }

        if edit.is_space_insertion {
            return (next, BoundaryDecision::Close(BoundaryReason::WordBoundary));
        }

        (next, BoundaryDecision::Extend)
    }
}

#[derive(Debug, Clone)]
struct HistoryEntry<T> {
    group: u64,
    edit: T,
}

/// Linear undo/redo history whose steps are grouped by [`BoundaryDecision`]s.
///
/// Holds at most `max_groups` groups; the oldest group is dropped first.
#[derive(Debug, Clone)]
pub struct UndoHistory<T> {
    undo_stack: Vec<HistoryEntry<T>>,
    redo_stack: Vec<HistoryEntry<T>>,
    max_groups: usize,
    next_group: u64,
    open_group: Option<u64>,
}

impl<T: Clone> UndoHistory<T> {
    #[must_use]
    pub fn new(max_groups: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_groups: max_groups.max(1),
            next_group: 0,
            open_group: None,
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Number of groups available to undo.
    #[must_use]
    pub fn undo_depth(&self) -> usize {
        group_count(&self.undo_stack)
    }

    /// Ends the open group so the next edit starts a fresh one.
    pub fn close_group(&mut self) {
        self.open_group = None;
    }

    /// Records a committed edit under the grouping `decision` it received.
    ///
    /// Clears the redo stack.
    pub fn record(&mut self, edit: T, decision: BoundaryDecision) {
        self.redo_stack.clear();

        let placement = match decision {
            BoundaryDecision::Close(reason) => Some(reason.placement()),
            BoundaryDecision::Extend => None,
        };
        if placement == Some(BoundaryPlacement::Before) {
            self.open_group = None;
        }

        let group = match self.open_group {
            Some(group) => group,
            None => {
                let group = self.next_group;
                self.next_group = self.next_group.wrapping_add(1);
                group
            }
        };
        self.undo_stack.push(HistoryEntry { group, edit });
        self.open_group = match placement {
            Some(BoundaryPlacement::After) => None,
            _ => Some(group),
        };

        while group_count(&self.undo_stack) > self.max_groups {
            let oldest = self.undo_stack[0].group;
            let keep_from = self
                .undo_stack
                .iter()
                .position(|e| e.group != oldest)
                .unwrap_or(self.undo_stack.len());
            self.undo_stack.drain(..keep_from);
        }
    }

    /// Pops the newest group, returning its edits newest first.
    pub fn undo(&mut self) -> Option<Vec<T>> {
        let entries = pop_group(&mut self.undo_stack)?;
        self.open_group = None;
        let edits = entries.iter().map(|e| e.edit.clone()).collect();
        self.redo_stack.extend(entries.into_iter().rev());
        Some(edits)
    }

    /// Re-applies the most recently undone group, returning its edits oldest first.
    pub fn redo(&mut self) -> Option<Vec<T>> {
        let mut entries = pop_group(&mut self.redo_stack)?;
        entries.reverse();
        self.open_group = None;
        let edits = entries.iter().map(|e| e.edit.clone()).collect();
        self.undo_stack.extend(entries);
        Some(edits)
    }
}

/// Pops the trailing run of entries sharing the top entry's group, top first.
fn pop_group<T>(stack: &mut Vec<HistoryEntry<T>>) -> Option<Vec<HistoryEntry<T>>> {
    let group = stack.last()?.group;
    let mut entries = Vec::new();
    while stack.last().is_some_and(|e| e.group == group) {
        if let Some(entry) = stack.pop() {
            entries.push(entry);
        }
    }
    Some(entries)
}

fn group_count<T>(stack: &[HistoryEntry<T>]) -> usize {
    let mut count = 0;
    let mut last = None;
    for entry in stack {
        if last != Some(entry.group) {
            count += 1;
            last = Some(entry.group);
        }
    }
    count
}
