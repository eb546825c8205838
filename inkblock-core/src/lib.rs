//! Core library for Inkblock, the structural block-document editing core of a
//! desktop note-taking application.
//!
//! A note is a flat, indented [`BlockSequence`]. The primary entry point is
//! [`EditorSession`], which owns the current snapshot; every structural change
//! goes through its methods, and block removal always goes through
//! [`perform_structural_delete`]. The pure building blocks (cursor
//! resolution, undo grouping, drag selection, legacy attribute audit) are
//! usable on their own.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use core::{
    audit::{
        audit_legacy_attributes, migrate_legacy_attributes, recommend_migration,
        LegacyAuditReport, MigrationAction,
    },
    block::{Block, BlockKind, BlockSequence, DeletionRange},
    cursor::{place_cursor, resolve_deletion_cursor, CursorPlacement, CursorTarget},
    delete::{
        perform_structural_delete, DeleteObserver, DeleteRequest, DeleteSource, DeletionPlan,
        LogDeleteObserver, StructuralDeleteAuthority,
    },
    document::{decode_note_content, is_boot_state},
    error::{InkblockError, Result},
    selection::{
        intersecting_blocks, BlockGeometry, BlockRect, BlockSelection, BlockSelector, Rect,
        SelectionBox,
    },
    session::{EditorSession, SessionEdit},
    settings::{load_settings, save_settings, EditorSettings, DEFAULT_MAX_UNDO_GROUPS},
    undo::{
        BoundaryDecision, BoundaryPlacement, BoundaryReason, EditEvent, UndoGrouping,
        UndoGroupingState, UndoHistory, LARGE_CHANGE_THRESHOLD,
    },
};
