//! Internal domain modules for the Inkblock core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod audit;
pub mod block;
pub mod cursor;
pub mod delete;
pub mod document;
pub mod error;
pub mod selection;
pub mod session;
pub mod settings;
pub mod undo;

#[doc(inline)]
pub use audit::{
    audit_legacy_attributes, migrate_legacy_attributes, recommend_migration, LegacyAuditReport,
    MigrationAction,
};
#[doc(inline)]
pub use block::{Block, BlockKind, BlockSequence, DeletionRange};
#[doc(inline)]
pub use cursor::{place_cursor, resolve_deletion_cursor, CursorPlacement, CursorTarget};
#[doc(inline)]
pub use delete::{
    perform_structural_delete, DeleteObserver, DeleteRequest, DeleteSource, DeletionPlan,
    LogDeleteObserver, StructuralDeleteAuthority,
};
#[doc(inline)]
pub use document::{decode_note_content, is_boot_state};
#[doc(inline)]
pub use error::{InkblockError, Result};
#[doc(inline)]
pub use selection::{
    intersecting_blocks, BlockGeometry, BlockRect, BlockSelection, BlockSelector, Rect,
    SelectionBox,
};
#[doc(inline)]
pub use session::{EditorSession, SessionEdit};
#[doc(inline)]
pub use settings::{load_settings, save_settings, EditorSettings, DEFAULT_MAX_UNDO_GROUPS};
#[doc(inline)]
pub use undo::{
    BoundaryDecision, BoundaryPlacement, BoundaryReason, EditEvent, UndoGrouping,
    UndoGroupingState, UndoHistory, LARGE_CHANGE_THRESHOLD,
};
