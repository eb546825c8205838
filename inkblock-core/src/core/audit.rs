//! Read-only audit of the deprecated parent-toggle reference.
//!
//! Blocks used to point at their enclosing toggle through
//! `legacy_parent_toggle_id`. Structural nesting (order plus indent) and the
//! newer `parent_id` replace it. [`audit_legacy_attributes`] reports how much
//! legacy data a document still carries and [`recommend_migration`] turns that
//! report into a one-time migration decision.
//!
//! Classifications are advisory: when the legacy and structural references
//! disagree, neither is treated as authoritative here.

use crate::{BlockSequence, InkblockError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Counts produced by [`audit_legacy_attributes`].
///
/// `dangling` is independent of `orphaned`/`convertible`: a block can be
/// counted in `dangling` and in one of the other two.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyAuditReport {
    /// Blocks carrying the legacy reference.
    pub total: usize,
    /// `total` broken down by block kind name.
    pub by_kind: BTreeMap<String, usize>,
    /// Legacy blocks without a structural parent reference.
    pub orphaned: usize,
    /// Legacy blocks that also carry a structural parent reference.
    pub convertible: usize,
    /// Legacy blocks whose reference targets no toggle block in the document.
    pub dangling: usize,
    /// Every ID referenced through the legacy attribute.
    pub referenced_ids: BTreeSet<String>,
}

/// What to do with the legacy attribute in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MigrationAction {
    /// No legacy data; the attribute can be dropped from the schema.
    Delete,
    /// Every legacy block is convertible.
    Migrate,
    /// Some blocks lack a structural reference and must be re-parented first.
    Repair,
    /// References point at missing blocks, or the data is otherwise inconsistent.
    Investigate,
}

/// Classifies every block carrying the legacy parent-toggle reference.
///
/// Never mutates `blocks` and never fails.
///
/// # Examples
///
/// ```rust
/// use inkblock_core::{
///     audit_legacy_attributes, recommend_migration, BlockSequence, MigrationAction,
/// };
///
/// let report = audit_legacy_attributes(&BlockSequence::default());
/// assert_eq!(report.total, 0);
/// assert_eq!(recommend_migration(&report), MigrationAction::Delete);
/// ```
#[must_use]
pub fn audit_legacy_attributes(blocks: &BlockSequence) -> LegacyAuditReport {
    let toggle_ids: HashSet<&str> = blocks
        .iter()
        .filter(|b| b.kind.is_toggle())
        .map(|b| b.block_id.as_str())
        .collect();

    let mut report = LegacyAuditReport::default();
    for block in blocks {
        let Some(target) = block.legacy_parent_toggle_id.as_deref() else {
            continue;
        };
        report.total += 1;
        *report
            .by_kind
            .entry(block.kind.type_name().to_string())
            .or_insert(0) += 1;
        report.referenced_ids.insert(target.to_string());

        if block.parent_id.is_some() {
            report.convertible += 1;
        } else {
            report.orphaned += 1;
        }
        if !toggle_ids.contains(target) {
            report.dangling += 1;
        }
    }
    report
}

/// Maps an audit report to a migration decision.
#[must_use]
pub fn recommend_migration(report: &LegacyAuditReport) -> MigrationAction {
    if report.total == 0 {
        MigrationAction::Delete
    } else if report.dangling > 0 {
        MigrationAction::Investigate
    } else if report.orphaned > 0 {
        MigrationAction::Repair
    } else if report.convertible == report.total {
        MigrationAction::Migrate
    } else {
        MigrationAction::Investigate
    }
}

/// Returns a copy of `blocks` with every legacy parent-toggle reference removed.
///
/// Only runs when the audit recommends [`MigrationAction::Migrate`] or
/// [`MigrationAction::Delete`]; the structural reference is kept as is.
///
/// # Errors
///
/// Returns [`InkblockError::InvariantViolation`] when the audit recommends
/// repair or investigation first.
pub fn migrate_legacy_attributes(blocks: &BlockSequence) -> Result<BlockSequence> {
    let report = audit_legacy_attributes(blocks);
    match recommend_migration(&report) {
        MigrationAction::Delete => Ok(blocks.clone()),
        MigrationAction::Migrate => {
            log::info!("migrating {} legacy parent-toggle reference(s)", report.total);
            Ok(BlockSequence::from(
                blocks
                    .iter()
                    .map(|b| {
                        let mut b = b.clone();
                        b.legacy_parent_toggle_id = None;
                        b
                    })
                    .collect::<Vec<_>>(),
            ))
        }
        action => Err(InkblockError::InvariantViolation(format!(
            "legacy attribute migration refused ({action:?}): {} orphaned, {} dangling of {}",
            report.orphaned, report.dangling, report.total
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Block, BlockKind};

    fn child(id: &str, legacy: Option<&str>, parent: Option<&str>) -> Block {
        let mut block = Block::with_id(id, BlockKind::Paragraph).at_indent(1);
        block.legacy_parent_toggle_id = legacy.map(str::to_string);
        block.parent_id = parent.map(str::to_string);
        block
    }

    #[test]
    fn test_no_legacy_data_recommends_delete() {
        let blocks = BlockSequence::from(vec![
            Block::with_id("t", BlockKind::Toggle),
            child("a", None, Some("t")),
        ]);
        let report = audit_legacy_attributes(&blocks);
        assert_eq!(report.total, 0);
        assert_eq!(recommend_migration(&report), MigrationAction::Delete);
    }

    #[test]
    fn test_classification() {
        let blocks = BlockSequence::from(vec![
            Block::with_id("t", BlockKind::Toggle),
            child("convertible", Some("t"), Some("t")),
            child("orphaned", Some("t"), None),
            child("dangling", Some("gone"), Some("t")),
        ]);
        let report = audit_legacy_attributes(&blocks);
        assert_eq!(report.total, 3);
        assert_eq!(report.convertible, 2);
        assert_eq!(report.orphaned, 1);
        assert_eq!(report.dangling, 1);
        assert_eq!(report.by_kind.get("paragraph"), Some(&3));
        assert!(report.referenced_ids.contains("gone"));
        assert_eq!(recommend_migration(&report), MigrationAction::Investigate);
    }

    #[test]
    fn test_reference_to_non_toggle_is_dangling() {
        let blocks = BlockSequence::from(vec![
            Block::with_id("p", BlockKind::Paragraph),
            child("a", Some("p"), Some("p")),
        ]);
        let report = audit_legacy_attributes(&blocks);
        assert_eq!(report.dangling, 1);
        assert_eq!(report.convertible, 1);
    }

    #[test]
    fn test_recommendation_order() {
        let orphaned = LegacyAuditReport {
            total: 2,
            orphaned: 1,
            convertible: 1,
            ..Default::default()
        };
        assert_eq!(recommend_migration(&orphaned), MigrationAction::Repair);

        let clean = LegacyAuditReport {
            total: 2,
            convertible: 2,
            ..Default::default()
        };
        assert_eq!(recommend_migration(&clean), MigrationAction::Migrate);
    }

    #[test]
    fn test_audit_does_not_mutate() {
        let blocks = BlockSequence::from(vec![
            Block::with_id("t", BlockKind::Toggle),
            child("a", Some("t"), None),
        ]);
        let before = blocks.clone();
        let _ = audit_legacy_attributes(&blocks);
        let _ = audit_legacy_attributes(&blocks);
        assert_eq!(blocks, before);
    }

    #[test]
    fn test_migrate_strips_legacy_references() {
        let blocks = BlockSequence::from(vec![
            Block::with_id("t", BlockKind::Toggle),
            child("a", Some("t"), Some("t")),
        ]);
        let migrated = migrate_legacy_attributes(&blocks).unwrap();
        assert_eq!(audit_legacy_attributes(&migrated).total, 0);
        assert_eq!(migrated.get(1).unwrap().parent_id.as_deref(), Some("t"));
    }

    #[test]
    fn test_migrate_refuses_orphaned_data() {
        let blocks = BlockSequence::from(vec![
            Block::with_id("t", BlockKind::Toggle),
            child("a", Some("t"), None),
        ]);
        assert!(matches!(
            migrate_legacy_attributes(&blocks),
            Err(InkblockError::InvariantViolation(_))
        ));
    }
}
