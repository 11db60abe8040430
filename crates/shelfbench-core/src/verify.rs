//! Post-seed verification.

use crate::catalog::EntityKind;
use crate::config::SeedVolumes;
use crate::error::Result;
use crate::model::ReactionType;
use crate::store::{single_integer, Store};

/// Verification result for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityCheck {
    pub kind: EntityKind,
    pub actual: u64,
    pub expected: u64,
    /// Rows whose foreign key resolves to no parent.
    pub orphans: u64,
    /// Reaction rows whose type is not one of the three known values.
    pub invalid_values: u64,
}

impl EntityCheck {
    pub fn is_ok(&self) -> bool {
        self.actual == self.expected && self.orphans == 0 && self.invalid_values == 0
    }
}

/// Verification result for the whole store.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    pub checks: Vec<EntityCheck>,
}

impl VerifyReport {
    pub fn is_consistent(&self) -> bool {
        self.checks.iter().all(EntityCheck::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntityCheck> {
        self.checks.iter().filter(|c| !c.is_ok())
    }
}

/// Compare the store against the counts `volumes` should have produced.
pub fn verify(store: &mut dyn Store, volumes: &SeedVolumes) -> Result<VerifyReport> {
    let expected = volumes.expected_counts();
    let mut report = VerifyReport::default();

    for kind in EntityKind::ALL {
        let check = EntityCheck {
            kind,
            actual: store.count(kind)?,
            expected: expected.get(&kind).copied().unwrap_or(0),
            orphans: store.orphan_count(kind)?,
            invalid_values: invalid_reactions(store, kind)?,
        };
        if check.is_ok() {
            tracing::debug!(entity = %kind, rows = check.actual, "verified");
        } else {
            tracing::warn!(
                entity = %kind,
                actual = check.actual,
                expected = check.expected,
                orphans = check.orphans,
                invalid_values = check.invalid_values,
                "verification mismatch"
            );
        }
        report.checks.push(check);
    }
    Ok(report)
}

fn invalid_reactions(store: &mut dyn Store, kind: EntityKind) -> Result<u64> {
    if !matches!(kind, EntityKind::CommentReaction | EntityKind::ReviewReaction) {
        return Ok(0);
    }
    let allowed = ReactionType::ALL
        .iter()
        .map(|r| format!("'{}'", r.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT COUNT(*) FROM \"{}\" WHERE \"{}\" NOT IN ({allowed})",
        kind.table(),
        kind.text_column()
    );
    single_integer(store.fetch(&sql, &[])?).map(|n| n as u64)
}
