//! Operator enforcement through settings and per-relation hints.

use crate::error::{PlanError, Result};
use crate::hinting::fragments::HintFragments;
use crate::model::{
    JoinOperator, PhysicalOperator, PhysicalOperatorAssignment, ScanOperator, TableSet,
};

/// Session setting that enables or disables an operator globally.
///
/// An operator without a setting is a fatal lookup error: it must never be
/// requested against this backend.
pub fn optimizer_setting(operator: PhysicalOperator) -> Result<&'static str> {
    match operator {
        PhysicalOperator::Join(JoinOperator::NestedLoopJoin) => Ok("enable_nestloop"),
        PhysicalOperator::Join(JoinOperator::HashJoin) => Ok("enable_hashjoin"),
        PhysicalOperator::Join(JoinOperator::SortMergeJoin) => Ok("enable_mergejoin"),
        PhysicalOperator::Scan(ScanOperator::SequentialScan) => Ok("enable_seqscan"),
        PhysicalOperator::Scan(ScanOperator::IndexScan) => Ok("enable_indexscan"),
        PhysicalOperator::Scan(ScanOperator::IndexOnlyScan) => Ok("enable_indexonlyscan"),
        PhysicalOperator::Scan(ScanOperator::BitmapScan) => Ok("enable_bitmapscan"),
        PhysicalOperator::Join(JoinOperator::IndexNestedLoopJoin) => {
            Err(PlanError::UnsupportedOperator { op: operator })
        }
    }
}

/// *pg_hint_plan* verb that forces an operator for individual relations.
pub fn hint_verb(operator: PhysicalOperator) -> Result<&'static str> {
    match operator {
        PhysicalOperator::Join(JoinOperator::NestedLoopJoin) => Ok("NestLoop"),
        PhysicalOperator::Join(JoinOperator::HashJoin) => Ok("HashJoin"),
        PhysicalOperator::Join(JoinOperator::SortMergeJoin) => Ok("MergeJoin"),
        PhysicalOperator::Scan(ScanOperator::SequentialScan) => Ok("SeqScan"),
        PhysicalOperator::Scan(ScanOperator::IndexScan) => Ok("IndexScan"),
        PhysicalOperator::Scan(ScanOperator::IndexOnlyScan) => Ok("IndexOnlyScan"),
        PhysicalOperator::Scan(ScanOperator::BitmapScan) => Ok("BitmapScan"),
        PhysicalOperator::Join(JoinOperator::IndexNestedLoopJoin) => {
            Err(PlanError::UnsupportedOperator { op: operator })
        }
    }
}

/// Whether the backend can enforce `operator` at all.
pub fn supported_hint(operator: PhysicalOperator) -> bool {
    hint_verb(operator).is_ok()
}

/// Hint-syntax identifier for a join: the space-joined table identifiers.
pub(crate) fn join_key(tables: &TableSet) -> String {
    let identifiers: Vec<&str> = tables.iter().map(|table| table.identifier()).collect();
    identifiers.join(" ")
}

/// Compiles an operator assignment into settings and hints.
///
/// Emission order: global settings first, then scan hints, then (separated by
/// one blank line when scan hints exist) join hints, each in the assignment's
/// insertion order. Per-relation hints overwrite the global settings for the
/// relations they name, e.g. disabling nested loops globally while forcing
/// one specific join to use them.
pub fn operator_hints(assignment: &PhysicalOperatorAssignment) -> Result<HintFragments> {
    let mut settings = Vec::new();
    for (operator, enabled) in assignment.global_settings() {
        let value = if enabled { "on" } else { "off" };
        settings.push(format!("SET {} = '{}';", optimizer_setting(operator)?, value));
    }

    let mut hints = Vec::new();
    for (table, operator) in assignment.scan_operators() {
        hints.push(format!(
            "{}({})",
            hint_verb(operator.into())?,
            table.identifier()
        ));
    }

    if !hints.is_empty() && assignment.join_operators().next().is_some() {
        // Blank line between the scan and join sections of the block.
        hints.push(String::new());
    }
    for (tables, join_assignment) in assignment.join_operators() {
        hints.push(format!(
            "{}({})",
            hint_verb(join_assignment.operator.into())?,
            join_key(tables)
        ));
    }

    Ok(HintFragments { settings, hints })
}
