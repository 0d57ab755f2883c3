use std::fmt;

use rustc_hash::FxHashSet;

use crate::model::table::{TableRef, TableSet};

/// Physical scan algorithms the abstract plan can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScanOperator {
    /// Plain sequential heap scan.
    SequentialScan,
    /// Index scan followed by heap fetches.
    IndexScan,
    /// Scan answered entirely from the index.
    IndexOnlyScan,
    /// Bitmap index scan plus bitmap heap scan.
    BitmapScan,
}

/// Physical join algorithms the abstract plan can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JoinOperator {
    /// Plain nested-loop join.
    NestedLoopJoin,
    /// Nested-loop join probing an index on the inner relation. Part of the
    /// abstract operator vocabulary, but Postgres has no dedicated hint or
    /// setting for it.
    IndexNestedLoopJoin,
    /// Hash join. The only build-probe-asymmetric operator: one input is
    /// materialized into a hash table, the other is streamed against it.
    HashJoin,
    /// Sort-merge join.
    SortMergeJoin,
}

impl JoinOperator {
    /// Whether the two inputs of this operator play structurally different
    /// roles (build side vs. probe side).
    pub fn is_build_probe_asymmetric(self) -> bool {
        matches!(self, JoinOperator::HashJoin)
    }
}

/// Either kind of physical operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhysicalOperator {
    /// A scan algorithm.
    Scan(ScanOperator),
    /// A join algorithm.
    Join(JoinOperator),
}

impl From<ScanOperator> for PhysicalOperator {
    fn from(op: ScanOperator) -> Self {
        PhysicalOperator::Scan(op)
    }
}

impl From<JoinOperator> for PhysicalOperator {
    fn from(op: JoinOperator) -> Self {
        PhysicalOperator::Join(op)
    }
}

impl fmt::Display for ScanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScanOperator::SequentialScan => "sequential scan",
            ScanOperator::IndexScan => "index scan",
            ScanOperator::IndexOnlyScan => "index-only scan",
            ScanOperator::BitmapScan => "bitmap scan",
        };
        f.write_str(name)
    }
}

impl fmt::Display for JoinOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JoinOperator::NestedLoopJoin => "nested-loop join",
            JoinOperator::IndexNestedLoopJoin => "index nested-loop join",
            JoinOperator::HashJoin => "hash join",
            JoinOperator::SortMergeJoin => "sort-merge join",
        };
        f.write_str(name)
    }
}

impl fmt::Display for PhysicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalOperator::Scan(op) => op.fmt(f),
            PhysicalOperator::Join(op) => op.fmt(f),
        }
    }
}

/// Join operator choice for one specific join, optionally directional.
///
/// The directional form names the table set that should act as the *inner*
/// relation in the conventional sense (the probed side). How that maps onto
/// the hint syntax is the hint compiler's problem, not the model's.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JoinOperatorAssignment {
    /// The requested join algorithm.
    pub operator: JoinOperator,
    /// Tables forming the inner relation, when the caller pins the direction.
    pub inner: Option<TableSet>,
}

impl JoinOperatorAssignment {
    /// Operator choice without a pinned direction.
    pub fn new(operator: JoinOperator) -> Self {
        Self {
            operator,
            inner: None,
        }
    }

    /// Operator choice with an explicit inner relation.
    pub fn directional(operator: JoinOperator, inner: TableSet) -> Self {
        Self {
            operator,
            inner: Some(inner),
        }
    }

    /// Whether this assignment pins the join direction.
    pub fn is_directional(&self) -> bool {
        self.inner.is_some()
    }
}

/// Complete operator selection for one query.
///
/// Three maps: per-table scan operators, per-join join operators and global
/// enable/disable flags. Per-relation choices overwrite the global flags for
/// the relations they name. Iteration order is insertion order, which is also
/// the order hints are emitted in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PhysicalOperatorAssignment {
    scan_operators: Vec<(TableRef, ScanOperator)>,
    join_operators: Vec<(TableSet, JoinOperatorAssignment)>,
    global_settings: Vec<(PhysicalOperator, bool)>,
}

impl PhysicalOperatorAssignment {
    /// Creates an empty assignment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a scan operator for a base table. A second request for the
    /// same table replaces the first in place.
    pub fn set_scan_operator(&mut self, table: TableRef, operator: ScanOperator) {
        match self.scan_operators.iter_mut().find(|(t, _)| *t == table) {
            Some(entry) => entry.1 = operator,
            None => self.scan_operators.push((table, operator)),
        }
    }

    /// Requests a join operator for the join spanning exactly `tables`.
    pub fn set_join_operator(&mut self, tables: TableSet, assignment: JoinOperatorAssignment) {
        debug_assert!(tables.len() >= 2, "join operators span at least two tables");
        match self.join_operators.iter_mut().find(|(t, _)| *t == tables) {
            Some(entry) => entry.1 = assignment,
            None => self.join_operators.push((tables, assignment)),
        }
    }

    /// Enables or disables an operator for the whole query.
    pub fn set_operator_enabled(&mut self, operator: PhysicalOperator, enabled: bool) {
        match self
            .global_settings
            .iter_mut()
            .find(|(op, _)| *op == operator)
        {
            Some(entry) => entry.1 = enabled,
            None => self.global_settings.push((operator, enabled)),
        }
    }

    /// The scan operator requested for `table`, if any.
    pub fn scan_operator(&self, table: &TableRef) -> Option<ScanOperator> {
        self.scan_operators
            .iter()
            .find(|(t, _)| t == table)
            .map(|(_, op)| *op)
    }

    /// The join operator requested for the join spanning exactly `tables`.
    pub fn join_operator(&self, tables: &TableSet) -> Option<&JoinOperatorAssignment> {
        self.join_operators
            .iter()
            .find(|(t, _)| t == tables)
            .map(|(_, assignment)| assignment)
    }

    /// Per-table scan choices in insertion order.
    pub fn scan_operators(&self) -> impl Iterator<Item = (&TableRef, ScanOperator)> {
        self.scan_operators.iter().map(|(t, op)| (t, *op))
    }

    /// Per-join choices in insertion order.
    pub fn join_operators(&self) -> impl Iterator<Item = (&TableSet, &JoinOperatorAssignment)> {
        self.join_operators.iter().map(|(t, a)| (t, a))
    }

    /// Global enable/disable flags in insertion order.
    pub fn global_settings(&self) -> impl Iterator<Item = (PhysicalOperator, bool)> + '_ {
        self.global_settings.iter().copied()
    }

    /// All operators that are globally enabled.
    pub fn globally_enabled_operators(&self) -> FxHashSet<PhysicalOperator> {
        self.global_settings
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(op, _)| *op)
            .collect()
    }

    /// Whether the assignment requests nothing at all.
    pub fn is_empty(&self) -> bool {
        self.scan_operators.is_empty()
            && self.join_operators.is_empty()
            && self.global_settings.is_empty()
    }
}
