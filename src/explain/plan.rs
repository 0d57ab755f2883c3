use std::fmt;

use crate::error::{PlanError, Result};
use crate::explain::{join_operator_for_node, scan_operator_for_node, ExplainNode};
use crate::model::{JoinOperator, ScanOperator, TableRef, TableSet};

/// Operator kind of a normalized plan node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanOperator {
    /// A base-relation scan with its abstract operator tag.
    Scan(ScanOperator),
    /// A join with its abstract operator tag.
    Join(JoinOperator),
    /// Any auxiliary node (hash build, sort, aggregate, gather, ...).
    Other,
}

/// Backend-independent reconstruction of one native plan node.
///
/// Built bottom-up from an [`ExplainNode`] and never mutated afterwards. The
/// reconstruction is lossy: engine-specific details without an abstract
/// counterpart are dropped.
#[derive(Clone, Debug)]
pub struct QueryPlan {
    /// The native node-type tag the node was built from.
    pub node_type: String,
    /// Abstract operator classification.
    pub operator: PlanOperator,
    /// The processed relation, where one is reported.
    pub table: Option<TableRef>,
    /// Input plans, at most two.
    pub children: Vec<QueryPlan>,
    /// Index into `children` of the inner input, for two-input nodes. For
    /// hash joins this already accounts for the engine's inverted reading of
    /// the inner role: the index denotes the probed side, not the build side.
    pub inner_child: Option<usize>,
    /// Estimated cost including children.
    pub cost: f64,
    /// Estimated output cardinality.
    pub estimated_cardinality: f64,
    /// Total rows actually produced across all loops, `NaN` without runtime
    /// statistics.
    pub true_cardinality: f64,
    /// Actual execution time in seconds, `NaN` without runtime statistics.
    pub execution_time: f64,
    /// Pages served from the shared buffer, including children.
    pub cached_pages: f64,
    /// Pages read from disk, including children.
    pub scanned_pages: f64,
    /// Processes that produced rows for this node, including the
    /// coordinating process.
    pub parallel_workers: u32,
}

impl QueryPlan {
    /// Normalizes a native plan node, recursively.
    ///
    /// Fails with [`PlanError::MalformedPlan`] when a node reports more than
    /// two children; such shapes cannot come from a plain relational plan.
    pub fn from_explain(node: &ExplainNode) -> Result<QueryPlan> {
        let children: Vec<QueryPlan> = node
            .children
            .iter()
            .map(QueryPlan::from_explain)
            .collect::<Result<_>>()?;
        let inner_child = match children.len() {
            0 | 1 => None,
            2 => {
                let first_is_inner =
                    node.children[0].parent_relationship.as_deref() == Some("Inner");
                // The engine's inner tag marks the build side of a hash join,
                // which is the model's outer relation.
                let invert = join_operator_for_node(&node.node_type)
                    .is_some_and(JoinOperator::is_build_probe_asymmetric);
                Some(if first_is_inner != invert { 0 } else { 1 })
            }
            n => {
                return Err(PlanError::MalformedPlan(format!(
                    "node {:?} has {n} children",
                    node.node_type
                )))
            }
        };

        let operator = if let Some(scan) = scan_operator_for_node(&node.node_type) {
            PlanOperator::Scan(scan)
        } else if let Some(join) = join_operator_for_node(&node.node_type) {
            PlanOperator::Join(join)
        } else {
            PlanOperator::Other
        };

        Ok(QueryPlan {
            node_type: node.node_type.clone(),
            operator,
            table: node.parse_table(),
            children,
            inner_child,
            cost: node.cost,
            estimated_cardinality: node.cardinality_estimate,
            // The native report only gives the per-loop average.
            true_cardinality: node.actual_rows * node.loops as f64,
            execution_time: node.execution_time,
            cached_pages: node.shared_blocks_cached,
            scanned_pages: node.shared_blocks_read,
            // The coordinating process also produces rows but is not counted
            // by the engine.
            parallel_workers: node.workers_launched + 1,
        })
    }

    /// Whether this node is a base-relation scan.
    pub fn is_scan(&self) -> bool {
        matches!(self.operator, PlanOperator::Scan(_))
    }

    /// Whether this node joins two inputs.
    pub fn is_join(&self) -> bool {
        matches!(self.operator, PlanOperator::Join(_))
    }

    /// The inner input of a two-input node.
    pub fn inner_child(&self) -> Option<&QueryPlan> {
        self.inner_child.map(|index| &self.children[index])
    }

    /// The outer input of a two-input node.
    pub fn outer_child(&self) -> Option<&QueryPlan> {
        self.inner_child.map(|index| &self.children[1 - index])
    }

    /// The set of tables scanned underneath this node.
    pub fn tables(&self) -> TableSet {
        let mut tables = TableSet::new();
        self.collect_tables(&mut tables);
        tables
    }

    fn collect_tables(&self, into: &mut TableSet) {
        if let Some(table) = &self.table {
            into.insert(table.clone());
        }
        for child in &self.children {
            child.collect_tables(into);
        }
    }

    /// The join node spanning exactly `tables`, if one exists.
    pub fn find_join(&self, tables: &TableSet) -> Option<&QueryPlan> {
        if self.is_join() && self.tables() == *tables {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_join(tables))
    }

    /// The scan node over `table`, if one exists.
    pub fn find_scan(&self, table: &TableRef) -> Option<&QueryPlan> {
        if self.is_scan() && self.table.as_ref() == Some(table) {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|child| child.find_scan(table))
    }

    /// Pretty multi-line rendering of the normalized plan.
    pub fn inspect(&self) -> String {
        self.inspect_indented(0)
    }

    fn inspect_indented(&self, indentation: usize) -> String {
        let padding = " ".repeat(indentation);
        let prefix = if indentation > 0 {
            format!("{padding}<- ")
        } else {
            String::new()
        };
        let mut lines = vec![format!("{prefix}{self}")];
        let ordered: Vec<&QueryPlan> = match (self.inner_child(), self.outer_child()) {
            (Some(inner), Some(outer)) => vec![inner, outer],
            _ => self.children.iter().collect(),
        };
        lines.extend(
            ordered
                .into_iter()
                .map(|child| child.inspect_indented(indentation + 2)),
        );
        lines.join("\n")
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node_type)?;
        if let Some(table) = &self.table {
            write!(f, " on {}", table.identifier())?;
        }
        write!(
            f,
            " (cost={} rows={})",
            self.cost, self.estimated_cardinality
        )?;
        if !self.true_cardinality.is_nan() || !self.execution_time.is_nan() {
            write!(
                f,
                " (actual time={}s rows={} workers={})",
                self.execution_time, self.true_cardinality, self.parallel_workers
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::table::table_set;
    use serde_json::json;

    fn node(value: serde_json::Value) -> ExplainNode {
        serde_json::from_value(value).expect("node deserializes")
    }

    #[test]
    fn statistics_are_folded_back_into_totals() {
        let plan = QueryPlan::from_explain(&node(json!({
            "Node Type": "Hash Join",
            "Actual Total Time": 1500.0,
            "Actual Rows": 10,
            "Actual Loops": 4,
            "Workers Launched": 2,
            "Plans": [
                {"Node Type": "Seq Scan", "Relation Name": "r", "Parent Relationship": "Outer"},
                {"Node Type": "Hash", "Parent Relationship": "Inner",
                 "Plans": [{"Node Type": "Seq Scan", "Relation Name": "s"}]}
            ]
        })))
        .expect("well-formed plan");

        assert_eq!(plan.execution_time, 1.5);
        assert_eq!(plan.true_cardinality, 40.0);
        assert_eq!(plan.parallel_workers, 3);
        assert_eq!(plan.operator, PlanOperator::Join(JoinOperator::HashJoin));
    }

    #[test]
    fn hash_join_inverts_the_inner_tag() {
        let plan = QueryPlan::from_explain(&node(json!({
            "Node Type": "Hash Join",
            "Plans": [
                {"Node Type": "Seq Scan", "Relation Name": "r", "Parent Relationship": "Outer"},
                {"Node Type": "Hash", "Parent Relationship": "Inner",
                 "Plans": [{"Node Type": "Seq Scan", "Relation Name": "s"}]}
            ]
        })))
        .expect("well-formed plan");

        // The engine tags the hash (build) side as inner; the model's inner
        // relation is the probed seq scan.
        assert_eq!(plan.inner_child().expect("two children").node_type, "Seq Scan");
        assert_eq!(plan.outer_child().expect("two children").node_type, "Hash");
    }

    #[test]
    fn symmetric_join_keeps_the_inner_tag() {
        let plan = QueryPlan::from_explain(&node(json!({
            "Node Type": "Merge Join",
            "Plans": [
                {"Node Type": "Index Scan", "Relation Name": "r", "Parent Relationship": "Outer"},
                {"Node Type": "Index Scan", "Relation Name": "s", "Parent Relationship": "Inner"}
            ]
        })))
        .expect("well-formed plan");

        assert_eq!(
            plan.inner_child()
                .and_then(|child| child.table.as_ref())
                .map(|table| table.name.as_str()),
            Some("s")
        );
    }

    #[test]
    fn single_child_nodes_have_no_inner_distinction() {
        let plan = QueryPlan::from_explain(&node(json!({
            "Node Type": "Aggregate",
            "Plans": [{"Node Type": "Seq Scan", "Relation Name": "r"}]
        })))
        .expect("well-formed plan");
        assert_eq!(plan.operator, PlanOperator::Other);
        assert_eq!(plan.children.len(), 1);
        assert!(plan.inner_child().is_none());
    }

    #[test]
    fn more_than_two_children_is_a_structural_error() {
        let err = QueryPlan::from_explain(&node(json!({
            "Node Type": "Append",
            "Plans": [
                {"Node Type": "Seq Scan"},
                {"Node Type": "Seq Scan"},
                {"Node Type": "Seq Scan"}
            ]
        })))
        .expect_err("three children cannot be normalized");
        assert!(matches!(err, PlanError::MalformedPlan(_)));
    }

    #[test]
    fn lookups_ignore_the_engine_generated_alias() {
        // Unaliased queries still get an Alias field in the report, equal to
        // the relation name. Model-side references without an alias must
        // still find these nodes.
        let plan = QueryPlan::from_explain(&node(json!({
            "Node Type": "Hash Join",
            "Plans": [
                {"Node Type": "Seq Scan", "Relation Name": "r", "Alias": "r",
                 "Parent Relationship": "Outer"},
                {"Node Type": "Hash", "Parent Relationship": "Inner",
                 "Plans": [{"Node Type": "Seq Scan", "Relation Name": "s", "Alias": "s"}]}
            ]
        })))
        .expect("well-formed plan");

        let rs = table_set([TableRef::new("r"), TableRef::new("s")]);
        assert_eq!(plan.tables(), rs);
        let join = plan.find_join(&rs).expect("the root joins r and s");
        assert_eq!(join.operator, PlanOperator::Join(JoinOperator::HashJoin));
        assert!(plan.find_scan(&TableRef::new("r")).is_some());
        assert!(plan.find_scan(&TableRef::new("s")).is_some());
    }

    #[test]
    fn aliased_relations_are_looked_up_by_their_alias() {
        let plan = QueryPlan::from_explain(&node(json!({
            "Node Type": "Nested Loop",
            "Plans": [
                {"Node Type": "Seq Scan", "Relation Name": "title", "Alias": "t",
                 "Parent Relationship": "Outer"},
                {"Node Type": "Index Scan", "Relation Name": "movie_companies",
                 "Alias": "mc", "Parent Relationship": "Inner"}
            ]
        })))
        .expect("well-formed plan");

        let t = TableRef::with_alias("title", "t");
        let mc = TableRef::with_alias("movie_companies", "mc");
        let scan = plan.find_scan(&t).expect("title is scanned under its alias");
        assert_eq!(scan.operator, PlanOperator::Scan(ScanOperator::SequentialScan));
        let join = plan
            .find_join(&table_set([t, mc.clone()]))
            .expect("the root joins both aliased relations");
        assert_eq!(join.operator, PlanOperator::Join(JoinOperator::NestedLoopJoin));
        // The plain (unaliased) reference is a different table reference and
        // must not match.
        assert!(plan.find_scan(&TableRef::new("title")).is_none());
        assert!(plan.find_scan(&TableRef::new("mc")).is_none());
    }

    #[test]
    fn lookup_helpers_find_joins_and_scans() {
        let plan = QueryPlan::from_explain(&node(json!({
            "Node Type": "Nested Loop",
            "Plans": [
                {"Node Type": "Seq Scan", "Relation Name": "r", "Parent Relationship": "Outer"},
                {"Node Type": "Index Scan", "Relation Name": "s", "Parent Relationship": "Inner"}
            ]
        })))
        .expect("well-formed plan");

        let tables = plan.tables();
        assert_eq!(tables.len(), 2);
        let join = plan.find_join(&tables).expect("the root joins r and s");
        assert_eq!(join.operator, PlanOperator::Join(JoinOperator::NestedLoopJoin));
        let scan = plan
            .find_scan(&TableRef::new("s"))
            .expect("s is scanned below the join");
        assert_eq!(scan.operator, PlanOperator::Scan(ScanOperator::IndexScan));
    }
}
