#![forbid(unsafe_code)]

//! Normalization of native `EXPLAIN` reports.
//!
//! Postgres reports executed or planned queries as a JSON tree of
//! heterogeneous, engine-specific node records. This module parses that tree
//! into [`ExplainNode`]s and reconstructs the backend-independent
//! [`QueryPlan`] from them, resolving the engine's inner/outer conventions
//! and folding per-loop averages back into totals.

/// The backend-independent, normalized plan tree.
pub mod plan;

use std::fmt;

use serde::Deserialize;

use crate::error::{PlanError, Result};
use crate::model::{JoinOperator, ScanOperator, TableRef};

pub use plan::{PlanOperator, QueryPlan};

/// Scan operator reported under a native node-type tag, if any.
pub(crate) fn scan_operator_for_node(node_type: &str) -> Option<ScanOperator> {
    match node_type {
        "Seq Scan" => Some(ScanOperator::SequentialScan),
        "Index Scan" => Some(ScanOperator::IndexScan),
        "Index Only Scan" => Some(ScanOperator::IndexOnlyScan),
        "Bitmap Heap Scan" => Some(ScanOperator::BitmapScan),
        _ => None,
    }
}

/// Join operator reported under a native node-type tag, if any.
pub(crate) fn join_operator_for_node(node_type: &str) -> Option<JoinOperator> {
    match node_type {
        "Nested Loop" => Some(JoinOperator::NestedLoopJoin),
        "Hash Join" => Some(JoinOperator::HashJoin),
        "Merge Join" => Some(JoinOperator::SortMergeJoin),
        _ => None,
    }
}

fn nan() -> f64 {
    f64::NAN
}

fn one() -> u64 {
    1
}

fn millis_to_secs<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    f64::deserialize(deserializer).map(|millis| millis / 1000.0)
}

/// One node of a native `EXPLAIN` report.
///
/// A faithful but simplified view of the engine's JSON record: fields the
/// normalizer cares about are deserialized, everything else is dropped.
/// Missing numeric statistics default to `NaN` (pure `EXPLAIN` plans have no
/// runtime numbers), the loop count defaults to 1 and the worker count to 0.
/// Timing fields arrive in milliseconds and are stored in seconds.
///
/// No structural constraints are enforced at this level; a node keeps
/// whatever child list the engine reported. Shape checks happen during
/// normalization.
#[derive(Clone, Debug, Deserialize)]
pub struct ExplainNode {
    /// The engine-specific node-type tag, e.g. `"Hash Join"`.
    #[serde(rename = "Node Type", default)]
    pub node_type: String,
    /// Estimated cost of this node including its children.
    #[serde(rename = "Total Cost", default = "nan")]
    pub cost: f64,
    /// Estimated number of rows produced by this node.
    #[serde(rename = "Plan Rows", default = "nan")]
    pub cardinality_estimate: f64,
    /// Actual total execution time in seconds, `NaN` for plain `EXPLAIN`.
    #[serde(
        rename = "Actual Total Time",
        default = "nan",
        deserialize_with = "millis_to_secs"
    )]
    pub execution_time: f64,
    /// Actual rows produced *per loop*, `NaN` for plain `EXPLAIN`.
    #[serde(rename = "Actual Rows", default = "nan")]
    pub actual_rows: f64,
    /// Number of times the node was invoked.
    #[serde(rename = "Actual Loops", default = "one")]
    pub loops: u64,
    /// Name of the scanned relation, where applicable.
    #[serde(rename = "Relation Name", default)]
    pub relation_name: Option<String>,
    /// Alias the relation was accessed under.
    #[serde(rename = "Alias", default)]
    pub relation_alias: Option<String>,
    /// Name of the probed index, where applicable.
    #[serde(rename = "Index Name", default)]
    pub index_name: Option<String>,
    /// Post-processing filter applied to emitted rows.
    #[serde(rename = "Filter", default)]
    pub filter_condition: Option<String>,
    /// Condition used to locate matching tuples in an index.
    #[serde(rename = "Index Cond", default)]
    pub index_condition: Option<String>,
    /// Condition used to match tuples in a join.
    #[serde(rename = "Join Filter", default)]
    pub join_filter: Option<String>,
    /// Condition used to match tuples in a hash join.
    #[serde(rename = "Hash Cond", default)]
    pub hash_condition: Option<String>,
    /// Recheck applied after a lossy bitmap scan.
    #[serde(rename = "Recheck Cond", default)]
    pub recheck_condition: Option<String>,
    /// Role of this node relative to its parent (`"Inner"` / `"Outer"`).
    #[serde(rename = "Parent Relationship", default)]
    pub parent_relationship: Option<String>,
    /// Worker processes launched for this node. The coordinating process is
    /// not included in this count.
    #[serde(rename = "Workers Launched", default)]
    pub workers_launched: u32,
    /// Blocks read from disk, including children.
    #[serde(rename = "Shared Read Blocks", default = "nan")]
    pub shared_blocks_read: f64,
    /// Blocks served from the shared buffer, including children.
    #[serde(rename = "Shared Hit Blocks", default = "nan")]
    pub shared_blocks_cached: f64,
    /// Short-term blocks read (hash tables, sorts), including children.
    #[serde(rename = "Temp Read Blocks", default = "nan")]
    pub temp_blocks_read: f64,
    /// Short-term blocks written, including children.
    #[serde(rename = "Temp Written Blocks", default = "nan")]
    pub temp_blocks_written: f64,
    /// Input nodes.
    #[serde(rename = "Plans", default)]
    pub children: Vec<ExplainNode>,
}

impl ExplainNode {
    /// Whether this node is a scan over a base relation.
    ///
    /// For the two-level bitmap scan this is true for the heap part, which is
    /// the node that actually produces tuples.
    pub fn is_scan(&self) -> bool {
        scan_operator_for_node(&self.node_type).is_some()
    }

    /// Whether this node joins two inputs.
    pub fn is_join(&self) -> bool {
        join_operator_for_node(&self.node_type).is_some()
    }

    /// Whether the report carries runtime statistics (`EXPLAIN ANALYZE`).
    pub fn is_analyze(&self) -> bool {
        !self.execution_time.is_nan() || !self.actual_rows.is_nan()
    }

    /// All filter-like conditions defined on this node, keyed by their
    /// native field names.
    pub fn filter_conditions(&self) -> Vec<(&'static str, &str)> {
        let fields = [
            ("Filter", &self.filter_condition),
            ("Index Cond", &self.index_condition),
            ("Join Filter", &self.join_filter),
            ("Hash Cond", &self.hash_condition),
            ("Recheck Cond", &self.recheck_condition),
        ];
        fields
            .into_iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
            .collect()
    }

    /// The relation processed by this node, if one is reported.
    ///
    /// The engine reports an `Alias` for every scanned relation, equal to the
    /// relation name when the query did not alias it. That case counts as
    /// unaliased here, so references recovered from a report compare equal to
    /// references built without an alias.
    pub fn parse_table(&self) -> Option<TableRef> {
        let name = self.relation_name.as_deref()?;
        Some(match self.relation_alias.as_deref() {
            Some(alias) if alias != name => TableRef::with_alias(name, alias),
            _ => TableRef::new(name),
        })
    }

    /// Children reordered as `[inner, outer]` where that distinction exists.
    ///
    /// Nodes with fewer than two children are returned as-is. This uses the
    /// engine's own labels; the hash-join role inversion is applied during
    /// normalization, not here.
    pub fn inner_outer_children(&self) -> Vec<&ExplainNode> {
        if self.children.len() != 2 {
            return self.children.iter().collect();
        }
        let first_is_inner = self.children[0].parent_relationship.as_deref() == Some("Inner");
        if first_is_inner {
            vec![&self.children[0], &self.children[1]]
        } else {
            vec![&self.children[1], &self.children[0]]
        }
    }

    /// Pretty multi-line rendering of the native sub-plan.
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
        lines.extend(
            self.inner_outer_children()
                .into_iter()
                .map(|child| child.inspect_indented(indentation + 2)),
        );
        lines.join("\n")
    }
}

impl fmt::Display for ExplainNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.node_type)?;
        if self.is_scan() {
            if let Some(table) = self.parse_table() {
                write!(f, " on {}", table.identifier())?;
            }
        }
        write!(
            f,
            " (cost={} rows={})",
            self.cost, self.cardinality_estimate
        )?;
        if self.is_analyze() {
            write!(
                f,
                " (actual time={}s rows={} loops={})",
                self.execution_time, self.actual_rows, self.loops
            )?;
        }
        for (name, condition) in self.filter_conditions() {
            write!(f, " {name}: {condition}")?;
        }
        Ok(())
    }
}

/// A complete native `EXPLAIN` report with its normalized counterpart.
///
/// The normalized plan is built exactly once, when the report is parsed, and
/// handed out by reference afterwards. Native and normalized views are two
/// explicit accessors; neither shadows the other.
#[derive(Clone, Debug)]
pub struct ExplainPlan {
    planning_time: f64,
    execution_time: f64,
    root: ExplainNode,
    normalized: QueryPlan,
}

impl ExplainPlan {
    /// Parses a raw `EXPLAIN (FORMAT JSON)` document.
    ///
    /// Accepts both the single-element array Postgres produces and a bare
    /// report object.
    pub fn parse(report: &serde_json::Value) -> Result<Self> {
        let report = match report {
            serde_json::Value::Array(entries) => entries
                .first()
                .ok_or_else(|| PlanError::MalformedReport("empty EXPLAIN document".into()))?,
            other => other,
        };
        let plan_data = report
            .get("Plan")
            .ok_or_else(|| PlanError::MalformedReport("report has no Plan entry".into()))?;
        let root: ExplainNode = serde_json::from_value(plan_data.clone())?;
        let normalized = QueryPlan::from_explain(&root)?;
        let time_field = |name: &str| {
            report
                .get(name)
                .and_then(serde_json::Value::as_f64)
                .map_or(f64::NAN, |millis| millis / 1000.0)
        };
        Ok(Self {
            planning_time: time_field("Planning Time"),
            execution_time: time_field("Execution Time"),
            root,
            normalized,
        })
    }

    /// Parses a report from its JSON text.
    pub fn parse_str(report: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(report)?;
        Self::parse(&value)
    }

    /// Seconds the optimizer spent building the plan, `NaN` if not reported.
    pub fn planning_time(&self) -> f64 {
        self.planning_time
    }

    /// Seconds the executor spent producing the result set, `NaN` for plans
    /// that were not executed.
    pub fn execution_time(&self) -> f64 {
        self.execution_time
    }

    /// Whether the report carries runtime statistics.
    pub fn is_analyze(&self) -> bool {
        self.root.is_analyze()
    }

    /// The native plan tree as reported by the engine.
    pub fn native(&self) -> &ExplainNode {
        &self.root
    }

    /// The normalized plan, built once at parse time.
    pub fn plan(&self) -> &QueryPlan {
        &self.normalized
    }

    /// Pretty multi-line rendering of the native plan.
    pub fn inspect(&self) -> String {
        self.root.inspect()
    }
}
