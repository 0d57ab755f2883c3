use crate::model::operators::JoinOperatorAssignment;
use crate::model::table::{TableRef, TableSet};

/// Node of a binary join tree.
///
/// Trees are strictly binary: leaves are base tables, interior nodes join the
/// results of exactly two subtrees. The table sets of the two children of a
/// join never overlap; this is the caller's invariant and is not re-checked
/// here.
///
/// Every node may carry a cardinality estimate for the rows it produces.
/// `f64::NAN` means "unknown" and is the default.
#[derive(Clone, Debug)]
pub enum JoinTreeNode {
    /// A scanned base table.
    BaseTable {
        /// The scanned relation.
        table: TableRef,
        /// Estimated output cardinality, `NaN` if unknown.
        cardinality: f64,
    },
    /// A join of two subtrees.
    Join {
        /// Left input.
        left: Box<JoinTreeNode>,
        /// Right input.
        right: Box<JoinTreeNode>,
        /// Optional per-node operator choice, used as a fallback when no
        /// global operator assignment covers this join.
        annotation: Option<JoinOperatorAssignment>,
        /// Estimated output cardinality, `NaN` if unknown.
        cardinality: f64,
    },
}

impl JoinTreeNode {
    /// Creates a leaf with unknown cardinality.
    pub fn base(table: TableRef) -> Self {
        JoinTreeNode::BaseTable {
            table,
            cardinality: f64::NAN,
        }
    }

    /// Creates a leaf with a cardinality estimate.
    pub fn base_with_cardinality(table: TableRef, cardinality: f64) -> Self {
        JoinTreeNode::BaseTable { table, cardinality }
    }

    /// Joins two subtrees without annotation or estimate.
    pub fn join(left: JoinTreeNode, right: JoinTreeNode) -> Self {
        JoinTreeNode::Join {
            left: Box::new(left),
            right: Box::new(right),
            annotation: None,
            cardinality: f64::NAN,
        }
    }

    /// Attaches a cardinality estimate to this node.
    pub fn with_cardinality(mut self, estimate: f64) -> Self {
        match &mut self {
            JoinTreeNode::BaseTable { cardinality, .. }
            | JoinTreeNode::Join { cardinality, .. } => *cardinality = estimate,
        }
        self
    }

    /// Attaches an operator annotation. Only meaningful on join nodes; leaves
    /// are returned unchanged.
    pub fn with_annotation(mut self, operator: JoinOperatorAssignment) -> Self {
        if let JoinTreeNode::Join { annotation, .. } = &mut self {
            *annotation = Some(operator);
        }
        self
    }

    /// The set of tables this subtree spans.
    pub fn tables(&self) -> TableSet {
        match self {
            JoinTreeNode::BaseTable { table, .. } => TableSet::from([table.clone()]),
            JoinTreeNode::Join { left, right, .. } => {
                let mut tables = left.tables();
                tables.extend(right.tables());
                tables
            }
        }
    }

    /// Number of base tables in this subtree.
    pub fn table_count(&self) -> usize {
        match self {
            JoinTreeNode::BaseTable { .. } => 1,
            JoinTreeNode::Join { left, right, .. } => left.table_count() + right.table_count(),
        }
    }

    /// The node's cardinality estimate, `NaN` if unknown.
    pub fn cardinality(&self) -> f64 {
        match self {
            JoinTreeNode::BaseTable { cardinality, .. }
            | JoinTreeNode::Join { cardinality, .. } => *cardinality,
        }
    }

    /// The per-node operator annotation, if any.
    pub fn annotation(&self) -> Option<&JoinOperatorAssignment> {
        match self {
            JoinTreeNode::BaseTable { .. } => None,
            JoinTreeNode::Join { annotation, .. } => annotation.as_ref(),
        }
    }
}

/// A complete join order for one query.
#[derive(Clone, Debug)]
pub struct JoinTree {
    /// The root of the join-order tree.
    pub root: JoinTreeNode,
}

impl JoinTree {
    /// Wraps a root node into a tree.
    pub fn new(root: JoinTreeNode) -> Self {
        Self { root }
    }

    /// The set of tables joined by this tree.
    pub fn tables(&self) -> TableSet {
        self.root.tables()
    }

    /// Number of base tables joined by this tree.
    pub fn table_count(&self) -> usize {
        self.root.table_count()
    }
}
