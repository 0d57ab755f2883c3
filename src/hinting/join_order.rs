//! Join-order enforcement through the `Leading` hint.
//!
//! `Leading` does not only pin the order in which relations are joined, it
//! also pins the join *direction*: which input ends up in the inner and which
//! in the outer position. Postgres interprets the inner position of a hash
//! join as the build side, which is the opposite of the conventional
//! inner/outer reading used by the plan model. The direction resolver in this
//! module reconciles the two conventions.

use tracing::warn;

use crate::hinting::fragments::HintFragments;
use crate::hinting::operators::join_key;
use crate::model::{JoinOperator, JoinTree, JoinTreeNode, PhysicalOperator,
    PhysicalOperatorAssignment};

/// Decides whether a join node will execute as a hash join.
///
/// Signals are consulted in priority order: a per-join entry in the operator
/// assignment, the set of globally enabled join operators (a hash join is
/// certain only if it is the *only* enabled join operator), and finally the
/// node's own annotation. Absent all three, the answer is `false`.
///
/// Known heuristic gap: with two or more globally enabled join operators and
/// no per-join signal the answer is `false`, even though the backend may well
/// pick a hash join at runtime.
pub fn is_hash_join(
    node: &JoinTreeNode,
    assignment: Option<&PhysicalOperatorAssignment>,
) -> bool {
    if matches!(node, JoinTreeNode::BaseTable { .. }) {
        return false;
    }

    if let Some(assignment) = assignment {
        if let Some(join_assignment) = assignment.join_operator(&node.tables()) {
            return join_assignment.operator == JoinOperator::HashJoin;
        }
        // No per-join choice: the optimizer is only *forced* into a hash join
        // when the hash join is the sole globally enabled join operator.
        let enabled_joins: Vec<JoinOperator> = assignment
            .globally_enabled_operators()
            .into_iter()
            .filter_map(|op| match op {
                PhysicalOperator::Join(join) => Some(join),
                PhysicalOperator::Scan(_) => None,
            })
            .collect();
        return enabled_joins == [JoinOperator::HashJoin];
    }

    node.annotation()
        .is_some_and(|annotation| annotation.operator == JoinOperator::HashJoin)
}

/// Renders the `Leading` content for one subtree.
///
/// Leaves render as their identifier; interior nodes render as
/// `(outer inner)`. Directions are assigned per node, in priority order:
///
/// 1. An explicit directional operator (from the assignment, falling back to
///    the node annotation) names the inner table set. For hash joins the two
///    roles are swapped, because the hint syntax's inner position denotes the
///    build side rather than the probed side.
/// 2. With cardinality estimates on both children, hash joins put the
///    smaller input into the outer (build) position; all other joins put the
///    smaller input into the inner position. For order-symmetric operators
///    the choice carries no cost, it merely keeps the output deterministic.
/// 3. Otherwise the left child is the outer and the right child the inner
///    relation.
pub(crate) fn leading_hint_content(
    node: &JoinTreeNode,
    assignment: Option<&PhysicalOperatorAssignment>,
) -> String {
    let (left, right) = match node {
        JoinTreeNode::BaseTable { table, .. } => return table.identifier().to_owned(),
        JoinTreeNode::Join { left, right, .. } => (left.as_ref(), right.as_ref()),
    };

    let directional = assignment
        .and_then(|assignment| assignment.join_operator(&node.tables()))
        .or_else(|| node.annotation())
        .and_then(|join_assignment| {
            join_assignment
                .inner
                .as_ref()
                .map(|inner| (join_assignment.operator, inner))
        });

    let (outer, inner) = if let Some((operator, inner_tables)) = directional {
        let (inner_child, outer_child) = if left.tables() == *inner_tables {
            (left, right)
        } else {
            if right.tables() != *inner_tables {
                warn!(
                    inner = %join_key(inner_tables),
                    "declared inner relation matches neither join input, \
                     treating the right input as inner"
                );
            }
            (right, left)
        };
        if operator == JoinOperator::HashJoin {
            // The model's inner relation is the probed one; Postgres probes
            // the outer position of a hash join.
            (inner_child, outer_child)
        } else {
            (outer_child, inner_child)
        }
    } else {
        let left_cardinality = left.cardinality();
        let right_cardinality = right.cardinality();
        if !left_cardinality.is_finite() || !right_cardinality.is_finite() {
            (left, right)
        } else if is_hash_join(node, assignment) {
            // Build side (outer position in model terms) should be small.
            if left_cardinality < right_cardinality {
                (left, right)
            } else {
                (right, left)
            }
        } else if left_cardinality < right_cardinality {
            (right, left)
        } else {
            (left, right)
        }
    };

    let outer_hint = leading_hint_content(outer, assignment);
    let inner_hint = leading_hint_content(inner, assignment);
    format!("({outer_hint} {inner_hint})")
}

/// Builds the `Leading(...)` hint enforcing the join order of `tree`.
///
/// Returns `None` for trees spanning fewer than two tables, where there is
/// no order to enforce.
pub fn join_order_hint(
    tree: &JoinTree,
    assignment: Option<&PhysicalOperatorAssignment>,
) -> Option<HintFragments> {
    if tree.table_count() < 2 {
        return None;
    }
    let leading = format!("Leading({})", leading_hint_content(&tree.root, assignment));
    Some(HintFragments {
        settings: Vec::new(),
        hints: vec![leading],
    })
}
