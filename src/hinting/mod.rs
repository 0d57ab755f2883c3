#![forbid(unsafe_code)]

//! Compilation of abstract plans into Postgres hint blocks.
//!
//! The compiler turns a join tree, an operator assignment and a set of plan
//! parameters into session `SET` statements plus a *pg_hint_plan* comment
//! block, and attaches both to the query. All functions here are pure; they
//! never talk to a backend.

/// Rendering of fragments into an attachable hint clause.
pub mod block;

/// Ordered, duplicate-free hint material.
pub mod fragments;

/// The `Leading` hint and the join-direction resolver.
pub mod join_order;

/// Operator settings, per-relation verbs and the static syntax tables.
pub mod operators;

/// Cardinality, parallelism and system-setting hints.
pub mod params;

pub use block::{attach_hint_block, build_hint_block};
pub use fragments::HintFragments;
pub use join_order::{is_hash_join, join_order_hint};
pub use operators::{hint_verb, operator_hints, optimizer_setting, supported_hint};
pub use params::parameter_hints;

use crate::error::Result;
use crate::model::{JoinTree, PhysicalOperatorAssignment, PlanParameterization, SqlQuery};

/// Compiles a complete strategy into a hinted query.
///
/// Runs the join-order resolver and both emitters, merges their fragments
/// (order-preserving, first occurrence wins) and attaches the rendered block.
/// Each input is optional; with none supplied the query is returned
/// unchanged. The result does not validate that the hinted query is
/// semantically equivalent to the input: the caller-supplied plan is trusted.
pub fn generate_hints(
    query: &SqlQuery,
    join_order: Option<&JoinTree>,
    physical_operators: Option<&PhysicalOperatorAssignment>,
    plan_parameters: Option<&PlanParameterization>,
) -> Result<SqlQuery> {
    let mut parts = HintFragments::empty();

    if let Some(tree) = join_order {
        if let Some(order_parts) = join_order::join_order_hint(tree, physical_operators) {
            parts = parts.merge(&order_parts);
        }
    }
    if let Some(assignment) = physical_operators {
        parts = parts.merge(&operators::operator_hints(assignment)?);
    }
    if let Some(parameters) = plan_parameters {
        parts = parts.merge(&params::parameter_hints(parameters));
    }

    Ok(block::attach_hint_block(query, build_hint_block(&parts)))
}
