#![forbid(unsafe_code)]

//! Immutable plan-model types consumed by the translation layer.
//!
//! Everything in this module is a plain value: join trees, operator
//! assignments, and plan parameters are constructed once by the caller and
//! never mutated by the hint compiler or the plan normalizer.

/// Binary join trees describing the desired join order.
pub mod jointree;

/// Physical operators and per-query operator assignments.
pub mod operators;

/// Auxiliary plan parameters (cardinalities, parallelism, raw settings).
pub mod params;

/// Minimal immutable query value that hint blocks attach to.
pub mod query;

/// Base-relation handles and table sets.
pub mod table;

pub use jointree::{JoinTree, JoinTreeNode};
pub use operators::{
    JoinOperator, JoinOperatorAssignment, PhysicalOperator, PhysicalOperatorAssignment,
    ScanOperator,
};
pub use params::{PlanParameterization, SettingValue};
pub use query::{HintClause, SqlQuery};
pub use table::{TableRef, TableSet};
