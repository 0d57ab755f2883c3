use thiserror::Error;

use crate::model::PhysicalOperator;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors raised by hint compilation and plan normalization.
///
/// Hints that simply cannot be expressed in the target syntax are not errors:
/// they are skipped with a `tracing` warning. Everything in this enum aborts
/// the current call.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A native plan report has a shape this crate cannot represent, e.g. a
    /// node with more than two children.
    #[error("malformed query plan: {0}")]
    MalformedPlan(String),
    /// A native plan report could not be understood at the document level
    /// (missing `Plan` key, wrong top-level structure).
    #[error("malformed plan report: {0}")]
    MalformedReport(String),
    /// A native plan report was not valid JSON.
    #[error("plan report is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// An operator has no entry in the static hint-syntax tables. This is a
    /// programming error on correctly constructed assignments and fails
    /// loudly instead of silently defaulting.
    #[error("no Postgres hint syntax for operator {op}")]
    UnsupportedOperator {
        /// The operator that was requested.
        op: PhysicalOperator,
    },
    /// A backend session reported a failure while applying or reading
    /// optimizer settings.
    #[error("session error: {0}")]
    Session(String),
}
