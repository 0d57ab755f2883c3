//! Rendering of collected fragments into an attachable hint clause.

use crate::hinting::fragments::HintFragments;
use crate::model::{HintClause, SqlQuery};

/// Renders fragments into a hint clause.
///
/// Settings become newline-joined preparatory statements. Hints are wrapped
/// into a `/*+ ... */` comment with one two-space-indented hint per line.
/// Returns `None` when there is nothing to render.
pub fn build_hint_block(parts: &HintFragments) -> Option<HintClause> {
    if parts.is_empty() {
        return None;
    }
    let preparatory_statements = parts.settings.join("\n");
    let query_hints = if parts.hints.is_empty() {
        String::new()
    } else {
        let mut lines = Vec::with_capacity(parts.hints.len() + 2);
        lines.push("/*+".to_owned());
        lines.extend(parts.hints.iter().map(|hint| format!("  {hint}")));
        lines.push("*/".to_owned());
        lines.join("\n")
    };
    Some(HintClause {
        preparatory_statements,
        query_hints,
    })
}

/// Attaches a hint block to a query, returning a new query value.
///
/// With no block the input query is returned unchanged (cloned, never
/// mutated).
pub fn attach_hint_block(query: &SqlQuery, block: Option<HintClause>) -> SqlQuery {
    match block {
        Some(block) => query.with_hints(block),
        None => query.clone(),
    }
}
