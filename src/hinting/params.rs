//! Plan-parameter hints: cardinalities, parallel workers, raw settings.

use tracing::warn;

use crate::hinting::fragments::HintFragments;
use crate::hinting::operators::join_key;
use crate::model::PlanParameterization;

/// Compiles plan parameters into settings and hints.
///
/// Two requests cannot be expressed in the *pg_hint_plan* syntax and are
/// skipped with a warning instead of failing the call: cardinality overrides
/// for single base tables (`Rows` only covers intermediate results) and
/// parallelism overrides for joins (`Parallel` only covers base-table scans).
pub fn parameter_hints(parameters: &PlanParameterization) -> HintFragments {
    let mut hints = Vec::new();
    for (tables, estimate) in parameters.cardinality_hints() {
        if tables.len() < 2 {
            warn!(
                tables = %join_key(tables),
                "skipping cardinality hint, base tables cannot be overridden"
            );
            continue;
        }
        hints.push(format!("Rows({} #{})", join_key(tables), estimate));
    }

    for (tables, workers) in parameters.parallel_worker_hints() {
        match tables.first() {
            Some(table) if tables.len() == 1 => {
                hints.push(format!("Parallel({} {} hard)", table.identifier(), workers));
            }
            _ => warn!(
                tables = %join_key(tables),
                "skipping parallel workers hint, joins cannot be parallelized"
            ),
        }
    }

    let mut settings = Vec::new();
    for (key, value) in parameters.system_specific_settings() {
        settings.push(format!("SET {} = {};", key, value.escaped()));
    }

    HintFragments { settings, hints }
}
