#![forbid(unsafe_code)]

//! Guarding hinted execution against the genetic query optimizer.
//!
//! Postgres switches to GeQO, a genetic planning algorithm, once a query
//! joins at least `geqo_threshold` tables. GeQO ignores *pg_hint_plan* hints
//! entirely, so a hinted query that crosses the threshold would silently run
//! with an arbitrary plan. The [`GeqoGuard`] disables GeQO around such calls
//! and restores the session's configuration afterwards.
//!
//! The guard reads and writes session-scoped backend state. Callers must
//! serialize guard-wrapped calls per session: an overlapping second call
//! could restore the wrong snapshot or observe an intermediate override.

use tracing::debug;

use crate::error::{PlanError, Result};
use crate::model::SqlQuery;

/// Minimal control surface of a backend session.
///
/// The crate never owns a connection; the connection-owning collaborator
/// implements this trait and hands the session in by reference.
pub trait SessionControl {
    /// Runs a statement for its side effects.
    fn execute(&mut self, statement: &str) -> Result<()>;

    /// Reads the current value of a runtime setting.
    fn fetch_setting(&mut self, name: &str) -> Result<String>;
}

/// Snapshot of the session's GeQO configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeqoState {
    /// Whether the genetic optimizer is enabled at all.
    pub enabled: bool,
    /// Minimum number of joined tables for the genetic optimizer to take
    /// over planning.
    pub threshold: usize,
}

impl GeqoState {
    /// Reads the current GeQO configuration from a session.
    pub fn load(session: &mut dyn SessionControl) -> Result<Self> {
        let enabled = session.fetch_setting("geqo")? == "on";
        let threshold = session
            .fetch_setting("geqo_threshold")?
            .parse()
            .map_err(|_| PlanError::Session("geqo_threshold is not an integer".into()))?;
        Ok(Self { enabled, threshold })
    }

    /// Whether a query joining `table_count` tables would be planned by the
    /// genetic optimizer under this configuration.
    ///
    /// Side effects of the query itself (e.g. a preparatory statement that
    /// reconfigures GeQO) are not considered.
    pub fn triggers_geqo(&self, table_count: usize) -> bool {
        self.enabled && table_count >= self.threshold
    }
}

/// Whether a hinted query would be affected by GeQO taking over.
fn carries_geqo_sensible_hints(query: &SqlQuery) -> bool {
    query
        .hints()
        .is_some_and(|hints| !hints.query_hints.is_empty())
}

/// Heuristic check for queries that reconfigure GeQO themselves.
///
/// A case-insensitive substring search over the preparatory statements; both
/// false positives and false negatives are possible. Documented limitation,
/// not corrected here.
fn modifies_geqo_config(query: &SqlQuery) -> bool {
    query.hints().is_some_and(|hints| {
        hints
            .preparatory_statements
            .to_lowercase()
            .contains("geqo")
    })
}

/// Two-state guard around hinted or plan-inspecting calls.
///
/// Holds the configuration snapshot taken at connection setup (*tracked*).
/// [`GeqoGuard::prepare`] moves the session into the *overridden* state when
/// necessary; [`GeqoGuard::restore`] unconditionally puts the tracked
/// configuration back, which also reverts out-of-band changes made by a
/// query's own preparatory statements.
#[derive(Clone, Debug)]
pub struct GeqoGuard {
    state: GeqoState,
}

impl GeqoGuard {
    /// Creates a guard around an already-known snapshot.
    pub fn new(state: GeqoState) -> Self {
        Self { state }
    }

    /// Reads the snapshot from the session and creates the guard.
    pub fn load(session: &mut dyn SessionControl) -> Result<Self> {
        Ok(Self::new(GeqoState::load(session)?))
    }

    /// The tracked snapshot.
    pub fn state(&self) -> &GeqoState {
        &self.state
    }

    /// Disables GeQO for the upcoming query when it would interfere.
    ///
    /// The override is only issued when the query carries hints, does not
    /// visibly reconfigure GeQO itself, and the tracked snapshot says GeQO
    /// would activate for the query's table count.
    pub fn prepare(&self, session: &mut dyn SessionControl, query: &SqlQuery) -> Result<()> {
        let needs_deactivation =
            carries_geqo_sensible_hints(query) && !modifies_geqo_config(query);
        if needs_deactivation && self.state.triggers_geqo(query.table_count()) {
            debug!(tables = query.table_count(), "disabling geqo for hinted query");
            session.execute("SET geqo = 'off';")?;
        }
        Ok(())
    }

    /// Restores the tracked configuration.
    ///
    /// Always re-issues both directives, even when [`GeqoGuard::prepare`] did
    /// not override anything.
    pub fn restore(&self, session: &mut dyn SessionControl) -> Result<()> {
        let enabled = if self.state.enabled { "on" } else { "off" };
        session.execute(&format!("SET geqo = '{enabled}';"))?;
        session.execute(&format!("SET geqo_threshold = {};", self.state.threshold))?;
        Ok(())
    }
}
