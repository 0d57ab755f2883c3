use std::fmt;

use crate::model::table::TableSet;

/// Hint clause attached to a query.
///
/// The clause has two parts: preparatory statements that run before the query
/// (session `SET` commands), and the `/*+ ... */` hint comment that travels
/// with the query text itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HintClause {
    /// Statements executed against the session before the query runs.
    pub preparatory_statements: String,
    /// The rendered hint comment block, including its markers.
    pub query_hints: String,
}

impl HintClause {
    /// Whether the clause carries neither statements nor hints.
    pub fn is_empty(&self) -> bool {
        self.preparatory_statements.is_empty() && self.query_hints.is_empty()
    }
}

impl fmt::Display for HintClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (
            self.preparatory_statements.is_empty(),
            self.query_hints.is_empty(),
        ) {
            (true, true) => Ok(()),
            (false, true) => f.write_str(&self.preparatory_statements),
            (true, false) => f.write_str(&self.query_hints),
            (false, false) => {
                write!(f, "{}\n{}", self.preparatory_statements, self.query_hints)
            }
        }
    }
}

/// Immutable query value the hint compiler operates on.
///
/// This is deliberately not a SQL abstraction layer: the text is opaque. The
/// crate only needs to know which tables the query touches (for the
/// optimizer-mode guard) and whether a hint clause is attached. Attaching a
/// clause always produces a new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SqlQuery {
    text: String,
    tables: TableSet,
    hints: Option<HintClause>,
}

impl SqlQuery {
    /// Creates a query over an unknown set of tables.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tables: TableSet::new(),
            hints: None,
        }
    }

    /// Creates a query together with the tables it references.
    pub fn with_tables(text: impl Into<String>, tables: TableSet) -> Self {
        Self {
            text: text.into(),
            tables,
            hints: None,
        }
    }

    /// The raw query text, without any attached hints.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The tables referenced by the query.
    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    /// Number of tables referenced by the query.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// The attached hint clause, if any.
    pub fn hints(&self) -> Option<&HintClause> {
        self.hints.as_ref()
    }

    /// Returns a copy of this query with `hints` attached, replacing any
    /// previously attached clause.
    pub fn with_hints(&self, hints: HintClause) -> SqlQuery {
        SqlQuery {
            text: self.text.clone(),
            tables: self.tables.clone(),
            hints: Some(hints),
        }
    }
}

impl fmt::Display for SqlQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hints {
            Some(hints) if !hints.is_empty() => write!(f, "{}\n{}", hints, self.text),
            _ => f.write_str(&self.text),
        }
    }
}
