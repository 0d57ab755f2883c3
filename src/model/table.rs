use std::collections::BTreeSet;
use std::fmt;

/// Handle naming a base relation, optionally under an alias.
///
/// Equality, ordering and hashing are by name and alias: the same physical
/// table under two aliases is two distinct references.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableRef {
    /// The physical relation name.
    pub name: String,
    /// The alias under which the relation is referenced, if any.
    pub alias: Option<String>,
}

impl TableRef {
    /// Creates a reference to an unaliased table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Creates a reference to a table accessed under an alias.
    pub fn with_alias(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: Some(alias.into()),
        }
    }

    /// The identifier under which the planner addresses this table.
    ///
    /// Hints must use the alias when one exists, since that is the name the
    /// relation is visible under inside the query.
    pub fn identifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// Ordered set of table references.
///
/// Join operators, cardinality hints and parallelism hints are keyed by the
/// set of tables they span. The ordering makes set keys deterministic.
pub type TableSet = BTreeSet<TableRef>;

/// Builds a table set from individual references.
pub fn table_set(tables: impl IntoIterator<Item = TableRef>) -> TableSet {
    tables.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_prefers_alias() {
        assert_eq!(TableRef::new("title").identifier(), "title");
        assert_eq!(TableRef::with_alias("title", "t").identifier(), "t");
    }

    #[test]
    fn aliased_references_are_distinct() {
        let plain = TableRef::new("title");
        let aliased = TableRef::with_alias("title", "t");
        assert_ne!(plain, aliased);

        let set = table_set([plain.clone(), aliased, plain]);
        assert_eq!(set.len(), 2);
    }
}
