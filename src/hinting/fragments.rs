/// Collected hint material, prior to rendering into a hint clause.
///
/// Two ordered, duplicate-free string sequences: session-global `SET`
/// statements and per-query *pg_hint_plan* hints. Emitters each produce their
/// own fragments; [`HintFragments::merge`] combines them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HintFragments {
    /// Session setting statements, one `SET ...;` per entry.
    pub settings: Vec<String>,
    /// Hint lines, one hint per entry. An empty entry renders as a blank
    /// separator line inside the hint block.
    pub hints: Vec<String>,
}

impl HintFragments {
    /// Fragments with no content.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether both sequences are empty.
    pub fn is_empty(&self) -> bool {
        self.settings.is_empty() && self.hints.is_empty()
    }

    /// Combines two fragment collections into a new one.
    ///
    /// Order-preserving union with dedup by value: entries of `self` keep
    /// their positions, entries of `other` are appended unless already
    /// present. The operation is associative and leaves both inputs
    /// untouched.
    pub fn merge(&self, other: &HintFragments) -> HintFragments {
        let mut settings = self.settings.clone();
        for setting in &other.settings {
            if !settings.contains(setting) {
                settings.push(setting.clone());
            }
        }
        let mut hints = self.hints.clone();
        for hint in &other.hints {
            if !hints.contains(hint) {
                hints.push(hint.clone());
            }
        }
        HintFragments { settings, hints }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fragments(settings: &[&str], hints: &[&str]) -> HintFragments {
        HintFragments {
            settings: settings.iter().map(|s| (*s).to_owned()).collect(),
            hints: hints.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    #[test]
    fn merge_dedups_and_preserves_order() {
        let left = fragments(&["A", "B"], &[]);
        let right = fragments(&["B", "C"], &[]);
        assert_eq!(left.merge(&right).settings, vec!["A", "B", "C"]);
    }

    #[test]
    fn merge_with_empty_is_identity() {
        let parts = fragments(&["SET x = 1;"], &["NestLoop(a b)"]);
        assert_eq!(parts.merge(&HintFragments::empty()), parts);
        assert_eq!(HintFragments::empty().merge(&parts), parts);
    }

    proptest! {
        #[test]
        fn merge_right_identity(settings in proptest::collection::vec("[a-d]{1,3}", 0..6),
                                hints in proptest::collection::vec("[a-d]{1,3}", 0..6)) {
            let parts = HintFragments { settings, hints };
            prop_assert_eq!(parts.merge(&HintFragments::empty()), parts);
        }

        #[test]
        fn merge_is_associative(a in proptest::collection::vec("[a-c]{1,2}", 0..5),
                                b in proptest::collection::vec("[a-c]{1,2}", 0..5),
                                c in proptest::collection::vec("[a-c]{1,2}", 0..5)) {
            let a = HintFragments { settings: a, hints: vec![] };
            let b = HintFragments { settings: b, hints: vec![] };
            let c = HintFragments { settings: c, hints: vec![] };
            prop_assert_eq!(a.merge(&b).merge(&c), a.merge(&b.merge(&c)));
        }

        #[test]
        fn merged_settings_are_duplicate_free(a in proptest::collection::vec("[a-c]{1,2}", 0..5),
                                              b in proptest::collection::vec("[a-c]{1,2}", 0..5)) {
            let left = HintFragments { settings: a, hints: vec![] };
            let right = HintFragments { settings: b, hints: vec![] };
            let merged = left.merge(&right);
            let mut seen = std::collections::HashSet::new();
            // A duplicate in the left input stays a duplicate; inputs built by
            // the emitters are duplicate-free, so only check fresh additions.
            for entry in &merged.settings[left.settings.len()..] {
                prop_assert!(seen.insert(entry.clone()) && !left.settings.contains(entry));
            }
        }
    }
}
