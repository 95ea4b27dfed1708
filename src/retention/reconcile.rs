//! Reconciliation of deletion candidates against in-use tags and exclusions.

use regex::Regex;

/// Compiled exclusion patterns protecting tags from deletion.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    rules: Vec<Regex>,
    invalid: Vec<InvalidPattern>,
}

/// An exclusion pattern that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPattern {
    pub pattern: String,
    pub error: String,
}

impl ExclusionRules {
    /// Compile patterns in order.
    ///
    /// A pattern that does not compile is kept in [`ExclusionRules::invalid`]
    /// and never matches anything; the remaining patterns still apply.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut rules = Vec::with_capacity(patterns.len());
        let mut invalid = Vec::new();

        for pattern in patterns {
            let pattern = pattern.as_ref();
            match Regex::new(pattern) {
                Ok(re) => rules.push(re),
                Err(e) => invalid.push(InvalidPattern {
                    pattern: pattern.to_string(),
                    error: e.to_string(),
                }),
            }
        }

        Self { rules, invalid }
    }

    /// Patterns that failed to compile.
    pub fn invalid(&self) -> &[InvalidPattern] {
        &self.invalid
    }

    /// Number of usable patterns.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if no usable pattern was compiled.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Check if any pattern matches anywhere in `tag`.
    pub fn is_excluded(&self, tag: &str) -> bool {
        self.rules.iter().any(|re| re.is_match(tag))
    }
}

/// Candidate tags that are safe to delete.
///
/// A candidate is dropped when it equals an in-use tag, or, failing that,
/// when an exclusion pattern matches it. Order and duplicates of
/// `candidates` are preserved.
pub fn reconcile(
    candidates: &[String],
    in_use: &[String],
    exclusions: &ExclusionRules,
) -> Vec<String> {
    candidates
        .iter()
        .filter(|candidate| !in_use.contains(*candidate))
        .filter(|candidate| !exclusions.is_excluded(candidate))
        .cloned()
        .collect()
}
