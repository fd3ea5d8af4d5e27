//! Term dictionary access for wildcard expansion.

use std::collections::BTreeSet;

use globset::{GlobBuilder, GlobMatcher};

use crate::error::DictionaryError;

/// Read access to the terms a backend has indexed.
///
/// Indexed terms are stored as `prefix + text`. Term text never contains
/// `:`, so the whole-document prefix `""` only sees unprefixed terms.
pub trait TermDictionary {
    /// Returns, in sorted order, at most `limit` term texts indexed under
    /// `prefix` that match the wildcard `mask` (`*` any run, `?` one char).
    fn expand(&self, prefix: &str, mask: &str, limit: usize)
    -> Result<Vec<String>, DictionaryError>;
}

/// A sorted, in-memory term dictionary.
#[derive(Debug, Clone, Default)]
pub struct MemoryDictionary {
    /// Full indexed terms, prefix included.
    terms: BTreeSet<String>,
}

impl MemoryDictionary {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a full indexed term (`prefix + text`).
    pub fn insert(&mut self, term: impl Into<String>) {
        self.terms.insert(term.into());
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the dictionary holds no term.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for MemoryDictionary {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            terms: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl TermDictionary for MemoryDictionary {
    fn expand(
        &self,
        prefix: &str,
        mask: &str,
        limit: usize,
    ) -> Result<Vec<String>, DictionaryError> {
        let matcher = compile_mask(mask)?;
        let found = self
            .terms
            .range(prefix.to_string()..)
            .take_while(|term| term.starts_with(prefix))
            .map(|term| &term[prefix.len()..])
            .filter(|text| !text.contains(':') && matcher.is_match(text))
            .take(limit)
            .map(str::to_string)
            .collect();
        Ok(found)
    }
}

/// Compiles a wildcard mask into a whole-string matcher.
fn compile_mask(mask: &str) -> Result<GlobMatcher, DictionaryError> {
    let glob = GlobBuilder::new(mask)
        .literal_separator(false)
        .backslash_escape(false)
        .build()?;
    Ok(glob.compile_matcher())
}
