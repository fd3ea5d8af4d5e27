//! Logical field to backend prefix mapping.

use std::collections::BTreeMap;

/// Maps the field names users type to the term prefixes the backend indexes.
///
/// One field may map to several prefixes (synonym fields); a query on that
/// field matches any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    /// Prefixes by field name.
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a field, builder style.
    pub fn with<I, S>(mut self, field: impl Into<String>, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(field, prefixes);
        self
    }

    /// Adds or replaces a field.
    pub fn insert<I, S>(&mut self, field: impl Into<String>, prefixes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields
            .insert(field.into(), prefixes.into_iter().map(Into::into).collect());
    }

    /// Returns the prefixes of `field`, or `None` if the field is unknown.
    pub fn prefixes(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Whether `field` is mapped.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .map(|(name, prefixes)| (name.as_str(), prefixes.as_slice()))
    }

    /// Number of mapped fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no field is mapped.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S, P> FromIterator<(S, Vec<P>)> for FieldMap
where
    S: Into<String>,
    P: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (S, Vec<P>)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (field, prefixes) in iter {
            map.insert(field, prefixes);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup() {
        let map = FieldMap::new()
            .with("title", ["title:"])
            .with("words", ["title:", "abstract:"]);
        assert_eq!(map.prefixes("title"), Some(&["title:".to_string()][..]));
        assert_eq!(map.prefixes("words").map(<[String]>::len), Some(2));
        assert_eq!(map.prefixes("colour"), None);
        assert!(map.contains("words"));
    }

    #[test]
    fn insert_replaces() {
        let mut map = FieldMap::new().with("title", ["a:"]);
        map.insert("title", ["b:"]);
        assert_eq!(map.prefixes("title"), Some(&["b:".to_string()][..]));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn iterates_in_name_order() {
        let map: FieldMap = vec![("z", vec!["z:"]), ("a", vec!["a:"])].into_iter().collect();
        let names: Vec<_> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "z"]);
    }
}
