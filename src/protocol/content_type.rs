//! Content-type negotiation.

/// An immutable set of acceptable content types, fixed at session setup.
///
/// Comparison is exact and case-sensitive. Insertion order is kept so
/// encoded handshake messages are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypeSet {
    types: Vec<String>,
}

impl ContentTypeSet {
    /// Create a set from the given content types.
    pub fn new<I, T>(types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// The empty set. Negotiation against it always fails.
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Content types in insertion order.
    #[inline]
    pub fn as_slice(&self) -> &[String] {
        &self.types
    }

    /// Clone the content types for use in a control message.
    pub fn to_vec(&self) -> Vec<String> {
        self.types.clone()
    }

    /// True iff this set is non-empty and shares at least one string
    /// with `candidate`. An empty set never negotiates, regardless of
    /// the candidate.
    pub fn negotiate(&self, candidate: &[String]) -> bool {
        !self.types.is_empty()
            && candidate
                .iter()
                .any(|offered| self.types.iter().any(|configured| configured == offered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_negotiate_intersection() {
        let set = ContentTypeSet::new(["application/dns-tap", "text/plain"]);
        assert!(set.negotiate(&strings(&["application/dns-tap"])));
        assert!(set.negotiate(&strings(&["other", "text/plain"])));
        assert!(!set.negotiate(&strings(&["application/json"])));
        assert!(!set.negotiate(&[]));
    }

    #[test]
    fn test_empty_set_never_negotiates() {
        let set = ContentTypeSet::empty();
        assert!(!set.negotiate(&strings(&["application/dns-tap"])));
        assert!(!set.negotiate(&[]));
    }

    #[test]
    fn test_negotiate_is_case_sensitive() {
        let set = ContentTypeSet::new(["Application/DNS-Tap"]);
        assert!(!set.negotiate(&strings(&["application/dns-tap"])));
        assert!(set.negotiate(&strings(&["Application/DNS-Tap"])));
    }

    #[test]
    fn test_insertion_order_kept() {
        let set = ContentTypeSet::new(["b", "a", "c"]);
        assert_eq!(set.as_slice(), &["b", "a", "c"]);
        assert_eq!(set.len(), 3);
    }
}
