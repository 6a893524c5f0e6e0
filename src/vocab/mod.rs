//! Vocabulary: the in-memory insertion-order term set and the persisted
//! lexicographic vocabulary map.

mod map;

pub use map::{VocabularyMap, VocabularyWriter};

use std::mem::size_of;

use hashbrown::HashMap;

use crate::TermId;

/// Memory overhead accounted per vocabulary entry:
/// String header + index + hash table control byte and padding
const ENTRY_OVERHEAD: usize = size_of::<String>() + size_of::<TermId>() + 8;

/// Insertion-order set of distinct term strings with stable dense indices.
///
/// During tokenization, every worker resolves term strings through one
/// shared `TermSet` under the vocabulary lock; the index returned by
/// `insert` is the term id written into that worker's chunk. The byte
/// footprint is tracked incrementally so the RAM-budget check stays O(1).
pub struct TermSet {
    map: HashMap<String, TermId>,
    bytes_used: usize,
}

impl Default for TermSet {
    fn default() -> Self {
        Self::new()
    }
}

impl TermSet {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            bytes_used: 0,
        }
    }

    /// Look up or append a term, returning its stable index.
    ///
    /// Idempotent: inserting a present term returns the existing index.
    pub fn insert(&mut self, term: &str) -> TermId {
        if let Some(&index) = self.map.get(term) {
            return index;
        }
        let index = self.map.len() as TermId;
        self.bytes_used += term.len() + ENTRY_OVERHEAD;
        self.map.insert(term.to_string(), index);
        index
    }

    pub fn find(&self, term: &str) -> Option<TermId> {
        self.map.get(term).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Estimated memory footprint including string storage and table overhead
    pub fn bytes_used(&self) -> usize {
        self.bytes_used
    }

    /// Destructively extract the terms indexed by insertion order:
    /// `keys[i]` is the string whose index was `i`.
    ///
    /// Leaves the set empty with its table capacity retained, so the
    /// renumbering reinsertion pass allocates nothing.
    pub fn extract_keys(&mut self) -> Vec<String> {
        let mut keys = vec![String::new(); self.map.len()];
        for (term, index) in self.map.drain() {
            keys[index as usize] = term;
        }
        self.bytes_used = 0;
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = TermSet::new();
        assert_eq!(set.insert("b"), 0);
        assert_eq!(set.insert("a"), 1);
        assert_eq!(set.insert("b"), 0);
        assert_eq!(set.insert("c"), 2);
        assert_eq!(set.len(), 3);
        assert_eq!(set.find("a"), Some(1));
        assert_eq!(set.find("missing"), None);
    }

    #[test]
    fn test_bytes_used_grows_only_on_new_terms() {
        let mut set = TermSet::new();
        assert_eq!(set.bytes_used(), 0);
        set.insert("alpha");
        let after_one = set.bytes_used();
        assert!(after_one > 0);
        set.insert("alpha");
        assert_eq!(set.bytes_used(), after_one);
        set.insert("beta");
        assert!(set.bytes_used() > after_one);
    }

    #[test]
    fn test_extract_keys_preserves_indices() {
        let mut set = TermSet::new();
        for term in ["delta", "alpha", "charlie"] {
            set.insert(term);
        }

        let keys = set.extract_keys();
        assert_eq!(keys, vec!["delta", "alpha", "charlie"]);
        assert!(set.is_empty());
        assert_eq!(set.bytes_used(), 0);

        // reinsertion in sorted order rebuilds lexicographic indices
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        for term in &sorted {
            set.insert(term);
        }
        assert_eq!(set.find("alpha"), Some(0));
        assert_eq!(set.find("charlie"), Some(1));
        assert_eq!(set.find("delta"), Some(2));
    }
}
