use rustc_hash::FxHashMap;

/// Memoizes the outcome of leaf checkers.
///
/// Keys are `(offset, checker address)`. A cache is only valid for a
/// single text, and for checkers that outlive it, which is why it lives in
/// the solver and is only used for checkers owned by the grammar being
/// matched.
#[derive(Default)]
pub(crate) struct MatchCache {
    map: FxHashMap<(usize, usize), Option<usize>>,
    #[cfg(feature = "logging")]
    hits: usize,
    #[cfg(feature = "logging")]
    misses: usize,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached length for `key`. The outer `Option` is `None`
    /// when the key is not in the cache.
    #[inline]
    pub fn get(&mut self, key: (usize, usize)) -> Option<Option<usize>> {
        let found = self.map.get(&key).copied();
        #[cfg(feature = "logging")]
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    #[inline]
    pub fn insert(&mut self, key: (usize, usize), len: Option<usize>) {
        self.map.insert(key, len);
    }

    #[cfg(feature = "logging")]
    #[inline]
    pub fn hits(&self) -> usize {
        self.hits
    }

    #[cfg(feature = "logging")]
    #[inline]
    pub fn misses(&self) -> usize {
        self.misses
    }
}
