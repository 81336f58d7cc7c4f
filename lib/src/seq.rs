use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "logging")]
use log::*;
use rustc_hash::FxHasher;

use crate::entry::PatternEntry;
use crate::errors::Error;
use crate::result::ParseResult;
use crate::solver::{MatchOptions, Solver};
use crate::types::TypeProvider;

/// An ordered list of pattern entries, matched one after the other.
///
/// A sequence is a grammar. It can be matched against a text directly, or
/// used as the checker of an entry in another sequence, which is how
/// grammars nest.
///
/// Sequences are immutable once built and can be shared between threads,
/// matching never modifies them.
#[derive(Clone, Default)]
pub struct PatternSeq {
    entries: Vec<Arc<PatternEntry>>,
    default_provider: Option<Arc<dyn TypeProvider>>,
    hash: OnceLock<u64>,
}

impl PatternSeq {
    pub fn new(entries: Vec<PatternEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(Arc::new).collect(),
            default_provider: None,
            hash: OnceLock::new(),
        }
    }

    /// Sets the provider used for resolving type references when the
    /// provider passed at matching time doesn't know about a type.
    ///
    /// When sequences are nested, the default provider of inner sequences
    /// is consulted before the default provider of outer ones.
    pub fn with_default_provider(
        mut self,
        provider: Arc<dyn TypeProvider>,
    ) -> Self {
        self.default_provider = Some(provider);
        self
    }

    #[inline]
    pub fn entries(&self) -> &[Arc<PatternEntry>] {
        self.entries.as_slice()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn default_provider(&self) -> Option<&Arc<dyn TypeProvider>> {
        self.default_provider.as_ref()
    }

    /// Hash derived from the textual form of the sequence, computed once.
    pub fn hash_value(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = FxHasher::default();
            self.to_string().hash(&mut hasher);
            hasher.finish()
        })
    }

    /// Matches the sequence at `offset`.
    ///
    /// The match doesn't need to reach the end of the text. Returns the
    /// collapsed parse result, or `None` if the sequence doesn't match at
    /// that offset.
    pub fn match_at(
        &self,
        text: &str,
        offset: usize,
        provider: Option<&dyn TypeProvider>,
        options: &MatchOptions,
    ) -> Result<Option<ParseResult>, Error> {
        if !text.is_char_boundary(offset) {
            return Ok(None);
        }
        #[cfg(feature = "logging")]
        let start = std::time::Instant::now();

        let mut solver = Solver::new(text, provider, options);
        let result = solver.match_root(self, offset);

        #[cfg(feature = "logging")]
        debug!(
            "matched {} bytes at offset {} in {:?}, matched: {}",
            text.len(),
            offset,
            start.elapsed(),
            matches!(result, Ok(Some(_)))
        );

        result
    }

    /// Matches the sequence at the start of `text`, with default options
    /// and no type provider other than the sequence's default one.
    pub fn match_text(&self, text: &str) -> Result<Option<ParseResult>, Error> {
        self.match_at(text, 0, None, &MatchOptions::default())
    }

    /// Matches the sequence against the whole `text`.
    ///
    /// Unlike [`PatternSeq::match_text`], the match must consume all the
    /// text, the search backtracks when it finishes before reaching the
    /// end.
    pub fn parse(&self, text: &str) -> Result<Option<ParseResult>, Error> {
        self.parse_with(text, None, &MatchOptions::default())
    }

    /// Like [`PatternSeq::parse`], with an explicit provider and options.
    pub fn parse_with(
        &self,
        text: &str,
        provider: Option<&dyn TypeProvider>,
        options: &MatchOptions,
    ) -> Result<Option<ParseResult>, Error> {
        let mut solver = Solver::new(text, provider, options).anchored();
        solver.match_root(self, 0)
    }

    /// Finds the first offset where the sequence matches.
    pub fn find(&self, text: &str) -> Result<Option<ParseResult>, Error> {
        self.find_with(text, None, &MatchOptions::default())
    }

    /// Like [`PatternSeq::find`], with an explicit provider and options.
    ///
    /// When memoization is enabled, cached leaf matches are shared by all
    /// the starting offsets.
    pub fn find_with(
        &self,
        text: &str,
        provider: Option<&dyn TypeProvider>,
        options: &MatchOptions,
    ) -> Result<Option<ParseResult>, Error> {
        let mut solver = Solver::new(text, provider, options);
        let offsets = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()));
        for offset in offsets {
            if let Some(result) = solver.match_root(self, offset)? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Returns the length of the match at `offset`.
    pub fn match_length(
        &self,
        text: &str,
        offset: usize,
        provider: Option<&dyn TypeProvider>,
    ) -> Result<Option<usize>, Error> {
        Ok(self
            .match_at(text, offset, provider, &MatchOptions::default())?
            .map(|result| result.end() - offset))
    }
}

impl Display for PatternSeq {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for entry in &self.entries {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl Debug for PatternSeq {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternSeq")
            .field("entries", &self.entries)
            .field("default_provider", &self.default_provider.is_some())
            .finish()
    }
}

/// Two sequences are equal if their entries are equal. Default providers
/// are not taken into account.
impl PartialEq for PatternSeq {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Hash for PatternSeq {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash_value())
    }
}

impl FromIterator<PatternEntry> for PatternSeq {
    fn from_iter<T: IntoIterator<Item = PatternEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
