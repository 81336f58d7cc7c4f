/*! The backtracking search that matches pattern sequences.

The solver walks the entries of a [`PatternSeq`] from left to right,
appending one [`ResultEntry`] per repetition of every entry to the result
being built. How the repetitions of an entry are explored depends on the
greediness of its quantifier:

* Possessive: takes as many repetitions as possible and never gives them
  back.
* Exact: like possessive, but the number of repetitions must fall within
  the quantifier bounds, there's no capping at the upper bound.
* Maximum: takes as many repetitions as possible, and if the rest of the
  sequence doesn't match, tries again with one repetition less, and so on.
* Minimum: takes as few repetitions as possible, and tries one more each
  time the rest of the sequence fails.

When an entry fails, the result is truncated back to the state it had
before the entry was tried.

When the whole root sequence matches, a collapsed copy of the result is
made, and the validation hooks of types that need the full context (the
ones whose names end with `~`) are executed on it. If any of them rejects
the match, the search continues as if the last entry had failed.
*/

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

#[cfg(feature = "logging")]
use log::*;
use smallvec::{smallvec, SmallVec};

use crate::checker::{CharClass, Checker};
use crate::entry::{Payload, PatternEntry};
use crate::errors::Error;
use crate::quantifier::Greediness;
use crate::result::collapse::collapse;
use crate::result::{Host, ParseResult, ResultEntry};
use crate::seq::PatternSeq;
use crate::types::{ProviderChain, Type, TypeProvider};

use cache::MatchCache;

mod cache;

#[cfg(test)]
mod tests;

/// Callback that receives the events produced while matching.
pub type ObserverFn = dyn Fn(&TraceEvent<'_>) + Send + Sync;

/// Something that happened while matching. See [`MatchOptions::observer`].
#[derive(Debug)]
pub enum TraceEvent<'a> {
    /// A repetition of `entry` is going to be tried at `offset`.
    Attempt { entry: &'a PatternEntry, offset: usize },
    /// A repetition of `entry` matched `start..end`.
    Matched { entry: &'a PatternEntry, start: usize, end: usize },
    /// The rest of the sequence is going to be retried with fewer (or
    /// more) repetitions of `entry`, which now end at `offset`.
    Backtrack { entry: &'a PatternEntry, offset: usize },
    /// The validation hook of a type rejected a match that starts at
    /// `offset`.
    Rejected { type_name: &'a str, offset: usize },
}

/// Options that control matching.
#[derive(Clone)]
pub struct MatchOptions {
    max_depth: usize,
    memoize: bool,
    observer: Option<Arc<ObserverFn>>,
}

impl MatchOptions {
    /// Default limit for nested sub-grammars and types.
    pub const DEFAULT_MAX_DEPTH: usize = 200;

    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting depth of sub-grammars and types. Going
    /// deeper produces [`Error::RecursionLimit`].
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Enables caching the outcome of leaf checkers at each offset.
    ///
    /// This pays off with grammars that backtrack a lot over the same
    /// input.
    pub fn memoize(mut self, yes: bool) -> Self {
        self.memoize = yes;
        self
    }

    /// Sets a callback that receives a [`TraceEvent`] for every step of
    /// the search.
    pub fn observer<F>(mut self, f: F) -> Self
    where
        F: Fn(&TraceEvent<'_>) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(f));
        self
    }

    #[inline]
    pub fn get_max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn get_memoize(&self) -> bool {
        self.memoize
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            memoize: false,
            observer: None,
        }
    }
}

impl Debug for MatchOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchOptions")
            .field("max_depth", &self.max_depth)
            .field("memoize", &self.memoize)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

/// A sequence being matched, plus its context.
struct Frame<'f> {
    seq: &'f PatternSeq,
    /// The results that enclose the one being built for `seq`.
    host: Option<&'f Host<'f>>,
    /// The frame of the enclosing sequence.
    outer: Option<&'f Frame<'f>>,
    /// True for the sequence where the match started.
    root: bool,
    /// True if the checkers in `seq` live as long as the solver, which
    /// makes them usable as cache keys.
    cacheable: bool,
}

/// One level in the exploration of a repeated alternation. Each level
/// corresponds to a number of repetitions.
struct AltLevel {
    /// Offset where the next repetition starts.
    offset: usize,
    /// Length of the result when this level was created.
    mark: usize,
    /// Entries for the alternatives that matched at `offset`, in the order
    /// in which they must be tried.
    candidates: Vec<Option<ResultEntry>>,
    next: usize,
    rest_tried: bool,
}

pub(crate) struct Solver<'t, 'o> {
    text: &'t str,
    shared: Arc<str>,
    provider: Option<&'o dyn TypeProvider>,
    options: &'o MatchOptions,
    cache: Option<MatchCache>,
    depth: usize,
    /// If true, the root sequence must consume the whole text.
    anchored: bool,
    /// The collapsed result of the last successful root match.
    completed: Option<ParseResult>,
}

impl<'t, 'o> Solver<'t, 'o> {
    pub fn new(
        text: &'t str,
        provider: Option<&'o dyn TypeProvider>,
        options: &'o MatchOptions,
    ) -> Self {
        Self::with_shared(text, Arc::from(text), provider, options)
    }

    /// Creates a solver for `text`, where `shared` is the text stored in
    /// the produced results. `text` is a prefix of `shared`.
    pub fn with_shared(
        text: &'t str,
        shared: Arc<str>,
        provider: Option<&'o dyn TypeProvider>,
        options: &'o MatchOptions,
    ) -> Self {
        Self {
            text,
            shared,
            provider,
            options,
            cache: options.memoize.then(MatchCache::new),
            depth: 0,
            anchored: false,
            completed: None,
        }
    }

    /// Requires the root sequence to consume the whole text.
    pub fn anchored(mut self) -> Self {
        self.anchored = true;
        self
    }

    /// Matches `seq` at `offset`, returning the collapsed result.
    pub fn match_root(
        &mut self,
        seq: &PatternSeq,
        offset: usize,
    ) -> Result<Option<ParseResult>, Error> {
        let frame =
            Frame { seq, host: None, outer: None, root: true, cacheable: true };
        let mut result = ParseResult::new(self.shared.clone(), offset);
        self.completed = None;

        let found = self.solve(&frame, 0, offset, &mut result);

        #[cfg(feature = "logging")]
        if let Err(err) = &found {
            debug!("match aborted at offset {}: {}", offset, err);
        }

        #[cfg(feature = "logging")]
        if let Some(cache) = &self.cache {
            trace!("cache hits: {}, misses: {}", cache.hits(), cache.misses());
        }

        match found? {
            Some(_) => Ok(self.completed.take()),
            None => Ok(None),
        }
    }

    /// Returns the length of the match of `checker` at `offset`.
    pub fn checker_length(
        &mut self,
        checker: &Checker,
        offset: usize,
    ) -> Result<Option<usize>, Error> {
        let seq = PatternSeq::new(vec![PatternEntry::new(checker.clone())]);
        Ok(self.match_root(&seq, offset)?.map(|result| result.end() - offset))
    }

    /// Matches `seq` against the text in `start..end`. The match must
    /// cover the whole span. Used for second stage grammars.
    pub(crate) fn match_span(
        &mut self,
        seq: &PatternSeq,
        start: usize,
        end: usize,
    ) -> Result<Option<ParseResult>, Error> {
        let shared = self.shared.clone();
        let Some(text) = shared.get(..end) else {
            return Ok(None);
        };
        let mut inner =
            Solver::with_shared(text, shared.clone(), self.provider, self.options)
                .anchored();
        inner.depth = self.depth;
        inner.enter()?;
        inner.match_root(seq, start)
    }

    fn enter(&mut self) -> Result<(), Error> {
        if self.depth >= self.options.max_depth {
            return Err(Error::RecursionLimit(self.options.max_depth));
        }
        self.depth += 1;
        Ok(())
    }

    #[inline]
    fn leave(&mut self) {
        self.depth -= 1;
    }

    #[inline]
    fn observe(&self, event: TraceEvent<'_>) {
        if let Some(observer) = &self.options.observer {
            observer(&event);
        }
    }

    /// Matches the entries of `frame.seq` from `idx` onwards, starting at
    /// `offset`. Returns the offset where the match ends.
    ///
    /// On failure `result` is left as it was when the function was called.
    fn solve(
        &mut self,
        frame: &Frame<'_>,
        mut idx: usize,
        mut offset: usize,
        result: &mut ParseResult,
    ) -> Result<Option<usize>, Error> {
        let mark = result.len();
        let entries = frame.seq.entries();

        loop {
            if idx == entries.len() {
                if self.complete(frame, offset, result)? {
                    return Ok(Some(offset));
                }
                result.reset(mark);
                return Ok(None);
            }

            // Premature end of the text. Entries that can match the empty
            // string still get a chance.
            if offset == self.text.len()
                && entries[idx..].iter().any(|e| e.is_mandatory_terminal())
            {
                result.reset(mark);
                return Ok(None);
            }

            let entry = &entries[idx];

            #[cfg(feature = "logging")]
            trace!("entry {} at offset {}", entry, offset);

            let found = match entry.quantifier().greediness() {
                Greediness::Possessive | Greediness::Exact => {
                    match self.possessive(frame, entry, offset, result)? {
                        Some(end) => {
                            offset = end;
                            idx += 1;
                            continue;
                        }
                        None => None,
                    }
                }
                Greediness::Maximum if is_alternation(entry) => {
                    self.alternation(frame, idx, offset, result, true)?
                }
                Greediness::Minimum if is_alternation(entry) => {
                    self.alternation(frame, idx, offset, result, false)?
                }
                Greediness::Maximum => self.maximum(frame, idx, offset, result)?,
                Greediness::Minimum => self.minimum(frame, idx, offset, result)?,
            };

            if found.is_none() {
                result.reset(mark);
            }

            return Ok(found);
        }
    }

    /// Called when all the entries in `frame` have matched. Returns false
    /// if the match must be rejected.
    fn complete(
        &mut self,
        frame: &Frame<'_>,
        offset: usize,
        result: &ParseResult,
    ) -> Result<bool, Error> {
        if !frame.root {
            return Ok(true);
        }
        if self.anchored && offset != self.text.len() {
            return Ok(false);
        }
        let mut collapsed = result.duplicate();
        collapse(&mut collapsed, self)?;
        if !self.validate_deferred(frame, &collapsed, None) {
            return Ok(false);
        }
        self.completed = Some(collapsed);
        Ok(true)
    }

    /// Runs the validation hooks of types that are not self-contained,
    /// for every entry in the tree rooted at `node`.
    fn validate_deferred(
        &self,
        frame: &Frame<'_>,
        node: &ParseResult,
        parent: Option<&Host<'_>>,
    ) -> bool {
        let host = Host::new(node, parent);
        let providers = provider_chain(self.provider, frame);

        for (i, entry) in node.entries().iter().enumerate() {
            if let Some(ty) = entry.ty() {
                let flags = ty.flags();
                if flags.has_validation() && !flags.is_self_contained() {
                    let this = node.this_of(i);
                    if !ty.validate(&host, &this, entry.param(), &providers) {
                        #[cfg(feature = "logging")]
                        debug!(
                            "`{}` rejected `{}` at offset {}",
                            ty.name(),
                            this.matched_text(),
                            this.start()
                        );
                        self.observe(TraceEvent::Rejected {
                            type_name: ty.name(),
                            offset: this.start(),
                        });
                        return false;
                    }
                }
            }
            if let Some(sub) = entry.sub_result() {
                if !self.validate_deferred(frame, sub, Some(&host)) {
                    return false;
                }
            }
        }

        true
    }

    /// Matches the entry with possessive or exact greediness.
    fn possessive(
        &mut self,
        frame: &Frame<'_>,
        entry: &Arc<PatternEntry>,
        offset: usize,
        result: &mut ParseResult,
    ) -> Result<Option<usize>, Error> {
        let q = entry.quantifier();
        let exact = q.greediness() == Greediness::Exact;

        if !exact && is_catch_all(entry) {
            return Ok(self.catch_all(entry, offset, result));
        }

        let mut count = 0;
        let mut pos = offset;

        while exact || q.allows(count + 1) {
            match self.match_once(frame, entry, pos, result)? {
                Some(end) => {
                    count += 1;
                    if end == pos {
                        // An empty match can be repeated forever.
                        count = count.max(q.lower_bound());
                        break;
                    }
                    pos = end;
                }
                None => break,
            }
        }

        if count < q.lower_bound() || !q.allows(count) {
            return Ok(None);
        }

        Ok(Some(pos))
    }

    /// Possessive repetition of an anonymous entry that matches any
    /// character. The length is computed directly, and the repetitions
    /// are stored as a single entry, which is what collapsing would
    /// produce anyway.
    fn catch_all(
        &mut self,
        entry: &Arc<PatternEntry>,
        offset: usize,
        result: &mut ParseResult,
    ) -> Option<usize> {
        let q = entry.quantifier();
        let rest = &self.text[offset..];
        let limit = q.upper_bound().unwrap_or(usize::MAX);

        let (count, len) = match rest.char_indices().nth(limit) {
            Some((i, _)) => (limit, i),
            None => (rest.chars().count(), rest.len()),
        };

        if count < q.lower_bound() {
            return None;
        }
        if len > 0 {
            result.push(ResultEntry::new(offset + len, entry));
        }
        Some(offset + len)
    }

    /// Matches the entry at `idx` with maximum greediness, followed by the
    /// rest of the sequence.
    fn maximum(
        &mut self,
        frame: &Frame<'_>,
        idx: usize,
        offset: usize,
        result: &mut ParseResult,
    ) -> Result<Option<usize>, Error> {
        let entry = &frame.seq.entries()[idx];
        let q = entry.quantifier();

        // Offset and result length after each number of repetitions,
        // starting with zero repetitions.
        let mut marks: SmallVec<[(usize, usize); 16]> =
            smallvec![(offset, result.len())];
        let mut pos = offset;
        let mut elastic = false;

        while q.allows(marks.len()) {
            match self.match_once(frame, entry, pos, result)? {
                Some(end) => {
                    marks.push((end, result.len()));
                    if end == pos {
                        elastic = true;
                        break;
                    }
                    pos = end;
                }
                None => break,
            }
        }

        let mut top = true;

        while let Some((pos, len)) = marks.pop() {
            let count = marks.len();
            if count < q.lower_bound() && !(top && elastic) {
                break;
            }
            if !top {
                self.observe(TraceEvent::Backtrack { entry, offset: pos });
            }
            top = false;
            result.reset(len);
            if let Some(end) = self.solve(frame, idx + 1, pos, result)? {
                return Ok(Some(end));
            }
        }

        Ok(None)
    }

    /// Matches the entry at `idx` with minimum greediness, followed by the
    /// rest of the sequence.
    fn minimum(
        &mut self,
        frame: &Frame<'_>,
        idx: usize,
        offset: usize,
        result: &mut ParseResult,
    ) -> Result<Option<usize>, Error> {
        let entry = &frame.seq.entries()[idx];
        let q = entry.quantifier();
        let mut count = 0;
        let mut pos = offset;

        loop {
            if count >= q.lower_bound() {
                if let Some(end) = self.solve(frame, idx + 1, pos, result)? {
                    return Ok(Some(end));
                }
                self.observe(TraceEvent::Backtrack { entry, offset: pos });
            }
            if !q.allows(count + 1) {
                return Ok(None);
            }
            match self.match_once(frame, entry, pos, result)? {
                Some(end) if end == pos => {
                    // More repetitions won't change anything. If the rest
                    // of the sequence was already tried here, give up.
                    if count >= q.lower_bound() {
                        return Ok(None);
                    }
                    return self.solve(frame, idx + 1, pos, result);
                }
                Some(end) => {
                    count += 1;
                    pos = end;
                }
                None => return Ok(None),
            }
        }
    }

    /// Matches a repeated alternation with maximum (`longest_first`) or
    /// minimum greediness, followed by the rest of the sequence.
    ///
    /// Every combination of alternatives is explored. With maximum
    /// greediness, more repetitions are tried before fewer, and at each
    /// repetition alternatives are tried from the longest match to the
    /// shortest. With minimum greediness it's the other way round.
    fn alternation(
        &mut self,
        frame: &Frame<'_>,
        idx: usize,
        offset: usize,
        result: &mut ParseResult,
        longest_first: bool,
    ) -> Result<Option<usize>, Error> {
        let entry = &frame.seq.entries()[idx];
        let q = entry.quantifier();

        let mut stack = vec![AltLevel {
            offset,
            mark: result.len(),
            candidates: self.candidates(
                frame,
                entry,
                offset,
                result,
                longest_first,
                0,
            )?,
            next: 0,
            // With maximum greediness the rest of the sequence is tried
            // after the candidates, when the level is popped.
            rest_tried: longest_first,
        }];

        loop {
            let count = match stack.len() {
                0 => return Ok(None),
                n => n - 1,
            };

            let Some(level) = stack.last_mut() else {
                return Ok(None);
            };

            if !level.rest_tried {
                level.rest_tried = true;
                let level_offset = level.offset;
                result.reset(level.mark);
                if count >= q.lower_bound() {
                    if let Some(end) =
                        self.solve(frame, idx + 1, level_offset, result)?
                    {
                        return Ok(Some(end));
                    }
                }
                continue;
            }

            if level.next < level.candidates.len() {
                let candidate = level.candidates[level.next].take();
                level.next += 1;
                let level_offset = level.offset;
                result.reset(level.mark);

                let Some(candidate) = candidate else { continue };
                let end = candidate.end();
                result.push(candidate);

                if end == level_offset {
                    // An empty repetition doesn't lead anywhere new.
                    if let Some(found) = self.solve(frame, idx + 1, end, result)? {
                        return Ok(Some(found));
                    }
                    continue;
                }

                let candidates = self.candidates(
                    frame,
                    entry,
                    end,
                    result,
                    longest_first,
                    count + 1,
                )?;

                stack.push(AltLevel {
                    offset: end,
                    mark: result.len(),
                    candidates,
                    next: 0,
                    rest_tried: longest_first,
                });
                continue;
            }

            // All the candidates at this level were tried.
            let Some(level) = stack.pop() else {
                return Ok(None);
            };
            result.reset(level.mark);
            if longest_first && count >= q.lower_bound() {
                self.observe(TraceEvent::Backtrack {
                    entry,
                    offset: level.offset,
                });
                if let Some(end) = self.solve(frame, idx + 1, level.offset, result)? {
                    return Ok(Some(end));
                }
            }
        }
    }

    /// Returns an entry for every alternative of the alternation in
    /// `entry` that matches at `offset`, sorted by match length. Alternatives
    /// with the same length keep their declaration order. If no alternative
    /// matches, the default is used.
    ///
    /// `count` is the number of repetitions matched so far.
    fn candidates(
        &mut self,
        frame: &Frame<'_>,
        entry: &Arc<PatternEntry>,
        offset: usize,
        result: &ParseResult,
        longest_first: bool,
        count: usize,
    ) -> Result<Vec<Option<ResultEntry>>, Error> {
        let Some(Checker::Alternation(alt)) = entry.payload().as_checker() else {
            return Ok(vec![]);
        };

        if !entry.quantifier().allows(count + 1) {
            return Ok(vec![]);
        }

        let mut candidates: Vec<ResultEntry> = Vec::new();

        for alternative in alt.alternatives() {
            self.observe(TraceEvent::Attempt { entry, offset });
            if let Some((end, sub)) =
                self.match_checker(frame, alternative, offset, result, frame.cacheable)?
            {
                candidates.push(ResultEntry::new(end, entry).with_sub(sub));
            }
        }

        if candidates.is_empty() {
            if let Some(default) = alt.default() {
                if let Some((end, sub)) =
                    self.match_checker(frame, default, offset, result, frame.cacheable)?
                {
                    candidates.push(ResultEntry::new(end, entry).with_sub(sub));
                }
            }
        }

        // Sorting is stable, equal lengths keep their relative order.
        if longest_first {
            candidates.sort_by(|a, b| b.end().cmp(&a.end()));
        } else {
            candidates.sort_by_key(|c| c.end());
        }

        Ok(candidates.into_iter().map(Some).collect())
    }

    /// Matches a single repetition of `entry` at `offset`, appending the
    /// corresponding entry to `result`.
    fn match_once(
        &mut self,
        frame: &Frame<'_>,
        entry: &Arc<PatternEntry>,
        offset: usize,
        result: &mut ParseResult,
    ) -> Result<Option<usize>, Error> {
        self.observe(TraceEvent::Attempt { entry, offset });

        let found = match entry.payload() {
            Payload::Checker(checker) => self
                .match_checker(frame, checker, offset, result, frame.cacheable)?
                .map(|(end, sub)| ResultEntry::new(end, entry).with_sub(sub)),
            Payload::Type(ty) => {
                self.match_type(frame, entry, ty.clone(), offset, result)?
            }
            Payload::TypeRef(type_ref) => {
                let ty = provider_chain(self.provider, frame)
                    .type_by_name(type_ref.name())
                    .ok_or_else(|| Error::UnknownType(type_ref.name().to_string()))?;
                self.match_type(frame, entry, ty, offset, result)?
            }
        };

        match found {
            Some(found) => {
                let end = found.end();
                self.observe(TraceEvent::Matched { entry, start: offset, end });
                result.push(found);
                Ok(Some(end))
            }
            None => Ok(None),
        }
    }

    /// Matches `checker` at `offset`. Returns the offset where the match
    /// ends, and the sub-result for checkers that produce structure.
    ///
    /// `parent` is the result where the match will be stored.
    fn match_checker(
        &mut self,
        frame: &Frame<'_>,
        checker: &Checker,
        offset: usize,
        parent: &ParseResult,
        cacheable: bool,
    ) -> Result<Option<(usize, Option<ParseResult>)>, Error> {
        match checker {
            Checker::Empty | Checker::Word(_) | Checker::Char(_) => Ok(self
                .leaf(checker, offset, cacheable)
                .map(|len| (offset + len, None))),
            Checker::FixedGroup(group) => {
                let mut sub = ParseResult::new(self.shared.clone(), offset);
                let slots = group.slots();
                let len = group.match_slots(self.text, offset, |i, end| {
                    sub.push(ResultEntry::anonymous(end, slots[i].name().cloned()))
                });
                Ok(len.map(|len| (offset + len, Some(sub))))
            }
            Checker::Alternation(alt) => {
                let mut best: Option<(usize, Option<ParseResult>)> = None;
                for alternative in alt.alternatives() {
                    if let Some(found) = self.match_checker(
                        frame,
                        alternative,
                        offset,
                        parent,
                        cacheable,
                    )? {
                        // Strictly greater: on ties the first declared wins.
                        if best.as_ref().map_or(true, |b| found.0 > b.0) {
                            best = Some(found);
                        }
                    }
                }
                if best.is_none() {
                    if let Some(default) = alt.default() {
                        best = self.match_checker(
                            frame, default, offset, parent, cacheable,
                        )?;
                    }
                }
                Ok(best)
            }
            Checker::Sequence(seq) => Ok(self
                .match_sequence(frame, seq, offset, parent, cacheable)?
                .map(|sub| (sub.end(), Some(sub)))),
        }
    }

    /// Matches a leaf checker, going through the cache if possible.
    fn leaf(
        &mut self,
        checker: &Checker,
        offset: usize,
        cacheable: bool,
    ) -> Option<usize> {
        match &mut self.cache {
            Some(cache) if cacheable => {
                let key = (offset, checker as *const Checker as usize);
                if let Some(len) = cache.get(key) {
                    return len;
                }
                let len = checker.match_leaf(self.text, offset);
                cache.insert(key, len);
                len
            }
            _ => checker.match_leaf(self.text, offset),
        }
    }

    /// Matches a nested sequence into its own sub-result.
    fn match_sequence(
        &mut self,
        frame: &Frame<'_>,
        seq: &PatternSeq,
        offset: usize,
        parent: &ParseResult,
        cacheable: bool,
    ) -> Result<Option<ParseResult>, Error> {
        self.enter()?;
        let host = Host::new(parent, frame.host);
        let inner = Frame {
            seq,
            host: Some(&host),
            outer: Some(frame),
            root: false,
            cacheable,
        };
        let mut sub = ParseResult::new(self.shared.clone(), offset);
        let found = self.solve(&inner, 0, offset, &mut sub);
        self.leave();
        Ok(found?.map(|_| sub))
    }

    /// Matches a typed entry.
    fn match_type(
        &mut self,
        frame: &Frame<'_>,
        entry: &Arc<PatternEntry>,
        ty: Arc<dyn Type>,
        offset: usize,
        parent: &ParseResult,
    ) -> Result<Option<ResultEntry>, Error> {
        self.enter()?;
        let found = self.match_type_checker(frame, entry, ty.as_ref(), offset, parent);
        self.leave();
        Ok(found?.map(|(end, sub)| {
            ResultEntry::new(end, entry).with_type(ty).with_sub(sub)
        }))
    }

    fn match_type_checker(
        &mut self,
        frame: &Frame<'_>,
        entry: &PatternEntry,
        ty: &dyn Type,
        offset: usize,
        parent: &ParseResult,
    ) -> Result<Option<(usize, Option<ParseResult>)>, Error> {
        let host = Host::new(parent, frame.host);
        let providers = provider_chain(self.provider, frame);
        let checker = ty.checker(&host, entry.param(), &providers)?;

        // The checker is owned by this function, so it can't be cached.
        let Some((end, sub)) =
            self.match_checker(frame, &checker, offset, parent, false)?
        else {
            return Ok(None);
        };

        let sub = sub.unwrap_or_else(|| {
            ParseResult::leaf(self.shared.clone(), offset, end)
        });

        let flags = ty.flags();

        if flags.has_validation() && flags.is_self_contained() {
            let mut this = sub.duplicate();
            collapse(&mut this, self)?;
            if !ty.validate(&host, &this, entry.param(), &providers) {
                #[cfg(feature = "logging")]
                trace!("`{}` rejected `{}`", ty.name(), this.matched_text());
                self.observe(TraceEvent::Rejected {
                    type_name: ty.name(),
                    offset,
                });
                return Ok(None);
            }
        }

        if flags.is_text() {
            return Ok(Some((end, None)));
        }

        Ok(Some((end, Some(sub))))
    }
}

/// Returns the providers visible from `frame`.
fn provider_chain<'a>(
    explicit: Option<&'a dyn TypeProvider>,
    frame: &'a Frame<'a>,
) -> ProviderChain<'a> {
    let mut chain = ProviderChain::new(explicit);
    let mut current = Some(frame);
    while let Some(f) = current {
        if let Some(provider) = f.seq.default_provider() {
            chain.push_default(&**provider);
        }
        current = f.outer;
    }
    chain
}

fn is_alternation(entry: &PatternEntry) -> bool {
    matches!(entry.payload().as_checker(), Some(Checker::Alternation(_)))
}

fn is_catch_all(entry: &PatternEntry) -> bool {
    entry.name().is_none()
        && entry.second_stage_seq().is_none()
        && matches!(
            entry.payload().as_checker(),
            Some(Checker::Char(CharClass::Any))
        )
}
