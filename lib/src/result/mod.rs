/*! The hierarchical parse result produced by a successful match.

A [`ParseResult`] is a node holding an ordered list of [`ResultEntry`]. Each
entry records the offset where the match of some pattern entry ended, plus
an optional sub-result when the entry captured structure (a sub-grammar, a
type, a fixed group). Entries are contiguous, the start of an entry is the
end of the previous one, or the start of the node for the first entry.

Results are built incrementally by the solver, which appends entries as
the match advances and truncates them when backtracking. Once the match is
complete the result is collapsed (see [`ParseResult::collapse`]). After
that, results are only queried.
*/

use std::borrow::Cow;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::compile::{CompileContext, Value};
use crate::entry::PatternEntry;
use crate::errors::Error;
use crate::flags::NameFlagSet;
use crate::solver::{MatchOptions, Solver};
use crate::types::{Type, TypeProvider};

pub use location::Location;

pub(crate) mod collapse;
mod location;


/// One entry in a [`ParseResult`].
#[derive(Clone)]
pub struct ResultEntry {
    end: usize,
    name: Option<Arc<str>>,
    flags: NameFlagSet,
    entry: Option<Arc<PatternEntry>>,
    ty: Option<Arc<dyn Type>>,
    sub: Option<Box<ParseResult>>,
}

impl ResultEntry {
    /// Creates an entry for a match of `entry` ending at `end`.
    pub(crate) fn new(end: usize, entry: &Arc<PatternEntry>) -> Self {
        Self {
            end,
            name: entry.name_arc().cloned(),
            flags: entry.flags(),
            entry: Some(entry.clone()),
            ty: None,
            sub: None,
        }
    }

    /// Creates an entry that doesn't correspond to any pattern entry.
    pub(crate) fn anonymous(end: usize, name: Option<Arc<str>>) -> Self {
        let flags = name
            .as_deref()
            .map(NameFlagSet::from_name)
            .unwrap_or_else(NameFlagSet::none);
        Self { end, name, flags, entry: None, ty: None, sub: None }
    }

    pub(crate) fn with_type(mut self, ty: Arc<dyn Type>) -> Self {
        self.flags = self.flags | ty.flags();
        self.ty = Some(ty);
        self
    }

    pub(crate) fn with_sub(mut self, sub: Option<ParseResult>) -> Self {
        self.sub = sub.map(Box::new);
        self
    }

    /// Offset where the match for this entry ends.
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The pattern entry that produced this entry, if any.
    #[inline]
    pub fn pattern_entry(&self) -> Option<&Arc<PatternEntry>> {
        self.entry.as_ref()
    }

    #[inline]
    pub fn ty(&self) -> Option<&Arc<dyn Type>> {
        self.ty.as_ref()
    }

    #[inline]
    pub fn type_name(&self) -> Option<&str> {
        self.ty.as_ref().map(|ty| ty.name())
    }

    #[inline]
    pub fn sub_result(&self) -> Option<&ParseResult> {
        self.sub.as_deref()
    }

    /// Parameter for the entry's type.
    #[inline]
    pub fn param(&self) -> Option<&str> {
        self.entry.as_ref().and_then(|e| e.param())
    }

    /// Flags derived from both the entry's name and its type's name.
    #[inline]
    pub fn flags(&self) -> NameFlagSet {
        self.flags
    }

    /// True if the entry has neither name nor type.
    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none() && self.ty.is_none()
    }

    fn has_same_name_and_type(&self, other: &ResultEntry) -> bool {
        self.name.is_some()
            && self.name == other.name
            && self.type_name() == other.type_name()
    }
}

impl Debug for ResultEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("ResultEntry");
        s.field("end", &self.end);
        if let Some(name) = &self.name {
            s.field("name", name);
        }
        if let Some(ty) = &self.ty {
            s.field("type", &ty.name());
        }
        if let Some(sub) = &self.sub {
            s.field("sub", sub);
        }
        s.finish()
    }
}

/// A node in the parse result tree.
#[derive(Clone)]
pub struct ParseResult {
    text: Arc<str>,
    start: usize,
    entries: Vec<ResultEntry>,
    collapsed: bool,
}

impl ParseResult {
    pub(crate) fn new(text: Arc<str>, start: usize) -> Self {
        Self { text, start, entries: Vec::new(), collapsed: false }
    }

    /// Creates a result with a single anonymous entry covering
    /// `start..end`.
    pub(crate) fn leaf(text: Arc<str>, start: usize, end: usize) -> Self {
        let mut result = Self::new(text, start);
        result.push(ResultEntry::anonymous(end, None));
        result
    }

    /// Appends an entry.
    #[inline]
    pub(crate) fn push(&mut self, entry: ResultEntry) {
        debug_assert!(entry.end >= self.end());
        self.entries.push(entry);
    }

    /// Removes all entries from `index` onwards.
    #[inline]
    pub(crate) fn reset(&mut self, index: usize) {
        self.entries.truncate(index);
    }

    /// The whole text that was matched against, not only the portion
    /// covered by this node.
    #[inline]
    pub fn source(&self) -> &str {
        &self.text
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[ResultEntry] {
        self.entries.as_slice()
    }

    #[inline]
    pub fn entry(&self, index: usize) -> Option<&ResultEntry> {
        self.entries.get(index)
    }

    /// Offset where this node starts.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Offset where this node ends.
    #[inline]
    pub fn end(&self) -> usize {
        self.entries.last().map_or(self.start, |e| e.end)
    }

    /// Text covered by this node.
    #[inline]
    pub fn matched_text(&self) -> &str {
        &self.text[self.start..self.end()]
    }

    /// Start offset of the entry at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    pub fn start_of(&self, index: usize) -> usize {
        assert!(index < self.entries.len());
        if index == 0 {
            self.start
        } else {
            self.entries[index - 1].end
        }
    }

    /// End offset of the entry at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    #[inline]
    pub fn end_of(&self, index: usize) -> usize {
        self.entries[index].end
    }

    /// Text matched by the entry at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is out of bounds.
    pub fn text_of(&self, index: usize) -> &str {
        &self.text[self.start_of(index)..self.end_of(index)]
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.entries.get(index).and_then(|e| e.name())
    }

    pub fn type_name_of(&self, index: usize) -> Option<&str> {
        self.entries.get(index).and_then(|e| e.type_name())
    }

    pub fn sub_result_of(&self, index: usize) -> Option<&ParseResult> {
        self.entries.get(index).and_then(|e| e.sub_result())
    }

    /// Index of the last entry with the given name.
    pub fn last_match_by_name(&self, name: &str) -> Option<usize> {
        self.entries.iter().rposition(|e| e.name() == Some(name))
    }

    /// Indexes of all entries with the given name, in source order.
    pub fn all_matches_by_name(&self, name: &str) -> Vec<usize> {
        self.positions(|e| e.name() == Some(name))
    }

    /// Indexes of all entries with the given name, grouped in runs of
    /// adjacent entries.
    pub fn all_matches_by_name_grouped(&self, name: &str) -> Vec<Vec<usize>> {
        let mut groups: Vec<Vec<usize>> = Vec::new();
        let mut prev: Option<usize> = None;
        for index in self.all_matches_by_name(name) {
            match (prev, groups.last_mut()) {
                (Some(p), Some(group)) if p + 1 == index => group.push(index),
                _ => groups.push(vec![index]),
            }
            prev = Some(index);
        }
        groups
    }

    /// Index of the last entry with the given type name.
    pub fn last_match_by_type(&self, type_name: &str) -> Option<usize> {
        self.entries.iter().rposition(|e| e.type_name() == Some(type_name))
    }

    /// Indexes of all entries with the given type name, in source order.
    pub fn all_matches_by_type(&self, type_name: &str) -> Vec<usize> {
        self.positions(|e| e.type_name() == Some(type_name))
    }

    /// Text of the last entry with the given name.
    pub fn text_by_name(&self, name: &str) -> Option<&str> {
        self.last_match_by_name(name).map(|i| self.text_of(i))
    }

    /// Sub-result of the last entry with the given name.
    pub fn sub_result_by_name(&self, name: &str) -> Option<&ParseResult> {
        self.last_match_by_name(name).and_then(|i| self.sub_result_of(i))
    }

    /// Index of the entry that covers `position`.
    ///
    /// Zero-length entries don't cover any position.
    pub fn index_at(&self, position: usize) -> Option<usize> {
        if position < self.start || position >= self.end() {
            return None;
        }
        // Entry ends are sorted, the covering entry is the first one ending
        // after `position`.
        let index = self.entries.partition_point(|e| e.end <= position);
        (index < self.entries.len()).then_some(index)
    }

    fn positions(&self, f: impl Fn(&ResultEntry) -> bool) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| f(e).then_some(i))
            .collect()
    }

    /// Returns the sub-result of the entry at `index`, or a leaf result
    /// covering the entry when it has no sub-result.
    pub(crate) fn this_of(&self, index: usize) -> Cow<'_, ParseResult> {
        match self.sub_result_of(index) {
            Some(sub) => Cow::Borrowed(sub),
            None => Cow::Owned(ParseResult::leaf(
                self.text.clone(),
                self.start_of(index),
                self.end_of(index),
            )),
        }
    }

    /// Creates a copy of this result that can be modified without
    /// affecting the original.
    ///
    /// The copy is made iteratively, so arbitrarily deep trees don't
    /// overflow the stack.
    pub fn duplicate(&self) -> ParseResult {
        let mut root = self.shallow_copy();
        // Each item is a source node plus the path (entry indexes) where
        // its copy lives within `root`.
        let mut pending: Vec<(&ParseResult, Vec<usize>)> = vec![(self, vec![])];

        while let Some((src, path)) = pending.pop() {
            let dst = root.node_at_mut(&path);
            for (i, e) in src.entries.iter().enumerate() {
                let mut copy = ResultEntry { sub: None, ..e.clone_shallow() };
                if let Some(sub) = &e.sub {
                    copy.sub = Some(Box::new(sub.shallow_copy()));
                    let mut sub_path = path.clone();
                    sub_path.push(i);
                    pending.push((sub, sub_path));
                }
                dst.entries.push(copy);
            }
        }

        root
    }

    fn shallow_copy(&self) -> ParseResult {
        ParseResult {
            text: self.text.clone(),
            start: self.start,
            entries: Vec::with_capacity(self.entries.len()),
            collapsed: self.collapsed,
        }
    }

    fn node_at_mut(&mut self, path: &[usize]) -> &mut ParseResult {
        let mut node = self;
        for i in path {
            // The path is built while copying, it always leads to an
            // existing sub-result.
            node = match node.entries[*i].sub.as_deref_mut() {
                Some(sub) => sub,
                None => unreachable!("broken path while duplicating result"),
            };
        }
        node
    }

    /// Normalizes the result tree.
    ///
    /// Collapsing merges adjacent anonymous entries and runs of collective
    /// (`name[]`) entries, re-parses entries that have a second stage
    /// grammar, reduces text (`$name`) entries to plain text and splices
    /// the children of anonymous and flattenable (`name*`, `name+`)
    /// entries into their parent. Collapsing is idempotent.
    ///
    /// Results returned by the matching functions are already collapsed.
    pub fn collapse(
        &mut self,
        provider: Option<&dyn TypeProvider>,
    ) -> Result<(), Error> {
        if self.collapsed {
            return Ok(());
        }
        let text = self.text.clone();
        let options = MatchOptions::default();
        let mut solver = Solver::with_shared(&text, text.clone(), provider, &options);
        collapse::collapse(self, &mut solver)
    }

    /// Compiles the entry at `index` into a value, by using the compile
    /// hook of the entry's type.
    ///
    /// Entries without type compile into their text.
    pub fn compile(
        &self,
        index: usize,
        param: Option<&str>,
        ctx: &mut CompileContext,
        provider: &dyn TypeProvider,
    ) -> Result<Value, Error> {
        let entry = self.entry(index).ok_or(Error::NotCompilable(index))?;
        match entry.ty() {
            Some(ty) => {
                let param = param.or_else(|| entry.param());
                ty.compile(self, index, param, ctx, provider)
            }
            None => Ok(Value::Text(self.text_of(index).to_string())),
        }
    }

    /// Compiles all entries, returning one value per entry.
    pub fn compile_all(
        &self,
        ctx: &mut CompileContext,
        provider: &dyn TypeProvider,
    ) -> Result<Vec<Value>, Error> {
        (0..self.len()).map(|i| self.compile(i, None, ctx, provider)).collect()
    }
}

impl ResultEntry {
    fn clone_shallow(&self) -> ResultEntry {
        ResultEntry {
            end: self.end,
            name: self.name.clone(),
            flags: self.flags,
            entry: self.entry.clone(),
            ty: self.ty.clone(),
            sub: None,
        }
    }
}

impl Debug for ParseResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseResult")
            .field("start", &self.start)
            .field("entries", &self.entries)
            .finish()
    }
}

/// Structural equality: same boundaries, names, types and sub-results.
impl PartialEq for ParseResult {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start
            && self.entries.len() == other.entries.len()
            && self.entries.iter().zip(other.entries.iter()).all(|(a, b)| {
                a.end == b.end
                    && a.name == b.name
                    && a.type_name() == b.type_name()
                    && a.sub == b.sub
            })
    }
}

/// A view of a parse result together with its ancestors.
///
/// Hosts are handed to the hooks of [`Type`]. A host gives access to the
/// result in which the typed entry is being matched, and lookups by name
/// can continue upwards through the enclosing results, which is how
/// back-references see captures made outside the current sub-grammar.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    result: &'a ParseResult,
    parent: Option<&'a Host<'a>>,
}

impl<'a> Host<'a> {
    pub fn new(result: &'a ParseResult, parent: Option<&'a Host<'a>>) -> Self {
        Self { result, parent }
    }

    #[inline]
    pub fn result(&self) -> &'a ParseResult {
        self.result
    }

    #[inline]
    pub fn parent(&self) -> Option<&'a Host<'a>> {
        self.parent
    }

    /// Text of the last entry with the given name, searching this result
    /// first and then its ancestors.
    pub fn last_text_by_name(&self, name: &str) -> Option<&'a str> {
        self.last_text_by_name_before(name, usize::MAX)
    }

    /// Like [`Host::last_text_by_name`], but only considers entries that
    /// end at or before `offset`.
    pub fn last_text_by_name_before(
        &self,
        name: &str,
        offset: usize,
    ) -> Option<&'a str> {
        let mut host = Some(self);
        while let Some(h) = host {
            let result = h.result;
            let found = result
                .entries
                .iter()
                .rposition(|e| e.end <= offset && e.name() == Some(name));
            if let Some(index) = found {
                return Some(result.text_of(index));
            }
            host = h.parent;
        }
        None
    }

    /// Text of the last entry with the given type name, searching this
    /// result first and then its ancestors.
    pub fn last_text_by_type(&self, type_name: &str) -> Option<&'a str> {
        let mut host = Some(self);
        while let Some(h) = host {
            if let Some(index) = h.result.last_match_by_type(type_name) {
                return Some(h.result.text_of(index));
            }
            host = h.parent;
        }
        None
    }
}
