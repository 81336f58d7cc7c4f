/*! The atomic "can this match here, and how long" capability.

A [`Checker`] receives a text and an offset within it, and returns the
length of the match that starts at that offset, or `None` if there's no
match. Checkers are a closed set: literal words, single-character classes,
alternations, fixed-width groups and whole pattern sequences. The last one
is what makes grammars recursive, a [`PatternSeq`] can be used wherever a
checker is expected.

All lengths and offsets are expressed in bytes, and always fall on UTF-8
character boundaries.
*/

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::seq::PatternSeq;
use crate::solver::{MatchOptions, Solver};
use crate::types::TypeProvider;

pub use alternation::Alternation;
pub use charclass::CharClass;
pub use charclass::Predefined;
pub use fixed::FixedGroup;
pub use fixed::FixedSlot;

mod alternation;
mod charclass;
mod fixed;


/// Something that can be matched against a text at a given offset.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Checker {
    /// Always matches, with zero length.
    Empty,
    /// A literal word.
    Word(String),
    /// A single character belonging to a class.
    Char(CharClass),
    Alternation(Alternation),
    FixedGroup(FixedGroup),
    /// A whole pattern sequence matched as a unit.
    Sequence(Arc<PatternSeq>),
}

impl Checker {
    /// Creates a [`Checker::Word`].
    pub fn word<S: Into<String>>(word: S) -> Self {
        Checker::Word(word.into())
    }

    /// Creates a [`Checker::Char`] matching exactly `c`.
    pub fn char(c: char) -> Self {
        Checker::Char(CharClass::Char(c))
    }

    /// Creates a [`Checker::Char`] matching any character.
    pub fn any() -> Self {
        Checker::Char(CharClass::Any)
    }

    /// Creates a [`Checker::Alternation`] without default.
    pub fn either(alternatives: Vec<Checker>) -> Self {
        Checker::Alternation(Alternation::new(alternatives))
    }

    /// Creates a [`Checker::Sequence`].
    pub fn seq(seq: PatternSeq) -> Self {
        Checker::Sequence(Arc::new(seq))
    }

    /// Returns true if this checker can be evaluated without the solver,
    /// this is, it doesn't contain any pattern sequence.
    pub(crate) fn is_leaf(&self) -> bool {
        match self {
            Checker::Alternation(alt) => alt.is_leaf(),
            Checker::Sequence(_) => false,
            _ => true,
        }
    }

    /// Returns true if the checker is guaranteed to consume at least one
    /// character whenever it matches.
    pub(crate) fn always_consumes(&self) -> bool {
        match self {
            Checker::Word(word) => !word.is_empty(),
            Checker::Char(_) | Checker::FixedGroup(_) => true,
            Checker::Empty
            | Checker::Alternation(_)
            | Checker::Sequence(_) => false,
        }
    }

    /// Matches a leaf checker.
    ///
    /// Must be called only on checkers where [`Checker::is_leaf`] returns
    /// true, pattern sequences never match here.
    pub(crate) fn match_leaf(&self, text: &str, offset: usize) -> Option<usize> {
        match self {
            Checker::Empty => Some(0),
            Checker::Word(word) => {
                if text.get(offset..)?.starts_with(word.as_str()) {
                    Some(word.len())
                } else {
                    None
                }
            }
            Checker::Char(class) => class.match_at(text, offset),
            Checker::Alternation(alt) => alt.match_leaf(text, offset),
            Checker::FixedGroup(group) => group.match_at(text, offset),
            Checker::Sequence(_) => None,
        }
    }

    /// Returns the length of the match starting at `offset`, or `None` if
    /// the checker doesn't match there.
    ///
    /// `provider` is used for resolving the types referenced by pattern
    /// sequences, if any.
    pub fn try_match(
        &self,
        text: &str,
        offset: usize,
        provider: Option<&dyn TypeProvider>,
    ) -> Result<Option<usize>, Error> {
        if self.is_leaf() {
            return Ok(self.match_leaf(text, offset));
        }
        let options = MatchOptions::default();
        let mut solver = Solver::new(text, provider, &options);
        solver.checker_length(self, offset)
    }
}

impl From<CharClass> for Checker {
    fn from(class: CharClass) -> Self {
        Checker::Char(class)
    }
}

impl From<PatternSeq> for Checker {
    fn from(seq: PatternSeq) -> Self {
        Checker::seq(seq)
    }
}

impl From<Alternation> for Checker {
    fn from(alt: Alternation) -> Self {
        Checker::Alternation(alt)
    }
}

impl From<FixedGroup> for Checker {
    fn from(group: FixedGroup) -> Self {
        Checker::FixedGroup(group)
    }
}

impl Display for Checker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Checker::Empty => write!(f, "()"),
            Checker::Word(word) => write!(f, "\"{}\"", word.escape_debug()),
            Checker::Char(class) => write!(f, "{}", class),
            Checker::Alternation(alt) => {
                write!(f, "({}", alt.alternatives().iter().join("|"))?;
                if let Some(default) = alt.default() {
                    write!(f, "||{}", default)?;
                }
                write!(f, ")")
            }
            Checker::FixedGroup(group) => write!(f, "{}", group),
            Checker::Sequence(seq) => write!(f, "({})", seq),
        }
    }
}
