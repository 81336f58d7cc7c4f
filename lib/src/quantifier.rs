/*! Repetition bounds and greediness modes for pattern entries.

Every entry in a [`crate::PatternSeq`] carries a [`Quantifier`] that tells
the solver how many times the entry's payload can be repeated, and how the
space of repetition counts is explored while searching for a match.
*/

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Policy used by the solver for exploring the repetition counts of an
/// entry.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash, Default,
)]
pub enum Greediness {
    /// Match as many repetitions as possible and never give any of them
    /// back.
    #[default]
    Possessive,
    /// Try the largest number of repetitions first, and backtrack downwards
    /// when the rest of the sequence doesn't match.
    Maximum,
    /// Try the smallest number of repetitions first, and add repetitions
    /// one by one while the rest of the sequence doesn't match.
    Minimum,
    /// Like [`Greediness::Possessive`], but the entry fails when the input
    /// contains more repetitions than the upper bound allows.
    Exact,
}

impl Greediness {
    /// Suffix used when displaying a quantifier with this greediness.
    fn suffix(&self) -> &'static str {
        match self {
            Greediness::Possessive => "",
            Greediness::Maximum => "*",
            Greediness::Minimum => "-",
            Greediness::Exact => "!",
        }
    }
}

/// Repetition bounds plus greediness.
///
/// A quantifier is an immutable value. The upper bound is optional, `None`
/// means that the number of repetitions is unbounded.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[serde(try_from = "QuantifierRepr")]
pub struct Quantifier {
    lower: usize,
    upper: Option<usize>,
    greediness: Greediness,
}

/// Deserialized quantifiers go through [`Quantifier::new`], so that their
/// bounds are checked.
#[derive(Deserialize)]
struct QuantifierRepr {
    lower: usize,
    upper: Option<usize>,
    greediness: Greediness,
}

impl TryFrom<QuantifierRepr> for Quantifier {
    type Error = Error;

    fn try_from(repr: QuantifierRepr) -> Result<Self, Self::Error> {
        Quantifier::new(repr.lower, repr.upper, repr.greediness)
    }
}

impl Default for Quantifier {
    fn default() -> Self {
        Self::ONE
    }
}

macro_rules! canonical {
    ($(#[$doc:meta])* $name:ident, $lower:expr, $upper:expr) => {
        canonical!($(#[$doc])* $name, $lower, $upper, Possessive);
    };
    ($(#[$doc:meta])* $name:ident, $lower:expr, $upper:expr, $greediness:ident) => {
        $(#[$doc])*
        pub const $name: Quantifier = Quantifier {
            lower: $lower,
            upper: $upper,
            greediness: Greediness::$greediness,
        };
    };
}

impl Quantifier {
    canonical!(
        /// Exactly zero repetitions.
        ZERO, 0, Some(0)
    );
    canonical!(
        /// Exactly one repetition. This is the default quantifier.
        ONE, 1, Some(1)
    );
    canonical!(
        /// Optional: `?`.
        ZERO_OR_ONE, 0, Some(1)
    );
    canonical!(
        /// Any number of repetitions: `*`.
        ZERO_OR_MORE, 0, None
    );
    canonical!(
        /// At least one repetition: `+`.
        ONE_OR_MORE, 1, None
    );

    canonical!(ZERO_MAXIMUM, 0, Some(0), Maximum);
    canonical!(ONE_MAXIMUM, 1, Some(1), Maximum);
    canonical!(ZERO_OR_ONE_MAXIMUM, 0, Some(1), Maximum);
    canonical!(ZERO_OR_MORE_MAXIMUM, 0, None, Maximum);
    canonical!(ONE_OR_MORE_MAXIMUM, 1, None, Maximum);

    canonical!(ZERO_MINIMUM, 0, Some(0), Minimum);
    canonical!(ONE_MINIMUM, 1, Some(1), Minimum);
    canonical!(ZERO_OR_ONE_MINIMUM, 0, Some(1), Minimum);
    canonical!(ZERO_OR_MORE_MINIMUM, 0, None, Minimum);
    canonical!(ONE_OR_MORE_MINIMUM, 1, None, Minimum);

    canonical!(ZERO_EXACT, 0, Some(0), Exact);
    canonical!(ONE_EXACT, 1, Some(1), Exact);
    canonical!(ZERO_OR_ONE_EXACT, 0, Some(1), Exact);
    canonical!(ZERO_OR_MORE_EXACT, 0, None, Exact);
    canonical!(ONE_OR_MORE_EXACT, 1, None, Exact);

    /// Creates a new quantifier.
    ///
    /// Returns [`Error::InvalidQuantifier`] if `upper` is lower than `lower`.
    pub fn new(
        lower: usize,
        upper: Option<usize>,
        greediness: Greediness,
    ) -> Result<Self, Error> {
        if let Some(upper) = upper {
            if upper < lower {
                return Err(Error::InvalidQuantifier { lower, upper });
            }
        }
        Ok(Self { lower, upper, greediness })
    }

    /// Creates a quantifier with the same bounds as `self`, but a different
    /// greediness.
    #[inline]
    pub const fn with_greediness(self, greediness: Greediness) -> Self {
        Self { lower: self.lower, upper: self.upper, greediness }
    }

    /// Shorthand for `with_greediness(Greediness::Maximum)`.
    #[inline]
    pub const fn maximum(self) -> Self {
        self.with_greediness(Greediness::Maximum)
    }

    /// Shorthand for `with_greediness(Greediness::Minimum)`.
    #[inline]
    pub const fn minimum(self) -> Self {
        self.with_greediness(Greediness::Minimum)
    }

    /// Shorthand for `with_greediness(Greediness::Exact)`.
    #[inline]
    pub const fn exact(self) -> Self {
        self.with_greediness(Greediness::Exact)
    }

    #[inline]
    pub fn lower_bound(&self) -> usize {
        self.lower
    }

    #[inline]
    pub fn upper_bound(&self) -> Option<usize> {
        self.upper
    }

    #[inline]
    pub fn greediness(&self) -> Greediness {
        self.greediness
    }

    #[inline]
    pub fn has_upper_bound(&self) -> bool {
        self.upper.is_some()
    }

    /// Returns true if `count` repetitions don't exceed the upper bound.
    #[inline]
    pub(crate) fn allows(&self, count: usize) -> bool {
        self.upper.map_or(true, |upper| count <= upper)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.lower == 0 && self.upper == Some(0)
    }

    #[inline]
    pub fn is_one(&self) -> bool {
        self.lower == 1 && self.upper == Some(1)
    }

    #[inline]
    pub fn is_zero_or_one(&self) -> bool {
        self.lower == 0 && self.upper == Some(1)
    }

    #[inline]
    pub fn is_zero_or_more(&self) -> bool {
        self.lower == 0 && self.upper.is_none()
    }

    #[inline]
    pub fn is_one_or_more(&self) -> bool {
        self.lower == 1 && self.upper.is_none()
    }

    /// True if the entry can be skipped entirely.
    #[inline]
    pub fn is_optional(&self) -> bool {
        self.lower == 0
    }
}

impl Display for Quantifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_one() {
            return write!(f, "{}", self.greediness.suffix());
        }
        if self.is_zero_or_one() {
            write!(f, "?")?;
        } else if self.is_zero_or_more() {
            write!(f, "*")?;
        } else if self.is_one_or_more() {
            write!(f, "+")?;
        } else {
            match self.upper {
                Some(upper) if upper == self.lower => {
                    write!(f, "{{{}}}", self.lower)?
                }
                Some(upper) => write!(f, "{{{},{}}}", self.lower, upper)?,
                None => write!(f, "{{{},}}", self.lower)?,
            }
        }
        write!(f, "{}", self.greediness.suffix())
    }
}
