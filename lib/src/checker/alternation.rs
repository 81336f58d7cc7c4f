use serde::{Deserialize, Serialize};

use crate::checker::Checker;

/// An ordered list of alternatives, plus an optional default.
///
/// The alternative producing the longest match wins, no matter the order
/// in which alternatives were declared. Among alternatives that produce
/// matches of the same length, the first one declared wins. If none of the
/// alternatives match and a default exists, the result is whatever the
/// default produces.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Alternation {
    alternatives: Vec<Checker>,
    default: Option<Box<Checker>>,
}

impl Alternation {
    /// Creates an alternation without default.
    pub fn new(alternatives: Vec<Checker>) -> Self {
        Self { alternatives, default: None }
    }

    /// Sets the checker used when none of the alternatives match.
    pub fn with_default(mut self, default: Checker) -> Self {
        self.default = Some(Box::new(default));
        self
    }

    #[inline]
    pub fn alternatives(&self) -> &[Checker] {
        self.alternatives.as_slice()
    }

    #[inline]
    pub fn default(&self) -> Option<&Checker> {
        self.default.as_deref()
    }

    pub(crate) fn is_leaf(&self) -> bool {
        self.alternatives.iter().all(Checker::is_leaf)
            && self.default.as_ref().map_or(true, |d| d.is_leaf())
    }

    pub(crate) fn match_leaf(&self, text: &str, offset: usize) -> Option<usize> {
        let mut best: Option<usize> = None;
        for alt in &self.alternatives {
            if let Some(len) = alt.match_leaf(text, offset) {
                // Strictly greater: on ties the first declared wins.
                if best.map_or(true, |b| len > b) {
                    best = Some(len);
                }
            }
        }
        match (best, &self.default) {
            (None, Some(default)) => default.match_leaf(text, offset),
            (best, _) => best,
        }
    }
}
