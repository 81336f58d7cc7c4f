/*! A backtracking pattern matching and grammar parsing engine.

Grammars are built out of [`PatternSeq`]s, ordered lists of
[`PatternEntry`]s. Each entry matches something (a [`Checker`], or a
[`Type`] resolved by name through a [`TypeProvider`]) a number of times
given by its [`Quantifier`], and optionally captures the match under a
name. Since a sequence can be used as the checker of an entry, grammars
nest and can be recursive.

Matching a sequence against a text produces a [`ParseResult`], a tree
with one node per captured sub-grammar, that can be queried by name or by
type, and compiled into [`Value`]s by the types that produced it.

# Example

```rust
use regparser::{CharClass, Checker, PatternEntry, PatternSeq, Quantifier};

let number = Checker::seq(PatternSeq::new(vec![
    PatternEntry::new(CharClass::predefined("Digit").unwrap())
        .quantified(Quantifier::ONE_OR_MORE),
]));

let date = PatternSeq::new(vec![
    PatternEntry::new(number.clone()).named("year"),
    PatternEntry::new(Checker::char('-')),
    PatternEntry::new(number.clone()).named("month"),
    PatternEntry::new(Checker::char('-')),
    PatternEntry::new(number).named("day"),
]);

let result = date.parse("2024-03-15").unwrap().unwrap();

assert_eq!(result.text_by_name("year"), Some("2024"));
assert_eq!(result.text_by_name("day"), Some("15"));
```
*/

pub use checker::Alternation;
pub use checker::CharClass;
pub use checker::Checker;
pub use checker::FixedGroup;
pub use checker::FixedSlot;
pub use checker::Predefined;

pub use compile::CompileContext;
pub use compile::Diagnostic;
pub use compile::Level;
pub use compile::ReportBuilder;
pub use compile::Severity;
pub use compile::Value;

pub use entry::Payload;
pub use entry::PatternEntry;
pub use entry::TypeRef;

pub use errors::Error;
pub use errors::SerializationError;

pub use flags::NameFlagSet;
pub use flags::NameFlags;

pub use quantifier::Greediness;
pub use quantifier::Quantifier;

pub use result::Host;
pub use result::Location;
pub use result::ParseResult;
pub use result::ResultEntry;

pub use seq::PatternSeq;

pub use solver::MatchOptions;
pub use solver::ObserverFn;
pub use solver::TraceEvent;

pub use types::builtin;
pub use types::CheckerFn;
pub use types::CompilerFn;
pub use types::ExtensibleProvider;
pub use types::GrammarType;
pub use types::Type;
pub use types::TypeLibrary;
pub use types::TypeProvider;
pub use types::TypeTable;
pub use types::ValidatorFn;

mod checker;
mod compile;
mod entry;
mod errors;
mod flags;
mod quantifier;
mod result;
mod seq;
mod serialization;
mod solver;
mod types;

pub mod config;

#[cfg(test)]
mod tests;
