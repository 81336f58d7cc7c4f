use std::io;

use thiserror::Error;

/// Errors returned while serializing/deserializing pattern sequences.
#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("not a serialized pattern sequence")]
    InvalidFormat,

    #[error("unsupported pattern sequence version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid serialized pattern sequence")]
    InvalidEncoding(#[from] bincode::Error),

    #[error(transparent)]
    IoError(#[from] io::Error),
}

/// Errors that abort a matching or compilation operation.
///
/// These errors indicate a broken grammar definition, not an input that
/// doesn't match. An input that doesn't match is not an error, the
/// matching functions return `Ok(None)` in that case.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// A type reference could not be resolved by any of the available
    /// type providers.
    #[error("unknown type `{0}`")]
    UnknownType(String),

    /// A type doesn't provide a checker.
    #[error("type `{0}` has no checker")]
    MissingChecker(String),

    /// A fixed group has a malformed slot definition.
    #[error("invalid fixed group: {0}")]
    InvalidFixedGroup(String),

    /// The lower bound of a quantifier is greater than its upper bound.
    #[error("invalid quantifier: lower bound {lower} is greater than upper bound {upper}")]
    InvalidQuantifier { lower: usize, upper: usize },

    /// Sub-grammars are nested deeper than the configured limit.
    #[error("nesting depth limit ({0}) exceeded")]
    RecursionLimit(usize),

    /// The entry at the given index can't be compiled into a value.
    #[error("entry #{0} does not exist")]
    NotCompilable(usize),

    /// A fatal error was reported while compiling a parse result. Contains
    /// the full report.
    #[error("{0}")]
    Fatal(String),
}
