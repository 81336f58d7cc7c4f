/*! Types that are useful in many grammars.

[`library`] returns a [`TypeTable`] with all of them, which can be used
directly as a provider, or pushed into a [`crate::TypeLibrary`] below the
grammar's own types.
*/

use std::sync::Arc;

use crate::checker::{CharClass, Checker, Predefined};
use crate::compile::{CompileContext, Value};
use crate::entry::PatternEntry;
use crate::errors::Error;
use crate::flags::NameFlagSet;
use crate::quantifier::Quantifier;
use crate::result::{Host, ParseResult};
use crate::seq::PatternSeq;
use crate::types::{GrammarType, Type, TypeProvider, TypeTable};

/// Name of the [`BackRef`] type.
pub const BACKREF: &str = "backref~";
/// Name of the identifier type.
pub const IDENTIFIER: &str = "$Identifier";
/// Name of the integer type.
pub const INTEGER: &str = "$Integer";
/// Name of the type that matches spaces and tabs.
pub const SPACES: &str = "$Spaces";

/// Matches the same text captured earlier under the name given as the
/// type parameter.
///
/// If the capture is visible when the back-reference is matched, the
/// back-reference matches exactly the captured text. Otherwise, it matches
/// anything with the shape of a word, and the comparison with the capture
/// is deferred until the whole match is complete and collapsed, when
/// captures nested in anonymous groups become visible.
pub struct BackRef {
    shape: Checker,
    flags: NameFlagSet,
}

impl BackRef {
    /// Creates a back-reference that falls back to matching words.
    pub fn new() -> Self {
        Self::with_shape(Checker::seq(PatternSeq::new(vec![PatternEntry::new(
            CharClass::Predefined(Predefined::Word),
        )
        .quantified(Quantifier::ONE_OR_MORE)])))
    }

    /// Creates a back-reference that falls back to `shape` when the
    /// referenced capture is not visible yet.
    pub fn with_shape(shape: Checker) -> Self {
        Self { shape, flags: NameFlagSet::from_name(BACKREF) }
    }
}

impl Default for BackRef {
    fn default() -> Self {
        Self::new()
    }
}

impl Type for BackRef {
    fn name(&self) -> &str {
        BACKREF
    }

    fn flags(&self) -> NameFlagSet {
        self.flags
    }

    fn checker(
        &self,
        host: &Host<'_>,
        param: Option<&str>,
        _provider: &dyn TypeProvider,
    ) -> Result<Checker, Error> {
        let capture = param.and_then(|name| host.last_text_by_name(name));
        match capture {
            Some(text) => Ok(Checker::word(text)),
            None => Ok(self.shape.clone()),
        }
    }

    fn validate(
        &self,
        host: &Host<'_>,
        this: &ParseResult,
        param: Option<&str>,
        _provider: &dyn TypeProvider,
    ) -> bool {
        let Some(name) = param else {
            return false;
        };
        host.last_text_by_name_before(name, this.start())
            == Some(this.matched_text())
    }
}

fn seq(entries: Vec<PatternEntry>) -> Checker {
    Checker::seq(PatternSeq::new(entries))
}

fn identifier() -> GrammarType {
    let first = CharClass::Union(vec![
        CharClass::Predefined(Predefined::Alpha),
        CharClass::Char('_'),
    ]);
    GrammarType::new(
        IDENTIFIER,
        seq(vec![
            PatternEntry::new(first),
            PatternEntry::new(CharClass::Predefined(Predefined::Word))
                .quantified(Quantifier::ZERO_OR_MORE),
        ]),
    )
}

fn integer() -> GrammarType {
    GrammarType::new(
        INTEGER,
        seq(vec![
            PatternEntry::new(CharClass::Char('-'))
                .quantified(Quantifier::ZERO_OR_ONE),
            PatternEntry::new(CharClass::Predefined(Predefined::Digit))
                .quantified(Quantifier::ONE_OR_MORE),
        ]),
    )
    .compiler(compile_integer)
}

fn compile_integer(
    result: &ParseResult,
    index: usize,
    _param: Option<&str>,
    ctx: &mut CompileContext,
    _provider: &dyn TypeProvider,
) -> Result<Value, Error> {
    match result.text_of(index).parse::<i64>() {
        Ok(i) => Ok(Value::Integer(i)),
        Err(_) => {
            ctx.error(result, index, "integer out of range");
            Ok(Value::Null)
        }
    }
}

fn spaces() -> GrammarType {
    GrammarType::new(
        SPACES,
        seq(vec![PatternEntry::new(CharClass::Predefined(Predefined::Blank))
            .quantified(Quantifier::ONE_OR_MORE)]),
    )
}

/// Returns a table with all the built-in types.
pub fn library() -> TypeTable {
    let mut table = TypeTable::new();
    table
        .insert(Arc::new(BackRef::new()))
        .insert(Arc::new(identifier()))
        .insert(Arc::new(integer()))
        .insert(Arc::new(spaces()))
        .set_error_message(INTEGER, "expecting an integer");
    table
}
