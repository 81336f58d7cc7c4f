/*! User-definable types.

A [`Type`] is a named, reusable piece of grammar with behavior attached:
it supplies the checker that matches the text, and optionally validates
the matched result and compiles it into a [`Value`]. Types are referenced
by pattern entries either directly or by name, in which case they are
resolved at matching time through a [`TypeProvider`].

The name of a type carries behavioral flags (see [`NameFlagSet`]). For
instance, a type named `number?` has a validation hook that runs as soon
as the type matches, while one named `backref~` has a validation hook that
is deferred until the whole match is complete.
*/

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::checker::Checker;
use crate::compile::{CompileContext, Value};
use crate::errors::Error;
use crate::flags::NameFlagSet;
use crate::result::{Host, ParseResult};

pub use provider::ExtensibleProvider;
pub use provider::TypeLibrary;
pub use provider::TypeProvider;
pub use provider::TypeTable;

pub(crate) use provider::ProviderChain;

pub mod builtin;
mod provider;


/// Trait implemented by all types.
pub trait Type: Send + Sync {
    /// The type's name, including its flag prefix and suffixes.
    fn name(&self) -> &str;

    /// Flags derived from the type's name.
    ///
    /// Implementations compute them once, when the type is created, and
    /// return the stored value.
    fn flags(&self) -> NameFlagSet;

    /// Returns the checker that matches this type.
    ///
    /// `host` is the result where the typed entry is being matched, which
    /// contains everything matched before it.
    fn checker(
        &self,
        host: &Host<'_>,
        param: Option<&str>,
        provider: &dyn TypeProvider,
    ) -> Result<Checker, Error>;

    /// Validates a match of this type. Returning false rejects the match,
    /// and the solver backtracks.
    ///
    /// Only called for types with the validation flag. `this` is the
    /// already collapsed result of the match. For types that are not
    /// self-contained, `host` is the collapsed result that contains the
    /// match, and the call happens once the whole match is complete.
    fn validate(
        &self,
        _host: &Host<'_>,
        _this: &ParseResult,
        _param: Option<&str>,
        _provider: &dyn TypeProvider,
    ) -> bool {
        true
    }

    /// Compiles the entry at `index` in `result`, which is a match of this
    /// type, into a value.
    ///
    /// By default the value is the matched text.
    fn compile(
        &self,
        result: &ParseResult,
        index: usize,
        _param: Option<&str>,
        _ctx: &mut CompileContext,
        _provider: &dyn TypeProvider,
    ) -> Result<Value, Error> {
        Ok(Value::Text(result.text_of(index).to_string()))
    }
}

/// Produces the checker of a [`GrammarType`].
pub type CheckerFn = dyn Fn(&Host<'_>, Option<&str>, &dyn TypeProvider) -> Result<Checker, Error>
    + Send
    + Sync;

/// Validation hook of a [`GrammarType`].
pub type ValidatorFn = dyn Fn(&Host<'_>, &ParseResult, Option<&str>, &dyn TypeProvider) -> bool
    + Send
    + Sync;

/// Compile hook of a [`GrammarType`].
pub type CompilerFn = dyn Fn(
        &ParseResult,
        usize,
        Option<&str>,
        &mut CompileContext,
        &dyn TypeProvider,
    ) -> Result<Value, Error>
    + Send
    + Sync;

#[derive(Clone)]
enum CheckerSource {
    Missing,
    Fixed(Checker),
    Factory(Arc<CheckerFn>),
}

/// A type assembled from closures.
///
/// This is the quickest way of defining types, as an alternative to
/// implementing [`Type`] for a new struct.
///
/// ```
/// # use std::sync::Arc;
/// # use regparser::{Checker, CharClass, GrammarType, PatternEntry, PatternSeq, Quantifier};
/// let digits = PatternSeq::new(vec![
///     PatternEntry::new(CharClass::predefined("Digit").unwrap())
///         .quantified(Quantifier::ONE_OR_MORE),
/// ]);
///
/// let number = GrammarType::new("number?", Checker::seq(digits))
///     .validator(|_, this, _, _| this.matched_text().len() <= 3);
///
/// let seq = PatternSeq::new(vec![PatternEntry::typed(Arc::new(number))]);
///
/// assert!(seq.parse("123").unwrap().is_some());
/// assert!(seq.parse("1234").unwrap().is_none());
/// ```
#[derive(Clone)]
pub struct GrammarType {
    name: String,
    flags: NameFlagSet,
    checker: CheckerSource,
    validator: Option<Arc<ValidatorFn>>,
    compiler: Option<Arc<CompilerFn>>,
}

impl GrammarType {
    /// Creates a type that always matches with the same checker.
    pub fn new<S: Into<String>>(name: S, checker: Checker) -> Self {
        Self::with_source(name.into(), CheckerSource::Fixed(checker))
    }

    /// Creates a type whose checker is produced every time the type is
    /// matched, depending on the context.
    pub fn with_factory<S, F>(name: S, factory: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Host<'_>, Option<&str>, &dyn TypeProvider) -> Result<Checker, Error>
            + Send
            + Sync
            + 'static,
    {
        Self::with_source(name.into(), CheckerSource::Factory(Arc::new(factory)))
    }

    fn with_source(name: String, checker: CheckerSource) -> Self {
        Self {
            flags: NameFlagSet::from_name(name.as_str()),
            name,
            checker,
            validator: None,
            compiler: None,
        }
    }

    /// Sets the validation hook.
    ///
    /// The hook only runs if the type's name has the `?` or `~` suffix.
    pub fn validator<F>(mut self, f: F) -> Self
    where
        F: Fn(&Host<'_>, &ParseResult, Option<&str>, &dyn TypeProvider) -> bool
            + Send
            + Sync
            + 'static,
    {
        self.validator = Some(Arc::new(f));
        self
    }

    /// Sets the compile hook.
    pub fn compiler<F>(mut self, f: F) -> Self
    where
        F: Fn(
                &ParseResult,
                usize,
                Option<&str>,
                &mut CompileContext,
                &dyn TypeProvider,
            ) -> Result<Value, Error>
            + Send
            + Sync
            + 'static,
    {
        self.compiler = Some(Arc::new(f));
        self
    }

    pub(crate) fn from_parts(
        name: String,
        checker: Option<Checker>,
        validator: Option<Arc<ValidatorFn>>,
        compiler: Option<Arc<CompilerFn>>,
    ) -> Self {
        let source = match checker {
            Some(checker) => CheckerSource::Fixed(checker),
            None => CheckerSource::Missing,
        };
        let mut ty = Self::with_source(name, source);
        ty.validator = validator;
        ty.compiler = compiler;
        ty
    }
}

impl Type for GrammarType {
    fn name(&self) -> &str {
        self.name.as_str()
    }

    fn flags(&self) -> NameFlagSet {
        self.flags
    }

    fn checker(
        &self,
        host: &Host<'_>,
        param: Option<&str>,
        provider: &dyn TypeProvider,
    ) -> Result<Checker, Error> {
        match &self.checker {
            CheckerSource::Missing => {
                Err(Error::MissingChecker(self.name.clone()))
            }
            CheckerSource::Fixed(checker) => Ok(checker.clone()),
            CheckerSource::Factory(f) => f(host, param, provider),
        }
    }

    fn validate(
        &self,
        host: &Host<'_>,
        this: &ParseResult,
        param: Option<&str>,
        provider: &dyn TypeProvider,
    ) -> bool {
        match &self.validator {
            Some(f) => f(host, this, param, provider),
            None => true,
        }
    }

    fn compile(
        &self,
        result: &ParseResult,
        index: usize,
        param: Option<&str>,
        ctx: &mut CompileContext,
        provider: &dyn TypeProvider,
    ) -> Result<Value, Error> {
        match &self.compiler {
            Some(f) => f(result, index, param, ctx, provider),
            None => Ok(Value::Text(result.text_of(index).to_string())),
        }
    }
}

impl Debug for GrammarType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrammarType")
            .field("name", &self.name)
            .field("has_validator", &self.validator.is_some())
            .field("has_compiler", &self.compiler.is_some())
            .finish()
    }
}
