/*! Compilation of parse results into values.

After a successful match, a parse result can be turned into a [`Value`]
by calling the compile hooks of the types in it (see
[`crate::ParseResult::compile`]). While doing so, hooks report problems
through a [`CompileContext`], which accumulates warnings and errors, and
turns fatal problems into an [`Error::Fatal`] that aborts the compilation.
*/

use std::fmt::{Display, Formatter};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::result::{Location, ParseResult};
use crate::types::TypeProvider;

pub use report::Level;
pub use report::ReportBuilder;

mod report;

#[cfg(test)]
mod tests;

/// A value produced by compiling a parse result.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    /// Named fields, in the order they were produced.
    Struct(Vec<(String, Value)>),
}

impl Value {
    /// Returns the value of the field with the given name, if this is a
    /// [`Value::Struct`].
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => {
                fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        if let Value::Integer(i) = self {
            Some(*i)
        } else {
            None
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        if let Value::Text(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }
}

/// Severity of a [`Diagnostic`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

impl Severity {
    fn level(&self) -> Level {
        match self {
            Severity::Warning => Level::Warning,
            Severity::Error | Severity::Fatal => Level::Error,
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal error"),
        }
    }
}

/// A problem reported while compiling.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    span: Range<usize>,
    location: Location,
    report: String,
}

impl Diagnostic {
    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Span of the source text the diagnostic refers to.
    #[inline]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    #[inline]
    pub fn location(&self) -> Location {
        self.location
    }

    /// The diagnostic rendered as a report with an annotated snippet of the
    /// source text.
    #[inline]
    pub fn report(&self) -> &str {
        self.report.as_str()
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.report)
    }
}

/// Collects the diagnostics produced while compiling a parse result.
pub struct CompileContext {
    report_builder: ReportBuilder,
    diagnostics: Vec<Diagnostic>,
}

impl CompileContext {
    /// Creates a context for compiling results obtained from `text`.
    pub fn new(text: &str) -> Self {
        Self { report_builder: ReportBuilder::new(text), diagnostics: Vec::new() }
    }

    /// Returns the report builder, which can be used for configuring how
    /// reports are rendered.
    pub fn report_builder(&mut self) -> &mut ReportBuilder {
        &mut self.report_builder
    }

    /// Reports a warning about the entry at `index` in `result`.
    pub fn warning<M: Into<String>>(
        &mut self,
        result: &ParseResult,
        index: usize,
        message: M,
    ) {
        self.add(Severity::Warning, result, index, message.into());
    }

    /// Reports an error about the entry at `index` in `result`. The
    /// compilation continues.
    pub fn error<M: Into<String>>(
        &mut self,
        result: &ParseResult,
        index: usize,
        message: M,
    ) {
        self.add(Severity::Error, result, index, message.into());
    }

    /// Reports a fatal error about the entry at `index` in `result`. The
    /// returned error must be propagated by the caller.
    pub fn fatal<M: Into<String>>(
        &mut self,
        result: &ParseResult,
        index: usize,
        message: M,
    ) -> Error {
        let report = self.add(Severity::Fatal, result, index, message.into());
        Error::Fatal(report)
    }

    /// Reports an error about a type, using the message supplied by the
    /// provider for that type if it has one.
    pub fn type_error(
        &mut self,
        result: &ParseResult,
        index: usize,
        type_name: &str,
        provider: &dyn TypeProvider,
    ) {
        let message = provider
            .error_message(type_name)
            .unwrap_or_else(|| format!("invalid `{}`", type_name));
        self.add(Severity::Error, result, index, message);
    }

    #[inline]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.as_slice()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity != Severity::Warning)
    }

    /// Returns true if any error, fatal or not, was reported.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    fn add(
        &mut self,
        severity: Severity,
        result: &ParseResult,
        index: usize,
        message: String,
    ) -> String {
        let span = if index < result.len() {
            result.start_of(index)..result.end_of(index)
        } else {
            result.end()..result.end()
        };
        let location = result.location_of(span.start);
        let report = self.report_builder.create_report(
            severity.level(),
            span.clone(),
            &message,
            &format!("{} here", severity),
            None,
        );
        self.diagnostics.push(Diagnostic {
            severity,
            message,
            span,
            location,
            report: report.clone(),
        });
        report
    }
}
