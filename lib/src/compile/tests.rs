use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::checker::{CharClass, Checker};
use crate::compile::{CompileContext, Severity, Value};
use crate::entry::PatternEntry;
use crate::errors::Error;
use crate::quantifier::Quantifier;
use crate::result::{Location, ParseResult};
use crate::seq::PatternSeq;
use crate::types::{GrammarType, TypeTable};

fn assignment() -> ParseResult {
    let word = Checker::seq(PatternSeq::new(vec![PatternEntry::new(
        CharClass::predefined("Alpha").unwrap(),
    )
    .quantified(Quantifier::ONE_OR_MORE)]));

    PatternSeq::new(vec![
        PatternEntry::new(word.clone()).named("key"),
        PatternEntry::new(Checker::char('=')),
        PatternEntry::new(word).named("value"),
    ])
    .parse("color=blue")
    .unwrap()
    .unwrap()
}

#[test]
fn diagnostics() {
    let result = assignment();
    let mut ctx = CompileContext::new(result.source());

    ctx.warning(&result, 0, "unused key");
    ctx.error(&result, 2, "unknown color");

    assert_eq!(ctx.diagnostics().len(), 2);
    assert_eq!(ctx.warnings().count(), 1);
    assert_eq!(ctx.errors().count(), 1);
    assert!(ctx.has_errors());

    let warning = &ctx.diagnostics()[0];
    assert_eq!(warning.severity(), Severity::Warning);
    assert_eq!(warning.message(), "unused key");
    assert_eq!(warning.span(), 0..5);
    assert_eq!(warning.location(), Location { row: 1, col: 1 });

    let error = &ctx.diagnostics()[1];
    assert_eq!(error.severity(), Severity::Error);
    assert_eq!(error.span(), 6..10);
    assert_eq!(error.location(), Location { row: 1, col: 7 });
    assert!(error.report().contains("unknown color"));
    assert!(error.report().contains("color=blue"));
}

#[test]
fn only_warnings() {
    let result = assignment();
    let mut ctx = CompileContext::new(result.source());

    ctx.warning(&result, 1, "odd separator");

    assert!(!ctx.has_errors());
    assert_eq!(ctx.errors().count(), 0);
}

#[test]
fn fatal() {
    let result = assignment();
    let mut ctx = CompileContext::new(result.source());

    let err = ctx.fatal(&result, 0, "reserved key");

    match &err {
        Error::Fatal(report) => assert!(report.contains("reserved key")),
        _ => panic!("unexpected error: {}", err),
    }

    assert_eq!(ctx.diagnostics()[0].severity(), Severity::Fatal);
    assert!(ctx.has_errors());
}

#[test]
fn fatal_aborts_compilation() {
    let strict = GrammarType::new("strict", Checker::word("no"))
        .compiler(|result, index, _, ctx, _| {
            Err(ctx.fatal(result, index, "not allowed"))
        });

    let seq = PatternSeq::new(vec![
        PatternEntry::new(Checker::word("yes")),
        PatternEntry::typed(Arc::new(strict)),
    ]);

    let result = seq.parse("yesno").unwrap().unwrap();
    let mut ctx = CompileContext::new(result.source());

    assert!(matches!(
        result.compile_all(&mut ctx, &TypeTable::new()),
        Err(Error::Fatal(_))
    ));
    assert_eq!(ctx.diagnostics().len(), 1);
    assert_eq!(ctx.diagnostics()[0].span(), 3..5);
}

#[test]
fn type_error() {
    let result = assignment();
    let mut ctx = CompileContext::new(result.source());

    let mut provider = TypeTable::new();
    provider.set_error_message("color", "expecting a color name");

    ctx.type_error(&result, 2, "color", &provider);
    ctx.type_error(&result, 0, "key", &provider);

    let messages: Vec<&str> =
        ctx.diagnostics().iter().map(|d| d.message()).collect();

    assert_eq!(messages, vec!["expecting a color name", "invalid `key`"]);
}

#[test]
fn values() {
    let value = Value::Struct(vec![
        ("key".to_string(), Value::Text("color".to_string())),
        ("count".to_string(), Value::Integer(3)),
    ]);

    assert_eq!(value.field("count").and_then(Value::as_integer), Some(3));
    assert_eq!(value.field("key").and_then(Value::as_text), Some("color"));
    assert_eq!(value.field("missing"), None);
    assert_eq!(Value::Null.field("key"), None);
}

#[test]
fn report_origin() {
    let result = assignment();
    let mut ctx = CompileContext::new(result.source());

    ctx.report_builder().with_origin("settings.conf");
    ctx.error(&result, 0, "bad key");

    assert!(ctx.diagnostics()[0].report().contains("settings.conf"));
}
