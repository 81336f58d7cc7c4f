/*! End-to-end tests. */
use pretty_assertions::assert_eq;

use crate::types::builtin::{self, BACKREF, INTEGER};
use crate::{
    CharClass, Checker, Error, FixedGroup, FixedSlot, MatchOptions,
    ParseResult, PatternEntry, PatternSeq, Quantifier, TypeProvider,
    TypeRef, TypeTable,
};

macro_rules! parses {
    ($seq:expr, $text:expr) => {{
        parses!($seq, $text, None)
    }};
    ($seq:expr, $text:expr, $provider:expr) => {{
        let result = $seq
            .parse_with($text, $provider, &MatchOptions::default())
            .expect("matching should not fail");
        assert!(result.is_some(), "\n\n`{}` should parse", $text);
        result.unwrap()
    }};
}

macro_rules! rejects {
    ($seq:expr, $text:expr) => {{
        rejects!($seq, $text, None)
    }};
    ($seq:expr, $text:expr, $provider:expr) => {{
        let result = $seq
            .parse_with($text, $provider, &MatchOptions::default())
            .expect("matching should not fail");
        assert!(
            result.is_none(),
            "\n\n`{}` should not parse, got {:?}",
            $text,
            result
        );
    }};
}

fn one_or_more(class: &str) -> Checker {
    Checker::seq(PatternSeq::new(vec![PatternEntry::new(
        CharClass::predefined(class).unwrap(),
    )
    .quantified(Quantifier::ONE_OR_MORE)]))
}

fn named(checker: Checker, name: &str) -> PatternEntry {
    PatternEntry::new(checker).named(name)
}

fn digit() -> CharClass {
    CharClass::predefined("Digit").unwrap()
}

#[test]
fn date() {
    let seq = PatternSeq::new(vec![
        named(one_or_more("Digit"), "year"),
        PatternEntry::new(Checker::char('-')),
        named(one_or_more("Digit"), "month"),
        PatternEntry::new(Checker::char('-')),
        named(one_or_more("Digit"), "day"),
    ]);

    let result = parses!(seq, "2024-03-15");

    assert_eq!(result.len(), 5);
    assert_eq!(result.text_by_name("year"), Some("2024"));
    assert_eq!(result.text_by_name("month"), Some("03"));
    assert_eq!(result.text_by_name("day"), Some("15"));

    rejects!(seq, "2024-03");
    rejects!(seq, "2024-03-15-");
}

#[test]
fn possessive_is_deterministic() {
    let seq = PatternSeq::new(vec![
        named(one_or_more("Alpha"), "key"),
        PatternEntry::new(Checker::char('=')),
        named(one_or_more("Alnum"), "value"),
    ]);

    let first = parses!(seq, "answer=42");
    let second = parses!(seq, "answer=42");

    assert_eq!(first, second);
    assert_eq!(first.text_by_name("value"), Some("42"));
}

#[test]
fn longest_alternative() {
    let alternatives = Checker::either(vec![
        Checker::seq(PatternSeq::new(vec![named(Checker::word("a"), "short")])),
        Checker::seq(PatternSeq::new(vec![named(Checker::word("ab"), "long")])),
    ]);

    let seq = PatternSeq::new(vec![named(alternatives, "alt")]);
    let result = parses!(seq, "ab");
    let alt = result.sub_result_by_name("alt").unwrap();

    assert_eq!(alt.text_by_name("long"), Some("ab"));
    assert_eq!(alt.last_match_by_name("short"), None);
}

#[test]
fn first_declared_alternative_wins_ties() {
    let alternatives = Checker::either(vec![
        Checker::seq(PatternSeq::new(vec![named(Checker::any(), "first")])),
        Checker::seq(PatternSeq::new(vec![named(Checker::any(), "second")])),
    ]);

    let seq = PatternSeq::new(vec![named(alternatives, "alt")]);
    let result = parses!(seq, "x");
    let alt = result.sub_result_by_name("alt").unwrap();

    assert_eq!(alt.text_by_name("first"), Some("x"));
    assert_eq!(alt.last_match_by_name("second"), None);
}

#[test]
fn bounded_repetition() {
    let seq = PatternSeq::new(vec![PatternEntry::new(Checker::char('a'))
        .named("a")
        .quantified(Quantifier::new(2, Some(4), Default::default()).unwrap())]);

    let result = seq.match_text("aaaaa").unwrap().unwrap();
    assert_eq!(result.end(), 4);
    assert_eq!(result.all_matches_by_name("a").len(), 4);

    assert_eq!(seq.match_text("a").unwrap(), None);
    rejects!(seq, "aaaaa");
}

#[test]
fn greediness() {
    let seq = |q: Quantifier| {
        PatternSeq::new(vec![
            PatternEntry::new(Checker::char('b')).named("x").quantified(q),
            PatternEntry::new(Checker::char('b')),
        ])
    };

    let result = seq(Quantifier::ZERO_OR_MORE.maximum())
        .match_text("bbbb")
        .unwrap()
        .unwrap();
    assert_eq!(result.all_matches_by_name("x").len(), 3);

    let result = seq(Quantifier::ZERO_OR_MORE.minimum())
        .match_text("bbbb")
        .unwrap()
        .unwrap();
    assert_eq!(result.all_matches_by_name("x").len(), 0);

    assert_eq!(
        seq(Quantifier::ZERO_OR_MORE).match_text("bbbb").unwrap(),
        None
    );
}

#[test]
fn back_reference() {
    let library = builtin::library();
    let seq = PatternSeq::new(vec![
        named(one_or_more("Word"), "tag"),
        PatternEntry::new(Checker::char(',')),
        PatternEntry::type_ref(TypeRef::new(BACKREF).with_param("tag"))
            .named("ref"),
    ]);

    let result = parses!(seq, "foo,foo", Some(&library));
    assert_eq!(result.text_by_name("ref"), Some("foo"));
    assert_eq!(result.type_name_of(2), Some(BACKREF));

    rejects!(seq, "foo,bar", Some(&library));
    rejects!(seq, "foo,food", Some(&library));
}

#[test]
fn deferred_back_reference() {
    let library = builtin::library();

    // The capture is nested in an anonymous group, so it's not visible
    // while the back-reference is being matched.
    let group = Checker::seq(PatternSeq::new(vec![
        PatternEntry::new(Checker::char('<')),
        named(one_or_more("Word"), "tag"),
        PatternEntry::new(Checker::char('>')),
    ]));

    let seq = PatternSeq::new(vec![
        PatternEntry::new(group),
        named(one_or_more("Alpha"), "body"),
        PatternEntry::new(Checker::word("</")),
        PatternEntry::type_ref(TypeRef::new(BACKREF).with_param("tag")),
        PatternEntry::new(Checker::char('>')),
    ]);

    let result = parses!(seq, "<b>bold</b>", Some(&library));
    assert_eq!(result.text_by_name("tag"), Some("b"));
    assert_eq!(result.text_by_name("body"), Some("bold"));

    rejects!(seq, "<b>bold</i>", Some(&library));
}

#[test]
fn collective_names() {
    let letter = CharClass::predefined("Alpha").unwrap();

    let separate = PatternSeq::new(vec![PatternEntry::new(letter.clone())
        .named("c")
        .quantified(Quantifier::ONE_OR_MORE)]);

    let result = parses!(separate, "abc");
    assert_eq!(result.all_matches_by_name("c"), vec![0, 1, 2]);
    assert_eq!(result.text_by_name("c"), Some("c"));

    let merged = PatternSeq::new(vec![PatternEntry::new(letter)
        .named("c[]")
        .quantified(Quantifier::ONE_OR_MORE)]);

    let result = parses!(merged, "abc");
    assert_eq!(result.all_matches_by_name("c[]"), vec![0]);
    assert_eq!(result.text_by_name("c[]"), Some("abc"));
    // Names are matched verbatim, suffixes included.
    assert_eq!(result.text_by_name("c"), None);
}

#[test]
fn text_and_flattened_entries() {
    let pair = PatternSeq::new(vec![
        named(one_or_more("Alpha"), "x"),
        named(one_or_more("Digit"), "y"),
    ]);

    let seq = PatternSeq::new(vec![named(Checker::seq(pair.clone()), "$text")]);
    let result = parses!(seq, "ab12");
    assert_eq!(result.text_by_name("$text"), Some("ab12"));
    assert_eq!(result.sub_result_by_name("$text"), None);

    let seq = PatternSeq::new(vec![named(Checker::seq(pair.clone()), "all+")]);
    let result = parses!(seq, "ab12");
    assert_eq!(result.len(), 2);
    assert_eq!(result.text_by_name("x"), Some("ab"));
    assert_eq!(result.text_by_name("y"), Some("12"));

    let seq = PatternSeq::new(vec![named(Checker::seq(pair), "single*")]);
    let result = parses!(seq, "ab12");
    assert_eq!(result.len(), 1);
    assert_eq!(result.text_by_name("single*"), Some("ab12"));
}

#[test]
fn second_stage() {
    let key_value = PatternSeq::new(vec![
        named(one_or_more("Alpha"), "key"),
        PatternEntry::new(Checker::char('=')),
        named(one_or_more("Digit"), "value"),
    ]);

    let non_space = Checker::seq(PatternSeq::new(vec![PatternEntry::new(
        CharClass::predefined("Space").unwrap().complement(),
    )
    .quantified(Quantifier::ONE_OR_MORE)]));

    let seq = PatternSeq::new(vec![
        named(non_space.clone(), "first").second_stage(key_value.clone()),
        PatternEntry::new(Checker::char(' ')),
        named(non_space, "second").second_stage(key_value),
    ]);

    let result = parses!(seq, "x=1 junk");

    let first = result.sub_result_by_name("first").unwrap();
    assert_eq!(first.text_by_name("key"), Some("x"));
    assert_eq!(first.text_by_name("value"), Some("1"));

    // The second stage doesn't match `junk`, the first stage is kept.
    let second = result.sub_result_by_name("second").unwrap();
    assert_eq!(second.text_by_name("key"), None);
    assert_eq!(second.matched_text(), "junk");
}

#[test]
fn anchoring() {
    let seq = PatternSeq::new(vec![named(one_or_more("Alpha"), "w")]);

    let result = seq.match_text("abc1").unwrap().unwrap();
    assert_eq!(result.text_by_name("w"), Some("abc"));

    rejects!(seq, "abc1");
    let result = seq
        .match_at("1abc", 1, None, &MatchOptions::default())
        .unwrap()
        .unwrap();
    assert_eq!(result.start(), 1);
    assert_eq!(result.matched_text(), "abc");
}

#[test]
fn find() {
    let seq = PatternSeq::new(vec![named(one_or_more("Digit"), "n")]);

    let result = seq.find("abc 123 456").unwrap().unwrap();
    assert_eq!(result.start(), 4);
    assert_eq!(result.text_by_name("n"), Some("123"));

    assert_eq!(seq.find("no digits").unwrap(), None);
}

#[test]
fn fixed_group_slots() {
    let group = FixedGroup::new(vec![
        FixedSlot::new(4, digit()).named("year"),
        FixedSlot::new(1, CharClass::Char('-')),
        FixedSlot::new(2, digit()).named("month"),
        FixedSlot::new(1, CharClass::Char('-')),
        FixedSlot::new(2, digit()).named("day"),
    ])
    .unwrap();

    let seq = PatternSeq::new(vec![named(group.clone().into(), "date")]);
    let result = parses!(seq, "2024-03-15");
    let date = result.sub_result_by_name("date").unwrap();

    assert_eq!(date.text_by_name("year"), Some("2024"));
    assert_eq!(date.text_by_name("month"), Some("03"));
    assert_eq!(date.text_by_name("day"), Some("15"));

    // Anonymous groups are spliced into the parent.
    let seq = PatternSeq::new(vec![PatternEntry::new(group)]);
    let result = parses!(seq, "2024-03-15");

    assert_eq!(result.text_by_name("day"), Some("15"));
    rejects!(seq, "2024-3-15");
}

#[test]
fn typed_entries() {
    let library = builtin::library();
    let seq = PatternSeq::new(vec![
        PatternEntry::type_ref(TypeRef::new(INTEGER)).named("a"),
        PatternEntry::type_ref(TypeRef::new(builtin::SPACES)),
        PatternEntry::type_ref(TypeRef::new(INTEGER)).named("b"),
    ]);

    let result = parses!(seq, "12 \t-7", Some(&library));

    assert_eq!(result.all_matches_by_type(INTEGER), vec![0, 2]);
    assert_eq!(result.text_by_name("b"), Some("-7"));

    assert_eq!(
        seq.match_text("12 7"),
        Err(Error::UnknownType(INTEGER.to_string()))
    );

    // The same grammar works without explicit provider when the sequence
    // carries a default one.
    let seq = seq.with_default_provider(std::sync::Arc::new(library));
    assert!(seq.match_text("12 7").unwrap().is_some());
}

#[test]
fn serialized_grammar() {
    let library = builtin::library();
    let seq = PatternSeq::new(vec![
        PatternEntry::typed(library.type_by_name(INTEGER).unwrap()).named("n"),
        PatternEntry::new(Checker::char(';')),
    ]);

    let restored = PatternSeq::deserialize(seq.serialize().unwrap()).unwrap();

    // Types are stored by name, and resolved again when matching.
    assert_eq!(
        restored.match_text("5;"),
        Err(Error::UnknownType(INTEGER.to_string()))
    );

    let result = parses!(restored, "5;", Some(&library));
    assert_eq!(result.text_by_name("n"), Some("5"));
}

#[test]
fn collapse_is_idempotent() {
    let seq = PatternSeq::new(vec![
        PatternEntry::new(Checker::seq(PatternSeq::new(vec![
            named(one_or_more("Alpha"), "w[]"),
            PatternEntry::new(Checker::char(' ')).quantified(Quantifier::ZERO_OR_ONE),
        ])))
        .quantified(Quantifier::ONE_OR_MORE),
    ]);

    let result = parses!(seq, "one two three");
    let mut again: ParseResult = result.duplicate();
    again.collapse(None).unwrap();

    assert_eq!(again, result);
    assert_eq!(result.location_of(8), crate::Location { row: 1, col: 9 });
}

#[test]
fn empty_text() {
    let seq = PatternSeq::new(vec![PatternEntry::new(Checker::char('a'))
        .quantified(Quantifier::ZERO_OR_MORE)]);

    let result = parses!(seq, "");
    assert!(result.is_empty());
    assert_eq!(result.matched_text(), "");

    let table = TypeTable::new();
    rejects!(
        PatternSeq::new(vec![PatternEntry::new(Checker::char('a'))]),
        "",
        Some(&table)
    );
}

#[test]
fn entry_builders() {
    let entry =
        PatternEntry::type_ref(TypeRef::new(INTEGER).with_param("p")).named("n");

    assert!(entry.payload().is_typed());
    assert_eq!(entry.param(), Some("p"));
    assert_eq!(entry.to_string(), "(n:!$Integer(p)!)");

    let repeated = entry.with_quantifier(Quantifier::ZERO_OR_MORE.maximum());

    assert!(repeated.quantifier().is_optional());
    assert_eq!(repeated.name(), Some("n"));
    assert_eq!(repeated.to_string(), "(n:!$Integer(p)!)**");
    assert_ne!(repeated, entry);
}
