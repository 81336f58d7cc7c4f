use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use crate::checker::{CharClass, Checker};
use crate::entry::{PatternEntry, TypeRef};
use crate::errors::Error;
use crate::quantifier::{Greediness, Quantifier};
use crate::seq::PatternSeq;
use crate::solver::{MatchOptions, TraceEvent};
use crate::types::builtin::{self, BACKREF};
use crate::types::{GrammarType, TypeTable};

fn repeated(c: char, name: &str, quantifier: Quantifier) -> PatternEntry {
    PatternEntry::new(Checker::char(c)).named(name).quantified(quantifier)
}

fn bounded(lower: usize, upper: Option<usize>, greediness: Greediness) -> Quantifier {
    Quantifier::new(lower, upper, greediness).unwrap()
}

#[test]
fn possessive_never_backtracks() {
    let possessive = PatternSeq::new(vec![
        repeated('a', "x", Quantifier::ONE_OR_MORE),
        PatternEntry::new(Checker::char('a')),
    ]);

    assert_eq!(possessive.match_text("aaa").unwrap(), None);

    let maximum = PatternSeq::new(vec![
        repeated('a', "x", Quantifier::ONE_OR_MORE.maximum()),
        PatternEntry::new(Checker::char('a')),
    ]);

    let result = maximum.match_text("aaa").unwrap().unwrap();
    assert_eq!(result.all_matches_by_name("x").len(), 2);
    assert_eq!(result.end(), 3);
}

#[test]
fn catch_all() {
    let seq = PatternSeq::new(vec![
        PatternEntry::new(CharClass::Any).quantified(Quantifier::ZERO_OR_MORE),
        PatternEntry::new(Checker::char('!')),
    ]);

    assert_eq!(seq.match_text("hello!").unwrap(), None);

    let seq = PatternSeq::new(vec![
        PatternEntry::new(Checker::word("say ")),
        PatternEntry::new(CharClass::Any)
            .quantified(bounded(1, Some(3), Greediness::Possessive)),
    ]);

    let result = seq.match_text("say héllo").unwrap().unwrap();
    assert_eq!(result.matched_text(), "say hél");
    assert_eq!(seq.match_text("say ").unwrap(), None);
}

#[test]
fn bounded_repetitions() {
    let seq = PatternSeq::new(vec![repeated(
        'a',
        "a",
        bounded(2, Some(4), Greediness::Possessive),
    )]);

    assert_eq!(seq.match_length("aaaaa", 0, None), Ok(Some(4)));
    assert_eq!(seq.match_length("aaa", 0, None), Ok(Some(3)));
    assert_eq!(seq.match_length("a", 0, None), Ok(None));
}

#[test]
fn exact_repetitions() {
    let seq = PatternSeq::new(vec![repeated(
        'a',
        "a",
        bounded(2, Some(4), Greediness::Exact),
    )]);

    // The number of repetitions is not capped, five exceeds the bounds.
    assert_eq!(seq.match_length("aaaaa", 0, None), Ok(None));
    assert_eq!(seq.match_length("aaaab", 0, None), Ok(Some(4)));
    assert_eq!(seq.match_length("ab", 0, None), Ok(None));
}

#[test]
fn maximum_and_minimum() {
    let maximum = PatternSeq::new(vec![
        repeated('b', "x", Quantifier::ZERO_OR_MORE.maximum()),
        PatternEntry::new(Checker::char('b')),
    ]);

    let result = maximum.match_text("bbbb").unwrap().unwrap();
    assert_eq!(result.all_matches_by_name("x").len(), 3);
    assert_eq!(result.end(), 4);

    let minimum = PatternSeq::new(vec![
        repeated('b', "x", Quantifier::ZERO_OR_MORE.minimum()),
        PatternEntry::new(Checker::char('b')),
    ]);

    let result = minimum.match_text("bbbb").unwrap().unwrap();
    assert_eq!(result.all_matches_by_name("x").len(), 0);
    assert_eq!(result.end(), 1);

    // When the whole text must be consumed, the minimum grows as needed.
    let result = minimum.parse("bbbb").unwrap().unwrap();
    assert_eq!(result.all_matches_by_name("x").len(), 3);
}

#[test]
fn minimum_respects_upper_bound() {
    let seq = PatternSeq::new(vec![
        repeated('b', "x", bounded(0, Some(2), Greediness::Minimum)),
        PatternEntry::new(Checker::char('b')),
    ]);

    assert!(seq.parse("bbb").unwrap().is_some());
    assert!(seq.parse("bbbb").unwrap().is_none());
}

#[test]
fn repeated_alternation() {
    let alternation = |q: Quantifier| {
        PatternSeq::new(vec![
            PatternEntry::new(Checker::either(vec![
                Checker::word("a"),
                Checker::word("ab"),
            ]))
            .named("alt")
            .quantified(q),
            PatternEntry::new(Checker::char('b')),
        ])
    };

    let maximum = alternation(Quantifier::ONE_OR_MORE.maximum());
    let result = maximum.match_text("abb").unwrap().unwrap();
    assert_eq!(result.text_by_name("alt"), Some("ab"));
    assert_eq!(result.end(), 3);

    let minimum = alternation(Quantifier::ONE_OR_MORE.minimum());
    let result = minimum.match_text("abb").unwrap().unwrap();
    assert_eq!(result.text_by_name("alt"), Some("a"));
    assert_eq!(result.end(), 2);
}

#[test]
fn alternation_falls_back_to_shorter() {
    let seq = PatternSeq::new(vec![
        PatternEntry::new(Checker::either(vec![
            Checker::word("ab"),
            Checker::word("a"),
        ]))
        .named("alt")
        .quantified(Quantifier::ONE_OR_MORE.maximum()),
        PatternEntry::new(Checker::word("bc")),
    ]);

    let result = seq.parse("abc").unwrap().unwrap();
    assert_eq!(result.text_by_name("alt"), Some("a"));
    assert_eq!(result.len(), 2);
}

#[test]
fn zero_length_repetitions() {
    for greediness in [
        Greediness::Possessive,
        Greediness::Maximum,
        Greediness::Minimum,
    ] {
        let seq = PatternSeq::new(vec![
            PatternEntry::new(Checker::Empty)
                .named("e")
                .quantified(bounded(2, None, greediness)),
            PatternEntry::new(Checker::char('a')),
        ]);

        assert!(
            seq.parse("a").unwrap().is_some(),
            "empty repetitions with {:?} greediness",
            greediness
        );
    }
}

#[test]
fn premature_end() {
    let seq = PatternSeq::new(vec![
        PatternEntry::new(Checker::word("ab")),
        PatternEntry::new(Checker::char('c')).quantified(Quantifier::ZERO_OR_ONE),
        PatternEntry::new(Checker::Empty),
    ]);

    assert_eq!(seq.match_length("ab", 0, None), Ok(Some(2)));

    let seq = PatternSeq::new(vec![
        PatternEntry::new(Checker::word("ab")),
        PatternEntry::new(Checker::char('c')),
    ]);

    assert_eq!(seq.match_length("ab", 0, None), Ok(None));
}

fn nested() -> TypeTable {
    let nested = GrammarType::with_factory("nested", |_, _, _| {
        Ok(Checker::seq(PatternSeq::new(vec![
            PatternEntry::new(Checker::char('(')),
            PatternEntry::type_ref(TypeRef::new("nested"))
                .quantified(Quantifier::ZERO_OR_ONE),
            PatternEntry::new(Checker::char(')')),
        ])))
    });

    let mut table = TypeTable::new();
    table.insert(Arc::new(nested));
    table
}

#[test]
fn recursion_limit() {
    let provider = nested();
    let seq = PatternSeq::new(vec![PatternEntry::type_ref(TypeRef::new(
        "nested",
    ))]);

    let text = format!("{}{}", "(".repeat(10), ")".repeat(10));

    assert!(seq
        .parse_with(&text, Some(&provider), &MatchOptions::default())
        .unwrap()
        .is_some());

    assert_eq!(
        seq.parse_with(&text, Some(&provider), &MatchOptions::new().max_depth(5)),
        Err(Error::RecursionLimit(5))
    );
}

#[test]
fn observer() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let options = MatchOptions::new().observer(move |event| {
        let description = match event {
            TraceEvent::Backtrack { offset, .. } => {
                format!("backtrack at {}", offset)
            }
            TraceEvent::Rejected { type_name, offset } => {
                format!("{} rejected at {}", type_name, offset)
            }
            TraceEvent::Attempt { .. } | TraceEvent::Matched { .. } => return,
        };
        sink.lock().unwrap().push(description);
    });

    let seq = PatternSeq::new(vec![
        repeated('b', "x", Quantifier::ZERO_OR_MORE.maximum()),
        PatternEntry::new(Checker::char('b')),
    ]);

    assert!(seq.match_at("bbbb", 0, None, &options).unwrap().is_some());
    assert_eq!(*events.lock().unwrap(), vec!["backtrack at 3".to_string()]);

    events.lock().unwrap().clear();

    let odd = GrammarType::new("odd?", Checker::char('2'))
        .validator(|_, _, _, _| false);

    let seq = PatternSeq::new(vec![
        PatternEntry::new(Checker::char('1')),
        PatternEntry::typed(Arc::new(odd)),
    ]);

    assert!(seq.match_at("12", 0, None, &options).unwrap().is_none());
    assert_eq!(*events.lock().unwrap(), vec!["odd? rejected at 1".to_string()]);
}

#[test]
fn memoization() {
    let word = Checker::either(vec![
        Checker::word("a"),
        Checker::word("ab"),
        Checker::word("abc"),
    ]);

    let seq = PatternSeq::new(vec![
        PatternEntry::new(word)
            .named("w")
            .quantified(Quantifier::ONE_OR_MORE.maximum()),
        PatternEntry::new(Checker::word("cab")),
    ]);

    let text = "abcabcab";

    let plain = seq
        .parse_with(text, None, &MatchOptions::new().memoize(false))
        .unwrap();
    let memoized = seq
        .parse_with(text, None, &MatchOptions::new().memoize(true))
        .unwrap();

    assert!(plain.is_some());
    assert_eq!(plain, memoized);

    let found = seq
        .find_with("xxabcab", None, &MatchOptions::new().memoize(true))
        .unwrap()
        .unwrap();
    assert_eq!(found.start(), 2);
}

#[test]
fn equal_length_alternatives() {
    let library = builtin::library();
    let capture = |name: &str| {
        Checker::seq(PatternSeq::new(vec![
            PatternEntry::new(Checker::char('x')).named(name)
        ]))
    };

    // Both alternatives match the same text, only the second one captures
    // what the back-reference needs.
    let seq = |q: Quantifier| {
        PatternSeq::new(vec![
            PatternEntry::new(Checker::either(vec![
                capture("other"),
                capture("tag"),
            ]))
            .quantified(q),
            PatternEntry::new(Checker::char(',')),
            PatternEntry::type_ref(TypeRef::new(BACKREF).with_param("tag")),
        ])
    };

    for q in [Quantifier::ONE_OR_MORE_MAXIMUM, Quantifier::ONE_OR_MORE_MINIMUM] {
        let result = seq(q)
            .parse_with("x,x", Some(&library), &MatchOptions::default())
            .unwrap();

        assert!(result.is_some(), "{:?} greediness", q.greediness());

        let result = result.unwrap();
        assert_eq!(result.text_by_name("tag"), Some("x"));
        assert_eq!(result.text_by_name("other"), None);
    }
}

fn recorder(
    name: &str,
    accept_at: Option<usize>,
) -> (GrammarType, Arc<Mutex<Vec<(usize, usize)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let ty = GrammarType::new(name, Checker::Empty).validator(
        move |host, this, _, _| {
            sink.lock().unwrap().push((this.start(), host.result().len()));
            accept_at.map_or(true, |offset| offset == this.start())
        },
    );
    (ty, seen)
}

#[test]
fn failed_attempts_leave_no_entries() {
    // Every repetition of `x` adds one entry. When the rest of the sequence
    // fails, the entries added by the discarded repetitions are gone.
    let (ty, seen) = recorder("seen?", Some(1));

    let seq = PatternSeq::new(vec![
        repeated('a', "x", Quantifier::ZERO_OR_MORE_MAXIMUM),
        PatternEntry::typed(Arc::new(ty)),
        PatternEntry::new(Checker::word("aa")),
    ]);

    let result = seq.parse("aaa").unwrap().unwrap();
    assert_eq!(result.all_matches_by_name("x").len(), 1);
    assert_eq!(*seen.lock().unwrap(), vec![(3, 3), (2, 2), (1, 1)]);

    // A nested sequence that matches a few entries before failing doesn't
    // leave anything behind either.
    let (ty, seen) = recorder("seen?", None);

    let inner = PatternSeq::new(vec![
        PatternEntry::new(Checker::char('a')).named("p"),
        PatternEntry::new(Checker::char('a')).named("q"),
        PatternEntry::new(Checker::char('b')),
    ]);

    let seq = PatternSeq::new(vec![
        PatternEntry::new(Checker::seq(inner)).quantified(Quantifier::ZERO_OR_ONE),
        PatternEntry::typed(Arc::new(ty)),
        PatternEntry::new(Checker::char('a')).quantified(Quantifier::ZERO_OR_MORE),
    ]);

    let result = seq.parse("aa").unwrap().unwrap();
    assert_eq!(result.text_by_name("p"), None);
    assert_eq!(*seen.lock().unwrap(), vec![(0, 0)]);
}
