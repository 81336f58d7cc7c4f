use std::mem;

use crate::errors::Error;
use crate::result::{ParseResult, ResultEntry};
use crate::solver::Solver;

/// Collapses `node` and all its descendants.
///
/// The passes are, in order:
///
/// 1. Collapse sub-results, and drop the sub-results of text entries.
/// 2. Merge runs of adjacent anonymous leaf entries, and runs of
///    collective entries with the same name and type.
/// 3. Re-parse entries that have a second stage grammar.
/// 4. Splice the children of anonymous and flattenable entries into the
///    node.
pub(crate) fn collapse(
    node: &mut ParseResult,
    solver: &mut Solver<'_, '_>,
) -> Result<(), Error> {
    if node.collapsed {
        return Ok(());
    }

    let entries = mem::take(&mut node.entries);

    // Pass 1
    let mut simplified = Vec::with_capacity(entries.len());
    for mut entry in entries {
        if entry.flags().is_text() {
            entry.sub = None;
        }
        if let Some(sub) = entry.sub.as_deref_mut() {
            collapse(sub, solver)?;
        }
        simplified.push(entry);
    }

    // Pass 2
    let mut merged: Vec<ResultEntry> = Vec::with_capacity(simplified.len());
    let mut start = node.start;
    for entry in simplified {
        let entry_start = start;
        start = entry.end;
        push_merged(&mut merged, entry, entry_start, node);
    }

    // Pass 3
    let mut start = node.start;
    for entry in merged.iter_mut() {
        let entry_start = start;
        start = entry.end;
        let Some(second_stage) =
            entry.entry.as_ref().and_then(|e| e.second_stage_seq()).cloned()
        else {
            continue;
        };
        // If the second stage doesn't cover exactly the same span, the
        // first stage result is kept.
        if let Some(staged) = solver.match_span(&second_stage, entry_start, entry.end)? {
            if !entry.flags().is_text() {
                entry.sub = Some(Box::new(staged));
            }
        }
    }

    // Pass 4
    let mut flattened: Vec<ResultEntry> = Vec::with_capacity(merged.len());
    let mut start = node.start;
    for mut entry in merged {
        let entry_start = start;
        start = entry.end;
        let flags = entry.flags();
        let splice = match entry.sub.as_deref() {
            Some(sub) => {
                entry.is_anonymous()
                    || flags.flatten_all()
                    || (flags.flatten_single() && sub.len() == 1)
            }
            None => false,
        };
        if splice {
            if let Some(sub) = entry.sub.take() {
                let mut child_start = sub.start;
                for child in sub.entries {
                    let s = child_start;
                    child_start = child.end;
                    push_merged(&mut flattened, child, s, node);
                }
                continue;
            }
        }
        push_merged(&mut flattened, entry, entry_start, node);
    }

    node.entries = flattened;
    node.collapsed = true;

    Ok(())
}

/// Appends `entry`, which starts at `start`, to `entries`, merging it with
/// the last entry if possible.
fn push_merged(
    entries: &mut Vec<ResultEntry>,
    entry: ResultEntry,
    start: usize,
    node: &ParseResult,
) {
    let Some(last) = entries.last_mut() else {
        entries.push(entry);
        return;
    };

    if is_mergeable_leaf(last) && is_mergeable_leaf(&entry) {
        last.end = entry.end;
        return;
    }

    if last.flags().is_collective() && last.has_same_name_and_type(&entry) {
        let last_start = match entries.len() {
            1 => node.start,
            n => entries[n - 2].end,
        };
        // `entries` was borrowed for computing the start, borrow the last
        // entry again.
        if let Some(last) = entries.last_mut() {
            merge_collective(last, last_start, entry, start, node);
        }
        return;
    }

    entries.push(entry);
}

fn is_mergeable_leaf(entry: &ResultEntry) -> bool {
    entry.is_anonymous()
        && entry.sub.is_none()
        && entry.entry.as_ref().map_or(true, |e| e.second_stage_seq().is_none())
}

/// Merges `next` into `last`. The sub-result of the merged entry contains
/// the children of both.
fn merge_collective(
    last: &mut ResultEntry,
    last_start: usize,
    next: ResultEntry,
    next_start: usize,
    node: &ParseResult,
) {
    if last.sub.is_none() && next.sub.is_none() {
        last.end = next.end;
        return;
    }

    let text = node.text.clone();
    let mut sub = match last.sub.take() {
        Some(sub) => *sub,
        None => ParseResult::leaf(text.clone(), last_start, last.end),
    };
    let next_sub = match next.sub {
        Some(next_sub) => *next_sub,
        None => ParseResult::leaf(text, next_start, next.end),
    };

    let mut child_start = next_sub.start;
    let mut children = mem::take(&mut sub.entries);
    for child in next_sub.entries {
        let s = child_start;
        child_start = child.end;
        push_merged(&mut children, child, s, &sub);
    }

    sub.entries = children;
    sub.collapsed = true;
    last.sub = Some(Box::new(sub));
    last.end = next.end;
}
