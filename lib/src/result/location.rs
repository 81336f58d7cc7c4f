use std::fmt::{Display, Formatter};

use crate::result::ParseResult;

/// A position in the source text, as 1-based row and column. Columns are
/// counted in characters.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Location {
    pub row: usize,
    pub col: usize,
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.row, self.col)
    }
}

impl ParseResult {
    /// Returns the row and column of `position` in the source text.
    ///
    /// Positions beyond the end of the text are clamped to the end.
    pub fn location_of(&self, position: usize) -> Location {
        let text = self.source();
        let position = floor_char_boundary(text, position);
        let before = &text[..position];
        let row = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let col = before[line_start..].chars().count() + 1;
        Location { row, col }
    }

    /// Describes `position` for humans: a line with the location, the
    /// previous source line if any, the current line and a line with a
    /// caret pointing to the position.
    pub fn location_string(&self, position: usize) -> String {
        let text = self.source();
        let position = floor_char_boundary(text, position);
        let location = self.location_of(position);

        let line_start = text[..position].rfind('\n').map_or(0, |i| i + 1);
        let line_end = text[position..].find('\n').map_or(text.len(), |i| position + i);
        let line = text[line_start..line_end].trim_end_matches('\r');

        let mut s = format!("at {}\n", location);

        if line_start > 0 {
            let prev_end = line_start - 1;
            let prev_start = text[..prev_end].rfind('\n').map_or(0, |i| i + 1);
            s.push_str(text[prev_start..prev_end].trim_end_matches('\r'));
            s.push('\n');
        }

        s.push_str(line);
        s.push('\n');

        // Tabs are kept in the caret line so it lines up with the text.
        for c in text[line_start..position].chars() {
            s.push(if c == '\t' { '\t' } else { ' ' });
        }
        s.push('^');
        s
    }
}

fn floor_char_boundary(text: &str, mut position: usize) -> usize {
    if position >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(position) {
        position -= 1;
    }
    position
}
