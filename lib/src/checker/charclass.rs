use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

/// Character classes with a name.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Predefined {
    Digit,
    Alpha,
    Alnum,
    /// Alphanumeric characters plus underscore.
    Word,
    Space,
    Blank,
    Upper,
    Lower,
    Punct,
    HexDigit,
    Newline,
}

lazy_static! {
    /// Maps the names accepted by [`CharClass::predefined`] to the
    /// corresponding class.
    static ref PREDEFINED: HashMap<&'static str, Predefined> = {
        let mut m = HashMap::new();
        m.insert("Digit", Predefined::Digit);
        m.insert("Alpha", Predefined::Alpha);
        m.insert("Alphabet", Predefined::Alpha);
        m.insert("Alnum", Predefined::Alnum);
        m.insert("AlphabetAndDigit", Predefined::Alnum);
        m.insert("Word", Predefined::Word);
        m.insert("Space", Predefined::Space);
        m.insert("WhiteSpace", Predefined::Space);
        m.insert("Blank", Predefined::Blank);
        m.insert("Upper", Predefined::Upper);
        m.insert("UpperCaseAlphabet", Predefined::Upper);
        m.insert("Lower", Predefined::Lower);
        m.insert("LowerCaseAlphabet", Predefined::Lower);
        m.insert("Punct", Predefined::Punct);
        m.insert("HexDigit", Predefined::HexDigit);
        m.insert("Newline", Predefined::Newline);
        m
    };
}

impl Predefined {
    fn contains(&self, c: char) -> bool {
        match self {
            Predefined::Digit => c.is_ascii_digit(),
            Predefined::Alpha => c.is_alphabetic(),
            Predefined::Alnum => c.is_alphanumeric(),
            Predefined::Word => c.is_alphanumeric() || c == '_',
            Predefined::Space => c.is_whitespace(),
            Predefined::Blank => c == ' ' || c == '\t',
            Predefined::Upper => c.is_uppercase(),
            Predefined::Lower => c.is_lowercase(),
            Predefined::Punct => c.is_ascii_punctuation(),
            Predefined::HexDigit => c.is_ascii_hexdigit(),
            Predefined::Newline => c == '\n' || c == '\r',
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Predefined::Digit => "Digit",
            Predefined::Alpha => "Alpha",
            Predefined::Alnum => "Alnum",
            Predefined::Word => "Word",
            Predefined::Space => "Space",
            Predefined::Blank => "Blank",
            Predefined::Upper => "Upper",
            Predefined::Lower => "Lower",
            Predefined::Punct => "Punct",
            Predefined::HexDigit => "HexDigit",
            Predefined::Newline => "Newline",
        }
    }
}

/// A predicate over a single character.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CharClass {
    /// Any character. This is the catch-all class.
    Any,
    Char(char),
    /// Inclusive range.
    Range(char, char),
    /// Any of the characters in the string.
    Set(String),
    Union(Vec<CharClass>),
    Complement(Box<CharClass>),
    Predefined(Predefined),
}

impl CharClass {
    /// Returns the predefined class with the given name, if any.
    pub fn predefined(name: &str) -> Option<Self> {
        PREDEFINED.get(name).map(|p| CharClass::Predefined(*p))
    }

    /// Returns a class that matches any character not in `self`.
    pub fn complement(self) -> Self {
        match self {
            CharClass::Complement(inner) => *inner,
            other => CharClass::Complement(Box::new(other)),
        }
    }

    pub fn contains(&self, c: char) -> bool {
        match self {
            CharClass::Any => true,
            CharClass::Char(x) => *x == c,
            CharClass::Range(lo, hi) => *lo <= c && c <= *hi,
            CharClass::Set(s) => s.contains(c),
            CharClass::Union(classes) => classes.iter().any(|cc| cc.contains(c)),
            CharClass::Complement(inner) => !inner.contains(c),
            CharClass::Predefined(p) => p.contains(c),
        }
    }

    /// Returns the length in bytes of the character at `offset` if it
    /// belongs to this class.
    #[inline]
    pub fn match_at(&self, text: &str, offset: usize) -> Option<usize> {
        let c = text.get(offset..)?.chars().next()?;
        if self.contains(c) {
            Some(c.len_utf8())
        } else {
            None
        }
    }
}

impl Display for CharClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CharClass::Any => write!(f, "."),
            CharClass::Char(c) => write!(f, "{}", c.escape_debug()),
            CharClass::Range(lo, hi) => {
                write!(f, "[{}-{}]", lo.escape_debug(), hi.escape_debug())
            }
            CharClass::Set(s) => write!(f, "[{}]", s.escape_debug()),
            CharClass::Union(classes) => {
                write!(f, "[")?;
                for cc in classes {
                    write!(f, "{}", cc)?;
                }
                write!(f, "]")
            }
            CharClass::Complement(inner) => write!(f, "[^{}]", inner),
            CharClass::Predefined(p) => write!(f, "${}", p.name()),
        }
    }
}
