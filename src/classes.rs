// classes.rs - Character-class model and membership tests.
//
// A class body is an ordered sequence of alternatives (literals, inclusive
// ranges, named categories); membership is the OR of all alternatives.
// Polarity - plain vs negated class - lives in the instruction, applied
// once at the top, never per alternative.

use std::fmt;

use smallvec::SmallVec;

/// The twelve named character categories reachable as `[:name:]` or, for
/// `digit`/`space`/`word`, as the `\d`/`\s`/`\w` shorthands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedClass {
    Alnum,
    Alpha,
    Blank,
    Cntrl,
    Digit,
    Graph,
    Lower,
    Print,
    Space,
    Upper,
    Xdigit,
    Word,
}

/// POSIX name table, written once at module scope and read-only after.
static POSIX_NAMES: [(&str, NamedClass); 12] = [
    ("alnum", NamedClass::Alnum),
    ("alpha", NamedClass::Alpha),
    ("blank", NamedClass::Blank),
    ("cntrl", NamedClass::Cntrl),
    ("digit", NamedClass::Digit),
    ("graph", NamedClass::Graph),
    ("lower", NamedClass::Lower),
    ("print", NamedClass::Print),
    ("space", NamedClass::Space),
    ("upper", NamedClass::Upper),
    ("xdigit", NamedClass::Xdigit),
    ("word", NamedClass::Word),
];

impl NamedClass {
    /// Look up a class by its POSIX name as written in `[:name:]`.
    pub fn from_posix_name(name: &str) -> Option<NamedClass> {
        POSIX_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, c)| c)
    }

    /// The POSIX name of this category.
    pub fn name(self) -> &'static str {
        match self {
            NamedClass::Alnum => "alnum",
            NamedClass::Alpha => "alpha",
            NamedClass::Blank => "blank",
            NamedClass::Cntrl => "cntrl",
            NamedClass::Digit => "digit",
            NamedClass::Graph => "graph",
            NamedClass::Lower => "lower",
            NamedClass::Print => "print",
            NamedClass::Space => "space",
            NamedClass::Upper => "upper",
            NamedClass::Xdigit => "xdigit",
            NamedClass::Word => "word",
        }
    }

    /// Membership test. Named categories are case-complete: the character
    /// is tested as written, never folded.
    pub fn contains(self, c: char) -> bool {
        match self {
            NamedClass::Alnum => c.is_alphanumeric(),
            NamedClass::Alpha => c.is_alphabetic(),
            NamedClass::Blank => c == ' ' || c == '\t',
            NamedClass::Cntrl => c.is_control(),
            NamedClass::Digit => c.is_ascii_digit(),
            NamedClass::Graph => !c.is_control() && !c.is_whitespace(),
            NamedClass::Lower => c.is_lowercase(),
            NamedClass::Print => !c.is_control(),
            NamedClass::Space => c.is_whitespace(),
            NamedClass::Upper => c.is_uppercase(),
            NamedClass::Xdigit => c.is_ascii_hexdigit(),
            NamedClass::Word => is_word_char(c),
        }
    }
}

/// One alternative in a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassItem {
    /// A literal character member.
    Literal(char),
    /// An inclusive range `from-to`; the compiler guarantees `from <= to`.
    Range(char, char),
    /// A named category, as in `[:digit:]` or `\d`.
    Named(NamedClass),
    /// A negated named category, as in `[:^digit:]` or `\D`.
    NegNamed(NamedClass),
}

impl ClassItem {
    fn matches(&self, c: char, fold: bool) -> bool {
        match *self {
            ClassItem::Literal(m) => chars_equal(m, c, fold),
            ClassItem::Range(from, to) => {
                if fold {
                    let c = fold_char(c);
                    fold_char(from) <= c && c <= fold_char(to)
                } else {
                    from <= c && c <= to
                }
            }
            ClassItem::Named(nc) => nc.contains(c),
            ClassItem::NegNamed(nc) => !nc.contains(c),
        }
    }
}

/// Compiled body of a bracket expression: the ordered alternatives of a
/// `Class`/`NegClass` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSpec {
    items: SmallVec<[ClassItem; 4]>,
}

impl ClassSpec {
    pub(crate) fn new(items: impl IntoIterator<Item = ClassItem>) -> ClassSpec {
        ClassSpec {
            items: items.into_iter().collect(),
        }
    }

    /// The alternatives, in pattern order.
    pub fn items(&self) -> &[ClassItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True if any alternative matches `c`. With `fold`, literal and range
    /// comparisons are case-folded; named categories are not.
    pub fn contains(&self, c: char, fold: bool) -> bool {
        self.items.iter().any(|item| item.matches(c, fold))
    }
}

impl fmt::Display for ClassSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match *item {
                ClassItem::Literal(c) => write!(f, "'{}'", crate::program::escape_char(c))?,
                ClassItem::Range(from, to) => write!(
                    f,
                    "'{}'-'{}'",
                    crate::program::escape_char(from),
                    crate::program::escape_char(to)
                )?,
                ClassItem::Named(nc) => write!(f, "[:{}:]", nc.name())?,
                ClassItem::NegNamed(nc) => write!(f, "[:^{}:]", nc.name())?,
            }
        }
        Ok(())
    }
}

/// Word character for `\b`/`\B` and the `word` category.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Simple one-to-one case fold used for insensitive comparison.
pub(crate) fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Character equality, optionally case-folded on both operands.
pub(crate) fn chars_equal(a: char, b: char, fold: bool) -> bool {
    a == b || (fold && fold_char(a) == fold_char(b))
}
