// error.rs - Error type for pattern compilation.
//
// Every variant carries the pattern offset (in characters) the compiler
// had reached when it gave up. Compilation does not attempt recovery or
// multiple-error reporting; the first problem wins.

use std::fmt;

/// Error produced when a pattern fails to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A group was opened but never closed, or a stray `)` appeared.
    UnterminatedGroup { pos: usize },
    /// A `(?` group whose kind marker is not one of `:`, `=`, `!`, `<=`,
    /// `<!`, `#`.
    UnknownGroup { pos: usize },
    /// A character class was opened but never closed.
    UnterminatedClass { pos: usize },
    /// An escape sequence the compiler does not recognize, including a
    /// trailing backslash and out-of-range numeric escapes.
    InvalidEscape { pos: usize },
    /// Bounded repetition with malformed digits, `m > n`, or `n < 1`.
    InvalidRepeat { pos: usize },
    /// A class range whose start is greater than its end.
    InvalidRange { pos: usize },
    /// `[:name:]` with a POSIX class name this engine does not know.
    UnknownClassName { pos: usize, name: String },
    /// A quantifier with no operand to its left.
    DanglingQuantifier { pos: usize },
    /// A backreference to a group the pattern does not define.
    InvalidBackref { pos: usize, group: usize },
    /// An unescaped control character (codes 0-31, 127) in text position.
    ControlCharacter { pos: usize },
}

impl Error {
    /// The character offset in the pattern where the error was detected.
    pub fn pos(&self) -> usize {
        match *self {
            Error::UnterminatedGroup { pos }
            | Error::UnknownGroup { pos }
            | Error::UnterminatedClass { pos }
            | Error::InvalidEscape { pos }
            | Error::InvalidRepeat { pos }
            | Error::InvalidRange { pos }
            | Error::UnknownClassName { pos, .. }
            | Error::DanglingQuantifier { pos }
            | Error::InvalidBackref { pos, .. }
            | Error::ControlCharacter { pos } => pos,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnterminatedGroup { pos } => {
                write!(f, "unterminated or unbalanced group at offset {}", pos)
            }
            Error::UnknownGroup { pos } => {
                write!(f, "unknown group kind at offset {}", pos)
            }
            Error::UnterminatedClass { pos } => {
                write!(f, "unterminated character class at offset {}", pos)
            }
            Error::InvalidEscape { pos } => {
                write!(f, "invalid escape sequence at offset {}", pos)
            }
            Error::InvalidRepeat { pos } => {
                write!(f, "invalid repetition bounds at offset {}", pos)
            }
            Error::InvalidRange { pos } => {
                write!(f, "invalid class range at offset {}", pos)
            }
            Error::UnknownClassName { pos, name } => {
                write!(f, "unknown class name [:{}:] at offset {}", name, pos)
            }
            Error::DanglingQuantifier { pos } => {
                write!(f, "quantifier with no operand at offset {}", pos)
            }
            Error::InvalidBackref { pos, group } => {
                write!(f, "backreference \\{} to undefined group at offset {}", group, pos)
            }
            Error::ControlCharacter { pos } => {
                write!(f, "unescaped control character at offset {}", pos)
            }
        }
    }
}

impl std::error::Error for Error {}
