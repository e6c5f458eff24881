// program.rs - Instruction set, compiled program, disassembly.
//
// Jump/Split/lookaround displacements are relative to the instruction
// immediately following the one that holds them. That convention makes
// every compiled fragment relocatable by plain concatenation, which is
// what lets the compiler build sub-expressions independently and splice
// them without a fixup pass.

use std::fmt;

use bitflags::bitflags;

use crate::classes::ClassSpec;

bitflags! {
    /// Compile-time option flags stored in the compiled [`Program`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Options: u32 {
        /// Fold case in every character comparison: literals, ranges and
        /// backreferences. Named categories are never folded.
        const CASE_INSENSITIVE = 1;
    }
}

/// Relative displacement, measured from the following instruction.
pub type Disp = isize;

/// One VM instruction.
///
/// Consuming instructions (`Char`, `Any`, `Class`, `NegClass`, `Backref`)
/// advance the string cursor on success; everything else is resolved
/// during epsilon-closure computation without consuming input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    /// Successful end of the program, or of a lookaround body.
    Match,
    /// Consume one character equal to the operand.
    Char(char),
    /// Consume any one character, including `\n`.
    Any,
    /// Consume one character contained in the class.
    Class(ClassSpec),
    /// Consume one character not contained in the class.
    NegClass(ClassSpec),
    /// Consume the text captured by `group`, one character per VM step;
    /// `reg` tracks how much of the captured span has been matched.
    Backref { group: usize, reg: usize },
    /// Start of text, or the position right after a `\n`.
    BeginLine,
    /// End of text, or a position holding a `\n`.
    EndLine,
    /// Start of text (`\A`).
    BeginText,
    /// End of text (`\z`).
    EndText,
    /// Word/non-word transition (`\b`).
    WordBoundary,
    /// Absence of a word/non-word transition (`\B`).
    NotWordBoundary,
    /// Record the current position in capture slot `0`.
    Save(usize),
    Jump(Disp),
    /// Branch; the first displacement is explored first during closure and
    /// therefore wins ties. Greedy/lazy and alternation preference are
    /// expressed purely through this ordering.
    Split(Disp, Disp),
    /// Zero-width assertion: run the body (which ends in its own `Match`)
    /// forward from the current position; on success continue at `onto`.
    Lookahead { body: Disp, onto: Disp },
    NegLookahead { body: Disp, onto: Disp },
    /// Same, scanning backward; the body is compiled in reverse term
    /// order so a forward walk of its instructions reads the subject
    /// right to left.
    Lookbehind { body: Disp, onto: Disp },
    NegLookbehind { body: Disp, onto: Disp },
    /// Zero a counter register.
    ResetCounter(usize),
    /// Bounded-repetition head: bumps `reg` on every arrival and decides,
    /// against `min`/`max`, whether the Split that always follows it must
    /// take its body arm, may choose, or must take its exit arm.
    /// `max == None` is an unbounded upper bound.
    Repeat {
        min: u32,
        max: Option<u32>,
        reg: usize,
    },
}

impl Inst {
    /// True if the instruction consumes input when it succeeds.
    pub fn is_consuming(&self) -> bool {
        matches!(
            self,
            Inst::Char(_) | Inst::Any | Inst::Class(_) | Inst::NegClass(_) | Inst::Backref { .. }
        )
    }
}

/// A compiled pattern: an ordered instruction list, immutable after
/// compilation, always terminated by exactly one `Match`. Instruction 0 is
/// the sole entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    insts: Vec<Inst>,
    groups: usize,
    counters: usize,
    options: Options,
}

impl Program {
    pub(crate) fn new(
        insts: Vec<Inst>,
        groups: usize,
        counters: usize,
        options: Options,
    ) -> Program {
        Program {
            insts,
            groups,
            counters,
            options,
        }
    }

    /// The instruction list.
    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Number of capturing groups, excluding the whole-match pseudo-group.
    pub fn group_count(&self) -> usize {
        self.groups
    }

    /// Number of counter registers the VM must allocate per execution.
    pub fn counter_count(&self) -> usize {
        self.counters
    }

    /// The flags the pattern was compiled with.
    pub fn options(&self) -> Options {
        self.options
    }

    /// The leading literal character, if the program opens with a plain
    /// `Char`. Used by search loops to skip ahead to the next candidate
    /// start position.
    pub fn first_literal(&self) -> Option<char> {
        match self.insts.first() {
            Some(&Inst::Char(c)) => Some(c),
            _ => None,
        }
    }
}

/// Printable form of a character in disassembly and class listings.
pub(crate) fn escape_char(c: char) -> String {
    match c {
        '\t' => "\\t".to_string(),
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\x07' => "\\a".to_string(),
        '\x0c' => "\\f".to_string(),
        '\x1b' => "\\e".to_string(),
        c if (' '..='~').contains(&c) => c.to_string(),
        c => format!("\\x{{{:x}}}", c as u32),
    }
}

/// Disassembly: one instruction per line, operation name plus operands.
/// Useful for tests and tooling; not a stability-guaranteed format.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inst in &self.insts {
            match inst {
                Inst::Match => writeln!(f, "match")?,
                Inst::Char(c) => writeln!(f, "char '{}'", escape_char(*c))?,
                Inst::Any => writeln!(f, "any")?,
                Inst::Class(spec) => writeln!(f, "cclass {}", spec)?,
                Inst::NegClass(spec) => writeln!(f, "ncclass {}", spec)?,
                Inst::Backref { group, reg } => writeln!(f, "backref \\{} %r{}", group, reg)?,
                Inst::BeginLine => writeln!(f, "bol")?,
                Inst::EndLine => writeln!(f, "eol")?,
                Inst::BeginText => writeln!(f, "bos")?,
                Inst::EndText => writeln!(f, "eos")?,
                Inst::WordBoundary => writeln!(f, "wordb")?,
                Inst::NotWordBoundary => writeln!(f, "nwordb")?,
                Inst::Save(slot) => writeln!(f, "save {}", slot)?,
                Inst::Jump(d) => writeln!(f, "jmp {}", d)?,
                Inst::Split(a, b) => writeln!(f, "split {},{}", a, b)?,
                Inst::Lookahead { body, onto } => writeln!(f, "lkahead {},{}", body, onto)?,
                Inst::NegLookahead { body, onto } => writeln!(f, "nlkahead {},{}", body, onto)?,
                Inst::Lookbehind { body, onto } => writeln!(f, "lkbehind {},{}", body, onto)?,
                Inst::NegLookbehind { body, onto } => writeln!(f, "nlkbehind {},{}", body, onto)?,
                Inst::ResetCounter(reg) => writeln!(f, "reset %r{}", reg)?,
                Inst::Repeat { min, max, reg } => match max {
                    Some(n) => writeln!(f, "repeat {},{} %r{}", min, n, reg)?,
                    None => writeln!(f, "repeat {},-1 %r{}", min, reg)?,
                },
            }
        }
        Ok(())
    }
}
