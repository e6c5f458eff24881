// compile.rs - Recursive-descent pattern compiler.
//
// Grammar:
//
//   alt    := cat ('|' cat)*
//   cat    := term*
//   term   := factor ('?' | '*' | '+' | '{m,n}')? '?'?     trailing '?' = lazy
//   factor := group | class | '.' | '^' | '$' | escape | literal
//   group  := '(' ('?:' | '?=' | '?!' | '?<=' | '?<!' | '?#'comment)? alt ')'
//   class  := '[' '^'? classitem+ ']'
//
// Each production returns a relocatable fragment of instructions; because
// displacements are relative, fragments concatenate without fixups. The
// only deferred patching is the end-jump chain of an alternation.
//
// Capture-group numbers and counter registers are allocated as side
// effects of the walk: groups in opening-paren order, one register per
// bounded repetition or backreference encountered.
//
// `{` begins a bounded repetition only when it directly follows a factor
// and a decimal digit follows it; any other `{` or `}` is a literal. Once
// digits have been seen the bounds must be well-formed or compilation
// fails.

use crate::classes::{ClassItem, ClassSpec, NamedClass};
use crate::error::Error;
use crate::program::{Inst, Options, Program};

/// Compile `pattern` into an executable [`Program`].
pub fn compile(pattern: &str, options: Options) -> Result<Program, Error> {
    let mut c = Compiler {
        cur: Cursor::new(pattern),
        groups: 0,
        counters: 0,
        backrefs: Vec::new(),
    };
    let mut insts = c.alt(false)?;
    if !c.cur.at_end() {
        // a stray ')' is the only way alt stops early
        return Err(Error::UnterminatedGroup { pos: c.cur.pos });
    }
    insts.push(Inst::Match);
    for &(group, pos) in &c.backrefs {
        if group > c.groups {
            return Err(Error::InvalidBackref { pos, group });
        }
    }
    Ok(Program::new(insts, c.groups, c.counters, options))
}

/// Lexical cursor over the pattern: stateless beyond its position.
struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

impl Cursor {
    fn new(pattern: &str) -> Cursor {
        Cursor {
            chars: pattern.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    /// Consume `c` if it is next.
    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        s.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }
}

enum LookKind {
    Ahead,
    NegAhead,
    Behind,
    NegBehind,
}

struct Compiler {
    cur: Cursor,
    groups: usize,
    counters: usize,
    /// Backreference numbers with the offset where each appeared, checked
    /// against the final group count once the whole pattern is parsed.
    backrefs: Vec<(usize, usize)>,
}

impl Compiler {
    /// `alt := cat ('|' cat)*`. Every arm but the last compiles to
    /// `Split(0, len+1)`, the arm, and a deferred jump to the end; arms
    /// are therefore tried left to right, and the leftmost wins ties.
    fn alt(&mut self, rev: bool) -> Result<Vec<Inst>, Error> {
        let mut out = Vec::new();
        let mut patches = Vec::new();
        let mut lhs = self.cat(rev)?;
        while self.cur.eat('|') {
            let rhs = self.cat(rev)?;
            if lhs.is_empty() && rhs.is_empty() {
                continue;
            }
            out.push(Inst::Split(0, lhs.len() as isize + 1));
            out.extend(lhs);
            patches.push(out.len());
            out.push(Inst::Jump(0));
            lhs = rhs;
        }
        out.extend(lhs);
        let end = out.len();
        for p in patches {
            if let Inst::Jump(d) = &mut out[p] {
                *d = (end - p - 1) as isize;
            }
        }
        Ok(out)
    }

    /// `cat := term*`. Inside a lookbehind body (`rev`) the terms are
    /// concatenated in reverse so the backward-scanning sub-VM reads them
    /// in pattern order.
    fn cat(&mut self, rev: bool) -> Result<Vec<Inst>, Error> {
        let mut frags = Vec::new();
        loop {
            match self.cur.peek() {
                None | Some('|') | Some(')') => break,
                _ => frags.push(self.term(rev)?),
            }
        }
        if rev {
            frags.reverse();
        }
        Ok(frags.concat())
    }

    /// `term := factor quantifier?`. Greedy/lazy is expressed purely by
    /// which Split displacement is listed first.
    fn term(&mut self, rev: bool) -> Result<Vec<Inst>, Error> {
        let pos = self.cur.pos;
        if matches!(self.cur.peek(), Some('?' | '*' | '+')) {
            return Err(Error::DanglingQuantifier { pos });
        }
        let mut lhs = self.factor(rev)?;
        match self.cur.peek() {
            Some(q @ ('?' | '*' | '+')) => {
                self.cur.bump();
                let greedy = !self.cur.eat('?');
                let n = lhs.len() as isize;
                match q {
                    '?' => {
                        let split = if greedy {
                            Inst::Split(0, n)
                        } else {
                            Inst::Split(n, 0)
                        };
                        lhs.insert(0, split);
                    }
                    '*' => {
                        let split = if greedy {
                            Inst::Split(0, n + 1)
                        } else {
                            Inst::Split(n + 1, 0)
                        };
                        lhs.insert(0, split);
                        lhs.push(Inst::Jump(-(n + 2)));
                    }
                    _ => {
                        let split = if greedy {
                            Inst::Split(-(n + 1), 0)
                        } else {
                            Inst::Split(0, -(n + 1))
                        };
                        lhs.push(split);
                    }
                }
            }
            Some('{') if self.cur.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => {
                let bpos = self.cur.pos;
                let (min, max) = self.bounds(bpos)?;
                let greedy = !self.cur.eat('?');
                let reg = self.counters;
                self.counters += 1;
                let n = lhs.len() as isize;
                let split = if greedy {
                    Inst::Split(0, n + 1)
                } else {
                    Inst::Split(n + 1, 0)
                };
                let mut out = Vec::with_capacity(lhs.len() + 4);
                out.push(Inst::ResetCounter(reg));
                out.push(Inst::Repeat { min, max, reg });
                out.push(split);
                out.extend(lhs);
                out.push(Inst::Jump(-(n + 3)));
                lhs = out;
            }
            _ => {}
        }
        Ok(lhs)
    }

    /// Parse `{m}`, `{m,}` or `{m,n}`; the cursor sits on `{` and a digit
    /// is known to follow.
    fn bounds(&mut self, pos: usize) -> Result<(u32, Option<u32>), Error> {
        self.cur.bump(); // '{'
        let min = self
            .digits(10, usize::MAX, 1)
            .ok_or(Error::InvalidRepeat { pos })?;
        let max = if self.cur.eat('}') {
            Some(min)
        } else if self.cur.eat(',') {
            let max = if self.cur.peek() != Some('}') {
                Some(
                    self.digits(10, usize::MAX, 1)
                        .ok_or(Error::InvalidRepeat { pos })?,
                )
            } else {
                None
            };
            if !self.cur.eat('}') {
                return Err(Error::InvalidRepeat { pos });
            }
            max
        } else {
            return Err(Error::InvalidRepeat { pos });
        };
        if let Some(n) = max {
            if n < 1 || min > n {
                return Err(Error::InvalidRepeat { pos });
            }
        }
        Ok((min, max))
    }

    fn factor(&mut self, rev: bool) -> Result<Vec<Inst>, Error> {
        let pos = self.cur.pos;
        match self.cur.peek() {
            Some('(') => self.group(rev),
            Some('[') => Ok(vec![self.class()?]),
            Some('.') => {
                self.cur.bump();
                Ok(vec![Inst::Any])
            }
            Some('^') => {
                self.cur.bump();
                Ok(vec![Inst::BeginLine])
            }
            Some('$') => {
                self.cur.bump();
                Ok(vec![Inst::EndLine])
            }
            Some('\\') => self.escaped_factor(),
            Some(c) if is_pattern_control(c) => Err(Error::ControlCharacter { pos }),
            Some(c) => {
                self.cur.bump();
                Ok(vec![Inst::Char(c)])
            }
            None => Err(Error::UnterminatedGroup { pos }),
        }
    }

    fn group(&mut self, rev: bool) -> Result<Vec<Inst>, Error> {
        let open = self.cur.pos;
        self.cur.bump(); // '('
        if self.cur.eat('?') {
            if self.cur.eat(':') {
                let body = self.alt(rev)?;
                self.close_group(open)?;
                return Ok(body);
            }
            if self.cur.eat('=') {
                return self.lookaround(LookKind::Ahead, open);
            }
            if self.cur.eat('!') {
                return self.lookaround(LookKind::NegAhead, open);
            }
            if self.cur.eat('#') {
                self.comment(open)?;
                return Ok(Vec::new());
            }
            if self.cur.eat('<') {
                if self.cur.eat('=') {
                    return self.lookaround(LookKind::Behind, open);
                }
                if self.cur.eat('!') {
                    return self.lookaround(LookKind::NegBehind, open);
                }
            }
            return Err(Error::UnknownGroup { pos: open });
        }
        // capturing group: number allocated before the body compiles
        self.groups += 1;
        let g = self.groups;
        let body = self.alt(rev)?;
        self.close_group(open)?;
        let mut out = Vec::with_capacity(body.len() + 2);
        if rev {
            // backward scan reaches the group's end first
            out.push(Inst::Save(2 * g + 1));
            out.extend(body);
            out.push(Inst::Save(2 * g));
        } else {
            out.push(Inst::Save(2 * g));
            out.extend(body);
            out.push(Inst::Save(2 * g + 1));
        }
        Ok(out)
    }

    fn close_group(&mut self, open: usize) -> Result<(), Error> {
        if self.cur.eat(')') {
            Ok(())
        } else {
            Err(Error::UnterminatedGroup { pos: open })
        }
    }

    /// A lookbehind body compiles with reversed concatenation so the
    /// sub-VM's backward scan reads it in pattern order; a lookahead body
    /// always compiles forward, whatever the enclosing mode.
    fn lookaround(&mut self, kind: LookKind, open: usize) -> Result<Vec<Inst>, Error> {
        let rev_body = matches!(kind, LookKind::Behind | LookKind::NegBehind);
        let mut body = self.alt(rev_body)?;
        self.close_group(open)?;
        body.push(Inst::Match);
        let onto = body.len() as isize;
        let head = match kind {
            LookKind::Ahead => Inst::Lookahead { body: 0, onto },
            LookKind::NegAhead => Inst::NegLookahead { body: 0, onto },
            LookKind::Behind => Inst::Lookbehind { body: 0, onto },
            LookKind::NegBehind => Inst::NegLookbehind { body: 0, onto },
        };
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(head);
        out.extend(body);
        Ok(out)
    }

    /// Skip a `(?#...)` comment body. Nested parens and bracket
    /// expressions are honored so a comment may contain literal `(` or
    /// `[`.
    fn comment(&mut self, open: usize) -> Result<(), Error> {
        let mut depth = 0usize;
        loop {
            match self.cur.bump() {
                None => return Err(Error::UnterminatedGroup { pos: open }),
                Some(')') if depth == 0 => return Ok(()),
                Some(')') => depth -= 1,
                Some('(') => depth += 1,
                Some('\\') => {
                    self.cur.bump();
                }
                Some('[') => self.skip_bracket(open)?,
                _ => {}
            }
        }
    }

    fn skip_bracket(&mut self, open: usize) -> Result<(), Error> {
        self.cur.eat('^');
        self.cur.eat(']'); // leading ']' is a literal member
        loop {
            match self.cur.bump() {
                None => return Err(Error::UnterminatedGroup { pos: open }),
                Some(']') => return Ok(()),
                Some('\\') => {
                    self.cur.bump();
                }
                _ => {}
            }
        }
    }

    /// `class := '[' '^'? classitem+ ']'`. A `]` directly after the
    /// opening marker is a literal member; `-` is literal at either end
    /// of the body, a range operator anywhere else.
    fn class(&mut self) -> Result<Inst, Error> {
        let open = self.cur.pos;
        self.cur.bump(); // '['
        let negated = self.cur.eat('^');
        let mut items: Vec<ClassItem> = Vec::new();
        let mut first = true;
        loop {
            match self.cur.peek() {
                None => return Err(Error::UnterminatedClass { pos: open }),
                Some(']') if !first => {
                    self.cur.bump();
                    break;
                }
                _ => {}
            }
            first = false;
            if self.cur.starts_with("[:") {
                items.push(self.posix_item()?);
                continue;
            }
            if self.cur.peek() == Some('\\') {
                if let Some(item) = self.cur.peek_at(1).and_then(class_shorthand) {
                    self.cur.bump();
                    self.cur.bump();
                    items.push(item);
                    continue;
                }
            }
            let from = self.class_char()?;
            let range_op = self.cur.peek() == Some('-')
                && self.cur.peek_at(1).is_some()
                && self.cur.peek_at(1) != Some(']');
            if range_op {
                self.cur.bump(); // '-'
                let hi_pos = self.cur.pos;
                if self.cur.peek() == Some('\\')
                    && self.cur.peek_at(1).and_then(class_shorthand).is_some()
                {
                    return Err(Error::InvalidRange { pos: hi_pos });
                }
                let to = self.class_char()?;
                if from > to {
                    return Err(Error::InvalidRange { pos: hi_pos });
                }
                items.push(ClassItem::Range(from, to));
            } else {
                items.push(ClassItem::Literal(from));
            }
        }
        let spec = ClassSpec::new(items);
        Ok(if negated {
            Inst::NegClass(spec)
        } else {
            Inst::Class(spec)
        })
    }

    /// `[:name:]` or `[:^name:]`.
    fn posix_item(&mut self) -> Result<ClassItem, Error> {
        let start = self.cur.pos;
        self.cur.bump();
        self.cur.bump(); // "[:"
        let neg = self.cur.eat('^');
        let mut name = String::new();
        while let Some(c) = self.cur.peek() {
            if c.is_ascii_lowercase() {
                name.push(c);
                self.cur.bump();
            } else {
                break;
            }
        }
        if !(self.cur.eat(':') && self.cur.eat(']')) {
            return Err(Error::UnterminatedClass { pos: start });
        }
        let nc = NamedClass::from_posix_name(&name)
            .ok_or(Error::UnknownClassName { pos: start, name })?;
        Ok(if neg {
            ClassItem::NegNamed(nc)
        } else {
            ClassItem::Named(nc)
        })
    }

    /// One member character inside a class, escapes resolved.
    fn class_char(&mut self) -> Result<char, Error> {
        let pos = self.cur.pos;
        match self.cur.bump() {
            None => Err(Error::UnterminatedClass { pos }),
            Some('\\') => self.escape_char(pos),
            Some(c) if is_pattern_control(c) => Err(Error::ControlCharacter { pos }),
            Some(c) => Ok(c),
        }
    }

    /// An escaped factor: anchor, shorthand class, backreference, or a
    /// single (possibly numeric) escaped character.
    fn escaped_factor(&mut self) -> Result<Vec<Inst>, Error> {
        let pos = self.cur.pos;
        self.cur.bump(); // '\\'
        match self.cur.peek() {
            Some('A') => {
                self.cur.bump();
                Ok(vec![Inst::BeginText])
            }
            Some('z') => {
                self.cur.bump();
                Ok(vec![Inst::EndText])
            }
            Some('b') => {
                self.cur.bump();
                Ok(vec![Inst::WordBoundary])
            }
            Some('B') => {
                self.cur.bump();
                Ok(vec![Inst::NotWordBoundary])
            }
            Some(c) if class_shorthand(c).is_some() => {
                self.cur.bump();
                let item = class_shorthand(c).ok_or(Error::InvalidEscape { pos })?;
                Ok(vec![Inst::Class(ClassSpec::new([item]))])
            }
            Some(c @ '1'..='9') => {
                self.cur.bump();
                let group = c as usize - '0' as usize;
                self.backrefs.push((group, pos));
                let reg = self.counters;
                self.counters += 1;
                Ok(vec![Inst::ResetCounter(reg), Inst::Backref { group, reg }])
            }
            _ => {
                let ch = self.escape_char(pos)?;
                Ok(vec![Inst::Char(ch)])
            }
        }
    }

    /// Resolve the tail of an escape sequence; the backslash is already
    /// consumed. Control names, `\0` octal, `\xHH`, `\x{...}`, `\uHHHH`,
    /// `\UHHHHHHHH`, `\cX`, and identity escapes of printable characters.
    fn escape_char(&mut self, pos: usize) -> Result<char, Error> {
        let value = match self.cur.bump() {
            None => return Err(Error::InvalidEscape { pos }),
            Some('a') => 0x07,
            Some('e') => 0x1b,
            Some('f') => 0x0c,
            Some('n') => '\n' as u32,
            Some('r') => '\r' as u32,
            Some('t') => '\t' as u32,
            Some('v') => 0x0b,
            Some('0') => self.digits(8, 2, 0).ok_or(Error::InvalidEscape { pos })?,
            Some('x') => {
                if self.cur.eat('{') {
                    let v = self.digits(16, 8, 1).ok_or(Error::InvalidEscape { pos })?;
                    if !self.cur.eat('}') {
                        return Err(Error::InvalidEscape { pos });
                    }
                    v
                } else {
                    self.digits(16, 2, 1).ok_or(Error::InvalidEscape { pos })?
                }
            }
            Some('u') => self.digits(16, 4, 4).ok_or(Error::InvalidEscape { pos })?,
            Some('U') => self.digits(16, 8, 8).ok_or(Error::InvalidEscape { pos })?,
            Some('c') => match self.cur.bump() {
                Some(x) if x.is_ascii() => (x.to_ascii_uppercase() as u32) & 0x1f,
                _ => return Err(Error::InvalidEscape { pos }),
            },
            Some(c) if !is_pattern_control(c) => c as u32,
            Some(_) => return Err(Error::InvalidEscape { pos }),
        };
        char::from_u32(value).ok_or(Error::InvalidEscape { pos })
    }

    /// Accumulate between `min` and `max` digits of the given base.
    /// Returns `None` when fewer than `min` digits are present or the
    /// value overflows.
    fn digits(&mut self, base: u32, max: usize, min: usize) -> Option<u32> {
        let mut n: u32 = 0;
        let mut len = 0;
        while len < max {
            match self.cur.peek().and_then(|c| c.to_digit(base)) {
                Some(d) => {
                    n = n.checked_mul(base)?.checked_add(d)?;
                    self.cur.bump();
                    len += 1;
                }
                None => break,
            }
        }
        if len < min {
            None
        } else {
            Some(n)
        }
    }
}

fn is_pattern_control(c: char) -> bool {
    (c as u32) < 0x20 || c as u32 == 0x7f
}

fn class_shorthand(c: char) -> Option<ClassItem> {
    match c {
        'd' => Some(ClassItem::Named(NamedClass::Digit)),
        'D' => Some(ClassItem::NegNamed(NamedClass::Digit)),
        's' => Some(ClassItem::Named(NamedClass::Space)),
        'S' => Some(ClassItem::NegNamed(NamedClass::Space)),
        'w' => Some(ClassItem::Named(NamedClass::Word)),
        'W' => Some(ClassItem::NegNamed(NamedClass::Word)),
        _ => None,
    }
}
