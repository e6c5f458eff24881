// api.rs - Public matching surface over the compiler and the VM.
//
// The VM works in character positions over a decoded subject; this layer
// owns the decode, maps every reported position back to byte offsets in
// the original `&str`, and drives the unanchored search loop. When a
// pattern opens with a plain ASCII literal and case folding is off, the
// search loop skips ahead with `memchr` instead of probing every
// position.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use smallvec::SmallVec;

use crate::compile::compile;
use crate::error::Error;
use crate::program::{Options, Program};
use crate::vm;

/// A compiled regular expression.
///
/// ```
/// use lockstep::Regex;
///
/// let re = Regex::new(r"(\w+)@(\w+)")?;
/// let caps = re.captures("mail me at kim@example").unwrap();
/// assert_eq!(caps.get(1).unwrap().as_str(), "kim");
/// assert_eq!(caps.get(2).unwrap().as_str(), "example");
/// # Ok::<(), lockstep::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Regex {
    program: Program,
    pattern: String,
    /// First byte to hunt for with `memchr` before running the VM.
    prefilter: Option<u8>,
}

impl Regex {
    /// Compile `pattern` with default options.
    pub fn new(pattern: &str) -> Result<Regex, Error> {
        Regex::with_options(pattern, Options::empty())
    }

    /// Compile `pattern` with explicit option flags.
    pub fn with_options(pattern: &str, options: Options) -> Result<Regex, Error> {
        let program = compile(pattern, options)?;
        let prefilter = match program.first_literal() {
            Some(c) if c.is_ascii() && !options.contains(Options::CASE_INSENSITIVE) => {
                Some(c as u8)
            }
            _ => None,
        };
        Ok(Regex {
            program,
            pattern: pattern.to_string(),
            prefilter,
        })
    }

    /// Start building a regex with non-default options.
    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder {
            pattern: pattern.to_string(),
            options: Options::empty(),
        }
    }

    /// The pattern string this regex was compiled from.
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// The option flags in effect.
    pub fn options(&self) -> Options {
        self.program.options()
    }

    /// The compiled program, mainly for disassembly.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Number of capture slots addressable through [`Captures::get`]:
    /// the capturing groups plus the whole-match pseudo-group `0`.
    pub fn captures_len(&self) -> usize {
        self.program.group_count() + 1
    }

    /// True if the pattern matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        let subj = Subject::new(text);
        self.search(&subj, 0).is_some()
    }

    /// Leftmost match, byte-addressed.
    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        let subj = Subject::new(text);
        let (start, m) = self.search(&subj, 0)?;
        Some(Match {
            text,
            start: subj.byte_at(start),
            end: subj.byte_at(m.end),
        })
    }

    /// Leftmost match with all capture groups.
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        let subj = Subject::new(text);
        let (_, m) = self.search(&subj, 0)?;
        let slots = m
            .slots
            .iter()
            .map(|s| s.map(|pos| subj.byte_at(pos)))
            .collect();
        Some(Captures { text, slots })
    }

    /// Iterator over non-overlapping matches, leftmost first.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> FindIter<'r, 't> {
        FindIter {
            re: self,
            subj: Subject::new(text),
            at: 0,
        }
    }

    /// Try successive start positions until the anchored VM run succeeds.
    fn search(&self, subj: &Subject<'_>, from: usize) -> Option<(usize, vm::MatchState)> {
        let mut at = from;
        while at <= subj.len() {
            if let Some(b) = self.prefilter {
                let offset = subj.byte_at(at);
                match memchr::memchr(b, &subj.text.as_bytes()[offset..]) {
                    Some(found) => at = subj.char_at(offset + found),
                    None => return None,
                }
            }
            if let Some(m) = vm::run_at(&self.program, &subj.chars, at) {
                return Some((at, m));
            }
            at += 1;
        }
        None
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl FromStr for Regex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Regex, Error> {
        Regex::new(s)
    }
}

/// Builder for a [`Regex`] with non-default options.
#[derive(Debug, Clone)]
pub struct RegexBuilder {
    pattern: String,
    options: Options,
}

impl RegexBuilder {
    /// Fold case in literals, ranges and backreferences.
    pub fn case_insensitive(mut self, yes: bool) -> RegexBuilder {
        self.options.set(Options::CASE_INSENSITIVE, yes);
        self
    }

    pub fn build(self) -> Result<Regex, Error> {
        Regex::with_options(&self.pattern, self.options)
    }
}

/// The decoded subject: characters plus the byte offset of each, with a
/// trailing sentinel so position `len` maps to `text.len()`.
struct Subject<'t> {
    text: &'t str,
    chars: Vec<char>,
    offsets: Vec<usize>,
}

impl<'t> Subject<'t> {
    fn new(text: &'t str) -> Subject<'t> {
        let mut chars = Vec::with_capacity(text.len());
        let mut offsets = Vec::with_capacity(text.len() + 1);
        for (b, c) in text.char_indices() {
            offsets.push(b);
            chars.push(c);
        }
        offsets.push(text.len());
        Subject {
            text,
            chars,
            offsets,
        }
    }

    fn len(&self) -> usize {
        self.chars.len()
    }

    /// Byte offset of character position `pos`.
    fn byte_at(&self, pos: usize) -> usize {
        self.offsets[pos]
    }

    /// Character position of byte offset `b`. The prefilter only hunts
    /// ASCII bytes, which cannot occur inside a multi-byte sequence, so
    /// `b` always lands on a character start.
    fn char_at(&self, b: usize) -> usize {
        match self.offsets.binary_search(&b) {
            Ok(i) | Err(i) => i,
        }
    }
}

/// A single match: a byte range of the subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'t> {
    text: &'t str,
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    /// Byte offset of the match start.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the match end.
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The matched text.
    pub fn as_str(&self) -> &'t str {
        &self.text[self.start..self.end]
    }
}

impl fmt::Display for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capture slots of one match, byte-addressed. Slot `0` is the whole
/// match; a group that took no part in the match yields `None`.
#[derive(Debug, Clone)]
pub struct Captures<'t> {
    text: &'t str,
    slots: SmallVec<[Option<usize>; 8]>,
}

impl<'t> Captures<'t> {
    /// The span captured by group `i`, if it participated in the match.
    pub fn get(&self, i: usize) -> Option<Match<'t>> {
        let start = (*self.slots.get(2 * i)?)?;
        let end = (*self.slots.get(2 * i + 1)?)?;
        Some(Match {
            text: self.text,
            start,
            end,
        })
    }

    /// Number of addressable groups, the whole match included.
    pub fn len(&self) -> usize {
        self.slots.len() / 2
    }

    /// Provided for the `len`/`is_empty` pairing; a captures value always
    /// holds the whole-match group, so this is never true.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator returned by [`Regex::find_iter`].
pub struct FindIter<'r, 't> {
    re: &'r Regex,
    subj: Subject<'t>,
    /// Next character position to search from; past `len` means done.
    at: usize,
}

impl<'t> Iterator for FindIter<'_, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.at > self.subj.len() {
            return None;
        }
        let (start, m) = self.re.search(&self.subj, self.at)?;
        // step past an empty match so the iterator always advances
        self.at = if m.end == start { m.end + 1 } else { m.end };
        Some(Match {
            text: self.subj.text,
            start: self.subj.byte_at(start),
            end: self.subj.byte_at(m.end),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_reports_byte_offsets() {
        let re = Regex::new("b+").unwrap();
        let m = re.find("aabbbcc").unwrap();
        assert_eq!(m.range(), 2..5);
        assert_eq!(m.as_str(), "bbb");
    }

    #[test]
    fn find_is_leftmost() {
        let re = Regex::new("a|b").unwrap();
        let m = re.find("xxbya").unwrap();
        assert_eq!(m.range(), 2..3);
        assert_eq!(m.as_str(), "b");
    }

    #[test]
    fn non_ascii_offsets_are_bytes() {
        let re = Regex::new("b").unwrap();
        let m = re.find("äöb").unwrap();
        // two 2-byte characters precede the match
        assert_eq!(m.range(), 4..5);

        let re = Regex::new("(ö+)").unwrap();
        let caps = re.captures("xöö!").unwrap();
        let g = caps.get(1).unwrap();
        assert_eq!(g.range(), 1..5);
        assert_eq!(g.as_str(), "öö");
    }

    #[test]
    fn captures_unset_group() {
        let re = Regex::new("(a)|(b)").unwrap();
        let caps = re.captures("b").unwrap();
        assert!(caps.get(1).is_none());
        assert_eq!(caps.get(2).unwrap().as_str(), "b");
        assert_eq!(caps.len(), 3);
        assert_eq!(re.captures_len(), 3);
        assert!(!caps.is_empty());
    }

    #[test]
    fn find_iter_nonoverlapping() {
        let re = Regex::new("a.").unwrap();
        let found: Vec<&str> = re.find_iter("abacad").map(|m| m.as_str()).collect();
        assert_eq!(found, ["ab", "ac", "ad"]);
    }

    #[test]
    fn find_iter_empty_matches_advance() {
        let re = Regex::new("a*").unwrap();
        let spans: Vec<Range<usize>> = re.find_iter("baa").map(|m| m.range()).collect();
        assert_eq!(spans, [0..0, 1..3, 3..3]);
    }

    #[test]
    fn builder_case_insensitive() {
        let re = Regex::builder("na+").case_insensitive(true).build().unwrap();
        assert!(re.is_match("bANAna"));
        assert!(re.options().contains(Options::CASE_INSENSITIVE));

        let re = Regex::new("na+").unwrap();
        assert!(!re.is_match("BANANA"));
    }

    #[test]
    fn prefilter_only_for_plain_ascii_literal() {
        assert_eq!(Regex::new("abc").unwrap().prefilter, Some(b'a'));
        assert_eq!(Regex::new(".bc").unwrap().prefilter, None);
        assert_eq!(Regex::new("äbc").unwrap().prefilter, None);
        let folded = Regex::builder("abc").case_insensitive(true).build().unwrap();
        assert_eq!(folded.prefilter, None);
    }

    #[test]
    fn prefilter_agrees_with_scan() {
        let re = Regex::new("cd").unwrap();
        let m = re.find("took ab, äcd, cde").unwrap();
        assert_eq!(m.as_str(), "cd");
        assert_eq!(m.range(), 10..12);
    }

    #[test]
    fn from_str_and_display() {
        let re: Regex = "a+b".parse().unwrap();
        assert_eq!(re.to_string(), "a+b");
        assert_eq!(re.as_str(), "a+b");
        assert!("a{2,1}".parse::<Regex>().is_err());
    }

    #[test]
    fn anchors_interact_with_search_loop() {
        let re = Regex::new(r"\Aab").unwrap();
        assert!(re.is_match("abc"));
        assert!(!re.is_match("cab"));

        let re = Regex::new("^b").unwrap();
        let m = re.find("a\nb").unwrap();
        assert_eq!(m.range(), 2..3);
    }
}
