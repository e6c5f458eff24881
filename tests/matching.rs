// matching.rs - End-to-end matching behavior through the public API.

use lockstep::prelude::*;

/// Find and return the matched text, panicking with context on a miss.
fn hit<'t>(pattern: &str, text: &'t str) -> Match<'t> {
    let re = Regex::new(pattern)
        .unwrap_or_else(|e| panic!("pattern {:?} failed to compile: {}", pattern, e));
    re.find(text)
        .unwrap_or_else(|| panic!("pattern {:?} did not match {:?}", pattern, text))
}

fn miss(pattern: &str, text: &str) {
    let re = Regex::new(pattern)
        .unwrap_or_else(|e| panic!("pattern {:?} failed to compile: {}", pattern, e));
    if let Some(m) = re.find(text) {
        panic!(
            "pattern {:?} unexpectedly matched {:?} at {:?}",
            pattern,
            text,
            m.range()
        );
    }
}

/// The text captured by group `g` of the leftmost match.
fn cap<'t>(pattern: &str, text: &'t str, g: usize) -> Match<'t> {
    let re = Regex::new(pattern)
        .unwrap_or_else(|e| panic!("pattern {:?} failed to compile: {}", pattern, e));
    let caps = re
        .captures(text)
        .unwrap_or_else(|| panic!("pattern {:?} did not match {:?}", pattern, text));
    caps.get(g)
        .unwrap_or_else(|| panic!("group {} of {:?} did not participate", g, pattern))
}

// === Quantifier preference ===

#[test]
fn greedy_star_prefers_longest() {
    let g = cap("a(.*)c", "abcdcecf", 1);
    assert_eq!(g.as_str(), "bcdce");
    assert_eq!(g.range(), 1..6);
}

#[test]
fn lazy_star_prefers_shortest() {
    let g = cap("a(.*?)c", "abcdcecf", 1);
    assert_eq!(g.as_str(), "b");
    assert_eq!(g.range(), 1..2);
}

#[test]
fn greedy_question_takes_the_character() {
    assert_eq!(hit("ab?", "ab").as_str(), "ab");
    assert_eq!(hit("ab??", "ab").as_str(), "a");
}

#[test]
fn plus_requires_one() {
    miss("ab+c", "ac");
    assert_eq!(hit("ab+c", "abbbc").as_str(), "abbbc");
}

#[test]
fn counted_repetition_window() {
    assert_eq!(cap("a(.{2,8})c", "abcdcecf", 1).as_str(), "bcdce");
    assert_eq!(cap("a(.{2,8}?)c", "abcdcecf", 1).as_str(), "bcd");
    assert_eq!(cap("a(.{2,3})c", "abcdcecf", 1).as_str(), "bcd");
    miss("a(.{6,8})c", "abcdcecf");
}

#[test]
fn counted_repetition_upper_bound_blocks_match() {
    // nine characters between the delimiters, one over the bound
    miss("a(.{2,8})c", "a123456789c");
    assert_eq!(cap("a(.{2,8})c", "a12345678c", 1).as_str(), "12345678");
}

#[test]
fn counted_repetition_exact_and_open() {
    assert_eq!(hit("a{3}", "aaaaa").range(), 0..3);
    assert_eq!(hit("a{2,}", "aaaaa").range(), 0..5);
    miss("a{3}", "aa");
}

#[test]
fn nested_quantified_groups() {
    assert_eq!(hit("(ab)+", "ababab").as_str(), "ababab");
    assert_eq!(cap("(ab)+", "ababab", 1).range(), 4..6);
    assert_eq!(hit("(a|b)*c", "abbac").as_str(), "abbac");
}

// === Alternation ===

#[test]
fn leftmost_arm_wins_ties() {
    assert_eq!(hit("a|ab", "ab").as_str(), "a");
    assert_eq!(hit("ab|a", "ab").as_str(), "ab");
}

#[test]
fn leftmost_position_beats_arm_order() {
    // the later arm matches at an earlier position and wins
    assert_eq!(hit("foo|f", "of it: foo").range(), 1..2);
}

// === Anchors and boundaries ===

#[test]
fn text_anchors() {
    assert_eq!(hit(r"\A..\z", "ab").as_str(), "ab");
    miss(r"\A..\z", "abc");
    miss(r"a\zb", "ab");
}

#[test]
fn line_anchors_at_newlines() {
    let re = Regex::new("^a(b)c$").unwrap();
    let caps = re.captures("a\nabc\nd\n").unwrap();
    assert_eq!(caps.get(0).unwrap().range(), 2..5);
    assert_eq!(caps.get(1).unwrap().range(), 3..4);
}

#[test]
fn dollar_before_trailing_newline() {
    assert_eq!(hit("ab$", "ab\n").range(), 0..2);
    assert_eq!(hit("ab$", "ab").range(), 0..2);
    miss("ab$", "abc");
}

#[test]
fn word_boundary_selects_candidate() {
    let g = cap(r"\b(abc\B..)", "Aabcde abc abcfghi", 1);
    assert_eq!(g.as_str(), "abcfg");
    assert_eq!(g.range(), 11..16);
}

#[test]
fn boundary_at_text_edges() {
    assert_eq!(hit(r"\bword\b", "word").range(), 0..4);
    miss(r"\Bword", "word");
    assert_eq!(hit(r"\Bord", "word").range(), 1..4);
}

// === Classes ===

#[test]
fn bracket_expressions() {
    assert_eq!(hit("[b-d]+", "abcde").as_str(), "bcd");
    assert_eq!(hit("[^b-d]+", "abcde").as_str(), "a");
    assert_eq!(hit("[]x]+", "ax]b").range(), 1..3);
    assert_eq!(hit("[-+]?[0-9]+", "t = -42;").as_str(), "-42");
}

#[test]
fn posix_and_shorthand_classes() {
    assert_eq!(hit(r"[[:digit:]]+", "abc 123").as_str(), "123");
    assert_eq!(hit(r"\d+", "abc 123").as_str(), "123");
    assert_eq!(hit(r"\w+", " _ab1 ").as_str(), "_ab1");
    assert_eq!(hit(r"[[:^space:]]+", "  xy  ").as_str(), "xy");
    assert_eq!(hit(r"\S+", "  xy  ").as_str(), "xy");
}

#[test]
fn dot_matches_newline() {
    assert_eq!(hit("a.b", "a\nb").as_str(), "a\nb");
}

// === Lookaround ===

#[test]
fn lookahead() {
    assert_eq!(hit(r"\w+(?=;)", "ab cd; ef").as_str(), "cd");
    assert_eq!(hit(r"a(?!b)\w", "ab ac").range(), 3..5);
}

#[test]
fn lookbehind() {
    assert_eq!(hit(r"(?<=\$)\d+", "cost: $25 now").as_str(), "25");
    assert_eq!(hit(r"(?<!\$)\b\d+", "pay $25 in 30 days").as_str(), "30");
}

#[test]
fn lookbehind_right_after_subject_start() {
    assert_eq!(cap(r".*?((?<=a)b)", "ab", 1).range(), 1..2);
    assert_eq!(cap(r".*?((?<=a)b)", "xaby", 1).range(), 2..3);
}

#[test]
fn lookaround_captures_propagate() {
    assert_eq!(cap(r"a(?=(b+))", "abbb", 1).as_str(), "bbb");
    assert_eq!(cap(r"(?<=(a+))b", "caab", 1).as_str(), "aa");
}

#[test]
fn lookahead_inside_lookbehind() {
    assert_eq!(hit(r"(?<=a(?=bc)b)c", "abc").range(), 2..3);
    miss(r"(?<=a(?=bx)b)c", "abc");
}

// === Backreferences ===

#[test]
fn backreference_literal_repeat() {
    assert_eq!(hit(r"(abc)\1", "xabcabcy").range(), 1..7);
    miss(r"(abc)\1", "abcabd");
}

#[test]
fn backreference_tag_pair() {
    let re = Regex::new(r"<(\w+)>(.*?)</\1>").unwrap();
    let caps = re.captures("see <b>bold</b> text").unwrap();
    assert_eq!(caps.get(0).unwrap().as_str(), "<b>bold</b>");
    assert_eq!(caps.get(1).unwrap().as_str(), "b");
    assert_eq!(caps.get(2).unwrap().as_str(), "bold");
}

#[test]
fn backreference_skips_nested_closing_tag() {
    let re = Regex::new(r"(.*?)(<([a-z]+)>.*?</\3>)").unwrap();
    let caps = re.captures("a b <strong>c <em>d</em> f</strong> g").unwrap();
    assert_eq!(
        caps.get(0).unwrap().as_str(),
        "a b <strong>c <em>d</em> f</strong>"
    );
    assert_eq!(caps.get(1).unwrap().as_str(), "a b ");
    assert_eq!(caps.get(2).unwrap().as_str(), "<strong>c <em>d</em> f</strong>");
    assert_eq!(caps.get(3).unwrap().as_str(), "strong");
}

#[test]
fn backreference_to_unset_group_is_empty() {
    assert_eq!(hit(r"(?:(a)|b)\1c", "bc").range(), 0..2);
}

#[test]
fn backreference_doubled_word() {
    assert_eq!(cap(r"\b(\w+) \1\b", "it is is a bug", 1).as_str(), "is");
}

// === Case folding ===

#[test]
fn case_insensitive_matching() {
    let re = Regex::builder("foo").case_insensitive(true).build().unwrap();
    assert_eq!(re.find("FOO").unwrap().range(), 0..3);
    assert_eq!(re.find("FoO bar").unwrap().range(), 0..3);
    assert!(Regex::new("foo").unwrap().find("FOO").is_none());
}

#[test]
fn case_insensitive_backreference() {
    let re = Regex::builder(r"(ab)\1").case_insensitive(true).build().unwrap();
    assert!(re.is_match("abAB"));
}

#[test]
fn named_classes_ignore_folding() {
    let re = Regex::builder("[[:upper:]]+").case_insensitive(true).build().unwrap();
    assert_eq!(re.find("abCDef").unwrap().as_str(), "CD");
}

// === Empty matches ===

#[test]
fn empty_pattern_matches_everywhere() {
    let re = Regex::new("").unwrap();
    let m = re.find("hello").unwrap();
    assert!(m.is_empty());
    assert_eq!(m.start(), 0);
}

#[test]
fn star_of_optional_terminates() {
    assert_eq!(hit("(a?)*b", "aab").range(), 0..3);
    assert_eq!(hit("(?:a|)*b", "b").range(), 0..1);
}

// === Comments ===

#[test]
fn comment_groups_are_invisible() {
    assert_eq!(hit("a(?#the middle)b", "zab").range(), 1..3);
    assert_eq!(hit("a(?#nested (parens) ok)b", "ab").range(), 0..2);
}
