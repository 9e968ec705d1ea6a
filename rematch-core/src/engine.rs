//! Regex matching engine
//!
//! [`Regex`] ties the pipeline together: it parses and compiles the pattern
//! once, then picks an executor for every search. A one-pass program runs
//! on the one-pass executor. Otherwise short inputs go to the bounded
//! backtracker and everything else to the Pike VM. All executors agree on
//! the leftmost-first match and its capture groups.

use std::fmt;
use std::ops::Range;

use log::{debug, trace};

use crate::ast::{Flags, Regexp};
use crate::backtrack::{self, BitState};
use crate::class;
use crate::error::{ErrorCode, ParseError, Result};
use crate::input::{Input, Prefix};
use crate::nfa::Machine;
use crate::onepass::OnePassProg;
use crate::parser;
use crate::pool::Pool;
use crate::prog::{EmptyOp, Prog};
use crate::replace::{Replacement, ReplacementPart};
use crate::unicode;

/// A match result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Match {
    /// The start position of the match
    pub start: usize,
    /// The end position of the match (exclusive)
    pub end: usize,
}

impl Match {
    /// Get the matched text
    pub fn as_str<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }

    /// The byte range of the match
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Capture groups of one match
///
/// Group 0 is the whole match. Groups that did not take part in the match
/// have no value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captures<'r> {
    slots: Vec<Option<usize>>,
    names: &'r [Option<String>],
}

impl Captures<'_> {
    /// Get a capture group by index
    pub fn get(&self, i: usize) -> Option<Match> {
        match (self.slots.get(2 * i), self.slots.get(2 * i + 1)) {
            (Some(Some(start)), Some(Some(end))) => Some(Match {
                start: *start,
                end: *end,
            }),
            _ => None,
        }
    }

    /// Get a named capture group. With several groups of that name, the
    /// first one that participated is returned.
    pub fn name(&self, name: &str) -> Option<Match> {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, n)| n.as_deref() == Some(name))
            .find_map(|(i, _)| self.get(i))
    }

    /// Number of groups, including group 0
    pub fn len(&self) -> usize {
        self.slots.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The raw slots: start and end of each group in turn
    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }
}

/// The executor used for a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Deterministic, for one-pass programs
    OnePass,
    /// Bounded backtracking, for short inputs
    Backtrack,
    /// Pike VM, always available
    Nfa,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::OnePass => f.write_str("one-pass"),
            Strategy::Backtrack => f.write_str("backtrack"),
            Strategy::Nfa => f.write_str("nfa"),
        }
    }
}

/// A compiled regular expression
///
/// Searching never mutates the regex, so a `Regex` can be shared between
/// threads. Scratch memory for the executors is pooled and reused.
pub struct Regex {
    pattern: String,
    flags: Flags,
    prog: Prog,
    onepass: Option<OnePassProg>,
    /// Assertions required at the start of every match; `None` if the
    /// program can never match.
    cond: Option<EmptyOp>,
    prefix: String,
    prefix_complete: bool,
    prefix_finder: Option<Prefix>,
    max_bitstate_len: usize,
    min_input_len: usize,
    subexp_names: Vec<Option<String>>,
    bit_states: Pool<BitState>,
    machines: Pool<Machine>,
}

impl Regex {
    /// Compile a pattern with Perl syntax
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_flags(pattern, Flags::PERL)
    }

    /// Compile a pattern with the given parse flags
    pub fn with_flags(pattern: &str, flags: Flags) -> Result<Self> {
        let re = parser::parse(pattern, flags)?;
        let subexp_names = re.cap_names();
        let min_input_len = min_input_len(&re);
        let prog = crate::compile::compile(&re.simplify());
        let onepass = OnePassProg::new(&prog);
        let (prefix, prefix_complete) = prog.prefix();
        let regex = Regex {
            pattern: pattern.to_string(),
            flags,
            cond: prog.start_cond(),
            prefix_finder: Prefix::new(&prefix),
            prefix,
            prefix_complete,
            max_bitstate_len: backtrack::max_bit_state_len(&prog),
            min_input_len,
            subexp_names,
            onepass,
            prog,
            bit_states: Pool::new(),
            machines: Pool::new(),
        };
        debug!(
            "regex {:?}: {} instructions, one-pass {}, prefix {:?}, min input length {}",
            regex.pattern,
            regex.prog.len(),
            regex.onepass.is_some(),
            regex.prefix,
            regex.min_input_len
        );
        Ok(regex)
    }

    /// Compile a pattern given as bytes, which must be valid UTF-8
    pub fn from_utf8(pattern: &[u8], flags: Flags) -> Result<Self> {
        let pattern = std::str::from_utf8(pattern).map_err(|_| {
            ParseError::new(ErrorCode::InvalidUtf8, String::from_utf8_lossy(pattern))
        })?;
        Self::with_flags(pattern, flags)
    }

    /// The source text of the pattern
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// The compiled program
    pub fn prog(&self) -> &Prog {
        &self.prog
    }

    /// Whether the pattern compiled to a one-pass program
    pub fn is_onepass(&self) -> bool {
        self.onepass.is_some()
    }

    /// Number of capture groups, not counting the whole match
    pub fn num_subexp(&self) -> usize {
        self.subexp_names.len() - 1
    }

    /// Names of the capture groups, indexed by group number. Entry 0 and
    /// unnamed groups are `None`.
    pub fn subexp_names(&self) -> &[Option<String>] {
        &self.subexp_names
    }

    /// Index of the first group with the given name
    pub fn subexp_index(&self, name: &str) -> Option<usize> {
        self.subexp_names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    /// The literal text every match begins with, and whether that text is
    /// the whole match.
    pub fn literal_prefix(&self) -> (&str, bool) {
        (&self.prefix, self.prefix_complete)
    }

    /// The executor a search over `len` bytes of input would use
    pub fn strategy_for(&self, len: usize) -> Strategy {
        if self.onepass.is_some() {
            Strategy::OnePass
        } else if len < self.max_bitstate_len {
            Strategy::Backtrack
        } else {
            Strategy::Nfa
        }
    }

    /// Whether `strategy` can run this regex on `len` bytes of input
    pub fn supports(&self, strategy: Strategy, len: usize) -> bool {
        match strategy {
            Strategy::OnePass => self.onepass.is_some(),
            Strategy::Backtrack => len < self.max_bitstate_len,
            Strategy::Nfa => true,
        }
    }

    /// Search from `pos` with a chosen executor, returning every capture
    /// slot. An executor that cannot run this search is replaced by the
    /// Pike VM.
    pub fn search_with(
        &self,
        strategy: Strategy,
        input: &str,
        pos: usize,
    ) -> Option<Vec<Option<usize>>> {
        let strategy = if self.supports(strategy, input.len()) {
            strategy
        } else {
            trace!("{strategy} cannot run {:?}, using nfa", self.pattern);
            Strategy::Nfa
        };
        self.execute(strategy, input, pos, self.prog.num_cap)
    }

    /// Check if the pattern matches anywhere in the input
    pub fn is_match(&self, input: &str) -> bool {
        self.search(input, 0, 0).is_some()
    }

    /// Find the leftmost-first match in the input
    pub fn find(&self, input: &str) -> Option<Match> {
        let slots = self.search(input, 0, 2)?;
        Some(Match {
            start: slots[0]?,
            end: slots[1]?,
        })
    }

    /// Capture slots of the leftmost-first match: start and end of each
    /// group in turn, `None` for groups that did not participate.
    pub fn find_submatch_index(&self, input: &str) -> Option<Vec<Option<usize>>> {
        self.search(input, 0, self.prog.num_cap)
    }

    /// Capture groups of the leftmost-first match
    pub fn captures(&self, input: &str) -> Option<Captures<'_>> {
        let slots = self.find_submatch_index(input)?;
        Some(Captures {
            slots,
            names: &self.subexp_names,
        })
    }

    /// Find successive non-overlapping matches, at most `limit` of them
    pub fn find_all(&self, input: &str, limit: Option<usize>) -> Vec<Match> {
        let mut matches = Vec::new();
        self.all_matches(input, limit, 2, |slots| {
            if let (Some(start), Some(end)) = (slots[0], slots[1]) {
                matches.push(Match { start, end });
            }
        });
        matches
    }

    /// Capture slots of successive non-overlapping matches, at most
    /// `limit` of them
    pub fn find_all_submatch_index(
        &self,
        input: &str,
        limit: Option<usize>,
    ) -> Vec<Vec<Option<usize>>> {
        let mut matches = Vec::new();
        self.all_matches(input, limit, self.prog.num_cap, |slots| matches.push(slots));
        matches
    }

    /// Replace every match with the expansion of `template`
    ///
    /// See [`Replacement`] for the template syntax. An empty match right
    /// after a previous match is left alone.
    pub fn replace_all(&self, input: &str, template: &str) -> String {
        let replacement = Replacement::parse(template);
        let ncap = if replacement
            .parts()
            .iter()
            .any(|part| !matches!(part, ReplacementPart::Literal(_)))
        {
            self.prog.num_cap
        } else {
            2
        };

        let mut dst = String::with_capacity(input.len());
        let mut last_match_end = 0;
        let mut search_pos = 0;
        while search_pos <= input.len() {
            let Some(slots) = self.search(input, search_pos, ncap) else {
                break;
            };
            let (Some(start), Some(end)) = (slots[0], slots[1]) else {
                break;
            };

            dst.push_str(&input[last_match_end..start]);
            if end > last_match_end || start == 0 {
                replacement.expand(&mut dst, input, &slots, &self.subexp_names);
            }
            last_match_end = end;

            // Always move forward by at least one character.
            let width = Input::new(input).step(search_pos).map_or(0, |(_, w)| w);
            search_pos = if search_pos + width > end {
                search_pos + width
            } else if search_pos + 1 > end {
                search_pos + 1
            } else {
                end
            };
        }
        dst.push_str(&input[last_match_end..]);
        dst
    }

    fn all_matches(
        &self,
        input: &str,
        limit: Option<usize>,
        ncap: usize,
        mut deliver: impl FnMut(Vec<Option<usize>>),
    ) {
        let limit = limit.unwrap_or(usize::MAX);
        let mut found = 0;
        let mut pos = 0;
        let mut prev_match_end = None;
        while found < limit && pos <= input.len() {
            let Some(slots) = self.search(input, pos, ncap) else {
                break;
            };
            let (Some(start), Some(end)) = (slots[0], slots[1]) else {
                break;
            };

            let mut accept = true;
            if end == pos {
                // Empty matches may not directly follow a previous match.
                if prev_match_end == Some(start) {
                    accept = false;
                }
                pos += Input::new(input).step(pos).map_or(1, |(_, w)| w);
            } else {
                pos = end;
            }
            prev_match_end = Some(end);

            if accept {
                deliver(slots);
                found += 1;
            }
        }
    }

    /// Run the executor suited to `input`, filling `ncap` slots.
    fn search(&self, input: &str, pos: usize, ncap: usize) -> Option<Vec<Option<usize>>> {
        self.execute(self.strategy_for(input.len()), input, pos, ncap)
    }

    fn execute(
        &self,
        strategy: Strategy,
        text: &str,
        pos: usize,
        ncap: usize,
    ) -> Option<Vec<Option<usize>>> {
        let cond = self.cond?;
        if text.len().saturating_sub(pos) < self.min_input_len {
            return None;
        }
        trace!("searching {:?} from {pos} with {strategy}", self.pattern);

        let input = Input::new(text);
        let prefix = self.prefix_finder.as_ref();
        match (strategy, &self.onepass) {
            (Strategy::OnePass, Some(onepass)) => onepass.search(&input, pos, ncap),
            (Strategy::Backtrack, _) => {
                self.bit_states
                    .get()
                    .search(&self.prog, cond, prefix, &input, pos, ncap)
            }
            _ => self
                .machines
                .get()
                .search(&self.prog, cond, prefix, &input, pos, ncap),
        }
    }
}

impl Clone for Regex {
    fn clone(&self) -> Self {
        Regex {
            pattern: self.pattern.clone(),
            flags: self.flags,
            prog: self.prog.clone(),
            onepass: self.onepass.clone(),
            cond: self.cond,
            prefix: self.prefix.clone(),
            prefix_complete: self.prefix_complete,
            prefix_finder: self.prefix_finder.clone(),
            max_bitstate_len: self.max_bitstate_len,
            min_input_len: self.min_input_len,
            subexp_names: self.subexp_names.clone(),
            bit_states: Pool::new(),
            machines: Pool::new(),
        }
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl fmt::Debug for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Regex").field(&self.pattern).finish()
    }
}

/// Escape every metacharacter in `text`, giving a pattern that matches
/// `text` literally.
pub fn quote_meta(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        if class::META.contains(c) {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted
}

/// Shortest input, in bytes, that can possibly match `re`.
fn min_input_len(re: &Regexp) -> usize {
    re.fold_up(|re, subs: Vec<usize>| match re {
        Regexp::AnyChar | Regexp::AnyCharNotNL | Regexp::CharClass(_) => 1,
        Regexp::Literal { runes, fold } => runes
            .iter()
            .map(|&c| {
                if *fold {
                    // Members of a fold orbit can differ in width.
                    unicode::fold_orbit(c)
                        .iter()
                        .map(|c| c.len_utf8())
                        .min()
                        .unwrap_or(1)
                } else {
                    c.len_utf8()
                }
            })
            .sum(),
        Regexp::Capture { .. } | Regexp::Plus { .. } => subs.first().copied().unwrap_or(0),
        Regexp::Repeat { min, .. } => {
            (*min as usize).saturating_mul(subs.first().copied().unwrap_or(0))
        }
        Regexp::Concat(_) => subs.into_iter().fold(0, usize::saturating_add),
        Regexp::Alternate(_) => subs.into_iter().min().unwrap_or(0),
        _ => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(pattern: &str, input: &str) -> Option<(usize, usize)> {
        Regex::new(pattern)
            .unwrap()
            .find(input)
            .map(|m| (m.start, m.end))
    }

    #[test]
    fn test_find() {
        assert_eq!(find("a|ab", "ab"), Some((0, 1)));
        assert_eq!(find("b+", "abbbc"), Some((1, 4)));
        assert_eq!(find("x", "abc"), None);
        assert_eq!(find("", "abc"), Some((0, 0)));
    }

    #[test]
    fn test_match_text() {
        let re = Regex::new(r"\d+").unwrap();
        let m = re.find("abc 123 def").unwrap();
        assert_eq!(m.as_str("abc 123 def"), "123");
        assert_eq!(m.range(), 4..7);
        assert_eq!(m.len(), 3);
        assert!(!m.is_empty());
    }

    #[test]
    fn test_is_match() {
        let re = Regex::new("^[a-z]+$").unwrap();
        assert!(re.is_match("hello"));
        assert!(!re.is_match("Hello"));
        assert!(!Regex::new("[^\\x00-\\x{10FFFF}]").unwrap().is_match("a"));
    }

    #[test]
    fn test_captures() {
        let re = Regex::new(r"(?P<key>\w+)=(?P<value>\w*)").unwrap();
        let caps = re.captures("  name=joe").unwrap();
        assert_eq!(caps.len(), 3);
        assert_eq!(caps.get(0).unwrap().as_str("  name=joe"), "name=joe");
        assert_eq!(caps.name("key").unwrap().as_str("  name=joe"), "name");
        assert_eq!(caps.name("value").unwrap().range(), 7..10);
        assert_eq!(caps.name("missing"), None);
    }

    #[test]
    fn test_find_submatch_index() {
        let re = Regex::new("a(x*)b(y)?").unwrap();
        assert_eq!(
            re.find_submatch_index("-axxb-"),
            Some(vec![Some(1), Some(5), Some(2), Some(4), None, None])
        );
        assert_eq!(re.find_submatch_index("-a-"), None);
    }

    #[test]
    fn test_find_all() {
        let re = Regex::new("a*").unwrap();
        let spans: Vec<_> = re
            .find_all("baaab", None)
            .iter()
            .map(|m| (m.start, m.end))
            .collect();
        assert_eq!(spans, vec![(0, 0), (1, 4), (5, 5)]);

        let re = Regex::new(r"\d").unwrap();
        assert_eq!(re.find_all("1 2 3", Some(2)).len(), 2);
        assert!(re.find_all("1 2 3", Some(0)).is_empty());
        assert!(re.find_all("abc", None).is_empty());
    }

    #[test]
    fn test_find_all_multibyte() {
        let re = Regex::new("").unwrap();
        let starts: Vec<_> = re.find_all("añb", None).iter().map(|m| m.start).collect();
        assert_eq!(starts, vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_find_all_submatch_index() {
        let re = Regex::new("(a)|b").unwrap();
        assert_eq!(
            re.find_all_submatch_index("ab", None),
            vec![
                vec![Some(0), Some(1), Some(0), Some(1)],
                vec![Some(1), Some(2), None, None],
            ]
        );
    }

    #[test]
    fn test_replace_all() {
        let re = Regex::new("a(x*)b").unwrap();
        assert_eq!(re.replace_all("-ab-axxb-", "T"), "-T-T-");
        assert_eq!(re.replace_all("-ab-axxb-", "$1"), "--xx-");
        assert_eq!(re.replace_all("-ab-axxb-", "$1W"), "---");
        assert_eq!(re.replace_all("-ab-axxb-", "${1}W"), "-W-xxW-");
        assert_eq!(re.replace_all("-ab-axxb-", "$$1"), "-$1-$1-");
    }

    #[test]
    fn test_replace_all_empty_matches() {
        let re = Regex::new("a*").unwrap();
        assert_eq!(re.replace_all("baaab", "X"), "XbXbX");
        let re = Regex::new("x*").unwrap();
        assert_eq!(re.replace_all("añb", "-"), "-a-ñ-b-");
    }

    #[test]
    fn test_replace_all_named() {
        let re = Regex::new(r"(?P<first>\w+)\s+(?P<last>\w+)").unwrap();
        assert_eq!(re.replace_all("Ada Lovelace", "$last, $first"), "Lovelace, Ada");
        assert_eq!(re.replace_all("Ada Lovelace", "${last}_"), "Lovelace_");
    }

    #[test]
    fn test_subexp_metadata() {
        let re = Regex::new(r"(a)(?P<foo>b)(?:c)(?P<foo>d)").unwrap();
        assert_eq!(re.num_subexp(), 3);
        assert_eq!(
            re.subexp_names(),
            &[None, None, Some("foo".to_string()), Some("foo".to_string())]
        );
        assert_eq!(re.subexp_index("foo"), Some(2));
        assert_eq!(re.subexp_index("bar"), None);
    }

    #[test]
    fn test_literal_prefix() {
        assert_eq!(Regex::new("abc").unwrap().literal_prefix(), ("abc", true));
        assert_eq!(Regex::new("abc+").unwrap().literal_prefix(), ("abc", false));
        assert_eq!(Regex::new("^abc").unwrap().literal_prefix(), ("", false));
        assert_eq!(Regex::new("(?i)abc").unwrap().literal_prefix(), ("", false));
    }

    #[test]
    fn test_strategy() {
        let re = Regex::new("^abc$").unwrap();
        assert!(re.is_onepass());
        assert_eq!(re.strategy_for(10), Strategy::OnePass);

        let re = Regex::new("a+b").unwrap();
        assert!(!re.is_onepass());
        assert_eq!(re.strategy_for(10), Strategy::Backtrack);
        assert_eq!(re.strategy_for(1 << 20), Strategy::Nfa);
        assert!(!re.supports(Strategy::OnePass, 10));
        assert!(!re.supports(Strategy::Backtrack, 1 << 20));
        assert!(re.supports(Strategy::Nfa, 1 << 20));
        assert_eq!(Strategy::OnePass.to_string(), "one-pass");
    }

    #[test]
    fn test_search_with() {
        let re = Regex::new("(a+)(b)?").unwrap();
        let expected = Some(vec![Some(1), Some(4), Some(1), Some(3), Some(3), Some(4)]);
        for strategy in [Strategy::OnePass, Strategy::Backtrack, Strategy::Nfa] {
            assert_eq!(re.search_with(strategy, "xaab", 0), expected, "{strategy}");
        }
        assert_eq!(
            re.search_with(Strategy::Nfa, "xaab-ab", 4),
            Some(vec![Some(5), Some(7), Some(5), Some(6), Some(6), Some(7)])
        );
    }

    #[test]
    fn test_min_input_len() {
        let len = |p: &str| min_input_len(&parser::parse(p, Flags::PERL).unwrap());
        assert_eq!(len("abc"), 3);
        assert_eq!(len("é"), 2);
        assert_eq!(len("a*"), 0);
        assert_eq!(len("(ab)+"), 2);
        assert_eq!(len("a{3,5}"), 3);
        assert_eq!(len("ab|c"), 1);
        assert_eq!(len("[a-z]."), 2);
        assert!(!Regex::new("abcd").unwrap().is_match("abc"));
    }

    #[test]
    fn test_folded_literal_widths() {
        let len = |p: &str, flags: Flags| min_input_len(&parser::parse(p, flags).unwrap());
        assert_eq!(len("(?i)ſ", Flags::PERL), 1);
        assert_eq!(len("ſ", Flags::PERL | Flags::LITERAL | Flags::FOLD_CASE), 1);
        assert_eq!(len("\u{212A}", Flags::PERL | Flags::LITERAL | Flags::FOLD_CASE), 1);
        assert_eq!(len("é", Flags::PERL | Flags::LITERAL | Flags::FOLD_CASE), 2);
        assert_eq!(len("ſ", Flags::PERL | Flags::LITERAL), 2);

        let flags = Flags::PERL | Flags::LITERAL | Flags::FOLD_CASE;
        for (pattern, input, expected) in [
            ("ſ", "s", (0, 1)),
            ("s", "xſ", (1, 3)),
            ("\u{212A}", "k", (0, 1)),
            ("k", "\u{212A}", (0, 3)),
            ("ſk", "-SK", (1, 3)),
        ] {
            let re = Regex::with_flags(pattern, flags).unwrap();
            assert_eq!(
                re.find(input).map(|m| (m.start, m.end)),
                Some(expected),
                "{pattern:?} in {input:?}"
            );
            for strategy in [Strategy::Backtrack, Strategy::Nfa] {
                let slots = re.search_with(strategy, input, 0);
                assert_eq!(
                    slots,
                    Some(vec![Some(expected.0), Some(expected.1)]),
                    "{pattern:?} in {input:?} with {strategy}"
                );
            }
        }
    }

    #[test]
    fn test_from_utf8() {
        assert!(Regex::from_utf8(b"a+", Flags::PERL).is_ok());
        let err = Regex::from_utf8(b"a\xff", Flags::PERL).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidUtf8);
    }

    #[test]
    fn test_quote_meta() {
        assert_eq!(quote_meta("1.5-2.0?"), r"1\.5-2\.0\?");
        assert_eq!(quote_meta(r"\.+*?()|[]{}^$"), r"\\\.\+\*\?\(\)\|\[\]\{\}\^\$");
        assert_eq!(quote_meta("héllo"), "héllo");
        let re = Regex::new(&quote_meta("a.b*c")).unwrap();
        assert!(re.is_match("xa.b*cx"));
        assert!(!re.is_match("aXbbc"));
    }

    #[test]
    fn test_display_and_clone() {
        let re = Regex::new("a+b").unwrap();
        assert_eq!(re.to_string(), "a+b");
        assert_eq!(re.as_str(), "a+b");
        assert_eq!(format!("{re:?}"), "Regex(\"a+b\")");
        let copy = re.clone();
        assert_eq!(copy.find("xaab"), re.find("xaab"));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Regex>();
    }
}
