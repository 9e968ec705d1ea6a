//! Character classes as sorted range sets
//!
//! A [`CharClass`] is a list of `(lo, hi)` ranges that is always sorted,
//! non-overlapping and non-adjacent. Ranges are over Unicode scalar values,
//! so the surrogate block is an implicit hole: `\u{D7FF}` and `\u{E000}`
//! count as adjacent.
//!
//! [`ClassBuilder`] collects ranges in any order while a class is being
//! parsed and produces the clean form at the end.

use std::fmt::{self, Write};
use std::sync::Arc;

use crate::unicode;

/// Perl `\d`
pub const PERL_DIGIT: &[(char, char)] = &[('0', '9')];
/// Perl `\s`
pub const PERL_SPACE: &[(char, char)] = &[('\t', '\n'), ('\x0C', '\r'), (' ', ' ')];
/// Perl `\w`
pub const PERL_WORD: &[(char, char)] = &[('0', '9'), ('A', 'Z'), ('_', '_'), ('a', 'z')];

/// Looks up a Perl class escape such as `\d` or `\W`.
///
/// Returns the table and whether the escape is the negated form.
pub fn perl_group(escape: char) -> Option<(&'static [(char, char)], bool)> {
    match escape {
        'd' => Some((PERL_DIGIT, false)),
        'D' => Some((PERL_DIGIT, true)),
        's' => Some((PERL_SPACE, false)),
        'S' => Some((PERL_SPACE, true)),
        'w' => Some((PERL_WORD, false)),
        'W' => Some((PERL_WORD, true)),
        _ => None,
    }
}

/// Looks up a POSIX class such as `[:alpha:]` or `[:^space:]`.
pub fn posix_group(name: &str) -> Option<(&'static [(char, char)], bool)> {
    let (negated, name) = match name.strip_prefix("[:^") {
        Some(rest) => (true, rest),
        None => (false, name.strip_prefix("[:")?),
    };
    let table: &'static [(char, char)] = match name.strip_suffix(":]")? {
        "alnum" => &[('0', '9'), ('A', 'Z'), ('a', 'z')],
        "alpha" => &[('A', 'Z'), ('a', 'z')],
        "ascii" => &[('\0', '\x7F')],
        "blank" => &[('\t', '\t'), (' ', ' ')],
        "cntrl" => &[('\0', '\x1F'), ('\x7F', '\x7F')],
        "digit" => &[('0', '9')],
        "graph" => &[('!', '~')],
        "lower" => &[('a', 'z')],
        "print" => &[(' ', '~')],
        "punct" => &[('!', '/'), (':', '@'), ('[', '`'), ('{', '~')],
        "space" => &[('\t', '\r'), (' ', ' ')],
        "upper" => &[('A', 'Z')],
        "word" => PERL_WORD,
        "xdigit" => &[('0', '9'), ('A', 'F'), ('a', 'f')],
        _ => return None,
    };
    Some((table, negated))
}

/// Returns the scalar value after `c`, skipping the surrogate block.
pub(crate) fn next_char(c: char) -> Option<char> {
    match c {
        '\u{D7FF}' => Some('\u{E000}'),
        char::MAX => None,
        _ => char::from_u32(c as u32 + 1),
    }
}

/// Returns the scalar value before `c`, skipping the surrogate block.
pub(crate) fn prev_char(c: char) -> Option<char> {
    match c {
        '\u{E000}' => Some('\u{D7FF}'),
        '\0' => None,
        _ => char::from_u32(c as u32 - 1),
    }
}

/// A clean set of character ranges
///
/// The ranges are shared, so clones are cheap; repetition expands a
/// class into many copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharClass {
    ranges: Arc<[(char, char)]>,
}

impl CharClass {
    /// Build a class from ranges in any order; reversed ranges are ignored.
    pub fn new(ranges: Vec<(char, char)>) -> Self {
        CharClass {
            ranges: canonicalize(ranges).into(),
        }
    }

    /// The class matching nothing
    pub fn empty() -> Self {
        CharClass::new(Vec::new())
    }

    /// The class matching every character
    pub fn any() -> Self {
        CharClass::new(vec![('\0', char::MAX)])
    }

    /// The class matching every character except `\n`
    pub fn any_not_nl() -> Self {
        CharClass::new(vec![('\0', '\t'), ('\x0B', char::MAX)])
    }

    /// The class holding exactly one character
    pub fn single(c: char) -> Self {
        CharClass::new(vec![(c, c)])
    }

    /// The ranges of the class, sorted
    pub fn ranges(&self) -> &[(char, char)] {
        &self.ranges
    }

    /// Check if the class matches nothing
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Check if the class matches every character
    pub fn is_any(&self) -> bool {
        *self.ranges == [('\0', char::MAX)]
    }

    /// Check if the class matches every character except `\n`
    pub fn is_any_not_nl(&self) -> bool {
        *self.ranges == [('\0', '\t'), ('\x0B', char::MAX)]
    }

    /// If the class holds exactly one character, return it
    pub fn single_char(&self) -> Option<char> {
        match *self.ranges {
            [(lo, hi)] if lo == hi => Some(lo),
            _ => None,
        }
    }

    /// Check if `c` is in the class
    pub fn contains(&self, c: char) -> bool {
        contains(&self.ranges, c)
    }

    /// Return the complement of the class
    pub fn negated(&self) -> Self {
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = Some('\0');
        for &(lo, hi) in self.ranges.iter() {
            if let Some(start) = next {
                if start < lo {
                    if let Some(end) = prev_char(lo) {
                        out.push((start, end));
                    }
                }
            }
            next = next_char(hi);
        }
        if let Some(start) = next {
            out.push((start, char::MAX));
        }
        CharClass { ranges: out.into() }
    }

    /// Return the class closed under simple case folding
    pub fn folded(&self) -> Self {
        CharClass::new(unicode::fold_ranges(&self.ranges))
    }

    /// Add every character of `other` to this class
    pub fn union(&mut self, other: &CharClass) {
        let mut ranges = self.ranges.to_vec();
        ranges.extend_from_slice(&other.ranges);
        self.ranges = canonicalize(ranges).into();
    }
}

/// Sort and merge overlapping or adjacent ranges.
fn canonicalize(mut ranges: Vec<(char, char)>) -> Vec<(char, char)> {
    ranges.retain(|(lo, hi)| lo <= hi);
    ranges.sort_unstable();
    let mut merged: Vec<(char, char)> = Vec::with_capacity(ranges.len());
    for (lo, hi) in ranges {
        if let Some(last) = merged.last_mut() {
            let touches = next_char(last.1).is_none_or(|after| lo <= after);
            if touches {
                last.1 = last.1.max(hi);
                continue;
            }
        }
        merged.push((lo, hi));
    }
    merged
}

/// Binary search for `c` in sorted, non-overlapping ranges.
pub(crate) fn contains(ranges: &[(char, char)], c: char) -> bool {
    range_index(ranges, c).is_some()
}

/// Index of the range holding `c`, if any.
pub(crate) fn range_index(ranges: &[(char, char)], c: char) -> Option<usize> {
    // Short lists are faster to scan.
    if ranges.len() <= 4 {
        return ranges.iter().position(|&(lo, hi)| lo <= c && c <= hi);
    }
    let (mut lo, mut hi) = (0, ranges.len());
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let (rlo, rhi) = ranges[mid];
        if c < rlo {
            hi = mid;
        } else if c > rhi {
            lo = mid + 1;
        } else {
            return Some(mid);
        }
    }
    None
}

/// Collects ranges for a class under construction
#[derive(Debug, Clone, Default)]
pub struct ClassBuilder {
    ranges: Vec<(char, char)>,
}

impl ClassBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        ClassBuilder { ranges: Vec::new() }
    }

    /// Add the range `lo..=hi`
    pub fn push_range(&mut self, lo: char, hi: char) {
        // Merge with the previous range when possible.
        if let Some(last) = self.ranges.last_mut() {
            let touches_after = next_char(last.1).is_none_or(|after| lo <= after);
            let touches_before = next_char(hi).is_none_or(|after| last.0 <= after);
            if touches_after && touches_before {
                last.0 = last.0.min(lo);
                last.1 = last.1.max(hi);
                return;
            }
        }
        self.ranges.push((lo, hi));
    }

    /// Add the range `lo..=hi` and everything that folds into it
    pub fn push_folded_range(&mut self, lo: char, hi: char) {
        for (flo, fhi) in unicode::fold_ranges(&[(lo, hi)]) {
            self.push_range(flo, fhi);
        }
    }

    /// Add one character, folded when `fold` is set
    pub fn push_literal(&mut self, c: char, fold: bool) {
        if fold {
            self.push_folded_range(c, c);
        } else {
            self.push_range(c, c);
        }
    }

    /// Add every range of `class`
    pub fn push_class(&mut self, class: &CharClass) {
        for &(lo, hi) in class.ranges() {
            self.push_range(lo, hi);
        }
    }

    /// Add every character not in `class`
    pub fn push_negated_class(&mut self, class: &CharClass) {
        self.push_class(&class.negated());
    }

    /// Add a table, optionally case folded and negated
    pub fn push_table(&mut self, table: &[(char, char)], negated: bool, fold: bool) {
        let mut class = CharClass::new(table.to_vec());
        if fold {
            class = class.folded();
        }
        if negated {
            self.push_negated_class(&class);
        } else {
            self.push_class(&class);
        }
    }

    /// Check if no range has been added
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Finish the class
    pub fn build(self) -> CharClass {
        CharClass::new(self.ranges)
    }
}

/// Characters with special meaning outside classes
pub(crate) const META: &str = r"\.+*?()|[]{}^$";

/// Write `c` as pattern text, escaping it when needed.
pub(crate) fn write_escaped<W: Write>(w: &mut W, c: char, force: bool) -> fmt::Result {
    let printable = c == ' ' || !(c.is_control() || c.is_whitespace());
    if printable {
        if force || META.contains(c) {
            w.write_char('\\')?;
        }
        return w.write_char(c);
    }
    match c {
        '\x07' => w.write_str(r"\a"),
        '\x0C' => w.write_str(r"\f"),
        '\n' => w.write_str(r"\n"),
        '\r' => w.write_str(r"\r"),
        '\t' => w.write_str(r"\t"),
        '\x0B' => w.write_str(r"\v"),
        c if (c as u32) < 0x100 => write!(w, r"\x{:02x}", c as u32),
        c => write!(w, r"\x{{{:x}}}", c as u32),
    }
}

impl fmt::Display for CharClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_range = |f: &mut fmt::Formatter<'_>, lo: char, hi: char| -> fmt::Result {
            write_escaped(f, lo, lo == '-')?;
            if lo != hi {
                f.write_char('-')?;
                write_escaped(f, hi, hi == '-')?;
            }
            Ok(())
        };

        f.write_char('[')?;
        if self.ranges.is_empty() {
            f.write_str(r"^\x00-\x{10FFFF}")?;
        } else if self.ranges.len() > 1
            && self.ranges[0].0 == '\0'
            && self.ranges[self.ranges.len() - 1].1 == char::MAX
        {
            // Probably a negated class; print the gaps.
            f.write_char('^')?;
            for &(lo, hi) in self.negated().ranges() {
                write_range(f, lo, hi)?;
            }
        } else {
            for &(lo, hi) in self.ranges.iter() {
                write_range(f, lo, hi)?;
            }
        }
        f.write_char(']')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_and_merges() {
        let class = CharClass::new(vec![('x', 'z'), ('a', 'c'), ('b', 'f'), ('g', 'g')]);
        assert_eq!(class.ranges(), &[('a', 'g'), ('x', 'z')]);
    }

    #[test]
    fn test_surrogate_hole_is_adjacent() {
        let class = CharClass::new(vec![('\0', '\u{D7FF}'), ('\u{E000}', char::MAX)]);
        assert!(class.is_any());
    }

    #[test]
    fn test_negated() {
        let class = CharClass::new(vec![('a', 'z')]);
        let neg = class.negated();
        assert_eq!(neg.ranges(), &[('\0', '`'), ('{', char::MAX)]);
        assert_eq!(neg.negated(), class);
        assert!(CharClass::empty().negated().is_any());
        assert!(CharClass::any().negated().is_empty());
    }

    #[test]
    fn test_negated_newline() {
        let class = CharClass::single('\n').negated();
        assert!(class.is_any_not_nl());
    }

    #[test]
    fn test_contains() {
        let class = CharClass::new(vec![
            ('0', '9'),
            ('A', 'Z'),
            ('_', '_'),
            ('a', 'z'),
            ('α', 'ω'),
        ]);
        assert!(class.contains('5'));
        assert!(class.contains('_'));
        assert!(class.contains('λ'));
        assert!(!class.contains('-'));
        assert!(!class.contains('é'));
    }

    #[test]
    fn test_folded() {
        let class = CharClass::new(vec![('a', 'c')]).folded();
        assert_eq!(class.ranges(), &[('A', 'C'), ('a', 'c')]);
    }

    #[test]
    fn test_builder() {
        let mut b = ClassBuilder::new();
        b.push_range('a', 'c');
        b.push_range('d', 'f');
        b.push_literal('K', true);
        let class = b.build();
        assert_eq!(
            class.ranges(),
            &[('K', 'K'), ('a', 'f'), ('k', 'k'), ('\u{212A}', '\u{212A}')]
        );
    }

    #[test]
    fn test_builder_negated_table() {
        let mut b = ClassBuilder::new();
        b.push_table(PERL_DIGIT, true, false);
        let class = b.build();
        assert!(!class.contains('4'));
        assert!(class.contains('x'));
    }

    #[test]
    fn test_posix_lookup() {
        assert_eq!(posix_group("[:digit:]"), Some((PERL_DIGIT, false)));
        assert!(matches!(posix_group("[:^space:]"), Some((_, true))));
        assert_eq!(posix_group("[:bogus:]"), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(CharClass::new(vec![('a', 'z'), ('-', '-')]).to_string(), r"[\-a-z]");
        assert_eq!(CharClass::single('\n').negated().to_string(), r"[^\n]");
        assert_eq!(CharClass::empty().to_string(), r"[^\x00-\x{10FFFF}]");
    }
}
