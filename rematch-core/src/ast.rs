//! Abstract Syntax Tree (AST) for regex patterns
//!
//! The parser produces a [`Regexp`] tree, the simplifier rewrites it and the
//! compiler lowers it to a program. Each variant carries exactly the payload
//! its operator needs; parse flags that matter after parsing (case folding,
//! greediness) are stored in the variants themselves.

use std::fmt::{self, Write};

use bitflags::bitflags;

use crate::class::{self, CharClass};

bitflags! {
    /// Parse flags
    ///
    /// These control how a pattern is read. `PERL` is the default used by
    /// [`Regex::new`](crate::Regex::new); `POSIX` is the empty set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Flags: u16 {
        /// Case-insensitive matching
        const FOLD_CASE = 1 << 0;
        /// Treat the whole pattern as literal text
        const LITERAL = 1 << 1;
        /// Allow negated classes like `[^a]` to match newline
        const CLASS_NL = 1 << 2;
        /// Allow `.` to match newline
        const DOT_NL = 1 << 3;
        /// `^` and `$` only match at the beginning and end of text
        const ONE_LINE = 1 << 4;
        /// Swap the meaning of `x*` and `x*?`
        const NON_GREEDY = 1 << 5;
        /// Perl extensions: non-capturing groups, `\A \z \b \d`, lazy repeats
        const PERL_X = 1 << 6;
        /// Allow `\p{Han}` and `\pL` Unicode classes
        const UNICODE_GROUPS = 1 << 7;

        /// Newline is an ordinary character
        const MATCH_NL = Self::CLASS_NL.bits() | Self::DOT_NL.bits();
        /// Perl-compatible defaults
        const PERL = Self::CLASS_NL.bits()
            | Self::ONE_LINE.bits()
            | Self::PERL_X.bits()
            | Self::UNICODE_GROUPS.bits();
        /// POSIX syntax, no extensions
        const POSIX = 0;
    }
}

/// The operator of a [`Regexp`] node, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Op {
    NoMatch,
    EmptyMatch,
    Literal,
    CharClass,
    AnyCharNotNL,
    AnyChar,
    BeginLine,
    EndLine,
    BeginText,
    EndText,
    WordBoundary,
    NoWordBoundary,
    Capture,
    Star,
    Plus,
    Quest,
    Repeat,
    Concat,
    Alternate,
}

/// A node of the regex syntax tree
///
/// Simplified trees can nest a few thousand levels deep, so cloning,
/// comparing and dropping walk the tree with a heap stack.
#[derive(Debug)]
pub enum Regexp {
    /// Matches nothing
    NoMatch,
    /// Matches the empty string
    EmptyMatch,
    /// A sequence of characters, optionally case-insensitive
    Literal { runes: Vec<char>, fold: bool },
    /// A set of characters
    CharClass(CharClass),
    /// Any character except newline
    AnyCharNotNL,
    /// Any character
    AnyChar,
    /// `^` in multi-line mode
    BeginLine,
    /// `$` in multi-line mode
    EndLine,
    /// `\A`, or `^` in one-line mode
    BeginText,
    /// `\z`, or `$` in one-line mode
    EndText,
    /// `\b`
    WordBoundary,
    /// `\B`
    NoWordBoundary,
    /// A capturing group; `index` starts at 1
    Capture {
        index: usize,
        name: Option<String>,
        sub: Box<Regexp>,
    },
    /// Zero or more
    Star { sub: Box<Regexp>, greedy: bool },
    /// One or more
    Plus { sub: Box<Regexp>, greedy: bool },
    /// Zero or one
    Quest { sub: Box<Regexp>, greedy: bool },
    /// Counted repetition; `max` of `None` means unbounded
    Repeat {
        sub: Box<Regexp>,
        min: u32,
        max: Option<u32>,
        greedy: bool,
    },
    /// Sequence of subexpressions
    Concat(Vec<Regexp>),
    /// Leftmost-first choice between subexpressions
    Alternate(Vec<Regexp>),
}

impl Regexp {
    /// Create a single-character literal
    pub fn literal(c: char, fold: bool) -> Self {
        Regexp::Literal {
            runes: vec![c],
            fold,
        }
    }

    /// Create a star node
    pub fn star(sub: Regexp, greedy: bool) -> Self {
        Regexp::Star {
            sub: Box::new(sub),
            greedy,
        }
    }

    /// Create a plus node
    pub fn plus(sub: Regexp, greedy: bool) -> Self {
        Regexp::Plus {
            sub: Box::new(sub),
            greedy,
        }
    }

    /// Create a quest node
    pub fn quest(sub: Regexp, greedy: bool) -> Self {
        Regexp::Quest {
            sub: Box::new(sub),
            greedy,
        }
    }

    /// Create a capture node
    pub fn capture(index: usize, name: Option<String>, sub: Regexp) -> Self {
        Regexp::Capture {
            index,
            name,
            sub: Box::new(sub),
        }
    }

    /// The operator of this node
    pub fn op(&self) -> Op {
        match self {
            Regexp::NoMatch => Op::NoMatch,
            Regexp::EmptyMatch => Op::EmptyMatch,
            Regexp::Literal { .. } => Op::Literal,
            Regexp::CharClass(_) => Op::CharClass,
            Regexp::AnyCharNotNL => Op::AnyCharNotNL,
            Regexp::AnyChar => Op::AnyChar,
            Regexp::BeginLine => Op::BeginLine,
            Regexp::EndLine => Op::EndLine,
            Regexp::BeginText => Op::BeginText,
            Regexp::EndText => Op::EndText,
            Regexp::WordBoundary => Op::WordBoundary,
            Regexp::NoWordBoundary => Op::NoWordBoundary,
            Regexp::Capture { .. } => Op::Capture,
            Regexp::Star { .. } => Op::Star,
            Regexp::Plus { .. } => Op::Plus,
            Regexp::Quest { .. } => Op::Quest,
            Regexp::Repeat { .. } => Op::Repeat,
            Regexp::Concat(_) => Op::Concat,
            Regexp::Alternate(_) => Op::Alternate,
        }
    }

    /// The direct subexpressions of this node
    pub fn subs(&self) -> &[Regexp] {
        match self {
            Regexp::Capture { sub, .. }
            | Regexp::Star { sub, .. }
            | Regexp::Plus { sub, .. }
            | Regexp::Quest { sub, .. }
            | Regexp::Repeat { sub, .. } => std::slice::from_ref(sub.as_ref()),
            Regexp::Concat(subs) | Regexp::Alternate(subs) => subs,
            _ => &[],
        }
    }

    /// The greediness of a repetition node, `None` for other nodes
    pub fn greedy(&self) -> Option<bool> {
        match self {
            Regexp::Star { greedy, .. }
            | Regexp::Plus { greedy, .. }
            | Regexp::Quest { greedy, .. }
            | Regexp::Repeat { greedy, .. } => Some(*greedy),
            _ => None,
        }
    }

    /// The largest capture index in the tree, 0 if there are none
    pub fn max_cap(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![self];
        while let Some(re) = stack.pop() {
            if let Regexp::Capture { index, .. } = re {
                max = max.max(*index);
            }
            stack.extend(re.subs());
        }
        max
    }

    /// Names of the capture groups, indexed by group number
    ///
    /// Entry 0 stands for the whole match and is always `None`, as is the
    /// entry of every unnamed group.
    pub fn cap_names(&self) -> Vec<Option<String>> {
        let mut names = vec![None; self.max_cap() + 1];
        let mut stack = vec![self];
        while let Some(re) = stack.pop() {
            if let Regexp::Capture {
                index,
                name: Some(name),
                ..
            } = re
            {
                names[*index] = Some(name.clone());
            }
            stack.extend(re.subs());
        }
        names
    }
}

impl Regexp {
    /// Fold the tree bottom-up without recursion.
    ///
    /// `f` sees every node after its subexpressions, left to right, along
    /// with the values it returned for them.
    pub fn fold_up<T>(&self, mut f: impl FnMut(&Regexp, Vec<T>) -> T) -> T {
        let mut stack = vec![(self, false)];
        let mut done: Vec<T> = Vec::new();
        while let Some((re, visited)) = stack.pop() {
            if visited {
                let subs = done.split_off(done.len() - re.subs().len());
                done.push(f(re, subs));
            } else {
                stack.push((re, true));
                stack.extend(re.subs().iter().rev().map(|sub| (sub, false)));
            }
        }
        match done.pop() {
            Some(value) => value,
            None => unreachable!("the root is always folded"),
        }
    }

    /// A copy of this node with `subs` as its subexpressions.
    ///
    /// `subs` must hold as many entries as [`Regexp::subs`] returns.
    pub(crate) fn with_subs(&self, subs: Vec<Regexp>) -> Regexp {
        match self {
            Regexp::NoMatch => Regexp::NoMatch,
            Regexp::EmptyMatch => Regexp::EmptyMatch,
            Regexp::Literal { runes, fold } => Regexp::Literal {
                runes: runes.clone(),
                fold: *fold,
            },
            Regexp::CharClass(class) => Regexp::CharClass(class.clone()),
            Regexp::AnyCharNotNL => Regexp::AnyCharNotNL,
            Regexp::AnyChar => Regexp::AnyChar,
            Regexp::BeginLine => Regexp::BeginLine,
            Regexp::EndLine => Regexp::EndLine,
            Regexp::BeginText => Regexp::BeginText,
            Regexp::EndText => Regexp::EndText,
            Regexp::WordBoundary => Regexp::WordBoundary,
            Regexp::NoWordBoundary => Regexp::NoWordBoundary,
            Regexp::Capture { index, name, .. } => {
                Regexp::capture(*index, name.clone(), only_sub(subs))
            }
            Regexp::Star { greedy, .. } => Regexp::star(only_sub(subs), *greedy),
            Regexp::Plus { greedy, .. } => Regexp::plus(only_sub(subs), *greedy),
            Regexp::Quest { greedy, .. } => Regexp::quest(only_sub(subs), *greedy),
            Regexp::Repeat {
                min, max, greedy, ..
            } => Regexp::Repeat {
                sub: Box::new(only_sub(subs)),
                min: *min,
                max: *max,
                greedy: *greedy,
            },
            Regexp::Concat(_) => Regexp::Concat(subs),
            Regexp::Alternate(_) => Regexp::Alternate(subs),
        }
    }

    /// Compare the node itself, ignoring its subexpressions.
    fn shallow_eq(&self, other: &Regexp) -> bool {
        match (self, other) {
            (
                Regexp::Literal { runes: a, fold: f },
                Regexp::Literal { runes: b, fold: g },
            ) => a == b && f == g,
            (Regexp::CharClass(a), Regexp::CharClass(b)) => a == b,
            (
                Regexp::Capture {
                    index: i, name: a, ..
                },
                Regexp::Capture {
                    index: j, name: b, ..
                },
            ) => i == j && a == b,
            (
                Regexp::Repeat {
                    min: a,
                    max: b,
                    greedy: c,
                    ..
                },
                Regexp::Repeat {
                    min: d,
                    max: e,
                    greedy: g,
                    ..
                },
            ) => a == d && b == e && c == g,
            (a, b) => a.op() == b.op() && a.greedy() == b.greedy(),
        }
    }
}

/// The single subexpression of a unary node.
pub(crate) fn only_sub(mut subs: Vec<Regexp>) -> Regexp {
    subs.pop().unwrap_or(Regexp::EmptyMatch)
}

impl Clone for Regexp {
    fn clone(&self) -> Self {
        self.fold_up(Regexp::with_subs)
    }
}

impl PartialEq for Regexp {
    fn eq(&self, other: &Regexp) -> bool {
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if !a.shallow_eq(b) || a.subs().len() != b.subs().len() {
                return false;
            }
            stack.extend(a.subs().iter().zip(b.subs()));
        }
        true
    }
}

impl Eq for Regexp {}

/// Drops in constant stack space, using heap space proportional to the
/// depth of the tree.
impl Drop for Regexp {
    fn drop(&mut self) {
        if self.subs().iter().all(|sub| sub.subs().is_empty()) {
            return;
        }
        let mut stack = vec![std::mem::replace(self, Regexp::EmptyMatch)];
        while let Some(mut re) = stack.pop() {
            match &mut re {
                Regexp::Capture { sub, .. }
                | Regexp::Star { sub, .. }
                | Regexp::Plus { sub, .. }
                | Regexp::Quest { sub, .. }
                | Regexp::Repeat { sub, .. } => {
                    stack.push(std::mem::replace(sub.as_mut(), Regexp::EmptyMatch));
                }
                Regexp::Concat(subs) | Regexp::Alternate(subs) => stack.append(subs),
                _ => {}
            }
        }
    }
}

impl fmt::Display for Regexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regexp::NoMatch => f.write_str(r"[^\x00-\x{10FFFF}]"),
            Regexp::EmptyMatch => f.write_str("(?:)"),
            Regexp::Literal { runes, fold } => {
                if *fold {
                    f.write_str("(?i:")?;
                }
                for &c in runes {
                    class::write_escaped(f, c, false)?;
                }
                if *fold {
                    f.write_char(')')?;
                }
                Ok(())
            }
            Regexp::CharClass(class) => write!(f, "{class}"),
            Regexp::AnyCharNotNL => f.write_str("(?-s:.)"),
            Regexp::AnyChar => f.write_str("(?s:.)"),
            Regexp::BeginLine => f.write_str("(?m:^)"),
            Regexp::EndLine => f.write_str("(?m:$)"),
            Regexp::BeginText => f.write_str(r"\A"),
            Regexp::EndText => f.write_str(r"\z"),
            Regexp::WordBoundary => f.write_str(r"\b"),
            Regexp::NoWordBoundary => f.write_str(r"\B"),
            Regexp::Capture { name, sub, .. } => {
                match name {
                    Some(name) => write!(f, "(?P<{name}>")?,
                    None => f.write_char('(')?,
                }
                if **sub != Regexp::EmptyMatch {
                    write!(f, "{sub}")?;
                }
                f.write_char(')')
            }
            Regexp::Star { sub, greedy }
            | Regexp::Plus { sub, greedy }
            | Regexp::Quest { sub, greedy }
            | Regexp::Repeat { sub, greedy, .. } => {
                let needs_group = sub.op() > Op::Capture
                    || matches!(sub.as_ref(), Regexp::Literal { runes, .. } if runes.len() > 1);
                if needs_group {
                    write!(f, "(?:{sub})")?;
                } else {
                    write!(f, "{sub}")?;
                }
                match self {
                    Regexp::Star { .. } => f.write_char('*')?,
                    Regexp::Plus { .. } => f.write_char('+')?,
                    Regexp::Quest { .. } => f.write_char('?')?,
                    Regexp::Repeat { min, max, .. } => match max {
                        Some(max) if max == min => write!(f, "{{{min}}}")?,
                        Some(max) => write!(f, "{{{min},{max}}}")?,
                        None => write!(f, "{{{min},}}")?,
                    },
                    _ => {}
                }
                if !greedy {
                    f.write_char('?')?;
                }
                Ok(())
            }
            Regexp::Concat(subs) => {
                for sub in subs {
                    if sub.op() == Op::Alternate {
                        write!(f, "(?:{sub})")?;
                    } else {
                        write!(f, "{sub}")?;
                    }
                }
                Ok(())
            }
            Regexp::Alternate(subs) => {
                for (i, sub) in subs.iter().enumerate() {
                    if i > 0 {
                        f.write_char('|')?;
                    }
                    write!(f, "{sub}")?;
                }
                Ok(())
            }
        }
    }
}
