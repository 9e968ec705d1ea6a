//! Pattern parser
//!
//! An operator-precedence parser over an explicit stack. Expressions,
//! `(` markers and `|` markers share one stack; a `)` or the end of the
//! pattern folds everything above the nearest marker into a concatenation
//! and the concatenations below it into an alternation. Nothing recurses
//! on the structure of the pattern.
//!
//! Every expression on the stack carries its estimated compiled size and
//! tree height, so the limits below are enforced as the tree is built.

use crate::ast::{Flags, Op, Regexp};
use crate::class::{self, CharClass, ClassBuilder};
use crate::error::{ErrorCode, ParseError, Result};
use crate::unicode;

/// Maximum height of the syntax tree, and of open groups at any point
pub const MAX_HEIGHT: usize = 1000;

/// Maximum count in `{n,m}`, and maximum product of nested counts
pub const MAX_REPEAT: u32 = 1000;

/// Maximum estimated program size, in instructions
pub const MAX_SIZE: u64 = (128 << 20) / 40;

/// Maximum number of runes held by literals and classes
pub const MAX_RUNES: usize = (128 << 20) / 4;

/// Parse `pattern` into a syntax tree.
pub fn parse(pattern: &str, flags: Flags) -> Result<Regexp> {
    parse_node(pattern, flags).map(|node| node.re)
}

fn parse_node(pattern: &str, flags: Flags) -> Result<Node> {
    if flags.contains(Flags::LITERAL) {
        let fold = flags.contains(Flags::FOLD_CASE);
        let re = Regexp::Literal {
            runes: pattern
                .chars()
                .map(|c| if fold { unicode::min_fold(c) } else { c })
                .collect(),
            fold,
        };
        return Ok(Node::leaf(re));
    }

    let mut p = Parser::new(pattern, flags);
    let mut t = pattern;
    let mut last_repeat: Option<&str> = None;
    while let Some(c) = t.chars().next() {
        let mut repeat = None;
        match c {
            '(' => {
                if p.flags.contains(Flags::PERL_X) && t[1..].starts_with('?') {
                    t = p.parse_perl_flags(t)?;
                } else {
                    p.num_cap += 1;
                    p.open_group(Some((p.num_cap, None)))?;
                    t = &t[1..];
                }
            }
            '|' => {
                p.parse_vertical_bar()?;
                t = &t[1..];
            }
            ')' => {
                p.parse_right_paren()?;
                t = &t[1..];
            }
            '^' => {
                if p.flags.contains(Flags::ONE_LINE) {
                    p.op(Regexp::BeginText)?;
                } else {
                    p.op(Regexp::BeginLine)?;
                }
                t = &t[1..];
            }
            '$' => {
                if p.flags.contains(Flags::ONE_LINE) {
                    p.op(Regexp::EndText)?;
                } else {
                    p.op(Regexp::EndLine)?;
                }
                t = &t[1..];
            }
            '.' => {
                if p.flags.contains(Flags::DOT_NL) {
                    p.op(Regexp::AnyChar)?;
                } else {
                    p.op(Regexp::AnyCharNotNL)?;
                }
                t = &t[1..];
            }
            '[' => t = p.parse_class(t)?,
            '*' | '+' | '?' => {
                let kind = match c {
                    '*' => RepeatKind::Star,
                    '+' => RepeatKind::Plus,
                    _ => RepeatKind::Quest,
                };
                let before = t;
                t = p.repeat(kind, before, &t[1..], last_repeat)?;
                repeat = Some(before);
            }
            '{' => {
                let before = t;
                match parse_repeat(t) {
                    // Not a valid repeat: `{` is a literal.
                    None => {
                        p.literal('{')?;
                        t = &t[1..];
                    }
                    Some((min, max, after)) => {
                        if min > MAX_REPEAT || max.is_some_and(|max| max > MAX_REPEAT || min > max)
                        {
                            return Err(ParseError::new(
                                ErrorCode::InvalidRepeatSize,
                                consumed(before, after),
                            ));
                        }
                        t = p.repeat(RepeatKind::Counted(min, max), before, after, last_repeat)?;
                        repeat = Some(before);
                    }
                }
            }
            '\\' => t = p.parse_backslash(t)?,
            _ => {
                p.literal(c)?;
                t = &t[c.len_utf8()..];
            }
        }
        last_repeat = repeat;
    }
    p.finish()
}

/// The part of `s` before `rest`, where `rest` is a suffix of `s`.
fn consumed<'a>(s: &'a str, rest: &str) -> &'a str {
    &s[..s.len() - rest.len()]
}

/// A parsed expression with its estimated program size and tree height
#[derive(Debug)]
struct Node {
    re: Regexp,
    size: u64,
    height: usize,
}

impl Node {
    fn leaf(re: Regexp) -> Node {
        let size = node_size(&re, &[]);
        Node {
            re,
            size,
            height: 1,
        }
    }

    /// Build a node from scratch, walking the whole tree.
    fn measure(re: Regexp) -> Node {
        let (size, height) = measure(&re);
        Node { re, size, height }
    }
}

/// Compiled size of a node given the sizes of its subexpressions.
fn node_size(re: &Regexp, subs: &[u64]) -> u64 {
    let first = subs.first().copied().unwrap_or(0);
    let size = match re {
        Regexp::Literal { runes, .. } => runes.len() as u64,
        // A star can cost 1 or 2 on top of its body; assume 2.
        Regexp::Capture { .. } | Regexp::Star { .. } => 2 + first,
        Regexp::Plus { .. } | Regexp::Quest { .. } => 1 + first,
        Regexp::Concat(_) => subs.iter().sum(),
        Regexp::Alternate(_) => subs.iter().sum::<u64>() + (subs.len() as u64).saturating_sub(1),
        Regexp::Repeat { min, max, .. } => match max {
            None if *min == 0 => 2 + first,
            None => 1 + u64::from(*min) * first,
            Some(max) => u64::from(*max) * first + u64::from(max - min),
        },
        _ => 0,
    };
    size.max(1)
}

/// Size and height of a whole tree.
fn measure(re: &Regexp) -> (u64, usize) {
    let mut sizes = Vec::with_capacity(re.subs().len());
    let mut height = 0;
    for sub in re.subs() {
        let (s, h) = measure(sub);
        sizes.push(s);
        height = height.max(h);
    }
    (node_size(re, &sizes), height + 1)
}

#[derive(Debug)]
enum Frame {
    Expr(Node),
    /// An open group, holding its capture index and name, and the flags
    /// to restore when it closes
    LeftParen {
        cap: Option<(usize, Option<String>)>,
        flags: Flags,
    },
    VerticalBar,
}

#[derive(Debug, Clone, Copy)]
enum RepeatKind {
    Star,
    Plus,
    Quest,
    Counted(u32, Option<u32>),
}

struct Parser<'a> {
    whole: &'a str,
    flags: Flags,
    stack: Vec<Frame>,
    num_cap: usize,
    num_runes: usize,
    open_groups: usize,
}

impl<'a> Parser<'a> {
    fn new(whole: &'a str, flags: Flags) -> Self {
        Parser {
            whole,
            flags,
            stack: Vec::new(),
            num_cap: 0,
            num_runes: 0,
            open_groups: 0,
        }
    }

    fn error(&self, code: ErrorCode) -> ParseError {
        ParseError::new(code, self.whole)
    }

    fn check_limits(&self, node: &Node) -> Result<()> {
        if self.num_runes > MAX_RUNES || node.size > MAX_SIZE {
            return Err(self.error(ErrorCode::Large));
        }
        if node.height > MAX_HEIGHT {
            return Err(self.error(ErrorCode::NestingDepth));
        }
        Ok(())
    }

    /// Push an expression, turning one-rune classes into literals and
    /// merging adjacent literals below the top of the stack.
    fn push(&mut self, mut node: Node) -> Result<()> {
        self.num_runes += match &node.re {
            Regexp::Literal { runes, .. } => runes.len(),
            Regexp::CharClass(class) => class.ranges().len() * 2,
            _ => 0,
        };

        let as_literal = match &node.re {
            Regexp::CharClass(class) => match class.single_char() {
                Some(c) => Some((c, false)),
                None => fold_pair(class).map(|c| (c, true)),
            },
            _ => None,
        };
        match as_literal {
            Some((c, fold)) => {
                if self.maybe_concat(Some((c, fold))) {
                    return Ok(());
                }
                node = Node::leaf(Regexp::literal(c, fold));
            }
            None => {
                self.maybe_concat(None);
            }
        }

        self.check_limits(&node)?;
        self.stack.push(Frame::Expr(node));
        Ok(())
    }

    fn op(&mut self, re: Regexp) -> Result<()> {
        self.push(Node::leaf(re))
    }

    fn literal(&mut self, c: char) -> Result<()> {
        let fold = self.flags.contains(Flags::FOLD_CASE);
        let c = if fold { unicode::min_fold(c) } else { c };
        self.push(Node::leaf(Regexp::literal(c, fold)))
    }

    /// If the top two entries are literals with the same case folding,
    /// merge the top one into the one below it. When `pending` is given
    /// and the merge happened, push it as a new literal and return true.
    fn maybe_concat(&mut self, pending: Option<(char, bool)>) -> bool {
        let n = self.stack.len();
        if n < 2 {
            return false;
        }
        let mergeable = match (&self.stack[n - 2], &self.stack[n - 1]) {
            (
                Frame::Expr(Node {
                    re: Regexp::Literal { fold: below, .. },
                    ..
                }),
                Frame::Expr(Node {
                    re: Regexp::Literal { fold: top, .. },
                    ..
                }),
            ) => below == top,
            _ => false,
        };
        if !mergeable {
            return false;
        }

        let Some(Frame::Expr(mut top)) = self.stack.pop() else {
            return false;
        };
        let tail = match &mut top.re {
            Regexp::Literal { runes, .. } => std::mem::take(runes),
            _ => Vec::new(),
        };
        if let Some(Frame::Expr(below)) = self.stack.last_mut() {
            if let Regexp::Literal { runes, .. } = &mut below.re {
                runes.extend(tail);
                below.size += top.size;
            }
        }

        match pending {
            Some((c, fold)) => {
                self.stack
                    .push(Frame::Expr(Node::leaf(Regexp::literal(c, fold))));
                true
            }
            None => false,
        }
    }

    fn open_group(&mut self, cap: Option<(usize, Option<String>)>) -> Result<()> {
        self.open_groups += 1;
        if self.open_groups > MAX_HEIGHT {
            return Err(self.error(ErrorCode::NestingDepth));
        }
        self.maybe_concat(None);
        self.stack.push(Frame::LeftParen {
            cap,
            flags: self.flags,
        });
        Ok(())
    }

    /// Pop the expressions above the nearest marker.
    fn pop_exprs(&mut self) -> Vec<Node> {
        let start = self
            .stack
            .iter()
            .rposition(|frame| !matches!(frame, Frame::Expr(_)))
            .map_or(0, |i| i + 1);
        self.stack
            .drain(start..)
            .filter_map(|frame| match frame {
                Frame::Expr(node) => Some(node),
                _ => None,
            })
            .collect()
    }

    /// Replace the expressions above the nearest marker with their
    /// concatenation.
    fn concat(&mut self) -> Result<()> {
        self.maybe_concat(None);
        let subs = self.pop_exprs();
        if subs.is_empty() {
            return self.op(Regexp::EmptyMatch);
        }
        let node = collapse(subs, Op::Concat);
        self.push(node)
    }

    /// Replace the expressions above the nearest marker with their
    /// alternation.
    fn alternate(&mut self) -> Result<()> {
        let mut subs = self.pop_exprs();
        // Everything below the last one was cleaned when it was swapped
        // below a vertical bar.
        if let Some(last) = subs.last_mut() {
            clean_alt(&mut last.re);
        }
        if subs.is_empty() {
            return self.op(Regexp::NoMatch);
        }
        let node = collapse(subs, Op::Alternate);
        self.push(node)
    }

    fn parse_vertical_bar(&mut self) -> Result<()> {
        self.concat()?;
        if !self.swap_vertical_bar() {
            self.stack.push(Frame::VerticalBar);
        }
        Ok(())
    }

    /// If the top of the stack sits above a vertical bar, move it below
    /// the bar, merging it into the previous alternative when both are
    /// single characters or classes. Returns true if a bar was found.
    fn swap_vertical_bar(&mut self) -> bool {
        let n = self.stack.len();
        if n >= 3
            && matches!(self.stack[n - 2], Frame::VerticalBar)
            && matches!(&self.stack[n - 1], Frame::Expr(node) if is_char_class(&node.re))
            && matches!(&self.stack[n - 3], Frame::Expr(node) if is_char_class(&node.re))
        {
            if let Some(Frame::Expr(top)) = self.stack.pop() {
                if let Frame::Expr(dst) = &mut self.stack[n - 3] {
                    // Merge into the more complex of the two.
                    let src = if top.re.op() > dst.re.op() {
                        std::mem::replace(&mut dst.re, top.re)
                    } else {
                        top.re
                    };
                    merge_char_class(&mut dst.re, &src);
                }
            }
            return true;
        }

        if n >= 2 && matches!(self.stack[n - 2], Frame::VerticalBar) {
            if n >= 3 {
                // Out of reach from now on.
                if let Frame::Expr(node) = &mut self.stack[n - 3] {
                    clean_alt(&mut node.re);
                }
            }
            self.stack.swap(n - 2, n - 1);
            return true;
        }
        false
    }

    fn parse_right_paren(&mut self) -> Result<()> {
        self.concat()?;
        if self.swap_vertical_bar() {
            self.stack.pop();
        }
        self.alternate()?;

        if self.stack.len() < 2 {
            return Err(self.error(ErrorCode::UnexpectedParen));
        }
        let Some(Frame::Expr(sub)) = self.stack.pop() else {
            return Err(self.error(ErrorCode::InternalError));
        };
        let Some(Frame::LeftParen { cap, flags }) = self.stack.pop() else {
            return Err(self.error(ErrorCode::UnexpectedParen));
        };
        self.open_groups -= 1;
        self.flags = flags;
        match cap {
            None => self.push(sub),
            Some((index, name)) => {
                let node = Node {
                    size: sub.size + 2,
                    height: sub.height + 1,
                    re: Regexp::capture(index, name, sub.re),
                };
                self.push(node)
            }
        }
    }

    /// Apply a repetition operator to the expression on top of the stack.
    fn repeat(
        &mut self,
        kind: RepeatKind,
        before: &'a str,
        mut after: &'a str,
        last_repeat: Option<&'a str>,
    ) -> Result<&'a str> {
        let mut greedy = !self.flags.contains(Flags::NON_GREEDY);
        if self.flags.contains(Flags::PERL_X) {
            if let Some(rest) = after.strip_prefix('?') {
                after = rest;
                greedy = !greedy;
            }
            // `a**` is an error in Perl, not a doubled star.
            if let Some(last) = last_repeat {
                return Err(ParseError::new(
                    ErrorCode::InvalidRepeatOp,
                    consumed(last, after),
                ));
            }
        }

        let text = consumed(before, after);
        let Some(Frame::Expr(sub)) = self.stack.pop() else {
            return Err(ParseError::new(ErrorCode::MissingRepeatArgument, text));
        };

        let height = sub.height + 1;
        let (re, size) = match kind {
            RepeatKind::Star => (Regexp::star(sub.re, greedy), sub.size + 2),
            RepeatKind::Plus => (Regexp::plus(sub.re, greedy), sub.size + 1),
            RepeatKind::Quest => (Regexp::quest(sub.re, greedy), sub.size + 1),
            RepeatKind::Counted(min, max) => {
                let re = Regexp::Repeat {
                    sub: Box::new(sub.re),
                    min,
                    max,
                    greedy,
                };
                let size = node_size(&re, &[sub.size]);
                (re, size)
            }
        };
        let node = Node { re, size, height };
        self.check_limits(&node)?;

        if let RepeatKind::Counted(min, max) = kind {
            if (min >= 2 || max.is_some_and(|max| max >= 2)) && !repeat_is_valid(&node.re, MAX_REPEAT)
            {
                return Err(ParseError::new(ErrorCode::InvalidRepeatSize, text));
            }
        }
        self.stack.push(Frame::Expr(node));
        Ok(after)
    }

    /// Parse `(?flags)`, `(?flags:`, `(?P<name>` or `(?<name>`.
    fn parse_perl_flags(&mut self, s: &'a str) -> Result<&'a str> {
        let named_p = s.len() > 4 && s[2..].starts_with("P<");
        let named = s.len() > 3 && s[2..].starts_with('<');
        if named_p || named {
            let name_start = if named_p { 4 } else { 3 };
            let Some(end) = s.find('>') else {
                return Err(ParseError::new(ErrorCode::InvalidNamedCapture, s));
            };
            let capture = &s[..=end];
            let name = &s[name_start..end];
            if !is_valid_capture_name(name) {
                return Err(ParseError::new(ErrorCode::InvalidNamedCapture, capture));
            }
            self.num_cap += 1;
            self.open_group(Some((self.num_cap, Some(name.to_string()))))?;
            return Ok(&s[end + 1..]);
        }

        let mut t = &s[2..];
        let mut flags = self.flags;
        let mut negated = false;
        let mut saw_flag = false;
        while let Some(c) = t.chars().next() {
            t = &t[c.len_utf8()..];
            match c {
                'i' => {
                    flags |= Flags::FOLD_CASE;
                    saw_flag = true;
                }
                'm' => {
                    flags -= Flags::ONE_LINE;
                    saw_flag = true;
                }
                's' => {
                    flags |= Flags::DOT_NL;
                    saw_flag = true;
                }
                'U' => {
                    flags |= Flags::NON_GREEDY;
                    saw_flag = true;
                }
                '-' => {
                    if negated {
                        break;
                    }
                    negated = true;
                    // Invert so the cases above clear flags instead.
                    flags = !flags;
                    saw_flag = false;
                }
                ':' | ')' => {
                    if negated {
                        if !saw_flag {
                            break;
                        }
                        flags = !flags;
                    }
                    if c == ':' {
                        self.open_group(None)?;
                    }
                    self.flags = flags;
                    return Ok(t);
                }
                _ => break,
            }
        }
        Err(ParseError::new(ErrorCode::InvalidPerlOp, consumed(s, t)))
    }

    fn parse_backslash(&mut self, t: &'a str) -> Result<&'a str> {
        if self.flags.contains(Flags::PERL_X) {
            match t[1..].chars().next() {
                Some('A') => {
                    self.op(Regexp::BeginText)?;
                    return Ok(&t[2..]);
                }
                Some('b') => {
                    self.op(Regexp::WordBoundary)?;
                    return Ok(&t[2..]);
                }
                Some('B') => {
                    self.op(Regexp::NoWordBoundary)?;
                    return Ok(&t[2..]);
                }
                // Any byte; not supported.
                Some('C') => return Err(ParseError::new(ErrorCode::InvalidEscape, &t[..2])),
                Some('Q') => {
                    let body = &t[2..];
                    let (lit, rest) = match body.find(r"\E") {
                        Some(i) => (&body[..i], &body[i + 2..]),
                        None => (body, ""),
                    };
                    for c in lit.chars() {
                        self.literal(c)?;
                    }
                    return Ok(rest);
                }
                Some('z') => {
                    self.op(Regexp::EndText)?;
                    return Ok(&t[2..]);
                }
                _ => {}
            }
        }

        let mut builder = ClassBuilder::new();
        if let Some(rest) = self.parse_unicode_class(t, &mut builder)? {
            self.push(Node::leaf(Regexp::CharClass(builder.build())))?;
            return Ok(rest);
        }
        if let Some(rest) = self.parse_perl_class_escape(t, &mut builder) {
            self.push(Node::leaf(Regexp::CharClass(builder.build())))?;
            return Ok(rest);
        }

        let (c, rest) = parse_escape(t)?;
        self.literal(c)?;
        Ok(rest)
    }

    /// Parse `\d`, `\S` and friends into `builder`.
    fn parse_perl_class_escape(&self, s: &'a str, builder: &mut ClassBuilder) -> Option<&'a str> {
        if !self.flags.contains(Flags::PERL_X) {
            return None;
        }
        let mut chars = s.chars();
        if chars.next() != Some('\\') {
            return None;
        }
        let (table, negated) = class::perl_group(chars.next()?)?;
        builder.push_table(table, negated, self.flags.contains(Flags::FOLD_CASE));
        Some(&s[2..])
    }

    /// Parse `\pL`, `\p{Greek}`, `\P{Lu}` or `\p{^Lu}` into `builder`.
    fn parse_unicode_class(
        &self,
        s: &'a str,
        builder: &mut ClassBuilder,
    ) -> Result<Option<&'a str>> {
        if !self.flags.contains(Flags::UNICODE_GROUPS) {
            return Ok(None);
        }
        let mut negated = match s.get(..2) {
            Some(r"\p") => false,
            Some(r"\P") => true,
            _ => return Ok(None),
        };

        let (seq, name, rest) = match s[2..].chars().next() {
            Some('{') => {
                let Some(end) = s.find('}') else {
                    return Err(ParseError::new(ErrorCode::InvalidCharRange, s));
                };
                (&s[..=end], &s[3..end], &s[end + 1..])
            }
            Some(c) => {
                let end = 2 + c.len_utf8();
                (&s[..end], &s[2..end], &s[end..])
            }
            None => (s, "", ""),
        };

        let name = match name.strip_prefix('^') {
            Some(name) => {
                negated = !negated;
                name
            }
            None => name,
        };
        let Some(table) = unicode::table(name) else {
            return Err(ParseError::new(ErrorCode::InvalidCharRange, seq));
        };
        builder.push_table(&table, negated, self.flags.contains(Flags::FOLD_CASE));
        Ok(Some(rest))
    }

    /// Parse `[:alpha:]` into `builder`. Returns `None` when `s` does not
    /// hold a complete POSIX class name.
    fn parse_named_class(
        &self,
        s: &'a str,
        builder: &mut ClassBuilder,
    ) -> Result<Option<&'a str>> {
        let Some(i) = s[2..].find(":]") else {
            return Ok(None);
        };
        let (name, rest) = s.split_at(i + 4);
        let Some((table, negated)) = class::posix_group(name) else {
            return Err(ParseError::new(ErrorCode::InvalidCharRange, name));
        };
        builder.push_table(table, negated, self.flags.contains(Flags::FOLD_CASE));
        Ok(Some(rest))
    }

    /// Parse a bracketed class starting at `[`.
    fn parse_class(&mut self, whole_class: &'a str) -> Result<&'a str> {
        let mut t = &whole_class[1..];
        let fold = self.flags.contains(Flags::FOLD_CASE);
        let mut builder = ClassBuilder::new();

        let mut negated = false;
        if let Some(rest) = t.strip_prefix('^') {
            negated = true;
            t = rest;
            // Added now so negation takes it out again.
            if !self.flags.contains(Flags::CLASS_NL) {
                builder.push_range('\n', '\n');
            }
        }

        // `]` and `-` are ordinary as the first character.
        let mut first = true;
        while t.is_empty() || !t.starts_with(']') || first {
            // POSIX only allows `-` first or last.
            if t.starts_with('-')
                && !self.flags.contains(Flags::PERL_X)
                && !first
                && !t[1..].starts_with(']')
            {
                let size = t[1..].chars().next().map_or(0, char::len_utf8);
                return Err(ParseError::new(
                    ErrorCode::InvalidCharRange,
                    &t[..1 + size],
                ));
            }
            first = false;

            if t.len() > 2 && t.starts_with("[:") {
                if let Some(rest) = self.parse_named_class(t, &mut builder)? {
                    t = rest;
                    continue;
                }
            }
            if let Some(rest) = self.parse_unicode_class(t, &mut builder)? {
                t = rest;
                continue;
            }
            if let Some(rest) = self.parse_perl_class_escape(t, &mut builder) {
                t = rest;
                continue;
            }

            let range = t;
            let (lo, rest) = parse_class_char(t, whole_class)?;
            t = rest;
            let mut hi = lo;
            // `[a-]` is `a` or `-`.
            if t.len() >= 2 && t.starts_with('-') && !t[1..].starts_with(']') {
                let (end, rest) = parse_class_char(&t[1..], whole_class)?;
                t = rest;
                hi = end;
                if hi < lo {
                    return Err(ParseError::new(
                        ErrorCode::InvalidCharRange,
                        consumed(range, t),
                    ));
                }
            }
            if fold {
                builder.push_folded_range(lo, hi);
            } else {
                builder.push_range(lo, hi);
            }
        }

        let mut class = builder.build();
        if negated {
            class = class.negated();
        }
        self.push(Node::leaf(Regexp::CharClass(class)))?;
        Ok(&t[1..])
    }

    fn finish(mut self) -> Result<Node> {
        self.concat()?;
        if self.swap_vertical_bar() {
            self.stack.pop();
        }
        self.alternate()?;

        if self.stack.len() != 1 {
            return Err(self.error(ErrorCode::MissingParen));
        }
        match self.stack.pop() {
            Some(Frame::Expr(node)) => Ok(node),
            _ => Err(self.error(ErrorCode::MissingParen)),
        }
    }
}

/// Build a concatenation or alternation, splicing in children of the
/// same kind. Alternations are then factored.
fn collapse(mut subs: Vec<Node>, op: Op) -> Node {
    if subs.len() == 1 {
        if let Some(node) = subs.pop() {
            return node;
        }
    }

    let mut children = Vec::with_capacity(subs.len());
    let mut sum = 0u64;
    let mut height = 0;
    for mut node in subs {
        let spliced = match &mut node.re {
            Regexp::Concat(inner) if op == Op::Concat => Some(std::mem::take(inner)),
            Regexp::Alternate(inner) if op == Op::Alternate => Some(std::mem::take(inner)),
            _ => None,
        };
        match spliced {
            Some(inner) => {
                sum += node.size;
                if op == Op::Alternate {
                    sum -= (inner.len() as u64).saturating_sub(1);
                }
                height = height.max(node.height - 1);
                children.extend(inner);
            }
            None => {
                sum += node.size;
                height = height.max(node.height);
                children.push(node.re);
            }
        }
    }

    let re = if op == Op::Alternate {
        let before = children.len();
        let mut children = factor(children);
        // Factoring only folds away single characters, classes and empty
        // matches, each of size 1.
        sum = sum.saturating_sub((before - children.len()) as u64);
        if children.len() == 1 {
            if let Some(only) = children.pop() {
                return Node::measure(only);
            }
        }
        sum += (children.len() as u64).saturating_sub(1);
        Regexp::Alternate(children)
    } else {
        Regexp::Concat(children)
    };
    Node {
        re,
        size: sum.max(1),
        height: height + 1,
    }
}

/// Simplify the alternatives of an alternation: runs of single characters
/// and classes become one class, and runs of empty matches become one.
fn factor(subs: Vec<Regexp>) -> Vec<Regexp> {
    let mut out = Vec::with_capacity(subs.len());
    let mut run = Vec::new();
    for re in subs {
        if is_char_class(&re) {
            run.push(re);
            continue;
        }
        flush_class_run(&mut run, &mut out);
        out.push(re);
    }
    flush_class_run(&mut run, &mut out);

    out.dedup_by(|a, b| *a == Regexp::EmptyMatch && *b == Regexp::EmptyMatch);
    out
}

fn flush_class_run(run: &mut Vec<Regexp>, out: &mut Vec<Regexp>) {
    if run.len() < 2 {
        out.append(run);
        return;
    }
    let most_complex = (0..run.len())
        .max_by_key(|&i| run[i].op())
        .unwrap_or(0);
    let mut dst = run.swap_remove(most_complex);
    for src in run.drain(..) {
        merge_char_class(&mut dst, &src);
    }
    clean_alt(&mut dst);
    out.push(dst);
}

/// Reports whether `re` matches exactly one character.
fn is_char_class(re: &Regexp) -> bool {
    match re {
        Regexp::Literal { runes, .. } => runes.len() == 1,
        Regexp::CharClass(_) | Regexp::AnyCharNotNL | Regexp::AnyChar => true,
        _ => false,
    }
}

/// The set of characters matched by a one-character expression.
fn class_of(re: &Regexp) -> CharClass {
    match re {
        Regexp::Literal { runes, fold } => {
            let mut builder = ClassBuilder::new();
            for &c in runes {
                builder.push_literal(c, *fold);
            }
            builder.build()
        }
        Regexp::CharClass(class) => class.clone(),
        Regexp::AnyCharNotNL => CharClass::any_not_nl(),
        Regexp::AnyChar => CharClass::any(),
        _ => CharClass::empty(),
    }
}

/// Add the characters of `src` to `dst`; both match one character.
fn merge_char_class(dst: &mut Regexp, src: &Regexp) {
    match dst {
        Regexp::AnyChar => {}
        Regexp::AnyCharNotNL => {
            if class_of(src).contains('\n') {
                *dst = Regexp::AnyChar;
            }
        }
        Regexp::CharClass(class) => class.union(&class_of(src)),
        Regexp::Literal { .. } => {
            if *dst == *src {
                return;
            }
            let mut class = class_of(dst);
            class.union(&class_of(src));
            *dst = Regexp::CharClass(class);
        }
        _ => {}
    }
}

/// Replace a full class by the equivalent any-character node.
fn clean_alt(re: &mut Regexp) {
    let replacement = match re {
        Regexp::CharClass(class) if class.is_any() => Regexp::AnyChar,
        Regexp::CharClass(class) if class.is_any_not_nl() => Regexp::AnyCharNotNL,
        _ => return,
    };
    *re = replacement;
}

/// If `class` is a character and its case twin, like `[Aa]`, return the
/// smaller one.
fn fold_pair(class: &CharClass) -> Option<char> {
    let (a, b) = match class.ranges() {
        [(a, a_hi), (b, b_hi)] if a == a_hi && b == b_hi => (*a, *b),
        [(lo, hi)] if *lo as u32 + 1 == *hi as u32 => (*lo, *hi),
        _ => return None,
    };
    (unicode::simple_fold(a) == b && unicode::simple_fold(b) == a).then_some(a)
}

/// Check that nested counted repetitions do not multiply past `n`.
fn repeat_is_valid(re: &Regexp, n: u32) -> bool {
    let mut stack = vec![(re, n)];
    while let Some((re, mut n)) = stack.pop() {
        if let Regexp::Repeat { min, max, .. } = re {
            let m = match max {
                Some(0) => continue,
                Some(max) => *max,
                None => *min,
            };
            if m > n {
                return false;
            }
            if m > 0 {
                n /= m;
            }
        }
        stack.extend(re.subs().iter().map(|sub| (sub, n)));
    }
    true
}

/// Capture names are `[A-Za-z0-9_]+`.
fn is_valid_capture_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b == b'_' || b.is_ascii_alphanumeric())
}

/// Parse `{min}`, `{min,}` or `{min,max}`. Counts too large to represent
/// come back as `u32::MAX`.
fn parse_repeat(s: &str) -> Option<(u32, Option<u32>, &str)> {
    let s = s.strip_prefix('{')?;
    let (min, s) = parse_int(s)?;
    let (max, s) = match s.strip_prefix(',') {
        Some(s) if s.starts_with('}') => (None, s),
        Some(s) => {
            let (max, s) = parse_int(s)?;
            (Some(max), s)
        }
        None => (Some(min), s),
    };
    let rest = s.strip_prefix('}')?;
    Some((min, max, rest))
}

/// Parse a decimal count without leading zeros.
fn parse_int(s: &str) -> Option<(u32, &str)> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || (digits > 1 && s.starts_with('0')) {
        return None;
    }
    let (num, rest) = s.split_at(digits);
    let n = num.bytes().fold(0u32, |n, d| {
        n.saturating_mul(10).saturating_add(u32::from(d - b'0'))
    });
    Some((n, rest))
}

fn parse_class_char<'a>(s: &'a str, whole_class: &str) -> Result<(char, &'a str)> {
    match s.chars().next() {
        None => Err(ParseError::new(ErrorCode::MissingBracket, whole_class)),
        // Escapes are allowed even where they are not needed.
        Some('\\') => parse_escape(s),
        Some(c) => Ok((c, &s[c.len_utf8()..])),
    }
}

/// Parse a single-character escape starting at the backslash.
fn parse_escape(s: &str) -> Result<(char, &str)> {
    let mut t = &s[1..];
    let Some(c) = t.chars().next() else {
        return Err(ParseError::new(ErrorCode::TrailingBackslash, ""));
    };
    t = &t[c.len_utf8()..];

    match c {
        // A single non-zero digit would be a backreference.
        '1'..='7' if !t.starts_with(|d: char| ('0'..='7').contains(&d)) => {}
        '0'..='7' => {
            let mut value = c as u32 - '0' as u32;
            for _ in 0..2 {
                match t.chars().next() {
                    Some(d @ '0'..='7') => {
                        value = value * 8 + (d as u32 - '0' as u32);
                        t = &t[1..];
                    }
                    _ => break,
                }
            }
            if let Some(c) = char::from_u32(value) {
                return Ok((c, t));
            }
        }
        'x' => 'hex: {
            let Some(c) = t.chars().next() else {
                break 'hex;
            };
            t = &t[c.len_utf8()..];
            if c == '{' {
                let mut value: u32 = 0;
                let mut digits = 0;
                loop {
                    let Some(c) = t.chars().next() else {
                        break 'hex;
                    };
                    t = &t[c.len_utf8()..];
                    if c == '}' {
                        break;
                    }
                    let Some(v) = c.to_digit(16) else {
                        break 'hex;
                    };
                    value = value * 16 + v;
                    if value > char::MAX as u32 {
                        break 'hex;
                    }
                    digits += 1;
                }
                if digits == 0 {
                    break 'hex;
                }
                // Surrogates are not characters.
                if let Some(c) = char::from_u32(value) {
                    return Ok((c, t));
                }
                break 'hex;
            }

            let hi = c.to_digit(16);
            let Some(c) = t.chars().next() else {
                break 'hex;
            };
            t = &t[c.len_utf8()..];
            if let (Some(hi), Some(lo)) = (hi, c.to_digit(16)) {
                return Ok((char::from((hi * 16 + lo) as u8), t));
            }
        }
        // No `\b`: that is the word boundary, not backspace.
        'a' => return Ok(('\x07', t)),
        'f' => return Ok(('\x0C', t)),
        'n' => return Ok(('\n', t)),
        'r' => return Ok(('\r', t)),
        't' => return Ok(('\t', t)),
        'v' => return Ok(('\x0B', t)),
        // Escaped punctuation is always itself.
        c if c.is_ascii() && !c.is_ascii_alphanumeric() => return Ok((c, t)),
        _ => {}
    }
    Err(ParseError::new(ErrorCode::InvalidEscape, consumed(s, t)))
}
