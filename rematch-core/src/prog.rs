//! Compiled program representation
//!
//! A [`Prog`] is a flat arena of [`Inst`]s linked by index. Instruction 0
//! is always `Fail`, so an index of 0 doubles as "nowhere".

use std::fmt;

use bitflags::bitflags;

use crate::class::CharClass;
use crate::unicode;

bitflags! {
    /// Zero-width assertions
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EmptyOp: u8 {
        const BEGIN_LINE = 1 << 0;
        const END_LINE = 1 << 1;
        const BEGIN_TEXT = 1 << 2;
        const END_TEXT = 1 << 3;
        const WORD_BOUNDARY = 1 << 4;
        const NO_WORD_BOUNDARY = 1 << 5;
    }
}

impl EmptyOp {
    /// The assertions that hold between `before` and `after`.
    ///
    /// `None` stands for the edge of the input.
    pub fn context(before: Option<char>, after: Option<char>) -> EmptyOp {
        let mut op = EmptyOp::NO_WORD_BOUNDARY;
        let mut boundary = false;
        match before {
            Some(c) if unicode::is_word_char(c) => boundary = true,
            Some('\n') => op |= EmptyOp::BEGIN_LINE,
            None => op |= EmptyOp::BEGIN_TEXT | EmptyOp::BEGIN_LINE,
            Some(_) => {}
        }
        match after {
            Some(c) if unicode::is_word_char(c) => boundary = !boundary,
            Some('\n') => op |= EmptyOp::END_LINE,
            None => op |= EmptyOp::END_TEXT | EmptyOp::END_LINE,
            Some(_) => {}
        }
        if boundary {
            op ^= EmptyOp::WORD_BOUNDARY | EmptyOp::NO_WORD_BOUNDARY;
        }
        op
    }
}

/// A single instruction
///
/// `out` is the next instruction; `Alt` also has `arg`, the lower
/// priority branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    Alt { out: usize, arg: usize },
    /// An `Alt` where one branch loops over any character and the other
    /// leads straight to `Match`
    AltMatch { out: usize, arg: usize },
    Capture { out: usize, slot: usize },
    EmptyWidth { out: usize, look: EmptyOp },
    Match,
    Fail,
    Nop { out: usize },
    Rune { out: usize, class: CharClass },
    Rune1 { out: usize, c: char },
    RuneAny { out: usize },
    RuneAnyNotNL { out: usize },
}

impl Inst {
    /// The next instruction, if this one has one
    pub fn out(&self) -> Option<usize> {
        match self {
            Inst::Alt { out, .. }
            | Inst::AltMatch { out, .. }
            | Inst::Capture { out, .. }
            | Inst::EmptyWidth { out, .. }
            | Inst::Nop { out }
            | Inst::Rune { out, .. }
            | Inst::Rune1 { out, .. }
            | Inst::RuneAny { out }
            | Inst::RuneAnyNotNL { out } => Some(*out),
            Inst::Match | Inst::Fail => None,
        }
    }

    /// Check if this instruction consumes a character
    pub fn is_rune(&self) -> bool {
        matches!(
            self,
            Inst::Rune { .. } | Inst::Rune1 { .. } | Inst::RuneAny { .. } | Inst::RuneAnyNotNL { .. }
        )
    }

    /// Check if this rune instruction accepts `c`
    pub fn matches_char(&self, c: char) -> bool {
        match self {
            Inst::Rune { class, .. } => class.contains(c),
            Inst::Rune1 { c: want, .. } => *want == c,
            Inst::RuneAny { .. } => true,
            Inst::RuneAnyNotNL { .. } => c != '\n',
            _ => false,
        }
    }

    /// The characters this rune instruction accepts
    pub fn char_ranges(&self) -> Vec<(char, char)> {
        match self {
            Inst::Rune { class, .. } => class.ranges().to_vec(),
            Inst::Rune1 { c, .. } => vec![(*c, *c)],
            Inst::RuneAny { .. } => vec![('\0', char::MAX)],
            Inst::RuneAnyNotNL { .. } => vec![('\0', '\t'), ('\x0B', char::MAX)],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Inst::Alt { out, arg } => write!(f, "alt -> {out}, {arg}"),
            Inst::AltMatch { out, arg } => write!(f, "altmatch -> {out}, {arg}"),
            Inst::Capture { out, slot } => write!(f, "cap {slot} -> {out}"),
            Inst::EmptyWidth { out, look } => write!(f, "empty {} -> {out}", look.bits()),
            Inst::Match => f.write_str("match"),
            Inst::Fail => f.write_str("fail"),
            Inst::Nop { out } => write!(f, "nop -> {out}"),
            Inst::Rune { out, class } => write!(f, "rune {class} -> {out}"),
            Inst::Rune1 { out, c } => write!(f, "rune1 {:?} -> {out}", c.to_string()),
            Inst::RuneAny { out } => write!(f, "any -> {out}"),
            Inst::RuneAnyNotNL { out } => write!(f, "anynotnl -> {out}"),
        }
    }
}

/// A compiled program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prog {
    /// The instructions; index 0 is `Fail`
    pub inst: Vec<Inst>,
    /// Entry point
    pub start: usize,
    /// Number of capture slots, two per group including group 0
    pub num_cap: usize,
}

impl Prog {
    /// Number of instructions
    pub fn len(&self) -> usize {
        self.inst.len()
    }

    /// Check if the program holds only the `Fail` instruction
    pub fn is_empty(&self) -> bool {
        self.inst.len() <= 1
    }

    /// Follow `Nop` and `Capture` instructions from `pc`.
    pub fn skip_nop(&self, mut pc: usize) -> usize {
        while let Inst::Nop { out } | Inst::Capture { out, .. } = self.inst[pc] {
            pc = out;
        }
        pc
    }

    /// The literal text every match must begin with, and whether that
    /// text is the entire match.
    pub fn prefix(&self) -> (String, bool) {
        let mut prefix = String::new();
        let mut pc = self.skip_nop(self.start);
        while let Inst::Rune1 { out, c } = self.inst[pc] {
            prefix.push(c);
            pc = self.skip_nop(out);
        }
        (prefix, self.inst[pc] == Inst::Match)
    }

    /// The assertions every match must satisfy at its start, or `None`
    /// when the program can never match.
    pub fn start_cond(&self) -> Option<EmptyOp> {
        let mut flag = EmptyOp::empty();
        let mut pc = self.start;
        loop {
            match &self.inst[pc] {
                Inst::EmptyWidth { out, look } => {
                    flag |= *look;
                    pc = *out;
                }
                Inst::Capture { out, .. } | Inst::Nop { out } => pc = *out,
                Inst::Fail => return None,
                _ => return Some(flag),
            }
        }
    }
}

impl fmt::Display for Prog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pc, inst) in self.inst.iter().enumerate() {
            let mark = if pc == self.start { "*" } else { "" };
            writeln!(f, "{:>3}{mark:1}\t{inst}", pc)?;
        }
        Ok(())
    }
}
