//! One-pass execution
//!
//! A program is one-pass when, at every `Alt`, the next input character
//! alone decides which leg can still match. Such a program runs as a
//! deterministic automaton: no thread list, no backtracking, one step per
//! character. Only programs anchored at the start of the text qualify, and
//! every path to `Match` has to go through an end-of-text assertion.

use log::trace;

use crate::class;
use crate::input::Input;
use crate::prog::{EmptyOp, Inst, Prog};
use crate::sparse::SparseSet;

/// Programs at least this long are not analyzed.
pub const MAX_ONEPASS_PROG: usize = 1000;

/// An instruction of a one-pass program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnePassInst {
    pub inst: Inst,
    /// For `Alt`s, the first characters of both legs, sorted and disjoint.
    pub ranges: Vec<(char, char)>,
    /// For `Alt`s, the leg to take for each entry of `ranges`.
    pub next: Vec<usize>,
}

impl OnePassInst {
    /// The leg of an `Alt` that `c` selects.
    ///
    /// With no character, or one neither leg starts with, an `AltMatch`
    /// falls through to the leg that leads to `Match` and an `Alt` fails.
    fn select(&self, c: Option<char>) -> usize {
        if let Some(i) = c.and_then(|c| class::range_index(&self.ranges, c)) {
            return self.next[i];
        }
        match self.inst {
            Inst::AltMatch { out, .. } => out,
            _ => 0,
        }
    }
}

/// A program that can run without backtracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnePassProg {
    pub inst: Vec<OnePassInst>,
    pub start: usize,
    pub num_cap: usize,
    /// Literal text right after the start anchor.
    prefix: String,
    /// Where execution resumes once `prefix` has been matched.
    prefix_end: usize,
}

impl OnePassProg {
    /// Build the one-pass form of `prog`, or `None` when `prog` is not
    /// one-pass.
    pub fn new(prog: &Prog) -> Option<OnePassProg> {
        if prog.start == 0 {
            return None;
        }
        match prog.inst[prog.start] {
            Inst::EmptyWidth { look, .. } if look.contains(EmptyOp::BEGIN_TEXT) => {}
            _ => return None,
        }
        if !ends_at_end_text(prog) || prog.len() >= MAX_ONEPASS_PROG {
            return None;
        }

        let mut builder = Builder::new(prog);
        if !builder.run() {
            return None;
        }

        let (prefix, prefix_end) = anchored_prefix(prog);
        let inst = builder
            .inst
            .into_iter()
            .zip(builder.ranges)
            .zip(builder.next)
            .map(|((inst, ranges), next)| match inst {
                Inst::Alt { .. } | Inst::AltMatch { .. } => OnePassInst { inst, ranges, next },
                inst => OnePassInst {
                    inst,
                    ranges: Vec::new(),
                    next: Vec::new(),
                },
            })
            .collect();
        Some(OnePassProg {
            inst,
            start: prog.start,
            num_cap: prog.num_cap,
            prefix,
            prefix_end,
        })
    }

    /// Run the program on `input` from `pos`, filling `ncap` capture slots.
    pub(crate) fn search(
        &self,
        input: &Input<'_>,
        pos: usize,
        ncap: usize,
    ) -> Option<Vec<Option<usize>>> {
        let start = pos;
        let mut pos = pos;
        let mut slots = vec![None; ncap];
        let mut before = input.before(pos);
        let mut current = input.step(pos);
        let mut pc = self.start;

        if pos == 0 && !self.prefix.is_empty() {
            let Inst::EmptyWidth { look, .. } = self.inst[pc].inst else {
                return None;
            };
            let at = EmptyOp::context(None, current.map(|(c, _)| c));
            if at.contains(look) {
                if !input.has_prefix(pos, &self.prefix) {
                    return None;
                }
                trace!("one-pass: skipped prefix {:?}", self.prefix);
                pos += self.prefix.len();
                before = self.prefix.chars().next_back();
                current = input.step(pos);
                pc = self.prefix_end;
            }
        }

        loop {
            let op = &self.inst[pc];
            match &op.inst {
                Inst::Match => {
                    if ncap > 0 {
                        slots[0] = Some(start);
                        slots[1] = Some(pos);
                    }
                    return Some(slots);
                }
                Inst::Fail => return None,
                Inst::Alt { .. } | Inst::AltMatch { .. } => {
                    pc = op.select(current.map(|(c, _)| c));
                }
                Inst::Nop { out } => pc = *out,
                Inst::Capture { out, slot } => {
                    if *slot < ncap {
                        slots[*slot] = Some(pos);
                    }
                    pc = *out;
                }
                Inst::EmptyWidth { out, look } => {
                    let at = EmptyOp::context(before, current.map(|(c, _)| c));
                    if !at.contains(*look) {
                        return None;
                    }
                    pc = *out;
                }
                rune => {
                    let (c, width) = current?;
                    if !rune.matches_char(c) {
                        return None;
                    }
                    pc = rune.out()?;
                    pos += width;
                    before = Some(c);
                    current = input.step(pos);
                }
            }
        }
    }
}

/// Check that no instruction reaches `Match` except through an
/// end-of-text assertion.
fn ends_at_end_text(prog: &Prog) -> bool {
    let is_match = |pc: usize| prog.inst[pc] == Inst::Match;
    prog.inst.iter().all(|inst| match inst {
        Inst::Alt { out, arg } | Inst::AltMatch { out, arg } => !is_match(*out) && !is_match(*arg),
        Inst::EmptyWidth { out, look } => !is_match(*out) || look.contains(EmptyOp::END_TEXT),
        inst => !inst.out().is_some_and(is_match),
    })
}

/// The literal text following the start anchor, and the instruction
/// after it.
fn anchored_prefix(prog: &Prog) -> (String, usize) {
    let Inst::EmptyWidth { out, .. } = prog.inst[prog.start] else {
        return (String::new(), prog.start);
    };
    let mut pc = out;
    while let Inst::Nop { out } = prog.inst[pc] {
        pc = out;
    }
    let mut prefix = String::new();
    while let Inst::Rune1 { out, c } = prog.inst[pc] {
        prefix.push(c);
        pc = out;
    }
    if prefix.is_empty() {
        return (prefix, prog.start);
    }
    (prefix, pc)
}

/// Merge the first-character sets of two `Alt` legs. Fails when they
/// overlap, because then the next character cannot choose a leg.
fn merge_ranges(
    left: &[(char, char)],
    right: &[(char, char)],
    left_pc: usize,
    right_pc: usize,
) -> Option<(Vec<(char, char)>, Vec<usize>)> {
    let mut merged: Vec<(char, char)> = Vec::with_capacity(left.len() + right.len());
    let mut next = Vec::with_capacity(left.len() + right.len());
    let (mut lx, mut rx) = (0, 0);
    while lx < left.len() || rx < right.len() {
        let take_left = rx >= right.len() || (lx < left.len() && left[lx].0 <= right[rx].0);
        let (range, pc) = if take_left {
            lx += 1;
            (left[lx - 1], left_pc)
        } else {
            rx += 1;
            (right[rx - 1], right_pc)
        };
        if let Some(&(_, hi)) = merged.last()
            && range.0 <= hi
        {
            return None;
        }
        merged.push(range);
        next.push(pc);
    }
    Some((merged, next))
}

/// Working state of the one-pass analysis.
struct Builder<'p> {
    prog: &'p Prog,
    /// Copy of the program whose `Alt`s get reordered.
    inst: Vec<Inst>,
    /// First characters that can be consumed from each instruction.
    ranges: Vec<Vec<(char, char)>>,
    /// Successor per entry of `ranges`.
    next: Vec<Vec<usize>>,
    /// Whether `Match` is reachable without consuming input.
    matches: Vec<bool>,
    /// Instructions still to analyze.
    pending: SparseSet,
    /// Instructions seen during the current walk.
    visited: SparseSet,
}

impl<'p> Builder<'p> {
    fn new(prog: &'p Prog) -> Self {
        let n = prog.len();
        Builder {
            prog,
            inst: prog.inst.clone(),
            ranges: vec![Vec::new(); n],
            next: vec![Vec::new(); n],
            matches: vec![false; n],
            pending: SparseSet::new(n),
            visited: SparseSet::new(n),
        }
    }

    fn run(&mut self) -> bool {
        self.pending.insert(self.prog.start);
        let mut i = 0;
        while let Some(pc) = self.pending.get(i) {
            i += 1;
            self.visited.clear();
            if !self.check(pc) {
                return false;
            }
        }
        true
    }

    /// Walk the instructions reachable from `pc` without consuming input,
    /// filling in their character sets. Returns false on ambiguity.
    fn check(&mut self, pc: usize) -> bool {
        if !self.visited.insert(pc) {
            return true;
        }
        match self.inst[pc].clone() {
            Inst::Alt { out, arg } | Inst::AltMatch { out, arg } => {
                if !(self.check(out) && self.check(arg)) {
                    return false;
                }
                let (mut out, mut arg) = (out, arg);
                if self.matches[out] && self.matches[arg] {
                    return false;
                }
                // The leg that can match without input goes in `out`.
                if self.matches[arg] {
                    std::mem::swap(&mut out, &mut arg);
                }
                self.inst[pc] = if self.matches[out] {
                    self.matches[pc] = true;
                    Inst::AltMatch { out, arg }
                } else if matches!(self.inst[pc], Inst::AltMatch { .. }) {
                    Inst::AltMatch { out, arg }
                } else {
                    Inst::Alt { out, arg }
                };
                match merge_ranges(&self.ranges[out], &self.ranges[arg], out, arg) {
                    Some((ranges, next)) => {
                        self.ranges[pc] = ranges;
                        self.next[pc] = next;
                        true
                    }
                    None => false,
                }
            }
            Inst::Capture { out, .. } | Inst::Nop { out } | Inst::EmptyWidth { out, .. } => {
                let ok = self.check(out);
                self.matches[pc] = self.matches[out];
                self.ranges[pc] = self.ranges[out].clone();
                self.next[pc] = vec![out; self.ranges[pc].len() + 1];
                ok
            }
            Inst::Match => {
                self.matches[pc] = true;
                true
            }
            Inst::Fail => {
                self.matches[pc] = false;
                true
            }
            rune => {
                self.matches[pc] = false;
                if !self.next[pc].is_empty() {
                    return true;
                }
                let Some(out) = rune.out() else {
                    return false;
                };
                self.pending.insert(out);
                self.ranges[pc] = rune.char_ranges();
                self.next[pc] = vec![out; self.ranges[pc].len() + 1];
                true
            }
        }
    }
}
