//! Bounded backtracking
//!
//! A depth-first search over the program that remembers every
//! `(instruction, position)` pair it has already explored in a bitmap, and
//! never explores one twice. Total work is bounded by the bitmap size, so
//! the executor is only used when `program length × (input length + 1)`
//! stays small.

use bitvec::vec::BitVec;
use log::trace;

use crate::input::{Input, Prefix};
use crate::prog::{EmptyOp, Inst, Prog};

/// Longest program worth backtracking.
pub const MAX_BACKTRACK_PROG: usize = 500;
/// Size budget of the visited bitmap, in bits.
pub const MAX_BACKTRACK_VECTOR: usize = 256 * 1024;

/// Longest input the backtracker accepts for `prog`; inputs must be
/// strictly shorter.
pub fn max_bit_state_len(prog: &Prog) -> usize {
    if prog.len() > MAX_BACKTRACK_PROG {
        return 0;
    }
    MAX_BACKTRACK_VECTOR / prog.len()
}

#[derive(Debug, Clone, Copy)]
enum Job {
    /// Run from `pc` at `pos`; already marked visited.
    Explore { pc: usize, pos: usize },
    /// Try the second leg of an `Alt` once the first leg has failed.
    Branch { pc: usize, pos: usize },
    /// Undo a capture write while unwinding.
    Restore { slot: usize, old: Option<usize> },
}

/// Per-search state of the backtracker.
#[derive(Debug, Default)]
pub(crate) struct BitState {
    end: usize,
    jobs: Vec<Job>,
    visited: BitVec,
    slots: Vec<Option<usize>>,
    matched: Vec<Option<usize>>,
    steps: usize,
}

impl BitState {
    fn reset(&mut self, prog: &Prog, end: usize, ncap: usize) {
        self.end = end;
        self.jobs.clear();
        self.visited.clear();
        self.visited.resize(prog.len() * (end + 1), false);
        self.slots.clear();
        self.slots.resize(ncap, None);
        self.matched.clear();
        self.matched.resize(ncap, None);
        self.steps = 0;
    }

    /// Instructions executed by the last search.
    #[cfg(test)]
    fn steps(&self) -> usize {
        self.steps
    }

    /// Mark `(pc, pos)` visited, returning false if it already was.
    fn should_visit(&mut self, pc: usize, pos: usize) -> bool {
        let n = pc * (self.end + 1) + pos;
        if self.visited[n] {
            return false;
        }
        self.visited.set(n, true);
        true
    }

    fn push(&mut self, prog: &Prog, pc: usize, pos: usize) {
        if prog.inst[pc] != Inst::Fail && self.should_visit(pc, pos) {
            self.jobs.push(Job::Explore { pc, pos });
        }
    }

    /// Search for a match starting exactly at `pos`.
    fn try_backtrack(&mut self, prog: &Prog, input: &Input<'_>, pc: usize, pos: usize) -> bool {
        self.push(prog, pc, pos);
        while let Some(job) = self.jobs.pop() {
            let (mut pc, mut pos) = match job {
                Job::Explore { pc, pos } => (pc, pos),
                Job::Branch { pc, pos } => {
                    if !self.should_visit(pc, pos) {
                        continue;
                    }
                    (pc, pos)
                }
                Job::Restore { slot, old } => {
                    self.slots[slot] = old;
                    continue;
                }
            };

            loop {
                self.steps += 1;
                match &prog.inst[pc] {
                    Inst::Fail => break,
                    Inst::Alt { out, arg } => {
                        // Queue the second leg rather than marking it now,
                        // so the first leg may still reach it on its own.
                        self.jobs.push(Job::Branch { pc: *arg, pos });
                        pc = *out;
                    }
                    Inst::AltMatch { out, arg } => {
                        if prog.inst[*out].is_rune() {
                            // `out` eats the rest of the input, then `arg`
                            // matches.
                            self.push(prog, *arg, self.end);
                            pc = *arg;
                            pos = self.end;
                        } else {
                            self.push(prog, *out, self.end);
                            pc = *out;
                        }
                    }
                    Inst::Capture { out, slot } => {
                        if *slot < self.slots.len() {
                            self.jobs.push(Job::Restore {
                                slot: *slot,
                                old: self.slots[*slot],
                            });
                            self.slots[*slot] = Some(pos);
                        }
                        pc = *out;
                    }
                    Inst::EmptyWidth { out, look } => {
                        if !input.context(pos).contains(*look) {
                            break;
                        }
                        pc = *out;
                    }
                    Inst::Nop { out } => pc = *out,
                    Inst::Match => {
                        if !self.slots.is_empty() {
                            self.slots[1] = Some(pos);
                            self.matched.copy_from_slice(&self.slots);
                        }
                        return true;
                    }
                    rune => match (input.step(pos), rune.out()) {
                        (Some((c, width)), Some(out)) if rune.matches_char(c) => {
                            pos += width;
                            pc = out;
                        }
                        _ => break,
                    },
                }
                if !self.should_visit(pc, pos) {
                    break;
                }
            }
        }
        false
    }

    /// Find the leftmost match at or after `pos`, filling `ncap` slots.
    pub fn search(
        &mut self,
        prog: &Prog,
        cond: EmptyOp,
        prefix: Option<&Prefix>,
        input: &Input<'_>,
        pos: usize,
        ncap: usize,
    ) -> Option<Vec<Option<usize>>> {
        let anchored = cond.contains(EmptyOp::BEGIN_TEXT);
        if anchored && pos != 0 {
            return None;
        }
        self.reset(prog, input.len(), ncap);

        if anchored {
            if ncap > 0 {
                self.slots[0] = Some(pos);
            }
            if !self.try_backtrack(prog, input, prog.start, pos) {
                return None;
            }
        } else {
            // The bitmap is kept across start positions: a state that
            // failed once fails again, so the total work stays linear.
            let mut pos = pos;
            loop {
                if let Some(prefix) = prefix {
                    pos += input.index(prefix, pos)?;
                }
                if ncap > 0 {
                    self.slots[0] = Some(pos);
                }
                if self.try_backtrack(prog, input, prog.start, pos) {
                    break;
                }
                let (_, width) = input.step(pos)?;
                pos += width;
            }
        }
        trace!("backtrack: matched after {} steps", self.steps);
        Some(self.matched.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Flags;
    use crate::compile::compile;
    use crate::parser::parse;

    fn prog(pattern: &str) -> Prog {
        compile(&parse(pattern, Flags::PERL).unwrap().simplify())
    }

    fn run(pattern: &str, text: &str) -> Option<Vec<Option<usize>>> {
        let prog = prog(pattern);
        let cond = prog.start_cond().unwrap();
        let prefix = Prefix::new(&prog.prefix().0);
        let mut state = BitState::default();
        state.search(&prog, cond, prefix.as_ref(), &Input::new(text), 0, prog.num_cap)
    }

    #[test]
    fn test_leftmost_first() {
        assert_eq!(run("a|ab", "ab"), Some(vec![Some(0), Some(1)]));
        assert_eq!(run("ab|a", "ab"), Some(vec![Some(0), Some(2)]));
        assert_eq!(run("b", "aab"), Some(vec![Some(2), Some(3)]));
    }

    #[test]
    fn test_greedy_and_lazy() {
        assert_eq!(run("a+", "aaa"), Some(vec![Some(0), Some(3)]));
        assert_eq!(run("a+?", "aaa"), Some(vec![Some(0), Some(1)]));
        assert_eq!(
            run("(a*)(a*)", "aa"),
            Some(vec![Some(0), Some(2), Some(0), Some(2), Some(2), Some(2)])
        );
        assert_eq!(
            run("(a*?)(a*)", "aa"),
            Some(vec![Some(0), Some(2), Some(0), Some(0), Some(0), Some(2)])
        );
    }

    #[test]
    fn test_captures_restored() {
        // The failed first leg must not leave group 1 set.
        assert_eq!(
            run("(a)x|ab", "ab"),
            Some(vec![Some(0), Some(2), None, None])
        );
        assert_eq!(
            run("(x){1,2}", "xx"),
            Some(vec![Some(0), Some(2), Some(1), Some(2)])
        );
    }

    #[test]
    fn test_anchors() {
        assert_eq!(run("^b", "ab"), None);
        assert_eq!(run("(?m)^b", "a\nb"), Some(vec![Some(2), Some(3)]));
        assert_eq!(run(r"\bb", "a b"), Some(vec![Some(2), Some(3)]));
        assert_eq!(run("a$", "ab"), None);
    }

    #[test]
    fn test_prefix_scan() {
        assert_eq!(run("abc+", "xxabxabcc"), Some(vec![Some(5), Some(9)]));
        assert_eq!(run("abc+", "xxab"), None);
    }

    #[test]
    fn test_alt_match() {
        assert_eq!(run("a(?s:.*)", "xa\nbc"), Some(vec![Some(1), Some(5)]));
        assert_eq!(run("a(?s:.*?)", "xa\nbc"), Some(vec![Some(1), Some(2)]));
    }

    #[test]
    fn test_match_only() {
        let prog = prog("a+b");
        let mut state = BitState::default();
        let cond = prog.start_cond().unwrap();
        let input = Input::new("xaab");
        assert_eq!(state.search(&prog, cond, None, &input, 0, 0), Some(vec![]));
        let input = Input::new("xaa");
        assert_eq!(state.search(&prog, cond, None, &input, 0, 0), None);
    }

    #[test]
    fn test_step_bound() {
        let cases = [
            ("(a*)*b", "a".repeat(30)),
            ("(a|aa)*c", "a".repeat(40)),
            ("(?:a+)+$", format!("{}b", "a".repeat(25))),
            ("(x+x+)+y", "x".repeat(20)),
        ];
        for (pattern, text) in cases {
            let prog = prog(pattern);
            let cond = prog.start_cond().unwrap();
            let mut state = BitState::default();
            let result = state.search(&prog, cond, None, &Input::new(&text), 0, prog.num_cap);
            assert_eq!(result, None, "pattern {pattern}");
            let bound = 2 * prog.len() * (text.len() + 1);
            assert!(
                state.steps() <= bound,
                "pattern {pattern}: {} steps, bound {bound}",
                state.steps()
            );
        }
    }

    #[test]
    fn test_max_len() {
        let small = prog("abc");
        assert_eq!(max_bit_state_len(&small), MAX_BACKTRACK_VECTOR / small.len());
        let large = prog(&"a?".repeat(300));
        assert!(large.len() > MAX_BACKTRACK_PROG);
        assert_eq!(max_bit_state_len(&large), 0);
    }
}
