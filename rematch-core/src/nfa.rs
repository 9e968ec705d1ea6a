//! Pike VM
//!
//! Simulates every live thread of the program in lockstep, one input
//! character at a time. Threads are kept in priority order and each
//! instruction holds at most one thread per step, so the first thread to
//! reach an instruction wins and leftmost-first semantics fall out of the
//! queue order. Work is O(program length × input length).

use crate::input::{Input, Prefix};
use crate::prog::{EmptyOp, Inst, Prog};
use crate::sparse::SparseSet;

type Slots = Vec<Option<usize>>;

/// Pending work of the epsilon closure.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Explore(usize),
    RestoreCapture { slot: usize, old: Option<usize> },
}

/// The threads alive at one input position, in priority order.
#[derive(Debug, Default)]
struct Queue {
    set: SparseSet,
    /// Capture slots of the thread parked at each instruction. Only
    /// instructions that consume input or match hold a thread.
    threads: Vec<Option<Slots>>,
}

impl Queue {
    fn reset(&mut self, prog_len: usize) {
        self.set.reset(prog_len);
        if self.threads.len() < prog_len {
            self.threads.resize(prog_len, None);
        }
    }

    fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Drop every thread, recycling its slots into `free`.
    fn clear(&mut self, free: &mut Vec<Slots>) {
        for i in 0..self.set.len() {
            if let Some(pc) = self.set.get(i)
                && let Some(slots) = self.threads[pc].take()
            {
                free.push(slots);
            }
        }
        self.set.clear();
    }

    /// Add the epsilon closure of `pc` at `pos`, where `at` holds, with
    /// `caps` as the capture slots so far.
    #[allow(clippy::too_many_arguments)]
    fn add(
        &mut self,
        prog: &Prog,
        stack: &mut Vec<Frame>,
        free: &mut Vec<Slots>,
        pc: usize,
        pos: usize,
        caps: &mut [Option<usize>],
        at: EmptyOp,
    ) {
        stack.push(Frame::Explore(pc));
        while let Some(frame) = stack.pop() {
            let mut pc = match frame {
                Frame::Explore(pc) => pc,
                Frame::RestoreCapture { slot, old } => {
                    caps[slot] = old;
                    continue;
                }
            };
            loop {
                if pc == 0 || !self.set.insert(pc) {
                    break;
                }
                match &prog.inst[pc] {
                    Inst::Fail => break,
                    Inst::Alt { out, arg } | Inst::AltMatch { out, arg } => {
                        stack.push(Frame::Explore(*arg));
                        pc = *out;
                    }
                    Inst::EmptyWidth { out, look } => {
                        if !at.contains(*look) {
                            break;
                        }
                        pc = *out;
                    }
                    Inst::Nop { out } => pc = *out,
                    Inst::Capture { out, slot } => {
                        if *slot < caps.len() {
                            stack.push(Frame::RestoreCapture {
                                slot: *slot,
                                old: caps[*slot],
                            });
                            caps[*slot] = Some(pos);
                        }
                        pc = *out;
                    }
                    _ => {
                        let mut slots = free.pop().unwrap_or_default();
                        slots.clear();
                        slots.extend_from_slice(caps);
                        self.threads[pc] = Some(slots);
                        break;
                    }
                }
            }
        }
    }
}

/// Per-search state of the Pike VM.
#[derive(Debug, Default)]
pub(crate) struct Machine {
    runq: Queue,
    nextq: Queue,
    stack: Vec<Frame>,
    /// Recycled capture arrays.
    free: Vec<Slots>,
    /// Capture slots threaded through the closure of a new start.
    scratch: Slots,
    matched: Option<Slots>,
}

impl Machine {
    fn reset(&mut self, prog: &Prog, ncap: usize) {
        self.runq.clear(&mut self.free);
        self.nextq.clear(&mut self.free);
        self.runq.reset(prog.len());
        self.nextq.reset(prog.len());
        self.stack.clear();
        self.scratch.clear();
        self.scratch.resize(ncap, None);
        if let Some(slots) = self.matched.take() {
            self.free.push(slots);
        }
    }

    /// Find the leftmost-first match at or after `pos`, filling `ncap`
    /// capture slots.
    pub fn search(
        &mut self,
        prog: &Prog,
        cond: EmptyOp,
        prefix: Option<&Prefix>,
        input: &Input<'_>,
        pos: usize,
        ncap: usize,
    ) -> Option<Vec<Option<usize>>> {
        self.reset(prog, ncap);
        let anchored = cond.contains(EmptyOp::BEGIN_TEXT);
        let mut pos = pos;
        let mut current = input.step(pos);

        loop {
            if self.runq.is_empty() {
                if (anchored && pos != 0) || self.matched.is_some() {
                    break;
                }
                if let Some(prefix) = prefix
                    && !input.has_prefix(pos, prefix.as_str())
                {
                    let Some(advance) = input.index(prefix, pos) else {
                        break;
                    };
                    pos += advance;
                    current = input.step(pos);
                }
            }
            if self.matched.is_none() && (pos == 0 || !anchored) {
                self.scratch.fill(None);
                if ncap > 0 {
                    self.scratch[0] = Some(pos);
                }
                self.runq.add(
                    prog,
                    &mut self.stack,
                    &mut self.free,
                    prog.start,
                    pos,
                    &mut self.scratch,
                    input.context(pos),
                );
            }

            let width = current.map_or(0, |(_, width)| width);
            let next_at = input.context(pos + width);
            self.step(prog, pos, pos + width, current.map(|(c, _)| c), next_at);
            if width == 0 || (ncap == 0 && self.matched.is_some()) {
                break;
            }
            pos += width;
            current = input.step(pos);
            std::mem::swap(&mut self.runq, &mut self.nextq);
        }

        self.runq.clear(&mut self.free);
        self.nextq.clear(&mut self.free);
        self.matched.clone()
    }

    /// Advance every thread of the run queue over `c` into the next queue.
    fn step(&mut self, prog: &Prog, pos: usize, next_pos: usize, c: Option<char>, next_at: EmptyOp) {
        for i in 0..self.runq.set.len() {
            let Some(pc) = self.runq.set.get(i) else {
                break;
            };
            let Some(mut slots) = self.runq.threads[pc].take() else {
                continue;
            };
            match &prog.inst[pc] {
                Inst::Match => {
                    if !slots.is_empty() {
                        slots[1] = Some(pos);
                    }
                    if let Some(old) = self.matched.replace(slots) {
                        self.free.push(old);
                    }
                    // Lower-priority threads can only produce worse matches.
                    for j in i + 1..self.runq.set.len() {
                        if let Some(pc) = self.runq.set.get(j)
                            && let Some(slots) = self.runq.threads[pc].take()
                        {
                            self.free.push(slots);
                        }
                    }
                    break;
                }
                rune => {
                    if let (Some(c), Some(out)) = (c, rune.out())
                        && rune.matches_char(c)
                    {
                        self.nextq.add(
                            prog,
                            &mut self.stack,
                            &mut self.free,
                            out,
                            next_pos,
                            &mut slots,
                            next_at,
                        );
                    }
                    self.free.push(slots);
                }
            }
        }
        self.runq.set.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Flags;
    use crate::compile::compile;
    use crate::parser::parse;

    fn search(pattern: &str, flags: Flags, text: &str, pos: usize) -> Option<Vec<Option<usize>>> {
        let prog = compile(&parse(pattern, flags).unwrap().simplify());
        let cond = prog.start_cond().unwrap();
        let prefix = Prefix::new(&prog.prefix().0);
        let mut machine = Machine::default();
        machine.search(&prog, cond, prefix.as_ref(), &Input::new(text), pos, prog.num_cap)
    }

    fn run(pattern: &str, text: &str) -> Option<Vec<Option<usize>>> {
        search(pattern, Flags::PERL, text, 0)
    }

    #[test]
    fn test_leftmost_first() {
        assert_eq!(run("a|ab", "ab"), Some(vec![Some(0), Some(1)]));
        assert_eq!(run("ab|a", "ab"), Some(vec![Some(0), Some(2)]));
        assert_eq!(run("b|ab", "xab"), Some(vec![Some(1), Some(3)]));
    }

    #[test]
    fn test_greedy_and_lazy() {
        assert_eq!(run("a+", "aaa"), Some(vec![Some(0), Some(3)]));
        assert_eq!(run("a+?", "aaa"), Some(vec![Some(0), Some(1)]));
        assert_eq!(run("a*?b", "aab"), Some(vec![Some(0), Some(3)]));
    }

    #[test]
    fn test_captures() {
        assert_eq!(
            run("(a+)(b+)?", "aab"),
            Some(vec![Some(0), Some(3), Some(0), Some(2), Some(2), Some(3)])
        );
        assert_eq!(
            run("(a)|(b)", "b"),
            Some(vec![Some(0), Some(1), None, None, Some(0), Some(1)])
        );
        assert_eq!(
            run("(x){1,2}", "xx"),
            Some(vec![Some(0), Some(2), Some(1), Some(2)])
        );
        // A capture set on a failed path is not reported.
        assert_eq!(
            run("(a)x|ab", "ab"),
            Some(vec![Some(0), Some(2), None, None])
        );
    }

    #[test]
    fn test_empty_matches() {
        assert_eq!(run("", ""), Some(vec![Some(0), Some(0)]));
        assert_eq!(run("x*", "abc"), Some(vec![Some(0), Some(0)]));
        assert_eq!(run("$", "abc"), Some(vec![Some(3), Some(3)]));
    }

    #[test]
    fn test_dot_and_newline() {
        assert_eq!(run(".", "\n"), None);
        assert_eq!(search(".", Flags::PERL | Flags::DOT_NL, "\n", 0), Some(vec![Some(0), Some(1)]));
        assert_eq!(run("a.c", "a\u{00e9}c"), Some(vec![Some(0), Some(4)]));
    }

    #[test]
    fn test_start_position() {
        assert_eq!(search("a", Flags::PERL, "aba", 1), Some(vec![Some(2), Some(3)]));
        assert_eq!(search("^a", Flags::PERL, "aa", 1), None);
        assert_eq!(search(r"\bb", Flags::PERL, "ab b", 1), Some(vec![Some(3), Some(4)]));
    }

    #[test]
    fn test_prefix_scan() {
        assert_eq!(run("abc+d", "abcabccd"), Some(vec![Some(3), Some(8)]));
        assert_eq!(run("abc", "ab"), None);
    }

    #[test]
    fn test_match_only() {
        let prog = compile(&parse("a+b", Flags::PERL).unwrap().simplify());
        let cond = prog.start_cond().unwrap();
        let mut machine = Machine::default();
        assert_eq!(
            machine.search(&prog, cond, None, &Input::new("xaab"), 0, 0),
            Some(vec![])
        );
        assert_eq!(machine.search(&prog, cond, None, &Input::new("xaa"), 0, 0), None);
    }

    #[test]
    fn test_reuse() {
        let prog = compile(&parse("(b+)", Flags::PERL).unwrap().simplify());
        let cond = prog.start_cond().unwrap();
        let mut machine = Machine::default();
        let first = machine.search(&prog, cond, None, &Input::new("abbb"), 0, 4);
        assert_eq!(first, Some(vec![Some(1), Some(4), Some(1), Some(4)]));
        let second = machine.search(&prog, cond, None, &Input::new("xyz"), 0, 4);
        assert_eq!(second, None);
    }

    #[test]
    fn test_pathological() {
        let text = "a".repeat(5000);
        let pattern = format!("{}{}", "a?".repeat(30), "a".repeat(30));
        assert_eq!(run(&pattern, &text), Some(vec![Some(0), Some(60)]));
        assert_eq!(run("(a*)*b", &text), None);
    }
}
