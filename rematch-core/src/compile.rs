//! Thompson construction from a simplified tree to a [`Prog`]
//!
//! Each subexpression compiles to a fragment: an entry instruction plus a
//! list of holes, the dangling `out`/`arg` fields that the next fragment
//! gets patched into. The order of the two legs of every `Alt` is the
//! match priority: greedy operators try the loop body first, lazy ones try
//! the exit first.

use log::debug;

use crate::ast::{Op, Regexp};
use crate::class::CharClass;
use crate::prog::{EmptyOp, Inst, Prog};
use crate::unicode;

/// A dangling successor field.
#[derive(Debug, Clone, Copy)]
struct Hole {
    pc: usize,
    arg: bool,
}

impl Hole {
    fn out(pc: usize) -> Self {
        Hole { pc, arg: false }
    }

    fn arg(pc: usize) -> Self {
        Hole { pc, arg: true }
    }
}

/// A compiled, partially linked subexpression.
///
/// `start == 0` is the fragment that never matches.
#[derive(Debug)]
struct Frag {
    start: usize,
    holes: Vec<Hole>,
    nullable: bool,
}

impl Frag {
    fn fail() -> Self {
        Frag {
            start: 0,
            holes: Vec::new(),
            nullable: false,
        }
    }
}

/// Compile a tree into a program.
///
/// Counted repetitions are simplified on the way; callers normally pass
/// the output of [`Regexp::simplify`].
pub fn compile(re: &Regexp) -> Prog {
    let has_repeat =
        re.fold_up(|re, subs: Vec<bool>| re.op() == Op::Repeat || subs.contains(&true));
    if has_repeat {
        return compile(&re.simplify());
    }

    let mut c = Compiler::new();
    let frag = c.compile(re);
    let matched = c.push(Inst::Match);
    c.patch(&frag.holes, matched);
    c.prog.start = frag.start;
    mark_alt_match(&mut c.prog);

    debug!(
        "compiled {} instructions, {} capture slots",
        c.prog.len(),
        c.prog.num_cap
    );
    c.prog
}

/// A step of the compiler's walk over the tree.
enum Task<'r> {
    /// Emit the start of a node and schedule its subexpressions
    Enter(&'r Regexp),
    /// Finish a unary node from the fragment of its subexpression
    Exit(&'r Regexp),
    /// Concatenate or alternate the top two fragments
    Join(&'r Regexp),
}

struct Compiler {
    prog: Prog,
}

impl Compiler {
    fn new() -> Self {
        Compiler {
            prog: Prog {
                inst: vec![Inst::Fail],
                start: 0,
                // Group 0 is implicit.
                num_cap: 2,
            },
        }
    }

    fn push(&mut self, inst: Inst) -> usize {
        self.prog.inst.push(inst);
        self.prog.inst.len() - 1
    }

    fn patch(&mut self, holes: &[Hole], target: usize) {
        for hole in holes {
            match &mut self.prog.inst[hole.pc] {
                Inst::Alt { out, arg } | Inst::AltMatch { out, arg } => {
                    if hole.arg {
                        *arg = target;
                    } else {
                        *out = target;
                    }
                }
                Inst::Capture { out, .. }
                | Inst::EmptyWidth { out, .. }
                | Inst::Nop { out }
                | Inst::Rune { out, .. }
                | Inst::Rune1 { out, .. }
                | Inst::RuneAny { out }
                | Inst::RuneAnyNotNL { out } => *out = target,
                Inst::Match | Inst::Fail => {}
            }
        }
    }

    /// Compile `re` with an explicit task stack.
    ///
    /// Instructions are emitted in the same order as a recursive descent
    /// would: a capture's opening slot comes before its body, and each
    /// alternation `Alt` right after the branch it joins.
    fn compile(&mut self, re: &Regexp) -> Frag {
        let mut tasks = vec![Task::Enter(re)];
        let mut frags: Vec<Frag> = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Enter(re) => match re {
                    Regexp::NoMatch => frags.push(Frag::fail()),
                    Regexp::EmptyMatch => frags.push(self.nop()),
                    Regexp::Literal { runes, fold } => {
                        let frag = self.literal_string(runes, *fold);
                        frags.push(frag);
                    }
                    Regexp::CharClass(class) => frags.push(self.rune(class.clone())),
                    Regexp::AnyCharNotNL => frags.push(self.rune(CharClass::any_not_nl())),
                    Regexp::AnyChar => frags.push(self.rune(CharClass::any())),
                    Regexp::BeginLine => frags.push(self.empty(EmptyOp::BEGIN_LINE)),
                    Regexp::EndLine => frags.push(self.empty(EmptyOp::END_LINE)),
                    Regexp::BeginText => frags.push(self.empty(EmptyOp::BEGIN_TEXT)),
                    Regexp::EndText => frags.push(self.empty(EmptyOp::END_TEXT)),
                    Regexp::WordBoundary => frags.push(self.empty(EmptyOp::WORD_BOUNDARY)),
                    Regexp::NoWordBoundary => frags.push(self.empty(EmptyOp::NO_WORD_BOUNDARY)),
                    Regexp::Capture { index, sub, .. } => {
                        frags.push(self.cap(2 * index));
                        tasks.push(Task::Exit(re));
                        tasks.push(Task::Enter(sub));
                    }
                    Regexp::Star { sub, .. }
                    | Regexp::Plus { sub, .. }
                    | Regexp::Quest { sub, .. } => {
                        tasks.push(Task::Exit(re));
                        tasks.push(Task::Enter(sub));
                    }
                    Regexp::Repeat { .. } => {
                        unreachable!("counted repetition is simplified before compiling")
                    }
                    Regexp::Concat(subs) | Regexp::Alternate(subs) => match subs.split_first() {
                        Some((first, rest)) => {
                            for sub in rest.iter().rev() {
                                tasks.push(Task::Join(re));
                                tasks.push(Task::Enter(sub));
                            }
                            tasks.push(Task::Enter(first));
                        }
                        None if re.op() == Op::Concat => frags.push(self.nop()),
                        None => frags.push(Frag::fail()),
                    },
                },
                Task::Exit(re) => {
                    let sub = frags.pop().unwrap_or_else(Frag::fail);
                    let frag = match re {
                        Regexp::Capture { index, .. } => {
                            let bra = frags.pop().unwrap_or_else(Frag::fail);
                            let ket = self.cap(2 * index + 1);
                            let frag = self.cat(bra, sub);
                            self.cat(frag, ket)
                        }
                        Regexp::Star { greedy, .. } => self.star(sub, *greedy),
                        Regexp::Plus { greedy, .. } => self.plus(sub, *greedy),
                        Regexp::Quest { greedy, .. } => self.quest(sub, *greedy),
                        _ => sub,
                    };
                    frags.push(frag);
                }
                Task::Join(re) => {
                    let next = frags.pop().unwrap_or_else(Frag::fail);
                    let prev = frags.pop().unwrap_or_else(Frag::fail);
                    let frag = if re.op() == Op::Concat {
                        self.cat(prev, next)
                    } else {
                        self.alt(prev, next)
                    };
                    frags.push(frag);
                }
            }
        }
        frags.pop().unwrap_or_else(Frag::fail)
    }

    fn literal_string(&mut self, runes: &[char], fold: bool) -> Frag {
        let mut frag: Option<Frag> = None;
        for &c in runes {
            let next = self.literal(c, fold);
            frag = Some(match frag {
                Some(prev) => self.cat(prev, next),
                None => next,
            });
        }
        match frag {
            Some(frag) => frag,
            None => self.nop(),
        }
    }

    fn nop(&mut self) -> Frag {
        let pc = self.push(Inst::Nop { out: 0 });
        Frag {
            start: pc,
            holes: vec![Hole::out(pc)],
            nullable: true,
        }
    }

    fn empty(&mut self, look: EmptyOp) -> Frag {
        let pc = self.push(Inst::EmptyWidth { out: 0, look });
        Frag {
            start: pc,
            holes: vec![Hole::out(pc)],
            nullable: true,
        }
    }

    fn cap(&mut self, slot: usize) -> Frag {
        let pc = self.push(Inst::Capture { out: 0, slot });
        self.prog.num_cap = self.prog.num_cap.max(slot + 1);
        Frag {
            start: pc,
            holes: vec![Hole::out(pc)],
            nullable: true,
        }
    }

    fn literal(&mut self, c: char, fold: bool) -> Frag {
        if !fold {
            return self.rune(CharClass::single(c));
        }
        let orbit = unicode::fold_orbit(c);
        self.rune(CharClass::new(orbit.into_iter().map(|c| (c, c)).collect()))
    }

    fn rune(&mut self, class: CharClass) -> Frag {
        let inst = if let Some(c) = class.single_char() {
            Inst::Rune1 { out: 0, c }
        } else if class.is_any() {
            Inst::RuneAny { out: 0 }
        } else if class.is_any_not_nl() {
            Inst::RuneAnyNotNL { out: 0 }
        } else {
            Inst::Rune { out: 0, class }
        };
        let pc = self.push(inst);
        Frag {
            start: pc,
            holes: vec![Hole::out(pc)],
            nullable: false,
        }
    }

    fn cat(&mut self, first: Frag, second: Frag) -> Frag {
        if first.start == 0 || second.start == 0 {
            return Frag::fail();
        }
        self.patch(&first.holes, second.start);
        Frag {
            start: first.start,
            holes: second.holes,
            nullable: first.nullable && second.nullable,
        }
    }

    fn alt(&mut self, first: Frag, second: Frag) -> Frag {
        if first.start == 0 {
            return second;
        }
        if second.start == 0 {
            return first;
        }
        let pc = self.push(Inst::Alt {
            out: first.start,
            arg: second.start,
        });
        let mut holes = first.holes;
        holes.extend(second.holes);
        Frag {
            start: pc,
            holes,
            nullable: first.nullable || second.nullable,
        }
    }

    /// An `Alt` that tries `body` first when greedy and the exit first
    /// otherwise. Returns the `Alt` and the hole of its exit leg.
    fn branch(&mut self, body: usize, greedy: bool) -> (usize, Hole) {
        if greedy {
            let pc = self.push(Inst::Alt { out: body, arg: 0 });
            (pc, Hole::arg(pc))
        } else {
            let pc = self.push(Inst::Alt { out: 0, arg: body });
            (pc, Hole::out(pc))
        }
    }

    fn quest(&mut self, sub: Frag, greedy: bool) -> Frag {
        let (pc, exit) = self.branch(sub.start, greedy);
        let mut holes = vec![exit];
        holes.extend(sub.holes);
        Frag {
            start: pc,
            holes,
            nullable: true,
        }
    }

    /// The looping `Alt` shared by `x+` and `x*`.
    fn repeat_loop(&mut self, sub: &Frag, greedy: bool) -> Frag {
        let (pc, exit) = self.branch(sub.start, greedy);
        self.patch(&sub.holes, pc);
        Frag {
            start: pc,
            holes: vec![exit],
            nullable: true,
        }
    }

    fn plus(&mut self, sub: Frag, greedy: bool) -> Frag {
        let looped = self.repeat_loop(&sub, greedy);
        Frag {
            start: sub.start,
            holes: looped.holes,
            nullable: sub.nullable,
        }
    }

    fn star(&mut self, sub: Frag, greedy: bool) -> Frag {
        // A body that can match empty must be entered before the loop
        // decides, or the empty iteration would win: x* is (x+)?.
        if sub.nullable {
            let plus = self.plus(sub, greedy);
            return self.quest(plus, greedy);
        }
        self.repeat_loop(&sub, greedy)
    }
}

/// Turn `Alt`s that loop over any character with the other leg leading
/// straight to `Match` into `AltMatch`.
fn mark_alt_match(prog: &mut Prog) {
    for pc in 0..prog.inst.len() {
        let Inst::Alt { out, arg } = prog.inst[pc] else {
            continue;
        };
        let loops = |leg: usize| matches!(prog.inst[leg], Inst::RuneAny { out } if out == pc);
        let matches = |leg: usize| prog.inst[prog.skip_nop(leg)] == Inst::Match;
        let alt_match = (loops(out) && matches(arg)) || (loops(arg) && matches(out));
        if alt_match {
            prog.inst[pc] = Inst::AltMatch { out, arg };
        }
    }
}
