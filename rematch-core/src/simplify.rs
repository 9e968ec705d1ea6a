//! Rewrites counted repetition into plain operators
//!
//! After simplification a tree has no `Repeat` nodes: `x{2,5}` becomes
//! `xx(x(x(x)?)?)?`. Repeated operators that mean the same thing collapse,
//! so `(?:a+)+` is `a+`. Captures inside a counted repetition are copied,
//! so in `(x){1,2}` both copies write group 1 and the last one to match
//! wins.

use crate::ast::{Op, Regexp, only_sub};

impl Regexp {
    /// Return an equivalent tree without counted repetition.
    ///
    /// Simplifying an already simplified tree returns it unchanged.
    pub fn simplify(&self) -> Regexp {
        self.fold_up(|re, subs| match re {
            Regexp::Star { greedy, .. } => simplify1(Op::Star, *greedy, only_sub(subs)),
            Regexp::Plus { greedy, .. } => simplify1(Op::Plus, *greedy, only_sub(subs)),
            Regexp::Quest { greedy, .. } => simplify1(Op::Quest, *greedy, only_sub(subs)),
            Regexp::Repeat {
                min, max, greedy, ..
            } => simplify_repeat(only_sub(subs), *min, *max, *greedy),
            _ => re.with_subs(subs),
        })
    }
}

/// Expand `sub{min,max}`, where `sub` is already simplified.
fn simplify_repeat(sub: Regexp, min: u32, max: Option<u32>, greedy: bool) -> Regexp {
    // x{0} matches the empty string and never looks at x.
    if min == 0 && max == Some(0) {
        return Regexp::EmptyMatch;
    }

    let Some(max) = max else {
        return match min {
            0 => simplify1(Op::Star, greedy, sub),
            1 => simplify1(Op::Plus, greedy, sub),
            // x{4,} is xxxx+
            _ => {
                let mut subs = vec![sub.clone(); min as usize - 1];
                subs.push(simplify1(Op::Plus, greedy, sub));
                Regexp::Concat(subs)
            }
        };
    };

    if min == 1 && max == 1 {
        return sub;
    }

    // x{n,m} is n copies of x and then m-n nested optional copies:
    // x{2,5} is xx(x(x(x)?)?)?
    let mut prefix = (min > 0).then(|| vec![sub.clone(); min as usize]);
    if max > min {
        let mut suffix = simplify1(Op::Quest, greedy, sub.clone());
        for _ in min + 1..max {
            suffix = simplify1(Op::Quest, greedy, Regexp::Concat(vec![sub.clone(), suffix]));
        }
        match prefix.as_mut() {
            Some(prefix) => prefix.push(suffix),
            None => return suffix,
        }
    }
    match prefix {
        Some(prefix) => Regexp::Concat(prefix),
        // Degenerate bounds like min > max.
        None => Regexp::NoMatch,
    }
}

/// Build `sub*`, `sub+` or `sub?`, unless that would mean the same as
/// `sub` alone.
fn simplify1(op: Op, greedy: bool, sub: Regexp) -> Regexp {
    // The empty string repeated is still the empty string.
    if sub == Regexp::EmptyMatch {
        return sub;
    }
    if sub.op() == op && sub.greedy() == Some(greedy) {
        return sub;
    }
    match op {
        Op::Star => Regexp::star(sub, greedy),
        Op::Plus => Regexp::plus(sub, greedy),
        _ => Regexp::quest(sub, greedy),
    }
}
