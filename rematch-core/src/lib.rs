//! Rematch Core Library
//!
//! A regular expression engine with leftmost-first semantics. Patterns are
//! parsed into a syntax tree, simplified, and compiled to a small program
//! that one of three executors runs: a one-pass automaton, a bounded
//! backtracker or a Pike VM. Matching time is linear in the input.

pub mod ast;
pub mod backtrack;
pub mod class;
pub mod compile;
pub mod engine;
pub mod error;
mod input;
mod nfa;
pub mod onepass;
pub mod parser;
mod pool;
pub mod prog;
pub mod replace;
pub mod simplify;
mod sparse;
pub mod unicode;

pub use ast::{Flags, Op, Regexp};
pub use class::CharClass;
pub use engine::{Captures, Match, Regex, Strategy, quote_meta};
pub use error::{ErrorCode, ParseError, Result};
pub use onepass::OnePassProg;
pub use parser::parse;
pub use prog::{EmptyOp, Inst, Prog};
pub use replace::{Replacement, ReplacementPart};

/// Compile a pattern with the given parse flags
///
/// This is the main entry point for building a [`Regex`] from flags other
/// than the Perl defaults.
pub fn compile(pattern: &str, flags: Flags) -> Result<Regex> {
    Regex::with_flags(pattern, flags)
}
