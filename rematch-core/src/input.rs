//! Haystack access shared by the executors

use memchr::memmem::Finder;

use crate::prog::EmptyOp;

/// A literal every match starts with, with a prebuilt searcher.
#[derive(Debug, Clone)]
pub(crate) struct Prefix {
    literal: String,
    finder: Finder<'static>,
}

impl Prefix {
    /// Returns `None` for the empty literal.
    pub fn new(literal: &str) -> Option<Self> {
        if literal.is_empty() {
            return None;
        }
        Some(Prefix {
            literal: literal.to_string(),
            finder: Finder::new(literal).into_owned(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.literal
    }
}

/// A haystack being searched. Positions are byte offsets on character
/// boundaries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Input<'h> {
    text: &'h str,
}

impl<'h> Input<'h> {
    pub fn new(text: &'h str) -> Self {
        Input { text }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// The character at `pos` and its width, or `None` at the end.
    #[inline]
    pub fn step(&self, pos: usize) -> Option<(char, usize)> {
        let c = self.text.get(pos..)?.chars().next()?;
        Some((c, c.len_utf8()))
    }

    /// The character ending at `pos`, or `None` at the start.
    #[inline]
    pub fn before(&self, pos: usize) -> Option<char> {
        self.text.get(..pos)?.chars().next_back()
    }

    /// The assertions that hold at `pos`.
    pub fn context(&self, pos: usize) -> EmptyOp {
        EmptyOp::context(self.before(pos), self.step(pos).map(|(c, _)| c))
    }

    pub fn has_prefix(&self, pos: usize, prefix: &str) -> bool {
        self.text
            .get(pos..)
            .is_some_and(|rest| rest.starts_with(prefix))
    }

    /// Distance from `pos` to the next occurrence of the literal prefix.
    pub fn index(&self, prefix: &Prefix, pos: usize) -> Option<usize> {
        prefix.finder.find(self.text.as_bytes().get(pos..)?)
    }
}
