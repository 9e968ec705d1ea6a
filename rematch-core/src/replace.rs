//! Replacement template handling
//!
//! A template is literal text with references to capture groups:
//! `$1` or `${1}` by number, `$name` or `${name}` by name, and `$$` for a
//! literal dollar sign. `$name` takes the longest run of letters, digits
//! and underscores, so `$1x` refers to a group named `1x`; use `${1}x` to
//! follow group 1 with an `x`. A `$` that does not start a valid reference
//! is kept as text.

use crate::unicode;

/// A part of a replacement template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementPart {
    /// Literal text
    Literal(String),
    /// Group by number; 0 is the whole match
    Group(usize),
    /// Group by name
    Named(String),
}

/// A parsed replacement template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    parts: Vec<ReplacementPart>,
}

impl Replacement {
    /// Parse a replacement template. Every template is valid.
    pub fn parse(template: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = template;

        while let Some(dollar) = rest.find('$') {
            literal.push_str(&rest[..dollar]);
            rest = &rest[dollar + 1..];
            if let Some(after) = rest.strip_prefix('$') {
                literal.push('$');
                rest = after;
                continue;
            }
            let Some((part, after)) = extract(rest) else {
                literal.push('$');
                continue;
            };
            if !literal.is_empty() {
                parts.push(ReplacementPart::Literal(std::mem::take(&mut literal)));
            }
            parts.push(part);
            rest = after;
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(ReplacementPart::Literal(literal));
        }

        Replacement { parts }
    }

    /// Append the expansion for one match to `dst`.
    ///
    /// `slots` holds the match's capture slots and `names` the group names
    /// indexed by group number. References to groups that do not exist or
    /// did not participate expand to nothing. A name used by several groups
    /// refers to the first of them that participated.
    pub fn expand(
        &self,
        dst: &mut String,
        haystack: &str,
        slots: &[Option<usize>],
        names: &[Option<String>],
    ) {
        let group = |i: usize| match (slots.get(2 * i), slots.get(2 * i + 1)) {
            (Some(Some(start)), Some(Some(end))) => haystack.get(*start..*end),
            _ => None,
        };
        for part in &self.parts {
            match part {
                ReplacementPart::Literal(text) => dst.push_str(text),
                ReplacementPart::Group(i) => {
                    if let Some(text) = group(*i) {
                        dst.push_str(text);
                    }
                }
                ReplacementPart::Named(name) => {
                    let text = names
                        .iter()
                        .enumerate()
                        .filter(|(_, n)| n.as_deref() == Some(name.as_str()))
                        .find_map(|(i, _)| group(i));
                    if let Some(text) = text {
                        dst.push_str(text);
                    }
                }
            }
        }
    }

    /// Get the parts of the template
    pub fn parts(&self) -> &[ReplacementPart] {
        &self.parts
    }
}

/// Read a reference at the start of `s`, which follows a `$`.
fn extract(s: &str) -> Option<(ReplacementPart, &str)> {
    let (braced, body) = match s.strip_prefix('{') {
        Some(body) => (true, body),
        None => (false, s),
    };
    let len = body
        .char_indices()
        .find(|&(_, c)| !(c == '_' || unicode::is_letter_or_digit(c)))
        .map_or(body.len(), |(i, _)| i);
    if len == 0 {
        return None;
    }
    let name = &body[..len];
    let rest = if braced {
        body[len..].strip_prefix('}')?
    } else {
        &body[len..]
    };
    Some((reference(name), rest))
}

/// Numbers are at most nine ASCII digits without a leading zero.
fn reference(name: &str) -> ReplacementPart {
    let numeric = name.len() <= 9
        && name.bytes().all(|b| b.is_ascii_digit())
        && (name.len() == 1 || !name.starts_with('0'));
    match name.parse::<usize>() {
        Ok(n) if numeric => ReplacementPart::Group(n),
        _ => ReplacementPart::Named(name.to_string()),
    }
}
