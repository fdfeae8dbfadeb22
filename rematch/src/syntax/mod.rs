/*!
Pattern syntax: flags, errors and the parser behind [`Regex`](crate::Regex).

## Supported syntax
- Literals, `.`, concatenation and `|` alternation (leftmost-first).
- Quantifiers `*`, `+`, `?`, `{m}`, `{m,}`, `{m,n}`; greedy by default, lazy
  with a trailing `?`. A `{` that does not open a valid quantifier is an
  ordinary literal.
- Character classes `[...]` / `[^...]` with ranges, plus the shorthands
  `\d \D \s \S \w \W` both inside and outside brackets.
- Groups: `(..)` capturing, `(?:..)` non-capturing, `(?<name>..)` and
  `(?P<name>..)` named capturing.
- Anchors `^` and `$` (line anchors under [`Flags::MULTILINE`]), word
  boundaries `\b` / `\B`.
- Escapes `\n \r \t \f \v \0 \xHH` and escaped metacharacters.

Lookaround and backreferences are not supported and are rejected at parse
time. Error positions are offsets in characters into the pattern string.
*/
use std::fmt;

use bitflags::bitflags;

pub mod ast;
pub(crate) mod parse;

bitflags! {
    /// Compile-time pattern flags. Baked into the compiled program;
    /// they cannot be changed after [`Regex`](crate::Regex) construction.
    #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
    pub struct Flags: u8 {
        /// Case-insensitive matching, using simple (one-to-one) case folding.
        const IGNORECASE = 1 << 0;
        /// `^` and `$` also match at line boundaries within the haystack.
        const MULTILINE = 1 << 1;
        /// `.` also matches `\n`.
        const DOTALL = 1 << 2;
        /// Unicode-aware `\d \s \w`, word boundaries and case folding.
        /// Set by default; clear it for ASCII-only semantics.
        const UNICODE = 1 << 3;
    }
}

impl Default for Flags {
    fn default() -> Self {
        Flags::UNICODE
    }
}

/// An error describing why a pattern failed to compile.
///
/// `pos` is the offset, in characters, into the pattern string where the
/// offending construct starts.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum PatternError {
    /// Malformed pattern syntax: unterminated class, dangling alternation
    /// branch, bad escape, nothing to repeat, unsupported construct.
    Syntax { pos: usize, msg: String },
    /// A structurally valid `[...]` with invalid contents, e.g. a reversed
    /// range like `[z-a]`.
    InvalidClass { pos: usize, msg: String },
    /// `{m,n}` with `m > n`, or a bound above the expansion limit.
    InvalidQuantifierRange { pos: usize },
    /// An unclosed `(` or a stray `)`.
    UnbalancedGroup { pos: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::Syntax { pos, msg } => {
                write!(f, "syntax error at position {pos}: {msg}")
            }
            PatternError::InvalidClass { pos, msg } => {
                write!(f, "invalid character class at position {pos}: {msg}")
            }
            PatternError::InvalidQuantifierRange { pos } => {
                write!(f, "invalid quantifier range at position {pos}")
            }
            PatternError::UnbalancedGroup { pos } => {
                write!(f, "unbalanced group at position {pos}")
            }
        }
    }
}

impl std::error::Error for PatternError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags() {
        assert_eq!(Flags::default(), Flags::UNICODE);
        assert!(!Flags::default().contains(Flags::IGNORECASE));
    }

    #[test]
    fn error_display() {
        let e = PatternError::Syntax {
            pos: 3,
            msg: "unterminated character class".into(),
        };
        assert_eq!(
            e.to_string(),
            "syntax error at position 3: unterminated character class"
        );
        assert_eq!(
            PatternError::InvalidQuantifierRange { pos: 1 }.to_string(),
            "invalid quantifier range at position 1"
        );
    }
}
