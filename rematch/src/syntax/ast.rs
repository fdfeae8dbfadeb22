//! The abstract syntax of a pattern.
//!
//! Nodes are immutable once built by [`parse`](super::parse). Positions are
//! not kept on nodes; errors carry them instead.

/// A single pattern expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Ast {
    /// Matches the empty string. Produced by empty patterns and empty groups.
    Empty,
    /// Matches one literal codepoint.
    Literal(char),
    /// `.` — any codepoint, except `\n` unless `DOTALL` is set.
    Dot,
    /// A bracketed character class, e.g. `[a-z_]` or `[^0-9]`.
    Class(ClassSet),
    /// A shorthand class outside brackets: `\d`, `\W`, ...
    Perl(PerlClass),
    /// A zero-width position test.
    Assertion(AssertionKind),
    /// `ast{min,max}`, with `*`/`+`/`?` as the usual shorthands.
    Repeat {
        ast: Box<Ast>,
        min: u32,
        /// `None` means unbounded.
        max: Option<u32>,
        greedy: bool,
    },
    /// `(..)`, `(?:..)`, `(?<name>..)`.
    Group { ast: Box<Ast>, kind: GroupKind },
    Concat(Vec<Ast>),
    Alternate(Vec<Ast>),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GroupKind {
    /// Capturing. Groups are numbered 1.. in order of the opening paren;
    /// a named group also takes the next number.
    Capture { index: u32, name: Option<String> },
    NonCapturing,
}

/// The body of a `[...]` class. Membership is the union of the items,
/// complemented when `negated` is set.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClassSet {
    pub negated: bool,
    pub items: Vec<ClassItem>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClassItem {
    Char(char),
    /// Inclusive range, `lo <= hi` guaranteed by the parser.
    Range(char, char),
    Perl(PerlClass),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PerlClass {
    pub kind: PerlKind,
    /// `true` for the uppercase complements `\D`, `\S`, `\W`.
    pub negated: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PerlKind {
    /// `\d`
    Digit,
    /// `\s`
    Space,
    /// `\w`
    Word,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssertionKind {
    /// `^` — start of text, or of a line under `MULTILINE`.
    Start,
    /// `$` — end of text (also just before a final newline), or of a line
    /// under `MULTILINE`.
    End,
    /// `\b`
    WordBoundary,
    /// `\B`
    NotWordBoundary,
}
