/*!
The compiled-pattern API: [`Regex`], its search operations and result types.

## Design
A pattern is compiled once ([`Regex::new`] / [`Regex::builder`]) into an
immutable instruction program shared behind an `Arc`. Searches run a
backtracking VM over the program:

- Leftmost match semantics with leftmost-first alternation and greedy/lazy
  quantifiers, as in Python's `re`.
- All offsets are byte offsets into the haystack.
- Every per-search state (capture slots, undo log, step counter) is local to
  the call, so a `Regex` can be used from many threads at once.
- Worst-case time is exponential for pathological patterns; a configurable
  step limit turns those searches into a [`MatchError`] instead of a hang.
*/
mod backtrack;
mod captures;
mod compile;
mod input;
mod iter;
mod re;

pub use self::{
    backtrack::{MatchError, MatchErrorKind},
    captures::{Captures, Match},
    input::Input,
    iter::{CaptureMatches, TryCaptureMatches},
    re::{Regex, RegexBuilder},
};
