//! The bounded backtracking VM.
//!
//! Executes a [`Program`] with an explicit stack of alternatives and an undo
//! log that restores capture slots when a branch fails. Worst-case running
//! time is exponential in the haystack; an optional step budget turns
//! runaway searches into a [`MatchError`] instead of a hang.

use core::fmt;

use crate::{
    regex::compile::{fold_case, is_word_char, Inst, Look, Program},
    syntax::Flags,
};

/// An error that occurred during a search.
///
/// Searches themselves cannot fail; "no match" is `Ok(None)`. This error
/// only arises when a configured resource limit is exceeded before the
/// search could be decided.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MatchError {
    kind: MatchErrorKind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum MatchErrorKind {
    /// The configured backtracking step budget was exhausted.
    StepLimitExceeded { limit: usize },
}

impl MatchError {
    pub(crate) fn step_limit(limit: usize) -> MatchError {
        MatchError {
            kind: MatchErrorKind::StepLimitExceeded { limit },
        }
    }

    pub fn kind(&self) -> &MatchErrorKind {
        &self.kind
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MatchErrorKind::StepLimitExceeded { limit } => write!(
                f,
                "backtracking step limit of {limit} exceeded before the search could be decided"
            ),
        }
    }
}

impl std::error::Error for MatchError {}

/// A pending alternative: where to resume, at which position, and how far
/// to rewind the undo log.
struct Frame {
    pc: u32,
    at: usize,
    undo: usize,
}

/// Runs an unanchored (or anchored) search over `haystack[window.0..window.1]`,
/// trying start positions from `from`. Returns the capture slots of the
/// leftmost match.
///
/// `window` stays fixed across a `finditer` traversal so `^`, `$` and `\b`
/// keep their meaning while `from` advances.
pub(crate) fn try_search(
    program: &Program,
    haystack: &str,
    window: (usize, usize),
    from: usize,
    anchored: bool,
    step_limit: Option<usize>,
) -> Result<Option<Vec<Option<usize>>>, MatchError> {
    let (start, end) = window;
    let mut steps = 0usize;
    let mut at = from.max(start);
    if program.anchored_start && !anchored && at > start {
        return Ok(None);
    }
    loop {
        #[cfg(feature = "perf-literal")]
        if !anchored {
            if let Some(byte) = program.prefix_byte {
                match memchr::memchr(byte, &haystack.as_bytes()[at..end.max(at)]) {
                    Some(offset) => at += offset,
                    None => return Ok(None),
                }
            }
        }
        if let Some(slots) = exec(program, haystack, start, end, at, &mut steps, step_limit)? {
            return Ok(Some(slots));
        }
        if anchored || program.anchored_start || at >= end {
            return Ok(None);
        }
        at += haystack[at..].chars().next().map_or(1, char::len_utf8);
    }
}

/// A single anchored attempt at `at`. On success the returned slot vector
/// holds byte offsets; slot `2i`/`2i+1` are group `i`'s bounds.
fn exec(
    program: &Program,
    haystack: &str,
    start: usize,
    end: usize,
    first: usize,
    steps: &mut usize,
    step_limit: Option<usize>,
) -> Result<Option<Vec<Option<usize>>>, MatchError> {
    let flags = program.flags;
    let unicode = flags.contains(Flags::UNICODE);
    let caseless = flags.contains(Flags::IGNORECASE);

    let mut slots: Vec<Option<usize>> = vec![None; program.slots + program.loops];
    slots[0] = Some(first);
    let mut undo: Vec<(u32, Option<usize>)> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut pc = 0u32;
    let mut at = first;

    loop {
        if let Some(limit) = step_limit {
            *steps += 1;
            if *steps > limit {
                return Err(MatchError::step_limit(limit));
            }
        }
        let mut failed = false;
        match program.insts[pc as usize] {
            Inst::Char(expected) => match char_at(haystack, at, end) {
                Some(ch)
                    if ch == expected
                        || (caseless && fold_case(ch, unicode) == expected) =>
                {
                    at += ch.len_utf8();
                    pc += 1;
                }
                _ => failed = true,
            },
            Inst::Class(idx) => match char_at(haystack, at, end) {
                Some(ch) if program.classes[idx as usize].matches(ch, flags) => {
                    at += ch.len_utf8();
                    pc += 1;
                }
                _ => failed = true,
            },
            Inst::Any => match char_at(haystack, at, end) {
                Some(ch) => {
                    at += ch.len_utf8();
                    pc += 1;
                }
                None => failed = true,
            },
            Inst::AnyNoNl => match char_at(haystack, at, end) {
                Some(ch) if ch != '\n' => {
                    at += ch.len_utf8();
                    pc += 1;
                }
                _ => failed = true,
            },
            Inst::Look(look) => {
                if look_matches(haystack, at, start, end, look, unicode) {
                    pc += 1;
                } else {
                    failed = true;
                }
            }
            Inst::Save(slot) | Inst::MarkLoop(slot) => {
                undo.push((slot, slots[slot as usize]));
                slots[slot as usize] = Some(at);
                pc += 1;
            }
            Inst::CheckLoop { slot, exit } => {
                // Zero progress: keep this iteration but leave the loop.
                if slots[slot as usize] == Some(at) {
                    pc = exit;
                } else {
                    pc += 1;
                }
            }
            Inst::Split { prefer, other } => {
                stack.push(Frame {
                    pc: other,
                    at,
                    undo: undo.len(),
                });
                pc = prefer;
            }
            Inst::Jump(target) => pc = target,
            Inst::Match => {
                slots[1] = Some(at);
                slots.truncate(program.slots);
                return Ok(Some(slots));
            }
        }
        if failed {
            match stack.pop() {
                None => return Ok(None),
                Some(frame) => {
                    for (slot, old) in undo.drain(frame.undo..).rev() {
                        slots[slot as usize] = old;
                    }
                    pc = frame.pc;
                    at = frame.at;
                }
            }
        }
    }
}

/// The codepoint starting at byte `at`, if it lies entirely inside the
/// window.
fn char_at(haystack: &str, at: usize, end: usize) -> Option<char> {
    if at >= end {
        return None;
    }
    let ch = haystack[at..].chars().next()?;
    (at + ch.len_utf8() <= end).then_some(ch)
}

fn look_matches(
    haystack: &str,
    at: usize,
    start: usize,
    end: usize,
    look: Look,
    unicode: bool,
) -> bool {
    let prev = || {
        if at > start {
            haystack[..at].chars().next_back()
        } else {
            None
        }
    };
    let next = || char_at(haystack, at, end);
    match look {
        Look::Start => at == start,
        Look::End => at == end || (at + 1 == end && next() == Some('\n')),
        Look::LineStart => at == start || prev() == Some('\n'),
        Look::LineEnd => at == end || next() == Some('\n'),
        Look::WordBoundary | Look::NotWordBoundary => {
            let before = prev().is_some_and(|c| is_word_char(c, unicode));
            let after = next().is_some_and(|c| is_word_char(c, unicode));
            (before != after) == matches!(look, Look::WordBoundary)
        }
    }
}
