//! Lazy match iterators behind [`Regex::finditer`](crate::Regex::finditer).
//!
//! Matches are non-overlapping and strictly left-to-right: the scan resumes
//! at the end of each match, or one char further when the match was
//! zero-length, so traversal always makes progress. The search window stays
//! fixed, so anchors keep their meaning across the whole traversal.

use crate::regex::{
    backtrack::{self, MatchError},
    captures::Captures,
    input::Input,
    re::Regex,
};

/// Fallible iterator over all matches, yielding
/// `Result<Captures, MatchError>`. Stops after the first error.
pub struct TryCaptureMatches<'r, 'h> {
    re: &'r Regex,
    haystack: &'h str,
    window: (usize, usize),
    at: usize,
    done: bool,
}

impl<'r, 'h> TryCaptureMatches<'r, 'h> {
    pub(crate) fn new(re: &'r Regex, input: Input<'h>) -> Self {
        let window = input.span();
        Self {
            re,
            haystack: input.haystack(),
            window,
            at: window.0,
            done: false,
        }
    }
}

impl<'h> Iterator for TryCaptureMatches<'_, 'h> {
    type Item = Result<Captures<'h>, MatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.at > self.window.1 {
            return None;
        }
        let result = backtrack::try_search(
            self.re.program(),
            self.haystack,
            self.window,
            self.at,
            false,
            self.re.step_limit(),
        );
        match result {
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Ok(Some(slots)) => {
                let caps = Captures::new(self.haystack, slots, self.re.group_info());
                let m = caps.get_match();
                self.at = if m.is_empty() {
                    next_boundary(self.haystack, m.end())
                } else {
                    m.end()
                };
                Some(Ok(caps))
            }
        }
    }
}

/// Iterator over all matches, yielding [`Captures`] directly.
///
/// Panics if a configured step limit is exceeded; use
/// [`Regex::try_finditer`](crate::Regex::try_finditer) to handle that as an
/// error instead.
pub struct CaptureMatches<'r, 'h>(pub(crate) TryCaptureMatches<'r, 'h>);

impl<'h> Iterator for CaptureMatches<'_, 'h> {
    type Item = Captures<'h>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|r| r.unwrap())
    }
}

/// The next char boundary strictly after `at` (or one past the end).
fn next_boundary(haystack: &str, at: usize) -> usize {
    let mut at = at + 1;
    while at < haystack.len() && !haystack.is_char_boundary(at) {
        at += 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use crate::Regex;

    #[test]
    fn zero_length_matches_make_progress() {
        let re = Regex::new("a*").unwrap();
        let spans = re
            .finditer("baaab")
            .map(|c| (c.get_match().start(), c.get_match().end()))
            .collect_vec();
        assert_eq!(spans, vec![(0, 0), (1, 4), (4, 4), (5, 5)]);
    }

    #[test]
    fn empty_pattern_visits_every_boundary() {
        let re = Regex::new("").unwrap();
        let spans = re
            .finditer("汉a")
            .map(|c| c.get_match().start())
            .collect_vec();
        assert_eq!(spans, vec![0, 3, 4]);
    }

    #[test]
    fn matches_are_non_overlapping() {
        let re = Regex::new("aa").unwrap();
        let spans = re
            .finditer("aaaaa")
            .map(|c| c.get_match().range())
            .collect_vec();
        assert_eq!(spans, vec![0..2, 2..4]);
    }

    #[test]
    fn anchored_start_matches_once() {
        let re = Regex::new("^").unwrap();
        assert_eq!(re.finditer("abc").count(), 1);
    }
}
