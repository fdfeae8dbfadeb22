use bon::Builder;

/// The input to a search: a haystack plus an optional byte-offset window.
///
/// The window plays the role of Python's `pos`/`endpos` arguments: the
/// search only considers text inside `start..end`, and `^`, `$` and `\b`
/// are evaluated against the window bounds, not the whole haystack.
/// Offsets falling inside a multi-byte codepoint are snapped to the nearest
/// boundary (forward for `start`, backward for `end`).
///
/// A plain `&str` converts into a whole-haystack `Input`:
/// ```
/// use rematch::{Input, Regex};
///
/// let re = Regex::new("a+").unwrap();
/// assert_eq!(re.find("baaab").unwrap().range(), 1..4);
/// let input = Input::builder("baaab").start(2).end(4).build();
/// assert_eq!(re.find(input).unwrap().range(), 2..4);
/// ```
#[derive(Builder, Clone, Debug)]
pub struct Input<'h> {
    #[builder(start_fn)]
    haystack: &'h str,
    /// Where the search window starts, in bytes. Defaults to `0`.
    #[builder(default = 0)]
    start: usize,
    /// Where the search window ends (exclusive), in bytes. Defaults to the
    /// haystack length.
    end: Option<usize>,
}

impl<'h> Input<'h> {
    pub fn haystack(&self) -> &'h str {
        self.haystack
    }

    /// The clamped window as `(start, end)` byte offsets. Always a valid,
    /// non-reversed range of char boundaries.
    pub(crate) fn span(&self) -> (usize, usize) {
        let len = self.haystack.len();
        let mut start = self.start.min(len);
        while !self.haystack.is_char_boundary(start) {
            start += 1;
        }
        let mut end = self.end.unwrap_or(len).min(len);
        while !self.haystack.is_char_boundary(end) {
            end -= 1;
        }
        (start, end.max(start))
    }
}

impl<'h> From<&'h str> for Input<'h> {
    fn from(haystack: &'h str) -> Self {
        Input::builder(haystack).build()
    }
}

impl<'h> From<&'h String> for Input<'h> {
    fn from(haystack: &'h String) -> Self {
        Input::builder(haystack.as_str()).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_defaults_to_whole_haystack() {
        let input = Input::from("hello");
        assert_eq!(input.span(), (0, 5));
    }

    #[test]
    fn span_clamps_and_snaps() {
        let input = Input::builder("hello").start(2).end(99).build();
        assert_eq!(input.span(), (2, 5));

        // Offsets inside a multi-byte char snap to boundaries.
        let input = Input::builder("汉字").start(1).end(5).build();
        assert_eq!(input.span(), (3, 3));

        // A reversed window collapses to an empty one.
        let input = Input::builder("hello").start(4).end(2).build();
        assert_eq!(input.span(), (4, 4));
    }
}
