use std::{fmt, sync::Arc};

use bon::bon;

use crate::{
    regex::{
        backtrack::{self, MatchError},
        captures::{Captures, GroupInfo, Match},
        compile::{self, Program},
        input::Input,
        iter::{CaptureMatches, TryCaptureMatches},
    },
    syntax::{parse, Flags, PatternError},
};

/// A compiled regular expression.
///
/// Compile once with [`Regex::new`] or [`Regex::builder`], then search any
/// number of haystacks. Cloning is cheap (the compiled program is behind an
/// `Arc`) and every operation takes `&self`, so one `Regex` can be shared
/// freely across threads.
///
/// ```
/// use rematch::Regex;
///
/// let re = Regex::new(r"(\w+)@(\w+)\.com").unwrap();
/// let caps = re.search("send to bob@example.com").unwrap();
/// assert_eq!(caps.group(0), Some("bob@example.com"));
/// assert_eq!(caps.group(1), Some("bob"));
/// assert_eq!(caps.group(2), Some("example"));
/// ```
///
/// Named groups work with both `(?<name>..)` and `(?P<name>..)` spellings:
/// ```
/// use rematch::Regex;
///
/// let re = Regex::new(r"(?<key>\w+)=(?<value>\w+)").unwrap();
/// let caps = re.search("retries=5").unwrap();
/// assert_eq!(caps.group_by_name("key"), Some("retries"));
/// assert_eq!(re.group_index("value"), Some(2));
/// ```
///
/// ## Performance
/// The engine is a backtracker: worst-case running time is exponential in
/// the haystack for pathological patterns like `(a+a+)+c`. When accepting
/// untrusted patterns, configure a [step limit](RegexBuilder::step_limit)
/// and use the `try_` operations, which report an exceeded budget as a
/// [`MatchError`] instead of hanging:
///
/// ```
/// use rematch::Regex;
///
/// let re = Regex::builder()
///     .step_limit(10_000)
///     .build(r"(a+a+)+c")
///     .unwrap();
/// assert!(re.try_search("aaaaaaaaaaaaaaaaaaaaaaaab").is_err());
/// ```
#[derive(Clone, Debug)]
pub struct Regex {
    imp: Arc<RegexI>,
}

#[derive(Debug)]
struct RegexI {
    pattern: Box<str>,
    program: Program,
    step_limit: Option<usize>,
}

impl Regex {
    /// Compiles a pattern with default flags and no step limit.
    pub fn new(pattern: &str) -> Result<Regex, PatternError> {
        Regex::builder().build(pattern)
    }

    /// The pattern string this regex was compiled from.
    pub fn pattern(&self) -> &str {
        &self.imp.pattern
    }

    /// The flags this regex was compiled with.
    pub fn flags(&self) -> Flags {
        self.imp.program.flags
    }

    /// Number of capturing groups in the pattern, excluding group 0.
    pub fn group_count(&self) -> usize {
        self.imp.program.info.group_count()
    }

    /// The group number of a named group.
    pub fn group_index(&self, name: &str) -> Option<usize> {
        self.imp.program.info.index_of(name)
    }

    pub(crate) fn program(&self) -> &Program {
        &self.imp.program
    }

    pub(crate) fn step_limit(&self) -> Option<usize> {
        self.imp.step_limit
    }

    pub(crate) fn group_info(&self) -> Arc<GroupInfo> {
        self.imp.program.info.clone()
    }
}

#[bon]
impl Regex {
    /// Compiles a pattern with explicit configuration.
    ///
    /// Note that [`flags`](RegexBuilder::flags) replaces the default set, so
    /// keep [`Flags::default`] in the union unless ASCII-only semantics are
    /// wanted:
    ///
    /// ```
    /// use rematch::{Flags, Regex};
    ///
    /// let re = Regex::builder()
    ///     .flags(Flags::default() | Flags::IGNORECASE | Flags::MULTILINE)
    ///     .build(r"^total: (\d+)$")
    ///     .unwrap();
    /// let caps = re.search("count\nTOTAL: 42\n").unwrap();
    /// assert_eq!(caps.group(1), Some("42"));
    /// ```
    #[builder(builder_type = RegexBuilder, finish_fn(name = build))]
    pub fn builder(
        #[builder(finish_fn)] pattern: &str,

        /// Compile-time flags. Defaults to [`Flags::default`] (`UNICODE`).
        #[builder(default)]
        flags: Flags,

        /// Backtracking step budget per search call. When exceeded, `try_`
        /// operations return a [`MatchError`] and the plain ones panic.
        /// Defaults to unlimited.
        step_limit: Option<usize>,
    ) -> Result<Regex, PatternError> {
        let parsed = parse::parse(pattern)?;
        let program = compile::compile(&parsed, flags);
        Ok(Regex {
            imp: Arc::new(RegexI {
                pattern: pattern.into(),
                program,
                step_limit,
            }),
        })
    }
}

/// High-level search operations.
///
/// Every operation takes `impl Into<Input>`, so a plain `&str` searches the
/// whole haystack and an explicit [`Input`] restricts the search window
/// (Python's `pos`/`endpos`). Each operation has a `try_` form returning
/// `Result<_, MatchError>`; the plain form panics only when a configured
/// [step limit](RegexBuilder::step_limit) is exceeded.
impl Regex {
    /// Returns the leftmost match in the window, with all capture groups.
    ///
    /// ```
    /// use rematch::Regex;
    ///
    /// let re = Regex::new(r"(\d+)\.(\d+)").unwrap();
    /// let caps = re.search("pi is 3.14").unwrap();
    /// assert_eq!(caps.get_match().range(), 6..10);
    /// assert_eq!(caps.groups(), vec![Some("3"), Some("14")]);
    /// assert!(re.search("no digits").is_none());
    /// ```
    pub fn search<'h>(&self, input: impl Into<Input<'h>>) -> Option<Captures<'h>> {
        self.try_search(input).unwrap()
    }

    /// Fallible form of [`search`](Regex::search).
    pub fn try_search<'h>(
        &self,
        input: impl Into<Input<'h>>,
    ) -> Result<Option<Captures<'h>>, MatchError> {
        let input = input.into();
        let window = input.span();
        self.search_impl(input.haystack(), window, false)
    }

    /// Like [`search`](Regex::search), but anchored: the match must begin
    /// exactly at the window start (Python's `match`).
    ///
    /// ```
    /// use rematch::Regex;
    ///
    /// let re = Regex::new("ab").unwrap();
    /// assert!(re.match_at("abc").is_some());
    /// assert!(re.match_at("cab").is_none());
    /// assert!(re.search("cab").is_some());
    /// ```
    pub fn match_at<'h>(&self, input: impl Into<Input<'h>>) -> Option<Captures<'h>> {
        self.try_match_at(input).unwrap()
    }

    /// Fallible form of [`match_at`](Regex::match_at).
    pub fn try_match_at<'h>(
        &self,
        input: impl Into<Input<'h>>,
    ) -> Result<Option<Captures<'h>>, MatchError> {
        let input = input.into();
        let window = input.span();
        self.search_impl(input.haystack(), window, true)
    }

    /// Whether the window contains a match anywhere.
    pub fn is_match<'h>(&self, input: impl Into<Input<'h>>) -> bool {
        self.try_is_match(input).unwrap()
    }

    /// Fallible form of [`is_match`](Regex::is_match).
    pub fn try_is_match<'h>(&self, input: impl Into<Input<'h>>) -> Result<bool, MatchError> {
        Ok(self.try_search(input)?.is_some())
    }

    /// The leftmost match as a plain [`Match`], without group access.
    pub fn find<'h>(&self, input: impl Into<Input<'h>>) -> Option<Match<'h>> {
        self.try_find(input).unwrap()
    }

    /// Fallible form of [`find`](Regex::find).
    pub fn try_find<'h>(
        &self,
        input: impl Into<Input<'h>>,
    ) -> Result<Option<Match<'h>>, MatchError> {
        Ok(self.try_search(input)?.map(|caps| caps.get_match()))
    }

    /// Iterates over all matches, non-overlapping and left-to-right. After
    /// each match the scan resumes at its end, or one char further when the
    /// match was zero-length.
    ///
    /// ```
    /// use rematch::Regex;
    ///
    /// let re = Regex::new(r"\d+").unwrap();
    /// let spans: Vec<_> = re.finditer("a1bb22").map(|c| c.get_match().range()).collect();
    /// assert_eq!(spans, vec![1..2, 4..6]);
    /// ```
    pub fn finditer<'r, 'h>(&'r self, input: impl Into<Input<'h>>) -> CaptureMatches<'r, 'h> {
        CaptureMatches(self.try_finditer(input))
    }

    /// Fallible form of [`finditer`](Regex::finditer): yields
    /// `Result<Captures, MatchError>` and stops after the first error.
    pub fn try_finditer<'r, 'h>(
        &'r self,
        input: impl Into<Input<'h>>,
    ) -> TryCaptureMatches<'r, 'h> {
        TryCaptureMatches::new(self, input.into())
    }

    /// The text of every match, in order.
    ///
    /// ```
    /// use rematch::Regex;
    ///
    /// let re = Regex::new(r"\w+").unwrap();
    /// assert_eq!(re.findall("to be, or not"), vec!["to", "be", "or", "not"]);
    /// ```
    pub fn findall<'h>(&self, input: impl Into<Input<'h>>) -> Vec<&'h str> {
        self.try_findall(input).unwrap()
    }

    /// Fallible form of [`findall`](Regex::findall).
    pub fn try_findall<'h>(
        &self,
        input: impl Into<Input<'h>>,
    ) -> Result<Vec<&'h str>, MatchError> {
        self.try_finditer(input)
            .map(|r| r.map(|caps| caps.get_match().as_str()))
            .collect()
    }

    /// Splits the window at every match, keeping the text between matches.
    /// Captured group texts are interleaved after each segment (`None` for
    /// groups that did not participate in that match). `maxsplit > 0` caps
    /// the number of cuts, leaving the remainder unsplit; `0` means
    /// unlimited. Zero-length matches cut too, so leading and trailing
    /// empty segments are retained.
    ///
    /// ```
    /// use rematch::Regex;
    ///
    /// let re = Regex::new(",").unwrap();
    /// assert_eq!(
    ///     re.split("a,b,,c", 0),
    ///     vec![Some("a"), Some("b"), Some(""), Some("c")],
    /// );
    /// assert_eq!(re.split("a,b,,c", 2), vec![Some("a"), Some("b"), Some(",c")]);
    /// ```
    pub fn split<'h>(&self, input: impl Into<Input<'h>>, maxsplit: usize) -> Vec<Option<&'h str>> {
        self.try_split(input, maxsplit).unwrap()
    }

    /// Fallible form of [`split`](Regex::split).
    pub fn try_split<'h>(
        &self,
        input: impl Into<Input<'h>>,
        maxsplit: usize,
    ) -> Result<Vec<Option<&'h str>>, MatchError> {
        let input = input.into();
        let haystack = input.haystack();
        let (start, end) = input.span();
        let mut parts = Vec::new();
        let mut last = start;
        let mut cuts = 0;
        let mut matches = self.try_finditer(input);
        loop {
            if maxsplit > 0 && cuts >= maxsplit {
                break;
            }
            let Some(caps) = matches.next() else { break };
            let caps = caps?;
            let m = caps.get_match();
            parts.push(Some(&haystack[last..m.start()]));
            for i in 1..=self.group_count() {
                parts.push(caps.group(i));
            }
            last = m.end();
            cuts += 1;
        }
        parts.push(Some(&haystack[last..end]));
        Ok(parts)
    }

    /// Replaces every match with the expanded template (see
    /// [`Captures::expand`] for the template syntax) and returns the new
    /// string. `count > 0` caps the number of replacements; `0` means
    /// unlimited.
    ///
    /// ```
    /// use rematch::Regex;
    ///
    /// let re = Regex::new(r"\d+").unwrap();
    /// assert_eq!(re.sub("#", "x12y345z", 0), "x#y#z");
    ///
    /// let re = Regex::new(r"(\w+) (\w+)").unwrap();
    /// assert_eq!(re.sub(r"\2 \1", "hello world", 0), "world hello");
    /// ```
    pub fn sub<'h>(&self, replacement: &str, input: impl Into<Input<'h>>, count: usize) -> String {
        self.try_sub(replacement, input, count).unwrap()
    }

    /// Fallible form of [`sub`](Regex::sub).
    pub fn try_sub<'h>(
        &self,
        replacement: &str,
        input: impl Into<Input<'h>>,
        count: usize,
    ) -> Result<String, MatchError> {
        Ok(self.try_subn(replacement, input, count)?.0)
    }

    /// Like [`sub`](Regex::sub), also returning how many replacements were
    /// made.
    ///
    /// ```
    /// use rematch::Regex;
    ///
    /// let re = Regex::new(r"\d+").unwrap();
    /// assert_eq!(re.subn("#", "x12y345z", 0), ("x#y#z".to_string(), 2));
    /// ```
    pub fn subn<'h>(
        &self,
        replacement: &str,
        input: impl Into<Input<'h>>,
        count: usize,
    ) -> (String, usize) {
        self.try_subn(replacement, input, count).unwrap()
    }

    /// Fallible form of [`subn`](Regex::subn).
    pub fn try_subn<'h>(
        &self,
        replacement: &str,
        input: impl Into<Input<'h>>,
        count: usize,
    ) -> Result<(String, usize), MatchError> {
        let input = input.into();
        let haystack = input.haystack();
        // Skip template parsing when the replacement can't contain one.
        let literal = !replacement.contains('\\');
        let mut out = String::with_capacity(haystack.len());
        let mut last = 0;
        let mut made = 0;
        let mut matches = self.try_finditer(input);
        loop {
            if count > 0 && made >= count {
                break;
            }
            let Some(caps) = matches.next() else { break };
            let caps = caps?;
            let m = caps.get_match();
            out.push_str(&haystack[last..m.start()]);
            if literal {
                out.push_str(replacement);
            } else {
                out.push_str(&caps.expand(replacement));
            }
            last = m.end();
            made += 1;
        }
        out.push_str(&haystack[last..]);
        Ok((out, made))
    }

    fn search_impl<'h>(
        &self,
        haystack: &'h str,
        window: (usize, usize),
        anchored: bool,
    ) -> Result<Option<Captures<'h>>, MatchError> {
        let slots = backtrack::try_search(
            self.program(),
            haystack,
            window,
            window.0,
            anchored,
            self.step_limit(),
        )?;
        Ok(slots.map(|slots| Captures::new(haystack, slots, self.group_info())))
    }
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn extracts_declarations() {
        let re = Regex::new(r"let\s([a-z][A-Za-z\d_]*):\s([A-Z][A-Za-z\d]+)\s=\s(.+)").unwrap();
        let source = "let foo: Int = 1\nlet _skip = 2\nlet bar2: String = \"x\"";
        let found = re
            .finditer(source)
            .map(|c| {
                (
                    c.group(1).unwrap(),
                    c.group(2).unwrap(),
                    c.group(3).unwrap(),
                )
            })
            .collect_vec();
        assert_eq!(
            found,
            vec![("foo", "Int", "1"), ("bar2", "String", "\"x\"")]
        );
    }

    #[test]
    fn search_is_leftmost() {
        let re = Regex::new("a+").unwrap();
        let caps = re.search("xaayaaa").unwrap();
        assert_eq!(caps.get_match().range(), 1..3);
    }

    #[test]
    fn match_at_implies_search_implies_is_match() {
        let re = Regex::new("ab").unwrap();
        for haystack in ["abc", "cab", "xyz"] {
            let anchored = re.match_at(haystack);
            let searched = re.search(haystack);
            if let Some(caps) = &anchored {
                assert_eq!(caps.get_match().start(), 0);
                assert!(searched.is_some());
            }
            assert_eq!(searched.is_some(), re.is_match(haystack));
        }
    }

    #[test]
    fn findall_projects_finditer() {
        let re = Regex::new(r"(\w)(\d)").unwrap();
        let haystack = "a1 b2 c3";
        // Whole-match texts even when groups exist.
        assert_eq!(re.findall(haystack), vec!["a1", "b2", "c3"]);
        let projected = re
            .finditer(haystack)
            .map(|c| c.get_match().as_str())
            .collect_vec();
        assert_eq!(re.findall(haystack), projected);
    }

    #[test]
    fn split_basic() {
        let re = Regex::new(",").unwrap();
        assert_eq!(
            re.split("a,b,,c", 0),
            vec![Some("a"), Some("b"), Some(""), Some("c")]
        );
        assert_eq!(
            re.split("a,b,,c", 2),
            vec![Some("a"), Some("b"), Some(",c")]
        );
        assert_eq!(re.split("nodelim", 0), vec![Some("nodelim")]);
    }

    #[test]
    fn split_interleaves_groups() {
        let re = Regex::new("(;)|(,)").unwrap();
        assert_eq!(
            re.split("a,b;c", 0),
            vec![
                Some("a"),
                None,
                Some(","),
                Some("b"),
                Some(";"),
                None,
                Some("c"),
            ]
        );
    }

    #[test]
    fn split_on_zero_length_matches() {
        let re = Regex::new("x*").unwrap();
        assert_eq!(
            re.split("abc", 0),
            vec![Some(""), Some("a"), Some("b"), Some("c"), Some("")]
        );
        // A delimiter at the edges leaves empty segments too.
        let re = Regex::new(",").unwrap();
        assert_eq!(re.split(",a,", 0), vec![Some(""), Some("a"), Some("")]);
    }

    #[test]
    fn split_roundtrip_without_groups() {
        let re = Regex::new(",").unwrap();
        let haystack = "a,b,,c,";
        let joined = re
            .split(haystack, 0)
            .into_iter()
            .flatten()
            .join(",");
        assert_eq!(joined, haystack);
    }

    #[test]
    fn sub_counts_and_replaces() {
        let re = Regex::new(r"\d+").unwrap();
        assert_eq!(re.subn("#", "x12y345z", 0), ("x#y#z".to_string(), 2));
        assert_eq!(re.subn("#", "x12y345z", 1), ("x#y345z".to_string(), 1));
        assert_eq!(re.subn("#", "nothing", 0), ("nothing".to_string(), 0));
    }

    #[test]
    fn sub_zero_length_matches() {
        let re = Regex::new("a*").unwrap();
        assert_eq!(re.sub("-", "baaab", 0), "-b--b-");
    }

    #[test]
    fn sub_expands_templates() {
        let re = Regex::new(r"(?<first>\w+) (?<second>\w+)").unwrap();
        assert_eq!(re.sub(r"\2 \1", "hello world", 0), "world hello");
        assert_eq!(
            re.sub(r"\g<second>, \g<first>", "hello world", 0),
            "world, hello"
        );
        // Non-participating groups substitute nothing.
        let re = Regex::new(r"(a)|(b)").unwrap();
        assert_eq!(re.sub(r"[\1\2]", "ab", 0), "[a][b]");
    }

    #[test]
    fn sub_without_backreferences_is_idempotent() {
        // Once no matches remain, applying the same substitution again is a
        // no-op. (Zero-length-matching patterns are excluded: they match in
        // any string.)
        let re = Regex::new(r"\d+").unwrap();
        let once = re.sub("#", "x12y345z", 0);
        assert_eq!(once, "x#y#z");
        assert_eq!(re.sub("#", &once, 0), once);

        let re = Regex::new("a+b").unwrap();
        let once = re.sub("c", "aab aaab x", 0);
        assert_eq!(re.sub("c", &once, 0), once);
    }

    #[test]
    fn window_behaves_like_pos_endpos() {
        let re = Regex::new("a+").unwrap();
        let input = Input::builder("aaaa").start(1).end(3).build();
        assert_eq!(re.find(input).unwrap().range(), 1..3);

        // An anchored match is anchored at the window start.
        let re = Regex::new("^b").unwrap();
        let input = Input::builder("abc").start(1).build();
        assert!(re.match_at(input).is_some());
        assert!(re.match_at("abc").is_none());
    }

    #[test]
    fn sub_preserves_text_outside_window() {
        let re = Regex::new("a").unwrap();
        let input = Input::builder("aaaa").start(1).end(3).build();
        assert_eq!(re.sub("-", input, 0), "a--a");
    }

    #[test]
    fn pattern_error_taxonomy() {
        assert!(matches!(
            Regex::new("[a-").unwrap_err(),
            PatternError::Syntax { pos: 0, .. }
        ));
        assert!(matches!(
            Regex::new("(a").unwrap_err(),
            PatternError::UnbalancedGroup { pos: 0 }
        ));
        assert!(matches!(
            Regex::new("a{3,1}").unwrap_err(),
            PatternError::InvalidQuantifierRange { .. }
        ));
        assert!(matches!(
            Regex::new("[z-a]").unwrap_err(),
            PatternError::InvalidClass { .. }
        ));
    }

    #[test]
    fn step_limit_errors_are_not_no_match() {
        let re = Regex::builder()
            .step_limit(5_000)
            .build(r"(a+a+)+c")
            .unwrap();
        assert!(re.try_search("aaaaaaaaaaaaaaaaaaaaaaaab").is_err());
        // Well-behaved searches under the same budget still work.
        assert!(re.try_search("aac").unwrap().is_some());
        assert_eq!(re.try_is_match("x"), Ok(false));
    }

    #[test]
    #[should_panic]
    fn plain_ops_panic_on_exceeded_step_limit() {
        let re = Regex::builder()
            .step_limit(5_000)
            .build(r"(a+a+)+c")
            .unwrap();
        re.search("aaaaaaaaaaaaaaaaaaaaaaaab");
    }

    #[test]
    fn regex_is_cheap_to_clone_and_share() {
        let re = Regex::new(r"\d+").unwrap();
        let clone = re.clone();
        let handle = std::thread::spawn(move || clone.is_match("42"));
        assert!(handle.join().unwrap());
        assert!(re.is_match("42"));
        assert_eq!(re.to_string(), r"\d+");
    }

    #[test]
    fn accessors() {
        let re = Regex::builder()
            .flags(Flags::default() | Flags::IGNORECASE)
            .build(r"(?<a>x)(y)")
            .unwrap();
        assert_eq!(re.pattern(), r"(?<a>x)(y)");
        assert!(re.flags().contains(Flags::IGNORECASE));
        assert_eq!(re.group_count(), 2);
        assert_eq!(re.group_index("a"), Some(1));
        assert_eq!(re.group_index("b"), None);
    }
}
