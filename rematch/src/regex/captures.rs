use std::{collections::HashMap, fmt, ops::Range, sync::Arc};

/// A single match in a haystack: a byte-offset range plus the haystack
/// itself, so the matched text can be borrowed directly.
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Match<'h> {
    haystack: &'h str,
    start: usize,
    end: usize,
}

impl<'h> Match<'h> {
    pub(crate) fn new(haystack: &'h str, start: usize, end: usize) -> Self {
        Self {
            haystack,
            start,
            end,
        }
    }

    /// The starting byte offset of the match.
    #[inline]
    pub fn start(&self) -> usize {
        self.start
    }

    /// The ending byte offset of the match (exclusive).
    #[inline]
    pub fn end(&self) -> usize {
        self.end
    }

    /// The matched range of bytes.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The matched text.
    #[inline]
    pub fn as_str(&self) -> &'h str {
        &self.haystack[self.range()]
    }

    /// The length of the match, in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the match is zero-length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Debug for Match<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Match")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("text", &self.as_str())
            .finish()
    }
}

/// Capture-group metadata shared by a compiled pattern and every `Captures`
/// it produces.
#[derive(Debug)]
pub(crate) struct GroupInfo {
    /// Number of capturing groups, excluding group 0.
    group_count: usize,
    names: HashMap<String, usize>,
}

impl GroupInfo {
    pub(crate) fn new(
        group_count: usize,
        names: impl IntoIterator<Item = (String, usize)>,
    ) -> Self {
        Self {
            group_count,
            names: names.into_iter().collect(),
        }
    }

    pub(crate) fn group_count(&self) -> usize {
        self.group_count
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }
}

/// An immutable snapshot of the capture groups of one successful match.
///
/// Group 0 is the whole match and always participates. Any other group may
/// be `None` when its subpattern was never entered on the winning path;
/// that is distinct from a group that matched the empty string, whose span
/// has `start == end`. All offsets are byte offsets into the haystack.
#[derive(Clone)]
pub struct Captures<'h> {
    haystack: &'h str,
    slots: Box<[Option<usize>]>,
    info: Arc<GroupInfo>,
}

impl<'h> Captures<'h> {
    pub(crate) fn new(
        haystack: &'h str,
        slots: Vec<Option<usize>>,
        info: Arc<GroupInfo>,
    ) -> Self {
        Self {
            haystack,
            slots: slots.into_boxed_slice(),
            info,
        }
    }

    /// The whole match (group 0).
    pub fn get_match(&self) -> Match<'h> {
        // Slots 0 and 1 are always filled on a successful match.
        let start = self.slots[0].unwrap_or(0);
        let end = self.slots[1].unwrap_or(start);
        Match::new(self.haystack, start, end)
    }

    /// The match of group `index`, or `None` when the index is out of range
    /// or the group did not participate. Never panics.
    pub fn get(&self, index: usize) -> Option<Match<'h>> {
        let (start, end) = self.slot_pair(index)?;
        Some(Match::new(self.haystack, start, end))
    }

    /// The text of group `index`. `group(0)` is the whole match.
    pub fn group(&self, index: usize) -> Option<&'h str> {
        self.get(index).map(|m| m.as_str())
    }

    /// The text of the named group, or `None` when the name does not exist
    /// or the group did not participate.
    pub fn group_by_name(&self, name: &str) -> Option<&'h str> {
        self.group(self.info.index_of(name)?)
    }

    /// The byte span of group `index`.
    pub fn span(&self, index: usize) -> Option<Range<usize>> {
        let (start, end) = self.slot_pair(index)?;
        Some(start..end)
    }

    /// Number of capturing groups in the pattern, excluding group 0. Groups
    /// that did not participate still count.
    pub fn group_count(&self) -> usize {
        self.info.group_count()
    }

    /// The texts of groups `1..=group_count()`, `None` for groups that did
    /// not participate.
    pub fn groups(&self) -> Vec<Option<&'h str>> {
        (1..=self.group_count()).map(|i| self.group(i)).collect()
    }

    /// The texts of the given groups, in order: the multi-index form of
    /// [`group`](Self::group). Out-of-range indices yield `None`, like any
    /// other non-participating group.
    pub fn group_many<I>(&self, indices: I) -> Vec<Option<&'h str>>
    where
        I: IntoIterator<Item = usize>,
    {
        indices.into_iter().map(|i| self.group(i)).collect()
    }

    /// Like [`groups`](Self::groups), with non-participating groups
    /// replaced by `default`.
    pub fn groups_with(&self, default: &'h str) -> Vec<&'h str> {
        (1..=self.group_count())
            .map(|i| self.group(i).unwrap_or(default))
            .collect()
    }

    /// Substitutes captured texts into a replacement template.
    ///
    /// `\1`..`\99` and `\g<name>` insert a group's text (`\g<0>` the whole
    /// match); a group that did not participate, or a number no group has,
    /// inserts nothing. `\\` inserts a backslash and `\n`, `\t`, `\r` the
    /// usual control characters. Any other escaped character is kept as-is.
    pub fn expand(&self, template: &str) -> String {
        let chars: Vec<char> = template.chars().collect();
        let mut out = String::with_capacity(template.len());
        let mut i = 0;
        while i < chars.len() {
            if chars[i] != '\\' || i + 1 == chars.len() {
                out.push(chars[i]);
                i += 1;
                continue;
            }
            i += 1;
            match chars[i] {
                '\\' => {
                    out.push('\\');
                    i += 1;
                }
                'n' => {
                    out.push('\n');
                    i += 1;
                }
                't' => {
                    out.push('\t');
                    i += 1;
                }
                'r' => {
                    out.push('\r');
                    i += 1;
                }
                'g' => {
                    if let Some((index, next)) = self.parse_named_ref(&chars, i + 1) {
                        if let Some(text) = self.group(index) {
                            out.push_str(text);
                        }
                        i = next;
                    } else {
                        // Malformed reference, keep it verbatim.
                        out.push('\\');
                        out.push('g');
                        i += 1;
                    }
                }
                c if c.is_ascii_digit() => {
                    // Up to two digits form the group number.
                    let mut index = c.to_digit(10).unwrap() as usize;
                    i += 1;
                    if i < chars.len() && chars[i].is_ascii_digit() {
                        index = index * 10 + chars[i].to_digit(10).unwrap() as usize;
                        i += 1;
                    }
                    if let Some(text) = self.group(index) {
                        out.push_str(text);
                    }
                }
                c => {
                    out.push('\\');
                    out.push(c);
                    i += 1;
                }
            }
        }
        out
    }

    /// Parses `<name>` or `<number>` starting at `chars[at]`, resolving it
    /// to a group index. Returns the index and the position after `>`.
    fn parse_named_ref(&self, chars: &[char], at: usize) -> Option<(usize, usize)> {
        if chars.get(at) != Some(&'<') {
            return None;
        }
        let close = (at + 1..chars.len()).find(|&j| chars[j] == '>')?;
        let name: String = chars[at + 1..close].iter().collect();
        if name.is_empty() {
            return None;
        }
        let index = if name.chars().all(|c| c.is_ascii_digit()) {
            name.parse().ok()?
        } else {
            // An unknown name resolves like an unmatched group: to nothing.
            self.info.index_of(&name).unwrap_or(usize::MAX)
        };
        Some((index, close + 1))
    }

    fn slot_pair(&self, index: usize) -> Option<(usize, usize)> {
        if index > self.group_count() {
            return None;
        }
        let start = (*self.slots.get(2 * index)?)?;
        let end = (*self.slots.get(2 * index + 1)?)?;
        Some((start, end))
    }
}

impl fmt::Debug for Captures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for i in 0..=self.group_count() {
            map.entry(&i, &self.group(i));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captures<'h>(
        haystack: &'h str,
        slots: Vec<Option<usize>>,
        names: Vec<(String, usize)>,
    ) -> Captures<'h> {
        let count = slots.len() / 2 - 1;
        Captures::new(haystack, slots, Arc::new(GroupInfo::new(count, names)))
    }

    #[test]
    fn match_accessors() {
        let m = Match::new("hello", 1, 4);
        assert_eq!(m.start(), 1);
        assert_eq!(m.end(), 4);
        assert_eq!(m.range(), 1..4);
        assert_eq!(m.as_str(), "ell");
        assert_eq!(m.len(), 3);
        assert!(!m.is_empty());
    }

    #[test]
    fn group_access() {
        let caps = captures(
            "ab",
            vec![Some(0), Some(2), Some(0), Some(1), None, None],
            vec![("first".into(), 1)],
        );
        assert_eq!(caps.get_match().as_str(), "ab");
        assert_eq!(caps.group(0), Some("ab"));
        assert_eq!(caps.group(1), Some("a"));
        assert_eq!(caps.group(2), None);
        assert_eq!(caps.group(3), None);
        assert_eq!(caps.span(1), Some(0..1));
        assert_eq!(caps.span(2), None);
        assert_eq!(caps.group_by_name("first"), Some("a"));
        assert_eq!(caps.group_by_name("missing"), None);
        assert_eq!(caps.groups(), vec![Some("a"), None]);
        assert_eq!(caps.groups_with("-"), vec!["a", "-"]);
        assert_eq!(
            caps.group_many([2, 0, 1, 9]),
            vec![None, Some("ab"), Some("a"), None]
        );
    }

    #[test]
    fn expand_templates() {
        let caps = captures(
            "a-b",
            vec![Some(0), Some(3), Some(0), Some(1), Some(2), Some(3)],
            vec![("x".into(), 1), ("y".into(), 2)],
        );
        assert_eq!(caps.expand(r"\2\1"), "ba");
        assert_eq!(caps.expand(r"\g<y>/\g<x>"), "b/a");
        assert_eq!(caps.expand(r"\g<0>!"), "a-b!");
        assert_eq!(caps.expand(r"[\0]"), "[a-b]");
        assert_eq!(caps.expand(r"a\\b\n"), "a\\b\n");
        // Unresolved references expand to nothing.
        assert_eq!(caps.expand(r"<\9>"), "<>");
        assert_eq!(caps.expand(r"<\g<zzz>>"), "<>");
        // Malformed \g stays verbatim; so does a trailing backslash.
        assert_eq!(caps.expand(r"\gx"), r"\gx");
        assert_eq!(caps.expand("end\\"), "end\\");
    }

    #[test]
    fn expand_two_digit_references() {
        // 11 groups, all spanning 0..1 of "z".
        let slots: Vec<Option<usize>> = (0..24)
            .map(|i| Some(if i % 2 == 0 { 0 } else { 1 }))
            .collect();
        let caps = captures("z", slots, vec![]);
        assert_eq!(caps.expand(r"\11"), "z");
        // `\1` followed by a non-digit is a single-digit reference.
        assert_eq!(caps.expand(r"\1x"), "zx");
    }
}
