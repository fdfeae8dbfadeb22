/*!
A self-contained backtracking regular expression engine with a Python
`re`-flavoured API: compile a pattern once, then `search`, `match_at`,
`finditer`, `split` and `sub` over string haystacks with full capture-group
access.

## Usage
```
use rematch::Regex;

let re = Regex::new(r"(?<name>[a-z]+)-(\d+)").unwrap();
let caps = re.search("build artifact-42 done").unwrap();
assert_eq!(caps.group(0), Some("artifact-42"));
assert_eq!(caps.group_by_name("name"), Some("artifact"));
assert_eq!(caps.span(2), Some(15..17));

let re = Regex::new(r"\s+").unwrap();
assert_eq!(re.sub(" ", "too   much\tspace", 0), "too much space");
```

Flags and resource limits are configured through the builder:
```
use rematch::{Flags, Regex};

let re = Regex::builder()
    .flags(Flags::default() | Flags::IGNORECASE)
    .build("warning")
    .unwrap();
assert!(re.is_match("[WARNING] disk full"));
```

## Supported syntax
See the [`syntax`] module. Lookaround and backreferences are deliberately
not supported; patterns using them fail to compile with a descriptive
[`PatternError`].

## Matching semantics
Matches are leftmost, with leftmost-first alternation and greedy/lazy
quantifiers resolved by backtracking, like Python's `re` module. The
worst case is exponential; see [`Regex`] for the step-limit safety valve.
All offsets are byte offsets.
*/
pub mod regex;
pub mod syntax;

pub use crate::{
    regex::{Captures, Input, Match, MatchError, Regex},
    syntax::{Flags, PatternError},
};

#[cfg(test)]
mod tests {
    use itertools::Itertools;

    use super::*;

    #[test]
    fn declaration_scan() {
        let re =
            Regex::new(r"let\s([a-z][A-Za-z\d_]*):\s([A-Z][A-Za-z\d]+)\s=\s(.+)").unwrap();
        let caps = re.search("    let count: Int = items.len()").unwrap();
        assert_eq!(caps.group(1), Some("count"));
        assert_eq!(caps.group(2), Some("Int"));
        assert_eq!(caps.group(3), Some("items.len()"));
    }

    #[test]
    fn zero_length_traversal() {
        let re = Regex::new("a*").unwrap();
        let spans = re
            .finditer("baaab")
            .map(|c| c.get_match().range())
            .collect_vec();
        assert_eq!(spans, vec![0..0, 1..4, 4..4, 5..5]);
    }

    #[test]
    fn split_keeps_empty_fields() {
        let re = Regex::new(",").unwrap();
        assert_eq!(
            re.split("a,b,,c", 0),
            vec![Some("a"), Some("b"), Some(""), Some("c")]
        );
    }

    #[test]
    fn subn_reports_replacements() {
        let re = Regex::new(r"\d+").unwrap();
        assert_eq!(re.subn("#", "x12y345z", 0), ("x#y#z".to_string(), 2));
    }

    #[test]
    fn unterminated_class_is_a_syntax_error() {
        let err = Regex::new("[a-").unwrap_err();
        let PatternError::Syntax { pos, msg } = err else {
            panic!("expected a syntax error, got {err:?}");
        };
        assert_eq!(pos, 0);
        assert!(msg.contains("unterminated character class"));
    }
}
