//! Recursive-descent pattern parser.
//!
//! Produces the [`Ast`] plus capture-group metadata. The parser works on a
//! char vector so error positions are char offsets into the pattern.

use crate::syntax::{
    ast::{AssertionKind, Ast, ClassItem, ClassSet, GroupKind, PerlClass, PerlKind},
    PatternError,
};

/// Upper bound for `{m,n}` quantifier bounds. Counted repeats are expanded
/// during compilation, so the bound keeps programs linear in the pattern.
pub(crate) const MAX_REPEAT: u32 = 1000;

/// A successfully parsed pattern.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub ast: Ast,
    /// Number of capturing groups, excluding group 0.
    pub group_count: u32,
    /// Named groups in declaration order.
    pub names: Vec<(String, u32)>,
}

pub(crate) fn parse(pattern: &str) -> Result<Parsed, PatternError> {
    let mut parser = Parser {
        chars: pattern.chars().collect(),
        pos: 0,
        group_count: 0,
        names: Vec::new(),
    };
    let ast = parser.parse_alternate()?;
    if parser.peek().is_some() {
        // parse_concat only stops early on ')'
        return Err(PatternError::UnbalancedGroup { pos: parser.pos });
    }
    Ok(Parsed {
        ast,
        group_count: parser.group_count,
        names: parser.names,
    })
}

enum ClassAtom {
    Char(char),
    Perl(PerlClass),
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    group_count: u32,
    names: Vec<(String, u32)>,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.advance();
        }
        c
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn syntax(pos: usize, msg: impl Into<String>) -> PatternError {
        PatternError::Syntax {
            pos,
            msg: msg.into(),
        }
    }

    fn parse_alternate(&mut self) -> Result<Ast, PatternError> {
        let first = self.parse_concat()?;
        if self.peek() != Some('|') {
            return Ok(first);
        }
        if matches!(first, Ast::Empty) {
            return Err(Self::syntax(self.pos, "empty alternation branch"));
        }
        let mut branches = vec![first];
        while self.peek() == Some('|') {
            let bar = self.pos;
            self.advance();
            let branch = self.parse_concat()?;
            if matches!(branch, Ast::Empty) {
                return Err(Self::syntax(bar, "empty alternation branch"));
            }
            branches.push(branch);
        }
        Ok(Ast::Alternate(branches))
    }

    fn parse_concat(&mut self) -> Result<Ast, PatternError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None | Some(')') | Some('|') => break,
                Some(_) => items.push(self.parse_repeat()?),
            }
        }
        Ok(match items.len() {
            0 => Ast::Empty,
            1 => items.pop().unwrap(),
            _ => Ast::Concat(items),
        })
    }

    fn parse_repeat(&mut self) -> Result<Ast, PatternError> {
        let atom = self.parse_atom()?;
        let quant_pos = self.pos;
        let (min, max) = match self.peek() {
            Some('*') => {
                self.advance();
                (0, None)
            }
            Some('+') => {
                self.advance();
                (1, None)
            }
            Some('?') => {
                self.advance();
                (0, Some(1))
            }
            Some('{') => match self.parse_counted()? {
                Some(bounds) => bounds,
                // Not a quantifier, `{` will be parsed as a literal.
                None => return Ok(atom),
            },
            _ => return Ok(atom),
        };
        let greedy = !self.eat('?');
        if max.is_some_and(|max| min > max)
            || min > MAX_REPEAT
            || max.is_some_and(|max| max > MAX_REPEAT)
        {
            return Err(PatternError::InvalidQuantifierRange { pos: quant_pos });
        }
        Ok(Ast::Repeat {
            ast: Box::new(atom),
            min,
            max,
            greedy,
        })
    }

    /// Tries to parse `{m}`, `{m,}` or `{m,n}` at the current `{`. Restores
    /// the position and returns `Ok(None)` if the braces don't form a
    /// quantifier.
    fn parse_counted(&mut self) -> Result<Option<(u32, Option<u32>)>, PatternError> {
        let save = self.pos;
        self.advance(); // '{'
        let Some(min) = self.parse_digits(save)? else {
            self.pos = save;
            return Ok(None);
        };
        let bounds = if self.eat('}') {
            return Ok(Some((min, Some(min))));
        } else if self.eat(',') {
            let max = self.parse_digits(save)?;
            if !self.eat('}') {
                self.pos = save;
                return Ok(None);
            }
            (min, max)
        } else {
            self.pos = save;
            return Ok(None);
        };
        Ok(Some(bounds))
    }

    fn parse_digits(&mut self, err_pos: usize) -> Result<Option<u32>, PatternError> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == start {
            return Ok(None);
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse()
            .map(Some)
            .map_err(|_| PatternError::InvalidQuantifierRange { pos: err_pos })
    }

    fn parse_atom(&mut self) -> Result<Ast, PatternError> {
        let pos = self.pos;
        match self.peek() {
            None => Err(Self::syntax(pos, "unexpected end of pattern")),
            Some('(') => self.parse_group(),
            Some('[') => self.parse_class(),
            Some('.') => {
                self.advance();
                Ok(Ast::Dot)
            }
            Some('^') => {
                self.advance();
                Ok(Ast::Assertion(AssertionKind::Start))
            }
            Some('$') => {
                self.advance();
                Ok(Ast::Assertion(AssertionKind::End))
            }
            Some('\\') => self.parse_escape(),
            Some(c @ ('*' | '+' | '?')) => {
                Err(Self::syntax(pos, format!("nothing to repeat before '{c}'")))
            }
            Some(c) => {
                self.advance();
                Ok(Ast::Literal(c))
            }
        }
    }

    fn parse_group(&mut self) -> Result<Ast, PatternError> {
        let open = self.pos;
        self.advance(); // '('
        let kind = if self.eat('?') {
            match self.peek() {
                Some(':') => {
                    self.advance();
                    GroupKind::NonCapturing
                }
                Some('=' | '!') => {
                    return Err(Self::syntax(open, "lookaround is not supported"));
                }
                Some('<') => {
                    self.advance();
                    if matches!(self.peek(), Some('=' | '!')) {
                        return Err(Self::syntax(open, "lookaround is not supported"));
                    }
                    self.parse_group_name(open)?
                }
                Some('P') => {
                    self.advance();
                    if !self.eat('<') {
                        return Err(Self::syntax(open, "unrecognized group syntax"));
                    }
                    self.parse_group_name(open)?
                }
                _ => return Err(Self::syntax(open, "unrecognized group syntax")),
            }
        } else {
            self.group_count += 1;
            GroupKind::Capture {
                index: self.group_count,
                name: None,
            }
        };
        let body = self.parse_alternate()?;
        if !self.eat(')') {
            return Err(PatternError::UnbalancedGroup { pos: open });
        }
        Ok(Ast::Group {
            ast: Box::new(body),
            kind,
        })
    }

    /// Parses `name>` of a named group. The name also takes the next group
    /// number.
    fn parse_group_name(&mut self, open: usize) -> Result<GroupKind, PatternError> {
        let mut name = String::new();
        loop {
            match self.peek() {
                Some('>') => {
                    self.advance();
                    break;
                }
                Some(c) if c == '_' || c.is_ascii_alphanumeric() => {
                    name.push(c);
                    self.advance();
                }
                Some(_) | None => return Err(Self::syntax(open, "bad group name")),
            }
        }
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(Self::syntax(open, "bad group name"));
        }
        if self.names.iter().any(|(n, _)| *n == name) {
            return Err(Self::syntax(open, format!("duplicate group name '{name}'")));
        }
        self.group_count += 1;
        self.names.push((name.clone(), self.group_count));
        Ok(GroupKind::Capture {
            index: self.group_count,
            name: Some(name),
        })
    }

    fn parse_escape(&mut self) -> Result<Ast, PatternError> {
        let pos = self.pos;
        self.advance(); // '\\'
        let Some(c) = self.next() else {
            return Err(Self::syntax(pos, "trailing backslash"));
        };
        if let Some(perl) = perl_class(c) {
            return Ok(Ast::Perl(perl));
        }
        match c {
            'b' => Ok(Ast::Assertion(AssertionKind::WordBoundary)),
            'B' => Ok(Ast::Assertion(AssertionKind::NotWordBoundary)),
            'x' => Ok(Ast::Literal(self.parse_hex(pos)?)),
            '1'..='9' => Err(Self::syntax(
                pos,
                format!("backreferences are not supported (\\{c})"),
            )),
            c if c.is_ascii_alphanumeric() => {
                control_escape(c).map(Ast::Literal).ok_or_else(|| {
                    Self::syntax(pos, format!("bad escape \\{c}"))
                })
            }
            c => Ok(Ast::Literal(c)),
        }
    }

    /// `\xHH` with exactly two hex digits.
    fn parse_hex(&mut self, pos: usize) -> Result<char, PatternError> {
        let hi = self.next().and_then(|c| c.to_digit(16));
        let lo = self.next().and_then(|c| c.to_digit(16));
        match (hi, lo) {
            (Some(hi), Some(lo)) => Ok(char::from((hi * 16 + lo) as u8)),
            _ => Err(Self::syntax(pos, "bad hex escape")),
        }
    }

    fn parse_class(&mut self) -> Result<Ast, PatternError> {
        let open = self.pos;
        self.advance(); // '['
        let negated = self.eat('^');
        let mut items = Vec::new();
        let mut first = true;
        loop {
            match self.peek() {
                None => {
                    return Err(Self::syntax(open, "unterminated character class"));
                }
                // ']' as the very first member is a literal.
                Some(']') if !first => {
                    self.advance();
                    break;
                }
                Some(_) => {}
            }
            first = false;
            let atom_pos = self.pos;
            let atom = self.parse_class_atom(open)?;
            // A '-' between two members forms a range; a trailing or leading
            // '-' is a literal.
            if self.peek() == Some('-') && self.peek_at(1).is_some_and(|c| c != ']') {
                self.advance(); // '-'
                let hi = self.parse_class_atom(open)?;
                let (ClassAtom::Char(lo), ClassAtom::Char(hi)) = (atom, hi) else {
                    return Err(PatternError::InvalidClass {
                        pos: atom_pos,
                        msg: "shorthand class in character range".into(),
                    });
                };
                if lo > hi {
                    return Err(PatternError::InvalidClass {
                        pos: atom_pos,
                        msg: "reversed character range".into(),
                    });
                }
                items.push(ClassItem::Range(lo, hi));
            } else {
                items.push(match atom {
                    ClassAtom::Char(c) => ClassItem::Char(c),
                    ClassAtom::Perl(p) => ClassItem::Perl(p),
                });
            }
        }
        Ok(Ast::Class(ClassSet { negated, items }))
    }

    fn parse_class_atom(&mut self, open: usize) -> Result<ClassAtom, PatternError> {
        match self.peek() {
            Some('\\') => self.parse_class_escape(open),
            Some(c) => {
                self.advance();
                Ok(ClassAtom::Char(c))
            }
            None => Err(Self::syntax(open, "unterminated character class")),
        }
    }

    fn parse_class_escape(&mut self, open: usize) -> Result<ClassAtom, PatternError> {
        let pos = self.pos;
        self.advance(); // '\\'
        let Some(c) = self.next() else {
            return Err(Self::syntax(open, "unterminated character class"));
        };
        if let Some(perl) = perl_class(c) {
            return Ok(ClassAtom::Perl(perl));
        }
        match c {
            // Inside brackets '\b' is a backspace, not a word boundary.
            'b' => Ok(ClassAtom::Char('\u{0008}')),
            'x' => Ok(ClassAtom::Char(self.parse_hex(pos)?)),
            c if c.is_ascii_alphanumeric() => control_escape(c)
                .map(ClassAtom::Char)
                .ok_or_else(|| PatternError::InvalidClass {
                    pos,
                    msg: format!("bad escape \\{c} in character class"),
                }),
            c => Ok(ClassAtom::Char(c)),
        }
    }
}

fn perl_class(c: char) -> Option<PerlClass> {
    let kind = match c.to_ascii_lowercase() {
        'd' => PerlKind::Digit,
        's' => PerlKind::Space,
        'w' => PerlKind::Word,
        _ => return None,
    };
    Some(PerlClass {
        kind,
        negated: c.is_ascii_uppercase(),
    })
}

fn control_escape(c: char) -> Option<char> {
    Some(match c {
        'n' => '\n',
        'r' => '\r',
        't' => '\t',
        'f' => '\u{000C}',
        'v' => '\u{000B}',
        '0' => '\0',
        _ => return None,
    })
}
