//! Lowers a parsed pattern into a flat instruction program for the
//! backtracking engine.
//!
//! Codegen emits `Split`/`Jump` placeholders and patches their targets once
//! the surrounding construct is laid out. Counted repeats are expanded into
//! required copies plus optional copies; unbounded repeats become a loop.
//! A loop whose body can match the empty string gets a progress slot so the
//! engine can stop it after one zero-width iteration.

use std::sync::Arc;

use itertools::Itertools;

use crate::{
    regex::captures::GroupInfo,
    syntax::{
        ast::{AssertionKind, Ast, ClassItem, ClassSet, GroupKind, PerlClass, PerlKind},
        parse::Parsed,
        Flags,
    },
};

/// A single VM instruction. Targets and slots are indices into
/// [`Program::insts`] and the engine's slot table respectively.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Inst {
    /// Consume one codepoint equal to the given one (pre-folded when
    /// `IGNORECASE` is set).
    Char(char),
    /// Consume one codepoint contained in `classes[idx]`.
    Class(u32),
    /// Consume any codepoint.
    Any,
    /// Consume any codepoint except `\n`.
    AnyNoNl,
    /// Zero-width position test.
    Look(Look),
    /// Record the current position in a capture slot.
    Save(u32),
    /// Record the current position in a loop progress slot.
    MarkLoop(u32),
    /// If no input was consumed since the matching `MarkLoop`, keep this
    /// iteration but leave the loop by jumping to `exit`.
    CheckLoop { slot: u32, exit: u32 },
    /// Try `prefer` first; on failure resume at `other`.
    Split { prefer: u32, other: u32 },
    Jump(u32),
    Match,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Look {
    /// Start of the search window.
    Start,
    /// End of the window, or just before a final `\n`.
    End,
    /// Window start or right after a `\n`.
    LineStart,
    /// Window end or right before a `\n`.
    LineEnd,
    WordBoundary,
    NotWordBoundary,
}

/// A resolved character class: sorted, coalesced ranges plus any shorthand
/// classes, complemented as a whole when `negated` is set.
#[derive(Clone, Debug)]
pub(crate) struct Class {
    pub negated: bool,
    pub ranges: Vec<(char, char)>,
    pub perls: Vec<PerlClass>,
}

impl Class {
    pub(crate) fn matches(&self, ch: char, flags: Flags) -> bool {
        let unicode = flags.contains(Flags::UNICODE);
        let mut found = self.contains(ch, unicode);
        if !found && flags.contains(Flags::IGNORECASE) {
            for alt in [fold_case(ch, unicode), upper_case(ch, unicode)] {
                if alt != ch && self.contains(alt, unicode) {
                    found = true;
                    break;
                }
            }
        }
        found != self.negated
    }

    fn contains(&self, ch: char, unicode: bool) -> bool {
        self.ranges.iter().any(|&(lo, hi)| lo <= ch && ch <= hi)
            || self.perls.iter().any(|p| perl_matches(ch, *p, unicode))
    }
}

/// A compiled pattern: the instruction list plus everything the engine and
/// `Captures` need at match time. Immutable and shared behind `Arc` by
/// [`Regex`](crate::Regex).
#[derive(Clone, Debug)]
pub(crate) struct Program {
    pub insts: Vec<Inst>,
    pub classes: Vec<Class>,
    /// Capture slot count: `2 * (groups + 1)`.
    pub slots: usize,
    /// Loop progress slot count; those live right after the capture slots.
    pub loops: usize,
    pub flags: Flags,
    /// Required first byte for unanchored searches, when the pattern starts
    /// with a case-sensitive ASCII literal.
    pub prefix_byte: Option<u8>,
    /// The pattern starts with `^` outside `MULTILINE`, so only the window
    /// start can match.
    pub anchored_start: bool,
    pub info: Arc<GroupInfo>,
}

pub(crate) fn compile(parsed: &Parsed, flags: Flags) -> Program {
    let mut compiler = Compiler {
        insts: Vec::new(),
        classes: Vec::new(),
        slot_base: 2 * (parsed.group_count as usize + 1),
        loops: 0,
        flags,
    };
    compiler.emit(&parsed.ast);
    compiler.insts.push(Inst::Match);

    let anchored_start = matches!(compiler.insts.first(), Some(Inst::Look(Look::Start)));
    let prefix_byte = match compiler.insts.first() {
        Some(Inst::Char(ch)) if ch.is_ascii() && !flags.contains(Flags::IGNORECASE) => {
            Some(*ch as u8)
        }
        _ => None,
    };
    Program {
        insts: compiler.insts,
        classes: compiler.classes,
        slots: compiler.slot_base,
        loops: compiler.loops,
        flags,
        prefix_byte,
        anchored_start,
        info: Arc::new(GroupInfo::new(
            parsed.group_count as usize,
            parsed.names.iter().map(|(n, i)| (n.clone(), *i as usize)),
        )),
    }
}

struct Compiler {
    insts: Vec<Inst>,
    classes: Vec<Class>,
    slot_base: usize,
    loops: usize,
    flags: Flags,
}

impl Compiler {
    fn here(&self) -> u32 {
        self.insts.len() as u32
    }

    fn placeholder(&mut self) -> usize {
        self.insts.push(Inst::Jump(u32::MAX));
        self.insts.len() - 1
    }

    fn emit(&mut self, ast: &Ast) {
        match ast {
            Ast::Empty => {}
            Ast::Literal(ch) => {
                let ch = if self.flags.contains(Flags::IGNORECASE) {
                    fold_case(*ch, self.flags.contains(Flags::UNICODE))
                } else {
                    *ch
                };
                self.insts.push(Inst::Char(ch));
            }
            Ast::Dot => {
                self.insts.push(if self.flags.contains(Flags::DOTALL) {
                    Inst::Any
                } else {
                    Inst::AnyNoNl
                });
            }
            Ast::Class(set) => {
                let idx = self.resolve_class(set);
                self.insts.push(Inst::Class(idx));
            }
            Ast::Perl(perl) => {
                let idx = self.push_class(Class {
                    negated: false,
                    ranges: Vec::new(),
                    perls: vec![*perl],
                });
                self.insts.push(Inst::Class(idx));
            }
            Ast::Assertion(kind) => {
                let multiline = self.flags.contains(Flags::MULTILINE);
                let look = match kind {
                    AssertionKind::Start if multiline => Look::LineStart,
                    AssertionKind::Start => Look::Start,
                    AssertionKind::End if multiline => Look::LineEnd,
                    AssertionKind::End => Look::End,
                    AssertionKind::WordBoundary => Look::WordBoundary,
                    AssertionKind::NotWordBoundary => Look::NotWordBoundary,
                };
                self.insts.push(Inst::Look(look));
            }
            Ast::Group { ast, kind } => match kind {
                GroupKind::Capture { index, .. } => {
                    self.insts.push(Inst::Save(2 * index));
                    self.emit(ast);
                    self.insts.push(Inst::Save(2 * index + 1));
                }
                GroupKind::NonCapturing => self.emit(ast),
            },
            Ast::Concat(items) => {
                for item in items {
                    self.emit(item);
                }
            }
            Ast::Alternate(branches) => self.emit_alternate(branches),
            Ast::Repeat {
                ast,
                min,
                max,
                greedy,
            } => self.emit_repeat(ast, *min, *max, *greedy),
        }
    }

    fn emit_alternate(&mut self, branches: &[Ast]) {
        let mut jumps = Vec::new();
        for (i, branch) in branches.iter().enumerate() {
            if i + 1 == branches.len() {
                self.emit(branch);
            } else {
                let split = self.placeholder();
                self.emit(branch);
                jumps.push(self.placeholder());
                let next = self.here();
                self.insts[split] = Inst::Split {
                    prefer: split as u32 + 1,
                    other: next,
                };
            }
        }
        let end = self.here();
        for jump in jumps {
            self.insts[jump] = Inst::Jump(end);
        }
    }

    fn emit_repeat(&mut self, body: &Ast, min: u32, max: Option<u32>, greedy: bool) {
        for _ in 0..min {
            self.emit(body);
        }
        match max {
            None => self.emit_loop(body, greedy),
            Some(max) => {
                for _ in min..max {
                    self.emit_optional(body, greedy);
                }
            }
        }
    }

    fn emit_optional(&mut self, body: &Ast, greedy: bool) {
        let split = self.placeholder();
        self.emit(body);
        let after = self.here();
        let enter = split as u32 + 1;
        self.insts[split] = if greedy {
            Inst::Split {
                prefer: enter,
                other: after,
            }
        } else {
            Inst::Split {
                prefer: after,
                other: enter,
            }
        };
    }

    fn emit_loop(&mut self, body: &Ast, greedy: bool) {
        let guard = can_match_empty(body).then(|| {
            let slot = self.slot_base + self.loops;
            self.loops += 1;
            slot as u32
        });
        let split = self.placeholder();
        if let Some(slot) = guard {
            self.insts.push(Inst::MarkLoop(slot));
        }
        self.emit(body);
        let check = guard.map(|slot| {
            self.insts.push(Inst::CheckLoop {
                slot,
                exit: u32::MAX,
            });
            self.insts.len() - 1
        });
        self.insts.push(Inst::Jump(split as u32));
        let after = self.here();
        if let Some(check) = check {
            if let Inst::CheckLoop { slot, .. } = self.insts[check] {
                self.insts[check] = Inst::CheckLoop { slot, exit: after };
            }
        }
        let enter = split as u32 + 1;
        self.insts[split] = if greedy {
            Inst::Split {
                prefer: enter,
                other: after,
            }
        } else {
            Inst::Split {
                prefer: after,
                other: enter,
            }
        };
    }

    fn push_class(&mut self, class: Class) -> u32 {
        self.classes.push(class);
        (self.classes.len() - 1) as u32
    }

    fn resolve_class(&mut self, set: &ClassSet) -> u32 {
        let mut ranges = Vec::new();
        let mut perls = Vec::new();
        for item in &set.items {
            match item {
                ClassItem::Char(c) => ranges.push((*c, *c)),
                ClassItem::Range(lo, hi) => ranges.push((*lo, *hi)),
                ClassItem::Perl(p) => perls.push(*p),
            }
        }
        let ranges = ranges
            .into_iter()
            .sorted()
            .coalesce(|a, b| {
                if b.0 as u32 <= (a.1 as u32).saturating_add(1) {
                    Ok((a.0, a.1.max(b.1)))
                } else {
                    Err((a, b))
                }
            })
            .collect();
        self.push_class(Class {
            negated: set.negated,
            ranges,
            perls,
        })
    }
}

fn can_match_empty(ast: &Ast) -> bool {
    match ast {
        Ast::Empty | Ast::Assertion(_) => true,
        Ast::Literal(_) | Ast::Dot | Ast::Class(_) | Ast::Perl(_) => false,
        Ast::Repeat { ast, min, .. } => *min == 0 || can_match_empty(ast),
        Ast::Group { ast, .. } => can_match_empty(ast),
        Ast::Concat(items) => items.iter().all(can_match_empty),
        Ast::Alternate(items) => items.iter().any(can_match_empty),
    }
}

/// Simple one-to-one case folding: the single-codepoint lowercase form, or
/// the codepoint itself when lowercasing expands.
pub(crate) fn fold_case(ch: char, unicode: bool) -> char {
    if unicode {
        let mut lower = ch.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) => l,
            _ => ch,
        }
    } else if ch.is_ascii() {
        ch.to_ascii_lowercase()
    } else {
        ch
    }
}

fn upper_case(ch: char, unicode: bool) -> char {
    if unicode {
        let mut upper = ch.to_uppercase();
        match (upper.next(), upper.next()) {
            (Some(u), None) => u,
            _ => ch,
        }
    } else if ch.is_ascii() {
        ch.to_ascii_uppercase()
    } else {
        ch
    }
}

pub(crate) fn is_word_char(ch: char, unicode: bool) -> bool {
    if unicode {
        ch == '_' || ch.is_alphanumeric()
    } else {
        ch == '_' || ch.is_ascii_alphanumeric()
    }
}

fn perl_matches(ch: char, perl: PerlClass, unicode: bool) -> bool {
    let base = match perl.kind {
        PerlKind::Digit => ch.is_ascii_digit() || (unicode && ch.is_numeric()),
        PerlKind::Space => {
            if unicode {
                ch.is_whitespace()
            } else {
                ch.is_ascii_whitespace()
            }
        }
        PerlKind::Word => is_word_char(ch, unicode),
    };
    base != perl.negated
}
