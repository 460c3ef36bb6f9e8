//! Lexical patterns
//!
//! A pattern is either a keyword (one regex, independent matches) or a
//! range (a begin/end regex pair that may stay open across blocks when it
//! carries the `SPAN` flag). Each pattern owns a single-bit id so that the
//! set of patterns still open at the end of a block fits in one integer.

use bitflags::bitflags;
use regex::{Match, Regex, RegexBuilder};

use super::location::PatternLocation;
use super::style::Style;

/// Single-bit pattern id, 0 means "no pattern"
pub type PatternId = u64;

/// Number of distinct single-bit ids
pub const MAX_PATTERNS: usize = PatternId::BITS as usize;

/// Id of the pattern stored at arena slot `index`
pub fn id_for_index(index: usize) -> Option<PatternId> {
    (index < MAX_PATTERNS).then(|| 1 << index)
}

/// Arena slot of a single-bit id
pub fn index_for_id(id: PatternId) -> Option<usize> {
    (id.count_ones() == 1).then(|| id.trailing_zeros() as usize)
}

bitflags! {
    /// Behavioural flags of a pattern
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PatternFlags: u8 {
        /// A range may continue into the following blocks
        const SPAN = 0b0000_0001;
        /// Blocks starting inside this pattern are never re-indented
        const NO_INDENT = 0b0000_0010;
        const CASE_INSENSITIVE = 0b0000_0100;
        const COMMENT = 0b0000_1000;
    }
}

/// The matcher part of a pattern
#[derive(Debug, Clone)]
pub enum PatternKind {
    Keyword { regex: Regex },
    Range { begin: Regex, end: Regex },
}

/// Locations found in one block plus whether the pattern is still open
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub locations: Vec<PatternLocation>,
    pub active: bool,
}

impl MatchOutcome {
    fn closed(locations: Vec<PatternLocation>) -> Self {
        Self {
            locations,
            active: false,
        }
    }

    fn open(locations: Vec<PatternLocation>) -> Self {
        Self {
            locations,
            active: true,
        }
    }
}

/// A named lexical rule
#[derive(Debug, Clone)]
pub struct Pattern {
    pub(crate) id: PatternId,
    pub(crate) name: String,
    pub(crate) parent_name: String,
    pub(crate) parent_id: PatternId,
    pub(crate) style: Style,
    pub(crate) flags: PatternFlags,
    pub(crate) children: Vec<PatternId>,
    pub(crate) kind: PatternKind,
}

impl Pattern {
    /// Create a keyword pattern
    pub fn keyword(
        id: PatternId,
        name: &str,
        regex: &str,
        flags: PatternFlags,
    ) -> Result<Self, regex::Error> {
        let regex = compile(regex, flags)?;
        Ok(Self::with_kind(id, name, flags, PatternKind::Keyword { regex }))
    }

    /// Create a range pattern
    pub fn range(
        id: PatternId,
        name: &str,
        begin: &str,
        end: &str,
        flags: PatternFlags,
    ) -> Result<Self, regex::Error> {
        let begin = compile(begin, flags)?;
        let end = compile(end, flags)?;
        Ok(Self::with_kind(id, name, flags, PatternKind::Range { begin, end }))
    }

    fn with_kind(id: PatternId, name: &str, flags: PatternFlags, kind: PatternKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            parent_name: String::new(),
            parent_id: 0,
            style: Style::default(),
            flags,
            children: Vec::new(),
            kind,
        }
    }

    /// Builder: set style
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Builder: declare the parent by name, resolved when the class is built
    pub fn with_parent(mut self, parent_name: &str) -> Self {
        self.parent_name = parent_name.to_string();
        self
    }

    pub fn id(&self) -> PatternId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent_name(&self) -> &str {
        &self.parent_name
    }

    pub fn parent_id(&self) -> PatternId {
        self.parent_id
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    pub fn children(&self) -> &[PatternId] {
        &self.children
    }

    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    pub fn is_range(&self) -> bool {
        matches!(self.kind, PatternKind::Range { .. })
    }

    /// Match this pattern against one block of text
    ///
    /// `active_in` says the pattern was left open by the previous block.
    /// Only spanning ranges honour it, keywords always come back closed.
    pub fn match_block(&self, text: &str, active_in: bool) -> MatchOutcome {
        self.match_window(text, 0, text.len(), active_in)
    }

    /// Match inside `text[start..end]`, reporting block-relative positions
    ///
    /// Anchors and word boundaries still see the text around the window.
    pub fn match_within(&self, text: &str, start: usize, end: usize) -> Vec<PatternLocation> {
        if start > end || !text.is_char_boundary(start) || !text.is_char_boundary(end) {
            return Vec::new();
        }
        self.match_window(text, start, end, false).locations
    }

    fn match_window(&self, text: &str, from: usize, to: usize, active_in: bool) -> MatchOutcome {
        match &self.kind {
            PatternKind::Keyword { regex } => MatchOutcome::closed(self.match_keyword(regex, text, from, to)),
            PatternKind::Range { begin, end } => self.match_range(begin, end, text, from, to, active_in),
        }
    }

    fn match_keyword(&self, regex: &Regex, text: &str, from: usize, to: usize) -> Vec<PatternLocation> {
        let mut locations = Vec::new();
        let mut pos = from;

        while pos <= to {
            let Some(m) = find_in(regex, text, pos, to) else {
                break;
            };
            if m.is_empty() {
                pos = step_past(text, m.end());
                continue;
            }
            self.push_location(&mut locations, m.start(), m.end());
            pos = m.end();
        }

        locations
    }

    fn match_range(
        &self,
        begin: &Regex,
        end: &Regex,
        text: &str,
        from: usize,
        to: usize,
        active_in: bool,
    ) -> MatchOutcome {
        let spans = self.flags.contains(PatternFlags::SPAN);
        let mut locations = Vec::new();
        let mut offset = from;

        // Still open from the previous block
        if active_in && spans {
            match find_in(end, text, from, to) {
                Some(close) => {
                    self.push_location(&mut locations, from, close.end());
                    offset = close.end();
                }
                None => {
                    self.push_location(&mut locations, from, to);
                    return MatchOutcome::open(locations);
                }
            }
        }

        while offset <= to {
            let Some(open) = find_in(begin, text, offset, to) else {
                break;
            };

            let mut close = find_in(end, text, open.start(), to);
            if let Some(found) = close {
                // Begin and end matched the same text: look again past it
                if found.start() == open.start() && found.len() == open.len() {
                    let retry = if open.is_empty() {
                        step_past(text, open.end())
                    } else {
                        open.end()
                    };
                    close = find_in(end, text, retry, to);
                }
            }

            match close {
                Some(close) => {
                    self.push_location(&mut locations, open.start(), close.end());
                    offset = if close.end() > open.start() {
                        close.end()
                    } else {
                        step_past(text, open.start())
                    };
                }
                None if spans => {
                    self.push_location(&mut locations, open.start(), to);
                    return MatchOutcome::open(locations);
                }
                // Unterminated and not allowed to span: the begin is dropped
                None => break,
            }
        }

        MatchOutcome::closed(locations)
    }

    fn push_location(&self, locations: &mut Vec<PatternLocation>, start: usize, end: usize) {
        if end > start {
            locations.push(PatternLocation::new(self, start, end - start));
        }
    }
}

fn compile(source: &str, flags: PatternFlags) -> Result<Regex, regex::Error> {
    RegexBuilder::new(source)
        .case_insensitive(flags.contains(PatternFlags::CASE_INSENSITIVE))
        .build()
}

/// Leftmost match starting at or after `pos` that ends by `to`
///
/// The search runs over the whole text so anchors and word boundaries are
/// judged against what really surrounds the window.
fn find_in<'t>(regex: &Regex, text: &'t str, mut pos: usize, to: usize) -> Option<Match<'t>> {
    while pos <= to {
        let m = regex.find_at(text, pos)?;
        if m.start() > to {
            return None;
        }
        if m.end() <= to {
            return Some(m);
        }
        pos = step_past(text, m.start());
    }
    None
}

/// Position just past the character at `pos`, or past the end of text
fn step_past(text: &str, pos: usize) -> usize {
    match text.get(pos..).and_then(|rest| rest.chars().next()) {
        Some(ch) => pos + ch.len_utf8(),
        None => text.len() + 1,
    }
}
