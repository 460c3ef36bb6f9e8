//! Block highlighting
//!
//! [`evaluate_highlight`] is the pure per-block step: block text plus the
//! id of the pattern left open by the previous block in, resolved locations
//! plus the id left open by this block out. [`BlockHighlighter`] wraps it
//! with a per-block cache and decides which blocks need recomputing.

use std::sync::Arc;

use tracing::{debug, trace};

use super::document_class::DocumentClass;
use super::location::{LocationSet, PatternLocation};
use super::pattern::{Pattern, PatternFlags, PatternId};
use super::style::Span;
use crate::blocks::Blocks;
use crate::config::Config;

/// Highlight one block against a document class
///
/// An incoming id that does not belong to `class` (left over from a class
/// that has since been replaced) is treated as "nothing open".
pub fn evaluate_highlight(class: &DocumentClass, text: &str, incoming_active_id: PatternId) -> LocationSet {
    let incoming = if class.contains(incoming_active_id) {
        incoming_active_id
    } else {
        0
    };
    let mut set = LocationSet::new(incoming);
    let mut active_patterns: PatternId = 0;

    // The range still open from the previous block goes first, so its
    // closing location owns its slot whatever is declared before it
    if let Some(active) = class.pattern(incoming) {
        let outcome = active.match_block(text, true);
        // Not closed here: it owns the whole block and only its children
        // can show through
        let swallowed = outcome.active
            && outcome
                .locations
                .iter()
                .all(|l| l.position == 0 && l.length == text.len());
        if outcome.active {
            active_patterns |= active.id();
        }
        for location in outcome.locations {
            if set.insert(location) {
                collect_children(class, active, &location, text, &mut set);
            }
        }
        if swallowed {
            set.resolve(0);
            set.set_outgoing_active_id(active.id());
            return set;
        }
    }

    for &id in class.top_level() {
        if id == incoming {
            continue;
        }
        let Some(pattern) = class.pattern(id) else {
            continue;
        };
        let outcome = pattern.match_block(text, false);
        if outcome.active {
            active_patterns |= id;
        }
        for location in outcome.locations {
            if set.insert(location) {
                collect_children(class, pattern, &location, text, &mut set);
            }
        }
    }

    set.resolve(active_patterns);
    set
}

/// Match the children of `pattern` inside `location`, recursively
fn collect_children(
    class: &DocumentClass,
    pattern: &Pattern,
    location: &PatternLocation,
    text: &str,
    set: &mut LocationSet,
) {
    for &child_id in pattern.children() {
        let Some(child) = class.pattern(child_id) else {
            continue;
        };
        for nested in child.match_within(text, location.position, location.end()) {
            if set.insert(nested) {
                collect_children(class, child, &nested, text, set);
            }
        }
    }
}

/// Flatten resolved locations into non-overlapping formatted runs
///
/// Where locations nest, the innermost one decides the format.
pub fn flatten_spans(locations: &LocationSet) -> Vec<Span> {
    let mut bounds: Vec<usize> = locations.iter().flat_map(|l| [l.position, l.end()]).collect();
    bounds.sort_unstable();
    bounds.dedup();

    let mut spans: Vec<Span> = Vec::new();
    for window in bounds.windows(2) {
        let (start, end) = (window[0], window[1]);
        let Some(owner) = innermost(locations, start) else {
            continue;
        };
        match spans.last_mut() {
            Some(last)
                if last.end == start && last.font_format == owner.font_format && last.color == owner.color =>
            {
                last.end = end;
            }
            _ => spans.push(Span::new(start, end, owner.font_format, owner.color)),
        }
    }
    spans
}

/// The smallest location covering `pos`, later ones winning ties
fn innermost(locations: &LocationSet, pos: usize) -> Option<&PatternLocation> {
    let mut best: Option<&PatternLocation> = None;
    for location in locations.iter().filter(|l| l.contains(pos)) {
        if best.map_or(true, |b| location.length <= b.length) {
            best = Some(location);
        }
    }
    best
}

/// Cached highlighting state of one block
#[derive(Debug, Clone)]
pub struct BlockState {
    /// The text changed since the locations were computed
    pub modified: bool,
    /// Generation of the document class the locations belong to
    pub generation: u64,
    pub locations: LocationSet,
}

impl Default for BlockState {
    fn default() -> Self {
        Self {
            modified: true,
            generation: 0,
            locations: LocationSet::default(),
        }
    }
}

impl BlockState {
    fn is_current(&self, incoming: PatternId, generation: u64) -> bool {
        !self.modified
            && self.generation == generation
            && self.locations.incoming_active_id() == incoming
    }
}

/// Incremental highlighter for one buffer
///
/// Holds the shared document class snapshot and one [`BlockState`] per
/// block. Edits go through `&mut self`, so two views of the same buffer
/// can never resolve the same block at once.
#[derive(Debug)]
pub struct BlockHighlighter {
    class: Arc<DocumentClass>,
    config: Config,
    blocks: Vec<BlockState>,
}

impl BlockHighlighter {
    pub fn new(class: Arc<DocumentClass>, config: Config) -> Self {
        Self {
            class,
            config,
            blocks: Vec::new(),
        }
    }

    pub fn document_class(&self) -> &DocumentClass {
        &self.class
    }

    /// Swap in a new document class and invalidate every block
    pub fn set_document_class(&mut self, class: Arc<DocumentClass>) {
        debug!(
            from = self.class.generation(),
            to = class.generation(),
            class = class.name(),
            "document class replaced"
        );
        self.class = class;
        self.mark_all_modified();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        if config.highlighting != self.config.highlighting {
            self.mark_all_modified();
        }
        self.config = config;
    }

    /// Toggle highlighting on/off
    pub fn toggle(&mut self) {
        self.config.highlighting = !self.config.highlighting;
        self.mark_all_modified();
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, index: usize) -> Option<&BlockState> {
        self.blocks.get(index)
    }

    /// Make room for `count` new blocks before `at`
    pub fn insert_blocks(&mut self, at: usize, count: usize) {
        let at = at.min(self.blocks.len());
        for _ in 0..count {
            self.blocks.insert(at, BlockState::default());
        }
    }

    /// Forget `count` blocks starting at `at`
    pub fn remove_blocks(&mut self, at: usize, count: usize) {
        let at = at.min(self.blocks.len());
        let end = at.saturating_add(count).min(self.blocks.len());
        self.blocks.drain(at..end);
        // The block after the removed range sees a different predecessor
        self.mark_modified(at);
    }

    pub fn mark_modified(&mut self, index: usize) {
        if let Some(state) = self.blocks.get_mut(index) {
            state.modified = true;
        }
    }

    pub fn mark_all_modified(&mut self) {
        for state in &mut self.blocks {
            state.modified = true;
        }
    }

    /// Id left open by the block before `index`, 0 if unknown or stale
    pub fn incoming_active_id(&self, index: usize) -> PatternId {
        let Some(previous) = index.checked_sub(1).and_then(|i| self.blocks.get(i)) else {
            return 0;
        };
        if previous.generation != self.class.generation() {
            return 0;
        }
        previous.locations.outgoing_active_id()
    }

    /// Check whether the cached state of `index` is out of date
    pub fn needs_highlight(&self, index: usize) -> bool {
        let incoming = self.incoming_active_id(index);
        self.blocks
            .get(index)
            .map_or(true, |state| !state.is_current(incoming, self.class.generation()))
    }

    /// Bring the block at `index` up to date
    ///
    /// Returns whether the id this block leaves open changed, in which case
    /// the following block has to be highlighted again as well.
    pub fn highlight_block(&mut self, index: usize, text: &str) -> bool {
        if index >= self.blocks.len() {
            self.blocks.resize_with(index + 1, BlockState::default);
        }
        if !self.needs_highlight(index) {
            return false;
        }

        let incoming = self.incoming_active_id(index);
        let generation = self.class.generation();
        let locations = if self.config.highlighting {
            evaluate_highlight(&self.class, text, incoming)
        } else {
            LocationSet::new(incoming)
        };

        let state = &mut self.blocks[index];
        let previous = if state.generation == generation {
            state.locations.outgoing_active_id()
        } else {
            0
        };
        let changed = locations.outgoing_active_id() != previous;
        trace!(
            block = index,
            incoming,
            outgoing = locations.outgoing_active_id(),
            locations = locations.len(),
            changed,
            "highlighted block"
        );
        *state = BlockState {
            modified: false,
            generation,
            locations,
        };
        changed
    }

    /// Re-highlight from `index` until the blocks settle
    ///
    /// Stops at the first block after `index` that is already up to date.
    /// Returns the number of blocks recomputed.
    pub fn rehighlight_from<B: Blocks + ?Sized>(&mut self, blocks: &B, index: usize) -> usize {
        self.sync_len(blocks.block_count());
        let mut recomputed = 0;
        for i in index..blocks.block_count() {
            if !self.needs_highlight(i) {
                if i > index {
                    break;
                }
                continue;
            }
            self.highlight_block(i, blocks.block_text(i).unwrap_or_default());
            recomputed += 1;
        }
        trace!(from = index, recomputed, "cascade settled");
        recomputed
    }

    /// Bring every block up to date, returning how many were recomputed
    pub fn highlight_all<B: Blocks + ?Sized>(&mut self, blocks: &B) -> usize {
        self.sync_len(blocks.block_count());
        let mut recomputed = 0;
        for i in 0..blocks.block_count() {
            if self.needs_highlight(i) {
                self.highlight_block(i, blocks.block_text(i).unwrap_or_default());
                recomputed += 1;
            }
        }
        recomputed
    }

    fn sync_len(&mut self, count: usize) {
        if self.blocks.len() != count {
            self.blocks.resize_with(count, BlockState::default);
        }
    }

    /// Resolved locations of a block, if it has been highlighted
    pub fn locations(&self, index: usize) -> Option<&LocationSet> {
        self.blocks.get(index).map(|state| &state.locations)
    }

    /// Formatted runs of a block, empty if it has not been highlighted
    pub fn spans(&self, index: usize) -> Vec<Span> {
        self.locations(index).map(flatten_spans).unwrap_or_default()
    }

    /// Check whether indentation must leave the block alone
    ///
    /// True when the innermost location covering the first non-blank
    /// character carries `NO_INDENT`. A blank block is exempt when it sits
    /// inside an open `NO_INDENT` pattern.
    pub fn is_indent_exempt(&self, index: usize, text: &str) -> bool {
        let Some(locations) = self.locations(index) else {
            return false;
        };
        let Some(first) = text.find(|c: char| c != ' ' && c != '\t') else {
            return self
                .class
                .pattern(locations.incoming_active_id())
                .is_some_and(|p| p.flags().contains(PatternFlags::NO_INDENT));
        };
        innermost(locations, first).is_some_and(|l| l.flags.contains(PatternFlags::NO_INDENT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::document_class::PatternDef;
    use crate::syntax::style::{Color, FontFormat, Style};

    fn comment_class() -> DocumentClass {
        let outcome = DocumentClass::builder("test")
            .set_styles([
                Style::new("comment").with_format(FontFormat::ITALIC),
                Style::new("keyword").with_format(FontFormat::BOLD),
                Style::new("alert").with_color(Color::rgb(255, 0, 0)),
                Style::new("string").with_color(Color::rgb(0, 128, 0)),
            ])
            .set_patterns([
                PatternDef::range("comment", r"/\*", r"\*/")
                    .with_style("comment")
                    .with_flags(PatternFlags::SPAN | PatternFlags::NO_INDENT | PatternFlags::COMMENT),
                PatternDef::range("string", "\"", "\"")
                    .with_style("string")
                    .with_flags(PatternFlags::SPAN),
                PatternDef::keywords("keyword", &["int", "return"]).with_style("keyword"),
                PatternDef::keyword("todo", "TODO").with_style("alert").with_parent("comment"),
            ])
            .build();
        assert!(outcome.diagnostics.is_empty());
        outcome.class
    }

    fn slots(set: &LocationSet) -> Vec<(PatternId, usize, usize)> {
        set.iter().map(|l| (l.pattern_id, l.position, l.end())).collect()
    }

    const COMMENT: PatternId = 1;
    const STRING: PatternId = 2;
    const KEYWORD: PatternId = 4;
    const TODO: PatternId = 8;

    #[test]
    fn test_spanning_comment_round_trip() {
        let class = comment_class();

        let first = evaluate_highlight(&class, "/* open", 0);
        assert_eq!(slots(&first), vec![(COMMENT, 0, 7)]);
        assert_ne!(first.outgoing_active_id(), 0);

        let second = evaluate_highlight(&class, "body", first.outgoing_active_id());
        assert_eq!(slots(&second), vec![(COMMENT, 0, 4)]);
        assert_eq!(second.outgoing_active_id(), COMMENT);

        let third = evaluate_highlight(&class, "close */", second.outgoing_active_id());
        assert_eq!(slots(&third), vec![(COMMENT, 0, 8)]);
        assert_eq!(third.outgoing_active_id(), 0);
    }

    #[test]
    fn test_empty_block_inside_comment_stays_open() {
        let class = comment_class();
        let set = evaluate_highlight(&class, "", COMMENT);
        assert!(set.is_empty());
        assert_eq!(set.outgoing_active_id(), COMMENT);
    }

    #[test]
    fn test_keywords_outside_comment_only() {
        let class = comment_class();
        let set = evaluate_highlight(&class, "int x; /* int */ return", 0);
        assert_eq!(
            slots(&set),
            vec![(KEYWORD, 0, 3), (COMMENT, 7, 16), (KEYWORD, 17, 23)]
        );
        assert_eq!(set.outgoing_active_id(), 0);
    }

    #[test]
    fn test_closing_mid_block_then_keywords() {
        let class = comment_class();
        let set = evaluate_highlight(&class, "end */ return", COMMENT);
        assert_eq!(slots(&set), vec![(COMMENT, 0, 6), (KEYWORD, 7, 13)]);
        assert_eq!(set.incoming_active_id(), COMMENT);
        assert_eq!(set.outgoing_active_id(), 0);
    }

    #[test]
    fn test_closing_range_beats_earlier_keyword() {
        let outcome = DocumentClass::builder("order")
            .set_patterns([
                PatternDef::keywords("keyword", &["int"]),
                PatternDef::range("comment", r"/\*", r"\*/").with_flags(PatternFlags::SPAN),
            ])
            .build();
        let class = outcome.class;
        let comment = class.pattern_by_name("comment").unwrap().id();

        let set = evaluate_highlight(&class, "int */ x", comment);
        assert_eq!(slots(&set), vec![(comment, 0, 6)]);
        assert_eq!(set.outgoing_active_id(), 0);

        let set = evaluate_highlight(&class, "int */ int /* more", comment);
        assert_eq!(slots(&set), vec![(comment, 0, 6), (1, 7, 10), (comment, 11, 18)]);
        assert_eq!(set.outgoing_active_id(), comment);
    }

    #[test]
    fn test_string_discarded_inside_comment_clears_open_string() {
        let class = comment_class();
        let set = evaluate_highlight(&class, "/* \"a\" */ \"open", 0);
        assert_eq!(slots(&set), vec![(COMMENT, 0, 9), (STRING, 10, 15)]);
        assert_eq!(set.outgoing_active_id(), 0);
    }

    #[test]
    fn test_children_only_inside_parent() {
        let class = comment_class();
        let set = evaluate_highlight(&class, "TODO /* TODO */", 0);
        assert_eq!(slots(&set), vec![(COMMENT, 5, 15), (TODO, 8, 12)]);

        let inside = evaluate_highlight(&class, "still TODO", COMMENT);
        assert_eq!(slots(&inside), vec![(COMMENT, 0, 10), (TODO, 6, 10)]);
        assert_eq!(inside.outgoing_active_id(), COMMENT);
    }

    #[test]
    fn test_string_inside_comment_does_not_stay_open() {
        let class = comment_class();
        let set = evaluate_highlight(&class, "/* say \"hi", 0);
        assert_eq!(slots(&set), vec![(COMMENT, 0, 10)]);
        assert_eq!(set.outgoing_active_id(), COMMENT);
    }

    #[test]
    fn test_earlier_pattern_wins_same_slot() {
        let outcome = DocumentClass::builder("tie")
            .set_patterns([
                PatternDef::keyword("long", "abcd"),
                PatternDef::keyword("short", "ab"),
            ])
            .build();
        let set = evaluate_highlight(&outcome.class, "abcd", 0);
        assert_eq!(slots(&set), vec![(1, 0, 4)]);
    }

    #[test]
    fn test_stale_incoming_id_ignored() {
        let class = comment_class();
        let set = evaluate_highlight(&class, "plain", 1 << 40);
        assert_eq!(set.incoming_active_id(), 0);
        assert_eq!(set.outgoing_active_id(), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn test_flatten_spans_children_override() {
        let class = comment_class();
        let set = evaluate_highlight(&class, "/* a TODO b */", 0);
        let spans = flatten_spans(&set);
        assert_eq!(
            spans,
            vec![
                Span::new(0, 5, FontFormat::ITALIC, None),
                Span::new(5, 9, FontFormat::empty(), Some(Color::rgb(255, 0, 0))),
                Span::new(9, 14, FontFormat::ITALIC, None),
            ]
        );
    }

    #[test]
    fn test_highlighter_cascade() {
        let class = Arc::new(comment_class());
        let mut highlighter = BlockHighlighter::new(class, Config::default());
        let mut lines = vec!["int a;", "int b;", "int c;", "int d;"];

        assert_eq!(highlighter.highlight_all(&lines), 4);
        assert_eq!(highlighter.highlight_all(&lines), 0);

        // Opening a comment on line 1 re-highlights everything after it
        lines[1] = "/* int b;";
        highlighter.mark_modified(1);
        assert_eq!(highlighter.rehighlight_from(&lines, 1), 3);
        assert_eq!(highlighter.locations(3).unwrap().outgoing_active_id(), COMMENT);
        assert_eq!(slots(highlighter.locations(2).unwrap()), vec![(COMMENT, 0, 6)]);

        // Closing it again settles after the last affected block
        lines[1] = "/* int b; */";
        highlighter.mark_modified(1);
        assert_eq!(highlighter.rehighlight_from(&lines, 1), 3);
        assert_eq!(slots(highlighter.locations(2).unwrap()), vec![(KEYWORD, 0, 3)]);

        // A local edit that leaves the open id unchanged stops early
        lines[2] = "int cc;";
        highlighter.mark_modified(2);
        assert_eq!(highlighter.rehighlight_from(&lines, 2), 1);
    }

    #[test]
    fn test_insert_and_remove_blocks() {
        let class = Arc::new(comment_class());
        let mut highlighter = BlockHighlighter::new(class, Config::default());
        let mut lines = vec!["/* a", "b */", "int c;"];
        highlighter.highlight_all(&lines);

        lines.insert(1, "new");
        highlighter.insert_blocks(1, 1);
        assert!(highlighter.needs_highlight(1));
        highlighter.rehighlight_from(&lines, 1);
        assert_eq!(slots(highlighter.locations(1).unwrap()), vec![(COMMENT, 0, 3)]);
        assert_eq!(highlighter.locations(3).unwrap().outgoing_active_id(), 0);

        lines.remove(0);
        highlighter.remove_blocks(0, 1);
        highlighter.rehighlight_from(&lines, 0);
        assert!(highlighter.locations(0).unwrap().is_empty());
        assert_eq!(slots(highlighter.locations(2).unwrap()), vec![(KEYWORD, 0, 3)]);
    }

    #[test]
    fn test_reload_never_returns_stale_ids() {
        let old = Arc::new(comment_class());
        let mut highlighter = BlockHighlighter::new(old, Config::default());
        let lines = vec!["/* open", "still", "more"];
        highlighter.highlight_all(&lines);
        assert_eq!(highlighter.locations(0).unwrap().outgoing_active_id(), COMMENT);

        let replacement = DocumentClass::builder("plain")
            .set_patterns([PatternDef::keyword("word", r"\w+")])
            .build()
            .class;
        highlighter.set_document_class(Arc::new(replacement));

        // Not yet recomputed: the old outgoing id is not handed on
        assert!(highlighter.needs_highlight(1));
        assert_eq!(highlighter.incoming_active_id(1), 0);

        highlighter.highlight_block(1, lines[1]);
        let state = highlighter.block(1).unwrap();
        assert_eq!(state.locations.incoming_active_id(), 0);
        assert!(highlighter.document_class().contains(1));

        highlighter.highlight_all(&lines);
        for i in 0..lines.len() {
            let set = highlighter.locations(i).unwrap();
            let outgoing = set.outgoing_active_id();
            assert!(outgoing == 0 || highlighter.document_class().contains(outgoing));
            assert!(set.iter().all(|l| l.pattern_id == 1));
        }
    }

    #[test]
    fn test_disabled_highlighting() {
        let class = Arc::new(comment_class());
        let mut highlighter = BlockHighlighter::new(class, Config::default());
        let lines = vec!["int a; /* b"];
        highlighter.highlight_all(&lines);
        assert!(!highlighter.spans(0).is_empty());

        highlighter.toggle();
        assert!(highlighter.needs_highlight(0));
        highlighter.highlight_all(&lines);
        assert!(highlighter.spans(0).is_empty());
        assert_eq!(highlighter.locations(0).unwrap().outgoing_active_id(), 0);
    }

    #[test]
    fn test_indent_exemption() {
        let class = Arc::new(comment_class());
        let mut highlighter = BlockHighlighter::new(class, Config::default());
        let lines = vec!["/* doc", "   body", "", "*/ int x;", "int y; /* trailing */"];
        highlighter.highlight_all(&lines);

        assert!(highlighter.is_indent_exempt(0, lines[0]));
        assert!(highlighter.is_indent_exempt(1, lines[1]));
        assert!(highlighter.is_indent_exempt(2, lines[2]));
        assert!(highlighter.is_indent_exempt(3, lines[3]));
        assert!(!highlighter.is_indent_exempt(4, lines[4]));
        assert!(!highlighter.is_indent_exempt(9, "x"));
    }
}
