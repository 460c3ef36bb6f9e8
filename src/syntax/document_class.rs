//! Document classes
//!
//! A document class is the read-only snapshot of styles, patterns and
//! indent patterns the engine works against. The loader that reads the
//! definitions from disk is not part of this crate: it hands already parsed
//! [`PatternDef`]s and [`IndentPatternDef`]s to a [`DocumentClassBuilder`].
//!
//! Every build gets a new generation number. Block caches remember the
//! generation they were computed against, so swapping the class in the
//! highlighter can never mix ids from two different pattern tables.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::pattern::{id_for_index, index_for_id, Pattern, PatternFlags, PatternId, MAX_PATTERNS};
use super::style::{Style, StyleTable};
use crate::error::LoadError;
use crate::indent::{IndentPattern, IndentPatternDef};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Matcher source of a pattern definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternRule {
    Keyword(String),
    Range { begin: String, end: String },
}

/// An already parsed pattern definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternDef {
    pub name: String,
    /// Parent pattern name, empty for none
    pub parent: String,
    /// Style name, empty for an unstyled pattern
    pub style: String,
    pub flags: PatternFlags,
    pub rule: PatternRule,
}

impl PatternDef {
    /// A keyword pattern from a regular expression
    pub fn keyword(name: &str, regex: &str) -> Self {
        Self::with_rule(name, PatternRule::Keyword(regex.to_string()))
    }

    /// A keyword pattern matching any of the given whole words
    pub fn keywords(name: &str, words: &[&str]) -> Self {
        let alternatives: Vec<String> = words.iter().map(|w| regex::escape(w)).collect();
        Self::keyword(name, &format!(r"\b(?:{})\b", alternatives.join("|")))
    }

    /// A range pattern from a begin/end pair
    pub fn range(name: &str, begin: &str, end: &str) -> Self {
        Self::with_rule(
            name,
            PatternRule::Range {
                begin: begin.to_string(),
                end: end.to_string(),
            },
        )
    }

    fn with_rule(name: &str, rule: PatternRule) -> Self {
        Self {
            name: name.to_string(),
            parent: String::new(),
            style: String::new(),
            flags: PatternFlags::empty(),
            rule,
        }
    }

    /// Builder: set style name
    pub fn with_style(mut self, style: &str) -> Self {
        self.style = style.to_string();
        self
    }

    /// Builder: set parent name
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = parent.to_string();
        self
    }

    /// Builder: set flags
    pub fn with_flags(mut self, flags: PatternFlags) -> Self {
        self.flags = flags;
        self
    }
}

/// Read-only snapshot of one document class
#[derive(Debug)]
pub struct DocumentClass {
    name: String,
    generation: u64,
    styles: StyleTable,
    /// Arena: the pattern in slot `i` has id `1 << i`
    patterns: Vec<Pattern>,
    top_level: Vec<PatternId>,
    indent_patterns: Vec<IndentPattern>,
}

impl DocumentClass {
    /// Start building a document class
    pub fn builder(name: &str) -> DocumentClassBuilder {
        DocumentClassBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Look a pattern up by its single-bit id
    pub fn pattern(&self, id: PatternId) -> Option<&Pattern> {
        self.patterns.get(index_for_id(id)?)
    }

    pub fn pattern_by_name(&self, name: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    /// Check that an id belongs to this class
    pub fn contains(&self, id: PatternId) -> bool {
        self.pattern(id).is_some()
    }

    /// Ids of the patterns without a parent, in declaration order
    pub fn top_level(&self) -> &[PatternId] {
        &self.top_level
    }

    pub fn indent_patterns(&self) -> &[IndentPattern] {
        &self.indent_patterns
    }
}

/// A built class together with everything that went wrong loading it
#[derive(Debug)]
pub struct LoadOutcome {
    pub class: DocumentClass,
    pub diagnostics: Vec<LoadError>,
}

/// Collects definitions and turns them into a [`DocumentClass`]
#[derive(Debug, Clone, Default)]
pub struct DocumentClassBuilder {
    name: String,
    styles: Vec<Style>,
    patterns: Vec<PatternDef>,
    indent_patterns: Vec<IndentPatternDef>,
}

impl DocumentClassBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn set_styles<I: IntoIterator<Item = Style>>(mut self, styles: I) -> Self {
        self.styles = styles.into_iter().collect();
        self
    }

    pub fn set_patterns<I: IntoIterator<Item = PatternDef>>(mut self, patterns: I) -> Self {
        self.patterns = patterns.into_iter().collect();
        self
    }

    pub fn set_indent_patterns<I: IntoIterator<Item = IndentPatternDef>>(mut self, patterns: I) -> Self {
        self.indent_patterns = patterns.into_iter().collect();
        self
    }

    /// Compile and link everything
    ///
    /// Never fails as a whole: broken definitions are dropped or degraded
    /// and reported in [`LoadOutcome::diagnostics`].
    pub fn build(self) -> LoadOutcome {
        let mut diagnostics = Vec::new();
        let styles: StyleTable = self.styles.into_iter().collect();

        let mut patterns = compile_patterns(self.patterns, &styles, &mut diagnostics);
        link_parents(&mut patterns, &mut diagnostics);
        let top_level = patterns
            .iter()
            .filter(|p| p.parent_id == 0)
            .map(|p| p.id)
            .collect();

        let indent_patterns = self
            .indent_patterns
            .into_iter()
            .enumerate()
            .filter_map(|(id, def)| IndentPattern::compile(id, def, &mut diagnostics))
            .collect();

        for diagnostic in &diagnostics {
            warn!(class = %self.name, "{}", diagnostic);
        }

        let class = DocumentClass {
            name: self.name,
            generation: NEXT_GENERATION.fetch_add(1, Ordering::Relaxed),
            styles,
            patterns,
            top_level,
            indent_patterns,
        };
        debug!(
            class = %class.name,
            generation = class.generation,
            patterns = class.patterns.len(),
            indent_patterns = class.indent_patterns.len(),
            diagnostics = diagnostics.len(),
            "built document class"
        );

        LoadOutcome { class, diagnostics }
    }
}

fn compile_patterns(
    defs: Vec<PatternDef>,
    styles: &StyleTable,
    diagnostics: &mut Vec<LoadError>,
) -> Vec<Pattern> {
    let mut patterns: Vec<Pattern> = Vec::with_capacity(defs.len().min(MAX_PATTERNS));

    for def in defs {
        if patterns.iter().any(|p| p.name == def.name) {
            diagnostics.push(LoadError::DuplicatePattern { pattern: def.name });
            continue;
        }
        let Some(id) = id_for_index(patterns.len()) else {
            diagnostics.push(LoadError::TooManyPatterns {
                pattern: def.name,
                limit: MAX_PATTERNS,
            });
            continue;
        };

        let compiled = match &def.rule {
            PatternRule::Keyword(regex) => Pattern::keyword(id, &def.name, regex, def.flags),
            PatternRule::Range { begin, end } => Pattern::range(id, &def.name, begin, end, def.flags),
        };
        let pattern = match compiled {
            Ok(pattern) => pattern,
            Err(source) => {
                diagnostics.push(LoadError::InvalidRegex {
                    pattern: def.name,
                    source,
                });
                continue;
            }
        };

        let style = if def.style.is_empty() {
            Style::default()
        } else if let Some(style) = styles.get(&def.style) {
            style.clone()
        } else {
            diagnostics.push(LoadError::UnknownStyle {
                pattern: def.name.clone(),
                style: def.style.clone(),
            });
            Style::new(&def.style)
        };

        patterns.push(pattern.with_style(style).with_parent(&def.parent));
    }

    patterns
}

fn link_parents(patterns: &mut [Pattern], diagnostics: &mut Vec<LoadError>) {
    let ids: HashMap<String, PatternId> = patterns.iter().map(|p| (p.name.clone(), p.id)).collect();

    for pattern in patterns.iter_mut() {
        if pattern.parent_name.is_empty() {
            continue;
        }
        match ids.get(&pattern.parent_name) {
            Some(&parent) => pattern.parent_id = parent,
            None => diagnostics.push(LoadError::UnresolvedParent {
                pattern: pattern.name.clone(),
                parent: pattern.parent_name.clone(),
            }),
        }
    }

    // Break loops so every parent chain ends at a top-level pattern
    for index in 0..patterns.len() {
        let own = patterns[index].id;
        let mut current = patterns[index].parent_id;
        let mut steps = 0;
        while current != 0 && current != own && steps < patterns.len() {
            current = index_for_id(current).map_or(0, |i| patterns[i].parent_id);
            steps += 1;
        }
        if current == own {
            diagnostics.push(LoadError::ParentCycle {
                pattern: patterns[index].name.clone(),
            });
            patterns[index].parent_id = 0;
        }
    }

    for index in 0..patterns.len() {
        let (id, parent) = (patterns[index].id, patterns[index].parent_id);
        if let Some(slot) = index_for_id(parent) {
            patterns[slot].children.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indent::{IndentKind, IndentRuleDef};
    use crate::syntax::style::FontFormat;

    fn styles() -> Vec<Style> {
        vec![
            Style::new("comment").with_format(FontFormat::ITALIC),
            Style::new("keyword").with_format(FontFormat::BOLD),
        ]
    }

    #[test]
    fn test_ids_single_bit_in_order() {
        let outcome = DocumentClass::builder("test")
            .set_styles(styles())
            .set_patterns([
                PatternDef::keywords("keyword", &["if", "else"]).with_style("keyword"),
                PatternDef::range("comment", r"/\*", r"\*/").with_style("comment"),
                PatternDef::keyword("number", r"\d+"),
            ])
            .build();

        assert!(outcome.diagnostics.is_empty());
        let class = outcome.class;
        let ids: Vec<PatternId> = class.patterns().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![1, 2, 4]);
        assert_eq!(class.top_level(), &[1, 2, 4]);
        assert_eq!(class.pattern(2).map(|p| p.name()), Some("comment"));
        assert_eq!(
            class.pattern_by_name("keyword").map(|p| p.style().font_format()),
            Some(FontFormat::BOLD)
        );
        assert!(!class.contains(8));
    }

    #[test]
    fn test_keywords_are_escaped_whole_words() {
        let class = DocumentClass::builder("test")
            .set_patterns([PatternDef::keywords("op", &["c++", "if"])])
            .build()
            .class;
        let pattern = class.pattern(1).unwrap();
        let outcome = pattern.match_block("iffy if", false);
        assert_eq!(outcome.locations.len(), 1);
        assert_eq!(outcome.locations[0].position, 5);
    }

    #[test]
    fn test_invalid_regex_dropped() {
        let outcome = DocumentClass::builder("test")
            .set_patterns([
                PatternDef::keyword("broken", "(unclosed"),
                PatternDef::keyword("number", r"\d+"),
            ])
            .build();

        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(matches!(outcome.diagnostics[0], LoadError::InvalidRegex { .. }));
        assert_eq!(outcome.class.patterns().len(), 1);
        assert_eq!(outcome.class.pattern(1).map(|p| p.name()), Some("number"));
    }

    #[test]
    fn test_unresolved_parent_kept_top_level() {
        let outcome = DocumentClass::builder("test")
            .set_patterns([PatternDef::keyword("todo", "TODO").with_parent("comment")])
            .build();

        assert!(matches!(
            outcome.diagnostics.as_slice(),
            [LoadError::UnresolvedParent { .. }]
        ));
        let todo = outcome.class.pattern(1).unwrap();
        assert_eq!(todo.parent_id(), 0);
        assert_eq!(todo.parent_name(), "comment");
        assert_eq!(outcome.class.top_level(), &[1]);
    }

    #[test]
    fn test_children_linked_after_load() {
        // The child is declared before its parent
        let outcome = DocumentClass::builder("test")
            .set_patterns([
                PatternDef::keyword("todo", "TODO").with_parent("comment"),
                PatternDef::range("comment", r"/\*", r"\*/"),
            ])
            .build();

        assert!(outcome.diagnostics.is_empty());
        let class = outcome.class;
        assert_eq!(class.pattern(1).unwrap().parent_id(), 2);
        assert_eq!(class.pattern(2).unwrap().children(), &[1]);
        assert_eq!(class.top_level(), &[2]);
    }

    #[test]
    fn test_parent_cycle_broken() {
        let outcome = DocumentClass::builder("test")
            .set_patterns([
                PatternDef::keyword("a", "a").with_parent("b"),
                PatternDef::keyword("b", "b").with_parent("a"),
                PatternDef::keyword("c", "c").with_parent("c"),
            ])
            .build();

        assert_eq!(outcome.diagnostics.len(), 2);
        let class = outcome.class;
        assert_eq!(class.pattern(1).unwrap().parent_id(), 0);
        assert_eq!(class.pattern(2).unwrap().parent_id(), 1);
        assert_eq!(class.pattern(4).unwrap().parent_id(), 0);
        assert_eq!(class.top_level(), &[1, 4]);
    }

    #[test]
    fn test_unknown_style_and_duplicates() {
        let outcome = DocumentClass::builder("test")
            .set_styles(styles())
            .set_patterns([
                PatternDef::keyword("number", r"\d+").with_style("numeric"),
                PatternDef::keyword("number", r"0x[0-9a-f]+"),
            ])
            .build();

        assert_eq!(outcome.diagnostics.len(), 2);
        assert!(matches!(outcome.diagnostics[0], LoadError::UnknownStyle { .. }));
        assert!(matches!(outcome.diagnostics[1], LoadError::DuplicatePattern { .. }));
        let number = outcome.class.pattern(1).unwrap();
        assert_eq!(number.style().name(), "numeric");
        assert!(number.style().is_plain());
    }

    #[test]
    fn test_pattern_limit() {
        let defs = (0..MAX_PATTERNS + 2).map(|i| PatternDef::keyword(&format!("p{i}"), "x"));
        let outcome = DocumentClass::builder("test").set_patterns(defs).build();

        assert_eq!(outcome.class.patterns().len(), MAX_PATTERNS);
        assert_eq!(outcome.diagnostics.len(), 2);
        assert!(outcome
            .diagnostics
            .iter()
            .all(|d| matches!(d, LoadError::TooManyPatterns { .. })));
    }

    #[test]
    fn test_indent_patterns_loaded() {
        let outcome = DocumentClass::builder("test")
            .set_indent_patterns([
                IndentPatternDef::new("open", IndentKind::Increment)
                    .with_rule(IndentRuleDef::new(-1, r"\{\s*$")),
                IndentPatternDef::new("broken", IndentKind::Decrement).with_rule(IndentRuleDef::new(0, "(")),
                IndentPatternDef::new("close", IndentKind::Decrement).with_rule(IndentRuleDef::new(0, r"^\s*\}")),
            ])
            .build();

        assert_eq!(outcome.diagnostics.len(), 1);
        let names: Vec<&str> = outcome.class.indent_patterns().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["open", "close"]);
        let ids: Vec<usize> = outcome.class.indent_patterns().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_generation_increases() {
        let first = DocumentClass::builder("a").build().class;
        let second = DocumentClass::builder("a").build().class;
        assert!(second.generation() > first.generation());
    }
}
