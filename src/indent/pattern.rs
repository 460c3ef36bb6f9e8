//! Indent patterns
//!
//! An indent pattern fires for a block when every one of its rules accepts
//! the block found at the rule's paragraph offset.

use regex::{Regex, RegexBuilder};

use crate::blocks::Blocks;
use crate::error::LoadError;

/// What an accepted indent pattern does to the block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentKind {
    #[default]
    Nothing,
    Increment,
    Decrement,
    DecrementAll,
}

/// An already parsed rule definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentRuleDef {
    /// 0 = the block being indented, -N = N blocks before it
    pub paragraph_offset: isize,
    /// Empty accepts anything
    pub regexp: String,
    pub case_sensitive: bool,
}

impl IndentRuleDef {
    pub fn new(paragraph_offset: isize, regexp: &str) -> Self {
        Self {
            paragraph_offset,
            regexp: regexp.to_string(),
            case_sensitive: true,
        }
    }

    /// Builder: match regardless of case
    pub fn case_insensitive(mut self) -> Self {
        self.case_sensitive = false;
        self
    }
}

/// An already parsed indent pattern definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentPatternDef {
    pub name: String,
    pub kind: IndentKind,
    pub scale: usize,
    pub rules: Vec<IndentRuleDef>,
}

impl IndentPatternDef {
    pub fn new(name: &str, kind: IndentKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            scale: 1,
            rules: Vec::new(),
        }
    }

    /// Builder: set scale
    pub fn with_scale(mut self, scale: usize) -> Self {
        self.scale = scale;
        self
    }

    /// Builder: add a rule
    pub fn with_rule(mut self, rule: IndentRuleDef) -> Self {
        self.rules.push(rule);
        self
    }
}

/// A compiled rule
#[derive(Debug, Clone)]
pub struct IndentRule {
    paragraph_offset: isize,
    regex: Option<Regex>,
}

impl IndentRule {
    pub fn paragraph_offset(&self) -> isize {
        self.paragraph_offset
    }

    /// Check the block `paragraph_offset` away from `index`
    ///
    /// A rule without a regex accepts even when the offset falls outside
    /// the buffer; any other rule rejects such offsets.
    pub fn accepts<B: Blocks + ?Sized>(&self, blocks: &B, index: usize) -> bool {
        let Some(regex) = &self.regex else {
            return true;
        };
        blocks
            .block_at_offset(index, self.paragraph_offset)
            .is_some_and(|text| regex.is_match(text))
    }
}

/// A compiled indent pattern
#[derive(Debug, Clone)]
pub struct IndentPattern {
    id: usize,
    name: String,
    kind: IndentKind,
    scale: usize,
    rules: Vec<IndentRule>,
}

impl IndentPattern {
    /// Compile a definition, reporting problems into `diagnostics`
    ///
    /// Returns `None` when a rule regex does not compile. A zero scale is
    /// reported and treated as 1.
    pub fn compile(id: usize, def: IndentPatternDef, diagnostics: &mut Vec<LoadError>) -> Option<Self> {
        let mut rules = Vec::with_capacity(def.rules.len());
        for rule in &def.rules {
            let regex = if rule.regexp.is_empty() {
                None
            } else {
                let compiled = RegexBuilder::new(&rule.regexp)
                    .case_insensitive(!rule.case_sensitive)
                    .build();
                match compiled {
                    Ok(regex) => Some(regex),
                    Err(source) => {
                        diagnostics.push(LoadError::InvalidIndentRegex {
                            pattern: def.name,
                            source,
                        });
                        return None;
                    }
                }
            };
            rules.push(IndentRule {
                paragraph_offset: rule.paragraph_offset,
                regex,
            });
        }

        let scale = if def.scale == 0 {
            diagnostics.push(LoadError::InvalidScale {
                pattern: def.name.clone(),
            });
            1
        } else {
            def.scale
        };

        Some(Self {
            id,
            name: def.name,
            kind: def.kind,
            scale,
            rules,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> IndentKind {
        self.kind
    }

    pub fn scale(&self) -> usize {
        self.scale
    }

    pub fn rules(&self) -> &[IndentRule] {
        &self.rules
    }

    /// Check whether all rules accept the block at `index`
    pub fn accepts<B: Blocks + ?Sized>(&self, blocks: &B, index: usize) -> bool {
        self.rules.iter().all(|rule| rule.accepts(blocks, index))
    }
}
