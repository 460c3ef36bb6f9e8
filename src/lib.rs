//! Document-class driven incremental highlighting and indentation
//!
//! The editor hands over one block (line) of text at a time together with
//! the id of the range pattern the previous block left open, and gets back
//! resolved, styled locations plus the id to carry into the next block.
//! Indentation is decided separately from small per-language rule sets.
//!
//! ```text
//! let class = Arc::new(builtin::c_class().class);
//! let mut highlighter = BlockHighlighter::new(class.clone(), Config::default());
//! highlighter.highlight_all(&lines);
//! let spans = highlighter.spans(0);
//!
//! let engine = IndentEngine::new(Config::default());
//! let exempt = highlighter.is_indent_exempt(1, &lines[1]);
//! let new_text = engine.indent_block(&class, &lines, 1, exempt);
//! ```

pub mod blocks;
pub mod config;
pub mod error;
pub mod indent;
pub mod syntax;

pub use blocks::Blocks;
pub use config::Config;
pub use error::{ConfigError, LoadError};
pub use indent::{IndentAction, IndentEngine, IndentKind, IndentPattern, IndentPatternDef, IndentRuleDef};
pub use syntax::{
    builtin, evaluate_highlight, BlockHighlighter, DocumentClass, LoadOutcome, LocationSet, PatternDef,
    PatternFlags, PatternId, PatternLocation, Span, Style,
};
