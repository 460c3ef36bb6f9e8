//! Syntax highlighting module
//!
//! Document classes hold the patterns, styles and indent patterns for one
//! file type. The highlighter matches them block by block, carrying the id
//! of a still-open range pattern from one block into the next.

mod style;
mod pattern;
mod location;
mod document_class;
mod highlighter;
pub mod builtin;

pub use style::{Color, FontFormat, Span, Style, StyleTable};
pub use pattern::{MatchOutcome, Pattern, PatternFlags, PatternId, PatternKind, MAX_PATTERNS};
pub use location::{LocationSet, PatternLocation};
pub use document_class::{DocumentClass, DocumentClassBuilder, LoadOutcome, PatternDef, PatternRule};
pub use highlighter::{evaluate_highlight, flatten_spans, BlockHighlighter, BlockState};
