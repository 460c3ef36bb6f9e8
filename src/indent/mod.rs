//! Indentation module
//!
//! Small per-language rule sets decide whether a block should be indented
//! one step further, one step back, or flush left.

mod engine;
mod pattern;

pub use engine::{IndentAction, IndentEngine};
pub use pattern::{IndentKind, IndentPattern, IndentPatternDef, IndentRule, IndentRuleDef};
