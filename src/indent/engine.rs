//! Applying indent patterns to a block
//!
//! Leading whitespace is counted in indentation units: a tab, or a run of
//! up to `tab_width` spaces. A short run of spaces directly followed by a
//! tab counts as one unit together with that tab.

use std::cmp::Ordering;

use tracing::trace;

use super::pattern::IndentKind;
use crate::blocks::Blocks;
use crate::config::Config;
use crate::syntax::DocumentClass;

/// Net change to a block's leading indentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentAction {
    #[default]
    None,
    /// Insert this many units at the start of the block
    Insert(usize),
    /// Remove up to this many leading units
    Remove(usize),
    /// Remove every leading unit
    RemoveAll,
}

impl IndentAction {
    /// The action that takes a block from `current` units to `target`
    fn between(current: usize, target: usize) -> Self {
        match target.cmp(&current) {
            Ordering::Greater => IndentAction::Insert(target - current),
            Ordering::Less if target == 0 => IndentAction::RemoveAll,
            Ordering::Less => IndentAction::Remove(current - target),
            Ordering::Equal => IndentAction::None,
        }
    }
}

/// Rule-driven indentation
#[derive(Debug, Clone, Default)]
pub struct IndentEngine {
    config: Config,
}

impl IndentEngine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Decide how the block at `index` should be re-indented
    ///
    /// Every accepted indent pattern applies in declaration order, starting
    /// from the block's current unit count; the result is the net change.
    /// `exempt` comes from the highlighter and keeps blocks that start
    /// inside a `NO_INDENT` pattern (comment bodies and the like) untouched.
    pub fn evaluate_indent<B: Blocks + ?Sized>(
        &self,
        class: &DocumentClass,
        blocks: &B,
        index: usize,
        exempt: bool,
    ) -> IndentAction {
        if !self.config.auto_indent || exempt {
            return IndentAction::None;
        }
        let Some(text) = blocks.block_text(index) else {
            return IndentAction::None;
        };

        let current = self.indent_units(text);
        let mut units = current;
        for pattern in class.indent_patterns() {
            if !pattern.accepts(blocks, index) {
                continue;
            }
            trace!(block = index, pattern = pattern.name(), "indent pattern accepted");
            units = match pattern.kind() {
                IndentKind::Nothing => units,
                IndentKind::Increment => units + pattern.scale(),
                IndentKind::Decrement => units.saturating_sub(pattern.scale()),
                IndentKind::DecrementAll => 0,
            };
        }

        IndentAction::between(current, units)
    }

    /// Rewrite the leading whitespace of `text` according to `action`
    pub fn apply_indent(&self, text: &str, action: IndentAction) -> String {
        match action {
            IndentAction::None => text.to_string(),
            IndentAction::Insert(count) => {
                let mut indented = self.config.indent_unit().repeat(count);
                indented.push_str(text);
                indented
            }
            IndentAction::Remove(count) => {
                let mut rest = text;
                for _ in 0..count {
                    match self.strip_unit(rest) {
                        Some(stripped) => rest = stripped,
                        None => break,
                    }
                }
                rest.to_string()
            }
            IndentAction::RemoveAll => text.trim_start_matches([' ', '\t']).to_string(),
        }
    }

    /// Re-indent the block at `index`, returning its new text if it changed
    pub fn indent_block<B: Blocks + ?Sized>(
        &self,
        class: &DocumentClass,
        blocks: &B,
        index: usize,
        exempt: bool,
    ) -> Option<String> {
        let action = self.evaluate_indent(class, blocks, index, exempt);
        if action == IndentAction::None {
            return None;
        }
        let text = blocks.block_text(index)?;
        Some(self.apply_indent(text, action))
    }

    /// Count the leading indentation units of `text`
    pub fn indent_units(&self, text: &str) -> usize {
        let mut units = 0;
        let mut rest = text;
        while let Some(stripped) = self.strip_unit(rest) {
            rest = stripped;
            units += 1;
        }
        units
    }

    fn strip_unit<'a>(&self, text: &'a str) -> Option<&'a str> {
        if let Some(rest) = text.strip_prefix('\t') {
            return Some(rest);
        }
        let width = self.config.indent_width();
        let spaces = text.bytes().take_while(|&b| b == b' ').take(width).count();
        if spaces == 0 {
            return None;
        }
        let rest = &text[spaces..];
        if spaces < width {
            return Some(rest.strip_prefix('\t').unwrap_or(rest));
        }
        Some(rest)
    }
}
