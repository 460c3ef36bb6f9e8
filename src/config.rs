//! Engine configuration
//!
//! The host reads its settings file and hands the text over; nothing here
//! touches the filesystem.
//!
//! Format: TOML, every key optional
//!
//! Example:
//! ```text
//! # highlighting and indentation
//! highlighting = true
//! auto-indent = true
//! tab-width = 4
//! tab-emulation = true
//! ```

use serde::Deserialize;

use crate::error::Result;

/// Configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Whether blocks get highlighted at all
    pub highlighting: bool,
    /// Whether indent patterns are applied
    pub auto_indent: bool,
    /// Columns per indentation unit
    pub tab_width: usize,
    /// Indent with runs of spaces instead of tab characters
    pub tab_emulation: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            highlighting: true,
            auto_indent: true,
            tab_width: 8,
            tab_emulation: false,
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.tab_width = config.indent_width();
        Ok(config)
    }

    /// Spaces per indentation unit, between 1 and 16
    pub fn indent_width(&self) -> usize {
        self.tab_width.clamp(1, 16)
    }

    /// The text of one indentation unit, never empty
    pub fn indent_unit(&self) -> String {
        if self.tab_emulation {
            " ".repeat(self.indent_width())
        } else {
            "\t".to_string()
        }
    }
}
