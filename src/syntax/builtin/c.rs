//! C/C++ document class

use crate::indent::{IndentKind, IndentPatternDef, IndentRuleDef};
use crate::syntax::document_class::{DocumentClass, LoadOutcome, PatternDef};
use crate::syntax::pattern::PatternFlags;
use crate::syntax::style::{Color, FontFormat, Style};

/// Create the C document class (also works for C++)
pub fn c_class() -> LoadOutcome {
    let comment = PatternFlags::COMMENT | PatternFlags::NO_INDENT;

    DocumentClass::builder("C")
        .set_styles([
            Style::new("comment")
                .with_format(FontFormat::ITALIC)
                .with_color(Color::rgb(0x80, 0x80, 0x80)),
            Style::new("alert")
                .with_format(FontFormat::BOLD)
                .with_color(Color::rgb(0xd0, 0x20, 0x20)),
            Style::new("string").with_color(Color::rgb(0x20, 0x80, 0x20)),
            Style::new("keyword")
                .with_format(FontFormat::BOLD)
                .with_color(Color::rgb(0x80, 0x20, 0x80)),
            Style::new("type").with_color(Color::rgb(0xa0, 0x80, 0x00)),
            Style::new("number").with_color(Color::rgb(0x00, 0x80, 0x80)),
            Style::new("preprocessor").with_color(Color::rgb(0xc0, 0x40, 0xc0)),
        ])
        .set_patterns([
            PatternDef::range("block_comment", r"/\*", r"\*/")
                .with_style("comment")
                .with_flags(comment | PatternFlags::SPAN),
            PatternDef::keyword("line_comment", r"//.*$")
                .with_style("comment")
                .with_flags(comment),
            PatternDef::keywords("block_alert", &["TODO", "FIXME", "XXX"])
                .with_style("alert")
                .with_parent("block_comment"),
            PatternDef::keywords("line_alert", &["TODO", "FIXME", "XXX"])
                .with_style("alert")
                .with_parent("line_comment"),
            PatternDef::keyword("string", r#""(?:[^"\\]|\\.)*""#).with_style("string"),
            PatternDef::keyword("char", r"'(?:[^'\\]|\\.)'").with_style("string"),
            PatternDef::keyword("preprocessor", r"^\s*#\s*\w+").with_style("preprocessor"),
            PatternDef::keywords(
                "keyword",
                &[
                    "auto", "break", "case", "const", "continue", "default", "do", "else", "enum", "extern",
                    "for", "goto", "if", "inline", "register", "restrict", "return", "sizeof", "static",
                    "struct", "switch", "typedef", "union", "volatile", "while", "class", "namespace",
                    "template", "typename", "public", "private", "protected", "virtual", "new", "delete",
                ],
            )
            .with_style("keyword"),
            PatternDef::keywords(
                "type",
                &[
                    "char", "double", "float", "int", "long", "short", "signed", "unsigned", "void",
                    "bool", "size_t", "int8_t", "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t",
                    "uint32_t", "uint64_t",
                ],
            )
            .with_style("type"),
            PatternDef::keyword(
                "number",
                r"\b(?:0[xX][0-9a-fA-F]+|\d+(?:\.\d*)?(?:[eE][+-]?\d+)?)[uUlLfF]*\b",
            )
            .with_style("number"),
        ])
        .set_indent_patterns([
            IndentPatternDef::new("open_brace", IndentKind::Increment)
                .with_rule(IndentRuleDef::new(-1, r"\{\s*$")),
            IndentPatternDef::new("close_brace", IndentKind::Decrement)
                .with_rule(IndentRuleDef::new(0, r"^\s*\}")),
            IndentPatternDef::new("preprocessor", IndentKind::DecrementAll)
                .with_rule(IndentRuleDef::new(0, r"^\s*#")),
        ])
        .build()
}
