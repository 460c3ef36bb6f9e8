//! Python document class

use crate::indent::{IndentKind, IndentPatternDef, IndentRuleDef};
use crate::syntax::document_class::{DocumentClass, LoadOutcome, PatternDef};
use crate::syntax::pattern::PatternFlags;
use crate::syntax::style::{Color, FontFormat, Style};

/// Create the Python document class
pub fn python_class() -> LoadOutcome {
    let docstring = PatternFlags::SPAN | PatternFlags::NO_INDENT;

    DocumentClass::builder("Python")
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
                .with_color(Color::rgb(0x00, 0x40, 0xa0)),
            Style::new("builtin").with_color(Color::rgb(0x00, 0x60, 0x60)),
            Style::new("decorator").with_format(FontFormat::UNDERLINE),
            Style::new("number").with_color(Color::rgb(0x00, 0x80, 0x80)),
        ])
        .set_patterns([
            PatternDef::range("docstring", r#"""""#, r#"""""#)
                .with_style("string")
                .with_flags(docstring),
            PatternDef::range("single_docstring", r"'''", r"'''")
                .with_style("string")
                .with_flags(docstring),
            PatternDef::keyword("comment", r"#.*$")
                .with_style("comment")
                .with_flags(PatternFlags::COMMENT | PatternFlags::NO_INDENT),
            PatternDef::keywords("alert", &["TODO", "FIXME", "XXX"])
                .with_style("alert")
                .with_parent("comment"),
            PatternDef::keyword("string", r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'"#).with_style("string"),
            PatternDef::keyword("decorator", r"@\w+").with_style("decorator"),
            PatternDef::keywords(
                "keyword",
                &[
                    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
                    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
                    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise",
                    "return", "try", "while", "with", "yield",
                ],
            )
            .with_style("keyword"),
            PatternDef::keywords(
                "builtin",
                &[
                    "abs", "all", "any", "dict", "enumerate", "float", "int", "isinstance", "len", "list",
                    "map", "max", "min", "open", "print", "range", "repr", "set", "sorted", "str", "sum",
                    "super", "tuple", "type", "zip", "self", "cls",
                ],
            )
            .with_style("builtin"),
            PatternDef::keyword("number", r"\b(?:0[xX][0-9a-fA-F]+|\d+(?:\.\d*)?(?:[eE][+-]?\d+)?)j?\b")
                .with_style("number"),
        ])
        .set_indent_patterns([
            IndentPatternDef::new("block_open", IndentKind::Increment)
                .with_rule(IndentRuleDef::new(-1, r":\s*(?:#.*)?$")),
            IndentPatternDef::new("continuation_keyword", IndentKind::Decrement)
                .with_rule(IndentRuleDef::new(0, r"^\s*(?:else|elif|except|finally)\b")),
            IndentPatternDef::new("after_exit", IndentKind::Decrement)
                .with_rule(IndentRuleDef::new(-1, r"^\s*(?:return|pass|break|continue|raise)\b")),
        ])
        .build()
}
