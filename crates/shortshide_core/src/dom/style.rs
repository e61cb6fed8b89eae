//! Inline `style` attribute editing.
//!
//! The attribute is split on top-level `;` tokens with `cssparser`, so a
//! `;` inside a string, `url(...)` or any function block stays part of its
//! declaration. Declarations other than the edited one are kept verbatim
//! (trimmed); edited ones are written as `name: value;` or
//! `name: value !important;`. Entries are joined by one space.

use cssparser::{Parser, ParserInput, Token};

/// Trimmed, non-empty top-level chunks of `style`.
fn split_declarations(style: &str) -> Vec<&str> {
    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);
    let mut chunks = Vec::new();
    let mut start = parser.position();
    loop {
        let before = parser.position();
        let is_separator = match parser.next_including_whitespace_and_comments() {
            Ok(token) => matches!(token, Token::Semicolon),
            Err(_) => break,
        };
        if is_separator {
            chunks.push(parser.slice(start..before));
            start = parser.position();
        }
    }
    chunks.push(parser.slice_from(start));
    chunks
        .into_iter()
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect()
}

fn declares(chunk: &str, name: &str) -> bool {
    chunk
        .split_once(':')
        .is_some_and(|(property, _)| property.trim().eq_ignore_ascii_case(name))
}

fn serialize<S: AsRef<str>>(chunks: &[S]) -> String {
    chunks
        .iter()
        .map(|chunk| format!("{};", chunk.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns `style` with `name` set. The first existing declaration of
/// `name` is replaced in place and later duplicates are dropped.
pub fn set_property(style: &str, name: &str, value: &str, important: bool) -> String {
    let name = name.to_ascii_lowercase();
    let declaration = if important {
        format!("{name}: {value} !important")
    } else {
        format!("{name}: {value}")
    };
    let mut replaced = false;
    let mut chunks = Vec::new();
    for chunk in split_declarations(style) {
        if !declares(chunk, &name) {
            chunks.push(chunk.to_string());
        } else if !replaced {
            chunks.push(declaration.clone());
            replaced = true;
        }
    }
    if !replaced {
        chunks.push(declaration);
    }
    serialize(&chunks)
}

/// Returns `style` without `name`. An empty result means no declarations
/// remain.
pub fn remove_property(style: &str, name: &str) -> String {
    let chunks: Vec<&str> = split_declarations(style)
        .into_iter()
        .filter(|chunk| !declares(chunk, name))
        .collect();
    serialize(&chunks)
}

/// Value of `name` and whether it is `!important`.
pub fn get_property(style: &str, name: &str) -> Option<(String, bool)> {
    let chunk = split_declarations(style)
        .into_iter()
        .find(|chunk| declares(chunk, name))?;
    let (_, value) = chunk.split_once(':')?;
    let value = value.trim();
    Some(match value.strip_suffix("!important") {
        Some(rest) => (rest.trim_end().to_string(), true),
        None => (value.to_string(), false),
    })
}
