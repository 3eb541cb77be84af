//! Function extractor
//!
//! Finds top-level function definitions in normalized source by counting
//! braces rather than parsing a grammar. Text between the end of the previous
//! function and the next `{` is the candidate header; the body runs to the
//! matching `}`. Headers must end in `<word> <word> ( <args> )`. A braced
//! block whose header does not match is skipped without complaint, which is
//! also what happens to anything else written at top level.
//!
//! Braces inside character literals are counted like any other brace.

use crate::compiler::errors::{CompileError, Diagnostic};
use crate::interpreter::constants::ENTRY_POINT;
use crate::parser::ast::SourceLocation;
use rustc_hash::FxHashSet;

/// A function found in the source, with its body still as text
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    /// Parameter names, types discarded (see [`process_params`])
    pub params: Vec<String>,
    /// Text strictly between the braces
    pub body: String,
    /// Location of the first body character in the source
    pub body_origin: SourceLocation,
    /// Location of the function name
    pub location: SourceLocation,
}

/// Scan `code` for function definitions, in source order.
pub fn extract_functions(code: &str) -> Result<Vec<FunctionDefinition>, CompileError> {
    let mut functions = Vec::new();
    let mut pos = 0;

    while let Some(rel) = code[pos..].find('{') {
        let open = pos + rel;
        let header = &code[pos..open];

        let close = matching_brace(code, open).ok_or_else(|| CompileError::UnbalancedBraces {
            location: location_at(code, open),
        })?;

        if let Some(found) = parse_header(header) {
            functions.push(FunctionDefinition {
                params: process_params(&found.params),
                name: found.name,
                body: code[open + 1..close].to_string(),
                body_origin: location_at(code, open + 1),
                location: location_at(code, pos + found.name_offset),
            });
        }

        pos = close + 1;
    }

    Ok(functions)
}

/// Separate the entry function from the subroutines.
///
/// Fails with [`CompileError::MissingEntryPoint`] when there is no
/// `user_main`, and with `CompilationFailed` when a name is defined twice.
pub fn split_entry(
    functions: Vec<FunctionDefinition>,
) -> Result<(FunctionDefinition, Vec<FunctionDefinition>), CompileError> {
    let mut seen = FxHashSet::default();
    for function in &functions {
        if !seen.insert(function.name.as_str()) {
            return Err(CompileError::CompilationFailed {
                diagnostic: Diagnostic::at(
                    format!("Function '{}' is defined more than once", function.name),
                    function.location,
                ),
            });
        }
    }

    let mut entry = None;
    let mut subroutines = Vec::with_capacity(functions.len());
    for function in functions {
        if function.name == ENTRY_POINT {
            entry = Some(function);
        } else {
            subroutines.push(function);
        }
    }

    match entry {
        Some(entry) => Ok((entry, subroutines)),
        None => Err(CompileError::MissingEntryPoint {
            name: ENTRY_POINT.to_string(),
        }),
    }
}

/// Turn a raw C parameter list into parameter names.
///
/// `void` (or nothing) means no parameters; otherwise each comma-separated
/// declaration contributes its last whitespace-delimited token with the
/// first `*` removed. Types are dropped entirely.
pub fn process_params(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "void" {
        return Vec::new();
    }

    trimmed
        .split(',')
        .map(|param| {
            let last = param.split_whitespace().last().unwrap_or("");
            last.replacen('*', "", 1)
        })
        .collect()
}

/// Index of the `}` matching the `{` at `open`, counting nested braces.
fn matching_brace(code: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, byte) in code.bytes().enumerate().skip(open) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Name and arguments of a matched function header
#[derive(Debug, PartialEq)]
struct Header {
    name: String,
    /// Byte offset of the name within the header text
    name_offset: usize,
    params: String,
}

/// Match a header against `<word> <word> ( <args> )` anchored at its end.
///
/// Leading junk before the return type is ignored, so top-level declarations
/// that precede a function are silently dropped along with it.
fn parse_header(header: &str) -> Option<Header> {
    let inner = header.trim_end().strip_suffix(')')?;

    // Arguments may not contain ')', so the '(' must follow the last one.
    let search_from = inner.rfind(')').map_or(0, |i| i + 1);

    for (offset, _) in inner[search_from..].match_indices('(') {
        let paren = search_from + offset;
        let before = inner[..paren].trim_end();

        let name_start = before
            .char_indices()
            .rev()
            .find(|&(_, c)| !is_word_char(c))
            .map_or(0, |(i, c)| i + c.len_utf8());
        let name = &before[name_start..];
        if name.is_empty() {
            continue;
        }

        // Whitespace, then the return-type word
        let type_part = &before[..name_start];
        if !type_part.ends_with(char::is_whitespace) {
            continue;
        }
        if !type_part.trim_end().chars().last().is_some_and(is_word_char) {
            continue;
        }

        return Some(Header {
            name: name.to_string(),
            name_offset: name_start,
            params: inner[paren + 1..].to_string(),
        });
    }

    None
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Line/column of a byte offset
fn location_at(code: &str, offset: usize) -> SourceLocation {
    let before = &code[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    SourceLocation::new(line, column)
}
