//! @ai:module:intent Scan source files for classes, methods and the docblocks attached to them
//! @ai:module:layer application
//! @ai:module:public_api read_file, read_source, SourceFile, ClassSource, MethodSource
//! @ai:module:depends_on language, docblock, error
//! @ai:module:stateless true

use crate::docblock::Docblock;
use crate::error::{Error, Result};
use crate::language::{detect_language, Language};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Names that look like method declarations to the TypeScript and Java patterns.
const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "elseif", "for", "foreach", "while", "switch", "catch", "function", "return",
    "new", "match", "do", "try",
];

/// @ai:intent Scanned source file with every class it declares
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub language: Language,
    pub namespace: Option<String>,
    pub classes: Vec<ClassSource>,
}

/// @ai:intent A class declaration with its docblock, methods and constants
#[derive(Debug, Clone)]
pub struct ClassSource {
    pub name: String,
    pub short_name: String,
    pub file: PathBuf,
    pub line: usize,
    pub end_line: usize,
    pub docblock: Option<Docblock>,
    pub methods: Vec<MethodSource>,
    pub constants: Vec<String>,
}

/// @ai:intent A method declaration with its attached docblock and the docblocks inside its body
#[derive(Debug, Clone)]
pub struct MethodSource {
    pub name: String,
    pub line: usize,
    pub end_line: usize,
    pub docblock: Option<Docblock>,
    pub body_docblocks: Vec<Docblock>,
}

/// Brace depth at the start and end of one line, and whether the line is code.
#[derive(Debug, Clone, Copy, Default)]
struct LineDepth {
    before: usize,
    after: usize,
    opens: bool,
    code: bool,
}

/// @ai:intent Read and scan a source file from disk
/// @ai:pre path exists and has a supported extension
/// @ai:effects fs:read
pub fn read_file(path: &Path) -> Result<SourceFile> {
    let language = detect_language(path)
        .ok_or_else(|| Error::UnsupportedFileType(path.display().to_string()))?;

    let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(read_source(path, &content, language))
}

/// @ai:intent Scan in-memory source text
/// @ai:post every class found is returned with its direct methods
/// @ai:effects pure
pub fn read_source(path: &Path, content: &str, language: Language) -> SourceFile {
    let syntax = language.syntax();
    let lines: Vec<&str> = content.lines().collect();
    let docblocks = extract_docblocks(&lines, path);
    let depths = brace_depths(&lines, language);

    let namespace = syntax.namespace.and_then(|pattern| {
        let re = Regex::new(pattern).expect("Invalid regex pattern");
        lines
            .iter()
            .find_map(|line| re.captures(line).map(|c| c[1].to_string()))
    });

    let class_re = Regex::new(syntax.class).expect("Invalid regex pattern");
    let method_re = Regex::new(syntax.method).expect("Invalid regex pattern");
    let constant_re = Regex::new(syntax.constant).expect("Invalid regex pattern");

    let mut classes = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if !depths[idx].code {
            continue;
        }
        let Some(captures) = class_re.captures(line) else {
            continue;
        };

        let short_name = captures[1].to_string();
        let end_idx = block_end(&depths, idx);
        let body_depth = depths[idx].before + 1;

        let name = match &namespace {
            Some(ns) => format!("{}{}{}", ns, syntax.namespace_separator, short_name),
            None => short_name.clone(),
        };

        let mut methods = Vec::new();
        let mut constants = Vec::new();

        for member_idx in (idx + 1)..=end_idx {
            let depth = depths[member_idx];
            if !depth.code || depth.before != body_depth {
                continue;
            }
            let member = lines[member_idx];

            if let Some(captures) = constant_re.captures(member) {
                constants.push(captures[1].to_string());
                continue;
            }

            if let Some(captures) = method_re.captures(member) {
                let method_name = captures[1].to_string();
                if CONTROL_KEYWORDS.contains(&method_name.as_str()) {
                    continue;
                }

                let method_end = block_end(&depths, member_idx);
                let line_number = member_idx + 1;
                let end_line = method_end + 1;

                methods.push(MethodSource {
                    name: method_name,
                    line: line_number,
                    end_line,
                    docblock: attached_docblock(&lines, &docblocks, line_number),
                    body_docblocks: docblocks
                        .iter()
                        .filter(|d| {
                            d.location().start_line > line_number
                                && d.location().end_line <= end_line
                        })
                        .cloned()
                        .collect(),
                });
            }
        }

        classes.push(ClassSource {
            name,
            short_name,
            file: path.to_path_buf(),
            line: idx + 1,
            end_line: end_idx + 1,
            docblock: attached_docblock(&lines, &docblocks, idx + 1),
            methods,
            constants,
        });
    }

    tracing::debug!(
        "Scanned {}: {} classes",
        path.display(),
        classes.len()
    );

    SourceFile {
        path: path.to_path_buf(),
        language,
        namespace,
        classes,
    }
}

/// @ai:intent Extract every `/** ... */` block with its line span
/// @ai:effects pure
fn extract_docblocks(lines: &[&str], path: &Path) -> Vec<Docblock> {
    let mut blocks = Vec::new();
    let mut current: Option<(usize, Vec<&str>)> = None;

    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();

        match &mut current {
            Some((_, collected)) => {
                collected.push(trimmed);
                if trimmed.contains("*/") {
                    if let Some((start, collected)) = current.take() {
                        blocks.push(Docblock::new(collected.join("\n"), path, start));
                    }
                }
            }
            None => {
                if trimmed.starts_with("/**") && !trimmed.starts_with("/**/") {
                    if trimmed[3..].contains("*/") {
                        blocks.push(Docblock::new(trimmed, path, idx + 1));
                    } else {
                        current = Some((idx + 1, vec![trimmed]));
                    }
                }
            }
        }
    }

    blocks
}

/// @ai:intent Find the docblock that ends directly above a declaration
/// @ai:pre declaration_line is 1-based
/// @ai:effects pure
fn attached_docblock(
    lines: &[&str],
    docblocks: &[Docblock],
    declaration_line: usize,
) -> Option<Docblock> {
    let mut line = declaration_line.checked_sub(1)?;

    // Skip blank lines and attributes/decorators between the docblock and the declaration.
    while line > 0 {
        let text = lines[line - 1].trim();
        if text.is_empty() || text.starts_with("#[") || is_decorator(text) {
            line -= 1;
            continue;
        }
        break;
    }

    docblocks
        .iter()
        .find(|d| d.location().end_line == line)
        .cloned()
}

fn is_decorator(text: &str) -> bool {
    text.starts_with('@') && !text.starts_with("@api-")
}

/// @ai:intent Index of the line that closes the block opened at `start`
/// @ai:post result >= start; equals start for declarations without a body
/// @ai:effects pure
fn block_end(depths: &[LineDepth], start: usize) -> usize {
    let base = depths[start].before;
    let mut opened = false;

    for (idx, depth) in depths.iter().enumerate().skip(start) {
        if depth.opens || depth.after > base {
            opened = true;
        }
        if opened && depth.after <= base {
            return idx;
        }
        // A declaration terminated before any brace has no body.
        if !opened && idx > start && depth.code {
            return start;
        }
    }

    depths.len().saturating_sub(1).max(start)
}

/// @ai:intent Track brace depth per line, ignoring braces in strings and comments
/// @ai:effects pure
fn brace_depths(lines: &[&str], language: Language) -> Vec<LineDepth> {
    let line_comments = language.syntax().line_comments;
    let mut depth: usize = 0;
    let mut in_block_comment = false;
    let mut in_string: Option<char> = None;
    let mut result = Vec::with_capacity(lines.len());

    for line in lines {
        let before = depth;
        let starts_in_comment = in_block_comment;
        let mut opens = false;
        let mut has_code = false;
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            if in_block_comment {
                if c == '*' && next == Some('/') {
                    in_block_comment = false;
                    i += 2;
                } else {
                    i += 1;
                }
                continue;
            }

            if let Some(quote) = in_string {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == quote {
                    in_string = None;
                }
                i += 1;
                continue;
            }

            if c == '/' && next == Some('*') {
                in_block_comment = true;
                i += 2;
                continue;
            }

            let rest: String = chars[i..].iter().collect();
            if line_comments
                .iter()
                .any(|prefix| rest.starts_with(prefix) && !rest.starts_with("#["))
            {
                break;
            }

            match c {
                '"' | '\'' | '`' => in_string = Some(c),
                '{' => {
                    depth += 1;
                    opens = true;
                }
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            if !c.is_whitespace() {
                has_code = true;
            }
            i += 1;
        }

        result.push(LineDepth {
            before,
            after: depth,
            opens,
            code: has_code && !starts_in_comment,
        });
    }

    result
}

impl ClassSource {
    /// @ai:intent Find a direct method by exact name
    /// @ai:effects pure
    pub fn method(&self, name: &str) -> Option<&MethodSource> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// @ai:intent Check if the class declares a constant
    /// @ai:effects pure
    pub fn has_constant(&self, name: &str) -> bool {
        self.constants.iter().any(|c| c == name)
    }
}
