//! @ai:module:intent Hold raw docblock text and lex it into @api-* tags
//! @ai:module:layer domain
//! @ai:module:public_api Docblock, Location, Tag, TagKind
//! @ai:module:stateless true

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// @ai:intent Represents a span of source lines in a file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub file: PathBuf,
    pub start_line: usize,
    pub end_line: usize,
}

impl Location {
    /// @ai:intent Create a new Location
    pub fn new(file: PathBuf, start_line: usize, end_line: usize) -> Self {
        Self {
            file,
            start_line,
            end_line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start_line == self.end_line {
            write!(f, "{}:{}", self.file.display(), self.start_line)
        } else {
            write!(
                f,
                "{}:{}-{}",
                self.file.display(),
                self.start_line,
                self.end_line
            )
        }
    }
}

/// @ai:intent Every annotation kind the parser understands
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum TagKind {
    Label,
    Description,
    Param,
    Data,
    Field,
    Type,
    Subtype,
    Options,
    Version,
    Uri,
    Scope,
    Capability,
    Throws,
    ContentType,
    Return,
    See,
}

impl TagKind {
    /// @ai:intent Map the name written after `@api-` to a kind
    /// @ai:example ("contentType") -> Some(ContentType)
    /// @ai:example ("unknown") -> None
    /// @ai:effects pure
    pub fn from_name(name: &str) -> Option<TagKind> {
        let kind = match name {
            "label" => TagKind::Label,
            "description" => TagKind::Description,
            "param" => TagKind::Param,
            "data" => TagKind::Data,
            "field" => TagKind::Field,
            "type" => TagKind::Type,
            "subtype" => TagKind::Subtype,
            "options" => TagKind::Options,
            "version" => TagKind::Version,
            "uri" => TagKind::Uri,
            "scope" => TagKind::Scope,
            "capability" => TagKind::Capability,
            "throws" => TagKind::Throws,
            "contentType" => TagKind::ContentType,
            "return" => TagKind::Return,
            "see" => TagKind::See,
            _ => return None,
        };
        Some(kind)
    }

    /// @ai:intent Name as written in source, without the `@api-` prefix
    /// @ai:effects pure
    pub fn name(&self) -> &'static str {
        match self {
            TagKind::Label => "label",
            TagKind::Description => "description",
            TagKind::Param => "param",
            TagKind::Data => "data",
            TagKind::Field => "field",
            TagKind::Type => "type",
            TagKind::Subtype => "subtype",
            TagKind::Options => "options",
            TagKind::Version => "version",
            TagKind::Uri => "uri",
            TagKind::Scope => "scope",
            TagKind::Capability => "capability",
            TagKind::Throws => "throws",
            TagKind::ContentType => "contentType",
            TagKind::Return => "return",
            TagKind::See => "see",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@api-{}", self.name())
    }
}

/// @ai:intent A single `@api-*` tag line lexed out of a docblock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub decorators: Vec<String>,
    pub content: String,
    pub line: usize,
}

/// @ai:intent Immutable raw comment text with its source location
/// @ai:invariant lines are numbered from location.start_line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Docblock {
    raw: String,
    location: Location,
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^@api-([A-Za-z]+)((?::[A-Za-z]*)*)(?:\s+(.*))?$").expect("Invalid regex")
    })
}

impl Docblock {
    /// @ai:intent Create a docblock from raw comment text found at a location
    pub fn new(raw: impl Into<String>, file: impl AsRef<Path>, start_line: usize) -> Self {
        let raw = raw.into();
        let end_line = start_line + raw.lines().count().saturating_sub(1);
        Self {
            location: Location::new(file.as_ref().to_path_buf(), start_line, end_line),
            raw,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// @ai:intent Comment text with `/**`, `*/` and leading `*` stripped, paired with line numbers
    /// @ai:effects pure
    pub fn lines(&self) -> Vec<(usize, String)> {
        self.raw
            .lines()
            .enumerate()
            .map(|(idx, line)| (self.location.start_line + idx, strip_decoration(line)))
            .collect()
    }

    /// @ai:intent Lex every recognized `@api-*` tag, folding continuation lines into the previous tag
    /// @ai:post tags are returned in source order
    /// @ai:effects pure
    pub fn tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = Vec::new();
        // Continuation lines only attach to a tag we recognized.
        let mut collecting = false;

        for (line_number, line) in self.lines() {
            if line.starts_with('@') {
                collecting = false;
                if let Some(captures) = tag_regex().captures(&line) {
                    let Some(kind) = TagKind::from_name(&captures[1]) else {
                        continue;
                    };
                    let decorators = captures
                        .get(2)
                        .map(|m| {
                            m.as_str()
                                .split(':')
                                .filter(|d| !d.is_empty())
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default();
                    let content = captures
                        .get(3)
                        .map(|m| m.as_str().trim().to_string())
                        .unwrap_or_default();

                    tags.push(Tag {
                        kind,
                        decorators,
                        content,
                        line: line_number,
                    });
                    collecting = true;
                }
                continue;
            }

            if !collecting || line.is_empty() {
                collecting = collecting && !line.is_empty();
                continue;
            }

            if let Some(tag) = tags.last_mut() {
                if tag.content.is_empty() {
                    tag.content = line;
                } else {
                    tag.content.push(' ');
                    tag.content.push_str(&line);
                }
            }
        }

        tags
    }

    /// @ai:intent Lines that start with `@api-` but do not lex into a known tag
    /// @ai:example ("@api-uri:public{Movies} /x") -> [(line, "@api-uri:public{Movies} /x")]
    /// @ai:effects pure
    pub fn unrecognized(&self) -> Vec<(usize, String)> {
        self.lines()
            .into_iter()
            .filter(|(_, line)| line.starts_with("@api-"))
            .filter(|(_, line)| {
                tag_regex()
                    .captures(line)
                    .and_then(|c| TagKind::from_name(&c[1]))
                    .is_none()
            })
            .collect()
    }

    /// @ai:intent Tags of a single kind, in source order
    /// @ai:effects pure
    pub fn tags_of(&self, kind: TagKind) -> Vec<Tag> {
        self.tags().into_iter().filter(|t| t.kind == kind).collect()
    }

    /// @ai:intent Check if the docblock carries any recognized `@api-*` tag
    pub fn has_annotations(&self) -> bool {
        !self.tags().is_empty()
    }
}

/// @ai:intent Remove comment delimiters and the leading `*` gutter from a line
/// @ai:effects pure
fn strip_decoration(line: &str) -> String {
    let mut trimmed = line.trim();

    if let Some(rest) = trimmed.strip_prefix("/**") {
        trimmed = rest;
    }
    if let Some(rest) = trimmed.strip_suffix("*/") {
        trimmed = rest;
    }

    let trimmed = trimmed.trim();
    let trimmed = trimmed.strip_prefix('*').unwrap_or(trimmed);
    trimmed.trim().to_string()
}
