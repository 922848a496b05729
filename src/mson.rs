//! @ai:module:intent Parse MSON content: `name (type, modifiers) - description`
//! @ai:module:layer domain
//! @ai:module:public_api Mson, MsonOptions
//! @ai:module:depends_on types, error
//! @ai:module:stateless true

use crate::error::{AnnotationError, ErrorContext, ErrorKind, MsonSegment, ParseResult};
use crate::types::TypeSpec;
use serde::Serialize;

/// @ai:intent What a caller requires of an MSON line
#[derive(Debug, Clone, Copy)]
pub struct MsonOptions {
    pub require_description: bool,
}

impl Default for MsonOptions {
    fn default() -> Self {
        Self {
            require_description: true,
        }
    }
}

/// @ai:intent A named, typed data element parsed from MSON
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Mson {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    #[serde(flatten)]
    pub type_spec: TypeSpec,
    pub required: bool,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn syntax_error(segment: MsonSegment, content: &str) -> AnnotationError {
    AnnotationError::new(ErrorKind::InvalidMsonSyntax {
        segment,
        content: content.to_string(),
    })
}

impl Mson {
    /// @ai:intent Parse an MSON line
    /// @ai:pre content is the annotation text after the tag and decorators
    /// @ai:example ("{id} (string) - Movie id") -> Ok(name "id", type string)
    /// @ai:example ("tags (array, string, optional) - Tags") -> Ok(required false)
    /// @ai:example ("(string) - Missing name") -> Err(InvalidMsonSyntax name)
    /// @ai:effects pure
    pub fn parse(content: &str, options: MsonOptions) -> ParseResult<Self> {
        let content = content.trim();

        let (name, rest) = split_name(content).ok_or_else(|| syntax_error(MsonSegment::Name, content))?;
        let (sample, rest) = split_sample(rest);

        let (type_tokens, rest) =
            split_type(rest).ok_or_else(|| syntax_error(MsonSegment::Type, content))?;

        let description = match rest.trim() {
            "" => None,
            rest => match rest.strip_prefix('-') {
                Some(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
                _ => return Err(syntax_error(MsonSegment::Description, content)),
            },
        };
        if description.is_none() && options.require_description {
            return Err(syntax_error(MsonSegment::Description, content).with_field(&name));
        }

        let mut tokens = type_tokens.into_iter();
        let type_token = tokens
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| syntax_error(MsonSegment::Type, content).with_field(&name))?;

        let mut subtype: Option<String> = None;
        let mut raw_options: Option<String> = None;
        let mut required = true;
        let mut nullable = false;
        let mut tag = None;
        let mut capability = None;

        for token in tokens {
            match token.as_str() {
                "optional" => required = false,
                "required" => required = true,
                "nullable" => nullable = true,
                t if t.starts_with("tag:") => tag = Some(t["tag:".len()..].trim().to_string()),
                t if t.starts_with("capability:") => {
                    capability = Some(t["capability:".len()..].trim().to_string())
                }
                t if t.starts_with('[') || t.contains('|') => raw_options = Some(t.to_string()),
                t if subtype.is_none() => subtype = Some(t.to_string()),
                _ => return Err(syntax_error(MsonSegment::Type, content).with_field(&name)),
            }
        }

        let type_spec = TypeSpec::new(&type_token, subtype.as_deref(), raw_options.as_deref())
            .in_field(&name)?;

        Ok(Self {
            name,
            sample,
            type_spec,
            required,
            nullable,
            tag,
            capability,
            description,
        })
    }
}

/// @ai:intent Split off the name, written bare or wrapped in braces
/// @ai:effects pure
fn split_name(content: &str) -> Option<(String, &str)> {
    let (name, rest) = if let Some(braced) = content.strip_prefix('{') {
        let end = braced.find('}')?;
        (braced[..end].trim(), &braced[end + 1..])
    } else {
        let end = content
            .find(|c: char| c.is_whitespace() || c == '(' || c == '`')
            .unwrap_or(content.len());
        (&content[..end], &content[end..])
    };

    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '-' | '*' | '[' | ']'));

    valid.then(|| (name.to_string(), rest))
}

/// @ai:intent Split off an optional backtick-quoted sample value
/// @ai:effects pure
fn split_sample(rest: &str) -> (Option<String>, &str) {
    let trimmed = rest.trim_start();
    if let Some(quoted) = trimmed.strip_prefix('`') {
        if let Some(end) = quoted.find('`') {
            return (Some(quoted[..end].to_string()), &quoted[end + 1..]);
        }
    }
    (None, rest)
}

/// @ai:intent Split the parenthesized type list at top-level commas
/// @ai:post commas inside `[...]` stay with their token
/// @ai:effects pure
fn split_type(rest: &str) -> Option<(Vec<String>, &str)> {
    let inner = rest.trim_start().strip_prefix('(')?;

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for (idx, c) in inner.char_indices() {
        match c {
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                tokens.push(current.trim().to_string());
                current.clear();
            }
            ')' if depth == 0 => {
                tokens.push(current.trim().to_string());
                return Some((tokens, &inner[idx + 1..]));
            }
            _ => current.push(c),
        }
    }

    None
}
