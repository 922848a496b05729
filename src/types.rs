//! @ai:module:intent Closed registry of field types and the subtype/option rules each enforces
//! @ai:module:layer domain
//! @ai:module:public_api DataType, TypeSpec, parse_options
//! @ai:module:depends_on error
//! @ai:module:stateless true

use crate::error::{AnnotationError, ErrorKind, ParseResult};
use serde::Serialize;
use std::fmt;

/// @ai:intent Every type a field or parameter may declare
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Array,
    Boolean,
    Datetime,
    Enum,
    Number,
    Object,
    Representation,
    Timestamp,
    String,
    Uri,
}

const ALL_TYPES: [DataType; 10] = [
    DataType::Array,
    DataType::Boolean,
    DataType::Datetime,
    DataType::Enum,
    DataType::Number,
    DataType::Object,
    DataType::Representation,
    DataType::Timestamp,
    DataType::String,
    DataType::Uri,
];

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Array => "array",
            DataType::Boolean => "boolean",
            DataType::Datetime => "datetime",
            DataType::Enum => "enum",
            DataType::Number => "number",
            DataType::Object => "object",
            DataType::Representation => "representation",
            DataType::Timestamp => "timestamp",
            DataType::String => "string",
            DataType::Uri => "uri",
        }
    }

    pub fn allows_subtype(&self) -> bool {
        matches!(self, DataType::Array | DataType::Representation)
    }

    pub fn requires_subtype(&self) -> bool {
        matches!(self, DataType::Array | DataType::Representation)
    }

    pub fn requires_options(&self) -> bool {
        matches!(self, DataType::Enum)
    }

    /// @ai:intent Resolve a type token; casing is forgiven for everything except `enum`
    /// @ai:example ("String") -> Ok(String)
    /// @ai:example ("Enum") -> Err(ImproperlyWrittenEnum)
    /// @ai:example ("integer") -> Err(UnsupportedType)
    /// @ai:effects pure
    pub fn parse(token: &str) -> ParseResult<Self> {
        let token = token.trim();
        let lowered = token.to_lowercase();

        if lowered == "enum" && token != "enum" {
            return Err(AnnotationError::new(ErrorKind::ImproperlyWrittenEnum {
                supplied: token.to_string(),
            }));
        }

        ALL_TYPES
            .into_iter()
            .find(|t| t.name() == lowered)
            .ok_or_else(|| {
                AnnotationError::new(ErrorKind::UnsupportedType {
                    type_name: token.to_string(),
                })
            })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// @ai:intent A validated type with its subtype and options
/// @ai:invariant subtype is Some iff the type requires one; options is non-empty iff the type requires them
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TypeSpec {
    #[serde(rename = "type")]
    pub data_type: DataType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl TypeSpec {
    /// @ai:intent Validate a type token together with its optional subtype and raw options list
    /// @ai:post Err(MissingSubtype | MissingOptions | SubtypeNotAllowed | OptionsNotAllowed | BadOptionsList) on rule violations
    /// @ai:effects pure
    pub fn new(type_token: &str, subtype: Option<&str>, options: Option<&str>) -> ParseResult<Self> {
        let data_type = DataType::parse(type_token)?;
        let subtype = subtype.map(str::trim).filter(|s| !s.is_empty());

        let subtype = match (data_type.allows_subtype(), subtype) {
            (false, Some(subtype)) => {
                return Err(AnnotationError::new(ErrorKind::SubtypeNotAllowed {
                    type_name: data_type.to_string(),
                    subtype: subtype.to_string(),
                }))
            }
            (_, None) if data_type.requires_subtype() => {
                return Err(AnnotationError::new(ErrorKind::MissingSubtype {
                    type_name: data_type.to_string(),
                }))
            }
            (_, subtype) => subtype.map(str::to_string),
        };

        let options = match options.map(str::trim).filter(|o| !o.is_empty()) {
            Some(raw) if data_type.requires_options() => parse_options(raw)?,
            Some(_) => {
                return Err(AnnotationError::new(ErrorKind::OptionsNotAllowed {
                    type_name: data_type.to_string(),
                }))
            }
            None if data_type.requires_options() => {
                return Err(AnnotationError::new(ErrorKind::MissingOptions {
                    type_name: data_type.to_string(),
                }))
            }
            None => Vec::new(),
        };

        Ok(Self {
            data_type,
            subtype,
            options,
        })
    }

    /// @ai:intent Subtype naming a representation class, for types that link to one
    pub fn representation_reference(&self) -> Option<&str> {
        match self.data_type {
            DataType::Representation => self.subtype.as_deref(),
            DataType::Array => self
                .subtype
                .as_deref()
                .filter(|s| DataType::parse(s).is_err()),
            _ => None,
        }
    }
}

/// @ai:intent Parse a bracketed, pipe-delimited options list
/// @ai:example ("[a|b|c]") -> Ok(["a", "b", "c"])
/// @ai:example ("[a,b,c]") -> Err(BadOptionsList, corrected "[a|b|c]")
/// @ai:effects pure
pub fn parse_options(raw: &str) -> ParseResult<Vec<String>> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'));

    let bad = |inner: &str| {
        let corrected = inner
            .split(|c| matches!(c, ',' | ';' | '/' | '|'))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("|");
        AnnotationError::new(ErrorKind::BadOptionsList {
            supplied: raw.to_string(),
            corrected: format!("[{}]", corrected),
        })
    };

    let Some(inner) = inner else {
        return Err(bad(raw.trim_matches(|c| c == '[' || c == ']')));
    };

    if inner.contains([',', ';', '/']) {
        return Err(bad(inner));
    }

    let options: Vec<String> = inner
        .split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if options.is_empty() {
        return Err(bad(inner));
    }

    Ok(options)
}
