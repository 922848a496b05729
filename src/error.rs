//! @ai:module:intent Define error types for annotation parsing and documentation builds
//! @ai:module:layer domain
//! @ai:module:public_api Error, Result, AnnotationError, ErrorKind, ErrorCategory, MsonSegment, ParseResult, ErrorContext
//! @ai:module:stateless true

use crate::docblock::{Docblock, Location};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// @ai:intent Unified error type for all crate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Annotation(Box<AnnotationError>),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Result of parsing a single docblock, annotation or model.
pub type ParseResult<T> = std::result::Result<T, AnnotationError>;

impl From<AnnotationError> for Error {
    fn from(err: AnnotationError) -> Self {
        Error::Annotation(Box::new(err))
    }
}

impl Error {
    /// @ai:intent Borrow the structured annotation error, if this is one
    pub fn as_annotation(&self) -> Option<&AnnotationError> {
        match self {
            Error::Annotation(err) => Some(err),
            _ => None,
        }
    }
}

/// @ai:intent Name the MSON segment that failed to parse
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MsonSegment {
    Name,
    Type,
    Description,
}

impl fmt::Display for MsonSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MsonSegment::Name => "name",
            MsonSegment::Type => "type",
            MsonSegment::Description => "description",
        };
        f.write_str(name)
    }
}

/// @ai:intent Group error kinds the way reports present them
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Structural,
    Mson,
    Reference,
    Decorator,
    Versioning,
    Access,
}

/// @ai:intent Enumerate every validation failure, carrying the raw offending values
#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
    // Structural
    #[error("no annotations were found")]
    NoAnnotations,

    #[error("a required `@api-{annotation}` annotation is missing")]
    RequiredAnnotationMissing { annotation: String },

    #[error("multiple `@api-{annotation}` annotations were found, only one is allowed")]
    MultipleAnnotations { annotation: String },

    #[error("field `{field}` has more than one `@api-{annotation}` annotation")]
    DuplicateAnnotation { annotation: String, field: String },

    #[error("the `{method}` method is not implemented on this resource")]
    MethodNotImplemented { method: String },

    #[error("field `{field}` is missing a required `@api-{annotation}` annotation")]
    MissingFieldAnnotation { annotation: String, field: String },

    #[error("field `{field}` is documented more than once")]
    DuplicateField { field: String },

    #[error("`{field}` is a restricted field name")]
    RestrictedFieldName { field: String },

    #[error("`@api-{annotation}` is missing its required {segment}")]
    MissingRequiredField { annotation: String, segment: String },

    #[error("`{content}` is not a recognized annotation")]
    UnrecognizedAnnotation { content: String },

    // MSON
    #[error("could not parse the {segment} segment of `{content}`")]
    InvalidMsonSyntax { segment: MsonSegment, content: String },

    #[error("`{supplied}` must be written as `enum`")]
    ImproperlyWrittenEnum { supplied: String },

    #[error("options list `{supplied}` must be pipe-delimited: `{corrected}`")]
    BadOptionsList { supplied: String, corrected: String },

    #[error("type `{type_name}` requires a subtype")]
    MissingSubtype { type_name: String },

    #[error("type `{type_name}` requires a list of options")]
    MissingOptions { type_name: String },

    #[error("`{type_name}` is not a supported type")]
    UnsupportedType { type_name: String },

    #[error("type `{type_name}` does not accept a subtype, but `{subtype}` was given")]
    SubtypeNotAllowed { type_name: String, subtype: String },

    #[error("type `{type_name}` does not accept a list of options")]
    OptionsNotAllowed { type_name: String },

    // Reference resolution
    #[error("representation `{representation}::{method}` could not be found")]
    UncallableRepresentation {
        representation: String,
        method: String,
    },

    #[error("error code `{error_code}` could not be found")]
    UncallableErrorCode { error_code: String },

    #[error("representation `{representation}` is not present in the configuration")]
    UnconfiguredRepresentation { representation: String },

    #[error("representation `{representation}` is documented but is neither configured nor excluded")]
    UnconfiguredRepresentationNotExcluded { representation: String },

    #[error("`{representation}` is not a configured error representation")]
    UnknownErrorRepresentation { representation: String },

    #[error("error representation `{representation}` requires an error code")]
    MissingErrorCode { representation: String },

    #[error("`{return_type}` is not a known return type")]
    UnknownReturnType { return_type: String },

    #[error("`{code}` is not a valid error status code")]
    InvalidHttpCode { code: String },

    #[error("circular `@api-see` reference: {chain}")]
    CircularReference { chain: String },

    // Decorators
    #[error("`@api-{annotation}` requires a `:public` or `:private` decorator")]
    MissingVisibilityDecorator { annotation: String },

    #[error("`:{decorator}` is not a supported decorator on `@api-{annotation}`")]
    UnsupportedDecorator {
        annotation: String,
        decorator: String,
    },

    #[error("`@api-{annotation}` is marked public on a private action")]
    PublicDecoratorOnPrivateAction { annotation: String },

    // Versioning
    #[error("`{supplied}` is not a recognized version schema")]
    UnrecognizedVersionSchema { supplied: String },

    #[error("version range `{supplied}` is lopsided")]
    LopsidedRange { supplied: String },

    #[error("version range `{supplied}` must not contain comparison operators")]
    OperatorsWithinRange { supplied: String },

    #[error("version range `{supplied}` should be written as `{recommended}`")]
    BadRangeUse {
        supplied: String,
        recommended: String,
    },

    // Access control tokens
    #[error("`{capability}` is not a configured capability")]
    InvalidCapability { capability: String },

    #[error("`{scope}` is not a configured scope")]
    InvalidScope { scope: String },
}

impl ErrorKind {
    /// @ai:intent Classify the kind into its taxonomy group
    /// @ai:effects pure
    pub fn category(&self) -> ErrorCategory {
        use ErrorKind::*;
        match self {
            NoAnnotations
            | RequiredAnnotationMissing { .. }
            | MultipleAnnotations { .. }
            | DuplicateAnnotation { .. }
            | MethodNotImplemented { .. }
            | MissingFieldAnnotation { .. }
            | DuplicateField { .. }
            | RestrictedFieldName { .. }
            | MissingRequiredField { .. }
            | UnrecognizedAnnotation { .. } => ErrorCategory::Structural,
            InvalidMsonSyntax { .. }
            | ImproperlyWrittenEnum { .. }
            | BadOptionsList { .. }
            | MissingSubtype { .. }
            | MissingOptions { .. }
            | UnsupportedType { .. }
            | SubtypeNotAllowed { .. }
            | OptionsNotAllowed { .. } => ErrorCategory::Mson,
            UncallableRepresentation { .. }
            | UncallableErrorCode { .. }
            | UnconfiguredRepresentation { .. }
            | UnconfiguredRepresentationNotExcluded { .. }
            | UnknownErrorRepresentation { .. }
            | MissingErrorCode { .. }
            | UnknownReturnType { .. }
            | InvalidHttpCode { .. }
            | CircularReference { .. } => ErrorCategory::Reference,
            MissingVisibilityDecorator { .. }
            | UnsupportedDecorator { .. }
            | PublicDecoratorOnPrivateAction { .. } => ErrorCategory::Decorator,
            UnrecognizedVersionSchema { .. }
            | LopsidedRange { .. }
            | OperatorsWithinRange { .. }
            | BadRangeUse { .. } => ErrorCategory::Versioning,
            InvalidCapability { .. } | InvalidScope { .. } => ErrorCategory::Access,
        }
    }

    /// @ai:intent Stable machine code used by reports
    /// @ai:effects pure
    pub fn code(&self) -> &'static str {
        use ErrorKind::*;
        match self {
            NoAnnotations => "E100",
            RequiredAnnotationMissing { .. } => "E101",
            MultipleAnnotations { .. } => "E102",
            DuplicateAnnotation { .. } => "E103",
            MethodNotImplemented { .. } => "E104",
            MissingFieldAnnotation { .. } => "E105",
            DuplicateField { .. } => "E106",
            RestrictedFieldName { .. } => "E107",
            MissingRequiredField { .. } => "E108",
            UnrecognizedAnnotation { .. } => "E109",
            InvalidMsonSyntax { .. } => "E200",
            ImproperlyWrittenEnum { .. } => "E201",
            BadOptionsList { .. } => "E202",
            MissingSubtype { .. } => "E203",
            MissingOptions { .. } => "E204",
            UnsupportedType { .. } => "E205",
            SubtypeNotAllowed { .. } => "E206",
            OptionsNotAllowed { .. } => "E207",
            UncallableRepresentation { .. } => "E300",
            UncallableErrorCode { .. } => "E301",
            UnconfiguredRepresentation { .. } => "E302",
            UnconfiguredRepresentationNotExcluded { .. } => "E303",
            UnknownErrorRepresentation { .. } => "E304",
            MissingErrorCode { .. } => "E305",
            UnknownReturnType { .. } => "E306",
            InvalidHttpCode { .. } => "E307",
            CircularReference { .. } => "E308",
            MissingVisibilityDecorator { .. } => "E400",
            UnsupportedDecorator { .. } => "E401",
            PublicDecoratorOnPrivateAction { .. } => "E402",
            UnrecognizedVersionSchema { .. } => "E500",
            LopsidedRange { .. } => "E501",
            OperatorsWithinRange { .. } => "E502",
            BadRangeUse { .. } => "E503",
            InvalidCapability { .. } => "E600",
            InvalidScope { .. } => "E601",
        }
    }

    /// @ai:intent Short message for inline, IDE-style reporting
    /// @ai:effects pure
    pub fn validation_message(&self) -> String {
        use ErrorKind::*;
        match self {
            UnrecognizedVersionSchema { .. } => {
                "use a version (`1.1`), a constraint (`>=1.1`) or a range (`1.0-1.2`)".to_string()
            }
            LopsidedRange { .. } => "the lower bound must come before the upper bound".to_string(),
            OperatorsWithinRange { .. } => "ranges take bare versions on both sides".to_string(),
            BadRangeUse { recommended, .. } => format!("use `{}` instead", recommended),
            BadOptionsList { corrected, .. } => format!("use `{}` instead", corrected),
            ImproperlyWrittenEnum { .. } => "use `enum`".to_string(),
            other => other.to_string(),
        }
    }
}

/// @ai:intent Structured validation failure with enough context for inline diagnostics
/// @ai:invariant context fields are only filled once, by the innermost scope that knows them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationError {
    pub kind: ErrorKind,
    pub class: Option<String>,
    pub method: Option<String>,
    pub field: Option<String>,
    pub annotation: Option<String>,
    pub docblock: Option<String>,
    pub location: Option<Location>,
}

impl AnnotationError {
    /// @ai:intent Create an error carrying only its kind
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            class: None,
            method: None,
            field: None,
            annotation: None,
            docblock: None,
            location: None,
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class.get_or_insert_with(|| class.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method.get_or_insert_with(|| method.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field.get_or_insert_with(|| field.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation.get_or_insert_with(|| annotation.into());
        self
    }

    /// @ai:intent Attach the raw docblock text and its location
    pub fn with_docblock(mut self, docblock: &Docblock) -> Self {
        self.docblock.get_or_insert_with(|| docblock.raw().to_string());
        self.location
            .get_or_insert_with(|| docblock.location().clone());
        self
    }

    /// @ai:intent Narrow the location to a single line inside the docblock
    pub fn at_line(mut self, docblock: &Docblock, line: usize) -> Self {
        if self.location.is_none() {
            self.location = Some(Location::new(docblock.location().file.clone(), line, line));
        }
        self.with_docblock(docblock)
    }

    /// @ai:intent Full diagnostic message for batch compile reports
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// @ai:intent Short message for inline reporting
    pub fn validation_message(&self) -> String {
        self.kind.validation_message()
    }
}

impl fmt::Display for AnnotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        match (&self.class, &self.method) {
            (Some(class), Some(method)) => write!(f, " in {}::{}", class, method)?,
            (Some(class), None) => write!(f, " in {}", class)?,
            (None, Some(method)) => write!(f, " in {}", method)?,
            (None, None) => {}
        }

        if let Some(location) = &self.location {
            write!(f, " ({})", location)?;
        }

        Ok(())
    }
}

impl std::error::Error for AnnotationError {}

/// Serialized as the flattened kind payload plus a `context` object, so a kind's own
/// `method`, `field` or `annotation` keys never collide with the surrounding scope.
impl Serialize for AnnotationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Scope<'a> {
            #[serde(skip_serializing_if = "Option::is_none")]
            class: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            method: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            field: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            annotation: Option<&'a str>,
        }

        #[derive(Serialize)]
        struct Repr<'a> {
            #[serde(flatten)]
            kind: &'a ErrorKind,
            context: Scope<'a>,
            #[serde(skip_serializing_if = "Option::is_none")]
            docblock: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            location: Option<&'a Location>,
        }

        Repr {
            kind: &self.kind,
            context: Scope {
                class: self.class.as_deref(),
                method: self.method.as_deref(),
                field: self.field.as_deref(),
                annotation: self.annotation.as_deref(),
            },
            docblock: self.docblock.as_deref(),
            location: self.location.as_ref(),
        }
        .serialize(serializer)
    }
}

impl From<ErrorKind> for AnnotationError {
    fn from(kind: ErrorKind) -> Self {
        AnnotationError::new(kind)
    }
}

/// @ai:intent Attach context to a failing parse result as it propagates outward
pub trait ErrorContext<T> {
    fn in_class(self, class: &str) -> ParseResult<T>;
    fn in_method(self, method: &str) -> ParseResult<T>;
    fn in_field(self, field: &str) -> ParseResult<T>;
}

impl<T> ErrorContext<T> for ParseResult<T> {
    fn in_class(self, class: &str) -> ParseResult<T> {
        self.map_err(|e| e.with_class(class))
    }

    fn in_method(self, method: &str) -> ParseResult<T> {
        self.map_err(|e| e.with_method(method))
    }

    fn in_field(self, field: &str) -> ParseResult<T> {
        self.map_err(|e| e.with_field(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_not_overwritten() {
        let err = AnnotationError::new(ErrorKind::NoAnnotations)
            .with_class("Inner")
            .with_class("Outer")
            .with_method("GET");

        assert_eq!(err.class.as_deref(), Some("Inner"));
        assert_eq!(err.method.as_deref(), Some("GET"));
        assert_eq!(err.to_string(), "no annotations were found in Inner::GET");
    }

    #[test]
    fn test_bad_range_use_messages() {
        let kind = ErrorKind::BadRangeUse {
            supplied: "1.0-1.0".to_string(),
            recommended: "1.0".to_string(),
        };

        assert_eq!(kind.category(), ErrorCategory::Versioning);
        assert_eq!(kind.code(), "E503");
        assert_eq!(kind.validation_message(), "use `1.0` instead");
        assert!(kind.to_string().contains("should be written as `1.0`"));
    }

    #[test]
    fn test_serializes_kind_tag() {
        let err = AnnotationError::new(ErrorKind::InvalidScope {
            scope: "delete".to_string(),
        })
        .with_class("Movie");

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "invalid_scope");
        assert_eq!(json["scope"], "delete");
        assert_eq!(json["context"]["class"], "Movie");
        assert!(json["context"].get("method").is_none());
        assert!(json.get("location").is_none());
    }

    #[test]
    fn test_kind_payload_survives_context() {
        let uncallable = AnnotationError::new(ErrorKind::UncallableRepresentation {
            representation: "App\\Movie".to_string(),
            method: "render".to_string(),
        })
        .with_class("App\\MovieController")
        .with_method("GET");

        let json = serde_json::to_value(&uncallable).unwrap();
        assert_eq!(json["method"], "render");
        assert_eq!(json["representation"], "App\\Movie");
        assert_eq!(json["context"]["method"], "GET");

        let missing = AnnotationError::new(ErrorKind::MissingFieldAnnotation {
            annotation: "type".to_string(),
            field: "id".to_string(),
        })
        .with_field("id")
        .with_annotation("@api-field");

        let json = serde_json::to_value(&missing).unwrap();
        assert_eq!(json["annotation"], "type");
        assert_eq!(json["field"], "id");
        assert_eq!(json["context"]["annotation"], "@api-field");
    }

    #[test]
    fn test_wraps_into_crate_error() {
        let err: Error = AnnotationError::new(ErrorKind::NoAnnotations).into();
        assert!(err.as_annotation().is_some());
    }
}
