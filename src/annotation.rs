//! @ai:module:intent Define the typed annotation variants and the narrow interfaces they share
//! @ai:module:layer domain
//! @ai:module:public_api Annotation, Visibility, HasVisibility, HasVersion, HasCapability, FromAnnotation, ReturnType
//! @ai:module:depends_on docblock, mson, types, version
//! @ai:module:stateless true

use crate::docblock::{Docblock, TagKind};
use crate::mson::Mson;
use crate::types::TypeSpec;
use crate::version::{Version, VersionConstraint};
use serde::Serialize;

/// @ai:intent Visibility decorator on an annotation
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    /// @ai:intent Map a decorator token to a visibility
    /// @ai:effects pure
    pub fn from_decorator(decorator: &str) -> Option<Self> {
        match decorator {
            "public" => Some(Visibility::Public),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// @ai:intent Where an annotation came from
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AnnotationSource {
    #[serde(skip)]
    pub docblock: Docblock,
    pub line: usize,
}

/// @ai:intent Annotations that may carry a `:public`/`:private` decorator
pub trait HasVisibility {
    fn visibility(&self) -> Option<Visibility>;

    /// Undecorated annotations are public.
    fn is_public(&self) -> bool {
        self.visibility() != Some(Visibility::Private)
    }
}

/// @ai:intent Annotations constrained by the `@api-version` of their docblock
pub trait HasVersion {
    fn version(&self) -> Option<&VersionConstraint>;

    fn applies_to(&self, version: &Version) -> bool {
        self.version().map_or(true, |c| c.matches(version))
    }
}

/// @ai:intent Annotations gated behind a capability
pub trait HasCapability {
    fn capability(&self) -> Option<&str>;

    fn visible_to(&self, capabilities: &[String]) -> bool {
        self.capability()
            .map_or(true, |c| capabilities.iter().any(|have| have == c))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LabelAnnotation {
    pub text: String,
    #[serde(skip)]
    pub source: AnnotationSource,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DescriptionAnnotation {
    pub text: String,
    #[serde(skip)]
    pub source: AnnotationSource,
}

/// @ai:intent `@api-param[:public|:private] {name} (type, ...) - description`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ParamAnnotation {
    #[serde(flatten)]
    pub mson: Mson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionConstraint>,
    #[serde(skip)]
    pub source: AnnotationSource,
}

/// @ai:intent `@api-data name (type, ...) - description` inside a representation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DataAnnotation {
    #[serde(flatten)]
    pub mson: Mson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionConstraint>,
    #[serde(skip)]
    pub source: AnnotationSource,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldAnnotation {
    pub name: String,
    #[serde(skip)]
    pub source: AnnotationSource,
}

/// @ai:intent `@api-type` together with its `@api-subtype` and `@api-options`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TypeAnnotation {
    #[serde(flatten)]
    pub type_spec: TypeSpec,
    #[serde(skip)]
    pub source: AnnotationSource,
}

impl TypeAnnotation {
    pub fn type_name(&self) -> &'static str {
        self.type_spec.data_type.name()
    }

    pub fn subtype(&self) -> Option<&str> {
        self.type_spec.subtype.as_deref()
    }

    pub fn options(&self) -> &[String] {
        &self.type_spec.options
    }

    pub fn requires_subtype(&self) -> bool {
        self.type_spec.data_type.requires_subtype()
    }

    pub fn requires_options(&self) -> bool {
        self.type_spec.data_type.requires_options()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VersionAnnotation {
    pub constraint: VersionConstraint,
    #[serde(skip)]
    pub source: AnnotationSource,
}

/// @ai:intent `@api-uri[:public|:private][:alias] {Group} /path`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UriAnnotation {
    pub group: String,
    pub path: String,
    pub alias: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip)]
    pub source: AnnotationSource,
}

impl UriAnnotation {
    /// @ai:intent Path with `+name` segments rewritten as `{name}` placeholders
    /// @ai:example ("/movies/+id") -> "/movies/{id}"
    pub fn clean_path(&self) -> String {
        self.path
            .split('/')
            .map(|segment| match segment.strip_prefix('+') {
                Some(name) => format!("{{{}}}", name),
                None => segment.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScopeAnnotation {
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip)]
    pub source: AnnotationSource,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CapabilityAnnotation {
    pub capability: String,
    #[serde(skip)]
    pub source: AnnotationSource,
}

/// @ai:intent `@api-throws[:vis] {code} \ErrorRepresentation (\ErrorCode::NAME) - description`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ThrowsAnnotation {
    pub http_code: u16,
    pub representation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub description: String,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionConstraint>,
    #[serde(skip)]
    pub source: AnnotationSource,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContentTypeAnnotation {
    pub content_type: String,
    #[serde(skip)]
    pub source: AnnotationSource,
}

/// @ai:intent The kind of response an action returns
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Collection,
    Object,
    Directory,
    Ok,
    Created,
    Accepted,
    Added,
    Updated,
    Deleted,
    NotModified,
}

impl ReturnType {
    /// @ai:intent Map a `{type}` token to a return type
    /// @ai:effects pure
    pub fn from_token(token: &str) -> Option<Self> {
        let return_type = match token {
            "collection" => ReturnType::Collection,
            "object" => ReturnType::Object,
            "directory" => ReturnType::Directory,
            "ok" => ReturnType::Ok,
            "created" => ReturnType::Created,
            "accepted" => ReturnType::Accepted,
            "added" => ReturnType::Added,
            "updated" => ReturnType::Updated,
            "deleted" => ReturnType::Deleted,
            "notmodified" => ReturnType::NotModified,
            _ => return None,
        };
        Some(return_type)
    }

    /// @ai:intent HTTP status code the return type is sent with
    pub fn http_code(&self) -> u16 {
        match self {
            ReturnType::Collection | ReturnType::Object | ReturnType::Directory | ReturnType::Ok => {
                200
            }
            ReturnType::Created => 201,
            ReturnType::Accepted => 202,
            ReturnType::Added | ReturnType::Updated | ReturnType::Deleted => 204,
            ReturnType::NotModified => 304,
        }
    }

    pub fn requires_representation(&self) -> bool {
        matches!(self, ReturnType::Collection | ReturnType::Object)
    }
}

/// @ai:intent `@api-return[:vis] {type} \Representation - description`
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReturnAnnotation {
    pub return_type: ReturnType,
    pub http_code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionConstraint>,
    #[serde(skip)]
    pub source: AnnotationSource,
}

/// @ai:intent `@api-see \Class::method prefix`, a named link to another representation's fields
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SeeAnnotation {
    pub class: String,
    pub method: String,
    pub prefix: String,
    #[serde(skip)]
    pub source: AnnotationSource,
}

/// @ai:intent Tagged union over every annotation kind
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "annotation", rename_all = "camelCase")]
pub enum Annotation {
    Label(LabelAnnotation),
    Description(DescriptionAnnotation),
    Param(ParamAnnotation),
    Data(DataAnnotation),
    Field(FieldAnnotation),
    Type(TypeAnnotation),
    Version(VersionAnnotation),
    Uri(UriAnnotation),
    Scope(ScopeAnnotation),
    Capability(CapabilityAnnotation),
    Throws(ThrowsAnnotation),
    ContentType(ContentTypeAnnotation),
    Return(ReturnAnnotation),
    See(SeeAnnotation),
}

impl Annotation {
    /// @ai:intent The tag kind this annotation was parsed from
    /// @ai:effects pure
    pub fn kind(&self) -> TagKind {
        match self {
            Annotation::Label(_) => TagKind::Label,
            Annotation::Description(_) => TagKind::Description,
            Annotation::Param(_) => TagKind::Param,
            Annotation::Data(_) => TagKind::Data,
            Annotation::Field(_) => TagKind::Field,
            Annotation::Type(_) => TagKind::Type,
            Annotation::Version(_) => TagKind::Version,
            Annotation::Uri(_) => TagKind::Uri,
            Annotation::Scope(_) => TagKind::Scope,
            Annotation::Capability(_) => TagKind::Capability,
            Annotation::Throws(_) => TagKind::Throws,
            Annotation::ContentType(_) => TagKind::ContentType,
            Annotation::Return(_) => TagKind::Return,
            Annotation::See(_) => TagKind::See,
        }
    }

    pub fn source(&self) -> &AnnotationSource {
        match self {
            Annotation::Label(a) => &a.source,
            Annotation::Description(a) => &a.source,
            Annotation::Param(a) => &a.source,
            Annotation::Data(a) => &a.source,
            Annotation::Field(a) => &a.source,
            Annotation::Type(a) => &a.source,
            Annotation::Version(a) => &a.source,
            Annotation::Uri(a) => &a.source,
            Annotation::Scope(a) => &a.source,
            Annotation::Capability(a) => &a.source,
            Annotation::Throws(a) => &a.source,
            Annotation::ContentType(a) => &a.source,
            Annotation::Return(a) => &a.source,
            Annotation::See(a) => &a.source,
        }
    }

    /// @ai:intent Explicit visibility decorator, for the kinds that accept one
    pub fn visibility(&self) -> Option<Visibility> {
        match self {
            Annotation::Param(a) => a.visibility(),
            Annotation::Uri(a) => a.visibility(),
            Annotation::Scope(a) => a.visibility(),
            Annotation::Throws(a) => a.visibility(),
            Annotation::Return(a) => a.visibility(),
            _ => None,
        }
    }
}

/// @ai:intent Typed access to one annotation variant
pub trait FromAnnotation: Sized {
    const KIND: TagKind;

    fn from_annotation(annotation: Annotation) -> Option<Self>;
}

macro_rules! from_annotation {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(
            impl FromAnnotation for $ty {
                const KIND: TagKind = TagKind::$variant;

                fn from_annotation(annotation: Annotation) -> Option<Self> {
                    match annotation {
                        Annotation::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

from_annotation! {
    LabelAnnotation => Label,
    DescriptionAnnotation => Description,
    ParamAnnotation => Param,
    DataAnnotation => Data,
    FieldAnnotation => Field,
    TypeAnnotation => Type,
    VersionAnnotation => Version,
    UriAnnotation => Uri,
    ScopeAnnotation => Scope,
    CapabilityAnnotation => Capability,
    ThrowsAnnotation => Throws,
    ContentTypeAnnotation => ContentType,
    ReturnAnnotation => Return,
    SeeAnnotation => See,
}

impl HasVisibility for ParamAnnotation {
    fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }
}

impl HasVisibility for UriAnnotation {
    fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }
}

impl HasVisibility for ScopeAnnotation {
    fn visibility(&self) -> Option<Visibility> {
        self.visibility
    }
}

impl HasVisibility for ThrowsAnnotation {
    fn visibility(&self) -> Option<Visibility> {
        Some(self.visibility)
    }
}

impl HasVisibility for ReturnAnnotation {
    fn visibility(&self) -> Option<Visibility> {
        Some(self.visibility)
    }
}

impl HasVersion for ParamAnnotation {
    fn version(&self) -> Option<&VersionConstraint> {
        self.version.as_ref()
    }
}

impl HasVersion for DataAnnotation {
    fn version(&self) -> Option<&VersionConstraint> {
        self.version.as_ref()
    }
}

impl HasVersion for ThrowsAnnotation {
    fn version(&self) -> Option<&VersionConstraint> {
        self.version.as_ref()
    }
}

impl HasVersion for ReturnAnnotation {
    fn version(&self) -> Option<&VersionConstraint> {
        self.version.as_ref()
    }
}

impl HasCapability for ParamAnnotation {
    fn capability(&self) -> Option<&str> {
        self.mson.capability.as_deref()
    }
}

impl HasCapability for DataAnnotation {
    fn capability(&self) -> Option<&str> {
        self.mson.capability.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> AnnotationSource {
        AnnotationSource {
            docblock: Docblock::new("/** @api-uri {Movies} /movies/+id */", "Movie.php", 1),
            line: 1,
        }
    }

    #[test]
    fn test_clean_path() {
        let uri = UriAnnotation {
            group: "Movies".to_string(),
            path: "/movies/+id/videos/+video_id".to_string(),
            alias: false,
            visibility: None,
            source: source(),
        };

        assert_eq!(uri.clean_path(), "/movies/{id}/videos/{video_id}");
        assert!(uri.is_public());
    }

    #[test]
    fn test_return_type_codes() {
        assert_eq!(ReturnType::from_token("created").unwrap().http_code(), 201);
        assert_eq!(ReturnType::from_token("notmodified").unwrap().http_code(), 304);
        assert!(ReturnType::Collection.requires_representation());
        assert!(!ReturnType::Deleted.requires_representation());
        assert_eq!(ReturnType::from_token("teapot"), None);
    }

    #[test]
    fn test_version_gating() {
        let uri_source = source();
        let throws = ThrowsAnnotation {
            http_code: 404,
            representation: "App\\Error".to_string(),
            error_code: None,
            description: "If the movie could not be found.".to_string(),
            visibility: Visibility::Private,
            version: Some(VersionConstraint::parse(">=1.1").unwrap()),
            source: uri_source,
        };

        assert!(!throws.is_public());
        assert!(throws.applies_to(&Version::parse("1.2").unwrap()));
        assert!(!throws.applies_to(&Version::parse("1.0").unwrap()));
    }
}
