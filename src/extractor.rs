//! @ai:module:intent Parse `@api-*` tags of a docblock into typed, validated annotations
//! @ai:module:layer application
//! @ai:module:public_api Context, parse_annotations, parse_all, parse_optional, parse_required, docblock_version
//! @ai:module:depends_on annotation, docblock, mson, types, version, config, codebase, error
//! @ai:module:stateless true

use crate::annotation::{
    Annotation, AnnotationSource, CapabilityAnnotation, ContentTypeAnnotation,
    DataAnnotation, DescriptionAnnotation, FieldAnnotation, FromAnnotation, LabelAnnotation,
    ParamAnnotation, ReturnAnnotation, ReturnType, ScopeAnnotation, SeeAnnotation,
    ThrowsAnnotation, TypeAnnotation, UriAnnotation, VersionAnnotation, Visibility,
};
use crate::codebase::{normalize_class, Codebase};
use crate::config::Config;
use crate::docblock::{Docblock, Tag, TagKind};
use crate::error::{AnnotationError, ErrorKind, ParseResult};
use crate::mson::{Mson, MsonOptions};
use crate::types::TypeSpec;
use crate::version::VersionConstraint;

/// @ai:intent Read-only collaborators every annotation parse may consult
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub config: &'a Config,
    pub codebase: &'a Codebase,
}

impl<'a> Context<'a> {
    pub fn new(config: &'a Config, codebase: &'a Codebase) -> Self {
        Self { config, codebase }
    }
}

/// Which decorators a kind accepts, and whether a visibility decorator is mandatory.
struct DecoratorRules {
    visibility: bool,
    alias: bool,
    requires_visibility: bool,
}

fn decorator_rules(kind: TagKind) -> DecoratorRules {
    let (visibility, alias, requires_visibility) = match kind {
        TagKind::Uri => (true, true, false),
        TagKind::Param | TagKind::Scope => (true, false, false),
        TagKind::Throws | TagKind::Return => (true, false, true),
        _ => (false, false, false),
    };
    DecoratorRules {
        visibility,
        alias,
        requires_visibility,
    }
}

/// Decorators after validation.
struct Decorators {
    visibility: Option<Visibility>,
    alias: bool,
}

/// @ai:intent Validate the decorators of a tag against what its kind accepts
/// @ai:post Err(UnsupportedDecorator) for unknown or repeated tokens; Err(MissingVisibilityDecorator) when one is required
/// @ai:effects pure
fn parse_decorators(tag: &Tag) -> ParseResult<Decorators> {
    let rules = decorator_rules(tag.kind);
    let mut decorators = Decorators {
        visibility: None,
        alias: false,
    };

    for decorator in &tag.decorators {
        let unsupported = || {
            AnnotationError::new(ErrorKind::UnsupportedDecorator {
                annotation: tag.kind.name().to_string(),
                decorator: decorator.clone(),
            })
        };

        match (Visibility::from_decorator(decorator), decorator.as_str()) {
            (Some(visibility), _) if rules.visibility && decorators.visibility.is_none() => {
                decorators.visibility = Some(visibility)
            }
            (None, "alias") if rules.alias && !decorators.alias => decorators.alias = true,
            _ => return Err(unsupported()),
        }
    }

    if rules.requires_visibility && decorators.visibility.is_none() {
        return Err(AnnotationError::new(ErrorKind::MissingVisibilityDecorator {
            annotation: tag.kind.name().to_string(),
        }));
    }

    Ok(decorators)
}

fn missing(kind: TagKind, segment: &str) -> AnnotationError {
    AnnotationError::new(ErrorKind::MissingRequiredField {
        annotation: kind.name().to_string(),
        segment: segment.to_string(),
    })
}

fn required_text(tag: &Tag, segment: &str) -> ParseResult<String> {
    if tag.content.is_empty() {
        return Err(missing(tag.kind, segment));
    }
    Ok(tag.content.clone())
}

/// @ai:intent Split `{inner} rest` into its braced part and the remainder
/// @ai:effects pure
fn split_braced(content: &str) -> Option<(&str, &str)> {
    let inner = content.trim_start().strip_prefix('{')?;
    let end = inner.find('}')?;
    Some((inner[..end].trim(), inner[end + 1..].trim()))
}

/// @ai:intent Split off the first whitespace-delimited word
fn split_word(content: &str) -> (&str, &str) {
    let content = content.trim();
    match content.find(char::is_whitespace) {
        Some(idx) => (&content[..idx], content[idx..].trim()),
        None => (content, ""),
    }
}

/// @ai:intent Split a trailing `- description`
fn split_description(content: &str) -> (&str, Option<&str>) {
    let content = content.trim();
    if let Some(rest) = content.strip_prefix('-') {
        return ("", Some(rest.trim()).filter(|d| !d.is_empty()));
    }
    match content.find(" - ") {
        Some(idx) => (
            content[..idx].trim(),
            Some(content[idx + 3..].trim()).filter(|d| !d.is_empty()),
        ),
        None => (content, None),
    }
}

fn check_capability(capability: &str, ctx: &Context) -> ParseResult<()> {
    if !ctx.config.has_capability(capability) {
        return Err(AnnotationError::new(ErrorKind::InvalidCapability {
            capability: capability.to_string(),
        }));
    }
    Ok(())
}

/// @ai:intent Resolve a returned representation against the codebase and configuration
/// @ai:post Err(UncallableRepresentation) when it cannot be resolved, Err(UnconfiguredRepresentation) when it is not configured
pub(crate) fn resolve_representation(reference: &str, ctx: &Context) -> ParseResult<String> {
    let class = normalize_class(reference).to_string();

    let Some(configured) = ctx.config.representation(&class) else {
        if ctx.codebase.class(&class).is_some() {
            return Err(AnnotationError::new(
                ErrorKind::UnconfiguredRepresentation {
                    representation: class,
                },
            ));
        }
        return Err(AnnotationError::new(ErrorKind::UncallableRepresentation {
            representation: class,
            method: "create".to_string(),
        }));
    };

    if !ctx.codebase.is_callable(&class, &configured.method) {
        return Err(AnnotationError::new(ErrorKind::UncallableRepresentation {
            representation: class,
            method: configured.method.clone(),
        }));
    }

    Ok(class)
}

/// @ai:intent Resolve an error representation and its error code
fn resolve_error_representation(
    reference: &str,
    error_code: Option<&str>,
    ctx: &Context,
) -> ParseResult<(String, Option<String>)> {
    let class = normalize_class(reference).to_string();

    let Some(configured) = ctx.config.error_representation(&class) else {
        if ctx.codebase.class(&class).is_some() {
            return Err(AnnotationError::new(
                ErrorKind::UnknownErrorRepresentation {
                    representation: class,
                },
            ));
        }
        return Err(AnnotationError::new(ErrorKind::UncallableRepresentation {
            representation: class,
            method: "create".to_string(),
        }));
    };

    if !ctx.codebase.is_callable(&class, &configured.method) {
        return Err(AnnotationError::new(ErrorKind::UncallableRepresentation {
            representation: class,
            method: configured.method.clone(),
        }));
    }

    let error_code = match error_code {
        Some(code) => {
            let code = code.trim().trim_start_matches('\\').to_string();
            let resolvable = code
                .split_once("::")
                .map(|(owner, constant)| ctx.codebase.has_constant(owner, constant))
                .unwrap_or(false);
            if !resolvable {
                return Err(AnnotationError::new(ErrorKind::UncallableErrorCode {
                    error_code: code,
                }));
            }
            Some(code)
        }
        None if configured.needs_error_code => {
            return Err(AnnotationError::new(ErrorKind::MissingErrorCode {
                representation: class,
            }))
        }
        None => None,
    };

    Ok((class, error_code))
}

/// @ai:intent Parse one tag into its annotation
/// @ai:pre tag was lexed from docblock
/// @ai:effects pure
fn parse_tag(tag: &Tag, docblock: &Docblock, ctx: &Context) -> ParseResult<Annotation> {
    let decorators = parse_decorators(tag)?;
    let source = AnnotationSource {
        docblock: docblock.clone(),
        line: tag.line,
    };

    let annotation = match tag.kind {
        TagKind::Label => Annotation::Label(LabelAnnotation {
            text: required_text(tag, "label")?,
            source,
        }),
        TagKind::Description => Annotation::Description(DescriptionAnnotation {
            text: required_text(tag, "description")?,
            source,
        }),
        TagKind::ContentType => Annotation::ContentType(ContentTypeAnnotation {
            content_type: required_text(tag, "content type")?,
            source,
        }),
        TagKind::Field => Annotation::Field(FieldAnnotation {
            name: required_text(tag, "field name")?,
            source,
        }),
        TagKind::Version => Annotation::Version(VersionAnnotation {
            constraint: VersionConstraint::parse(&required_text(tag, "version")?)?,
            source,
        }),
        TagKind::Capability => {
            let capability = required_text(tag, "capability")?;
            check_capability(&capability, ctx)?;
            Annotation::Capability(CapabilityAnnotation { capability, source })
        }
        TagKind::Scope => {
            let (scope, rest) = split_word(&tag.content);
            if scope.is_empty() {
                return Err(missing(tag.kind, "scope"));
            }
            if !ctx.config.has_scope(scope) {
                return Err(AnnotationError::new(ErrorKind::InvalidScope {
                    scope: scope.to_string(),
                }));
            }
            let (_, description) = split_description(rest);
            Annotation::Scope(ScopeAnnotation {
                scope: scope.to_string(),
                description: description.map(str::to_string),
                visibility: decorators.visibility,
                source,
            })
        }
        TagKind::Uri => {
            let (group, path) = split_braced(&tag.content).ok_or_else(|| missing(tag.kind, "group"))?;
            if group.is_empty() {
                return Err(missing(tag.kind, "group"));
            }
            let (path, _) = split_word(path);
            if !path.starts_with('/') {
                return Err(missing(tag.kind, "path"));
            }
            Annotation::Uri(UriAnnotation {
                group: group.to_string(),
                path: path.to_string(),
                alias: decorators.alias,
                visibility: decorators.visibility,
                source,
            })
        }
        TagKind::Param => {
            let mson = Mson::parse(&tag.content, MsonOptions::default())?;
            if let Some(capability) = &mson.capability {
                check_capability(capability, ctx)?;
            }
            Annotation::Param(ParamAnnotation {
                mson,
                visibility: decorators.visibility,
                version: None,
                source,
            })
        }
        TagKind::Data => {
            let mson = Mson::parse(&tag.content, MsonOptions::default())?;
            if let Some(capability) = &mson.capability {
                check_capability(capability, ctx)?;
            }
            Annotation::Data(DataAnnotation {
                mson,
                version: None,
                source,
            })
        }
        TagKind::Type => Annotation::Type(parse_type(tag, docblock, source)?),
        TagKind::Throws => Annotation::Throws(parse_throws(tag, &decorators, ctx, source)?),
        TagKind::Return => Annotation::Return(parse_return(tag, &decorators, ctx, source)?),
        TagKind::See => {
            let (reference, prefix) = split_word(&tag.content);
            let (class, method) = reference
                .split_once("::")
                .ok_or_else(|| missing(tag.kind, "method reference"))?;
            let class = normalize_class(class);
            if prefix.is_empty() {
                return Err(missing(tag.kind, "field path"));
            }
            if !ctx.codebase.is_callable(class, method) {
                return Err(AnnotationError::new(ErrorKind::UncallableRepresentation {
                    representation: class.to_string(),
                    method: method.to_string(),
                }));
            }
            Annotation::See(SeeAnnotation {
                class: class.to_string(),
                method: method.to_string(),
                prefix: prefix.to_string(),
                source,
            })
        }
        TagKind::Subtype | TagKind::Options => {
            unreachable!("@api-{} is folded into @api-type", tag.kind.name())
        }
    };

    Ok(annotation)
}

/// @ai:intent Combine `@api-type` with the docblock's `@api-subtype` and `@api-options`
/// @ai:effects pure
fn parse_type(tag: &Tag, docblock: &Docblock, source: AnnotationSource) -> ParseResult<TypeAnnotation> {
    let content = required_text(tag, "type")?;

    // `@api-type enum / @api-options [a|b]` on a single line.
    let (type_token, inline_options) = match content.split_once("@api-options") {
        Some((head, options)) => (
            head.trim().trim_end_matches('/').trim().to_string(),
            Some(options.trim().to_string()),
        ),
        None => (content, None),
    };

    let subtype = folded_tag(docblock, TagKind::Subtype)?;
    let options = match inline_options {
        Some(options) => Some(options),
        None => folded_tag(docblock, TagKind::Options)?,
    };

    let type_spec = TypeSpec::new(&type_token, subtype.as_deref(), options.as_deref())?;
    Ok(TypeAnnotation { type_spec, source })
}

/// @ai:intent Content of the first `@api-subtype` or `@api-options` tag, which accept no decorators
fn folded_tag(docblock: &Docblock, kind: TagKind) -> ParseResult<Option<String>> {
    let Some(tag) = docblock.tags_of(kind).into_iter().next() else {
        return Ok(None);
    };
    parse_decorators(&tag).map_err(|e| {
        e.with_annotation(tag.kind.to_string())
            .at_line(docblock, tag.line)
    })?;
    Ok(Some(tag.content))
}

fn parse_throws(
    tag: &Tag,
    decorators: &Decorators,
    ctx: &Context,
    source: AnnotationSource,
) -> ParseResult<ThrowsAnnotation> {
    let (code, rest) = split_braced(&tag.content).ok_or_else(|| missing(tag.kind, "http code"))?;
    let http_code = code
        .parse::<u16>()
        .ok()
        .filter(|c| (400..600).contains(c))
        .ok_or_else(|| {
            AnnotationError::new(ErrorKind::InvalidHttpCode {
                code: code.to_string(),
            })
        })?;

    let (head, description) = split_description(rest);
    let description = description.ok_or_else(|| missing(tag.kind, "description"))?;

    let (reference, rest) = split_word(head);
    if reference.is_empty() {
        return Err(missing(tag.kind, "representation"));
    }
    let error_code = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let (representation, error_code) = resolve_error_representation(reference, error_code, ctx)?;

    Ok(ThrowsAnnotation {
        http_code,
        representation,
        error_code,
        description: description.to_string(),
        visibility: decorators
            .visibility
            .unwrap_or_else(|| unreachable!("@api-throws visibility is validated")),
        version: None,
        source,
    })
}

fn parse_return(
    tag: &Tag,
    decorators: &Decorators,
    ctx: &Context,
    source: AnnotationSource,
) -> ParseResult<ReturnAnnotation> {
    let (token, rest) = split_braced(&tag.content).ok_or_else(|| missing(tag.kind, "return type"))?;
    let return_type = ReturnType::from_token(token).ok_or_else(|| {
        AnnotationError::new(ErrorKind::UnknownReturnType {
            return_type: token.to_string(),
        })
    })?;

    let (reference, description) = split_description(rest);
    let reference = Some(reference).filter(|r| !r.is_empty());

    let representation = match reference {
        Some(reference) => Some(resolve_representation(reference, ctx)?),
        None if return_type.requires_representation() => {
            return Err(missing(tag.kind, "representation"))
        }
        None => None,
    };

    Ok(ReturnAnnotation {
        return_type,
        http_code: return_type.http_code(),
        representation,
        description: description.map(str::to_string),
        visibility: decorators
            .visibility
            .unwrap_or_else(|| unreachable!("@api-return visibility is validated")),
        version: None,
        source,
    })
}

/// @ai:intent Parse every annotation of one kind in a docblock
/// @ai:post errors carry the annotation kind, the docblock text and the offending line
/// @ai:effects pure
pub fn parse_annotations(
    docblock: &Docblock,
    kind: TagKind,
    ctx: &Context,
) -> ParseResult<Vec<Annotation>> {
    check_recognized(docblock)?;

    // Subtypes and options only exist as part of a type.
    if matches!(kind, TagKind::Subtype | TagKind::Options) {
        return Ok(Vec::new());
    }

    docblock
        .tags_of(kind)
        .iter()
        .map(|tag| {
            parse_tag(tag, docblock, ctx).map_err(|e| {
                e.with_annotation(tag.kind.to_string())
                    .at_line(docblock, tag.line)
            })
        })
        .collect()
}

/// @ai:intent Reject `@api-` lines the lexer could not read, instead of silently dropping them
fn check_recognized(docblock: &Docblock) -> ParseResult<()> {
    match docblock.unrecognized().into_iter().next() {
        Some((line, content)) => Err(AnnotationError::new(ErrorKind::UnrecognizedAnnotation {
            content,
        })
        .at_line(docblock, line)),
        None => Ok(()),
    }
}

/// @ai:intent Parse every annotation of a typed kind
pub fn parse_all<T: FromAnnotation>(docblock: &Docblock, ctx: &Context) -> ParseResult<Vec<T>> {
    Ok(parse_annotations(docblock, T::KIND, ctx)?
        .into_iter()
        .map(|a| {
            T::from_annotation(a)
                .unwrap_or_else(|| unreachable!("parsed annotation matches its kind"))
        })
        .collect())
}

/// @ai:intent Parse at most one annotation of a typed kind
/// @ai:post Err(MultipleAnnotations) when more than one is present
pub fn parse_optional<T: FromAnnotation>(docblock: &Docblock, ctx: &Context) -> ParseResult<Option<T>> {
    let mut all = parse_all::<T>(docblock, ctx)?;
    if all.len() > 1 {
        let tags = docblock.tags_of(T::KIND);
        return Err(AnnotationError::new(ErrorKind::MultipleAnnotations {
            annotation: T::KIND.name().to_string(),
        })
        .with_annotation(T::KIND.to_string())
        .at_line(docblock, tags[1].line));
    }
    Ok(all.pop())
}

/// @ai:intent Parse exactly one annotation of a typed kind
/// @ai:post Err(RequiredAnnotationMissing) when absent, Err(MultipleAnnotations) when repeated
pub fn parse_required<T: FromAnnotation>(docblock: &Docblock, ctx: &Context) -> ParseResult<T> {
    parse_optional::<T>(docblock, ctx)?.ok_or_else(|| {
        AnnotationError::new(ErrorKind::RequiredAnnotationMissing {
            annotation: T::KIND.name().to_string(),
        })
        .with_annotation(T::KIND.to_string())
        .with_docblock(docblock)
    })
}

/// @ai:intent The `@api-version` constraint that applies to a whole docblock
pub fn docblock_version(docblock: &Docblock, ctx: &Context) -> ParseResult<Option<VersionConstraint>> {
    Ok(parse_optional::<VersionAnnotation>(docblock, ctx)?.map(|v| v.constraint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ErrorRepresentationConfig, RepresentationConfig};
    use crate::language::Language;
    use crate::types::DataType;
    use pretty_assertions::assert_eq;

    const REPRESENTATIONS: &str = r#"<?php
namespace App;

class Movie
{
    public function create() {}
}

class Error
{
    public function create() {}
}

class Unlisted
{
    public function create() {}
}

class ErrorCode
{
    const NOT_FOUND = 1404;
}
"#;

    fn fixtures() -> (Config, Codebase) {
        let config = Config {
            capabilities: vec!["NONE".to_string()],
            scopes: vec!["public".to_string(), "edit".to_string()],
            representations: vec![RepresentationConfig {
                class: "\\App\\Movie".to_string(),
                method: "create".to_string(),
            }],
            error_representations: vec![ErrorRepresentationConfig {
                class: "\\App\\Error".to_string(),
                method: "create".to_string(),
                needs_error_code: true,
            }],
            ..Default::default()
        };
        let codebase = Codebase::from_sources([("App.php", REPRESENTATIONS, Language::Php)]);
        (config, codebase)
    }

    fn block(lines: &[&str]) -> Docblock {
        let mut raw = String::from("/**\n");
        for line in lines {
            raw.push_str(" * ");
            raw.push_str(line);
            raw.push('\n');
        }
        raw.push_str(" */");
        Docblock::new(raw, "Movie.php", 20)
    }

    fn error_kind<T: std::fmt::Debug>(result: ParseResult<T>) -> ErrorKind {
        result.unwrap_err().kind
    }

    #[test]
    fn test_error_carries_location_and_annotation() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);
        let docblock = block(&["@api-label Movies", "@api-capability BOGUS"]);

        let err = parse_all::<CapabilityAnnotation>(&docblock, &ctx).unwrap_err();

        assert_eq!(
            err.kind,
            ErrorKind::InvalidCapability {
                capability: "BOGUS".to_string()
            }
        );
        assert_eq!(err.annotation.as_deref(), Some("@api-capability"));
        assert_eq!(err.location.as_ref().unwrap().start_line, 22);
        assert_eq!(err.docblock.as_deref(), Some(docblock.raw()));
    }

    #[test]
    fn test_required_and_multiple() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let none = block(&["@api-description Nothing here"]);
        assert_eq!(
            error_kind(parse_required::<LabelAnnotation>(&none, &ctx)),
            ErrorKind::RequiredAnnotationMissing {
                annotation: "label".to_string()
            }
        );

        let two = block(&["@api-label One", "@api-label Two"]);
        let err = parse_required::<LabelAnnotation>(&two, &ctx).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MultipleAnnotations {
                annotation: "label".to_string()
            }
        );
        assert_eq!(err.location.unwrap().start_line, 22);
    }

    #[test]
    fn test_decorators() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let unsupported = block(&["@api-label:public Movies"]);
        assert_eq!(
            error_kind(parse_all::<LabelAnnotation>(&unsupported, &ctx)),
            ErrorKind::UnsupportedDecorator {
                annotation: "label".to_string(),
                decorator: "public".to_string(),
            }
        );

        let bogus = block(&["@api-uri:secret {Movies} /movies"]);
        assert!(matches!(
            error_kind(parse_all::<UriAnnotation>(&bogus, &ctx)),
            ErrorKind::UnsupportedDecorator { .. }
        ));

        let missing = block(&["@api-return {object} \\App\\Movie"]);
        assert_eq!(
            error_kind(parse_all::<ReturnAnnotation>(&missing, &ctx)),
            ErrorKind::MissingVisibilityDecorator {
                annotation: "return".to_string()
            }
        );
    }

    #[test]
    fn test_uri_alias() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);
        let docblock = block(&[
            "@api-uri:public {Movies} /movies/+id",
            "@api-uri:private:alias {Movies} /films/+id",
        ]);

        let uris = parse_all::<UriAnnotation>(&docblock, &ctx).unwrap();
        assert_eq!(uris.len(), 2);
        assert!(!uris[0].alias);
        assert_eq!(uris[0].group, "Movies");
        assert!(uris[1].alias);
        assert_eq!(uris[1].visibility, Some(Visibility::Private));
    }

    #[test]
    fn test_param() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);
        let docblock = block(&["@api-param:private {rating} (number, optional, capability:NONE) - Rating"]);

        let params = parse_all::<ParamAnnotation>(&docblock, &ctx).unwrap();
        assert_eq!(params[0].mson.name, "rating");
        assert_eq!(params[0].mson.type_spec.data_type, DataType::Number);
        assert_eq!(params[0].visibility, Some(Visibility::Private));
    }

    #[test]
    fn test_scope_validation() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let valid = block(&["@api-scope:private edit - Requires edit access"]);
        let scopes = parse_all::<ScopeAnnotation>(&valid, &ctx).unwrap();
        assert_eq!(scopes[0].scope, "edit");
        assert_eq!(scopes[0].description.as_deref(), Some("Requires edit access"));

        let invalid = block(&["@api-scope delete"]);
        assert_eq!(
            error_kind(parse_all::<ScopeAnnotation>(&invalid, &ctx)),
            ErrorKind::InvalidScope {
                scope: "delete".to_string()
            }
        );
    }

    #[test]
    fn test_throws_resolution() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let valid = block(&[
            "@api-throws:public {404} \\App\\Error (\\App\\ErrorCode::NOT_FOUND) - If the movie could not be found.",
        ]);
        let throws = parse_all::<ThrowsAnnotation>(&valid, &ctx).unwrap();
        assert_eq!(throws[0].http_code, 404);
        assert_eq!(throws[0].representation, "App\\Error");
        assert_eq!(throws[0].error_code.as_deref(), Some("App\\ErrorCode::NOT_FOUND"));

        let cases = [
            ("@api-throws:public {404} \\App\\Error - No code.", "missing_error_code"),
            (
                "@api-throws:public {404} \\App\\Error (\\App\\ErrorCode::GONE) - Bad code.",
                "uncallable_error_code",
            ),
            (
                "@api-throws:public {404} \\App\\Unlisted (\\App\\ErrorCode::NOT_FOUND) - Unlisted.",
                "unknown_error_representation",
            ),
            (
                "@api-throws:public {404} \\App\\Nowhere (\\App\\ErrorCode::NOT_FOUND) - Missing.",
                "uncallable_representation",
            ),
            ("@api-throws:public {200} \\App\\Error - Not an error.", "invalid_http_code"),
            ("@api-throws:public {404} \\App\\Error (\\App\\ErrorCode::NOT_FOUND)", "missing_required_field"),
        ];

        for (line, expected) in cases {
            let err = parse_all::<ThrowsAnnotation>(&block(&[line]), &ctx).unwrap_err();
            let json = serde_json::to_value(&err).unwrap();
            assert_eq!(json["kind"], expected, "{}", line);
        }
    }

    #[test]
    fn test_return_resolution() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let valid = block(&["@api-return:public {collection} \\App\\Movie - A page of movies"]);
        let returns = parse_all::<ReturnAnnotation>(&valid, &ctx).unwrap();
        assert_eq!(returns[0].return_type, ReturnType::Collection);
        assert_eq!(returns[0].representation.as_deref(), Some("App\\Movie"));
        assert_eq!(returns[0].description.as_deref(), Some("A page of movies"));

        let deleted = block(&["@api-return:private {deleted}"]);
        let returns = parse_all::<ReturnAnnotation>(&deleted, &ctx).unwrap();
        assert_eq!(returns[0].http_code, 204);

        let unconfigured = block(&["@api-return:public {object} \\App\\Unlisted"]);
        assert_eq!(
            error_kind(parse_all::<ReturnAnnotation>(&unconfigured, &ctx)),
            ErrorKind::UnconfiguredRepresentation {
                representation: "App\\Unlisted".to_string()
            }
        );

        let uncallable = block(&["@api-return:public {object} \\App\\Nowhere"]);
        assert!(matches!(
            error_kind(parse_all::<ReturnAnnotation>(&uncallable, &ctx)),
            ErrorKind::UncallableRepresentation { .. }
        ));

        let unknown = block(&["@api-return:public {teapot} \\App\\Movie"]);
        assert!(matches!(
            error_kind(parse_all::<ReturnAnnotation>(&unknown, &ctx)),
            ErrorKind::UnknownReturnType { .. }
        ));

        let bare = block(&["@api-return:public {object}"]);
        assert!(matches!(
            error_kind(parse_all::<ReturnAnnotation>(&bare, &ctx)),
            ErrorKind::MissingRequiredField { .. }
        ));
    }

    #[test]
    fn test_type_with_subtype_and_options() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let docblock = block(&["@api-type array", "@api-subtype string"]);
        let parsed = parse_required::<TypeAnnotation>(&docblock, &ctx).unwrap();
        assert_eq!(parsed.type_name(), "array");
        assert_eq!(parsed.subtype(), Some("string"));
        assert!(parsed.requires_subtype());

        let inline = block(&["@api-type enum / @api-options [draft|published]"]);
        let parsed = parse_required::<TypeAnnotation>(&inline, &ctx).unwrap();
        assert_eq!(parsed.options(), ["draft".to_string(), "published".to_string()]);
        assert!(parsed.requires_options());

        let missing = block(&["@api-type array"]);
        assert!(matches!(
            error_kind(parse_required::<TypeAnnotation>(&missing, &ctx)),
            ErrorKind::MissingSubtype { .. }
        ));
    }

    #[test]
    fn test_malformed_tag_is_reported() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let docblock = block(&["@api-label Get a movie", "@api-uri:public{Movies} /movies/+id"]);
        let err = parse_all::<LabelAnnotation>(&docblock, &ctx).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnrecognizedAnnotation {
                content: "@api-uri:public{Movies} /movies/+id".to_string()
            }
        );
        assert_eq!(err.location.unwrap().start_line, 22);
    }

    #[test]
    fn test_subtype_and_options_take_no_decorators() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let subtype = block(&["@api-type array", "@api-subtype:bogus string"]);
        let err = parse_required::<TypeAnnotation>(&subtype, &ctx).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnsupportedDecorator {
                annotation: "subtype".to_string(),
                decorator: "bogus".to_string(),
            }
        );
        assert_eq!(err.annotation.as_deref(), Some("@api-subtype"));
        assert_eq!(err.location.unwrap().start_line, 22);

        let options = block(&["@api-type enum", "@api-options:public [a|b]"]);
        assert!(matches!(
            error_kind(parse_required::<TypeAnnotation>(&options, &ctx)),
            ErrorKind::UnsupportedDecorator { .. }
        ));
    }

    #[test]
    fn test_see_requires_callable_target() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let valid = block(&["@api-see \\App\\Movie::create movie"]);
        let see = parse_required::<SeeAnnotation>(&valid, &ctx).unwrap();
        assert_eq!(see.class, "App\\Movie");
        assert_eq!(see.prefix, "movie");

        let invalid = block(&["@api-see \\App\\Movie::render movie"]);
        assert_eq!(
            error_kind(parse_required::<SeeAnnotation>(&invalid, &ctx)),
            ErrorKind::UncallableRepresentation {
                representation: "App\\Movie".to_string(),
                method: "render".to_string(),
            }
        );
    }

    #[test]
    fn test_docblock_version() {
        let (config, codebase) = fixtures();
        let ctx = Context::new(&config, &codebase);

        let docblock = block(&["@api-version >=1.1"]);
        assert_eq!(
            docblock_version(&docblock, &ctx).unwrap().unwrap().to_string(),
            ">=1.1"
        );

        let bad = block(&["@api-version 1.0-1.0"]);
        let err = docblock_version(&bad, &ctx).unwrap_err();
        assert_eq!(err.validation_message(), "use `1.0` instead");
    }
}
