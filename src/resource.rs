//! @ai:module:intent Build the per-controller model: label, description and one action per HTTP method
//! @ai:module:layer application
//! @ai:module:public_api HttpMethod, ResourceDocumentation, Resource, Action
//! @ai:module:depends_on extractor, annotation, codebase, error
//! @ai:module:stateless true

use crate::annotation::{
    CapabilityAnnotation, ContentTypeAnnotation, DescriptionAnnotation, HasCapability,
    HasVersion, HasVisibility, LabelAnnotation, ParamAnnotation, ReturnAnnotation,
    ScopeAnnotation, ThrowsAnnotation, UriAnnotation, Visibility,
};
use crate::codebase::normalize_class;
use crate::docblock::{Docblock, TagKind};
use crate::error::{AnnotationError, ErrorContext, ErrorKind, ParseResult, Result};
use crate::extractor::{docblock_version, parse_all, parse_optional, parse_required, Context};
use crate::version::{Version, VersionConstraint};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// @ai:intent HTTP verbs a controller may implement as methods of the same name
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

const ALL_METHODS: [HttpMethod; 7] = [
    HttpMethod::Get,
    HttpMethod::Post,
    HttpMethod::Put,
    HttpMethod::Patch,
    HttpMethod::Delete,
    HttpMethod::Head,
    HttpMethod::Options,
];

impl HttpMethod {
    pub fn name(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// @ai:intent Resolve a verb, ignoring case
    /// @ai:example ("patch") -> Some(Patch)
    pub fn from_name(name: &str) -> Option<Self> {
        ALL_METHODS
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// @ai:intent Documentation of one HTTP action on a controller
/// @ai:invariant exactly one non-alias URI; no sub-annotation is `:public` when the action is private
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Action {
    pub method: HttpMethod,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub uri: UriAnnotation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<UriAnnotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    pub params: Vec<ParamAnnotation>,
    pub returns: Vec<ReturnAnnotation>,
    pub throws: Vec<ThrowsAnnotation>,
    pub scopes: Vec<ScopeAnnotation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub capabilities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionConstraint>,
}

impl Action {
    /// @ai:intent Parse the action documented on a controller method
    /// @ai:effects pure
    fn parse(method: HttpMethod, docblock: &Docblock, ctx: &Context) -> ParseResult<Self> {
        tracing::debug!(method = %method, location = %docblock.location(), "parsing action");

        let label = parse_required::<LabelAnnotation>(docblock, ctx)?.text;
        let description = parse_optional::<DescriptionAnnotation>(docblock, ctx)?.map(|d| d.text);
        let content_type =
            parse_optional::<ContentTypeAnnotation>(docblock, ctx)?.map(|c| c.content_type);
        let capabilities = parse_all::<CapabilityAnnotation>(docblock, ctx)?
            .into_iter()
            .map(|c| c.capability)
            .collect();
        let version = docblock_version(docblock, ctx)?;

        let (mut canonical, aliases): (Vec<UriAnnotation>, Vec<UriAnnotation>) =
            parse_all::<UriAnnotation>(docblock, ctx)?
                .into_iter()
                .partition(|uri| !uri.alias);
        if canonical.len() > 1 {
            return Err(AnnotationError::new(ErrorKind::MultipleAnnotations {
                annotation: TagKind::Uri.name().to_string(),
            })
            .with_annotation(TagKind::Uri.to_string())
            .at_line(docblock, canonical[1].source.line));
        }
        let uri = canonical.pop().ok_or_else(|| {
            AnnotationError::new(ErrorKind::RequiredAnnotationMissing {
                annotation: TagKind::Uri.name().to_string(),
            })
            .with_annotation(TagKind::Uri.to_string())
            .with_docblock(docblock)
        })?;

        let mut params = parse_all::<ParamAnnotation>(docblock, ctx)?;
        let mut returns = parse_all::<ReturnAnnotation>(docblock, ctx)?;
        let mut throws = parse_all::<ThrowsAnnotation>(docblock, ctx)?;
        let scopes = parse_all::<ScopeAnnotation>(docblock, ctx)?;

        for param in &mut params {
            param.version = version;
        }
        for ret in &mut returns {
            ret.version = version;
        }
        for error in &mut throws {
            error.version = version;
        }

        let action = Self {
            method,
            label,
            description,
            uri,
            aliases,
            content_type,
            params,
            returns,
            throws,
            scopes,
            capabilities,
            version,
        };
        action.check_visibility(docblock)?;

        Ok(action)
    }

    /// A private action must not expose any explicitly public annotation.
    fn check_visibility(&self, docblock: &Docblock) -> ParseResult<()> {
        if self.is_public() {
            return Ok(());
        }

        let explicit = |kind: TagKind, visibility: Option<Visibility>, line: usize| {
            if visibility == Some(Visibility::Public) {
                return Err(AnnotationError::new(ErrorKind::PublicDecoratorOnPrivateAction {
                    annotation: kind.name().to_string(),
                })
                .with_annotation(kind.to_string())
                .at_line(docblock, line));
            }
            Ok(())
        };

        for uri in &self.aliases {
            explicit(TagKind::Uri, uri.visibility, uri.source.line)?;
        }
        for param in &self.params {
            explicit(TagKind::Param, param.visibility, param.source.line)?;
        }
        for scope in &self.scopes {
            explicit(TagKind::Scope, scope.visibility, scope.source.line)?;
        }
        for ret in &self.returns {
            explicit(TagKind::Return, HasVisibility::visibility(ret), ret.source.line)?;
        }
        for error in &self.throws {
            explicit(TagKind::Throws, HasVisibility::visibility(error), error.source.line)?;
        }

        Ok(())
    }

    /// @ai:intent Visibility comes from the canonical URI
    pub fn is_public(&self) -> bool {
        self.uri.is_public()
    }

    pub fn applies_to(&self, version: &Version) -> bool {
        self.version.map_or(true, |c| c.matches(version))
    }

    /// @ai:intent Copy of the action limited to what a given API version exposes
    /// @ai:post None when the action itself does not apply to the version
    pub fn for_version(&self, version: &Version) -> Option<Action> {
        if !self.applies_to(version) {
            return None;
        }
        let mut action = self.clone();
        action.params.retain(|p| p.applies_to(version));
        action.returns.retain(|r| r.applies_to(version));
        action.throws.retain(|t| t.applies_to(version));
        Some(action)
    }

    /// @ai:intent Copy of the action limited to what a consumer holding `capabilities` may see
    /// @ai:post None unless the consumer holds every capability the action requires
    pub fn visible_to(&self, capabilities: &[String]) -> Option<Action> {
        if !self.capabilities.iter().all(|c| capabilities.contains(c)) {
            return None;
        }
        let mut action = self.clone();
        action.params.retain(|p| p.visible_to(capabilities));
        Some(action)
    }
}

/// @ai:intent Unparsed handle on a controller
#[derive(Debug, Clone)]
pub struct ResourceDocumentation<'a> {
    controller: String,
    ctx: Context<'a>,
}

/// @ai:intent Parsed, immutable model of one controller
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Resource {
    pub controller: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub methods: BTreeMap<HttpMethod, Action>,
}

impl<'a> ResourceDocumentation<'a> {
    pub fn new(controller: &str, ctx: Context<'a>) -> Self {
        Self {
            controller: normalize_class(controller).to_string(),
            ctx,
        }
    }

    /// @ai:intent Parse the controller docblock and every implemented HTTP action
    /// @ai:post Err(RequiredAnnotationMissing | MultipleAnnotations) unless exactly one label
    /// @ai:effects pure
    pub fn parse(&self) -> ParseResult<Resource> {
        let controller = self.controller.as_str();
        let ctx = &self.ctx;
        tracing::debug!(controller, "parsing resource");

        let docblock = ctx.codebase.docblock(controller, None)?;
        let label = parse_required::<LabelAnnotation>(docblock, ctx).in_class(controller)?;
        let description = parse_optional::<DescriptionAnnotation>(docblock, ctx)
            .in_class(controller)?
            .map(|d| d.text);

        let mut methods = BTreeMap::new();
        if let Some(class) = ctx.codebase.class(controller) {
            for source in &class.methods {
                // Only methods named exactly after a verb are actions.
                let Some(method) = HttpMethod::from_name(&source.name)
                    .filter(|m| m.name() == source.name)
                else {
                    continue;
                };

                let docblock = ctx
                    .codebase
                    .docblock(controller, Some(&source.name))?;
                let action = Action::parse(method, docblock, ctx)
                    .in_method(&source.name)
                    .in_class(controller)?;
                methods.insert(method, action);
            }
        }

        Ok(Resource {
            controller: controller.to_string(),
            label: label.text,
            description,
            methods,
        })
    }
}

impl Resource {
    pub fn get_methods(&self) -> &BTreeMap<HttpMethod, Action> {
        &self.methods
    }

    /// @ai:intent Action for a verb
    /// @ai:post Err(MethodNotImplemented) naming the upper-cased verb when absent
    pub fn get_method(&self, name: &str) -> ParseResult<&Action> {
        let not_implemented = || {
            AnnotationError::new(ErrorKind::MethodNotImplemented {
                method: name.trim().to_uppercase(),
            })
            .with_class(self.controller.as_str())
        };

        let method = HttpMethod::from_name(name).ok_or_else(not_implemented)?;
        self.methods.get(&method).ok_or_else(not_implemented)
    }

    /// @ai:intent Plain nested structure handed to renderers
    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// @ai:intent Copy limited to the actions and annotations of one API version
    pub fn for_version(&self, version: &Version) -> Resource {
        Resource {
            methods: self
                .methods
                .iter()
                .filter_map(|(m, a)| a.for_version(version).map(|a| (*m, a)))
                .collect(),
            ..self.clone()
        }
    }

    /// @ai:intent Copy limited to what a consumer holding `capabilities` may see
    pub fn visible_to(&self, capabilities: &[String]) -> Resource {
        Resource {
            methods: self
                .methods
                .iter()
                .filter_map(|(m, a)| a.visible_to(capabilities).map(|a| (*m, a)))
                .collect(),
            ..self.clone()
        }
    }

    /// @ai:intent Copy without private actions and private annotations
    pub fn public(&self) -> Resource {
        let methods = self
            .methods
            .iter()
            .filter(|(_, a)| a.is_public())
            .map(|(m, a)| {
                let mut action = a.clone();
                action.aliases.retain(|u| u.is_public());
                action.params.retain(|p| p.is_public());
                action.scopes.retain(|s| s.is_public());
                action.returns.retain(|r| r.is_public());
                action.throws.retain(|t| t.is_public());
                (*m, action)
            })
            .collect();

        Resource {
            methods,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebase::Codebase;
    use crate::config::{Config, ErrorRepresentationConfig, RepresentationConfig};
    use crate::language::Language;
    use pretty_assertions::assert_eq;

    const MOVIE: &str = r#"<?php
namespace App\Controllers;

/**
 * @api-label Movies
 * @api-description Browse and curate the movie catalog.
 */
class Movie
{
    /**
     * @api-label Get a movie
     * @api-uri:public {Movies} /movies/+id
     * @api-uri:alias {Movies} /films/+id
     * @api-contentType application/json
     * @api-param:public {id} (string) - Movie id
     * @api-return:public {object} \App\Representations\Movie
     * @api-throws:public {404} \App\Representations\Error (\App\Representations\Error::NOT_FOUND) - If the movie could not be found.
     */
    public function GET() {}

    /**
     * @api-label Update a movie
     * @api-uri:private {Movies} /movies/+id
     * @api-version >=1.1
     * @api-param:private {rating} (number, optional) - Rating
     * @api-scope:private edit
     * @api-return:private {updated} \App\Representations\Movie
     */
    public function PATCH() {}

    /**
     * @api-label Delete a movie
     * @api-uri:private {Movies} /movies/+id
     * @api-capability DELETE_CONTENT
     * @api-return:private {deleted}
     */
    public function DELETE() {}

    public function helper() {}
}
"#;

    const REPRESENTATIONS: &str = r#"<?php
namespace App\Representations;

class Movie
{
    public function create() {}
}

class Error
{
    const NOT_FOUND = 1404;

    public function create() {}
}
"#;

    fn fixtures(controller: &str) -> (Config, Codebase) {
        let config = Config {
            capabilities: vec!["DELETE_CONTENT".to_string(), "ARCHIVE_CONTENT".to_string()],
            scopes: vec!["edit".to_string()],
            controllers: vec!["\\App\\Controllers\\Movie".to_string()],
            representations: vec![RepresentationConfig {
                class: "\\App\\Representations\\Movie".to_string(),
                method: "create".to_string(),
            }],
            error_representations: vec![ErrorRepresentationConfig {
                class: "\\App\\Representations\\Error".to_string(),
                method: "create".to_string(),
                needs_error_code: true,
            }],
            ..Default::default()
        };
        let codebase = Codebase::from_sources([
            ("Controllers/Movie.php", controller, Language::Php),
            ("Representations.php", REPRESENTATIONS, Language::Php),
        ]);
        (config, codebase)
    }

    fn parse(controller: &str) -> ParseResult<Resource> {
        let (config, codebase) = fixtures(controller);
        let ctx = Context::new(&config, &codebase);
        ResourceDocumentation::new("\\App\\Controllers\\Movie", ctx).parse()
    }

    #[test]
    fn test_movie_methods() {
        let resource = parse(MOVIE).unwrap();

        assert_eq!(resource.label, "Movies");
        assert_eq!(resource.get_methods().len(), 3);
        assert_eq!(
            resource.get_methods().keys().copied().collect::<Vec<_>>(),
            vec![HttpMethod::Get, HttpMethod::Patch, HttpMethod::Delete]
        );

        let get = resource.get_method("get").unwrap();
        assert_eq!(get.uri.clean_path(), "/movies/{id}");
        assert_eq!(get.aliases.len(), 1);
        assert_eq!(get.throws[0].http_code, 404);
        assert!(get.is_public());

        let err = resource.get_method("POST").unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MethodNotImplemented {
                method: "POST".to_string()
            }
        );
        assert_eq!(err.class.as_deref(), Some("App\\Controllers\\Movie"));
    }

    #[test]
    fn test_get_methods_is_stable() {
        let resource = parse(MOVIE).unwrap();
        let first = resource.get_methods().clone();
        assert_eq!(&first, resource.get_methods());

        let value = resource.to_value().unwrap();
        assert_eq!(value["methods"].as_object().unwrap().len(), 3);
        assert_eq!(value["label"], "Movies");
    }

    #[test]
    fn test_version_applies_to_action_annotations() {
        let resource = parse(MOVIE).unwrap();
        let patch = resource.get_method("PATCH").unwrap();
        assert_eq!(patch.params[0].version.unwrap().to_string(), ">=1.1");

        let v10 = resource.for_version(&Version::parse("1.0").unwrap());
        assert!(!v10.methods.contains_key(&HttpMethod::Patch));
        let v12 = resource.for_version(&Version::parse("1.2").unwrap());
        assert!(v12.methods.contains_key(&HttpMethod::Patch));
    }

    #[test]
    fn test_capability_and_visibility_views() {
        let resource = parse(MOVIE).unwrap();

        let anonymous = resource.visible_to(&[]);
        assert!(!anonymous.methods.contains_key(&HttpMethod::Delete));

        let public = resource.public();
        assert_eq!(public.methods.len(), 1);
        assert_eq!(public.methods[&HttpMethod::Get].aliases.len(), 1);
    }

    #[test]
    fn test_action_requires_every_capability() {
        let controller = MOVIE.replace(
            "@api-capability DELETE_CONTENT",
            "@api-capability DELETE_CONTENT\n     * @api-capability ARCHIVE_CONTENT",
        );
        let resource = parse(&controller).unwrap();
        assert_eq!(
            resource.methods[&HttpMethod::Delete].capabilities,
            vec!["DELETE_CONTENT", "ARCHIVE_CONTENT"]
        );

        let partial = resource.visible_to(&["DELETE_CONTENT".to_string()]);
        assert!(!partial.methods.contains_key(&HttpMethod::Delete));

        let both = resource.visible_to(&["DELETE_CONTENT".to_string(), "ARCHIVE_CONTENT".to_string()]);
        assert!(both.methods.contains_key(&HttpMethod::Delete));
    }

    #[test]
    fn test_public_decorator_on_private_action() {
        let controller = MOVIE.replace(
            "@api-param:private {rating}",
            "@api-param:public {rating}",
        );
        let err = parse(&controller).unwrap_err();

        assert_eq!(
            err.kind,
            ErrorKind::PublicDecoratorOnPrivateAction {
                annotation: "param".to_string()
            }
        );
        assert_eq!(err.method.as_deref(), Some("PATCH"));
        assert_eq!(err.location.unwrap().start_line, 25);
    }

    #[test]
    fn test_label_is_required_once() {
        let missing = MOVIE.replace(" * @api-label Movies\n", "");
        assert!(matches!(
            parse(&missing).unwrap_err().kind,
            ErrorKind::RequiredAnnotationMissing { .. }
        ));

        let twice = MOVIE.replace("@api-label Movies", "@api-label Movies\n * @api-label Films");
        assert_eq!(
            parse(&twice).unwrap_err().kind,
            ErrorKind::MultipleAnnotations {
                annotation: "label".to_string()
            }
        );
    }

    #[test]
    fn test_single_canonical_uri() {
        let controller = MOVIE.replace("@api-uri:alias {Movies} /films/+id", "@api-uri {Movies} /films/+id");
        let err = parse(&controller).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MultipleAnnotations {
                annotation: "uri".to_string()
            }
        );
        assert_eq!(err.method.as_deref(), Some("GET"));
    }

    #[test]
    fn test_undocumented_action() {
        let controller = MOVIE.replace("public function helper() {}", "public function POST() {}");
        let err = parse(&controller).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NoAnnotations);
        assert_eq!(err.method.as_deref(), Some("POST"));

        let location = err.location.unwrap();
        assert!(location.file.ends_with("Controllers/Movie.php"));
        assert_eq!(location.start_line, 39);
    }
}
