//! @ai:module:intent Build the per-representation model: label and ordered, unique fields
//! @ai:module:layer application
//! @ai:module:public_api RepresentationDocumentation, Representation, Field, FIELD_DATA_KEY
//! @ai:module:depends_on extractor, annotation, codebase, error
//! @ai:module:stateless true

use crate::annotation::{
    CapabilityAnnotation, DataAnnotation, DescriptionAnnotation, FieldAnnotation,
    LabelAnnotation, SeeAnnotation, TypeAnnotation,
};
use crate::codebase::{normalize_class, Codebase};
use crate::docblock::{Docblock, TagKind};
use crate::error::{AnnotationError, ErrorContext, ErrorKind, ParseResult};
use crate::extractor::{
    docblock_version, parse_all, parse_optional, parse_required, resolve_representation, Context,
};
use crate::types::TypeSpec;
use crate::version::{Version, VersionConstraint};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Key holding a field's own metadata in the exploded, nested view.
pub const FIELD_DATA_KEY: &str = "__FIELD_DATA__";

/// @ai:intent One documented field of a representation
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub type_spec: TypeSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    pub required: bool,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<VersionConstraint>,
    /// Representation class linked through the type's subtype.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representation: Option<String>,
}

impl Field {
    pub fn applies_to(&self, version: &Version) -> bool {
        self.version.map_or(true, |c| c.matches(version))
    }

    pub fn visible_to(&self, capabilities: &[String]) -> bool {
        self.capability
            .as_ref()
            .map_or(true, |c| capabilities.contains(c))
    }

    fn from_data(data: DataAnnotation, capability: Option<String>, version: Option<VersionConstraint>) -> Self {
        let mson = data.mson;
        Self {
            name: mson.name,
            label: None,
            description: mson.description,
            type_spec: mson.type_spec,
            sample: mson.sample,
            required: mson.required,
            nullable: mson.nullable,
            tag: mson.tag,
            capability: mson.capability.or(capability),
            version,
            representation: None,
        }
    }
}

/// @ai:intent Unparsed handle on a representation class and its data-producing method
#[derive(Debug, Clone)]
pub struct RepresentationDocumentation<'a> {
    class: String,
    method: String,
    ctx: Context<'a>,
}

/// @ai:intent Parsed, immutable model of one representation
/// @ai:invariant field names are unique
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Representation {
    pub class: String,
    pub method: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<Field>,
}

/// Fields contributed by one docblock, before prefixing and uniqueness checks.
/// Each field carries the line of the tag that declared it.
enum Contribution {
    Fields(Vec<(Field, usize)>),
    See(SeeAnnotation),
}

/// A collected field and the docblock line it was declared on.
struct Declared<'d> {
    field: Field,
    docblock: &'d Docblock,
    line: usize,
}

impl<'a> RepresentationDocumentation<'a> {
    pub fn new(class: &str, method: &str, ctx: Context<'a>) -> Self {
        Self {
            class: normalize_class(class).to_string(),
            method: method.to_string(),
            ctx,
        }
    }

    /// @ai:intent Parse the class docblock and every field docblock in the data method
    /// @ai:post Err(DuplicateField | RestrictedFieldName | MissingFieldAnnotation | CircularReference | ...) on the first failure
    /// @ai:effects pure
    pub fn parse(&self) -> ParseResult<Representation> {
        let class = self.class.as_str();
        let ctx = &self.ctx;
        tracing::debug!(class, method = %self.method, "parsing representation");

        let docblock = ctx.codebase.docblock(class, None)?;
        let label = parse_required::<LabelAnnotation>(docblock, ctx).in_class(class)?;
        let description = parse_optional::<DescriptionAnnotation>(docblock, ctx)
            .in_class(class)?
            .map(|d| d.text);

        let mut chain = Vec::new();
        let declared = self.collect_fields(class, &self.method, "", &mut chain)?;

        let mut seen = HashSet::new();
        for Declared { field, docblock, line } in &declared {
            if !seen.insert(field.name.as_str()) {
                return Err(AnnotationError::new(ErrorKind::DuplicateField {
                    field: field.name.clone(),
                })
                .with_field(field.name.as_str())
                .with_method(self.method.as_str())
                .with_class(class)
                .at_line(docblock, *line));
            }
        }
        let fields = declared.into_iter().map(|d| d.field).collect();

        Ok(Representation {
            class: class.to_string(),
            method: self.method.clone(),
            label: label.text,
            description,
            fields,
        })
    }

    /// @ai:intent Fields documented in `class::method`, following `@api-see` links
    /// @ai:pre chain holds the `class::method` frames currently being expanded
    fn collect_fields(
        &self,
        class: &str,
        method: &str,
        prefix: &str,
        chain: &mut Vec<String>,
    ) -> ParseResult<Vec<Declared<'a>>> {
        let frame = format!("{}::{}", class, method);
        if chain.contains(&frame) {
            chain.push(frame);
            return Err(AnnotationError::new(ErrorKind::CircularReference {
                chain: chain.join(" -> "),
            })
            .with_method(method)
            .with_class(class));
        }
        chain.push(frame);

        let codebase: &'a Codebase = self.ctx.codebase;
        let source = codebase.method(class, method).ok_or_else(|| {
            AnnotationError::new(ErrorKind::UncallableRepresentation {
                representation: class.to_string(),
                method: method.to_string(),
            })
        })?;

        let mut fields = Vec::new();
        for docblock in &source.body_docblocks {
            let contributions = parse_field_docblock(docblock, &self.ctx)
                .in_method(method)
                .in_class(class)?;

            for contribution in contributions {
                match contribution {
                    Contribution::Fields(found) => {
                        fields.extend(found.into_iter().map(|(mut field, line)| {
                            field.name = format!("{}{}", prefix, field.name);
                            Declared { field, docblock, line }
                        }))
                    }
                    Contribution::See(see) => {
                        let nested = format!("{}{}.", prefix, see.prefix);
                        let included = self
                            .collect_fields(&see.class, &see.method, &nested, chain)
                            .map_err(|e| e.at_line(docblock, see.source.line))?;
                        fields.extend(included);
                    }
                }
            }
        }

        chain.pop();
        Ok(fields)
    }
}

/// @ai:intent Parse one docblock of a data method into fields or an `@api-see` link
/// @ai:post docblocks with no field annotations contribute nothing
fn parse_field_docblock(docblock: &Docblock, ctx: &Context) -> ParseResult<Vec<Contribution>> {
    let tags = docblock.tags();
    let has = |kind: TagKind| tags.iter().any(|t| t.kind == kind);

    let mut contributions = Vec::new();

    for see in parse_all::<SeeAnnotation>(docblock, ctx)? {
        check_field_name(&see.prefix).map_err(|e| e.at_line(docblock, see.source.line))?;
        contributions.push(Contribution::See(see));
    }

    let version = docblock_version(docblock, ctx)?;
    let capability = parse_optional::<CapabilityAnnotation>(docblock, ctx)?.map(|c| c.capability);

    if has(TagKind::Data) {
        let mut fields = Vec::new();
        for data in parse_all::<DataAnnotation>(docblock, ctx)? {
            let line = data.source.line;
            let mut field = Field::from_data(data, capability.clone(), version);
            check_field_name(&field.name).map_err(|e| e.at_line(docblock, line))?;
            field.representation = linked_representation(&field.type_spec, ctx)
                .map_err(|e| e.with_field(field.name.as_str()).at_line(docblock, line))?;
            fields.push((field, line));
        }
        contributions.push(Contribution::Fields(fields));
    } else if has(TagKind::Field) || has(TagKind::Type) {
        let declared = parse_long_form(docblock, ctx, capability, version)?;
        contributions.push(Contribution::Fields(vec![declared]));
    }

    Ok(contributions)
}

/// @ai:intent Parse a field written as `@api-field` plus `@api-type`, `@api-label` and friends
fn parse_long_form(
    docblock: &Docblock,
    ctx: &Context,
    capability: Option<String>,
    version: Option<VersionConstraint>,
) -> ParseResult<(Field, usize)> {
    let field = parse_all::<FieldAnnotation>(docblock, ctx)?;
    let name = match field.as_slice() {
        [] => {
            let label = parse_all::<LabelAnnotation>(docblock, ctx)?;
            let named = label.first().map(|l| l.text.clone()).unwrap_or_default();
            return Err(missing_field_annotation(TagKind::Field, &named, docblock));
        }
        [only] => only.name.clone(),
        [_, second, ..] => {
            return Err(duplicate(TagKind::Field, &field[0].name, docblock, second.source.line))
        }
    };
    let line = field[0].source.line;
    check_field_name(&name).map_err(|e| e.at_line(docblock, line))?;

    for kind in [TagKind::Type, TagKind::Label, TagKind::Description, TagKind::Subtype, TagKind::Options] {
        let tags = docblock.tags_of(kind);
        if let Some(second) = tags.get(1) {
            return Err(duplicate(kind, &name, docblock, second.line));
        }
    }

    let type_annotation = parse_optional::<TypeAnnotation>(docblock, ctx)
        .in_field(&name)?
        .ok_or_else(|| missing_field_annotation(TagKind::Type, &name, docblock))?;
    let label = parse_optional::<LabelAnnotation>(docblock, ctx)?
        .ok_or_else(|| missing_field_annotation(TagKind::Label, &name, docblock))?;
    let description = parse_optional::<DescriptionAnnotation>(docblock, ctx)?.map(|d| d.text);

    let representation = linked_representation(&type_annotation.type_spec, ctx)
        .map_err(|e| e.with_field(name.as_str()).at_line(docblock, type_annotation.source.line))?;

    let field = Field {
        name,
        label: Some(label.text),
        description,
        type_spec: type_annotation.type_spec,
        sample: None,
        required: true,
        nullable: false,
        tag: None,
        capability,
        version,
        representation,
    };
    Ok((field, line))
}

fn missing_field_annotation(kind: TagKind, field: &str, docblock: &Docblock) -> AnnotationError {
    AnnotationError::new(ErrorKind::MissingFieldAnnotation {
        annotation: kind.name().to_string(),
        field: field.to_string(),
    })
    .with_field(field)
    .with_docblock(docblock)
}

fn duplicate(kind: TagKind, field: &str, docblock: &Docblock, line: usize) -> AnnotationError {
    AnnotationError::new(ErrorKind::DuplicateAnnotation {
        annotation: kind.name().to_string(),
        field: field.to_string(),
    })
    .with_field(field)
    .with_annotation(kind.to_string())
    .at_line(docblock, line)
}

/// @ai:intent Reject names that collide with the exploded view's metadata key
fn check_field_name(name: &str) -> ParseResult<()> {
    if name.split('.').any(|segment| segment == FIELD_DATA_KEY) {
        return Err(AnnotationError::new(ErrorKind::RestrictedFieldName {
            field: name.to_string(),
        })
        .with_field(name));
    }
    Ok(())
}

/// @ai:intent Resolve a representation named by a field's subtype
fn linked_representation(type_spec: &TypeSpec, ctx: &Context) -> ParseResult<Option<String>> {
    type_spec
        .representation_reference()
        .map(|reference| resolve_representation(reference, ctx))
        .transpose()
}

impl Representation {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// @ai:intent Copy limited to the fields of one API version
    pub fn for_version(&self, version: &Version) -> Representation {
        Representation {
            fields: self
                .fields
                .iter()
                .filter(|f| f.applies_to(version))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// @ai:intent Copy limited to the fields a consumer holding `capabilities` may see
    pub fn visible_to(&self, capabilities: &[String]) -> Representation {
        Representation {
            fields: self
                .fields
                .iter()
                .filter(|f| f.visible_to(capabilities))
                .cloned()
                .collect(),
            ..self.clone()
        }
    }

    /// @ai:intent Nest dot-notation field names, storing each field's metadata under FIELD_DATA_KEY
    /// @ai:example (fields "cast", "cast.name") -> {"cast": {"__FIELD_DATA__": {..}, "name": {"__FIELD_DATA__": {..}}}}
    pub fn exploded(&self) -> Value {
        let mut root = Map::new();

        for field in &self.fields {
            let mut node = &mut root;
            for segment in field.name.split('.') {
                let entry = node
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                node = match entry {
                    Value::Object(map) => map,
                    _ => unreachable!("entry was just made an object"),
                };
            }
            let data = serde_json::to_value(field).unwrap_or(Value::Null);
            node.insert(FIELD_DATA_KEY.to_string(), data);
        }

        Value::Object(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebase::Codebase;
    use crate::config::{Config, RepresentationConfig};
    use crate::language::Language;
    use crate::types::DataType;
    use pretty_assertions::assert_eq;

    const MOVIE: &str = r#"<?php
namespace App\Representations;

/**
 * @api-label Movie
 * @api-description A single movie.
 */
class Movie
{
    public function create()
    {
        return [
            /**
             * @api-label Movie ID
             * @api-field id
             * @api-type string
             */
            'id' => $this->id,

            /**
             * @api-data title (string) - Movie title
             * @api-data genres (array, string, optional) - Genres
             */
            'title' => $this->title,

            /**
             * @api-version >=1.1
             * @api-capability NONE
             * @api-data rating (number, nullable) - Average rating
             */
            'rating' => $this->rating,

            /**
             * @api-see \App\Representations\Person::create director
             */
            'director' => $this->director,
        ];
    }
}

/**
 * @api-label Person
 */
class Person
{
    public function create()
    {
        return [
            /**
             * @api-data name (string) - Name
             */
            'name' => $this->name,
        ];
    }
}
"#;

    fn fixtures(source: &str) -> (Config, Codebase) {
        let config = Config {
            capabilities: vec!["NONE".to_string()],
            representations: vec![
                RepresentationConfig {
                    class: "\\App\\Representations\\Movie".to_string(),
                    method: "create".to_string(),
                },
                RepresentationConfig {
                    class: "\\App\\Representations\\Person".to_string(),
                    method: "create".to_string(),
                },
            ],
            ..Default::default()
        };
        let codebase = Codebase::from_sources([("Movie.php", source, Language::Php)]);
        (config, codebase)
    }

    fn parse(source: &str) -> ParseResult<Representation> {
        let (config, codebase) = fixtures(source);
        let ctx = Context::new(&config, &codebase);
        RepresentationDocumentation::new("\\App\\Representations\\Movie", "create", ctx).parse()
    }

    fn names(representation: &Representation) -> Vec<&str> {
        representation.fields.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_fields_in_order() {
        let movie = parse(MOVIE).unwrap();

        assert_eq!(movie.label, "Movie");
        assert_eq!(names(&movie), vec!["id", "title", "genres", "rating", "director.name"]);

        let id = movie.field("id").unwrap();
        assert_eq!(id.label.as_deref(), Some("Movie ID"));
        assert_eq!(id.type_spec.data_type, DataType::String);

        let genres = movie.field("genres").unwrap();
        assert!(!genres.required);
        assert_eq!(genres.type_spec.subtype.as_deref(), Some("string"));
    }

    #[test]
    fn test_version_and_capability_views() {
        let movie = parse(MOVIE).unwrap();

        let v10 = movie.for_version(&Version::parse("1.0").unwrap());
        assert!(v10.field("rating").is_none());
        assert!(v10.field("title").is_some());

        let anonymous = movie.visible_to(&[]);
        assert!(anonymous.field("rating").is_none());
        assert!(movie.visible_to(&["NONE".to_string()]).field("rating").is_some());
    }

    #[test]
    fn test_duplicate_field() {
        let source = MOVIE.replace("@api-data genres", "@api-data title");
        let err = parse(&source).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::DuplicateField {
                field: "title".to_string()
            }
        );
        assert_eq!(err.class.as_deref(), Some("App\\Representations\\Movie"));

        let location = err.location.unwrap();
        assert_eq!(location.start_line, 22);
        assert!(err.docblock.unwrap().contains("@api-data title (array"));
    }

    #[test]
    fn test_restricted_field_name() {
        let source = MOVIE.replace("@api-field id", "@api-field __FIELD_DATA__");
        assert!(matches!(
            parse(&source).unwrap_err().kind,
            ErrorKind::RestrictedFieldName { .. }
        ));
    }

    #[test]
    fn test_missing_field_annotations() {
        let no_type = MOVIE.replace("             * @api-type string\n", "");
        assert_eq!(
            parse(&no_type).unwrap_err().kind,
            ErrorKind::MissingFieldAnnotation {
                annotation: "type".to_string(),
                field: "id".to_string(),
            }
        );

        let no_label = MOVIE.replace("             * @api-label Movie ID\n", "");
        assert_eq!(
            parse(&no_label).unwrap_err().kind,
            ErrorKind::MissingFieldAnnotation {
                annotation: "label".to_string(),
                field: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_array_without_subtype_names_field() {
        let source = MOVIE.replace("@api-type string", "@api-type array");
        let err = parse(&source).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::MissingSubtype {
                type_name: "array".to_string()
            }
        );
        assert_eq!(err.field.as_deref(), Some("id"));
    }

    #[test]
    fn test_duplicate_annotation_names_field() {
        let source = MOVIE.replace("@api-type string", "@api-type string\n             * @api-type number");
        assert_eq!(
            parse(&source).unwrap_err().kind,
            ErrorKind::DuplicateAnnotation {
                annotation: "type".to_string(),
                field: "id".to_string(),
            }
        );
    }

    #[test]
    fn test_see_cycle() {
        let source = MOVIE.replace(
            "@api-data name (string) - Name",
            "@api-see \\App\\Representations\\Movie::create favorite",
        );
        let err = parse(&source).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::CircularReference {
                chain: "App\\Representations\\Movie::create -> App\\Representations\\Person::create -> App\\Representations\\Movie::create"
                    .to_string()
            }
        );
    }

    #[test]
    fn test_see_requires_callable_target() {
        let source = MOVIE.replace("Person::create director", "Person::render director");
        assert!(matches!(
            parse(&source).unwrap_err().kind,
            ErrorKind::UncallableRepresentation { .. }
        ));
    }

    #[test]
    fn test_exploded() {
        let movie = parse(MOVIE).unwrap();
        let exploded = movie.exploded();

        assert_eq!(exploded["title"][FIELD_DATA_KEY]["type"], "string");
        assert_eq!(exploded["director"]["name"][FIELD_DATA_KEY]["name"], "director.name");
        assert!(exploded["director"].get(FIELD_DATA_KEY).is_none());
    }
}
