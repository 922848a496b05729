//! @ai:module:intent Build the full documentation graph from a codebase and its configuration
//! @ai:module:layer application
//! @ai:module:public_api Documentation, Unit, units, unlisted_representations
//! @ai:module:depends_on resource, representation, extractor, codebase, config
//! @ai:module:stateless true

use crate::codebase::{normalize_class, Codebase};
use crate::config::Config;
use crate::docblock::TagKind;
use crate::error::{AnnotationError, ErrorKind, ParseResult, Result};
use crate::extractor::Context;
use crate::representation::{Representation, RepresentationDocumentation};
use crate::resource::{Resource, ResourceDocumentation};
use crate::version::Version;
use serde::Serialize;
use std::collections::BTreeMap;

/// @ai:intent One independently parseable piece of the documentation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    Resource(String),
    Representation { class: String, method: String },
}

/// @ai:intent Every controller and representation the configuration asks for, in declaration order
pub fn units(config: &Config) -> Vec<Unit> {
    let controllers = config
        .controllers
        .iter()
        .map(|c| Unit::Resource(normalize_class(c).to_string()));
    let representations = config.representations.iter().map(|r| Unit::Representation {
        class: normalize_class(&r.class).to_string(),
        method: r.method.clone(),
    });
    let errors = config.error_representations.iter().map(|r| Unit::Representation {
        class: normalize_class(&r.class).to_string(),
        method: r.method.clone(),
    });

    controllers.chain(representations).chain(errors).collect()
}

/// @ai:intent Source classes that document fields but are neither configured nor excluded
/// @ai:post one UnconfiguredRepresentationNotExcluded error per offending class, in name order
pub fn unlisted_representations(codebase: &Codebase, config: &Config) -> Vec<AnnotationError> {
    let controllers: Vec<&str> = config.controllers.iter().map(|c| normalize_class(c)).collect();

    codebase
        .classes()
        .filter(|class| !controllers.contains(&class.name.as_str()))
        .filter(|class| !config.is_configured(&class.name))
        .filter_map(|class| {
            let docblock = class
                .methods
                .iter()
                .flat_map(|m| m.body_docblocks.iter())
                .find(|d| {
                    d.tags()
                        .iter()
                        .any(|t| matches!(t.kind, TagKind::Field | TagKind::Data))
                })?;

            Some(
                AnnotationError::new(ErrorKind::UnconfiguredRepresentationNotExcluded {
                    representation: class.name.clone(),
                })
                .with_class(class.name.as_str())
                .with_docblock(docblock),
            )
        })
        .collect()
}

/// @ai:intent Parsed documentation for a whole API
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Documentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub resources: BTreeMap<String, Resource>,
    pub representations: BTreeMap<String, Representation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<Version>,
}

impl Documentation {
    /// @ai:intent Parse every configured unit, stopping at the first error
    /// @ai:pre config is fully constructed
    /// @ai:effects pure
    pub fn build(codebase: &Codebase, config: &Config) -> ParseResult<Self> {
        let ctx = Context::new(config, codebase);

        if let Some(err) = unlisted_representations(codebase, config).into_iter().next() {
            return Err(err);
        }

        let mut documentation = Documentation {
            name: config.name.clone(),
            resources: BTreeMap::new(),
            representations: BTreeMap::new(),
            versions: config.versions(),
        };

        for unit in units(config) {
            documentation.add(unit.parse(ctx)?);
        }

        tracing::info!(
            resources = documentation.resources.len(),
            representations = documentation.representations.len(),
            "Built documentation"
        );

        Ok(documentation)
    }

    fn add(&mut self, parsed: Parsed) {
        match parsed {
            Parsed::Resource(resource) => {
                self.resources.insert(resource.controller.clone(), resource);
            }
            Parsed::Representation(representation) => {
                self.representations
                    .insert(representation.class.clone(), representation);
            }
        }
    }

    pub fn resource(&self, controller: &str) -> Option<&Resource> {
        self.resources.get(normalize_class(controller))
    }

    pub fn representation(&self, class: &str) -> Option<&Representation> {
        self.representations.get(normalize_class(class))
    }

    /// @ai:intent View of the documentation as one API version exposes it
    pub fn for_version(&self, version: &Version) -> Documentation {
        Documentation {
            name: self.name.clone(),
            resources: self
                .resources
                .iter()
                .map(|(k, r)| (k.clone(), r.for_version(version)))
                .collect(),
            representations: self
                .representations
                .iter()
                .map(|(k, r)| (k.clone(), r.for_version(version)))
                .collect(),
            versions: vec![*version],
        }
    }

    /// @ai:intent View of the documentation as a consumer holding `capabilities` sees it
    pub fn visible_to(&self, capabilities: &[String]) -> Documentation {
        Documentation {
            name: self.name.clone(),
            resources: self
                .resources
                .iter()
                .map(|(k, r)| (k.clone(), r.visible_to(capabilities)))
                .collect(),
            representations: self
                .representations
                .iter()
                .map(|(k, r)| (k.clone(), r.visible_to(capabilities)))
                .collect(),
            versions: self.versions.clone(),
        }
    }

    /// @ai:intent View without private actions and private annotations
    pub fn public(&self) -> Documentation {
        Documentation {
            resources: self
                .resources
                .iter()
                .map(|(k, r)| (k.clone(), r.public()))
                .collect(),
            ..self.clone()
        }
    }

    pub fn to_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Result of parsing one unit.
pub(crate) enum Parsed {
    Resource(Resource),
    Representation(Representation),
}

impl Unit {
    pub fn class(&self) -> &str {
        match self {
            Unit::Resource(class) => class,
            Unit::Representation { class, .. } => class,
        }
    }

    pub(crate) fn parse(&self, ctx: Context) -> ParseResult<Parsed> {
        match self {
            Unit::Resource(controller) => ResourceDocumentation::new(controller, ctx)
                .parse()
                .map(Parsed::Resource),
            Unit::Representation { class, method } => {
                RepresentationDocumentation::new(class, method, ctx)
                    .parse()
                    .map(Parsed::Representation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepresentationConfig;
    use crate::language::Language;
    use pretty_assertions::assert_eq;

    const SOURCES: &str = r#"<?php
namespace App;

/**
 * @api-label Movies
 */
class MovieController
{
    /**
     * @api-label List movies
     * @api-uri:public {Movies} /movies
     * @api-return:public {collection} \App\Movie
     */
    public function GET() {}

    /**
     * @api-label Create a movie
     * @api-uri:public {Movies} /movies
     * @api-version >=1.1
     * @api-return:public {created} \App\Movie
     */
    public function POST() {}
}

/**
 * @api-label Movie
 */
class Movie
{
    public function create()
    {
        return [
            /**
             * @api-data id (string) - Movie id
             */
            'id' => $this->id,
        ];
    }
}

class Draft
{
    public function create()
    {
        return [
            /**
             * @api-data id (string) - Draft id
             */
            'id' => $this->id,
        ];
    }
}
"#;

    fn config() -> Config {
        Config {
            name: Some("Movies API".to_string()),
            controllers: vec!["\\App\\MovieController".to_string()],
            representations: vec![RepresentationConfig {
                class: "\\App\\Movie".to_string(),
                method: "create".to_string(),
            }],
            excluded_representations: vec!["\\App\\Draft".to_string()],
            api_versions: vec!["1.0".to_string(), "1.1".to_string()],
            ..Default::default()
        }
    }

    fn codebase() -> Codebase {
        Codebase::from_sources([("App.php", SOURCES, Language::Php)])
    }

    #[test]
    fn test_build() {
        let documentation = Documentation::build(&codebase(), &config()).unwrap();

        assert_eq!(documentation.resources.len(), 1);
        assert_eq!(documentation.representations.len(), 1);
        assert_eq!(
            documentation.resource("\\App\\MovieController").unwrap().methods.len(),
            2
        );
        assert!(documentation.representation("App\\Movie").is_some());
        assert_eq!(documentation.versions.len(), 2);
    }

    #[test]
    fn test_for_version() {
        let documentation = Documentation::build(&codebase(), &config()).unwrap();

        let v10 = documentation.for_version(&Version::parse("1.0").unwrap());
        assert_eq!(v10.resource("App\\MovieController").unwrap().methods.len(), 1);

        let v11 = documentation.for_version(&Version::parse("1.1.0").unwrap());
        assert_eq!(v11.resource("App\\MovieController").unwrap().methods.len(), 2);
    }

    #[test]
    fn test_unconfigured_representation_not_excluded() {
        let mut config = config();
        config.excluded_representations.clear();

        let err = Documentation::build(&codebase(), &config).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnconfiguredRepresentationNotExcluded {
                representation: "App\\Draft".to_string()
            }
        );
        assert!(err.location.is_some());
    }

    #[test]
    fn test_unconfigured_return_representation() {
        let mut config = config();
        config.representations.clear();
        config.excluded_representations.push("\\App\\Movie".to_string());

        let err = Documentation::build(&codebase(), &config).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnconfiguredRepresentation {
                representation: "App\\Movie".to_string()
            }
        );
        assert_eq!(err.method.as_deref(), Some("GET"));
    }

    #[test]
    fn test_units_follow_configuration_order() {
        let units = units(&config());
        assert_eq!(
            units,
            vec![
                Unit::Resource("App\\MovieController".to_string()),
                Unit::Representation {
                    class: "App\\Movie".to_string(),
                    method: "create".to_string(),
                },
            ]
        );
        assert_eq!(units[1].class(), "App\\Movie");
    }
}
