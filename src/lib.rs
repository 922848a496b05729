//! @ai:module:intent Parse `@api-*` documentation annotations into a validated, versioned model
//! @ai:module:layer infrastructure
//! @ai:module:public_api codebase, config, documentation, resource, representation, linter, output, error
//! @ai:module:stateless true
//!
//! # apidoc
//!
//! Reads docblocks from controller and representation classes, parses their
//! `@api-*` annotations and builds a documentation graph that renderers can
//! consume. Every failure is an [`AnnotationError`] carrying the class,
//! method, field, annotation, raw docblock and source location.
//!
//! ## Example
//!
//! ```rust,no_run
//! use apidoc::{linter, output, Codebase, Config, Documentation, LintConfig};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("apidoc.toml")).unwrap();
//! let codebase = Codebase::scan(&config.sources).unwrap();
//!
//! // Stop at the first error
//! let documentation = Documentation::build(&codebase, &config).unwrap();
//! println!("{}", output::format_documentation(&documentation, output::OutputFormat::Text));
//!
//! // Or collect every error
//! let result = linter::lint(&codebase, &config, &LintConfig::default());
//! println!("{}", output::format_lint_result(&result, output::OutputFormat::Text));
//! ```

pub mod annotation;
pub mod codebase;
pub mod config;
pub mod docblock;
pub mod documentation;
pub mod error;
pub mod extractor;
pub mod language;
pub mod linter;
pub mod mson;
pub mod output;
pub mod reader;
pub mod representation;
pub mod resource;
pub mod types;
pub mod version;

pub use annotation::{Annotation, HasCapability, HasVersion, HasVisibility, ReturnType, Visibility};
pub use codebase::Codebase;
pub use config::Config;
pub use docblock::{Docblock, Location, TagKind};
pub use documentation::Documentation;
pub use error::{AnnotationError, Error, ErrorCategory, ErrorKind, ParseResult, Result};
pub use extractor::Context;
pub use language::{detect_language, is_supported_file, Language};
pub use linter::{lint, LintConfig, LintIssue, LintResult, Severity};
pub use mson::{Mson, MsonOptions};
pub use output::{format_documentation, format_lint_result, to_json, OutputFormat};
pub use representation::{Field, Representation, RepresentationDocumentation};
pub use resource::{Action, HttpMethod, Resource, ResourceDocumentation};
pub use types::{parse_options, DataType, TypeSpec};
pub use version::{Version, VersionConstraint};
