//! @ai:module:intent Lint a codebase's API annotations, collecting every error instead of stopping at the first
//! @ai:module:layer application
//! @ai:module:public_api lint, lint_sources, LintConfig, LintResult, LintIssue, Severity
//! @ai:module:depends_on documentation, codebase, config, error
//! @ai:module:stateless true

use crate::codebase::Codebase;
use crate::config::Config;
use crate::docblock::Location;
use crate::documentation::{unlisted_representations, units, Parsed};
use crate::error::{AnnotationError, ErrorCategory, Result};
use crate::extractor::Context;
use serde::Serialize;

/// @ai:intent Severity level for lint issues
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warning,
}

/// @ai:intent A single lint issue found in the annotations
#[derive(Debug, Clone, Serialize)]
pub struct LintIssue {
    pub severity: Severity,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    pub suggestion: Option<String>,
    /// Full structured error, for tooling that renders inline diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnnotationError>,
}

impl From<AnnotationError> for LintIssue {
    fn from(error: AnnotationError) -> Self {
        let message = error.message();
        let validation = error.validation_message();
        Self {
            severity: Severity::Error,
            code: error.kind.code().to_string(),
            category: Some(error.kind.category()),
            suggestion: (validation != error.kind.to_string()).then_some(validation),
            location: error.location.clone(),
            message,
            error: Some(error),
        }
    }
}

/// @ai:intent Configuration for the linter
#[derive(Debug, Clone)]
pub struct LintConfig {
    /// Report source classes that document fields but are not configured.
    pub check_unlisted: bool,
    /// Warn about configured controllers that implement no HTTP method.
    pub warn_empty_resources: bool,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            check_unlisted: true,
            warn_empty_resources: false,
        }
    }
}

impl LintConfig {
    /// @ai:intent Create a strict lint configuration
    pub fn strict() -> Self {
        Self {
            check_unlisted: true,
            warn_empty_resources: true,
        }
    }
}

/// @ai:intent Result of linting a codebase
#[derive(Debug, Clone, Serialize, Default)]
pub struct LintResult {
    pub files_checked: usize,
    pub units_checked: usize,
    pub issues: Vec<LintIssue>,
    pub errors: usize,
    pub warnings: usize,
}

impl LintResult {
    /// @ai:intent Check if linting passed (no errors)
    pub fn passed(&self) -> bool {
        self.errors == 0
    }

    fn push(&mut self, issue: LintIssue) {
        match issue.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.issues.push(issue);
    }
}

/// @ai:intent Parse every configured unit independently and collect all failures
/// @ai:effects pure
pub fn lint(codebase: &Codebase, config: &Config, lint_config: &LintConfig) -> LintResult {
    let ctx = Context::new(config, codebase);
    let mut result = LintResult {
        files_checked: codebase.files().len(),
        ..Default::default()
    };

    if config.controllers.is_empty() {
        tracing::warn!("No controllers configured");
    }

    if lint_config.check_unlisted {
        for error in unlisted_representations(codebase, config) {
            result.push(error.into());
        }
    }

    for unit in units(config) {
        result.units_checked += 1;

        match unit.parse(ctx) {
            Ok(Parsed::Resource(resource))
                if lint_config.warn_empty_resources && resource.methods.is_empty() =>
            {
                let location = codebase
                    .class(&resource.controller)
                    .map(|c| Location::new(c.file.clone(), c.line, c.end_line));
                result.push(LintIssue {
                    severity: Severity::Warning,
                    code: "W001".to_string(),
                    category: None,
                    message: format!("Resource `{}` implements no HTTP methods", resource.controller),
                    location,
                    suggestion: Some("Add a GET, POST, PUT, PATCH or DELETE method".to_string()),
                    error: None,
                });
            }
            Ok(_) => {}
            Err(error) => {
                tracing::debug!(unit = unit.class(), code = error.kind.code(), "lint failure");
                result.push(error.into());
            }
        }
    }

    result
}

/// @ai:intent Scan the configured source directories, then lint
/// @ai:effects fs:read
pub fn lint_sources(config: &Config, lint_config: &LintConfig) -> Result<LintResult> {
    let codebase = Codebase::scan(&config.sources)?;
    Ok(lint(&codebase, config, lint_config))
}
