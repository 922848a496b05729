//! @ai:module:intent Format lint reports and parsed documentation as text or JSON
//! @ai:module:layer infrastructure
//! @ai:module:public_api OutputFormat, format_lint_result, format_documentation, format_error, to_json
//! @ai:module:depends_on linter, documentation, error
//! @ai:module:stateless true

use crate::documentation::Documentation;
use crate::error::AnnotationError;
use crate::linter::{LintResult, Severity};
use colored::Colorize;
use serde::Serialize;

/// @ai:intent Output format options
#[derive(Debug, Clone, Copy, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    JsonPretty,
}

/// @ai:intent Format lint results as a string
/// @ai:effects pure
pub fn format_lint_result(result: &LintResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(result, false),
        OutputFormat::JsonPretty => to_json(result, true),
        OutputFormat::Text => format_lint_result_text(result),
    }
}

/// @ai:intent Format lint results as human-readable text
/// @ai:effects pure
fn format_lint_result_text(result: &LintResult) -> String {
    let mut output = String::new();

    for issue in &result.issues {
        let severity_str = match issue.severity {
            Severity::Error => "ERROR".red().bold(),
            Severity::Warning => "WARN".yellow().bold(),
        };

        let location = issue
            .location
            .as_ref()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "<config>".to_string());

        output.push_str(&format!(
            "{} {} - {} ({})\n",
            severity_str,
            location.dimmed(),
            issue.message,
            issue.code.dimmed()
        ));

        if let Some(suggestion) = &issue.suggestion {
            output.push_str(&format!("  {} {}\n", "hint:".cyan(), suggestion));
        }
    }

    output.push('\n');
    output.push_str(&format!(
        "Checked {} files, {} resources and representations\n",
        result.files_checked, result.units_checked
    ));

    if result.errors > 0 {
        output.push_str(&format!(
            "{} errors, {} warnings\n",
            result.errors.to_string().red().bold(),
            result.warnings.to_string().yellow()
        ));
    } else if result.warnings > 0 {
        output.push_str(&format!(
            "{} {} warnings\n",
            "OK".green().bold(),
            result.warnings.to_string().yellow()
        ));
    } else {
        output.push_str(&format!("{} No issues found\n", "OK".green().bold()));
    }

    output
}

/// @ai:intent Format a single build failure, with the offending docblock when known
/// @ai:effects pure
pub fn format_error(error: &AnnotationError, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(error, false),
        OutputFormat::JsonPretty => to_json(error, true),
        OutputFormat::Text => {
            let mut output = format!(
                "{} {} ({})\n",
                "ERROR".red().bold(),
                error.message(),
                error.kind.code().dimmed()
            );
            if let Some(docblock) = &error.docblock {
                for line in docblock.lines() {
                    output.push_str(&format!("  {}\n", line.dimmed()));
                }
            }
            let hint = error.validation_message();
            if hint != error.kind.to_string() {
                output.push_str(&format!("  {} {}\n", "hint:".cyan(), hint));
            }
            output
        }
    }
}

/// @ai:intent Format parsed documentation
/// @ai:effects pure
pub fn format_documentation(documentation: &Documentation, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => to_json(documentation, false),
        OutputFormat::JsonPretty => to_json(documentation, true),
        OutputFormat::Text => format_documentation_text(documentation),
    }
}

/// @ai:intent Format parsed documentation as a human-readable outline
/// @ai:effects pure
fn format_documentation_text(documentation: &Documentation) -> String {
    let mut output = String::new();

    if let Some(name) = &documentation.name {
        output.push_str(&format!("{}\n", name.bold()));
    }
    if !documentation.versions.is_empty() {
        let versions: Vec<String> = documentation.versions.iter().map(|v| v.to_string()).collect();
        output.push_str(&format!("  Versions: {}\n", versions.join(", ")));
    }

    output.push_str(&format!("\n  Resources ({}):\n", documentation.resources.len()));
    for resource in documentation.resources.values() {
        output.push_str(&format!(
            "    {} {}\n",
            resource.label.cyan(),
            resource.controller.dimmed()
        ));

        for (method, action) in &resource.methods {
            let private = if action.is_public() { "" } else { " (private)" };
            output.push_str(&format!(
                "      {} {} - {}{}\n",
                method.to_string().green(),
                action.uri.clean_path(),
                action.label,
                private.dimmed()
            ));
            if let Some(version) = &action.version {
                output.push_str(&format!("        version: {}\n", version));
            }
        }
    }

    output.push_str(&format!(
        "\n  Representations ({}):\n",
        documentation.representations.len()
    ));
    for representation in documentation.representations.values() {
        output.push_str(&format!(
            "    {} {}\n",
            representation.label.cyan(),
            representation.class.dimmed()
        ));

        for field in &representation.fields {
            let optional = if field.required { "" } else { "?" };
            output.push_str(&format!(
                "      {}{} ({})\n",
                field.name,
                optional,
                field.type_spec.data_type
            ));
        }
    }

    output
}

/// @ai:intent Format any serializable value as JSON
/// @ai:effects pure
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> String {
    if pretty {
        serde_json::to_string_pretty(value).unwrap_or_default()
    } else {
        serde_json::to_string(value).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::linter::LintIssue;

    fn result() -> LintResult {
        let error = AnnotationError::new(ErrorKind::BadRangeUse {
            supplied: "1.0-1.0".to_string(),
            recommended: "1.0".to_string(),
        })
        .with_class("App\\Movie");

        LintResult {
            files_checked: 1,
            units_checked: 1,
            issues: vec![LintIssue::from(error)],
            errors: 1,
            warnings: 0,
        }
    }

    #[test]
    fn test_text_report() {
        colored::control::set_override(false);
        let text = format_lint_result(&result(), OutputFormat::Text);

        assert!(text.contains("ERROR <config> - version range `1.0-1.0` should be written as `1.0` in App\\Movie (E503)"));
        assert!(text.contains("hint: use `1.0` instead"));
        assert!(text.contains("1 errors, 0 warnings"));
    }

    #[test]
    fn test_json_report() {
        let json: serde_json::Value =
            serde_json::from_str(&format_lint_result(&result(), OutputFormat::Json)).unwrap();

        assert_eq!(json["errors"], 1);
        assert_eq!(json["issues"][0]["code"], "E503");
        assert_eq!(json["issues"][0]["category"], "versioning");
        assert_eq!(json["issues"][0]["error"]["recommended"], "1.0");
    }
}
