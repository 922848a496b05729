//! @ai:module:intent Configuration declaring controllers, representations and access-control tokens
//! @ai:module:layer infrastructure
//! @ai:module:public_api Config, RepresentationConfig, ErrorRepresentationConfig
//! @ai:module:depends_on codebase, version, error
//! @ai:module:stateless true

use crate::codebase::normalize_class;
use crate::error::{Error, Result};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// @ai:intent A representation class and the method that produces its data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepresentationConfig {
    pub class: String,
    #[serde(default = "default_method")]
    pub method: String,
}

/// @ai:intent An error representation, optionally requiring an error code on every `@api-throws`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorRepresentationConfig {
    pub class: String,
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default)]
    pub needs_error_code: bool,
}

/// @ai:intent Read-only configuration shared by every parser during a build
/// @ai:invariant fully constructed before parsing starts and never mutated during it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sources: Vec<PathBuf>,
    #[serde(default)]
    pub controllers: Vec<String>,
    #[serde(default)]
    pub representations: Vec<RepresentationConfig>,
    #[serde(default)]
    pub error_representations: Vec<ErrorRepresentationConfig>,
    #[serde(default)]
    pub excluded_representations: Vec<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub api_versions: Vec<String>,
}

fn default_method() -> String {
    "create".to_string()
}

impl Config {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Self = toml::from_str(&content)?;

        // Relative source paths are relative to the config file.
        if let Some(base) = path.parent() {
            config.sources = config
                .sources
                .into_iter()
                .map(|p| if p.is_relative() { base.join(p) } else { p })
                .collect();
        }

        config.validate(path)?;
        Ok(config)
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @ai:intent Reject declared API versions that do not parse
    fn validate(&self, path: &Path) -> Result<()> {
        for version in &self.api_versions {
            Version::parse(version).map_err(|e| Error::Config {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// @ai:intent Find a configured (non-error) representation by class name
    /// @ai:effects pure
    pub fn representation(&self, class: &str) -> Option<&RepresentationConfig> {
        let class = normalize_class(class);
        self.representations
            .iter()
            .find(|r| normalize_class(&r.class) == class)
    }

    /// @ai:intent Find a configured error representation by class name
    /// @ai:effects pure
    pub fn error_representation(&self, class: &str) -> Option<&ErrorRepresentationConfig> {
        let class = normalize_class(class);
        self.error_representations
            .iter()
            .find(|r| normalize_class(&r.class) == class)
    }

    pub fn is_excluded(&self, class: &str) -> bool {
        let class = normalize_class(class);
        self.excluded_representations
            .iter()
            .any(|c| normalize_class(c) == class)
    }

    /// @ai:intent Check if a class is declared anywhere in the representation configuration
    pub fn is_configured(&self, class: &str) -> bool {
        self.representation(class).is_some()
            || self.error_representation(class).is_some()
            || self.is_excluded(class)
    }

    /// @ai:intent Declared API versions, parsed and sorted ascending
    /// @ai:pre api_versions were validated on load
    pub fn versions(&self) -> Vec<Version> {
        let mut versions: Vec<Version> = self
            .api_versions
            .iter()
            .filter_map(|v| Version::parse(v).ok())
            .collect();
        versions.sort();
        versions
    }
}
