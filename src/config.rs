//! # Configuration
//!
//! A single YAML document configures logging, the scenario model, the
//! predefined ontologies and output naming. Every section is optional:
//!
//! ```yaml
//! logger:
//!   enable: true
//!   level: debug
//!   format: pretty
//! scenario:
//!   name: DEM-Scenario
//!   prefix: scenario
//!   namespace: http://www.pericles-project.eu/ns/dem-scenario#
//! output:
//!   stem: exhibition
//! ```
//!
//! Omitting `ontologies` selects the built-in DEM core and DVA ontologies.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::logger::{Format, LogLevel};
use crate::ontology::{builtin_ontologies, OntologyDefinition, Scenario, ScenarioDefinition};
use crate::{Error, Result};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub logger: Logger,
    #[serde(default)]
    pub scenario: ScenarioDefinition,
    #[serde(default = "builtin_ontologies")]
    pub ontologies: Vec<OntologyDefinition>,
    #[serde(default)]
    pub output: Output,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logger: Logger::default(),
            scenario: ScenarioDefinition::default(),
            ontologies: builtin_ontologies(),
            output: Output::default(),
        }
    }
}

/// Logger configuration
///
/// Example (development):
/// ```yaml
/// logger:
///   enable: true
///   level: debug
///   format: compact
///   override_filter: ecobuilder=trace
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Logger {
    /// Enable log write to stderr
    pub enable: bool,

    /// Set the logger level.
    ///
    /// * options: `trace` | `debug` | `info` | `warn` | `error`
    #[serde(default)]
    pub level: LogLevel,

    /// Set the logger format.
    ///
    /// * options: `compact` | `pretty` | `json`
    #[serde(default)]
    pub format: Format,

    /// Override our custom tracing filter.
    pub override_filter: Option<String>,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            enable: true,
            level: LogLevel::default(),
            format: Format::default(),
            override_filter: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Output {
    /// File name stem shared by every saved file.
    pub stem: String,
}

impl Default for Output {
    fn default() -> Self {
        Self {
            stem: "scenario".to_string(),
        }
    }
}

impl Config {
    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a valid configuration.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)
            .map_err(|err| Error::YAMLFile(err, path.display().to_string()))?;
        info!(path = %path.display(), "config_loaded");
        Ok(config)
    }

    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML or unknown enum values.
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Builds an empty scenario from the configured definitions.
    ///
    /// # Errors
    ///
    /// Fails when the definitions contain invalid namespaces, duplicate
    /// template names or references to unknown templates.
    pub fn build_scenario(&self) -> Result<Scenario> {
        Ok(Scenario::from_definitions(&self.scenario, &self.ontologies)?)
    }
}
