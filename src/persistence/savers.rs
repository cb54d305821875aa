use oxrdfio::{RdfFormat, RdfSerializer};

use super::{PersistenceError, Saver};
use crate::ontology::Scenario;
use crate::project::ScenarioSnapshot;
use crate::rdf;

fn render_rdf(scenario: &Scenario, format: RdfFormat) -> Result<Vec<u8>, PersistenceError> {
    let graph = rdf::project(scenario)?;
    let mut serializer = RdfSerializer::from_format(format);
    for (prefix, namespace) in rdf::prefixes(scenario) {
        serializer = serializer
            .with_prefix(prefix.as_str(), namespace.as_str())
            .map_err(|source| PersistenceError::Prefix { prefix, source })?;
    }
    let mut writer = serializer.for_writer(Vec::new());
    for triple in &graph {
        writer
            .serialize_triple(triple)
            .map_err(PersistenceError::Serialize)?;
    }
    writer.finish().map_err(PersistenceError::Serialize)
}

/// Turtle export of the scenario graph.
#[derive(Clone, Copy, Debug, Default)]
pub struct TurtleSaver;

impl Saver for TurtleSaver {
    fn folder(&self) -> &'static str {
        "turtle"
    }

    fn extension(&self) -> &'static str {
        "ttl"
    }

    fn render(&self, scenario: &Scenario) -> Result<Vec<u8>, PersistenceError> {
        render_rdf(scenario, RdfFormat::Turtle)
    }
}

/// RDF/XML export of the scenario graph.
#[derive(Clone, Copy, Debug, Default)]
pub struct RdfXmlSaver;

impl Saver for RdfXmlSaver {
    fn folder(&self) -> &'static str {
        "rdf-xml"
    }

    fn extension(&self) -> &'static str {
        "rdf"
    }

    fn render(&self, scenario: &Scenario) -> Result<Vec<u8>, PersistenceError> {
        render_rdf(scenario, RdfFormat::RdfXml)
    }
}

/// Project file that [`crate::project::ProjectLoader`] reads back.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProjectSaver;

impl Saver for ProjectSaver {
    fn folder(&self) -> &'static str {
        "projects"
    }

    fn extension(&self) -> &'static str {
        "json"
    }

    fn render(&self, scenario: &Scenario) -> Result<Vec<u8>, PersistenceError> {
        Ok(ScenarioSnapshot::capture(scenario)
            .to_json_pretty()?
            .into_bytes())
    }
}
