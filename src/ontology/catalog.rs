//! Declarative descriptions of the predefined ontologies a scenario is built
//! from.
//!
//! Definitions are plain configuration records: namespaces are kept as text
//! and validated when [`crate::ontology::Scenario::from_definitions`] turns
//! them into a live graph.

use serde::{Deserialize, Serialize};

/// Namespace that receives custom templates and custom relations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub prefix: String,
    pub namespace: String,
}

impl Default for ScenarioDefinition {
    fn default() -> Self {
        Self {
            name: "DEM-Scenario".to_string(),
            prefix: "scenario".to_string(),
            namespace: "http://www.pericles-project.eu/ns/dem-scenario#".to_string(),
        }
    }
}

/// A predefined ontology and the templates it offers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyDefinition {
    pub name: String,
    pub prefix: String,
    pub namespace: String,
    #[serde(default)]
    pub templates: Vec<TemplateDefinition>,
}

/// An ontology class with the relations it declares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub name: String,
    /// Parent template names, resolved across every ontology.
    #[serde(default)]
    pub parents: Vec<String>,
    /// Literal-valued relations.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Entity-targeted relations.
    #[serde(default)]
    pub links: Vec<LinkDefinition>,
}

impl TemplateDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            attributes: Vec::new(),
            links: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.push(attribute.into());
        self
    }

    #[must_use]
    pub fn with_link(mut self, name: impl Into<String>, range: &[&str]) -> Self {
        self.links.push(LinkDefinition {
            name: name.into(),
            range: range.iter().map(|name| (*name).to_string()).collect(),
        });
        self
    }
}

/// An entity-targeted relation; an empty range accepts any template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
    pub name: String,
    #[serde(default)]
    pub range: Vec<String>,
}

/// The DEM core vocabulary and the Digital Video Artwork ontology.
#[must_use]
pub fn builtin_ontologies() -> Vec<OntologyDefinition> {
    vec![
        OntologyDefinition {
            name: "DEM-Core".to_string(),
            prefix: "dem".to_string(),
            namespace: "http://www.pericles-project.eu/ns/dem#".to_string(),
            templates: vec![
                TemplateDefinition::new("Agent").with_attribute("hasName"),
                TemplateDefinition::new("DigitalObject")
                    .with_attribute("hasFormat")
                    .with_link("isPartOf", &["DigitalObject"]),
                TemplateDefinition::new("Activity")
                    .with_attribute("hasDescription")
                    .with_link("usesObject", &["DigitalObject"]),
            ],
        },
        OntologyDefinition {
            name: "DVA".to_string(),
            prefix: "dva".to_string(),
            namespace: "http://www.pericles-project.eu/ns/dva#".to_string(),
            templates: vec![
                TemplateDefinition::new("Artist")
                    .with_parent("Agent")
                    .with_attribute("hasDescription")
                    .with_link("created", &["Artwork"]),
                TemplateDefinition::new("Artwork")
                    .with_parent("DigitalObject")
                    .with_attribute("hasTitle")
                    .with_attribute("hasDescription"),
                TemplateDefinition::new("DigitalVideoArtwork")
                    .with_parent("Artwork")
                    .with_attribute("hasDuration"),
                TemplateDefinition::new("Exhibition")
                    .with_parent("Activity")
                    .with_attribute("hasLocation")
                    .with_link("exhibits", &["Artwork"]),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definitions_deserialize_with_defaults() {
        let yaml = r"
name: DVA
prefix: dva
namespace: http://www.pericles-project.eu/ns/dva#
templates:
  - name: Artist
    attributes: [hasDescription]
  - name: Exhibition
    links:
      - name: exhibits
        range: [Artwork]
";
        let definition: OntologyDefinition = serde_yaml::from_str(yaml).expect("valid yaml");
        assert_eq!(definition.templates.len(), 2);
        assert!(definition.templates[0].parents.is_empty());
        assert_eq!(definition.templates[1].links[0].range, vec!["Artwork"]);
    }

    #[test]
    fn builtin_template_names_are_unique() {
        let mut names: Vec<_> = builtin_ontologies()
            .into_iter()
            .flat_map(|ontology| ontology.templates)
            .map(|template| template.name)
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }
}
