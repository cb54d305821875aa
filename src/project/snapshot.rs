//! Versioned, serializable representation of a scenario.
//!
//! A snapshot names every template and entity by string so that it can be
//! merged into any scenario built from the same ontology definitions. Arena
//! ids never leave the process.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ontology::{ModelKind, Scenario, Template, TemplateId};

/// Version written by this build and the only one it reads.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized capture of a scenario graph used for project save/load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub models: Vec<ModelRecord>,
    #[serde(default)]
    pub custom_relations: Vec<CustomRelationRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub prefix: String,
    pub namespace: String,
    pub kind: ModelKind,
    #[serde(default)]
    pub templates: Vec<TemplateRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub name: String,
    pub selected: bool,
    /// Parent template names; only recorded for custom templates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub relations: Vec<RelationRecord>,
}

/// A relation carries either a literal `value` or entity `targets`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<EntityRef>,
}

/// Name-based reference to an entity: owning template name + entity name.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub template: String,
    pub entity: String,
}

impl EntityRef {
    #[must_use]
    pub fn new(template: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            entity: entity.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRelationRecord {
    pub name: String,
    pub domains: Vec<String>,
    pub ranges: Vec<String>,
}

impl ScenarioSnapshot {
    /// Captures the current state of a scenario.
    ///
    /// Entities of unselected templates are suppressed and therefore not
    /// recorded.
    #[must_use]
    pub fn capture(scenario: &Scenario) -> Self {
        let template_name = |id: TemplateId| {
            scenario
                .template(id)
                .map(|template| template.name().to_string())
                .unwrap_or_default()
        };

        let models = scenario
            .models()
            .iter()
            .map(|model| ModelRecord {
                name: model.name().to_string(),
                prefix: model.prefix().to_string(),
                namespace: model.namespace().to_string(),
                kind: model.kind(),
                templates: scenario
                    .templates_of(model.id())
                    .unwrap_or_default()
                    .into_iter()
                    .map(|template| capture_template(scenario, template))
                    .collect(),
            })
            .collect();

        let custom_relations = scenario
            .custom_relations()
            .iter()
            .map(|relation| CustomRelationRecord {
                name: relation.name().to_string(),
                domains: relation.domains().iter().map(|id| template_name(*id)).collect(),
                ranges: relation.ranges().iter().map(|id| template_name(*id)).collect(),
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            models,
            custom_relations,
        }
    }

    /// Reads, parses and validates a snapshot file.
    pub fn read(path: &Path) -> Result<Self, SnapshotError> {
        let content = fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parses and validates a snapshot from JSON text.
    pub fn from_json(content: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(content)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Returns the single scenario model record, if present.
    #[must_use]
    pub fn scenario_model(&self) -> Option<&ModelRecord> {
        self.models
            .iter()
            .find(|model| model.kind == ModelKind::Scenario)
    }

    /// Checks the internal consistency of the snapshot.
    ///
    /// A snapshot that passes validation only fails to load when it does not
    /// match the destination's ontology definitions.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let scenario_models = self
            .models
            .iter()
            .filter(|model| model.kind == ModelKind::Scenario)
            .count();
        if scenario_models != 1 {
            return Err(SnapshotError::ScenarioModelCount {
                found: scenario_models,
            });
        }

        let mut entities: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for template in self.models.iter().flat_map(|model| &model.templates) {
            if entities.contains_key(template.name.as_str()) {
                return Err(SnapshotError::DuplicateTemplate {
                    template: template.name.clone(),
                });
            }
            let names = entities.entry(template.name.as_str()).or_default();
            for entity in &template.entities {
                if !names.insert(entity.name.as_str()) {
                    return Err(SnapshotError::DuplicateEntity {
                        template: template.name.clone(),
                        entity: entity.name.clone(),
                    });
                }
            }
        }

        for template in self.models.iter().flat_map(|model| &model.templates) {
            for entity in &template.entities {
                for relation in &entity.relations {
                    if relation.value.is_some() && !relation.targets.is_empty() {
                        return Err(SnapshotError::MixedRelation {
                            entity: entity.name.clone(),
                            relation: relation.name.clone(),
                        });
                    }
                    for target in &relation.targets {
                        let exists = entities
                            .get(target.template.as_str())
                            .is_some_and(|names| names.contains(target.entity.as_str()));
                        if !exists {
                            return Err(SnapshotError::DanglingTarget {
                                entity: entity.name.clone(),
                                relation: relation.name.clone(),
                                target: target.clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn capture_template(scenario: &Scenario, template: &Template) -> TemplateRecord {
    let parents = if template.is_custom() {
        template
            .parents()
            .iter()
            .filter_map(|id| scenario.template(*id).ok())
            .map(|parent| parent.name().to_string())
            .collect()
    } else {
        Vec::new()
    };

    let entities = if template.is_selected() {
        scenario
            .entities_of(template.id())
            .unwrap_or_default()
            .into_iter()
            .map(|entity| EntityRecord {
                name: entity.name().to_string(),
                version: entity.version().map(str::to_string),
                description: entity.description().map(str::to_string),
                relations: entity
                    .relations()
                    .values()
                    .map(|relation| RelationRecord {
                        name: relation.name().to_string(),
                        value: relation.literal_value().map(str::to_string),
                        targets: relation
                            .target_ids()
                            .iter()
                            .filter_map(|id| scenario.entity(*id).ok())
                            .filter_map(|target| {
                                let owner = scenario.template(target.template()).ok()?;
                                Some(EntityRef::new(owner.name(), target.name()))
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect()
    } else {
        Vec::new()
    };

    TemplateRecord {
        name: template.name().to_string(),
        selected: template.is_selected(),
        parents,
        entities,
    }
}

/// Errors raised while reading or validating a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported snapshot version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("snapshot must contain exactly one scenario model, found {found}")]
    ScenarioModelCount { found: usize },
    #[error("template `{template}` appears more than once in the snapshot")]
    DuplicateTemplate { template: String },
    #[error("entity `{entity}` appears more than once in template `{template}`")]
    DuplicateEntity { template: String, entity: String },
    #[error("relation `{relation}` of entity `{entity}` has both a value and targets")]
    MixedRelation { entity: String, relation: String },
    /// A target reference names an entity the snapshot does not contain.
    #[error(
        "relation `{relation}` of entity `{entity}` targets unknown entity `{}` of template `{}`",
        .target.entity,
        .target.template
    )]
    DanglingTarget {
        entity: String,
        relation: String,
        target: EntityRef,
    },
}
