//! Two-pass reconciliation of a snapshot into a live scenario.
//!
//! The first pass recreates templates, custom templates, custom relations and
//! entities (with their literal values). Entity-to-entity links may point into
//! any template of any model, so they are attached in a second pass, once
//! every entity of the snapshot exists in the destination.

use std::fmt::{self, Display, Formatter};
use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use super::snapshot::{ModelRecord, ScenarioSnapshot, SnapshotError, TemplateRecord};
use crate::ontology::{EntityId, ModelId, ModelKind, Scenario, ScenarioError, TemplateId};

/// Counts of what a load restored into the destination.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub models: usize,
    pub templates: usize,
    pub custom_templates: usize,
    pub custom_relations: usize,
    pub entities: usize,
    pub literals: usize,
    pub links: usize,
}

impl Display for LoadReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} models, {} templates ({} custom), {} custom relations, {} entities, {} literal values, {} links",
            self.models,
            self.templates,
            self.custom_templates,
            self.custom_relations,
            self.entities,
            self.literals,
            self.links
        )
    }
}

/// Merges [`ScenarioSnapshot`]s into a destination [`Scenario`].
pub struct ProjectLoader<'a> {
    scenario: &'a mut Scenario,
}

impl<'a> ProjectLoader<'a> {
    #[must_use]
    pub fn new(scenario: &'a mut Scenario) -> Self {
        Self { scenario }
    }

    /// Reads a snapshot file and loads it.
    ///
    /// Unreadable or malformed files are rejected before the destination is
    /// touched.
    pub fn load_file(&mut self, path: &Path) -> Result<LoadReport, LoadError> {
        let snapshot = ScenarioSnapshot::read(path)?;
        self.load(&snapshot)
    }

    /// Makes the destination isomorphic to `source` under name-based identity.
    ///
    /// Structural validation and model matching happen before any mutation.
    /// A name that cannot be resolved afterwards stops the load with the
    /// changes made so far left in place.
    pub fn load(&mut self, source: &ScenarioSnapshot) -> Result<LoadReport, LoadError> {
        source.validate()?;
        let (owned, scenario_record) = self.partition(source)?;
        let mut report = LoadReport {
            models: owned.len() + 1,
            ..LoadReport::default()
        };

        for (record, model) in &owned {
            self.restore_ontology_model(record, *model, &mut report)?;
        }
        self.restore_scenario_model(scenario_record, &mut report)?;
        self.restore_custom_relations(source, &mut report)?;

        debug!(entities = report.entities, "entity_pass_complete");

        for record in &source.models {
            for template in record.templates.iter().filter(|template| template.selected) {
                self.restore_links(template, &mut report)?;
            }
        }

        info!(
            models = report.models,
            templates = report.templates,
            custom_templates = report.custom_templates,
            entities = report.entities,
            links = report.links,
            "project_loaded"
        );
        Ok(report)
    }

    fn partition<'s>(
        &self,
        source: &'s ScenarioSnapshot,
    ) -> Result<(Vec<(&'s ModelRecord, ModelId)>, &'s ModelRecord), LoadError> {
        let mut owned = Vec::new();
        let mut scenario_record = None;
        for record in &source.models {
            if record.kind == ModelKind::Scenario {
                scenario_record = Some(record);
                continue;
            }
            let model = self
                .scenario
                .model_by_prefix(&record.prefix)
                .filter(|model| model.kind() == ModelKind::Ontology)
                .ok_or_else(|| LoadError::UnknownModel {
                    prefix: record.prefix.clone(),
                })?;
            owned.push((record, model.id()));
        }
        let scenario_record = scenario_record.ok_or(LoadError::Snapshot(
            SnapshotError::ScenarioModelCount { found: 0 },
        ))?;
        Ok((owned, scenario_record))
    }

    fn restore_ontology_model(
        &mut self,
        record: &ModelRecord,
        model: ModelId,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        let existing = self.scenario.model(model)?.templates().to_vec();
        for template in existing {
            self.scenario.clear_template(template)?;
        }

        for template in record.templates.iter().filter(|template| template.selected) {
            let id = self
                .scenario
                .template_by_name(&template.name)
                .filter(|candidate| candidate.model() == model)
                .map(|candidate| candidate.id())
                .ok_or_else(|| LoadError::MissingTemplate {
                    template: template.name.clone(),
                })?;
            self.scenario.select_template(id)?;
            report.templates += 1;
            self.restore_entities(id, template, report)?;
        }
        debug!(model = %record.name, "ontology_model_restored");
        Ok(())
    }

    fn restore_scenario_model(
        &mut self,
        record: &ModelRecord,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        let model = self.scenario.scenario_model().id();
        self.scenario.reset_model(model)?;

        // Custom templates may derive from one another in any order.
        let mut pending: Vec<&TemplateRecord> = record.templates.iter().collect();
        while !pending.is_empty() {
            let mut deferred = Vec::new();
            let mut stalled = None;
            for template in &pending {
                match self.resolve_parents(template) {
                    Ok(parents) => {
                        let id = self
                            .scenario
                            .add_custom_template(&template.name, &parents)?;
                        report.templates += 1;
                        report.custom_templates += 1;
                        if template.selected {
                            self.restore_entities(id, template, report)?;
                        } else {
                            self.scenario.deselect_template(id)?;
                        }
                    }
                    Err(err) => {
                        deferred.push(*template);
                        stalled.get_or_insert(err);
                    }
                }
            }
            if deferred.len() == pending.len() {
                if let Some(err) = stalled {
                    return Err(err);
                }
            }
            pending = deferred;
        }
        debug!(model = %record.name, "scenario_model_restored");
        Ok(())
    }

    fn resolve_parents(&self, template: &TemplateRecord) -> Result<Vec<TemplateId>, LoadError> {
        template
            .parents
            .iter()
            .map(|parent| {
                self.scenario
                    .template_by_name(parent)
                    .map(|found| found.id())
                    .ok_or_else(|| LoadError::MissingParent {
                        template: template.name.clone(),
                        parent: parent.clone(),
                    })
            })
            .collect()
    }

    fn restore_custom_relations(
        &mut self,
        source: &ScenarioSnapshot,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        for relation in &source.custom_relations {
            let domains = self.resolve_templates(&relation.domains)?;
            let ranges = self.resolve_templates(&relation.ranges)?;
            self.scenario
                .add_custom_relation(&relation.name, &domains, &ranges)?;
            report.custom_relations += 1;
        }
        Ok(())
    }

    fn resolve_templates(&self, names: &[String]) -> Result<Vec<TemplateId>, LoadError> {
        names
            .iter()
            .map(|name| {
                self.scenario
                    .template_by_name(name)
                    .map(|template| template.id())
                    .ok_or_else(|| LoadError::MissingTemplate {
                        template: name.clone(),
                    })
            })
            .collect()
    }

    /// Copies entity fields and literal values; links wait for the second pass.
    fn restore_entities(
        &mut self,
        template: TemplateId,
        record: &TemplateRecord,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        for entity in &record.entities {
            let id = self.scenario.create_entity(template, &entity.name)?;
            self.scenario
                .describe_entity(id, entity.version.clone(), entity.description.clone())?;
            report.entities += 1;
            for relation in &entity.relations {
                let Some(value) = &relation.value else {
                    continue;
                };
                self.scenario
                    .set_literal(id, &relation.name, value.as_str())
                    .map_err(|err| LoadError::relation(err, &record.name))?;
                report.literals += 1;
            }
        }
        Ok(())
    }

    fn restore_links(
        &mut self,
        template: &TemplateRecord,
        report: &mut LoadReport,
    ) -> Result<(), LoadError> {
        for entity in &template.entities {
            let linked: Vec<_> = entity
                .relations
                .iter()
                .filter(|relation| !relation.targets.is_empty())
                .collect();
            if linked.is_empty() {
                continue;
            }
            let subject = self.resolve_entity(&template.name, &entity.name)?;
            for relation in linked {
                for target in &relation.targets {
                    let target = self.resolve_entity(&target.template, &target.entity)?;
                    if self
                        .scenario
                        .link(subject, &relation.name, target)
                        .map_err(|err| LoadError::relation(err, &template.name))?
                    {
                        report.links += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn resolve_entity(&self, template: &str, entity: &str) -> Result<EntityId, LoadError> {
        let owner = self
            .scenario
            .template_by_name(template)
            .ok_or_else(|| LoadError::MissingTemplate {
                template: template.to_string(),
            })?;
        self.scenario
            .entity_by_name(owner.id(), entity)
            .ok_or_else(|| LoadError::MissingEntity {
                template: template.to_string(),
                entity: entity.to_string(),
            })
    }
}

/// Errors raised while loading a snapshot.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The snapshot was unreadable or inconsistent; nothing was changed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// No destination ontology uses the snapshot model's namespace prefix.
    #[error("no ontology with prefix `{prefix}` is loaded")]
    UnknownModel { prefix: String },
    #[error("template `{template}` does not exist")]
    MissingTemplate { template: String },
    #[error("parent `{parent}` of custom template `{template}` does not exist")]
    MissingParent { template: String, parent: String },
    #[error("entity `{entity}` of template `{template}` does not exist")]
    MissingEntity { template: String, entity: String },
    #[error("relation `{relation}` is not available on template `{template}`")]
    MissingRelation { template: String, relation: String },
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

impl LoadError {
    fn relation(err: ScenarioError, template: &str) -> Self {
        match err {
            ScenarioError::RelationUnavailable { relation, .. } => Self::MissingRelation {
                template: template.to_string(),
                relation,
            },
            other => Self::Scenario(other),
        }
    }
}
