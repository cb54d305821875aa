use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt::{self, Display, Formatter};

use thiserror::Error;
use tracing::debug;

use super::catalog::{OntologyDefinition, ScenarioDefinition};
use super::entities::{
    CustomRelation, Entity, Model, ModelKind, Relation, RelationKind, RelationType, Template,
};
use super::value_objects::{EntityId, Iri, IriError, ModelId, TemplateId};

/// The complete in-memory graph of one working session.
///
/// Models, templates and entities live in arenas addressed by typed ids.
/// Removed templates and entities leave an empty slot behind so ids handed
/// out earlier never point at a different object.
#[derive(Clone, Debug)]
pub struct Scenario {
    models: Vec<Model>,
    templates: Vec<Option<Template>>,
    entities: Vec<Option<Entity>>,
    custom_relations: Vec<CustomRelation>,
    scenario_model: ModelId,
}

impl Scenario {
    /// Builds a fresh scenario from ontology definitions.
    ///
    /// Templates are created first and cross-references (parents, link ranges)
    /// are resolved afterwards, so definitions may reference templates of any
    /// ontology in any order.
    pub fn from_definitions(
        scenario: &ScenarioDefinition,
        ontologies: &[OntologyDefinition],
    ) -> Result<Self, ScenarioError> {
        let scenario_model = ModelId::new(ontologies.len());
        let mut graph = Self {
            models: Vec::with_capacity(ontologies.len() + 1),
            templates: Vec::new(),
            entities: Vec::new(),
            custom_relations: Vec::new(),
            scenario_model,
        };

        for ontology in ontologies {
            let model_id = ModelId::new(graph.models.len());
            let namespace = Iri::new(ontology.namespace.as_str())?;
            graph.models.push(Model::new(
                model_id,
                ontology.name.as_str(),
                ontology.prefix.as_str(),
                namespace.clone(),
                ModelKind::Ontology,
            ));
            for definition in &ontology.templates {
                graph.ensure_unique_template(&definition.name)?;
                let iri = Iri::join(&namespace, &definition.name)?;
                let id = graph.next_template_id();
                graph.insert_template(Template::new(
                    id,
                    definition.name.as_str(),
                    iri,
                    model_id,
                ));
            }
        }

        graph.models.push(Model::new(
            scenario_model,
            scenario.name.as_str(),
            scenario.prefix.as_str(),
            Iri::new(scenario.namespace.as_str())?,
            ModelKind::Scenario,
        ));

        for (index, ontology) in ontologies.iter().enumerate() {
            let namespace = graph.models[index].namespace().clone();
            for definition in &ontology.templates {
                let template_id = graph.require_template_named(&definition.name)?;

                let mut declarations = Vec::new();
                for attribute in &definition.attributes {
                    declarations.push(RelationType::new(
                        attribute.as_str(),
                        Iri::join(&namespace, attribute)?,
                        RelationKind::Attribute,
                    ));
                }
                for link in &definition.links {
                    let mut declaration = RelationType::new(
                        link.name.as_str(),
                        Iri::join(&namespace, &link.name)?,
                        RelationKind::Link,
                    );
                    for range in &link.range {
                        declaration.add_range(graph.require_template_named(range)?);
                    }
                    declarations.push(declaration);
                }
                let mut parents = Vec::new();
                for parent in &definition.parents {
                    parents.push(graph.require_template_named(parent)?);
                }

                let template = graph.template_mut(template_id)?;
                for parent in parents {
                    template.add_parent(parent);
                }
                for declaration in declarations {
                    template.declare_relation(declaration);
                }
            }
        }

        Ok(graph)
    }

    /// Returns every model in declaration order; the scenario model is last.
    #[must_use]
    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn model(&self, id: ModelId) -> Result<&Model, ScenarioError> {
        self.models
            .get(id.index())
            .ok_or(ScenarioError::UnknownModel(id))
    }

    /// Finds a model by its namespace prefix.
    #[must_use]
    pub fn model_by_prefix(&self, prefix: &str) -> Option<&Model> {
        self.models.iter().find(|model| model.prefix() == prefix)
    }

    /// Returns the model holding custom templates.
    #[must_use]
    pub fn scenario_model(&self) -> &Model {
        &self.models[self.scenario_model.index()]
    }

    pub fn template(&self, id: TemplateId) -> Result<&Template, ScenarioError> {
        self.templates
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(ScenarioError::UnknownTemplate(id))
    }

    /// Finds a template by name across every model.
    #[must_use]
    pub fn template_by_name(&self, name: &str) -> Option<&Template> {
        self.templates().find(|template| template.name() == name)
    }

    /// Iterates over every live template.
    pub fn templates(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter().filter_map(Option::as_ref)
    }

    /// Returns the templates of a model in declaration order.
    pub fn templates_of(&self, model: ModelId) -> Result<Vec<&Template>, ScenarioError> {
        self.model(model)?
            .templates()
            .iter()
            .map(|id| self.template(*id))
            .collect()
    }

    /// Selects a template so it accepts entities.
    ///
    /// Entities left over from an earlier selection are discarded when an
    /// unselected template is selected again.
    pub fn select_template(&mut self, id: TemplateId) -> Result<(), ScenarioError> {
        if self.template(id)?.is_selected() {
            return Ok(());
        }
        self.drop_entities(id)?;
        self.template_mut(id)?.set_selected(true);
        debug!(template = %id, "template_selected");
        Ok(())
    }

    /// Suppresses a template; its entities are kept until it is selected again.
    pub fn deselect_template(&mut self, id: TemplateId) -> Result<(), ScenarioError> {
        self.template_mut(id)?.set_selected(false);
        debug!(template = %id, "template_deselected");
        Ok(())
    }

    /// Deselects a template and destroys its entities.
    pub fn clear_template(&mut self, id: TemplateId) -> Result<(), ScenarioError> {
        self.template_mut(id)?.set_selected(false);
        self.drop_entities(id)
    }

    /// Clears every template of a model.
    ///
    /// Resetting the scenario model also removes custom templates and custom
    /// relations, returning it to its pristine, empty state. Edges of the
    /// removed custom relations are dropped from every remaining entity.
    ///
    /// Arena slots are emptied, never reused: ids issued before the reset
    /// resolve to an `Unknown*` error afterwards.
    pub fn reset_model(&mut self, id: ModelId) -> Result<(), ScenarioError> {
        let templates = self.model(id)?.templates().to_vec();
        for template in &templates {
            self.clear_template(*template)?;
        }
        if self.model(id)?.kind() == ModelKind::Scenario {
            for template in &templates {
                self.templates[template.index()] = None;
            }
            self.models[id.index()].retain_templates(|_| false);
            let removed: Vec<Iri> = self
                .custom_relations
                .drain(..)
                .map(|relation| relation.iri().clone())
                .collect();
            for entity in self.entities.iter_mut().flatten() {
                entity.forget_relations(&removed);
            }
        }
        debug!(model = %id, templates = templates.len(), "model_reset");
        Ok(())
    }

    /// Registers a user-defined template in the scenario model.
    pub fn add_custom_template(
        &mut self,
        name: &str,
        parents: &[TemplateId],
    ) -> Result<TemplateId, ScenarioError> {
        self.ensure_unique_template(name)?;
        for parent in parents {
            self.template(*parent)?;
        }
        let iri = Iri::join(self.scenario_model().namespace(), name)?;
        let id = self.next_template_id();
        let mut template = Template::new(id, name, iri, self.scenario_model).into_custom();
        for parent in parents {
            template.add_parent(*parent);
        }
        self.insert_template(template);
        debug!(template = name, parents = parents.len(), "custom_template_added");
        Ok(id)
    }

    /// Registers a user-defined link relation between domain and range templates.
    pub fn add_custom_relation(
        &mut self,
        name: &str,
        domains: &[TemplateId],
        ranges: &[TemplateId],
    ) -> Result<(), ScenarioError> {
        if self.custom_relation(name).is_some() {
            return Err(ScenarioError::DuplicateRelation {
                relation: name.to_string(),
            });
        }
        for template in domains.iter().chain(ranges) {
            self.template(*template)?;
        }
        let iri = Iri::join(self.scenario_model().namespace(), name)?;
        self.custom_relations.push(CustomRelation::new(
            name,
            iri,
            domains.iter().copied().collect(),
            ranges.iter().copied().collect(),
        ));
        debug!(relation = name, "custom_relation_added");
        Ok(())
    }

    #[must_use]
    pub fn custom_relations(&self) -> &[CustomRelation] {
        &self.custom_relations
    }

    #[must_use]
    pub fn custom_relation(&self, name: &str) -> Option<&CustomRelation> {
        self.custom_relations
            .iter()
            .find(|relation| relation.name() == name)
    }

    /// Creates an entity of a selected template.
    pub fn create_entity(
        &mut self,
        template: TemplateId,
        name: &str,
    ) -> Result<EntityId, ScenarioError> {
        let owner = self.template(template)?;
        if !owner.is_selected() {
            return Err(ScenarioError::TemplateNotSelected {
                template: owner.name().to_string(),
            });
        }
        if self.entity_by_name(template, name).is_some() {
            return Err(ScenarioError::DuplicateEntity {
                template: owner.name().to_string(),
                entity: name.to_string(),
            });
        }
        let id = EntityId::new(self.entities.len());
        self.entities.push(Some(Entity::new(id, name, template)));
        self.template_mut(template)?.push_entity(id);
        Ok(id)
    }

    pub fn entity(&self, id: EntityId) -> Result<&Entity, ScenarioError> {
        self.entities
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or(ScenarioError::UnknownEntity(id))
    }

    /// Finds an entity of a template by name.
    #[must_use]
    pub fn entity_by_name(&self, template: TemplateId, name: &str) -> Option<EntityId> {
        let template = self.template(template).ok()?;
        template
            .entities()
            .iter()
            .copied()
            .find(|id| self.entity(*id).is_ok_and(|entity| entity.name() == name))
    }

    /// Returns the entities of a template in creation order.
    pub fn entities_of(&self, template: TemplateId) -> Result<Vec<&Entity>, ScenarioError> {
        self.template(template)?
            .entities()
            .iter()
            .map(|id| self.entity(*id))
            .collect()
    }

    /// Iterates over every live entity.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter_map(Option::as_ref)
    }

    /// Sets the version and description fields of an entity.
    pub fn describe_entity(
        &mut self,
        id: EntityId,
        version: Option<String>,
        description: Option<String>,
    ) -> Result<(), ScenarioError> {
        let entity = self.entity_mut(id)?;
        entity.set_version(version);
        entity.set_description(description);
        Ok(())
    }

    /// Destroys an entity together with every edge pointing at it.
    pub fn remove_entity(&mut self, id: EntityId) -> Result<(), ScenarioError> {
        let template = self.entity(id)?.template();
        self.template_mut(template)?.forget_entity(id);
        self.entities[id.index()] = None;
        for entity in self.entities.iter_mut().flatten() {
            entity.forget_target(id);
        }
        Ok(())
    }

    /// Returns the transitive parents of a template, nearest first.
    pub fn ancestors_of(&self, template: TemplateId) -> Result<Vec<TemplateId>, ScenarioError> {
        let start = self.template(template)?;
        let mut visited = BTreeSet::new();
        let mut to_visit: VecDeque<TemplateId> = start.parents().iter().copied().collect();
        let mut result = Vec::new();

        while let Some(current) = to_visit.pop_front() {
            if visited.insert(current) {
                result.push(current);
                if let Ok(parent) = self.template(current) {
                    to_visit.extend(parent.parents().iter().copied());
                }
            }
        }

        Ok(result)
    }

    /// Returns `true` when `template` is `candidate` or inherits from it.
    pub fn is_a(&self, template: TemplateId, candidate: TemplateId) -> Result<bool, ScenarioError> {
        Ok(template == candidate || self.ancestors_of(template)?.contains(&candidate))
    }

    /// Lists the relations usable on entities of a template.
    ///
    /// The template's own declarations come first, then inherited ones, then
    /// custom relations whose domain covers the template. The nearest
    /// declaration wins when names collide.
    pub fn available_relations(
        &self,
        template: TemplateId,
    ) -> Result<Vec<RelationType>, ScenarioError> {
        let mut lineage = vec![template];
        lineage.extend(self.ancestors_of(template)?);

        let mut seen = BTreeSet::new();
        let mut relations = Vec::new();
        for id in &lineage {
            for relation in self.template(*id)?.relations() {
                if seen.insert(relation.name().to_string()) {
                    relations.push(relation.clone());
                }
            }
        }
        for custom in &self.custom_relations {
            let applies = custom.domains().iter().any(|domain| lineage.contains(domain));
            if applies && seen.insert(custom.name().to_string()) {
                relations.push(custom.as_relation_type());
            }
        }
        Ok(relations)
    }

    /// Resolves a relation by name for a template.
    pub fn relation_for(
        &self,
        template: TemplateId,
        name: &str,
    ) -> Result<RelationType, ScenarioError> {
        self.available_relations(template)?
            .into_iter()
            .find(|relation| relation.name() == name)
            .ok_or_else(|| ScenarioError::RelationUnavailable {
                template: self
                    .template(template)
                    .map(|template| template.name().to_string())
                    .unwrap_or_default(),
                relation: name.to_string(),
            })
    }

    /// Stores a literal value on an attribute relation of an entity.
    pub fn set_literal(
        &mut self,
        entity: EntityId,
        relation: &str,
        value: impl Into<String>,
    ) -> Result<(), ScenarioError> {
        let template = self.entity(entity)?.template();
        let declaration = self.relation_for(template, relation)?;
        if declaration.kind() != RelationKind::Attribute {
            return Err(ScenarioError::RelationKindMismatch {
                relation: relation.to_string(),
                expected: RelationKind::Attribute,
            });
        }
        self.entity_mut(entity)?.put_relation(Relation::literal(
            relation,
            declaration.iri().clone(),
            value,
        ));
        Ok(())
    }

    /// Attaches a link edge from `entity` to `target`.
    ///
    /// Returns `false` when the edge already existed.
    pub fn link(
        &mut self,
        entity: EntityId,
        relation: &str,
        target: EntityId,
    ) -> Result<bool, ScenarioError> {
        let template = self.entity(entity)?.template();
        let target_template = self.entity(target)?.template();
        let declaration = self.relation_for(template, relation)?;
        if declaration.kind() != RelationKind::Link {
            return Err(ScenarioError::RelationKindMismatch {
                relation: relation.to_string(),
                expected: RelationKind::Link,
            });
        }
        if !declaration.ranges().is_empty() {
            let mut in_range = false;
            for range in declaration.ranges() {
                if self.is_a(target_template, *range)? {
                    in_range = true;
                    break;
                }
            }
            if !in_range {
                return Err(ScenarioError::RangeViolation {
                    relation: relation.to_string(),
                    template: self.template(target_template)?.name().to_string(),
                });
            }
        }

        let owner = self.entity_mut(entity)?;
        if owner.relation(relation).is_none() {
            owner.put_relation(Relation::targets(relation, declaration.iri().clone()));
        }
        Ok(owner
            .relation_mut(relation)
            .is_some_and(|edge| edge.push_target(target)))
    }

    /// Removes a link edge; returns `false` when it did not exist.
    pub fn unlink(
        &mut self,
        entity: EntityId,
        relation: &str,
        target: EntityId,
    ) -> Result<bool, ScenarioError> {
        let owner = self.entity_mut(entity)?;
        let removed = owner
            .relation_mut(relation)
            .is_some_and(|edge| edge.drop_target(target));
        if removed {
            owner.prune_empty_relations();
        }
        Ok(removed)
    }

    /// Counts what the scenario currently holds.
    #[must_use]
    pub fn summary(&self) -> ScenarioSummary {
        let mut summary = ScenarioSummary {
            models: self.models.len(),
            custom_relations: self.custom_relations.len(),
            ..ScenarioSummary::default()
        };
        for template in self.templates() {
            if template.is_custom() {
                summary.custom_templates += 1;
            }
            if !template.is_selected() {
                continue;
            }
            summary.selected_templates += 1;
            let model = self.models[template.model().index()].name().to_string();
            let entities = template.entities().len();
            *summary.entities_by_model.entry(model).or_default() += entities;
            summary.entities += entities;
        }
        for entity in self.entities() {
            for relation in entity.relations().values() {
                if relation.literal_value().is_some() {
                    summary.literals += 1;
                }
                summary.links += relation.target_ids().len();
            }
        }
        summary
    }

    fn next_template_id(&self) -> TemplateId {
        TemplateId::new(self.templates.len())
    }

    fn insert_template(&mut self, template: Template) {
        let id = template.id();
        let model = template.model();
        self.templates.push(Some(template));
        self.models[model.index()].push_template(id);
    }

    fn ensure_unique_template(&self, name: &str) -> Result<(), ScenarioError> {
        if self.template_by_name(name).is_some() {
            return Err(ScenarioError::DuplicateTemplate {
                template: name.to_string(),
            });
        }
        Ok(())
    }

    fn require_template_named(&self, name: &str) -> Result<TemplateId, ScenarioError> {
        self.template_by_name(name)
            .map(Template::id)
            .ok_or_else(|| ScenarioError::TemplateNotFound {
                template: name.to_string(),
            })
    }

    fn template_mut(&mut self, id: TemplateId) -> Result<&mut Template, ScenarioError> {
        self.templates
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(ScenarioError::UnknownTemplate(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, ScenarioError> {
        self.entities
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or(ScenarioError::UnknownEntity(id))
    }

    fn drop_entities(&mut self, template: TemplateId) -> Result<(), ScenarioError> {
        let removed = self.template_mut(template)?.take_entities();
        if removed.is_empty() {
            return Ok(());
        }
        for id in &removed {
            self.entities[id.index()] = None;
        }
        for entity in self.entities.iter_mut().flatten() {
            for id in &removed {
                entity.forget_target(*id);
            }
        }
        debug!(template = %template, entities = removed.len(), "template_entities_dropped");
        Ok(())
    }
}

/// Counts describing a scenario, suitable for operator display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScenarioSummary {
    pub models: usize,
    pub selected_templates: usize,
    pub custom_templates: usize,
    pub custom_relations: usize,
    pub entities: usize,
    pub literals: usize,
    pub links: usize,
    /// Entities of selected templates grouped by model name.
    pub entities_by_model: BTreeMap<String, usize>,
}

impl Display for ScenarioSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "models: {}", self.models)?;
        writeln!(f, "selected templates: {}", self.selected_templates)?;
        writeln!(f, "custom templates: {}", self.custom_templates)?;
        writeln!(f, "custom relations: {}", self.custom_relations)?;
        writeln!(f, "entities: {}", self.entities)?;
        for (model, count) in &self.entities_by_model {
            writeln!(f, "  - {model}: {count}")?;
        }
        writeln!(f, "literal values: {}", self.literals)?;
        write!(f, "links: {}", self.links)
    }
}

/// Errors raised when manipulating a [`Scenario`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error(transparent)]
    InvalidIri(#[from] IriError),
    #[error("unknown {0}")]
    UnknownModel(ModelId),
    #[error("unknown {0}")]
    UnknownTemplate(TemplateId),
    #[error("unknown {0}")]
    UnknownEntity(EntityId),
    /// Referenced template name does not exist.
    #[error("template `{template}` does not exist")]
    TemplateNotFound { template: String },
    #[error("template `{template}` already exists")]
    DuplicateTemplate { template: String },
    #[error("entity `{entity}` already exists in template `{template}`")]
    DuplicateEntity { template: String, entity: String },
    #[error("custom relation `{relation}` already exists")]
    DuplicateRelation { relation: String },
    /// Entities can only be created for selected templates.
    #[error("template `{template}` is not selected")]
    TemplateNotSelected { template: String },
    #[error("relation `{relation}` is not available on template `{template}`")]
    RelationUnavailable { template: String, relation: String },
    #[error("relation `{relation}` is not an {expected:?} relation")]
    RelationKindMismatch {
        relation: String,
        expected: RelationKind,
    },
    /// Link target's template is outside the relation's range.
    #[error("template `{template}` is outside the range of relation `{relation}`")]
    RangeViolation { relation: String, template: String },
}
