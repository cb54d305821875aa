use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::value_objects::{EntityId, Iri, ModelId, TemplateId};

/// Distinguishes predefined ontologies from the user's scenario namespace.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// A predefined vocabulary such as DVA or DEM-Core.
    Ontology,
    /// The namespace holding custom templates and relations.
    Scenario,
}

/// A named ontology namespace owning an ordered list of templates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Model {
    id: ModelId,
    name: String,
    prefix: String,
    namespace: Iri,
    kind: ModelKind,
    templates: Vec<TemplateId>,
}

impl Model {
    pub(crate) fn new(
        id: ModelId,
        name: impl Into<String>,
        prefix: impl Into<String>,
        namespace: Iri,
        kind: ModelKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            prefix: prefix.into(),
            namespace,
            kind,
            templates: Vec::new(),
        }
    }

    /// Returns the arena identifier of the model.
    #[must_use]
    pub fn id(&self) -> ModelId {
        self.id
    }

    /// Returns the display name of the model.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the namespace prefix used to match snapshot models.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the namespace IRI template names are appended to.
    #[must_use]
    pub fn namespace(&self) -> &Iri {
        &self.namespace
    }

    /// Returns whether this is a predefined ontology or the scenario model.
    #[must_use]
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Returns the templates in declaration order.
    #[must_use]
    pub fn templates(&self) -> &[TemplateId] {
        &self.templates
    }

    pub(crate) fn push_template(&mut self, template: TemplateId) {
        self.templates.push(template);
    }

    pub(crate) fn retain_templates(&mut self, keep: impl Fn(TemplateId) -> bool) {
        self.templates.retain(|id| keep(*id));
    }
}

/// Classifies the type of values a relation can hold.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Attribute relations carry a literal value.
    Attribute,
    /// Link relations target other entities.
    Link,
}

/// A relation declared by a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationType {
    name: String,
    iri: Iri,
    kind: RelationKind,
    ranges: BTreeSet<TemplateId>,
}

impl RelationType {
    /// Creates a relation declaration without range restrictions.
    #[must_use]
    pub fn new(name: impl Into<String>, iri: Iri, kind: RelationKind) -> Self {
        Self {
            name: name.into(),
            iri,
            kind,
            ranges: BTreeSet::new(),
        }
    }

    /// Restricts link targets to the supplied template (and its descendants).
    pub fn add_range(&mut self, template: TemplateId) -> bool {
        self.ranges.insert(template)
    }

    /// Returns the relation name used as its key on entities.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the predicate IRI of the relation.
    #[must_use]
    pub fn iri(&self) -> &Iri {
        &self.iri
    }

    /// Returns whether the relation holds a literal or entity targets.
    #[must_use]
    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// Permissible target templates; empty means any template.
    #[must_use]
    pub fn ranges(&self) -> &BTreeSet<TemplateId> {
        &self.ranges
    }
}

/// An ontology class usable as a type for entities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    id: TemplateId,
    name: String,
    iri: Iri,
    model: ModelId,
    selected: bool,
    custom: bool,
    parents: BTreeSet<TemplateId>,
    relations: Vec<RelationType>,
    entities: Vec<EntityId>,
}

impl Template {
    pub(crate) fn new(id: TemplateId, name: impl Into<String>, iri: Iri, model: ModelId) -> Self {
        Self {
            id,
            name: name.into(),
            iri,
            model,
            selected: false,
            custom: false,
            parents: BTreeSet::new(),
            relations: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub(crate) fn into_custom(mut self) -> Self {
        self.custom = true;
        self.selected = true;
        self
    }

    /// Returns the arena identifier of the template.
    #[must_use]
    pub fn id(&self) -> TemplateId {
        self.id
    }

    /// Returns the template name, unique across the scenario.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the class IRI of the template.
    #[must_use]
    pub fn iri(&self) -> &Iri {
        &self.iri
    }

    /// Returns the model owning the template.
    #[must_use]
    pub fn model(&self) -> ModelId {
        self.model
    }

    /// Returns `true` when the template accepts entities.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Returns `true` for templates the user invented in the scenario model.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Returns the direct parent templates.
    #[must_use]
    pub fn parents(&self) -> &BTreeSet<TemplateId> {
        &self.parents
    }

    /// Relations declared directly on this template, without inherited ones.
    #[must_use]
    pub fn relations(&self) -> &[RelationType] {
        &self.relations
    }

    /// Returns the entities of the template in creation order.
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    pub(crate) fn add_parent(&mut self, parent: TemplateId) -> bool {
        self.parents.insert(parent)
    }

    pub(crate) fn declare_relation(&mut self, relation: RelationType) {
        self.relations.push(relation);
    }

    pub(crate) fn push_entity(&mut self, entity: EntityId) {
        self.entities.push(entity);
    }

    pub(crate) fn forget_entity(&mut self, entity: EntityId) {
        self.entities.retain(|id| *id != entity);
    }

    pub(crate) fn take_entities(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.entities)
    }
}

/// Value carried by a relation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelationValue {
    /// Attribute relations store a literal.
    Literal(String),
    /// Link relations point to other entities, in insertion order.
    Targets(Vec<EntityId>),
}

/// A typed link from an entity to a literal value or to other entities.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    name: String,
    iri: Iri,
    value: RelationValue,
}

impl Relation {
    pub(crate) fn literal(name: impl Into<String>, iri: Iri, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            iri,
            value: RelationValue::Literal(value.into()),
        }
    }

    pub(crate) fn targets(name: impl Into<String>, iri: Iri) -> Self {
        Self {
            name: name.into(),
            iri,
            value: RelationValue::Targets(Vec::new()),
        }
    }

    /// Returns the relation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the predicate IRI resolved when the relation was set.
    #[must_use]
    pub fn iri(&self) -> &Iri {
        &self.iri
    }

    /// Returns the literal or the target list.
    #[must_use]
    pub fn value(&self) -> &RelationValue {
        &self.value
    }

    /// Returns the literal value, if this is an attribute relation.
    #[must_use]
    pub fn literal_value(&self) -> Option<&str> {
        match &self.value {
            RelationValue::Literal(value) => Some(value),
            RelationValue::Targets(_) => None,
        }
    }

    /// Returns the link targets; empty for attribute relations.
    #[must_use]
    pub fn target_ids(&self) -> &[EntityId] {
        match &self.value {
            RelationValue::Targets(targets) => targets,
            RelationValue::Literal(_) => &[],
        }
    }

    pub(crate) fn push_target(&mut self, target: EntityId) -> bool {
        match &mut self.value {
            RelationValue::Targets(targets) if !targets.contains(&target) => {
                targets.push(target);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn drop_target(&mut self, target: EntityId) -> bool {
        match &mut self.value {
            RelationValue::Targets(targets) => {
                let before = targets.len();
                targets.retain(|id| *id != target);
                before != targets.len()
            }
            RelationValue::Literal(_) => false,
        }
    }

    fn is_empty(&self) -> bool {
        matches!(&self.value, RelationValue::Targets(targets) if targets.is_empty())
    }
}

/// A user-created instance of exactly one template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    name: String,
    template: TemplateId,
    version: Option<String>,
    description: Option<String>,
    relations: BTreeMap<String, Relation>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: impl Into<String>, template: TemplateId) -> Self {
        Self {
            id,
            name: name.into(),
            template,
            version: None,
            description: None,
            relations: BTreeMap::new(),
        }
    }

    /// Returns the arena identifier of the entity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity name, unique within its template.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the template the entity instantiates.
    #[must_use]
    pub fn template(&self) -> TemplateId {
        self.template
    }

    /// Returns the optional version label.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the optional free-text description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the relations keyed by relation name.
    #[must_use]
    pub fn relations(&self) -> &BTreeMap<String, Relation> {
        &self.relations
    }

    /// Looks up a relation by name.
    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub(crate) fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub(crate) fn put_relation(&mut self, relation: Relation) {
        self.relations.insert(relation.name().to_string(), relation);
    }

    pub(crate) fn relation_mut(&mut self, name: &str) -> Option<&mut Relation> {
        self.relations.get_mut(name)
    }

    /// Removes every edge pointing at `target`, dropping relations left empty.
    pub(crate) fn forget_target(&mut self, target: EntityId) {
        for relation in self.relations.values_mut() {
            relation.drop_target(target);
        }
        self.prune_empty_relations();
    }

    /// Drops every relation whose predicate is one of `iris`.
    pub(crate) fn forget_relations(&mut self, iris: &[Iri]) {
        self.relations
            .retain(|_, relation| !iris.contains(relation.iri()));
    }

    pub(crate) fn prune_empty_relations(&mut self) {
        self.relations.retain(|_, relation| !relation.is_empty());
    }
}

/// A user-defined link relation constrained to domain and range templates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomRelation {
    name: String,
    iri: Iri,
    domains: BTreeSet<TemplateId>,
    ranges: BTreeSet<TemplateId>,
}

impl CustomRelation {
    pub(crate) fn new(
        name: impl Into<String>,
        iri: Iri,
        domains: BTreeSet<TemplateId>,
        ranges: BTreeSet<TemplateId>,
    ) -> Self {
        Self {
            name: name.into(),
            iri,
            domains,
            ranges,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn iri(&self) -> &Iri {
        &self.iri
    }

    #[must_use]
    pub fn domains(&self) -> &BTreeSet<TemplateId> {
        &self.domains
    }

    #[must_use]
    pub fn ranges(&self) -> &BTreeSet<TemplateId> {
        &self.ranges
    }

    /// Views the custom relation as a link declaration with its range set.
    #[must_use]
    pub fn as_relation_type(&self) -> RelationType {
        let mut relation = RelationType::new(self.name.clone(), self.iri.clone(), RelationKind::Link);
        for range in &self.ranges {
            relation.add_range(*range);
        }
        relation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iri(text: &str) -> Iri {
        Iri::new(text).expect("valid iri")
    }

    #[test]
    fn link_relations_ignore_duplicate_targets() {
        let mut relation = Relation::targets("createdFrom", iri("https://example.org/createdFrom"));
        assert!(relation.push_target(EntityId::new(1)));
        assert!(!relation.push_target(EntityId::new(1)));
        assert!(relation.push_target(EntityId::new(2)));
        assert_eq!(relation.target_ids(), &[EntityId::new(1), EntityId::new(2)]);
        assert_eq!(relation.literal_value(), None);
    }

    #[test]
    fn literal_relations_reject_targets() {
        let mut relation = Relation::literal(
            "hasDescription",
            iri("https://example.org/hasDescription"),
            "oil on canvas",
        );
        assert!(!relation.push_target(EntityId::new(1)));
        assert_eq!(relation.literal_value(), Some("oil on canvas"));
        assert!(relation.target_ids().is_empty());
    }

    #[test]
    fn forgetting_a_target_drops_empty_links() {
        let mut entity = Entity::new(EntityId::new(0), "SA1", TemplateId::new(0));
        let mut link = Relation::targets("createdFrom", iri("https://example.org/createdFrom"));
        link.push_target(EntityId::new(1));
        entity.put_relation(link);
        entity.put_relation(Relation::literal(
            "hasDescription",
            iri("https://example.org/hasDescription"),
            "kept",
        ));

        entity.forget_target(EntityId::new(1));

        assert!(entity.relation("createdFrom").is_none());
        assert_eq!(
            entity
                .relation("hasDescription")
                .and_then(Relation::literal_value),
            Some("kept")
        );
    }

    #[test]
    fn custom_relations_expose_link_declaration() {
        let custom = CustomRelation::new(
            "createdFrom",
            iri("https://example.org/createdFrom"),
            BTreeSet::from([TemplateId::new(1)]),
            BTreeSet::from([TemplateId::new(0)]),
        );
        let declaration = custom.as_relation_type();
        assert_eq!(declaration.kind(), RelationKind::Link);
        assert!(declaration.ranges().contains(&TemplateId::new(0)));
    }
}
