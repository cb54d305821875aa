//! Scenario graph domain primitives.
//!
//! The module keeps the pure domain constructs of a Digital Ecosystem Model
//! scenario: ontology models, templates (classes), entities (instances) and
//! the relations between them. Persistence and transport live elsewhere.

pub mod catalog;
pub mod entities;
pub mod scenario;
pub mod value_objects;

pub use catalog::{
    builtin_ontologies, LinkDefinition, OntologyDefinition, ScenarioDefinition, TemplateDefinition,
};
pub use entities::{
    CustomRelation, Entity, Model, ModelKind, Relation, RelationKind, RelationType,
    RelationValue, Template,
};
pub use scenario::{Scenario, ScenarioError, ScenarioSummary};
pub use value_objects::{EntityId, Iri, IriError, ModelId, TemplateId};
