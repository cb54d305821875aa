//! Projection of a scenario onto an RDF graph.
//!
//! Ontology templates are referenced by IRI only. The projection emits the
//! scenario's own vocabulary (custom templates and custom relations) and
//! the individuals created from selected templates.

use std::fmt::Write as _;

use oxrdf::vocab::{rdf, rdfs};
use oxrdf::{Graph, Literal, NamedNode, NamedNodeRef, Term, Triple};
use tracing::debug;

use crate::ontology::{Entity, Iri, IriError, RelationValue, Scenario};

pub mod owl {
    use oxrdf::NamedNodeRef;

    pub const NAMESPACE: &str = "http://www.w3.org/2002/07/owl#";
    pub const CLASS: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#Class");
    pub const OBJECT_PROPERTY: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#ObjectProperty");
    pub const NAMED_INDIVIDUAL: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#NamedIndividual");
    pub const VERSION_INFO: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/2002/07/owl#versionInfo");
}

const RDF_NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
const RDFS_NAMESPACE: &str = "http://www.w3.org/2000/01/rdf-schema#";

/// Prefix declarations for serializers: one per model plus the core vocabularies.
#[must_use]
pub fn prefixes(scenario: &Scenario) -> Vec<(String, String)> {
    let mut prefixes = vec![
        ("rdf".to_string(), RDF_NAMESPACE.to_string()),
        ("rdfs".to_string(), RDFS_NAMESPACE.to_string()),
        ("owl".to_string(), owl::NAMESPACE.to_string()),
    ];
    for model in scenario.models() {
        if prefixes.iter().all(|(prefix, _)| prefix != model.prefix()) {
            prefixes.push((model.prefix().to_string(), model.namespace().to_string()));
        }
    }
    prefixes
}

/// IRI of an individual: `<scenario namespace><Template>_<Entity>`.
///
/// Both names are percent-encoded, `_` included, so distinct entities never
/// share an IRI.
pub fn entity_iri(scenario: &Scenario, entity: &Entity) -> Result<Iri, IriError> {
    let template = scenario
        .template(entity.template())
        .map(|template| encode_local_name(template.name()))
        .unwrap_or_default();
    Iri::join(
        scenario.scenario_model().namespace(),
        &format!("{template}_{}", encode_local_name(entity.name())),
    )
}

/// Keeps ASCII alphanumerics and `-.~`; every other byte becomes `%XX`.
fn encode_local_name(name: &str) -> String {
    let mut encoded = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'~') {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }
    encoded
}

/// Builds the RDF graph of a scenario.
pub fn project(scenario: &Scenario) -> Result<Graph, IriError> {
    let mut graph = Graph::new();
    let mut add = |subject: &NamedNode, predicate: NamedNodeRef<'_>, object: Term| {
        graph.insert(&Triple::new(
            subject.clone(),
            predicate.into_owned(),
            object,
        ));
    };

    for template in scenario.templates().filter(|template| template.is_custom()) {
        let class = template.iri().to_named_node();
        add(&class, rdf::TYPE, owl::CLASS.into_owned().into());
        add(
            &class,
            rdfs::LABEL,
            Literal::new_simple_literal(template.name()).into(),
        );
        for parent in template.parents() {
            if let Ok(parent) = scenario.template(*parent) {
                add(
                    &class,
                    rdfs::SUB_CLASS_OF,
                    parent.iri().to_named_node().into(),
                );
            }
        }
    }

    for relation in scenario.custom_relations() {
        let property = relation.iri().to_named_node();
        add(&property, rdf::TYPE, owl::OBJECT_PROPERTY.into_owned().into());
        add(
            &property,
            rdfs::LABEL,
            Literal::new_simple_literal(relation.name()).into(),
        );
        for (predicate, templates) in [
            (rdfs::DOMAIN, relation.domains()),
            (rdfs::RANGE, relation.ranges()),
        ] {
            for template in templates {
                if let Ok(template) = scenario.template(*template) {
                    add(&property, predicate, template.iri().to_named_node().into());
                }
            }
        }
    }

    let mut individuals = 0usize;
    for template in scenario.templates().filter(|template| template.is_selected()) {
        for id in template.entities() {
            let Ok(entity) = scenario.entity(*id) else {
                continue;
            };
            let subject = entity_iri(scenario, entity)?.to_named_node();
            add(&subject, rdf::TYPE, template.iri().to_named_node().into());
            add(&subject, rdf::TYPE, owl::NAMED_INDIVIDUAL.into_owned().into());
            add(
                &subject,
                rdfs::LABEL,
                Literal::new_simple_literal(entity.name()).into(),
            );
            if let Some(version) = entity.version() {
                add(
                    &subject,
                    owl::VERSION_INFO,
                    Literal::new_simple_literal(version).into(),
                );
            }
            if let Some(description) = entity.description() {
                add(
                    &subject,
                    rdfs::COMMENT,
                    Literal::new_simple_literal(description).into(),
                );
            }

            for relation in entity.relations().values() {
                let predicate = relation.iri().to_named_node();
                match relation.value() {
                    RelationValue::Literal(value) => {
                        add(
                            &subject,
                            predicate.as_ref(),
                            Literal::new_simple_literal(value.as_str()).into(),
                        );
                    }
                    RelationValue::Targets(targets) => {
                        for target in targets {
                            let Ok(target) = scenario.entity(*target) else {
                                continue;
                            };
                            let object = entity_iri(scenario, target)?.to_named_node();
                            add(&subject, predicate.as_ref(), object.into());
                        }
                    }
                }
            }
            individuals += 1;
        }
    }

    debug!(individuals, triples = graph.len(), "scenario_projected");
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use oxrdf::{TermRef, TripleRef};

    use super::*;
    use crate::ontology::{builtin_ontologies, ScenarioDefinition};

    fn scenario() -> Scenario {
        let mut scenario =
            Scenario::from_definitions(&ScenarioDefinition::default(), &builtin_ontologies())
                .expect("builtin definitions");
        let artist = scenario.template_by_name("Artist").expect("artist").id();
        scenario.select_template(artist).expect("select");
        let a1 = scenario.create_entity(artist, "A1").expect("a1");
        scenario
            .describe_entity(a1, Some("1.0".to_string()), None)
            .expect("describe");
        scenario
            .set_literal(a1, "hasDescription", "oil on canvas")
            .expect("literal");
        let special = scenario
            .add_custom_template("SpecialArtist", &[artist])
            .expect("custom");
        let sa1 = scenario.create_entity(special, "SA1").expect("sa1");
        scenario
            .add_custom_relation("createdFrom", &[special], &[artist])
            .expect("relation");
        scenario.link(sa1, "createdFrom", a1).expect("link");
        scenario
    }

    #[test]
    fn projects_custom_vocabulary_and_individuals() {
        let scenario = scenario();
        let graph = project(&scenario).expect("projection");

        let scenario_ns = "http://www.pericles-project.eu/ns/dem-scenario#";
        let special = NamedNode::new_unchecked(format!("{scenario_ns}SpecialArtist"));
        let artist = NamedNode::new_unchecked("http://www.pericles-project.eu/ns/dva#Artist");
        let a1 = NamedNode::new_unchecked(format!("{scenario_ns}Artist_A1"));
        let special_id = scenario.template_by_name("SpecialArtist").expect("special").id();
        let sa1_id = scenario.entity_by_name(special_id, "SA1").expect("sa1");
        let sa1 = entity_iri(&scenario, scenario.entity(sa1_id).expect("sa1"))
            .expect("iri")
            .to_named_node();
        assert_eq!(sa1.as_str(), format!("{scenario_ns}SpecialArtist_SA1"));
        let created_from = NamedNode::new_unchecked(format!("{scenario_ns}createdFrom"));

        assert!(graph.contains(TripleRef::new(&special, rdf::TYPE, owl::CLASS)));
        assert!(graph.contains(TripleRef::new(&special, rdfs::SUB_CLASS_OF, &artist)));
        assert!(graph.contains(TripleRef::new(&created_from, rdfs::RANGE, &artist)));
        assert!(graph.contains(TripleRef::new(&a1, rdf::TYPE, &artist)));
        assert!(graph.contains(TripleRef::new(
            &a1,
            owl::VERSION_INFO,
            &Literal::new_simple_literal("1.0")
        )));
        assert!(graph.contains(TripleRef::new(&sa1, &created_from, &a1)));
    }

    #[test]
    fn unselected_templates_are_not_projected() {
        let mut scenario = scenario();
        let artist = scenario.template_by_name("Artist").expect("artist").id();
        scenario.deselect_template(artist).expect("deselect");

        let graph = project(&scenario).expect("projection");

        let a1 = NamedNode::new_unchecked(
            "http://www.pericles-project.eu/ns/dem-scenario#Artist_A1",
        );
        assert!(graph.triples_for_subject(&a1).next().is_none());
    }

    #[test]
    fn declares_one_prefix_per_model() {
        let prefixes = prefixes(&scenario());
        let names: Vec<_> = prefixes.iter().map(|(prefix, _)| prefix.as_str()).collect();
        assert_eq!(names, ["rdf", "rdfs", "owl", "dem", "dva", "scenario"]);
    }

    #[test]
    fn entities_differing_only_in_case_get_distinct_iris() {
        let mut scenario = scenario();
        let artwork = scenario.template_by_name("Artwork").expect("artwork").id();
        scenario.select_template(artwork).expect("select");
        let lower = scenario.create_entity(artwork, "w1").expect("w1");
        let upper = scenario.create_entity(artwork, "W1").expect("W1");
        scenario.set_literal(lower, "hasTitle", "Dawn").expect("title");
        scenario.set_literal(upper, "hasTitle", "Dusk").expect("title");

        let lower = entity_iri(&scenario, scenario.entity(lower).expect("w1")).expect("iri");
        let upper = entity_iri(&scenario, scenario.entity(upper).expect("W1")).expect("iri");
        assert_ne!(lower, upper);

        let graph = project(&scenario).expect("projection");
        let title = NamedNode::new_unchecked("http://www.pericles-project.eu/ns/dva#hasTitle");
        for (iri, value) in [(&lower, "Dawn"), (&upper, "Dusk")] {
            let subject = iri.to_named_node();
            let expected = Literal::new_simple_literal(value);
            let titles: Vec<TermRef<'_>> = graph
                .objects_for_subject_predicate(&subject, &title)
                .collect();
            assert_eq!(titles, vec![TermRef::from(expected.as_ref())]);
        }
    }

    #[test]
    fn local_names_escape_separators_and_spaces() {
        assert_eq!(encode_local_name("A1"), "A1");
        assert_eq!(encode_local_name("Spring Show"), "Spring%20Show");
        assert_eq!(encode_local_name("spring_show"), "spring%5Fshow");
        assert_eq!(encode_local_name("50%"), "50%25");
        assert_eq!(encode_local_name("Café"), "Caf%C3%A9");
    }
}
