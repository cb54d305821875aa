//! Scenario graphs for the Digital Ecosystem Model.
//!
//! A [`ontology::Scenario`] holds the templates of predefined ontologies, the
//! custom templates and relations a user adds, and the entities instantiated
//! from them. [`project`] saves and reloads that graph through a versioned
//! snapshot, [`rdf`] projects it onto RDF and [`persistence`] writes every
//! output format into a chosen directory.

pub use self::errors::Error;

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod logger;
pub mod ontology;
pub mod persistence;
pub mod project;
pub mod rdf;

/// Application results options list
pub type Result<T, E = Error> = std::result::Result<T, E>;
