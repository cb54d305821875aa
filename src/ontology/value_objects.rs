use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use oxrdf::NamedNode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Value object ensuring that supplied text represents a valid IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Iri {
    value: String,
}

impl Iri {
    /// Validates and constructs a new [`Iri`] value object.
    ///
    /// The constructor rejects malformed identifiers so every template,
    /// relation and entity in a scenario carries a canonical identifier.
    pub fn new(value: impl Into<String>) -> Result<Self, IriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| IriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// Joins a namespace and a local name into a validated IRI.
    pub fn join(namespace: &Iri, local: &str) -> Result<Self, IriError> {
        Self::new(format!("{}{local}", namespace.as_str()))
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Converts the IRI into an `oxrdf` node.
    #[must_use]
    pub fn to_named_node(&self) -> NamedNode {
        NamedNode::new_unchecked(self.value.clone())
    }
}

impl Display for Iri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Iri {
    type Err = IriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for Iri {
    type Error = IriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Iri> for String {
    fn from(value: Iri) -> Self {
        value.value
    }
}

/// Errors produced when validating an [`Iri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IriError {
    /// The provided text could not be parsed as an IRI.
    #[error("invalid IRI: {value}")]
    Invalid { value: String },
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(usize);

        impl $name {
            pub(crate) fn new(index: usize) -> Self {
                Self(index)
            }

            pub(crate) fn index(self) -> usize {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Stable handle of a model inside a scenario.
    ModelId,
    "model"
);
arena_id!(
    /// Stable handle of a template inside a scenario.
    TemplateId,
    "template"
);
arena_id!(
    /// Stable handle of an entity, assigned once at creation and never reused.
    EntityId,
    "entity"
);

#[cfg(test)]
mod tests {
    use super::{EntityId, Iri};

    #[test]
    fn accepts_valid_iri() {
        let iri = Iri::new("https://example.org/resource").expect("valid IRI");
        assert_eq!(iri.as_str(), "https://example.org/resource");
    }

    #[test]
    fn rejects_invalid_iri() {
        let err = Iri::new("not an iri").expect_err("invalid IRI");
        assert!(matches!(err, super::IriError::Invalid { value } if value == "not an iri"));
    }

    #[test]
    fn joins_namespace_and_local_name() {
        let namespace = Iri::new("http://www.pericles-project.eu/ns/dva#").expect("namespace");
        let iri = Iri::join(&namespace, "Artist").expect("joined");
        assert_eq!(iri.as_str(), "http://www.pericles-project.eu/ns/dva#Artist");
        assert!(Iri::join(&namespace, "has space").is_err());
    }

    #[test]
    fn deserialization_validates_text() {
        let iri: Iri = serde_json::from_str("\"https://example.org/x\"").expect("valid");
        assert_eq!(iri.as_str(), "https://example.org/x");
        assert!(serde_json::from_str::<Iri>("\"nope\"").is_err());
    }

    #[test]
    fn ids_display_with_their_kind() {
        assert_eq!(EntityId::new(3).to_string(), "entity#3");
    }
}
