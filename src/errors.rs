//! # Application Error Handling

use crate::ontology::ScenarioError;
use crate::persistence::PersistenceError;
use crate::project::LoadError;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot parse `{1}`: {0}")]
    YAMLFile(#[source] serde_yaml::Error, String),

    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("logger: {0}")]
    Logger(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_errors_display_unchanged() {
        let load = LoadError::UnknownModel {
            prefix: "dem".to_string(),
        };
        let expected = load.to_string();

        let err = Error::from(load);

        assert!(matches!(err, Error::Load(LoadError::UnknownModel { .. })));
        assert_eq!(err.to_string(), expected);
    }
}
