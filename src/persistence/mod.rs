//! Writing a scenario to disk in every supported format.
//!
//! A save starts with choosing an output directory, which the operator may
//! cancel. The resulting [`SaveSession`] fixes the directory, the file stem
//! and the date for every file of the run, and the [`Dispatcher`] hands it to
//! each registered [`Saver`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::{debug, info};

use crate::ontology::{IriError, Scenario};
use crate::project::SnapshotError;

mod savers;

pub use savers::{ProjectSaver, RdfXmlSaver, TurtleSaver};

/// Source of the output directory for a save.
pub trait DirectoryChooser {
    /// Returns the directory to write into.
    ///
    /// `None` means the operator cancelled; callers abort silently.
    fn choose_output_directory(&mut self) -> Option<PathBuf>;
}

/// Chooser that always answers with the same directory.
#[derive(Clone, Debug)]
pub struct FixedDirectory(pub PathBuf);

impl DirectoryChooser for FixedDirectory {
    fn choose_output_directory(&mut self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

/// Chooser that models an operator dismissing the dialog.
#[derive(Clone, Copy, Debug, Default)]
pub struct Cancelled;

impl DirectoryChooser for Cancelled {
    fn choose_output_directory(&mut self) -> Option<PathBuf> {
        None
    }
}

/// Output location and naming shared by every file of one save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveSession {
    directory: PathBuf,
    stem: String,
    date: NaiveDate,
}

impl SaveSession {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, stem: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            directory: directory.into(),
            stem: stem.into(),
            date,
        }
    }

    /// Session dated with the local calendar day.
    #[must_use]
    pub fn today(directory: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self::new(directory, stem, Local::now().date_naive())
    }

    /// Asks `chooser` for a directory; `None` when the operator cancelled.
    pub fn choose(chooser: &mut dyn DirectoryChooser, stem: &str) -> Option<Self> {
        chooser
            .choose_output_directory()
            .map(|directory| Self::today(directory, stem))
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// `<directory>/<folder>/<stem>_<YYYY-MM-DD>.<extension>`
    #[must_use]
    pub fn file_path(&self, folder: &str, extension: &str) -> PathBuf {
        self.directory.join(folder).join(format!(
            "{}_{}.{extension}",
            self.stem,
            self.date.format("%Y-%m-%d")
        ))
    }
}

/// One output format.
pub trait Saver {
    /// Fixed subfolder of the output directory.
    fn folder(&self) -> &'static str;

    fn extension(&self) -> &'static str;

    /// Serializes the scenario into the file content.
    fn render(&self, scenario: &Scenario) -> Result<Vec<u8>, PersistenceError>;

    /// Renders and writes the file, returning its path.
    ///
    /// Nothing is written when rendering fails.
    fn save(&self, session: &SaveSession, scenario: &Scenario) -> Result<PathBuf, PersistenceError> {
        let content = self.render(scenario)?;
        let path = session.file_path(self.folder(), self.extension());
        write_file(&path, &content)?;
        debug!(path = %path.display(), bytes = content.len(), "scenario_file_written");
        Ok(path)
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<(), PersistenceError> {
    let io = |source: std::io::Error| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io)?;
    }
    if let Err(source) = fs::write(path, content) {
        // a partially written file must not survive the failure
        let _ = fs::remove_file(path);
        return Err(io(source));
    }
    Ok(())
}

/// Runs every registered saver against one session.
pub struct Dispatcher {
    savers: Vec<Box<dyn Saver>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self { savers: Vec::new() }
    }

    /// Turtle, RDF/XML and project snapshot savers.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .add(TurtleSaver)
            .add(RdfXmlSaver)
            .add(ProjectSaver)
    }

    #[must_use]
    pub fn add(mut self, saver: impl Saver + 'static) -> Self {
        self.savers.push(Box::new(saver));
        self
    }

    /// Writes every format and returns the written paths in saver order.
    ///
    /// Stops at the first failing saver.
    pub fn save_all(
        &self,
        session: &SaveSession,
        scenario: &Scenario,
    ) -> Result<Vec<PathBuf>, PersistenceError> {
        let paths = self
            .savers
            .iter()
            .map(|saver| saver.save(session, scenario))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            directory = %session.directory().display(),
            files = paths.len(),
            "scenario_saved"
        );
        Ok(paths)
    }

    /// Chooses a directory and saves; `Ok(None)` when the operator cancelled.
    pub fn save_with(
        &self,
        chooser: &mut dyn DirectoryChooser,
        stem: &str,
        scenario: &Scenario,
    ) -> Result<Option<Vec<PathBuf>>, PersistenceError> {
        let Some(session) = SaveSession::choose(chooser, stem) else {
            info!("save_cancelled");
            return Ok(None);
        };
        self.save_all(&session, scenario).map(Some)
    }
}

/// Errors raised while writing scenario files.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid namespace for prefix `{prefix}`: {source}")]
    Prefix {
        prefix: String,
        source: oxrdf::IriParseError,
    },
    #[error("RDF serialization failed: {0}")]
    Serialize(#[source] std::io::Error),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Iri(#[from] IriError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).expect("valid date")
    }

    #[test]
    fn file_path_is_date_suffixed_inside_the_format_folder() {
        let session = SaveSession::new("/out", "scenario", date());
        assert_eq!(
            session.file_path("turtle", "ttl"),
            PathBuf::from("/out/turtle/scenario_2024-03-09.ttl")
        );
    }

    #[test]
    fn cancelled_chooser_yields_no_session() {
        assert!(SaveSession::choose(&mut Cancelled, "scenario").is_none());
        let session = SaveSession::choose(&mut FixedDirectory("/out".into()), "scenario")
            .expect("session");
        assert_eq!(session.directory(), Path::new("/out"));
        assert_eq!(session.stem(), "scenario");
    }
}
