//! Project files: the snapshot IR and the loader that merges it back into a
//! live scenario.

pub mod loader;
pub mod snapshot;

pub use loader::{LoadError, LoadReport, ProjectLoader};
pub use snapshot::{
    CustomRelationRecord, EntityRecord, EntityRef, ModelRecord, RelationRecord, ScenarioSnapshot,
    SnapshotError, TemplateRecord, SNAPSHOT_VERSION,
};
