/// Linear undo/redo history over snapshots of an ordered sequence.
///
/// Provides a `SequenceHistory` that stores a fully independent copy of the
/// sequence for every committed state and moves a cursor backward and forward
/// over them. History lives only in memory, for the lifetime of one editing
/// session.
pub mod config;
pub mod snapshot;

pub use config::HistoryConfig;
pub use snapshot::{HistoryState, SequenceHistory};
