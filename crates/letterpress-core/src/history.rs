// Re-exports from letterpress-mod-history, specialized to block sequences.
pub use letterpress_mod_history::{HistoryConfig, HistoryState, SequenceHistory};

use crate::block::Block;

/// Undo/redo history over snapshots of a newsletter's block sequence.
pub type BlockHistory = SequenceHistory<Block>;
