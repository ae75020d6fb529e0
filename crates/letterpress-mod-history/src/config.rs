/// Configuration for the snapshot history.
///
/// History is unbounded unless `max_depth` is set. A bounded history drops
/// its oldest snapshots first, which makes them unreachable by undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept. `None` keeps every snapshot.
    pub max_depth: Option<usize>,
}

impl HistoryConfig {
    /// An unbounded history.
    pub fn unbounded() -> Self {
        Self { max_depth: None }
    }

    /// A history capped at `max_depth` snapshots.
    ///
    /// A depth of zero would make every push vanish, so it is treated as
    /// unbounded.
    pub fn bounded(max_depth: usize) -> Self {
        Self {
            max_depth: (max_depth > 0).then_some(max_depth),
        }
    }
}
