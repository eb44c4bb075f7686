//! Per-reconciliation statistics

use serde::Serialize;

/// Outcome of reconciling one source, by race number
///
/// Lists keep the order races appeared in the incoming batch; removed races
/// keep the order of the source's previous batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingStats {
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    pub removed: Vec<String>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn races_added(&self) -> usize {
        self.added.len()
    }

    pub fn races_updated(&self) -> usize {
        self.updated.len()
    }

    pub fn races_unchanged(&self) -> usize {
        self.unchanged.len()
    }

    pub fn races_removed(&self) -> usize {
        self.removed.len()
    }

    /// Races present in the incoming batch
    pub fn total_processed(&self) -> usize {
        self.races_added() + self.races_updated() + self.races_unchanged()
    }

    /// Whether the batch changed anything for its source
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.updated.is_empty() || !self.removed.is_empty()
    }

    fn categories(&self) -> [(&'static str, &[String]); 4] {
        [
            ("added", self.added.as_slice()),
            ("updated", self.updated.as_slice()),
            ("unchanged", self.unchanged.as_slice()),
            ("removed", self.removed.as_slice()),
        ]
    }

    /// Counts only, e.g. `"2 added, 1 unchanged"`
    pub fn summary(&self) -> String {
        let parts: Vec<String> = self
            .categories()
            .iter()
            .filter(|(_, numbers)| !numbers.is_empty())
            .map(|(label, numbers)| format!("{} {}", numbers.len(), label))
            .collect();

        if parts.is_empty() {
            "no races".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// Counts with race numbers, e.g. `"2 added (21A, 22A), 1 unchanged (23A)"`
    pub fn detailed(&self) -> String {
        let parts: Vec<String> = self
            .categories()
            .iter()
            .filter(|(_, numbers)| !numbers.is_empty())
            .map(|(label, numbers)| format!("{} {} ({})", numbers.len(), label, numbers.join(", ")))
            .collect();

        if parts.is_empty() {
            "no races".to_string()
        } else {
            parts.join(", ")
        }
    }
}
