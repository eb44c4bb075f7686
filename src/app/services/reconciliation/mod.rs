//! Reconciliation of export races into the persisted race list
//!
//! - [`store`] - Bucketed race state, diffing, cleanup of orphaned races
//! - [`output`] - Timestamped backups and atomic replacement of `Lynx.evt`
//! - [`stats`] - Added/updated/unchanged/removed summaries

pub mod output;
pub mod stats;
pub mod store;

#[cfg(test)]
pub mod tests;

pub use output::{backup_file, unique_backup_path, write_atomic, write_race_list};
pub use stats::ProcessingStats;
pub use store::{ReconciliationStore, SourceKey};
