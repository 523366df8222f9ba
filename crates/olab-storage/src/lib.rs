//! Posting sink: the store contract plus in-memory and PostgreSQL stores.

mod memory;
mod postgres;

use std::collections::HashSet;

use async_trait::async_trait;
use olab_core::{EnrichedPosting, StoredPosting, UnknownLabel};
use olab_enrich::{ImputationConfig, ImputationReport};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryPostingStore;
pub use postgres::PgPostingStore;

pub const CRATE_NAME: &str = "olab-storage";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("stored row {id} carries an unknown label: {source}")]
    Label {
        id: i64,
        #[source]
        source: UnknownLabel,
    },
    #[error("an imputation pass is already running")]
    ImputationInProgress,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertOutcome {
    pub inserted: usize,
    /// Rows dropped because their dedup hash was already stored.
    pub conflicts: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillOutcome {
    pub updated: usize,
    pub removed: usize,
}

/// Persistence contract for enriched postings.
///
/// A stored row whose `dedup_hash` is empty predates dedup hashing; only
/// [`PostingStore::backfill_dedup_hashes`] fills those in.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Subset of `hashes` already present as raw content hashes.
    async fn known_content_hashes(&self, hashes: &[String]) -> Result<HashSet<String>, StoreError>;

    /// Subset of `hashes` already present as dedup hashes.
    async fn known_dedup_hashes(&self, hashes: &[String]) -> Result<HashSet<String>, StoreError>;

    /// Insert postings, silently skipping any whose dedup hash is taken.
    async fn insert_postings(&self, postings: &[EnrichedPosting]) -> Result<InsertOutcome, StoreError>;

    async fn load_postings(&self) -> Result<Vec<StoredPosting>, StoreError>;

    /// Recompute every `salary_imputed` from the stored real salaries.
    /// Fails with [`StoreError::ImputationInProgress`] instead of waiting
    /// when another pass holds the lock.
    async fn run_imputation(&self, config: ImputationConfig) -> Result<ImputationReport, StoreError>;

    async fn backfill_dedup_hashes(&self) -> Result<BackfillOutcome, StoreError>;
}

pub(crate) fn known_subset<'a>(
    hashes: &[String],
    stored: impl IntoIterator<Item = &'a str>,
) -> HashSet<String> {
    let wanted: HashSet<&str> = hashes.iter().map(String::as_str).collect();
    stored
        .into_iter()
        .filter(|hash| wanted.contains(hash))
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_subset_keeps_only_requested_hashes() {
        let wanted = vec!["a".to_string(), "c".to_string()];
        let found = known_subset(&wanted, ["a", "b", "c", "a"]);
        assert_eq!(found, HashSet::from(["a".to_string(), "c".to_string()]));
    }

    #[test]
    fn in_progress_error_reads_plainly() {
        assert_eq!(
            StoreError::ImputationInProgress.to_string(),
            "an imputation pass is already running"
        );
    }
}
