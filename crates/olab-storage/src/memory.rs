use std::collections::HashSet;

use async_trait::async_trait;
use olab_core::{EnrichedPosting, StoredPosting};
use olab_enrich::{impute_salaries, plan_backfill, ImputationConfig, ImputationReport, UnhashedRow};
use tokio::sync::Mutex;
use tracing::info;

use crate::{known_subset, BackfillOutcome, InsertOutcome, PostingStore, StoreError};

#[derive(Debug, Default)]
struct MemoryState {
    rows: Vec<StoredPosting>,
    next_id: i64,
}

/// Process-local store with the same conflict and locking rules as the
/// PostgreSQL store. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryPostingStore {
    state: Mutex<MemoryState>,
    imputation: Mutex<()>,
}

impl MemoryPostingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with rows as they would come back from an existing table.
    pub fn with_rows(rows: Vec<StoredPosting>) -> Self {
        let next_id = rows.iter().map(|row| row.id).max().unwrap_or(0);
        Self {
            state: Mutex::new(MemoryState { rows, next_id }),
            imputation: Mutex::new(()),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PostingStore for MemoryPostingStore {
    async fn known_content_hashes(&self, hashes: &[String]) -> Result<HashSet<String>, StoreError> {
        let state = self.state.lock().await;
        Ok(known_subset(
            hashes,
            state
                .rows
                .iter()
                .map(|row| row.enriched.posting.raw_content_hash.as_str()),
        ))
    }

    async fn known_dedup_hashes(&self, hashes: &[String]) -> Result<HashSet<String>, StoreError> {
        let state = self.state.lock().await;
        Ok(known_subset(
            hashes,
            state.rows.iter().map(|row| row.enriched.dedup_hash.as_str()),
        ))
    }

    async fn insert_postings(&self, postings: &[EnrichedPosting]) -> Result<InsertOutcome, StoreError> {
        let mut state = self.state.lock().await;
        let mut taken: HashSet<String> = state
            .rows
            .iter()
            .filter(|row| !row.enriched.dedup_hash.is_empty())
            .map(|row| row.enriched.dedup_hash.clone())
            .collect();

        let mut outcome = InsertOutcome::default();
        for posting in postings {
            if !posting.dedup_hash.is_empty() && !taken.insert(posting.dedup_hash.clone()) {
                outcome.conflicts += 1;
                continue;
            }
            state.next_id += 1;
            let id = state.next_id;
            state.rows.push(StoredPosting {
                id,
                enriched: posting.clone(),
            });
            outcome.inserted += 1;
        }
        Ok(outcome)
    }

    async fn load_postings(&self) -> Result<Vec<StoredPosting>, StoreError> {
        Ok(self.state.lock().await.rows.clone())
    }

    async fn run_imputation(&self, config: ImputationConfig) -> Result<ImputationReport, StoreError> {
        let _pass = self
            .imputation
            .try_lock()
            .map_err(|_| StoreError::ImputationInProgress)?;

        let mut state = self.state.lock().await;
        let mut postings: Vec<EnrichedPosting> =
            state.rows.iter().map(|row| row.enriched.clone()).collect();
        let report = impute_salaries(&mut postings, config);
        for (row, posting) in state.rows.iter_mut().zip(postings) {
            row.enriched.salary_imputed = posting.salary_imputed;
        }
        info!(
            total_imputed = report.total_imputed,
            coverage_pct = report.coverage_pct,
            "in-memory imputation pass complete"
        );
        Ok(report)
    }

    async fn backfill_dedup_hashes(&self) -> Result<BackfillOutcome, StoreError> {
        let mut state = self.state.lock().await;
        let already_hashed: HashSet<String> = state
            .rows
            .iter()
            .filter(|row| !row.enriched.dedup_hash.is_empty())
            .map(|row| row.enriched.dedup_hash.clone())
            .collect();
        let unhashed = state
            .rows
            .iter()
            .filter(|row| row.enriched.dedup_hash.is_empty())
            .map(|row| UnhashedRow {
                id: row.id,
                title: row.enriched.posting.title.clone(),
                company: row.enriched.posting.company.clone(),
                municipality: row.enriched.posting.municipality.clone(),
            })
            .collect();

        let plan = plan_backfill(unhashed, &already_hashed);
        let removed: HashSet<i64> = plan.duplicates.iter().copied().collect();
        state.rows.retain(|row| !removed.contains(&row.id));
        for (id, hash) in &plan.updates {
            if let Some(row) = state.rows.iter_mut().find(|row| row.id == *id) {
                row.enriched.dedup_hash = hash.clone();
            }
        }

        Ok(BackfillOutcome {
            updated: plan.updates.len(),
            removed: plan.duplicates.len(),
        })
    }
}
