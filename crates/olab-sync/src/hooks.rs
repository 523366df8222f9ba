//! Pipeline stages that can be swapped out: enrichment and deduplication.

use std::collections::HashSet;

use anyhow::Result;
use olab_core::{EnrichedPosting, JobPosting};
use olab_enrich::enrich_posting;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

pub trait EnrichmentHook: Send + Sync {
    /// Must return one enriched posting per input, in input order.
    fn apply(&self, postings: Vec<JobPosting>) -> Result<Vec<EnrichedPosting>>;
}

pub trait DedupHook: Send + Sync {
    fn apply(&self, items: Vec<EnrichedPosting>, stored: &HashSet<String>) -> Result<DedupOutcome>;
}

/// Runs every pattern extractor over the batch on the rayon pool.
#[derive(Debug, Default)]
pub struct PatternEnrichmentHook;

impl EnrichmentHook for PatternEnrichmentHook {
    fn apply(&self, postings: Vec<JobPosting>) -> Result<Vec<EnrichedPosting>> {
        Ok(postings.into_par_iter().map(enrich_posting).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReason {
    AlreadyStored,
    EarlierInBatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePosting {
    pub dedup_hash: String,
    pub source: String,
    pub title: String,
    pub reason: DuplicateReason,
}

#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    pub kept: Vec<EnrichedPosting>,
    pub duplicates: Vec<DuplicatePosting>,
}

/// Cross-portal dedup on the fingerprint hash: a posting is dropped when its
/// hash is already stored or appeared earlier in the same batch.
#[derive(Debug, Default)]
pub struct HashDedupHook;

impl DedupHook for HashDedupHook {
    fn apply(&self, items: Vec<EnrichedPosting>, stored: &HashSet<String>) -> Result<DedupOutcome> {
        let mut seen = HashSet::new();
        let mut outcome = DedupOutcome::default();
        for item in items {
            let reason = if stored.contains(&item.dedup_hash) {
                Some(DuplicateReason::AlreadyStored)
            } else if !seen.insert(item.dedup_hash.clone()) {
                Some(DuplicateReason::EarlierInBatch)
            } else {
                None
            };
            match reason {
                Some(reason) => outcome.duplicates.push(DuplicatePosting {
                    dedup_hash: item.dedup_hash,
                    source: item.posting.source,
                    title: item.posting.title,
                    reason,
                }),
                None => outcome.kept.push(item),
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, municipality: &str, source: &str) -> JobPosting {
        JobPosting {
            title: title.to_string(),
            description: None,
            company: None,
            municipality: municipality.to_string(),
            salary_text: None,
            publication_date: None,
            source: source.to_string(),
            link: None,
            scraped_at: None,
            raw_content_hash: format!("{source}:{title}"),
        }
    }

    #[test]
    fn parallel_enrichment_keeps_input_order() {
        let titles: Vec<String> = (0..200).map(|i| format!("Vacante {i}")).collect();
        let postings = titles.iter().map(|t| raw(t, "Turbo", "computrabajo")).collect();
        let enriched = PatternEnrichmentHook.apply(postings).expect("enrich");
        let out: Vec<&str> = enriched.iter().map(|e| e.posting.title.as_str()).collect();
        let expected: Vec<&str> = titles.iter().map(String::as_str).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn first_posting_in_batch_wins() {
        let items = PatternEnrichmentHook
            .apply(vec![
                raw("Operario de cosecha", "Apartadó", "computrabajo"),
                raw("OPERARIO DE COSECHA", "apartado", "elempleo"),
                raw("Vendedor", "Turbo", "elempleo"),
            ])
            .expect("enrich");
        let outcome = HashDedupHook.apply(items, &HashSet::new()).expect("dedup");

        assert_eq!(outcome.kept.len(), 2);
        assert_eq!(outcome.kept[0].posting.source, "computrabajo");
        assert_eq!(outcome.duplicates.len(), 1);
        assert_eq!(outcome.duplicates[0].source, "elempleo");
        assert_eq!(outcome.duplicates[0].reason, DuplicateReason::EarlierInBatch);
    }

    #[test]
    fn stored_hashes_are_skipped() {
        let items = PatternEnrichmentHook
            .apply(vec![raw("Cajero", "Turbo", "magneto")])
            .expect("enrich");
        let stored = HashSet::from([items[0].dedup_hash.clone()]);
        let outcome = HashDedupHook.apply(items, &stored).expect("dedup");
        assert!(outcome.kept.is_empty());
        assert_eq!(outcome.duplicates[0].reason, DuplicateReason::AlreadyStored);
    }
}
