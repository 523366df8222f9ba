use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::normalize::normalize_text;

/// Hex characters kept from the SHA-256 digest (64 bits).
pub const DEDUP_HASH_LEN: usize = 16;

const FIELD_DELIMITER: &str = "|";

/// Fingerprint of a vacancy across portals: SHA-256 over the normalized
/// `title|company|municipality`, truncated to 16 hex characters.
pub fn compute_dedup_hash(title: &str, company: Option<&str>, municipality: Option<&str>) -> String {
    let canonical = [
        normalize_text(Some(title)),
        normalize_text(company),
        normalize_text(municipality),
    ]
    .join(FIELD_DELIMITER);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(DEDUP_HASH_LEN);
    hex
}

/// A stored row that predates dedup hashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnhashedRow {
    pub id: i64,
    pub title: String,
    pub company: Option<String>,
    pub municipality: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillPlan {
    /// `(row id, hash)` for rows that keep their place.
    pub updates: Vec<(i64, String)>,
    /// Rows whose hash was already claimed, by an earlier row or a hashed row.
    pub duplicates: Vec<i64>,
}

/// Assign hashes to unhashed rows. Rows are visited in id order so the
/// oldest row of each vacancy is the one kept.
pub fn plan_backfill(mut rows: Vec<UnhashedRow>, already_hashed: &HashSet<String>) -> BackfillPlan {
    rows.sort_by_key(|row| row.id);
    let mut claimed = HashSet::new();
    let mut plan = BackfillPlan::default();
    for row in rows {
        let hash = compute_dedup_hash(&row.title, row.company.as_deref(), Some(&row.municipality));
        if already_hashed.contains(&hash) || !claimed.insert(hash.clone()) {
            plan.duplicates.push(row.id);
        } else {
            plan.updates.push((row.id, hash));
        }
    }
    plan
}
