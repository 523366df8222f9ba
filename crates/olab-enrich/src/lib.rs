//! Text-derived enrichment of job postings: skills, sector, attributes,
//! salary, cross-portal fingerprint and municipality code, plus the batch
//! salary imputation that runs over persisted postings.
//!
//! Everything here is pure and synchronous; pattern tables are compiled once
//! per process and shared read-only, so postings can be enriched in parallel.

mod attributes;
mod dedup;
mod impute;
mod municipality;
mod normalize;
mod rules;
mod salary;
mod sector;
mod skills;

use olab_core::{EnrichedPosting, JobPosting};

pub use attributes::{extract_attributes, PostingAttributes};
pub use dedup::{compute_dedup_hash, plan_backfill, BackfillPlan, UnhashedRow, DEDUP_HASH_LEN};
pub use impute::{
    impute_salaries, interpolated_median, ImputationConfig, ImputationLevel, ImputationReport,
    ReferenceSizes, ReferenceTables, DEFAULT_MIN_SAMPLE,
};
pub use municipality::dane_code;
pub use normalize::normalize_text;
pub use salary::{parse_salary, SALARY_FLOOR};
pub use sector::classify_sector;
pub use skills::{categorize_skills, extract_skills, SkillCategory};

pub const CRATE_NAME: &str = "olab-enrich";

/// Run every extractor over one posting. `salary_imputed` starts empty.
pub fn enrich_posting(posting: JobPosting) -> EnrichedPosting {
    let title = Some(posting.title.as_str());
    let description = posting.description.as_deref();

    let skills = extract_skills(title, description);
    let sector = classify_sector(title, description);
    let attributes = extract_attributes(title, description);
    let salary_numeric = parse_salary(posting.salary_text.as_deref());
    let dedup_hash = compute_dedup_hash(
        &posting.title,
        posting.company.as_deref(),
        Some(&posting.municipality),
    );
    let dane_code = dane_code(Some(&posting.municipality)).map(ToString::to_string);

    EnrichedPosting {
        posting,
        skills,
        sector,
        experience_level: attributes.experience_level,
        contract_type: attributes.contract_type,
        education_level: attributes.education_level,
        modality: attributes.modality,
        salary_numeric,
        salary_imputed: None,
        dedup_hash,
        dane_code,
    }
}
