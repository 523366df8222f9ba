//! Salary imputation by median, falling back from the most specific group
//! with enough samples to the least specific one.
//!
//! Level 1 groups by (sector, municipality, education, experience), level 2
//! by (sector, municipality), level 3 by sector. A missing education or
//! experience value is a group value of its own.

use std::collections::HashMap;
use std::hash::Hash;

use olab_core::{EducationLevel, EnrichedPosting, ExperienceLevel, Sector};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_SAMPLE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImputationConfig {
    /// Groups with fewer real salaries than this have no reference median.
    pub min_sample: usize,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            min_sample: DEFAULT_MIN_SAMPLE,
        }
    }
}

type Level1Key = (Sector, String, Option<EducationLevel>, Option<ExperienceLevel>);
type Level2Key = (Sector, String);

fn level1_key(p: &EnrichedPosting) -> Level1Key {
    (
        p.sector,
        p.posting.municipality.clone(),
        p.education_level,
        p.experience_level,
    )
}

fn level2_key(p: &EnrichedPosting) -> Level2Key {
    (p.sector, p.posting.municipality.clone())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImputationLevel {
    Level1,
    Level2,
    Level3,
}

/// Median tables built from postings with a real salary.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTables {
    level1: HashMap<Level1Key, i64>,
    level2: HashMap<Level2Key, i64>,
    level3: HashMap<Sector, i64>,
}

impl ReferenceTables {
    pub fn build(postings: &[EnrichedPosting], config: ImputationConfig) -> Self {
        let mut level1: HashMap<Level1Key, Vec<i64>> = HashMap::new();
        let mut level2: HashMap<Level2Key, Vec<i64>> = HashMap::new();
        let mut level3: HashMap<Sector, Vec<i64>> = HashMap::new();

        for posting in postings {
            let Some(salary) = posting.salary_numeric else {
                continue;
            };
            level1.entry(level1_key(posting)).or_default().push(salary);
            level2.entry(level2_key(posting)).or_default().push(salary);
            level3.entry(posting.sector).or_default().push(salary);
        }

        Self {
            level1: medians(level1, config.min_sample),
            level2: medians(level2, config.min_sample),
            level3: medians(level3, config.min_sample),
        }
    }

    /// Most specific reference median for a posting's groups.
    pub fn lookup(&self, posting: &EnrichedPosting) -> Option<(ImputationLevel, i64)> {
        if let Some(median) = self.level1.get(&level1_key(posting)) {
            return Some((ImputationLevel::Level1, *median));
        }
        if let Some(median) = self.level2.get(&level2_key(posting)) {
            return Some((ImputationLevel::Level2, *median));
        }
        self.level3
            .get(&posting.sector)
            .map(|median| (ImputationLevel::Level3, *median))
    }

    pub fn sizes(&self) -> ReferenceSizes {
        ReferenceSizes {
            level1: self.level1.len(),
            level2: self.level2.len(),
            level3: self.level3.len(),
        }
    }
}

fn medians<K: Eq + Hash>(groups: HashMap<K, Vec<i64>>, min_sample: usize) -> HashMap<K, i64> {
    groups
        .into_iter()
        .filter(|(_, values)| values.len() >= min_sample.max(1))
        .map(|(key, mut values)| {
            let median = interpolated_median(&mut values);
            (key, median.trunc() as i64)
        })
        .collect()
}

/// 50th percentile with linear interpolation between the two middle values.
/// `values` must be non-empty; it is sorted in place.
pub fn interpolated_median(values: &mut [i64]) -> f64 {
    values.sort_unstable();
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2] as f64
    } else {
        let lo = values[n / 2 - 1] as f64;
        let hi = values[n / 2] as f64;
        lo + (hi - lo) / 2.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSizes {
    pub level1: usize,
    pub level2: usize,
    pub level3: usize,
}

/// Outcome of one imputation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImputationReport {
    pub level1_hits: usize,
    pub level2_hits: usize,
    pub level3_hits: usize,
    pub misses: usize,
    pub total_imputed: usize,
    /// Postings without a real salary.
    pub total_candidates: usize,
    pub total_postings: usize,
    /// Share of postings with a real or imputed salary, in percent.
    pub coverage_pct: f64,
    pub reference_sizes: ReferenceSizes,
}

/// Clear every `salary_imputed`, rebuild the reference tables and fill the
/// gaps. Postings with a real salary are never given an imputed one.
pub fn impute_salaries(postings: &mut [EnrichedPosting], config: ImputationConfig) -> ImputationReport {
    for posting in postings.iter_mut() {
        posting.salary_imputed = None;
    }

    let tables = ReferenceTables::build(postings, config);
    let mut report = ImputationReport {
        total_postings: postings.len(),
        reference_sizes: tables.sizes(),
        ..Default::default()
    };

    for posting in postings.iter_mut() {
        if posting.salary_numeric.is_some() {
            continue;
        }
        report.total_candidates += 1;
        match tables.lookup(posting) {
            Some((level, median)) => {
                posting.salary_imputed = Some(median);
                match level {
                    ImputationLevel::Level1 => report.level1_hits += 1,
                    ImputationLevel::Level2 => report.level2_hits += 1,
                    ImputationLevel::Level3 => report.level3_hits += 1,
                }
            }
            None => report.misses += 1,
        }
    }

    report.total_imputed = report.level1_hits + report.level2_hits + report.level3_hits;
    let covered = postings
        .iter()
        .filter(|p| p.effective_salary().is_some())
        .count();
    report.coverage_pct = if postings.is_empty() {
        0.0
    } else {
        (covered as f64 / postings.len() as f64 * 1000.0).round() / 10.0
    };
    report
}
