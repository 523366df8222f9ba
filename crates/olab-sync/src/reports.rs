//! Per-run artifacts: the markdown brief, the JSON delta and Parquet
//! snapshots with a checksum manifest.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow_array::{ArrayRef, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field as ArrowField, Schema};
use chrono::{DateTime, Utc};
use olab_core::EnrichedPosting;
use olab_enrich::{ImputationReport, SkillCategory};
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use uuid::Uuid;

use crate::hooks::DuplicatePosting;

pub const BRIEF_FILE: &str = "ingest_brief.md";
pub const DELTA_FILE: &str = "postings_delta.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunRecord {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: String,
    pub enabled_sources: Vec<String>,
    pub fetched_per_source: BTreeMap<String, usize>,
    pub skipped_known_content: usize,
    pub insert_conflicts: usize,
}

/// Everything a run produced, as written to `postings_delta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunDelta {
    pub run: IngestRunRecord,
    pub inserted: Vec<EnrichedPosting>,
    pub duplicates: Vec<DuplicatePosting>,
    pub imputation: Option<ImputationReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParquetManifest {
    pub schema_version: u32,
    pub files: Vec<ParquetManifestFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParquetManifestFile {
    pub name: String,
    pub path: String,
    pub sha256: String,
    pub bytes: u64,
}

pub(crate) fn render_brief(delta: &RunDelta) -> String {
    let run = &delta.run;
    let mut sector_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut inserted_per_source: BTreeMap<&str, usize> = BTreeMap::new();
    for item in &delta.inserted {
        *sector_counts.entry(item.sector.as_str()).or_default() += 1;
        *inserted_per_source.entry(item.posting.source.as_str()).or_default() += 1;
    }

    let mut lines = vec![
        "# Ingest Brief".to_string(),
        String::new(),
        format!("- Run ID: `{}`", run.run_id),
        format!("- Started: {}", run.started_at),
        format!("- Finished: {}", run.finished_at),
        format!("- Enabled sources: {}", run.enabled_sources.len()),
        format!("- Skipped (content already stored): {}", run.skipped_known_content),
        format!("- Skipped (cross-portal duplicates): {}", delta.duplicates.len()),
        format!("- Insert conflicts: {}", run.insert_conflicts),
        format!("- Inserted postings: {}", delta.inserted.len()),
        String::new(),
        "## Fetched per source".to_string(),
    ];
    for (source, fetched) in &run.fetched_per_source {
        let inserted = inserted_per_source.get(source.as_str()).copied().unwrap_or(0);
        lines.push(format!("- {source}: {fetched} fetched, {inserted} inserted"));
    }

    lines.push(String::new());
    lines.push("## Inserted per sector".to_string());
    if sector_counts.is_empty() {
        lines.push("- none".to_string());
    }
    for (sector, count) in &sector_counts {
        lines.push(format!("- {sector}: {count}"));
    }

    lines.push(String::new());
    lines.push("## Salary imputation".to_string());
    match &delta.imputation {
        Some(report) => {
            lines.push(format!(
                "- Candidates: {} of {} postings",
                report.total_candidates, report.total_postings
            ));
            lines.push(format!(
                "- Imputed: {} (level 1: {}, level 2: {}, level 3: {})",
                report.total_imputed, report.level1_hits, report.level2_hits, report.level3_hits
            ));
            lines.push(format!("- Without estimate: {}", report.misses));
            lines.push(format!("- Salary coverage: {:.1}%", report.coverage_pct));
        }
        None => lines.push("- not run".to_string()),
    }
    lines.push(String::new());
    lines.join("\n")
}

pub(crate) async fn write_reports(workspace_root: &Path, delta: &RunDelta) -> Result<PathBuf> {
    let reports_dir = workspace_root
        .join("reports")
        .join(delta.run.run_id.to_string());
    fs::create_dir_all(&reports_dir)
        .await
        .with_context(|| format!("creating {}", reports_dir.display()))?;

    fs::write(reports_dir.join(BRIEF_FILE), render_brief(delta))
        .await
        .with_context(|| format!("writing {BRIEF_FILE}"))?;

    let delta_json = serde_json::to_vec_pretty(delta).context("serializing postings delta")?;
    fs::write(reports_dir.join(DELTA_FILE), delta_json)
        .await
        .with_context(|| format!("writing {DELTA_FILE}"))?;

    Ok(reports_dir)
}

pub(crate) async fn export_parquet_snapshots(
    reports_dir: &Path,
    inserted: &[EnrichedPosting],
) -> Result<PathBuf> {
    let snapshot_dir = reports_dir.join("snapshots");
    fs::create_dir_all(&snapshot_dir)
        .await
        .with_context(|| format!("creating {}", snapshot_dir.display()))?;

    let postings_path = snapshot_dir.join("postings.parquet");
    let skills_path = snapshot_dir.join("skills.parquet");
    write_postings_parquet(&postings_path, inserted)?;
    write_skills_parquet(&skills_path, inserted)?;

    let manifest = ParquetManifest {
        schema_version: 1,
        files: vec![
            manifest_entry("postings", reports_dir, &postings_path)?,
            manifest_entry("skills", reports_dir, &skills_path)?,
        ],
    };
    let manifest_path = snapshot_dir.join("manifest.json");
    let bytes = serde_json::to_vec_pretty(&manifest).context("serializing parquet manifest")?;
    fs::write(&manifest_path, bytes)
        .await
        .with_context(|| format!("writing {}", manifest_path.display()))?;
    Ok(manifest_path)
}

fn write_parquet(path: &Path, batch: RecordBatch) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .with_context(|| format!("opening parquet writer {}", path.display()))?;
    writer
        .write(&batch)
        .with_context(|| format!("writing record batch {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("closing parquet writer {}", path.display()))?;
    Ok(())
}

fn utf8_column<'a>(values: impl Iterator<Item = Option<&'a str>>) -> ArrayRef {
    Arc::new(StringArray::from(values.collect::<Vec<_>>()))
}

fn write_postings_parquet(path: &Path, postings: &[EnrichedPosting]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        ArrowField::new("dedup_hash", DataType::Utf8, false),
        ArrowField::new("source", DataType::Utf8, false),
        ArrowField::new("title", DataType::Utf8, false),
        ArrowField::new("municipality", DataType::Utf8, false),
        ArrowField::new("dane_code", DataType::Utf8, true),
        ArrowField::new("publication_date", DataType::Utf8, true),
        ArrowField::new("sector", DataType::Utf8, false),
        ArrowField::new("experience_level", DataType::Utf8, true),
        ArrowField::new("contract_type", DataType::Utf8, true),
        ArrowField::new("education_level", DataType::Utf8, true),
        ArrowField::new("modality", DataType::Utf8, true),
        ArrowField::new("salary_numeric", DataType::Int64, true),
    ]));

    let dates: Vec<Option<String>> = postings
        .iter()
        .map(|p| p.posting.publication_date.map(|d| d.to_string()))
        .collect();
    let rows = postings.iter();

    let batch = RecordBatch::try_new(
        schema,
        vec![
            utf8_column(rows.clone().map(|p| Some(p.dedup_hash.as_str()))),
            utf8_column(rows.clone().map(|p| Some(p.posting.source.as_str()))),
            utf8_column(rows.clone().map(|p| Some(p.posting.title.as_str()))),
            utf8_column(rows.clone().map(|p| Some(p.posting.municipality.as_str()))),
            utf8_column(rows.clone().map(|p| p.dane_code.as_deref())),
            utf8_column(dates.iter().map(|d| d.as_deref())),
            utf8_column(rows.clone().map(|p| Some(p.sector.as_str()))),
            utf8_column(rows.clone().map(|p| p.experience_level.map(|v| v.as_str()))),
            utf8_column(rows.clone().map(|p| p.contract_type.map(|v| v.as_str()))),
            utf8_column(rows.clone().map(|p| p.education_level.map(|v| v.as_str()))),
            utf8_column(rows.clone().map(|p| p.modality.map(|v| v.as_str()))),
            Arc::new(Int64Array::from(
                rows.map(|p| p.salary_numeric).collect::<Vec<_>>(),
            )),
        ],
    )
    .context("building postings record batch")?;
    write_parquet(path, batch)
}

fn write_skills_parquet(path: &Path, postings: &[EnrichedPosting]) -> Result<()> {
    let rows: Vec<(&str, &str, SkillCategory)> = postings
        .iter()
        .flat_map(|p| {
            p.skills
                .iter()
                .map(move |skill| (p.dedup_hash.as_str(), skill.as_str(), SkillCategory::of(skill)))
        })
        .collect();

    let schema = Arc::new(Schema::new(vec![
        ArrowField::new("dedup_hash", DataType::Utf8, false),
        ArrowField::new("skill", DataType::Utf8, false),
        ArrowField::new("category", DataType::Utf8, false),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            utf8_column(rows.iter().map(|(hash, _, _)| Some(*hash))),
            utf8_column(rows.iter().map(|(_, skill, _)| Some(*skill))),
            utf8_column(rows.iter().map(|(_, _, category)| Some(category.as_str()))),
        ],
    )
    .context("building skills record batch")?;
    write_parquet(path, batch)
}

fn manifest_entry(name: &str, reports_dir: &Path, path: &Path) -> Result<ParquetManifestFile> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let rel = path
        .strip_prefix(reports_dir)
        .unwrap_or(path)
        .display()
        .to_string();
    Ok(ParquetManifestFile {
        name: name.to_string(),
        path: rel,
        sha256: hex::encode(hasher.finalize()),
        bytes: bytes.len() as u64,
    })
}

/// Markdown summary of the most recent `runs` ingest runs under
/// `<workspace_root>/reports`, newest first.
pub fn report_recent_runs_markdown(runs: usize, workspace_root: &Path) -> Result<String> {
    let reports_root = workspace_root.join("reports");
    let mut dirs = std::fs::read_dir(&reports_root)
        .with_context(|| format!("reading {}", reports_root.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().join(DELTA_FILE).exists())
        .map(|entry| -> Result<(PathBuf, RunDelta)> {
            let path = entry.path();
            let delta_path = path.join(DELTA_FILE);
            let delta: RunDelta = serde_json::from_str(
                &std::fs::read_to_string(&delta_path)
                    .with_context(|| format!("reading {}", delta_path.display()))?,
            )
            .with_context(|| format!("parsing {}", delta_path.display()))?;
            Ok((path, delta))
        })
        .collect::<Result<Vec<_>>>()?;
    dirs.sort_by_key(|(_, delta)| std::cmp::Reverse(delta.run.started_at));

    let mut lines = vec!["# Recent Ingest Runs".to_string(), String::new()];
    for (dir, delta) in dirs.into_iter().take(runs.max(1)) {
        let fetched: usize = delta.run.fetched_per_source.values().sum();
        lines.push(format!("## Run `{}`", delta.run.run_id));
        lines.push(format!("- started: {}", delta.run.started_at));
        lines.push(format!("- fetched: {fetched}"));
        lines.push(format!("- inserted: {}", delta.inserted.len()));
        lines.push(format!("- duplicates: {}", delta.duplicates.len()));
        if let Some(report) = &delta.imputation {
            lines.push(format!("- salary coverage: {:.1}%", report.coverage_pct));
        }
        let manifest_path = dir.join("snapshots").join("manifest.json");
        if manifest_path.exists() {
            lines.push(format!("- parquet manifest: `{}`", manifest_path.display()));
        }
        lines.push(format!("- brief: `{}`", dir.join(BRIEF_FILE).display()));
        lines.push(String::new());
    }
    Ok(lines.join("\n"))
}
