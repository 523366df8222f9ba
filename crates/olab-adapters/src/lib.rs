//! Raw posting sources: JSON bundles captured by the scrapers and the
//! scrapers' SQLite database.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use olab_core::JobPosting;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::Row;
use thiserror::Error;
use tracing::{debug, warn};

pub const CRATE_NAME: &str = "olab-adapters";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("scrape database {path}: {source}")]
    Sqlite {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },
    #[error("unknown source kind {0:?} (expected \"bundle\" or \"sqlite\")")]
    UnknownKind(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Bundle,
    Sqlite,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Bundle => "bundle",
            SourceKind::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bundle" => Ok(SourceKind::Bundle),
            "sqlite" => Ok(SourceKind::Sqlite),
            _ => Err(SourceError::UnknownKind(s.to_string())),
        }
    }
}

/// Anything that can hand the pipeline a batch of raw postings.
#[async_trait]
pub trait PostingSource: Send + Sync {
    fn source_id(&self) -> &str;
    fn kind(&self) -> SourceKind;
    async fn fetch_postings(&self) -> Result<Vec<JobPosting>, SourceError>;
}

/// Build the source for a registry entry. Relative paths resolve against
/// `workspace_root`.
pub fn source_for(
    source_id: &str,
    kind: SourceKind,
    path: &Path,
    workspace_root: &Path,
) -> Box<dyn PostingSource> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace_root.join(path)
    };
    match kind {
        SourceKind::Bundle => Box::new(BundleSource::new(source_id, path)),
        SourceKind::Sqlite => Box::new(SqliteScrapeSource::new(source_id, path)),
    }
}

/// Accepts `YYYY-MM-DD` and `DD/MM/YYYY`. Anything else, including impossible
/// calendar dates, is `None`.
pub fn parse_publication_date(text: Option<&str>) -> Option<NaiveDate> {
    let text = text?.trim();
    if text.is_empty() {
        return None;
    }
    let format = if text.contains('/') { "%d/%m/%Y" } else { "%Y-%m-%d" };
    NaiveDate::parse_from_str(text, format).ok()
}

const SCRAPED_AT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

pub fn parse_scraped_at(text: Option<&str>) -> Option<NaiveDateTime> {
    let text = text?.trim();
    SCRAPED_AT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

/// Stand-in content hash for records captured without one.
pub fn fallback_content_hash(posting: &JobPosting) -> String {
    let mut hasher = Sha256::new();
    for part in [
        Some(posting.title.as_str()),
        posting.company.as_deref(),
        Some(posting.municipality.as_str()),
        posting.salary_text.as_deref(),
        posting.description.as_deref(),
        posting.link.as_deref(),
    ] {
        hasher.update(part.unwrap_or_default().as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

fn text_or_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostingBundle {
    pub bundle_id: String,
    pub source_id: String,
    #[serde(default)]
    pub captured_from_url: Option<String>,
    pub records: Vec<BundleRecord>,
}

/// One posting as a scraper wrote it. Field names follow the scrape database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BundleRecord {
    pub titulo: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub empresa: Option<String>,
    #[serde(default)]
    pub municipio: Option<String>,
    #[serde(default)]
    pub salario: Option<String>,
    #[serde(default)]
    pub fecha_pub: Option<String>,
    #[serde(default)]
    pub enlace: Option<String>,
    #[serde(default)]
    pub fuente: Option<String>,
    #[serde(default)]
    pub fecha_scraping: Option<String>,
    #[serde(default)]
    pub content_hash: Option<String>,
}

impl BundleRecord {
    /// `None` when the record has no title.
    pub fn into_posting(self, default_source: &str) -> Option<JobPosting> {
        let title = text_or_none(self.titulo)?;
        let mut posting = JobPosting {
            title,
            description: text_or_none(self.descripcion),
            company: text_or_none(self.empresa),
            municipality: text_or_none(self.municipio).unwrap_or_default(),
            salary_text: text_or_none(self.salario),
            publication_date: parse_publication_date(self.fecha_pub.as_deref()),
            source: text_or_none(self.fuente).unwrap_or_else(|| default_source.to_string()),
            link: text_or_none(self.enlace),
            scraped_at: parse_scraped_at(self.fecha_scraping.as_deref()),
            raw_content_hash: String::new(),
        };
        posting.raw_content_hash =
            text_or_none(self.content_hash).unwrap_or_else(|| fallback_content_hash(&posting));
        Some(posting)
    }
}

pub fn load_posting_bundle(path: impl AsRef<Path>) -> Result<PostingBundle, SourceError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn records_to_postings(records: Vec<BundleRecord>, source_id: &str) -> Vec<JobPosting> {
    let total = records.len();
    let postings: Vec<JobPosting> = records
        .into_iter()
        .filter_map(|record| record.into_posting(source_id))
        .collect();
    if postings.len() < total {
        warn!(
            source_id,
            dropped = total - postings.len(),
            "records without a title were dropped"
        );
    }
    postings
}

#[derive(Debug, Clone)]
pub struct BundleSource {
    source_id: String,
    path: PathBuf,
}

impl BundleSource {
    pub fn new(source_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source_id: source_id.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl PostingSource for BundleSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Bundle
    }

    async fn fetch_postings(&self) -> Result<Vec<JobPosting>, SourceError> {
        let bundle = load_posting_bundle(&self.path)?;
        debug!(
            source_id = %self.source_id,
            bundle_id = %bundle.bundle_id,
            records = bundle.records.len(),
            "bundle loaded"
        );
        Ok(records_to_postings(bundle.records, &self.source_id))
    }
}

/// Reads the `ofertas` table of a scraper's SQLite database, read-only.
#[derive(Debug, Clone)]
pub struct SqliteScrapeSource {
    source_id: String,
    path: PathBuf,
}

impl SqliteScrapeSource {
    pub fn new(source_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source_id: source_id.into(),
            path: path.into(),
        }
    }

    fn sqlite_error(&self, source: sqlx::Error) -> SourceError {
        SourceError::Sqlite {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl PostingSource for SqliteScrapeSource {
    fn source_id(&self) -> &str {
        &self.source_id
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Sqlite
    }

    async fn fetch_postings(&self) -> Result<Vec<JobPosting>, SourceError> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| self.sqlite_error(e))?;

        let rows = sqlx::query(
            r#"
            SELECT titulo, empresa, salario, descripcion, fecha_pub, enlace,
                   municipio, fuente, fecha_scraping, content_hash
              FROM ofertas
             ORDER BY id
            "#,
        )
        .fetch_all(&pool)
        .await
        .map_err(|e| self.sqlite_error(e))?;

        let records = rows
            .iter()
            .map(|row| {
                Ok(BundleRecord {
                    titulo: row.try_get("titulo")?,
                    descripcion: row.try_get("descripcion")?,
                    empresa: row.try_get("empresa")?,
                    municipio: row.try_get("municipio")?,
                    salario: row.try_get("salario")?,
                    fecha_pub: row.try_get("fecha_pub")?,
                    enlace: row.try_get("enlace")?,
                    fuente: row.try_get("fuente")?,
                    fecha_scraping: row.try_get("fecha_scraping")?,
                    content_hash: row.try_get("content_hash")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| self.sqlite_error(e))?;
        pool.close().await;

        debug!(source_id = %self.source_id, rows = records.len(), "scrape database read");
        Ok(records_to_postings(records, &self.source_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publication_dates_accept_both_layouts() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14);
        assert_eq!(parse_publication_date(Some("14/03/2025")), expected);
        assert_eq!(parse_publication_date(Some("2025-03-14")), expected);
        assert_eq!(parse_publication_date(Some(" 2025-03-14 ")), expected);
    }

    #[test]
    fn bad_publication_dates_are_dropped() {
        assert_eq!(parse_publication_date(None), None);
        assert_eq!(parse_publication_date(Some("")), None);
        assert_eq!(parse_publication_date(Some("hace 3 días")), None);
        assert_eq!(parse_publication_date(Some("31/02/2025")), None);
        assert_eq!(parse_publication_date(Some("03/14/2025")), None);
    }

    #[test]
    fn scraped_at_accepts_space_and_t_separators() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(8, 30, 0));
        assert_eq!(parse_scraped_at(Some("2025-03-14 08:30:00")), expected);
        assert_eq!(parse_scraped_at(Some("2025-03-14T08:30:00")), expected);
        assert_eq!(parse_scraped_at(Some("ayer")), None);
    }

    #[test]
    fn source_kind_parses_case_insensitively() {
        assert_eq!("SQLite".parse::<SourceKind>().unwrap(), SourceKind::Sqlite);
        assert_eq!("bundle".parse::<SourceKind>().unwrap(), SourceKind::Bundle);
        let err = "csv".parse::<SourceKind>().unwrap_err();
        assert!(matches!(err, SourceError::UnknownKind(ref k) if k == "csv"));
    }

    #[test]
    fn record_without_title_is_skipped() {
        let record = BundleRecord {
            titulo: Some("   ".into()),
            ..Default::default()
        };
        assert!(record.into_posting("computrabajo").is_none());
    }

    #[test]
    fn record_falls_back_to_registry_source_and_computed_hash() {
        let record = BundleRecord {
            titulo: Some("Cajero".into()),
            municipio: Some("Turbo".into()),
            empresa: Some("  ".into()),
            ..Default::default()
        };
        let posting = record.into_posting("elempleo").expect("titled record");
        assert_eq!(posting.source, "elempleo");
        assert_eq!(posting.company, None);
        assert_eq!(posting.raw_content_hash.len(), 64);
        assert_eq!(posting.raw_content_hash, fallback_content_hash(&posting));
    }

    #[test]
    fn relative_paths_resolve_against_workspace_root() {
        let source = source_for(
            "computrabajo",
            SourceKind::Bundle,
            Path::new("fixtures/x.json"),
            Path::new("/srv/olab"),
        );
        assert_eq!(source.source_id(), "computrabajo");
        assert_eq!(source.kind(), SourceKind::Bundle);
    }
}
