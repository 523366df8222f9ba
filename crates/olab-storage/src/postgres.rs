use std::collections::HashSet;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use olab_core::{EnrichedPosting, JobPosting, Sector, StoredPosting, UnknownLabel};
use olab_enrich::{
    classify_sector, impute_salaries, plan_backfill, ImputationConfig, ImputationReport, UnhashedRow,
};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgConnection, PgPool, Row};
use tracing::{info, info_span, Instrument};

use crate::{BackfillOutcome, InsertOutcome, PostingStore, StoreError};

/// Advisory lock key serializing imputation passes across processes.
const IMPUTATION_LOCK_KEY: i64 = 0x6f6c_6162_696d_7075;

const SELECT_POSTINGS: &str = r#"
    SELECT id, title, description, company, municipality, salary_text,
           publication_date, source, link, scraped_at, content_hash, skills,
           sector, experience_level, contract_type, education_level, modality,
           salary_numeric, salary_imputed, dedup_hash, dane_code
      FROM empleo.job_postings
     ORDER BY id
"#;

#[derive(Debug, Clone)]
pub struct PgPostingStore {
    pool: PgPool,
}

impl PgPostingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn parse_label<T>(id: i64, value: Option<String>) -> Result<Option<T>, StoreError>
where
    T: FromStr<Err = UnknownLabel>,
{
    value
        .map(|label| label.parse::<T>())
        .transpose()
        .map_err(|source| StoreError::Label { id, source })
}

/// Rows written before sector classification carry a `NULL` sector; they get
/// the label the classifier assigns to their text.
fn stored_sector(
    id: i64,
    label: Option<String>,
    title: &str,
    description: Option<&str>,
) -> Result<Sector, StoreError> {
    Ok(parse_label(id, label)?.unwrap_or_else(|| classify_sector(Some(title), description)))
}

fn posting_from_row(row: &PgRow) -> Result<StoredPosting, StoreError> {
    let id: i64 = row.try_get("id")?;
    let title: String = row.try_get("title")?;
    let description: Option<String> = row.try_get("description")?;
    let sector = stored_sector(id, row.try_get("sector")?, &title, description.as_deref())?;
    let publication_date: Option<NaiveDate> = row.try_get("publication_date")?;
    let scraped_at: Option<NaiveDateTime> = row.try_get("scraped_at")?;
    let content_hash: Option<String> = row.try_get("content_hash")?;
    let dedup_hash: Option<String> = row.try_get("dedup_hash")?;

    Ok(StoredPosting {
        id,
        enriched: EnrichedPosting {
            posting: JobPosting {
                title,
                description,
                company: row.try_get("company")?,
                municipality: row.try_get("municipality")?,
                salary_text: row.try_get("salary_text")?,
                publication_date,
                source: row.try_get("source")?,
                link: row.try_get("link")?,
                scraped_at,
                raw_content_hash: content_hash.unwrap_or_default(),
            },
            skills: row.try_get("skills")?,
            sector,
            experience_level: parse_label(id, row.try_get("experience_level")?)?,
            contract_type: parse_label(id, row.try_get("contract_type")?)?,
            education_level: parse_label(id, row.try_get("education_level")?)?,
            modality: parse_label(id, row.try_get("modality")?)?,
            salary_numeric: row.try_get("salary_numeric")?,
            salary_imputed: row.try_get("salary_imputed")?,
            dedup_hash: dedup_hash.unwrap_or_default(),
            dane_code: row.try_get("dane_code")?,
        },
    })
}

async fn load_all(conn: &mut PgConnection) -> Result<Vec<StoredPosting>, StoreError> {
    let rows = sqlx::query(SELECT_POSTINGS).fetch_all(&mut *conn).await?;
    rows.iter().map(posting_from_row).collect()
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

#[async_trait]
impl PostingStore for PgPostingStore {
    async fn known_content_hashes(&self, hashes: &[String]) -> Result<HashSet<String>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT content_hash
              FROM empleo.job_postings
             WHERE content_hash = ANY($1)
            "#,
        )
        .bind(hashes)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("content_hash").map_err(StoreError::from))
            .collect()
    }

    async fn known_dedup_hashes(&self, hashes: &[String]) -> Result<HashSet<String>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT dedup_hash
              FROM empleo.job_postings
             WHERE dedup_hash = ANY($1)
            "#,
        )
        .bind(hashes)
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("dedup_hash").map_err(StoreError::from))
            .collect()
    }

    async fn insert_postings(&self, postings: &[EnrichedPosting]) -> Result<InsertOutcome, StoreError> {
        let span = info_span!("insert_postings", batch = postings.len());
        async move {
            let mut tx = self.pool.begin().await?;
            let mut outcome = InsertOutcome::default();
            for item in postings {
                let posting = &item.posting;
                let result = sqlx::query(
                    r#"
                    INSERT INTO empleo.job_postings (
                        title, description, company, municipality, salary_text,
                        publication_date, source, link, scraped_at, content_hash,
                        skills, sector, experience_level, contract_type,
                        education_level, modality, salary_numeric, salary_imputed,
                        dedup_hash, dane_code
                    ) VALUES (
                        $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                        $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
                    )
                    ON CONFLICT (dedup_hash) WHERE dedup_hash IS NOT NULL DO NOTHING
                    "#,
                )
                .bind(&posting.title)
                .bind(&posting.description)
                .bind(&posting.company)
                .bind(&posting.municipality)
                .bind(&posting.salary_text)
                .bind(posting.publication_date)
                .bind(&posting.source)
                .bind(&posting.link)
                .bind(posting.scraped_at)
                .bind(non_empty(&posting.raw_content_hash))
                .bind(&item.skills)
                .bind(item.sector.as_str())
                .bind(item.experience_level.map(|v| v.as_str()))
                .bind(item.contract_type.map(|v| v.as_str()))
                .bind(item.education_level.map(|v| v.as_str()))
                .bind(item.modality.map(|v| v.as_str()))
                .bind(item.salary_numeric)
                .bind(item.salary_imputed)
                .bind(non_empty(&item.dedup_hash))
                .bind(&item.dane_code)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 1 {
                    outcome.inserted += 1;
                } else {
                    outcome.conflicts += 1;
                }
            }
            tx.commit().await?;
            info!(
                inserted = outcome.inserted,
                conflicts = outcome.conflicts,
                "postings inserted"
            );
            Ok(outcome)
        }
        .instrument(span)
        .await
    }

    async fn load_postings(&self) -> Result<Vec<StoredPosting>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        load_all(&mut conn).await
    }

    async fn run_imputation(&self, config: ImputationConfig) -> Result<ImputationReport, StoreError> {
        let span = info_span!("run_imputation", min_sample = config.min_sample);
        async move {
            let mut tx = self.pool.begin().await?;
            let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock($1)")
                .bind(IMPUTATION_LOCK_KEY)
                .fetch_one(&mut *tx)
                .await?;
            if !acquired {
                return Err(StoreError::ImputationInProgress);
            }

            let stored = load_all(&mut tx).await?;
            let ids: Vec<i64> = stored.iter().map(|row| row.id).collect();
            let mut postings: Vec<EnrichedPosting> =
                stored.into_iter().map(|row| row.enriched).collect();
            let report = impute_salaries(&mut postings, config);

            sqlx::query(
                "UPDATE empleo.job_postings SET salary_imputed = NULL WHERE salary_imputed IS NOT NULL",
            )
            .execute(&mut *tx)
            .await?;

            let (imputed_ids, imputed_values): (Vec<i64>, Vec<i64>) = ids
                .iter()
                .zip(&postings)
                .filter_map(|(id, posting)| posting.salary_imputed.map(|value| (*id, value)))
                .unzip();
            sqlx::query(
                r#"
                UPDATE empleo.job_postings AS p
                   SET salary_imputed = v.salary_imputed
                  FROM UNNEST($1::BIGINT[], $2::BIGINT[]) AS v(id, salary_imputed)
                 WHERE p.id = v.id
                "#,
            )
            .bind(&imputed_ids)
            .bind(&imputed_values)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            info!(
                level1 = report.level1_hits,
                level2 = report.level2_hits,
                level3 = report.level3_hits,
                misses = report.misses,
                coverage_pct = report.coverage_pct,
                "imputation pass committed"
            );
            Ok(report)
        }
        .instrument(span)
        .await
    }

    async fn backfill_dedup_hashes(&self) -> Result<BackfillOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let hashed = sqlx::query(
            "SELECT dedup_hash FROM empleo.job_postings WHERE dedup_hash IS NOT NULL",
        )
        .fetch_all(&mut *tx)
        .await?;
        let already_hashed = hashed
            .iter()
            .map(|row| row.try_get::<String, _>("dedup_hash"))
            .collect::<Result<HashSet<_>, _>>()?;

        let legacy = sqlx::query(
            r#"
            SELECT id, title, company, municipality
              FROM empleo.job_postings
             WHERE dedup_hash IS NULL
             ORDER BY id
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;
        let unhashed = legacy
            .iter()
            .map(|row| {
                Ok(UnhashedRow {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    company: row.try_get("company")?,
                    municipality: row.try_get("municipality")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        let plan = plan_backfill(unhashed, &already_hashed);

        sqlx::query("DELETE FROM empleo.job_postings WHERE id = ANY($1)")
            .bind(&plan.duplicates)
            .execute(&mut *tx)
            .await?;

        let (ids, hashes): (Vec<i64>, Vec<String>) = plan.updates.iter().cloned().unzip();
        sqlx::query(
            r#"
            UPDATE empleo.job_postings AS p
               SET dedup_hash = v.dedup_hash
              FROM UNNEST($1::BIGINT[], $2::TEXT[]) AS v(id, dedup_hash)
             WHERE p.id = v.id
            "#,
        )
        .bind(&ids)
        .bind(&hashes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        let outcome = BackfillOutcome {
            updated: plan.updates.len(),
            removed: plan.duplicates.len(),
        };
        info!(updated = outcome.updated, removed = outcome.removed, "dedup backfill committed");
        Ok(outcome)
    }
}
