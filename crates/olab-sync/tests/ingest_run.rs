use std::path::{Path, PathBuf};
use std::sync::Arc;

use olab_core::Sector;
use olab_storage::{MemoryPostingStore, PostingStore};
use olab_sync::{
    report_recent_runs_markdown, DuplicateReason, IngestPipeline, ParquetManifest, RunDelta,
    SyncConfig, BRIEF_FILE, DELTA_FILE,
};

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .canonicalize()
        .expect("fixtures dir")
}

fn write_registry(workspace: &Path) {
    let fixtures = fixtures_root();
    let yaml = format!(
        r#"sources:
  - source_id: computrabajo
    display_name: Computrabajo
    enabled: true
    kind: bundle
    path: {}
  - source_id: elempleo
    display_name: elempleo.com
    enabled: true
    kind: bundle
    path: {}
  - source_id: magneto
    display_name: Magneto365
    enabled: false
    kind: sqlite
    path: data/magneto.db
"#,
        fixtures.join("computrabajo/sample/bundle.json").display(),
        fixtures.join("elempleo/sample/bundle.json").display(),
    );
    std::fs::write(workspace.join("sources.yaml"), yaml).expect("write sources.yaml");
}

fn config(workspace: &Path) -> SyncConfig {
    let root = workspace.display().to_string();
    SyncConfig::from_lookup(move |key| match key {
        "OLAB_WORKSPACE_ROOT" => Some(root.clone()),
        _ => None,
    })
}

#[tokio::test]
async fn fixture_run_persists_unique_postings_and_writes_reports() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_registry(dir.path());
    let store = Arc::new(MemoryPostingStore::new());
    let pipeline = IngestPipeline::new(config(dir.path()), store.clone());

    let summary = pipeline.run_once().await.expect("first run");
    assert_eq!(summary.enabled_sources, 2);
    assert_eq!(summary.fetched, 5);
    assert_eq!(summary.skipped_known_content, 0);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.inserted, 4);

    let stored = store.load_postings().await.expect("load");
    let sources: Vec<&str> = stored.iter().map(|r| r.enriched.posting.source.as_str()).collect();
    assert_eq!(sources, vec!["computrabajo", "computrabajo", "computrabajo", "elempleo"]);
    assert_eq!(stored[0].enriched.sector, Sector::Agroindustria);
    assert_eq!(stored[0].enriched.dane_code.as_deref(), Some("05045"));
    assert_eq!(stored[1].enriched.salary_numeric, Some(1_800_000));
    assert_eq!(stored[3].enriched.sector, Sector::Salud);

    let imputation = summary.imputation.expect("imputation ran");
    assert_eq!(imputation.total_postings, 4);
    assert_eq!(imputation.total_candidates, 1);
    assert_eq!(imputation.misses, 1);
    assert_eq!(imputation.coverage_pct, 75.0);

    let reports_dir = PathBuf::from(&summary.reports_dir);
    assert!(reports_dir.join(BRIEF_FILE).exists());
    let delta: RunDelta = serde_json::from_str(
        &std::fs::read_to_string(reports_dir.join(DELTA_FILE)).expect("read delta"),
    )
    .expect("parse delta");
    assert_eq!(delta.inserted.len(), 4);
    assert_eq!(delta.duplicates[0].source, "elempleo");
    assert_eq!(delta.duplicates[0].reason, DuplicateReason::EarlierInBatch);

    let manifest: ParquetManifest = serde_json::from_str(
        &std::fs::read_to_string(&summary.parquet_manifest).expect("read manifest"),
    )
    .expect("parse manifest");
    assert_eq!(manifest.files.len(), 2);

    let markdown = report_recent_runs_markdown(5, dir.path()).expect("report");
    assert!(markdown.contains(&summary.run_id.to_string()));
}

#[tokio::test]
async fn second_run_is_incremental() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_registry(dir.path());
    let store = Arc::new(MemoryPostingStore::new());
    let pipeline = IngestPipeline::new(config(dir.path()), store.clone());

    pipeline.run_once().await.expect("first run");
    let second = pipeline.run_once().await.expect("second run");

    assert_eq!(second.fetched, 5);
    assert_eq!(second.skipped_known_content, 4);
    assert_eq!(second.duplicates, 1);
    assert_eq!(second.inserted, 0);
    assert_eq!(store.len().await, 4);
}

#[tokio::test]
async fn missing_registry_is_reported_with_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pipeline = IngestPipeline::new(config(dir.path()), Arc::new(MemoryPostingStore::new()));
    let err = pipeline.run_once().await.expect_err("no sources.yaml");
    assert!(format!("{err:#}").contains("sources.yaml"));
}
