//! Database integration tests with DuckDB
//!
//! A database file is created in a temp directory, then read through a YAML
//! job across several restarts.

use pretty_assertions::assert_eq;
use serde_json::Value;
use solidafy_reader::loader::open_source;
use solidafy_reader::{
    load_job, ContextStore, DuckDbProvider, PaginatedReader, ReadStep, StepConfig,
};
use std::path::Path;
use tempfile::tempdir;

fn create_orders(path: &Path) {
    let provider = DuckDbProvider::open(path, "orders").unwrap();
    provider
        .execute_batch(
            "CREATE TABLE orders (id INTEGER, customer VARCHAR, amount DOUBLE);
             INSERT INTO orders
             SELECT i, 'customer-' || CAST(i % 4 AS VARCHAR), i * 1.5
             FROM range(1, 26) t(i)
             ORDER BY random();",
        )
        .unwrap();
}

fn write_job(dir: &Path) -> std::path::PathBuf {
    let job = dir.join("orders.yaml");
    std::fs::write(
        &job,
        r"
name: orders
reader:
  page_size: 4
  sort:
    customer: asc
    id: desc
source:
  type: duckdb
  database: orders.duckdb
  table: orders
",
    )
    .unwrap();
    job
}

async fn run_job(job: &Path, state: &Path, limit: Option<u64>) -> Vec<Value> {
    let def = load_job(job).unwrap();
    let store = ContextStore::from_file(state).unwrap();
    let provider = open_source(&def.name, &def.source).unwrap();
    let mut reader: PaginatedReader<Value, _> =
        PaginatedReader::open_with_context(&def.reader_config(), provider, &store.context().await)
            .unwrap();

    let mut step_config = StepConfig::new().with_commit_interval(3);
    if let Some(limit) = limit {
        step_config = step_config.with_limit(limit);
    }

    let mut rows = Vec::new();
    ReadStep::new()
        .with_config(step_config)
        .run(&mut reader, &store, |row| {
            rows.push(row);
            Ok(())
        })
        .await
        .unwrap();
    rows
}

fn keys(rows: &[Value]) -> Vec<(String, i64)> {
    rows.iter()
        .map(|row| {
            (
                row["customer"].as_str().unwrap().to_string(),
                row["id"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_duckdb_job_reads_in_sort_order() {
    let dir = tempdir().unwrap();
    create_orders(&dir.path().join("orders.duckdb"));
    let job = write_job(dir.path());

    let rows = run_job(&job, &dir.path().join("state.json"), None).await;
    assert_eq!(rows.len(), 25);

    let keys = keys(&rows);
    let mut expected = keys.clone();
    expected.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
    assert_eq!(keys, expected);
    assert_eq!(rows[0]["amount"].as_f64(), Some(24.0 * 1.5));
}

#[tokio::test]
async fn test_duckdb_job_restarts_without_gaps_or_duplicates() {
    let dir = tempdir().unwrap();
    create_orders(&dir.path().join("orders.duckdb"));
    let job = write_job(dir.path());

    let single = keys(&run_job(&job, &dir.path().join("single.json"), None).await);

    let state = dir.path().join("restarted.json");
    let mut restarted = Vec::new();
    for limit in [6, 3, 9] {
        restarted.extend(keys(&run_job(&job, &state, Some(limit)).await));
    }
    restarted.extend(keys(&run_job(&job, &state, None).await));

    assert_eq!(restarted, single);
}
