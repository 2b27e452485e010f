//! Restart integration tests
//!
//! Tests the full flow: reader → read step → file-backed context store →
//! new process (new reader, reopened store) → resume

use clap::Parser;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use solidafy_reader::cli::{Cli, Runner};
use solidafy_reader::{
    ContextStore, MemoryProvider, PaginatedReader, ReadStep, ReaderConfig, ReaderState,
    SortSpecification, StepConfig,
};
use std::path::Path;
use tempfile::tempdir;

fn shuffled_records(count: i64) -> Vec<Value> {
    // Deterministic shuffle: multiply by a unit modulo count
    (0..count)
        .map(|i| {
            let id = (i * 7) % count + 1;
            json!({ "id": id, "group": id % 3 })
        })
        .collect()
}

fn config() -> ReaderConfig {
    ReaderConfig::new(SortSpecification::ascending("id").unwrap())
        .with_name("events")
        .with_page_size(4)
}

/// Run one "process": open store and reader, read up to `limit` items
async fn run_once(path: &Path, limit: Option<u64>, out: &mut Vec<i64>) -> u64 {
    let store = ContextStore::from_file(path).unwrap();
    let provider = MemoryProvider::with_records("events", shuffled_records(30));
    let mut reader: PaginatedReader<Value, _> =
        PaginatedReader::open_with_context(&config(), provider, &store.context().await).unwrap();

    let mut step_config = StepConfig::new().with_commit_interval(3);
    if let Some(limit) = limit {
        step_config = step_config.with_limit(limit);
    }

    let stats = ReadStep::new()
        .with_config(step_config)
        .run(&mut reader, &store, |item| {
            out.push(item["id"].as_i64().unwrap());
            Ok(())
        })
        .await
        .unwrap();
    reader.close();
    stats.items_read
}

#[tokio::test]
async fn test_restart_across_processes_matches_single_run() {
    let dir = tempdir().unwrap();

    let mut single = Vec::new();
    run_once(&dir.path().join("single.json"), None, &mut single).await;
    assert_eq!(single, (1..=30).collect::<Vec<_>>());

    let path = dir.path().join("restarted.json");
    let mut restarted = Vec::new();
    let mut read = 0;
    for limit in [5, 1, 4, 7, 0, 11] {
        read += run_once(&path, Some(limit), &mut restarted).await;
    }
    assert_eq!(read, 28);

    // Drain whatever is left
    assert_eq!(run_once(&path, None, &mut restarted).await, 2);
    assert_eq!(restarted, single);

    let store = ContextStore::from_file(&path).unwrap();
    let state = ReaderState::read_from("events", &store.context().await)
        .unwrap()
        .unwrap();
    assert_eq!(state.total_items_read, 30);
    // The short last page was consumed, so the position moved past it
    assert_eq!(state.page_index, 8);
    assert_eq!(state.offset_within_page, 0);
}

#[tokio::test]
async fn test_resume_after_growth_between_runs() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let sort = SortSpecification::ascending("id").unwrap();

    let store = ContextStore::from_file(&path).unwrap();
    let records: Vec<Value> = (1..=8).map(|id| json!({ "id": id })).collect();
    let provider = MemoryProvider::with_records("growing", records);
    let mut reader: PaginatedReader<Value, _> =
        PaginatedReader::open("growing", 4, sort.clone(), provider, None).unwrap();

    let mut seen = Vec::new();
    ReadStep::new()
        .run(&mut reader, &store, |item| {
            seen.push(item["id"].as_i64().unwrap());
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(seen, (1..=8).collect::<Vec<_>>());

    // Next run: the source has grown past the last full page
    let store = ContextStore::from_file(&path).unwrap();
    let saved = ReaderState::read_from("growing", &store.context().await).unwrap();
    let records: Vec<Value> = (1..=11).map(|id| json!({ "id": id })).collect();
    let provider = MemoryProvider::with_records("growing", records);
    let mut reader: PaginatedReader<Value, _> =
        PaginatedReader::open("growing", 4, sort, provider, saved).unwrap();

    ReadStep::new()
        .run(&mut reader, &store, |item| {
            seen.push(item["id"].as_i64().unwrap());
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(seen, (1..=11).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_incompatible_saved_state_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let mut ids = Vec::new();
    run_once(&path, Some(5), &mut ids).await;

    let store = ContextStore::from_file(&path).unwrap();
    let provider = MemoryProvider::with_records("events", shuffled_records(30));
    let err = PaginatedReader::<Value, _>::open_with_context(
        &config().with_page_size(5),
        provider,
        &store.context().await,
    )
    .unwrap_err();
    assert!(err.is_configuration());
}

// ============================================================================
// CLI Tests
// ============================================================================

async fn saved_state(path: &Path, reader: &str) -> Option<ReaderState> {
    let store = ContextStore::from_file(path).unwrap();
    ReaderState::read_from(reader, &store.context().await).unwrap()
}

#[tokio::test]
async fn test_cli_read_and_reset() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("users.json");
    std::fs::write(
        &data,
        r#"[{"id": 3, "name": "c"}, {"id": 1, "name": "a"}, {"id": 2, "name": "b"}]"#,
    )
    .unwrap();
    let job = dir.path().join("job.yaml");
    std::fs::write(
        &job,
        "name: users\nreader:\n  page_size: 2\n  sort:\n    id: asc\nsource:\n  type: json_file\n  path: users.json\n",
    )
    .unwrap();
    let state = dir.path().join("state.json");

    let args = |command: &[&'static str]| {
        let mut args = vec![
            "solidafy-reader",
            "-j",
            job.to_str().unwrap(),
            "-s",
            state.to_str().unwrap(),
        ];
        args.extend_from_slice(command);
        Runner::new(Cli::try_parse_from(args).unwrap())
    };

    args(&["validate"]).run().await.unwrap();
    args(&["read", "--limit", "2"]).run().await.unwrap();

    let after_first = saved_state(&state, "users").await.unwrap();
    assert_eq!(after_first.total_items_read, 2);
    assert_eq!(after_first.page_index, 1);

    args(&["read"]).run().await.unwrap();
    assert_eq!(saved_state(&state, "users").await.unwrap().total_items_read, 3);

    args(&["state"]).run().await.unwrap();
    args(&["reset"]).run().await.unwrap();
    assert!(saved_state(&state, "users").await.is_none());
}

#[tokio::test]
async fn test_cli_read_without_job_fails() {
    let runner = Runner::new(Cli::try_parse_from(["solidafy-reader", "read"]).unwrap());
    assert!(runner.run().await.unwrap_err().is_configuration());
}
