//! Tests for the read step

use super::*;
use crate::error::Error;
use crate::provider::MemoryProvider;
use crate::reader::{PaginatedReader, ReaderState};
use crate::sort::SortSpecification;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::tempdir;

type JsonReader = PaginatedReader<Value, MemoryProvider>;

fn provider(count: i64) -> MemoryProvider {
    MemoryProvider::with_records(
        "numbers",
        (1..=count).rev().map(|id| json!({ "id": id })).collect(),
    )
}

fn reader(source: MemoryProvider, context: &ExecutionContext) -> JsonReader {
    let saved = ReaderState::read_from("numbers-reader", context).unwrap();
    PaginatedReader::open(
        "numbers-reader",
        3,
        SortSpecification::ascending("id").unwrap(),
        source,
        saved,
    )
    .unwrap()
}

async fn saved_count(store: &ContextStore) -> Option<u64> {
    store
        .context()
        .await
        .get_u64("numbers-reader.reader.read.count")
        .unwrap()
}

#[test]
fn test_step_config_defaults() {
    let config = StepConfig::default();
    assert_eq!(config.commit_interval, DEFAULT_COMMIT_INTERVAL);
    assert!(config.limit.is_none());
}

#[test]
fn test_step_config_rejects_zero_interval() {
    let err = StepConfig::new().with_commit_interval(0).validate().unwrap_err();
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_run_to_end() {
    let store = ContextStore::in_memory();
    let mut reader = reader(provider(7), &store.context().await);
    let mut step = ReadStep::new().with_config(StepConfig::new().with_commit_interval(3));

    let mut seen = Vec::new();
    let stats = step
        .run(&mut reader, &store, |item| {
            seen.push(item["id"].as_i64().unwrap());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(seen, (1..=7).collect::<Vec<_>>());
    assert_eq!(stats.items_read, 7);
    // after 3, after 6, and the trailing item
    assert_eq!(stats.checkpoints, 3);
    assert_eq!(saved_count(&store).await, Some(7));
    assert_eq!(step.stats(), &stats);
}

#[tokio::test]
async fn test_run_on_empty_source_still_checkpoints() {
    let store = ContextStore::in_memory();
    let mut reader = reader(provider(0), &store.context().await);

    let stats = ReadStep::new()
        .run(&mut reader, &store, |_| Ok(()))
        .await
        .unwrap();

    assert_eq!(stats.items_read, 0);
    assert_eq!(stats.checkpoints, 1);
    assert_eq!(saved_count(&store).await, Some(0));
}

#[tokio::test]
async fn test_limit_then_resume() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let config = StepConfig::new().with_commit_interval(2).with_limit(4);

    let store = ContextStore::new(&path);
    let mut first = reader(provider(10), &store.context().await);
    let mut seen = Vec::new();
    ReadStep::new()
        .with_config(config.clone())
        .run(&mut first, &store, |item| {
            seen.push(item["id"].as_i64().unwrap());
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(seen, vec![1, 2, 3, 4]);

    let reopened = ContextStore::from_file(&path).unwrap();
    let mut second = reader(provider(10), &reopened.context().await);
    ReadStep::new()
        .with_config(StepConfig::new().with_commit_interval(2))
        .run(&mut second, &reopened, |item| {
            seen.push(item["id"].as_i64().unwrap());
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    assert_eq!(saved_count(&reopened).await, Some(10));
}

#[tokio::test]
async fn test_source_failure_checkpoints_last_position() {
    let source = provider(10);
    let store = ContextStore::in_memory();
    let mut reader = reader(source.clone(), &store.context().await);
    let mut step = ReadStep::new().with_config(StepConfig::new().with_commit_interval(100));

    let mut handled = 0;
    let err = step
        .run(&mut reader, &store, |_| {
            handled += 1;
            if handled == 3 {
                // The next read crosses into page 1
                source.fail_next(1);
            }
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(step.stats().items_read, 3);
    assert_eq!(saved_count(&store).await, Some(3));
}

#[tokio::test]
async fn test_handler_failure_does_not_checkpoint() {
    let store = ContextStore::in_memory();
    let mut reader = reader(provider(10), &store.context().await);
    let mut step = ReadStep::new().with_config(StepConfig::new().with_commit_interval(2));

    let err = step
        .run(&mut reader, &store, |item| {
            if item["id"] == 3 {
                return Err(Error::Other("handler rejected item".to_string()));
            }
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Other(_)));
    assert_eq!(step.stats().items_read, 2);
    assert_eq!(saved_count(&store).await, Some(2));
}

#[tokio::test]
async fn test_checkpoint_without_auto_save_writes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = ContextStore::without_auto_save(&path);
    let mut reader = reader(provider(4), &store.context().await);

    ReadStep::new()
        .run(&mut reader, &store, |_| Ok(()))
        .await
        .unwrap();

    let reopened = ContextStore::from_file(&path).unwrap();
    assert_eq!(saved_count(&reopened).await, Some(4));
}
