// ABOUTME: Integration tests for the service-path bound configuration manager
// ABOUTME: Exercises copy, move and define against in-memory and recording backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Confman Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{config, init_test_logging, keys, recording_store};
use confman::context::OperationContext;
use confman::manager::ConfigManager;
use confman::storage::chamber::ChamberCompatibility;
use confman::storage::memory::InMemoryStorage;
use confman::storage::Storage;
use confman_core::errors::ErrorCode;
use serde_json::json;
use std::sync::Arc;

fn memory_managers(src: &str, dst: &str) -> (ConfigManager, ConfigManager) {
    init_test_logging();
    let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
    (
        ConfigManager::new(storage.clone(), src),
        ConfigManager::new(storage, dst),
    )
}

#[tokio::test]
async fn test_copy_duplicates_all_keys() -> Result<()> {
    let (src, dst) = memory_managers("svc/dev", "svc/prod");
    let ctx = OperationContext::background();
    let expected = config(&[("a", "1"), ("b", "2")]);
    src.write_keys(&ctx, &expected).await?;

    src.copy(&ctx, &dst).await?;

    assert_eq!(dst.read_all(&ctx).await?, expected);
    assert_eq!(src.read_all(&ctx).await?, expected);
    Ok(())
}

#[tokio::test]
async fn test_copy_overwrites_existing_destination_keys() -> Result<()> {
    let (src, dst) = memory_managers("svc/dev", "svc/prod");
    let ctx = OperationContext::background();
    src.write_keys(&ctx, &config(&[("a", "new")])).await?;
    dst.write_keys(&ctx, &config(&[("a", "old"), ("z", "keep")]))
        .await?;

    src.copy(&ctx, &dst).await?;

    assert_eq!(
        dst.read_all(&ctx).await?,
        config(&[("a", "new"), ("z", "keep")])
    );
    Ok(())
}

#[tokio::test]
async fn test_copy_empty_path_succeeds() -> Result<()> {
    let (src, dst) = memory_managers("svc/empty", "svc/prod");
    let ctx = OperationContext::background();

    src.copy(&ctx, &dst).await?;

    assert!(dst.read_all(&ctx).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_copy_with_cancelled_context_reads_nothing() -> Result<()> {
    let (client, store) = recording_store();
    let storage: Arc<dyn Storage> = Arc::new(store);
    let src = ConfigManager::new(storage.clone(), "svc/dev");
    let dst = ConfigManager::new(storage, "svc/prod");
    client.seed("/svc/dev/a", "1");

    let ctx = OperationContext::background();
    ctx.cancel();
    let err = src.copy(&ctx, &dst).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::Cancelled);
    assert_eq!(client.list_calls(), 0);
    assert!(client.puts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_copy_cancelled_during_read_writes_nothing() -> Result<()> {
    let (client, store) = recording_store();
    let storage: Arc<dyn Storage> = Arc::new(store);
    let src = ConfigManager::new(storage.clone(), "svc/dev");
    let dst = ConfigManager::new(storage, "svc/prod");
    client.seed("/svc/dev/a", "1");
    client.seed("/svc/dev/b", "2");

    let ctx = OperationContext::background();
    client.cancel_on_list(ctx.clone());
    let err = src.copy(&ctx, &dst).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::Cancelled);
    assert_eq!(client.list_calls(), 1);
    assert!(client.get_batches().is_empty());
    assert!(client.puts().is_empty());
    assert_eq!(client.names(), ["/svc/dev/a", "/svc/dev/b"]);
    Ok(())
}

#[tokio::test]
async fn test_move_empties_source() -> Result<()> {
    let (src, dst) = memory_managers("svc/old", "svc/new");
    let ctx = OperationContext::background();
    let expected = config(&[("a", "1"), ("b", "2")]);
    src.write_keys(&ctx, &expected).await?;

    src.move_to(&ctx, &dst).await?;

    assert!(src.read_all(&ctx).await?.is_empty());
    assert_eq!(dst.read_all(&ctx).await?, expected);
    Ok(())
}

#[tokio::test]
async fn test_move_deletes_only_copied_keys() -> Result<()> {
    let (client, store) = recording_store();
    let storage: Arc<dyn Storage> = Arc::new(store);
    let src = ConfigManager::new(storage.clone(), "svc/old");
    let dst = ConfigManager::new(storage, "svc/new");
    client.seed("/svc/old/a", "1");
    client.seed("/svc/old/b", "2");
    client.seed("/svc/old/nested/c", "3");
    let ctx = OperationContext::background();

    src.move_to(&ctx, &dst).await?;

    assert_eq!(
        client.delete_batches(),
        [vec!["/svc/old/a".to_owned(), "/svc/old/b".to_owned()]]
    );
    assert_eq!(
        client.names(),
        ["/svc/new/a", "/svc/new/b", "/svc/old/nested/c"]
    );
    Ok(())
}

#[tokio::test]
async fn test_move_delete_failure_reports_copied_keys() -> Result<()> {
    let (client, store) = recording_store();
    let storage: Arc<dyn Storage> = Arc::new(store);
    let src = ConfigManager::new(storage.clone(), "svc/old");
    let dst = ConfigManager::new(storage, "svc/new");
    client.seed("/svc/old/a", "1");
    client.seed("/svc/old/b", "2");
    client.fail_deletes();
    let ctx = OperationContext::background();

    let err = src.move_to(&ctx, &dst).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::ExternalServiceError);
    assert_eq!(err.detail("phase"), Some(&json!("delete")));
    assert_eq!(err.detail("copied_keys"), Some(&json!(["a", "b"])));
    assert_eq!(client.value("/svc/new/a").as_deref(), Some("1"));
    assert_eq!(client.value("/svc/old/a").as_deref(), Some("1"));
    Ok(())
}

#[tokio::test]
async fn test_move_onto_same_path_is_rejected() -> Result<()> {
    let (client, store) = recording_store();
    let storage: Arc<dyn Storage> = Arc::new(store);
    let src = ConfigManager::new(storage.clone(), "svc/env");
    let dst = ConfigManager::new(storage, "/svc/env/");
    client.seed("/svc/env/a", "1");
    client.seed("/svc/env/b", "2");
    let ctx = OperationContext::background();

    let err = src.move_to(&ctx, &dst).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(client.list_calls(), 0);
    assert!(client.delete_batches().is_empty());
    assert_eq!(client.names(), ["/svc/env/a", "/svc/env/b"]);
    Ok(())
}

#[tokio::test]
async fn test_move_of_empty_path_deletes_nothing() -> Result<()> {
    let (client, store) = recording_store();
    let storage: Arc<dyn Storage> = Arc::new(store);
    let src = ConfigManager::new(storage.clone(), "svc/old");
    let dst = ConfigManager::new(storage, "svc/new");
    let ctx = OperationContext::background();

    src.move_to(&ctx, &dst).await?;

    assert!(client.delete_batches().is_empty());
    assert!(client.puts().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_define_writes_changes_and_deletes_stale_keys() -> Result<()> {
    let (client, store) = recording_store();
    let manager = ConfigManager::new(Arc::new(store), "svc/env");
    client.seed("/svc/env/a", "1");
    client.seed("/svc/env/b", "2");
    let ctx = OperationContext::background();

    manager
        .define(&ctx, &config(&[("a", "1"), ("c", "3")]))
        .await?;

    assert_eq!(client.put_names(), ["/svc/env/c"]);
    assert_eq!(client.delete_batches(), [vec!["/svc/env/b".to_owned()]]);
    assert_eq!(
        manager.read_all(&ctx).await?,
        config(&[("a", "1"), ("c", "3")])
    );
    Ok(())
}

#[tokio::test]
async fn test_define_on_empty_path_writes_everything() -> Result<()> {
    let (store, _) = memory_managers("svc/env", "svc/unused");
    let ctx = OperationContext::background();
    let wanted = config(&[("x", "1"), ("y", "2")]);

    store.define(&ctx, &wanted).await?;

    assert_eq!(store.read_all(&ctx).await?, wanted);
    Ok(())
}

#[tokio::test]
async fn test_define_with_empty_config_clears_path() -> Result<()> {
    let (store, _) = memory_managers("svc/env", "svc/unused");
    let ctx = OperationContext::background();
    store.write_keys(&ctx, &config(&[("a", "1")])).await?;

    store.define(&ctx, &config(&[])).await?;

    assert!(store.read_all(&ctx).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_define_write_failure_reports_phase() -> Result<()> {
    let (client, store) = recording_store();
    let manager = ConfigManager::new(Arc::new(store), "svc/env");
    client.seed("/svc/env/old", "1");
    client.fail_put_for("/svc/env/new");
    let ctx = OperationContext::background();

    let err = manager
        .define(&ctx, &config(&[("new", "1")]))
        .await
        .unwrap_err();

    assert_eq!(err.detail("phase"), Some(&json!("write")));
    assert_eq!(err.detail("stale_keys"), Some(&json!(["old"])));
    assert_eq!(client.value("/svc/env/old").as_deref(), Some("1"));
    Ok(())
}

#[tokio::test]
async fn test_define_under_case_compatibility_keeps_matching_keys() -> Result<()> {
    init_test_logging();
    let inner = Arc::new(InMemoryStorage::new());
    let decorated: Arc<dyn Storage> = Arc::new(ChamberCompatibility::new(inner.clone()));
    let manager = ConfigManager::new(decorated, "svc/env");
    let ctx = OperationContext::background();
    manager
        .write_keys(&ctx, &config(&[("db_host", "a"), ("stale", "x")]))
        .await?;

    manager.define(&ctx, &config(&[("DB_HOST", "b")])).await?;

    assert_eq!(manager.read_all(&ctx).await?, config(&[("DB_HOST", "b")]));
    assert_eq!(
        inner.read_all(&ctx, manager.service_path()).await?,
        config(&[("db_host", "b")])
    );
    Ok(())
}

#[tokio::test]
async fn test_delete_all_removes_every_key() -> Result<()> {
    let (manager, other) = memory_managers("svc/env", "svc/other");
    let ctx = OperationContext::background();
    manager
        .write_keys(&ctx, &config(&[("a", "1"), ("b", "2")]))
        .await?;
    other.write(&ctx, "a", "kept").await?;

    manager.delete_all(&ctx).await?;
    manager.delete_all(&ctx).await?;

    assert!(manager.read_all(&ctx).await?.is_empty());
    assert_eq!(other.read(&ctx, "a").await?, "kept");
    Ok(())
}

#[tokio::test]
async fn test_pass_through_operations() -> Result<()> {
    let (manager, _) = memory_managers("svc/env", "svc/unused");
    let ctx = OperationContext::background();
    manager.write(&ctx, "a", "1").await?;
    manager.write(&ctx, "b", "2").await?;

    assert_eq!(
        manager.read_keys(&ctx, &keys(&["a", "b"])).await?,
        config(&[("a", "1"), ("b", "2")])
    );
    manager.delete(&ctx, "a").await?;
    let err = manager.read(&ctx, "a").await.unwrap_err();
    assert!(err.is_not_found());

    let metadata = manager.read_all_metadata(&ctx).await?;
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata[0].key, "b");
    assert_eq!(metadata[0].metadata["version"], "1");
    Ok(())
}

#[tokio::test]
async fn test_paths_and_display() {
    let (manager, _) = memory_managers("svc/env/", "svc/unused");

    assert_eq!(manager.service_path().as_str(), "/svc/env");
    assert_eq!(manager.format_key_path("DB_HOST"), "/svc/env/DB_HOST");
    assert_eq!(
        manager.to_string(),
        "ConfigManager(service='/svc/env', storage='InMemoryStorage')"
    );
    assert_eq!(
        manager.metadata_keys(),
        ["version", "last_modified_date", "last_modified_user"]
    );
}
