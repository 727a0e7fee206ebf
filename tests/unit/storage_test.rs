// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapeq::config::settings::StorageSettings;
use scrapeq::domain::models::platform::Platform;
use scrapeq::domain::models::scraping_result::{ScrapingMetadata, ScrapingResult, ScrapingStatistics};
use scrapeq::domain::repositories::result_repository::ResultRepository;
use scrapeq::domain::repositories::storage_repository::StorageError;
use scrapeq::infrastructure::repositories::result_repo_impl::StorageResultRepository;
use scrapeq::infrastructure::storage::create_storage_repository;
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

fn settings(storage_type: &str, local_path: &str) -> StorageSettings {
    StorageSettings {
        storage_type: storage_type.to_string(),
        local_path: local_path.to_string(),
    }
}

#[test]
fn test_unknown_storage_type() {
    let err = create_storage_repository(&settings("s3", "./output")).err();
    assert!(matches!(err, Some(StorageError::Other(_))));
}

#[tokio::test]
async fn test_memory_storage_from_settings() {
    let storage = create_storage_repository(&settings("memory", "")).unwrap();
    storage.save("k.json", b"{}").await.unwrap();
    assert!(storage.exists("k.json").await.unwrap());
}

/// 本地存储的结果在重新创建仓库后仍可读取
#[tokio::test]
async fn test_local_results_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("output");
    let path = path.to_str().unwrap();
    let job_id = Uuid::new_v4();

    let metadata = ScrapingMetadata {
        platform: Platform::Reddit,
        job_id: Some(job_id),
        scraped_at: chrono::Utc::now(),
        completed_at: Some(chrono::Utc::now()),
        total_items: 2,
        total_duration: 1500,
    };
    let result = ScrapingResult {
        statistics: ScrapingStatistics::from_metadata(&metadata),
        metadata,
        data: json!({ "posts": [{ "redditId": "a" }, { "redditId": "b" }] }),
    };

    let first = StorageResultRepository::new(create_storage_repository(&settings("local", path)).unwrap());
    first.save(job_id, &result).await.unwrap();

    let second = StorageResultRepository::new(create_storage_repository(&settings("local", path)).unwrap());
    let loaded = second.load(job_id).await.unwrap().unwrap();
    assert_eq!(loaded.metadata.platform, Platform::Reddit);
    assert_eq!(loaded.metadata.total_items, 2);
    assert_eq!(loaded.data["posts"][1]["redditId"], "b");
}
