// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::JobId;
use crate::domain::models::scraping_result::{ScrapingResult, StoredResult};
use crate::domain::repositories::result_repository::{ResultFilter, ResultRepository};
use crate::domain::repositories::storage_repository::{StorageError, StorageRepository};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

const RESULT_SUFFIX: &str = ".json";

/// 基于键值存储的结果仓库
///
/// 每个任务保存为 `{job_id}.json`。
pub struct StorageResultRepository {
    storage: Arc<dyn StorageRepository>,
}

impl StorageResultRepository {
    pub fn new(storage: Arc<dyn StorageRepository>) -> Self {
        Self { storage }
    }

    fn key(job_id: JobId) -> String {
        format!("{}{}", job_id, RESULT_SUFFIX)
    }

    async fn read(&self, key: &str) -> Result<Option<ScrapingResult>, StorageError> {
        match self.storage.get(key).await? {
            Some(bytes) => {
                let stored: StoredResult = serde_json::from_slice(&bytes)?;
                Ok(Some(stored.into_result()))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ResultRepository for StorageResultRepository {
    async fn save(&self, job_id: JobId, result: &ScrapingResult) -> Result<(), StorageError> {
        let stored = StoredResult::from(result.clone());
        let bytes = serde_json::to_vec_pretty(&stored)?;
        self.storage.save(&Self::key(job_id), &bytes).await?;
        debug!(job_id = %job_id, bytes = bytes.len(), "Result saved");
        Ok(())
    }

    async fn load(&self, job_id: JobId) -> Result<Option<ScrapingResult>, StorageError> {
        self.read(&Self::key(job_id)).await
    }

    async fn exists(&self, job_id: JobId) -> Result<bool, StorageError> {
        self.storage.exists(&Self::key(job_id)).await
    }

    async fn delete(&self, job_id: JobId) -> Result<(), StorageError> {
        self.storage.delete(&Self::key(job_id)).await
    }

    async fn list(&self, filter: &ResultFilter) -> Result<Vec<ScrapingResult>, StorageError> {
        let mut results = Vec::new();
        for key in self.storage.list_keys().await? {
            if !key.ends_with(RESULT_SUFFIX) {
                continue;
            }
            match self.read(&key).await {
                Ok(Some(result)) => {
                    if filter
                        .platform
                        .map_or(true, |p| p == result.metadata.platform)
                    {
                        results.push(result);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!(key = %key, error = %e, "Skipping unreadable result"),
            }
        }

        results.sort_by(|a, b| {
            let a_time = a.metadata.completed_at.unwrap_or(a.metadata.scraped_at);
            let b_time = b.metadata.completed_at.unwrap_or(b.metadata.scraped_at);
            b_time.cmp(&a_time)
        });

        let iter = results.into_iter().skip(filter.offset);
        Ok(match filter.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        })
    }
}
