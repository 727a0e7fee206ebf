// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::storage_repository::StorageError;
use crate::domain::models::job::JobId;
use crate::domain::models::platform::Platform;
use crate::domain::models::scraping_result::ScrapingResult;
use async_trait::async_trait;

/// 结果列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct ResultFilter {
    pub platform: Option<Platform>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// 抓取结果仓库特质
#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn save(&self, job_id: JobId, result: &ScrapingResult) -> Result<(), StorageError>;

    /// 结果不存在时返回 `None`
    async fn load(&self, job_id: JobId) -> Result<Option<ScrapingResult>, StorageError>;

    async fn exists(&self, job_id: JobId) -> Result<bool, StorageError>;

    async fn delete(&self, job_id: JobId) -> Result<(), StorageError>;

    /// 按完成时间倒序列出
    async fn list(&self, filter: &ResultFilter) -> Result<Vec<ScrapingResult>, StorageError>;
}
