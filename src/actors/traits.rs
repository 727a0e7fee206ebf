// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::platform::{Platform, PlatformConfig};
use crate::domain::models::scraping_result::{
    count_items, ScrapingMetadata, ScrapingResult, ScrapingStatistics,
};
use crate::domain::services::progress_service::ProgressReporter;
use crate::utils::errors::ScrapingError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::time::Instant;
use tracing::{error, info};

/// 平台执行器特质
///
/// 每个平台实现校验、抓取与结果转换，[`ScrapingActor::execute`] 串联这些步骤
/// 并生成带元数据与统计的结果。
#[async_trait]
pub trait ScrapingActor: Send + Sync {
    fn platform(&self) -> Platform;

    /// Apify 执行器ID
    fn actor_id(&self) -> &str;

    /// 校验配置，一次性返回全部违规项
    fn validate(&self, config: &PlatformConfig) -> Result<(), ScrapingError>;

    /// 调用远端执行器，返回原始输出
    async fn run(
        &self,
        config: &PlatformConfig,
        reporter: &ProgressReporter,
    ) -> Result<Value, ScrapingError>;

    /// 将原始输出转换为统一格式
    fn transform(&self, raw: Value) -> Result<Value, ScrapingError>;

    async fn execute(
        &self,
        config: &PlatformConfig,
        reporter: &ProgressReporter,
    ) -> Result<ScrapingResult, ScrapingError> {
        let platform = self.platform();
        let started = Instant::now();
        let scraped_at = Utc::now();
        info!(platform = %platform, actor_id = self.actor_id(), "Starting scrape");

        let outcome = async {
            self.validate(config)?;
            let raw = self.run(config, reporter).await?;
            self.transform(raw)
        }
        .await;

        let data = match outcome {
            Ok(data) => data,
            Err(e) => {
                error!(platform = %platform, error = %e, "Error in actor");
                return Err(e);
            }
        };

        let total_duration = started.elapsed().as_millis() as u64;
        let metadata = ScrapingMetadata {
            platform,
            job_id: None,
            scraped_at,
            completed_at: Some(Utc::now()),
            total_items: count_items(&data),
            total_duration,
        };

        info!(
            platform = %platform,
            total_items = metadata.total_items,
            duration_ms = total_duration,
            "Scraping completed"
        );

        Ok(ScrapingResult {
            statistics: ScrapingStatistics::from_metadata(&metadata),
            metadata,
            data,
        })
    }
}

/// 配置与执行器平台不匹配时的错误
pub(crate) fn platform_mismatch(expected: Platform, config: &PlatformConfig) -> ScrapingError {
    ScrapingError::InvalidConfig(vec![format!(
        "Expected {} config, got {}",
        expected,
        config.platform()
    )])
}

