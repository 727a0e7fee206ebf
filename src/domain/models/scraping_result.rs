// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job::JobId;
use super::platform::Platform;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 抓取结果元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingMetadata {
    pub platform: Platform,
    /// 由执行层在完成时写入
    pub job_id: Option<JobId>,
    pub scraped_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub total_items: usize,
    /// 毫秒
    pub total_duration: u64,
}

/// 抓取统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingStatistics {
    pub total_items: usize,
    pub duration: u64,
    pub success_rate: f64,
}

impl ScrapingStatistics {
    pub fn from_metadata(metadata: &ScrapingMetadata) -> Self {
        Self {
            total_items: metadata.total_items,
            duration: metadata.total_duration,
            success_rate: 100.0,
        }
    }
}

/// 完整抓取结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingResult {
    pub metadata: ScrapingMetadata,
    pub data: serde_json::Value,
    pub statistics: ScrapingStatistics,
}

/// 持久化形式，不保存统计信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredResult {
    pub metadata: ScrapingMetadata,
    pub data: serde_json::Value,
}

impl From<ScrapingResult> for StoredResult {
    fn from(result: ScrapingResult) -> Self {
        Self {
            metadata: result.metadata,
            data: result.data,
        }
    }
}

impl StoredResult {
    /// 还原为完整结果，统计信息按元数据重新计算
    pub fn into_result(self) -> ScrapingResult {
        let statistics = ScrapingStatistics::from_metadata(&self.metadata);
        ScrapingResult {
            metadata: self.metadata,
            data: self.data,
            statistics,
        }
    }
}

/// 统计负载中的条目数：数组长度或 `posts` 字段长度
pub fn count_items(data: &serde_json::Value) -> usize {
    match data {
        serde_json::Value::Array(items) => items.len(),
        serde_json::Value::Object(map) => map
            .get("posts")
            .and_then(|posts| posts.as_array())
            .map_or(0, Vec::len),
        _ => 0,
    }
}
