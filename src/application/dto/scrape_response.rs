// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{JobId, JobState, JobStatus};
use crate::domain::models::scraping_result::{ScrapingMetadata, ScrapingResult, ScrapingStatistics};
use crate::domain::services::scraping_service::{JobSummary, QueueStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 创建任务响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScrapeResponseDto {
    pub success: bool,
    pub job_id: JobId,
    pub status: JobState,
    pub message: String,
}

/// 任务状态响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponseDto {
    pub success: bool,
    pub job_id: JobId,
    pub status: JobState,
    pub progress: u8,
    pub current_step: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<JobStatus> for JobStatusResponseDto {
    fn from(status: JobStatus) -> Self {
        Self {
            success: true,
            job_id: status.job_id,
            status: status.status,
            progress: status.progress,
            current_step: status.current_step,
            error_message: status.error_message,
        }
    }
}

/// 任务结果响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResultsResponseDto {
    pub success: bool,
    pub job_id: JobId,
    pub metadata: ScrapingMetadata,
    pub data: Value,
    pub statistics: ScrapingStatistics,
}

impl JobResultsResponseDto {
    pub fn new(job_id: JobId, result: ScrapingResult) -> Self {
        Self {
            success: true,
            job_id,
            metadata: result.metadata,
            data: result.data,
            statistics: result.statistics,
        }
    }
}

/// 取消任务响应
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelJobResponseDto {
    pub success: bool,
    pub message: String,
}

/// 任务列表响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsResponseDto {
    pub success: bool,
    pub jobs: Vec<JobSummary>,
    pub count: usize,
}

/// 队列统计响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatsResponseDto {
    pub success: bool,
    #[serde(flatten)]
    pub stats: QueueStats,
}

/// 健康检查响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponseDto {
    pub success: bool,
    /// `healthy` 或 `degraded`
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub services: HealthServicesDto,
    pub details: HealthDetailsDto,
}

#[derive(Debug, Serialize)]
pub struct HealthServicesDto {
    pub api: bool,
    pub apify: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDetailsDto {
    pub available_tokens: usize,
    pub queue: QueueStats,
}

/// 就绪检查响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponseDto {
    pub success: bool,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_available: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 存活检查响应
#[derive(Debug, Serialize)]
pub struct LivenessResponseDto {
    pub success: bool,
    pub alive: bool,
    pub timestamp: DateTime<Utc>,
}
