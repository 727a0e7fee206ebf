// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::clients::types::ApiError;
use crate::domain::models::job::{JobId, JobState};
use crate::domain::repositories::storage_repository::StorageError;
use thiserror::Error;

/// 抓取服务错误类型
///
/// 覆盖任务创建、查询、执行各阶段可能出现的错误。
/// 同步错误直接返回给调用方，执行期错误记录到任务状态中。
#[derive(Error, Debug)]
pub enum ScrapingError {
    /// 平台配置校验失败，包含全部违规项
    #[error("Validation failed: {}", .0.join(", "))]
    InvalidConfig(Vec<String>),

    /// 未注册的平台
    #[error("Platform '{0}' is not supported")]
    PlatformNotSupported(String),

    /// 任务不存在
    #[error("Job {0} not found")]
    JobNotFound(JobId),

    /// 任务尚未完成
    #[error("Job {job_id} is not completed. Current status: {status}")]
    JobNotCompleted { job_id: JobId, status: JobState },

    /// 任务已处于终止状态
    #[error("Job {job_id} is already {status}")]
    JobAlreadyTerminal { job_id: JobId, status: JobState },

    /// 所有API令牌均已耗尽
    #[error("All Apify tokens have been exhausted. Please add more tokens.")]
    AllCredentialsExhausted,

    /// 可重试的IO错误，重试预算耗尽后才会暴露
    #[error("Transient I/O failure: {0}")]
    TransientIo(String),

    /// 令牌池为空
    #[error("No Apify tokens available")]
    NoCredentialsAvailable,

    /// 结果存储错误
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 内部错误
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScrapingError {
    /// 是否为凭证相关的致命错误
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            ScrapingError::AllCredentialsExhausted | ScrapingError::NoCredentialsAvailable
        )
    }
}

impl From<ApiError> for ScrapingError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::AllCredentialsExhausted => ScrapingError::AllCredentialsExhausted,
            ApiError::NoCredentialsAvailable => ScrapingError::NoCredentialsAvailable,
            other => ScrapingError::TransientIo(other.to_string()),
        }
    }
}

/// Worker错误类型
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("服务错误: {0}")]
    ServiceError(#[from] ScrapingError),

    #[error("内部错误: {0}")]
    InternalError(String),
}
