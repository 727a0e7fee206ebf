// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::credential_repository::CredentialError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// 触发凭证轮换的错误信息片段（小写匹配）
const EXHAUSTION_MARKERS: [&str; 5] = [
    "403",
    "forbidden",
    "quota exceeded",
    "limit exceeded",
    "payment required",
];

/// 一次执行器运行的信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub id: String,
    pub status: String,
    pub default_dataset_id: String,
}

/// 数据集条目分页
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemList {
    pub items: Vec<Value>,
    pub total: usize,
    pub offset: usize,
    pub count: usize,
}

impl ItemList {
    pub fn from_items(items: Vec<Value>) -> Self {
        let count = items.len();
        Self {
            items,
            total: count,
            offset: 0,
            count,
        }
    }
}

/// API 客户端错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Apify API error ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Actor run {run_id} finished with status {status}")]
    RunFailed { run_id: String, status: String },

    #[error("Failed to decode Apify response: {0}")]
    Decode(String),

    #[error("Invalid Apify base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("All Apify tokens have been exhausted. Please add more tokens.")]
    AllCredentialsExhausted,

    #[error("No Apify tokens available")]
    NoCredentialsAvailable,

    #[error("Credential error: {0}")]
    Credentials(String),
}

impl ApiError {
    /// 凭证额度耗尽类错误：402/403 状态码或特定错误信息
    pub fn is_exhaustion(&self) -> bool {
        let status = match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        };
        if matches!(status, Some(402) | Some(403)) {
            return true;
        }
        if self.is_fatal() {
            return false;
        }

        let message = self.to_string().to_lowercase();
        EXHAUSTION_MARKERS.iter().any(|m| message.contains(m))
    }

    /// 不可重试，直接返回给调用方
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ApiError::AllCredentialsExhausted
                | ApiError::NoCredentialsAvailable
                | ApiError::Credentials(_)
                | ApiError::InvalidBaseUrl(_)
        )
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::NoCredentialsAvailable => ApiError::NoCredentialsAvailable,
            other => ApiError::Credentials(other.to_string()),
        }
    }
}

/// 单个凭证绑定的执行器后端
#[async_trait]
pub trait ActorApi: Send + Sync {
    /// 启动执行器并等待运行结束
    async fn call_actor(&self, actor_id: &str, input: &Value) -> Result<RunInfo, ApiError>;

    async fn list_items(&self, dataset_id: &str) -> Result<ItemList, ApiError>;
}

/// 根据凭证创建后端连接
pub trait ApiConnector: Send + Sync {
    fn connect(&self, credential: &str) -> Result<Arc<dyn ActorApi>, ApiError>;
}

/// 平台执行器使用的客户端接口
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn invoke(&self, actor_id: &str, input: Value) -> Result<RunInfo, ApiError>;

    async fn list_results(&self, dataset_id: &str) -> Result<ItemList, ApiError>;
}
