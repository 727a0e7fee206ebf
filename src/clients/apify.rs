// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::types::{ActorApi, ApiConnector, ApiError, ItemList, RunInfo};
use crate::config::settings::ApifySettings;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";

const PAGINATION_TOTAL_HEADER: &str = "x-apify-pagination-total";
const PAGINATION_OFFSET_HEADER: &str = "x-apify-pagination-offset";

/// Apify 接口统一的 `{"data": ...}` 包装
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: T,
}

/// Apify REST 客户端，绑定单个令牌
pub struct ApifyHttpClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    wait_for_finish_secs: u64,
}

impl ApifyHttpClient {
    pub fn new(client: reqwest::Client, base_url: &str, token: &str, wait_for_finish_secs: u64) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            wait_for_finish_secs,
        }
    }

    /// `owner/name` 形式的执行器ID在URL中写作 `owner~name`
    fn actor_path(actor_id: &str) -> String {
        actor_id.replace('/', "~")
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: body,
        })
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ApiError> {
        let bytes = resp.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn start_run(&self, actor_id: &str, input: &Value) -> Result<RunInfo, ApiError> {
        let url = format!("{}/acts/{}/runs", self.base_url, Self::actor_path(actor_id));
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let resp: ApiResponse<RunInfo> = Self::decode(Self::check(resp).await?).await?;
        Ok(resp.data)
    }

    /// 长轮询直到运行结束
    async fn wait_for_run(&self, run_id: &str) -> Result<RunInfo, ApiError> {
        loop {
            let url = format!(
                "{}/actor-runs/{}?waitForFinish={}",
                self.base_url, run_id, self.wait_for_finish_secs
            );
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;

            let resp: ApiResponse<RunInfo> = Self::decode(Self::check(resp).await?).await?;
            match resp.data.status.as_str() {
                "SUCCEEDED" => return Ok(resp.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ApiError::RunFailed {
                        run_id: resp.data.id,
                        status: resp.data.status,
                    });
                }
                _ => {
                    debug!(run_id, status = %resp.data.status, "Run still in progress");
                }
            }
        }
    }
}

fn header_usize(resp: &reqwest::Response, name: &str) -> Option<usize> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
}

#[async_trait]
impl ActorApi for ApifyHttpClient {
    async fn call_actor(&self, actor_id: &str, input: &Value) -> Result<RunInfo, ApiError> {
        let run = self.start_run(actor_id, input).await?;
        debug!(actor_id, run_id = %run.id, "Apify run started, polling for completion");

        if run.status == "SUCCEEDED" {
            return Ok(run);
        }
        self.wait_for_run(&run.id).await
    }

    async fn list_items(&self, dataset_id: &str) -> Result<ItemList, ApiError> {
        let url = format!(
            "{}/datasets/{}/items?format=json&clean=true",
            self.base_url, dataset_id
        );
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let resp = Self::check(resp).await?;

        let total = header_usize(&resp, PAGINATION_TOTAL_HEADER);
        let offset = header_usize(&resp, PAGINATION_OFFSET_HEADER).unwrap_or(0);
        let items: Vec<Value> = Self::decode(resp).await?;
        let count = items.len();

        debug!(dataset_id, count, "Fetched dataset items");
        Ok(ItemList {
            total: total.unwrap_or(count),
            offset,
            count,
            items,
        })
    }
}

/// 为每个令牌创建 [`ApifyHttpClient`]，共享同一个连接池
pub struct ApifyConnector {
    client: reqwest::Client,
    base_url: String,
    wait_for_finish_secs: u64,
}

impl ApifyConnector {
    /// 基础地址必须是 http(s) URL
    pub fn new(settings: &ApifySettings) -> Result<Self, ApiError> {
        let base_url = url::Url::parse(&settings.base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{} ({})", settings.base_url, e)))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidBaseUrl(settings.base_url.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            wait_for_finish_secs: settings.wait_for_finish_secs,
        })
    }
}

impl ApiConnector for ApifyConnector {
    fn connect(&self, credential: &str) -> Result<Arc<dyn ActorApi>, ApiError> {
        Ok(Arc::new(ApifyHttpClient::new(
            self.client.clone(),
            &self.base_url,
            credential,
            self.wait_for_finish_secs,
        )))
    }
}
