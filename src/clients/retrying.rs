// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::credentials::CredentialRotator;
use super::types::{ActorApi, ApiClient, ApiConnector, ApiError, ItemList, RunInfo};
use crate::infrastructure::metrics::API_RETRIES_TOTAL;
use crate::utils::retry_policy::RetryPolicy;
use async_trait::async_trait;
use metrics::counter;
use parking_lot::RwLock;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, warn};

struct Connection {
    credential: String,
    api: Arc<dyn ActorApi>,
}

/// 带凭证轮换的重试客户端
///
/// 额度耗尽类错误触发轮换并立即用新令牌重试，不消耗重试次数；
/// 其他错误按 [`RetryPolicy`] 固定间隔重试。
pub struct RetryingApiClient {
    rotator: Arc<CredentialRotator>,
    connector: Arc<dyn ApiConnector>,
    connection: RwLock<Option<Connection>>,
    policy: RetryPolicy,
}

impl RetryingApiClient {
    pub fn new(
        rotator: Arc<CredentialRotator>,
        connector: Arc<dyn ApiConnector>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            rotator,
            connector,
            connection: RwLock::new(None),
            policy,
        }
    }

    pub fn credential_count(&self) -> usize {
        self.rotator.count()
    }

    pub fn rotator(&self) -> &Arc<CredentialRotator> {
        &self.rotator
    }

    /// 当前令牌对应的后端连接，令牌变化时重建
    fn connection(&self) -> Result<(String, Arc<dyn ActorApi>), ApiError> {
        if self.rotator.is_drained() {
            return Err(ApiError::AllCredentialsExhausted);
        }
        let credential = self.rotator.current()?;

        if let Some(conn) = self.connection.read().as_ref() {
            if conn.credential == credential {
                return Ok((credential, conn.api.clone()));
            }
        }

        debug!("Connecting with new Apify token");
        let api = self.connector.connect(&credential)?;
        *self.connection.write() = Some(Connection {
            credential: credential.clone(),
            api: api.clone(),
        });
        Ok((credential, api))
    }

    async fn execute_with_retry<T, F, Fut>(&self, context: &str, operation: F) -> Result<T, ApiError>
    where
        F: Fn(Arc<dyn ActorApi>) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            let (credential, api) = self.connection()?;

            let err = match operation(api).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if err.is_fatal() {
                return Err(err);
            }

            if err.is_exhaustion() {
                warn!(context, error = %err, "Token exhausted, rotating");
                if !self.rotator.rotate_on_exhaustion(&credential).await? {
                    error!(context, "No Apify tokens left");
                    return Err(ApiError::AllCredentialsExhausted);
                }
                tokio::time::sleep(self.policy.calculate_backoff(attempt.max(1))).await;
                continue;
            }

            attempt += 1;
            if !self.policy.should_retry(attempt) {
                error!(context, attempt, error = %err, "Giving up after retries");
                return Err(err);
            }

            counter!(API_RETRIES_TOTAL).increment(1);
            warn!(context, attempt, error = %err, "Request failed, retrying");
            tokio::time::sleep(self.policy.calculate_backoff(attempt)).await;
        }
    }
}

#[async_trait]
impl ApiClient for RetryingApiClient {
    async fn invoke(&self, actor_id: &str, input: Value) -> Result<RunInfo, ApiError> {
        let input = &input;
        self.execute_with_retry(actor_id, |api| async move {
            api.call_actor(actor_id, input).await
        })
        .await
    }

    async fn list_results(&self, dataset_id: &str) -> Result<ItemList, ApiError> {
        self.execute_with_retry(dataset_id, |api| async move {
            api.list_items(dataset_id).await
        })
        .await
    }
}
