// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::credential_repository::{CredentialError, CredentialStore};
use crate::infrastructure::metrics::{CREDENTIALS_AVAILABLE, CREDENTIAL_ROTATIONS_TOTAL};
use metrics::{counter, gauge};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// 日志中只显示令牌前缀
fn preview(credential: &str) -> String {
    let head: String = credential.chars().take(8).collect();
    format!("{}...", head)
}

#[derive(Debug, Clone, Default)]
struct CredentialPool {
    credentials: Vec<String>,
    /// 指向有效凭证，池为空时无意义
    current: usize,
}

impl CredentialPool {
    fn current(&self) -> Option<&String> {
        self.credentials.get(self.current)
    }
}

/// 凭证轮换器
///
/// 维护有序的API令牌池。额度耗尽的令牌被永久移除，剩余列表同步回写到存储。
/// 轮换与回写通过异步互斥锁串行执行，读取当前令牌只需短暂的读锁。
pub struct CredentialRotator {
    store: Arc<dyn CredentialStore>,
    pool: RwLock<CredentialPool>,
    rotation: Mutex<()>,
}

impl CredentialRotator {
    /// 从存储加载令牌池，池为空时返回 `NoCredentialsAvailable`
    pub async fn load(store: Arc<dyn CredentialStore>) -> Result<Self, CredentialError> {
        let credentials = store.load().await?;
        if credentials.is_empty() {
            return Err(CredentialError::NoCredentialsAvailable);
        }

        info!(
            count = credentials.len(),
            first = %preview(&credentials[0]),
            "Loaded Apify tokens"
        );
        gauge!(CREDENTIALS_AVAILABLE).set(credentials.len() as f64);

        Ok(Self {
            store,
            pool: RwLock::new(CredentialPool {
                credentials,
                current: 0,
            }),
            rotation: Mutex::new(()),
        })
    }

    /// 当前使用的令牌
    pub fn current(&self) -> Result<String, CredentialError> {
        self.pool
            .read()
            .current()
            .cloned()
            .ok_or(CredentialError::NoCredentialsAvailable)
    }

    /// 移除耗尽的令牌并切换到下一个
    ///
    /// 返回是否还有可用令牌。若 `exhausted` 已不是当前令牌（其他任务已完成轮换），
    /// 不做任何修改并返回 `true`。
    pub async fn rotate_on_exhaustion(&self, exhausted: &str) -> Result<bool, CredentialError> {
        let _guard = self.rotation.lock().await;

        let mut next = self.pool.read().clone();
        match next.current() {
            None => return Ok(false),
            Some(current) if current != exhausted => {
                info!(
                    exhausted = %preview(exhausted),
                    current = %preview(current),
                    "Token already rotated by another caller"
                );
                return Ok(true);
            }
            Some(_) => {}
        }

        warn!(token = %preview(exhausted), "Removing exhausted token");
        next.credentials.remove(next.current);
        if next.current >= next.credentials.len() {
            next.current = 0;
        }

        self.store.persist(&next.credentials).await?;

        let remaining = next.credentials.len();
        let replacement = next.current().map(|c| preview(c));
        *self.pool.write() = next;

        counter!(CREDENTIAL_ROTATIONS_TOTAL).increment(1);
        gauge!(CREDENTIALS_AVAILABLE).set(remaining as f64);

        match replacement {
            Some(token) => {
                info!(remaining, token = %token, "Switched to next token");
                Ok(true)
            }
            None => {
                error!("All Apify tokens exhausted");
                Ok(false)
            }
        }
    }

    /// 追加新令牌并回写，已存在的令牌会被忽略；返回令牌总数
    pub async fn add(&self, credential: &str) -> Result<usize, CredentialError> {
        let credential = credential.trim();
        if credential.is_empty() {
            return Err(CredentialError::Store("Empty token".to_string()));
        }

        let _guard = self.rotation.lock().await;
        let mut next = self.pool.read().clone();
        if next.credentials.iter().any(|c| c == credential) {
            return Ok(next.credentials.len());
        }

        next.credentials.push(credential.to_string());
        self.store.persist(&next.credentials).await?;

        let total = next.credentials.len();
        *self.pool.write() = next;
        gauge!(CREDENTIALS_AVAILABLE).set(total as f64);
        info!(total, "Added new token");
        Ok(total)
    }

    pub fn count(&self) -> usize {
        self.pool.read().credentials.len()
    }

    pub fn is_drained(&self) -> bool {
        self.pool.read().credentials.is_empty()
    }
}
