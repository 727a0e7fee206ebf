// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 凭证错误类型
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("No Apify tokens available")]
    NoCredentialsAvailable,

    #[error("Credential store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Credential store error: {0}")]
    Store(String),
}

/// 凭证持久化特质
///
/// 保存的顺序即轮换顺序。
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Vec<String>, CredentialError>;

    async fn persist(&self, credentials: &[String]) -> Result<(), CredentialError>;
}
