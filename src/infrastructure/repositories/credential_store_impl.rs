// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::credential_repository::{CredentialError, CredentialStore};
use crate::utils::file_utils::{read_lines, write_lines};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;

/// 文件凭证存储
///
/// 一行一个令牌，忽略空行与 `#` 注释；回写时注释不保留。
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Vec<String>, CredentialError> {
        match read_lines(&self.path).await {
            Ok(lines) => Ok(lines),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CredentialError::Store(format!(
                    "Token file not found: {}",
                    self.path.display()
                )))
            }
            Err(e) => Err(CredentialError::Io(e)),
        }
    }

    async fn persist(&self, credentials: &[String]) -> Result<(), CredentialError> {
        write_lines(&self.path, credentials).await?;
        Ok(())
    }
}

/// 内存凭证存储，记录每次回写的内容
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credentials: Mutex<Vec<String>>,
    history: Mutex<Vec<Vec<String>>>,
}

impl InMemoryCredentialStore {
    pub fn new(credentials: Vec<String>) -> Self {
        Self {
            credentials: Mutex::new(credentials),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.credentials.lock().clone()
    }

    pub fn persist_history(&self) -> Vec<Vec<String>> {
        self.history.lock().clone()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Vec<String>, CredentialError> {
        Ok(self.credentials.lock().clone())
    }

    async fn persist(&self, credentials: &[String]) -> Result<(), CredentialError> {
        *self.credentials.lock() = credentials.to_vec();
        self.history.lock().push(credentials.to_vec());
        Ok(())
    }
}
