// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::worker::Worker;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 负责启动后台工作器并在关闭时统一终止。
#[derive(Default)]
pub struct WorkerManager {
    handles: Vec<(String, JoinHandle<()>)>,
}

impl WorkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在独立任务中运行工作器
    pub fn spawn(&mut self, worker: Arc<dyn Worker>) {
        let name = worker.name().to_string();
        info!(worker = %name, "Starting worker");

        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            match worker.run().await {
                Ok(()) => info!(worker = %task_name, "Worker exited"),
                Err(e) => error!(worker = %task_name, error = %e, "Worker stopped with error"),
            }
        });
        self.handles.push((name, handle));
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 终止所有工作器
    pub async fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for (name, handle) in self.handles.drain(..) {
            handle.abort();
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!(worker = %name, error = %e, "Worker panicked");
                }
            }
        }
        info!("Workers shut down successfully");
    }
}
