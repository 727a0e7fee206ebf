// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::worker::Worker;
use crate::config::settings::CleanupSettings;
use crate::domain::services::scraping_service::ScrapingService;
use crate::utils::errors::WorkerError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// 任务记录清理工作器
///
/// 定期清理创建时间超过 `max_age` 的终止任务记录，已保存的结果不受影响。
pub struct CleanupWorker {
    service: Arc<ScrapingService>,
    interval: Duration,
    max_age: chrono::Duration,
}

impl CleanupWorker {
    pub fn new(service: Arc<ScrapingService>, settings: &CleanupSettings) -> Self {
        Self {
            service,
            interval: Duration::from_secs(settings.interval_secs.max(1)),
            max_age: chrono::Duration::hours(settings.max_age_hours),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// 执行一次清理，返回移除数量
    pub fn run_once(&self) -> usize {
        let removed = self.service.cleanup(self.max_age);
        if removed > 0 {
            info!(removed, "Cleaned up old jobs");
        } else {
            debug!("No old jobs to clean up");
        }
        removed
    }
}

#[async_trait]
impl Worker for CleanupWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        info!(
            interval_secs = self.interval.as_secs(),
            max_age_hours = self.max_age.num_hours(),
            "Job cleanup worker started"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // 第一次 tick 立即完成，跳过
        interval.tick().await;

        loop {
            interval.tick().await;
            self.run_once();
        }
    }

    fn name(&self) -> &str {
        "cleanup"
    }
}
