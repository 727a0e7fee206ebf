// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{JobCounts, JobId, JobState, JobStatus, ProgressUpdate};
use crate::domain::models::platform::Platform;
use crate::infrastructure::metrics::{
    JOBS_CANCELLED_TOTAL, JOBS_COMPLETED_TOTAL, JOBS_CREATED_TOTAL, JOBS_FAILED_TOTAL,
    JOB_DURATION_SECONDS,
};
use crate::utils::errors::ScrapingError;
use chrono::Utc;
use dashmap::DashMap;
use metrics::{counter, histogram};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CANCELLED_MESSAGE: &str = "cancelled by user";

/// 任务进度服务
///
/// 内存中维护任务ID到状态记录的映射，是任务状态的唯一来源。
/// 终止状态不可逆：已取消的任务收到的完成或失败事件会被丢弃。
#[derive(Default)]
pub struct ProgressService {
    jobs: DashMap<JobId, JobStatus>,
}

impl ProgressService {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记新任务，初始为 Pending
    pub fn create(&self, job_id: JobId, platform: Platform) -> JobStatus {
        let status = JobStatus::new(job_id, platform);
        self.jobs.insert(job_id, status.clone());
        counter!(JOBS_CREATED_TOTAL, "platform" => platform.as_str()).increment(1);
        debug!(job_id = %job_id, platform = %platform, "Job registered");
        status
    }

    /// 合并部分更新；未知任务只记录告警，终止状态的任务保持不变
    pub fn update(&self, job_id: JobId, update: ProgressUpdate) {
        match self.jobs.get_mut(&job_id) {
            Some(status) if status.status.is_terminal() => {
                debug!(job_id = %job_id, status = %status.status, "Progress update suppressed");
            }
            Some(mut status) => {
                if let Err(e) = status.apply(update) {
                    warn!(job_id = %job_id, error = %e, "Ignoring illegal status change");
                }
            }
            None => warn!(job_id = %job_id, "Progress update for unknown job"),
        }
    }

    /// Pending → Running，任务已被取消时返回 `false`
    pub fn start(&self, job_id: JobId) -> bool {
        let Some(mut status) = self.jobs.get_mut(&job_id) else {
            warn!(job_id = %job_id, "Start requested for unknown job");
            return false;
        };
        match status.transition(JobState::Running) {
            Ok(()) => {
                status.current_step = "Running".to_string();
                true
            }
            Err(e) => {
                debug!(job_id = %job_id, error = %e, "Job not started");
                false
            }
        }
    }

    /// 标记完成，进度置为 100；终止状态的任务保持不变
    pub fn complete(&self, job_id: JobId) -> bool {
        let Some(mut status) = self.jobs.get_mut(&job_id) else {
            warn!(job_id = %job_id, "Completion for unknown job");
            return false;
        };
        if status.status.is_terminal() {
            info!(job_id = %job_id, status = %status.status, "Completion suppressed");
            return false;
        }
        if status.status == JobState::Pending && status.transition(JobState::Running).is_err() {
            return false;
        }
        if status.transition(JobState::Completed).is_err() {
            return false;
        }
        status.progress = 100;
        status.current_step = "Completed".to_string();

        counter!(JOBS_COMPLETED_TOTAL, "platform" => status.platform.as_str()).increment(1);
        if let Some(started) = status.started_at {
            let elapsed = (Utc::now() - started).num_milliseconds().max(0) as f64 / 1000.0;
            histogram!(JOB_DURATION_SECONDS).record(elapsed);
        }
        true
    }

    /// 标记失败并记录错误信息；终止状态的任务保持不变
    pub fn fail(&self, job_id: JobId, message: impl Into<String>) -> bool {
        let Some(mut status) = self.jobs.get_mut(&job_id) else {
            warn!(job_id = %job_id, "Failure for unknown job");
            return false;
        };
        if status.status.is_terminal() {
            info!(job_id = %job_id, status = %status.status, "Failure suppressed");
            return false;
        }
        if status.status == JobState::Pending && status.transition(JobState::Running).is_err() {
            return false;
        }
        if status.transition(JobState::Failed).is_err() {
            return false;
        }
        status.error_message = Some(message.into());
        status.current_step = "Failed".to_string();

        counter!(JOBS_FAILED_TOTAL, "platform" => status.platform.as_str()).increment(1);
        true
    }

    /// 取消 Pending 或 Running 的任务
    pub fn cancel(&self, job_id: JobId) -> Result<JobStatus, ScrapingError> {
        let mut status = self
            .jobs
            .get_mut(&job_id)
            .ok_or(ScrapingError::JobNotFound(job_id))?;

        if status.transition(JobState::Cancelled).is_err() {
            return Err(ScrapingError::JobAlreadyTerminal {
                job_id,
                status: status.status,
            });
        }
        status.error_message = Some(CANCELLED_MESSAGE.to_string());
        status.current_step = "Cancelled".to_string();

        counter!(JOBS_CANCELLED_TOTAL, "platform" => status.platform.as_str()).increment(1);
        Ok(status.clone())
    }

    pub fn get(&self, job_id: JobId) -> Option<JobStatus> {
        self.jobs.get(&job_id).map(|s| s.clone())
    }

    /// 全部任务，按创建时间倒序
    pub fn all(&self) -> Vec<JobStatus> {
        let mut statuses: Vec<JobStatus> = self.jobs.iter().map(|e| e.value().clone()).collect();
        statuses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        statuses
    }

    /// 指定状态的任务，最新的在前
    pub fn by_status(&self, state: JobState) -> Vec<JobStatus> {
        let mut statuses: Vec<JobStatus> = self
            .jobs
            .iter()
            .filter(|e| e.status == state)
            .map(|e| e.value().clone())
            .collect();
        statuses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        statuses
    }

    pub fn counts(&self) -> JobCounts {
        let mut counts = JobCounts::default();
        for entry in self.jobs.iter() {
            counts.total += 1;
            match entry.status {
                JobState::Pending => counts.pending += 1,
                JobState::Running => counts.running += 1,
                JobState::Completed => counts.completed += 1,
                JobState::Failed => counts.failed += 1,
                JobState::Cancelled => counts.cancelled += 1,
            }
        }
        counts
    }

    /// 删除创建时间早于 `max_age` 的终止状态任务，返回删除数量
    pub fn evict_older_than(&self, max_age: chrono::Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut removed = 0;
        self.jobs.retain(|_, status| {
            let evict = status.status.is_terminal() && status.created_at < cutoff;
            if evict {
                removed += 1;
            }
            !evict
        });
        if removed > 0 {
            info!(removed, "Evicted old job records");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn backdate(&self, job_id: JobId, age: chrono::Duration) {
        if let Some(mut status) = self.jobs.get_mut(&job_id) {
            status.created_at = Utc::now() - age;
        }
    }
}

/// 执行过程中的进度上报句柄
#[derive(Clone, Default)]
pub struct ProgressReporter {
    target: Option<(JobId, Arc<ProgressService>)>,
}

impl ProgressReporter {
    pub fn new(job_id: JobId, tracker: Arc<ProgressService>) -> Self {
        Self {
            target: Some((job_id, tracker)),
        }
    }

    /// 不上报的句柄，供独立调用执行器时使用
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn report(&self, progress: u8, step: impl Into<String>) {
        if let Some((job_id, tracker)) = &self.target {
            tracker.update(*job_id, ProgressUpdate::progress(progress, step));
        }
    }
}
