// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::progress_service::{ProgressReporter, ProgressService};
use crate::actors::registry::ActorRegistry;
use crate::domain::models::job::{Job, JobFilters, JobId, JobState, JobStatus, ProgressUpdate};
use crate::domain::models::platform::ScrapingRequest;
use crate::domain::models::scraping_result::ScrapingResult;
use crate::domain::repositories::result_repository::ResultRepository;
use crate::queue::job_queue::JobQueue;
use crate::utils::errors::ScrapingError;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// 任务执行器
///
/// 作为队列回调运行单个任务：启动、执行平台执行器、保存结果并更新状态。
pub struct JobExecutor {
    registry: Arc<ActorRegistry>,
    progress: Arc<ProgressService>,
    results: Arc<dyn ResultRepository>,
}

impl JobExecutor {
    pub fn new(
        registry: Arc<ActorRegistry>,
        progress: Arc<ProgressService>,
        results: Arc<dyn ResultRepository>,
    ) -> Self {
        Self {
            registry,
            progress,
            results,
        }
    }

    pub async fn execute_job(&self, job: Job) -> Result<(), ScrapingError> {
        let job_id = job.id;

        // 出队前已被取消
        if !self.progress.start(job_id) {
            info!(job_id = %job_id, "Skipping job that is no longer pending");
            return Ok(());
        }
        self.progress
            .update(job_id, ProgressUpdate::progress(10, "Starting scraping"));

        match self.run(&job).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(job_id = %job_id, platform = %job.platform, error = %e, "Job execution failed");
                self.progress.fail(job_id, e.to_string());
                Err(e)
            }
        }
    }

    async fn run(&self, job: &Job) -> Result<(), ScrapingError> {
        let actor = self.registry.get(job.platform)?;
        let reporter = ProgressReporter::new(job.id, self.progress.clone());

        let mut result = actor.execute(&job.request.config, &reporter).await?;
        result.metadata.job_id = Some(job.id);

        if self
            .progress
            .get(job.id)
            .map_or(true, |status| status.status.is_terminal())
        {
            info!(job_id = %job.id, "Discarding result of job cancelled while running");
            return Ok(());
        }

        // 先落盘再标记完成，保证 Completed 的任务总能取到结果
        self.results.save(job.id, &result).await?;
        if !self.progress.complete(job.id) {
            info!(job_id = %job.id, "Job cancelled before completion, removing stored result");
            if let Err(e) = self.results.delete(job.id).await {
                warn!(job_id = %job.id, error = %e, "Failed to remove discarded result");
            }
            return Ok(());
        }

        info!(
            job_id = %job.id,
            platform = %job.platform,
            total_items = result.metadata.total_items,
            "Job completed"
        );
        Ok(())
    }
}

/// 取消结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// 等待中的任务已移出队列
    Dequeued,
    /// 运行中的任务仅被标记，远端执行不会中断
    MarkedRunning,
}

/// 任务概览，已完成的任务附带结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    #[serde(flatten)]
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScrapingResult>,
}

/// 队列统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueStats {
    pub total_jobs: usize,
    pub pending_jobs: usize,
    pub running_jobs: usize,
    pub completed_jobs: usize,
    pub failed_jobs: usize,
    pub cancelled_jobs: usize,
    pub max_concurrent: usize,
    pub paused: bool,
}

/// 抓取服务
///
/// 负责创建任务并交给队列调度，同时提供状态、结果查询与取消。
/// 任务状态以 [`ProgressService`] 为准，结果以结果仓库为准。
pub struct ScrapingService {
    registry: Arc<ActorRegistry>,
    progress: Arc<ProgressService>,
    results: Arc<dyn ResultRepository>,
    queue: JobQueue,
}

impl ScrapingService {
    pub fn new(
        registry: Arc<ActorRegistry>,
        progress: Arc<ProgressService>,
        results: Arc<dyn ResultRepository>,
        max_concurrent: usize,
    ) -> Self {
        let executor = Arc::new(JobExecutor::new(
            registry.clone(),
            progress.clone(),
            results.clone(),
        ));
        let queue = JobQueue::new(max_concurrent, move |job: Job| {
            let executor = executor.clone();
            async move { executor.execute_job(job).await }
        });

        Self {
            registry,
            progress,
            results,
            queue,
        }
    }

    /// 校验并创建任务，立即返回，执行在后台进行
    pub fn start_job(&self, request: ScrapingRequest) -> Result<Job, ScrapingError> {
        let platform = request.platform();
        let actor = self.registry.get(platform)?;
        actor.validate(&request.config)?;

        let job = Job::new(request);
        self.progress.create(job.id, platform);
        let position = self.queue.enqueue(job.clone());

        info!(
            job_id = %job.id,
            platform = %platform,
            priority = %job.priority,
            position,
            "Scraping job created"
        );
        Ok(job)
    }

    pub fn get_job_status(&self, job_id: JobId) -> Result<JobStatus, ScrapingError> {
        self.progress
            .get(job_id)
            .ok_or(ScrapingError::JobNotFound(job_id))
    }

    /// 已完成任务的结果；状态记录已被清理时直接读取仓库
    pub async fn get_job_results(&self, job_id: JobId) -> Result<ScrapingResult, ScrapingError> {
        if let Some(status) = self.progress.get(job_id) {
            if status.status != JobState::Completed {
                return Err(ScrapingError::JobNotCompleted {
                    job_id,
                    status: status.status,
                });
            }
        }

        self.results
            .load(job_id)
            .await?
            .ok_or(ScrapingError::JobNotFound(job_id))
    }

    pub fn cancel_job(&self, job_id: JobId) -> Result<CancelOutcome, ScrapingError> {
        // 状态先行：即使任务恰好被调度，执行器也会因 start 失败而跳过
        self.progress.cancel(job_id)?;

        let outcome = if self.queue.cancel(job_id) {
            CancelOutcome::Dequeued
        } else {
            CancelOutcome::MarkedRunning
        };
        info!(job_id = %job_id, outcome = ?outcome, "Job cancelled");
        Ok(outcome)
    }

    /// 按条件列出任务，最新的在前
    pub async fn list_jobs(&self, filters: &JobFilters) -> Result<Vec<JobSummary>, ScrapingError> {
        let candidates = match filters.status {
            Some(state) => self.progress.by_status(state),
            None => self.progress.all(),
        };
        let statuses = candidates
            .into_iter()
            .filter(|status| filters.matches(status))
            .take(filters.limit.unwrap_or(usize::MAX));

        let mut jobs = Vec::new();
        for status in statuses {
            let result = if status.status == JobState::Completed {
                match self.results.load(status.job_id).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(job_id = %status.job_id, error = %e, "Failed to load job result");
                        None
                    }
                }
            } else {
                None
            };
            jobs.push(JobSummary { status, result });
        }
        Ok(jobs)
    }

    pub fn queue_stats(&self) -> QueueStats {
        let counts = self.progress.counts();
        let snapshot = self.queue.stats();
        QueueStats {
            total_jobs: counts.total,
            pending_jobs: snapshot.pending,
            running_jobs: snapshot.running,
            completed_jobs: counts.completed,
            failed_jobs: counts.failed,
            cancelled_jobs: counts.cancelled,
            max_concurrent: snapshot.max_concurrent,
            paused: snapshot.paused,
        }
    }

    /// 清理创建时间早于 `max_age` 的终止任务记录
    pub fn cleanup(&self, max_age: chrono::Duration) -> usize {
        let removed = self.progress.evict_older_than(max_age);
        if removed > 0 {
            info!(removed, "Evicted old job records");
        }
        removed
    }

    pub fn set_max_concurrent(&self, max_concurrent: usize) {
        self.queue.set_max_concurrent(max_concurrent);
    }

    pub fn progress(&self) -> &Arc<ProgressService> {
        &self.progress
    }

    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    pub fn registry(&self) -> &Arc<ActorRegistry> {
        &self.registry
    }
}
