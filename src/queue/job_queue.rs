// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{Job, JobId};
use crate::infrastructure::metrics::{JOBS_PENDING, JOBS_RUNNING};
use crate::utils::errors::ScrapingError;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use metrics::gauge;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 任务执行回调
pub type JobHandler =
    Arc<dyn Fn(Job) -> BoxFuture<'static, Result<(), ScrapingError>> + Send + Sync>;

struct QueueEntry {
    job: Job,
    priority: u8,
    enqueued_at: DateTime<Utc>,
}

struct QueueState {
    /// 按优先级降序排列，同优先级先进先出
    pending: VecDeque<QueueEntry>,
    running: HashMap<JobId, Job>,
    max_concurrent: usize,
    paused: bool,
}

impl QueueState {
    fn publish_gauges(&self) {
        gauge!(JOBS_PENDING).set(self.pending.len() as f64);
        gauge!(JOBS_RUNNING).set(self.running.len() as f64);
    }
}

struct QueueInner {
    state: Mutex<QueueState>,
    handler: JobHandler,
}

/// 队列快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSnapshot {
    pub pending: usize,
    pub running: usize,
    pub max_concurrent: usize,
    pub paused: bool,
}

/// 内存优先级任务队列
///
/// 入队后按优先级与到达顺序调度，同时运行的任务数不超过 `max_concurrent`。
/// 准入判断在状态锁内完成，任务执行在独立的 tokio 任务中进行；
/// 回调返回错误或发生 panic 都会释放槽位并继续调度。
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<QueueInner>,
}

impl JobQueue {
    pub fn new<F, Fut>(max_concurrent: usize, handler: F) -> Self
    where
        F: Fn(Job) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ScrapingError>> + Send + 'static,
    {
        let handler: JobHandler = Arc::new(move |job| handler(job).boxed());
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    running: HashMap::new(),
                    max_concurrent: max_concurrent.max(1),
                    paused: false,
                }),
                handler,
            }),
        }
    }

    /// 入队并尝试调度，返回入队时在等待队列中的位置
    pub fn enqueue(&self, job: Job) -> usize {
        let job_id = job.id;
        let priority = job.priority;
        let position = {
            let mut state = self.inner.state.lock();
            let rank = priority.ordinal();
            let position = state
                .pending
                .iter()
                .position(|entry| entry.priority < rank)
                .unwrap_or(state.pending.len());
            state.pending.insert(
                position,
                QueueEntry {
                    job,
                    priority: rank,
                    enqueued_at: Utc::now(),
                },
            );
            state.publish_gauges();
            position
        };

        info!(job_id = %job_id, priority = %priority, position, "Job enqueued");
        self.dispatch_next();
        position
    }

    /// 在槽位允许的范围内取出队首任务执行
    pub fn dispatch_next(&self) {
        let admitted: Vec<(Job, DateTime<Utc>)> = {
            let mut state = self.inner.state.lock();
            if state.paused {
                return;
            }

            let mut admitted = Vec::new();
            while state.running.len() < state.max_concurrent {
                let Some(entry) = state.pending.pop_front() else {
                    break;
                };
                state.running.insert(entry.job.id, entry.job.clone());
                admitted.push((entry.job, entry.enqueued_at));
            }
            if !admitted.is_empty() {
                state.publish_gauges();
            }
            admitted
        };

        for (job, enqueued_at) in admitted {
            let waited_ms = (Utc::now() - enqueued_at).num_milliseconds();
            debug!(job_id = %job.id, waited_ms, "Job admitted");
            self.spawn_job(job);
        }
    }

    fn spawn_job(&self, job: Job) {
        let queue = self.clone();
        let job_id = job.id;
        let execution = (self.inner.handler)(job);

        tokio::spawn(async move {
            // 内层任务用于捕获 panic
            match tokio::spawn(execution).await {
                Ok(Ok(())) => debug!(job_id = %job_id, "Job finished"),
                Ok(Err(e)) => warn!(job_id = %job_id, error = %e, "Job failed"),
                Err(e) => error!(job_id = %job_id, error = %e, "Job execution aborted"),
            }
            queue.finish(job_id);
        });
    }

    fn finish(&self, job_id: JobId) {
        {
            let mut state = self.inner.state.lock();
            state.running.remove(&job_id);
            state.publish_gauges();
        }
        self.dispatch_next();
    }

    /// 移除等待中的任务；运行中或未知的任务返回 `false`
    pub fn cancel(&self, job_id: JobId) -> bool {
        let mut state = self.inner.state.lock();
        match state.pending.iter().position(|e| e.job.id == job_id) {
            Some(index) => {
                state.pending.remove(index);
                state.publish_gauges();
                info!(job_id = %job_id, "Pending job removed from queue");
                true
            }
            None => false,
        }
    }

    pub fn set_max_concurrent(&self, max_concurrent: usize) {
        {
            let mut state = self.inner.state.lock();
            state.max_concurrent = max_concurrent.max(1);
        }
        info!(max_concurrent, "Queue concurrency updated");
        self.dispatch_next();
    }

    /// 暂停调度，运行中的任务不受影响
    pub fn pause(&self) {
        self.inner.state.lock().paused = true;
        info!("Queue paused");
    }

    pub fn resume(&self) {
        self.inner.state.lock().paused = false;
        info!("Queue resumed");
        self.dispatch_next();
    }

    /// 清空等待队列，返回移除数量
    pub fn clear(&self) -> usize {
        let mut state = self.inner.state.lock();
        let removed = state.pending.len();
        state.pending.clear();
        state.publish_gauges();
        removed
    }

    pub fn stats(&self) -> QueueSnapshot {
        let state = self.inner.state.lock();
        QueueSnapshot {
            pending: state.pending.len(),
            running: state.running.len(),
            max_concurrent: state.max_concurrent,
            paused: state.paused,
        }
    }

    pub fn is_running(&self, job_id: JobId) -> bool {
        self.inner.state.lock().running.contains_key(&job_id)
    }

    /// 等待中的任务ID，按调度顺序
    pub fn pending_jobs(&self) -> Vec<JobId> {
        self.inner
            .state
            .lock()
            .pending
            .iter()
            .map(|e| e.job.id)
            .collect()
    }

    pub fn running_jobs(&self) -> Vec<JobId> {
        self.inner.state.lock().running.keys().copied().collect()
    }
}
