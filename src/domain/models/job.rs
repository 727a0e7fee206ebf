// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::platform::{Platform, ScrapingRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// 任务唯一标识符
pub type JobId = Uuid;

/// 初始步骤描述
pub const INITIAL_STEP: &str = "Initializing";
/// 进度总步数
pub const TOTAL_STEPS: u32 = 100;

/// 任务优先级
///
/// 序数越大越先被调度，同一优先级内先进先出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl Priority {
    pub fn ordinal(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Normal => 2,
            Priority::High => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
        }
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            _ => Err(()),
        }
    }
}

/// 任务状态枚举
///
/// 状态转换遵循以下流程：
/// Pending → Running → Completed/Failed
/// Cancelled 只能由 Pending 或 Running 进入，终止状态不可再转换。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    pub fn can_transition_to(self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Pending, JobState::Running)
                | (JobState::Pending, JobState::Cancelled)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Failed)
                | (JobState::Running, JobState::Cancelled)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Running => write!(f, "running"),
            JobState::Completed => write!(f, "completed"),
            JobState::Failed => write!(f, "failed"),
            JobState::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for JobState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobState::Pending),
            "running" => Ok(JobState::Running),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            "cancelled" => Ok(JobState::Cancelled),
            _ => Err(()),
        }
    }
}

/// 领域错误类型
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    /// 无效的状态转换
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: JobState, to: JobState },
}

/// 抓取任务实体
///
/// 创建后不可变，运行状态由进度服务单独维护。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub platform: Platform,
    pub request: ScrapingRequest,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(request: ScrapingRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform: request.config.platform(),
            priority: request.options.priority.unwrap_or_default(),
            request,
            created_at: Utc::now(),
        }
    }
}

/// 任务状态记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub job_id: JobId,
    pub platform: Platform,
    pub status: JobState,
    pub progress: u8,
    pub current_step: String,
    pub total_steps: u32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    pub fn new(job_id: JobId, platform: Platform) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            platform,
            status: JobState::Pending,
            progress: 0,
            current_step: INITIAL_STEP.to_string(),
            total_steps: TOTAL_STEPS,
            error_message: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
        }
    }

    /// 执行状态转换并维护时间戳
    pub fn transition(&mut self, next: JobState) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: next,
            });
        }

        let now = Utc::now();
        match next {
            JobState::Running => self.started_at = Some(now),
            state if state.is_terminal() => self.finished_at = Some(now),
            _ => {}
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// 合并部分更新，非法的状态转换被忽略并返回错误
    pub fn apply(&mut self, update: ProgressUpdate) -> Result<(), DomainError> {
        let mut outcome = Ok(());
        if let Some(next) = update.status {
            if next != self.status {
                outcome = self.transition(next);
            }
        }
        if let Some(progress) = update.progress {
            self.progress = progress.min(100);
        }
        if let Some(step) = update.current_step {
            self.current_step = step;
        }
        if let Some(message) = update.error_message {
            self.error_message = Some(message);
        }
        self.updated_at = Utc::now();
        outcome
    }
}

/// 部分状态更新
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub status: Option<JobState>,
    pub progress: Option<u8>,
    pub current_step: Option<String>,
    pub error_message: Option<String>,
}

impl ProgressUpdate {
    pub fn progress(progress: u8, step: impl Into<String>) -> Self {
        Self {
            progress: Some(progress),
            current_step: Some(step.into()),
            ..Default::default()
        }
    }
}

/// 任务列表过滤条件
#[derive(Debug, Clone, Default)]
pub struct JobFilters {
    pub platform: Option<Platform>,
    pub status: Option<JobState>,
    pub limit: Option<usize>,
}

impl JobFilters {
    pub fn matches(&self, status: &JobStatus) -> bool {
        self.platform.map_or(true, |p| p == status.platform)
            && self.status.map_or(true, |s| s == status.status)
    }
}

/// 各状态任务数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCounts {
    pub total: usize,
    pub pending: usize,
    pub running: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}
