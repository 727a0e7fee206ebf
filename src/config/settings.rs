// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::retry_policy::RetryPolicy;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// Apify 客户端配置
    pub apify: ApifySettings,
    /// 任务队列配置
    pub queue: QueueSettings,
    /// 结果存储配置
    pub storage: StorageSettings,
    /// API重试配置
    pub retry: RetrySettings,
    /// 平台执行器配置
    pub actors: ActorSettings,
    /// 过期任务清理配置
    pub cleanup: CleanupSettings,
    /// 速率限制配置
    pub rate_limiting: RateLimitingSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// Apify 客户端配置
#[derive(Debug, Clone, Deserialize)]
pub struct ApifySettings {
    /// 令牌文件，一行一个
    pub token_file_path: String,
    pub base_url: String,
    /// 单次HTTP请求超时（秒）
    pub request_timeout_secs: u64,
    /// 轮询运行状态时的 `waitForFinish` 参数（秒）
    pub wait_for_finish_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSettings {
    pub max_concurrent_jobs: usize,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储类型 (local, memory)
    pub storage_type: String,
    /// 本地存储路径
    pub local_path: String,
}

/// 瞬时错误重试配置
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub backoff: BackoffStrategy,
    /// 指数退避的上限（毫秒）
    pub max_delay_ms: u64,
}

/// 重试间隔的增长方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    Fixed,
    Exponential,
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn policy(&self) -> RetryPolicy {
        match self.backoff {
            BackoffStrategy::Fixed => RetryPolicy::fixed(self.max_attempts, self.delay()),
            BackoffStrategy::Exponential => RetryPolicy::exponential(
                self.max_attempts,
                self.delay(),
                Duration::from_millis(self.max_delay_ms.max(self.delay_ms)),
            ),
        }
    }
}

/// 平台执行器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ActorSettings {
    /// Reddit 子版块列表文件
    pub subreddit_file_path: String,
    /// X 日期区间之间的间隔（毫秒）
    pub x_range_delay_ms: u64,
    /// Reddit 子版块之间的间隔（毫秒）
    pub reddit_subreddit_delay_ms: u64,
    pub x_days_per_range: u32,
}

/// 过期任务清理配置
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupSettings {
    pub enabled: bool,
    pub interval_secs: u64,
    pub max_age_hours: i64,
}

/// 速率限制配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitingSettings {
    /// 是否启用速率限制
    pub enabled: bool,
    /// 全局窗口长度（秒）
    pub window_secs: u64,
    /// 全局窗口内最大请求数
    pub max_requests: u32,
    /// 创建任务接口的窗口长度（秒）
    pub scrape_window_secs: u64,
    /// 创建任务接口窗口内最大请求数
    pub scrape_max_requests: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 加载顺序：内置默认值、`config/default`、`config/{APP_ENVIRONMENT}`、
    /// 以 `SCRAPEQ__` 为前缀的环境变量（如 `SCRAPEQ__QUEUE__MAX_CONCURRENT_JOBS`）。
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("SCRAPEQ").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅使用内置默认值
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("apify.token_file_path", "./config/apify-token.txt")?
            .set_default("apify.base_url", "https://api.apify.com/v2")?
            .set_default("apify.request_timeout_secs", 120)?
            .set_default("apify.wait_for_finish_secs", 60)?
            .set_default("queue.max_concurrent_jobs", 5)?
            .set_default("storage.storage_type", "local")?
            .set_default("storage.local_path", "./output")?
            .set_default("retry.max_attempts", 3)?
            .set_default("retry.delay_ms", 1500)?
            .set_default("retry.backoff", "fixed")?
            .set_default("retry.max_delay_ms", 30000)?
            .set_default("actors.subreddit_file_path", "./config/subreddit.txt")?
            .set_default("actors.x_range_delay_ms", 2000)?
            .set_default("actors.reddit_subreddit_delay_ms", 1000)?
            .set_default("actors.x_days_per_range", 3)?
            .set_default("cleanup.enabled", true)?
            .set_default("cleanup.interval_secs", 3600)?
            .set_default("cleanup.max_age_hours", 24)?
            .set_default("rate_limiting.enabled", true)?
            .set_default("rate_limiting.window_secs", 900)?
            .set_default("rate_limiting.max_requests", 100)?
            .set_default("rate_limiting.scrape_window_secs", 3600)?
            .set_default("rate_limiting.scrape_max_requests", 10)?
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}
