// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::job::Priority;
use crate::utils::errors::ScrapingError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 支持的抓取平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    X,
    Reddit,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::X, Platform::Reddit];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::X => "x",
            Platform::Reddit => "reddit",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = ScrapingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Ok(Platform::X),
            "reddit" => Ok(Platform::Reddit),
            _ => Err(ScrapingError::PlatformNotSupported(s.to_string())),
        }
    }
}

/// X (Twitter) 抓取配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XConfig {
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default = "default_max_items")]
    pub max_items: i64,
}

/// Reddit 排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    New,
    Hot,
    Top,
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SortBy::New => write!(f, "new"),
            SortBy::Hot => write!(f, "hot"),
            SortBy::Top => write!(f, "top"),
        }
    }
}

/// Reddit 抓取配置
///
/// `keywords` 为空时抓取全部帖子，`total_limit` 为 0 表示不限制总数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditConfig {
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub date_limit: String,
    #[serde(default = "default_max_items")]
    pub max_items: i64,
    #[serde(default)]
    pub total_limit: i64,
    #[serde(default)]
    pub sort_by: SortBy,
}

fn default_max_items() -> i64 {
    100
}

/// 平台配置
///
/// 序列化形式为 `{"platform": "x", "config": {...}}`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "platform", content = "config", rename_all = "lowercase")]
pub enum PlatformConfig {
    X(XConfig),
    Reddit(RedditConfig),
}

impl PlatformConfig {
    pub fn platform(&self) -> Platform {
        match self {
            PlatformConfig::X(_) => Platform::X,
            PlatformConfig::Reddit(_) => Platform::Reddit,
        }
    }

    /// 由平台名称与原始JSON配置构造
    pub fn from_parts(platform: &str, config: serde_json::Value) -> Result<Self, ScrapingError> {
        let platform: Platform = platform.parse()?;
        let parsed = match platform {
            Platform::X => serde_json::from_value(config).map(PlatformConfig::X),
            Platform::Reddit => serde_json::from_value(config).map(PlatformConfig::Reddit),
        };
        parsed.map_err(|e| ScrapingError::InvalidConfig(vec![e.to_string()]))
    }

    pub fn max_items(&self) -> i64 {
        match self {
            PlatformConfig::X(c) => c.max_items,
            PlatformConfig::Reddit(c) => c.max_items,
        }
    }
}

/// 请求附加选项
///
/// 回调地址仅作记录，不会被调用。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
}

/// 抓取请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapingRequest {
    pub config: PlatformConfig,
    #[serde(default)]
    pub options: ScrapingOptions,
}

impl ScrapingRequest {
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            config,
            options: ScrapingOptions::default(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.options.priority = Some(priority);
        self
    }

    pub fn platform(&self) -> Platform {
        self.config.platform()
    }
}
