// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::job::{JobFilters, JobState, Priority};
use crate::domain::models::platform::{Platform, PlatformConfig, ScrapingOptions, ScrapingRequest};
use crate::utils::errors::ScrapingError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

/// 创建抓取任务请求
///
/// `config` 保持原始JSON，按 `platform` 解析为具体平台配置。
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct CreateScrapeRequestDto {
    #[validate(custom(function = "validate_platform"))]
    pub platform: String,
    #[validate(custom(function = "validate_config_object"))]
    pub config: Value,
    #[validate(nested)]
    pub options: Option<ScrapeOptionsDto>,
}

/// 抓取选项
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOptionsDto {
    pub priority: Option<Priority>,
    /// 回调地址，仅记录
    #[validate(url)]
    pub callback_url: Option<String>,
    #[validate(url)]
    pub webhook_url: Option<String>,
}

impl CreateScrapeRequestDto {
    /// 转换为领域请求，平台配置字段类型错误时返回校验错误
    pub fn into_request(self) -> Result<ScrapingRequest, ScrapingError> {
        let config = PlatformConfig::from_parts(&self.platform, self.config)?;
        let options = self
            .options
            .map(|o| ScrapingOptions {
                priority: o.priority,
                callback_url: o.callback_url,
                webhook_url: o.webhook_url,
            })
            .unwrap_or_default();
        Ok(ScrapingRequest { config, options })
    }
}

/// 任务列表查询参数
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct ListJobsQueryDto {
    #[validate(custom(function = "validate_platform"))]
    pub platform: Option<String>,
    #[validate(custom(function = "validate_status"))]
    pub status: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<usize>,
}

impl ListJobsQueryDto {
    pub fn into_filters(self) -> Result<JobFilters, ScrapingError> {
        let platform = self.platform.as_deref().map(str::parse::<Platform>).transpose()?;
        let status = self
            .status
            .as_deref()
            .map(|s| {
                s.parse::<JobState>()
                    .map_err(|_| ScrapingError::InvalidConfig(vec![format!("Unknown status '{}'", s)]))
            })
            .transpose()?;
        Ok(JobFilters {
            platform,
            status,
            limit: self.limit,
        })
    }
}

fn validate_platform(platform: &str) -> Result<(), ValidationError> {
    if platform.parse::<Platform>().is_ok() {
        return Ok(());
    }
    let mut error = ValidationError::new("platform");
    error.message = Some(Cow::Borrowed("must be one of: x, reddit"));
    Err(error)
}

fn validate_status(status: &str) -> Result<(), ValidationError> {
    if status.parse::<JobState>().is_ok() {
        return Ok(());
    }
    let mut error = ValidationError::new("status");
    error.message = Some(Cow::Borrowed(
        "must be one of: pending, running, completed, failed, cancelled",
    ));
    Err(error)
}

fn validate_config_object(config: &Value) -> Result<(), ValidationError> {
    if config.is_object() {
        return Ok(());
    }
    let mut error = ValidationError::new("config");
    error.message = Some(Cow::Borrowed("must be an object"));
    Err(error)
}

/// 展开校验错误为 `字段: 原因` 列表
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut messages = Vec::new();
    collect_messages("", errors, &mut messages);
    messages.sort();
    messages
}

fn collect_messages(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    match &e.message {
                        Some(message) => out.push(format!("{}: {}", path, message)),
                        None => out.push(format!("{}: invalid {}", path, e.code)),
                    }
                }
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(&format!("{}[{}]", path, index), inner, out);
                }
            }
        }
    }
}
