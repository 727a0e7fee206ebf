// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::traits::{platform_mismatch, ScrapingActor};
use crate::clients::types::ApiClient;
use crate::domain::models::platform::{Platform, PlatformConfig, XConfig};
use crate::domain::services::progress_service::ProgressReporter;
use crate::utils::dates::{self, DateRange};
use crate::utils::errors::ScrapingError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const X_ACTOR_ID: &str = "rmyzeijic5nBVm8BG";
pub const DEFAULT_DAYS_PER_RANGE: u32 = 3;
pub const MAX_ITEMS_LIMIT: i64 = 10_000;

/// 带目标条数的日期区间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePlan {
    pub range: DateRange,
    pub target: usize,
}

/// X (Twitter) 执行器
///
/// 将日期区间切分为若干小段逐段抓取，条数配额在各段之间均分。
pub struct XActor {
    client: Arc<dyn ApiClient>,
    days_per_range: u32,
    range_delay: Duration,
}

impl XActor {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self {
            client,
            days_per_range: DEFAULT_DAYS_PER_RANGE,
            range_delay: Duration::from_secs(2),
        }
    }

    pub fn with_days_per_range(mut self, days: u32) -> Self {
        self.days_per_range = days.max(1);
        self
    }

    pub fn with_range_delay(mut self, delay: Duration) -> Self {
        self.range_delay = delay;
        self
    }

    fn config<'a>(&self, config: &'a PlatformConfig) -> Result<&'a XConfig, ScrapingError> {
        match config {
            PlatformConfig::X(c) => Ok(c),
            other => Err(platform_mismatch(Platform::X, other)),
        }
    }

    /// 切分日期区间并分配条数，余数分给靠前的区间
    pub fn plan_ranges(&self, config: &XConfig) -> Vec<RangePlan> {
        let (Some(start), Some(end)) = (
            dates::parse_date(&config.start_date),
            dates::parse_date(&config.end_date),
        ) else {
            return Vec::new();
        };

        let ranges = dates::split_date_ranges(start, end, self.days_per_range);
        if ranges.is_empty() {
            return Vec::new();
        }

        let total = config.max_items.max(0) as usize;
        let base = total / ranges.len();
        let remainder = total % ranges.len();

        ranges
            .into_iter()
            .enumerate()
            .map(|(i, range)| RangePlan {
                range,
                target: base + usize::from(i < remainder),
            })
            .collect()
    }

    async fn scrape_range(&self, plan: &RangePlan, keywords: &str) -> Result<Vec<Value>, ScrapingError> {
        let until = dates::format_date(dates::next_day(plan.range.end));
        let input = json!({
            "searchTerms": [format!(
                "{} since:{} until:{}",
                keywords,
                dates::format_date(plan.range.start),
                until
            )],
            "sortBy": "Top",
            "maxItems": plan.target,
            "minRetweets": 0,
            "minLikes": 0,
            "minReplies": 0,
            "onlyVerifiedUsers": false,
            "onlyBuleVerifiedUsers": false,
            "onlyImage": false,
            "onlyVideo": false,
            "onlyQuote": false,
            "onlyReply": false,
        });

        let run = self.client.invoke(X_ACTOR_ID, input).await?;
        let items = self.client.list_results(&run.default_dataset_id).await?;

        Ok(items
            .items
            .into_iter()
            .filter(|post| !is_invalid_post(post))
            .take(plan.target)
            .collect())
    }
}

/// 缺失或全零的ID视为无效帖子
fn is_invalid_post(post: &Value) -> bool {
    match post.get("id") {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.trim().chars().all(|c| c == '0'),
        Some(_) => false,
    }
}

/// 统一帖子字段：数字ID转为字符串
fn normalize_post(mut post: Value) -> Value {
    if let Some(obj) = post.as_object_mut() {
        if let Some(Value::Number(n)) = obj.get("id") {
            let id = n.to_string();
            obj.insert("id".to_string(), Value::String(id));
        }
    }
    post
}

#[async_trait]
impl ScrapingActor for XActor {
    fn platform(&self) -> Platform {
        Platform::X
    }

    fn actor_id(&self) -> &str {
        X_ACTOR_ID
    }

    fn validate(&self, config: &PlatformConfig) -> Result<(), ScrapingError> {
        let config = self.config(config)?;
        let mut errors = Vec::new();

        if config.keywords.trim().is_empty() {
            errors.push("Keywords are required".to_string());
        }

        let start = dates::parse_date(&config.start_date);
        let end = dates::parse_date(&config.end_date);
        if start.is_none() {
            errors.push("Invalid start date format (use YYYY-MM-DD)".to_string());
        }
        if end.is_none() {
            errors.push("Invalid end date format (use YYYY-MM-DD)".to_string());
        }
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                errors.push("Start date must be before end date".to_string());
            }
        }

        if config.max_items <= 0 {
            errors.push("Max items must be greater than 0".to_string());
        } else if config.max_items > MAX_ITEMS_LIMIT {
            errors.push(format!("Max items must not exceed {}", MAX_ITEMS_LIMIT));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ScrapingError::InvalidConfig(errors))
        }
    }

    async fn run(
        &self,
        config: &PlatformConfig,
        reporter: &ProgressReporter,
    ) -> Result<Value, ScrapingError> {
        let config = self.config(config)?;
        let plans = self.plan_ranges(config);
        let total = plans.len();
        let mut posts: Vec<Value> = Vec::new();

        info!(total_ranges = total, max_items = config.max_items, "Starting X scraping");

        for (i, plan) in plans.iter().enumerate() {
            let label = format!(
                "{} → {}",
                dates::format_date(plan.range.start),
                dates::format_date(plan.range.end)
            );
            if plan.target == 0 {
                debug!(range = %label, "Skipping range with no item budget");
                continue;
            }

            info!(range = %label, target = plan.target, "Processing range {}/{}", i + 1, total);
            match self.scrape_range(plan, &config.keywords).await {
                Ok(batch) => {
                    info!(collected = batch.len(), total_posts = posts.len() + batch.len(), "Range {}/{} completed", i + 1, total);
                    posts.extend(batch);
                }
                Err(e) if e.is_credential_failure() => return Err(e),
                Err(e) => warn!(range = %label, error = %e, "Failed to scrape range, skipping"),
            }

            let progress = 10 + (80 * (i + 1) / total) as u8;
            reporter.report(progress, format!("Processed range {}/{}", i + 1, total));

            if i + 1 < total && !self.range_delay.is_zero() {
                tokio::time::sleep(self.range_delay).await;
            }
        }

        Ok(json!({
            "posts": posts,
            "metadata": {
                "keywords": config.keywords,
                "startDate": config.start_date,
                "endDate": config.end_date,
                "totalRanges": total,
                "collectedAt": Utc::now().to_rfc3339(),
            }
        }))
    }

    fn transform(&self, mut raw: Value) -> Result<Value, ScrapingError> {
        if let Some(posts) = raw.get_mut("posts").and_then(Value::as_array_mut) {
            let normalized: Vec<Value> = posts.drain(..).map(normalize_post).collect();
            *posts = normalized;
        }
        Ok(raw)
    }
}
