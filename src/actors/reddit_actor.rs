// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::traits::{platform_mismatch, ScrapingActor};
use crate::clients::types::ApiClient;
use crate::domain::models::platform::{Platform, PlatformConfig, RedditConfig};
use crate::domain::services::progress_service::ProgressReporter;
use crate::utils::dates;
use crate::utils::errors::ScrapingError;
use crate::utils::file_utils::read_lines;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub const REDDIT_ACTOR_ID: &str = "macrocosmos/reddit-scraper";
pub const MAX_ITEMS_LIMIT: i64 = 10_000;
/// 单次请求的条数上限
const REQUEST_LIMIT_CAP: i64 = 100;

/// Apify 返回的 Reddit 条目
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ApifyRedditPost {
    url: String,
    id: String,
    title: Option<String>,
    body: Option<String>,
    username: String,
    community_name: String,
    data_type: String,
    score: i64,
    #[serde(rename = "num_comments")]
    num_comments: Option<i64>,
    created_at: String,
    media: Vec<String>,
}

/// 媒体信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBundle {
    pub primary_url: String,
    pub thumbnail_url: String,
    pub is_video: bool,
}

/// 统一格式的 Reddit 帖子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditPost {
    pub entity_type: String,
    pub entity_id: String,
    pub reddit_id: String,
    pub permalink: String,
    pub headline: String,
    pub text_body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_bundle: Option<MediaBundle>,
    pub author_handle: String,
    pub community_tag: String,
    pub vote_score: i64,
    pub comment_total: i64,
    pub created_at: String,
    pub collected_at: String,
}

impl RedditPost {
    fn from_apify(post: ApifyRedditPost, collected_at: &str) -> Self {
        let media_bundle = post.media.first().map(|url| MediaBundle {
            primary_url: url.clone(),
            thumbnail_url: url.clone(),
            is_video: url.contains("v.redd.it"),
        });
        Self {
            entity_type: post.data_type,
            entity_id: post.id.clone(),
            reddit_id: post.id,
            permalink: post.url,
            headline: post.title.unwrap_or_default(),
            text_body: post.body.unwrap_or_default(),
            media_bundle,
            author_handle: post.username,
            community_tag: post.community_name,
            vote_score: post.score,
            comment_total: post.num_comments.unwrap_or(0),
            created_at: post.created_at,
            collected_at: collected_at.to_string(),
        }
    }
}

/// Reddit 执行器
///
/// 子版块列表来自文本文件，逐个抓取直到达到总量上限。
pub struct RedditActor {
    client: Arc<dyn ApiClient>,
    subreddit_file: PathBuf,
    subreddit_delay: Duration,
}

impl RedditActor {
    pub fn new(client: Arc<dyn ApiClient>, subreddit_file: impl Into<PathBuf>) -> Self {
        Self {
            client,
            subreddit_file: subreddit_file.into(),
            subreddit_delay: Duration::from_secs(1),
        }
    }

    pub fn with_subreddit_delay(mut self, delay: Duration) -> Self {
        self.subreddit_delay = delay;
        self
    }

    fn config<'a>(&self, config: &'a PlatformConfig) -> Result<&'a RedditConfig, ScrapingError> {
        match config {
            PlatformConfig::Reddit(c) => Ok(c),
            other => Err(platform_mismatch(Platform::Reddit, other)),
        }
    }

    async fn load_subreddits(&self) -> Result<Vec<String>, ScrapingError> {
        read_lines(&self.subreddit_file).await.map_err(|e| {
            ScrapingError::Internal(format!(
                "Failed to load subreddits from {}: {}",
                self.subreddit_file.display(),
                e
            ))
        })
    }

    async fn scrape_subreddit(
        &self,
        subreddit: &str,
        config: &RedditConfig,
        date_limit: NaiveDate,
    ) -> Result<Vec<Value>, ScrapingError> {
        let mut input = json!({
            "subreddits": [subreddit],
            "sort": config.sort_by.to_string(),
            "limit": (config.max_items * 2).min(REQUEST_LIMIT_CAP),
        });
        let keyword = config.keywords.trim();
        if !keyword.is_empty() {
            input["keyword"] = json!(keyword);
        }

        let run = self.client.invoke(REDDIT_ACTOR_ID, input).await?;
        let items = self.client.list_results(&run.default_dataset_id).await?;

        Ok(items
            .items
            .into_iter()
            .filter(|item| item.get("dataType").and_then(Value::as_str) == Some("post"))
            .filter(|item| is_within_date_limit(item, date_limit))
            .take(config.max_items.max(0) as usize)
            .collect())
    }
}

/// 发帖时间不早于限制日期（UTC零点）
fn is_within_date_limit(item: &Value, date_limit: NaiveDate) -> bool {
    let Some(created_at) = item.get("createdAt").and_then(Value::as_str) else {
        return false;
    };
    let Ok(created_at) = DateTime::parse_from_rfc3339(created_at) else {
        return false;
    };
    created_at.with_timezone(&Utc).date_naive() >= date_limit
}

#[async_trait]
impl ScrapingActor for RedditActor {
    fn platform(&self) -> Platform {
        Platform::Reddit
    }

    fn actor_id(&self) -> &str {
        REDDIT_ACTOR_ID
    }

    fn validate(&self, config: &PlatformConfig) -> Result<(), ScrapingError> {
        let config = self.config(config)?;
        let mut errors = Vec::new();

        if !dates::is_valid_date(&config.date_limit) {
            errors.push("Invalid date limit format (use YYYY-MM-DD)".to_string());
        }
        if config.max_items <= 0 {
            errors.push("Max items must be greater than 0".to_string());
        } else if config.max_items > MAX_ITEMS_LIMIT {
            errors.push(format!("Max items must not exceed {}", MAX_ITEMS_LIMIT));
        }
        if config.total_limit < 0 {
            errors.push("Total limit must be 0 or greater".to_string());
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
        let date_limit = dates::parse_date(&config.date_limit).ok_or_else(|| {
            ScrapingError::InvalidConfig(vec![
                "Invalid date limit format (use YYYY-MM-DD)".to_string()
            ])
        })?;
        let subreddits = self.load_subreddits().await?;
        let total_limit = config.total_limit.max(0) as usize;
        let keywords = if config.keywords.is_empty() {
            "(all posts)"
        } else {
            config.keywords.as_str()
        };

        info!(
            subreddits = subreddits.len(),
            keywords,
            date_limit = %config.date_limit,
            max_items = config.max_items,
            total_limit,
            sort_by = %config.sort_by,
            "Starting Reddit scraping"
        );

        let mut posts: Vec<Value> = Vec::new();
        let total = subreddits.len();

        for (i, subreddit) in subreddits.iter().enumerate() {
            if total_limit > 0 && posts.len() >= total_limit {
                info!(total_limit, "Total limit reached, stopping");
                break;
            }

            info!("Scraping r/{} ({}/{})", subreddit, i + 1, total);
            match self.scrape_subreddit(subreddit, config, date_limit).await {
                Ok(batch) => {
                    let slots = if total_limit > 0 {
                        total_limit - posts.len()
                    } else {
                        batch.len()
                    };
                    let added = batch.len().min(slots);
                    posts.extend(batch.into_iter().take(slots));
                    info!(total_posts = posts.len(), "r/{}: {} posts collected", subreddit, added);
                }
                Err(e) if e.is_credential_failure() => return Err(e),
                Err(e) => warn!(subreddit = %subreddit, error = %e, "Failed to scrape subreddit, skipping"),
            }

            let progress = 10 + (80 * (i + 1) / total) as u8;
            reporter.report(progress, format!("Scraped r/{} ({}/{})", subreddit, i + 1, total));

            if i + 1 < total && !self.subreddit_delay.is_zero() {
                tokio::time::sleep(self.subreddit_delay).await;
            }
        }

        Ok(json!({
            "posts": posts,
            "metadata": {
                "keywords": config.keywords,
                "subreddits": subreddits,
                "dateLimit": config.date_limit,
                "maxItems": config.max_items,
                "totalLimit": config.total_limit,
                "sortBy": config.sort_by,
                "scrapedAt": Utc::now().to_rfc3339(),
            }
        }))
    }

    fn transform(&self, mut raw: Value) -> Result<Value, ScrapingError> {
        let collected_at = Utc::now().to_rfc3339();
        let Some(items) = raw.get_mut("posts").and_then(Value::as_array_mut) else {
            return Ok(raw);
        };

        let mut converted = Vec::with_capacity(items.len());
        for item in items.drain(..) {
            match serde_json::from_value::<ApifyRedditPost>(item) {
                Ok(post) => converted.push(serde_json::to_value(RedditPost::from_apify(
                    post,
                    &collected_at,
                ))?),
                Err(e) => warn!(error = %e, "Dropping malformed Reddit item"),
            }
        }
        *items = converted;
        Ok(raw)
    }
}
