// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    context, context_with_retry, sample_posts, wait_for_state, wait_idle, x_request, FakeBackend,
};
use scrapeq::application::dto::scrape_request::CreateScrapeRequestDto;
use scrapeq::domain::models::job::{JobState, Priority};
use scrapeq::domain::models::platform::{Platform, ScrapingRequest};
use scrapeq::utils::errors::ScrapingError;
use scrapeq::utils::retry_policy::RetryPolicy;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

fn request(body: Value) -> ScrapingRequest {
    serde_json::from_value::<CreateScrapeRequestDto>(body)
        .unwrap()
        .into_request()
        .unwrap()
}

/// X 任务完整流程：过滤无效ID、数字ID转字符串、结果落盘
#[tokio::test]
async fn test_x_job_end_to_end() {
    let backend = FakeBackend::new(vec![
        json!({ "id": 42, "text": "numeric id" }),
        json!({ "id": "0", "text": "invalid" }),
        json!({ "text": "missing id" }),
        json!({ "id": "77", "text": "string id" }),
    ]);
    let ctx = context(&["token-a"], backend, 2).await;

    let job = ctx.service.start_job(request(x_request("rust", 10))).unwrap();
    assert_eq!(job.platform, Platform::X);
    wait_for_state(&ctx.service, job.id, JobState::Completed).await;

    let result = ctx.service.get_job_results(job.id).await.unwrap();
    let posts = result.data["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["id"], "42");
    assert_eq!(posts[1]["id"], "77");
    assert_eq!(result.metadata.total_items, 2);
    assert_eq!(result.metadata.job_id, Some(job.id));

    let inputs = ctx.backend.inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(
        inputs[0]["searchTerms"][0],
        "rust since:2024-06-01 until:2024-06-04"
    );
}

#[tokio::test]
async fn test_reddit_job_filters_and_maps_posts() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 1).await;

    let job = ctx
        .service
        .start_job(request(json!({
            "platform": "reddit",
            "config": { "keywords": "async", "dateLimit": "2024-06-03", "maxItems": 5 }
        })))
        .unwrap();
    wait_for_state(&ctx.service, job.id, JobState::Completed).await;

    let result = ctx.service.get_job_results(job.id).await.unwrap();
    let posts = result.data["posts"].as_array().unwrap();
    // 每个子版块只保留 2024-06-03 之后的一条帖子
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p["redditId"] == "1002"));
    assert_eq!(posts[0]["entityType"], "post");
    assert_eq!(result.data["metadata"]["subreddits"], json!(["rust", "programming"]));

    let inputs = ctx.backend.inputs();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0]["keyword"], "async");
    assert_eq!(inputs[0]["limit"], 10);
}

/// 连续两次瞬时错误后第三次成功：按默认间隔重试，令牌保持不变
#[tokio::test(start_paused = true)]
async fn test_transient_errors_are_retried_until_success() {
    let backend = FakeBackend::new(sample_posts());
    backend.fail_next(2);
    let ctx = context_with_retry(&["token-a"], backend, 1, RetryPolicy::default()).await;

    let started = tokio::time::Instant::now();
    let job = ctx.service.start_job(request(x_request("rust", 5))).unwrap();
    wait_for_state(&ctx.service, job.id, JobState::Completed).await;

    assert_eq!(ctx.backend.calls(), vec!["token-a"; 3]);
    assert!(started.elapsed() >= Duration::from_millis(3000));
    assert_eq!(ctx.store.snapshot(), vec!["token-a".to_string()]);
    assert_eq!(ctx.rotator.count(), 1);

    let result = ctx.service.get_job_results(job.id).await.unwrap();
    assert_eq!(result.metadata.total_items, 2);
}

/// 令牌耗尽时轮换到下一个，任务仍然成功
#[tokio::test]
async fn test_rotation_keeps_job_alive() {
    let backend = FakeBackend::new(sample_posts());
    backend.exhaust("token-a");
    let ctx = context(&["token-a", "token-b"], backend, 1).await;

    let job = ctx.service.start_job(request(x_request("rust", 5))).unwrap();
    wait_for_state(&ctx.service, job.id, JobState::Completed).await;

    assert_eq!(ctx.backend.calls(), vec!["token-a", "token-b"]);
    assert_eq!(ctx.store.snapshot(), vec!["token-b".to_string()]);
    assert_eq!(ctx.rotator.count(), 1);
}

/// 全部令牌耗尽后任务失败，之后的任务不再访问后端
#[tokio::test]
async fn test_exhausted_pool_fails_jobs() {
    let backend = FakeBackend::new(sample_posts());
    backend.exhaust("token-a");
    backend.exhaust("token-b");
    let ctx = context(&["token-a", "token-b"], backend, 1).await;

    let first = ctx.service.start_job(request(x_request("rust", 5))).unwrap();
    wait_for_state(&ctx.service, first.id, JobState::Failed).await;

    let status = ctx.service.get_job_status(first.id).unwrap();
    assert!(status.error_message.unwrap().contains("exhausted"));
    assert!(ctx.store.snapshot().is_empty());
    assert!(ctx.rotator.is_drained());

    let calls_before = ctx.backend.calls().len();
    let second = ctx.service.start_job(request(x_request("rust", 5))).unwrap();
    wait_for_state(&ctx.service, second.id, JobState::Failed).await;
    assert_eq!(ctx.backend.calls().len(), calls_before);

    assert!(matches!(
        ctx.service.get_job_results(second.id).await,
        Err(ScrapingError::JobNotCompleted { status: JobState::Failed, .. })
    ));
}

/// 单并发下按优先级调度，同优先级先进先出
#[tokio::test]
async fn test_priority_scheduling() {
    let gate = Arc::new(Semaphore::new(0));
    let ctx = context(
        &["token-a"],
        FakeBackend::gated(sample_posts(), gate.clone()),
        1,
    )
    .await;

    let blocker = ctx.service.start_job(request(x_request("first", 5))).unwrap();
    wait_for_state(&ctx.service, blocker.id, JobState::Running).await;

    for (keywords, priority) in [
        ("low", Priority::Low),
        ("high", Priority::High),
        ("normal-1", Priority::Normal),
        ("normal-2", Priority::Normal),
    ] {
        ctx.service
            .start_job(request(x_request(keywords, 5)).with_priority(priority))
            .unwrap();
    }
    assert_eq!(ctx.service.queue_stats().pending_jobs, 4);

    gate.add_permits(5);
    wait_idle(&ctx.service).await;

    let order: Vec<String> = ctx
        .backend
        .inputs()
        .iter()
        .map(|input| {
            input["searchTerms"][0]
                .as_str()
                .unwrap()
                .split(' ')
                .next()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(order, vec!["first", "high", "normal-1", "normal-2", "low"]);
    assert_eq!(ctx.service.queue_stats().completed_jobs, 5);
}

/// 运行中被取消的任务保持 Cancelled，结果不落盘
#[tokio::test]
async fn test_cancel_running_job() {
    let gate = Arc::new(Semaphore::new(0));
    let ctx = context(
        &["token-a"],
        FakeBackend::gated(sample_posts(), gate.clone()),
        1,
    )
    .await;

    let job = ctx.service.start_job(request(x_request("rust", 5))).unwrap();
    wait_for_state(&ctx.service, job.id, JobState::Running).await;
    ctx.service.cancel_job(job.id).unwrap();

    gate.add_permits(1);
    wait_idle(&ctx.service).await;

    let status = ctx.service.get_job_status(job.id).unwrap();
    assert_eq!(status.status, JobState::Cancelled);
    assert_eq!(status.error_message.as_deref(), Some("cancelled by user"));
    assert!(matches!(
        ctx.service.get_job_results(job.id).await,
        Err(ScrapingError::JobNotCompleted { status: JobState::Cancelled, .. })
    ));
}
