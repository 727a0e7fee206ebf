// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    context, no_rate_limit, sample_posts, test_server, wait_for_state, x_request, FakeBackend,
};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use scrapeq::domain::models::job::JobState;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

fn job_id_of(body: &Value) -> Uuid {
    body["jobId"].as_str().unwrap().parse().unwrap()
}

fn forwarded_for(ip: &'static str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-forwarded-for"),
        HeaderValue::from_static(ip),
    )
}

#[tokio::test]
async fn test_create_job_and_fetch_results() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 2).await;
    let server = test_server(&ctx, &no_rate_limit());

    let response = server.post("/api/scrape").json(&x_request("rust", 10)).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["message"], "Scraping job started successfully");

    let job_id = job_id_of(&body);
    wait_for_state(&ctx.service, job_id, JobState::Completed).await;

    let status = server.get(&format!("/api/scrape/{}", job_id)).await;
    assert_eq!(status.status_code(), StatusCode::OK);
    let status = status.json::<Value>();
    assert_eq!(status["status"], "completed");
    assert_eq!(status["progress"], 100);

    let results = server.get(&format!("/api/scrape/{}/results", job_id)).await;
    assert_eq!(results.status_code(), StatusCode::OK);
    let results = results.json::<Value>();
    assert_eq!(results["success"], true);
    assert_eq!(results["jobId"], job_id.to_string());
    assert_eq!(results["metadata"]["platform"], "x");
    // 无效ID的评论被过滤
    assert_eq!(results["data"]["posts"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_platform_is_rejected() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 1).await;
    let server = test_server(&ctx, &no_rate_limit());

    let response = server
        .post("/api/scrape")
        .json(&json!({ "platform": "tiktok", "config": {} }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(
        body["error"]["details"],
        json!(["platform: must be one of: x, reddit"])
    );
    assert!(ctx.service.progress().is_empty());
}

#[tokio::test]
async fn test_invalid_platform_config_is_rejected() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 1).await;
    let server = test_server(&ctx, &no_rate_limit());

    let response = server
        .post("/api/scrape")
        .json(&json!({
            "platform": "x",
            "config": { "startDate": "2024-06-01", "endDate": "2024-06-03" }
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let details = body["error"]["details"].as_array().unwrap();
    assert!(details.iter().any(|d| d == "Keywords are required"));
    assert!(ctx.backend.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 1).await;
    let server = test_server(&ctx, &no_rate_limit());

    let response = server
        .post("/api/scrape")
        .json(&json!({ "config": {} }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_unknown_and_invalid_job_ids() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 1).await;
    let server = test_server(&ctx, &no_rate_limit());

    let missing = server.get(&format!("/api/scrape/{}", Uuid::new_v4())).await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["error"]["code"], "NOT_FOUND");

    let invalid = server.get("/api/scrape/not-a-uuid").await;
    assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(invalid.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

    let results = server
        .get(&format!("/api/scrape/{}/results", Uuid::new_v4()))
        .await;
    assert_eq!(results.status_code(), StatusCode::NOT_FOUND);
}

/// 运行中的任务：结果 409，取消一次成功，再次取消 409
#[tokio::test]
async fn test_running_job_results_and_cancel() {
    let gate = Arc::new(Semaphore::new(0));
    let ctx = context(
        &["token-a"],
        FakeBackend::gated(sample_posts(), gate.clone()),
        1,
    )
    .await;
    let server = test_server(&ctx, &no_rate_limit());

    let body = server
        .post("/api/scrape")
        .json(&x_request("rust", 5))
        .await
        .json::<Value>();
    let job_id = job_id_of(&body);
    wait_for_state(&ctx.service, job_id, JobState::Running).await;

    let results = server.get(&format!("/api/scrape/{}/results", job_id)).await;
    assert_eq!(results.status_code(), StatusCode::CONFLICT);
    assert_eq!(results.json::<Value>()["error"]["code"], "CONFLICT");

    let cancelled = server.delete(&format!("/api/scrape/{}", job_id)).await;
    assert_eq!(cancelled.status_code(), StatusCode::OK);
    assert_eq!(
        cancelled.json::<Value>()["message"],
        "Job cancelled successfully"
    );

    let again = server.delete(&format!("/api/scrape/{}", job_id)).await;
    assert_eq!(again.status_code(), StatusCode::CONFLICT);

    let status = server
        .get(&format!("/api/scrape/{}", job_id))
        .await
        .json::<Value>();
    assert_eq!(status["status"], "cancelled");

    gate.add_permits(1);
}

#[tokio::test]
async fn test_list_jobs_with_filters() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 2).await;
    let server = test_server(&ctx, &no_rate_limit());

    let x_job = job_id_of(
        &server
            .post("/api/scrape")
            .json(&x_request("rust", 5))
            .await
            .json::<Value>(),
    );
    let reddit_job = job_id_of(
        &server
            .post("/api/scrape")
            .json(&json!({
                "platform": "reddit",
                "config": { "dateLimit": "2024-06-01" },
                "options": { "priority": "high" }
            }))
            .await
            .json::<Value>(),
    );
    wait_for_state(&ctx.service, x_job, JobState::Completed).await;
    wait_for_state(&ctx.service, reddit_job, JobState::Completed).await;

    let all = server.get("/api/scrape/jobs").await.json::<Value>();
    assert_eq!(all["count"], 2);

    let reddit = server
        .get("/api/scrape/jobs?platform=reddit&status=completed")
        .await;
    assert_eq!(reddit.status_code(), StatusCode::OK);
    let reddit = reddit.json::<Value>();
    assert_eq!(reddit["count"], 1);
    assert_eq!(reddit["jobs"][0]["jobId"], reddit_job.to_string());
    assert!(reddit["jobs"][0]["result"].is_object());

    let limited = server.get("/api/scrape/jobs?limit=1").await.json::<Value>();
    assert_eq!(limited["count"], 1);

    let too_many = server.get("/api/scrape/jobs?limit=500").await;
    assert_eq!(too_many.status_code(), StatusCode::BAD_REQUEST);

    let bad_status = server.get("/api/scrape/jobs?status=sleeping").await;
    assert_eq!(bad_status.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_queue_stats() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 3).await;
    let server = test_server(&ctx, &no_rate_limit());

    let job_id = job_id_of(
        &server
            .post("/api/scrape")
            .json(&x_request("rust", 5))
            .await
            .json::<Value>(),
    );
    wait_for_state(&ctx.service, job_id, JobState::Completed).await;

    let stats = server.get("/api/scrape/queue/stats").await;
    assert_eq!(stats.status_code(), StatusCode::OK);
    let stats = stats.json::<Value>();
    assert_eq!(stats["success"], true);
    assert_eq!(stats["totalJobs"], 1);
    assert_eq!(stats["completedJobs"], 1);
    assert_eq!(stats["maxConcurrent"], 3);
    assert_eq!(stats["paused"], false);
}

#[tokio::test]
async fn test_health_endpoints() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 1).await;
    let server = test_server(&ctx, &no_rate_limit());

    let health = server.get("/api/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    let health = health.json::<Value>();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["services"]["apify"], true);
    assert_eq!(health["details"]["availableTokens"], 1);

    let ready = server.get("/api/health/ready").await;
    assert_eq!(ready.status_code(), StatusCode::OK);
    assert_eq!(ready.json::<Value>()["tokensAvailable"], 1);

    let live = server.get("/api/health/live").await;
    assert_eq!(live.status_code(), StatusCode::OK);
    assert_eq!(live.json::<Value>()["alive"], true);
}

/// 令牌池耗尽后健康检查降级，就绪检查返回 503
#[tokio::test]
async fn test_health_degrades_when_tokens_drained() {
    let backend = FakeBackend::new(sample_posts());
    backend.exhaust("token-a");
    let ctx = context(&["token-a"], backend, 1).await;
    let server = test_server(&ctx, &no_rate_limit());

    let job_id = job_id_of(
        &server
            .post("/api/scrape")
            .json(&x_request("rust", 5))
            .await
            .json::<Value>(),
    );
    wait_for_state(&ctx.service, job_id, JobState::Failed).await;

    let health = server.get("/api/health").await;
    assert_eq!(health.status_code(), StatusCode::OK);
    let health = health.json::<Value>();
    assert_eq!(health["status"], "degraded");
    assert_eq!(health["services"]["apify"], false);
    assert_eq!(health["details"]["availableTokens"], 0);

    let ready = server.get("/api/health/ready").await;
    assert_eq!(ready.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let ready = ready.json::<Value>();
    assert_eq!(ready["ready"], false);
    assert_eq!(ready["message"], "No Apify tokens available");
}

#[tokio::test]
async fn test_scrape_rate_limit_per_client() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 1).await;
    let mut limits = no_rate_limit();
    limits.enabled = true;
    limits.scrape_max_requests = 2;
    let server = test_server(&ctx, &limits);

    let (name, value) = forwarded_for("10.0.0.1");
    for _ in 0..2 {
        let response = server
            .post("/api/scrape")
            .add_header(name.clone(), value.clone())
            .json(&x_request("rust", 5))
            .await;
        assert_eq!(response.status_code(), StatusCode::CREATED);
    }

    let limited = server
        .post("/api/scrape")
        .add_header(name.clone(), value.clone())
        .json(&x_request("rust", 5))
        .await;
    assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
    let body = limited.json::<Value>();
    assert_eq!(body["error"]["code"], "RATE_LIMIT");
    assert_eq!(
        body["error"]["message"],
        "Too many scraping requests, please try again later"
    );

    // 其他客户端和其他接口不受影响
    let (other_name, other_value) = forwarded_for("10.0.0.2");
    let other = server
        .post("/api/scrape")
        .add_header(other_name, other_value)
        .json(&x_request("rust", 5))
        .await;
    assert_eq!(other.status_code(), StatusCode::CREATED);

    let stats = server
        .get("/api/scrape/queue/stats")
        .add_header(name, value)
        .await;
    assert_eq!(stats.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route() {
    let ctx = context(&["token-a"], FakeBackend::new(sample_posts()), 1).await;
    let server = test_server(&ctx, &no_rate_limit());

    let response = server.get("/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Route GET /nope not found");

    let nested = server.get("/api/unknown").await;
    assert_eq!(nested.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(nested.json::<Value>()["error"]["code"], "NOT_FOUND");
}
