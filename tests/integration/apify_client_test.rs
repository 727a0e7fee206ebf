// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapeq::clients::apify::ApifyConnector;
use scrapeq::clients::types::{ActorApi, ApiConnector, ApiError};
use scrapeq::clients::{ApiClient, CredentialRotator, RetryingApiClient};
use scrapeq::config::settings::ApifySettings;
use scrapeq::infrastructure::repositories::credential_store_impl::InMemoryCredentialStore;
use scrapeq::utils::retry_policy::RetryPolicy;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const REDDIT_ACTOR: &str = "macrocosmos/reddit-scraper";
const RUNS_PATH: &str = "/acts/macrocosmos~reddit-scraper/runs";

fn connector(server: &MockServer) -> ApifyConnector {
    ApifyConnector::new(&ApifySettings {
        token_file_path: String::new(),
        base_url: server.uri(),
        request_timeout_secs: 5,
        wait_for_finish_secs: 1,
    })
    .expect("connector should build")
}

fn run(status: &str) -> serde_json::Value {
    json!({
        "data": {
            "id": "run-1",
            "status": status,
            "defaultDatasetId": "dataset-1"
        }
    })
}

/// 启动运行、轮询到成功、读取数据集分页信息
#[tokio::test]
async fn test_run_actor_and_fetch_items() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(201).set_body_json(run("RUNNING")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .and(query_param("waitForFinish", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run("SUCCEEDED")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/dataset-1/items"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "id": "a" }, { "id": "b" }]))
                .insert_header("x-apify-pagination-total", "7")
                .insert_header("x-apify-pagination-offset", "0"),
        )
        .mount(&server)
        .await;

    let api = connector(&server).connect("tok").unwrap();
    let run = api
        .call_actor(REDDIT_ACTOR, &json!({ "subreddit": "r/rust" }))
        .await
        .unwrap();
    assert_eq!(run.status, "SUCCEEDED");
    assert_eq!(run.default_dataset_id, "dataset-1");

    let items = api.list_items(&run.default_dataset_id).await.unwrap();
    assert_eq!(items.count, 2);
    assert_eq!(items.total, 7);
    assert_eq!(items.offset, 0);
    assert_eq!(items.items[1]["id"], "b");
}

#[tokio::test]
async fn test_failed_run_is_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(run("READY")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(run("FAILED")))
        .mount(&server)
        .await;

    let api = connector(&server).connect("tok").unwrap();
    let err = api.call_actor(REDDIT_ACTOR, &json!({})).await.unwrap_err();
    assert!(matches!(
        err,
        ApiError::RunFailed { ref run_id, ref status } if run_id == "run-1" && status == "FAILED"
    ));
    assert!(!err.is_exhaustion());
}

#[tokio::test]
async fn test_payment_required_is_exhaustion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .respond_with(
            ResponseTemplate::new(402)
                .set_body_string("Monthly usage hard limit exceeded"),
        )
        .mount(&server)
        .await;

    let api = connector(&server).connect("tok").unwrap();
    let err = api.call_actor(REDDIT_ACTOR, &json!({})).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 402, .. }));
    assert!(err.is_exhaustion());
}

/// 通过HTTP后端验证令牌轮换：耗尽的令牌被移除，请求用下一个令牌完成
#[tokio::test]
async fn test_retrying_client_rotates_over_http() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .and(header("authorization", "Bearer spent"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(RUNS_PATH))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(201).set_body_json(run("SUCCEEDED")))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::new(vec![
        "spent".to_string(),
        "fresh".to_string(),
    ]));
    let rotator = Arc::new(CredentialRotator::load(store.clone()).await.unwrap());
    let client = RetryingApiClient::new(
        rotator.clone(),
        Arc::new(connector(&server)),
        RetryPolicy::fixed(3, Duration::from_millis(1)),
    );

    let run = client.invoke(REDDIT_ACTOR, json!({})).await.unwrap();
    assert_eq!(run.id, "run-1");
    assert_eq!(store.snapshot(), vec!["fresh".to_string()]);
    assert_eq!(client.credential_count(), 1);
}

/// 瞬时错误按固定次数重试
#[tokio::test]
async fn test_retrying_client_retries_transient_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/datasets/dataset-1/items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream hiccup"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/datasets/dataset-1/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "a" }])))
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::new(vec!["tok".to_string()]));
    let rotator = Arc::new(CredentialRotator::load(store.clone()).await.unwrap());
    let client = RetryingApiClient::new(
        rotator,
        Arc::new(connector(&server)),
        RetryPolicy::fixed(3, Duration::from_millis(1)),
    );

    let items = client.list_results("dataset-1").await.unwrap();
    assert_eq!(items.count, 1);
    assert_eq!(store.snapshot(), vec!["tok".to_string()]);
}

#[tokio::test]
async fn test_retrying_client_gives_up_after_max_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/datasets/dataset-1/items"))
        .respond_with(ResponseTemplate::new(500).set_body_string("still broken"))
        .expect(3)
        .mount(&server)
        .await;

    let store = Arc::new(InMemoryCredentialStore::new(vec!["tok".to_string()]));
    let rotator = Arc::new(CredentialRotator::load(store).await.unwrap());
    let client = RetryingApiClient::new(
        rotator,
        Arc::new(connector(&server)),
        RetryPolicy::fixed(3, Duration::from_millis(1)),
    );

    let err = client.list_results("dataset-1").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 500, .. }));
}
