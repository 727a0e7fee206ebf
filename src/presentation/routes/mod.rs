// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::clients::credentials::CredentialRotator;
use crate::config::settings::RateLimitingSettings;
use crate::domain::services::scraping_service::ScrapingService;
use crate::presentation::errors::{AppError, RequestError};
use crate::presentation::handlers::{health_handler, scrape_handler};
use crate::presentation::middleware::rate_limit_middleware::{rate_limit, RequestRateLimiter};
use axum::{
    extract::Request,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

/// 抓取任务路由
///
/// 提供了限流器时，仅对创建任务的请求生效。
pub fn scrape_routes(scrape_limiter: Option<Arc<RequestRateLimiter>>) -> Router {
    let create = match scrape_limiter {
        Some(limiter) => post(scrape_handler::create_job).layer(from_fn_with_state(limiter, rate_limit)),
        None => post(scrape_handler::create_job),
    };

    Router::new()
        .route("/", create)
        .route("/jobs", get(scrape_handler::list_jobs))
        .route("/queue/stats", get(scrape_handler::queue_stats))
        .route(
            "/{job_id}",
            get(scrape_handler::get_job_status).delete(scrape_handler::cancel_job),
        )
        .route("/{job_id}/results", get(scrape_handler::get_job_results))
}

/// 健康检查路由
pub fn health_routes() -> Router {
    Router::new()
        .route("/", get(health_handler::health_check))
        .route("/ready", get(health_handler::readiness_check))
        .route("/live", get(health_handler::liveness_check))
}

/// 组装完整应用
///
/// # 参数
///
/// * `service` - 抓取服务
/// * `rotator` - 令牌轮换器，健康检查读取令牌数量
/// * `rate_limiting` - 限流配置
pub fn build_app(
    service: Arc<ScrapingService>,
    rotator: Arc<CredentialRotator>,
    rate_limiting: &RateLimitingSettings,
) -> Router {
    let (global_limiter, scrape_limiter) = if rate_limiting.enabled {
        (
            Some(Arc::new(RequestRateLimiter::new(
                Duration::from_secs(rate_limiting.window_secs),
                rate_limiting.max_requests,
                "Too many requests, please try again later",
            ))),
            Some(Arc::new(RequestRateLimiter::new(
                Duration::from_secs(rate_limiting.scrape_window_secs),
                rate_limiting.scrape_max_requests,
                "Too many scraping requests, please try again later",
            ))),
        )
    } else {
        (None, None)
    };

    let mut api = Router::new()
        .nest("/scrape", scrape_routes(scrape_limiter))
        .nest("/health", health_routes());
    if let Some(limiter) = global_limiter {
        api = api.layer(from_fn_with_state(limiter, rate_limit));
    }

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(Extension(service))
        .layer(Extension(rotator))
        .layer(TraceLayer::new_for_http())
}

async fn not_found(request: Request) -> AppError {
    RequestError::RouteNotFound {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
    }
    .into()
}
