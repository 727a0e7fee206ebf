// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::presentation::errors::{AppError, RequestError};

/// 超过该数量的客户端键时清理过期状态
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// 按客户端地址限流
///
/// 每个窗口最多允许 `max_requests` 次请求，令牌按窗口均匀恢复。
pub struct RequestRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    message: String,
}

impl RequestRateLimiter {
    pub fn new(window: Duration, max_requests: u32, message: impl Into<String>) -> Self {
        let burst = NonZeroU32::new(max_requests.max(1)).unwrap_or(NonZeroU32::MIN);
        let period = window / burst.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: RateLimiter::keyed(quota),
            message: message.into(),
        }
    }

    /// 检查并消耗一次配额
    pub fn check(&self, client: &str) -> Result<(), RequestError> {
        if self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.limiter.retain_recent();
        }
        self.limiter
            .check_key(&client.to_string())
            .map_err(|_| RequestError::RateLimited(self.message.clone()))
    }
}

/// 客户端标识：优先取 `x-forwarded-for` 第一个地址，其次取连接地址
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
    {
        let forwarded = forwarded.trim();
        if !forwarded.is_empty() {
            return forwarded.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// 限流中间件
pub async fn rate_limit(
    State(limiter): State<Arc<RequestRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client = client_key(&request);
    if let Err(e) = limiter.check(&client) {
        debug!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
        return Err(e.into());
    }
    Ok(next.run(request).await)
}
