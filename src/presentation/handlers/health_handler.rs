// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    application::dto::scrape_response::{
        HealthDetailsDto, HealthResponseDto, HealthServicesDto, LivenessResponseDto,
        ReadinessResponseDto,
    },
    clients::credentials::CredentialRotator,
    domain::services::scraping_service::ScrapingService,
};

/// 健康检查
///
/// 令牌池为空时状态为 `degraded`，仍返回 200。
pub async fn health_check(
    Extension(service): Extension<Arc<ScrapingService>>,
    Extension(rotator): Extension<Arc<CredentialRotator>>,
) -> Json<HealthResponseDto> {
    let available_tokens = rotator.count();
    let apify = available_tokens > 0;

    Json(HealthResponseDto {
        success: true,
        status: if apify { "healthy" } else { "degraded" }.to_string(),
        timestamp: Utc::now(),
        services: HealthServicesDto { api: true, apify },
        details: HealthDetailsDto {
            available_tokens,
            queue: service.queue_stats(),
        },
    })
}

/// 就绪检查，没有可用令牌时返回 503
pub async fn readiness_check(
    Extension(rotator): Extension<Arc<CredentialRotator>>,
) -> impl IntoResponse {
    let count = rotator.count();
    if count == 0 {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadinessResponseDto {
                success: false,
                ready: false,
                tokens_available: None,
                message: Some("No Apify tokens available".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponseDto {
            success: true,
            ready: true,
            tokens_available: Some(count),
            message: None,
        }),
    )
}

pub async fn liveness_check() -> Json<LivenessResponseDto> {
    Json(LivenessResponseDto {
        success: true,
        alive: true,
        timestamp: Utc::now(),
    })
}
