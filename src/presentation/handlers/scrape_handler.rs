// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Json, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::{
    application::dto::{
        scrape_request::{validation_messages, CreateScrapeRequestDto, ListJobsQueryDto},
        scrape_response::{
            CancelJobResponseDto, CreateScrapeResponseDto, JobResultsResponseDto,
            JobStatusResponseDto, ListJobsResponseDto, QueueStatsResponseDto,
        },
    },
    domain::models::job::{JobId, JobState},
    domain::services::scraping_service::ScrapingService,
    presentation::errors::{AppError, RequestError},
};

fn parse_job_id(raw: &str) -> Result<JobId, AppError> {
    Uuid::parse_str(raw).map_err(|_| RequestError::InvalidJobId(raw.to_string()).into())
}

/// 创建抓取任务
///
/// 校验通过后立即返回 201，任务在后台排队执行。
pub async fn create_job(
    Extension(service): Extension<Arc<ScrapingService>>,
    payload: Result<Json<CreateScrapeRequestDto>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) =
        payload.map_err(|rejection| RequestError::Validation(vec![rejection.body_text()]))?;

    if let Err(errors) = payload.validate() {
        return Err(RequestError::Validation(validation_messages(&errors)).into());
    }

    let request = payload.into_request()?;
    let job = service.start_job(request)?;
    info!(job_id = %job.id, platform = %job.platform, "Scraping job started");

    Ok((
        StatusCode::CREATED,
        Json(CreateScrapeResponseDto {
            success: true,
            job_id: job.id,
            status: JobState::Pending,
            message: "Scraping job started successfully".to_string(),
        }),
    ))
}

pub async fn get_job_status(
    Extension(service): Extension<Arc<ScrapingService>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponseDto>, AppError> {
    let job_id = parse_job_id(&job_id)?;
    let status = service.get_job_status(job_id)?;
    Ok(Json(status.into()))
}

pub async fn get_job_results(
    Extension(service): Extension<Arc<ScrapingService>>,
    Path(job_id): Path<String>,
) -> Result<Json<JobResultsResponseDto>, AppError> {
    let job_id = parse_job_id(&job_id)?;
    let result = service.get_job_results(job_id).await?;
    Ok(Json(JobResultsResponseDto::new(job_id, result)))
}

/// 取消任务
///
/// 运行中的任务只会被标记为已取消，远端执行继续直到结束，结果被丢弃。
pub async fn cancel_job(
    Extension(service): Extension<Arc<ScrapingService>>,
    Path(job_id): Path<String>,
) -> Result<Json<CancelJobResponseDto>, AppError> {
    let job_id = parse_job_id(&job_id)?;
    service.cancel_job(job_id)?;
    Ok(Json(CancelJobResponseDto {
        success: true,
        message: "Job cancelled successfully".to_string(),
    }))
}

pub async fn list_jobs(
    Extension(service): Extension<Arc<ScrapingService>>,
    query: Result<Query<ListJobsQueryDto>, QueryRejection>,
) -> Result<Json<ListJobsResponseDto>, AppError> {
    let Query(query) =
        query.map_err(|rejection| RequestError::Validation(vec![rejection.body_text()]))?;

    if let Err(errors) = query.validate() {
        return Err(RequestError::Validation(validation_messages(&errors)).into());
    }

    let filters = query.into_filters()?;
    let jobs = service.list_jobs(&filters).await?;
    Ok(Json(ListJobsResponseDto {
        success: true,
        count: jobs.len(),
        jobs,
    }))
}

pub async fn queue_stats(
    Extension(service): Extension<Arc<ScrapingService>>,
) -> Json<QueueStatsResponseDto> {
    Json(QueueStatsResponseDto {
        success: true,
        stats: service.queue_stats(),
    })
}
