// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

use crate::utils::errors::ScrapingError;

/// 请求层错误
#[derive(Error, Debug)]
pub enum RequestError {
    /// 请求体或参数校验失败
    #[error("Validation failed")]
    Validation(Vec<String>),

    /// 任务ID格式错误
    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    /// 请求过于频繁
    #[error("{0}")]
    RateLimited(String),

    /// 路由不存在
    #[error("Route {method} {path} not found")]
    RouteNotFound { method: String, path: String },
}

/// 应用错误类型
///
/// 封装所有可能的应用层错误，输出统一的错误信封：
/// `{"success": false, "error": {"message", "code", "details"}}`
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn classify(&self) -> (StatusCode, &'static str, Option<Value>) {
        if let Some(err) = self.0.downcast_ref::<ScrapingError>() {
            return match err {
                ScrapingError::InvalidConfig(violations) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    Some(json!(violations)),
                ),
                ScrapingError::PlatformNotSupported(_) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", None)
                }
                ScrapingError::JobNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
                ScrapingError::JobNotCompleted { .. } | ScrapingError::JobAlreadyTerminal { .. } => {
                    (StatusCode::CONFLICT, "CONFLICT", None)
                }
                ScrapingError::AllCredentialsExhausted | ScrapingError::NoCredentialsAvailable => {
                    (StatusCode::SERVICE_UNAVAILABLE, "TOKENS_EXHAUSTED", None)
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
            };
        }

        match self.0.downcast_ref::<RequestError>() {
            Some(RequestError::Validation(details)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                Some(json!(details)),
            ),
            Some(RequestError::InvalidJobId(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", None)
            }
            Some(RequestError::RateLimited(_)) => {
                (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMIT", None)
            }
            Some(RequestError::RouteNotFound { .. }) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            None => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, details) = self.classify();
        let message = self.0.to_string();

        if status.is_server_error() {
            error!(code, error = %message, "Request failed");
        } else {
            warn!(code, error = %message, "Request rejected");
        }

        let mut error = json!({ "message": message, "code": code });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "success": false, "error": error }))).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
