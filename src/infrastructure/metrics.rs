// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

pub const JOBS_CREATED_TOTAL: &str = "scrapeq_jobs_created_total";
pub const JOBS_COMPLETED_TOTAL: &str = "scrapeq_jobs_completed_total";
pub const JOBS_FAILED_TOTAL: &str = "scrapeq_jobs_failed_total";
pub const JOBS_CANCELLED_TOTAL: &str = "scrapeq_jobs_cancelled_total";
pub const JOBS_PENDING: &str = "scrapeq_jobs_pending";
pub const JOBS_RUNNING: &str = "scrapeq_jobs_running";
pub const JOB_DURATION_SECONDS: &str = "scrapeq_job_duration_seconds";
pub const CREDENTIAL_ROTATIONS_TOTAL: &str = "scrapeq_credential_rotations_total";
pub const CREDENTIALS_AVAILABLE: &str = "scrapeq_credentials_available";
pub const API_RETRIES_TOTAL: &str = "scrapeq_api_retries_total";

/// 启动Prometheus导出器
pub fn init_metrics(listen_addr: &str) {
    let addr: SocketAddr = match listen_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Invalid metrics address {}: {}", listen_addr, e);
            return;
        }
    };

    // 端口被占用时只告警
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }

    info!("Metrics exporter listening on {}", addr);
}
