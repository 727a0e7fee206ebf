// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapeq::actors::{ActorRegistry, RedditActor, XActor};
use scrapeq::clients::apify::ApifyConnector;
use scrapeq::clients::{ApiClient, CredentialRotator, RetryingApiClient};
use scrapeq::config::settings::Settings;
use scrapeq::domain::services::progress_service::ProgressService;
use scrapeq::domain::services::scraping_service::ScrapingService;
use scrapeq::infrastructure::repositories::credential_store_impl::FileCredentialStore;
use scrapeq::infrastructure::repositories::result_repo_impl::StorageResultRepository;
use scrapeq::infrastructure::storage::create_storage_repository;
use scrapeq::presentation::routes;
use scrapeq::utils::telemetry;
use scrapeq::workers::cleanup_worker::CleanupWorker;
use scrapeq::workers::manager::WorkerManager;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting scrapeq...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Initialize Prometheus Metrics
    if settings.metrics.enabled {
        scrapeq::infrastructure::metrics::init_metrics(&settings.metrics.listen_addr);
    }

    // 4. Load Apify tokens
    let credential_store = Arc::new(FileCredentialStore::new(&settings.apify.token_file_path));
    let rotator = Arc::new(CredentialRotator::load(credential_store).await?);
    info!(tokens = rotator.count(), "Token rotator initialized");

    // 5. Initialize API client
    let connector = Arc::new(ApifyConnector::new(&settings.apify)?);
    let policy = settings.retry.policy();
    let client: Arc<dyn ApiClient> = Arc::new(RetryingApiClient::new(
        rotator.clone(),
        connector,
        policy,
    ));

    // 6. Register actors
    let actors = &settings.actors;
    let registry = ActorRegistry::new()
        .with_actor(Arc::new(
            XActor::new(client.clone())
                .with_days_per_range(actors.x_days_per_range)
                .with_range_delay(Duration::from_millis(actors.x_range_delay_ms)),
        ))
        .with_actor(Arc::new(
            RedditActor::new(client.clone(), &actors.subreddit_file_path)
                .with_subreddit_delay(Duration::from_millis(actors.reddit_subreddit_delay_ms)),
        ));
    info!(platforms = ?registry.platforms(), "Actors registered");

    // 7. Initialize result storage
    let storage = create_storage_repository(&settings.storage)?;
    let results = Arc::new(StorageResultRepository::new(storage));
    info!(storage_type = %settings.storage.storage_type, "Result storage initialized");

    // 8. Initialize scraping service
    let service = Arc::new(ScrapingService::new(
        Arc::new(registry),
        Arc::new(ProgressService::new()),
        results,
        settings.queue.max_concurrent_jobs,
    ));
    info!(
        max_concurrent = settings.queue.max_concurrent_jobs,
        "Scraping service initialized"
    );

    // 9. Start workers
    let mut worker_manager = WorkerManager::new();
    if settings.cleanup.enabled {
        worker_manager.spawn(Arc::new(CleanupWorker::new(
            service.clone(),
            &settings.cleanup,
        )));
    }

    // 10. Start HTTP server
    let app = routes::build_app(service, rotator, &settings.rate_limiting);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    worker_manager.shutdown().await;
    info!("scrapeq stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => error!("Unable to listen for shutdown signal: {}", err),
    }
}
