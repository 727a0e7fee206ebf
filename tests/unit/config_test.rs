// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapeq::config::settings::Settings;
use std::time::Duration;

#[test]
fn test_builtin_defaults() {
    let settings = Settings::from_defaults().unwrap();

    assert_eq!(settings.server.host, "0.0.0.0");
    assert_eq!(settings.apify.request_timeout_secs, 120);
    assert_eq!(settings.retry.max_attempts, 3);
    assert_eq!(settings.retry.delay(), Duration::from_millis(1500));
    assert_eq!(settings.storage.storage_type, "local");
    assert_eq!(settings.actors.x_range_delay_ms, 2000);
    assert_eq!(settings.actors.reddit_subreddit_delay_ms, 1000);
    assert!(settings.cleanup.enabled);
    assert_eq!(settings.cleanup.max_age_hours, 24);
    assert_eq!(settings.rate_limiting.window_secs, 900);
    assert_eq!(settings.rate_limiting.scrape_window_secs, 3600);
}

/// 仓库自带的 config/default.toml 与内置默认值一致
#[test]
fn test_default_file_matches_builtin_values() {
    let loaded = Settings::new().unwrap();
    let builtin = Settings::from_defaults().unwrap();

    assert_eq!(loaded.server.port, builtin.server.port);
    assert_eq!(loaded.apify.token_file_path, builtin.apify.token_file_path);
    assert_eq!(loaded.apify.base_url, builtin.apify.base_url);
    assert_eq!(loaded.queue.max_concurrent_jobs, builtin.queue.max_concurrent_jobs);
    assert_eq!(loaded.storage.local_path, builtin.storage.local_path);
    assert_eq!(loaded.retry.delay_ms, builtin.retry.delay_ms);
    assert_eq!(loaded.retry.backoff, builtin.retry.backoff);
    assert_eq!(loaded.retry.max_delay_ms, builtin.retry.max_delay_ms);
    assert_eq!(
        loaded.actors.subreddit_file_path,
        builtin.actors.subreddit_file_path
    );
    assert_eq!(loaded.cleanup.interval_secs, builtin.cleanup.interval_secs);
    assert_eq!(
        loaded.rate_limiting.scrape_max_requests,
        builtin.rate_limiting.scrape_max_requests
    );
    assert_eq!(loaded.metrics.listen_addr, builtin.metrics.listen_addr);
}
