// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scrapeq::clients::CredentialRotator;
use scrapeq::domain::repositories::credential_repository::{CredentialError, CredentialStore};
use scrapeq::infrastructure::repositories::credential_store_impl::FileCredentialStore;
use std::sync::Arc;
use tempfile::TempDir;

#[tokio::test]
async fn test_file_store_skips_comments_and_blank_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("apify-token.txt");
    std::fs::write(&path, "# primary\napify_api_one\n\n  apify_api_two  \n# spare\n").unwrap();

    let store = FileCredentialStore::new(&path);
    assert_eq!(
        store.load().await.unwrap(),
        vec!["apify_api_one".to_string(), "apify_api_two".to_string()]
    );
}

/// 轮换后剩余令牌写回文件
#[tokio::test]
async fn test_rotation_rewrites_token_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("apify-token.txt");
    std::fs::write(&path, "first\nsecond\nthird\n").unwrap();

    let rotator = CredentialRotator::load(Arc::new(FileCredentialStore::new(&path)))
        .await
        .unwrap();
    assert_eq!(rotator.current().unwrap(), "first");

    assert!(rotator.rotate_on_exhaustion("first").await.unwrap());
    assert_eq!(rotator.current().unwrap(), "second");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "second\nthird\n");

    assert_eq!(rotator.add("fourth").await.unwrap(), 3);
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "second\nthird\nfourth\n"
    );

    // 重新加载得到相同的令牌池
    let reloaded = CredentialRotator::load(Arc::new(FileCredentialStore::new(&path)))
        .await
        .unwrap();
    assert_eq!(reloaded.count(), 3);
    assert_eq!(reloaded.current().unwrap(), "second");
}

#[tokio::test]
async fn test_draining_leaves_empty_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("apify-token.txt");
    std::fs::write(&path, "only\n").unwrap();

    let rotator = CredentialRotator::load(Arc::new(FileCredentialStore::new(&path)))
        .await
        .unwrap();
    assert!(!rotator.rotate_on_exhaustion("only").await.unwrap());
    assert!(rotator.is_drained());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "");

    let reload = CredentialRotator::load(Arc::new(FileCredentialStore::new(&path))).await;
    assert!(matches!(reload, Err(CredentialError::NoCredentialsAvailable)));
}

#[tokio::test]
async fn test_missing_token_file() {
    let dir = TempDir::new().unwrap();
    let store = FileCredentialStore::new(dir.path().join("absent.txt"));
    assert!(matches!(store.load().await, Err(CredentialError::Store(_))));
}
