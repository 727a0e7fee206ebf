// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// Apify 客户端模块
///
/// - apify：REST接口实现
/// - credentials：令牌池与耗尽轮换
/// - retrying：带轮换与重试的客户端
/// - types：客户端接口、错误与数据类型
pub mod apify;
pub mod credentials;
pub mod retrying;
pub mod types;

pub use credentials::CredentialRotator;
pub use retrying::RetryingApiClient;
pub use types::{ApiClient, ApiError};
