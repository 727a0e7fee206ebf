// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库实现模块
///
/// - 凭证存储（credential_store_impl）：文件与内存两种实现
/// - 结果仓库（result_repo_impl）：基于键值存储的JSON结果仓库
pub mod credential_store_impl;
pub mod result_repo_impl;
