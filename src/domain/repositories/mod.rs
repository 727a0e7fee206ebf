// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义领域层的持久化抽象，具体实现由基础设施层提供：
/// - 凭证仓库（credential_repository）：API令牌的读取与回写
/// - 结果仓库（result_repository）：抓取结果的保存与查询
/// - 存储仓库（storage_repository）：底层键值存储
pub mod credential_repository;
pub mod result_repository;
pub mod storage_repository;
