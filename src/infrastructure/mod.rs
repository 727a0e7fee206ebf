// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 提供领域层抽象接口的具体实现：
/// - 指标（metrics）：Prometheus导出与指标名称
/// - 仓库实现（repositories）：结果仓库与凭证存储
/// - 存储（storage）：本地文件与内存键值存储
pub mod metrics;
pub mod repositories;
pub mod storage;
