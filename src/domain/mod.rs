// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// - 领域模型（models）：任务、平台配置、抓取结果
/// - 仓库接口（repositories）：结果与凭证的持久化抽象
/// - 服务（services）：进度跟踪与任务编排
pub mod models;
pub mod repositories;
pub mod services;
