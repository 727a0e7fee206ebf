// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 进度服务（progress_service）：任务状态机与进度记录
/// - 抓取服务（scraping_service）：任务创建、调度执行、结果查询与取消
pub mod progress_service;
pub mod scraping_service;
