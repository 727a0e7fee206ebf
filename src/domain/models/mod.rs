// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 任务（job）：任务实体、优先级与状态机
/// - 平台（platform）：平台标识与各平台的抓取配置
/// - 抓取结果（scraping_result）：结果、元数据与统计
pub mod job;
pub mod platform;
pub mod scraping_result;
