// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 内存优先级队列，负责任务的排队、并发控制和调度
pub mod job_queue;

pub use job_queue::{JobQueue, QueueSnapshot};
