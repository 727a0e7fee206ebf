// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供后台工作器及其生命周期管理
pub mod cleanup_worker;
pub mod manager;
pub mod worker;

pub use worker::Worker;
