// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 平台执行器模块
///
/// 每个平台一个执行器，通过注册表按平台查找
pub mod reddit_actor;
pub mod registry;
pub mod traits;
pub mod x_actor;

pub use reddit_actor::RedditActor;
pub use registry::ActorRegistry;
pub use traits::ScrapingActor;
pub use x_actor::XActor;
