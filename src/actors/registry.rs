// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::traits::ScrapingActor;
use crate::domain::models::platform::Platform;
use crate::utils::errors::ScrapingError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 平台执行器注册表
///
/// 以平台为键保存执行器，重复注册时后者覆盖前者。
#[derive(Default, Clone)]
pub struct ActorRegistry {
    actors: HashMap<Platform, Arc<dyn ScrapingActor>>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, actor: Arc<dyn ScrapingActor>) {
        let platform = actor.platform();
        if self.actors.insert(platform, actor).is_some() {
            info!(platform = %platform, "Replaced registered actor");
        } else {
            info!(platform = %platform, "Registered actor");
        }
    }

    pub fn with_actor(mut self, actor: Arc<dyn ScrapingActor>) -> Self {
        self.register(actor);
        self
    }

    pub fn get(&self, platform: Platform) -> Result<Arc<dyn ScrapingActor>, ScrapingError> {
        self.actors
            .get(&platform)
            .cloned()
            .ok_or_else(|| ScrapingError::PlatformNotSupported(platform.to_string()))
    }

    pub fn is_registered(&self, platform: Platform) -> bool {
        self.actors.contains_key(&platform)
    }

    /// 已注册平台，按名称排序
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = self.actors.keys().copied().collect();
        platforms.sort_by_key(|p| p.as_str());
        platforms
    }
}
