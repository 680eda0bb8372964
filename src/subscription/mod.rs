//! 订阅服务 (Subscription Service)
//!
//! 按命名配置小节编排 抓取 → 探测 → 解析 → 过滤 → 缓存 流水线，
//! 向下游规则生成侧提供标签、出口对象与原始链接三种视图。

pub mod cache;
pub mod fetch;
pub mod filter;
pub mod parse;

use std::str::FromStr;

use futures::{StreamExt, stream};
use serde_json::Value;
use tracing::{debug, error};

use crate::core::config::{AppConfig, SectionConfig};
use crate::core::error::Result;
use crate::subscription::cache::CacheStore;
use crate::subscription::fetch::{Fetcher, SubscriptionDoc, SubscriptionType};
use crate::subscription::filter::FilterSet;

/// 批量更新时的并发上限
const UPDATE_CONCURRENCY: usize = 4;

/// 订阅服务：对外操作的唯一入口
pub struct SubscriptionService {
    fetcher: Fetcher,
    cache: CacheStore,
}

impl SubscriptionService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new()?,
            cache: CacheStore::new(&config.cache_path),
        })
    }

    /// 缓存存储访问器；调用方可据此自行决定回退到缓存数据
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    fn section_type(section: &SectionConfig) -> Result<SubscriptionType> {
        match section.subscription_type.as_deref() {
            Some(raw) => SubscriptionType::from_str(raw),
            None => Ok(SubscriptionType::default()),
        }
    }

    /// 更新单个小节：抓取订阅并写入缓存
    ///
    /// 小节未配置订阅地址时视为成功的空操作，不触发网络与缓存写入。
    pub async fn update_section(&self, name: &str, section: &SectionConfig) -> Result<()> {
        let Some(url) = section.subscription_url.as_deref() else {
            debug!("Section {} has no subscription url, skipping", name);
            return Ok(());
        };
        let ty = Self::section_type(section)?;

        let doc = self.fetcher.fetch(url, ty).await?;
        let raw = match &doc {
            SubscriptionDoc::Structured { raw, .. } => raw.clone().into_bytes(),
            SubscriptionDoc::Legacy { entries } => parse::to_cache_lines(entries).into_bytes(),
        };
        self.cache.save(url, &raw).await?;
        debug!("Section {} updated from {}", name, url);
        Ok(())
    }

    /// 并发更新全部小节并返回成功数量
    ///
    /// 单个小节失败只记录日志，绝不中断其余小节的处理。
    pub async fn update_all(&self, config: &AppConfig) -> usize {
        stream::iter(config.sections.iter())
            .map(|(name, section)| async move {
                match self.update_section(name, section).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!(
                            "Failed to update section {} ({}): {}",
                            name,
                            section.subscription_url.as_deref().unwrap_or("-"),
                            e
                        );
                        false
                    }
                }
            })
            .buffer_unordered(UPDATE_CONCURRENCY)
            .filter(|ok| futures::future::ready(*ok))
            .count()
            .await
    }

    /// 查询过滤后的出口标签列表 (实时抓取，不读缓存)
    pub async fn list_outbound_tags(
        &self,
        url: &str,
        ty: SubscriptionType,
        filters: &FilterSet,
    ) -> Result<Vec<String>> {
        let doc = self.fetcher.fetch(url, ty).await?;
        Ok(filter::filter_tags(&doc, filters))
    }

    /// 查询过滤后的完整出口对象；旧式订阅按约定返回空集
    pub async fn list_outbound_objects(
        &self,
        url: &str,
        ty: SubscriptionType,
        filters: &FilterSet,
    ) -> Result<Vec<Value>> {
        let doc = self.fetcher.fetch(url, ty).await?;
        Ok(filter::filter_objects(&doc, filters))
    }

    /// 查询原始连接链接；无论声明类型一律按旧式列表抓取
    pub async fn list_raw_links(&self, url: &str, filters: &FilterSet) -> Result<Vec<String>> {
        let entries = self.fetcher.fetch_legacy_entries(url).await?;
        Ok(filter::filter_links(&entries, filters))
    }

    /// 返回小节手动钉选的标签列表，原样切分，不抓取也不过滤
    pub fn selected_outbounds(section: &SectionConfig) -> Vec<String> {
        section
            .subscription_selected
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}
