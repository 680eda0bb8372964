//! 配置管理系统 (Configuration Management)
//!
//! 负责 `config.toml` 的反序列化及命名配置小节 (Section) 的层级映射。

use std::collections::HashMap;
use std::path::Path;

use bon::Builder;
use config::{Config, File};
use serde::Deserialize;

use crate::core::error::{Result, SubError};

/// 全局应用配置
#[derive(Debug, Deserialize, Builder, Clone)]
pub struct AppConfig {
    /// 订阅缓存目录基准路径
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// 命名配置小节映射，每个小节对应下游一组路由规则的来源
    #[serde(default)]
    pub sections: HashMap<String, SectionConfig>,
}

/// 单个配置小节
///
/// 所有字段均为可选：无订阅地址的小节是合法配置，不构成错误。
#[derive(Debug, Deserialize, Builder, Clone, Default)]
pub struct SectionConfig {
    /// 订阅地址
    pub subscription_url: Option<String>,

    /// 订阅类型 (auto / structured / legacy)，缺省按 auto 处理
    ///
    /// 保留原始字符串，非法取值在使用处报告而非在加载期拒绝整份配置。
    pub subscription_type: Option<String>,

    /// 手动钉选的出口标签列表 (空白分隔)
    pub subscription_selected: Option<String>,
}

fn default_cache_path() -> String {
    "cache".to_string()
}

impl AppConfig {
    /// 从默认位置 `config.toml` 加载并解析配置
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("config.toml"))
    }

    /// 从指定路径加载并解析配置；文件缺失时回退到内建默认值
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let builder = Config::builder();

        let builder = if config_path.exists() {
            builder.add_source(File::from(config_path))
        } else {
            builder
        };

        let settings = builder.build().map_err(SubError::Config)?;
        settings.try_deserialize().map_err(SubError::Config)
    }
}
