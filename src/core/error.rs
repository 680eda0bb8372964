//! 错误处理体系 (Error Handling System)
//!
//! 定义订阅领域的错误类型与全局 Result 别名。

use thiserror::Error;

/// 全局错误定义 (Subscription Domain Errors)
#[derive(Error, Debug)]
pub enum SubError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 获取失败：网络错误、超时或所有回退后仍为空响应
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// 订阅内容无法按 Base64 文本解码，或解码结果为空
    #[error("Decode failed: {0}")]
    Decode(String),

    /// 声明的订阅类型不在识别范围内
    #[error("Unsupported subscription type: {0}")]
    UnsupportedType(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

/// 全局 Result 别名
pub type Result<T> = std::result::Result<T, SubError>;
