//! 订阅获取与格式探测 (Fetcher & Format Detector)
//!
//! 负责网络抓取、客户端标识选择以及 结构化 / 旧式 两种线格式的识别。
//! 部分订阅服务器按请求方的 User-Agent 决定返回哪种格式。

use std::str::FromStr;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::core::error::{Result, SubError};
use crate::subscription::parse::{self, LegacyEntry};

/// 结构化格式客户端标识：向服务器声明可消费 sing-box 原生 JSON
pub const STRUCTURED_UA: &str = "sing-box/1.9.0 (subhub)";
/// 通用抓取客户端标识：服务器按惯例返回 Base64 行列表
pub const LEGACY_UA: &str = "v2rayNG/1.8.5";

/// 单次网络请求的固定超时
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 声明的订阅类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionType {
    #[default]
    Auto,
    Structured,
    Legacy,
}

impl FromStr for SubscriptionType {
    type Err = SubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "structured" => Ok(Self::Structured),
            "legacy" => Ok(Self::Legacy),
            other => Err(SubError::UnsupportedType(other.to_string())),
        }
    }
}

/// 一次获取的归一化结果；两种表示严格二选一，且格式一经探测不再变更
#[derive(Debug, Clone)]
pub enum SubscriptionDoc {
    /// sing-box 原生 JSON：保留原始文本与 outbounds 数组
    Structured { raw: String, outbounds: Vec<Value> },
    /// 旧式 Base64 行列表解码后的有序条目
    Legacy { entries: Vec<LegacyEntry> },
}

/// 探测响应是否为包含 outbounds 数组的结构化文档
///
/// 纯函数，探测逻辑可脱离网络单独验证。
pub fn detect_structured(body: &str) -> Option<Vec<Value>> {
    let value: Value = serde_json::from_str(body).ok()?;
    let outbounds = value.get("outbounds")?.as_array()?;
    Some(outbounds.clone())
}

/// 订阅抓取器
///
/// 每个客户端标识各持有一个连接池，超时与压缩配置在构造时固定。
pub struct Fetcher {
    structured_client: Client,
    legacy_client: Client,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            structured_client: Self::build_client(STRUCTURED_UA)?,
            legacy_client: Self::build_client(LEGACY_UA)?,
        })
    }

    fn build_client(ua: &str) -> Result<Client> {
        Client::builder()
            .user_agent(ua)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(SubError::Network)
    }

    /// 抓取文本响应；传输失败、超时与空响应体统一折叠为 Fetch 错误
    async fn fetch_text(&self, client: &Client, url: &str) -> Result<String> {
        let url = Url::parse(url).map_err(|e| SubError::Fetch(format!("{}: {}", url, e)))?;
        let resp = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SubError::Fetch(format!("{}: {}", url, e)))?;
        let body = resp
            .text()
            .await
            .map_err(|e| SubError::Fetch(format!("{}: {}", url, e)))?;
        if body.trim().is_empty() {
            return Err(SubError::Fetch(format!("empty response from {}", url)));
        }
        Ok(body)
    }

    /// 按声明类型抓取并归一化订阅内容
    pub async fn fetch(&self, url: &str, ty: SubscriptionType) -> Result<SubscriptionDoc> {
        match ty {
            SubscriptionType::Structured => {
                let body = self.fetch_text(&self.structured_client, url).await?;
                match detect_structured(&body) {
                    Some(outbounds) => {
                        debug!("Structured subscription with {} outbounds: {}", outbounds.len(), url);
                        Ok(SubscriptionDoc::Structured { raw: body, outbounds })
                    }
                    None => Err(SubError::Fetch(format!("no outbounds document at {}", url))),
                }
            }
            SubscriptionType::Legacy => Ok(SubscriptionDoc::Legacy {
                entries: self.fetch_legacy_entries(url).await?,
            }),
            SubscriptionType::Auto => {
                // 先按结构化标识尝试一次；任何失败或形状不符都回退到旧式抓取
                if let Ok(body) = self.fetch_text(&self.structured_client, url).await {
                    if let Some(outbounds) = detect_structured(&body) {
                        debug!("Auto-detected structured subscription ({} outbounds): {}", outbounds.len(), url);
                        return Ok(SubscriptionDoc::Structured { raw: body, outbounds });
                    }
                    debug!("Response is not a structured document, falling back to legacy: {}", url);
                }
                Ok(SubscriptionDoc::Legacy {
                    entries: self.fetch_legacy_entries(url).await?,
                })
            }
        }
    }

    /// 以通用标识抓取并按旧式列表解析，忽略声明类型
    pub async fn fetch_legacy_entries(&self, url: &str) -> Result<Vec<LegacyEntry>> {
        let body = self.fetch_text(&self.legacy_client, url).await?;
        let entries = parse::parse_legacy(&body)?;
        debug!("Parsed {} legacy entries from {}", entries.len(), url);
        Ok(entries)
    }
}
